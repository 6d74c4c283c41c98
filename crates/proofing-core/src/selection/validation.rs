//! Limit checks shared by the state machine and completion validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::model::{ExtraLimit, SelectionMap, SelectionSettings};

/// Reasons a local mutation is refused. A rejected mutation never changes state.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// Selecting one more photo would exceed the total limit.
    #[error("Selection limit reached: at most {limit} photo(s) can be selected")]
    TotalLimitReached { limit: u32 },

    /// Marking one more photo would exceed an extra limit.
    #[error("Limit reached for '{label}': at most {limit} photo(s)")]
    ExtraLimitReached {
        extra_id: String,
        label: String,
        limit: u32,
    },

    /// Extras can only be toggled on selected photos.
    #[error("Photo '{photo_id}' is not selected")]
    NotSelected { photo_id: String },

    /// The extra id is not configured on the session.
    #[error("Unknown extra '{extra_id}'")]
    UnknownExtra { extra_id: String },

    /// The session is completed; only the operator can unlock it.
    #[error("Selection is locked")]
    Locked,
}

/// Which counter a completion mismatch refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitField {
    Total,
    Extra { id: String, label: String },
}

/// One counter whose value differs from the package size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMismatch {
    pub field: LimitField,
    pub expected: u32,
    pub actual: u32,
}

impl fmt::Display for CompletionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match &self.field {
            LimitField::Total => "Selected photos",
            LimitField::Extra { label, .. } => label.as_str(),
        };
        let hint = if self.actual < self.expected {
            format!("select {} more", self.expected - self.actual)
        } else {
            format!("remove {}", self.actual - self.expected)
        };
        write!(
            f,
            "{}: expected {}, got {} ({})",
            name, self.expected, self.actual, hint
        )
    }
}

/// Result of checking a selection against the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionReadiness {
    Ready,
    NotReady(Vec<CompletionMismatch>),
}

impl CompletionReadiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, CompletionReadiness::Ready)
    }

    /// Human-readable lines, empty when ready.
    pub fn messages(&self) -> Vec<String> {
        match self {
            CompletionReadiness::Ready => Vec::new(),
            CompletionReadiness::NotReady(mismatches) => {
                mismatches.iter().map(ToString::to_string).collect()
            }
        }
    }
}

/// Number of photos with `selected = true`.
pub fn selected_count(selection: &SelectionMap) -> u32 {
    selection.values().filter(|p| p.selected).count() as u32
}

/// Number of selected photos carrying the flag for `extra_id`.
///
/// Flags left on deselected photos are inert and not counted.
pub fn extra_count(selection: &SelectionMap, extra_id: &str) -> u32 {
    selection
        .values()
        .filter(|p| p.selected && p.has_extra(extra_id))
        .count() as u32
}

/// Fails when selecting one more photo would exceed the total limit.
pub fn check_total_capacity(
    selection: &SelectionMap,
    settings: &SelectionSettings,
) -> Result<(), Rejection> {
    if selected_count(selection) >= settings.total_limit {
        return Err(Rejection::TotalLimitReached {
            limit: settings.total_limit,
        });
    }
    Ok(())
}

/// Fails when marking one more photo with `extra` would exceed its limit.
pub fn check_extra_capacity(selection: &SelectionMap, extra: &ExtraLimit) -> Result<(), Rejection> {
    if extra_count(selection, &extra.id) >= extra.limit {
        return Err(Rejection::ExtraLimitReached {
            extra_id: extra.id.clone(),
            label: extra.label.clone(),
            limit: extra.limit,
        });
    }
    Ok(())
}

/// Lists every counter that is not exactly at its configured size.
pub fn completion_mismatches(
    selection: &SelectionMap,
    settings: &SelectionSettings,
) -> Vec<CompletionMismatch> {
    let mut mismatches = Vec::new();

    let selected = selected_count(selection);
    if selected != settings.total_limit {
        mismatches.push(CompletionMismatch {
            field: LimitField::Total,
            expected: settings.total_limit,
            actual: selected,
        });
    }

    for extra in &settings.extra_limits {
        let actual = extra_count(selection, &extra.id);
        if actual != extra.limit {
            mismatches.push(CompletionMismatch {
                field: LimitField::Extra {
                    id: extra.id.clone(),
                    label: extra.label.clone(),
                },
                expected: extra.limit,
                actual,
            });
        }
    }

    mismatches
}

/// Wraps `completion_mismatches` into a readiness value.
pub fn check_completion(selection: &SelectionMap, settings: &SelectionSettings) -> CompletionReadiness {
    let mismatches = completion_mismatches(selection, settings);
    if mismatches.is_empty() {
        CompletionReadiness::Ready
    } else {
        CompletionReadiness::NotReady(mismatches)
    }
}
