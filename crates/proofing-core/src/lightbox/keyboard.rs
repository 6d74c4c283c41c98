//! Keyboard contract of the lightbox.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys the lightbox reacts to while open.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum LightboxKey {
    #[strum(serialize = "arrow_left", serialize = "left")]
    ArrowLeft,
    #[strum(serialize = "arrow_right", serialize = "right")]
    ArrowRight,
    #[strum(serialize = "escape", serialize = "esc")]
    Escape,
}

impl LightboxKey {
    /// All keys bound while the lightbox is open.
    pub const ALL: [LightboxKey; 3] = [
        LightboxKey::ArrowLeft,
        LightboxKey::ArrowRight,
        LightboxKey::Escape,
    ];

    pub fn command(self) -> LightboxCommand {
        match self {
            LightboxKey::ArrowLeft => LightboxCommand::Previous,
            LightboxKey::ArrowRight => LightboxCommand::Next,
            LightboxKey::Escape => LightboxCommand::Close,
        }
    }
}

/// What a key press asks the lightbox to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightboxCommand {
    Previous,
    Next,
    Close,
}

/// Handle returned by a host when keys are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingId(pub u64);

/// Global key handler registry the lightbox binds into while open.
///
/// Every `bind` must be matched by an `unbind`; the lightbox guarantees this
/// on close.
pub trait KeyBindingHost {
    fn bind(&mut self, keys: &[LightboxKey]) -> BindingId;
    fn unbind(&mut self, id: BindingId);
}

/// In-memory host used by terminal front-ends and tests.
#[derive(Debug, Default)]
pub struct KeyBindingRegistry {
    next_id: u64,
    bindings: BTreeMap<BindingId, Vec<LightboxKey>>,
}

impl KeyBindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bindings.
    pub fn active_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_bound(&self, key: LightboxKey) -> bool {
        self.bindings.values().any(|keys| keys.contains(&key))
    }
}

impl KeyBindingHost for KeyBindingRegistry {
    fn bind(&mut self, keys: &[LightboxKey]) -> BindingId {
        self.next_id += 1;
        let id = BindingId(self.next_id);
        self.bindings.insert(id, keys.to_vec());
        id
    }

    fn unbind(&mut self, id: BindingId) {
        self.bindings.remove(&id);
    }
}
