use super::*;
use crate::selection::validation::LimitField;

fn machine(total: u32) -> SelectionStateMachine {
    SelectionStateMachine::new(
        "session-1",
        SelectionSettings::with_total(total),
        SessionStatus::Viewed,
        SelectionMap::new(),
    )
}

fn machine_with_cover(total: u32, cover: u32) -> SelectionStateMachine {
    SelectionStateMachine::new(
        "session-1",
        SelectionSettings::with_total(total).extra("cover", "Album cover", cover),
        SessionStatus::Selecting,
        SelectionMap::new(),
    )
}

#[test]
fn test_third_select_is_rejected_at_limit_two() {
    let mut m = machine(2);

    assert!(m.toggle_select("A").is_ok());
    assert!(m.toggle_select("B").is_ok());
    let result = m.toggle_select("C");

    assert_eq!(result, Err(Rejection::TotalLimitReached { limit: 2 }));
    assert_eq!(m.selected_count(), 2);
    assert!(m.is_selected("A"));
    assert!(m.is_selected("B"));
    assert!(m.photo("C").is_none());
}

#[test]
fn test_selected_count_never_exceeds_limit() {
    let mut m = machine(3);
    let ids = ["a", "b", "c", "d", "e", "b", "f", "a", "g", "h", "c", "i"];

    for id in ids {
        let _ = m.toggle_select(id);
        assert!(m.selected_count() <= 3);
    }
}

#[test]
fn test_deselect_succeeds_at_limit_and_keeps_extras_and_comment() {
    let mut m = machine_with_cover(1, 1);
    m.toggle_select("A").unwrap();
    m.toggle_extra("A", "cover").unwrap();
    m.update_comment("A", "please crop").unwrap();

    let change = m.toggle_select("A").unwrap();

    assert_eq!(
        change,
        SelectionChange::Deselected {
            photo_id: "A".to_string()
        }
    );
    let photo = m.photo("A").unwrap();
    assert!(!photo.selected);
    assert!(photo.has_extra("cover"));
    assert_eq!(photo.comment, "please crop");
}

#[test]
fn test_cover_extra_scenario() {
    let mut m = machine_with_cover(5, 1);
    m.toggle_select("A").unwrap();
    m.toggle_select("B").unwrap();

    assert!(m.toggle_extra("A", "cover").is_ok());
    assert_eq!(m.extra_count("cover"), 1);

    let rejected = m.toggle_extra("B", "cover");
    assert!(matches!(rejected, Err(Rejection::ExtraLimitReached { limit: 1, .. })));
    assert_eq!(m.extra_count("cover"), 1);

    assert_eq!(
        m.toggle_extra("A", "cover").unwrap(),
        SelectionChange::ExtraCleared {
            photo_id: "A".to_string(),
            extra_id: "cover".to_string()
        }
    );
    assert_eq!(m.extra_count("cover"), 0);

    assert!(m.toggle_extra("B", "cover").is_ok());
    assert_eq!(m.extra_count("cover"), 1);
}

#[test]
fn test_flag_on_deselected_photo_frees_the_slot() {
    let mut m = machine_with_cover(2, 1);
    m.toggle_select("A").unwrap();
    m.toggle_extra("A", "cover").unwrap();
    m.toggle_select("A").unwrap();
    m.toggle_select("B").unwrap();
    m.toggle_select("C").unwrap();

    assert_eq!(m.extra_count("cover"), 0);
    assert!(m.toggle_extra("B", "cover").is_ok());
    assert_eq!(m.extra_count("cover"), 1);
    assert!(m.validate_for_completion().is_ready());
}

#[test]
fn test_deselected_cover_does_not_make_completion_ready() {
    let mut m = machine_with_cover(2, 1);
    m.toggle_select("A").unwrap();
    m.toggle_extra("A", "cover").unwrap();
    m.toggle_select("A").unwrap();
    m.toggle_select("B").unwrap();
    m.toggle_select("C").unwrap();

    let readiness = m.validate_for_completion();

    assert!(!readiness.is_ready());
    assert_eq!(
        readiness.messages(),
        vec!["Album cover: expected 1, got 0 (select 1 more)".to_string()]
    );
}

#[test]
fn test_reselection_restores_flag_when_slot_is_free() {
    let mut m = machine_with_cover(5, 1);
    m.toggle_select("A").unwrap();
    m.toggle_extra("A", "cover").unwrap();
    m.toggle_select("A").unwrap();

    m.toggle_select("A").unwrap();

    assert!(m.photo("A").unwrap().has_extra("cover"));
    assert_eq!(m.extra_count("cover"), 1);
}

#[test]
fn test_reselection_clears_flag_when_extra_is_full() {
    let mut m = machine_with_cover(5, 1);
    m.toggle_select("A").unwrap();
    m.toggle_extra("A", "cover").unwrap();
    m.toggle_select("A").unwrap();
    m.toggle_select("B").unwrap();
    m.toggle_extra("B", "cover").unwrap();

    m.toggle_select("A").unwrap();

    assert!(m.is_selected("A"));
    assert!(!m.photo("A").unwrap().has_extra("cover"));
    assert!(m.photo("B").unwrap().has_extra("cover"));
    assert_eq!(m.extra_count("cover"), 1);
}

#[test]
fn test_toggle_extra_on_unselected_photo_is_noop() {
    let mut m = machine_with_cover(5, 1);
    let before = m.clone();

    let result = m.toggle_extra("A", "cover");

    assert_eq!(
        result,
        Err(Rejection::NotSelected {
            photo_id: "A".to_string()
        })
    );
    assert_eq!(m, before);
}

#[test]
fn test_unknown_extra_is_rejected() {
    let mut m = machine_with_cover(5, 1);
    m.toggle_select("A").unwrap();
    assert!(matches!(
        m.toggle_extra("A", "poster"),
        Err(Rejection::UnknownExtra { .. })
    ));
}

#[test]
fn test_comment_update_is_idempotent() {
    let mut m = machine_with_cover(5, 1);
    m.toggle_select("A").unwrap();
    m.toggle_extra("A", "cover").unwrap();

    m.update_comment("A", "x").unwrap();
    m.update_comment("A", "x").unwrap();

    let photo = m.photo("A").unwrap();
    assert_eq!(photo.comment, "x");
    assert!(photo.selected);
    assert!(photo.has_extra("cover"));
}

#[test]
fn test_comment_creates_entry_without_selecting() {
    let mut m = machine(2);
    m.update_comment("Z", "maybe").unwrap();
    let photo = m.photo("Z").unwrap();
    assert!(!photo.selected);
    assert_eq!(m.selected_count(), 0);
}

#[test]
fn test_validation_requires_exact_total() {
    let mut m = machine(3);
    m.toggle_select("A").unwrap();
    m.toggle_select("B").unwrap();

    match m.validate_for_completion() {
        CompletionReadiness::NotReady(mismatches) => {
            assert_eq!(mismatches.len(), 1);
            assert_eq!(mismatches[0].field, LimitField::Total);
            assert_eq!(mismatches[0].expected, 3);
            assert_eq!(mismatches[0].actual, 2);
        }
        CompletionReadiness::Ready => panic!("expected not ready"),
    }

    m.toggle_select("C").unwrap();
    assert!(m.validate_for_completion().is_ready());
}

#[test]
fn test_validation_rejects_over_selection_loaded_from_store() {
    let mut selection = SelectionMap::new();
    for id in ["A", "B", "C"] {
        let mut photo = SelectedPhoto::new(id);
        photo.selected = true;
        selection.insert(id.to_string(), photo);
    }
    let m = SelectionStateMachine::new(
        "s",
        SelectionSettings::with_total(2),
        SessionStatus::Selecting,
        selection,
    );

    assert!(!m.validate_for_completion().is_ready());
}

#[test]
fn test_complete_requires_consent() {
    let mut m = machine(1);
    m.toggle_select("A").unwrap();

    let err = m.complete(ConsentAffirmation::declined()).unwrap_err();

    assert!(matches!(err, ProofingError::ConsentRequired));
    assert_eq!(m.status(), SessionStatus::Selecting);
}

#[test]
fn test_complete_refuses_mismatch() {
    let mut m = machine(2);
    m.toggle_select("A").unwrap();

    let err = m.complete(ConsentAffirmation::affirmed()).unwrap_err();

    assert!(matches!(err, ProofingError::CompletionNotReady(ref v) if v.len() == 1));
    assert!(!m.is_locked());
}

#[test]
fn test_mutations_after_completion_are_noops() {
    let mut m = machine_with_cover(1, 1);
    m.toggle_select("A").unwrap();
    m.toggle_extra("A", "cover").unwrap();
    m.complete(ConsentAffirmation::affirmed()).unwrap();
    let before = m.clone();

    assert_eq!(m.toggle_select("A"), Err(Rejection::Locked));
    assert_eq!(m.toggle_select("B"), Err(Rejection::Locked));
    assert_eq!(m.toggle_extra("A", "cover"), Err(Rejection::Locked));
    assert_eq!(m.update_comment("A", "late"), Err(Rejection::Locked));

    assert_eq!(m, before);
    assert!(matches!(
        m.complete(ConsentAffirmation::affirmed()),
        Err(ProofingError::Rejected(Rejection::Locked))
    ));
}

#[test]
fn test_rollback_completion_restores_previous_status() {
    let mut m = machine(1);
    m.toggle_select("A").unwrap();
    let ticket = m.complete(ConsentAffirmation::affirmed()).unwrap();
    assert!(m.is_locked());

    m.rollback_completion(ticket);

    assert_eq!(m.status(), SessionStatus::Selecting);
    assert!(m.toggle_select("A").is_ok());
}

#[test]
fn test_first_mutation_moves_to_selecting() {
    let mut m = machine(2);
    assert_eq!(m.status(), SessionStatus::Viewed);
    m.toggle_select("A").unwrap();
    assert_eq!(m.status(), SessionStatus::Selecting);
}

#[test]
fn test_rejection_does_not_mark_dirty() {
    let mut m = machine(0);
    assert!(!m.is_dirty());
    let _ = m.toggle_select("A");
    assert!(!m.is_dirty());
}

#[test]
fn test_dirty_tracking_survives_in_flight_edits() {
    let mut m = machine(3);
    m.toggle_select("A").unwrap();
    let snapshot = m.snapshot();

    // Edit lands while the snapshot is being written.
    m.toggle_select("B").unwrap();
    m.mark_saved(snapshot.revision);

    assert!(m.is_dirty());
    let next = m.snapshot();
    m.mark_saved(next.revision);
    assert!(!m.is_dirty());
}

#[test]
fn test_mark_viewed_only_from_waiting() {
    let mut m = SelectionStateMachine::new(
        "s",
        SelectionSettings::with_total(1),
        SessionStatus::Waiting,
        SelectionMap::new(),
    );
    assert!(m.mark_viewed());
    assert_eq!(m.status(), SessionStatus::Viewed);
    assert!(!m.mark_viewed());
}
