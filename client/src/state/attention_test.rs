use super::*;

#[test]
fn start_then_update_tracks_latest_position() {
    let mut pointers = AttentionPointers::new();
    pointers.apply_update("Carol", 1.0, 2.0, "#ff3b30", 1_000);
    pointers.apply_update("Carol", 5.0, 6.0, "#ff3b30", 2_000);

    let p = pointers.get("Carol").unwrap();
    assert!((p.x - 5.0).abs() < f64::EPSILON);
    assert_eq!(p.updated_at, 2_000);
    assert_eq!(pointers.len(), 1);
}

#[test]
fn explicit_end_removes_pointer() {
    let mut pointers = AttentionPointers::new();
    pointers.apply_update("Carol", 1.0, 2.0, "#ff3b30", 1_000);
    pointers.apply_end("Carol");
    assert!(pointers.is_empty());
}

#[test]
fn pointer_expires_without_end_event() {
    let mut pointers = AttentionPointers::new();
    pointers.apply_update("Carol", 1.0, 2.0, "#ff3b30", 1_000);

    // A render pass inside the window still shows Carol.
    assert_eq!(pointers.visible(1_000 + ATTENTION_TIMEOUT_MS).len(), 1);

    // One past the window: gone, even though no attention:end arrived.
    assert!(pointers.visible(1_001 + ATTENTION_TIMEOUT_MS).is_empty());
    assert!(pointers.get("Carol").is_none());
}

#[test]
fn sweep_only_drops_stale_pointers() {
    let mut pointers = AttentionPointers::new();
    pointers.apply_update("Carol", 1.0, 2.0, "#ff3b30", 0);
    pointers.apply_update("Dave", 3.0, 4.0, "#34c759", 9_000);

    let expired = pointers.sweep(12_000);
    assert_eq!(expired, 1);
    assert!(pointers.get("Carol").is_none());
    assert!(pointers.get("Dave").is_some());
}

#[test]
fn fresh_update_resets_the_window() {
    let mut pointers = AttentionPointers::new();
    pointers.apply_update("Carol", 1.0, 2.0, "#ff3b30", 0);
    pointers.apply_update("Carol", 1.5, 2.5, "#ff3b30", 8_000);

    assert_eq!(pointers.sweep(12_000), 0);
    assert!(pointers.get("Carol").is_some());
}
