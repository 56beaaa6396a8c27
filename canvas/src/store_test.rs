use super::*;
use crate::item::{Layer, Point};

fn stroke(id: &str, order: i64) -> Stroke {
    Stroke {
        id: id.into(),
        user: Some("Alice".into()),
        color: "#ff0000".into(),
        size: 4.0,
        points: vec![Point { x: 0.0, y: 0.0 }, Point { x: 10.0, y: 10.0 }],
        layer: Layer::User,
        order,
        group_id: None,
    }
}

fn text(id: &str, order: i64) -> Text {
    Text {
        id: id.into(),
        user: Some("Alice".into()),
        lines: vec!["hello".into(), "world".into()],
        x: 5.0,
        y: 6.0,
        font_size: 16.0,
        color: "#222222".into(),
        layer: Layer::User,
        order,
        created_at: 1_700_000_000_000,
        label: String::new(),
    }
}

fn image(id: &str, order: i64) -> Image {
    Image {
        id: id.into(),
        user: Some("Alice".into()),
        src: "/uploads/abc/pic.png".into(),
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 80.0,
        layer: Layer::Image,
        order,
    }
}

#[test]
fn duplicate_insert_keeps_first_values() {
    let mut store = ItemStore::new();
    assert!(store.insert_stroke(stroke("s1", 0)));

    let mut dup = stroke("s1", 0);
    dup.color = "#00ff00".into();
    assert!(!store.insert_stroke(dup));

    assert_eq!(store.strokes().len(), 1);
    assert_eq!(store.stroke("s1").unwrap().color, "#ff0000");
}

#[test]
fn order_counter_tracks_max_seen() {
    let mut store = ItemStore::new();
    store.insert_stroke(stroke("a", 3));
    store.insert_text(text("b", 7));
    store.insert_stroke(stroke("c", 1));

    // Next auto-assigned rank is one past the maximum seen, regardless of
    // arrival order.
    assert_eq!(store.next_order(), 8);
    assert_eq!(store.next_order(), 9);
}

#[test]
fn images_share_the_order_counter() {
    let mut store = ItemStore::new();
    store.insert_image(image("i1", 12));
    assert_eq!(store.next_order(), 13);
}

#[test]
fn patch_merges_named_fields_only() {
    let mut store = ItemStore::new();
    store.insert_text(text("t1", 0));

    let patch = TextPatch { x: Some(42.0), label: Some("todo".into()), ..TextPatch::default() };
    let merged = store.patch_text("t1", &patch).unwrap();

    assert!((merged.x - 42.0).abs() < f64::EPSILON);
    assert!((merged.y - 6.0).abs() < f64::EPSILON);
    assert_eq!(merged.label, "todo");
    assert_eq!(merged.lines, vec!["hello".to_owned(), "world".to_owned()]);
}

#[test]
fn patch_on_missing_id_is_a_noop() {
    let mut store = ItemStore::new();
    store.insert_stroke(stroke("s1", 0));

    let patch = StrokePatch { color: Some("#0000ff".into()), ..StrokePatch::default() };
    assert!(store.patch_stroke("ghost", &patch).is_none());
    assert_eq!(store.stroke("s1").unwrap().color, "#ff0000");
    assert_eq!(store.len(), 1);
}

#[test]
fn remove_is_total() {
    let mut store = ItemStore::new();
    store.insert_image(image("i1", 0));

    assert!(store.remove(ItemKind::Image, "i1").is_some());
    assert!(store.remove(ItemKind::Image, "i1").is_none());
    assert!(store.remove(ItemKind::Stroke, "nope").is_none());
    assert!(store.is_empty());
}

#[test]
fn remove_stroke_group_takes_all_members() {
    let mut store = ItemStore::new();
    let mut a = stroke("a", 0);
    a.group_id = Some("grid".into());
    let mut b = stroke("b", 1);
    b.group_id = Some("grid".into());
    let c = stroke("c", 2);
    store.insert_stroke(a);
    store.insert_stroke(b);
    store.insert_stroke(c);

    let removed = store.remove_stroke_group("grid");
    assert_eq!(removed.len(), 2);
    assert_eq!(store.strokes().len(), 1);
    assert_eq!(store.strokes()[0].id, "c");
}

#[test]
fn snapshot_round_trip_preserves_insertion_order() {
    let mut store = ItemStore::new();
    store.insert_stroke(stroke("s2", 5));
    store.insert_stroke(stroke("s1", 5));
    store.set_title(Some("plans".into()));

    let snapshot = store.snapshot();
    let restored = ItemStore::from_snapshot(snapshot);

    // Equal order values keep stable list position for tie-breaking.
    let ids: Vec<&str> = restored.strokes().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s2", "s1"]);
    assert_eq!(restored.title(), Some("plans"));
    // The restored counter is past the max seen rank.
    let mut restored = restored;
    assert_eq!(restored.next_order(), 6);
}

#[test]
fn clear_resets_everything() {
    let mut store = ItemStore::new();
    store.insert_text(text("t1", 9));
    store.set_title(Some("x".into()));
    store.clear();

    assert!(store.is_empty());
    assert!(store.title().is_none());
    assert_eq!(store.next_order(), 0);
}
