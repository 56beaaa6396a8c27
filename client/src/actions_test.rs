use super::*;
use canvas::{DraftStroke, Point};
use frames::Status;

fn draft(id: &str, user: &str, order: i64) -> DraftStroke {
    DraftStroke {
        id: id.into(),
        user: user.into(),
        color: "#5500aa".into(),
        size: 3.0,
        points: vec![Point { x: 2.0, y: 2.0 }, Point { x: 8.0, y: 4.0 }],
        order,
        created_at: 0,
    }
}

fn seeded_board() -> ClientBoard {
    let mut board = ClientBoard::new("abc123xy");
    board.identify("Alice");
    board.active_layer = Layer::Draft;
    board.drafts.insert(draft("d1", "Alice", 0));
    board
}

#[test]
fn submit_copies_draft_into_public_layer_with_fresh_id() {
    let mut board = seeded_board();
    let mut n = 0;
    let frames_out = submit_drafts(&mut board, &["d1".into()], || {
        n += 1;
        format!("fresh-{n}")
    });

    // Draft gone, public stroke present under a new id and the user layer.
    assert!(board.drafts.get("d1").is_none());
    let stroke = board.items.stroke("fresh-1").expect("public stroke");
    assert_eq!(stroke.layer, Layer::User);
    assert_eq!(stroke.user.as_deref(), Some("Alice"));
    assert_eq!(stroke.color, "#5500aa");
    assert_eq!(stroke.points.len(), 2);

    // One add plus one draft removal, all request frames on the board.
    assert_eq!(frames_out.len(), 2);
    assert!(frames_out.iter().all(|f| f.status == Status::Request));
    assert!(frames_out.iter().all(|f| f.board_id.as_deref() == Some("abc123xy")));
    assert_eq!(frames_out[0].syscall, "stroke:add");
    assert_eq!(frames_out[1].syscall, "draft:stroke:remove");
    assert_eq!(frames_out[1].data.get("id").and_then(|v| v.as_str()), Some("d1"));
}

#[test]
fn submit_skips_foreign_and_unknown_drafts() {
    let mut board = seeded_board();
    board.drafts.insert(draft("d2", "Bob", 0));

    let frames_out = submit_drafts(&mut board, &["d2".into(), "ghost".into()], || "x".into());
    assert!(frames_out.is_empty());
    assert!(board.drafts.get("d2").is_some());
    assert!(board.items.is_empty());
}

#[test]
fn fresh_item_ids_are_unique_and_plain() {
    let a = fresh_item_id();
    let b = fresh_item_id();
    assert_ne!(a, b);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));

    // Usable directly as the id source for a submission.
    let mut board = seeded_board();
    let frames_out = submit_drafts(&mut board, &["d1".into()], fresh_item_id);
    assert_eq!(frames_out.len(), 2);
}

#[test]
fn submit_requires_draft_layer() {
    let mut board = seeded_board();
    board.active_layer = Layer::User;
    let frames_out = submit_drafts(&mut board, &["d1".into()], || "x".into());
    assert!(frames_out.is_empty());
    assert!(board.drafts.get("d1").is_some());
}

#[test]
fn submit_requires_identity() {
    let mut board = seeded_board();
    board.user = None;
    let frames_out = submit_drafts(&mut board, &["d1".into()], || "x".into());
    assert!(frames_out.is_empty());
}

fn public_stroke(id: &str, user: &str, group_id: Option<&str>) -> frames::Data {
    let mut d = frames::Data::new();
    d.insert("id".into(), serde_json::json!(id));
    d.insert("user".into(), serde_json::json!(user));
    d.insert("color".into(), serde_json::json!("#000000"));
    d.insert("size".into(), serde_json::json!(1.0));
    d.insert("points".into(), serde_json::json!([{"x": 0.0, "y": 0.0}]));
    d.insert("order".into(), serde_json::json!(0));
    if let Some(g) = group_id {
        d.insert("group_id".into(), serde_json::json!(g));
    }
    d
}

fn add_public(board: &mut ClientBoard, data: frames::Data) {
    board.apply_frame(&frames::Frame::request("stroke:add", data).with_board_id("abc123xy"));
}

#[test]
fn delete_stroke_expands_group_links() {
    let mut board = ClientBoard::new("abc123xy");
    board.identify("Alice");
    add_public(&mut board, public_stroke("a", "Alice", Some("grid")));
    add_public(&mut board, public_stroke("b", "Alice", Some("grid")));
    add_public(&mut board, public_stroke("c", "Alice", None));

    let frames_out = delete_stroke(&mut board, "a");

    // Both grid members go; the ungrouped stroke survives.
    assert_eq!(frames_out.len(), 2);
    assert!(frames_out.iter().all(|f| f.syscall == "item:remove"));
    assert!(board.items.stroke("a").is_none());
    assert!(board.items.stroke("b").is_none());
    assert!(board.items.stroke("c").is_some());
}

#[test]
fn delete_stroke_respects_permission() {
    let mut board = ClientBoard::new("abc123xy");
    board.identify("Bob");
    add_public(&mut board, public_stroke("a", "Alice", None));

    assert!(delete_stroke(&mut board, "a").is_empty());
    assert!(board.items.stroke("a").is_some());

    // Stale id is a no-op too.
    assert!(delete_stroke(&mut board, "ghost").is_empty());
}

#[test]
fn submitted_strokes_take_consecutive_public_ranks() {
    let mut board = seeded_board();
    board.drafts.insert(draft("d2", "Alice", 1));
    // Public counter already advanced past an existing stroke.
    board.apply_frame(
        &frames::Frame::request("stroke:add", {
            let mut d = frames::Data::new();
            d.insert("id".into(), serde_json::json!("s0"));
            d.insert("color".into(), serde_json::json!("#000000"));
            d.insert("size".into(), serde_json::json!(1.0));
            d.insert("points".into(), serde_json::json!([{"x": 0.0, "y": 0.0}]));
            d.insert("order".into(), serde_json::json!(4));
            d
        })
        .with_board_id("abc123xy"),
    );

    let mut n = 0;
    submit_drafts(&mut board, &["d1".into(), "d2".into()], || {
        n += 1;
        format!("p{n}")
    });

    assert_eq!(board.items.stroke("p1").unwrap().order, 5);
    assert_eq!(board.items.stroke("p2").unwrap().order, 6);
}
