use super::*;
use frames::Data;
use serde_json::json;

fn stroke_data(id: &str, user: &str, order: i64) -> Data {
    let mut data = Data::new();
    data.insert("id".into(), json!(id));
    data.insert("user".into(), json!(user));
    data.insert("color".into(), json!("#ff0000"));
    data.insert("size".into(), json!(4.0));
    data.insert("points".into(), json!([{"x": 0.0, "y": 0.0}, {"x": 10.0, "y": 10.0}]));
    data.insert("layer".into(), json!("user"));
    data.insert("order".into(), json!(order));
    data
}

fn add_frame(syscall: &str, data: Data) -> Frame {
    Frame::request(syscall, data).with_board_id("abc123xy")
}

#[test]
fn init_replaces_local_state() {
    let mut board = ClientBoard::new("abc123xy");
    board.apply_frame(&add_frame("stroke:add", stroke_data("old", "Alice", 0)));

    let req = Frame::request("board:join", Data::new()).with_board_id("abc123xy");
    let mut init = Data::new();
    init.insert("title".into(), json!("retro"));
    init.insert("strokes".into(), json!([{
        "id": "s1", "user": "Bob", "color": "#00ff00", "size": 2.0,
        "points": [{"x": 1.0, "y": 1.0}], "layer": "user", "order": 5
    }]));
    init.insert("texts".into(), json!([]));
    init.insert("images".into(), json!([]));
    assert!(board.apply_frame(&req.done_with(init)));

    assert!(board.items.stroke("old").is_none());
    assert!(board.items.stroke("s1").is_some());
    assert_eq!(board.items.title(), Some("retro"));
    // Counter resumes past the snapshot's max rank.
    assert_eq!(board.items.next_order(), 6);
}

#[test]
fn duplicate_add_is_absorbed() {
    let mut board = ClientBoard::new("abc123xy");
    assert!(board.apply_frame(&add_frame("stroke:add", stroke_data("s1", "Alice", 0))));
    // Reconnect replay delivers the same stroke again.
    assert!(!board.apply_frame(&add_frame("stroke:add", stroke_data("s1", "Alice", 0))));
    assert_eq!(board.items.strokes().len(), 1);
}

#[test]
fn update_on_missing_id_never_resurrects() {
    let mut board = ClientBoard::new("abc123xy");
    let mut data = Data::new();
    data.insert("type".into(), json!("stroke"));
    data.insert("id".into(), json!("gone"));
    data.insert("patch".into(), json!({"color": "#0000ff"}));

    assert!(!board.apply_frame(&add_frame("item:update", data)));
    assert!(board.items.is_empty());
}

#[test]
fn remove_on_missing_id_is_noop() {
    let mut board = ClientBoard::new("abc123xy");
    let mut data = Data::new();
    data.insert("type".into(), json!("text"));
    data.insert("id".into(), json!("gone"));
    assert!(!board.apply_frame(&add_frame("item:remove", data)));
}

#[test]
fn update_merges_patch_fields() {
    let mut board = ClientBoard::new("abc123xy");
    board.apply_frame(&add_frame("stroke:add", stroke_data("s1", "Alice", 0)));

    let mut data = Data::new();
    data.insert("type".into(), json!("stroke"));
    data.insert("id".into(), json!("s1"));
    data.insert("patch".into(), json!({"color": "#123456"}));
    assert!(board.apply_frame(&add_frame("item:update", data)));

    let stroke = board.items.stroke("s1").unwrap();
    assert_eq!(stroke.color, "#123456");
    assert!((stroke.size - 4.0).abs() < f64::EPSILON);
}

#[test]
fn foreign_draft_add_is_filtered_by_owner() {
    let mut board = ClientBoard::new("abc123xy");
    board.identify("Bob");
    board.active_layer = Layer::Draft;

    let mut data = Data::new();
    data.insert("id".into(), json!("d1"));
    data.insert("user".into(), json!("Alice"));
    data.insert("color".into(), json!("#333333"));
    data.insert("size".into(), json!(2.0));
    data.insert("points".into(), json!([{"x": 1.0, "y": 1.0}]));
    data.insert("order".into(), json!(0));

    assert!(!board.apply_frame(&add_frame("draft:stroke:add", data)));
    assert!(board.drafts.is_empty());
    assert!(board.visible_drafts().is_empty());
}

#[test]
fn draft_init_loads_own_drafts() {
    let mut board = ClientBoard::new("abc123xy");
    board.identify("Alice");

    let req = Frame::request("user:identify", Data::new()).with_board_id("abc123xy");
    let mut data = Data::new();
    data.insert("drafts".into(), json!([
        {"id": "d1", "user": "Alice", "color": "#333333", "size": 2.0,
         "points": [{"x": 1.0, "y": 1.0}], "order": 0, "created_at": 0},
        {"id": "d2", "user": "Bob", "color": "#333333", "size": 2.0,
         "points": [{"x": 1.0, "y": 1.0}], "order": 0, "created_at": 0},
    ]));
    assert!(board.apply_frame(&req.done_with(data)));

    assert!(board.drafts_loaded);
    assert_eq!(board.drafts.len(), 1);
    assert!(board.drafts.get("d1").is_some());
}

#[test]
fn other_users_drafts_stay_invisible_on_draft_layer() {
    let mut board = ClientBoard::new("abc123xy");
    board.identify("Bob");
    board.active_layer = Layer::Draft;

    // A stroke promoted onto the draft item layer by Alice is surfaced to the
    // store but filtered out of Bob's visible set.
    let mut data = stroke_data("s1", "Alice", 0);
    data.insert("layer".into(), json!("draft"));
    board.apply_frame(&add_frame("stroke:add", data));

    assert_eq!(board.items.strokes().len(), 1);
    assert!(board.visible_strokes().is_empty());
}

#[test]
fn title_update_applies() {
    let mut board = ClientBoard::new("abc123xy");
    let mut data = Data::new();
    data.insert("title".into(), json!("sprint plan"));
    assert!(board.apply_frame(&add_frame("board:title:update", data)));
    assert_eq!(board.items.title(), Some("sprint plan"));
}

#[test]
fn visible_strokes_sorted_by_order() {
    let mut board = ClientBoard::new("abc123xy");
    board.apply_frame(&add_frame("stroke:add", stroke_data("late", "Alice", 9)));
    board.apply_frame(&add_frame("stroke:add", stroke_data("early", "Alice", 2)));

    let ids: Vec<&str> = board.visible_strokes().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["early", "late"]);
}

#[test]
fn interaction_follows_the_engine_matrix() {
    let mut board = ClientBoard::new("abc123xy");
    board.identify("Bob");
    board.apply_frame(&add_frame("stroke:add", stroke_data("s1", "Alice", 0)));
    let stroke = board.items.stroke("s1").unwrap().clone();

    // Bob can move Alice's user-layer stroke from the user layer, but may
    // not delete it.
    board.active_layer = Layer::User;
    assert!(board.can_interact_stroke(&stroke));
    assert!(!board.can_delete_stroke(&stroke));

    // Images are interactable only from the image/admin contexts.
    assert!(!board.can_interact_image());
    board.active_layer = Layer::Image;
    assert!(board.can_interact_image());

    // The admin context is a full superset.
    board.active_layer = Layer::Admin;
    assert!(board.can_interact_stroke(&stroke));
    assert!(board.can_delete_stroke(&stroke));
}

#[test]
fn base_layer_texts_are_community_property() {
    let mut board = ClientBoard::new("abc123xy");
    board.identify("Bob");

    let mut data = Data::new();
    data.insert("id".into(), json!("t1"));
    data.insert("user".into(), json!("Alice"));
    data.insert("lines".into(), json!(["keep"]));
    data.insert("x".into(), json!(0.0));
    data.insert("y".into(), json!(0.0));
    data.insert("font_size".into(), json!(16.0));
    data.insert("color".into(), json!("#000000"));
    data.insert("layer".into(), json!("base"));
    data.insert("order".into(), json!(0));
    board.apply_frame(&add_frame("text:add", data));

    let text = board.items.text("t1").unwrap().clone();
    board.active_layer = Layer::Base;
    assert!(board.can_interact_text(&text));
    assert!(board.can_delete_text(&text));
}

#[test]
fn malformed_payload_is_dropped() {
    let mut board = ClientBoard::new("abc123xy");
    let mut data = Data::new();
    data.insert("id".into(), json!("s1"));
    // Missing color/size/points.
    assert!(!board.apply_frame(&add_frame("stroke:add", data)));
    assert!(board.items.is_empty());
}
