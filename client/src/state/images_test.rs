use super::*;
use canvas::Layer;

fn image(src: &str) -> Image {
    Image {
        id: "i1".into(),
        user: None,
        src: src.into(),
        x: 0.0,
        y: 0.0,
        width: 10.0,
        height: 10.0,
        layer: Layer::Image,
        order: 0,
    }
}

#[test]
fn loading_image_is_not_paintable() {
    let mut assets = ImageAssets::new();
    assets.request("/uploads/a.png");
    assert_eq!(assets.state("/uploads/a.png"), Some(AssetState::Loading));
    assert!(!assets.is_paintable(&image("/uploads/a.png")));
}

#[test]
fn ready_image_is_paintable() {
    let mut assets = ImageAssets::new();
    assets.request("/uploads/a.png");
    assets.mark_ready("/uploads/a.png");
    assert!(assets.is_paintable(&image("/uploads/a.png")));
}

#[test]
fn failed_decode_skips_only_that_asset() {
    let mut assets = ImageAssets::new();
    assets.mark_failed("/uploads/broken.png");
    assets.mark_ready("/uploads/fine.png");

    assert!(!assets.is_paintable(&image("/uploads/broken.png")));
    assert!(assets.is_paintable(&image("/uploads/fine.png")));
}

#[test]
fn untracked_source_is_not_paintable() {
    let assets = ImageAssets::new();
    assert!(!assets.is_paintable(&image("/uploads/nowhere.png")));
}

#[test]
fn request_never_downgrades_ready() {
    let mut assets = ImageAssets::new();
    assets.mark_ready("/uploads/a.png");
    assets.request("/uploads/a.png");
    assert_eq!(assets.state("/uploads/a.png"), Some(AssetState::Ready));
}
