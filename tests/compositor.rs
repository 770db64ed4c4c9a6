use image::{Rgb, RgbImage, Rgba, RgbaImage};
use logoplace::{
    Anchor, DecorationAsset, DecorationPixels, blend, clamp_anchor, neutralize_background, resize,
};

fn checker(w: u32, h: u32) -> DecorationAsset {
    let img = RgbaImage::from_fn(w, h, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([200, 10, 10, 255])
        } else {
            Rgba([10, 10, 200, 90])
        }
    });
    DecorationAsset::new("checker.png", DecorationPixels::Rgba(img))
}

#[test]
fn resize_width_is_exact_and_height_tracks_aspect() {
    for (w, h) in [(300u32, 300u32), (301, 97), (17, 400), (1000, 3)] {
        let d = checker(w, h);
        for target in [1u32, 2, 50, 150, 333] {
            let r = resize(&d, target);
            assert_eq!(r.width(), target);
            let ideal = f64::from(target) * f64::from(h) / f64::from(w);
            assert!(
                (f64::from(r.height()) - ideal.max(1.0)).abs() <= 1.0,
                "{w}x{h} -> {target}: got {}",
                r.height()
            );
        }
        assert_eq!(d.width(), w);
    }
}

#[test]
fn blend_never_changes_base_size() {
    let deco = checker(40, 30);
    for anchor in [
        Anchor::new(-39, -29),
        Anchor::new(-10, 5),
        Anchor::new(0, 0),
        Anchor::new(60, 70),
        Anchor::new(99, 99),
        Anchor::new(500, -500),
    ] {
        let mut base = RgbImage::from_pixel(100, 100, Rgb([50, 60, 70]));
        blend(&mut base, &deco, anchor);
        assert_eq!(base.dimensions(), (100, 100));
    }
}

#[test]
fn opaque_blend_is_idempotent() {
    let deco = DecorationAsset::new(
        "opaque.png",
        DecorationPixels::Rgb(RgbImage::from_fn(20, 10, |x, y| {
            Rgb([(x * 12) as u8, (y * 20) as u8, 33])
        })),
    );
    let mut once = RgbImage::from_pixel(64, 48, Rgb([120, 130, 140]));
    blend(&mut once, &deco, Anchor::new(50, 40));
    let mut twice = once.clone();
    blend(&mut twice, &deco, Anchor::new(50, 40));
    assert_eq!(once, twice);
}

#[test]
fn clamped_anchor_always_overlaps() {
    let deco = checker(30, 20);
    for raw in [
        Anchor::new(-10_000, 5),
        Anchor::new(10_000, 10_000),
        Anchor::new(-30, -20),
        Anchor::new(80, 60),
    ] {
        let top_left = clamp_anchor(raw, 30, 20, 80, 60);
        let mut base = RgbImage::from_pixel(80, 60, Rgb([0, 0, 0]));
        let rect = blend(&mut base, &deco, top_left).expect("overlap");
        assert!(!rect.is_empty());
    }
}

#[test]
fn neutralized_photo_keeps_size_and_dark_pixels() {
    let photo = RgbImage::from_fn(8, 8, |x, _| {
        if x < 4 {
            Rgb([250, 250, 250])
        } else {
            Rgb([30, 40, 50])
        }
    });
    let out = neutralize_background(&photo);
    assert_eq!(out.dimensions(), (8, 8));
    assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 0]));
    assert_eq!(out.get_pixel(7, 7), &Rgb([30, 40, 50]));
}
