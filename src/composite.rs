use image::{RgbImage, imageops::FilterType};

use crate::{
    assets::decode::{DecorationAsset, DecorationPixels},
    foundation::core::{Anchor, PixelRect},
};

/// Luminance at or above this is photo background.
pub const BACKGROUND_LUMA: u8 = 240;
/// Opaque decorations treat pixels with every channel at or above this as transparent.
pub const SYNTH_ALPHA_WHITE: u8 = 250;

/// Scale `decoration` to `target_width`, preserving aspect ratio.
///
/// Height is `round(target_width * h / w)`, at least 1. A zero source or target width returns
/// the input unchanged.
pub fn resize(decoration: &DecorationAsset, target_width: u32) -> DecorationAsset {
    let (w, h) = decoration.pixels.dimensions();
    if w == 0 || target_width == 0 {
        return decoration.clone();
    }
    let new_h = ((f64::from(target_width) * f64::from(h) / f64::from(w)).round() as u32).max(1);

    let pixels = match &decoration.pixels {
        DecorationPixels::Rgb(img) => DecorationPixels::Rgb(image::imageops::resize(
            img,
            target_width,
            new_h,
            FilterType::Triangle,
        )),
        DecorationPixels::Rgba(img) => DecorationPixels::Rgba(image::imageops::resize(
            img,
            target_width,
            new_h,
            FilterType::Triangle,
        )),
    };
    DecorationAsset::new(decoration.path.clone(), pixels)
}

/// Black out near-white background, keeping foreground pixels untouched.
pub fn neutralize_background(photo: &RgbImage) -> RgbImage {
    let luma = image::imageops::grayscale(photo);
    let mut out = photo.clone();
    for (px, l) in out.pixels_mut().zip(luma.pixels()) {
        if l.0[0] >= BACKGROUND_LUMA {
            *px = image::Rgb([0, 0, 0]);
        }
    }
    out
}

/// Pull `anchor` back so a `deco_w` x `deco_h` decoration overlaps a `base_w` x `base_h`
/// photo by at least one pixel. Empty extents leave the anchor as is.
pub fn clamp_anchor(anchor: Anchor, deco_w: u32, deco_h: u32, base_w: u32, base_h: u32) -> Anchor {
    if deco_w == 0 || deco_h == 0 || base_w == 0 || base_h == 0 {
        return anchor;
    }
    Anchor::new(
        anchor.x.clamp(1 - i64::from(deco_w), i64::from(base_w) - 1),
        anchor.y.clamp(1 - i64::from(deco_h), i64::from(base_h) - 1),
    )
}

/// Alpha-blend `decoration` onto `base` with its top-left at `top_left`.
///
/// Parts falling outside the base are cropped. Returns the written rectangle in base
/// coordinates, or `None` when nothing overlaps (base untouched).
pub fn blend(
    base: &mut RgbImage,
    decoration: &DecorationAsset,
    top_left: Anchor,
) -> Option<PixelRect> {
    let (dw, dh) = decoration.pixels.dimensions();
    let (bw, bh) = base.dimensions();

    let x0 = top_left.x.max(0);
    let y0 = top_left.y.max(0);
    let x1 = top_left.x.saturating_add(i64::from(dw)).min(i64::from(bw));
    let y1 = top_left.y.saturating_add(i64::from(dh)).min(i64::from(bh));
    if x1 <= x0 || y1 <= y0 {
        tracing::debug!(?top_left, dw, dh, bw, bh, "decoration does not overlap photo");
        return None;
    }

    // All in range of u32 after clipping against the base extent.
    let rect = PixelRect {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    };
    let sx = (x0 - top_left.x) as u32;
    let sy = (y0 - top_left.y) as u32;

    for row in 0..rect.height {
        for col in 0..rect.width {
            let (src, alpha) = source_pixel(&decoration.pixels, sx + col, sy + row);
            if alpha == 0 {
                continue;
            }
            let dst = base.get_pixel_mut(rect.x + col, rect.y + row);
            for c in 0..3 {
                dst.0[c] = mix(src[c], dst.0[c], alpha);
            }
        }
    }
    Some(rect)
}

fn source_pixel(pixels: &DecorationPixels, x: u32, y: u32) -> ([u8; 3], u8) {
    match pixels {
        DecorationPixels::Rgba(img) => {
            let [r, g, b, a] = img.get_pixel(x, y).0;
            ([r, g, b], a)
        }
        DecorationPixels::Rgb(img) => {
            let rgb = img.get_pixel(x, y).0;
            let alpha = if rgb.iter().all(|&c| c >= SYNTH_ALPHA_WHITE) {
                0
            } else {
                255
            };
            (rgb, alpha)
        }
    }
}

fn mix(src: u8, dst: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    ((a * u32::from(src) + (255 - a) * u32::from(dst) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    fn rgb_deco(w: u32, h: u32, px: [u8; 3]) -> DecorationAsset {
        DecorationAsset::new("d.png", DecorationPixels::Rgb(RgbImage::from_pixel(w, h, Rgb(px))))
    }

    #[test]
    fn mix_endpoints() {
        assert_eq!(mix(200, 10, 255), 200);
        assert_eq!(mix(200, 10, 0), 10);
        assert_eq!(mix(255, 0, 128), 128);
    }

    #[test]
    fn resize_preserves_aspect() {
        let d = rgb_deco(300, 100, [1, 2, 3]);
        let r = resize(&d, 150);
        assert_eq!((r.width(), r.height()), (150, 50));
        let thin = rgb_deco(1000, 1, [1, 2, 3]);
        assert_eq!(resize(&thin, 10).height(), 1);
        assert_eq!(resize(&d, 0), d);
    }

    #[test]
    fn neutralize_blacks_out_white_only() {
        let mut img = RgbImage::from_pixel(2, 1, Rgb([255, 255, 255]));
        img.put_pixel(1, 0, Rgb([10, 120, 30]));
        let out = neutralize_background(&img);
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([10, 120, 30]));
        assert_eq!(img.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn synthesized_alpha_skips_near_white() {
        let mut deco = RgbImage::from_pixel(2, 1, Rgb([251, 252, 255]));
        deco.put_pixel(1, 0, Rgb([251, 249, 255]));
        let deco = DecorationAsset::new("d.png", DecorationPixels::Rgb(deco));
        let mut base = RgbImage::from_pixel(2, 1, Rgb([7, 7, 7]));
        blend(&mut base, &deco, Anchor::new(0, 0));
        assert_eq!(base.get_pixel(0, 0), &Rgb([7, 7, 7]));
        assert_eq!(base.get_pixel(1, 0), &Rgb([251, 249, 255]));
    }

    #[test]
    fn straight_alpha_is_used_when_present() {
        let deco = DecorationAsset::new(
            "d.png",
            DecorationPixels::Rgba(RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 128]))),
        );
        let mut base = RgbImage::from_pixel(1, 1, Rgb([0, 0, 255]));
        blend(&mut base, &deco, Anchor::new(0, 0));
        assert_eq!(base.get_pixel(0, 0), &Rgb([128, 0, 127]));
    }

    #[test]
    fn negative_anchor_crops_leading_edge() {
        let mut deco = RgbImage::from_pixel(4, 4, Rgb([10, 10, 10]));
        deco.put_pixel(3, 3, Rgb([99, 0, 0]));
        let deco = DecorationAsset::new("d.png", DecorationPixels::Rgb(deco));
        let mut base = RgbImage::from_pixel(5, 5, Rgb([200, 200, 200]));
        let rect = blend(&mut base, &deco, Anchor::new(-3, -3)).unwrap();
        assert_eq!(rect, PixelRect { x: 0, y: 0, width: 1, height: 1 });
        assert_eq!(base.get_pixel(0, 0), &Rgb([99, 0, 0]));
        assert_eq!(base.get_pixel(1, 1), &Rgb([200, 200, 200]));
    }

    #[test]
    fn overflow_crops_trailing_edge() {
        let deco = rgb_deco(4, 4, [10, 10, 10]);
        let mut base = RgbImage::from_pixel(5, 5, Rgb([200, 200, 200]));
        let rect = blend(&mut base, &deco, Anchor::new(3, 4)).unwrap();
        assert_eq!(rect, PixelRect { x: 3, y: 4, width: 2, height: 1 });
        assert_eq!(base.dimensions(), (5, 5));
    }

    #[test]
    fn no_overlap_is_noop() {
        let deco = rgb_deco(4, 4, [10, 10, 10]);
        let mut base = RgbImage::from_pixel(5, 5, Rgb([200, 200, 200]));
        let before = base.clone();
        assert!(blend(&mut base, &deco, Anchor::new(5, 0)).is_none());
        assert!(blend(&mut base, &deco, Anchor::new(-4, 0)).is_none());
        assert_eq!(base, before);
    }

    #[test]
    fn extreme_anchors_are_noops() {
        let deco = rgb_deco(4, 4, [10, 10, 10]);
        let mut base = RgbImage::from_pixel(10, 10, Rgb([200, 200, 200]));
        let before = base.clone();
        for anchor in [
            Anchor::new(i64::MAX - 1, 0),
            Anchor::new(0, i64::MAX),
            Anchor::new(i64::MIN, i64::MIN),
        ] {
            assert!(blend(&mut base, &deco, anchor).is_none());
        }
        assert_eq!(base, before);
    }

    #[test]
    fn zero_width_source_is_returned_unchanged() {
        let empty = DecorationAsset::new("e.png", DecorationPixels::Rgb(RgbImage::new(0, 5)));
        let out = resize(&empty, 150);
        assert_eq!(out, empty);
        assert_eq!((out.width(), out.height()), (0, 5));
    }

    #[test]
    fn clamp_anchor_keeps_one_pixel_overlap() {
        assert_eq!(clamp_anchor(Anchor::new(900, -900), 4, 4, 10, 10), Anchor::new(9, -3));
        assert_eq!(clamp_anchor(Anchor::new(2, 3), 4, 4, 10, 10), Anchor::new(2, 3));
    }
}
