use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    assets::scratch::ScratchDir,
    foundation::error::{PlaceError, PlaceResult},
};

/// CSS reference resolution; SVG user units are 1/96 inch.
const SVG_BASE_DPI: f32 = 96.0;
const MAX_DIM: u32 = 16_384;

/// Capability: rasterize the first page of a paged vector document into an image file.
///
/// The produced file lives inside the caller's [`ScratchDir`] and disappears with it.
pub trait PageRasterizer: Send + Sync {
    /// Rasterize page one of `source`, returning the path of the written raster.
    fn rasterize_first_page(&self, source: &Path, scratch: &ScratchDir) -> PlaceResult<PathBuf>;
}

/// Poppler's `pdftoppm` driven as a subprocess.
#[derive(Clone, Debug)]
pub struct Pdftoppm {
    /// Executable name or path.
    pub program: PathBuf,
    /// Output resolution.
    pub dpi: u32,
}

impl Pdftoppm {
    /// Use `program` at `dpi`.
    pub fn new(program: impl Into<PathBuf>, dpi: u32) -> Self {
        Self {
            program: program.into(),
            dpi,
        }
    }

    /// Check whether the executable can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-v")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }
}

impl PageRasterizer for Pdftoppm {
    fn rasterize_first_page(&self, source: &Path, scratch: &ScratchDir) -> PlaceResult<PathBuf> {
        let prefix = scratch.path().join("page");
        let out = Command::new(&self.program)
            .args(["-png", "-singlefile", "-f", "1", "-l", "1", "-r"])
            .arg(self.dpi.to_string())
            .arg(source)
            .arg(&prefix)
            .stdout(Stdio::null())
            .output()
            .map_err(|e| {
                PlaceError::decode(format!(
                    "failed to run '{}' for '{}': {e}",
                    self.program.display(),
                    source.display()
                ))
            })?;

        if !out.status.success() {
            return Err(PlaceError::decode(format!(
                "'{}' failed for '{}': {}",
                self.program.display(),
                source.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let page = prefix.with_extension("png");
        if !page.is_file() {
            return Err(PlaceError::decode(format!(
                "'{}' produced no page image for '{}'",
                self.program.display(),
                source.display()
            )));
        }
        Ok(page)
    }
}

/// Parse SVG bytes and rasterize them at `dpi` into straight-alpha RGBA8.
pub fn rasterize_svg(bytes: &[u8], dpi: u32) -> PlaceResult<image::RgbaImage> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| PlaceError::decode(format!("parse svg tree: {e}")))?;

    let scale = dpi as f32 / SVG_BASE_DPI;
    let (width, height) = svg_raster_size(&tree, scale)?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| PlaceError::decode("failed to allocate svg pixmap"))?;
    let sx = width as f32 / tree.size().width();
    let sy = height as f32 / tree.size().height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    let mut rgba = pixmap.take();
    demultiply_rgba8_in_place(&mut rgba);
    image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| PlaceError::decode("svg pixmap size mismatch"))
}

fn svg_raster_size(tree: &usvg::Tree, scale: f32) -> PlaceResult<(u32, u32)> {
    fn to_px(v: f32) -> PlaceResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(PlaceError::decode("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    let size = tree.size();
    let w = to_px(size.width() * scale)?;
    let h = to_px(size.height() * scale)?;
    if w > MAX_DIM || h > MAX_DIM {
        return Err(PlaceError::decode(format!(
            "svg raster size too large: {w}x{h} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }
    Ok((w, h))
}

fn demultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}
