use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use image::{DynamicImage, RgbImage, RgbaImage};

use crate::{
    assets::{
        raster::{PageRasterizer, rasterize_svg},
        scratch::ScratchDir,
    },
    foundation::error::{PlaceError, PlaceResult},
};

/// A decoded product photograph.
#[derive(Clone, Debug)]
pub struct ProductPhoto {
    /// Resolved source path.
    pub path: PathBuf,
    /// 3-channel pixels. Shared so extraction can run off-thread.
    pub image: Arc<RgbImage>,
}

impl ProductPhoto {
    /// Wrap an already-decoded raster.
    pub fn new(path: impl Into<PathBuf>, image: RgbImage) -> Self {
        Self {
            path: path.into(),
            image: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decoration pixels, with or without an alpha channel.
#[derive(Clone, Debug, PartialEq)]
pub enum DecorationPixels {
    /// No alpha channel; near-white is treated as background at blend time.
    Rgb(RgbImage),
    /// Straight (non-premultiplied) alpha.
    Rgba(RgbaImage),
}

impl DecorationPixels {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            DecorationPixels::Rgb(img) => img.dimensions(),
            DecorationPixels::Rgba(img) => img.dimensions(),
        }
    }

    /// Number of color channels (3 or 4).
    pub fn channels(&self) -> u8 {
        match self {
            DecorationPixels::Rgb(_) => 3,
            DecorationPixels::Rgba(_) => 4,
        }
    }

    /// Keep alpha when the source has it, otherwise normalize to RGB8.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        if img.color().has_alpha() {
            DecorationPixels::Rgba(img.to_rgba8())
        } else {
            DecorationPixels::Rgb(img.to_rgb8())
        }
    }
}

/// A decoded decoration (logo), immutable once loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct DecorationAsset {
    /// Resolved source path (the document, not an intermediate page raster).
    pub path: PathBuf,
    pub pixels: DecorationPixels,
}

impl DecorationAsset {
    pub fn new(path: impl Into<PathBuf>, pixels: DecorationPixels) -> Self {
        Self {
            path: path.into(),
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.pixels.dimensions().1
    }
}

/// Decode a product photo into RGB8.
pub fn load_photo(path: &Path) -> PlaceResult<ProductPhoto> {
    let img = decode_raster_file(path)?;
    Ok(ProductPhoto::new(path, img.to_rgb8()))
}

/// Decode a decoration source.
///
/// Raster files decode directly; SVG rasterizes in-process at `vector_dpi`; PDF goes through
/// `pages`, writing the intermediate page into `scratch`.
pub fn load_decoration(
    path: &Path,
    pages: &dyn PageRasterizer,
    scratch: &ScratchDir,
    vector_dpi: u32,
) -> PlaceResult<DecorationAsset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let pixels = match ext.as_str() {
        "svg" => {
            let bytes = std::fs::read(path)
                .map_err(|e| PlaceError::decode(format!("read svg '{}': {e}", path.display())))?;
            DecorationPixels::Rgba(rasterize_svg(&bytes, vector_dpi)?)
        }
        "pdf" => {
            let page = pages.rasterize_first_page(path, scratch)?;
            tracing::debug!(page = %page.display(), "rasterized first pdf page");
            DecorationPixels::Rgba(decode_raster_file(&page)?.to_rgba8())
        }
        _ => DecorationPixels::from_dynamic(decode_raster_file(path)?),
    };

    Ok(DecorationAsset::new(path, pixels))
}

fn decode_raster_file(path: &Path) -> PlaceResult<DynamicImage> {
    let reader = image::ImageReader::open(path)
        .map_err(|e| PlaceError::decode(format!("open '{}': {e}", path.display())))?
        .with_guessed_format()
        .map_err(|e| PlaceError::decode(format!("sniff format '{}': {e}", path.display())))?;
    reader
        .decode()
        .map_err(|e| PlaceError::decode(format!("decode '{}': {e}", path.display())))
}
