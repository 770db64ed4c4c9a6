#![forbid(unsafe_code)]

pub mod assets;
pub mod batch;
pub mod composite;
pub mod config;
pub mod export;
pub mod features;
pub mod foundation;
pub mod pipeline;
pub mod placement;

pub use assets::decode::{
    DecorationAsset, DecorationPixels, ProductPhoto, load_decoration, load_photo,
};
pub use assets::raster::{PageRasterizer, Pdftoppm, rasterize_svg};
pub use assets::resolve::{
    AssetKind, MatchKind, ResolvedAsset, detect_swapped_roots, list_subdirectories, resolve_asset,
};
pub use assets::scratch::ScratchDir;
pub use batch::{BatchReport, JobFailure, run_batch};
pub use composite::{blend, clamp_anchor, neutralize_background, resize};
pub use config::{JobRecord, Settings, load_jobs};
pub use export::{ExportSink, FileCopyExport, ManifestExport};
pub use features::{
    ExtractOutcome, ExtractorFactory, FeatureExtractor, Joint, KeypointSet, NoLandmarks,
    SidecarKeypoints, WorkerExtractor, extract_with_timeout,
};
pub use foundation::core::{Anchor, AnchorOrigin, PixelRect, Point};
pub use foundation::error::{PlaceError, PlaceResult};
pub use pipeline::{CompositeResult, JobReport, PlacementRecord, Placer};
pub use placement::{
    FRONT_LABEL, LocationResolver, PlacementOffsets, Resolution, ResolutionMode, lookup,
    normalize_label, resolve_location,
};
