use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    assets::{
        decode::{DecorationAsset, ProductPhoto, load_decoration, load_photo},
        raster::{PageRasterizer, Pdftoppm},
        resolve::{AssetKind, MatchKind, ResolvedAsset, resolve_asset},
        scratch::ScratchDir,
    },
    composite::{blend, clamp_anchor, neutralize_background, resize},
    config::{JobRecord, Settings},
    export::ExportSink,
    features::{KeypointSet, WorkerExtractor},
    foundation::error::{PlaceError, PlaceResult},
    placement::{FRONT_LABEL, LocationResolver, ResolutionMode, is_back_label},
};

/// Where a decoration ended up, handed to export sinks.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PlacementRecord {
    pub photo_path: PathBuf,
    pub decoration_path: PathBuf,
    /// Top-left of the decoration on the photo, after clamping.
    pub x: i64,
    pub y: i64,
    pub decoration_width: u32,
    pub decoration_height: u32,
    pub label: String,
    /// Canonical vocabulary entry the label matched, if any.
    pub zone: Option<&'static str>,
    pub mode: ResolutionMode,
    pub photo_match: MatchKind,
    pub decoration_match: MatchKind,
}

/// One written output image.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CompositeResult {
    pub output_path: PathBuf,
    pub placement: PlacementRecord,
}

/// Everything a single job produced.
#[derive(Clone, Debug, PartialEq)]
pub struct JobReport {
    pub output_name: String,
    pub primary: CompositeResult,
    /// `FRONT_<name>` companion written for back placements.
    pub front: Option<CompositeResult>,
}

/// Assets and landmarks for one job, shared by the primary and front renders.
struct PreparedJob {
    photo: ProductPhoto,
    photo_match: MatchKind,
    decoration: DecorationAsset,
    decoration_match: MatchKind,
    keypoints: Option<KeypointSet>,
}

/// Runs jobs end to end: resolve assets, extract landmarks, place, composite, export.
pub struct Placer {
    settings: Settings,
    resolver: LocationResolver,
    pages: Arc<dyn PageRasterizer>,
    exporters: Vec<Box<dyn ExportSink>>,
}

impl Placer {
    /// Build a placer with `pdftoppm`-style PDF rasterization and no export sinks.
    pub fn new(settings: Settings) -> PlaceResult<Self> {
        settings.validate()?;
        let pages = Arc::new(Pdftoppm::new(
            settings.pdf_rasterizer.clone(),
            settings.vector_dpi,
        ));
        Ok(Self {
            resolver: LocationResolver::new(settings.offsets.clone()),
            settings,
            pages,
            exporters: Vec::new(),
        })
    }

    /// Replace the PDF page rasterizer.
    pub fn with_page_rasterizer(mut self, pages: Arc<dyn PageRasterizer>) -> Self {
        self.pages = pages;
        self
    }

    /// Append an export sink. Sinks run in insertion order after each successful write.
    pub fn with_export(mut self, sink: impl ExportSink + 'static) -> Self {
        self.exporters.push(Box::new(sink));
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Process one job.
    ///
    /// Asset resolution, decode, output write, and export failures abort the job. Landmark
    /// problems never do. Back placements also produce a `FRONT_<name>` variant whose
    /// failure is only logged; a partially written variant is removed.
    #[tracing::instrument(
        skip_all,
        fields(output = %job.output_name, label = %job.placement_label)
    )]
    pub fn run_job(
        &self,
        job: &JobRecord,
        extractor: &mut WorkerExtractor,
    ) -> PlaceResult<JobReport> {
        job.validate()?;
        let scratch = ScratchDir::new("job")?;
        let prepared = self.prepare(job, extractor, &scratch)?;

        let primary = self.compose(job, &prepared, &job.placement_label, &job.output_name)?;

        let front = if is_back_label(&job.placement_label) {
            let front_name = format!("FRONT_{}", job.output_name);
            match self.compose(job, &prepared, FRONT_LABEL, &front_name) {
                Ok(r) => Some(r),
                Err(e) => {
                    tracing::warn!(output = %front_name, error = %e, "front variant failed");
                    let stray = self.settings.output_dir.join(&front_name);
                    if stray.is_file() {
                        if let Err(err) = std::fs::remove_file(&stray) {
                            tracing::debug!(
                                path = %stray.display(),
                                error = %err,
                                "failed to remove front variant"
                            );
                        }
                    }
                    None
                }
            }
        } else {
            None
        };

        tracing::info!(output = %primary.output_path.display(), "job complete");
        Ok(JobReport {
            output_name: job.output_name.clone(),
            primary,
            front,
        })
    }

    fn prepare(
        &self,
        job: &JobRecord,
        extractor: &mut WorkerExtractor,
        scratch: &ScratchDir,
    ) -> PlaceResult<PreparedJob> {
        let s = &self.settings;
        let ResolvedAsset {
            path: photo_path,
            matched: photo_match,
        } = resolve_asset(
            &s.photo_root,
            &job.supplier_name,
            &[job.part_id.as_str(), job.color.as_str()],
            AssetKind::Photo,
        )?;
        let ResolvedAsset {
            path: decoration_path,
            matched: decoration_match,
        } = resolve_asset(
            &s.decoration_root,
            "",
            &[job.decoration_code.as_str()],
            AssetKind::Decoration,
        )?;

        let photo = load_photo(&photo_path)?;
        let decoration =
            load_decoration(&decoration_path, self.pages.as_ref(), scratch, s.vector_dpi)?;
        tracing::debug!(
            photo = %photo_path.display(),
            decoration = %decoration_path.display(),
            width = photo.width(),
            height = photo.height(),
            "assets loaded"
        );

        let keypoints = extractor
            .extract(&photo, s.extraction_timeout())
            .into_keypoints();

        Ok(PreparedJob {
            decoration: resize(&decoration, s.decoration_width),
            photo,
            photo_match,
            decoration_match,
            keypoints,
        })
    }

    fn compose(
        &self,
        job: &JobRecord,
        prepared: &PreparedJob,
        label: &str,
        output_name: &str,
    ) -> PlaceResult<CompositeResult> {
        let photo = &prepared.photo;
        let deco = &prepared.decoration;
        let (w, h) = (photo.width(), photo.height());

        let resolution = self
            .resolver
            .resolve(label, prepared.keypoints.as_ref(), w, h);
        let top_left = self
            .settings
            .anchor_origin
            .to_top_left(resolution.anchor, deco.width(), deco.height());
        let top_left = clamp_anchor(top_left, deco.width(), deco.height(), w, h);
        tracing::debug!(
            label,
            mode = ?resolution.mode,
            x = top_left.x,
            y = top_left.y,
            "placement resolved"
        );

        let mut canvas = if self.settings.neutralize_background {
            neutralize_background(&photo.image)
        } else {
            (*photo.image).clone()
        };
        blend(&mut canvas, deco, top_left);

        let output_path = self.settings.output_dir.join(output_name);
        write_output(&canvas, &output_path)?;

        let result = CompositeResult {
            output_path,
            placement: PlacementRecord {
                photo_path: photo.path.clone(),
                decoration_path: deco.path.clone(),
                x: top_left.x,
                y: top_left.y,
                decoration_width: deco.width(),
                decoration_height: deco.height(),
                label: label.to_string(),
                zone: resolution.zone,
                mode: resolution.mode,
                photo_match: prepared.photo_match,
                decoration_match: prepared.decoration_match,
            },
        };

        for sink in &self.exporters {
            sink.export(job, &result)?;
        }
        Ok(result)
    }
}

fn write_output(canvas: &image::RgbImage, path: &Path) -> PlaceResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            PlaceError::export(format!("create output dir '{}': {e}", parent.display()))
        })?;
    }
    canvas
        .save(path)
        .map_err(|e| PlaceError::export(format!("write '{}': {e}", path.display())))
}
