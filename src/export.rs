use std::path::{Path, PathBuf};

use crate::{
    config::JobRecord,
    foundation::error::{PlaceError, PlaceResult},
    pipeline::CompositeResult,
};

/// Consumer of finished composites. A failing sink fails the job.
pub trait ExportSink: Send + Sync {
    fn export(&self, job: &JobRecord, result: &CompositeResult) -> PlaceResult<()>;
}

/// Copies each output into a final folder and/or a thumbnail folder, under the same name.
#[derive(Clone, Debug, Default)]
pub struct FileCopyExport {
    pub final_dir: Option<PathBuf>,
    pub thumbnail_dir: Option<PathBuf>,
}

impl FileCopyExport {
    pub fn new(final_dir: Option<PathBuf>, thumbnail_dir: Option<PathBuf>) -> Self {
        Self {
            final_dir,
            thumbnail_dir,
        }
    }
}

impl ExportSink for FileCopyExport {
    fn export(&self, _job: &JobRecord, result: &CompositeResult) -> PlaceResult<()> {
        for dir in [&self.final_dir, &self.thumbnail_dir].into_iter().flatten() {
            copy_into(&result.output_path, dir)?;
        }
        Ok(())
    }
}

fn copy_into(src: &Path, dir: &Path) -> PlaceResult<()> {
    let name = src
        .file_name()
        .ok_or_else(|| PlaceError::export(format!("'{}' has no file name", src.display())))?;
    let dst = dir.join(name);
    if dst == src {
        return Ok(());
    }
    std::fs::create_dir_all(dir)
        .map_err(|e| PlaceError::export(format!("create '{}': {e}", dir.display())))?;
    std::fs::copy(src, &dst).map_err(|e| {
        PlaceError::export(format!(
            "copy '{}' -> '{}': {e}",
            src.display(),
            dst.display()
        ))
    })?;
    tracing::debug!(dst = %dst.display(), "exported copy");
    Ok(())
}

/// Writes `<output>.placement.json` next to each output for downstream editors.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManifestExport;

#[derive(serde::Serialize)]
struct Manifest<'a> {
    job: &'a JobRecord,
    #[serde(flatten)]
    result: &'a CompositeResult,
}

impl ManifestExport {
    pub fn manifest_path(output: &Path) -> PathBuf {
        let mut name = output.as_os_str().to_owned();
        name.push(".placement.json");
        PathBuf::from(name)
    }
}

impl ExportSink for ManifestExport {
    fn export(&self, job: &JobRecord, result: &CompositeResult) -> PlaceResult<()> {
        let path = Self::manifest_path(&result.output_path);
        let json = serde_json::to_vec_pretty(&Manifest { job, result })
            .map_err(|e| PlaceError::export(format!("encode manifest: {e}")))?;
        std::fs::write(&path, json)
            .map_err(|e| PlaceError::export(format!("write '{}': {e}", path.display())))
    }
}
