use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use anyhow::Context as _;

use crate::foundation::error::PlaceResult;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Job-owned scratch directory for intermediate files (rasterized decoration pages).
///
/// Created on demand and removed, with its contents, when dropped.
#[derive(Debug)]
pub struct ScratchDir {
    path: Option<PathBuf>,
}

impl ScratchDir {
    /// Create a fresh directory under the system temp dir, tagged with `label`.
    pub fn new(label: &str) -> PlaceResult<Self> {
        Self::new_in(&std::env::temp_dir(), label)
    }

    /// Create a fresh directory under `parent`.
    pub fn new_in(parent: &Path, label: &str) -> PlaceResult<Self> {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let tag: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .take(40)
            .collect();
        let path = parent.join(format!(
            "logoplace_{tag}_{}_{nanos}_{seq}",
            std::process::id()
        ));
        std::fs::create_dir_all(&path)
            .with_context(|| format!("create scratch dir '{}'", path.display()))?;
        Ok(Self { path: Some(path) })
    }

    /// Directory path. Valid until the guard is dropped.
    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new("."))
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(path) = self.path.take()
            && let Err(err) = std::fs::remove_dir_all(&path)
        {
            tracing::debug!(path = %path.display(), error = %err, "failed to remove scratch dir");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_dir_is_removed_on_drop() {
        let scratch = ScratchDir::new("unit test/label").unwrap();
        let path = scratch.path().to_path_buf();
        std::fs::write(path.join("page.png"), b"x").unwrap();
        assert!(path.is_dir());
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn scratch_dirs_are_distinct() {
        let a = ScratchDir::new("same").unwrap();
        let b = ScratchDir::new("same").unwrap();
        assert_ne!(a.path(), b.path());
    }
}
