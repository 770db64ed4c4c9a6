/// Convenience result type used across the crate.
pub type PlaceResult<T> = Result<T, PlaceError>;

/// Errors that abort a placement job.
///
/// Missing landmarks and degenerate geometry are not errors: the first is an `Option` on
/// the extractor side, the second is clamped by the compositor.
#[derive(thiserror::Error, Debug)]
pub enum PlaceError {
    /// No exact or fuzzy match for a photo/decoration, or its directory is missing.
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    /// A resolved path could not be decoded as a supported raster/vector format.
    #[error("decode failure: {0}")]
    Decode(String),

    /// Invalid settings or job records.
    #[error("validation error: {0}")]
    Validation(String),

    /// Writing the composite or handing it to an export sink failed.
    #[error("export error: {0}")]
    Export(String),

    /// Anything else, usually I/O with attached context.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlaceError {
    /// Build [`PlaceError::AssetNotFound`].
    pub fn asset_not_found(msg: impl Into<String>) -> Self {
        Self::AssetNotFound(msg.into())
    }

    /// Build [`PlaceError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build [`PlaceError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build [`PlaceError::Export`].
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}
