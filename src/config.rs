use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;

use crate::{
    assets::resolve::detect_swapped_roots,
    foundation::{
        core::AnchorOrigin,
        error::{PlaceError, PlaceResult},
    },
    placement::PlacementOffsets,
};

/// Run-wide settings. Every field has a default, so a settings file may be partial.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Root holding one folder per supplier with product photos.
    pub photo_root: PathBuf,
    /// Flat folder of decoration files.
    pub decoration_root: PathBuf,
    /// Composited outputs land here.
    pub output_dir: PathBuf,
    /// When set, [`FileCopyExport`](crate::FileCopyExport) copies each output here too.
    pub thumbnail_dir: Option<PathBuf>,
    /// When set, outputs are also copied here as finals.
    pub final_dir: Option<PathBuf>,
    /// Decorations are resized to this width before blending.
    pub decoration_width: u32,
    /// Black out near-white photo background before blending.
    pub neutralize_background: bool,
    pub anchor_origin: AnchorOrigin,
    /// Worker threads for batches. `None` runs jobs sequentially.
    pub threads: Option<usize>,
    /// Give up on landmark extraction after this long.
    pub extraction_timeout_ms: Option<u64>,
    /// Resolution used when rasterizing SVG and PDF decorations.
    pub vector_dpi: u32,
    /// External program used to rasterize PDF pages.
    pub pdf_rasterizer: PathBuf,
    pub offsets: PlacementOffsets,
    /// Swap the two roots when they look mixed up.
    pub auto_swap_roots: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            photo_root: PathBuf::from("images"),
            decoration_root: PathBuf::from("logos"),
            output_dir: PathBuf::from("output"),
            thumbnail_dir: None,
            final_dir: None,
            decoration_width: 150,
            neutralize_background: true,
            anchor_origin: AnchorOrigin::TopLeft,
            threads: None,
            extraction_timeout_ms: None,
            vector_dpi: 300,
            pdf_rasterizer: PathBuf::from("pdftoppm"),
            offsets: PlacementOffsets::default(),
            auto_swap_roots: false,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file and validate them.
    pub fn load(path: &Path) -> PlaceResult<Self> {
        let f = File::open(path).with_context(|| format!("open settings '{}'", path.display()))?;
        let settings: Settings = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| PlaceError::validation(format!("settings '{}': {e}", path.display())))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> PlaceResult<()> {
        if self.decoration_width == 0 {
            return Err(PlaceError::validation("decoration_width must be >= 1"));
        }
        if let Some(n) = self.threads
            && n == 0
        {
            return Err(PlaceError::validation("threads must be >= 1 when set"));
        }
        if self.vector_dpi == 0 {
            return Err(PlaceError::validation("vector_dpi must be >= 1"));
        }
        if self.pdf_rasterizer.as_os_str().is_empty() {
            return Err(PlaceError::validation("pdf_rasterizer must not be empty"));
        }
        Ok(())
    }

    pub fn extraction_timeout(&self) -> Option<Duration> {
        self.extraction_timeout_ms.map(Duration::from_millis)
    }

    /// Swap photo and decoration roots when `auto_swap_roots` is set and they look reversed.
    ///
    /// Returns whether a swap happened.
    pub fn apply_root_swap(&mut self) -> bool {
        if !self.auto_swap_roots || !detect_swapped_roots(&self.photo_root, &self.decoration_root)
        {
            return false;
        }
        tracing::warn!(
            photo_root = %self.photo_root.display(),
            decoration_root = %self.decoration_root.display(),
            "photo and decoration roots look swapped; swapping"
        );
        std::mem::swap(&mut self.photo_root, &mut self.decoration_root);
        true
    }
}

/// One row of work: which photo, which decoration, where, and the output name.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JobRecord {
    #[serde(alias = "Supplier Name")]
    pub supplier_name: String,
    #[serde(alias = "Supplier Part ID")]
    pub part_id: String,
    #[serde(alias = "Supplier Color", default)]
    pub color: String,
    #[serde(alias = "Decoration Code")]
    pub decoration_code: String,
    #[serde(alias = "Location As per Word file")]
    pub placement_label: String,
    #[serde(alias = "Final Image Name")]
    pub output_name: String,
}

impl JobRecord {
    pub fn validate(&self) -> PlaceResult<()> {
        let name = &self.output_name;
        if name.trim().is_empty() {
            return Err(PlaceError::validation("job output_name must not be empty"));
        }
        if Path::new(name).components().count() != 1 {
            return Err(PlaceError::validation(format!(
                "job output_name '{name}' must be a plain file name"
            )));
        }
        if self.decoration_code.trim().is_empty() {
            return Err(PlaceError::validation(format!(
                "job '{name}' has no decoration_code"
            )));
        }
        Ok(())
    }
}

/// Read a JSON array of job records.
pub fn load_jobs(path: &Path) -> PlaceResult<Vec<JobRecord>> {
    let f = File::open(path).with_context(|| format!("open jobs '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .map_err(|e| PlaceError::validation(format!("jobs '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fill_defaults() {
        let s: Settings =
            serde_json::from_str(r#"{"decoration_width": 200, "anchor_origin": "center"}"#)
                .unwrap();
        assert_eq!(s.decoration_width, 200);
        assert_eq!(s.anchor_origin, AnchorOrigin::Center);
        assert_eq!(s.vector_dpi, 300);
        assert!(s.neutralize_background);
        assert_eq!(s.offsets, PlacementOffsets::default());
    }

    #[test]
    fn validate_rejects_zeroes() {
        let s = Settings {
            threads: Some(0),
            ..Settings::default()
        };
        assert!(matches!(s.validate(), Err(PlaceError::Validation(_))));
        let s = Settings {
            decoration_width: 0,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn unknown_settings_fields_are_rejected() {
        assert!(serde_json::from_str::<Settings>(r#"{"decoration_widht": 1}"#).is_err());
    }

    #[test]
    fn job_records_accept_spreadsheet_titles() {
        let jobs: Vec<JobRecord> = serde_json::from_str(
            r#"[
                {"Supplier Name": "Acme", "Supplier Part ID": "ABC123", "Supplier Color": "Red",
                 "Decoration Code": "D1", "Location As per Word file": "LEFT-CHEST",
                 "Final Image Name": "out.png"},
                {"supplier_name": "Acme", "part_id": "X", "decoration_code": "D2",
                 "placement_label": "FULL-BACK", "output_name": "b.png"}
            ]"#,
        )
        .unwrap();
        assert_eq!(jobs[0].part_id, "ABC123");
        assert_eq!(jobs[0].placement_label, "LEFT-CHEST");
        assert_eq!(jobs[1].color, "");
        assert!(jobs.iter().all(|j| j.validate().is_ok()));
    }

    #[test]
    fn output_name_must_be_a_file_name() {
        let job = JobRecord {
            supplier_name: "Acme".into(),
            part_id: "X".into(),
            color: String::new(),
            decoration_code: "D".into(),
            placement_label: "FULL-FRONT".into(),
            output_name: "../escape.png".into(),
        };
        assert!(job.validate().is_err());
    }
}
