//! Body-landmark extraction seam.
//!
//! Pose estimation is a black box here. An extractor either returns a complete
//! [`KeypointSet`] for a photo or nothing at all; "nothing" is the common case and feeds the
//! heuristic placement path.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Arc, mpsc},
    time::Duration,
};

use anyhow::Context as _;

use crate::{
    assets::decode::ProductPhoto,
    foundation::{
        core::Point,
        error::{PlaceError, PlaceResult},
    },
};

/// Named pose landmarks, in the 33-point MediaPipe ordering.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Joint {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl Joint {
    /// All joints in landmark-index order.
    pub const ALL: [Joint; 33] = [
        Joint::Nose,
        Joint::LeftEyeInner,
        Joint::LeftEye,
        Joint::LeftEyeOuter,
        Joint::RightEyeInner,
        Joint::RightEye,
        Joint::RightEyeOuter,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::MouthLeft,
        Joint::MouthRight,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftPinky,
        Joint::RightPinky,
        Joint::LeftIndex,
        Joint::RightIndex,
        Joint::LeftThumb,
        Joint::RightThumb,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
        Joint::LeftHeel,
        Joint::RightHeel,
        Joint::LeftFootIndex,
        Joint::RightFootIndex,
    ];

    /// Landmark index of this joint.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Pixel positions for the joints an extractor reports.
///
/// Entries are kept even when implausible (off-image, coincident); consumers decide what
/// they can use.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeypointSet {
    points: BTreeMap<Joint, Point>,
}

impl KeypointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from points in landmark-index order. Extra entries beyond 33 are ignored.
    pub fn from_indexed(points: &[Point]) -> Self {
        Self {
            points: Joint::ALL.iter().copied().zip(points.iter().copied()).collect(),
        }
    }

    pub fn insert(&mut self, joint: Joint, p: Point) {
        self.points.insert(joint, p);
    }

    pub fn with(mut self, joint: Joint, p: Point) -> Self {
        self.insert(joint, p);
        self
    }

    /// Position of `joint`, if reported and finite.
    pub fn get(&self, joint: Joint) -> Option<Point> {
        self.points.get(&joint).copied().filter(|p| p.is_finite())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Capability: detect body landmarks in a product photo.
///
/// `Ok(None)` is the routine "no person found" answer. Errors are logged by the caller and
/// treated the same way.
pub trait FeatureExtractor: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    fn extract(&self, photo: &ProductPhoto) -> PlaceResult<Option<KeypointSet>>;
}

/// Builds one extractor per worker; instances are never shared between concurrent jobs.
pub trait ExtractorFactory: Send + Sync {
    fn create(&self) -> PlaceResult<Arc<dyn FeatureExtractor>>;
}

impl<F> ExtractorFactory for F
where
    F: Fn() -> PlaceResult<Arc<dyn FeatureExtractor>> + Send + Sync,
{
    fn create(&self) -> PlaceResult<Arc<dyn FeatureExtractor>> {
        self()
    }
}

/// Extractor that never finds landmarks. Placement runs purely on heuristics.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLandmarks;

impl FeatureExtractor for NoLandmarks {
    fn name(&self) -> &str {
        "none"
    }

    fn extract(&self, _photo: &ProductPhoto) -> PlaceResult<Option<KeypointSet>> {
        Ok(None)
    }
}

/// Reads landmarks precomputed by an external pose model from `<stem>.keypoints.json`
/// beside each photo.
///
/// Two layouts are accepted:
///
/// ```json
/// { "joints": { "LEFT_SHOULDER": [400.0, 500.0], "RIGHT_SHOULDER": [800.0, 500.0] } }
/// { "normalized": [[0.51, 0.12], [0.52, 0.11], ...] }
/// ```
///
/// The second is the raw 33-landmark output in `[0, 1]` image units.
#[derive(Clone, Copy, Debug, Default)]
pub struct SidecarKeypoints;

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum SidecarFile {
    Named { joints: BTreeMap<Joint, [f32; 2]> },
    Normalized { normalized: Vec<[f32; 2]> },
}

impl SidecarKeypoints {
    /// Sidecar path for a photo path.
    pub fn sidecar_path(photo: &Path) -> PathBuf {
        let stem = photo
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        photo.with_file_name(format!("{stem}.keypoints.json"))
    }

    /// Parse sidecar JSON for a photo of the given size.
    pub fn parse(json: &str, width: u32, height: u32) -> PlaceResult<Option<KeypointSet>> {
        let file: SidecarFile = serde_json::from_str(json)
            .map_err(|e| PlaceError::decode(format!("keypoint sidecar: {e}")))?;
        let set = match file {
            SidecarFile::Named { joints } => KeypointSet {
                points: joints
                    .into_iter()
                    .map(|(j, [x, y])| (j, Point::new(x, y)))
                    .collect(),
            },
            SidecarFile::Normalized { normalized } => {
                let (w, h) = (width as f32, height as f32);
                let pts: Vec<Point> = normalized
                    .iter()
                    .map(|[x, y]| Point::new(x * w, y * h))
                    .collect();
                KeypointSet::from_indexed(&pts)
            }
        };
        Ok((!set.is_empty()).then_some(set))
    }
}

impl FeatureExtractor for SidecarKeypoints {
    fn name(&self) -> &str {
        "sidecar"
    }

    fn extract(&self, photo: &ProductPhoto) -> PlaceResult<Option<KeypointSet>> {
        let path = Self::sidecar_path(&photo.path);
        if !path.is_file() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("read keypoint sidecar '{}'", path.display()))?;
        Self::parse(&json, photo.width(), photo.height())
    }
}

/// What a best-effort extraction produced.
#[derive(Clone, Debug, PartialEq)]
pub enum ExtractOutcome {
    Found(KeypointSet),
    Absent,
    /// Exceeded the per-job budget; the extractor instance must not be reused.
    TimedOut,
    /// Extractor returned an error or panicked.
    Failed(String),
}

impl ExtractOutcome {
    pub fn keypoints(&self) -> Option<&KeypointSet> {
        match self {
            ExtractOutcome::Found(k) => Some(k),
            _ => None,
        }
    }

    pub fn into_keypoints(self) -> Option<KeypointSet> {
        match self {
            ExtractOutcome::Found(k) => Some(k),
            _ => None,
        }
    }

    fn from_result(r: PlaceResult<Option<KeypointSet>>) -> Self {
        match r {
            Ok(Some(k)) => ExtractOutcome::Found(k),
            Ok(None) => ExtractOutcome::Absent,
            Err(e) => ExtractOutcome::Failed(e.to_string()),
        }
    }
}

/// Run `extractor` on `photo`, giving up after `timeout` if one is set.
///
/// With a timeout the call runs on a helper thread; on expiry that thread is abandoned and
/// still holds its clone of the extractor.
pub fn extract_with_timeout(
    extractor: &Arc<dyn FeatureExtractor>,
    photo: &ProductPhoto,
    timeout: Option<Duration>,
) -> ExtractOutcome {
    let Some(limit) = timeout else {
        return ExtractOutcome::from_result(extractor.extract(photo));
    };

    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(extractor);
    let job_photo = photo.clone();
    let spawned = std::thread::Builder::new()
        .name("feature-extract".to_string())
        .spawn(move || {
            let _ = tx.send(worker.extract(&job_photo));
        });
    if let Err(e) = spawned {
        return ExtractOutcome::Failed(format!("spawn extraction thread: {e}"));
    }

    match rx.recv_timeout(limit) {
        Ok(r) => ExtractOutcome::from_result(r),
        Err(mpsc::RecvTimeoutError::Timeout) => ExtractOutcome::TimedOut,
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            ExtractOutcome::Failed("extraction thread panicked".to_string())
        }
    }
}

/// A worker's extractor slot: built lazily, replaced after a timeout.
pub struct WorkerExtractor {
    factory: Arc<dyn ExtractorFactory>,
    current: Option<Arc<dyn FeatureExtractor>>,
}

impl WorkerExtractor {
    pub fn new(factory: Arc<dyn ExtractorFactory>) -> Self {
        Self {
            factory,
            current: None,
        }
    }

    /// Extract landmarks for one job.
    pub fn extract(&mut self, photo: &ProductPhoto, timeout: Option<Duration>) -> ExtractOutcome {
        let extractor = match &self.current {
            Some(e) => Arc::clone(e),
            None => match self.factory.create() {
                Ok(e) => {
                    self.current = Some(Arc::clone(&e));
                    e
                }
                Err(err) => return ExtractOutcome::Failed(format!("create extractor: {err}")),
            },
        };

        let outcome = extract_with_timeout(&extractor, photo, timeout);
        match &outcome {
            ExtractOutcome::Found(k) => {
                tracing::debug!(extractor = extractor.name(), joints = k.len(), "landmarks found");
            }
            ExtractOutcome::Absent => {
                tracing::debug!(extractor = extractor.name(), "no landmarks");
            }
            ExtractOutcome::TimedOut => {
                tracing::warn!(
                    extractor = extractor.name(),
                    photo = %photo.path.display(),
                    "landmark extraction timed out; discarding extractor instance"
                );
                self.current = None;
            }
            ExtractOutcome::Failed(msg) => {
                tracing::warn!(
                    extractor = extractor.name(),
                    photo = %photo.path.display(),
                    error = %msg,
                    "landmark extraction failed; continuing without landmarks"
                );
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn photo() -> ProductPhoto {
        ProductPhoto::new("p.png", image::RgbImage::new(100, 200))
    }

    struct Sleepy(Duration);

    impl FeatureExtractor for Sleepy {
        fn name(&self) -> &str {
            "sleepy"
        }

        fn extract(&self, _photo: &ProductPhoto) -> PlaceResult<Option<KeypointSet>> {
            std::thread::sleep(self.0);
            Ok(Some(KeypointSet::new().with(Joint::Nose, Point::new(1.0, 1.0))))
        }
    }

    #[test]
    fn joint_order_matches_landmark_indices() {
        assert_eq!(Joint::Nose.index(), 0);
        assert_eq!(Joint::LeftShoulder.index(), 11);
        assert_eq!(Joint::RightHip.index(), 24);
        assert_eq!(Joint::RightFootIndex.index(), 32);
        for (i, j) in Joint::ALL.iter().enumerate() {
            assert_eq!(j.index(), i);
        }
    }

    #[test]
    fn sidecar_named_layout() {
        let json = r#"{"joints": {"LEFT_SHOULDER": [400, 500], "RIGHT_SHOULDER": [800, 500]}}"#;
        let k = SidecarKeypoints::parse(json, 1200, 1800).unwrap().unwrap();
        assert_eq!(k.get(Joint::LeftShoulder), Some(Point::new(400.0, 500.0)));
        assert_eq!(k.get(Joint::LeftElbow), None);
    }

    #[test]
    fn sidecar_normalized_layout_scales_by_photo_size() {
        let mut pts = vec![[0.0f32, 0.0]; 33];
        pts[11] = [0.25, 0.5];
        let json = serde_json::json!({ "normalized": pts }).to_string();
        let k = SidecarKeypoints::parse(&json, 1000, 2000).unwrap().unwrap();
        assert_eq!(k.len(), 33);
        assert_eq!(k.get(Joint::LeftShoulder), Some(Point::new(250.0, 1000.0)));
    }

    #[test]
    fn sidecar_missing_file_is_absent() {
        let out = SidecarKeypoints.extract(&photo()).unwrap();
        assert!(out.is_none());
        assert_eq!(
            SidecarKeypoints::sidecar_path(Path::new("a/b/ABC123Red.jpg")),
            Path::new("a/b/ABC123Red.keypoints.json")
        );
    }

    #[test]
    fn implausible_entries_are_kept_but_non_finite_are_unusable() {
        let k = KeypointSet::new()
            .with(Joint::LeftShoulder, Point::new(-50.0, 1e6))
            .with(Joint::RightShoulder, Point::new(f32::NAN, 0.0));
        assert_eq!(k.len(), 2);
        assert!(k.get(Joint::LeftShoulder).is_some());
        assert!(k.get(Joint::RightShoulder).is_none());
    }

    #[test]
    fn timeout_is_reported_and_fast_path_completes() {
        let slow: Arc<dyn FeatureExtractor> = Arc::new(Sleepy(Duration::from_millis(500)));
        let out = extract_with_timeout(&slow, &photo(), Some(Duration::from_millis(10)));
        assert_eq!(out, ExtractOutcome::TimedOut);

        let fast: Arc<dyn FeatureExtractor> = Arc::new(Sleepy(Duration::from_millis(0)));
        let out = extract_with_timeout(&fast, &photo(), Some(Duration::from_secs(5)));
        assert!(out.keypoints().is_some());
    }

    #[test]
    fn worker_rebuilds_extractor_after_timeout() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let factory = move || -> PlaceResult<Arc<dyn FeatureExtractor>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Sleepy(Duration::from_millis(200))))
        };
        let mut worker = WorkerExtractor::new(Arc::new(factory));

        assert_eq!(
            worker.extract(&photo(), Some(Duration::from_millis(5))),
            ExtractOutcome::TimedOut
        );
        assert!(
            worker
                .extract(&photo(), Some(Duration::from_secs(5)))
                .keypoints()
                .is_some()
        );
        assert_eq!(built.load(Ordering::SeqCst), 2);

        let _ = worker.extract(&photo(), None);
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }
}
