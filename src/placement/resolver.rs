use crate::{
    features::{Joint, KeypointSet},
    foundation::core::{Anchor, Point},
    placement::vocabulary::{
        GeometricStrategy, HeadZone, HeuristicStrategy, Segment, Side, TorsoLevel, ZoneEntry,
        lookup,
    },
};

/// Spans shorter than this are treated as a failed detection.
const MIN_SPAN_PX: f32 = 1.0;

/// Tunable geometric offsets, as fractions of shoulder span (torso/limb) or ear span (head).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlacementOffsets {
    /// Chest zones sit this far below the shoulder line.
    pub chest_drop: f32,
    /// Left/right chest shift sideways by this much.
    pub chest_side: f32,
    /// Pocket sits this far below the shoulder line.
    pub pocket_drop: f32,
    /// Collar/yoke zones sit this far above the shoulder line.
    pub collar_rise: f32,
    /// Left/right collar shift sideways by this much.
    pub collar_side: f32,
    /// Position along shoulder → elbow.
    pub bicep_t: f32,
    /// Position along shoulder → elbow.
    pub sleeve_t: f32,
    /// Position along elbow → wrist.
    pub cuff_t: f32,
    /// Position along hip → knee.
    pub thigh_t: f32,
    /// Head-zone offsets `[dx, dy]` in head widths from the ear midpoint.
    pub front_crown: [f32; 2],
    pub cap_back: [f32; 2],
    pub cap_side: [f32; 2],
    pub cap_front_side: [f32; 2],
    pub lower_left_crown: [f32; 2],
    pub lower_right_crown: [f32; 2],
}

impl Default for PlacementOffsets {
    fn default() -> Self {
        Self {
            chest_drop: 0.22,
            chest_side: 0.18,
            pocket_drop: 0.30,
            collar_rise: 0.05,
            collar_side: 0.12,
            bicep_t: 0.55,
            sleeve_t: 0.75,
            cuff_t: 0.85,
            thigh_t: 0.25,
            front_crown: [0.0, -0.6],
            cap_back: [0.0, -0.4],
            cap_side: [0.55, -0.35],
            cap_front_side: [0.35, -0.5],
            lower_left_crown: [-0.3, -0.25],
            lower_right_crown: [0.3, -0.25],
        }
    }
}

/// Which path produced an anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Derived from body landmarks.
    Geometric,
    /// Derived from photo size and the label's coarse class.
    Heuristic,
    /// The `(w/2, h/3)` safety net.
    Default,
}

/// Anchor plus provenance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub anchor: Anchor,
    pub mode: ResolutionMode,
    /// Canonical vocabulary label, when the input was recognized.
    pub zone: Option<&'static str>,
}

/// Maps placement labels to pixel anchors. Never fails.
#[derive(Clone, Debug, Default)]
pub struct LocationResolver {
    offsets: PlacementOffsets,
}

impl LocationResolver {
    pub fn new(offsets: PlacementOffsets) -> Self {
        Self { offsets }
    }

    /// Resolve `label` for a `width` x `height` photo.
    ///
    /// The anchor is always inside `[0, width) x [0, height)` (or `(0, 0)` for an empty
    /// photo).
    pub fn resolve(
        &self,
        label: &str,
        keypoints: Option<&KeypointSet>,
        width: u32,
        height: u32,
    ) -> Resolution {
        let entry = lookup(label);
        let zone = entry.map(|e| e.label);

        if width == 0 || height == 0 {
            return Resolution {
                anchor: Anchor::default(),
                mode: ResolutionMode::Default,
                zone,
            };
        }

        let Some(entry) = entry else {
            tracing::debug!(label, "unrecognized placement label; using default anchor");
            return Resolution {
                anchor: default_anchor(width, height),
                mode: ResolutionMode::Default,
                zone,
            };
        };

        if let Some(kp) = keypoints
            && let Some(p) = self.geometric(entry, kp)
        {
            return Resolution {
                anchor: Anchor::from_point(p).clamp_within(width, height),
                mode: ResolutionMode::Geometric,
                zone,
            };
        }

        let mode = match entry.heuristic {
            HeuristicStrategy::Default => ResolutionMode::Default,
            _ => ResolutionMode::Heuristic,
        };
        Resolution {
            anchor: heuristic_anchor(entry.heuristic, width, height).clamp_within(width, height),
            mode,
            zone,
        }
    }

    fn geometric(&self, entry: &ZoneEntry, kp: &KeypointSet) -> Option<Point> {
        let o = &self.offsets;
        match entry.geometric {
            GeometricStrategy::Torso { side, level } => {
                let (mid, span) = span_between(kp, Joint::LeftShoulder, Joint::RightShoulder)?;
                let sign = side.map(Side::sign).unwrap_or(0.0);
                let (dx, dy) = match level {
                    TorsoLevel::Chest => (sign * o.chest_side, o.chest_drop),
                    TorsoLevel::Pocket => (sign * o.chest_side, o.pocket_drop),
                    TorsoLevel::Collar => (sign * o.collar_side, -o.collar_rise),
                };
                Some(mid.offset(dx * span, dy * span))
            }
            GeometricStrategy::Limb { side, segment } => {
                let (shoulder, elbow, wrist) = match side {
                    Side::Left => (Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist),
                    Side::Right => (Joint::RightShoulder, Joint::RightElbow, Joint::RightWrist),
                };
                match segment {
                    Segment::Bicep => Some(kp.get(shoulder)?.lerp(kp.get(elbow)?, o.bicep_t)),
                    Segment::Sleeve => Some(kp.get(shoulder)?.lerp(kp.get(elbow)?, o.sleeve_t)),
                    Segment::Cuff => Some(kp.get(elbow)?.lerp(kp.get(wrist)?, o.cuff_t)),
                }
            }
            GeometricStrategy::Head { zone } => {
                let (mid, span) = span_between(kp, Joint::LeftEar, Joint::RightEar)?;
                let [dx, dy] = match zone {
                    HeadZone::FrontCrown => o.front_crown,
                    HeadZone::CapBack => o.cap_back,
                    HeadZone::CapSide => o.cap_side,
                    HeadZone::CapFrontSide => o.cap_front_side,
                    HeadZone::LowerLeftCrown => o.lower_left_crown,
                    HeadZone::LowerRightCrown => o.lower_right_crown,
                };
                Some(mid.offset(dx * span, dy * span))
            }
            GeometricStrategy::Hip { side } => kp.get(hip_joint(side)),
            GeometricStrategy::Thigh { side } => {
                let knee = match side {
                    Side::Left => Joint::LeftKnee,
                    Side::Right => Joint::RightKnee,
                };
                Some(kp.get(hip_joint(side))?.lerp(kp.get(knee)?, o.thigh_t))
            }
            GeometricStrategy::None => None,
        }
    }
}

/// Resolve with the default offsets.
pub fn resolve_location(
    label: &str,
    keypoints: Option<&KeypointSet>,
    width: u32,
    height: u32,
) -> Anchor {
    LocationResolver::default()
        .resolve(label, keypoints, width, height)
        .anchor
}

fn hip_joint(side: Side) -> Joint {
    match side {
        Side::Left => Joint::LeftHip,
        Side::Right => Joint::RightHip,
    }
}

fn span_between(kp: &KeypointSet, a: Joint, b: Joint) -> Option<(Point, f32)> {
    let pa = kp.get(a)?;
    let pb = kp.get(b)?;
    let span = pa.distance(pb);
    (span >= MIN_SPAN_PX).then(|| (pa.midpoint(pb), span))
}

fn default_anchor(width: u32, height: u32) -> Anchor {
    Anchor::new(i64::from(width / 2), i64::from(height / 3))
}

fn heuristic_anchor(strategy: HeuristicStrategy, width: u32, height: u32) -> Anchor {
    let (w, h) = (i64::from(width), i64::from(height));
    match strategy {
        HeuristicStrategy::Front => Anchor::new(w / 2, h / 4),
        HeuristicStrategy::Sleeve { side: Side::Left } => Anchor::new(w / 8, h / 3),
        HeuristicStrategy::Sleeve { side: Side::Right } => Anchor::new(w * 7 / 8, h / 3),
        HeuristicStrategy::Back => Anchor::new(w / 2, h / 6),
        HeuristicStrategy::Collar => Anchor::new(w / 2, h / 20),
        HeuristicStrategy::Pocket => Anchor::new(w / 6, h * 2 / 3),
        HeuristicStrategy::Default => default_anchor(width, height),
    }
}
