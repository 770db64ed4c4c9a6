//! The controlled vocabulary of decoration zones.
//!
//! Each label maps to a pair of strategies: a geometric one that needs body landmarks and a
//! heuristic one that only needs the photo size. Compound labels ("LEFT-CHEST-RIGHT-SLEEVE")
//! place by their first zone when landmarks are available.

/// Canonical label of the front zone used for derived front variants of back placements.
pub const FRONT_LABEL: &str = "FULL-FRONT";

/// Image-space side. `Left` offsets towards smaller x.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub(crate) fn sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// Vertical band on the torso, relative to the shoulder line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TorsoLevel {
    Chest,
    Pocket,
    Collar,
}

/// Arm segment position for sleeve-family zones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Along shoulder → elbow.
    Bicep,
    /// Along shoulder → elbow, nearer the elbow.
    Sleeve,
    /// Along elbow → wrist.
    Cuff,
}

/// Headwear zones, placed relative to the ear line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadZone {
    FrontCrown,
    CapBack,
    CapSide,
    CapFrontSide,
    LowerLeftCrown,
    LowerRightCrown,
}

/// Landmark-based placement for a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeometricStrategy {
    /// Offset from the shoulder midpoint, scaled by shoulder span. `side: None` is centered.
    Torso {
        side: Option<Side>,
        level: TorsoLevel,
    },
    /// Interpolated along one arm.
    Limb { side: Side, segment: Segment },
    /// Offset from the ear midpoint, scaled by head width.
    Head { zone: HeadZone },
    /// The hip joint itself.
    Hip { side: Side },
    /// Interpolated along hip → knee.
    Thigh { side: Side },
    /// No anatomical reference (bags, towels).
    None,
}

/// Size-only placement for a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeuristicStrategy {
    /// Upper-center third.
    Front,
    /// Side-anchored at one-third height; right labels anchor on the right.
    Sleeve { side: Side },
    /// Upper-center, higher than front.
    Back,
    /// Near the top edge.
    Collar,
    /// Lower-left third.
    Pocket,
    /// `(w/2, h/3)`.
    Default,
}

/// One vocabulary row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneEntry {
    /// Canonical (normalized) label.
    pub label: &'static str,
    /// Other spellings seen in job sheets, already normalized.
    pub aliases: &'static [&'static str],
    pub geometric: GeometricStrategy,
    pub heuristic: HeuristicStrategy,
}

const fn torso(side: Option<Side>, level: TorsoLevel) -> GeometricStrategy {
    GeometricStrategy::Torso { side, level }
}

const fn limb(side: Side, segment: Segment) -> GeometricStrategy {
    GeometricStrategy::Limb { side, segment }
}

const fn head(zone: HeadZone) -> GeometricStrategy {
    GeometricStrategy::Head { zone }
}

const fn entry(
    label: &'static str,
    aliases: &'static [&'static str],
    geometric: GeometricStrategy,
    heuristic: HeuristicStrategy,
) -> ZoneEntry {
    ZoneEntry {
        label,
        aliases,
        geometric,
        heuristic,
    }
}

use GeometricStrategy as G;
use HeuristicStrategy as H;
use Segment::{Bicep, Cuff, Sleeve};
use Side::{Left, Right};
use TorsoLevel::{Chest, Collar, Pocket};

const SLEEVE_L: H = H::Sleeve { side: Left };
const SLEEVE_R: H = H::Sleeve { side: Right };

/// Every recognized label.
pub static VOCABULARY: &[ZoneEntry] = &[
    // Garment, single zones.
    entry("FULL-FRONT", &[], torso(None, Chest), H::Front),
    entry("FULL-BACK", &[], torso(None, Chest), H::Back),
    entry("LEFT-CHEST", &[], torso(Some(Left), Chest), H::Front),
    entry("RIGHT-CHEST", &[], torso(Some(Right), Chest), H::Front),
    entry("LEFT-COLLAR", &[], torso(Some(Left), Collar), H::Collar),
    entry("RIGHT-COLLAR", &[], torso(Some(Right), Collar), H::Collar),
    entry("BACK-YOKE", &[], torso(None, Collar), H::Back),
    entry("ON-POCKET", &["ON POCKET"], torso(Some(Left), Pocket), H::Pocket),
    entry("LEFT-BICEP", &[], limb(Left, Bicep), SLEEVE_L),
    entry("RIGHT-BICEP", &[], limb(Right, Bicep), SLEEVE_R),
    entry("LEFT-SLEEVE", &[], limb(Left, Sleeve), SLEEVE_L),
    entry("RIGHT-SLEEVE", &[], limb(Right, Sleeve), SLEEVE_R),
    entry("LEFT-CUFF", &[], limb(Left, Cuff), SLEEVE_L),
    entry("RIGHT-CUFF", &[], limb(Right, Cuff), SLEEVE_R),
    entry("LEFT-HIP", &[], G::Hip { side: Left }, H::Default),
    entry("RIGHT-HIP", &[], G::Hip { side: Right }, H::Default),
    entry("LEFT-THIGH-HIGH", &["LEFT THIGH-HIGH"], G::Thigh { side: Left }, H::Default),
    entry("RIGHT-THIGH-HIGH", &["RIGHT THIGH-HIGH"], G::Thigh { side: Right }, H::Default),
    // Garment, compound zones.
    entry(
        "FULL-BACK & FULL-FRONT",
        &["FULL-BACK-FULL-FRONT"],
        torso(None, Chest),
        H::Front,
    ),
    entry("FULL-FRONT-FULL-BACK", &["FULL-FRONT & FULL-BACK"], torso(None, Chest), H::Front),
    entry("LEFT-BICEP-RIGHT-BICEP", &[], limb(Left, Bicep), SLEEVE_L),
    entry("LEFT-SLEEVE-RIGHT-SLEEVE", &[], limb(Left, Sleeve), SLEEVE_L),
    entry("LEFT-CHEST-LEFT-BICEP-RIGHT-BICEP", &[], torso(Some(Left), Chest), H::Front),
    entry("LEFT-CHEST-RIGHT-BICEP", &[], torso(Some(Left), Chest), H::Front),
    entry("LEFT-CHEST-RIGHT-SLEEVE", &[], torso(Some(Left), Chest), H::Front),
    entry("LEFT-CHEST-FULL-BACK", &[], torso(Some(Left), Chest), H::Front),
    entry("RIGHT-CHEST-LEFT-BICEP", &[], torso(Some(Right), Chest), H::Front),
    entry("RIGHT-CHEST-LEFT-SLEEVE", &[], torso(Some(Right), Chest), H::Front),
    entry(
        "RIGHT-CHEST-LEFT-BICEP-RIGHT-BICEP",
        &["RIGHT-CHEST-LFT-BICEP-RIGHT-BICEP"],
        torso(Some(Right), Chest),
        H::Front,
    ),
    entry("RIGHT-CHEST-FULL-BACK", &[], torso(Some(Right), Chest), H::Front),
    // Headwear.
    entry("FRONT-CROWN", &[], head(HeadZone::FrontCrown), H::Front),
    entry("CAP-BACK", &[], head(HeadZone::CapBack), H::Back),
    entry("CAP-SIDE", &[], head(HeadZone::CapSide), H::Default),
    entry("CAP-FRONT-SIDE", &[], head(HeadZone::CapFrontSide), H::Front),
    entry("LOWER-LEFT-CROWN", &[], head(HeadZone::LowerLeftCrown), H::Default),
    entry("LOWER-RIGHT-CROWN", &[], head(HeadZone::LowerRightCrown), H::Default),
    // Non-garment products.
    entry("FRONT-CENTER", &["FRONT_CENTER", "FRONT CENTER"], torso(None, Chest), H::Front),
    entry("FRONT (ON BAG)", &[], G::None, H::Front),
    entry("ON POCKET (ON BAG)", &["ON-POCKET (ON BAG)"], G::None, H::Pocket),
    entry("CORNER-ANGLED-TOWEL", &["CORNER ANGLED TOWEL"], G::None, H::Default),
];

/// Uppercase, trim, collapse internal whitespace runs to one space.
pub fn normalize_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Find the vocabulary row for a raw label.
pub fn lookup(raw: &str) -> Option<&'static ZoneEntry> {
    let label = normalize_label(raw);
    VOCABULARY
        .iter()
        .find(|e| e.label == label || e.aliases.contains(&label.as_str()))
}

/// Coarse substring classification of a normalized label.
///
/// Checked in order: front/chest, sleeve family, back, collar/neck, pocket.
pub fn classify_heuristic(label: &str) -> HeuristicStrategy {
    let has = |needle: &str| label.contains(needle);
    if has("CHEST") || has("FRONT") {
        return H::Front;
    }
    if has("SLEEVE") || has("ARM") || has("BICEP") || has("CUFF") {
        let side = if label.starts_with("RIGHT") { Right } else { Left };
        return H::Sleeve { side };
    }
    if has("BACK") {
        return H::Back;
    }
    if has("COLLAR") || has("NECK") {
        return H::Collar;
    }
    if has("POCKET") {
        return H::Pocket;
    }
    H::Default
}

/// Whether a label asks for a back placement, which also gets a derived front variant.
pub fn is_back_label(raw: &str) -> bool {
    normalize_label(raw).contains("BACK")
}
