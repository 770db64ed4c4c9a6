//! Placement-label vocabulary and label → anchor resolution.

pub mod resolver;
pub mod vocabulary;

pub use resolver::{
    LocationResolver, PlacementOffsets, Resolution, ResolutionMode, resolve_location,
};
pub use vocabulary::{
    FRONT_LABEL, GeometricStrategy, HeadZone, HeuristicStrategy, Segment, Side, TorsoLevel,
    VOCABULARY, ZoneEntry, classify_heuristic, is_back_label, lookup, normalize_label,
};
