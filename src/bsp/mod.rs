// src/bsp/mod.rs
pub mod bsp_builder;
pub mod bsp_config;
pub mod bsp_level;
pub mod bsp_node;
pub mod bsp_partition;
pub mod bsp_procedural;
pub mod bsp_seg;
pub mod bsp_split;
pub mod bsp_tree;
mod bsp_util;

pub use bsp_builder::{BspBuilder, BuilderState};
pub use bsp_config::BuildConfig;
pub use bsp_level::BspLevel;
pub use bsp_node::{BspNode, Subsector};
pub use bsp_partition::{select_partition, Partition, PartitionScore};
pub use bsp_procedural::{GeneratorConfig, ProceduralGenerator};
pub use bsp_seg::{Seg, SegSource, SegmentSide};
pub use bsp_split::{partition_segs, SplitOutcome};
pub use bsp_tree::{BspTree, BspVisitor, BuildStats, CollectingVisitor, FnVisitor};
pub use bsp_util::{BoundingBox, Line2D, Point2D};

// Defaults for `BuildConfig`.
pub const MAX_SEGS: usize = 32768;
pub const BSP_DEPTH_LIMIT: usize = 64;
pub const EPSILON: f64 = 0.005; // On-line tolerance, in map units
pub const MIN_SEG_LENGTH: f64 = 0.001;
pub const SPLIT_WEIGHT: f64 = 8.0;
pub const BALANCE_WEIGHT: f64 = 1.0;

// Enum for classifying segment positions relative to a partition line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegPosition {
    Front,
    Back,
    Spanning,
    Coincident,
}
