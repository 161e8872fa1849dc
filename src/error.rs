// src/error.rs

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the segment model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegError {
    #[error("segment has zero length or non-finite coordinates")]
    ZeroLength,

    #[error("invalid split at t = {t}")]
    InvalidSplit { t: f64 },

    #[error("cached {field} does not match the segment's endpoints")]
    StaleGeometry { field: &'static str },
}

/// Failures that abort a BSP build.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("invalid map: {0}")]
    InvalidMap(String),

    #[error("degenerate segment #{index} (linedef {linedef:?})")]
    DegenerateSegment { index: usize, linedef: Option<usize> },

    #[error("no valid partition: segment set is empty")]
    NoValidPartition,

    #[error("BSP depth {depth} exceeds the limit of {limit}")]
    MaxDepthExceeded { depth: usize, limit: usize },

    #[error("segment count {count} exceeds the limit of {limit}")]
    SegmentLimitExceeded { count: usize, limit: usize },

    #[error("invalid build config: {0}")]
    InvalidConfig(String),

    #[error("build was aborted by an earlier failure")]
    Aborted,
}

/// Failures while loading or validating map geometry.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid WAD: {0}")]
    InvalidWad(String),

    #[error("level not found: {name}")]
    LevelNotFound { name: String },

    #[error("linedef {linedef} references missing vertex {vertex}")]
    MissingVertex { linedef: usize, vertex: usize },

    #[error("linedef {linedef} references missing sidedef {sidedef}")]
    MissingSidedef { linedef: usize, sidedef: usize },

    #[error("sidedef {sidedef} references missing sector {sector}")]
    MissingSector { sidedef: usize, sector: i32 },

    #[error("linedef {linedef} has zero length")]
    ZeroLengthLine { linedef: usize },
}

/// Failures while loading a build config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

impl From<MapError> for BuildError {
    fn from(err: MapError) -> Self {
        BuildError::InvalidMap(err.to_string())
    }
}

impl From<ConfigError> for BuildError {
    fn from(err: ConfigError) -> Self {
        BuildError::InvalidConfig(err.to_string())
    }
}
