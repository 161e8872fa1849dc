// src/bsp/bsp_seg.rs

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::bsp::{BuildConfig, Line2D, Point2D};
use crate::error::SegError;
use crate::utils::util::snap;

// Slack allowed between cached and recomputed seg geometry.
const GEOMETRY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentSide {
    Front, // Right side of linedef
    Back,  // Left side of linedef
}

/// Where a seg came from on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegSource {
    pub linedef: usize,
    pub side: SegmentSide,
    pub sidedef: Option<usize>,
    pub sector: Option<usize>,
}

/// A directed edge. The sector it faces lies on its right-hand side.
///
/// Segs are never changed after creation; `split` hands back two new ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Seg {
    pub start: Point2D,
    pub end: Point2D,
    pub angle: f64,
    pub length: f64,
    /// Distance along the originating line side from its first vertex to `start`.
    pub offset: f64,
    /// `None` for minisegs.
    pub source: Option<SegSource>,
}

impl Seg {
    pub fn new(
        start: Point2D,
        end: Point2D,
        source: Option<SegSource>,
        offset: f64,
    ) -> Result<Self, SegError> {
        let length = start.distance_to(&end);
        if !start.is_finite() || !end.is_finite() || !(length > 0.0) {
            return Err(SegError::ZeroLength);
        }
        Ok(Seg {
            start,
            end,
            angle: (end.y - start.y).atan2(end.x - start.x),
            length,
            offset,
            source,
        })
    }

    /// A seg along a partition line with no map line behind it.
    pub fn miniseg(start: Point2D, end: Point2D) -> Result<Self, SegError> {
        Seg::new(start, end, None, 0.0)
    }

    pub fn is_miniseg(&self) -> bool {
        self.source.is_none()
    }

    pub fn linedef(&self) -> Option<usize> {
        self.source.map(|s| s.linedef)
    }

    pub fn sector(&self) -> Option<usize> {
        self.source.and_then(|s| s.sector)
    }

    pub fn dx(&self) -> f64 {
        self.end.x - self.start.x
    }

    pub fn dy(&self) -> f64 {
        self.end.y - self.start.y
    }

    pub fn as_line(&self) -> Line2D {
        Line2D::new(self.start, self.end)
    }

    pub fn midpoint(&self) -> Point2D {
        self.start.lerp(&self.end, 0.5)
    }

    /// Signed distance of `point` from this seg's infinite line, positive on
    /// the front (right) side.
    pub fn distance_to_line(&self, point: &Point2D) -> f64 {
        self.as_line().classify_point(point) / self.length
    }

    /// Re-checks the construction invariant for segs built by hand or
    /// edited after creation. The cached length and angle must still
    /// describe the endpoints.
    pub fn validate(&self) -> Result<(), SegError> {
        let length = self.start.distance_to(&self.end);
        if !self.start.is_finite() || !self.end.is_finite() || !(length > 0.0) {
            return Err(SegError::ZeroLength);
        }
        if !((self.length - length).abs() <= GEOMETRY_TOLERANCE * length.max(1.0)) {
            return Err(SegError::StaleGeometry { field: "length" });
        }
        let angle = self.dy().atan2(self.dx());
        let turn = (self.angle - angle).rem_euclid(TAU);
        if !(turn.min(TAU - turn) <= GEOMETRY_TOLERANCE) {
            return Err(SegError::StaleGeometry { field: "angle" });
        }
        Ok(())
    }

    /// Splits the seg at parameter `t`, measured from `start`.
    ///
    /// Both halves keep the source reference. `t` is snapped to 0 or 1 when it
    /// lies within `config.epsilon` (in map units) of an endpoint, and the
    /// split is refused unless it lands strictly inside the seg with both
    /// halves at least `config.min_seg_length` long.
    pub fn split(&self, t: f64, config: &BuildConfig) -> Result<(Seg, Seg), SegError> {
        let t_epsilon = config.epsilon / self.length;
        let t = snap(snap(t, 0.0, t_epsilon), 1.0, t_epsilon);
        if !(t > 0.0 && t < 1.0) {
            return Err(SegError::InvalidSplit { t });
        }

        let point = self.start.lerp(&self.end, t);
        let first_length = self.start.distance_to(&point);
        let second_length = point.distance_to(&self.end);
        if first_length < config.min_seg_length || second_length < config.min_seg_length {
            return Err(SegError::InvalidSplit { t });
        }

        let first = Seg {
            start: self.start,
            end: point,
            angle: self.angle,
            length: first_length,
            offset: self.offset,
            source: self.source,
        };
        let second = Seg {
            start: point,
            end: self.end,
            angle: self.angle,
            length: second_length,
            offset: self.offset + first_length,
            source: self.source,
        };
        Ok((first, second))
    }
}
