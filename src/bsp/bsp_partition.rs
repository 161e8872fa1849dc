// src/bsp/bsp_partition.rs
//! Partition line selection.
//!
//! Every candidate seg is scored by how many other segs its infinite line
//! would split and how unevenly it would divide the rest:
//!
//! ```text
//! score = split_weight * splits + balance_weight * |front - back|
//! ```
//!
//! The lowest score wins, the earliest candidate winning ties.

use log::trace;

use crate::bsp::{BuildConfig, Line2D, Point2D, Seg, SegPosition};
use crate::error::BuildError;

/// A candidate splitting line with its direction and unit normal worked out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partition {
    pub start: Point2D,
    pub end: Point2D,
    pub dx: f64,
    pub dy: f64,
    pub length: f64,
    /// Unit normal pointing to the front (right) side.
    pub normal: Point2D,
}

impl Partition {
    pub fn from_seg(seg: &Seg) -> Self {
        let dx = seg.dx();
        let dy = seg.dy();
        let length = seg.length;
        Partition {
            start: seg.start,
            end: seg.end,
            dx,
            dy,
            length,
            normal: Point2D::new(dy / length, -dx / length),
        }
    }

    pub fn line(&self) -> Line2D {
        Line2D::new(self.start, self.end)
    }

    /// Signed perpendicular distance, positive on the front side.
    pub fn distance(&self, point: &Point2D) -> f64 {
        (point.x - self.start.x) * self.normal.x + (point.y - self.start.y) * self.normal.y
    }

    /// Position of the projection of `point` along the line, 0 at `start`
    /// and 1 at `end`.
    pub fn param(&self, point: &Point2D) -> f64 {
        ((point.x - self.start.x) * self.dx + (point.y - self.start.y) * self.dy)
            / (self.length * self.length)
    }

    /// Foot of the perpendicular from `point` onto the line.
    pub fn project(&self, point: &Point2D) -> Point2D {
        let d = self.distance(point);
        Point2D::new(point.x - self.normal.x * d, point.y - self.normal.y * d)
    }

    pub fn same_direction(&self, seg: &Seg) -> bool {
        self.dx * seg.dx() + self.dy * seg.dy() > 0.0
    }

    pub fn classify(&self, seg: &Seg, epsilon: f64) -> SegPosition {
        classify_distances(self.distance(&seg.start), self.distance(&seg.end), epsilon)
    }
}

/// Classifies a seg from the signed distances of its two endpoints.
pub(crate) fn classify_distances(start_side: f64, end_side: f64, epsilon: f64) -> SegPosition {
    if start_side > epsilon {
        if end_side < -epsilon {
            SegPosition::Spanning
        } else {
            SegPosition::Front
        }
    } else if start_side < -epsilon {
        if end_side > epsilon {
            SegPosition::Spanning
        } else {
            SegPosition::Back
        }
    } else if end_side > epsilon {
        SegPosition::Front
    } else if end_side < -epsilon {
        SegPosition::Back
    } else {
        SegPosition::Coincident
    }
}

/// How one candidate would divide the set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionScore {
    pub index: usize,
    pub front: usize,
    pub back: usize,
    pub splits: usize,
    pub score: f64,
}

impl PartitionScore {
    /// A line with nothing behind it and nothing to split leaves the set
    /// as it was.
    pub fn makes_progress(&self) -> bool {
        self.back > 0 || self.splits > 0
    }
}

/// Picks the seg whose line partitions `segs`.
///
/// Real segs are tried first; minisegs are only considered when no real seg
/// makes progress. If nothing makes progress the best-scoring seg is returned
/// anyway.
pub fn select_partition(segs: &[Seg], config: &BuildConfig) -> Result<PartitionScore, BuildError> {
    if segs.is_empty() {
        return Err(BuildError::NoValidPartition);
    }

    let best = best_candidate(segs, config, true, |s| !s.is_miniseg())
        .or_else(|| best_candidate(segs, config, true, |_| true))
        .or_else(|| best_candidate(segs, config, false, |_| true));

    best.ok_or(BuildError::NoValidPartition)
}

fn best_candidate<F>(
    segs: &[Seg],
    config: &BuildConfig,
    require_progress: bool,
    eligible: F,
) -> Option<PartitionScore>
where
    F: Fn(&Seg) -> bool,
{
    let mut best: Option<PartitionScore> = None;
    for (index, seg) in segs.iter().enumerate() {
        if !eligible(seg) {
            continue;
        }
        let bound = best.map(|b| b.score);
        let Some(score) = evaluate(segs, index, config, bound) else {
            continue;
        };
        if require_progress && !score.makes_progress() {
            continue;
        }
        trace!(
            "candidate {}: front={} back={} splits={} score={}",
            index, score.front, score.back, score.splits, score.score
        );
        if best.map_or(true, |b| score.score < b.score) {
            best = Some(score);
        }
    }
    best
}

/// Scores candidate `index`, giving up early once the split cost alone
/// exceeds `bound`.
fn evaluate(segs: &[Seg], index: usize, config: &BuildConfig, bound: Option<f64>) -> Option<PartitionScore> {
    let partition = Partition::from_seg(&segs[index]);
    let mut front: usize = 0;
    let mut back: usize = 0;
    let mut splits: usize = 0;

    for (i, seg) in segs.iter().enumerate() {
        if i == index {
            continue;
        }
        match partition.classify(seg, config.epsilon) {
            SegPosition::Front => front += 1,
            SegPosition::Back => back += 1,
            SegPosition::Spanning => {
                splits += 1;
                if let Some(bound) = bound {
                    if config.split_weight * splits as f64 > bound {
                        return None;
                    }
                }
            }
            SegPosition::Coincident => {
                if partition.same_direction(seg) {
                    front += 1;
                } else {
                    back += 1;
                }
            }
        }
    }

    let imbalance = front.abs_diff(back) as f64;
    Some(PartitionScore {
        index,
        front,
        back,
        splits,
        score: config.split_weight * splits as f64 + config.balance_weight * imbalance,
    })
}
