// src/bsp/bsp_split.rs
//! Dividing a seg set by a partition line.
//!
//! Besides sorting segs into front and back, the splitter closes both halves
//! along the partition line with minisegs wherever the line runs through the
//! interior of the region and no wall already lies on it. Each half therefore
//! stays a closed boundary, which is what lets the leaves tile the map.

use log::{trace, warn};

use crate::bsp::bsp_partition::classify_distances;
use crate::bsp::{BuildConfig, Partition, Point2D, Seg, SegPosition};
use crate::utils::geometry::winding_number;

#[derive(Debug, Default)]
pub struct SplitOutcome {
    pub front: Vec<Seg>,
    pub back: Vec<Seg>,
    /// Segs that were cut in two.
    pub splits: usize,
    /// Minisegs created, counting each front/back pair as two.
    pub minisegs: usize,
}

/// Places every seg of `segs` on one side of `partition`, splitting the ones
/// that straddle it, and adds the minisegs that close both sides.
pub fn partition_segs(segs: &[Seg], partition: &Partition, config: &BuildConfig) -> SplitOutcome {
    let epsilon = config.epsilon;
    let mut outcome = SplitOutcome {
        front: Vec::with_capacity(segs.len()),
        back: Vec::with_capacity(segs.len()),
        ..SplitOutcome::default()
    };
    // Points where the set meets the line, keyed by their position along it.
    let mut touches: Vec<(f64, Point2D)> = Vec::new();
    // Stretches of the line already covered by a wall lying on it.
    let mut covered: Vec<(f64, f64)> = Vec::new();

    for seg in segs {
        let d_start = partition.distance(&seg.start);
        let d_end = partition.distance(&seg.end);

        match classify_distances(d_start, d_end, epsilon) {
            SegPosition::Front => {
                record_touches(seg, d_start, d_end, partition, epsilon, &mut touches);
                outcome.front.push(seg.clone());
            }
            SegPosition::Back => {
                record_touches(seg, d_start, d_end, partition, epsilon, &mut touches);
                outcome.back.push(seg.clone());
            }
            SegPosition::Coincident => {
                let a = partition.param(&seg.start);
                let b = partition.param(&seg.end);
                touches.push((a, seg.start));
                touches.push((b, seg.end));
                covered.push((a.min(b), a.max(b)));
                if partition.same_direction(seg) {
                    outcome.front.push(seg.clone());
                } else {
                    outcome.back.push(seg.clone());
                }
            }
            SegPosition::Spanning => {
                let t = d_start / (d_start - d_end);
                match seg.split(t, config) {
                    Ok((first, second)) => {
                        outcome.splits += 1;
                        touches.push((partition.param(&first.end), first.end));
                        if d_start > 0.0 {
                            outcome.front.push(first);
                            outcome.back.push(second);
                        } else {
                            outcome.back.push(first);
                            outcome.front.push(second);
                        }
                    }
                    Err(err) => {
                        warn!(
                            "Snapping seg {:?} -> {:?} onto the partition: {}",
                            seg.start, seg.end, err
                        );
                        let (kept, touch) = snap_near_end(seg, d_start, d_end, partition);
                        if let Some(point) = touch {
                            touches.push((partition.param(&point), point));
                        }
                        let farther = if d_start.abs() >= d_end.abs() { d_start } else { d_end };
                        if farther > 0.0 {
                            outcome.front.push(kept);
                        } else {
                            outcome.back.push(kept);
                        }
                    }
                }
            }
        }
    }

    add_minisegs(segs, partition, config, touches, &covered, &mut outcome);
    outcome
}

/// Moves the endpoint nearer the partition onto it, so the seg lies wholly on
/// its farther endpoint's side. Returns the moved seg and the point on the
/// line, or the seg unchanged if the shortened one would be degenerate.
fn snap_near_end(seg: &Seg, d_start: f64, d_end: f64, partition: &Partition) -> (Seg, Option<Point2D>) {
    let snapped = if d_start.abs() < d_end.abs() {
        let point = partition.project(&seg.start);
        Seg::new(point, seg.end, seg.source, seg.offset + seg.start.distance_to(&point))
            .map(|s| (s, point))
    } else {
        let point = partition.project(&seg.end);
        Seg::new(seg.start, point, seg.source, seg.offset).map(|s| (s, point))
    };
    match snapped {
        Ok((kept, point)) => (kept, Some(point)),
        Err(_) => (seg.clone(), None),
    }
}

fn record_touches(
    seg: &Seg,
    d_start: f64,
    d_end: f64,
    partition: &Partition,
    epsilon: f64,
    touches: &mut Vec<(f64, Point2D)>,
) {
    if d_start.abs() <= epsilon {
        touches.push((partition.param(&seg.start), seg.start));
    }
    if d_end.abs() <= epsilon {
        touches.push((partition.param(&seg.end), seg.end));
    }
}

fn add_minisegs(
    segs: &[Seg],
    partition: &Partition,
    config: &BuildConfig,
    mut touches: Vec<(f64, Point2D)>,
    covered: &[(f64, f64)],
    outcome: &mut SplitOutcome,
) {
    touches.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Weld points closer than epsilon along the line.
    let t_epsilon = config.epsilon / partition.length;
    let mut points: Vec<(f64, Point2D)> = Vec::with_capacity(touches.len());
    for (t, point) in touches {
        match points.last() {
            Some(&(last_t, _)) if t - last_t <= t_epsilon => {}
            _ => points.push((t, point)),
        }
    }

    for pair in points.windows(2) {
        let (t0, p0) = pair[0];
        let (t1, p1) = pair[1];
        if p0.distance_to(&p1) < config.min_seg_length {
            continue;
        }
        let mid_t = (t0 + t1) * 0.5;
        if covered.iter().any(|&(a, b)| mid_t > a && mid_t < b) {
            continue;
        }
        let mid = p0.lerp(&p1, 0.5);
        if winding_number(segs.iter().map(|s| (s.start, s.end)), &mid) == 0 {
            continue;
        }
        // Running with the partition keeps the front region on the right.
        if let (Ok(front), Ok(back)) = (Seg::miniseg(p0, p1), Seg::miniseg(p1, p0)) {
            trace!("miniseg {:?} -> {:?}", p0, p1);
            outcome.front.push(front);
            outcome.back.push(back);
            outcome.minisegs += 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::{SegSource, SegmentSide};
    use assert_approx_eq::assert_approx_eq;

    fn wall(linedef: usize, side: SegmentSide, a: (f64, f64), b: (f64, f64)) -> Seg {
        let source = SegSource {
            linedef,
            side,
            sidedef: None,
            sector: Some(0),
        };
        Seg::new(Point2D::new(a.0, a.1), Point2D::new(b.0, b.1), Some(source), 0.0).unwrap()
    }

    fn loop_segs(first_linedef: usize, points: &[(f64, f64)]) -> Vec<Seg> {
        (0..points.len())
            .map(|i| {
                wall(first_linedef + i, SegmentSide::Front, points[i], points[(i + 1) % points.len()])
            })
            .collect()
    }

    fn total_length(segs: &[Seg]) -> f64 {
        segs.iter().filter(|s| !s.is_miniseg()).map(|s| s.length).sum()
    }

    #[test]
    fn test_l_shape_split_closes_both_halves() {
        let segs = loop_segs(0, &[(0.0, 0.0), (0.0, 2.0), (1.0, 2.0), (1.0, 1.0), (2.0, 1.0), (2.0, 0.0)]);
        let partition = Partition::from_seg(&segs[2]);
        let out = partition_segs(&segs, &partition, &BuildConfig::default());

        assert_eq!(out.splits, 1);
        assert_eq!(out.minisegs, 2);
        assert_eq!(out.front.len(), 5);
        assert_eq!(out.back.len(), 4);

        let front_mini: Vec<_> = out.front.iter().filter(|s| s.is_miniseg()).collect();
        let back_mini: Vec<_> = out.back.iter().filter(|s| s.is_miniseg()).collect();
        assert_eq!(front_mini.len(), 1);
        assert_eq!(back_mini.len(), 1);
        assert_eq!(front_mini[0].start, Point2D::new(1.0, 1.0));
        assert_eq!(front_mini[0].end, Point2D::new(1.0, 0.0));
        assert_eq!(back_mini[0].start, front_mini[0].end);
        assert_eq!(back_mini[0].end, front_mini[0].start);
    }

    #[test]
    fn test_disjoint_rooms_need_no_minisegs() {
        let mut segs = loop_segs(0, &[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        segs.extend(loop_segs(4, &[(2.0, 0.0), (2.0, 1.0), (3.0, 1.0), (3.0, 0.0)]));
        let partition = Partition::from_seg(&segs[2]);
        let out = partition_segs(&segs, &partition, &BuildConfig::default());

        assert_eq!(out.splits, 0);
        assert_eq!(out.minisegs, 0);
        assert!(out.front.iter().all(|s| s.linedef().unwrap() < 4));
        assert!(out.back.iter().all(|s| s.linedef().unwrap() >= 4));
    }

    #[test]
    fn test_two_sided_divider_is_covered() {
        // A 2x1 room with a two-sided line down the middle.
        let mut segs = loop_segs(0, &[(0.0, 0.0), (0.0, 1.0), (2.0, 1.0), (2.0, 0.0)]);
        segs.push(wall(10, SegmentSide::Front, (1.0, 1.0), (1.0, 0.0)));
        segs.push(wall(10, SegmentSide::Back, (1.0, 0.0), (1.0, 1.0)));
        let partition = Partition::from_seg(&segs[4]);
        let out = partition_segs(&segs, &partition, &BuildConfig::default());

        assert_eq!(out.splits, 2);
        assert_eq!(out.minisegs, 0);
        let front_divider = out.front.iter().find(|s| s.linedef() == Some(10)).unwrap();
        let back_divider = out.back.iter().find(|s| s.linedef() == Some(10)).unwrap();
        assert_eq!(front_divider.source.unwrap().side, SegmentSide::Front);
        assert_eq!(back_divider.source.unwrap().side, SegmentSide::Back);
    }

    #[test]
    fn test_no_seg_is_dropped_and_length_is_conserved() {
        let segs = loop_segs(0, &[(0.0, 0.0), (0.0, 3.0), (1.0, 3.0), (1.0, 1.0), (3.0, 1.0), (3.0, 0.0)]);
        let before = total_length(&segs);
        for i in 0..segs.len() {
            let partition = Partition::from_seg(&segs[i]);
            let out = partition_segs(&segs, &partition, &BuildConfig::default());
            let mut after = out.front.clone();
            after.extend(out.back.iter().cloned());
            assert_approx_eq!(total_length(&after), before, 1e-9);
            assert_eq!(after.len() - out.minisegs, segs.len() + out.splits);
        }
    }

    #[test]
    fn test_refused_split_snaps_short_end_onto_line() {
        // Bypasses config validation to force a split whose short half is
        // under min_seg_length but farther than epsilon from the line.
        let config = BuildConfig {
            min_seg_length: 1.0,
            ..BuildConfig::default()
        };
        let partition = Partition::from_seg(&wall(0, SegmentSide::Front, (1.0, 2.0), (1.0, 1.0)));
        let segs = vec![wall(1, SegmentSide::Front, (0.9, 5.0), (3.0, 5.0))];
        let out = partition_segs(&segs, &partition, &config);

        assert_eq!(out.splits, 0);
        assert!(out.front.is_empty());
        assert_eq!(out.back.len(), 1);
        let kept = &out.back[0];
        assert_approx_eq!(kept.start.x, 1.0);
        assert_approx_eq!(kept.start.y, 5.0);
        assert_eq!(kept.end, Point2D::new(3.0, 5.0));
        assert_approx_eq!(kept.offset, 0.1);
        assert!(kept.validate().is_ok());
        assert_eq!(partition.classify(kept, config.epsilon), SegPosition::Back);
    }

    #[test]
    fn test_refused_split_in_a_room_still_makes_progress() {
        let config = BuildConfig {
            min_seg_length: 1.0,
            ..BuildConfig::default()
        };
        // The notch wall along y = 0.5 crosses the left wall half a unit
        // above its start, too short a piece to split off.
        let segs = loop_segs(
            0,
            &[(0.0, 0.0), (0.0, 10.0), (9.5, 10.0), (9.5, 0.5), (10.0, 0.5), (10.0, 0.0)],
        );
        let partition = Partition::from_seg(&segs[3]);
        let out = partition_segs(&segs, &partition, &config);

        assert_eq!(out.splits, 0);
        for seg in out.front.iter().chain(out.back.iter()) {
            assert_ne!(partition.classify(seg, config.epsilon), SegPosition::Spanning);
        }
        // The room closes along the line from the snapped left wall to the
        // reflex corner.
        assert_eq!(out.minisegs, 2);
        assert!(out.front.iter().any(|s| s.is_miniseg() && s.length > 9.0));
    }

    #[test]
    fn test_endpoint_within_epsilon_is_not_split() {
        let partition = Partition::from_seg(&wall(0, SegmentSide::Front, (1.0, 2.0), (1.0, 1.0)));
        // Starts 0.002 in front of x = 1, well inside the default tolerance.
        let segs = vec![wall(1, SegmentSide::Front, (0.998, 5.0), (3.0, 5.0))];
        let out = partition_segs(&segs, &partition, &BuildConfig::default());
        assert_eq!(out.splits, 0);
        assert!(out.front.is_empty());
        assert_eq!(out.back, segs);
    }
}
