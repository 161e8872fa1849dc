// src/bsp/bsp_builder.rs
//! Steppable BSP construction.
//!
//! Instead of recursing, the builder keeps a worklist of partition jobs. Each
//! call to [`BspBuilder::execute`] resolves exactly one job, either into a leaf
//! or into an interior node whose two children are pushed back as new jobs.
//! Nodes live in an index arena until the last job resolves, at which point
//! the owned tree is assembled. A caller can therefore spread a build over
//! as many frames as it likes.

use std::mem;

use log::{debug, info, warn};

use crate::bsp::bsp_node::is_convex;
use crate::bsp::{
    partition_segs, select_partition, BspNode, BspTree, BuildConfig, BuildStats, Line2D, Partition,
    Seg, Subsector,
};
use crate::error::BuildError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Created, no step run yet.
    Pending,
    /// At least one step run, jobs remain.
    Stepping,
    /// Every job resolved; the root is available.
    Done,
    /// A step failed; the build cannot continue.
    Failed,
}

#[derive(Debug)]
struct PartitionJob {
    slot: usize,
    segs: Vec<Seg>,
    depth: usize,
}

#[derive(Debug)]
enum Slot {
    Unresolved,
    Leaf(Subsector),
    Node {
        partition: Line2D,
        front: usize,
        back: usize,
    },
}

#[derive(Debug)]
pub struct BspBuilder {
    config: BuildConfig,
    state: BuilderState,
    jobs: Vec<PartitionJob>,
    slots: Vec<Slot>,
    root: Option<BspNode>,
    stats: BuildStats,
    seg_count: usize,
}

impl BspBuilder {
    /// Validates the config and every input seg, then queues the root job.
    pub fn new(segs: Vec<Seg>, config: BuildConfig) -> Result<Self, BuildError> {
        config.validate()?;

        for (index, seg) in segs.iter().enumerate() {
            if seg.validate().is_err() {
                return Err(BuildError::DegenerateSegment {
                    index,
                    linedef: seg.linedef(),
                });
            }
        }
        if segs.len() > config.max_segments {
            return Err(BuildError::SegmentLimitExceeded {
                count: segs.len(),
                limit: config.max_segments,
            });
        }

        info!("Preparing BSP build for {} segs", segs.len());
        let stats = BuildStats {
            input_segs: segs.len(),
            ..BuildStats::default()
        };
        Ok(BspBuilder {
            seg_count: segs.len(),
            config,
            state: BuilderState::Pending,
            jobs: vec![PartitionJob { slot: 0, segs, depth: 0 }],
            slots: vec![Slot::Unresolved],
            root: None,
            stats,
        })
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == BuilderState::Done
    }

    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Resolves one job. A no-op once the build is done.
    pub fn execute(&mut self) -> Result<(), BuildError> {
        match self.state {
            BuilderState::Done => return Ok(()),
            BuilderState::Failed => return Err(BuildError::Aborted),
            BuilderState::Pending | BuilderState::Stepping => {}
        }
        self.state = BuilderState::Stepping;

        let result = self.step();
        if let Err(err) = &result {
            warn!("BSP build failed after {} steps: {}", self.stats.steps, err);
            self.state = BuilderState::Failed;
            self.jobs.clear();
        }
        result
    }

    /// Runs at most `max_steps` jobs and returns how many ran.
    pub fn run_steps(&mut self, max_steps: usize) -> Result<usize, BuildError> {
        let mut ran = 0;
        while ran < max_steps && !self.is_done() {
            self.execute()?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Runs every remaining job and hands back the finished tree.
    pub fn build(mut self) -> Result<BspTree, BuildError> {
        while !self.is_done() {
            self.execute()?;
        }
        Ok(self.into_tree())
    }

    /// The finished root.
    ///
    /// # Panics
    ///
    /// If the build is not done.
    pub fn root(&self) -> &BspNode {
        assert!(self.is_done(), "BspBuilder::root called before the build finished");
        self.root.as_ref().expect("root is assembled when the build finishes")
    }

    /// # Panics
    ///
    /// If the build is not done.
    pub fn into_tree(self) -> BspTree {
        assert!(self.is_done(), "BspBuilder::into_tree called before the build finished");
        let root = self.root.expect("root is assembled when the build finishes");
        BspTree::new(root, self.stats)
    }

    fn step(&mut self) -> Result<(), BuildError> {
        let Some(job) = self.jobs.pop() else {
            self.finish();
            return Ok(());
        };
        self.stats.steps += 1;

        if job.segs.is_empty() || is_convex(&job.segs, self.config.epsilon) {
            debug!("Leaf at depth {} with {} segs", job.depth, job.segs.len());
            self.stats.subsectors += 1;
            self.stats.output_segs += job.segs.len();
            self.stats.max_depth = self.stats.max_depth.max(job.depth);
            self.slots[job.slot] = Slot::Leaf(Subsector::new(job.segs));
        } else {
            self.split_job(job)?;
        }

        if self.jobs.is_empty() {
            self.finish();
        }
        Ok(())
    }

    fn split_job(&mut self, job: PartitionJob) -> Result<(), BuildError> {
        if job.depth >= self.config.max_depth {
            return Err(BuildError::MaxDepthExceeded {
                depth: job.depth + 1,
                limit: self.config.max_depth,
            });
        }

        let choice = select_partition(&job.segs, &self.config)?;
        let partition = Partition::from_seg(&job.segs[choice.index]);
        debug!(
            "Node at depth {}: partition {:?} -> {:?} (front={} back={} splits={} score={})",
            job.depth,
            partition.start,
            partition.end,
            choice.front,
            choice.back,
            choice.splits,
            choice.score
        );

        let outcome = partition_segs(&job.segs, &partition, &self.config);
        self.seg_count += outcome.splits + outcome.minisegs;
        if self.seg_count > self.config.max_segments {
            return Err(BuildError::SegmentLimitExceeded {
                count: self.seg_count,
                limit: self.config.max_segments,
            });
        }
        self.stats.splits += outcome.splits;
        self.stats.minisegs += outcome.minisegs;
        self.stats.nodes += 1;

        let front = self.slots.len();
        let back = front + 1;
        self.slots.push(Slot::Unresolved);
        self.slots.push(Slot::Unresolved);
        self.slots[job.slot] = Slot::Node {
            partition: partition.line(),
            front,
            back,
        };

        // Front goes on top so it resolves first.
        self.jobs.push(PartitionJob {
            slot: back,
            segs: outcome.back,
            depth: job.depth + 1,
        });
        self.jobs.push(PartitionJob {
            slot: front,
            segs: outcome.front,
            depth: job.depth + 1,
        });
        Ok(())
    }

    fn finish(&mut self) {
        let root = assemble(&mut self.slots, 0);
        self.slots.clear();
        self.root = Some(root);
        self.state = BuilderState::Done;
        info!(
            "BSP build done in {} steps: {} nodes, {} subsectors, {} splits, {} minisegs, depth {}",
            self.stats.steps,
            self.stats.nodes,
            self.stats.subsectors,
            self.stats.splits,
            self.stats.minisegs,
            self.stats.max_depth
        );
    }
}

fn assemble(slots: &mut [Slot], index: usize) -> BspNode {
    match mem::replace(&mut slots[index], Slot::Unresolved) {
        Slot::Leaf(subsector) => BspNode::Leaf(subsector),
        Slot::Node { partition, front, back } => {
            let front = assemble(slots, front);
            let back = assemble(slots, back);
            BspNode::create_node(partition, front, back)
        }
        Slot::Unresolved => unreachable!("slot {index} was never resolved"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::{Point2D, SegSource, SegmentSide};
    use assert_approx_eq::assert_approx_eq;

    fn loop_segs(first_linedef: usize, points: &[(f64, f64)]) -> Vec<Seg> {
        (0..points.len())
            .map(|i| {
                let (a, b) = (points[i], points[(i + 1) % points.len()]);
                let source = SegSource {
                    linedef: first_linedef + i,
                    side: SegmentSide::Front,
                    sidedef: Some(first_linedef + i),
                    sector: Some(0),
                };
                Seg::new(Point2D::new(a.0, a.1), Point2D::new(b.0, b.1), Some(source), 0.0).unwrap()
            })
            .collect()
    }

    fn square_room() -> Vec<Seg> {
        loop_segs(0, &[(0.0, 0.0), (0.0, 64.0), (64.0, 64.0), (64.0, 0.0)])
    }

    fn l_room() -> Vec<Seg> {
        loop_segs(0, &[(0.0, 0.0), (0.0, 2.0), (1.0, 2.0), (1.0, 1.0), (2.0, 1.0), (2.0, 0.0)])
    }

    fn two_rooms() -> Vec<Seg> {
        let mut segs = loop_segs(0, &[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        segs.extend(loop_segs(4, &[(2.0, 0.0), (2.0, 1.0), (3.0, 1.0), (3.0, 0.0)]));
        segs
    }

    fn build(segs: Vec<Seg>) -> BspTree {
        BspBuilder::new(segs, BuildConfig::default()).unwrap().build().unwrap()
    }

    #[test]
    fn test_square_room_is_a_single_leaf() {
        let tree = build(square_room());
        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.subsector_count(), 1);
        match tree.root() {
            BspNode::Leaf(sub) => {
                assert_eq!(sub.segs.len(), 4);
                assert_approx_eq!(sub.area(), 64.0 * 64.0);
                assert_eq!(sub.sector(), Some(0));
            }
            BspNode::Node { .. } => panic!("square room should not be split"),
        }
    }

    #[test]
    fn test_l_room_splits_once_into_two_rectangles() {
        let tree = build(l_room());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.subsector_count(), 2);

        let leaves = tree.subsectors();
        let mut minisegs = Vec::new();
        for leaf in &leaves {
            assert!(leaf.is_convex(1e-9));
            let mini: Vec<&Seg> = leaf.segs.iter().filter(|s| s.is_miniseg()).collect();
            assert_eq!(mini.len(), 1);
            minisegs.push(mini[0].clone());
        }
        // The same cut, seen from both sides.
        assert_eq!(minisegs[0].start, minisegs[1].end);
        assert_eq!(minisegs[0].end, minisegs[1].start);

        let areas: Vec<f64> = leaves.iter().map(|l| l.area()).collect();
        assert_approx_eq!(areas[0], 2.0);
        assert_approx_eq!(areas[1], 1.0);
        assert_eq!(tree.stats().splits, 1);
        assert_eq!(tree.stats().minisegs, 2);
    }

    #[test]
    fn test_zero_length_seg_rejected_before_any_step() {
        let mut segs = square_room();
        let p = Point2D::new(10.0, 10.0);
        segs.push(Seg {
            start: p,
            end: p,
            angle: 0.0,
            length: 0.0,
            offset: 0.0,
            source: Some(SegSource {
                linedef: 42,
                side: SegmentSide::Front,
                sidedef: None,
                sector: None,
            }),
        });
        let err = BspBuilder::new(segs, BuildConfig::default()).unwrap_err();
        assert_eq!(err, BuildError::DegenerateSegment { index: 4, linedef: Some(42) });
    }

    #[test]
    fn test_edited_seg_rejected_before_any_step() {
        let mut segs = l_room();
        segs[2].length = 0.0;
        let err = BspBuilder::new(segs, BuildConfig::default()).unwrap_err();
        assert_eq!(err, BuildError::DegenerateSegment { index: 2, linedef: Some(2) });
    }

    #[test]
    fn test_thin_notch_builds_with_default_tolerances() {
        let notched = || {
            loop_segs(0, &[(0.0, 0.0), (0.0, 10.0), (9.5, 10.0), (9.5, 0.5), (10.0, 0.5), (10.0, 0.0)])
        };
        let oversized = BuildConfig {
            min_seg_length: 1.0,
            ..BuildConfig::default()
        };
        assert!(matches!(
            BspBuilder::new(notched(), oversized),
            Err(BuildError::InvalidConfig(_))
        ));

        let config = BuildConfig::default();
        let tree = build(notched());
        assert!(tree.depth() < config.max_depth);
        let leaves = tree.subsectors();
        for leaf in &leaves {
            assert!(leaf.is_convex(config.epsilon));
        }
        let area: f64 = leaves.iter().map(|l| l.area()).sum();
        assert_approx_eq!(area, 95.25, 1e-9);
    }

    #[test]
    fn test_disjoint_rooms_separated_without_splits() {
        let tree = build(two_rooms());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.stats().splits, 0);
        assert_eq!(tree.stats().minisegs, 0);
        for leaf in tree.subsectors() {
            assert_eq!(leaf.segs.len(), 4);
            assert_approx_eq!(leaf.area(), 1.0);
        }
        assert_eq!(tree.locate(Point2D::new(0.5, 0.5)).segs[0].linedef().unwrap() / 4, 0);
        assert_eq!(tree.locate(Point2D::new(2.5, 0.5)).segs[0].linedef().unwrap() / 4, 1);
    }

    #[test]
    fn test_stepwise_state_machine() {
        let mut builder = BspBuilder::new(l_room(), BuildConfig::default()).unwrap();
        assert_eq!(builder.state(), BuilderState::Pending);
        assert_eq!(builder.pending_jobs(), 1);

        builder.execute().unwrap();
        assert_eq!(builder.state(), BuilderState::Stepping);
        assert_eq!(builder.pending_jobs(), 2);

        builder.execute().unwrap();
        assert_eq!(builder.pending_jobs(), 1);
        assert!(!builder.is_done());

        builder.execute().unwrap();
        assert!(builder.is_done());
        assert_eq!(builder.stats().steps, 3);
        assert!(!builder.root().is_leaf());

        // Further steps do nothing.
        builder.execute().unwrap();
        assert_eq!(builder.stats().steps, 3);
    }

    #[test]
    fn test_run_steps_respects_budget() {
        let mut builder = BspBuilder::new(l_room(), BuildConfig::default()).unwrap();
        assert_eq!(builder.run_steps(2).unwrap(), 2);
        assert!(!builder.is_done());
        assert_eq!(builder.run_steps(10).unwrap(), 1);
        assert!(builder.is_done());
    }

    #[test]
    #[should_panic(expected = "before the build finished")]
    fn test_root_before_done_panics() {
        let builder = BspBuilder::new(l_room(), BuildConfig::default()).unwrap();
        let _ = builder.root();
    }

    #[test]
    fn test_max_depth_exceeded_is_fatal() {
        let config = BuildConfig {
            max_depth: 0,
            ..BuildConfig::default()
        };
        let mut builder = BspBuilder::new(l_room(), config).unwrap();
        let err = builder.execute().unwrap_err();
        assert_eq!(err, BuildError::MaxDepthExceeded { depth: 1, limit: 0 });
        assert_eq!(builder.state(), BuilderState::Failed);
        assert_eq!(builder.execute().unwrap_err(), BuildError::Aborted);
    }

    #[test]
    fn test_depth_zero_still_allows_convex_maps() {
        let config = BuildConfig {
            max_depth: 0,
            ..BuildConfig::default()
        };
        let tree = BspBuilder::new(square_room(), config).unwrap().build().unwrap();
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_segment_limit() {
        let config = BuildConfig {
            max_segments: 6,
            ..BuildConfig::default()
        };
        let err = BspBuilder::new(l_room(), config.clone()).unwrap().build().unwrap_err();
        assert_eq!(err, BuildError::SegmentLimitExceeded { count: 9, limit: 6 });

        let err = BspBuilder::new(two_rooms(), config).unwrap_err();
        assert_eq!(err, BuildError::SegmentLimitExceeded { count: 8, limit: 6 });
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BuildConfig {
            epsilon: -1.0,
            ..BuildConfig::default()
        };
        assert!(matches!(
            BspBuilder::new(square_room(), config),
            Err(BuildError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_input_builds_empty_leaf() {
        let tree = build(Vec::new());
        assert!(tree.root().is_leaf());
        assert!(tree.subsectors()[0].is_empty());
    }

    #[test]
    fn test_build_is_deterministic() {
        let mut segs = l_room();
        segs.extend(loop_segs(6, &[(5.0, 0.0), (5.0, 3.0), (9.0, 3.0), (7.0, 1.5), (9.0, 0.0)]));
        assert_eq!(build(segs.clone()), build(segs));
    }
}
