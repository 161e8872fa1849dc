// src/bsp/bsp_level.rs

use std::collections::HashMap;

use log::{info, warn};

use crate::bsp::{BspBuilder, BspTree, BuildConfig, BuilderState, Point2D, Seg, SegSource, SegmentSide};
use crate::error::BuildError;
use crate::map::{MapGeometry, Vertex};

/// One map level and its node build.
///
/// The build can run in one go with [`BspLevel::build`] or a few jobs at a
/// time with [`BspLevel::step`], e.g. once per editor frame.
#[derive(Debug)]
pub struct BspLevel {
    map: MapGeometry,
    config: BuildConfig,
    builder: Option<BspBuilder>,
    tree: Option<BspTree>,
}

impl BspLevel {
    pub fn new(map: MapGeometry, config: BuildConfig) -> Result<Self, BuildError> {
        map.validate()?;
        config.validate()?;
        Ok(BspLevel {
            map,
            config,
            builder: None,
            tree: None,
        })
    }

    pub fn map(&self) -> &MapGeometry {
        &self.map
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// One seg per linedef side. The right side runs start to end; the left
    /// side runs end to start so its sector is also on its right.
    pub fn create_initial_segs(&self) -> Result<Vec<Seg>, BuildError> {
        let map = &self.map;
        let mut segs = Vec::with_capacity(map.linedefs.len() * 2);

        for (index, linedef) in map.linedefs.iter().enumerate() {
            let start = map.vertices[linedef.start].to_point();
            let end = map.vertices[linedef.end].to_point();

            let sides = [
                (SegmentSide::Front, linedef.right_side(), start, end),
                (SegmentSide::Back, linedef.left_side(), end, start),
            ];
            let mut any_side = false;
            for (side, sidedef, from, to) in sides {
                let Some(sidedef) = sidedef else { continue };
                any_side = true;
                let source = SegSource {
                    linedef: index,
                    side,
                    sidedef: Some(sidedef),
                    sector: map.sidedefs[sidedef].sector_index(),
                };
                let seg = Seg::new(from, to, Some(source), 0.0).map_err(|_| {
                    BuildError::DegenerateSegment {
                        index: segs.len(),
                        linedef: Some(index),
                    }
                })?;
                segs.push(seg);
            }
            if !any_side {
                warn!("Linedef {} has no sidedefs; skipping", index);
            }
        }

        let open = open_vertices(&segs, &map.vertices);
        if open > 0 {
            warn!("{} vertices have unmatched segs; the map boundary is not closed", open);
        }
        Ok(segs)
    }

    /// A fresh builder over this level's segs.
    pub fn builder(&self) -> Result<BspBuilder, BuildError> {
        BspBuilder::new(self.create_initial_segs()?, self.config.clone())
    }

    /// Builds (or finishes building) the whole tree.
    pub fn build(&mut self) -> Result<&BspTree, BuildError> {
        while !self.step(usize::MAX)? {}
        self.tree.as_ref().ok_or(BuildError::Aborted)
    }

    /// Runs up to `max_steps` builder jobs. Returns true once the tree is
    /// available.
    ///
    /// A failed build stays failed: later calls return
    /// [`BuildError::Aborted`] until [`BspLevel::reset`].
    pub fn step(&mut self, max_steps: usize) -> Result<bool, BuildError> {
        if self.tree.is_some() {
            return Ok(true);
        }
        if self.builder.is_none() {
            info!("Building nodes for {} linedefs", self.map.linedefs.len());
            self.builder = Some(self.builder()?);
        }
        let Some(builder) = self.builder.as_mut() else {
            return Ok(false);
        };
        builder.run_steps(max_steps)?;
        if builder.is_done() {
            self.tree = self.builder.take().map(BspBuilder::into_tree);
        }
        Ok(self.tree.is_some())
    }

    pub fn state(&self) -> BuilderState {
        match (&self.tree, &self.builder) {
            (Some(_), _) => BuilderState::Done,
            (None, Some(builder)) => builder.state(),
            (None, None) => BuilderState::Pending,
        }
    }

    pub fn tree(&self) -> Option<&BspTree> {
        self.tree.as_ref()
    }

    /// Drops any finished or partial build.
    pub fn reset(&mut self) {
        self.builder = None;
        self.tree = None;
    }

    pub fn sector_at(&self, x: f64, y: f64) -> Option<usize> {
        self.tree.as_ref()?.sector_at(Point2D::new(x, y))
    }
}

/// Count of map vertices where segs arriving and leaving do not balance.
fn open_vertices(segs: &[Seg], vertices: &[Vertex]) -> usize {
    let mut balance: HashMap<(i64, i64), i32> = HashMap::with_capacity(vertices.len());
    let key = |p: &Point2D| (p.x.round() as i64, p.y.round() as i64);
    for seg in segs {
        *balance.entry(key(&seg.start)).or_insert(0) += 1;
        *balance.entry(key(&seg.end)).or_insert(0) -= 1;
    }
    balance.values().filter(|&&b| b != 0).count()
}
