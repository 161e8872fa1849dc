//! The finished BSP tree and its queries.

use serde::Serialize;

use crate::bsp::{BspNode, Point2D, Subsector};

/// Counters gathered while building.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub input_segs: usize,
    pub output_segs: usize,
    pub splits: usize,
    pub minisegs: usize,
    pub nodes: usize,
    pub subsectors: usize,
    pub max_depth: usize,
    pub steps: usize,
}

/// Visitor for processing subsectors during tree traversal.
pub trait BspVisitor {
    fn visit(&mut self, subsector: &Subsector);
}

/// A simple visitor that collects a copy of every visited subsector.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    collected: Vec<Subsector>,
}

impl CollectingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subsectors(&self) -> &[Subsector] {
        &self.collected
    }

    pub fn into_subsectors(self) -> Vec<Subsector> {
        self.collected
    }
}

impl BspVisitor for CollectingVisitor {
    fn visit(&mut self, subsector: &Subsector) {
        self.collected.push(subsector.clone());
    }
}

/// A visitor that calls a closure for each subsector.
pub struct FnVisitor<F>
where
    F: FnMut(&Subsector),
{
    func: F,
}

impl<F> FnVisitor<F>
where
    F: FnMut(&Subsector),
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> BspVisitor for FnVisitor<F>
where
    F: FnMut(&Subsector),
{
    fn visit(&mut self, subsector: &Subsector) {
        (self.func)(subsector);
    }
}

/// A built tree. Immutable once produced, so it can be shared between readers
/// freely.
///
/// # Traversal
///
/// ```ignore
/// tree.traverse_front_to_back(viewpoint, &mut visitor);
/// ```
///
/// visits leaves nearest the viewpoint first. `traverse_back_to_front`
/// gives painter's-algorithm order.
#[derive(Debug, Clone, PartialEq)]
pub struct BspTree {
    root: BspNode,
    stats: BuildStats,
}

impl BspTree {
    pub fn new(root: BspNode, stats: BuildStats) -> Self {
        BspTree { root, stats }
    }

    #[inline]
    pub fn root(&self) -> &BspNode {
        &self.root
    }

    #[inline]
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    pub fn subsector_count(&self) -> usize {
        self.root.subsector_count()
    }

    /// All leaves, front child before back child.
    pub fn subsectors(&self) -> Vec<&Subsector> {
        let mut out = Vec::with_capacity(self.stats.subsectors);
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            match node {
                BspNode::Leaf(subsector) => out.push(subsector),
                BspNode::Node { front, back, .. } => {
                    stack.push(back);
                    stack.push(front);
                }
            }
        }
        out
    }

    /// The leaf whose region contains `point`. Points on a partition line
    /// go to the front child.
    pub fn locate(&self, point: Point2D) -> &Subsector {
        let mut node = &self.root;
        loop {
            match node {
                BspNode::Leaf(subsector) => return subsector,
                BspNode::Node { partition, front, back, .. } => {
                    node = if partition.is_front(&point) { front } else { back };
                }
            }
        }
    }

    /// Sector of the leaf containing `point`, if that leaf touches a map line.
    pub fn sector_at(&self, point: Point2D) -> Option<usize> {
        self.locate(point).sector()
    }

    pub fn traverse_front_to_back<V: BspVisitor>(&self, viewpoint: Point2D, visitor: &mut V) {
        traverse(&self.root, viewpoint, true, visitor);
    }

    pub fn traverse_back_to_front<V: BspVisitor>(&self, viewpoint: Point2D, visitor: &mut V) {
        traverse(&self.root, viewpoint, false, visitor);
    }

    /// Leaves in front-to-back order from `viewpoint`.
    pub fn collect_front_to_back(&self, viewpoint: Point2D) -> Vec<&Subsector> {
        let mut out = Vec::with_capacity(self.stats.subsectors);
        collect(&self.root, viewpoint, &mut out);
        out
    }
}

fn traverse<V: BspVisitor>(node: &BspNode, viewpoint: Point2D, near_first: bool, visitor: &mut V) {
    match node {
        BspNode::Leaf(subsector) => visitor.visit(subsector),
        BspNode::Node { partition, front, back, .. } => {
            let (near, far) = if partition.is_front(&viewpoint) {
                (front, back)
            } else {
                (back, front)
            };
            if near_first {
                traverse(near, viewpoint, near_first, visitor);
                traverse(far, viewpoint, near_first, visitor);
            } else {
                traverse(far, viewpoint, near_first, visitor);
                traverse(near, viewpoint, near_first, visitor);
            }
        }
    }
}

// Borrows leaves for the lifetime of the tree, which `BspVisitor` cannot.
fn collect<'a>(node: &'a BspNode, viewpoint: Point2D, out: &mut Vec<&'a Subsector>) {
    match node {
        BspNode::Leaf(subsector) => out.push(subsector),
        BspNode::Node { partition, front, back, .. } => {
            let (near, far) = if partition.is_front(&viewpoint) {
                (front, back)
            } else {
                (back, front)
            };
            collect(near, viewpoint, out);
            collect(far, viewpoint, out);
        }
    }
}
