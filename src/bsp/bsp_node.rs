//! src/bsp/bsp_node.rs

use crate::bsp::{BoundingBox, Line2D, Point2D, Seg};
use crate::utils::geometry::signed_area;

/// A convex leaf region, bounded by its segs in clockwise order.
#[derive(Debug, Clone, PartialEq)]
pub struct Subsector {
    pub segs: Vec<Seg>,
    pub bbox: BoundingBox,
}

impl Subsector {
    /// Orders `segs` clockwise around their common centre.
    pub fn new(mut segs: Vec<Seg>) -> Self {
        if !segs.is_empty() {
            let n = segs.len() as f64;
            let (sx, sy) = segs.iter().fold((0.0, 0.0), |(x, y), s| {
                let m = s.midpoint();
                (x + m.x, y + m.y)
            });
            let centre = Point2D::new(sx / n, sy / n);
            let angle_of = |s: &Seg| {
                let m = s.midpoint();
                (m.y - centre.y).atan2(m.x - centre.x)
            };
            segs.sort_by(|a, b| angle_of(b).total_cmp(&angle_of(a)));
        }
        let bbox = BoundingBox::from_points(segs.iter().flat_map(|s| [&s.start, &s.end]));
        Subsector { segs, bbox }
    }

    pub fn is_empty(&self) -> bool {
        self.segs.is_empty()
    }

    /// Sector of the first seg that came from a map line.
    pub fn sector(&self) -> Option<usize> {
        self.segs.iter().find_map(Seg::sector)
    }

    /// Enclosed area. Positive for a clockwise (front-on-the-right) boundary.
    pub fn area(&self) -> f64 {
        -signed_area(self.segs.iter().map(|s| (s.start, s.end)))
    }

    /// True when no seg has any part of another seg behind its line.
    pub fn is_convex(&self, epsilon: f64) -> bool {
        is_convex(&self.segs, epsilon)
    }
}

pub(crate) fn is_convex(segs: &[Seg], epsilon: f64) -> bool {
    segs.iter().enumerate().all(|(i, a)| {
        segs.iter().enumerate().all(|(j, b)| {
            i == j
                || (a.distance_to_line(&b.start) >= -epsilon && a.distance_to_line(&b.end) >= -epsilon)
        })
    })
}

/// A node in the BSP tree: either a partition line with two owned children
/// or a leaf subsector.
#[derive(Debug, Clone, PartialEq)]
pub enum BspNode {
    Node {
        partition: Line2D,
        front_bbox: BoundingBox,
        back_bbox: BoundingBox,
        front: Box<BspNode>,
        back: Box<BspNode>,
    },
    Leaf(Subsector),
}

impl BspNode {
    pub fn create_leaf(segs: Vec<Seg>) -> Self {
        BspNode::Leaf(Subsector::new(segs))
    }

    pub fn empty_leaf() -> Self {
        BspNode::Leaf(Subsector::new(Vec::new()))
    }

    /// Create an internal node, recording the bounding box of each child.
    pub fn create_node(partition: Line2D, front: BspNode, back: BspNode) -> Self {
        BspNode::Node {
            partition,
            front_bbox: front.bbox(),
            back_bbox: back.bbox(),
            front: Box::new(front),
            back: Box::new(back),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, BspNode::Leaf(_))
    }

    pub fn bbox(&self) -> BoundingBox {
        match self {
            BspNode::Leaf(subsector) => subsector.bbox,
            BspNode::Node { front_bbox, back_bbox, .. } => {
                let mut bbox = *front_bbox;
                bbox.combine(back_bbox);
                bbox
            }
        }
    }

    /// Interior nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            BspNode::Leaf(_) => 0,
            BspNode::Node { front, back, .. } => 1 + front.depth().max(back.depth()),
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            BspNode::Leaf(_) => 0,
            BspNode::Node { front, back, .. } => 1 + front.node_count() + back.node_count(),
        }
    }

    pub fn subsector_count(&self) -> usize {
        match self {
            BspNode::Leaf(_) => 1,
            BspNode::Node { front, back, .. } => front.subsector_count() + back.subsector_count(),
        }
    }
}
