// src/map/mod.rs
pub mod geometry;
pub mod linedef;
pub mod sector;
pub mod sidedef;
pub mod vertex;

pub use geometry::MapGeometry;
pub use linedef::{LineDef, NO_SIDEDEF};
pub use sector::Sector;
pub use sidedef::SideDef;
pub use vertex::Vertex;
