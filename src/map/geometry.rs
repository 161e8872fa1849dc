// src/map/geometry.rs
//! The map description handed to the node builder.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::map::{LineDef, Sector, SideDef, Vertex, NO_SIDEDEF};

/// Vertices, lines, sides and sectors of one level.
///
/// JSON form:
///
/// ```json
/// {
///   "vertices": [{"x": 0, "y": 0}, {"x": 0, "y": 64}, {"x": 64, "y": 0}],
///   "linedefs": [{"start": 0, "end": 1, "right": 0}],
///   "sidedefs": [{"sector": 0}],
///   "sectors": [{}]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapGeometry {
    pub vertices: Vec<Vertex>,
    pub linedefs: Vec<LineDef>,
    #[serde(default)]
    pub sidedefs: Vec<SideDef>,
    #[serde(default)]
    pub sectors: Vec<Sector>,
}

impl MapGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let text = fs::read_to_string(path.as_ref())?;
        let map = Self::from_json_str(&text)?;
        info!(
            "Loaded {}: {} vertices, {} linedefs, {} sectors",
            path.as_ref().display(),
            map.vertices.len(),
            map.linedefs.len(),
            map.sectors.len()
        );
        Ok(map)
    }

    pub fn to_json_string(&self) -> Result<String, MapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), MapError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Index of the vertex at (x, y), added if not already present.
    pub fn add_vertex(&mut self, x: i32, y: i32) -> usize {
        if let Some(index) = self.vertices.iter().position(|v| v.matches(x, y)) {
            return index;
        }
        self.vertices.push(Vertex::new(x, y));
        self.vertices.len() - 1
    }

    pub fn add_sector(&mut self, sector: Sector) -> usize {
        self.sectors.push(sector);
        self.sectors.len() - 1
    }

    pub fn add_sidedef(&mut self, sidedef: SideDef) -> usize {
        self.sidedefs.push(sidedef);
        self.sidedefs.len() - 1
    }

    /// Adds a line from `start` to `end`. Each present side gets a fresh
    /// sidedef facing the given sector.
    pub fn add_linedef(
        &mut self,
        start: usize,
        end: usize,
        right_sector: Option<usize>,
        left_sector: Option<usize>,
    ) -> usize {
        let right = self.side_for(right_sector);
        let left = self.side_for(left_sector);
        self.linedefs.push(LineDef::new(start, end, right, left));
        self.linedefs.len() - 1
    }

    fn side_for(&mut self, sector: Option<usize>) -> i32 {
        match sector {
            Some(sector) => self.add_sidedef(SideDef::new(sector as i32)) as i32,
            None => NO_SIDEDEF,
        }
    }

    /// Adds a closed one-sided room. `points` must run clockwise so the room
    /// lies on the right of every wall. Returns the new linedef indices.
    pub fn add_polygon(&mut self, points: &[(i32, i32)], sector: usize) -> Vec<usize> {
        let ids: Vec<usize> = points.iter().map(|&(x, y)| self.add_vertex(x, y)).collect();
        (0..ids.len())
            .map(|i| self.add_linedef(ids[i], ids[(i + 1) % ids.len()], Some(sector), None))
            .collect()
    }

    /// Checks every reference and rejects zero-length lines.
    pub fn validate(&self) -> Result<(), MapError> {
        for (index, side) in self.sidedefs.iter().enumerate() {
            if side.sector_index().map_or(true, |s| s >= self.sectors.len()) {
                return Err(MapError::MissingSector {
                    sidedef: index,
                    sector: side.sector,
                });
            }
        }

        for (index, line) in self.linedefs.iter().enumerate() {
            for vertex in [line.start, line.end] {
                if vertex >= self.vertices.len() {
                    return Err(MapError::MissingVertex { linedef: index, vertex });
                }
            }
            for sidedef in [line.right_side(), line.left_side()].into_iter().flatten() {
                if sidedef >= self.sidedefs.len() {
                    return Err(MapError::MissingSidedef { linedef: index, sidedef });
                }
            }
            if self.vertices[line.start] == self.vertices[line.end] {
                return Err(MapError::ZeroLengthLine { linedef: index });
            }
        }
        Ok(())
    }
}
