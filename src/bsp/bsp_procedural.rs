// src/bsp/bsp_procedural.rs
//! Seeded grid maps for tests and demos.
//!
//! Each cell of a `width` x `height` grid is filled with probability
//! `fill_probability`. Filled cells that touch become one room unless a
//! two-sided divider line is placed between them; rooms separated by
//! dividers get their own sectors. The same seed always yields the same map.

use std::collections::{HashMap, VecDeque};

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::map::{MapGeometry, Sector, Vertex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub width: usize,
    pub height: usize,
    pub cell_size: i32,
    pub fill_probability: f64,
    pub divider_probability: f64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            width: 8,
            height: 8,
            cell_size: 64,
            fill_probability: 0.6,
            divider_probability: 0.2,
            seed: 0,
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    pub occupied_cells: usize,
    pub sectors: usize,
    pub dividers: usize,
    pub walls: usize,
}

pub struct ProceduralGenerator {
    config: GeneratorConfig,
    rng: StdRng,
    stats: GenerationStats,
    occupied: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    filled: bool,
    divider_east: bool,
    divider_north: bool,
    sector: usize,
}

impl ProceduralGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        ProceduralGenerator {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            stats: GenerationStats::default(),
            occupied: Vec::new(),
        }
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    /// Grid coordinates of the filled cells of the last generated map.
    pub fn occupied(&self) -> &[(usize, usize)] {
        &self.occupied
    }

    pub fn generate(&mut self) -> MapGeometry {
        let (width, height) = (self.config.width.max(1), self.config.height.max(1));
        let mut cells = vec![Cell::default(); width * height];

        for cell in cells.iter_mut() {
            cell.filled = self.rng.random_bool(self.config.fill_probability.clamp(0.0, 1.0));
        }
        if !cells.iter().any(|c| c.filled) {
            cells[(height / 2) * width + width / 2].filled = true;
        }

        let divider_p = self.config.divider_probability.clamp(0.0, 1.0);
        for y in 0..height {
            for x in 0..width {
                if !cells[y * width + x].filled {
                    continue;
                }
                if x + 1 < width && cells[y * width + x + 1].filled {
                    cells[y * width + x].divider_east = self.rng.random_bool(divider_p);
                }
                if y + 1 < height && cells[(y + 1) * width + x].filled {
                    cells[y * width + x].divider_north = self.rng.random_bool(divider_p);
                }
            }
        }

        let sectors = assign_sectors(&mut cells, width, height);
        let map = self.emit(&cells, width, height, sectors);
        self.occupied = (0..cells.len())
            .filter(|&i| cells[i].filled)
            .map(|i| (i % width, i / width))
            .collect();
        self.stats.occupied_cells = self.occupied.len();
        self.stats.sectors = sectors;
        debug!(
            "Generated {}x{} grid (seed {}): {:?}",
            width, height, self.config.seed, self.stats
        );
        map
    }

    fn emit(&mut self, cells: &[Cell], width: usize, height: usize, sectors: usize) -> MapGeometry {
        let size = self.config.cell_size;
        let mut map = MapGeometry::new();
        for _ in 0..sectors {
            map.add_sector(Sector::default());
        }
        let mut vertex_ids: HashMap<(i32, i32), usize> = HashMap::new();
        let mut vertex = |map: &mut MapGeometry, gx: usize, gy: usize| {
            let key = (gx as i32 * size, gy as i32 * size);
            *vertex_ids.entry(key).or_insert_with(|| {
                map.vertices.push(Vertex::new(key.0, key.1));
                map.vertices.len() - 1
            })
        };
        let filled = |x: isize, y: isize| {
            x >= 0
                && y >= 0
                && (x as usize) < width
                && (y as usize) < height
                && cells[y as usize * width + x as usize].filled
        };

        self.stats.walls = 0;
        self.stats.dividers = 0;
        for y in 0..height {
            for x in 0..width {
                let cell = cells[y * width + x];
                if !cell.filled {
                    continue;
                }
                let (ix, iy) = (x as isize, y as isize);
                // Clockwise around the cell, so the cell is on each wall's right.
                let edges = [
                    (filled(ix - 1, iy), (x, y), (x, y + 1)),
                    (filled(ix, iy + 1), (x, y + 1), (x + 1, y + 1)),
                    (filled(ix + 1, iy), (x + 1, y + 1), (x + 1, y)),
                    (filled(ix, iy - 1), (x + 1, y), (x, y)),
                ];
                for (neighbour, a, b) in edges {
                    if !neighbour {
                        let start = vertex(&mut map, a.0, a.1);
                        let end = vertex(&mut map, b.0, b.1);
                        map.add_linedef(start, end, Some(cell.sector), None);
                        self.stats.walls += 1;
                    }
                }

                if cell.divider_east {
                    let start = vertex(&mut map, x + 1, y + 1);
                    let end = vertex(&mut map, x + 1, y);
                    let other = cells[y * width + x + 1].sector;
                    map.add_linedef(start, end, Some(cell.sector), Some(other));
                    self.stats.dividers += 1;
                }
                if cell.divider_north {
                    let start = vertex(&mut map, x, y + 1);
                    let end = vertex(&mut map, x + 1, y + 1);
                    let other = cells[(y + 1) * width + x].sector;
                    map.add_linedef(start, end, Some(cell.sector), Some(other));
                    self.stats.dividers += 1;
                }
            }
        }
        map
    }
}

/// Flood-fills filled cells that are not separated by a divider into one
/// sector each. Returns the sector count.
fn assign_sectors(cells: &mut [Cell], width: usize, height: usize) -> usize {
    let mut seen = vec![false; cells.len()];
    let mut sectors = 0;
    let mut queue = VecDeque::new();

    for first in 0..cells.len() {
        if !cells[first].filled || seen[first] {
            continue;
        }
        seen[first] = true;
        queue.push_back(first);
        while let Some(i) = queue.pop_front() {
            cells[i].sector = sectors;
            let (x, y) = (i % width, i / width);
            let mut open = Vec::with_capacity(4);
            if x + 1 < width && !cells[i].divider_east {
                open.push(i + 1);
            }
            if x > 0 && !cells[i - 1].divider_east {
                open.push(i - 1);
            }
            if y + 1 < height && !cells[i].divider_north {
                open.push(i + width);
            }
            if y > 0 && !cells[i - width].divider_north {
                open.push(i - width);
            }
            for j in open {
                if cells[j].filled && !seen[j] {
                    seen[j] = true;
                    queue.push_back(j);
                }
            }
        }
        sectors += 1;
    }
    sectors
}
