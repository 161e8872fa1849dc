// src/map/vertex.rs
use std::io::{self, Read};
use byteorder::{LE, ReadBytesExt};
use serde::{Deserialize, Serialize};

use crate::bsp::Point2D;

/// A map vertex in integer map units (4 bytes in a WAD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(rename = "x")]
    pub raw_x: i32,
    #[serde(rename = "y")]
    pub raw_y: i32,
}

impl Vertex {
    pub fn new(raw_x: i32, raw_y: i32) -> Self {
        Vertex { raw_x, raw_y }
    }

    pub fn from_wad<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Vertex {
            raw_x: reader.read_i16::<LE>()? as i32,
            raw_y: reader.read_i16::<LE>()? as i32,
        })
    }

    pub fn matches(&self, tx: i32, ty: i32) -> bool {
        self.raw_x == tx && self.raw_y == ty
    }

    pub fn to_point(&self) -> Point2D {
        Point2D::new(self.raw_x as f64, self.raw_y as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_from_wad_reads_signed_coordinates() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-64i16).to_le_bytes());
        bytes.extend_from_slice(&128i16.to_le_bytes());
        let v = Vertex::from_wad(&mut Cursor::new(bytes)).unwrap();
        assert!(v.matches(-64, 128));
        assert_eq!(v.to_point(), Point2D::new(-64.0, 128.0));
    }
}
