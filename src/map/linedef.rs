// src/map/linedef.rs
use std::io::{self, Read};
use byteorder::{LE, ReadBytesExt};
use serde::{Deserialize, Serialize};

/// Sidedef index meaning "no side" (WAD value 0xFFFF read as i16).
pub const NO_SIDEDEF: i32 = -1;

/// A linedef in classic DOOM format (14 bytes).
///
/// The right sidedef faces the sector on the line's right when walking from
/// `start` to `end`; the left sidedef (if any) faces the other way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineDef {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub flags: i32,
    #[serde(default)]
    pub line_type: i32,
    #[serde(default)]
    pub tag: i32,
    pub right: i32,
    #[serde(default = "no_sidedef")]
    pub left: i32,
}

fn no_sidedef() -> i32 {
    NO_SIDEDEF
}

impl LineDef {
    pub fn new(start: usize, end: usize, right: i32, left: i32) -> Self {
        LineDef {
            start,
            end,
            flags: 0,
            line_type: 0,
            tag: 0,
            right,
            left,
        }
    }

    pub fn from_wad<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(LineDef {
            start: reader.read_u16::<LE>()? as usize,
            end: reader.read_u16::<LE>()? as usize,
            flags: reader.read_i16::<LE>()? as i32,
            line_type: reader.read_i16::<LE>()? as i32,
            tag: reader.read_i16::<LE>()? as i32,
            right: sidedef_index(reader.read_u16::<LE>()?),
            left: sidedef_index(reader.read_u16::<LE>()?),
        })
    }

    pub fn right_side(&self) -> Option<usize> {
        usize::try_from(self.right).ok()
    }

    pub fn left_side(&self) -> Option<usize> {
        usize::try_from(self.left).ok()
    }

    pub fn is_two_sided(&self) -> bool {
        self.right_side().is_some() && self.left_side().is_some()
    }
}

/// Sidedef numbers are unsigned on disk; only 0xFFFF means "no side".
fn sidedef_index(raw: u16) -> i32 {
    if raw == u16::MAX {
        NO_SIDEDEF
    } else {
        i32::from(raw)
    }
}
