// src/map/sidedef.rs

use std::io::{self, Read};
use byteorder::{LE, ReadBytesExt};
use serde::{Deserialize, Serialize};

/// A sidedef in classic DOOM format (30 bytes total).
///
/// Layout (all little-endian):
///
/// ```text
/// offset  field       type / size
/// ------  ----------  ------------
///  0-1    x_offset    i16
///  2-3    y_offset    i16
///  4-11   upper_tex   [u8; 8]
/// 12-19   lower_tex   [u8; 8]
/// 20-27   mid_tex     [u8; 8]
/// 28-29   sector      i16  (index into sector list)
/// ```
///
/// Only `sector` matters to the node builder; the rest is carried through so
/// a loaded map keeps its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideDef {
    #[serde(default)]
    pub x_offset: i32,
    #[serde(default)]
    pub y_offset: i32,
    #[serde(default = "no_texture")]
    pub upper_tex: String,
    #[serde(default = "no_texture")]
    pub lower_tex: String,
    #[serde(default = "no_texture")]
    pub mid_tex: String,
    pub sector: i32,
}

fn no_texture() -> String {
    "-".to_string()
}

impl SideDef {
    /// An untextured sidedef facing `sector`.
    pub fn new(sector: i32) -> Self {
        SideDef {
            x_offset: 0,
            y_offset: 0,
            upper_tex: no_texture(),
            lower_tex: no_texture(),
            mid_tex: no_texture(),
            sector,
        }
    }

    /// Reads a `SideDef` in the 30-byte classic format. Texture names are
    /// uppercased with trailing NULs and spaces trimmed.
    pub fn from_wad<R: Read>(reader: &mut R) -> io::Result<Self> {
        let x_offset = reader.read_i16::<LE>()? as i32;
        let y_offset = reader.read_i16::<LE>()? as i32;

        let upper_tex = read_tex8(reader)?;
        let lower_tex = read_tex8(reader)?;
        let mid_tex = read_tex8(reader)?;

        let sector = reader.read_i16::<LE>()? as i32;

        Ok(SideDef {
            x_offset,
            y_offset,
            upper_tex,
            lower_tex,
            mid_tex,
            sector,
        })
    }

    pub fn sector_index(&self) -> Option<usize> {
        usize::try_from(self.sector).ok()
    }
}

/// Reads exactly 8 bytes of texture name, trimming trailing `\0` and spaces.
pub(crate) fn read_tex8<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;

    let raw = buf
        .iter()
        .map(|&c| c as char)
        .collect::<String>()
        .to_uppercase();

    let trimmed = raw.trim_end_matches(|ch: char| ch == '\0' || ch.is_ascii_whitespace());
    Ok(trimmed.to_string())
}
