// src/map/sector.rs

use std::io::{self, Read};
use byteorder::{LE, ReadBytesExt};
use serde::{Deserialize, Serialize};

use crate::map::sidedef::read_tex8;

/// A sector in classic DOOM format (26 bytes).
///
/// Layout (all little-endian):
///
/// ```text
/// offset  field          type / size
/// ------  -------------  ------------
///  0-1    floor_height   i16
///  2-3    ceiling_height i16
///  4-11   floor_tex      [u8; 8]
/// 12-19   ceiling_tex    [u8; 8]
/// 20-21   light_level    i16
/// 22-23   special_type   i16
/// 24-25   tag            i16
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    #[serde(default)]
    pub floor_height: i32,
    #[serde(default = "default_ceiling")]
    pub ceiling_height: i32,
    #[serde(default)]
    pub floor_tex: String,
    #[serde(default)]
    pub ceiling_tex: String,
    #[serde(default = "default_light")]
    pub light: i32,
    /// Special type (a.k.a. "effect").
    #[serde(default)]
    pub r#type: i32,
    #[serde(default)]
    pub tag: i32,
}

fn default_ceiling() -> i32 {
    128
}

fn default_light() -> i32 {
    160
}

impl Default for Sector {
    fn default() -> Self {
        Sector::new(0, default_ceiling(), "FLOOR4_8", "CEIL3_5")
    }
}

impl Sector {
    pub fn new(floor_height: i32, ceiling_height: i32, floor_tex: &str, ceiling_tex: &str) -> Self {
        Sector {
            floor_height,
            ceiling_height,
            floor_tex: floor_tex.to_uppercase(),
            ceiling_tex: ceiling_tex.to_uppercase(),
            light: default_light(),
            r#type: 0,
            tag: 0,
        }
    }

    /// Reads a `Sector` from its 26-byte WAD record.
    pub fn from_wad<R: Read>(reader: &mut R) -> io::Result<Self> {
        let floor_height = reader.read_i16::<LE>()? as i32;
        let ceiling_height = reader.read_i16::<LE>()? as i32;
        let floor_tex = read_tex8(reader)?;
        let ceiling_tex = read_tex8(reader)?;
        let light = reader.read_i16::<LE>()? as i32;
        let r#type = reader.read_i16::<LE>()? as i32;
        let tag = reader.read_i16::<LE>()? as i32;

        Ok(Sector {
            floor_height,
            ceiling_height,
            floor_tex,
            ceiling_tex,
            light,
            r#type,
            tag,
        })
    }
}
