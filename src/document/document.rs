// src/document/document.rs

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::str;

use byteorder::{LE, ReadBytesExt};
use log::{debug, info, warn};

use crate::error::MapError;
use crate::map::{LineDef, MapGeometry, Sector, SideDef, Vertex};

const FILELUMP_SIZE: usize = 16; // 4 bytes (filepos) + 4 bytes (size) + 8 bytes (name)
const VERTEX_SIZE: usize = 4;
const LINEDEF_SIZE: usize = 14;
const SIDEDEF_SIZE: usize = 30;
const SECTOR_SIZE: usize = 26;

/// A single lump entry from the WAD directory.
#[derive(Debug, Clone, PartialEq)]
pub struct LumpEntry {
    pub offset: usize,
    pub size: usize,
    pub name: String,
}

/// A grouping of lumps that form a level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelInfo {
    pub name: String,
    pub lump_indices: Vec<usize>,
}

/// A WAD file held in memory, with its directory grouped into levels.
#[derive(Debug, Default)]
pub struct Document {
    data: Vec<u8>,
    directory: Vec<LumpEntry>,
    levels: Vec<LevelInfo>,
}

impl Document {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);
        let doc = Self::load_wad(&mut reader)?;
        info!(
            "Opened {}: {} lumps, {} levels",
            path.as_ref().display(),
            doc.directory.len(),
            doc.levels.len()
        );
        Ok(doc)
    }

    /// Reads the header and directory, keeping the whole file in memory so
    /// levels can be loaded on demand.
    pub fn load_wad<R: Read + Seek>(reader: &mut R) -> Result<Self, MapError> {
        reader.seek(SeekFrom::Start(0))?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let total_size = data.len();

        // --- Read Header ---
        if total_size < 12 {
            return Err(MapError::InvalidWad("file is shorter than a WAD header".into()));
        }
        let ident = &data[0..4];
        if ident != b"IWAD" && ident != b"PWAD" {
            return Err(MapError::InvalidWad(format!(
                "invalid identifier {:?}",
                String::from_utf8_lossy(ident)
            )));
        }
        let num_lumps = (&data[4..8]).read_i32::<LE>()?;
        let infotableofs = (&data[8..12]).read_i32::<LE>()?;
        let dir_size = usize::try_from(num_lumps)
            .ok()
            .and_then(|n| n.checked_mul(FILELUMP_SIZE))
            .ok_or_else(|| MapError::InvalidWad(format!("bad lump count {num_lumps}")))?;
        let dir_start = usize::try_from(infotableofs)
            .ok()
            .filter(|&start| start.saturating_add(dir_size) <= total_size)
            .ok_or_else(|| MapError::InvalidWad("directory lies outside the file".into()))?;

        // --- Read Directory ---
        let dir_buf = &data[dir_start..dir_start + dir_size];
        let mut directory = Vec::with_capacity(dir_size / FILELUMP_SIZE);
        for entry in dir_buf.chunks_exact(FILELUMP_SIZE) {
            let lump_offset = (&entry[0..4]).read_i32::<LE>()?;
            let lump_size = (&entry[4..8]).read_i32::<LE>()?;
            let lump_name = str::from_utf8(&entry[8..16])
                .unwrap_or("")
                .trim_end_matches(|c: char| c == '\0' || c == ' ')
                .to_string();
            match (usize::try_from(lump_offset), usize::try_from(lump_size)) {
                (Ok(offset), Ok(size)) if offset.saturating_add(size) <= total_size => {
                    directory.push(LumpEntry { offset, size, name: lump_name });
                }
                _ => warn!(
                    "Lump '{}' has invalid offset/size ({}+{} > {})",
                    lump_name, lump_offset, lump_size, total_size
                ),
            }
        }

        let levels = group_levels(&directory);
        debug!("WAD levels: {:?}", levels.iter().map(|l| &l.name).collect::<Vec<_>>());
        Ok(Document { data, directory, levels })
    }

    pub fn lumps(&self) -> &[LumpEntry] {
        &self.directory
    }

    /// Returns a list of available level markers.
    pub fn available_levels(&self) -> Vec<String> {
        self.levels.iter().map(|lvl| lvl.name.clone()).collect()
    }

    /// Loads the geometry for a specific level (by its marker, e.g. "MAP01").
    pub fn load_level(&self, level_name: &str) -> Result<MapGeometry, MapError> {
        let level = self
            .levels
            .iter()
            .find(|lvl| lvl.name.eq_ignore_ascii_case(level_name))
            .ok_or_else(|| MapError::LevelNotFound { name: level_name.to_string() })?;

        let mut map = MapGeometry::new();
        for &index in &level.lump_indices {
            let entry = &self.directory[index];
            let bytes = &self.data[entry.offset..entry.offset + entry.size];
            match entry.name.as_str() {
                "VERTEXES" => map.vertices = read_records(bytes, VERTEX_SIZE, Vertex::from_wad)?,
                "LINEDEFS" => map.linedefs = read_records(bytes, LINEDEF_SIZE, LineDef::from_wad)?,
                "SIDEDEFS" => map.sidedefs = read_records(bytes, SIDEDEF_SIZE, SideDef::from_wad)?,
                "SECTORS" => map.sectors = read_records(bytes, SECTOR_SIZE, Sector::from_wad)?,
                _ => { /* Ignore other lumps, including the level marker itself */ }
            }
        }
        info!(
            "Loaded level {}: {} vertices, {} linedefs, {} sidedefs, {} sectors",
            level.name,
            map.vertices.len(),
            map.linedefs.len(),
            map.sidedefs.len(),
            map.sectors.len()
        );
        Ok(map)
    }
}

fn read_records<'a, T, F>(bytes: &'a [u8], record_size: usize, read: F) -> io::Result<Vec<T>>
where
    F: Fn(&mut Cursor<&'a [u8]>) -> io::Result<T>,
{
    let count = bytes.len() / record_size;
    let mut cursor = Cursor::new(bytes);
    (0..count).map(|_| read(&mut cursor)).collect()
}

/// Groups lumps from the directory into levels based on markers (e.g. "MAP01" or "E1M1").
fn group_levels(directory: &[LumpEntry]) -> Vec<LevelInfo> {
    let mut levels = Vec::new();
    let mut current_level: Option<LevelInfo> = None;
    for (i, entry) in directory.iter().enumerate() {
        if is_level_marker(&entry.name) {
            if let Some(lvl) = current_level.take() {
                levels.push(lvl);
            }
            current_level = Some(LevelInfo {
                name: entry.name.clone(),
                lump_indices: vec![i],
            });
        } else if let Some(ref mut lvl) = current_level {
            lvl.lump_indices.push(i);
        }
    }
    if let Some(lvl) = current_level {
        levels.push(lvl);
    }
    levels
}

/// Returns true if the lump name indicates a level marker.
fn is_level_marker(name: &str) -> bool {
    let upper = name.trim().to_uppercase();
    if upper.starts_with("MAP") && upper.len() >= 5 {
        upper.chars().skip(3).take(2).all(|c| c.is_ascii_digit())
    } else if upper.len() == 4 && upper.starts_with('E') && upper.chars().nth(2) == Some('M') {
        upper.chars().nth(1).is_some_and(|c| c.is_ascii_digit())
            && upper.chars().nth(3).is_some_and(|c| c.is_ascii_digit())
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lump_name(name: &str) -> [u8; 8] {
        let mut buf = [0u8; 8];
        buf[..name.len()].copy_from_slice(name.as_bytes());
        buf
    }

    fn build_wad(lumps: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let body: usize = lumps.iter().map(|(_, bytes)| bytes.len()).sum();
        let mut wad = Vec::new();
        wad.extend_from_slice(b"PWAD");
        wad.extend_from_slice(&(lumps.len() as i32).to_le_bytes());
        wad.extend_from_slice(&((12 + body) as i32).to_le_bytes());

        let mut dir = Vec::new();
        for (name, bytes) in lumps {
            dir.extend_from_slice(&(wad.len() as i32).to_le_bytes());
            dir.extend_from_slice(&(bytes.len() as i32).to_le_bytes());
            dir.extend_from_slice(&lump_name(name));
            wad.extend_from_slice(bytes);
        }
        wad.extend(dir);
        wad
    }

    fn i16s(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    // A 64x64 one-sided room in sector 0.
    fn square_level() -> Vec<(&'static str, Vec<u8>)> {
        let vertexes = i16s(&[0, 0, 0, 64, 64, 64, 64, 0]);
        let linedefs: Vec<u8> = (0..4)
            .flat_map(|i| i16s(&[i, (i + 1) % 4, 1, 0, 0, i, -1]))
            .collect();
        let mut sidedef = i16s(&[0, 0]);
        sidedef.extend_from_slice(b"-\0\0\0\0\0\0\0-\0\0\0\0\0\0\0STARTAN2");
        sidedef.extend(i16s(&[0]));
        let sidedefs = sidedef.repeat(4);
        let mut sectors = i16s(&[0, 128]);
        sectors.extend_from_slice(b"FLOOR4_8CEIL3_5\0");
        sectors.extend(i16s(&[160, 0, 0]));
        vec![
            ("THINGS", Vec::new()),
            ("LINEDEFS", linedefs),
            ("SIDEDEFS", sidedefs),
            ("VERTEXES", vertexes),
            ("SECTORS", sectors),
        ]
    }

    #[test]
    fn test_level_markers() {
        assert!(is_level_marker("MAP01"));
        assert!(is_level_marker("map32"));
        assert!(is_level_marker("E1M9"));
        assert!(!is_level_marker("MAPINFO"));
        assert!(!is_level_marker("THINGS"));
        assert!(!is_level_marker("EXMY"));
    }

    #[test]
    fn test_wad_loading() {
        let mut lumps = vec![("MAP01", Vec::new())];
        lumps.extend(square_level());
        lumps.push(("E1M1", Vec::new()));
        lumps.push(("VERTEXES", i16s(&[5, 5])));
        let doc = Document::load_wad(&mut Cursor::new(build_wad(&lumps))).unwrap();

        assert_eq!(doc.lumps().len(), 8);
        assert_eq!(doc.available_levels(), vec!["MAP01".to_string(), "E1M1".to_string()]);

        let map = doc.load_level("map01").unwrap();
        assert_eq!(map.vertices.len(), 4);
        assert_eq!(map.linedefs.len(), 4);
        assert_eq!(map.sidedefs.len(), 4);
        assert_eq!(map.sectors.len(), 1);
        assert_eq!(map.linedefs[3].end, 0);
        assert_eq!(map.linedefs[0].left_side(), None);
        assert_eq!(map.sidedefs[2].mid_tex, "STARTAN2");
        assert!(map.validate().is_ok());

        let other = doc.load_level("E1M1").unwrap();
        assert_eq!(other.vertices, vec![Vertex::new(5, 5)]);
        assert!(other.linedefs.is_empty());
    }

    #[test]
    fn test_missing_level() {
        let doc = Document::load_wad(&mut Cursor::new(build_wad(&[("MAP01", Vec::new())]))).unwrap();
        assert!(matches!(
            doc.load_level("MAP02"),
            Err(MapError::LevelNotFound { name }) if name == "MAP02"
        ));
    }

    #[test]
    fn test_bad_header_rejected() {
        let mut wad = build_wad(&[("MAP01", Vec::new())]);
        wad[0..4].copy_from_slice(b"ZWAD");
        assert!(matches!(
            Document::load_wad(&mut Cursor::new(wad)),
            Err(MapError::InvalidWad(_))
        ));
        assert!(matches!(
            Document::load_wad(&mut Cursor::new(b"PWAD".to_vec())),
            Err(MapError::InvalidWad(_))
        ));
    }

    #[test]
    fn test_out_of_range_lump_skipped() {
        let mut wad = build_wad(&[("MAP01", Vec::new()), ("VERTEXES", i16s(&[1, 2]))]);
        // Point the second entry's size past the end of the file.
        let dir_start = wad.len() - 2 * FILELUMP_SIZE;
        let size_field = dir_start + FILELUMP_SIZE + 4;
        wad[size_field..size_field + 4].copy_from_slice(&4096i32.to_le_bytes());
        let doc = Document::load_wad(&mut Cursor::new(wad)).unwrap();
        assert_eq!(doc.lumps().len(), 1);
        assert!(doc.load_level("MAP01").unwrap().vertices.is_empty());
    }
}
