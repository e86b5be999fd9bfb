//! Minimal TrueType metrics reader.
//!
//! Reads just enough of a font's table directory to map code points to
//! advance widths: the `cmap` character map, the `hhea` horizontal header
//! and the `hmtx` metrics table. Every field access is bounds-checked
//! against the input slice; nothing is cached and nothing is allocated.
//!
//! # Supported character maps
//!
//! Subtable formats 0 (byte table), 4 (segment delta), 6 (trimmed array)
//! and 12 (segmented coverage) are supported. Format 2 (the legacy
//! high-byte CJK mapping) resolves every code point to the missing glyph.

use byteorder::{BigEndian, ByteOrder};

/// Error types for TrueType metrics reading.
#[derive(Debug, thiserror::Error)]
pub enum TrueTypeError {
    /// Font file is empty or truncated
    #[error("Font data ends at {len} bytes, needed {needed} at offset {offset}")]
    Truncated {
        /// Offset of the failed read
        offset: usize,
        /// Bytes required by the read
        needed: usize,
        /// Total font length
        len: usize,
    },

    /// Not a TrueType outline font
    #[error("Unsupported font version: {0:#010x}")]
    UnsupportedVersion(u32),

    /// Required table is missing
    #[error("Required font table is missing: {0}")]
    MissingTable(&'static str),

    /// No usable character map subtable
    #[error("No Unicode or Macintosh cmap subtable found")]
    NoCharacterMap,

    /// Character map format this reader does not handle
    #[error("Unsupported cmap subtable format: {0}")]
    UnsupportedCmapFormat(u16),

    /// hhea declares no horizontal metrics at all
    #[error("Font declares zero horizontal metrics")]
    NoMetrics,
}

/// Result type for TrueType operations.
pub type TrueTypeResult<T> = Result<T, TrueTypeError>;

fn read_u16(data: &[u8], offset: usize) -> TrueTypeResult<u16> {
    let bytes = data
        .get(offset..offset + 2)
        .ok_or(TrueTypeError::Truncated {
            offset,
            needed: 2,
            len: data.len(),
        })?;
    Ok(BigEndian::read_u16(bytes))
}

fn read_u32(data: &[u8], offset: usize) -> TrueTypeResult<u32> {
    let bytes = data
        .get(offset..offset + 4)
        .ok_or(TrueTypeError::Truncated {
            offset,
            needed: 4,
            len: data.len(),
        })?;
    Ok(BigEndian::read_u32(bytes))
}

/// A borrowed view over raw font bytes, resolved to the three tables the
/// width pass needs.
#[derive(Debug)]
pub struct FontMetricsReader<'a> {
    data: &'a [u8],
    /// Offset of the selected cmap subtable.
    subtable: usize,
    /// Subtable format, one of 0, 2, 4, 6 or 12.
    format: u16,
    hmtx: usize,
    num_h_metrics: u16,
}

impl<'a> FontMetricsReader<'a> {
    /// Parse the table directory and select a character map subtable.
    pub fn parse(data: &'a [u8]) -> TrueTypeResult<Self> {
        let version = read_u32(data, 0)?;
        // 0x74727565 is the legacy Apple 'true' tag.
        if version != 0x0001_0000 && version != 0x7472_7565 {
            return Err(TrueTypeError::UnsupportedVersion(version));
        }

        let num_tables = read_u16(data, 4)? as usize;
        let mut cmap = None;
        let mut hhea = None;
        let mut hmtx = None;
        for i in 0..num_tables {
            let entry = 12 + i * 16;
            let tag = data
                .get(entry..entry + 4)
                .ok_or(TrueTypeError::Truncated {
                    offset: entry,
                    needed: 4,
                    len: data.len(),
                })?;
            let offset = read_u32(data, entry + 8)? as usize;
            match tag {
                b"cmap" => cmap = Some(offset),
                b"hhea" => hhea = Some(offset),
                b"hmtx" => hmtx = Some(offset),
                _ => {}
            }
        }
        let cmap = cmap.ok_or(TrueTypeError::MissingTable("cmap"))?;
        let hhea = hhea.ok_or(TrueTypeError::MissingTable("hhea"))?;
        let hmtx = hmtx.ok_or(TrueTypeError::MissingTable("hmtx"))?;

        let num_h_metrics = read_u16(data, hhea + 34)?;
        if num_h_metrics == 0 {
            return Err(TrueTypeError::NoMetrics);
        }

        let subtable = cmap + Self::select_cmap_subtable(data, cmap)?;
        let format = read_u16(data, subtable)?;
        match format {
            0 | 2 | 4 | 6 | 12 => {}
            other => return Err(TrueTypeError::UnsupportedCmapFormat(other)),
        }

        Ok(Self {
            data,
            subtable,
            format,
            hmtx,
            num_h_metrics,
        })
    }

    /// Pick an encoding record: Windows Unicode first, then any Unicode
    /// platform record, then Macintosh. Records are conventionally sorted
    /// by ascending platform id, so the scan must run to completion before
    /// settling for a lower-priority record. Returns the subtable offset
    /// relative to the cmap table.
    fn select_cmap_subtable(data: &[u8], cmap: usize) -> TrueTypeResult<usize> {
        let num_records = read_u16(data, cmap + 2)? as usize;
        let mut unicode = None;
        let mut mac = None;
        for i in 0..num_records {
            let record = cmap + 4 + i * 8;
            let platform = read_u16(data, record)?;
            let encoding = read_u16(data, record + 2)?;
            let offset = read_u32(data, record + 4)? as usize;
            match platform {
                // Windows, BMP or full-repertoire Unicode: highest priority.
                3 if encoding == 1 || encoding == 10 => return Ok(offset),
                // Unicode platform.
                0 => {
                    unicode.get_or_insert(offset);
                }
                // Macintosh, kept only as a last resort.
                1 => {
                    mac.get_or_insert(offset);
                }
                _ => {}
            }
        }
        unicode.or(mac).ok_or(TrueTypeError::NoCharacterMap)
    }

    /// Resolve a code point to a glyph index; 0 is the missing glyph.
    pub fn glyph_index(&self, code_point: u32) -> TrueTypeResult<u16> {
        let table = self.subtable;
        let data = self.data;
        match self.format {
            0 => {
                if code_point > 0xFF {
                    return Ok(0);
                }
                let offset = table + 6 + code_point as usize;
                let glyph = *data.get(offset).ok_or(TrueTypeError::Truncated {
                    offset,
                    needed: 1,
                    len: data.len(),
                })?;
                Ok(glyph as u16)
            }
            2 => Ok(0),
            4 => {
                if code_point > 0xFFFF {
                    return Ok(0);
                }
                let code_point = code_point as u16;
                let seg_count = (read_u16(data, table + 6)? / 2) as usize;
                let end_codes = table + 14;
                let start_codes = end_codes + seg_count * 2 + 2;
                let id_deltas = start_codes + seg_count * 2;
                let id_range_offsets = id_deltas + seg_count * 2;

                for seg in 0..seg_count {
                    if read_u16(data, end_codes + seg * 2)? < code_point {
                        continue;
                    }
                    let start = read_u16(data, start_codes + seg * 2)?;
                    if start > code_point {
                        return Ok(0);
                    }
                    let delta = read_u16(data, id_deltas + seg * 2)?;
                    let range_offset = read_u16(data, id_range_offsets + seg * 2)?;
                    if range_offset == 0 {
                        return Ok(code_point.wrapping_add(delta));
                    }
                    // The range offset is relative to its own position in
                    // the idRangeOffset array.
                    let glyph_at = id_range_offsets
                        + seg * 2
                        + range_offset as usize
                        + (code_point - start) as usize * 2;
                    let glyph = read_u16(data, glyph_at)?;
                    if glyph == 0 {
                        return Ok(0);
                    }
                    return Ok(glyph.wrapping_add(delta));
                }
                Ok(0)
            }
            6 => {
                let first = read_u16(data, table + 6)? as u32;
                let count = read_u16(data, table + 8)? as u32;
                if code_point < first || code_point >= first + count {
                    return Ok(0);
                }
                read_u16(data, table + 10 + (code_point - first) as usize * 2)
            }
            12 => {
                let group_count = read_u32(data, table + 12)?;
                for group in 0..group_count as usize {
                    let record = table + 16 + group * 12;
                    let start = read_u32(data, record)?;
                    let end = read_u32(data, record + 4)?;
                    if code_point < start {
                        return Ok(0);
                    }
                    if code_point <= end {
                        let glyph = read_u32(data, record + 8)? + (code_point - start);
                        return Ok(glyph as u16);
                    }
                }
                Ok(0)
            }
            other => Err(TrueTypeError::UnsupportedCmapFormat(other)),
        }
    }

    /// Advance width of a code point in font units.
    ///
    /// Glyph indices at or beyond the long-metric count reuse the last
    /// long metric, as the `hmtx` layout prescribes.
    pub fn advance_width(&self, code_point: u32) -> TrueTypeResult<u16> {
        let glyph = self.glyph_index(code_point)?;
        let metric = glyph.min(self.num_h_metrics - 1) as usize;
        read_u16(self.data, self.hmtx + metric * 4)
    }
}
