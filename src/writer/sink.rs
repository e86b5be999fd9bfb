//! Append-only body buffer with a write cursor.
//!
//! Every byte of the document funnels through [`BodySink::append`], which
//! applies the optional stream encoding filter while a content stream is
//! open. The buffer grows in fixed chunks and never shrinks; growth failure
//! is surfaced as [`Error::OutOfMemory`] instead of aborting.
//!
//! The sink also implements the forward-reference patching protocol: an
//! 8-character zero placeholder is written where an object id is not yet
//! known, and later overwritten in place, right-justified, so no other
//! recorded offset ever shifts.

use crate::error::{Error, Result};

/// Fixed growth chunk for the body and cross-reference buffers.
pub(crate) const CHUNK: usize = 64 * 1024;

/// The fixed-width placeholder literal for not-yet-known object ids.
pub(crate) const PLACEHOLDER: &[u8; 8] = b"00000000";

/// Grow `buf` so that `extra` more bytes fit, reserving in whole chunks.
pub(crate) fn reserve_chunked(buf: &mut Vec<u8>, extra: usize) -> Result<()> {
    let needed = buf.len() + extra;
    if needed > buf.capacity() {
        let grow = needed - buf.len();
        let rounded = grow.div_ceil(CHUNK) * CHUNK;
        buf.try_reserve(rounded).map_err(Error::OutOfMemory)?;
    }
    Ok(())
}

/// Transparent encoding applied to content-stream bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamEncoding {
    /// Bytes pass through unchanged.
    #[default]
    None,
    /// ASCII-hex encoding (`/ASCIIHexDecode`); doubles the byte count and
    /// terminates the stream with a `>` marker.
    AsciiHex,
}

/// Growable output buffer holding the document body.
#[derive(Debug)]
pub struct BodySink {
    buf: Vec<u8>,
    encoding: StreamEncoding,
    in_stream: bool,
}

impl BodySink {
    /// Create an empty sink with one chunk of capacity pre-reserved.
    pub fn new() -> Result<Self> {
        let mut buf = Vec::new();
        reserve_chunked(&mut buf, CHUNK)?;
        Ok(Self {
            buf,
            encoding: StreamEncoding::None,
            in_stream: false,
        })
    }

    /// Current write cursor (also the total byte count).
    pub fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// The active stream encoding.
    pub fn encoding(&self) -> StreamEncoding {
        self.encoding
    }

    /// Select the encoding applied while a content stream is open.
    ///
    /// # Panics
    ///
    /// Panics if called while a content stream is open.
    pub fn set_encoding(&mut self, encoding: StreamEncoding) {
        assert!(
            !self.in_stream,
            "stream encoding cannot change inside an open content stream"
        );
        self.encoding = encoding;
    }

    /// Flip the sink into content-stream mode; subsequent appends are
    /// filtered through the active encoding.
    pub(crate) fn enter_stream(&mut self) {
        self.in_stream = true;
    }

    /// Leave content-stream mode. Returns the encoding that was active so
    /// the caller can append the end-of-data marker unfiltered.
    pub(crate) fn exit_stream(&mut self) -> StreamEncoding {
        self.in_stream = false;
        self.encoding
    }

    /// Append raw bytes, applying the stream filter when one is active.
    ///
    /// Returns the byte offset at which the (possibly encoded) data landed.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        let offset = self.buf.len() as u64;
        if self.in_stream && self.encoding == StreamEncoding::AsciiHex {
            reserve_chunked(&mut self.buf, bytes.len() * 2)?;
            for &b in bytes {
                self.buf.push(HEX_DIGITS[(b >> 4) as usize]);
                self.buf.push(HEX_DIGITS[(b & 0x0F) as usize]);
            }
        } else {
            reserve_chunked(&mut self.buf, bytes.len())?;
            self.buf.extend_from_slice(bytes);
        }
        Ok(offset)
    }

    /// Append a UTF-8 string. See [`BodySink::append`].
    pub fn append_str(&mut self, s: &str) -> Result<u64> {
        self.append(s.as_bytes())
    }

    /// Write the 8-character placeholder literal and return its offset for a
    /// later [`BodySink::patch_ref`].
    pub fn reserve_ref_field(&mut self) -> Result<u64> {
        self.append(PLACEHOLDER)
    }

    /// Contents of the 8-character field at `offset`.
    pub(crate) fn ref_field_at(&self, offset: u64) -> [u8; 8] {
        let start = offset as usize;
        let mut field = [0u8; 8];
        field.copy_from_slice(&self.buf[start..start + 8]);
        field
    }

    /// Overwrite the placeholder field at `offset` with `id`, right-justified
    /// in decimal so the field width never changes.
    ///
    /// # Panics
    ///
    /// Panics if `id` is 0, does not fit the field, or the field does not
    /// hold a placeholder.
    pub fn patch_ref(&mut self, offset: u64, id: u64) {
        assert!(id > 0, "cannot patch the null object id");
        let digits = id.to_string();
        assert!(
            digits.len() <= PLACEHOLDER.len(),
            "object id {} does not fit the {}-character reference field",
            id,
            PLACEHOLDER.len()
        );
        let start = offset as usize;
        debug_assert_eq!(
            &self.buf[start..start + PLACEHOLDER.len()],
            PLACEHOLDER,
            "patch target at {:#x} is not a placeholder",
            offset
        );
        let pad = PLACEHOLDER.len() - digits.len();
        self.buf[start + pad..start + PLACEHOLDER.len()].copy_from_slice(digits.as_bytes());
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";
