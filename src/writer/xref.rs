//! Cross-reference ledger.
//!
//! A parallel growable buffer holding one fixed-width 20-byte record per
//! allocated object, populated as a side effect of object allocation. At
//! finalization the ledger bytes are spliced verbatim into the `xref`
//! section after the free-list head record.

use crate::error::Result;
use crate::writer::sink::reserve_chunked;

/// Size of one cross-reference record: ten offset digits, space, five
/// generation digits, space, `n`, space, newline.
pub(crate) const XREF_ENTRY_SIZE: usize = 20;

/// Fixed-width in-use record buffer, one entry per allocated object.
#[derive(Debug, Default)]
pub struct XrefLedger {
    buf: Vec<u8>,
}

impl XrefLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the body offset of the object being allocated.
    pub fn record(&mut self, body_offset: u64) -> Result<()> {
        reserve_chunked(&mut self.buf, XREF_ENTRY_SIZE)?;
        let entry = format!("{:010} 00000 n \n", body_offset);
        debug_assert_eq!(entry.len(), XREF_ENTRY_SIZE);
        self.buf.extend_from_slice(entry.as_bytes());
        Ok(())
    }

    /// Number of recorded entries.
    pub fn entry_count(&self) -> u64 {
        (self.buf.len() / XREF_ENTRY_SIZE) as u64
    }

    /// The raw record bytes, ready to splice into the `xref` section.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Decode the recorded body offsets back out of the fixed-width records.
    pub fn offsets(&self) -> impl Iterator<Item = u64> + '_ {
        self.buf.chunks_exact(XREF_ENTRY_SIZE).map(|entry| {
            // The ten leading digits; the record format guarantees ASCII.
            std::str::from_utf8(&entry[..10])
                .expect("ledger records are ASCII")
                .parse()
                .expect("ledger offset field is decimal")
        })
    }
}
