//! Debug sink for forward-reference patches.
//!
//! Patching overwrites already-written bytes in place, which makes it the one
//! part of the single-pass writer that is hard to inspect after the fact. A
//! [`PatchTrace`] installed on a document records every patched field so a
//! test or a debugging session can diff the before/after bytes. The trace is
//! an explicit object owned by the caller, not ambient state.

/// Snapshot of one fixed-width reference field, before and after patching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchRecord {
    /// Byte offset of the 8-character field in the body buffer
    pub offset: u64,
    /// Field contents before the patch (always ASCII zeros)
    pub before: [u8; 8],
    /// Field contents after the patch (right-justified decimal id)
    pub after: [u8; 8],
}

/// Records placeholder patches applied during finalization.
#[derive(Debug, Default)]
pub struct PatchTrace {
    before: Vec<(u64, [u8; 8])>,
    after: Vec<(u64, [u8; 8])>,
}

impl PatchTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, offset: u64, before: [u8; 8], after: [u8; 8]) {
        self.before.push((offset, before));
        self.after.push((offset, after));
    }

    /// Number of patches recorded.
    pub fn len(&self) -> usize {
        self.before.len()
    }

    /// Whether no patches have been recorded.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty()
    }

    /// Iterate over the recorded patches in application order.
    pub fn records(&self) -> impl Iterator<Item = PatchRecord> + '_ {
        self.before
            .iter()
            .zip(self.after.iter())
            .map(|(&(offset, before), &(_, after))| PatchRecord {
                offset,
                before,
                after,
            })
    }

    /// Log every recorded patch as a before/after diff at debug level.
    pub fn log_diff(&self) {
        for rec in self.records() {
            log::debug!(
                "patch at {:#010x}: {:?} -> {:?}",
                rec.offset,
                String::from_utf8_lossy(&rec.before),
                String::from_utf8_lossy(&rec.after),
            );
        }
    }
}
