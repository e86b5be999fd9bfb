//! The document assembly engine.
//!
//! A [`Document`] owns the body sink, the cross-reference ledger and the
//! object-id counter, and drives the single streaming pass: header and
//! standard fonts at creation, caller-driven pages and content in the
//! middle, and one finalization that emits the outline, page tree, catalog,
//! per-page annotation arrays, cross-reference table and trailer.

use crate::debug::PatchTrace;
use crate::error::Result;
use crate::fonts::FontMetricsReader;
use crate::object::ObjectRef;
use crate::writer::annotations::Annotation;
use crate::writer::outline::Bookmark;
use crate::writer::page::{OpenPage, Page};
use crate::writer::sink::{BodySink, StreamEncoding};
use crate::writer::xref::XrefLedger;

/// The four standard Type1 fonts created at document begin.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StandardFonts {
    pub regular: ObjectRef,
    pub italic: ObjectRef,
    pub bold: ObjectRef,
    pub bold_italic: ObjectRef,
}

/// Entries for the document information dictionary.
///
/// Dates are ASN.1 strings (`YYYYMMDDHHmmSSOHH'mm`) supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Document keywords
    pub keywords: Option<String>,
    /// Creator application
    pub creator: Option<String>,
    /// Producer application
    pub producer: Option<String>,
    /// Creation date (ASN.1)
    pub creation_date: Option<String>,
    /// Modification date (ASN.1)
    pub mod_date: Option<String>,
}

impl DocumentInfo {
    /// Create an empty information dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the document subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the document keywords.
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    /// Set the creator application.
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    /// Set the producer application.
    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = Some(producer.into());
        self
    }

    /// Set the creation date (ASN.1 format).
    pub fn with_creation_date(mut self, date: impl Into<String>) -> Self {
        self.creation_date = Some(date.into());
        self
    }

    /// Set the modification date (ASN.1 format).
    pub fn with_mod_date(mut self, date: impl Into<String>) -> Self {
        self.mod_date = Some(date.into());
        self
    }
}

/// A PDF document being built in a single streaming pass.
///
/// All state is owned exclusively by one instance; nothing is shared. The
/// document is write-once: content accumulates append-only, [`finish`]
/// runs exactly once, and afterwards the bytes are only read.
///
/// [`finish`]: Document::finish
#[derive(Debug)]
pub struct Document {
    pub(crate) body: BodySink,
    pub(crate) xref: XrefLedger,
    next_id: u64,
    /// The currently open page, if any.
    pub(crate) page: Option<OpenPage>,
    /// Closed pages, in close order.
    pub(crate) pages: Vec<Page>,
    /// Flat document-wide annotation list, in add order.
    pub(crate) annotations: Vec<Annotation>,
    /// Bookmark arena; the index is the node's identity.
    pub(crate) bookmarks: Vec<Bookmark>,
    pub(crate) fonts: StandardFonts,
    /// Embedded fonts, document-scoped.
    pub(crate) custom_fonts: Vec<ObjectRef>,
    info_ref: ObjectRef,
    catalog_ref: ObjectRef,
    finished: bool,
    trace: Option<PatchTrace>,
}

impl Document {
    /// Begin a new document: writes the header and the four standard fonts.
    pub fn new() -> Result<Self> {
        let mut body = BodySink::new()?;
        body.append_str("%PDF-1.7")?;

        let mut doc = Self {
            body,
            xref: XrefLedger::new(),
            next_id: 1,
            page: None,
            pages: Vec::new(),
            annotations: Vec::new(),
            bookmarks: Vec::new(),
            fonts: StandardFonts {
                regular: ObjectRef::NULL,
                italic: ObjectRef::NULL,
                bold: ObjectRef::NULL,
                bold_italic: ObjectRef::NULL,
            },
            custom_fonts: Vec::new(),
            info_ref: ObjectRef::NULL,
            catalog_ref: ObjectRef::NULL,
            finished: false,
            trace: None,
        };

        doc.fonts = StandardFonts {
            regular: doc.write_standard_font("Times-Roman")?,
            italic: doc.write_standard_font("Times-Italic")?,
            bold: doc.write_standard_font("Times-Bold")?,
            bold_italic: doc.write_standard_font("Times-BoldItalic")?,
        };
        Ok(doc)
    }

    fn write_standard_font(&mut self, base_font: &str) -> Result<ObjectRef> {
        let font = self.begin_object()?;
        self.body.append_str("\n<< /Type /Font")?;
        self.body.append_str("\n/Subtype /Type1")?;
        self.body.append_str(&format!("\n/Name /F{}", font.id))?;
        self.body.append_str(&format!("\n/BaseFont /{}", base_font))?;
        self.body.append_str("\n/Encoding /WinAnsiEncoding")?;
        self.body.append_str(">>")?;
        self.body.append_str("\nendobj")?;
        Ok(font)
    }

    /// Allocate the next object: records its ledger entry at the current
    /// body offset, writes the `<id> 0 obj` header, and returns the
    /// reference.
    pub(crate) fn begin_object(&mut self) -> Result<ObjectRef> {
        let id = self.next_id;
        self.xref.record(self.body.len())?;
        self.next_id += 1;
        self.body.append_str(&format!("\n{} 0 obj", id))?;
        Ok(ObjectRef {
            id,
            offset: self.body.len(),
        })
    }

    /// The id the *next* allocated object will receive, without allocating.
    ///
    /// Used to reference an object before it exists, e.g. a content stream
    /// pointing at its own not-yet-written length object.
    pub fn peek_next_id(&self) -> u64 {
        self.next_id
    }

    /// Patch the fixed-width reference field at `offset` to point at
    /// `target`, recording the edit in the installed patch trace.
    pub(crate) fn patch_ref_field(&mut self, offset: u64, target: ObjectRef) {
        let before = self.body.ref_field_at(offset);
        self.body.patch_ref(offset, target.id);
        if let Some(trace) = &mut self.trace {
            trace.record(offset, before, self.body.ref_field_at(offset));
        }
        log::trace!("patched reference field at {:#x} -> {} 0 R", offset, target.id);
    }

    /// Select the encoding filter applied to content streams.
    ///
    /// # Panics
    ///
    /// Panics if a content stream is currently open.
    pub fn set_stream_encoding(&mut self, encoding: StreamEncoding) {
        self.body.set_encoding(encoding);
    }

    /// Install a [`PatchTrace`] that records every placeholder patch.
    pub fn install_patch_trace(&mut self, trace: PatchTrace) {
        self.trace = Some(trace);
    }

    /// Remove and return the installed patch trace, if any.
    pub fn take_patch_trace(&mut self) -> Option<PatchTrace> {
        self.trace.take()
    }

    /// The standard regular (Times-Roman) font.
    pub fn regular_font(&self) -> ObjectRef {
        self.fonts.regular
    }

    /// The standard italic font.
    pub fn italic_font(&self) -> ObjectRef {
        self.fonts.italic
    }

    /// The standard bold font.
    pub fn bold_font(&self) -> ObjectRef {
        self.fonts.bold
    }

    /// The standard bold-italic font.
    pub fn bold_italic_font(&self) -> ObjectRef {
        self.fonts.bold_italic
    }

    pub(crate) fn standard_font_refs(&self) -> [u64; 4] {
        [
            self.fonts.regular.id,
            self.fonts.italic.id,
            self.fonts.bold.id,
            self.fonts.bold_italic.id,
        ]
    }

    /// Embed a TrueType font and return its font object reference.
    ///
    /// Writes the raw font stream, a 65536-entry width array read from the
    /// font's `cmap`/`hmtx` tables, a font descriptor wiring the stream, and
    /// the `/Subtype /TrueType` font object. The returned reference can be
    /// set as [`TextConfig::font`](crate::writer::TextConfig::font).
    pub fn embed_font(&mut self, data: &[u8]) -> Result<ObjectRef> {
        let reader = FontMetricsReader::parse(data)?;

        let file_ref = self.begin_object()?;
        self.body.append_str(&format!("\n<</Length {}>>", data.len()))?;
        self.body.append_str("\nstream\n")?;
        self.body.append(data)?;
        self.body.append_str("\nendstream")?;
        self.body.append_str("\nendobj")?;

        // One advance width per BMP code point; out-of-range glyphs fall
        // back to the font's last long metric inside the reader.
        let widths_ref = self.begin_object()?;
        self.body.append_str("\n[ ")?;
        for code_point in 0u32..0x10000 {
            let advance = reader.advance_width(code_point)?;
            self.body.append_str(&format!("{} ", advance / 2))?;
        }
        self.body.append_str("]\nendobj")?;

        // Placeholder metrics; a full descriptor would read head/OS2 too.
        let descriptor_ref = self.begin_object()?;
        self.body.append_str("\n<</Type /FontDescriptor")?;
        self.body
            .append_str(&format!("\n/FontName /F{}", descriptor_ref.id))?;
        self.body.append_str(&format!("\n/Flags {}", 1 << 5))?;
        self.body
            .append_str("\n/FontBBox [-92.773438 -312.01172 1186.52344 1102.05078]")?;
        self.body.append_str("\n/MissingWidth 350")?;
        self.body.append_str("\n/ItalicAngle 0")?;
        self.body.append_str("\n/Ascent 1102.05078")?;
        self.body.append_str("\n/Descent -291.50391")?;
        self.body.append_str("\n/CapHeight 389.16016")?;
        self.body.append_str("\n/StemV 61.035156")?;
        self.body
            .append_str(&format!("\n/FontFile2 {} 0 R", file_ref.id))?;
        self.body.append_str(">>")?;
        self.body.append_str("\nendobj")?;

        let font_ref = self.begin_object()?;
        self.body.append_str("\n<</Type /Font")?;
        self.body.append_str("\n/Subtype /TrueType")?;
        self.body.append_str(&format!("\n/Name /F{}", font_ref.id))?;
        self.body
            .append_str(&format!("\n/BaseFont /F{}", descriptor_ref.id))?;
        self.body.append_str("\n/FirstChar 0")?;
        self.body.append_str("\n/LastChar 255")?;
        self.body
            .append_str(&format!("\n/Widths {} 0 R", widths_ref.id))?;
        self.body.append_str("\n/Encoding /WinAnsiEncoding")?;
        self.body
            .append_str(&format!("\n/FontDescriptor {} 0 R", descriptor_ref.id))?;
        self.body.append_str(">>")?;
        self.body.append_str("\nendobj")?;

        self.custom_fonts.push(font_ref);
        log::debug!(
            "embedded font {} 0 R ({} bytes, {} custom fonts total)",
            font_ref.id,
            data.len(),
            self.custom_fonts.len()
        );
        Ok(font_ref)
    }

    /// Emit the document information dictionary.
    ///
    /// May be called at any point before [`finish`](Document::finish); the
    /// trailer's `/Info` entry is written only when this has been called.
    pub fn set_info(&mut self, info: &DocumentInfo) -> Result<()> {
        let entries = [
            ("Title", &info.title),
            ("Author", &info.author),
            ("Subject", &info.subject),
            ("Keywords", &info.keywords),
            ("Creator", &info.creator),
            ("Producer", &info.producer),
            ("CreationDate", &info.creation_date),
            ("ModDate", &info.mod_date),
        ];

        self.info_ref = self.begin_object()?;
        self.body.append_str("<<")?;
        for (tag, value) in entries {
            if let Some(value) = value {
                self.body
                    .append_str(&format!("/{} ({})\n", tag, escape_literal(value)))?;
            }
        }
        self.body.append_str(">>")?;
        self.body.append_str("\nendobj")?;
        Ok(())
    }

    /// Finalize the document.
    ///
    /// Emits the outline, page tree and catalog, resolves both placeholder
    /// fields of every page, and writes the cross-reference table and
    /// trailer. Must be called exactly once, with no page open.
    ///
    /// # Panics
    ///
    /// Panics if a page is still open or the document is already finished.
    pub fn finish(&mut self) -> Result<()> {
        assert!(self.page.is_none(), "a page is still open");
        assert!(!self.finished, "document is already finished");

        let outline_ref = self.write_outline()?;

        // Page tree.
        let tree_ref = self.begin_object()?;
        self.body.append_str("\n<</Type /Pages")?;
        self.body.append_str("\n/Kids [")?;
        let page_ids: Vec<u64> = self.pages.iter().map(|p| p.obj.id).collect();
        for id in &page_ids {
            self.body.append_str(&format!("{} 0 R\n", id))?;
        }
        self.body.append_str("]")?;
        self.body
            .append_str(&format!("\n/Count {}", self.pages.len()))?;
        self.body.append_str(">>")?;
        self.body.append_str("\nendobj")?;

        // Catalog.
        let catalog_ref = self.begin_object()?;
        self.body.append_str("\n<</Type /Catalog")?;
        self.body
            .append_str(&format!("\n/Outlines {} 0 R", outline_ref.id))?;
        self.body
            .append_str(&format!("\n/Pages {} 0 R", tree_ref.id))?;
        self.body.append_str(">>")?;
        self.body.append_str("\nendobj")?;
        self.catalog_ref = catalog_ref;

        // Every page now learns its parent.
        let parent_fixups: Vec<u64> = self.pages.iter().map(|p| p.parent_fixup).collect();
        for fixup in parent_fixups {
            self.patch_ref_field(fixup, tree_ref);
        }

        // One annotation array per page, filtered from the flat list in add
        // order, then patched into the page's /Annots field.
        let page_handles: Vec<(u64, u64)> = self
            .pages
            .iter()
            .map(|p| (p.obj.id, p.annots_fixup))
            .collect();
        for (page_id, annots_fixup) in page_handles {
            let array_ref = self.begin_object()?;
            self.body.append_str("\n[")?;
            let member_ids: Vec<u64> = self
                .annotations
                .iter()
                .filter(|a| a.page.id == page_id)
                .map(|a| a.obj.id)
                .collect();
            for id in member_ids {
                self.body.append_str(&format!("\n{} 0 R", id))?;
            }
            self.body.append_str("\n]")?;
            self.body.append_str("\nendobj")?;
            self.patch_ref_field(annots_fixup, array_ref);
        }

        self.write_xref_and_trailer()?;
        self.body.append_str("\n%%EOF\n")?;
        self.finished = true;
        log::debug!(
            "finished document: {} objects, {} pages, {} bookmarks, {} annotations, {} bytes",
            self.next_id - 1,
            self.pages.len(),
            self.bookmarks.len(),
            self.annotations.len(),
            self.body.len()
        );
        Ok(())
    }

    fn write_xref_and_trailer(&mut self) -> Result<()> {
        // startxref points at the `xref` keyword itself, one past the
        // newline we prepend here.
        let xref_offset = self.body.append_str("\nxref")? + 1;
        self.body.append_str(&format!("\n0 {}", self.next_id))?;
        self.body.append_str("\n0000000000 65535 f \n")?;
        let ledger = self.xref.as_bytes().to_vec();
        self.body.append(&ledger)?;

        self.body.append_str("trailer\n<<")?;
        self.body.append_str(&format!("/Size {}\n", self.next_id))?;
        self.body
            .append_str(&format!("/Root {} 0 R", self.catalog_ref.id))?;
        if self.info_ref.is_valid() {
            self.body
                .append_str(&format!("/Info {} 0 R", self.info_ref.id))?;
        }
        self.body.append_str(">>\nstartxref")?;
        self.body.append_str(&format!("\n{}", xref_offset))?;
        Ok(())
    }

    /// Whether [`finish`](Document::finish) has completed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The document bytes produced so far.
    pub fn as_bytes(&self) -> &[u8] {
        self.body.as_bytes()
    }

    /// Write the finished document to storage in a single bulk write.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path, self.body.as_bytes())?;
        Ok(())
    }
}

/// Escape a string for a PDF literal string context: `\`, `(` and `)`.
pub(crate) fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            _ => out.push(c),
        }
    }
    out
}
