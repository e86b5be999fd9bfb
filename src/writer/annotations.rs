//! Free-standing annotation objects: text notes, markup, links.
//!
//! Annotations anchor to a content object's bounding rectangle and may be
//! added at any point after the owning page closed; they land in one flat
//! document-wide list. Finalization builds each page's `/Annots` array by
//! filtering that list, so a page's annotations appear in document add
//! order.

use crate::error::Result;
use crate::object::{ContentObject, ObjectRef};
use crate::writer::content::Color;
use crate::writer::document::{escape_literal, Document};
use crate::writer::page::Page;

/// Markup annotation flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupKind {
    /// Highlighted text
    Highlight,
    /// Underlined text
    Underline,
    /// Squiggly underline
    Squiggly,
    /// Struck-out text
    StrikeOut,
}

impl MarkupKind {
    fn subtype(self) -> &'static str {
        match self {
            MarkupKind::Highlight => "Highlight",
            MarkupKind::Underline => "Underline",
            MarkupKind::Squiggly => "Squiggly",
            MarkupKind::StrikeOut => "StrikeOut",
        }
    }
}

/// Handle to an emitted annotation, usable as a reply-thread parent.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationRef {
    pub(crate) obj: ObjectRef,
}

/// A document-wide annotation record: the emitted object and its page.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Annotation {
    pub obj: ObjectRef,
    pub page: ObjectRef,
}

/// Optional annotation metadata.
#[derive(Debug, Clone)]
pub struct AnnotationConfig {
    /// Annotation color
    pub color: Color,
    /// Thread parent; turns this annotation into a reply
    pub parent: Option<AnnotationRef>,
    /// Author name, written as the `/T` entry
    pub author: Option<String>,
    /// Post date (ASN.1), written as the `/M` entry
    pub date: Option<String>,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            color: Color::rgb(1.0, 1.0, 0.0),
            parent: None,
            author: None,
            date: None,
        }
    }
}

impl Document {
    fn write_annotation_metadata(&mut self, config: &AnnotationConfig) -> Result<()> {
        if let Some(author) = &config.author {
            self.body
                .append_str(&format!("\n/T ({})", escape_literal(author)))?;
        }
        if let Some(parent) = &config.parent {
            self.body.append_str("\n/RT /R")?;
            self.body
                .append_str(&format!("\n/IRT {} 0 R", parent.obj.id))?;
        }
        if let Some(date) = &config.date {
            self.body.append_str(&format!("\n/M (D:{})", date))?;
        }
        self.body.append_str(&format!(
            "\n/C [{:.2} {:.2} {:.2}]",
            config.color.r, config.color.g, config.color.b
        ))?;
        Ok(())
    }

    fn push_annotation(&mut self, obj: ObjectRef, page: &Page) -> AnnotationRef {
        self.annotations.push(Annotation {
            obj,
            page: page.obj,
        });
        AnnotationRef { obj }
    }

    /// Attach a text note to a content object on `page`.
    pub fn add_text_annotation(
        &mut self,
        page: &Page,
        target: &ContentObject,
        text: &str,
        config: &AnnotationConfig,
    ) -> Result<AnnotationRef> {
        let rect = target.bounds;
        let obj = self.begin_object()?;
        self.body.append_str("\n<</Type /Annot")?;
        self.body.append_str("\n/Subtype /Text")?;
        self.body.append_str(&format!(
            "\n/Rect [{:.2} {:.2} {:.2} {:.2}]",
            rect.x,
            rect.y,
            rect.right(),
            rect.bottom()
        ))?;
        self.body
            .append_str(&format!("\n/Contents ({})", escape_literal(text)))?;
        self.write_annotation_metadata(config)?;
        self.body.append_str(">>")?;
        self.body.append_str("\nendobj")?;
        Ok(self.push_annotation(obj, page))
    }

    /// Attach a markup annotation (highlight, underline, squiggly or
    /// strike-out) to a content object on `page`.
    ///
    /// The quad points are nudged two units below the target's rectangle
    /// so the markup sits on the text rather than over it.
    pub fn add_markup_annotation(
        &mut self,
        page: &Page,
        target: &ContentObject,
        text: &str,
        kind: MarkupKind,
        config: &AnnotationConfig,
    ) -> Result<AnnotationRef> {
        let rect = target.bounds;
        let obj = self.begin_object()?;
        self.body.append_str("\n<</Type /Annot")?;
        self.body
            .append_str(&format!("\n/Subtype /{}", kind.subtype()))?;
        self.body.append_str(&format!(
            "\n/Rect [{:.2} {:.2} {:.2} {:.2}]",
            rect.x,
            rect.y,
            rect.right(),
            rect.bottom()
        ))?;
        let nudged_y = rect.y - 2.0;
        self.body.append_str(&format!(
            "\n/QuadPoints [{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} {:.2}]",
            rect.x,
            nudged_y - rect.h,
            rect.x + rect.w,
            nudged_y - rect.h,
            rect.x,
            nudged_y,
            rect.x + rect.w,
            nudged_y
        ))?;
        self.write_annotation_metadata(config)?;
        self.body
            .append_str(&format!("\n/Contents ({})", escape_literal(text)))?;
        self.body.append_str(">>")?;
        self.body.append_str("\nendobj")?;
        Ok(self.push_annotation(obj, page))
    }

    /// Add a link from a content object on `src_page` to `dest_page`,
    /// targeting either a destination object's position or the top of the
    /// destination page.
    pub fn add_link_annotation(
        &mut self,
        src_page: &Page,
        src_obj: &ContentObject,
        dest_page: &Page,
        dest_obj: Option<&ContentObject>,
        config: &AnnotationConfig,
    ) -> Result<AnnotationRef> {
        let rect = src_obj.bounds;
        let obj = self.begin_object()?;
        self.body.append_str("\n<</Type /Annot")?;
        self.body.append_str("\n/Subtype /Link")?;
        self.body.append_str(&format!(
            "\n/Rect [{:.2} {:.2} {:.2} {:.2}]",
            rect.x,
            rect.y,
            rect.right(),
            rect.bottom()
        ))?;
        let (dest_x, dest_y) = match dest_obj {
            Some(target) => (target.bounds.x, target.bounds.y),
            None => (0.0, dest_page.size.height()),
        };
        self.body.append_str(&format!(
            "\n/Dest [{} 0 R /XYZ {:.6} {:.6} null]",
            dest_page.obj.id, dest_x, dest_y
        ))?;
        self.body.append_str("\n/Border [0 0 0 0]")?;
        self.write_annotation_metadata(config)?;
        self.body.append_str(">>")?;
        self.body.append_str("\nendobj")?;
        Ok(self.push_annotation(obj, src_page))
    }
}
