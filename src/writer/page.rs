//! Page sizes and the page lifecycle.
//!
//! A page is opened with [`Document::begin_page`], accumulates content
//! objects and image resources, and is closed with [`Document::end_page`],
//! which emits the page dictionary. Two fields of that dictionary cannot be
//! known yet — the page tree parent and the annotation array — so the page
//! handle carries the byte offsets of their placeholder fields, consumed
//! exactly once during finalization.

use crate::error::Result;
use crate::object::ObjectRef;
use crate::writer::document::Document;

/// Named page sizes, in portrait orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageSize {
    /// US Letter, 8.5 in × 11 in
    Letter,
    /// ISO A0
    A0,
    /// ISO A1
    A1,
    /// ISO A2
    A2,
    /// ISO A3
    A3,
    /// ISO A4
    A4,
    /// ISO A5
    A5,
    /// ISO A6
    A6,
}

impl PageSize {
    /// Page dimensions `(width, height)` in user-space units (inches × 72).
    pub fn dimensions(self) -> (f32, f32) {
        let (w_in, h_in) = match self {
            PageSize::Letter => (8.5, 11.0),
            PageSize::A0 => (33.1, 46.8),
            PageSize::A1 => (23.4, 33.1),
            PageSize::A2 => (16.5, 23.4),
            PageSize::A3 => (11.7, 16.5),
            PageSize::A4 => (8.3, 11.7),
            PageSize::A5 => (5.8, 8.3),
            PageSize::A6 => (4.1, 5.8),
        };
        (w_in * 72.0, h_in * 72.0)
    }

    /// Page width in user-space units.
    pub fn width(self) -> f32 {
        self.dimensions().0
    }

    /// Page height in user-space units.
    pub fn height(self) -> f32 {
        self.dimensions().1
    }
}

/// Handle to a closed page.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    /// The page dictionary object
    pub obj: ObjectRef,
    /// The page's size
    pub size: PageSize,
    /// Offset of the `/Parent` placeholder field
    pub(crate) parent_fixup: u64,
    /// Offset of the `/Annots` placeholder field
    pub(crate) annots_fixup: u64,
}

/// An image resource registered on the open page.
#[derive(Debug, Clone)]
pub(crate) struct PlacedImage {
    /// Resource name inside the page's `/XObject` dictionary (`Im<n>`)
    pub name: String,
    /// The image XObject
    pub obj: ObjectRef,
}

/// Accumulator for the page currently open.
#[derive(Debug)]
pub(crate) struct OpenPage {
    pub size: PageSize,
    /// Content objects emitted while this page was open, in emission order.
    pub objects: Vec<ObjectRef>,
    /// Images placed on this page, in placement order.
    pub images: Vec<PlacedImage>,
}

impl OpenPage {
    fn new(size: PageSize) -> Self {
        Self {
            size,
            objects: Vec::new(),
            images: Vec::new(),
        }
    }
}

impl Document {
    /// Open a new page of the given size.
    ///
    /// # Panics
    ///
    /// Panics if a page is already open.
    pub fn begin_page(&mut self, size: PageSize) {
        assert!(self.page.is_none(), "a page is already open");
        self.page = Some(OpenPage::new(size));
    }

    /// Close the open page and emit its dictionary.
    ///
    /// Emits, in order: the ProcSet array, an ExtGState enabling automatic
    /// stroke adjustment, and the page object with its resources, media box,
    /// content list and the two pending placeholder fields.
    ///
    /// # Panics
    ///
    /// Panics if no page is open.
    pub fn end_page(&mut self) -> Result<Page> {
        let open = self.page.take().expect("no page is open");

        let procset = self.begin_object()?;
        self.body.append_str("\n[/PDF /Text /ImageB /ImageC /ImageI]")?;
        self.body.append_str("\nendobj")?;

        // Automatic stroke adjustment for all content on the page.
        let gstate = self.begin_object()?;
        self.body.append_str("\n<</Type /ExtGState\n/SA true>>")?;
        self.body.append_str("\nendobj")?;

        let page_obj = self.begin_object()?;
        self.body.append_str("\n<</Type /Page")?;
        self.body.append_str("\n/Parent ")?;
        let parent_fixup = self.body.reserve_ref_field()?;
        self.body.append_str(" 0 R")?;

        self.body
            .append_str(&format!("\n/Resources <</ProcSet {} 0 R", procset.id))?;
        self.body
            .append_str(&format!("\n/ExtGState <<\n/GS0 {} 0 R\n>>", gstate.id))?;

        // Document-scoped fonts: the four standard fonts plus every embedded
        // font registered so far, all named /F<object id>.
        let font_ids: Vec<u64> = self
            .standard_font_refs()
            .into_iter()
            .chain(self.custom_fonts.iter().map(|f| f.id))
            .collect();
        self.body.append_str("\n/Font <<")?;
        for id in font_ids {
            self.body.append_str(&format!("\n/F{} {} 0 R", id, id))?;
        }
        self.body.append_str("\n>>")?;

        if !open.images.is_empty() {
            self.body.append_str("\n/XObject <<\n")?;
            for image in &open.images {
                self.body
                    .append_str(&format!("/{} {} 0 R\n", image.name, image.obj.id))?;
            }
            self.body.append_str("\n>>")?;
        }

        self.body.append_str("\n>>")?;

        let (width, height) = open.size.dimensions();
        self.body
            .append_str(&format!("\n/MediaBox [0 0 {:.3} {:.3}]", width, height))?;

        self.body.append_str("\n/Annots ")?;
        let annots_fixup = self.body.reserve_ref_field()?;
        self.body.append_str(" 0 R")?;

        self.body.append_str("\n/Contents [\n")?;
        for obj in &open.objects {
            self.body.append_str(&format!("{} 0 R\n", obj.id))?;
        }
        self.body.append_str("]>>")?;
        self.body.append_str("\nendobj")?;

        let page = Page {
            obj: page_obj,
            size: open.size,
            parent_fixup,
            annots_fixup,
        };
        self.pages.push(page);
        log::debug!(
            "closed page {} ({:?}, {} content objects, {} images)",
            self.pages.len(),
            page.size,
            open.objects.len(),
            open.images.len()
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_dimensions() {
        assert_eq!(PageSize::Letter.dimensions(), (612.0, 792.0));
        let (w, h) = PageSize::A4.dimensions();
        assert!((w - 597.6).abs() < 0.01);
        assert!((h - 842.4).abs() < 0.01);
    }

    #[test]
    fn test_a_series_halving_order() {
        // Each A(n+1) is the A(n) sheet halved: width(n+1) = height(n)/2-ish.
        let sizes = [
            PageSize::A0,
            PageSize::A1,
            PageSize::A2,
            PageSize::A3,
            PageSize::A4,
            PageSize::A5,
            PageSize::A6,
        ];
        for pair in sizes.windows(2) {
            assert!(pair[0].width() > pair[1].width());
            assert!(pair[0].height() > pair[1].height());
        }
    }

    #[test]
    #[should_panic(expected = "a page is already open")]
    fn test_double_begin_page_panics() {
        let mut doc = Document::new().unwrap();
        doc.begin_page(PageSize::A4);
        doc.begin_page(PageSize::A4);
    }

    #[test]
    #[should_panic(expected = "no page is open")]
    fn test_end_without_begin_panics() {
        let mut doc = Document::new().unwrap();
        let _ = doc.end_page();
    }

    #[test]
    fn test_end_page_emits_page_dict() {
        let mut doc = Document::new().unwrap();
        doc.begin_page(PageSize::Letter);
        let page = doc.end_page().unwrap();

        assert!(page.obj.is_valid());
        let body = String::from_utf8_lossy(doc.body.as_bytes()).into_owned();
        assert!(body.contains("/Type /Page"));
        assert!(body.contains("/MediaBox [0 0 612.000 792.000]"));
        assert!(body.contains("/ProcSet"));
        assert!(body.contains("/SA true"));
        // Both placeholders are still unpatched at this point.
        assert!(body.contains("/Parent 00000000 0 R"));
        assert!(body.contains("/Annots 00000000 0 R"));
    }

    #[test]
    fn test_page_resources_list_standard_fonts() {
        let mut doc = Document::new().unwrap();
        doc.begin_page(PageSize::A5);
        doc.end_page().unwrap();

        let body = String::from_utf8_lossy(doc.body.as_bytes()).into_owned();
        for id in doc.standard_font_refs() {
            assert!(body.contains(&format!("/F{} {} 0 R", id, id)));
        }
    }
}
