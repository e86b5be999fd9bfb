//! Content-stream emitters: text runs, paths, curves, rectangles, tables
//! and placed images.
//!
//! Every emitter follows the same shape: compute a bounding rectangle from
//! the input geometry, open a stream object whose `/Length` references the
//! *peeked* next object id, write the drawing operators, close the stream,
//! then allocate that peeked id as the length object. The bounding
//! rectangle travels with the returned [`ContentObject`] so annotations and
//! bookmarks can anchor to it later.

use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::object::{ContentObject, ObjectRef};
use crate::writer::document::{escape_literal, Document};
use crate::writer::page::PlacedImage;
use crate::writer::sink::StreamEncoding;

/// Stroke or fill color, each channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
}

impl Color {
    /// An rgb color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Black.
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
}

/// Line cap style, PDF `J` operator values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    /// Squared off at the endpoint
    #[default]
    Butt = 0,
    /// Semicircle at the endpoint
    Round = 1,
    /// Square projecting past the endpoint
    Projecting = 2,
}

/// Line join style, PDF `j` operator values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    /// Sharp corner
    #[default]
    Miter = 0,
    /// Rounded corner
    Round = 1,
    /// Cut-off corner
    Bevel = 2,
}

/// Stroke state for path emitters.
#[derive(Debug, Clone, Copy)]
pub struct GraphicsConfig {
    /// Line cap style
    pub line_cap: LineCap,
    /// Line width in user-space units; 0 means thinnest renderable
    pub line_width: u32,
    /// Line join style
    pub line_join: LineJoin,
    /// Miter limit; must be positive
    pub miter_limit: f32,
    /// On/off dash lengths; `[0, 0]` draws solid
    pub dash_pattern: [u32; 2],
    /// Stroke color
    pub color: Color,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            line_cap: LineCap::Butt,
            line_width: 0,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            dash_pattern: [0, 0],
            color: Color::BLACK,
        }
    }
}

/// Text rendering mode, PDF `Tr` operator values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Fill the glyphs
    #[default]
    Fill = 0,
    /// Stroke the glyph outlines
    Stroke = 1,
    /// Fill then stroke
    FillStroke = 2,
    /// Neither fill nor stroke
    Invisible = 3,
}

/// Text state for [`Document::add_text`].
#[derive(Debug, Clone, Copy)]
pub struct TextConfig {
    /// Extra spacing between characters
    pub char_space: f32,
    /// Extra spacing between words
    pub word_space: f32,
    /// Horizontal scale percentage; 100 is unscaled
    pub horizontal_scale: f32,
    /// Line leading
    pub leading: f32,
    /// Font size in points
    pub font_size: u32,
    /// Font object; `None` selects the standard regular font
    pub font: Option<ObjectRef>,
    /// Rendering mode
    pub render_mode: RenderMode,
    /// Baseline rise
    pub rise: f32,
    /// Fill color
    pub color: Color,
    /// Rotation angle in radians, applied via the text matrix
    pub angle: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            char_space: 0.0,
            word_space: 0.0,
            horizontal_scale: 100.0,
            leading: 0.0,
            font_size: 12,
            font: None,
            render_mode: RenderMode::Fill,
            rise: 0.0,
            color: Color::BLACK,
            angle: 0.0,
        }
    }
}

/// An embedded image, placeable on any number of pages.
#[derive(Debug, Clone, Copy)]
pub struct ImageHandle {
    pub(crate) obj: ObjectRef,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
}

impl Document {
    /// Open a content stream object: allocates the object, references the
    /// peeked next id as `/Length`, and flips the sink into stream mode.
    /// Returns the object together with the stream content start offset.
    fn begin_content_object(&mut self, bounds: Rect) -> Result<(ContentObject, u64)> {
        assert!(self.page.is_some(), "no page is open");

        let obj = self.begin_object()?;
        let length_id = self.peek_next_id();
        self.body
            .append_str(&format!("\n<< /Length {} 0 R", length_id))?;
        if self.body.encoding() == StreamEncoding::AsciiHex {
            self.body.append_str("\n/Filter /ASCIIHexDecode")?;
        }
        self.body.append_str(">>\nstream\n")?;
        self.body.enter_stream();
        let stream_start = self.body.len();

        if let Some(page) = &mut self.page {
            page.objects.push(obj);
        }
        Ok((ContentObject { obj, bounds }, stream_start))
    }

    /// Close the stream opened by [`begin_content_object`] and emit the
    /// length object carrying the encoded stream byte count.
    ///
    /// [`begin_content_object`]: Document::begin_content_object
    fn end_content_object(&mut self, stream_start: u64) -> Result<()> {
        let encoding = self.body.exit_stream();
        if encoding == StreamEncoding::AsciiHex {
            // EOD marker, counted in the stream length.
            self.body.append_str(">")?;
        }
        let stream_end = self.body.append_str("\nendstream")?;
        self.body.append_str("\nendobj")?;

        let length = stream_end - stream_start;
        self.begin_object()?;
        self.body.append_str(&format!("\n{}", length))?;
        self.body.append_str("\nendobj")?;
        Ok(())
    }

    fn write_stroke_state(&mut self, gfx: &GraphicsConfig) -> Result<()> {
        self.body
            .append_str(&format!("\n{} J", gfx.line_cap as i32))?;
        self.body.append_str(&format!("\n{} w", gfx.line_width))?;
        self.body
            .append_str(&format!("\n{} j", gfx.line_join as i32))?;
        self.body
            .append_str(&format!("\n{:.3} M", gfx.miter_limit))?;
        if gfx.dash_pattern[0] > 0 && gfx.dash_pattern[1] > 0 {
            self.body.append_str(&format!(
                "\n[{} {}] 0 d",
                gfx.dash_pattern[0], gfx.dash_pattern[1]
            ))?;
        }
        self.body.append_str(&format!(
            "\n{:.1} {:.1} {:.1} RG",
            gfx.color.r, gfx.color.g, gfx.color.b
        ))?;
        Ok(())
    }

    /// Draw a text run at baseline position `(x, y)`.
    ///
    /// The bounding rectangle is an estimate: font height tall, five units
    /// per character wide.
    pub fn add_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        config: &TextConfig,
    ) -> Result<ContentObject> {
        let bounds = Rect::new(
            x,
            y + config.font_size as f32,
            text.chars().count() as f32 * 5.0,
            config.font_size as f32,
        );
        let (content, stream_start) = self.begin_content_object(bounds)?;
        let font_id = config.font.map_or(self.regular_font().id, |f| f.id);

        self.body.append_str("\nBT")?;
        self.body
            .append_str(&format!("\n/F{} {} Tf", font_id, config.font_size))?;
        self.body.append_str(&format!(
            "\n{:.1} {:.1} {:.1} rg",
            config.color.r, config.color.g, config.color.b
        ))?;
        self.body
            .append_str(&format!("\n{:.2} Tc", config.char_space))?;
        self.body
            .append_str(&format!("\n{:.2} Tw", config.word_space))?;
        self.body
            .append_str(&format!("\n{:.2} Tz", config.horizontal_scale))?;
        self.body
            .append_str(&format!("\n{:.2} TL", config.leading))?;
        self.body.append_str(&format!("\n{:.2} Ts", config.rise))?;
        self.body
            .append_str(&format!("\n{} Tr", config.render_mode as i32))?;
        let (sin, cos) = config.angle.sin_cos();
        self.body.append_str(&format!(
            "\n{:.6} {:.6} {:.6} {:.6} {:.6} {:.6} Tm",
            cos, sin, -sin, cos, x, y
        ))?;
        self.body.append_str("\nT* (")?;
        self.body.append_str(&escape_literal(text))?;
        self.body.append_str(") Tj")?;
        self.body.append_str("\nET")?;

        self.end_content_object(stream_start)?;
        Ok(content)
    }

    /// Draw a straight line between two points.
    pub fn add_line(&mut self, p1: Point, p2: Point, gfx: &GraphicsConfig) -> Result<ContentObject> {
        self.add_polygon(&[p1, p2], gfx)
    }

    /// Draw an open polyline through `points`.
    ///
    /// # Panics
    ///
    /// Panics if `points` is empty or the miter limit is not positive.
    pub fn add_polygon(&mut self, points: &[Point], gfx: &GraphicsConfig) -> Result<ContentObject> {
        assert!(!points.is_empty(), "polygon needs at least one point");
        assert!(gfx.miter_limit > 0.0, "miter limit must be positive");

        let bounds = Rect::bounds_of(points);
        let (content, stream_start) = self.begin_content_object(bounds)?;

        self.body
            .append_str(&format!("\n{:.3} {:.3} m", points[0].x, points[0].y))?;
        self.write_stroke_state(gfx)?;
        for point in &points[1..] {
            self.body
                .append_str(&format!("\n{:.3} {:.3} l", point.x, point.y))?;
        }
        self.body.append_str("\nS")?;
        self.body.append_str("\nn")?;

        self.end_content_object(stream_start)?;
        Ok(content)
    }

    /// Draw a cubic Bézier chain: one full segment (start plus two control
    /// points and endpoint folded as `c`), then `v` segments consuming two
    /// points each.
    ///
    /// # Panics
    ///
    /// Panics unless `points.len() >= 3` and the remainder after the first
    /// three is even, or if the miter limit is not positive.
    pub fn add_cubic_bezier(
        &mut self,
        points: &[Point],
        gfx: &GraphicsConfig,
    ) -> Result<ContentObject> {
        assert!(points.len() >= 3, "bezier needs at least three points");
        assert!(
            (points.len() - 3) % 2 == 0,
            "bezier continuation points come in pairs"
        );
        assert!(gfx.miter_limit > 0.0, "miter limit must be positive");

        let bounds = Rect::bounds_of(points);
        let (content, stream_start) = self.begin_content_object(bounds)?;

        self.write_stroke_state(gfx)?;
        self.body
            .append_str(&format!("\n{:.3} {:.3} m", points[0].x, points[0].y))?;
        self.body.append_str(&format!(
            "\n{:.3} {:.3} {:.3} {:.3} {:.3} {:.3} c",
            points[0].x, points[0].y, points[1].x, points[1].y, points[2].x, points[2].y
        ))?;
        for pair in points[3..].chunks_exact(2) {
            self.body.append_str(&format!(
                "\n{:.3} {:.3} {:.3} {:.3} v",
                pair[0].x, pair[0].y, pair[1].x, pair[1].y
            ))?;
        }
        self.body.append_str("\nS")?;
        self.body.append_str("\nn")?;

        self.end_content_object(stream_start)?;
        Ok(content)
    }

    /// Draw the outline of a rectangle, composed as a closed polyline.
    pub fn add_rect(&mut self, rect: Rect, gfx: &GraphicsConfig) -> Result<ContentObject> {
        let top_left = Point::new(rect.x, rect.y);
        let top_right = Point::new(rect.right(), rect.y);
        let bottom_right = Point::new(rect.right(), rect.bottom());
        let bottom_left = Point::new(rect.x, rect.bottom());
        self.add_polygon(
            &[top_left, top_right, bottom_right, bottom_left, top_left],
            gfx,
        )
    }

    /// Draw a table grid: the outer rectangle plus evenly spaced interior
    /// row and column separators, all composed from the line primitives.
    /// Returns the outer rectangle's content object, whose bounds cover the
    /// whole table.
    pub fn add_table(
        &mut self,
        rect: Rect,
        rows: u32,
        columns: u32,
        gfx: &GraphicsConfig,
    ) -> Result<ContentObject> {
        assert!(rows > 0 && columns > 0, "table needs at least one cell");

        let outer = self.add_rect(rect, gfx)?;
        let row_step = rect.h / rows as f32;
        for row in 1..rows {
            let y = rect.y - row_step * row as f32;
            self.add_line(Point::new(rect.x, y), Point::new(rect.right(), y), gfx)?;
        }
        let column_step = rect.w / columns as f32;
        for column in 1..columns {
            let x = rect.x + column_step * column as f32;
            self.add_line(Point::new(x, rect.y), Point::new(x, rect.bottom()), gfx)?;
        }
        Ok(outer)
    }

    /// Embed raw image sample data as an image XObject.
    ///
    /// `data` is raw `DeviceRGB` samples; no compression filter is applied.
    /// The returned handle can be placed on pages any number of times with
    /// [`place_image`](Document::place_image).
    pub fn embed_image(
        &mut self,
        data: &[u8],
        width: u32,
        height: u32,
        bits_per_component: u8,
    ) -> Result<ImageHandle> {
        let obj = self.begin_object()?;
        self.body.append_str("\n<</Type /XObject")?;
        self.body.append_str("\n/Subtype /Image")?;
        self.body.append_str(&format!("\n/Width {}", width))?;
        self.body.append_str(&format!("\n/Height {}", height))?;
        self.body.append_str("\n/ColorSpace /DeviceRGB")?;
        self.body
            .append_str(&format!("\n/BitsPerComponent {}", bits_per_component))?;
        self.body.append_str("\n/Interpolate true")?;
        self.body.append_str(&format!("\n/Length {}", data.len()))?;
        self.body.append_str(">>")?;
        self.body.append_str("\nstream\n")?;
        self.body.append(data)?;
        self.body.append_str("\nendstream")?;
        self.body.append_str("\nendobj")?;

        log::debug!("embedded image {} 0 R ({}x{})", obj.id, width, height);
        Ok(ImageHandle { obj, width, height })
    }

    /// Place an embedded image on the open page, scaled into `rect`.
    ///
    /// Registers the image in the page's `/XObject` resources under a
    /// per-page `ImN` name.
    ///
    /// # Panics
    ///
    /// Panics if no page is open.
    pub fn place_image(&mut self, image: &ImageHandle, rect: Rect) -> Result<ContentObject> {
        let name = {
            let page = self.page.as_mut().expect("no page is open");
            let name = format!("Im{}", page.images.len());
            page.images.push(PlacedImage {
                name: name.clone(),
                obj: image.obj,
            });
            name
        };

        let (content, stream_start) = self.begin_content_object(rect)?;
        self.body.append_str("q")?;
        self.body.append_str(&format!(
            "\n{:.6} 0 0 {:.6} {:.6} {:.6} cm",
            rect.w, rect.h, rect.x, rect.y
        ))?;
        self.body.append_str(&format!("\n/{} Do", name))?;
        self.body.append_str("\nQ")?;
        self.end_content_object(stream_start)?;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::PageSize;

    fn body_text(doc: &Document) -> String {
        String::from_utf8_lossy(doc.as_bytes()).into_owned()
    }

    #[test]
    fn test_text_operators() {
        let mut doc = Document::new().unwrap();
        doc.begin_page(PageSize::Letter);
        let obj = doc
            .add_text("Hello", 100.0, 700.0, &TextConfig::default())
            .unwrap();
        doc.end_page().unwrap();

        let body = body_text(&doc);
        assert!(body.contains("\nBT"));
        assert!(body.contains(&format!("/F{} 12 Tf", doc.regular_font().id)));
        assert!(body.contains("100.00 Tz"));
        assert!(body.contains("T* (Hello) Tj"));
        assert!(body.contains("\nET"));
        assert_eq!(obj.bounds.y, 712.0);
        assert_eq!(obj.bounds.w, 25.0);
    }

    #[test]
    fn test_text_escapes_parens() {
        let mut doc = Document::new().unwrap();
        doc.begin_page(PageSize::Letter);
        doc.add_text("a(b)", 0.0, 0.0, &TextConfig::default())
            .unwrap();
        doc.end_page().unwrap();
        assert!(body_text(&doc).contains("(a\\(b\\)) Tj"));
    }

    #[test]
    fn test_length_object_matches_stream_bytes() {
        let mut doc = Document::new().unwrap();
        doc.begin_page(PageSize::Letter);
        let obj = doc
            .add_line(
                Point::new(0.0, 0.0),
                Point::new(10.0, 10.0),
                &GraphicsConfig::default(),
            )
            .unwrap();
        doc.end_page().unwrap();

        let body = body_text(&doc);
        let header = format!("\n{} 0 obj\n<< /Length {} 0 R", obj.obj.id, obj.obj.id + 1);
        assert!(body.contains(&header));

        // Measure the stream and compare against the emitted length object.
        let start = body.find("stream\n").unwrap() + "stream\n".len();
        let end = body.find("\nendstream").unwrap();
        let length_obj = format!("\n{} 0 obj\n{}\n", obj.obj.id + 1, end - start);
        assert!(body.contains(&length_obj));
    }

    #[test]
    fn test_polygon_stroke_state() {
        let mut doc = Document::new().unwrap();
        doc.begin_page(PageSize::Letter);
        let gfx = GraphicsConfig {
            line_cap: LineCap::Round,
            line_width: 3,
            line_join: LineJoin::Bevel,
            dash_pattern: [4, 2],
            color: Color::rgb(1.0, 0.0, 0.5),
            ..GraphicsConfig::default()
        };
        doc.add_polygon(
            &[Point::new(10.0, 10.0), Point::new(20.0, 40.0), Point::new(30.0, 10.0)],
            &gfx,
        )
        .unwrap();
        doc.end_page().unwrap();

        let body = body_text(&doc);
        assert!(body.contains("10.000 10.000 m"));
        assert!(body.contains("\n1 J"));
        assert!(body.contains("\n3 w"));
        assert!(body.contains("\n2 j"));
        assert!(body.contains("\n10.000 M"));
        assert!(body.contains("[4 2] 0 d"));
        assert!(body.contains("1.0 0.0 0.5 RG"));
        assert!(body.contains("20.000 40.000 l"));
        assert!(body.contains("\nS\nn"));
    }

    #[test]
    fn test_polygon_bounds_from_points() {
        let mut doc = Document::new().unwrap();
        doc.begin_page(PageSize::Letter);
        let obj = doc
            .add_polygon(
                &[Point::new(50.0, 60.0), Point::new(80.0, 90.0)],
                &GraphicsConfig::default(),
            )
            .unwrap();
        doc.end_page().unwrap();

        // Bounds come from the points themselves, not from the origin.
        assert_eq!(obj.bounds.x, 50.0);
        assert_eq!(obj.bounds.y, 90.0);
        assert_eq!(obj.bounds.w, 30.0);
        assert_eq!(obj.bounds.h, 30.0);
    }

    #[test]
    fn test_bezier_segments() {
        let mut doc = Document::new().unwrap();
        doc.begin_page(PageSize::Letter);
        let points = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 20.0),
            Point::new(20.0, 0.0),
            Point::new(30.0, 20.0),
            Point::new(40.0, 0.0),
        ];
        doc.add_cubic_bezier(&points, &GraphicsConfig::default())
            .unwrap();
        doc.end_page().unwrap();

        let body = body_text(&doc);
        assert!(body.contains("0.000 0.000 10.000 20.000 20.000 0.000 c"));
        assert!(body.contains("30.000 20.000 40.000 0.000 v"));
    }

    #[test]
    #[should_panic(expected = "pairs")]
    fn test_bezier_rejects_odd_continuation() {
        let mut doc = Document::new().unwrap();
        doc.begin_page(PageSize::Letter);
        let points = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(3.0, 3.0),
        ];
        let _ = doc.add_cubic_bezier(&points, &GraphicsConfig::default());
    }

    #[test]
    #[should_panic(expected = "no page is open")]
    fn test_content_requires_open_page() {
        let mut doc = Document::new().unwrap();
        let _ = doc.add_text("orphan", 0.0, 0.0, &TextConfig::default());
    }

    #[test]
    fn test_table_composes_grid_lines() {
        let mut doc = Document::new().unwrap();
        doc.begin_page(PageSize::Letter);
        let before = doc.peek_next_id();
        let outer = doc
            .add_table(
                Rect::new(100.0, 500.0, 200.0, 100.0),
                2,
                3,
                &GraphicsConfig::default(),
            )
            .unwrap();
        doc.end_page().unwrap();

        // Outer rect + 1 row line + 2 column lines, each a content object
        // plus its length object.
        assert_eq!(doc.peek_next_id() - before, 8);
        assert_eq!(outer.bounds, Rect::new(100.0, 500.0, 200.0, 100.0));
        let body = body_text(&doc);
        assert!(body.contains("100.000 450.000 m"));
        assert!(body.contains("166.667 500.000 m") || body.contains("166.666 500.000 m"));
    }

    #[test]
    fn test_ascii_hex_stream_encoding() {
        let mut doc = Document::new().unwrap();
        doc.set_stream_encoding(StreamEncoding::AsciiHex);
        doc.begin_page(PageSize::Letter);
        doc.add_text("A", 0.0, 0.0, &TextConfig::default()).unwrap();
        doc.end_page().unwrap();

        let body = body_text(&doc);
        assert!(body.contains("/Filter /ASCIIHexDecode"));
        // "BT" hex-encoded.
        assert!(body.contains("0A4254"));
        assert!(body.contains(">\nendstream"));
    }

    #[test]
    fn test_image_embed_and_place() {
        let mut doc = Document::new().unwrap();
        let samples = vec![0u8; 2 * 2 * 3];
        let img = doc.embed_image(&samples, 2, 2, 8).unwrap();
        doc.begin_page(PageSize::Letter);
        doc.place_image(&img, Rect::new(100.0, 200.0, 50.0, 50.0))
            .unwrap();
        doc.end_page().unwrap();

        let body = body_text(&doc);
        assert!(body.contains("/Subtype /Image"));
        assert!(body.contains("/Width 2"));
        assert!(body.contains("/BitsPerComponent 8"));
        assert!(body.contains("/Im0 Do"));
        // The page resources name the placed image.
        assert!(body.contains(&format!("/Im0 {} 0 R", img.obj.id)));
    }
}
