//! End-to-end tests for the streaming writer.
//!
//! These tests treat the finished document as an opaque byte stream and
//! verify the file-level invariants a conforming reader relies on:
//! - the cross-reference table maps every object id to the exact byte
//!   offset of its `obj` header
//! - `startxref` points at the `xref` keyword
//! - no unpatched placeholder field survives finalization
//! - patching never moves any byte written before it

use pdf_scribe::{
    AnnotationConfig, Color, Document, DocumentInfo, GraphicsConfig, MarkupKind, PageSize,
    PatchTrace, Point, Rect, TextConfig,
};
use proptest::prelude::*;

/// Route `log` output into the test harness's captured output.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parsed view of the cross-reference section and trailer.
struct XrefView {
    /// Offset of the `xref` keyword as announced by `startxref`.
    start: usize,
    /// `(id, offset)` for every in-use entry.
    entries: Vec<(u64, usize)>,
    size: u64,
}

fn parse_xref(bytes: &[u8]) -> XrefView {
    let text = String::from_utf8_lossy(bytes);

    let startxref_at = text.rfind("startxref\n").expect("startxref missing");
    let after = &text[startxref_at + "startxref\n".len()..];
    let start: usize = after
        .lines()
        .next()
        .expect("startxref value missing")
        .trim()
        .parse()
        .expect("startxref value not a number");

    assert!(
        text[start..].starts_with("xref\n"),
        "startxref does not point at the xref keyword"
    );

    let mut lines = text[start..].lines();
    assert_eq!(lines.next(), Some("xref"));
    let subsection = lines.next().expect("subsection header missing");
    let size: u64 = subsection
        .strip_prefix("0 ")
        .expect("subsection must start at object 0")
        .parse()
        .expect("subsection count not a number");

    let free = lines.next().expect("free entry missing");
    assert!(free.starts_with("0000000000 65535 f"));

    let mut entries = Vec::new();
    for id in 1..size {
        let line = lines.next().expect("xref entry missing");
        let offset: usize = line[..10].parse().expect("entry offset not numeric");
        assert_eq!(&line[10..], " 00000 n ", "malformed xref entry");
        entries.push((id, offset));
    }
    XrefView {
        start,
        entries,
        size,
    }
}

fn build_two_page_document() -> Document {
    init_logging();
    let mut doc = Document::new().unwrap();

    doc.begin_page(PageSize::Letter);
    let title = doc
        .add_text("Chapter one", 72.0, 720.0, &TextConfig::default())
        .unwrap();
    doc.add_line(
        Point::new(72.0, 710.0),
        Point::new(540.0, 710.0),
        &GraphicsConfig::default(),
    )
    .unwrap();
    let first = doc.end_page().unwrap();

    doc.begin_page(PageSize::A4);
    let body = doc
        .add_text("Chapter two", 72.0, 780.0, &TextConfig::default())
        .unwrap();
    let second = doc.end_page().unwrap();

    let root = doc.add_bookmark(&first, Some(&title), None, "Chapter one");
    doc.add_bookmark(&second, Some(&body), Some(root), "Chapter two");
    doc.add_text_annotation(&first, &title, "review me", &AnnotationConfig::default())
        .unwrap();
    doc.add_markup_annotation(
        &second,
        &body,
        "typo",
        MarkupKind::Underline,
        &AnnotationConfig::default(),
    )
    .unwrap();
    doc.add_link_annotation(&first, &title, &second, Some(&body), &AnnotationConfig::default())
        .unwrap();

    doc.set_info(&DocumentInfo::new().with_title("Integration").with_author("test"))
        .unwrap();
    doc.finish().unwrap();
    doc
}

#[test]
fn test_file_frame() {
    let doc = build_two_page_document();
    let bytes = doc.as_bytes();
    let text = String::from_utf8_lossy(bytes);

    assert!(text.starts_with("%PDF-1.7"));
    assert!(text.ends_with("%%EOF\n"));
    assert!(text.contains("/Count 2"));
    // Exact object census. A page dictionary reads `/Type /Page` followed
    // by a newline, which keeps the count from also matching `/Type /Pages`.
    assert_eq!(text.matches("/Type /Page\n").count(), 2);
    assert_eq!(text.matches("/Type /Pages").count(), 1);
    assert_eq!(text.matches("/Type /Catalog").count(), 1);
    assert_eq!(text.matches("/Type /Outlines").count(), 1);
}

#[test]
fn test_hello_world_scenario() {
    init_logging();
    let mut doc = Document::new().unwrap();
    doc.begin_page(PageSize::Letter);
    doc.add_text("Hello, world!", 72.0, 720.0, &TextConfig::default())
        .unwrap();
    doc.end_page().unwrap();
    doc.finish().unwrap();

    let text = String::from_utf8_lossy(doc.as_bytes()).into_owned();
    assert_eq!(text.matches("/Type /Page\n").count(), 1);
    assert_eq!(text.matches("/Type /Pages").count(), 1);
    assert_eq!(text.matches("/Type /Catalog").count(), 1);
    assert!(text.ends_with("%%EOF\n"));
}

#[test]
fn test_xref_maps_every_object_to_its_header() {
    let doc = build_two_page_document();
    let bytes = doc.as_bytes();
    let xref = parse_xref(bytes);

    assert_eq!(xref.entries.len() as u64, xref.size - 1);
    for (id, offset) in &xref.entries {
        let header = format!("\n{} 0 obj", id);
        assert!(
            bytes[*offset..].starts_with(header.as_bytes()),
            "object {} not found at recorded offset {}",
            id,
            offset
        );
    }
}

#[test]
fn test_trailer_size_counts_all_objects() {
    let doc = build_two_page_document();
    let text = String::from_utf8_lossy(doc.as_bytes()).into_owned();
    let xref = parse_xref(doc.as_bytes());

    assert!(text.contains(&format!("/Size {}\n", xref.size)));
    assert!(text.contains("/Info "));

    // /Root resolves, through the xref table, to the catalog object.
    let root_at = text.find("/Root ").unwrap() + "/Root ".len();
    let root_id: u64 = text[root_at..]
        .split_whitespace()
        .next()
        .unwrap()
        .parse()
        .unwrap();
    let (_, offset) = xref.entries[(root_id - 1) as usize];
    let object = &text[offset..];
    assert!(object.starts_with(&format!("\n{} 0 obj", root_id)));
    assert!(object[..object.find("endobj").unwrap()].contains("/Type /Catalog"));
}

#[test]
fn test_no_placeholder_survives_finalization() {
    let doc = build_two_page_document();
    let text = String::from_utf8_lossy(doc.as_bytes()).into_owned();
    assert!(!text.contains("00000000 0 R"));
}

#[test]
fn test_patching_never_moves_earlier_bytes() {
    init_logging();
    let mut doc = Document::new().unwrap();
    doc.install_patch_trace(PatchTrace::new());
    doc.begin_page(PageSize::Letter);
    doc.add_text("pinned", 10.0, 10.0, &TextConfig::default())
        .unwrap();
    let page = doc.end_page().unwrap();

    let before_finish = doc.as_bytes().to_vec();
    doc.finish().unwrap();
    let after_finish = doc.as_bytes().to_vec();

    // Finalization only appends and patches 8-character fields in place.
    let trace = doc.take_patch_trace().unwrap();
    assert!(!trace.is_empty());
    let patched: Vec<u64> = trace.records().map(|r| r.offset).collect();
    for (i, &byte) in before_finish.iter().enumerate() {
        let inside_patch = patched
            .iter()
            .any(|&p| (p..p + 8).contains(&(i as u64)));
        if !inside_patch {
            assert_eq!(byte, after_finish[i], "byte {} moved during finalization", i);
        }
    }

    // The page object is still reachable at its pre-finish offset.
    let header = format!("\n{} 0 obj", page.obj.id);
    let xref = parse_xref(&after_finish);
    let (_, offset) = xref.entries[(page.obj.id - 1) as usize];
    assert!(after_finish[offset..].starts_with(header.as_bytes()));
}

#[test]
fn test_annots_and_parent_patched_per_page() {
    let doc = build_two_page_document();
    let text = String::from_utf8_lossy(doc.as_bytes()).into_owned();

    // Two pages, each with a /Parent pointing at the single page tree node.
    let tree_id = {
        let at = text.find("/Type /Pages").unwrap();
        // The object header precedes the dictionary.
        let head = &text[..at];
        let obj_at = head.rfind(" 0 obj").unwrap();
        head[..obj_at].rsplit('\n').next().unwrap().parse::<u64>().unwrap()
    };
    assert_eq!(text.matches(&format!("/Parent {:0>8} 0 R", tree_id)).count(), 2);
    // Both annotation arrays exist and are referenced.
    assert_eq!(text.matches("/Annots ").count(), 2);
}

#[test]
fn test_save_writes_identical_bytes() {
    let doc = build_two_page_document();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");
    doc.save(&path).unwrap();
    let written = std::fs::read(&path).unwrap();
    assert_eq!(written, doc.as_bytes());
}

#[test]
fn test_empty_document_is_well_formed() {
    init_logging();
    let mut doc = Document::new().unwrap();
    doc.finish().unwrap();

    let xref = parse_xref(doc.as_bytes());
    // Four standard fonts, outline root, page tree, catalog.
    assert_eq!(xref.size, 8);
    for (id, offset) in &xref.entries {
        assert!(doc.as_bytes()[*offset..].starts_with(format!("\n{} 0 obj", id).as_bytes()));
    }
    assert!(xref.start < doc.as_bytes().len());
}

#[test]
fn test_table_and_shapes_round_out_a_page() {
    init_logging();
    let mut doc = Document::new().unwrap();
    doc.begin_page(PageSize::A3);
    doc.add_rect(
        Rect::new(50.0, 700.0, 300.0, 200.0),
        &GraphicsConfig::default(),
    )
    .unwrap();
    doc.add_table(
        Rect::new(50.0, 400.0, 300.0, 150.0),
        3,
        4,
        &GraphicsConfig {
            color: Color::rgb(0.2, 0.2, 0.8),
            ..GraphicsConfig::default()
        },
    )
    .unwrap();
    doc.add_cubic_bezier(
        &[
            Point::new(400.0, 100.0),
            Point::new(450.0, 200.0),
            Point::new(500.0, 100.0),
        ],
        &GraphicsConfig::default(),
    )
    .unwrap();
    doc.end_page().unwrap();
    doc.finish().unwrap();

    let xref = parse_xref(doc.as_bytes());
    for (id, offset) in &xref.entries {
        assert!(doc.as_bytes()[*offset..].starts_with(format!("\n{} 0 obj", id).as_bytes()));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// However many pages and text runs a document holds, every xref entry
    /// resolves to its object header and the trailer count matches.
    #[test]
    fn prop_xref_roundtrip(
        runs_per_page in prop::collection::vec(0usize..5, 1..6),
        words in "[a-zA-Z ()\\\\]{1,40}",
    ) {
        init_logging();
        let mut doc = Document::new().unwrap();
        for runs in &runs_per_page {
            doc.begin_page(PageSize::Letter);
            for i in 0..*runs {
                doc.add_text(&words, 50.0, 700.0 - 20.0 * i as f32, &TextConfig::default())
                    .unwrap();
            }
            doc.end_page().unwrap();
        }
        doc.finish().unwrap();

        let bytes = doc.as_bytes();
        let xref = parse_xref(bytes);
        prop_assert_eq!(xref.entries.len() as u64 + 1, xref.size);
        for (id, offset) in &xref.entries {
            let header = format!("\n{} 0 obj", id);
            prop_assert!(bytes[*offset..].starts_with(header.as_bytes()));
        }
    }
}
