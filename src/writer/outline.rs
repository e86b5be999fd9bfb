//! Bookmark (outline) tree.
//!
//! Bookmarks live in one append-only arena; a node's index in the arena is
//! its identity and never changes. Tree linkage is kept as sibling/child
//! indices so finalization can emit every outline item in arena order and
//! compute all cross-references arithmetically: the first item's object id
//! is peeked once, and every link is `peeked_base + target_index`, with no
//! patching needed.

use crate::error::Result;
use crate::object::{ContentObject, ObjectRef};
use crate::writer::document::{escape_literal, Document};
use crate::writer::page::{Page, PageSize};

/// Stable handle to a bookmark in the document's outline tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookmarkId(pub(crate) usize);

/// A node in the outline arena.
#[derive(Debug, Clone)]
pub(crate) struct Bookmark {
    pub title: String,
    pub parent: Option<usize>,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    pub first_child: Option<usize>,
    pub last_child: Option<usize>,
    pub children_count: u32,
    pub depth: u32,
    /// Jump target; falls back to the top of the page when absent.
    pub anchor: Option<ContentObject>,
    pub page: ObjectRef,
    pub page_size: PageSize,
}

impl Document {
    /// Add a bookmark pointing at `page`, optionally anchored to a content
    /// object on it and nested under `parent`.
    ///
    /// A parented bookmark becomes its parent's first child, or is linked
    /// after the parent's current last child. A top-level bookmark is
    /// linked after the most recently added top-level bookmark.
    pub fn add_bookmark(
        &mut self,
        page: &Page,
        anchor: Option<&ContentObject>,
        parent: Option<BookmarkId>,
        title: impl Into<String>,
    ) -> BookmarkId {
        let new_index = self.bookmarks.len();
        let mut prev = None;
        let mut depth = 0;

        match parent {
            Some(BookmarkId(parent_index)) => {
                let parent_node = &mut self.bookmarks[parent_index];
                depth = parent_node.depth + 1;
                if parent_node.children_count == 0 {
                    parent_node.first_child = Some(new_index);
                    parent_node.last_child = Some(new_index);
                } else {
                    let sibling = parent_node.last_child.unwrap();
                    parent_node.last_child = Some(new_index);
                    self.bookmarks[sibling].next = Some(new_index);
                    prev = Some(sibling);
                }
                self.bookmarks[parent_index].children_count += 1;
            }
            None => {
                // Link after the most recent top-level node, if any.
                if let Some(sibling) = (0..new_index).rev().find(|&i| self.bookmarks[i].depth == 0)
                {
                    self.bookmarks[sibling].next = Some(new_index);
                    prev = Some(sibling);
                }
            }
        }

        self.bookmarks.push(Bookmark {
            title: title.into(),
            parent: parent.map(|p| p.0),
            prev,
            next: None,
            first_child: None,
            last_child: None,
            children_count: 0,
            depth,
            anchor: anchor.copied(),
            page: page.obj,
            page_size: page.size,
        });
        BookmarkId(new_index)
    }

    /// Emit every outline item in arena order, then the outline root.
    ///
    /// Emission order equals arena order, so for an item at index `i` the
    /// object id is `base + i` where `base` is the peeked id of the first
    /// item. All tree links are computed from that, never patched.
    pub(crate) fn write_outline(&mut self) -> Result<ObjectRef> {
        let base = self.peek_next_id();
        let nodes = std::mem::take(&mut self.bookmarks);

        let mut first = ObjectRef::NULL;
        let mut last = ObjectRef::NULL;
        for node in &nodes {
            let item = self.begin_object()?;
            if !first.is_valid() {
                first = item;
            }
            last = item;

            self.body
                .append_str(&format!("\n<<\n/Title ({})", escape_literal(&node.title)))?;
            let links = [
                ("Parent", node.parent),
                ("Prev", node.prev),
                ("Next", node.next),
                ("First", node.first_child),
                ("Last", node.last_child),
            ];
            for (tag, target) in links {
                if let Some(index) = target {
                    self.body
                        .append_str(&format!("\n/{} {} 0 R", tag, base + index as u64))?;
                }
            }
            self.body
                .append_str(&format!("\n/Count {}", node.children_count))?;

            let target_y = match &node.anchor {
                Some(anchor) => anchor.bounds.y,
                None => node.page_size.height() + 2.0,
            };
            self.body.append_str(&format!(
                "\n/Dest [{} 0 R /XYZ 0 {:.2} 0]",
                node.page.id, target_y
            ))?;
            self.body.append_str("\n>>")?;
            self.body.append_str("\nendobj")?;
        }

        let root = self.begin_object()?;
        self.body.append_str("\n<</Type /Outlines")?;
        self.body
            .append_str(&format!("\n/Count {}", nodes.len()))?;
        if first.is_valid() {
            self.body
                .append_str(&format!("\n/First {} 0 R", first.id))?;
            self.body.append_str(&format!("\n/Last {} 0 R", last.id))?;
        }
        self.body.append_str(">>")?;
        self.body.append_str("\nendobj")?;

        self.bookmarks = nodes;
        log::debug!("outline root {} 0 R with {} items", root.id, self.bookmarks.len());
        Ok(root)
    }
}
