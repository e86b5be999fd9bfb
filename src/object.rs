//! Indirect object references and placed content handles.

use crate::geometry::Rect;

/// Reference to an indirect object in the document body.
///
/// `id` 0 is the null sentinel ([`ObjectRef::NULL`]); real objects start at
/// id 1. A reference is immutable once issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object number
    pub id: u64,
    /// Byte offset in the body just after the `<id> 0 obj` header
    pub offset: u64,
}

impl ObjectRef {
    /// The null reference; compares invalid.
    pub const NULL: ObjectRef = ObjectRef { id: 0, offset: 0 };

    /// Whether this reference points at a real object.
    pub fn is_valid(&self) -> bool {
        self.id > 0
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} 0 R", self.id)
    }
}

/// A content object placed on a page, with its bounding rectangle.
///
/// Returned by every content emitter; links, markup annotations and bookmark
/// anchors consume the bounds later.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentObject {
    /// The content stream object
    pub obj: ObjectRef,
    /// Top-left-anchored bounding rectangle of the emitted geometry
    pub bounds: Rect,
}
