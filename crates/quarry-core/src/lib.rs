//! Core shared types for Quarry.
//!
//! This crate is intentionally small: spans, name types and the cooperative
//! cancellation token that every query-facing API threads through.

mod cancel;
mod names;

pub use cancel::{CancelToken, Cancelled};
pub use names::{Name, PackageName, QualifiedName, TypeName};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A byte-span into a source document.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}..{})", self.start, self.end)
    }
}

/// Workspace-relative path of an indexed document, e.g. `com/example/Foo.java`.
///
/// Stored with `/` separators regardless of host platform so index entries and
/// scope checks compare bit-exactly.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentPath(String);

impl DocumentPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path without its trailing extension, split on `/`.
    ///
    /// `com/example/Foo.java` yields `["com", "example", "Foo"]`; this is the
    /// compound name the document contributes to name resolution.
    pub fn compound_name(&self) -> QualifiedName {
        let trimmed = match self.0.rsplit_once('.') {
            Some((stem, ext)) if !ext.contains('/') => stem,
            _ => self.0.as_str(),
        };
        QualifiedName::from_segments(trimmed.split('/').filter(|s| !s.is_empty()))
    }
}

impl fmt::Debug for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentPath({})", self.0)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_len_saturates() {
        assert_eq!(Span::new(5, 3).len(), 0);
        assert!(Span::new(5, 3).is_empty());
        assert_eq!(Span::new(2, 7).len(), 5);
    }

    #[test]
    fn document_compound_name_strips_extension() {
        let doc = DocumentPath::new("com/example/Foo.java");
        assert_eq!(doc.compound_name().to_dotted(), "com.example.Foo");
    }

    #[test]
    fn document_compound_name_without_extension() {
        let doc = DocumentPath::new("Foo");
        assert_eq!(doc.compound_name().to_dotted(), "Foo");
    }
}
