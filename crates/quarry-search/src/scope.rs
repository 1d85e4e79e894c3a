use std::collections::HashSet;

use quarry_core::DocumentPath;

/// An opaque access-restriction token attached to a document that is visible
/// but discouraged (e.g. reachable only through a non-exported dependency).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRestriction {
    pub rule: String,
}

/// Answer of a scope's membership check for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessCheck {
    Enclosed,
    Excluded,
    Restricted(AccessRestriction),
    /// The scope cannot decide yet; the requestor must accept or reject the
    /// candidate explicitly.
    Undetermined,
}

/// Where a query is allowed to match.
pub trait SearchScope {
    fn encloses(&self, document: &DocumentPath) -> bool;

    /// Richer membership answer; the default derives it from [`encloses`].
    ///
    /// [`encloses`]: SearchScope::encloses
    fn access_check(&self, document: &DocumentPath) -> AccessCheck {
        if self.encloses(document) {
            AccessCheck::Enclosed
        } else {
            AccessCheck::Excluded
        }
    }
}

/// The unrestricted scope: everything the index knows about.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkspaceScope;

impl SearchScope for WorkspaceScope {
    fn encloses(&self, _document: &DocumentPath) -> bool {
        true
    }
}

/// A fixed set of documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentSetScope {
    documents: HashSet<DocumentPath>,
}

impl DocumentSetScope {
    pub fn new(documents: impl IntoIterator<Item = DocumentPath>) -> Self {
        Self {
            documents: documents.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, document: DocumentPath) {
        self.documents.insert(document);
    }
}

impl SearchScope for DocumentSetScope {
    fn encloses(&self, document: &DocumentPath) -> bool {
        self.documents.contains(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_set_scope_excludes_outsiders() {
        let scope = DocumentSetScope::new([DocumentPath::new("a/In.java")]);
        assert!(scope.encloses(&DocumentPath::new("a/In.java")));
        assert!(!scope.encloses(&DocumentPath::new("b/Out.java")));
        assert_eq!(
            scope.access_check(&DocumentPath::new("b/Out.java")),
            AccessCheck::Excluded
        );
    }
}
