//! Index boundary for Quarry.
//!
//! The matching core only ever sees the persistent index through
//! [`QueryIndex`]: a scoped open/close pair and a query-by-key operation over
//! typed categories. This crate also owns the bit-exact key codecs shared by
//! the indexer (encode side) and the pattern model (decode side), an
//! in-memory implementation used in tests and embedded setups, and a JSON
//! snapshot persistence for it.

mod error;
mod indexer;
mod keys;
mod memory;
mod persistence;
mod rules;

pub use error::{IndexError, Result};
pub use indexer::index_unit;
pub use keys::{
    decode_key, DecodedKey, IndexCategory, MethodKey, PackageKey, SimpleKey, SuperRefKey,
    TypeDeclKey, SEPARATOR,
};
pub use memory::MemoryIndex;
pub use persistence::{load_index, save_index};
pub use rules::{MatchMode, MatchRule};

use quarry_core::DocumentPath;

/// One raw index posting: an encoded key and the documents that contain it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub category: IndexCategory,
    pub key: Vec<u8>,
    pub documents: Vec<DocumentPath>,
}

/// Read interface of the persistent index.
///
/// Implementations must tolerate concurrent readers; the matching core never
/// writes during a query. `open_for_query`/`close_after_query` bracket every
/// query pass — callers should go through [`IndexReader`] so the close runs on
/// all exit paths.
pub trait QueryIndex {
    fn open_for_query(&self) -> Result<()>;
    fn close_after_query(&self);

    /// All entries in `categories` whose key matches `key` under `rule`.
    fn query(
        &self,
        categories: &[IndexCategory],
        key: &[u8],
        rule: MatchRule,
    ) -> Result<Vec<IndexEntry>>;
}

/// Scoped query handle; `Drop` runs `close_after_query` exactly once, on
/// success, failure and cancellation paths alike.
pub struct IndexReader<'a> {
    index: &'a dyn QueryIndex,
}

impl<'a> IndexReader<'a> {
    pub fn open(index: &'a dyn QueryIndex) -> Result<Self> {
        index.open_for_query()?;
        Ok(Self { index })
    }

    pub fn query(
        &self,
        categories: &[IndexCategory],
        key: &[u8],
        rule: MatchRule,
    ) -> Result<Vec<IndexEntry>> {
        self.index.query(categories, key, rule)
    }
}

impl Drop for IndexReader<'_> {
    fn drop(&mut self) {
        self.index.close_after_query();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_closes_on_drop() {
        let index = MemoryIndex::new();
        {
            let _reader = IndexReader::open(&index).expect("open");
            assert_eq!(index.open_count(), 1);
            assert_eq!(index.close_count(), 0);
        }
        assert_eq!(index.close_count(), 1);
    }

    #[test]
    fn reader_closes_even_when_a_query_fails_midway() {
        // A failed lookup propagates, but the handle is still released by the
        // guard going out of scope.
        let index = MemoryIndex::new();
        let result: Result<()> = (|| {
            let reader = IndexReader::open(&index)?;
            let _ = reader.query(&[IndexCategory::FieldDecl], b"x", MatchRule::exact())?;
            Err(IndexError::IncompatibleSchemaVersion {
                expected: 1,
                found: 2,
            })
        })();
        assert!(result.is_err());
        assert_eq!(index.open_count(), 1);
        assert_eq!(index.close_count(), 1);
    }
}
