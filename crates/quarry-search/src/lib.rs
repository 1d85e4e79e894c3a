//! The matching core of Quarry.
//!
//! A [`SearchPattern`] describes one program entity (field, method, type,
//! variable, package or super-type relationship, with optional qualifiers and
//! wildcard match modes) or a combination of them. [`SearchEngine::execute`]
//! matches it in two phases: a coarse pass over the index keys, then a
//! fine-grained walk of each candidate compilation unit's tree, grading every
//! occurrence on the [`Confidence`] lattice and reporting deduplicated,
//! typed [`MatchRecord`]s to the caller's [`MatchRequestor`].
//!
//! The index, the unit store, the resolution environment and the search
//! scope are capability traits injected per engine; in-flight candidate
//! units participate in resolution through the [`ShadowEnvironment`] without
//! ever being committed anywhere persistent.

mod confidence;
mod engine;
mod error;
mod index_query;
mod locator;
mod pattern;
mod report;
mod scope;
mod shadow;

pub use confidence::Confidence;
pub use engine::{MemoryUnitStore, SearchEngine, SearchStats, UnitStore};
pub use error::SearchError;
pub use pattern::{
    FieldPattern, IndexQuerySpec, MatchSpec, MethodPattern, PackagePattern, SearchFor,
    SearchPattern, SuperFlavor, SuperTypePattern, TypePattern, VariablePattern,
};
pub use report::{
    Access, FieldMatch, Grain, LocalMatch, MatchCore, MatchRecord, MatchRequestor, MethodMatch,
    PackageMatch, RecordCollector, TypeMatch,
};
pub use scope::{AccessCheck, AccessRestriction, DocumentSetScope, SearchScope, WorkspaceScope};
pub use shadow::{PotentialUnit, ShadowEnvironment};

pub use quarry_index::{MatchMode, MatchRule};
