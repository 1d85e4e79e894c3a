use std::collections::{HashMap, HashSet};

use quarry_core::{PackageName, QualifiedName};

use crate::descriptors::TypeDescriptor;

/// Capability interface for type lookups during resolution.
///
/// Injected per query; implementations may layer (the search engine wraps the
/// primary environment in a shadow that serves in-flight candidate units
/// first).
pub trait NameEnvironment {
    fn find_type(&self, name: &QualifiedName) -> Option<TypeDescriptor>;

    fn find_type_in(&self, package: &PackageName, simple_name: &str) -> Option<TypeDescriptor> {
        self.find_type(&QualifiedName::from_package(package, simple_name))
    }

    fn is_package(&self, name: &PackageName) -> bool;

    /// Drop any per-query caches. The default does nothing.
    fn cleanup(&self) {}
}

/// A flat table of descriptors; the plain environment used in tests and as
/// the backing layer behind a shadow environment.
#[derive(Debug, Default)]
pub struct TableEnvironment {
    types: HashMap<String, TypeDescriptor>,
    packages: HashSet<String>,
}

impl TableEnvironment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, descriptor: TypeDescriptor) {
        let name = descriptor.name.clone();
        // Register every package prefix so `is_package` answers for
        // intermediate segments too.
        let package = name.package();
        let segments = package.segments();
        for end in 1..=segments.len() {
            self.packages
                .insert(PackageName::from_segments(segments[..end].iter().cloned()).to_dotted());
        }
        self.types.insert(name.as_str().to_string(), descriptor);
    }

    pub fn add_package(&mut self, dotted: &str) {
        self.packages.insert(dotted.to_string());
    }
}

impl NameEnvironment for TableEnvironment {
    fn find_type(&self, name: &QualifiedName) -> Option<TypeDescriptor> {
        self.types.get(&name.to_dotted()).cloned()
    }

    fn is_package(&self, name: &PackageName) -> bool {
        self.packages.contains(&name.to_dotted())
    }
}
