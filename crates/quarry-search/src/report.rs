use std::collections::{BTreeMap, HashSet};

use quarry_core::{DocumentPath, Span, TypeName};
use quarry_hir::{LocalId, MethodId, NodeRef};
use quarry_index::DecodedKey;
use tracing::trace;

use crate::confidence::Confidence;
use crate::scope::AccessCheck;

/// Whether a record names a declaration site or a reference site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grain {
    Declaration,
    Reference,
}

/// How a field or variable reference uses its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    /// Assignment target, plain or compound.
    Write,
}

/// Fields shared by every match record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCore {
    pub document: DocumentPath,
    pub span: Span,
    pub confidence: Confidence,
    pub grain: Grain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMatch {
    pub core: MatchCore,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMatch {
    pub core: MatchCore,
    /// The name as written at the matched node.
    pub name: String,
    pub resolved: Option<TypeName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub core: MatchCore,
    pub name: String,
    pub declaring_type: Option<TypeName>,
    /// Present on reference matches only.
    pub access: Option<Access>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMatch {
    pub core: MatchCore,
    pub selector: String,
    pub declaring_type: Option<TypeName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMatch {
    pub core: MatchCore,
    pub name: String,
    pub access: Option<Access>,
}

/// One reportable result, shaped per entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRecord {
    Package(PackageMatch),
    Type(TypeMatch),
    Field(FieldMatch),
    Method(MethodMatch),
    Local(LocalMatch),
}

impl MatchRecord {
    #[must_use]
    pub fn core(&self) -> &MatchCore {
        match self {
            MatchRecord::Package(m) => &m.core,
            MatchRecord::Type(m) => &m.core,
            MatchRecord::Field(m) => &m.core,
            MatchRecord::Method(m) => &m.core,
            MatchRecord::Local(m) => &m.core,
        }
    }

    fn core_mut(&mut self) -> &mut MatchCore {
        match self {
            MatchRecord::Package(m) => &mut m.core,
            MatchRecord::Type(m) => &mut m.core,
            MatchRecord::Field(m) => &mut m.core,
            MatchRecord::Method(m) => &mut m.core,
            MatchRecord::Local(m) => &mut m.core,
        }
    }

    /// Re-grains a reference-site record as a declaration report; used by
    /// declarations-of queries, which report the resolved target entity.
    pub(crate) fn into_declaration(mut self) -> MatchRecord {
        self.core_mut().grain = Grain::Declaration;
        self
    }
}

/// Identity of a resolved entity, used to bound declarations-of output to one
/// record per distinct target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum EntityKey {
    Package(String),
    Type(TypeName),
    Field {
        declaring_type: TypeName,
        name: String,
    },
    /// Parameter types are the resolver's qualified names; two overloads
    /// collide only when the resolver itself cannot tell them apart, in which
    /// case the first sighting wins.
    Method {
        declaring_type: TypeName,
        selector: String,
        param_types: Vec<Option<TypeName>>,
    },
    Local {
        document: DocumentPath,
        method: MethodId,
        local: LocalId,
    },
}

/// What a located node is, as far as the locator could determine it.
///
/// Resolved fields are populated from bindings when available; records carry
/// them through, and [`EntityKey`]s exist only for resolved entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Entity {
    Package {
        name: String,
    },
    Type {
        name: String,
        resolved: Option<TypeName>,
    },
    Field {
        name: String,
        declaring_type: Option<TypeName>,
    },
    Method {
        selector: String,
        declaring_type: Option<TypeName>,
        param_types: Option<Vec<Option<TypeName>>>,
    },
    Local {
        name: String,
        decl: Option<(MethodId, LocalId)>,
    },
}

impl Entity {
    fn is_resolved(&self) -> bool {
        match self {
            Entity::Package { .. } => true,
            Entity::Type { resolved, .. } => resolved.is_some(),
            Entity::Field { declaring_type, .. } => declaring_type.is_some(),
            Entity::Method { declaring_type, .. } => declaring_type.is_some(),
            Entity::Local { decl, .. } => decl.is_some(),
        }
    }

    fn key(&self, document: &DocumentPath) -> Option<EntityKey> {
        match self {
            Entity::Package { name } => Some(EntityKey::Package(name.clone())),
            Entity::Type { resolved, .. } => resolved.clone().map(EntityKey::Type),
            Entity::Field {
                name,
                declaring_type,
            } => declaring_type.clone().map(|declaring_type| EntityKey::Field {
                declaring_type,
                name: name.clone(),
            }),
            Entity::Method {
                selector,
                declaring_type,
                param_types,
            } => declaring_type.clone().map(|declaring_type| EntityKey::Method {
                declaring_type,
                selector: selector.clone(),
                param_types: param_types.clone().unwrap_or_default(),
            }),
            Entity::Local { decl, .. } => decl.map(|(method, local)| EntityKey::Local {
                document: document.clone(),
                method,
                local,
            }),
        }
    }
}

/// One syntactic occurrence a locator graded.
#[derive(Debug, Clone)]
pub(crate) struct Occurrence {
    pub node: NodeRef,
    pub span: Span,
    pub grain: Grain,
    pub access: Option<Access>,
    pub entity: Entity,
    pub confidence: Confidence,
}

#[derive(Debug)]
struct Slot {
    span: Span,
    entity: Entity,
    access: Option<Access>,
    declaration: Option<Confidence>,
    reference: Option<Confidence>,
}

impl Slot {
    fn final_confidence(&self) -> Confidence {
        // A node can satisfy both grains; the better grading wins.
        self.declaration
            .unwrap_or(Confidence::Impossible)
            .merge(self.reference.unwrap_or(Confidence::Impossible))
    }

    fn grain(&self) -> Grain {
        if self.declaration.is_some() {
            Grain::Declaration
        } else {
            Grain::Reference
        }
    }
}

/// Per-unit candidate set, keyed by node identity.
///
/// Repeated visits to one node merge confidences through the lattice maximum;
/// a later pass can upgrade a grading but never overwrite it downward.
#[derive(Debug, Default)]
pub(crate) struct MatchAccumulator {
    slots: BTreeMap<NodeRef, Slot>,
}

/// A drained candidate: the record to report plus the resolved entity
/// identity (when known) for declarations-of deduplication.
#[derive(Debug)]
pub(crate) struct Reported {
    pub record: MatchRecord,
    pub entity: Option<EntityKey>,
}

impl MatchAccumulator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, occurrence: Occurrence) {
        let slot = self.slots.entry(occurrence.node).or_insert(Slot {
            span: occurrence.span,
            entity: occurrence.entity.clone(),
            access: None,
            declaration: None,
            reference: None,
        });

        let grade = match occurrence.grain {
            Grain::Declaration => &mut slot.declaration,
            Grain::Reference => &mut slot.reference,
        };
        *grade = Some(match *grade {
            Some(existing) => existing.merge(occurrence.confidence),
            None => occurrence.confidence,
        });

        // Prefer resolved entity payloads; a write marking sticks.
        if !slot.entity.is_resolved() && occurrence.entity.is_resolved() {
            slot.entity = occurrence.entity;
        }
        slot.access = match (slot.access, occurrence.access) {
            (Some(Access::Write), _) | (_, Some(Access::Write)) => Some(Access::Write),
            (Some(Access::Read), _) | (_, Some(Access::Read)) => Some(Access::Read),
            (None, None) => None,
        };
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Merges every candidate of `other` into this set, node by node.
    pub(crate) fn absorb(&mut self, other: MatchAccumulator) {
        for (node, slot) in other.slots {
            if let Some(declaration) = slot.declaration {
                self.insert(Occurrence {
                    node,
                    span: slot.span,
                    grain: Grain::Declaration,
                    access: slot.access,
                    entity: slot.entity.clone(),
                    confidence: declaration,
                });
            }
            if let Some(reference) = slot.reference {
                self.insert(Occurrence {
                    node,
                    span: slot.span,
                    grain: Grain::Reference,
                    access: slot.access,
                    entity: slot.entity,
                    confidence: reference,
                });
            }
        }
    }

    /// Keeps only nodes present in both sets, grading each surviving grain by
    /// the lattice meet with the other side's final confidence. Both patterns
    /// of a conjunction must hold on the node.
    pub(crate) fn intersect(left: MatchAccumulator, right: &MatchAccumulator) -> MatchAccumulator {
        let mut out = MatchAccumulator::new();
        for (node, mut slot) in left.slots {
            let Some(other) = right.slots.get(&node) else {
                continue;
            };
            let cap = other.final_confidence();
            slot.declaration = slot.declaration.map(|c| c.both(cap));
            slot.reference = slot.reference.map(|c| c.both(cap));
            out.slots.insert(node, slot);
        }
        out
    }

    /// Converts every candidate above `Impossible` into its typed record, in
    /// node order.
    pub(crate) fn into_reports(self, document: &DocumentPath) -> Vec<Reported> {
        let mut reports = Vec::new();
        for (node, slot) in self.slots {
            let confidence = slot.final_confidence();
            if !confidence.is_reportable() {
                trace!(?node, "candidate refuted");
                continue;
            }
            let core = MatchCore {
                document: document.clone(),
                span: slot.span,
                confidence,
                grain: slot.grain(),
            };
            let entity = slot.entity.key(document);
            let record = match slot.entity {
                Entity::Package { name } => MatchRecord::Package(PackageMatch { core, name }),
                Entity::Type { name, resolved } => {
                    MatchRecord::Type(TypeMatch {
                        core,
                        name,
                        resolved,
                    })
                }
                Entity::Field {
                    name,
                    declaring_type,
                } => MatchRecord::Field(FieldMatch {
                    core,
                    name,
                    declaring_type,
                    access: slot.access,
                }),
                Entity::Method {
                    selector,
                    declaring_type,
                    ..
                } => MatchRecord::Method(MethodMatch {
                    core,
                    selector,
                    declaring_type,
                }),
                Entity::Local { name, .. } => MatchRecord::Local(LocalMatch {
                    core,
                    name,
                    access: slot.access,
                }),
            };
            reports.push(Reported { record, entity });
        }
        reports
    }
}

/// Query-scoped set of already-reported target entities.
#[derive(Debug, Default)]
pub(crate) struct KnownEntities {
    seen: HashSet<EntityKey>,
}

impl KnownEntities {
    /// True on the first sighting of `key`; later sightings are duplicates.
    pub(crate) fn first_sighting(&mut self, key: EntityKey) -> bool {
        self.seen.insert(key)
    }
}

/// The caller's side of a query: consulted per accepted index entry and
/// handed every confirmed record.
pub trait MatchRequestor {
    /// Called once per candidate document surviving the index phase, with the
    /// decoded key that produced it and the scope's access answer. Returning
    /// `false` cancels the entire query.
    fn accept_index_match(
        &mut self,
        document: &DocumentPath,
        key: &DecodedKey,
        access: &AccessCheck,
    ) -> bool {
        let _ = (document, key, access);
        true
    }

    fn report(&mut self, record: MatchRecord);
}

/// Requestor that collects every reported record.
#[derive(Debug, Default)]
pub struct RecordCollector {
    pub records: Vec<MatchRecord>,
}

impl RecordCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchRequestor for RecordCollector {
    fn report(&mut self, record: MatchRecord) {
        self.records.push(record);
    }
}
