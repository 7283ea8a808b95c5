//! 分類結果
//!
//! Read-only view of a finished classification. Class-level answers only
//! mention named classes; auxiliary classes minted during normalization
//! are filtered out.

use crate::entity::{ClassId, EntityManager, IndividualId, PropertyId};
use crate::hierarchy::ClassHierarchy;
use crate::index::ExtendedOntology;
use crate::status::ClassifierStatus;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use std::time::Duration;

/// Counters collected during one classification run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationStats {
    /// Normal-form axioms after role saturation
    pub normalized_axioms: usize,
    pub classes: usize,
    pub properties: usize,
    /// Facts `A ∈ S(x)`
    pub subsumer_entries: usize,
    /// Facts `(x, y) ∈ R(r)`
    pub relation_entries: usize,
    pub processed_entries: usize,
    pub elapsed: Duration,
}

/// Outcome of a classification run
#[derive(Debug)]
pub struct ClassificationResult {
    subsumers: FxHashMap<ClassId, FxHashSet<ClassId>>,
    relations: FxHashMap<PropertyId, FxHashMap<ClassId, FxHashSet<ClassId>>>,
    named_classes: BTreeSet<ClassId>,
    named_properties: BTreeSet<PropertyId>,
    nominals: BTreeMap<IndividualId, ClassId>,
    super_properties: FxHashMap<PropertyId, Vec<PropertyId>>,
    stats: ClassificationStats,
    hierarchy: OnceLock<ClassHierarchy>,
}

impl ClassificationResult {
    pub(crate) fn new(
        status: ClassifierStatus<'_>,
        ontology: &ExtendedOntology,
        entities: &EntityManager,
        stats: ClassificationStats,
    ) -> Self {
        let (subsumers, relations) = status.into_parts();
        let relations = relations
            .into_iter()
            .map(|(property, index)| (property, index.by_first))
            .collect();

        let named_classes = ontology
            .classes()
            .iter()
            .copied()
            .filter(|&class| !entities.is_auxiliary(class))
            .collect();
        let named_properties = ontology
            .properties()
            .iter()
            .copied()
            .filter(|&property| !entities.is_auxiliary(property))
            .collect();
        let super_properties = ontology
            .properties()
            .iter()
            .map(|&property| (property, ontology.super_properties(property).to_vec()))
            .collect();

        Self {
            subsumers,
            relations,
            named_classes,
            named_properties,
            nominals: ontology.nominals().iter().copied().collect(),
            super_properties,
            stats,
            hierarchy: OnceLock::new(),
        }
    }

    fn raw_subsumers(&self, class: ClassId) -> Option<&FxHashSet<ClassId>> {
        self.subsumers.get(&class)
    }

    /// Named classes of the ontology, ⊥ and ⊤ included
    pub fn named_classes(&self) -> &BTreeSet<ClassId> {
        &self.named_classes
    }

    pub fn is_satisfiable(&self, class: ClassId) -> bool {
        !self
            .raw_subsumers(class)
            .is_some_and(|set| set.contains(&ClassId::BOTTOM))
    }

    /// Whether `sub ⊑ sup` is entailed. Unsatisfiable classes are subsumed
    /// by everything; classes outside the classification by nothing.
    pub fn is_subsumed_by(&self, sub: ClassId, sup: ClassId) -> bool {
        match self.raw_subsumers(sub) {
            Some(set) => set.contains(&ClassId::BOTTOM) || set.contains(&sup),
            None => false,
        }
    }

    /// Named subsumers of `class`, `class` itself included when named
    pub fn subsumers(&self, class: ClassId) -> BTreeSet<ClassId> {
        match self.raw_subsumers(class) {
            Some(set) if set.contains(&ClassId::BOTTOM) => self.named_classes.clone(),
            Some(set) => set.iter().copied().filter(|c| self.named_classes.contains(c)).collect(),
            None => BTreeSet::new(),
        }
    }

    /// Named classes equivalent to `class`
    pub fn equivalents(&self, class: ClassId) -> BTreeSet<ClassId> {
        self.subsumers(class)
            .into_iter()
            .filter(|&candidate| self.is_subsumed_by(candidate, class))
            .collect()
    }

    /// Named classes other than ⊥ that cannot have instances
    pub fn unsatisfiable_classes(&self) -> BTreeSet<ClassId> {
        self.named_classes
            .iter()
            .copied()
            .filter(|&class| class != ClassId::BOTTOM && !self.is_satisfiable(class))
            .collect()
    }

    /// Consistent unless ⊤ or some individual's nominal class is unsatisfiable
    pub fn is_consistent(&self) -> bool {
        self.is_satisfiable(ClassId::TOP) && self.nominals.values().all(|&class| self.is_satisfiable(class))
    }

    /// Classes `y` with `(class, y) ∈ R(property)`, auxiliary classes included
    pub fn role_successors(&self, property: PropertyId, class: ClassId) -> BTreeSet<ClassId> {
        self.relations
            .get(&property)
            .and_then(|by_first| by_first.get(&class))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Named classes the individual belongs to
    pub fn types_of(&self, individual: IndividualId) -> BTreeSet<ClassId> {
        match self.nominals.get(&individual) {
            Some(&nominal) => self.subsumers(nominal),
            None => BTreeSet::from([ClassId::TOP]),
        }
    }

    /// Individuals asserted or inferred to belong to `class`
    pub fn instances_of(&self, class: ClassId) -> BTreeSet<IndividualId> {
        self.nominals
            .iter()
            .filter(|(_, &nominal)| self.is_subsumed_by(nominal, class))
            .map(|(&individual, _)| individual)
            .collect()
    }

    /// Named super properties of `property` through the RI2 closure
    pub fn super_properties(&self, property: PropertyId) -> BTreeSet<PropertyId> {
        self.super_properties
            .get(&property)
            .into_iter()
            .flatten()
            .copied()
            .filter(|p| self.named_properties.contains(p))
            .collect()
    }

    pub fn equivalent_properties(&self, property: PropertyId) -> BTreeSet<PropertyId> {
        self.super_properties(property)
            .into_iter()
            .filter(|&other| {
                self.super_properties
                    .get(&other)
                    .is_some_and(|supers| supers.contains(&property))
            })
            .collect()
    }

    /// Taxonomy over the named classes, built on first use
    pub fn hierarchy(&self) -> &ClassHierarchy {
        self.hierarchy
            .get_or_init(|| ClassHierarchy::build(&self.named_classes, |class| self.subsumers(class)))
    }

    pub fn stats(&self) -> &ClassificationStats {
        &self.stats
    }
}
