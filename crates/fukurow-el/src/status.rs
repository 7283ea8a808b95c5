//! 分類状態
//!
//! The two derived relations of the completion algorithm and the agenda of
//! facts whose consequences are still pending:
//!
//! - `S(x)`: the known subsumers of class `x`
//! - `R(r)`: pairs `(x, y)` meaning `x ⊑ ∃r.y`
//!
//! When the ontology has nominals the status also tracks reachability:
//! `x ⇝ y` holds when `y` can be reached through R-edges starting at `x`
//! or at some nominal class.

use crate::entity::{ClassId, PropertyId};
use crate::index::ExtendedOntology;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// A newly derived fact awaiting rule application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entry {
    /// `subsumer ∈ S(class)`
    Subsumer { class: ClassId, subsumer: ClassId },
    /// `(first, second) ∈ R(property)`
    Relation {
        property: PropertyId,
        first: ClassId,
        second: ClassId,
    },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RelationIndex {
    pub(crate) by_first: FxHashMap<ClassId, FxHashSet<ClassId>>,
    pub(crate) by_second: FxHashMap<ClassId, FxHashSet<ClassId>>,
}

/// Reachability facts produced by one new R-edge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewlyReachable {
    /// Pairs `(x, y)` with `x ⇝ y` through edges starting at `x`
    pub pairs: Vec<(ClassId, ClassId)>,
    /// Classes now reached from a nominal, so `x ⇝ y` for every `x`
    pub from_nominals: Vec<ClassId>,
}

/// Mutable state of one classification run
#[derive(Debug)]
pub struct ClassifierStatus<'a> {
    ontology: &'a ExtendedOntology,
    subsumers: FxHashMap<ClassId, FxHashSet<ClassId>>,
    relations: FxHashMap<PropertyId, RelationIndex>,
    properties_by_first: FxHashMap<ClassId, FxHashSet<PropertyId>>,
    properties_by_second: FxHashMap<ClassId, FxHashSet<PropertyId>>,
    agenda: VecDeque<Entry>,
    subsumer_count: usize,
    relation_count: usize,

    nominal_classes: FxHashSet<ClassId>,
    nominal_members: FxHashMap<ClassId, FxHashSet<ClassId>>,
    reachable: FxHashMap<ClassId, FxHashSet<ClassId>>,
    reached_by: FxHashMap<ClassId, FxHashSet<ClassId>>,
    nominal_reachable: FxHashSet<ClassId>,
}

impl<'a> ClassifierStatus<'a> {
    /// Create the initial state: `S(x) = {x, ⊤}` for every class and
    /// `(x, x) ∈ R(r)` for every reflexive property `r`.
    pub fn new(ontology: &'a ExtendedOntology) -> Self {
        let mut status = Self {
            ontology,
            subsumers: FxHashMap::default(),
            relations: FxHashMap::default(),
            properties_by_first: FxHashMap::default(),
            properties_by_second: FxHashMap::default(),
            agenda: VecDeque::new(),
            subsumer_count: 0,
            relation_count: 0,
            nominal_classes: ontology.nominals().iter().map(|&(_, class)| class).collect(),
            nominal_members: FxHashMap::default(),
            reachable: FxHashMap::default(),
            reached_by: FxHashMap::default(),
            nominal_reachable: FxHashSet::default(),
        };
        // 名目クラス自身はどこからでも到達可能
        status.nominal_reachable = status.nominal_classes.clone();

        for &class in ontology.classes() {
            status.add_subsumer(class, class);
            status.add_subsumer(class, ClassId::TOP);
        }
        for &property in ontology.reflexive_properties() {
            for &class in ontology.classes() {
                status.add_relation(property, class, class);
            }
        }
        status
    }

    /// The indexed ontology. The reference outlives the borrow of `self`,
    /// so rules can keep it while mutating the status.
    pub fn ontology(&self) -> &'a ExtendedOntology {
        self.ontology
    }

    /// Add `subsumer` to `S(class)`, queueing it when new
    pub fn add_subsumer(&mut self, class: ClassId, subsumer: ClassId) -> bool {
        let added = self.subsumers.entry(class).or_default().insert(subsumer);
        if added {
            if self.nominal_classes.contains(&subsumer) {
                self.nominal_members.entry(subsumer).or_default().insert(class);
            }
            self.subsumer_count += 1;
            self.agenda.push_back(Entry::Subsumer { class, subsumer });
        }
        added
    }

    /// Add `(first, second)` to `R(property)`, queueing it when new
    pub fn add_relation(&mut self, property: PropertyId, first: ClassId, second: ClassId) -> bool {
        let index = self.relations.entry(property).or_default();
        let added = index.by_first.entry(first).or_default().insert(second);
        if added {
            index.by_second.entry(second).or_default().insert(first);
            self.properties_by_first.entry(first).or_default().insert(property);
            self.properties_by_second.entry(second).or_default().insert(property);
            self.relation_count += 1;
            self.agenda.push_back(Entry::Relation { property, first, second });
        }
        added
    }

    pub fn contains_subsumer(&self, class: ClassId, subsumer: ClassId) -> bool {
        self.subsumers.get(&class).is_some_and(|set| set.contains(&subsumer))
    }

    pub fn contains_relation(&self, property: PropertyId, first: ClassId, second: ClassId) -> bool {
        self.relations
            .get(&property)
            .and_then(|index| index.by_first.get(&first))
            .is_some_and(|set| set.contains(&second))
    }

    /// `S(class)`
    pub fn subsumers(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.subsumers.get(&class).into_iter().flatten().copied()
    }

    /// `{ y | (first, y) ∈ R(property) }`
    pub fn successors(&self, property: PropertyId, first: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.relations
            .get(&property)
            .and_then(|index| index.by_first.get(&first))
            .into_iter()
            .flatten()
            .copied()
    }

    /// `{ x | (x, second) ∈ R(property) }`
    pub fn predecessors(&self, property: PropertyId, second: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.relations
            .get(&property)
            .and_then(|index| index.by_second.get(&second))
            .into_iter()
            .flatten()
            .copied()
    }

    /// Properties `r` with some pair `(class, y) ∈ R(r)`
    pub fn properties_by_first(&self, class: ClassId) -> impl Iterator<Item = PropertyId> + '_ {
        self.properties_by_first.get(&class).into_iter().flatten().copied()
    }

    /// Properties `r` with some pair `(x, class) ∈ R(r)`
    pub fn properties_by_second(&self, class: ClassId) -> impl Iterator<Item = PropertyId> + '_ {
        self.properties_by_second.get(&class).into_iter().flatten().copied()
    }

    /// Whether reachability is tracked, i.e. the ontology has nominals
    pub fn tracks_reachability(&self) -> bool {
        !self.nominal_classes.is_empty()
    }

    pub fn is_nominal_class(&self, class: ClassId) -> bool {
        self.nominal_classes.contains(&class)
    }

    /// Nominal classes in `S(class)`
    pub fn nominals_of(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.subsumers(class).filter(move |c| self.nominal_classes.contains(c))
    }

    /// Classes `x` with `nominal ∈ S(x)`
    pub fn nominal_members(&self, nominal: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.nominal_members.get(&nominal).into_iter().flatten().copied()
    }

    /// `from ⇝ to`
    pub fn reaches(&self, from: ClassId, to: ClassId) -> bool {
        from == to
            || self.nominal_reachable.contains(&to)
            || self.reachable.get(&from).is_some_and(|set| set.contains(&to))
    }

    /// Record the R-edge `(first, second)` in the reachability index and
    /// return the reachability facts it creates. Does nothing when
    /// reachability is not tracked.
    pub fn extend_reachability(&mut self, first: ClassId, second: ClassId) -> NewlyReachable {
        let mut update = NewlyReachable::default();
        if !self.tracks_reachability() {
            return update;
        }

        if self.nominal_reachable.contains(&first) {
            let mut queue = vec![second];
            while let Some(class) = queue.pop() {
                if self.nominal_reachable.insert(class) {
                    update.from_nominals.push(class);
                    queue.extend(self.all_successors(class));
                }
            }
        }

        let mut roots: Vec<ClassId> = self.reached_by.get(&first).into_iter().flatten().copied().collect();
        roots.push(first);
        for root in roots {
            let mut queue = vec![second];
            while let Some(class) = queue.pop() {
                if self.reachable.entry(root).or_default().insert(class) {
                    self.reached_by.entry(class).or_default().insert(root);
                    update.pairs.push((root, class));
                    queue.extend(self.all_successors(class));
                }
            }
        }
        update
    }

    fn all_successors(&self, class: ClassId) -> Vec<ClassId> {
        self.properties_by_first(class)
            .flat_map(|property| self.successors(property, class))
            .collect()
    }

    /// Take the oldest pending entry
    pub fn next_entry(&mut self) -> Option<Entry> {
        self.agenda.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.agenda.len()
    }

    pub fn subsumer_count(&self) -> usize {
        self.subsumer_count
    }

    pub fn relation_count(&self) -> usize {
        self.relation_count
    }

    /// Every fact derived so far
    pub fn entries(&self) -> Vec<Entry> {
        let mut entries = Vec::with_capacity(self.subsumer_count + self.relation_count);
        for (&class, set) in &self.subsumers {
            entries.extend(set.iter().map(|&subsumer| Entry::Subsumer { class, subsumer }));
        }
        for (&property, index) in &self.relations {
            for (&first, seconds) in &index.by_first {
                entries.extend(seconds.iter().map(|&second| Entry::Relation { property, first, second }));
            }
        }
        entries
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        FxHashMap<ClassId, FxHashSet<ClassId>>,
        FxHashMap<PropertyId, RelationIndex>,
    ) {
        (self.subsumers, self.relations)
    }
}
