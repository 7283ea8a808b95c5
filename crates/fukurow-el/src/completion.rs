//! 完了規則
//!
//! The completion rules and the worklist loop that applies them until no
//! rule derives anything new. Each rule is triggered by one kind of agenda
//! entry and only ever adds facts.
//!
//! | rule | premises                                              | conclusion        |
//! |------|-------------------------------------------------------|-------------------|
//! | CR-1 | A ∈ S(x), A ⊑ B                                       | B ∈ S(x)          |
//! | CR-2 | A1..An ∈ S(x), A1 ⊓ .. ⊓ An ⊑ B                       | B ∈ S(x)          |
//! | CR-3 | A ∈ S(x), A ⊑ ∃r.B                                    | (x, B) ∈ R(r)     |
//! | CR-4 | (x, y) ∈ R(r), A ∈ S(y), r ⊑* s, ∃s.A ⊑ B             | B ∈ S(x)          |
//! | CR-5 | (x, y) ∈ R(r), r ⊑* s                                 | (x, y) ∈ R(s)     |
//! | CR-6 | (x, y) ∈ R(r), (y, z) ∈ R(s), r ∘ s ⊑ t               | (x, z) ∈ R(t)     |
//! | CR-7 | (x, y) ∈ R(r), ⊥ ∈ S(y)                               | ⊥ ∈ S(x)          |
//! | CR-8 | {a} ∈ S(x) ∩ S(y), x ⇝ y                              | S(y) ⊆ S(x)       |

use crate::entity::{ClassId, PropertyId};
use crate::status::{ClassifierStatus, Entry};
use crate::ElError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Rule fired by a new `subsumer ∈ S(class)` fact
pub type SubsumerRule = fn(&mut ClassifierStatus<'_>, ClassId, ClassId) -> bool;

/// Rule fired by a new `(first, second) ∈ R(property)` fact
pub type RelationRule = fn(&mut ClassifierStatus<'_>, PropertyId, ClassId, ClassId) -> bool;

const SUBSUMER_RULES: &[(&str, SubsumerRule)] = &[
    ("CR-1", cr1_atomic),
    ("CR-2", cr2_conjunction),
    ("CR-3", cr3_existential_in_super),
    ("CR-4", cr4_existential_in_sub_on_subsumer),
    ("CR-7", cr7_bottom_on_subsumer),
    ("CR-8", cr8_nominal_on_subsumer),
];

const RELATION_RULES: &[(&str, RelationRule)] = &[
    ("CR-4", cr4_existential_in_sub_on_relation),
    ("CR-5", cr5_property_hierarchy),
    ("CR-6", cr6_chain_left),
    ("CR-6", cr6_chain_right),
    ("CR-7", cr7_bottom_on_relation),
    ("CR-8", cr8_nominal_on_relation),
];

/// Completion rules grouped by the kind of entry that triggers them
#[derive(Debug, Clone)]
pub struct RuleTable {
    pub on_subsumer: Vec<(&'static str, SubsumerRule)>,
    pub on_relation: Vec<(&'static str, RelationRule)>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            on_subsumer: SUBSUMER_RULES.to_vec(),
            on_relation: RELATION_RULES.to_vec(),
        }
    }
}

/// Worklist scheduler for the completion rules
pub struct CompletionEngine {
    rules: RuleTable,
    cancelled: Arc<AtomicBool>,
    timeout: Option<Duration>,
    progress_interval: usize,
}

impl CompletionEngine {
    pub fn new(rules: RuleTable, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            rules,
            cancelled,
            timeout: None,
            progress_interval: 0,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Log progress every `interval` processed entries; `0` disables it
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Process the agenda until it is empty. Returns the number of entries
    /// processed.
    pub fn run(&self, status: &mut ClassifierStatus<'_>) -> Result<usize, ElError> {
        let started = Instant::now();
        let deadline = self.timeout.map(|timeout| started + timeout);
        let mut productive_subsumer = vec![0usize; self.rules.on_subsumer.len()];
        let mut productive_relation = vec![0usize; self.rules.on_relation.len()];
        let mut processed = 0usize;

        while let Some(entry) = status.next_entry() {
            if self.cancelled.load(Ordering::Relaxed) {
                warn!("Classification cancelled after {} entries", processed);
                return Err(ElError::Cancelled);
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    let elapsed = started.elapsed().as_millis() as u64;
                    warn!("Classification timed out after {} entries", processed);
                    return Err(ElError::Timeout(elapsed));
                }
            }

            match entry {
                Entry::Subsumer { class, subsumer } => {
                    for (count, (_, rule)) in productive_subsumer.iter_mut().zip(&self.rules.on_subsumer) {
                        if rule(status, class, subsumer) {
                            *count += 1;
                        }
                    }
                }
                Entry::Relation { property, first, second } => {
                    for (count, (_, rule)) in productive_relation.iter_mut().zip(&self.rules.on_relation) {
                        if rule(status, property, first, second) {
                            *count += 1;
                        }
                    }
                }
            }

            processed += 1;
            if self.progress_interval > 0 && processed % self.progress_interval == 0 {
                debug!(
                    "Processed {} entries, {} pending, |S| = {}, |R| = {}",
                    processed,
                    status.pending(),
                    status.subsumer_count(),
                    status.relation_count()
                );
            }
        }

        for ((name, _), count) in self.rules.on_subsumer.iter().zip(&productive_subsumer) {
            debug!("{} (subsumer) derived new facts {} times", name, count);
        }
        for ((name, _), count) in self.rules.on_relation.iter().zip(&productive_relation) {
            debug!("{} (relation) derived new facts {} times", name, count);
        }
        Ok(processed)
    }

    /// Apply every rule triggered by `entry` once
    pub fn apply(&self, status: &mut ClassifierStatus<'_>, entry: Entry) -> bool {
        let mut changed = false;
        match entry {
            Entry::Subsumer { class, subsumer } => {
                for (_, rule) in &self.rules.on_subsumer {
                    changed |= rule(status, class, subsumer);
                }
            }
            Entry::Relation { property, first, second } => {
                for (_, rule) in &self.rules.on_relation {
                    changed |= rule(status, property, first, second);
                }
            }
        }
        changed
    }
}

// CR-1: new A ∈ S(x)
fn cr1_atomic(status: &mut ClassifierStatus<'_>, x: ClassId, a: ClassId) -> bool {
    let ontology = status.ontology();
    let mut changed = false;
    for &b in ontology.gci0_by_sub(a) {
        changed |= status.add_subsumer(x, b);
    }
    changed
}

// CR-2: new A ∈ S(x), the other operands already in S(x)
fn cr2_conjunction(status: &mut ClassifierStatus<'_>, x: ClassId, a: ClassId) -> bool {
    let ontology = status.ontology();
    let mut changed = false;
    for conjunction in ontology.gci1_by_operand(a) {
        let satisfied = conjunction
            .operands
            .iter()
            .all(|&operand| operand == a || status.contains_subsumer(x, operand));
        if satisfied {
            changed |= status.add_subsumer(x, conjunction.super_class);
        }
    }
    changed
}

// CR-3: new A ∈ S(x), A ⊑ ∃r.B
fn cr3_existential_in_super(status: &mut ClassifierStatus<'_>, x: ClassId, a: ClassId) -> bool {
    let ontology = status.ontology();
    let mut changed = false;
    for existential in ontology.gci2_by_sub(a) {
        changed |= status.add_relation(existential.property, x, existential.filler);
    }
    changed
}

// CR-4 triggered by new A ∈ S(y): every x with (x, y) ∈ R(r)
fn cr4_existential_in_sub_on_subsumer(status: &mut ClassifierStatus<'_>, y: ClassId, a: ClassId) -> bool {
    let ontology = status.ontology();
    if ontology.gci3_by_class(a).is_empty() {
        return false;
    }

    let mut changed = false;
    let properties: Vec<PropertyId> = status.properties_by_second(y).collect();
    for r in properties {
        let targets: Vec<ClassId> = ontology
            .super_properties(r)
            .iter()
            .flat_map(|&s| ontology.gci3_by(s, a))
            .copied()
            .collect();
        if targets.is_empty() {
            continue;
        }
        let predecessors: Vec<ClassId> = status.predecessors(r, y).collect();
        for x in predecessors {
            for &b in &targets {
                changed |= status.add_subsumer(x, b);
            }
        }
    }
    changed
}

// CR-4 triggered by new (x, y) ∈ R(r): every A ∈ S(y)
fn cr4_existential_in_sub_on_relation(status: &mut ClassifierStatus<'_>, r: PropertyId, x: ClassId, y: ClassId) -> bool {
    let ontology = status.ontology();
    let supers: Vec<PropertyId> = ontology
        .super_properties(r)
        .iter()
        .copied()
        .filter(|&s| ontology.has_gci3_for(s))
        .collect();
    if supers.is_empty() {
        return false;
    }

    let mut changed = false;
    let fillers: Vec<ClassId> = status.subsumers(y).collect();
    for s in supers {
        for &a in &fillers {
            for &b in ontology.gci3_by(s, a) {
                changed |= status.add_subsumer(x, b);
            }
        }
    }
    changed
}

// CR-5: (x, y) ∈ R(r), r ⊑* s
fn cr5_property_hierarchy(status: &mut ClassifierStatus<'_>, r: PropertyId, x: ClassId, y: ClassId) -> bool {
    let ontology = status.ontology();
    let mut changed = false;
    for &s in ontology.super_properties(r) {
        if s != r {
            changed |= status.add_relation(s, x, y);
        }
    }
    changed
}

// CR-6 with the new pair on the left of the chain: (x, y) ∈ R(r), (y, z) ∈ R(s)
fn cr6_chain_left(status: &mut ClassifierStatus<'_>, r: PropertyId, x: ClassId, y: ClassId) -> bool {
    let ontology = status.ontology();
    let mut changed = false;
    for composition in ontology.ri3_by_left(r) {
        let successors: Vec<ClassId> = status.successors(composition.right, y).collect();
        for z in successors {
            changed |= status.add_relation(composition.super_property, x, z);
        }
    }
    changed
}

// CR-6 with the new pair on the right of the chain: (x, y) ∈ R(r), (y, z) ∈ R(s)
fn cr6_chain_right(status: &mut ClassifierStatus<'_>, s: PropertyId, y: ClassId, z: ClassId) -> bool {
    let ontology = status.ontology();
    let mut changed = false;
    for composition in ontology.ri3_by_right(s) {
        let predecessors: Vec<ClassId> = status.predecessors(composition.left, y).collect();
        for x in predecessors {
            changed |= status.add_relation(composition.super_property, x, z);
        }
    }
    changed
}

// CR-7 triggered by new ⊥ ∈ S(y)
fn cr7_bottom_on_subsumer(status: &mut ClassifierStatus<'_>, y: ClassId, a: ClassId) -> bool {
    if a != ClassId::BOTTOM {
        return false;
    }
    let mut changed = false;
    let properties: Vec<PropertyId> = status.properties_by_second(y).collect();
    for r in properties {
        let predecessors: Vec<ClassId> = status.predecessors(r, y).collect();
        for x in predecessors {
            changed |= status.add_subsumer(x, ClassId::BOTTOM);
        }
    }
    changed
}

// CR-7 triggered by new (x, y) ∈ R(r)
fn cr7_bottom_on_relation(status: &mut ClassifierStatus<'_>, _: PropertyId, x: ClassId, y: ClassId) -> bool {
    status.contains_subsumer(y, ClassId::BOTTOM) && status.add_subsumer(x, ClassId::BOTTOM)
}

fn copy_subsumers(status: &mut ClassifierStatus<'_>, from: ClassId, into: ClassId) -> bool {
    let subsumers: Vec<ClassId> = status.subsumers(from).collect();
    let mut changed = false;
    for b in subsumers {
        changed |= status.add_subsumer(into, b);
    }
    changed
}

fn shares_nominal(status: &ClassifierStatus<'_>, x: ClassId, y: ClassId) -> bool {
    status.nominals_of(x).any(|nominal| status.contains_subsumer(y, nominal))
}

// CR-8 triggered by new (x, y) ∈ R(r): pairs that just became reachable
fn cr8_nominal_on_relation(status: &mut ClassifierStatus<'_>, _: PropertyId, x: ClassId, y: ClassId) -> bool {
    if !status.tracks_reachability() {
        return false;
    }
    let update = status.extend_reachability(x, y);
    let mut changed = false;
    for (from, to) in update.pairs {
        if from != to && shares_nominal(status, from, to) {
            changed |= copy_subsumers(status, to, from);
        }
    }
    for to in update.from_nominals {
        let nominals: Vec<ClassId> = status.nominals_of(to).collect();
        for nominal in nominals {
            let members: Vec<ClassId> = status.nominal_members(nominal).filter(|&from| from != to).collect();
            for from in members {
                changed |= copy_subsumers(status, to, from);
            }
        }
    }
    changed
}

// CR-8 triggered by new A ∈ S(y)
fn cr8_nominal_on_subsumer(status: &mut ClassifierStatus<'_>, y: ClassId, a: ClassId) -> bool {
    if !status.tracks_reachability() {
        return false;
    }
    let mut changed = false;

    // y now shares the nominal A with every other member of A
    if status.is_nominal_class(a) {
        let members: Vec<ClassId> = status.nominal_members(a).filter(|&w| w != y).collect();
        for w in members {
            if status.reaches(y, w) {
                changed |= copy_subsumers(status, w, y);
            }
            if status.reaches(w, y) {
                changed |= copy_subsumers(status, y, w);
            }
        }
    }

    // A moves to every x that shares a nominal with y and reaches it
    let nominals: Vec<ClassId> = status.nominals_of(y).collect();
    for nominal in nominals {
        let members: Vec<ClassId> = status.nominal_members(nominal).filter(|&x| x != y).collect();
        for x in members {
            if status.reaches(x, y) {
                changed |= status.add_subsumer(x, a);
            }
        }
    }
    changed
}
