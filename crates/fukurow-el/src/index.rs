//! 拡張オントロジー索引
//!
//! Lookup tables over a normalized ontology, keyed the way the completion
//! rules query them. Built once and read-only afterwards. Every lookup
//! returns an empty slice when there is nothing to find.

use crate::axiom::{NormalizedAxiom, Signature};
use crate::entity::{ClassId, Entity, EntityManager, IndividualId, PropertyId};
use crate::ElError;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeSet, VecDeque};
use tracing::info;

/// Left-hand side of a GCI1 with its super class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conjunction {
    pub operands: Vec<ClassId>,
    pub super_class: ClassId,
}

/// Right-hand side of a GCI2, `∃property.filler`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Existential {
    pub property: PropertyId,
    pub filler: ClassId,
}

/// An RI3 axiom, `left ∘ right ⊑ super_property`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Composition {
    pub left: PropertyId,
    pub right: PropertyId,
    pub super_property: PropertyId,
}

fn slice_of<'a, K, V>(map: &'a FxHashMap<K, Vec<V>>, key: &K) -> &'a [V]
where
    K: std::hash::Hash + Eq,
{
    map.get(key).map(Vec::as_slice).unwrap_or(&[])
}

/// Indexed normalized ontology
#[derive(Debug, Clone, Default)]
pub struct ExtendedOntology {
    axioms: Vec<NormalizedAxiom>,
    signatures: Vec<Signature>,
    signature: Signature,
    classes: Vec<ClassId>,
    properties: Vec<PropertyId>,
    individuals: Vec<IndividualId>,

    gci0_by_sub: FxHashMap<ClassId, Vec<ClassId>>,
    gci1_by_operand: FxHashMap<ClassId, Vec<Conjunction>>,
    gci2_by_sub: FxHashMap<ClassId, Vec<Existential>>,
    gci3_by_property: FxHashMap<PropertyId, Vec<(ClassId, ClassId)>>,
    gci3_by_class: FxHashMap<ClassId, Vec<(PropertyId, ClassId)>>,
    gci3_by_property_and_class: FxHashMap<(PropertyId, ClassId), Vec<ClassId>>,

    ri2_by_sub: FxHashMap<PropertyId, Vec<PropertyId>>,
    ri2_by_super: FxHashMap<PropertyId, Vec<PropertyId>>,
    ri3_by_left: FxHashMap<PropertyId, Vec<Composition>>,
    ri3_by_right: FxHashMap<PropertyId, Vec<Composition>>,
    super_properties: FxHashMap<PropertyId, Vec<PropertyId>>,
    sub_properties: FxHashMap<PropertyId, Vec<PropertyId>>,

    nominal_by_individual: FxHashMap<IndividualId, Vec<ClassId>>,
    nominals: Vec<(IndividualId, ClassId)>,
    range_by_property: FxHashMap<PropertyId, Vec<ClassId>>,
    reflexive_properties: Vec<PropertyId>,
    functional_properties: FxHashSet<PropertyId>,
}

impl ExtendedOntology {
    /// Index `axioms`. The class and property sets also cover every entity
    /// registered in `entities`, so classes without axioms still get a node.
    ///
    /// Fails with [`ElError::UnknownEntity`] when an axiom mentions an id the
    /// manager did not issue and with [`ElError::InvalidAxiom`] on a
    /// malformed GCI1.
    pub fn build(axioms: &BTreeSet<NormalizedAxiom>, entities: &EntityManager) -> Result<Self, ElError> {
        let mut ontology = ExtendedOntology::default();
        let mut classes: BTreeSet<ClassId> = entities.classes().collect();
        let mut properties: BTreeSet<PropertyId> = entities.properties().collect();

        for axiom in axioms {
            axiom.validate()?;
            let signature = axiom.signature();
            for &class in &signature.classes {
                check_known(entities, class)?;
            }
            for &property in &signature.properties {
                check_known(entities, property)?;
            }
            for &individual in &signature.individuals {
                check_known(entities, individual)?;
            }
            ontology.insert(axiom);
            ontology.signature.extend(&signature);
            ontology.signatures.push(signature);
        }

        ontology.axioms = axioms.iter().cloned().collect();
        classes.extend(ontology.signature.classes.iter().copied());
        properties.extend(ontology.signature.properties.iter().copied());
        ontology.classes = classes.into_iter().collect();
        ontology.properties = properties.into_iter().collect();
        ontology.individuals = ontology.signature.individuals.iter().copied().collect();
        ontology.reflexive_properties.sort();
        ontology.reflexive_properties.dedup();
        ontology.compute_property_closure();

        info!(
            "Indexed {} axioms over {} classes and {} properties",
            ontology.axioms.len(),
            ontology.classes.len(),
            ontology.properties.len()
        );
        Ok(ontology)
    }

    fn insert(&mut self, axiom: &NormalizedAxiom) {
        match axiom {
            NormalizedAxiom::Gci0 { sub_class, super_class } => {
                self.gci0_by_sub.entry(*sub_class).or_default().push(*super_class);
            }
            NormalizedAxiom::Gci1 { operands, super_class } => {
                let conjunction = Conjunction { operands: operands.clone(), super_class: *super_class };
                for operand in operands {
                    self.gci1_by_operand.entry(*operand).or_default().push(conjunction.clone());
                }
            }
            NormalizedAxiom::Gci2 { sub_class, property, class_in_super } => {
                self.gci2_by_sub
                    .entry(*sub_class)
                    .or_default()
                    .push(Existential { property: *property, filler: *class_in_super });
            }
            NormalizedAxiom::Gci3 { property, class_in_sub, super_class } => {
                self.gci3_by_property.entry(*property).or_default().push((*class_in_sub, *super_class));
                self.gci3_by_class.entry(*class_in_sub).or_default().push((*property, *super_class));
                self.gci3_by_property_and_class
                    .entry((*property, *class_in_sub))
                    .or_default()
                    .push(*super_class);
            }
            NormalizedAxiom::Ri1 { property } => self.reflexive_properties.push(*property),
            NormalizedAxiom::Ri2 { sub_property, super_property } => {
                self.ri2_by_sub.entry(*sub_property).or_default().push(*super_property);
                self.ri2_by_super.entry(*super_property).or_default().push(*sub_property);
            }
            NormalizedAxiom::Ri3 { left_sub_property, right_sub_property, super_property } => {
                let composition = Composition {
                    left: *left_sub_property,
                    right: *right_sub_property,
                    super_property: *super_property,
                };
                self.ri3_by_left.entry(*left_sub_property).or_default().push(composition);
                self.ri3_by_right.entry(*right_sub_property).or_default().push(composition);
            }
            NormalizedAxiom::Nominal { class, individual } => {
                self.nominal_by_individual.entry(*individual).or_default().push(*class);
                self.nominals.push((*individual, *class));
            }
            NormalizedAxiom::Range { property, range } => {
                self.range_by_property.entry(*property).or_default().push(*range);
            }
            NormalizedAxiom::Functional { property } => {
                self.functional_properties.insert(*property);
            }
        }
    }

    // RI2 の反射推移閉包
    fn compute_property_closure(&mut self) {
        for &property in &self.properties {
            let supers = reachable(property, &self.ri2_by_sub);
            let subs = reachable(property, &self.ri2_by_super);
            self.super_properties.insert(property, supers);
            self.sub_properties.insert(property, subs);
        }
    }

    pub fn axioms(&self) -> &[NormalizedAxiom] {
        &self.axioms
    }

    /// Signatures of [`axioms`](Self::axioms), position for position
    pub fn axiom_signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Every entity mentioned by some axiom
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Every class of the ontology in ascending id order, ⊥ and ⊤ included
    pub fn classes(&self) -> &[ClassId] {
        &self.classes
    }

    pub fn properties(&self) -> &[PropertyId] {
        &self.properties
    }

    pub fn individuals(&self) -> &[IndividualId] {
        &self.individuals
    }

    /// Super classes `B` of the GCI0 axioms `sub ⊑ B`
    pub fn gci0_by_sub(&self, sub: ClassId) -> &[ClassId] {
        slice_of(&self.gci0_by_sub, &sub)
    }

    /// GCI1 axioms with `operand` among their operands
    pub fn gci1_by_operand(&self, operand: ClassId) -> &[Conjunction] {
        slice_of(&self.gci1_by_operand, &operand)
    }

    /// Existentials `∃r.B` of the GCI2 axioms `sub ⊑ ∃r.B`
    pub fn gci2_by_sub(&self, sub: ClassId) -> &[Existential] {
        slice_of(&self.gci2_by_sub, &sub)
    }

    /// `(A, B)` pairs of the GCI3 axioms `∃property.A ⊑ B`
    pub fn gci3_by_property(&self, property: PropertyId) -> &[(ClassId, ClassId)] {
        slice_of(&self.gci3_by_property, &property)
    }

    /// `(r, B)` pairs of the GCI3 axioms `∃r.class ⊑ B`
    pub fn gci3_by_class(&self, class: ClassId) -> &[(PropertyId, ClassId)] {
        slice_of(&self.gci3_by_class, &class)
    }

    /// Super classes `B` of the GCI3 axioms `∃property.class ⊑ B`
    pub fn gci3_by(&self, property: PropertyId, class: ClassId) -> &[ClassId] {
        slice_of(&self.gci3_by_property_and_class, &(property, class))
    }

    pub fn has_gci3_for(&self, property: PropertyId) -> bool {
        self.gci3_by_property.contains_key(&property)
    }

    /// Direct super properties from RI2 axioms
    pub fn ri2_by_sub(&self, sub: PropertyId) -> &[PropertyId] {
        slice_of(&self.ri2_by_sub, &sub)
    }

    /// Direct sub properties from RI2 axioms
    pub fn ri2_by_super(&self, sup: PropertyId) -> &[PropertyId] {
        slice_of(&self.ri2_by_super, &sup)
    }

    /// RI3 axioms with `property` on the left of the chain
    pub fn ri3_by_left(&self, property: PropertyId) -> &[Composition] {
        slice_of(&self.ri3_by_left, &property)
    }

    /// RI3 axioms with `property` on the right of the chain
    pub fn ri3_by_right(&self, property: PropertyId) -> &[Composition] {
        slice_of(&self.ri3_by_right, &property)
    }

    /// Reflexive-transitive RI2 closure upwards, `property` included
    pub fn super_properties(&self, property: PropertyId) -> &[PropertyId] {
        slice_of(&self.super_properties, &property)
    }

    /// Reflexive-transitive RI2 closure downwards, `property` included
    pub fn sub_properties(&self, property: PropertyId) -> &[PropertyId] {
        slice_of(&self.sub_properties, &property)
    }

    pub fn nominal_by_individual(&self, individual: IndividualId) -> &[ClassId] {
        slice_of(&self.nominal_by_individual, &individual)
    }

    /// All `(individual, nominal class)` pairs
    pub fn nominals(&self) -> &[(IndividualId, ClassId)] {
        &self.nominals
    }

    pub fn range_by_property(&self, property: PropertyId) -> &[ClassId] {
        slice_of(&self.range_by_property, &property)
    }

    pub fn reflexive_properties(&self) -> &[PropertyId] {
        &self.reflexive_properties
    }

    pub fn is_functional(&self, property: PropertyId) -> bool {
        self.functional_properties.contains(&property)
    }

    pub fn functional_properties(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.functional_properties.iter().copied()
    }
}

fn check_known(entities: &EntityManager, entity: impl Into<Entity>) -> Result<(), ElError> {
    let entity = entity.into();
    if entities.contains(entity) {
        Ok(())
    } else {
        Err(ElError::UnknownEntity(entity))
    }
}

fn reachable(start: PropertyId, edges: &FxHashMap<PropertyId, Vec<PropertyId>>) -> Vec<PropertyId> {
    let mut visited = FxHashSet::default();
    let mut order = Vec::new();
    let mut queue = VecDeque::from([start]);
    visited.insert(start);

    while let Some(property) = queue.pop_front() {
        order.push(property);
        for &next in slice_of(edges, &property) {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(axioms: Vec<NormalizedAxiom>, entities: &EntityManager) -> ExtendedOntology {
        ExtendedOntology::build(&axioms.into_iter().collect(), entities).unwrap()
    }

    #[test]
    fn test_lookups_by_key() {
        let mut entities = EntityManager::new();
        let a = entities.class("A");
        let b = entities.class("B");
        let c = entities.class("C");
        let r = entities.property("r");

        let ontology = build(
            vec![
                NormalizedAxiom::gci0(a, b),
                NormalizedAxiom::gci1([a, b], c).unwrap(),
                NormalizedAxiom::gci2(a, r, c),
                NormalizedAxiom::gci3(r, c, b),
            ],
            &entities,
        );

        assert_eq!(ontology.gci0_by_sub(a), &[b]);
        assert_eq!(ontology.gci1_by_operand(b).len(), 1);
        assert_eq!(ontology.gci1_by_operand(b)[0].super_class, c);
        assert_eq!(ontology.gci2_by_sub(a), &[Existential { property: r, filler: c }]);
        assert_eq!(ontology.gci3_by(r, c), &[b]);
        assert_eq!(ontology.gci3_by_class(c), &[(r, b)]);
        assert!(ontology.has_gci3_for(r));
    }

    #[test]
    fn test_signatures_are_cached_per_axiom() {
        let mut entities = EntityManager::new();
        let a = entities.class("A");
        let b = entities.class("B");
        let r = entities.property("r");
        let alice = entities.individual("alice");
        let nominal = entities.class_id_for_individual(alice);

        let ontology = build(
            vec![NormalizedAxiom::gci2(a, r, b), NormalizedAxiom::nominal(nominal, alice)],
            &entities,
        );

        assert_eq!(ontology.axiom_signatures().len(), ontology.axioms().len());
        for (axiom, signature) in ontology.axioms().iter().zip(ontology.axiom_signatures()) {
            assert_eq!(&axiom.signature(), signature);
        }
        assert_eq!(ontology.signature().classes, BTreeSet::from([a, b, nominal]));
        assert_eq!(ontology.signature().properties, BTreeSet::from([r]));
        assert_eq!(ontology.individuals(), &[alice]);
    }

    #[test]
    fn test_missing_keys_give_empty_slices() {
        let mut entities = EntityManager::new();
        let a = entities.class("A");
        let r = entities.property("r");
        let ontology = build(vec![], &entities);

        assert!(ontology.gci0_by_sub(a).is_empty());
        assert!(ontology.gci2_by_sub(a).is_empty());
        assert!(ontology.gci3_by(r, a).is_empty());
        assert!(ontology.ri3_by_left(r).is_empty());
        assert_eq!(ontology.super_properties(r), &[r]);
        assert_eq!(ontology.classes(), &[ClassId::BOTTOM, ClassId::TOP, a]);
    }

    #[test]
    fn test_property_closure() {
        let mut entities = EntityManager::new();
        let r = entities.property("r");
        let s = entities.property("s");
        let t = entities.property("t");

        let ontology = build(vec![NormalizedAxiom::ri2(r, s), NormalizedAxiom::ri2(s, t)], &entities);

        let supers: BTreeSet<_> = ontology.super_properties(r).iter().copied().collect();
        assert_eq!(supers, BTreeSet::from([r, s, t]));
        let subs: BTreeSet<_> = ontology.sub_properties(t).iter().copied().collect();
        assert_eq!(subs, BTreeSet::from([r, s, t]));
        assert_eq!(ontology.super_properties(t), &[t]);
    }

    #[test]
    fn test_property_closure_with_cycle() {
        let mut entities = EntityManager::new();
        let r = entities.property("r");
        let s = entities.property("s");

        let ontology = build(vec![NormalizedAxiom::ri2(r, s), NormalizedAxiom::ri2(s, r)], &entities);
        assert_eq!(ontology.super_properties(r).len(), 2);
        assert_eq!(ontology.sub_properties(r).len(), 2);
    }

    #[test]
    fn test_role_and_nominal_axioms() {
        let mut entities = EntityManager::new();
        let r = entities.property("r");
        let s = entities.property("s");
        let a = entities.class("A");
        let x = entities.individual("x");
        let nominal = entities.class_id_for_individual(x);

        let ontology = build(
            vec![
                NormalizedAxiom::ri1(r),
                NormalizedAxiom::ri3(r, s, s),
                NormalizedAxiom::nominal(nominal, x),
                NormalizedAxiom::range(r, a),
                NormalizedAxiom::functional(s),
            ],
            &entities,
        );

        assert_eq!(ontology.reflexive_properties(), &[r]);
        assert_eq!(ontology.ri3_by_left(r)[0].super_property, s);
        assert_eq!(ontology.ri3_by_right(s)[0].left, r);
        assert_eq!(ontology.nominal_by_individual(x), &[nominal]);
        assert_eq!(ontology.nominals(), &[(x, nominal)]);
        assert_eq!(ontology.range_by_property(r), &[a]);
        assert!(ontology.is_functional(s));
        assert_eq!(ontology.individuals(), &[x]);
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        let entities = EntityManager::new();
        let axioms = BTreeSet::from([NormalizedAxiom::gci0(ClassId(40), ClassId::TOP)]);
        let result = ExtendedOntology::build(&axioms, &entities);
        assert_eq!(result.unwrap_err(), ElError::UnknownEntity(Entity::Class(ClassId(40))));
    }
}
