//! Property-based tests for the EL classifier
//!
//! Random ontologies over a small fixed signature: ⊥, ⊤ and six named
//! classes (ids 0..8), three named properties (ids 2..5), two individuals.

use fukurow_el::*;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn signature() -> EntityManager {
    let mut entities = EntityManager::new();
    for i in 0..6 {
        entities.class(&format!("C{}", i));
    }
    for i in 0..3 {
        entities.property(&format!("p{}", i));
    }
    for i in 0..2 {
        entities.individual(&format!("i{}", i));
    }
    entities
}

// ===== Strategies =====

fn arb_class() -> impl Strategy<Value = ClassId> {
    (0u32..8).prop_map(ClassId)
}

fn arb_property() -> impl Strategy<Value = PropertyId> {
    (2u32..5).prop_map(PropertyId)
}

fn arb_normalized_axiom() -> impl Strategy<Value = NormalizedAxiom> {
    prop_oneof![
        3 => (arb_class(), arb_class()).prop_map(|(a, b)| NormalizedAxiom::gci0(a, b)),
        1 => (arb_class(), arb_class(), arb_class())
            .prop_filter_map("operands must differ", |(a, b, c)| NormalizedAxiom::gci1([a, b], c).ok()),
        2 => (arb_class(), arb_property(), arb_class()).prop_map(|(a, r, b)| NormalizedAxiom::gci2(a, r, b)),
        2 => (arb_property(), arb_class(), arb_class()).prop_map(|(r, a, b)| NormalizedAxiom::gci3(r, a, b)),
        1 => (arb_property(), arb_property()).prop_map(|(r, s)| NormalizedAxiom::ri2(r, s)),
        1 => (arb_property(), arb_property(), arb_property()).prop_map(|(r, s, t)| NormalizedAxiom::ri3(r, s, t)),
        1 => arb_property().prop_map(NormalizedAxiom::ri1),
    ]
}

fn arb_ontology() -> impl Strategy<Value = BTreeSet<NormalizedAxiom>> {
    prop::collection::btree_set(arb_normalized_axiom(), 0..16)
}

fn arb_class_expression() -> impl Strategy<Value = ClassExpression> {
    let leaf = prop_oneof![
        4 => arb_class().prop_map(ClassExpression::Class),
        1 => (0u32..2).prop_map(|i| ClassExpression::one_of(IndividualId(i))),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::btree_set(inner.clone(), 1..3).prop_map(ClassExpression::IntersectionOf),
            (arb_property(), inner.clone()).prop_map(|(r, filler)| ClassExpression::some(r, filler)),
            (arb_property(), inner).prop_map(|(r, filler)| {
                ClassExpression::some(PropertyExpression::InverseOf(r), filler)
            }),
        ]
    })
}

fn arb_axioms() -> impl Strategy<Value = Vec<Axiom>> {
    prop::collection::vec(
        (arb_class_expression(), arb_class_expression()).prop_map(|(sub, sup)| Axiom::SubClassOf(sub, sup)),
        0..6,
    )
}

/// The OWL axiom a normal form was read from
fn complex_form(axiom: &NormalizedAxiom) -> Axiom {
    match axiom {
        NormalizedAxiom::Gci0 { sub_class, super_class } => Axiom::sub_class_of(*sub_class, *super_class),
        NormalizedAxiom::Gci1 { operands, super_class } => {
            Axiom::sub_class_of(ClassExpression::and(operands.iter().copied()), *super_class)
        }
        NormalizedAxiom::Gci2 { sub_class, property, class_in_super } => {
            Axiom::sub_class_of(*sub_class, ClassExpression::some(*property, *class_in_super))
        }
        NormalizedAxiom::Gci3 { property, class_in_sub, super_class } => {
            Axiom::sub_class_of(ClassExpression::some(*property, *class_in_sub), *super_class)
        }
        NormalizedAxiom::Ri1 { property } => Axiom::ReflexiveProperty((*property).into()),
        NormalizedAxiom::Ri2 { sub_property, super_property } => {
            Axiom::sub_property_of(*sub_property, *super_property)
        }
        NormalizedAxiom::Ri3 { left_sub_property, right_sub_property, super_property } => {
            Axiom::property_chain([*left_sub_property, *right_sub_property], *super_property)
        }
        NormalizedAxiom::Nominal { class, individual } => {
            Axiom::sub_class_of(*class, ClassExpression::one_of(*individual))
        }
        NormalizedAxiom::Range { property, range } => {
            Axiom::PropertyRange((*property).into(), ClassExpression::Class(*range))
        }
        NormalizedAxiom::Functional { property } => Axiom::FunctionalProperty((*property).into()),
    }
}

fn complete(ontology: &ExtendedOntology) -> (CompletionEngine, ClassifierStatus<'_>) {
    let engine = CompletionEngine::new(RuleTable::default(), Arc::new(AtomicBool::new(false)));
    let mut status = ClassifierStatus::new(ontology);
    engine.run(&mut status).unwrap();
    (engine, status)
}

// ===== Property Tests =====

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_normalization_is_idempotent(axioms in arb_axioms()) {
        let mut entities = signature();
        let normalizer = Normalizer::new();

        let once = normalizer.normalize(axioms, &mut entities).unwrap();
        let classes = entities.class_count();
        let twice = normalizer
            .normalize(once.iter().cloned().map(Axiom::Normalized), &mut entities)
            .unwrap();

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(entities.class_count(), classes);

        // The OWL reading of each normal form rewrites back to itself
        let reread = normalizer
            .normalize(once.iter().map(complex_form), &mut entities)
            .unwrap();
        prop_assert_eq!(&once, &reread);
        prop_assert_eq!(entities.class_count(), classes);
    }

    #[test]
    fn prop_normalization_only_uses_known_entities(axioms in arb_axioms()) {
        let mut entities = signature();
        let normalized = Normalizer::new().normalize(axioms, &mut entities).unwrap();
        for axiom in &normalized {
            for class in axiom.classes_in_signature() {
                prop_assert!(entities.contains(class));
            }
            for property in axiom.properties_in_signature() {
                prop_assert!(entities.contains(property));
            }
        }
    }

    #[test]
    fn prop_fixpoint_is_closed(axioms in arb_ontology()) {
        let entities = signature();
        let ontology = ExtendedOntology::build(&axioms, &entities).unwrap();
        let (engine, mut status) = complete(&ontology);

        for entry in status.entries() {
            prop_assert!(!engine.apply(&mut status, entry), "{:?} derived new facts", entry);
        }
    }

    #[test]
    fn prop_facts_only_grow(axioms in arb_ontology()) {
        let entities = signature();
        let ontology = ExtendedOntology::build(&axioms, &entities).unwrap();
        let engine = CompletionEngine::new(RuleTable::default(), Arc::new(AtomicBool::new(false)));
        let mut status = ClassifierStatus::new(&ontology);

        let mut subsumers = status.subsumer_count();
        let mut relations = status.relation_count();
        while let Some(entry) = status.next_entry() {
            engine.apply(&mut status, entry);
            prop_assert!(status.subsumer_count() >= subsumers);
            prop_assert!(status.relation_count() >= relations);
            subsumers = status.subsumer_count();
            relations = status.relation_count();
        }
    }

    #[test]
    fn prop_every_class_subsumes_itself(axioms in arb_ontology()) {
        let mut entities = signature();
        let result = ElClassifier::new().classify_normalized(&mut entities, axioms).unwrap();

        for &class in result.named_classes() {
            prop_assert!(result.is_subsumed_by(class, class));
            prop_assert!(result.is_subsumed_by(class, ClassId::TOP));
            prop_assert!(result.subsumers(class).contains(&class));
        }
    }

    #[test]
    fn prop_told_subsumptions_hold(axioms in arb_ontology()) {
        let mut entities = signature();
        let result = ElClassifier::new().classify_normalized(&mut entities, axioms.clone()).unwrap();

        for axiom in &axioms {
            if let NormalizedAxiom::Gci0 { sub_class, super_class } = axiom {
                prop_assert!(result.is_subsumed_by(*sub_class, *super_class));
            }
        }
    }

    #[test]
    fn prop_bottom_propagates_to_predecessors(axioms in arb_ontology()) {
        let mut entities = signature();
        let result = ElClassifier::new().classify_normalized(&mut entities, axioms.clone()).unwrap();

        for axiom in &axioms {
            if let NormalizedAxiom::Gci2 { sub_class, class_in_super, .. } = axiom {
                if !result.is_satisfiable(*class_in_super) {
                    prop_assert!(!result.is_satisfiable(*sub_class));
                }
            }
        }
    }

    #[test]
    fn prop_role_composition_is_sound(axioms in arb_ontology()) {
        let mut entities = signature();
        let result = ElClassifier::new().classify_normalized(&mut entities, axioms.clone()).unwrap();
        let classes: Vec<ClassId> = entities.classes().collect();

        for axiom in &axioms {
            if let NormalizedAxiom::Ri3 { left_sub_property, right_sub_property, super_property } = axiom {
                for &x in &classes {
                    for y in result.role_successors(*left_sub_property, x) {
                        for z in result.role_successors(*right_sub_property, y) {
                            prop_assert!(result.role_successors(*super_property, x).contains(&z));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn prop_hierarchy_covers_named_classes(axioms in arb_ontology()) {
        let mut entities = signature();
        let result = ElClassifier::new().classify_normalized(&mut entities, axioms).unwrap();
        let hierarchy = result.hierarchy();

        let covered: usize = hierarchy.nodes().iter().map(|node| node.classes.len()).sum();
        prop_assert_eq!(covered, result.named_classes().len());
        for &class in result.named_classes() {
            let node = hierarchy.node_of(class).unwrap();
            for &parent in &node.parents {
                prop_assert!(result.is_subsumed_by(class, hierarchy.nodes()[parent].representative()));
            }
        }
    }
}
