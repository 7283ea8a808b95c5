use fukurow_el::*;
use std::collections::BTreeSet;

fn classify(entities: &mut EntityManager, axioms: Vec<Axiom>) -> ClassificationResult {
    ElClassifier::new().classify(entities, axioms).unwrap()
}

#[test]
fn test_told_subsumption_chain() {
    let mut entities = EntityManager::new();
    let a = entities.class("A");
    let b = entities.class("B");
    let c = entities.class("C");

    let result = classify(&mut entities, vec![Axiom::sub_class_of(a, b), Axiom::sub_class_of(b, c)]);

    assert_eq!(result.subsumers(a), BTreeSet::from([ClassId::TOP, a, b, c]));
    assert_eq!(result.subsumers(c), BTreeSet::from([ClassId::TOP, c]));
    assert_eq!(result.equivalents(a), BTreeSet::from([a]));
}

#[test]
fn test_disjoint_conjunction_makes_class_unsatisfiable() {
    let mut entities = EntityManager::new();
    let a = entities.class("A");
    let b = entities.class("B");
    let x = entities.class("X");

    let result = classify(
        &mut entities,
        vec![
            Axiom::sub_class_of(ClassExpression::and([a, b]), ClassId::BOTTOM),
            Axiom::sub_class_of(x, a),
            Axiom::sub_class_of(x, b),
        ],
    );

    assert!(!result.is_satisfiable(x));
    assert!(result.is_satisfiable(a));
    assert!(result.is_satisfiable(b));
    assert!(result.is_consistent());
    assert_eq!(result.unsatisfiable_classes(), BTreeSet::from([x]));
}

#[test]
fn test_unsatisfiable_filler_propagates() {
    let mut entities = EntityManager::new();
    let a = entities.class("A");
    let b = entities.class("B");
    let r = entities.property("r");

    let result = classify(
        &mut entities,
        vec![
            Axiom::sub_class_of(a, ClassExpression::some(r, b)),
            Axiom::sub_class_of(b, ClassId::BOTTOM),
        ],
    );

    assert!(!result.is_satisfiable(a));
    assert!(!result.is_satisfiable(b));
    assert!(result.is_consistent());
}

#[test]
fn test_role_composition() {
    let mut entities = EntityManager::new();
    let a = entities.class("A");
    let c = entities.class("C");
    let d = entities.class("D");
    let r = entities.property("r");
    let s = entities.property("s");
    let t = entities.property("t");

    let result = classify(
        &mut entities,
        vec![
            Axiom::property_chain([r, s], t),
            Axiom::sub_class_of(a, ClassExpression::some(r, c)),
            Axiom::sub_class_of(c, ClassExpression::some(s, d)),
        ],
    );

    assert!(result.role_successors(t, a).contains(&d));
    assert!(result.role_successors(r, a).contains(&c));
    assert!(!result.role_successors(t, c).contains(&d));
}

#[test]
fn test_nominal_in_super_class_normalization() {
    let mut entities = EntityManager::new();
    let b = entities.class("B");
    let a = entities.individual("a");

    let normalizer = Normalizer::new();
    let first = normalizer
        .normalize(vec![Axiom::sub_class_of(b, ClassExpression::one_of(a))], &mut entities)
        .unwrap();

    let nominal = entities.class_id_for_individual(a);
    assert_eq!(
        first,
        BTreeSet::from([NormalizedAxiom::nominal(nominal, a), NormalizedAxiom::gci0(b, nominal)])
    );

    let classes_before = entities.class_count();
    let second = normalizer
        .normalize(vec![Axiom::sub_class_of(b, ClassExpression::one_of(a))], &mut entities)
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(entities.class_count(), classes_before);
}

#[test]
fn test_individual_types_and_instances() {
    let mut entities = EntityManager::new();
    let person = entities.class("Person");
    let student = entities.class("Student");
    let alice = entities.individual("alice");
    let bob = entities.individual("bob");

    let result = classify(
        &mut entities,
        vec![
            Axiom::sub_class_of(student, person),
            Axiom::ClassAssertion(student.into(), alice),
            Axiom::ClassAssertion(person.into(), bob),
        ],
    );

    assert_eq!(result.types_of(alice), BTreeSet::from([ClassId::TOP, person, student]));
    assert_eq!(result.instances_of(person), BTreeSet::from([alice, bob]));
    assert_eq!(result.instances_of(student), BTreeSet::from([alice]));
    assert!(result.is_consistent());
}

#[test]
fn test_individual_in_unsatisfiable_class_is_inconsistent() {
    let mut entities = EntityManager::new();
    let a = entities.class("A");
    let b = entities.class("B");
    let x = entities.individual("x");

    let result = classify(
        &mut entities,
        vec![
            Axiom::disjoint_classes([a, b]),
            Axiom::ClassAssertion(a.into(), x),
            Axiom::ClassAssertion(b.into(), x),
        ],
    );

    assert!(!result.is_consistent());
    assert!(result.is_satisfiable(a));
}

#[test]
fn test_property_assertion_with_existential_restriction() {
    let mut entities = EntityManager::new();
    let famous = entities.class("Famous");
    let fan = entities.class("Fan");
    let knows = entities.property("knows");
    let alice = entities.individual("alice");
    let bob = entities.individual("bob");

    let result = classify(
        &mut entities,
        vec![
            Axiom::PropertyAssertion(knows.into(), alice, bob),
            Axiom::ClassAssertion(famous.into(), bob),
            Axiom::sub_class_of(ClassExpression::some(knows, famous), fan),
        ],
    );

    assert!(result.types_of(alice).contains(&fan));
    assert!(!result.types_of(bob).contains(&fan));
}

#[test]
fn test_facts_reached_through_a_shared_nominal() {
    let mut entities = EntityManager::new();
    let k = entities.class("K");
    let b = entities.class("B");
    let l = entities.class("L");
    let m = entities.class("M");
    let r = entities.property("r");
    let s = entities.property("s");
    let kim = entities.individual("kim");
    let a = entities.individual("a");

    // kim's r-successor is a B that is also `a`, so every s-link to `a` reaches a B
    let result = classify(
        &mut entities,
        vec![
            Axiom::ClassAssertion(k.into(), kim),
            Axiom::sub_class_of(
                k,
                ClassExpression::some(r, ClassExpression::and([ClassExpression::from(b), ClassExpression::one_of(a)])),
            ),
            Axiom::sub_class_of(l, ClassExpression::some(s, ClassExpression::one_of(a))),
            Axiom::sub_class_of(ClassExpression::some(s, b), m),
        ],
    );

    assert!(result.types_of(a).contains(&b));
    assert!(result.instances_of(b).contains(&a));
    assert!(result.is_subsumed_by(l, m));
    assert!(!result.is_subsumed_by(k, m));
    assert!(result.is_consistent());
}

#[test]
fn test_domain_restriction() {
    let mut entities = EntityManager::new();
    let parent = entities.class("Parent");
    let a = entities.class("A");
    let b = entities.class("B");
    let has_child = entities.property("hasChild");

    let result = classify(
        &mut entities,
        vec![
            Axiom::PropertyDomain(has_child.into(), parent.into()),
            Axiom::sub_class_of(a, ClassExpression::some(has_child, b)),
        ],
    );

    assert!(result.is_subsumed_by(a, parent));
    assert!(!result.is_subsumed_by(b, parent));
}

#[test]
fn test_transitive_property() {
    let mut entities = EntityManager::new();
    let a = entities.class("A");
    let b = entities.class("B");
    let c = entities.class("C");
    let d = entities.class("D");
    let part_of = entities.property("partOf");

    let result = classify(
        &mut entities,
        vec![
            Axiom::TransitiveProperty(part_of.into()),
            Axiom::sub_class_of(a, ClassExpression::some(part_of, b)),
            Axiom::sub_class_of(b, ClassExpression::some(part_of, c)),
            Axiom::sub_class_of(ClassExpression::some(part_of, c), d),
        ],
    );

    assert!(result.is_subsumed_by(a, d));
    assert!(result.is_subsumed_by(b, d));
    assert!(result.role_successors(part_of, a).contains(&c));
}

#[test]
fn test_reflexive_property() {
    let mut entities = EntityManager::new();
    let a = entities.class("A");
    let b = entities.class("B");
    let r = entities.property("r");

    let result = classify(
        &mut entities,
        vec![
            Axiom::ReflexiveProperty(r.into()),
            Axiom::sub_class_of(ClassExpression::some(r, a), b),
        ],
    );

    assert!(result.is_subsumed_by(a, b));
    assert!(result.role_successors(r, b).contains(&b));
}

#[test]
fn test_inverse_chain_after_saturation() {
    let mut entities = EntityManager::new();
    let a = entities.class("A");
    let c = entities.class("C");
    let d = entities.class("D");
    let e = entities.class("E");
    let r = entities.property("r");
    let s = entities.property("s");
    let t = entities.property("t");

    let axioms = vec![
        Axiom::property_chain([r, s], t),
        Axiom::sub_class_of(d, ClassExpression::some(PropertyExpression::InverseOf(s), c)),
        Axiom::sub_class_of(c, ClassExpression::some(PropertyExpression::InverseOf(r), a)),
        Axiom::sub_class_of(ClassExpression::some(PropertyExpression::InverseOf(t), a), e),
    ];

    let result = classify(&mut entities.clone(), axioms.clone());
    assert!(result.is_subsumed_by(d, e));

    let config = ClassifierConfig { saturate_roles: false, ..ClassifierConfig::default() };
    let result = ElClassifier::with_config(config).classify(&mut entities, axioms).unwrap();
    assert!(!result.is_subsumed_by(d, e));
}

#[test]
fn test_inverse_properties_axiom() {
    let mut entities = EntityManager::new();
    let parent = entities.class("Parent");
    let child = entities.class("Child");
    let has_child = entities.property("hasChild");
    let has_parent = entities.property("hasParent");

    let result = classify(
        &mut entities,
        vec![
            Axiom::InverseProperties(has_child, has_parent),
            Axiom::sub_class_of(child, ClassExpression::some(has_parent, parent)),
            Axiom::sub_class_of(
                ClassExpression::some(PropertyExpression::InverseOf(has_child), parent),
                ClassExpression::some(has_parent, ClassId::TOP),
            ),
        ],
    );

    assert!(result.is_satisfiable(child));
    assert!(result.role_successors(has_parent, child).contains(&parent));
}

#[test]
fn test_sub_property_hierarchy() {
    let mut entities = EntityManager::new();
    let a = entities.class("A");
    let b = entities.class("B");
    let c = entities.class("C");
    let has_daughter = entities.property("hasDaughter");
    let has_child = entities.property("hasChild");
    let has_offspring = entities.property("hasOffspring");

    let result = classify(
        &mut entities,
        vec![
            Axiom::sub_property_of(has_daughter, has_child),
            Axiom::EquivalentProperties(BTreeSet::from([has_child.into(), has_offspring.into()])),
            Axiom::sub_class_of(a, ClassExpression::some(has_daughter, b)),
            Axiom::sub_class_of(ClassExpression::some(has_offspring, ClassId::TOP), c),
        ],
    );

    assert!(result.is_subsumed_by(a, c));
    assert_eq!(result.equivalent_properties(has_child), BTreeSet::from([has_child, has_offspring]));
    assert!(result.super_properties(has_daughter).contains(&has_offspring));
}

#[test]
fn test_equivalent_classes_and_hierarchy() {
    let mut entities = EntityManager::new();
    let animal = entities.class("Animal");
    let pet = entities.class("Pet");
    let dog = entities.class("Dog");
    let domestic_dog = entities.class("DomesticDog");
    let owns = entities.property("owns");

    let result = classify(
        &mut entities,
        vec![
            Axiom::sub_class_of(pet, animal),
            Axiom::sub_class_of(dog, animal),
            Axiom::equivalent_classes([ClassExpression::from(domestic_dog), ClassExpression::and([dog, pet])]),
            Axiom::sub_class_of(ClassExpression::some(owns, ClassId::TOP), ClassId::TOP),
        ],
    );

    let hierarchy = result.hierarchy();
    let parents: BTreeSet<ClassId> = hierarchy
        .direct_super_classes(domestic_dog)
        .iter()
        .map(|node| node.representative())
        .collect();
    assert_eq!(parents, BTreeSet::from([dog, pet]));
    assert_eq!(hierarchy.sub_classes(animal), BTreeSet::from([ClassId::BOTTOM, pet, dog, domestic_dog]));
    assert_eq!(hierarchy.top().unwrap().classes, vec![ClassId::TOP]);
    assert_eq!(hierarchy.equivalents(domestic_dog), &[domestic_dog]);
}

#[test]
fn test_same_and_different_individuals() {
    let mut entities = EntityManager::new();
    let a = entities.class("A");
    let x = entities.individual("x");
    let y = entities.individual("y");
    let z = entities.individual("z");

    let result = classify(
        &mut entities,
        vec![
            Axiom::SameIndividual(BTreeSet::from([x, y])),
            Axiom::ClassAssertion(a.into(), x),
            Axiom::DifferentIndividuals(BTreeSet::from([x, z])),
        ],
    );
    assert!(result.types_of(y).contains(&a));
    assert!(result.is_consistent());

    let mut entities = EntityManager::new();
    let x = entities.individual("x");
    let y = entities.individual("y");
    let result = classify(
        &mut entities,
        vec![
            Axiom::SameIndividual(BTreeSet::from([x, y])),
            Axiom::DifferentIndividuals(BTreeSet::from([x, y])),
        ],
    );
    assert!(!result.is_consistent());
}

#[test]
fn test_result_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClassificationResult>();
}
