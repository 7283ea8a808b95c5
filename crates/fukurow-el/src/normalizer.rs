//! 正規化
//!
//! Rewrites OWL 2 EL axioms into the normal forms of [`NormalizedAxiom`].
//! The normalizer keeps a worklist of pending axioms and tries each rule of
//! its table in order; the first rule that applies replaces the axiom with
//! its output. An axiom no rule applies to must already have a normal-form
//! shape and is converted directly.

use crate::axiom::NormalizedAxiom;
use crate::entity::{ClassId, EntityManager};
use crate::model::{Axiom, ClassExpression};
use crate::ElError;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// A rewrite rule. Returns the replacement axioms, or `None` when the rule
/// does not apply. The entity manager is used to mint auxiliary entities.
pub type NormalizationRule = fn(&Axiom, &mut EntityManager) -> Option<Vec<Axiom>>;

/// Rewrite rules in application order
const NORMALIZATION_RULES: &[(&str, NormalizationRule)] = &[
    // 個体に関する公理
    ("class-assertion", class_assertion),
    ("property-assertion", property_assertion),
    ("negative-property-assertion", negative_property_assertion),
    ("same-individual", same_individual),
    ("different-individuals", different_individuals),
    // クラス公理
    ("equivalent-classes", equivalent_classes),
    ("disjoint-classes", disjoint_classes),
    // プロパティ公理
    ("sub-property", sub_property),
    ("property-chain", property_chain),
    ("equivalent-properties", equivalent_properties),
    ("inverse-properties", inverse_properties),
    ("property-domain", property_domain),
    ("property-range", property_range),
    ("functional-property", functional_property),
    ("reflexive-property", reflexive_property),
    ("transitive-property", transitive_property),
    // SubClassOf の書き換え
    ("bottom-in-sub-class", bottom_in_sub_class),
    ("trivial-sub-class", trivial_sub_class),
    ("singleton-intersection", singleton_intersection),
    ("nominal-in-super-class", nominal_in_super_class),
    ("nominal-substitution", nominal_substitution),
    ("intersection-in-super-class", intersection_in_super_class),
    ("complex-both-sides", complex_both_sides),
    ("existential-in-super-class", existential_in_super_class),
    ("intersection-in-sub-class", intersection_in_sub_class),
    ("existential-in-sub-class", existential_in_sub_class),
];

/// Normalizer driven by a table of rewrite rules
pub struct Normalizer {
    rules: Vec<(&'static str, NormalizationRule)>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            rules: NORMALIZATION_RULES.to_vec(),
        }
    }

    /// Normalize `axioms`, minting auxiliary entities in `entities`.
    ///
    /// Every entity the axioms mention must already be registered. The
    /// output only mentions entities of the input or entities minted here.
    pub fn normalize<I>(&self, axioms: I, entities: &mut EntityManager) -> Result<BTreeSet<NormalizedAxiom>, ElError>
    where
        I: IntoIterator<Item = Axiom>,
    {
        let mut pending: BTreeSet<Axiom> = axioms.into_iter().collect();
        let mut seen = pending.clone();
        let mut normalized = BTreeSet::new();
        let mut fired: FxHashMap<&'static str, usize> = FxHashMap::default();
        let classes_before = entities.class_count();
        let properties_before = entities.property_count();

        info!("Normalizing {} axioms", pending.len());

        while let Some(axiom) = pending.pop_first() {
            if let Axiom::Normalized(axiom) = axiom {
                axiom.validate()?;
                normalized.insert(axiom);
                continue;
            }

            match self.rewrite(&axiom, entities) {
                Some((name, replacement)) => {
                    *fired.entry(name).or_default() += 1;
                    for axiom in replacement {
                        if seen.insert(axiom.clone()) {
                            pending.insert(axiom);
                        }
                    }
                }
                None => {
                    normalized.insert(to_normal_form(&axiom, entities)?);
                }
            }
        }

        for (name, count) in &fired {
            debug!("Rule {} fired {} times", name, count);
        }
        info!(
            "Normalization produced {} axioms ({} auxiliary classes, {} auxiliary properties)",
            normalized.len(),
            entities.class_count() - classes_before,
            entities.property_count() - properties_before
        );

        Ok(normalized)
    }

    fn rewrite(&self, axiom: &Axiom, entities: &mut EntityManager) -> Option<(&'static str, Vec<Axiom>)> {
        self.rules
            .iter()
            .find_map(|(name, rule)| rule(axiom, entities).map(|replacement| (*name, replacement)))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert an axiom whose shape is already a normal form
fn to_normal_form(axiom: &Axiom, entities: &mut EntityManager) -> Result<NormalizedAxiom, ElError> {
    let unsupported = || ElError::UnsupportedAxiom(format!("{:?}", axiom));

    let Axiom::SubClassOf(sub, sup) = axiom else {
        return Err(unsupported());
    };

    match (sub, sup) {
        (ClassExpression::Class(a), ClassExpression::Class(b)) => Ok(NormalizedAxiom::gci0(*a, *b)),
        (ClassExpression::IntersectionOf(operands), ClassExpression::Class(b)) => {
            let mut literals = Vec::with_capacity(operands.len());
            for operand in operands {
                match operand.as_class() {
                    Some(ClassId::TOP) => {}
                    Some(class) => literals.push(class),
                    None => return Err(unsupported()),
                }
            }
            match literals.as_slice() {
                [] => Ok(NormalizedAxiom::gci0(ClassId::TOP, *b)),
                [single] => Ok(NormalizedAxiom::gci0(*single, *b)),
                _ => NormalizedAxiom::gci1(literals, *b),
            }
        }
        (ClassExpression::Class(a), ClassExpression::SomeValuesFrom { property, filler }) => {
            let b = filler.as_class().ok_or_else(unsupported)?;
            Ok(NormalizedAxiom::gci2(*a, property.resolve(entities), b))
        }
        (ClassExpression::SomeValuesFrom { property, filler }, ClassExpression::Class(b)) => {
            let a = filler.as_class().ok_or_else(unsupported)?;
            Ok(NormalizedAxiom::gci3(property.resolve(entities), a, *b))
        }
        _ => Err(unsupported()),
    }
}

fn normalized(axiom: NormalizedAxiom) -> Axiom {
    Axiom::Normalized(axiom)
}

fn class_assertion(axiom: &Axiom, _: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::ClassAssertion(class, individual) = axiom else {
        return None;
    };
    Some(vec![Axiom::SubClassOf(ClassExpression::one_of(*individual), class.clone())])
}

fn property_assertion(axiom: &Axiom, _: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::PropertyAssertion(property, subject, object) = axiom else {
        return None;
    };
    Some(vec![Axiom::sub_class_of(
        ClassExpression::one_of(*subject),
        ClassExpression::some(*property, ClassExpression::one_of(*object)),
    )])
}

fn negative_property_assertion(axiom: &Axiom, _: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::NegativePropertyAssertion(property, subject, object) = axiom else {
        return None;
    };
    let conjunction = ClassExpression::and([
        ClassExpression::one_of(*subject),
        ClassExpression::some(*property, ClassExpression::one_of(*object)),
    ]);
    Some(vec![Axiom::sub_class_of(conjunction, ClassExpression::bottom())])
}

fn same_individual(axiom: &Axiom, _: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::SameIndividual(individuals) = axiom else {
        return None;
    };
    Some(vec![Axiom::EquivalentClasses(
        individuals.iter().map(|i| ClassExpression::one_of(*i)).collect(),
    )])
}

fn different_individuals(axiom: &Axiom, _: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::DifferentIndividuals(individuals) = axiom else {
        return None;
    };
    Some(vec![Axiom::DisjointClasses(
        individuals.iter().map(|i| ClassExpression::one_of(*i)).collect(),
    )])
}

// C1 ≡ .. ≡ Cn ⟹ Ci ⊑ Cj for every i ≠ j
fn equivalent_classes(axiom: &Axiom, _: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::EquivalentClasses(classes) = axiom else {
        return None;
    };
    let mut out = Vec::new();
    for c in classes {
        for d in classes {
            if c != d {
                out.push(Axiom::SubClassOf(c.clone(), d.clone()));
            }
        }
    }
    Some(out)
}

// Disjoint(C1 .. Cn) ⟹ Ci ⊓ Cj ⊑ ⊥ for every i < j
fn disjoint_classes(axiom: &Axiom, _: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::DisjointClasses(classes) = axiom else {
        return None;
    };
    let classes: Vec<&ClassExpression> = classes.iter().collect();
    let mut out = Vec::new();
    for (i, c) in classes.iter().enumerate() {
        for d in &classes[i + 1..] {
            out.push(Axiom::sub_class_of(
                ClassExpression::and([(*c).clone(), (*d).clone()]),
                ClassExpression::bottom(),
            ));
        }
    }
    Some(out)
}

fn sub_property(axiom: &Axiom, entities: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::SubPropertyOf(sub, sup) = axiom else {
        return None;
    };
    if sub == sup {
        return Some(Vec::new());
    }
    let sub = sub.resolve(entities);
    let sup = sup.resolve(entities);
    Some(vec![normalized(NormalizedAxiom::ri2(sub, sup))])
}

// r1 ∘ .. ∘ rk ⊑ s is folded from the right: r1 ∘ .. ∘ rk-1 ⊑ u, u ∘ rk ⊑ s
fn property_chain(axiom: &Axiom, entities: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::SubPropertyChainOf(chain, sup) = axiom else {
        return None;
    };
    let mut chain: Vec<_> = chain.iter().map(|p| p.resolve(entities)).collect();
    let mut sup = sup.resolve(entities);
    let mut out = Vec::new();

    while chain.len() > 2 {
        let last = chain.pop()?;
        let folded = entities.new_property_id();
        out.push(normalized(NormalizedAxiom::ri3(folded, last, sup)));
        sup = folded;
    }
    match chain.as_slice() {
        [left, right] => out.push(normalized(NormalizedAxiom::ri3(*left, *right, sup))),
        [single] => out.push(normalized(NormalizedAxiom::ri2(*single, sup))),
        _ => out.push(normalized(NormalizedAxiom::ri1(sup))),
    }
    Some(out)
}

fn equivalent_properties(axiom: &Axiom, _: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::EquivalentProperties(properties) = axiom else {
        return None;
    };
    let mut out = Vec::new();
    for r in properties {
        for s in properties {
            if r != s {
                out.push(Axiom::SubPropertyOf(*r, *s));
            }
        }
    }
    Some(out)
}

// s ≡ r⁻ in both directions
fn inverse_properties(axiom: &Axiom, entities: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::InverseProperties(r, s) = axiom else {
        return None;
    };
    let r_inverse = entities.inverse_of(*r);
    let s_inverse = entities.inverse_of(*s);
    Some(vec![
        normalized(NormalizedAxiom::ri2(*s, r_inverse)),
        normalized(NormalizedAxiom::ri2(r_inverse, *s)),
        normalized(NormalizedAxiom::ri2(*r, s_inverse)),
        normalized(NormalizedAxiom::ri2(s_inverse, *r)),
    ])
}

fn property_domain(axiom: &Axiom, _: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::PropertyDomain(property, domain) = axiom else {
        return None;
    };
    Some(vec![Axiom::SubClassOf(
        ClassExpression::some(*property, ClassExpression::top()),
        domain.clone(),
    )])
}

fn property_range(axiom: &Axiom, entities: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::PropertyRange(property, range) = axiom else {
        return None;
    };
    let property = property.resolve(entities);
    if let Some(class) = range.as_class() {
        return Some(vec![normalized(NormalizedAxiom::range(property, class))]);
    }
    let fresh = entities.new_class_id();
    Some(vec![
        normalized(NormalizedAxiom::range(property, fresh)),
        Axiom::sub_class_of(fresh, range.clone()),
    ])
}

fn functional_property(axiom: &Axiom, entities: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::FunctionalProperty(property) = axiom else {
        return None;
    };
    Some(vec![normalized(NormalizedAxiom::functional(property.resolve(entities)))])
}

fn reflexive_property(axiom: &Axiom, entities: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::ReflexiveProperty(property) = axiom else {
        return None;
    };
    Some(vec![normalized(NormalizedAxiom::ri1(property.resolve(entities)))])
}

fn transitive_property(axiom: &Axiom, entities: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::TransitiveProperty(property) = axiom else {
        return None;
    };
    let r = property.resolve(entities);
    Some(vec![normalized(NormalizedAxiom::ri3(r, r, r))])
}

// NR-1.6: a sub class containing ⊥ is empty
fn bottom_in_sub_class(axiom: &Axiom, _: &mut EntityManager) -> Option<Vec<Axiom>> {
    match axiom {
        Axiom::SubClassOf(sub, _) if sub.contains_bottom() => Some(Vec::new()),
        _ => None,
    }
}

fn trivial_sub_class(axiom: &Axiom, _: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::SubClassOf(sub, sup) = axiom else {
        return None;
    };
    let trivial = *sup == ClassExpression::top()
        || sub == sup
        || matches!(sub, ClassExpression::IntersectionOf(operands) if operands.contains(sup));
    trivial.then(Vec::new)
}

fn singleton_intersection(axiom: &Axiom, _: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::SubClassOf(sub, sup) = axiom else {
        return None;
    };
    let unwrap = |expr: &ClassExpression| match expr {
        ClassExpression::IntersectionOf(operands) if operands.len() <= 1 => {
            Some(operands.iter().next().cloned().unwrap_or_else(ClassExpression::top))
        }
        _ => None,
    };
    match (unwrap(sub), unwrap(sup)) {
        (None, None) => None,
        (new_sub, new_sup) => Some(vec![Axiom::SubClassOf(
            new_sub.unwrap_or_else(|| sub.clone()),
            new_sup.unwrap_or_else(|| sup.clone()),
        )]),
    }
}

// NR-4.1: C ⊑ {a} ⟹ C ⊑ A_a, A_a ≡ {a}
fn nominal_in_super_class(axiom: &Axiom, entities: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::SubClassOf(sub, ClassExpression::OneOf(individual)) = axiom else {
        return None;
    };
    let nominal = entities.class_id_for_individual(*individual);
    Some(vec![
        Axiom::sub_class_of(sub.clone(), nominal),
        normalized(NormalizedAxiom::nominal(nominal, *individual)),
    ])
}

fn nominal_substitution(axiom: &Axiom, entities: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::SubClassOf(sub, sup) = axiom else {
        return None;
    };
    if !sub.contains_nominal() && !sup.contains_nominal() {
        return None;
    }
    let mut out = Vec::new();
    let sub = replace_nominals(sub, entities, &mut out);
    let sup = replace_nominals(sup, entities, &mut out);
    out.push(Axiom::SubClassOf(sub, sup));
    Some(out)
}

fn replace_nominals(expr: &ClassExpression, entities: &mut EntityManager, out: &mut Vec<Axiom>) -> ClassExpression {
    match expr {
        ClassExpression::Class(_) => expr.clone(),
        ClassExpression::IntersectionOf(operands) => ClassExpression::IntersectionOf(
            operands.iter().map(|op| replace_nominals(op, entities, out)).collect(),
        ),
        ClassExpression::SomeValuesFrom { property, filler } => ClassExpression::SomeValuesFrom {
            property: *property,
            filler: Box::new(replace_nominals(filler, entities, out)),
        },
        ClassExpression::OneOf(individual) => {
            let nominal = entities.class_id_for_individual(*individual);
            out.push(normalized(NormalizedAxiom::nominal(nominal, *individual)));
            ClassExpression::Class(nominal)
        }
    }
}

// NR-2.2: B ⊑ C ⊓ D ⟹ B ⊑ C, B ⊑ D
fn intersection_in_super_class(axiom: &Axiom, _: &mut EntityManager) -> Option<Vec<Axiom>> {
    match axiom {
        Axiom::SubClassOf(sub, ClassExpression::IntersectionOf(operands)) if sub.is_literal() => Some(
            operands
                .iter()
                .map(|op| Axiom::SubClassOf(sub.clone(), op.clone()))
                .collect(),
        ),
        _ => None,
    }
}

// NR-1.7: Ĉ ⊑ D̂ ⟹ Ĉ ⊑ A, A ⊑ D̂
fn complex_both_sides(axiom: &Axiom, entities: &mut EntityManager) -> Option<Vec<Axiom>> {
    match axiom {
        Axiom::SubClassOf(sub, sup) if !sub.is_literal() && !sup.is_literal() => {
            let fresh = entities.new_class_id();
            Some(vec![
                Axiom::sub_class_of(sub.clone(), fresh),
                Axiom::sub_class_of(fresh, sup.clone()),
            ])
        }
        _ => None,
    }
}

// NR-2.1: B ⊑ ∃r.Ĉ ⟹ B ⊑ ∃r.A, A ⊑ Ĉ
fn existential_in_super_class(axiom: &Axiom, entities: &mut EntityManager) -> Option<Vec<Axiom>> {
    match axiom {
        Axiom::SubClassOf(sub, ClassExpression::SomeValuesFrom { property, filler })
            if sub.is_literal() && !filler.is_literal() =>
        {
            let fresh = entities.new_class_id();
            Some(vec![
                Axiom::SubClassOf(sub.clone(), ClassExpression::some(*property, fresh)),
                Axiom::SubClassOf(ClassExpression::Class(fresh), (**filler).clone()),
            ])
        }
        _ => None,
    }
}

// NR-1.3: C ⊓ Ĉ ⊑ E ⟹ Ĉ ⊑ A, C ⊓ A ⊑ E (nested intersections are flattened first)
fn intersection_in_sub_class(axiom: &Axiom, entities: &mut EntityManager) -> Option<Vec<Axiom>> {
    let Axiom::SubClassOf(ClassExpression::IntersectionOf(operands), sup) = axiom else {
        return None;
    };
    if !sup.is_literal() {
        return None;
    }

    if operands.iter().any(|op| matches!(op, ClassExpression::IntersectionOf(_))) {
        let mut flattened = BTreeSet::new();
        for op in operands {
            match op {
                ClassExpression::IntersectionOf(inner) => flattened.extend(inner.iter().cloned()),
                other => {
                    flattened.insert(other.clone());
                }
            }
        }
        return Some(vec![Axiom::SubClassOf(ClassExpression::IntersectionOf(flattened), sup.clone())]);
    }

    let complex = operands.iter().find(|op| !op.is_literal())?;
    let fresh = entities.new_class_id();
    let mut rest: BTreeSet<ClassExpression> = operands.iter().filter(|op| *op != complex).cloned().collect();
    rest.insert(ClassExpression::Class(fresh));
    Some(vec![
        Axiom::sub_class_of(complex.clone(), fresh),
        Axiom::SubClassOf(ClassExpression::IntersectionOf(rest), sup.clone()),
    ])
}

// NR-1.4: ∃r.Ĉ ⊑ D ⟹ Ĉ ⊑ A, ∃r.A ⊑ D
fn existential_in_sub_class(axiom: &Axiom, entities: &mut EntityManager) -> Option<Vec<Axiom>> {
    match axiom {
        Axiom::SubClassOf(ClassExpression::SomeValuesFrom { property, filler }, sup)
            if sup.is_literal() && !filler.is_literal() =>
        {
            let fresh = entities.new_class_id();
            Some(vec![
                Axiom::SubClassOf((**filler).clone(), ClassExpression::Class(fresh)),
                Axiom::SubClassOf(ClassExpression::some(*property, fresh), sup.clone()),
            ])
        }
        _ => None,
    }
}
