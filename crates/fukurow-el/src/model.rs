//! 複合公理モデル
//!
//! The EL++ fragment of OWL 2 as accepted by the normalizer.

use crate::axiom::NormalizedAxiom;
use crate::entity::{ClassId, Entity, EntityManager, IndividualId, PropertyId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Object property expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertyExpression {
    Property(PropertyId),
    InverseOf(PropertyId),
}

impl PropertyExpression {
    /// The named property this expression mentions
    pub fn named_property(&self) -> PropertyId {
        match self {
            PropertyExpression::Property(p) | PropertyExpression::InverseOf(p) => *p,
        }
    }

    /// Resolve to a plain property id, minting the inverse property if needed
    pub fn resolve(&self, entities: &mut EntityManager) -> PropertyId {
        match self {
            PropertyExpression::Property(p) => *p,
            PropertyExpression::InverseOf(p) => entities.inverse_of(*p),
        }
    }
}

impl From<PropertyId> for PropertyExpression {
    fn from(id: PropertyId) -> Self {
        PropertyExpression::Property(id)
    }
}

/// Class expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassExpression {
    Class(ClassId),
    IntersectionOf(BTreeSet<ClassExpression>),
    SomeValuesFrom {
        property: PropertyExpression,
        filler: Box<ClassExpression>,
    },
    /// ObjectOneOf with a single individual
    OneOf(IndividualId),
}

impl ClassExpression {
    pub fn top() -> Self {
        ClassExpression::Class(ClassId::TOP)
    }

    pub fn bottom() -> Self {
        ClassExpression::Class(ClassId::BOTTOM)
    }

    pub fn and<I, C>(operands: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ClassExpression>,
    {
        ClassExpression::IntersectionOf(operands.into_iter().map(Into::into).collect())
    }

    pub fn some(property: impl Into<PropertyExpression>, filler: impl Into<ClassExpression>) -> Self {
        ClassExpression::SomeValuesFrom {
            property: property.into(),
            filler: Box::new(filler.into()),
        }
    }

    pub fn one_of(individual: IndividualId) -> Self {
        ClassExpression::OneOf(individual)
    }

    /// A named class, ⊤ or ⊥
    pub fn is_literal(&self) -> bool {
        matches!(self, ClassExpression::Class(_))
    }

    pub fn as_class(&self) -> Option<ClassId> {
        match self {
            ClassExpression::Class(id) => Some(*id),
            _ => None,
        }
    }

    /// Whether ⊥ occurs in a position that makes the whole expression empty
    pub fn contains_bottom(&self) -> bool {
        match self {
            ClassExpression::Class(id) => *id == ClassId::BOTTOM,
            ClassExpression::IntersectionOf(operands) => operands.iter().any(|op| op.contains_bottom()),
            ClassExpression::SomeValuesFrom { filler, .. } => filler.contains_bottom(),
            ClassExpression::OneOf(_) => false,
        }
    }

    pub fn contains_nominal(&self) -> bool {
        match self {
            ClassExpression::Class(_) => false,
            ClassExpression::IntersectionOf(operands) => operands.iter().any(|op| op.contains_nominal()),
            ClassExpression::SomeValuesFrom { filler, .. } => filler.contains_nominal(),
            ClassExpression::OneOf(_) => true,
        }
    }

    fn collect_entities(&self, out: &mut BTreeSet<Entity>) {
        match self {
            ClassExpression::Class(id) => {
                out.insert(Entity::Class(*id));
            }
            ClassExpression::IntersectionOf(operands) => {
                for op in operands {
                    op.collect_entities(out);
                }
            }
            ClassExpression::SomeValuesFrom { property, filler } => {
                out.insert(Entity::Property(property.named_property()));
                filler.collect_entities(out);
            }
            ClassExpression::OneOf(individual) => {
                out.insert(Entity::Individual(*individual));
            }
        }
    }
}

impl From<ClassId> for ClassExpression {
    fn from(id: ClassId) -> Self {
        ClassExpression::Class(id)
    }
}

/// OWL 2 EL axiom before normalization
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axiom {
    /// SubClassOf(C D)
    SubClassOf(ClassExpression, ClassExpression),
    EquivalentClasses(BTreeSet<ClassExpression>),
    DisjointClasses(BTreeSet<ClassExpression>),
    /// SubObjectPropertyOf(r s)
    SubPropertyOf(PropertyExpression, PropertyExpression),
    /// SubObjectPropertyOf(ObjectPropertyChain(r1 .. rk) s)
    SubPropertyChainOf(Vec<PropertyExpression>, PropertyExpression),
    EquivalentProperties(BTreeSet<PropertyExpression>),
    /// InverseObjectProperties(r s)
    InverseProperties(PropertyId, PropertyId),
    PropertyDomain(PropertyExpression, ClassExpression),
    PropertyRange(PropertyExpression, ClassExpression),
    FunctionalProperty(PropertyExpression),
    ReflexiveProperty(PropertyExpression),
    TransitiveProperty(PropertyExpression),
    /// ClassAssertion(C a)
    ClassAssertion(ClassExpression, IndividualId),
    /// ObjectPropertyAssertion(r a b)
    PropertyAssertion(PropertyExpression, IndividualId, IndividualId),
    NegativePropertyAssertion(PropertyExpression, IndividualId, IndividualId),
    SameIndividual(BTreeSet<IndividualId>),
    DifferentIndividuals(BTreeSet<IndividualId>),
    /// An axiom already in normal form
    Normalized(NormalizedAxiom),
}

impl Axiom {
    pub fn sub_class_of(sub: impl Into<ClassExpression>, sup: impl Into<ClassExpression>) -> Self {
        Axiom::SubClassOf(sub.into(), sup.into())
    }

    pub fn equivalent_classes<I, C>(classes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ClassExpression>,
    {
        Axiom::EquivalentClasses(classes.into_iter().map(Into::into).collect())
    }

    pub fn disjoint_classes<I, C>(classes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ClassExpression>,
    {
        Axiom::DisjointClasses(classes.into_iter().map(Into::into).collect())
    }

    pub fn sub_property_of(sub: impl Into<PropertyExpression>, sup: impl Into<PropertyExpression>) -> Self {
        Axiom::SubPropertyOf(sub.into(), sup.into())
    }

    pub fn property_chain<I, P>(chain: I, sup: impl Into<PropertyExpression>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PropertyExpression>,
    {
        Axiom::SubPropertyChainOf(chain.into_iter().map(Into::into).collect(), sup.into())
    }

    /// Every class, property and individual the axiom mentions
    pub fn entities(&self) -> BTreeSet<Entity> {
        let mut out = BTreeSet::new();
        match self {
            Axiom::SubClassOf(sub, sup) => {
                sub.collect_entities(&mut out);
                sup.collect_entities(&mut out);
            }
            Axiom::EquivalentClasses(classes) | Axiom::DisjointClasses(classes) => {
                for class in classes {
                    class.collect_entities(&mut out);
                }
            }
            Axiom::SubPropertyOf(sub, sup) => {
                out.insert(Entity::Property(sub.named_property()));
                out.insert(Entity::Property(sup.named_property()));
            }
            Axiom::SubPropertyChainOf(chain, sup) => {
                out.extend(chain.iter().map(|p| Entity::Property(p.named_property())));
                out.insert(Entity::Property(sup.named_property()));
            }
            Axiom::EquivalentProperties(properties) => {
                out.extend(properties.iter().map(|p| Entity::Property(p.named_property())));
            }
            Axiom::InverseProperties(r, s) => {
                out.insert(Entity::Property(*r));
                out.insert(Entity::Property(*s));
            }
            Axiom::PropertyDomain(p, class) | Axiom::PropertyRange(p, class) => {
                out.insert(Entity::Property(p.named_property()));
                class.collect_entities(&mut out);
            }
            Axiom::FunctionalProperty(p) | Axiom::ReflexiveProperty(p) | Axiom::TransitiveProperty(p) => {
                out.insert(Entity::Property(p.named_property()));
            }
            Axiom::ClassAssertion(class, individual) => {
                class.collect_entities(&mut out);
                out.insert(Entity::Individual(*individual));
            }
            Axiom::PropertyAssertion(p, a, b) | Axiom::NegativePropertyAssertion(p, a, b) => {
                out.insert(Entity::Property(p.named_property()));
                out.insert(Entity::Individual(*a));
                out.insert(Entity::Individual(*b));
            }
            Axiom::SameIndividual(individuals) | Axiom::DifferentIndividuals(individuals) => {
                out.extend(individuals.iter().map(|i| Entity::Individual(*i)));
            }
            Axiom::Normalized(axiom) => {
                out.extend(axiom.signature().entities());
            }
        }
        out
    }
}

impl From<NormalizedAxiom> for Axiom {
    fn from(axiom: NormalizedAxiom) -> Self {
        Axiom::Normalized(axiom)
    }
}
