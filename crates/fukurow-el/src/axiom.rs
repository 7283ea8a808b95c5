//! 正規形公理
//!
//! | form       | meaning                         |
//! |------------|---------------------------------|
//! | GCI0       | A ⊑ B                           |
//! | GCI1       | A1 ⊓ .. ⊓ An ⊑ B  (n ≥ 2)       |
//! | GCI2       | A ⊑ ∃r.B                        |
//! | GCI3       | ∃r.A ⊑ B                        |
//! | RI1        | ε ⊑ r                           |
//! | RI2        | r ⊑ s                           |
//! | RI3        | r ∘ s ⊑ t                       |
//! | Nominal    | A ≡ {a}                         |
//! | Range      | range(r) ⊑ A                    |
//! | Functional | r is functional                 |

use crate::entity::{ClassId, Entity, IndividualId, PropertyId};
use crate::ElError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Entities referenced by one or more axioms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub classes: BTreeSet<ClassId>,
    pub properties: BTreeSet<PropertyId>,
    pub individuals: BTreeSet<IndividualId>,
}

impl Signature {
    /// Add every entity of `other`
    pub fn extend(&mut self, other: &Signature) {
        self.classes.extend(other.classes.iter().copied());
        self.properties.extend(other.properties.iter().copied());
        self.individuals.extend(other.individuals.iter().copied());
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.classes
            .iter()
            .map(|&c| Entity::Class(c))
            .chain(self.properties.iter().map(|&p| Entity::Property(p)))
            .chain(self.individuals.iter().map(|&i| Entity::Individual(i)))
    }
}

/// Axiom in one of the normal forms
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NormalizedAxiom {
    Gci0 {
        sub_class: ClassId,
        super_class: ClassId,
    },
    Gci1 {
        /// Sorted and free of duplicates
        operands: Vec<ClassId>,
        super_class: ClassId,
    },
    Gci2 {
        sub_class: ClassId,
        property: PropertyId,
        class_in_super: ClassId,
    },
    Gci3 {
        property: PropertyId,
        class_in_sub: ClassId,
        super_class: ClassId,
    },
    Ri1 {
        property: PropertyId,
    },
    Ri2 {
        sub_property: PropertyId,
        super_property: PropertyId,
    },
    Ri3 {
        left_sub_property: PropertyId,
        right_sub_property: PropertyId,
        super_property: PropertyId,
    },
    Nominal {
        class: ClassId,
        individual: IndividualId,
    },
    Range {
        property: PropertyId,
        range: ClassId,
    },
    Functional {
        property: PropertyId,
    },
}

impl NormalizedAxiom {
    pub fn gci0(sub_class: ClassId, super_class: ClassId) -> Self {
        NormalizedAxiom::Gci0 { sub_class, super_class }
    }

    /// Build a GCI1, sorting and deduplicating the operands
    pub fn gci1<I>(operands: I, super_class: ClassId) -> Result<Self, ElError>
    where
        I: IntoIterator<Item = ClassId>,
    {
        let operands: Vec<ClassId> = operands.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        if operands.len() < 2 {
            return Err(ElError::InvalidAxiom(format!(
                "GCI1 needs at least two distinct operands, got {}",
                operands.len()
            )));
        }
        Ok(NormalizedAxiom::Gci1 { operands, super_class })
    }

    pub fn gci2(sub_class: ClassId, property: PropertyId, class_in_super: ClassId) -> Self {
        NormalizedAxiom::Gci2 { sub_class, property, class_in_super }
    }

    pub fn gci3(property: PropertyId, class_in_sub: ClassId, super_class: ClassId) -> Self {
        NormalizedAxiom::Gci3 { property, class_in_sub, super_class }
    }

    pub fn ri1(property: PropertyId) -> Self {
        NormalizedAxiom::Ri1 { property }
    }

    pub fn ri2(sub_property: PropertyId, super_property: PropertyId) -> Self {
        NormalizedAxiom::Ri2 { sub_property, super_property }
    }

    pub fn ri3(left_sub_property: PropertyId, right_sub_property: PropertyId, super_property: PropertyId) -> Self {
        NormalizedAxiom::Ri3 { left_sub_property, right_sub_property, super_property }
    }

    pub fn nominal(class: ClassId, individual: IndividualId) -> Self {
        NormalizedAxiom::Nominal { class, individual }
    }

    pub fn range(property: PropertyId, range: ClassId) -> Self {
        NormalizedAxiom::Range { property, range }
    }

    pub fn functional(property: PropertyId) -> Self {
        NormalizedAxiom::Functional { property }
    }

    /// Check the shape invariants a hand-built value may violate
    pub fn validate(&self) -> Result<(), ElError> {
        if let NormalizedAxiom::Gci1 { operands, .. } = self {
            let sorted = operands.windows(2).all(|w| w[0] < w[1]);
            if operands.len() < 2 || !sorted {
                return Err(ElError::InvalidAxiom(format!(
                    "GCI1 operands must be at least two sorted distinct classes: {}",
                    self
                )));
            }
        }
        Ok(())
    }

    pub fn is_class_axiom(&self) -> bool {
        matches!(
            self,
            NormalizedAxiom::Gci0 { .. }
                | NormalizedAxiom::Gci1 { .. }
                | NormalizedAxiom::Gci2 { .. }
                | NormalizedAxiom::Gci3 { .. }
                | NormalizedAxiom::Nominal { .. }
        )
    }

    pub fn signature(&self) -> Signature {
        Signature {
            classes: self.classes_in_signature(),
            properties: self.properties_in_signature(),
            individuals: self.individuals_in_signature(),
        }
    }

    pub fn classes_in_signature(&self) -> BTreeSet<ClassId> {
        match self {
            NormalizedAxiom::Gci0 { sub_class, super_class } => [*sub_class, *super_class].into(),
            NormalizedAxiom::Gci1 { operands, super_class } => {
                operands.iter().copied().chain(std::iter::once(*super_class)).collect()
            }
            NormalizedAxiom::Gci2 { sub_class, class_in_super, .. } => [*sub_class, *class_in_super].into(),
            NormalizedAxiom::Gci3 { class_in_sub, super_class, .. } => [*class_in_sub, *super_class].into(),
            NormalizedAxiom::Nominal { class, .. } => [*class].into(),
            NormalizedAxiom::Range { range, .. } => [*range].into(),
            NormalizedAxiom::Ri1 { .. }
            | NormalizedAxiom::Ri2 { .. }
            | NormalizedAxiom::Ri3 { .. }
            | NormalizedAxiom::Functional { .. } => BTreeSet::new(),
        }
    }

    pub fn properties_in_signature(&self) -> BTreeSet<PropertyId> {
        match self {
            NormalizedAxiom::Gci2 { property, .. }
            | NormalizedAxiom::Gci3 { property, .. }
            | NormalizedAxiom::Ri1 { property }
            | NormalizedAxiom::Range { property, .. }
            | NormalizedAxiom::Functional { property } => [*property].into(),
            NormalizedAxiom::Ri2 { sub_property, super_property } => [*sub_property, *super_property].into(),
            NormalizedAxiom::Ri3 { left_sub_property, right_sub_property, super_property } => {
                [*left_sub_property, *right_sub_property, *super_property].into()
            }
            NormalizedAxiom::Gci0 { .. } | NormalizedAxiom::Gci1 { .. } | NormalizedAxiom::Nominal { .. } => {
                BTreeSet::new()
            }
        }
    }

    pub fn individuals_in_signature(&self) -> BTreeSet<IndividualId> {
        match self {
            NormalizedAxiom::Nominal { individual, .. } => [*individual].into(),
            _ => BTreeSet::new(),
        }
    }
}

impl fmt::Display for NormalizedAxiom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedAxiom::Gci0 { sub_class, super_class } => write!(f, "GCI0({} {})", sub_class, super_class),
            NormalizedAxiom::Gci1 { operands, super_class } => {
                let operands: Vec<String> = operands.iter().map(ToString::to_string).collect();
                write!(f, "GCI1(ObjectIntersectionOf({}) {})", operands.join(" "), super_class)
            }
            NormalizedAxiom::Gci2 { sub_class, property, class_in_super } => {
                write!(f, "GCI2({} ObjectSomeValuesFrom({} {}))", sub_class, property, class_in_super)
            }
            NormalizedAxiom::Gci3 { property, class_in_sub, super_class } => {
                write!(f, "GCI3(ObjectSomeValuesFrom({} {}) {})", property, class_in_sub, super_class)
            }
            NormalizedAxiom::Ri1 { property } => write!(f, "RI1({})", property),
            NormalizedAxiom::Ri2 { sub_property, super_property } => {
                write!(f, "RI2({} {})", sub_property, super_property)
            }
            NormalizedAxiom::Ri3 { left_sub_property, right_sub_property, super_property } => write!(
                f,
                "RI3(ObjectPropertyChain({} {}) {})",
                left_sub_property, right_sub_property, super_property
            ),
            NormalizedAxiom::Nominal { class, individual } => {
                write!(f, "Nominal({} ObjectOneOf({}))", class, individual)
            }
            NormalizedAxiom::Range { property, range } => write!(f, "Range({} {})", property, range),
            NormalizedAxiom::Functional { property } => write!(f, "Functional({})", property),
        }
    }
}
