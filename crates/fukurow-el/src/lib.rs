//! OWL 2 EL 分類エンジン
//!
//! このクレートは EL++ の完全な分類パイプラインを提供します:
//! - 複合公理の正規化 (normal forms GCI0-3, RI1-3, Nominal, Range, Functional)
//! - 逆ロールを含むロール公理の飽和
//! - 完了規則 CR1-CR8 による不動点計算
//! - サブサンプション・同値・充足可能性・整合性の問い合わせ
//!
//! ```no_run
//! use fukurow_el::{Axiom, ClassExpression, ElClassifier, EntityManager};
//!
//! let mut entities = EntityManager::new();
//! let cat = entities.class("Cat");
//! let animal = entities.class("Animal");
//! let axioms = vec![Axiom::sub_class_of(cat, animal)];
//!
//! let result = ElClassifier::new().classify(&mut entities, axioms).unwrap();
//! assert!(result.subsumers(cat).contains(&animal));
//! # let _ = ClassExpression::top();
//! ```

pub mod axiom;
pub mod classifier;
pub mod completion;
pub mod entity;
pub mod hierarchy;
pub mod index;
pub mod model;
pub mod normalizer;
pub mod result;
pub mod saturation;
pub mod status;

pub use axiom::{NormalizedAxiom, Signature};
pub use classifier::{ClassifierConfig, ElClassifier};
pub use completion::{CompletionEngine, RuleTable};
pub use entity::{ClassId, Entity, EntityManager, IndividualId, PropertyId};
pub use hierarchy::{ClassHierarchy, HierarchyNode};
pub use index::ExtendedOntology;
pub use model::{Axiom, ClassExpression, PropertyExpression};
pub use normalizer::Normalizer;
pub use result::{ClassificationResult, ClassificationStats};
pub use saturation::RoleSaturation;
pub use status::{ClassifierStatus, Entry, NewlyReachable};

// Error types
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElError {
    #[error("Unknown entity: {0}")]
    UnknownEntity(Entity),

    #[error("Invalid axiom: {0}")]
    InvalidAxiom(String),

    #[error("Unsupported axiom: {0}")]
    UnsupportedAxiom(String),

    #[error("Classification cancelled")]
    Cancelled,

    #[error("Classification timed out after {0} ms")]
    Timeout(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ElError::UnknownEntity(Entity::Class(ClassId(42)));
        assert_eq!(err.to_string(), "Unknown entity: class 42");

        let err = ElError::InvalidAxiom("GCI1 needs two operands".to_string());
        assert!(err.to_string().starts_with("Invalid axiom"));

        assert_eq!(ElError::Timeout(250).to_string(), "Classification timed out after 250 ms");
    }

    #[test]
    fn test_end_to_end_smoke() {
        let mut entities = EntityManager::new();
        let a = entities.class("A");
        let b = entities.class("B");
        let c = entities.class("C");

        let axioms = vec![Axiom::sub_class_of(a, b), Axiom::sub_class_of(b, c)];
        let result = ElClassifier::new().classify(&mut entities, axioms).unwrap();

        assert!(result.is_subsumed_by(a, c));
        assert!(!result.is_subsumed_by(c, a));
        assert!(result.is_consistent());
    }
}
