//! EL 分類器
//!
//! Runs the whole pipeline: normalization, role saturation, indexing and
//! the completion fixpoint.

use crate::axiom::NormalizedAxiom;
use crate::completion::{CompletionEngine, RuleTable};
use crate::entity::EntityManager;
use crate::index::ExtendedOntology;
use crate::model::Axiom;
use crate::normalizer::Normalizer;
use crate::result::{ClassificationResult, ClassificationStats};
use crate::saturation::RoleSaturation;
use crate::status::ClassifierStatus;
use crate::ElError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Classifier configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Rewrite complex axioms into normal forms. When disabled every input
    /// axiom must already be [`Axiom::Normalized`].
    pub normalize: bool,
    /// Add the inverse consequences of role axioms
    pub saturate_roles: bool,
    /// Abort the fixpoint after this many milliseconds
    pub timeout_ms: Option<u64>,
    /// Log progress every N processed entries (0 = off)
    pub progress_interval: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            saturate_roles: true,
            timeout_ms: None,
            progress_interval: 100_000,
        }
    }
}

/// OWL 2 EL classifier
pub struct ElClassifier {
    config: ClassifierConfig,
    normalizer: Normalizer,
    saturation: RoleSaturation,
    cancelled: Arc<AtomicBool>,
}

impl ElClassifier {
    pub fn new() -> Self {
        Self::with_config(ClassifierConfig::default())
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        Self {
            config,
            normalizer: Normalizer::new(),
            saturation: RoleSaturation::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Flag that aborts a running classification with [`ElError::Cancelled`].
    ///
    /// The flag stays set until [`ElClassifier::reset_cancellation`] is called.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn reset_cancellation(&self) {
        self.cancelled.store(false, Ordering::Relaxed);
    }

    /// Classify an ontology given as OWL 2 EL axioms.
    ///
    /// Auxiliary classes and properties are minted in `entities`; the
    /// caller keeps it to map ids in the result back to names.
    pub fn classify<I>(&self, entities: &mut EntityManager, axioms: I) -> Result<ClassificationResult, ElError>
    where
        I: IntoIterator<Item = Axiom>,
    {
        let axioms: Vec<Axiom> = axioms.into_iter().collect();
        for axiom in &axioms {
            if let Some(unknown) = axiom.entities().into_iter().find(|&e| !entities.contains(e)) {
                return Err(ElError::UnknownEntity(unknown));
            }
        }

        let normalized = if self.config.normalize {
            self.normalizer.normalize(axioms, entities)?
        } else {
            axioms
                .into_iter()
                .map(|axiom| match axiom {
                    Axiom::Normalized(axiom) => Ok(axiom),
                    other => Err(ElError::UnsupportedAxiom(format!(
                        "normalization is disabled but got {:?}",
                        other
                    ))),
                })
                .collect::<Result<BTreeSet<_>, _>>()?
        };

        self.classify_normalized(entities, normalized)
    }

    /// Classify an ontology that is already in normal form
    pub fn classify_normalized(
        &self,
        entities: &mut EntityManager,
        axioms: BTreeSet<NormalizedAxiom>,
    ) -> Result<ClassificationResult, ElError> {
        let started = Instant::now();

        let axioms = if self.config.saturate_roles {
            self.saturation.saturate(&axioms, entities)
        } else {
            axioms
        };
        let ontology = ExtendedOntology::build(&axioms, entities)?;

        info!("Starting classification of {} classes", ontology.classes().len());
        let engine = CompletionEngine::new(RuleTable::default(), self.cancel_handle())
            .with_timeout(self.config.timeout_ms.map(Duration::from_millis))
            .with_progress_interval(self.config.progress_interval);
        let mut status = ClassifierStatus::new(&ontology);
        let processed = engine.run(&mut status)?;

        let stats = ClassificationStats {
            normalized_axioms: ontology.axioms().len(),
            classes: ontology.classes().len(),
            properties: ontology.properties().len(),
            subsumer_entries: status.subsumer_count(),
            relation_entries: status.relation_count(),
            processed_entries: processed,
            elapsed: started.elapsed(),
        };
        info!(
            "Classification finished: {} entries processed, |S| = {}, |R| = {} in {:?}",
            stats.processed_entries, stats.subsumer_entries, stats.relation_entries, stats.elapsed
        );

        let result = ClassificationResult::new(status, &ontology, entities, stats);
        if !result.is_consistent() {
            warn!("Ontology is inconsistent");
        }
        Ok(result)
    }
}

impl Default for ElClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ClassId, Entity};
    use crate::model::ClassExpression;

    #[test]
    fn test_default_config() {
        let config = ClassifierConfig::default();
        assert!(config.normalize);
        assert!(config.saturate_roles);
        assert_eq!(config.timeout_ms, None);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: ClassifierConfig = serde_json::from_str(r#"{"timeout_ms": 5000}"#).unwrap();
        assert_eq!(config.timeout_ms, Some(5000));
        assert!(config.normalize);
        assert_eq!(config.progress_interval, 100_000);
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        let mut entities = EntityManager::new();
        let a = entities.class("A");
        let result = ElClassifier::new().classify(&mut entities, vec![Axiom::sub_class_of(a, ClassId(99))]);
        assert_eq!(result.unwrap_err(), ElError::UnknownEntity(Entity::Class(ClassId(99))));
    }

    #[test]
    fn test_complex_axiom_without_normalization() {
        let mut entities = EntityManager::new();
        let a = entities.class("A");
        let config = ClassifierConfig { normalize: false, ..ClassifierConfig::default() };

        let result = ElClassifier::with_config(config.clone())
            .classify(&mut entities, vec![Axiom::sub_class_of(a, ClassExpression::top())]);
        assert!(matches!(result, Err(ElError::UnsupportedAxiom(_))));

        let result = ElClassifier::with_config(config)
            .classify(&mut entities, vec![Axiom::from(NormalizedAxiom::gci0(a, ClassId::BOTTOM))])
            .unwrap();
        assert!(!result.is_satisfiable(a));
    }

    #[test]
    fn test_cancel_before_start() {
        let mut entities = EntityManager::new();
        let a = entities.class("A");
        let classifier = ElClassifier::new();
        classifier.cancel_handle().store(true, Ordering::Relaxed);

        let result = classifier.classify(&mut entities, vec![Axiom::sub_class_of(a, ClassId::TOP)]);
        assert_eq!(result.unwrap_err(), ElError::Cancelled);

        classifier.reset_cancellation();
        assert!(classifier.classify(&mut entities, vec![]).is_ok());
    }

    #[test]
    fn test_stats_are_filled() {
        let mut entities = EntityManager::new();
        let a = entities.class("A");
        let b = entities.class("B");
        let result = ElClassifier::new()
            .classify(&mut entities, vec![Axiom::sub_class_of(a, b)])
            .unwrap();

        let stats = result.stats();
        assert_eq!(stats.normalized_axioms, 1);
        assert_eq!(stats.classes, 4);
        assert!(stats.processed_entries >= stats.subsumer_entries);
    }
}
