//! Extraction quality evaluation
//!
//! Scores predicted entities and relation triples against gold-annotated
//! documents and accumulates precision/recall/F1 across a corpus. Gold
//! annotations are plain serde structs, so a JSON file per document is
//! enough to drive an evaluation run.

use std::collections::HashSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use fidr_core::{EntityType, ExtractedEntity, ExtractedRelation, RelationType};

fn ratio(hits: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        hits as f32 / total as f32
    }
}

// ============================================================================
// Metrics
// ============================================================================

/// Confusion counts for one extraction surface (entities or relations)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExtractionMetrics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ExtractionMetrics {
    /// Annotations in the gold standard
    pub fn gold_total(&self) -> usize {
        self.true_positives + self.false_negatives
    }

    /// Predictions made by the extractor
    pub fn predicted_total(&self) -> usize {
        self.true_positives + self.false_positives
    }

    pub fn precision(&self) -> f32 {
        ratio(self.true_positives, self.predicted_total())
    }

    pub fn recall(&self) -> f32 {
        ratio(self.true_positives, self.gold_total())
    }

    pub fn f1_score(&self) -> f32 {
        let denominator = self.precision() + self.recall();
        if denominator == 0.0 {
            0.0
        } else {
            2.0 * self.precision() * self.recall() / denominator
        }
    }

    pub fn accuracy(&self) -> f32 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_positives + self.false_negatives,
        )
    }

    /// Fold another document's counts into this one
    pub fn absorb(&mut self, other: ExtractionMetrics) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
    }
}

// ============================================================================
// Gold Standard Types
// ============================================================================

/// A gold-annotated entity mention
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GoldEntity {
    pub text: String,
    pub entity_type: EntityType,
    pub start: usize,
    pub end: usize,
}

impl From<&ExtractedEntity> for GoldEntity {
    fn from(e: &ExtractedEntity) -> Self {
        Self {
            text: e.text.clone(),
            entity_type: e.entity_type,
            start: e.start,
            end: e.end,
        }
    }
}

/// A gold-annotated relation triple
///
/// Texts are compared lowercased against the canonical entity texts,
/// matching the duplicate-merge key used during extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GoldRelation {
    pub subject_text: String,
    pub predicate: RelationType,
    pub object_text: String,
}

impl From<&ExtractedRelation> for GoldRelation {
    fn from(r: &ExtractedRelation) -> Self {
        Self {
            subject_text: r.subject.canonical_text().to_lowercase(),
            predicate: r.predicate,
            object_text: r.object.canonical_text().to_lowercase(),
        }
    }
}

impl GoldRelation {
    /// Build a gold triple with the same normalization the extractor applies
    pub fn new(subject: &str, predicate: RelationType, object: &str) -> Self {
        Self {
            subject_text: subject.to_lowercase(),
            predicate,
            object_text: object.to_lowercase(),
        }
    }
}

/// Gold annotations for one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoldAnnotations {
    #[serde(default)]
    pub entities: Vec<GoldEntity>,
    #[serde(default)]
    pub relations: Vec<GoldRelation>,
}

// ============================================================================
// Evaluator
// ============================================================================

/// Scores predicted extractions against gold annotations
pub struct Evaluator {
    /// Require exact span match instead of text match
    strict: bool,
    /// Require the entity type to match
    match_types: bool,
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            strict: false,
            match_types: true,
        }
    }

    /// Enable strict span matching
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Enable or disable type matching
    pub fn with_type_matching(mut self, match_types: bool) -> Self {
        self.match_types = match_types;
        self
    }

    fn entities_match(&self, predicted: &GoldEntity, gold: &GoldEntity) -> bool {
        if self.match_types && predicted.entity_type != gold.entity_type {
            return false;
        }

        if self.strict {
            predicted.start == gold.start && predicted.end == gold.end
        } else {
            predicted.text.eq_ignore_ascii_case(&gold.text)
        }
    }

    /// Evaluate entity extraction against a gold annotation
    ///
    /// Each gold mention claims at most one prediction.
    pub fn evaluate_entities(
        &self,
        predicted: &[ExtractedEntity],
        gold: &[GoldEntity],
    ) -> ExtractionMetrics {
        let predictions: Vec<GoldEntity> = predicted.iter().map(GoldEntity::from).collect();
        let mut claimed = vec![false; predictions.len()];
        let mut hits = 0;

        for annotation in gold {
            let matched = predictions
                .iter()
                .enumerate()
                .find(|&(i, p)| !claimed[i] && self.entities_match(p, annotation));
            if let Some((i, _)) = matched {
                claimed[i] = true;
                hits += 1;
            }
        }

        ExtractionMetrics {
            true_positives: hits,
            false_positives: predictions.len() - hits,
            false_negatives: gold.len() - hits,
        }
    }

    /// Evaluate relation extraction against a gold annotation
    pub fn evaluate_relations(
        &self,
        predicted: &[ExtractedRelation],
        gold: &[GoldRelation],
    ) -> ExtractionMetrics {
        let predicted_set: HashSet<GoldRelation> =
            predicted.iter().map(GoldRelation::from).collect();
        let gold_set: HashSet<GoldRelation> = gold.iter().cloned().collect();

        let hits = gold_set.iter().filter(|g| predicted_set.contains(g)).count();

        ExtractionMetrics {
            true_positives: hits,
            false_positives: predicted_set.len() - hits,
            false_negatives: gold_set.len() - hits,
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Aggregate Metrics
// ============================================================================

/// Metrics accumulated over a batch of documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub entities: ExtractionMetrics,
    pub relations: ExtractionMetrics,
    pub documents: usize,
}

impl AggregateMetrics {
    /// Fold one document's scores into the aggregate
    pub fn record(&mut self, entities: ExtractionMetrics, relations: ExtractionMetrics) {
        self.entities.absorb(entities);
        self.relations.absorb(relations);
        self.documents += 1;
    }

    /// Human-readable summary report
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Extraction quality over {} document(s)", self.documents);
        for (surface, m) in [("entities", &self.entities), ("relations", &self.relations)] {
            let _ = writeln!(
                out,
                "  {surface:9} P {:.3}  R {:.3}  F1 {:.3}  (tp {} / fp {} / fn {})",
                m.precision(),
                m.recall(),
                m.f1_score(),
                m.true_positives,
                m.false_positives,
                m.false_negatives,
            );
        }
        out
    }
}

// ============================================================================
// Tests
// ============================================================================
