//! Financial text extraction for FinIDR
//!
//! This crate turns raw financial text into typed, ontology-aligned
//! structures:
//!
//! - [`classifier::DocumentClassifier`] scores documents against filing
//!   signatures (10-K, 10-Q, 8-K, proxy statements, research notes)
//! - [`ner::EntityExtractor`] finds companies, people, products, metrics,
//!   risks, dates and percentages via patterns and a curated lexicon
//! - [`relation::RelationExtractor`] links entities into validated triples
//! - [`metrics::Evaluator`] scores extraction output against gold
//!   annotations
//!
//! All extractors are deterministic: the same text with the same
//! configuration always yields the same output.

pub mod classifier;
pub mod metrics;
pub mod ner;
pub mod patterns;
pub mod relation;

pub use classifier::{Classification, CompanyHeader, DocumentClassifier};
pub use metrics::{
    AggregateMetrics, Evaluator, ExtractionMetrics, GoldAnnotations, GoldEntity, GoldRelation,
};
pub use ner::{EntityExtractor, EntityStats};
pub use patterns::EntityPatternSet;
pub use relation::{EntityClass, RelationExtractor, RelationStats};
