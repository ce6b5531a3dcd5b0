//! FinIDR Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the FinIDR system:
//! - Extraction data model (entities, relations, provenance)
//! - Closed vocabularies (entity types, relation predicates, document types)
//! - Common error types
//! - Shared traits for text-generation backends
//! - Configuration management

pub mod config;

pub use config::{
    ClassifierConfig, ConfigError, ExtractorConfig, GraphConfig, LoggingConfig, PipelineConfig,
    RelationConfig,
};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for FinIDR operations
#[derive(Error, Debug)]
pub enum FidrError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unmapped type: {0}")]
    UnmappedType(String),

    #[error("External store error: {0}")]
    ExternalStore(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FidrError>;

// ============================================================================
// Closed Vocabularies
// ============================================================================

/// Entity types recognized by the extraction pipeline
///
/// The enumeration is closed: extraction rules, the ontology registry, and
/// graph-node labels all key off these variants. Declaration order matters
/// only for iteration via [`EntityType::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Company,
    Person,
    Product,

    // Financial metrics
    Revenue,
    NetIncome,
    EarningsPerShare,
    TotalAssets,
    CashFlow,
    MonetaryAmount,

    // Risk factors
    SupplyChainRisk,
    CurrencyRisk,
    RegulatoryRisk,
    GeopoliticalRisk,
    CompetitiveRisk,
    CybersecurityRisk,
    TechnologyRisk,

    // Generic values
    Date,
    Percentage,
}

impl EntityType {
    /// All entity types in declaration order
    pub const ALL: [EntityType; 18] = [
        Self::Company,
        Self::Person,
        Self::Product,
        Self::Revenue,
        Self::NetIncome,
        Self::EarningsPerShare,
        Self::TotalAssets,
        Self::CashFlow,
        Self::MonetaryAmount,
        Self::SupplyChainRisk,
        Self::CurrencyRisk,
        Self::RegulatoryRisk,
        Self::GeopoliticalRisk,
        Self::CompetitiveRisk,
        Self::CybersecurityRisk,
        Self::TechnologyRisk,
        Self::Date,
        Self::Percentage,
    ];

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "Company",
            Self::Person => "Person",
            Self::Product => "Product",
            Self::Revenue => "Revenue",
            Self::NetIncome => "NetIncome",
            Self::EarningsPerShare => "EarningsPerShare",
            Self::TotalAssets => "TotalAssets",
            Self::CashFlow => "CashFlow",
            Self::MonetaryAmount => "MonetaryAmount",
            Self::SupplyChainRisk => "SupplyChainRisk",
            Self::CurrencyRisk => "CurrencyRisk",
            Self::RegulatoryRisk => "RegulatoryRisk",
            Self::GeopoliticalRisk => "GeopoliticalRisk",
            Self::CompetitiveRisk => "CompetitiveRisk",
            Self::CybersecurityRisk => "CybersecurityRisk",
            Self::TechnologyRisk => "TechnologyRisk",
            Self::Date => "Date",
            Self::Percentage => "Percentage",
        }
    }

    /// True for quantitative financial metric types
    pub fn is_financial_metric(&self) -> bool {
        matches!(
            self,
            Self::Revenue
                | Self::NetIncome
                | Self::EarningsPerShare
                | Self::TotalAssets
                | Self::CashFlow
                | Self::MonetaryAmount
        )
    }

    /// True for risk-factor types
    pub fn is_risk(&self) -> bool {
        matches!(
            self,
            Self::SupplyChainRisk
                | Self::CurrencyRisk
                | Self::RegulatoryRisk
                | Self::GeopoliticalRisk
                | Self::CompetitiveRisk
                | Self::CybersecurityRisk
                | Self::TechnologyRisk
        )
    }

    /// Parse from the string representation
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Relation predicates recognized by the extraction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    CompetesWith,
    PartnersWith,
    Acquired,
    SubsidiaryOf,
    Reported,
    Generated,
    FacesRisk,
    Manufactures,
    Sells,
    CeoOf,
    WorksAt,
    ImpactedBy,
}

impl RelationType {
    /// Get the wire-format string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompetesWith => "COMPETES_WITH",
            Self::PartnersWith => "PARTNERS_WITH",
            Self::Acquired => "ACQUIRED",
            Self::SubsidiaryOf => "SUBSIDIARY_OF",
            Self::Reported => "REPORTED",
            Self::Generated => "GENERATED",
            Self::FacesRisk => "FACES_RISK",
            Self::Manufactures => "MANUFACTURES",
            Self::Sells => "SELLS",
            Self::CeoOf => "CEO_OF",
            Self::WorksAt => "WORKS_AT",
            Self::ImpactedBy => "IMPACTED_BY",
        }
    }

    /// Parse from the wire-format representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "COMPETES_WITH" => Some(Self::CompetesWith),
            "PARTNERS_WITH" => Some(Self::PartnersWith),
            "ACQUIRED" => Some(Self::Acquired),
            "SUBSIDIARY_OF" => Some(Self::SubsidiaryOf),
            "REPORTED" => Some(Self::Reported),
            "GENERATED" => Some(Self::Generated),
            "FACES_RISK" => Some(Self::FacesRisk),
            "MANUFACTURES" => Some(Self::Manufactures),
            "SELLS" => Some(Self::Sells),
            "CEO_OF" => Some(Self::CeoOf),
            "WORKS_AT" => Some(Self::WorksAt),
            "IMPACTED_BY" => Some(Self::ImpactedBy),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Document types recognized by the classifier
///
/// Declaration order is significant: when two document types tie on score,
/// the earlier-declared type wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    Form10K,
    Form10Q,
    Form8K,
    ProxyStatement,
    EquityResearch,
    EarningsCall,
    PressRelease,
    EconomicData,
    NewsArticle,
    Unknown,
}

impl DocumentType {
    /// Get the filing-code string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Form10K => "10-K",
            Self::Form10Q => "10-Q",
            Self::Form8K => "8-K",
            Self::ProxyStatement => "DEF14A",
            Self::EquityResearch => "equity_research",
            Self::EarningsCall => "earnings_call",
            Self::PressRelease => "press_release",
            Self::EconomicData => "economic_data",
            Self::NewsArticle => "news_article",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which recognizer produced an entity candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Ordered regex pattern rules
    Pattern,
    /// Dictionary of known surface forms
    Lexicon,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pattern => write!(f, "pattern"),
            Self::Lexicon => write!(f, "lexicon"),
        }
    }
}

// ============================================================================
// Extraction Data Model
// ============================================================================

/// A typed entity mention located in text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntity {
    /// Surface text of the mention
    pub text: String,

    /// Entity type
    pub entity_type: EntityType,

    /// Start byte offset in the source text
    pub start: usize,

    /// End byte offset (exclusive)
    pub end: usize,

    /// Extraction confidence (0.0 - 1.0)
    pub confidence: f32,

    /// Ontology class URI this entity maps to
    pub ontology_class: Option<String>,

    /// Canonical form after alias resolution
    pub normalized_text: Option<String>,

    /// Structured properties parsed from the mention (value, currency, ...)
    pub properties: HashMap<String, serde_json::Value>,

    /// Recognizer that produced this candidate
    pub provenance: Provenance,
}

impl ExtractedEntity {
    /// Canonical text: the normalized form when present, else the surface text
    pub fn canonical_text(&self) -> &str {
        self.normalized_text.as_deref().unwrap_or(&self.text)
    }

    /// Whether this mention's span overlaps the given byte range
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// A typed, validated link between two entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRelation {
    /// Subject entity
    pub subject: ExtractedEntity,

    /// Relation predicate
    pub predicate: RelationType,

    /// Object entity
    pub object: ExtractedEntity,

    /// Extraction confidence (0.0 - 1.0)
    pub confidence: f32,

    /// Ontology property URI this predicate maps to
    pub ontology_property: Option<String>,

    /// Text snippet the relation was extracted from
    pub evidence: String,

    /// Additional properties
    pub properties: HashMap<String, serde_json::Value>,
}

impl ExtractedRelation {
    /// Render as a readable triple string
    pub fn to_triple_string(&self) -> String {
        format!(
            "({}) --[{}]--> ({})",
            self.subject.canonical_text(),
            self.predicate,
            self.object.canonical_text()
        )
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for text-generation backends used by the query engine
///
/// Generation is an external collaborator: the query engine builds a prompt
/// from retrieved graph context and hands it off here.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response for the given prompt
    async fn generate(&self, prompt: &str) -> Result<String>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_roundtrip() {
        for t in EntityType::ALL {
            assert_eq!(EntityType::parse(t.as_str()), Some(t));
        }
    }

    #[test]
    fn test_entity_type_groups() {
        assert!(EntityType::Revenue.is_financial_metric());
        assert!(EntityType::MonetaryAmount.is_financial_metric());
        assert!(!EntityType::Company.is_financial_metric());
        assert!(EntityType::SupplyChainRisk.is_risk());
        assert!(!EntityType::Date.is_risk());
    }

    #[test]
    fn test_relation_type_wire_format() {
        assert_eq!(RelationType::CompetesWith.as_str(), "COMPETES_WITH");
        assert_eq!(RelationType::parse("FACES_RISK"), Some(RelationType::FacesRisk));
        assert_eq!(RelationType::parse("NO_SUCH"), None);
    }

    #[test]
    fn test_relation_type_serde_matches_wire_format() {
        let json = serde_json::to_string(&RelationType::CeoOf).unwrap();
        assert_eq!(json, "\"CEO_OF\"");
    }

    #[test]
    fn test_document_type_display() {
        assert_eq!(DocumentType::Form10K.to_string(), "10-K");
        assert_eq!(DocumentType::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_entity_overlap() {
        let e = ExtractedEntity {
            text: "Apple".into(),
            entity_type: EntityType::Company,
            start: 10,
            end: 15,
            confidence: 0.9,
            ontology_class: None,
            normalized_text: Some("Apple Inc.".into()),
            properties: HashMap::new(),
            provenance: Provenance::Pattern,
        };
        assert!(e.overlaps(12, 20));
        assert!(e.overlaps(0, 11));
        assert!(!e.overlaps(15, 20));
        assert_eq!(e.canonical_text(), "Apple Inc.");
    }
}
