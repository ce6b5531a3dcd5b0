//! Entity extraction
//!
//! Runs the pattern tables and the lexicon recognizer over text, merges both
//! candidate pools, deduplicates overlapping same-type spans, normalizes
//! company names, and parses numeric properties for financial metrics.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use fidr_core::{EntityType, ExtractedEntity, ExtractorConfig, Provenance, Result};

use crate::patterns::EntityPatternSet;

/// Summary statistics over an extraction run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStats {
    pub total_entities: usize,
    pub by_type: HashMap<String, usize>,
    pub by_provenance: HashMap<String, usize>,
    pub avg_confidence: f32,
    pub unique_texts: usize,
}

/// Pattern plus lexicon entity extractor
pub struct EntityExtractor {
    config: ExtractorConfig,
    patterns: Arc<EntityPatternSet>,
}

impl EntityExtractor {
    pub fn new(config: ExtractorConfig, patterns: Arc<EntityPatternSet>) -> Self {
        Self { config, patterns }
    }

    /// Extract entities from text, optionally restricted to a type subset
    ///
    /// Returns entities ordered by start offset. Same-type overlapping spans
    /// are collapsed to the highest-confidence candidate; overlaps across
    /// different types are all kept.
    pub fn extract(
        &self,
        text: &str,
        entity_types: Option<&[EntityType]>,
    ) -> Result<Vec<ExtractedEntity>> {
        let mut entities = self.extract_by_patterns(text, entity_types);

        if self.config.use_lexicon {
            entities.extend(self.extract_by_lexicon(text, entity_types));
        }

        let mut entities = deduplicate(entities);

        entities.retain(|e| e.confidence >= self.config.confidence_threshold);
        entities.sort_by_key(|e| e.start);

        Ok(entities)
    }

    /// Extract entities from a named filing section
    ///
    /// Applies the section's allowed-type filter when one exists and stamps
    /// each entity with its source section.
    pub fn extract_from_section(&self, text: &str, section: &str) -> Result<Vec<ExtractedEntity>> {
        let allowed = self.patterns.allowed_types_for_section(section);
        let mut entities = self.extract(text, allowed)?;

        for entity in &mut entities {
            entity
                .properties
                .insert("source_section".to_string(), section.into());
        }

        Ok(entities)
    }

    fn extract_by_patterns(
        &self,
        text: &str,
        entity_types: Option<&[EntityType]>,
    ) -> Vec<ExtractedEntity> {
        let mut entities = Vec::new();

        for (entity_type, rules) in self.patterns.rules() {
            if let Some(allowed) = entity_types {
                if !allowed.contains(entity_type) {
                    continue;
                }
            }

            for rule in rules {
                for caps in rule.regex.captures_iter(text) {
                    // Span and text come from the first capture group when
                    // the rule has one, otherwise from the whole match.
                    let Some(m) = caps.get(1).or_else(|| caps.get(0)) else {
                        continue;
                    };
                    let entity_text = m.as_str().trim();
                    if entity_text.len() < 2 {
                        continue;
                    }

                    let Some(full) = caps.get(0) else { continue };
                    let properties =
                        parse_entity_properties(*entity_type, entity_text, full.as_str());
                    let normalized = self.normalize(*entity_type, entity_text);

                    entities.push(ExtractedEntity {
                        text: entity_text.to_string(),
                        entity_type: *entity_type,
                        start: m.start(),
                        end: m.end(),
                        confidence: rule.confidence,
                        ontology_class: None,
                        normalized_text: normalized,
                        properties,
                        provenance: Provenance::Pattern,
                    });
                }
            }
        }

        entities
    }

    fn extract_by_lexicon(
        &self,
        text: &str,
        entity_types: Option<&[EntityType]>,
    ) -> Vec<ExtractedEntity> {
        let mut entities = Vec::new();
        // ASCII lowering keeps byte offsets stable for slicing.
        let text_lower = text.to_ascii_lowercase();

        for entry in self.patterns.lexicon() {
            if let Some(allowed) = entity_types {
                if !allowed.contains(&entry.entity_type) {
                    continue;
                }
            }

            let term_lower = entry.term.to_ascii_lowercase();
            for (start, _) in text_lower.match_indices(&term_lower) {
                let end = start + term_lower.len();
                if !is_word_bounded(text.as_bytes(), start, end) {
                    continue;
                }
                let Some(surface) = text.get(start..end) else {
                    continue;
                };

                entities.push(ExtractedEntity {
                    text: surface.to_string(),
                    entity_type: entry.entity_type,
                    start,
                    end,
                    confidence: entry.confidence,
                    ontology_class: None,
                    normalized_text: self.normalize(entry.entity_type, surface),
                    properties: HashMap::new(),
                    provenance: Provenance::Lexicon,
                });
            }
        }

        entities
    }

    fn normalize(&self, entity_type: EntityType, text: &str) -> Option<String> {
        if entity_type == EntityType::Company {
            if let Some(canonical) = self.patterns.resolve_company_alias(text) {
                return Some(canonical.to_string());
            }
        }
        None
    }

    /// Summary statistics for a set of extracted entities
    pub fn statistics(&self, entities: &[ExtractedEntity]) -> EntityStats {
        let mut stats = EntityStats {
            total_entities: entities.len(),
            ..Default::default()
        };

        let mut texts = std::collections::HashSet::new();
        for entity in entities {
            *stats
                .by_type
                .entry(entity.entity_type.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_provenance
                .entry(entity.provenance.to_string())
                .or_insert(0) += 1;
            texts.insert(entity.text.to_lowercase());
        }
        stats.unique_texts = texts.len();

        if !entities.is_empty() {
            stats.avg_confidence =
                entities.iter().map(|e| e.confidence).sum::<f32>() / entities.len() as f32;
        }

        stats
    }
}

/// Collapse same-type overlapping spans, keeping the best candidate
///
/// Candidates are ranked by confidence, then span length, then position, so
/// the longest high-confidence mention survives regardless of which
/// recognizer produced it.
fn deduplicate(mut entities: Vec<ExtractedEntity>) -> Vec<ExtractedEntity> {
    entities.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then((b.end - b.start).cmp(&(a.end - a.start)))
            .then(a.start.cmp(&b.start))
    });

    let mut kept: Vec<ExtractedEntity> = Vec::new();
    for entity in entities {
        let clashes = kept
            .iter()
            .any(|k| k.entity_type == entity.entity_type && k.overlaps(entity.start, entity.end));
        if !clashes {
            kept.push(entity);
        }
    }

    kept.sort_by_key(|e| e.start);
    kept
}

/// Parse numeric value and currency for metric-like entities
///
/// A malformed numeric keeps the entity and just omits the property.
fn parse_entity_properties(
    entity_type: EntityType,
    text: &str,
    full_match: &str,
) -> HashMap<String, serde_json::Value> {
    let mut properties = HashMap::new();

    let monetary = matches!(
        entity_type,
        EntityType::Revenue
            | EntityType::NetIncome
            | EntityType::TotalAssets
            | EntityType::CashFlow
            | EntityType::MonetaryAmount
    );

    if monetary {
        match parse_leading_number(text) {
            Some(value) => {
                let value = value * magnitude_multiplier(full_match);
                properties.insert("value".to_string(), json_number(value));
                properties.insert("currency".to_string(), "USD".into());
            }
            None => debug!(%text, "unparseable monetary value, property omitted"),
        }
    } else if entity_type == EntityType::EarningsPerShare {
        match parse_leading_number(text) {
            Some(value) => {
                properties.insert("value".to_string(), json_number(value));
                properties.insert("currency".to_string(), "USD".into());
            }
            None => debug!(%text, "unparseable EPS value, property omitted"),
        }
    } else if entity_type == EntityType::Percentage {
        if let Some(value) = parse_leading_number(text) {
            properties.insert("value".to_string(), json_number(value));
        }
    }

    properties
}

fn json_number(value: f64) -> serde_json::Value {
    serde_json::Number::from_f64(value)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// First run of digits (commas and a decimal point allowed) in the text
fn parse_leading_number(text: &str) -> Option<f64> {
    let mut digits = String::new();
    let mut seen_digit = false;

    for c in text.chars() {
        match c {
            '0'..='9' => {
                digits.push(c);
                seen_digit = true;
            }
            ',' if seen_digit => {}
            '.' if seen_digit => digits.push('.'),
            _ if seen_digit => break,
            _ => {}
        }
    }

    digits.parse().ok()
}

/// Magnitude word (or single-letter suffix) from the full pattern match
fn magnitude_multiplier(full_match: &str) -> f64 {
    let lower = full_match.to_lowercase();
    if lower.contains("trillion") {
        1e12
    } else if lower.contains("billion") {
        1e9
    } else if lower.contains("million") {
        1e6
    } else if lower.contains("thousand") {
        1e3
    } else {
        match lower.trim_end().chars().last() {
            Some('t') => 1e12,
            Some('b') => 1e9,
            Some('m') => 1e6,
            Some('k') => 1e3,
            _ => 1.0,
        }
    }
}

fn is_word_bounded(bytes: &[u8], start: usize, end: usize) -> bool {
    let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
    let after_ok = end >= bytes.len() || !bytes[end].is_ascii_alphanumeric();
    before_ok && after_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EntityExtractor {
        EntityExtractor::new(ExtractorConfig::default(), Arc::new(EntityPatternSet::new()))
    }

    #[test]
    fn test_extracts_company_and_revenue() {
        let e = extractor();
        let entities = e
            .extract("Apple Inc. reported revenue of $120 billion.", None)
            .unwrap();

        let company = entities
            .iter()
            .find(|e| e.entity_type == EntityType::Company)
            .expect("company entity");
        assert_eq!(company.text, "Apple Inc.");
        assert!(company.confidence >= 0.9);

        let revenue = entities
            .iter()
            .find(|e| e.entity_type == EntityType::Revenue)
            .expect("revenue entity");
        assert_eq!(revenue.text, "$120 billion");
        assert_eq!(
            revenue.properties.get("value").and_then(|v| v.as_f64()),
            Some(120_000_000_000.0)
        );
        assert_eq!(
            revenue.properties.get("currency").and_then(|v| v.as_str()),
            Some("USD")
        );
    }

    #[test]
    fn test_entities_sorted_by_position() {
        let e = extractor();
        let entities = e
            .extract(
                "Microsoft reported net income of $22 billion on March 31, 2024.",
                None,
            )
            .unwrap();
        assert!(!entities.is_empty());
        for window in entities.windows(2) {
            assert!(window[0].start <= window[1].start);
        }
    }

    #[test]
    fn test_same_type_overlap_keeps_highest_confidence() {
        let e = extractor();
        // "Apple Inc." matches both the named-company rule (0.95) and the
        // generic suffix rule (0.9); only one Company span may survive.
        let entities = e.extract("Apple Inc. is large.", None).unwrap();
        let companies: Vec<_> = entities
            .iter()
            .filter(|e| e.entity_type == EntityType::Company)
            .collect();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].text, "Apple Inc.");
        assert_eq!(companies[0].confidence, 0.95);
    }

    #[test]
    fn test_different_type_overlaps_retained() {
        let e = extractor();
        let entities = e.extract("revenue of $120 billion", None).unwrap();
        let has_revenue = entities.iter().any(|e| e.entity_type == EntityType::Revenue);
        let has_amount = entities
            .iter()
            .any(|e| e.entity_type == EntityType::MonetaryAmount);
        assert!(has_revenue && has_amount);
    }

    #[test]
    fn test_company_normalization() {
        let e = extractor();
        let entities = e.extract("Google announced a partnership.", None).unwrap();
        let company = entities
            .iter()
            .find(|e| e.entity_type == EntityType::Company)
            .expect("company entity");
        assert_eq!(company.canonical_text(), "Alphabet Inc.");
    }

    #[test]
    fn test_lexicon_recognizer() {
        let e = extractor();
        let entities = e
            .extract("Berkshire Hathaway increased its stake.", None)
            .unwrap();
        let company = entities
            .iter()
            .find(|e| e.text == "Berkshire Hathaway")
            .expect("lexicon entity");
        assert_eq!(company.entity_type, EntityType::Company);
        assert_eq!(company.provenance, Provenance::Lexicon);
    }

    #[test]
    fn test_type_filter() {
        let e = extractor();
        let entities = e
            .extract(
                "Apple Inc. faces supply chain disruption.",
                Some(&[EntityType::SupplyChainRisk]),
            )
            .unwrap();
        assert!(entities.iter().all(|e| e.entity_type == EntityType::SupplyChainRisk));
        assert!(!entities.is_empty());
    }

    #[test]
    fn test_section_extraction_stamps_source() {
        let e = extractor();
        let entities = e
            .extract_from_section("We face supply chain disruption and currency risk.", "item_1a")
            .unwrap();
        assert!(!entities.is_empty());
        for entity in &entities {
            assert_eq!(
                entity.properties.get("source_section").and_then(|v| v.as_str()),
                Some("item_1a")
            );
        }
    }

    #[test]
    fn test_risk_extraction() {
        let e = extractor();
        let entities = e
            .extract(
                "The company is exposed to foreign currency risk and cybersecurity threats.",
                None,
            )
            .unwrap();
        assert!(entities.iter().any(|e| e.entity_type == EntityType::CurrencyRisk));
        assert!(entities
            .iter()
            .any(|e| e.entity_type == EntityType::CybersecurityRisk));
    }

    #[test]
    fn test_parse_leading_number() {
        assert_eq!(parse_leading_number("$1,234.5 billion"), Some(1234.5));
        assert_eq!(parse_leading_number("no digits"), None);
    }

    #[test]
    fn test_magnitude_multiplier() {
        assert_eq!(magnitude_multiplier("revenue of $5 billion"), 1e9);
        assert_eq!(magnitude_multiplier("$3.2M"), 1e6);
        assert_eq!(magnitude_multiplier("$42"), 1.0);
    }

    #[test]
    fn test_statistics() {
        let e = extractor();
        let entities = e
            .extract("Apple Inc. reported revenue of $120 billion.", None)
            .unwrap();
        let stats = e.statistics(&entities);
        assert_eq!(stats.total_entities, entities.len());
        assert!(stats.avg_confidence > 0.0);
        assert!(stats.by_type.contains_key("Company"));
    }
}
