//! Relation extraction
//!
//! Applies an ordered rule table of two-capture-group patterns over text,
//! resolves each captured span to an already-extracted entity, validates the
//! resulting type triple against the ontology, and merges duplicate triples.
//! A co-occurrence fallback catches company/risk and company/metric pairs
//! that share a sentence without a connecting verb phrase.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use fidr_core::{
    EntityType, ExtractedEntity, ExtractedRelation, RelationConfig, RelationType, Result,
};
use fidr_ontology::OntologySchema;

/// Coarse entity class a relation rule expects on one side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityClass {
    Company,
    Person,
    Product,
    FinancialMetric,
    Risk,
}

impl EntityClass {
    /// Whether a concrete entity type belongs to this class
    pub fn matches(&self, entity_type: EntityType) -> bool {
        match self {
            Self::Company => entity_type == EntityType::Company,
            Self::Person => entity_type == EntityType::Person,
            Self::Product => entity_type == EntityType::Product,
            Self::FinancialMetric => entity_type.is_financial_metric(),
            Self::Risk => entity_type.is_risk(),
        }
    }
}

struct RelationRule {
    regex: Regex,
    predicate: RelationType,
    subject_class: EntityClass,
    object_class: EntityClass,
    confidence: f32,
    /// Capture group holding the subject span (object is the other one)
    subject_group: usize,
    object_group: usize,
}

/// Summary statistics over a relation extraction run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationStats {
    pub total_relations: usize,
    pub by_predicate: HashMap<String, usize>,
    pub avg_confidence: f32,
    pub unique_subjects: usize,
    pub unique_objects: usize,
}

/// Ontology-validated relation extractor
pub struct RelationExtractor {
    config: RelationConfig,
    schema: Arc<OntologySchema>,
    rules: Vec<RelationRule>,
}

// Capitalized name: one or more title-case words, ampersands and
// abbreviation periods allowed.
const NAME: &str = r"[A-Z][\w&.-]*(?:\s+[A-Z][\w&.-]*)*";
const AMOUNT: &str = r"\$[\d,]+(?:\.\d+)?(?:\s*(?:trillion|billion|million|thousand|[TBMK]))?";

impl RelationExtractor {
    pub fn new(config: RelationConfig, schema: Arc<OntologySchema>) -> Self {
        let mut extractor = Self {
            config,
            schema,
            rules: Vec::new(),
        };
        extractor.init_rules();
        extractor
    }

    fn init_rules(&mut self) {
        use EntityClass::*;
        use RelationType::*;

        self.add_rule(
            &format!(r"({NAME})\s+(?:competes?|competing)\s+(?:with|against)\s+({NAME})"),
            CompetesWith, Company, Company, 0.85, 1, 2,
        );
        self.add_rule(
            &format!(r"({NAME})\s+is\s+(?:a\s+)?(?:major\s+)?competitor\s+(?:of|to)\s+({NAME})"),
            CompetesWith, Company, Company, 0.85, 1, 2,
        );

        self.add_rule(
            &format!(r"({NAME})\s+(?:partners?|partnering|partnered)\s+with\s+({NAME})"),
            PartnersWith, Company, Company, 0.85, 1, 2,
        );
        self.add_rule(
            &format!(r"partnership\s+(?:with|between)\s+({NAME})\s+and\s+({NAME})"),
            PartnersWith, Company, Company, 0.85, 1, 2,
        );
        self.add_rule(
            &format!(r"({NAME})\s+and\s+({NAME})\s+(?:announced|formed)\s+(?:a\s+)?partnership"),
            PartnersWith, Company, Company, 0.8, 1, 2,
        );

        self.add_rule(
            &format!(r"({NAME})\s+(?:acquired|acquires|acquiring|bought|purchased)\s+({NAME})"),
            Acquired, Company, Company, 0.9, 1, 2,
        );
        self.add_rule(
            &format!(r"acquisition\s+of\s+({NAME})\s+by\s+({NAME})"),
            Acquired, Company, Company, 0.9, 2, 1,
        );
        self.add_rule(
            &format!(r"({NAME})\s+(?:was|is\s+being)\s+acquired\s+by\s+({NAME})"),
            Acquired, Company, Company, 0.9, 2, 1,
        );

        self.add_rule(
            &format!(r"({NAME}),?\s+(?:a\s+)?(?:wholly[- ]owned\s+)?subsidiary\s+of\s+({NAME})"),
            SubsidiaryOf, Company, Company, 0.9, 1, 2,
        );
        self.add_rule(
            &format!(r"({NAME})\s+(?:owns|owned)\s+({NAME})"),
            SubsidiaryOf, Company, Company, 0.8, 2, 1,
        );

        self.add_rule(
            &format!(r"({NAME})\s+reported\s+.{{0,60}}?({AMOUNT})"),
            Reported, Company, FinancialMetric, 0.85, 1, 2,
        );
        self.add_rule(
            &format!(
                r"({NAME})(?:'s)?\s+(?i:revenue|sales|income|earnings)\s+(?i:was|were|of|reached)\s+({AMOUNT})"
            ),
            Reported, Company, FinancialMetric, 0.85, 1, 2,
        );

        self.add_rule(
            &format!(r"({NAME})\s+generated\s+({AMOUNT})\s+(?:in\s+)?(?i:revenue|sales)"),
            Generated, Company, FinancialMetric, 0.85, 1, 2,
        );

        self.add_rule(
            &format!(
                r"({NAME})\s+(?:faces?|facing|confronts?)\s+.{{0,60}}?((?i:supply\s+chain|regulatory|currency|competitive|cybersecurity|geopolitical|technology)\s+(?i:risks?))"
            ),
            FacesRisk, Company, Risk, 0.85, 1, 2,
        );
        self.add_rule(
            &format!(
                r"({NAME})\s+(?:is\s+)?(?:exposed|vulnerable|susceptible)\s+to\s+((?i:[\w\s]{{0,40}}?risks?))"
            ),
            FacesRisk, Company, Risk, 0.8, 1, 2,
        );
        self.add_rule(
            &format!(r"((?i:risks?|threats?|challenges?))\s+(?i:to|for)\s+({NAME})"),
            FacesRisk, Company, Risk, 0.75, 2, 1,
        );

        self.add_rule(
            &format!(r"({NAME})\s+(?:manufactures?|produces?|makes?|builds?)\s+(?:the\s+)?({NAME})"),
            Manufactures, Company, Product, 0.8, 1, 2,
        );
        self.add_rule(
            &format!(r"({NAME})\s+(?:sells?|markets?|offers?|provides?)\s+(?:the\s+)?({NAME})"),
            Sells, Company, Product, 0.8, 1, 2,
        );

        self.add_rule(
            &format!(r"({NAME}),?\s+(?:the\s+)?CEO\s+of\s+({NAME})"),
            CeoOf, Person, Company, 0.9, 1, 2,
        );
        self.add_rule(
            &format!(r"({NAME})\s+CEO\s+({NAME})"),
            CeoOf, Person, Company, 0.9, 2, 1,
        );

        self.add_rule(
            &format!(r"({NAME}),?\s+(?:a|an|the)?\s*[\w\s]{{0,30}}?\s+(?:at|of)\s+({NAME})"),
            WorksAt, Person, Company, 0.7, 1, 2,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn add_rule(
        &mut self,
        pattern: &str,
        predicate: RelationType,
        subject_class: EntityClass,
        object_class: EntityClass,
        confidence: f32,
        subject_group: usize,
        object_group: usize,
    ) {
        if let Ok(regex) = Regex::new(pattern) {
            self.rules.push(RelationRule {
                regex,
                predicate,
                subject_class,
                object_class,
                confidence,
                subject_group,
                object_group,
            });
        }
    }

    // ------------------------------------------------------------------
    // Extraction
    // ------------------------------------------------------------------

    /// Extract validated relations between the given entities
    pub fn extract(
        &self,
        text: &str,
        entities: &[ExtractedEntity],
    ) -> Result<Vec<ExtractedRelation>> {
        let mut relations = self.extract_by_patterns(text, entities);

        if self.config.use_cooccurrence {
            relations.extend(self.extract_by_cooccurrence(text, entities));
        }

        let mut relations = merge_duplicates(relations);
        relations.retain(|r| r.confidence >= self.config.confidence_threshold);

        Ok(relations)
    }

    fn extract_by_patterns(
        &self,
        text: &str,
        entities: &[ExtractedEntity],
    ) -> Vec<ExtractedRelation> {
        let mut relations = Vec::new();

        for rule in &self.rules {
            for caps in rule.regex.captures_iter(text) {
                let (Some(subj_span), Some(obj_span)) =
                    (caps.get(rule.subject_group), caps.get(rule.object_group))
                else {
                    continue;
                };

                let subject = self.resolve_span(
                    subj_span.start(),
                    subj_span.end(),
                    rule.subject_class,
                    entities,
                );
                let object = self.resolve_span(
                    obj_span.start(),
                    obj_span.end(),
                    rule.object_class,
                    entities,
                );

                let (Some(subject), Some(object)) = (subject, object) else {
                    continue;
                };
                if subject.start == object.start && subject.end == object.end {
                    continue;
                }

                if !self.schema.validate_relation(
                    subject.entity_type,
                    rule.predicate,
                    object.entity_type,
                ) {
                    debug!(
                        subject = %subject.entity_type,
                        predicate = %rule.predicate,
                        object = %object.entity_type,
                        "relation rejected by ontology"
                    );
                    continue;
                }

                let Some(full) = caps.get(0) else { continue };
                relations.push(ExtractedRelation {
                    subject: subject.clone(),
                    predicate: rule.predicate,
                    object: object.clone(),
                    confidence: rule.confidence,
                    ontology_property: self
                        .schema
                        .map_relation_type(rule.predicate)
                        .ok()
                        .map(String::from),
                    evidence: full.as_str().to_string(),
                    properties: HashMap::new(),
                });
            }
        }

        relations
    }

    fn extract_by_cooccurrence(
        &self,
        text: &str,
        entities: &[ExtractedEntity],
    ) -> Vec<ExtractedRelation> {
        let mut relations = Vec::new();

        for (offset, sentence) in split_sentences(text) {
            let end = offset + sentence.len();
            let in_sentence: Vec<&ExtractedEntity> = entities
                .iter()
                .filter(|e| e.start >= offset && e.end <= end)
                .collect();
            if in_sentence.len() < 2 {
                continue;
            }

            let companies: Vec<&ExtractedEntity> = in_sentence
                .iter()
                .copied()
                .filter(|e| e.entity_type == EntityType::Company)
                .collect();

            for &company in &companies {
                for &other in &in_sentence {
                    if other.entity_type.is_risk()
                        && span_distance(company, other) < self.config.max_distance
                    {
                        relations.push(self.cooccurrence_relation(
                            company,
                            RelationType::FacesRisk,
                            other,
                            0.7,
                            sentence,
                        ));
                    }

                    let metric = matches!(
                        other.entity_type,
                        EntityType::Revenue | EntityType::NetIncome | EntityType::MonetaryAmount
                    );
                    if metric && span_distance(company, other) < 100 {
                        relations.push(self.cooccurrence_relation(
                            company,
                            RelationType::Reported,
                            other,
                            0.65,
                            sentence,
                        ));
                    }
                }
            }
        }

        // Co-occurrence produces candidates regardless of the pair table;
        // keep only what the ontology allows.
        relations.retain(|r| {
            self.schema
                .validate_relation(r.subject.entity_type, r.predicate, r.object.entity_type)
        });
        relations
    }

    fn cooccurrence_relation(
        &self,
        subject: &ExtractedEntity,
        predicate: RelationType,
        object: &ExtractedEntity,
        confidence: f32,
        sentence: &str,
    ) -> ExtractedRelation {
        ExtractedRelation {
            subject: subject.clone(),
            predicate,
            object: object.clone(),
            confidence,
            ontology_property: self.schema.map_relation_type(predicate).ok().map(String::from),
            evidence: sentence.to_string(),
            properties: HashMap::new(),
        }
    }

    /// Resolve a captured span to the best matching entity
    ///
    /// Preference order: overlapping entity of the expected class, any
    /// overlapping entity, then the nearest preceding entity of the expected
    /// class within the configured distance. Beyond that the span is dropped.
    fn resolve_span<'a>(
        &self,
        start: usize,
        end: usize,
        expected: EntityClass,
        entities: &'a [ExtractedEntity],
    ) -> Option<&'a ExtractedEntity> {
        let overlapping = entities
            .iter()
            .filter(|e| e.overlaps(start, end))
            .max_by(|a, b| {
                let a_class = expected.matches(a.entity_type);
                let b_class = expected.matches(b.entity_type);
                a_class
                    .cmp(&b_class)
                    .then(overlap_len(a, start, end).cmp(&overlap_len(b, start, end)))
                    .then(a.confidence.total_cmp(&b.confidence))
                    .then(b.start.cmp(&a.start))
            });

        if let Some(entity) = overlapping {
            if expected.matches(entity.entity_type) {
                return Some(entity);
            }
        }

        entities
            .iter()
            .filter(|e| {
                expected.matches(e.entity_type)
                    && e.end <= start
                    && start - e.end <= self.config.max_distance
            })
            .max_by_key(|e| e.end)
    }

    /// Summary statistics for a set of extracted relations
    pub fn statistics(&self, relations: &[ExtractedRelation]) -> RelationStats {
        let mut stats = RelationStats {
            total_relations: relations.len(),
            ..Default::default()
        };

        let mut subjects = std::collections::HashSet::new();
        let mut objects = std::collections::HashSet::new();
        for relation in relations {
            *stats
                .by_predicate
                .entry(relation.predicate.as_str().to_string())
                .or_insert(0) += 1;
            subjects.insert(relation.subject.canonical_text().to_lowercase());
            objects.insert(relation.object.canonical_text().to_lowercase());
        }
        stats.unique_subjects = subjects.len();
        stats.unique_objects = objects.len();

        if !relations.is_empty() {
            stats.avg_confidence =
                relations.iter().map(|r| r.confidence).sum::<f32>() / relations.len() as f32;
        }

        stats
    }
}

fn overlap_len(entity: &ExtractedEntity, start: usize, end: usize) -> usize {
    entity.end.min(end).saturating_sub(entity.start.max(start))
}

fn span_distance(a: &ExtractedEntity, b: &ExtractedEntity) -> usize {
    a.start.abs_diff(b.start)
}

/// Sentences with their byte offsets
///
/// Splits after `.`, `!`, or `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<(usize, &str)> {
    let mut sentences = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if matches!(bytes[i], b'.' | b'!' | b'?')
            && bytes.get(i + 1).is_some_and(|b| b.is_ascii_whitespace())
        {
            sentences.push((start, &text[start..=i]));
            start = i + 1;
        }
        i += 1;
    }
    if start < text.len() {
        sentences.push((start, &text[start..]));
    }

    sentences
}

/// Merge duplicate triples keyed by canonical (subject, predicate, object)
///
/// Both endpoints key on their canonical text so alias-normalized mentions
/// collapse with their full forms. The merged triple keeps the maximum
/// confidence; distinct evidence snippets are concatenated.
fn merge_duplicates(relations: Vec<ExtractedRelation>) -> Vec<ExtractedRelation> {
    let mut merged: Vec<ExtractedRelation> = Vec::new();
    let mut index: HashMap<(String, RelationType, String), usize> = HashMap::new();

    for relation in relations {
        let key = (
            relation.subject.canonical_text().to_lowercase(),
            relation.predicate,
            relation.object.canonical_text().to_lowercase(),
        );

        match index.get(&key) {
            Some(&i) => {
                let existing = &mut merged[i];
                existing.confidence = existing.confidence.max(relation.confidence);
                if !existing.evidence.contains(&relation.evidence) {
                    existing.evidence.push_str(" | ");
                    existing.evidence.push_str(&relation.evidence);
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(relation);
            }
        }
    }

    merged
}
