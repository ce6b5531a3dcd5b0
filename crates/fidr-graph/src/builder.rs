//! Graph builder
//!
//! Maps extracted entities and relations onto nodes and edges. Node
//! identity is content-addressed from the entity type and canonical text,
//! so the same company mentioned in ten documents becomes one node with
//! accumulated provenance.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use fidr_core::{EntityType, ExtractedEntity, ExtractedRelation, GraphConfig, Result};
use fidr_ontology::OntologySchema;

use crate::{EdgeKey, GraphEdge, GraphNode};

/// Snapshot of graph size and composition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_type: HashMap<String, usize>,
    pub edges_by_type: HashMap<String, usize>,
}

/// In-memory property graph over extracted financial facts
///
/// Nodes and edges live in ordered maps so iteration, and therefore every
/// export format, is deterministic.
pub struct KnowledgeGraph {
    schema: Arc<OntologySchema>,
    config: GraphConfig,
    pub(crate) nodes: BTreeMap<String, GraphNode>,
    pub(crate) edges: BTreeMap<EdgeKey, GraphEdge>,
}

impl KnowledgeGraph {
    pub fn new(schema: Arc<OntologySchema>) -> Self {
        Self::with_config(schema, GraphConfig::default())
    }

    pub fn with_config(schema: Arc<OntologySchema>, config: GraphConfig) -> Self {
        Self {
            schema,
            config,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }

    /// Stable node identifier for an entity
    ///
    /// Format is `{Type}_{slug}_{digest8}`: the lowercased canonical text
    /// with whitespace collapsed to underscores and dots stripped, plus the
    /// first 8 hex chars of SHA-256 over `{type}_{slug}`. Truncating the
    /// digest keeps ids readable; at 32 bits the collision odds for graphs
    /// of this size are negligible.
    pub fn node_id(entity_type: EntityType, canonical: &str) -> String {
        let slug: String = canonical
            .to_lowercase()
            .chars()
            .filter(|c| *c != '.')
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();

        let digest = Sha256::digest(format!("{}_{}", entity_type.as_str(), slug));
        let digest8: String = digest
            .iter()
            .take(4)
            .map(|b| format!("{b:02x}"))
            .collect();

        format!("{}_{}_{}", entity_type.as_str(), slug, digest8)
    }

    /// Add or merge an entity, returning its node id
    ///
    /// First sight creates the node; later sightings of the same canonical
    /// text merge into it. The id, entity type and creation timestamp are
    /// never overwritten; confidence keeps its maximum and source documents
    /// accumulate.
    pub fn add_entity(&mut self, entity: &ExtractedEntity, document_id: &str) -> Result<String> {
        let canonical = entity.canonical_text();
        let id = Self::node_id(entity.entity_type, canonical);

        match self.nodes.get_mut(&id) {
            Some(node) => {
                merge_confidence(&mut node.properties, entity.confidence);
                node.properties.insert(
                    "updated_at".to_string(),
                    Utc::now().to_rfc3339().into(),
                );
                for (key, value) in &entity.properties {
                    node.properties
                        .entry(key.clone())
                        .or_insert_with(|| value.clone());
                }
                append_source_document(&mut node.properties, document_id);
                debug!(node_id = %id, "merged entity into existing node");
            }
            None => {
                let mut labels = vec!["Entity".to_string(), entity.entity_type.as_str().to_string()];
                labels.extend(
                    self.schema
                        .ancestor_labels(entity.entity_type)
                        .iter()
                        .map(|l| l.to_string()),
                );

                let mut properties: HashMap<String, serde_json::Value> = HashMap::new();
                properties.insert("id".to_string(), id.clone().into());
                properties.insert("name".to_string(), canonical.into());
                properties.insert("original_text".to_string(), entity.text.clone().into());
                properties.insert(
                    "entity_type".to_string(),
                    entity.entity_type.as_str().into(),
                );
                properties.insert("confidence".to_string(), json_f32(entity.confidence));
                if let Some(class) = &entity.ontology_class {
                    properties.insert("ontology_class".to_string(), class.clone().into());
                }
                for (key, value) in &entity.properties {
                    properties.insert(key.clone(), value.clone());
                }
                properties.insert("created_at".to_string(), Utc::now().to_rfc3339().into());
                properties.insert(
                    "source_documents".to_string(),
                    serde_json::Value::Array(vec![document_id.into()]),
                );

                self.nodes.insert(
                    id.clone(),
                    GraphNode {
                        id: id.clone(),
                        labels,
                        properties,
                    },
                );
            }
        }

        Ok(id)
    }

    /// Add or merge a validated relation edge
    ///
    /// Both endpoints are added (or merged) first. The ontology gate runs
    /// again here even though extraction already validated: graph input may
    /// come from deserialized documents as well as the live extractor. An
    /// invalid triple is dropped with a warning and `Ok(None)`.
    pub fn add_relation(
        &mut self,
        relation: &ExtractedRelation,
        document_id: &str,
    ) -> Result<Option<EdgeKey>> {
        if !self.schema.validate_relation(
            relation.subject.entity_type,
            relation.predicate,
            relation.object.entity_type,
        ) {
            warn!(
                subject = %relation.subject.entity_type,
                predicate = %relation.predicate,
                object = %relation.object.entity_type,
                "dropping relation with invalid type pair"
            );
            return Ok(None);
        }

        let source = self.add_entity(&relation.subject, document_id)?;
        let target = self.add_entity(&relation.object, document_id)?;
        let key = EdgeKey(source.clone(), target.clone(), relation.predicate);

        let mut evidence = relation.evidence.clone();
        if evidence.len() > self.config.max_evidence_len {
            evidence.truncate(floor_char_boundary(&evidence, self.config.max_evidence_len));
        }

        match self.edges.get_mut(&key) {
            Some(edge) => {
                merge_confidence(&mut edge.properties, relation.confidence);
                append_evidence(&mut edge.properties, &evidence);
                append_source_document(&mut edge.properties, document_id);
            }
            None => {
                let mut properties: HashMap<String, serde_json::Value> = HashMap::new();
                properties.insert("confidence".to_string(), json_f32(relation.confidence));
                properties.insert("evidence".to_string(), evidence.into());
                if let Some(property) = &relation.ontology_property {
                    properties.insert("ontology_property".to_string(), property.clone().into());
                }
                for (k, v) in &relation.properties {
                    properties.insert(k.clone(), v.clone());
                }
                properties.insert("created_at".to_string(), Utc::now().to_rfc3339().into());
                properties.insert(
                    "source_documents".to_string(),
                    serde_json::Value::Array(vec![document_id.into()]),
                );

                self.edges.insert(
                    key.clone(),
                    GraphEdge {
                        source,
                        target,
                        relation: relation.predicate,
                        properties,
                    },
                );
            }
        }

        Ok(Some(key))
    }

    /// Node and edge totals with per-type breakdowns
    pub fn get_statistics(&self) -> GraphStats {
        let mut stats = GraphStats {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
            ..Default::default()
        };

        for node in self.nodes.values() {
            if let Some(entity_type) = node.properties.get("entity_type").and_then(|v| v.as_str())
            {
                *stats.nodes_by_type.entry(entity_type.to_string()).or_insert(0) += 1;
            }
        }
        for key in self.edges.keys() {
            *stats
                .edges_by_type
                .entry(key.2.as_str().to_string())
                .or_insert(0) += 1;
        }

        stats
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn schema(&self) -> &OntologySchema {
        &self.schema
    }

    /// Remove every node and edge
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}

fn merge_confidence(properties: &mut HashMap<String, serde_json::Value>, confidence: f32) {
    let existing = properties
        .get("confidence")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    if f64::from(confidence) > existing {
        properties.insert("confidence".to_string(), json_f32(confidence));
    }
}

fn append_evidence(properties: &mut HashMap<String, serde_json::Value>, evidence: &str) {
    if evidence.is_empty() {
        return;
    }
    let merged = match properties.get("evidence").and_then(|v| v.as_str()) {
        Some(existing) if existing.contains(evidence) => return,
        Some(existing) => format!("{existing} | {evidence}"),
        None => evidence.to_string(),
    };
    properties.insert("evidence".to_string(), merged.into());
}

fn append_source_document(properties: &mut HashMap<String, serde_json::Value>, document_id: &str) {
    let entry = properties
        .entry("source_documents".to_string())
        .or_insert_with(|| serde_json::Value::Array(Vec::new()));
    if let serde_json::Value::Array(docs) = entry {
        if !docs.iter().any(|d| d.as_str() == Some(document_id)) {
            docs.push(document_id.into());
        }
    }
}

fn json_f32(value: f32) -> serde_json::Value {
    serde_json::Number::from_f64(f64::from(value))
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fidr_core::{Provenance, RelationType};

    fn entity(text: &str, entity_type: EntityType, confidence: f32) -> ExtractedEntity {
        ExtractedEntity {
            text: text.to_string(),
            entity_type,
            start: 0,
            end: text.len(),
            confidence,
            ontology_class: None,
            normalized_text: None,
            properties: HashMap::new(),
            provenance: Provenance::Pattern,
        }
    }

    fn relation(
        subject: ExtractedEntity,
        predicate: RelationType,
        object: ExtractedEntity,
    ) -> ExtractedRelation {
        ExtractedRelation {
            subject,
            predicate,
            object,
            confidence: 0.85,
            ontology_property: None,
            evidence: "test evidence".to_string(),
            properties: HashMap::new(),
        }
    }

    fn graph() -> KnowledgeGraph {
        KnowledgeGraph::new(Arc::new(OntologySchema::new()))
    }

    #[test]
    fn test_node_id_case_insensitive() {
        let a = KnowledgeGraph::node_id(EntityType::Company, "Apple Inc.");
        let b = KnowledgeGraph::node_id(EntityType::Company, "apple inc.");
        assert_eq!(a, b);
        assert!(a.starts_with("Company_apple_inc_"));
    }

    #[test]
    fn test_node_id_type_disambiguates() {
        let a = KnowledgeGraph::node_id(EntityType::Company, "Apple");
        let b = KnowledgeGraph::node_id(EntityType::Product, "Apple");
        assert_ne!(a, b);
    }

    #[test]
    fn test_add_entity_idempotent() {
        let mut graph = graph();

        let id1 = graph
            .add_entity(&entity("Apple", EntityType::Company, 0.9), "doc-1")
            .unwrap();
        let id2 = graph
            .add_entity(&entity("apple", EntityType::Company, 0.95), "doc-2")
            .unwrap();

        assert_eq!(id1, id2);
        assert_eq!(graph.node_count(), 1);

        let node = graph.nodes.get(&id1).unwrap();
        let confidence = node.properties["confidence"].as_f64().unwrap();
        assert!((confidence - 0.95).abs() < 1e-6);

        let docs = node.properties["source_documents"].as_array().unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_merge_never_overwrites_identity() {
        let mut graph = graph();

        let id = graph
            .add_entity(&entity("Apple", EntityType::Company, 0.9), "doc-1")
            .unwrap();
        let created = graph.nodes[&id].properties["created_at"].clone();

        graph
            .add_entity(&entity("Apple", EntityType::Company, 0.5), "doc-1")
            .unwrap();

        let node = &graph.nodes[&id];
        assert_eq!(node.properties["created_at"], created);
        assert_eq!(node.properties["entity_type"], "Company");
        // Lower confidence never wins
        assert!((node.properties["confidence"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_ancestor_labels_applied() {
        let mut graph = graph();
        let id = graph
            .add_entity(&entity("$5 billion", EntityType::Revenue, 0.9), "doc-1")
            .unwrap();

        let labels = &graph.nodes[&id].labels;
        assert_eq!(labels[0], "Entity");
        assert_eq!(labels[1], "Revenue");
        assert!(labels.contains(&"FinancialMetric".to_string()));
    }

    #[test]
    fn test_add_relation_valid() {
        let mut graph = graph();
        let key = graph
            .add_relation(
                &relation(
                    entity("Apple Inc.", EntityType::Company, 0.95),
                    RelationType::Reported,
                    entity("$120 billion", EntityType::Revenue, 0.9),
                ),
                "doc-1",
            )
            .unwrap();

        assert!(key.is_some());
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_add_relation_invalid_pair_rejected() {
        let mut graph = graph();
        let key = graph
            .add_relation(
                &relation(
                    entity("Apple Inc.", EntityType::Company, 0.95),
                    RelationType::FacesRisk,
                    entity("Tim Cook", EntityType::Person, 0.9),
                ),
                "doc-1",
            )
            .unwrap();

        assert!(key.is_none());
        assert_eq!(graph.edge_count(), 0);
        // Rejection happens before endpoints are added
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_relation_reassertion_merges() {
        let mut graph = graph();
        let triple = relation(
            entity("Apple Inc.", EntityType::Company, 0.95),
            RelationType::Reported,
            entity("$120 billion", EntityType::Revenue, 0.9),
        );

        graph.add_relation(&triple, "doc-1").unwrap();

        let mut second = triple.clone();
        second.confidence = 0.9;
        second.evidence = "other evidence".to_string();
        graph.add_relation(&second, "doc-2").unwrap();

        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edges.values().next().unwrap();
        assert!((edge.properties["confidence"].as_f64().unwrap() - 0.9).abs() < 1e-6);
        let evidence = edge.properties["evidence"].as_str().unwrap();
        assert!(evidence.contains("test evidence") && evidence.contains("other evidence"));
    }

    #[test]
    fn test_evidence_truncated() {
        let schema = Arc::new(OntologySchema::new());
        let config = GraphConfig {
            max_evidence_len: 10,
            ..Default::default()
        };
        let mut graph = KnowledgeGraph::with_config(schema, config);

        let mut triple = relation(
            entity("Apple Inc.", EntityType::Company, 0.95),
            RelationType::Reported,
            entity("$120 billion", EntityType::Revenue, 0.9),
        );
        triple.evidence = "a very long evidence sentence".to_string();

        graph.add_relation(&triple, "doc-1").unwrap();
        let edge = graph.edges.values().next().unwrap();
        assert_eq!(edge.properties["evidence"].as_str().unwrap().len(), 10);
    }

    #[test]
    fn test_statistics() {
        let mut graph = graph();
        graph
            .add_relation(
                &relation(
                    entity("Apple Inc.", EntityType::Company, 0.95),
                    RelationType::Reported,
                    entity("$120 billion", EntityType::Revenue, 0.9),
                ),
                "doc-1",
            )
            .unwrap();
        graph
            .add_entity(&entity("Microsoft", EntityType::Company, 0.95), "doc-1")
            .unwrap();

        let stats = graph.get_statistics();
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.total_edges, 1);
        assert_eq!(stats.nodes_by_type["Company"], 2);
        assert_eq!(stats.edges_by_type["REPORTED"], 1);
    }

    #[test]
    fn test_clear() {
        let mut graph = graph();
        graph
            .add_entity(&entity("Apple", EntityType::Company, 0.9), "doc-1")
            .unwrap();
        graph.clear();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }
}
