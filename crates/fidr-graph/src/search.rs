//! Graph search helpers
//!
//! Read-only lookups over the in-memory graph: direct node access,
//! neighborhood expansion, and type or name based retrieval. These back
//! the query side of the pipeline.

use fidr_core::EntityType;

use crate::builder::KnowledgeGraph;
use crate::{GraphEdge, GraphNode};

impl KnowledgeGraph {
    /// Node by id
    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Edges touching a node, paired with the node at the other end
    ///
    /// Covers both directions; the edge itself says which way it points.
    pub fn neighbors(&self, id: &str) -> Vec<(&GraphEdge, &GraphNode)> {
        self.edges
            .values()
            .filter_map(|edge| {
                let other = if edge.source == id {
                    &edge.target
                } else if edge.target == id {
                    &edge.source
                } else {
                    return None;
                };
                self.nodes.get(other).map(|node| (edge, node))
            })
            .collect()
    }

    /// All nodes of the given entity type
    pub fn find_by_type(&self, entity_type: EntityType) -> Vec<&GraphNode> {
        self.nodes
            .values()
            .filter(|node| {
                node.properties
                    .get("entity_type")
                    .and_then(|v| v.as_str())
                    .is_some_and(|t| t == entity_type.as_str())
            })
            .collect()
    }

    /// Nodes whose name contains the query, case-insensitively
    pub fn find_by_name(&self, query: &str) -> Vec<&GraphNode> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.nodes
            .values()
            .filter(|node| {
                node.properties
                    .get("name")
                    .and_then(|v| v.as_str())
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use fidr_core::{ExtractedEntity, ExtractedRelation, Provenance, RelationType};
    use fidr_ontology::OntologySchema;

    fn entity(text: &str, entity_type: EntityType) -> ExtractedEntity {
        ExtractedEntity {
            text: text.to_string(),
            entity_type,
            start: 0,
            end: text.len(),
            confidence: 0.9,
            ontology_class: None,
            normalized_text: None,
            properties: HashMap::new(),
            provenance: Provenance::Pattern,
        }
    }

    fn sample_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new(Arc::new(OntologySchema::new()));
        graph
            .add_relation(
                &ExtractedRelation {
                    subject: entity("Apple Inc.", EntityType::Company),
                    predicate: RelationType::CompetesWith,
                    object: entity("Microsoft Corporation", EntityType::Company),
                    confidence: 0.85,
                    ontology_property: None,
                    evidence: String::new(),
                    properties: HashMap::new(),
                },
                "doc-1",
            )
            .unwrap();
        graph
            .add_entity(&entity("Tim Cook", EntityType::Person), "doc-1")
            .unwrap();
        graph
    }

    #[test]
    fn test_get_node() {
        let graph = sample_graph();
        let id = KnowledgeGraph::node_id(EntityType::Company, "Apple Inc.");
        assert!(graph.get_node(&id).is_some());
        assert!(graph.get_node("missing").is_none());
    }

    #[test]
    fn test_neighbors_both_directions() {
        let graph = sample_graph();
        let apple = KnowledgeGraph::node_id(EntityType::Company, "Apple Inc.");
        let microsoft = KnowledgeGraph::node_id(EntityType::Company, "Microsoft Corporation");

        let from_apple = graph.neighbors(&apple);
        assert_eq!(from_apple.len(), 1);
        assert_eq!(from_apple[0].1.id, microsoft);

        let from_microsoft = graph.neighbors(&microsoft);
        assert_eq!(from_microsoft.len(), 1);
        assert_eq!(from_microsoft[0].1.id, apple);
    }

    #[test]
    fn test_find_by_type() {
        let graph = sample_graph();
        assert_eq!(graph.find_by_type(EntityType::Company).len(), 2);
        assert_eq!(graph.find_by_type(EntityType::Person).len(), 1);
        assert!(graph.find_by_type(EntityType::Revenue).is_empty());
    }

    #[test]
    fn test_find_by_name_fuzzy() {
        let graph = sample_graph();
        assert_eq!(graph.find_by_name("apple").len(), 1);
        assert_eq!(graph.find_by_name("MICROSOFT").len(), 1);
        assert!(graph.find_by_name("  ").is_empty());
        assert!(graph.find_by_name("Oracle").is_empty());
    }
}
