//! Graph exports
//!
//! Three pure projections of the in-memory graph: a Cypher merge script
//! for property-graph databases, a JSON document that round-trips through
//! [`GraphDocument`], and Turtle triples using the ontology's namespace
//! bindings. Exports never mutate the graph, and ordered iteration makes
//! the output byte-stable for a given graph state.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use fidr_core::{EntityType, FidrError, Result};

use crate::builder::KnowledgeGraph;
use crate::{GraphEdge, GraphNode};

/// Serializable snapshot of a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub version: u32,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl KnowledgeGraph {
    // ------------------------------------------------------------------
    // Cypher
    // ------------------------------------------------------------------

    /// Export as a Cypher merge script
    ///
    /// The script is idempotent: `MERGE` on node ids and on edge triples,
    /// with `SET +=` carrying the properties.
    pub fn to_cypher(&self) -> String {
        let mut out = String::new();

        out.push_str("// FinIDR knowledge graph export\n");
        out.push_str("CREATE CONSTRAINT entity_id IF NOT EXISTS ");
        out.push_str("FOR (n:Entity) REQUIRE n.id IS UNIQUE;\n");
        out.push_str("CREATE INDEX entity_name IF NOT EXISTS FOR (n:Entity) ON (n.name);\n\n");

        for node in self.nodes.values() {
            let labels = node.labels.join(":");
            let _ = writeln!(
                out,
                "MERGE (n:{} {{id: '{}'}}) SET n += {};",
                labels,
                escape_cypher(&node.id),
                cypher_map(&node.properties),
            );
        }

        out.push('\n');
        for edge in self.edges.values() {
            let _ = writeln!(
                out,
                "MATCH (a {{id: '{}'}})\nMATCH (b {{id: '{}'}})\nMERGE (a)-[r:{}]->(b) SET r += {};",
                escape_cypher(&edge.source),
                escape_cypher(&edge.target),
                edge.relation.as_str(),
                cypher_map(&edge.properties),
            );
        }

        out
    }

    // ------------------------------------------------------------------
    // JSON document
    // ------------------------------------------------------------------

    /// Snapshot the graph as a serializable document
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            version: 1,
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
        }
    }

    /// Load nodes and edges from a document, replacing current contents
    ///
    /// Ids, labels and edge triples are taken as stored, so a round trip
    /// through [`to_document`](Self::to_document) reconstructs an
    /// identical graph.
    pub fn from_document(&mut self, document: GraphDocument) -> Result<()> {
        if document.version != 1 {
            return Err(FidrError::Validation(format!(
                "unsupported graph document version {}",
                document.version
            )));
        }

        self.clear();
        for node in document.nodes {
            self.nodes.insert(node.id.clone(), node);
        }
        for edge in document.edges {
            let key = crate::EdgeKey(edge.source.clone(), edge.target.clone(), edge.relation);
            self.edges.insert(key, edge);
        }
        Ok(())
    }

    /// Export as a JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_document())
            .map_err(|e| FidrError::Validation(format!("graph serialization failed: {e}")))
    }

    // ------------------------------------------------------------------
    // Turtle
    // ------------------------------------------------------------------

    /// Export as Turtle triples under the ontology's namespaces
    pub fn to_turtle(&self) -> Result<String> {
        let mut out = String::new();

        for (prefix, namespace) in self.schema().prefix_bindings() {
            let _ = writeln!(out, "@prefix {prefix}: <{namespace}> .");
        }
        out.push('\n');

        for node in self.nodes.values() {
            let class = self.node_class_term(node)?;
            let _ = writeln!(out, "fidr:{} a {class} ;", turtle_local(&node.id));

            if let Some(name) = node.properties.get("name").and_then(|v| v.as_str()) {
                let _ = writeln!(out, "    rdfs:label \"{}\" ;", escape_turtle(name));
            }
            if let Some(value) = node.properties.get("value").and_then(|v| v.as_f64()) {
                let _ = writeln!(out, "    fidr:value \"{value}\"^^xsd:decimal ;");
            }
            if let Some(confidence) = node.properties.get("confidence").and_then(|v| v.as_f64()) {
                let _ = writeln!(out, "    fidr:confidence \"{confidence}\"^^xsd:decimal ;");
            }

            // Replace the trailing " ;" with " ."
            while out.ends_with(" ;\n") {
                out.truncate(out.len() - 3);
                break;
            }
            out.push_str(" .\n");
        }

        out.push('\n');
        for edge in self.edges.values() {
            let property = self
                .schema()
                .map_relation_type(edge.relation)
                .map(|uri| self.compact_uri(uri))?;
            let _ = writeln!(
                out,
                "fidr:{} {property} fidr:{} .",
                turtle_local(&edge.source),
                turtle_local(&edge.target),
            );
        }

        Ok(out)
    }

    /// Prefixed class term for a node, from its stored entity type
    fn node_class_term(&self, node: &GraphNode) -> Result<String> {
        let entity_type = node
            .properties
            .get("entity_type")
            .and_then(|v| v.as_str())
            .and_then(EntityType::parse)
            .ok_or_else(|| {
                FidrError::Validation(format!("node {} has no valid entity_type", node.id))
            })?;

        let uri = self.schema().map_entity_type(entity_type)?;
        Ok(self.compact_uri(uri))
    }

    /// Compress a full URI into prefix:local using the ontology bindings
    fn compact_uri(&self, uri: &str) -> String {
        for (prefix, namespace) in self.schema().prefix_bindings() {
            if let Some(local) = uri.strip_prefix(namespace) {
                return format!("{prefix}:{local}");
            }
        }
        format!("<{uri}>")
    }
}

fn escape_cypher(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn escape_turtle(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render a node id as a Turtle local name
///
/// Node ids keep characters like `&` or `%` from company names, which are
/// not legal in a prefixed local name; anything outside alphanumerics,
/// `_` and `-` becomes `_`.
fn turtle_local(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Render properties as a Cypher map literal
fn cypher_map(properties: &std::collections::HashMap<String, serde_json::Value>) -> String {
    let mut keys: Vec<&String> = properties.keys().collect();
    keys.sort();

    let entries: Vec<String> = keys
        .into_iter()
        .filter_map(|key| cypher_value(&properties[key]).map(|v| format!("{key}: {v}")))
        .collect();

    format!("{{{}}}", entries.join(", "))
}

/// Render a JSON value as a Cypher literal, skipping nested objects
fn cypher_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(format!("'{}'", escape_cypher(s))),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Array(items) => {
            let rendered: Vec<String> = items.iter().filter_map(cypher_value).collect();
            Some(format!("[{}]", rendered.join(", ")))
        }
        serde_json::Value::Null | serde_json::Value::Object(_) => None,
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
                    predicate: RelationType::Reported,
                    object: entity("$120 billion", EntityType::Revenue),
                    confidence: 0.85,
                    ontology_property: None,
                    evidence: "Apple Inc. reported revenue of $120 billion".to_string(),
                    properties: HashMap::new(),
                },
                "doc-1",
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_cypher_export() {
        let cypher = sample_graph().to_cypher();
        assert!(cypher.contains("CREATE CONSTRAINT"));
        assert!(cypher.contains("MERGE (n:Entity:Company"));
        assert!(cypher.contains("[r:REPORTED]"));
    }

    #[test]
    fn test_cypher_escapes_quotes() {
        let mut graph = KnowledgeGraph::new(Arc::new(OntologySchema::new()));
        graph
            .add_entity(&entity("O'Reilly Inc.", EntityType::Company), "doc-1")
            .unwrap();
        let cypher = graph.to_cypher();
        assert!(cypher.contains("O\\'Reilly"));
    }

    #[test]
    fn test_json_round_trip() {
        let graph = sample_graph();
        let document = graph.to_document();
        let json = serde_json::to_string(&document).unwrap();
        let restored: GraphDocument = serde_json::from_str(&json).unwrap();

        let mut other = KnowledgeGraph::new(Arc::new(OntologySchema::new()));
        other.from_document(restored).unwrap();

        assert_eq!(other.node_count(), graph.node_count());
        assert_eq!(other.edge_count(), graph.edge_count());

        let ids: Vec<&String> = graph.nodes.keys().collect();
        let restored_ids: Vec<&String> = other.nodes.keys().collect();
        assert_eq!(ids, restored_ids);

        let keys: Vec<_> = graph.edges.keys().collect();
        let restored_keys: Vec<_> = other.edges.keys().collect();
        assert_eq!(keys, restored_keys);
    }

    #[test]
    fn test_from_document_rejects_unknown_version() {
        let mut graph = KnowledgeGraph::new(Arc::new(OntologySchema::new()));
        let document = GraphDocument {
            version: 2,
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        assert!(graph.from_document(document).is_err());
    }

    #[test]
    fn test_turtle_export() {
        let turtle = sample_graph().to_turtle().unwrap();
        assert!(turtle.contains("@prefix fidr:"));
        assert!(turtle.contains("a sei-co:Company"));
        assert!(turtle.contains("rdfs:label \"Apple Inc.\""));
        assert!(turtle.contains("sei-fin:reported"));
    }

    #[test]
    fn test_turtle_local_names_stay_legal() {
        let mut graph = KnowledgeGraph::new(Arc::new(OntologySchema::new()));
        graph
            .add_entity(&entity("JPMorgan Chase & Co.", EntityType::Company), "doc-1")
            .unwrap();
        graph
            .add_entity(&entity("42%", EntityType::Percentage), "doc-1")
            .unwrap();

        let turtle = graph.to_turtle().unwrap();
        assert!(turtle.contains("fidr:Company_jpmorgan_chase___co"));

        for line in turtle.lines() {
            if let Some(rest) = line.strip_prefix("fidr:") {
                let local: String = rest.chars().take_while(|c| !c.is_whitespace()).collect();
                assert!(
                    local
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
                    "illegal local name: fidr:{local}"
                );
            }
        }
    }

    #[test]
    fn test_export_is_deterministic() {
        let graph = sample_graph();
        assert_eq!(graph.to_cypher(), graph.to_cypher());
        assert_eq!(graph.to_turtle().unwrap(), graph.to_turtle().unwrap());
    }
}
