//! Knowledge-graph construction for FinIDR
//!
//! Builds a property graph from extracted entities and relations, with
//! content-addressed node identifiers, ontology-validated edges, and
//! deterministic exports (Cypher script, JSON document, Turtle triples).
//!
//! The graph itself is in-memory. External persistence goes through the
//! [`GraphStore`] trait; no concrete driver ships with this crate.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use fidr_core::{RelationType, Result};

pub mod builder;
pub mod export;
pub mod search;

pub use builder::{GraphStats, KnowledgeGraph};
pub use export::GraphDocument;

/// A node in the knowledge graph
///
/// Labels are ordered: `Entity` first, the concrete type second, ontology
/// ancestors after. Properties hold the merged view across every document
/// that mentioned the underlying entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub labels: Vec<String>,
    pub properties: HashMap<String, serde_json::Value>,
}

/// A directed, typed edge between two nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relation: RelationType,
    pub properties: HashMap<String, serde_json::Value>,
}

/// Identity of an edge: one edge per (source, target, relation) triple
///
/// Re-asserting an existing triple merges into the edge instead of
/// duplicating it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey(pub String, pub String, pub RelationType);

/// External graph persistence boundary
///
/// Implementations push nodes and edges to an external store. Failures
/// surface as [`fidr_core::FidrError::ExternalStore`]; the in-memory graph
/// is never affected by a store error.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Persist a single node
    async fn store_node(&self, node: &GraphNode) -> Result<()>;

    /// Persist a single edge
    async fn store_edge(&self, edge: &GraphEdge) -> Result<()>;

    /// Replay an entire graph into the store, nodes before edges
    async fn replay(&self, graph: &KnowledgeGraph) -> Result<()> {
        for node in graph.nodes() {
            self.store_node(node).await?;
        }
        for edge in graph.edges() {
            self.store_edge(edge).await?;
        }
        Ok(())
    }
}
