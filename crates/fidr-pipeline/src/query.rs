//! Graph-backed question answering
//!
//! Classifies a natural-language question, retrieves the relevant subgraph,
//! and renders an answer. When a text-generation backend is attached the
//! formatted context goes through it; otherwise a deterministic template
//! answer is produced from the same context. Either way the equivalent
//! Cypher retrieval query is included in the result.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use fidr_core::{FidrError, Result};
use fidr_graph::{GraphEdge, GraphNode};

use crate::Pipeline;

/// Broad category of a question, used to pick the retrieval strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    Risk,
    Financial,
    Competitor,
    Product,
    General,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Risk => "risk",
            Self::Financial => "financial",
            Self::Competitor => "competitor",
            Self::Product => "product",
            Self::General => "general",
        }
    }

    /// Label to fall back on when the question names no known entity
    fn fallback_label(&self) -> &'static str {
        match self {
            Self::Risk => "Risk",
            Self::Financial => "FinancialMetric",
            Self::Competitor => "Company",
            Self::Product => "Product",
            Self::General => "Entity",
        }
    }
}

/// Answer to a graph query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub question: String,
    pub answer: String,
    /// Equivalent Cypher retrieval query
    pub cypher_query: String,
    /// Formatted subgraph context the answer was generated from
    pub context: String,
    pub confidence: f32,
    pub question_kind: QuestionKind,
    pub retrieved_nodes: usize,
    pub retrieved_edges: usize,
}

fn question_patterns() -> &'static [(QuestionKind, Vec<Regex>)] {
    static PATTERNS: OnceLock<Vec<(QuestionKind, Vec<Regex>)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |patterns: &[&str]| {
            patterns
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect::<Vec<_>>()
        };
        vec![
            (
                QuestionKind::Risk,
                compile(&[
                    r"(?:what|which)\s+(?:are\s+)?(?:the\s+)?(?:key\s+)?risks?",
                    r"risk\s+factors?",
                ]),
            ),
            (
                QuestionKind::Financial,
                compile(&[
                    r"(?:what\s+is|how\s+much)\s+(?:the\s+)?(?:revenue|sales|income)",
                    r"financial\s+(?:performance|results)",
                ]),
            ),
            (
                QuestionKind::Competitor,
                compile(&[
                    r"(?:who\s+are|what\s+are)\s+(?:the\s+)?competitors?",
                    r"competes?\s+(?:with|against)",
                ]),
            ),
            (
                QuestionKind::Product,
                compile(&[r"(?:what|which)\s+(?:are\s+)?(?:the\s+)?products?"]),
            ),
        ]
    })
}

/// First matching kind in declaration order, else General
pub fn classify_question(question: &str) -> QuestionKind {
    let lower = question.to_lowercase();
    for (kind, patterns) in question_patterns() {
        if patterns.iter().any(|p| p.is_match(&lower)) {
            return *kind;
        }
    }
    QuestionKind::General
}

fn cypher_template(kind: QuestionKind, entity_ids: &[String]) -> String {
    let entity_filter = if entity_ids.is_empty() {
        String::new()
    } else {
        let list = entity_ids
            .iter()
            .map(|id| format!("'{id}'"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("WHERE n.id IN [{list}]\n")
    };

    match kind {
        QuestionKind::Risk => format!(
            "MATCH (n:Company)-[r:FACES_RISK]->(risk:Risk)\n{entity_filter}RETURN n.name, risk.name, r.evidence LIMIT 20"
        ),
        QuestionKind::Financial => format!(
            "MATCH (n:Company)-[r:REPORTED]->(m:FinancialMetric)\n{entity_filter}RETURN n.name, m.name, m.value LIMIT 20"
        ),
        QuestionKind::Competitor => format!(
            "MATCH (n:Company)-[r:COMPETES_WITH]-(c:Company)\n{entity_filter}RETURN n.name, c.name LIMIT 20"
        ),
        QuestionKind::Product => format!(
            "MATCH (n:Company)-[r:MANUFACTURES|SELLS]->(p:Product)\n{entity_filter}RETURN n.name, p.name LIMIT 20"
        ),
        QuestionKind::General => {
            format!("MATCH (n)-[r]-(m)\n{entity_filter}RETURN n, r, m LIMIT 30")
        }
    }
}

fn node_name(node: &GraphNode) -> &str {
    node.properties
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or(&node.id)
}

fn format_context(nodes: &[GraphNode], edges: &[GraphEdge]) -> String {
    let mut lines = vec![
        "=== KNOWLEDGE GRAPH CONTEXT ===".to_string(),
        String::new(),
        "ENTITIES:".to_string(),
    ];

    for node in nodes.iter().take(15) {
        let entity_type = node
            .properties
            .get("entity_type")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown");
        lines.push(format!("  - {} ({entity_type})", node_name(node)));
        if let Some(value) = node.properties.get("value") {
            lines.push(format!("      value: {value}"));
        }
    }

    lines.push(String::new());
    lines.push("RELATIONSHIPS:".to_string());
    for edge in edges.iter().take(15) {
        let source = nodes
            .iter()
            .find(|n| n.id == edge.source)
            .map(node_name)
            .unwrap_or(&edge.source);
        let target = nodes
            .iter()
            .find(|n| n.id == edge.target)
            .map(node_name)
            .unwrap_or(&edge.target);
        lines.push(format!("  - {source} --[{}]--> {target}", edge.relation));

        if let Some(evidence) = edge.properties.get("evidence").and_then(|v| v.as_str()) {
            if !evidence.is_empty() {
                let snippet: String = evidence.chars().take(100).collect();
                lines.push(format!("      Evidence: \"{snippet}\""));
            }
        }
    }

    lines.join("\n")
}

fn template_answer(nodes: &[GraphNode], edges: &[GraphEdge]) -> String {
    if nodes.is_empty() && edges.is_empty() {
        return "No relevant information found.".to_string();
    }

    let mut answer = String::from("Based on the knowledge graph analysis:\n\n");

    if !nodes.is_empty() {
        answer.push_str("Entities identified:\n");
        for node in nodes.iter().take(5) {
            let entity_type = node
                .properties
                .get("entity_type")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown");
            answer.push_str(&format!("- {} ({entity_type})\n", node_name(node)));
        }
        answer.push('\n');
    }

    if !edges.is_empty() {
        answer.push_str("Relationships found:\n");
        for edge in edges.iter().take(5) {
            let source = nodes
                .iter()
                .find(|n| n.id == edge.source)
                .map(node_name)
                .unwrap_or(&edge.source);
            let target = nodes
                .iter()
                .find(|n| n.id == edge.target)
                .map(node_name)
                .unwrap_or(&edge.target);
            answer.push_str(&format!("- {source} {} {target}\n", edge.relation));
        }
    }

    answer
}

fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a financial knowledge analyst.\n\
         Answer the question using only the knowledge-graph context below.\n\
         If the context does not contain the answer, say so.\n\n\
         {context}\n\n\
         Question: {question}\n"
    )
}

impl Pipeline {
    /// Answer a natural-language question from the knowledge graph
    pub async fn query(&self, question: &str) -> Result<QueryAnswer> {
        if question.trim().is_empty() {
            return Err(FidrError::Validation("question is empty".to_string()));
        }

        let kind = classify_question(question);
        debug!(kind = kind.as_str(), "question classified");

        // Retrieve the subgraph under the read lock, cloning out what the
        // answer needs so generation can run without holding it.
        let (nodes, edges, entity_ids) = {
            let graph = self
                .graph()
                .read()
                .map_err(|_| FidrError::Other(anyhow::anyhow!("graph lock poisoned")))?;

            let question_lower = question.to_lowercase();
            let mut entity_ids: Vec<String> = Vec::new();
            for node in graph.nodes() {
                let name = node_name(node).to_lowercase();
                if name.len() > 2 && question_lower.contains(&name) {
                    entity_ids.push(node.id.clone());
                }
            }

            let mut seen: HashSet<String> = HashSet::new();
            let mut nodes: Vec<GraphNode> = Vec::new();

            for id in &entity_ids {
                if let Some(node) = graph.get_node(id) {
                    if seen.insert(node.id.clone()) {
                        nodes.push(node.clone());
                    }
                }
            }
            for id in &entity_ids {
                for (_, neighbor) in graph.neighbors(id) {
                    if seen.insert(neighbor.id.clone()) {
                        nodes.push(neighbor.clone());
                    }
                }
            }

            if entity_ids.is_empty() {
                let label = kind.fallback_label();
                for node in graph.nodes() {
                    if node.labels.iter().any(|l| l == label) {
                        if seen.insert(node.id.clone()) {
                            nodes.push(node.clone());
                        }
                        if nodes.len() >= 10 {
                            break;
                        }
                    }
                }
            }

            let edges: Vec<GraphEdge> = graph
                .edges()
                .filter(|e| seen.contains(&e.source) && seen.contains(&e.target))
                .cloned()
                .collect();

            (nodes, edges, entity_ids)
        };

        let context = format_context(&nodes, &edges);
        let cypher_query = cypher_template(kind, &entity_ids);
        let found_entities = !entity_ids.is_empty();

        let answer = match self.llm_client() {
            Some(client) => client.generate(&build_prompt(question, &context)).await?,
            None => template_answer(&nodes, &edges),
        };

        Ok(QueryAnswer {
            question: question.to_string(),
            answer,
            cypher_query,
            context,
            confidence: if found_entities { 0.7 } else { 0.3 },
            question_kind: kind,
            retrieved_nodes: nodes.len(),
            retrieved_edges: edges.len(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_question_kinds() {
        assert_eq!(
            classify_question("What are the key risks for Apple?"),
            QuestionKind::Risk
        );
        assert_eq!(
            classify_question("How much revenue did Microsoft report?"),
            QuestionKind::Financial
        );
        assert_eq!(
            classify_question("Who are the competitors of Intel?"),
            QuestionKind::Competitor
        );
        assert_eq!(
            classify_question("Which products does Apple sell?"),
            QuestionKind::Product
        );
        assert_eq!(
            classify_question("Tell me about Tesla"),
            QuestionKind::General
        );
    }

    #[test]
    fn test_cypher_template_with_filter() {
        let cypher = cypher_template(QuestionKind::Risk, &["Company_apple_12345678".to_string()]);
        assert!(cypher.contains("FACES_RISK"));
        assert!(cypher.contains("WHERE n.id IN ['Company_apple_12345678']"));

        let unfiltered = cypher_template(QuestionKind::Financial, &[]);
        assert!(unfiltered.contains("REPORTED"));
        assert!(!unfiltered.contains("WHERE"));
    }

    #[test]
    fn test_template_answer_empty() {
        assert_eq!(
            template_answer(&[], &[]),
            "No relevant information found."
        );
    }
}
