//! End-to-end pipeline tests
//!
//! Runs real documents through classification, extraction and graph
//! construction, and checks the structural guarantees the graph makes:
//! idempotent node identity, the relation validity gate, JSON round trips,
//! confidence bounds, and deterministic classification.

use std::collections::HashMap;
use std::sync::Arc;

use fidr_core::{
    DocumentType, EntityType, ExtractedEntity, ExtractedRelation, FidrError, PipelineConfig,
    Provenance, RelationType,
};
use fidr_graph::{GraphDocument, KnowledgeGraph};
use fidr_ontology::OntologySchema;
use fidr_pipeline::{
    ExportFormat, GoldAnnotations, GoldEntity, GoldRelation, Pipeline, QuestionKind,
};

const FORM_10K_HEADER: &str = "\
UNITED STATES SECURITIES AND EXCHANGE COMMISSION\n\
FORM 10-K\n\
ANNUAL REPORT PURSUANT TO SECTION 13 OR 15(d) OF THE SECURITIES EXCHANGE ACT OF 1934\n\
\n\
Item 1. Business\n\
Apple Inc. designs and sells consumer electronics.\n\
Item 1A. Risk Factors\n\
The company faces significant supply chain risk.\n\
Item 7. Management's Discussion and Analysis\n\
Item 8. Financial Statements\n";

fn pipeline() -> Pipeline {
    Pipeline::new(PipelineConfig::default())
}

#[test]
fn classifies_form_10k_with_high_confidence() {
    let p = pipeline();
    let result = p.process(FORM_10K_HEADER, "sec-10k-001", None).unwrap();

    assert_eq!(result.classification.document_type, DocumentType::Form10K);
    assert!(
        result.classification.confidence >= 0.8,
        "confidence {} too low",
        result.classification.confidence
    );
    assert!(result.success);
}

#[test]
fn extracts_company_and_typed_revenue() {
    let p = pipeline();
    let result = p
        .process("Apple Inc. reported revenue of $120 billion.", "doc-1", None)
        .unwrap();

    let company = result
        .entities
        .iter()
        .find(|e| e.entity_type == EntityType::Company)
        .expect("company entity");
    assert_eq!(company.text, "Apple Inc.");
    assert!(company.confidence >= 0.9);

    let revenue = result
        .entities
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
fn links_company_to_revenue_with_single_relation() {
    let p = pipeline();
    let result = p
        .process("Apple Inc. reported revenue of $120 billion.", "doc-1", None)
        .unwrap();

    assert_eq!(result.relations.len(), 1, "relations: {:?}", result.relations);
    let relation = &result.relations[0];
    assert_eq!(relation.subject.canonical_text(), "Apple Inc.");
    assert_eq!(relation.predicate, RelationType::Reported);
    assert_eq!(relation.object.text, "$120 billion");
    assert!(relation.ontology_property.is_some());
    assert_eq!(result.edges_added, 1);
}

#[test]
fn mentions_across_documents_merge_into_one_node() {
    let p = pipeline();
    p.process("Apple Inc. reported revenue of $120 billion.", "doc-1", None)
        .unwrap();
    p.process("Apple announced the iPhone.", "doc-2", None)
        .unwrap();

    let stats = p.statistics().unwrap();
    assert_eq!(stats.nodes_by_type.get("Company"), Some(&1));
}

#[test]
fn invalid_type_pair_creates_no_edge() {
    let mut graph = KnowledgeGraph::new(Arc::new(OntologySchema::new()));

    let entity = |text: &str, entity_type| ExtractedEntity {
        text: text.to_string(),
        entity_type,
        start: 0,
        end: text.len(),
        confidence: 0.9,
        ontology_class: None,
        normalized_text: None,
        properties: HashMap::new(),
        provenance: Provenance::Pattern,
    };

    let key = graph
        .add_relation(
            &ExtractedRelation {
                subject: entity("Acme Corp", EntityType::Company),
                predicate: RelationType::FacesRisk,
                object: entity("Jane Doe", EntityType::Person),
                confidence: 0.9,
                ontology_property: None,
                evidence: String::new(),
                properties: HashMap::new(),
            },
            "doc-1",
        )
        .unwrap();

    assert!(key.is_none());
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn graph_survives_json_round_trip() {
    let p = pipeline();
    p.process("Apple Inc. reported revenue of $120 billion.", "doc-1", None)
        .unwrap();

    let json = p.export(ExportFormat::Json).unwrap();
    let document: GraphDocument = serde_json::from_str(&json).unwrap();

    let mut restored = KnowledgeGraph::new(Arc::new(OntologySchema::new()));
    restored.from_document(document).unwrap();

    let stats = p.statistics().unwrap();
    assert_eq!(restored.node_count(), stats.total_nodes);
    assert_eq!(restored.edge_count(), stats.total_edges);
}

#[test]
fn confidences_stay_within_bounds() {
    let p = pipeline();
    let result = p.process(FORM_10K_HEADER, "doc-1", None).unwrap();

    assert!((0.0..=1.0).contains(&result.classification.confidence));
    for entity in &result.entities {
        assert!((0.0..=1.0).contains(&entity.confidence), "{entity:?}");
    }
    for relation in &result.relations {
        assert!((0.0..=1.0).contains(&relation.confidence), "{relation:?}");
    }
}

#[test]
fn classification_is_deterministic() {
    let p = pipeline();
    let first = p.process(FORM_10K_HEADER, "doc-1", None).unwrap();
    let second = p.process(FORM_10K_HEADER, "doc-2", None).unwrap();

    assert_eq!(
        first.classification.document_type,
        second.classification.document_type
    );
    assert_eq!(
        first.classification.confidence,
        second.classification.confidence
    );
}

#[test]
fn empty_document_is_rejected() {
    let p = pipeline();
    let err = p.process("   \n  ", "doc-1", None).unwrap_err();
    assert!(matches!(err, FidrError::Validation(_)));
    assert_eq!(p.pipeline_stats().documents_failed, 1);
    assert_eq!(p.statistics().unwrap().total_nodes, 0);
}

#[test]
fn section_map_restricts_and_stamps_entities() {
    let p = pipeline();
    let sections = vec![(
        "item_1a".to_string(),
        "We face supply chain disruption and currency risk.".to_string(),
    )];
    let result = p.process(FORM_10K_HEADER, "doc-1", Some(&sections)).unwrap();

    assert!(!result.entities.is_empty());
    for entity in &result.entities {
        assert_eq!(
            entity.properties.get("source_section").and_then(|v| v.as_str()),
            Some("item_1a")
        );
    }
}

#[test]
fn sectioned_processing_preserves_relations() {
    let p = pipeline();
    // Section content sits deep inside the document, so any confusion
    // between document and section offsets would push the entities out of
    // the relation matcher's resolution window.
    let sentence = "Apple Inc. reported revenue of $120 billion.";
    let text = format!("{}\n{sentence}", "boilerplate preamble ".repeat(40));
    let sections = vec![("item_7".to_string(), sentence.to_string())];

    let result = p.process(&text, "doc-1", Some(&sections)).unwrap();

    assert_eq!(result.relations.len(), 1, "relations: {:?}", result.relations);
    assert_eq!(result.relations[0].predicate, RelationType::Reported);
    assert_eq!(result.relations[0].subject.canonical_text(), "Apple Inc.");
    assert_eq!(result.edges_added, 1);
}

#[test]
fn entities_carry_ontology_class_annotations() {
    let p = pipeline();
    let result = p
        .process("Apple Inc. reported revenue of $120 billion.", "doc-1", None)
        .unwrap();

    assert!(!result.entities.is_empty());
    for entity in &result.entities {
        let expected = p.schema().map_entity_type(entity.entity_type).unwrap();
        assert_eq!(entity.ontology_class.as_deref(), Some(expected), "{entity:?}");
    }
    for relation in &result.relations {
        assert!(relation.subject.ontology_class.is_some());
        assert!(relation.object.ontology_class.is_some());
    }

    let json = p.export(ExportFormat::Json).unwrap();
    assert!(json.contains("\"ontology_class\""));
}

#[test]
fn evaluation_scores_extraction_against_gold() {
    let p = pipeline();
    let gold = GoldAnnotations {
        entities: vec![GoldEntity {
            text: "Apple Inc.".to_string(),
            entity_type: EntityType::Company,
            start: 0,
            end: 10,
        }],
        relations: vec![GoldRelation::new(
            "Apple Inc.",
            RelationType::Reported,
            "$120 billion",
        )],
    };

    let metrics = p
        .evaluate("Apple Inc. reported revenue of $120 billion.", &gold)
        .unwrap();

    assert_eq!(metrics.documents, 1);
    assert_eq!(metrics.entities.false_negatives, 0);
    assert_eq!(metrics.relations.true_positives, 1);
    assert!(metrics.relations.recall() > 0.99);
    assert_eq!(p.statistics().unwrap().total_nodes, 0);
}

#[tokio::test]
async fn query_answers_from_template_without_backend() {
    let p = pipeline();
    p.process(
        "Apple faces significant supply chain risk in Asia.",
        "doc-1",
        None,
    )
    .unwrap();

    let answer = p.query("What are the key risks for Apple Inc.?").await.unwrap();
    assert_eq!(answer.question_kind, QuestionKind::Risk);
    assert!(answer.retrieved_nodes > 0);
    assert!(answer.answer.contains("Apple Inc."));
    assert!(answer.cypher_query.contains("FACES_RISK"));
    assert!(answer.confidence > 0.5);
}

#[tokio::test]
async fn query_routes_context_through_attached_backend() {
    struct EchoBackend;

    #[async_trait::async_trait]
    impl fidr_core::LlmClient for EchoBackend {
        async fn generate(&self, prompt: &str) -> fidr_core::Result<String> {
            Ok(format!("echo: {prompt}"))
        }
    }

    let p = pipeline().with_llm_client(Arc::new(EchoBackend));
    p.process(
        "Apple faces significant supply chain risk in Asia.",
        "doc-1",
        None,
    )
    .unwrap();

    let answer = p.query("What are the key risks for Apple Inc.?").await.unwrap();
    assert!(answer.answer.starts_with("echo:"));
    assert!(answer.answer.contains("KNOWLEDGE GRAPH CONTEXT"));
    assert!(answer.answer.contains("What are the key risks for Apple Inc.?"));
}

#[tokio::test]
async fn empty_question_is_rejected() {
    let p = pipeline();
    let err = p.query("  ").await.unwrap_err();
    assert!(matches!(err, FidrError::Validation(_)));
}
