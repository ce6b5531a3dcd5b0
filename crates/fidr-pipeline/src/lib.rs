//! FinIDR pipeline orchestration
//!
//! Wires the classifier, entity extractor, relation extractor and knowledge
//! graph into a single document-processing surface:
//!
//! 1. Classify the document against filing signatures
//! 2. Extract entities (per section when a section map is provided)
//! 3. Extract and validate relations
//! 4. Merge everything into the shared knowledge graph
//!
//! Extraction is synchronous and lock-free; only the final graph merge
//! takes the write lock. Queries and exports run under read locks.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use fidr_core::{
    ExtractedEntity, ExtractedRelation, FidrError, LlmClient, PipelineConfig, Result,
};
use fidr_extractor::{
    Classification, DocumentClassifier, EntityExtractor, EntityPatternSet, Evaluator,
    RelationExtractor,
};
use fidr_graph::{GraphStats, KnowledgeGraph};
use fidr_ontology::OntologySchema;

pub mod query;
pub mod registry;

pub use fidr_extractor::{AggregateMetrics, GoldAnnotations, GoldEntity, GoldRelation};
pub use query::{QueryAnswer, QuestionKind};
pub use registry::{CompanyInfo, CompanyRegistry, Sector};

/// Named document sections with their content, e.g. `("item_1a", text)`
pub type SectionMap = [(String, String)];

/// Export formats for the knowledge graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Cypher,
    Json,
    Turtle,
}

/// Outcome of processing one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub document_id: String,
    pub classification: Classification,
    pub entities: Vec<ExtractedEntity>,
    pub relations: Vec<ExtractedRelation>,
    /// Nodes the graph gained from this document
    pub nodes_added: usize,
    /// Edges the graph gained from this document
    pub edges_added: usize,
    pub processing_time_ms: u64,
    pub success: bool,
}

/// Cumulative pipeline statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineStats {
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub total_entities: usize,
    pub total_relations: usize,
    pub total_nodes: usize,
    pub total_edges: usize,
}

/// End-to-end document processing pipeline
pub struct Pipeline {
    classifier: DocumentClassifier,
    entity_extractor: EntityExtractor,
    relation_extractor: RelationExtractor,
    schema: Arc<OntologySchema>,
    registry: CompanyRegistry,
    graph: RwLock<KnowledgeGraph>,
    stats: RwLock<PipelineStats>,
    llm: Option<Arc<dyn LlmClient>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let schema = Arc::new(OntologySchema::new());
        let patterns = Arc::new(EntityPatternSet::new());

        let classifier = DocumentClassifier::new(config.classifier.clone(), &schema);
        let entity_extractor = EntityExtractor::new(config.extractor.clone(), patterns);
        let relation_extractor =
            RelationExtractor::new(config.relations.clone(), Arc::clone(&schema));
        let graph = KnowledgeGraph::with_config(Arc::clone(&schema), config.graph.clone());

        Self {
            classifier,
            entity_extractor,
            relation_extractor,
            schema,
            registry: CompanyRegistry::new(),
            graph: RwLock::new(graph),
            stats: RwLock::new(PipelineStats::default()),
            llm: None,
        }
    }

    /// Attach a text-generation backend for query answering
    pub fn with_llm_client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(client);
        self
    }

    pub fn schema(&self) -> &OntologySchema {
        &self.schema
    }

    pub fn registry(&self) -> &CompanyRegistry {
        &self.registry
    }

    pub(crate) fn graph(&self) -> &RwLock<KnowledgeGraph> {
        &self.graph
    }

    pub(crate) fn llm_client(&self) -> Option<&Arc<dyn LlmClient>> {
        self.llm.as_ref()
    }

    /// Process one document through the full pipeline
    ///
    /// Classification and extraction run without touching the graph; the
    /// graph mutates only after both succeed, so a failed document never
    /// leaves partial state behind.
    pub fn process(
        &self,
        text: &str,
        document_id: &str,
        sections: Option<&SectionMap>,
    ) -> Result<ProcessingResult> {
        let started = Instant::now();

        if text.trim().is_empty() {
            self.record_failure();
            return Err(FidrError::Validation(
                "document text is empty".to_string(),
            ));
        }

        let classification = self.classifier.classify(text);

        // Entity spans are relative to the text they were extracted from,
        // so relation matching must run over that same text: per section
        // in section mode, over the whole document otherwise.
        let (entities, relations) = match sections {
            Some(sections) if !sections.is_empty() => {
                let mut entities = Vec::new();
                let mut relations = Vec::new();
                for (name, content) in sections {
                    let mut section_entities =
                        self.entity_extractor.extract_from_section(content, name)?;
                    self.annotate_ontology(&mut section_entities);
                    relations
                        .extend(self.relation_extractor.extract(content, &section_entities)?);
                    entities.extend(section_entities);
                }
                (entities, relations)
            }
            _ => {
                let mut entities = self.entity_extractor.extract(text, None)?;
                self.annotate_ontology(&mut entities);
                let relations = self.relation_extractor.extract(text, &entities)?;
                (entities, relations)
            }
        };

        let (nodes_added, edges_added) = {
            let mut graph = self
                .graph
                .write()
                .map_err(|_| FidrError::Other(anyhow::anyhow!("graph lock poisoned")))?;

            let nodes_before = graph.node_count();
            let edges_before = graph.edge_count();

            for entity in &entities {
                graph.add_entity(entity, document_id)?;
            }
            for relation in &relations {
                graph.add_relation(relation, document_id)?;
            }

            (
                graph.node_count() - nodes_before,
                graph.edge_count() - edges_before,
            )
        };

        let result = ProcessingResult {
            document_id: document_id.to_string(),
            classification,
            nodes_added,
            edges_added,
            processing_time_ms: started.elapsed().as_millis() as u64,
            success: true,
            entities,
            relations,
        };

        if let Ok(mut stats) = self.stats.write() {
            stats.documents_processed += 1;
            stats.total_entities += result.entities.len();
            stats.total_relations += result.relations.len();
            stats.total_nodes += nodes_added;
            stats.total_edges += edges_added;
        }

        info!(
            document_id,
            document_type = %result.classification.document_type,
            entities = result.entities.len(),
            relations = result.relations.len(),
            nodes_added,
            edges_added,
            "document processed"
        );

        Ok(result)
    }

    /// Stamp each entity with its mapped ontology class URI
    ///
    /// Runs before relation extraction so the entity copies embedded in
    /// relation triples carry the annotation too.
    fn annotate_ontology(&self, entities: &mut [ExtractedEntity]) {
        for entity in entities {
            if entity.ontology_class.is_none() {
                entity.ontology_class = self
                    .schema
                    .map_entity_type(entity.entity_type)
                    .ok()
                    .map(str::to_string);
            }
        }
    }

    fn record_failure(&self) {
        if let Ok(mut stats) = self.stats.write() {
            stats.documents_failed += 1;
        }
        warn!("document rejected before extraction");
    }

    /// Score extraction quality against gold annotations
    ///
    /// Runs the extractors over the text without touching the graph, so an
    /// evaluation run never pollutes pipeline state.
    pub fn evaluate(&self, text: &str, gold: &GoldAnnotations) -> Result<AggregateMetrics> {
        if text.trim().is_empty() {
            return Err(FidrError::Validation(
                "document text is empty".to_string(),
            ));
        }

        let mut entities = self.entity_extractor.extract(text, None)?;
        self.annotate_ontology(&mut entities);
        let relations = self.relation_extractor.extract(text, &entities)?;

        let evaluator = Evaluator::new();
        let mut metrics = AggregateMetrics::default();
        metrics.record(
            evaluator.evaluate_entities(&entities, &gold.entities),
            evaluator.evaluate_relations(&relations, &gold.relations),
        );
        Ok(metrics)
    }

    /// Export the graph in the requested format
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        let graph = self
            .graph
            .read()
            .map_err(|_| FidrError::Other(anyhow::anyhow!("graph lock poisoned")))?;

        match format {
            ExportFormat::Cypher => Ok(graph.to_cypher()),
            ExportFormat::Json => graph.to_json(),
            ExportFormat::Turtle => graph.to_turtle(),
        }
    }

    /// Graph composition snapshot
    pub fn statistics(&self) -> Result<GraphStats> {
        let graph = self
            .graph
            .read()
            .map_err(|_| FidrError::Other(anyhow::anyhow!("graph lock poisoned")))?;
        Ok(graph.get_statistics())
    }

    /// Cumulative processing statistics
    pub fn pipeline_stats(&self) -> PipelineStats {
        self.stats
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}
