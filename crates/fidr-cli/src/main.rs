//! FinIDR CLI - Command-line interface
//!
//! Usage:
//!   fidr process <path> [--doc-id <id>]
//!   fidr query <question>
//!   fidr export --format <cypher|json|turtle> [--output <path>]
//!   fidr evaluate <path> --gold <annotations.json>
//!   fidr stats
//!   fidr companies [--sector <name>]

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use fidr_core::PipelineConfig;
use fidr_pipeline::{ExportFormat, GoldAnnotations, Pipeline, Sector};

#[derive(Parser)]
#[command(name = "fidr")]
#[command(about = "Financial document extraction and knowledge-graph CLI")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a document into the knowledge graph
    Process {
        /// Path to the document text file
        path: PathBuf,
        /// Document identifier; defaults to the file name
        #[arg(long)]
        doc_id: Option<String>,
    },
    /// Ask a question against the knowledge graph
    Query {
        /// Question to ask
        question: String,
    },
    /// Export the knowledge graph
    Export {
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Score extraction quality against a gold annotation file
    Evaluate {
        /// Path to the document text file
        path: PathBuf,
        /// Path to the gold annotations (JSON with entities and relations)
        #[arg(long)]
        gold: PathBuf,
    },
    /// Show graph statistics
    Stats,
    /// List registered companies
    Companies {
        /// Restrict to one sector
        #[arg(long)]
        sector: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Cypher,
    Json,
    Turtle,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Cypher => ExportFormat::Cypher,
            Format::Json => ExportFormat::Json,
            Format::Turtle => ExportFormat::Turtle,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PipelineConfig::from_env().context("reading configuration from environment")?,
    };
    let pipeline = Pipeline::new(config);

    match cli.command {
        Commands::Process { path, doc_id } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let doc_id = doc_id.unwrap_or_else(|| {
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "document".to_string())
            });

            let result = pipeline.process(&text, &doc_id, None)?;
            println!(
                "Processed {} as {} (confidence {:.2})",
                result.document_id, result.classification.document_type, result.classification.confidence
            );
            println!(
                "  entities: {}  relations: {}  nodes added: {}  edges added: {}",
                result.entities.len(),
                result.relations.len(),
                result.nodes_added,
                result.edges_added
            );
        }
        Commands::Query { question } => {
            let answer = pipeline.query(&question).await?;
            println!("{}", answer.answer);
            println!();
            println!("Retrieval query:\n{}", answer.cypher_query);
            println!(
                "({} nodes, {} edges, confidence {:.2})",
                answer.retrieved_nodes, answer.retrieved_edges, answer.confidence
            );
        }
        Commands::Export { format, output } => {
            let rendered = pipeline.export(format.into())?;
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Exported graph to {}", path.display());
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Evaluate { path, gold } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let raw = std::fs::read_to_string(&gold)
                .with_context(|| format!("reading {}", gold.display()))?;
            let annotations: GoldAnnotations = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", gold.display()))?;

            let metrics = pipeline.evaluate(&text, &annotations)?;
            print!("{}", metrics.report());
        }
        Commands::Stats => {
            let stats = pipeline.statistics()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Companies { sector } => {
            let registry = pipeline.registry();
            let companies: Vec<_> = match sector.as_deref() {
                Some(name) => {
                    let sector = Sector::parse(name)
                        .with_context(|| format!("unknown sector '{name}'"))?;
                    registry.by_sector(sector)
                }
                None => registry.all().iter().collect(),
            };

            for company in companies {
                println!(
                    "{:6} {:42} CIK {}  {}",
                    company.ticker,
                    company.name,
                    company.cik_padded(),
                    company.sector
                );
            }
        }
    }

    Ok(())
}
