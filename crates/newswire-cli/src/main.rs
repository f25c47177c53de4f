//! Newswire CLI
//!
//! Usage:
//!   newswire ingest
//!   newswire ask <question>

use clap::{Parser, Subcommand};
use newswire_core::AppConfig;
use newswire_embed::{BatchPolicy, BatchedEmbedder, JinaEmbedding, QueryEmbedder};
use newswire_harvest::FeedHarvester;
use newswire_ingest::IngestionRunner;
use newswire_rag::{create_llm_client, AnswerConfig, AnswerEngine};
use newswire_vector::QdrantArticleStore;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "newswire")]
#[command(about = "News feed ingestion and retrieval-augmented chat")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file; environment variables are used otherwise
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest configured sources, embed, and store articles
    Ingest,
    /// Ask a question over the ingested articles
    Ask {
        /// Question to ask
        question: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    // Unreachable stores are the only process-fatal setup condition.
    let store = Arc::new(QdrantArticleStore::new(&config.database).await?);
    store.init_collection().await?;

    match cli.command {
        Commands::Ingest => {
            let harvester = Arc::new(FeedHarvester::new(config.harvest.clone())?);
            let provider = Arc::new(JinaEmbedding::from_config(&config.embedding)?);
            let embedder =
                BatchedEmbedder::new(provider, BatchPolicy::from_config(&config.embedding));

            let runner = IngestionRunner::new(
                config.sources.clone(),
                harvester,
                embedder,
                store,
                config.ingest.dedupe_by_content,
            );

            let report = runner.run().await?;
            println!(
                "Collected {} articles. Embedded & stored: {}. Skipped: {}.",
                report.collected, report.stored, report.skipped
            );
        }
        Commands::Ask { question } => {
            let engine = AnswerEngine::new(
                QueryEmbedder::from_config(&config.embedding),
                store,
                create_llm_client(&config.llm),
                AnswerConfig {
                    max_history_turns: config.llm.max_history_turns,
                    ..AnswerConfig::default()
                },
            );

            let answer = engine.answer(&question, &[]).await?;
            println!("{}", answer.answer);

            if !answer.sources.is_empty() {
                println!("\nSources:");
                for source in &answer.sources {
                    match source.relevance_score {
                        Some(score) => println!(
                            "  - {} ({}) [score {score:.2}] {}",
                            source.title, source.source, source.url
                        ),
                        None => println!("  - {} ({}) {}", source.title, source.source, source.url),
                    }
                }
            }
        }
    }

    Ok(())
}
