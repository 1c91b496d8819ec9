use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vireo_core::config::AppConfig;
use vireo_core::traits::{ChatHistoryStore, VectorIndex, WorkflowStore};
use vireo_core::types::{DocumentRef, SessionId};
use vireo_core::workflow::WorkflowDefinition;
use vireo_engine::{validate, validate_strict, WorkflowEngine};
use vireo_memory::{chunk_text, EmbeddingIndex, HttpEmbeddingProvider, SqliteStore};

#[derive(Parser)]
#[command(name = "vireo", version, about = "Visual RAG workflow execution engine")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "vireo.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a workflow definition from a JSON file
    Import {
        /// Path to the definition, or "-" for stdin
        file: PathBuf,
    },
    /// Validate a stored workflow
    Validate {
        /// Workflow ID
        workflow_id: String,
        /// Also check for cycles, duplicate ids, and output reachability
        #[arg(long)]
        strict: bool,
    },
    /// Execute one turn of a workflow
    Run {
        /// Workflow ID
        workflow_id: String,
        /// The user query
        #[arg(trailing_var_arg = true)]
        query: Vec<String>,
        /// Continue an existing chat session
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Ingest a text document into a workflow's knowledge base
    Ingest {
        /// Workflow ID
        workflow_id: String,
        /// Path to the text file
        file: PathBuf,
        /// Max characters per chunk
        #[arg(long, default_value = "1200")]
        chunk_size: usize,
    },
    /// List workflows, or show a session transcript
    History {
        /// Session ID; omit to list stored workflows
        session: Option<String>,
        /// Max messages to show
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vireo=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    let store = Arc::new(SqliteStore::open(&PathBuf::from(&config.store.db_path))?);

    match cli.command {
        Commands::Import { file } => {
            let raw = if file == PathBuf::from("-") {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                std::fs::read_to_string(&file)?
            };
            let definition: WorkflowDefinition = serde_json::from_str(&raw)?;

            let report = validate(&definition.components, &definition.connections);
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            if !report.is_valid {
                for error in &report.errors {
                    eprintln!("error: {error}");
                }
                anyhow::bail!("workflow '{}' failed validation", definition.id);
            }

            store.insert_workflow(&definition)?;
            println!("Imported workflow '{}' ({})", definition.name, definition.id);
        }
        Commands::Validate {
            workflow_id,
            strict,
        } => {
            let definition = load_workflow(&store, &workflow_id).await?;
            let report = if strict {
                validate_strict(&definition.components, &definition.connections)
            } else {
                validate(&definition.components, &definition.connections)
            };

            for warning in &report.warnings {
                println!("warning: {warning}");
            }
            for error in &report.errors {
                println!("error: {error}");
            }
            if report.is_valid {
                println!("Workflow '{workflow_id}' is valid.");
            } else {
                anyhow::bail!("workflow '{workflow_id}' is invalid");
            }
        }
        Commands::Run {
            workflow_id,
            query,
            session,
        } => {
            let query = query.join(" ");
            if query.is_empty() {
                anyhow::bail!("empty query");
            }

            let index = Arc::new(open_index(&config)?);
            let model = vireo_llm::build_model(&config.model);
            let engine = WorkflowEngine::new(
                store.clone(),
                store.clone(),
                index,
                model,
                store.clone(),
                config.engine.clone(),
            );

            let session_id = session.map(|s| SessionId::from_str(&s));
            let outcome = engine.execute(&workflow_id, &query, session_id).await?;

            println!("{}", outcome.response);
            eprintln!(
                "\n[session {} | {}ms]",
                outcome.session_id, outcome.elapsed_ms
            );
            if let Some(sources) = outcome.metadata.get("sources") {
                eprintln!("[sources: {sources}]");
            }
        }
        Commands::Ingest {
            workflow_id,
            file,
            chunk_size,
        } => {
            // Fail early on unknown workflows rather than indexing orphans
            load_workflow(&store, &workflow_id).await?;

            let text = std::fs::read_to_string(&file)?;
            let chunks = chunk_text(&text, chunk_size);
            if chunks.is_empty() {
                anyhow::bail!("no text to ingest in {}", file.display());
            }

            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            let document = DocumentRef {
                id: uuid::Uuid::new_v4().to_string(),
                filename: filename.clone(),
            };

            let index = open_index(&config)?;
            let stored = index
                .upsert(
                    &document.id,
                    &chunks,
                    &serde_json::json!({ "filename": filename }),
                )
                .await?;
            store.insert_document(&workflow_id, &document)?;

            info!(document_id = %document.id, chunks = stored, "document ingested");
            println!("Ingested '{}' as {} ({} chunks)", filename, document.id, stored);
        }
        Commands::History { session, limit } => match session {
            Some(session) => {
                let session_id = SessionId::from_str(&session);
                let records = store.load_history(&session_id, limit).await?;
                if records.is_empty() {
                    println!("No messages in session {session}.");
                }
                for record in &records {
                    let marker = if record.is_error() { " [error]" } else { "" };
                    println!("[{}]{} {}", record.role.as_str(), marker, record.content);
                }
            }
            None => {
                let workflows = store.list_workflows()?;
                if workflows.is_empty() {
                    println!("No workflows stored. Use `vireo import` to add one.");
                }
                for wf in &workflows {
                    println!(
                        "{}  {} ({} components)",
                        wf.id,
                        wf.name,
                        wf.components.len()
                    );
                }
            }
        },
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

async fn load_workflow(store: &SqliteStore, workflow_id: &str) -> anyhow::Result<WorkflowDefinition> {
    store
        .get(workflow_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("workflow not found: {workflow_id}"))
}

fn open_index(config: &AppConfig) -> anyhow::Result<EmbeddingIndex> {
    let embedding = config
        .embedding
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("no [embedding] section in config; retrieval needs one"))?;
    let provider = Arc::new(HttpEmbeddingProvider::new(
        &embedding.base_url,
        embedding.api_key.as_deref(),
        &embedding.model,
        embedding.dimensions,
    ));
    Ok(EmbeddingIndex::open(
        &PathBuf::from(&config.store.index_path),
        provider,
    )?)
}
