// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use repo_insight::utils::logging::{
    format_error, format_info, format_step, format_success, format_warning,
};
use repo_insight::{
    ChatModel, Config, DatabaseClient, EmbeddingProvider, GitRepositoryExtractor,
    OpenAiChatClient, OpenAiEmbeddingClient, PipelineStats, QdrantStore, RecordStore,
    RepositoryProcessor, RepositoryService, SchemaManager, SetupRepository, VectorStoreGateway,
    api,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "repo_insight")]
#[command(version)]
#[command(about = "Per-file code analysis pipeline for GitHub repositories", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve POST /repository/setup over HTTP
    Serve {
        /// Overrides server.bind
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Clone and process one repository branch
    Setup {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        repo: String,

        #[arg(long, default_value = "main")]
        branch: String,

        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Process an existing checkout
    Process {
        path: PathBuf,
    },

    /// Create the relational schema
    Migrate {
        /// Drop every table first
        #[arg(long)]
        reset: bool,
    },

    /// Print relational row counts
    Stats {
        /// List the runs recorded for one repository name
        #[arg(long, value_name = "NAME")]
        repository: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    repo_insight::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        let config = Config::default_config();
        config.validate().context("Built-in configuration is invalid")?;
        config
    };

    match cli.command {
        Commands::Serve { bind } => cmd_serve(&config, cli.color, bind).await,
        Commands::Setup {
            owner,
            repo,
            branch,
            token,
        } => {
            let request = SetupRepository::new(token, owner, repo, branch);
            cmd_setup(&config, cli.color, request).await
        }
        Commands::Process { path } => cmd_process(&config, cli.color, path).await,
        Commands::Migrate { reset } => cmd_migrate(&config, reset).await,
        Commands::Stats { repository } => cmd_stats(&config, repository).await,
    }
}

/// Opens the database and makes sure the schema exists.
async fn open_database(config: &Config) -> Result<DatabaseClient> {
    let client = DatabaseClient::new(config.database.clone())
        .await
        .context("Failed to open SQLite database")?;

    let schema = SchemaManager::new(&client);
    if !schema.verify_schema().await? {
        warn!("Database schema incomplete, initializing");
        schema
            .initialize()
            .await
            .context("Failed to initialize schema")?;
    }

    Ok(client)
}

fn build_gateway(config: &Config) -> Result<VectorStoreGateway> {
    let store = Arc::new(
        QdrantStore::new(&config.vector_store).context("Failed to create Qdrant client")?,
    );
    Ok(VectorStoreGateway::from_config(store, &config.vector_store))
}

fn build_processor(
    config: &Config,
    database: &DatabaseClient,
    gateway: VectorStoreGateway,
    color: bool,
) -> Result<RepositoryProcessor> {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(
        OpenAiEmbeddingClient::new(&config.embedding)
            .context("Failed to create embedding client")?,
    );
    let chat: Arc<dyn ChatModel> = Arc::new(
        OpenAiChatClient::new(&config.llm).context("Failed to create chat completion client")?,
    );

    let pipeline = RepositoryProcessor::standard_pipeline(config, embedder, chat)
        .context("Failed to build file pipeline")?;
    let records = RecordStore::new(database.pool().clone());

    Ok(RepositoryProcessor::new(pipeline, gateway, records, &config.pipeline).with_color(color))
}

fn build_service(
    config: &Config,
    database: &DatabaseClient,
    gateway: VectorStoreGateway,
    color: bool,
) -> Result<RepositoryService> {
    let processor = build_processor(config, database, gateway, color)?;
    let extractor = GitRepositoryExtractor::new(&config.storage.base_path);
    Ok(RepositoryService::new(extractor, Arc::new(processor)))
}

async fn cmd_serve(config: &Config, color: bool, bind: Option<String>) -> Result<()> {
    let database = open_database(config).await?;
    let gateway = build_gateway(config)?;
    let service = build_service(config, &database, gateway.clone(), color)?;
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());

    let state = api::AppState::new(service, database.clone(), gateway);
    let result = api::serve(state, &bind)
        .await
        .with_context(|| format!("HTTP server on {} failed", bind));

    database.close().await;
    result
}

async fn cmd_setup(config: &Config, color: bool, request: SetupRepository) -> Result<()> {
    let database = open_database(config).await?;
    let service = build_service(config, &database, build_gateway(config)?, color)?;

    println!(
        "{}",
        format_info(&format!(
            "Setting up {}/{} (branch {})",
            request.owner, request.repo, request.branch
        ))
    );

    let response = service.setup(&request).await;
    database.close().await;

    if response.is_success() {
        println!("{}", format_success(&response.message));
        if let Some(stats) = &response.stats {
            println!("  {}", stats.summary_line());
            warn_on_failures(stats);
        }
        Ok(())
    } else {
        println!("{}", format_error(&response.message));
        Err(anyhow::anyhow!(
            "Setup failed with status {}",
            response.status
        ))
    }
}

async fn cmd_process(config: &Config, color: bool, path: PathBuf) -> Result<()> {
    let database = open_database(config).await?;
    let processor = build_processor(config, &database, build_gateway(config)?, color)?;

    let result = processor.process(&path).await;
    database.close().await;

    let report = result.with_context(|| format!("Failed to process {}", path.display()))?;
    println!(
        "{}",
        format_success(&format!(
            "{} -> collection {}",
            report.repository.name, report.collection
        ))
    );
    println!("  {}", report.stats.summary_line());
    warn_on_failures(&report.stats);
    println!("{}", serde_json::to_string_pretty(&report.stats)?);

    Ok(())
}

async fn cmd_migrate(config: &Config, reset: bool) -> Result<()> {
    let client = DatabaseClient::new(config.database.clone())
        .await
        .context("Failed to open SQLite database")?;
    let schema = SchemaManager::new(&client);

    let total = if reset { 3 } else { 2 };
    let mut step = 1;

    if reset {
        println!("{}", format_step(step, total, "Dropping tables"));
        schema.drop_all_tables().await?;
        step += 1;
    }

    println!("{}", format_step(step, total, "Creating tables"));
    schema
        .initialize()
        .await
        .context("Failed to initialize schema")?;
    step += 1;

    println!("{}", format_step(step, total, "Verifying tables"));
    let complete = schema.verify_schema().await?;
    client.close().await;

    if complete {
        println!(
            "{}",
            format_success(&format!("Schema ready at {}", config.database.path.display()))
        );
        Ok(())
    } else {
        Err(anyhow::anyhow!("Schema is incomplete after migration"))
    }
}

async fn cmd_stats(config: &Config, repository: Option<String>) -> Result<()> {
    let database = open_database(config).await?;
    let records = RecordStore::new(database.pool().clone());
    let result = match repository {
        Some(name) => print_repository_runs(&records, &name).await,
        None => print_counts(config, &records).await,
    };
    database.close().await;
    result
}

async fn print_counts(config: &Config, records: &RecordStore) -> Result<()> {
    let counts = records.counts().await?;

    println!("\nDatabase: {}", config.database.path.display());
    println!("{}", "=".repeat(40));
    println!("  repositories  {:>10}", counts.repositories);
    println!("  files         {:>10}", counts.files);
    println!("  tasks         {:>10}", counts.tasks);
    println!("  file_scores   {:>10}", counts.file_scores);
    println!("{}", "=".repeat(40));

    Ok(())
}

async fn print_repository_runs(records: &RecordStore, name: &str) -> Result<()> {
    let runs = records.repository_by_name(name).await?;
    if runs.is_empty() {
        println!("{}", format_warning(&format!("No runs recorded for {}", name)));
        return Ok(());
    }

    println!("\nRepository: {} ({} runs)", name, runs.len());
    println!("{}", "=".repeat(40));
    for run in &runs {
        let files = records.files_for_repository(run.id).await?;
        println!("  {}  {:>6} files", run.id, files.len());
    }
    println!("{}", "=".repeat(40));

    Ok(())
}

fn warn_on_failures(stats: &PipelineStats) {
    if stats.files_failed > 0 || stats.upsert_failed || stats.persistence_failures > 0 {
        println!(
            "{}",
            format_warning(&format!(
                "{} files failed, upsert {}, {} rows not persisted",
                stats.files_failed,
                if stats.upsert_failed { "failed" } else { "ok" },
                stats.persistence_failures
            ))
        );
    }
}
