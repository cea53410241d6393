//! EchoFinder CLI entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use echofinder::adapters::embeddings::HttpEmbeddingProvider;
use echofinder::adapters::gemini::GeminiClient;
use echofinder::adapters::github::{GitHubClient, GitHubTracker};
use echofinder::adapters::sqlite::{create_pool, SqliteIssueStore};
use echofinder::adapters::webhook::{self, WebhookState};
use echofinder::domain::models::{Config, LoggingConfig};
use echofinder::domain::ports::{EmbeddingProvider, IssueStore, IssueTracker, TextGenerator};
use echofinder::services::{
    ConfirmationService, SimilarityMatcher, SyncService, SynthesisService,
};
use echofinder::ConfigLoader;

#[derive(Parser)]
#[command(name = "echofinder", version, about = "Near-duplicate issue detection and merge bot")]
struct Cli {
    /// Path to a configuration file (defaults to the .echofinder/ hierarchy)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server, syncing open issues at startup
    Serve,
    /// Backfill open issues into the vector store and exit
    Sync,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    init_tracing(&config.logging);

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Sync => {
            let bot = Bot::build(&config).await?;
            bot.sync.run().await?;
            Ok(())
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Wired-up service graph.
struct Bot {
    matcher: Arc<SimilarityMatcher>,
    confirmations: Arc<ConfirmationService>,
    sync: Arc<SyncService>,
}

impl Bot {
    async fn build(config: &Config) -> anyhow::Result<Self> {
        let database_url = format!("sqlite:{}", config.database.path);
        let pool = create_pool(&database_url, config.database.max_connections).await?;
        let store: Arc<dyn IssueStore> = Arc::new(SqliteIssueStore::new(pool));

        let embeddings: Arc<dyn EmbeddingProvider> =
            Arc::new(HttpEmbeddingProvider::new(config.embedding.clone())?);

        let client = GitHubClient::new(&config.tracker)?;
        let tracker: Arc<dyn IssueTracker> = Arc::new(GitHubTracker::new(client));

        // Without a generation credential the bot still detects
        // duplicates; a confirmed merge then fails with a notice.
        let generator: Option<Arc<dyn TextGenerator>> =
            match GeminiClient::new(config.synthesis.clone()) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    tracing::warn!(error = %e, "text generation unavailable");
                    None
                }
            };

        let synthesis = Arc::new(SynthesisService::new(
            Arc::clone(&tracker),
            Arc::clone(&store),
            generator,
            config.synthesis.clone(),
        ));
        let matcher = Arc::new(SimilarityMatcher::new(
            Arc::clone(&store),
            Arc::clone(&embeddings),
            Arc::clone(&tracker),
            config.matcher.clone(),
        ));
        let confirmations = Arc::new(ConfirmationService::new(
            Arc::clone(&tracker),
            Arc::clone(&store),
            synthesis,
        ));
        let sync = Arc::new(SyncService::new(
            tracker,
            store,
            embeddings,
            config.tracker.repos.clone(),
        ));

        Ok(Self {
            matcher,
            confirmations,
            sync,
        })
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let bot = Bot::build(&config).await?;

    // Backfill runs in the background; the webhook surface comes up
    // immediately.
    let sync = Arc::clone(&bot.sync);
    tokio::spawn(async move {
        if let Err(e) = sync.run().await {
            tracing::warn!(error = %e, "startup sync failed");
        }
    });

    let state = WebhookState {
        matcher: bot.matcher,
        confirmations: bot.confirmations,
    };
    webhook::serve(state, &config.server.host, config.server.port).await
}
