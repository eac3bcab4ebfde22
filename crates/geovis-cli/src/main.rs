mod results;
mod score;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use geovis_core::CollectorResultStatus;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "geovis")]
#[command(about = "Brand visibility scoring for LLM answers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Score one or more answers against the configured brand and competitors
    Score {
        /// Answer text file; `-` reads stdin (at most once). Repeat to score several answers.
        #[arg(long = "answer", required = true)]
        answers: Vec<PathBuf>,

        /// Entities YAML; defaults to `GEOVIS_ENTITIES_PATH`
        #[arg(long)]
        entities: Option<PathBuf>,

        /// Collector (LLM surface) that produced the answers
        #[arg(long, default_value = "chatgpt")]
        collector: String,

        /// Count mentions locally instead of asking an LLM
        #[arg(long)]
        local_only: bool,

        /// Persist rows under this brand; requires `--query-id` and a single `--answer`
        #[arg(long, requires = "query_id")]
        brand_id: Option<Uuid>,

        /// Persist rows under this query; requires `--brand-id`
        #[arg(long, requires = "brand_id")]
        query_id: Option<Uuid>,
    },
    /// Apply pending database migrations
    Migrate,
    /// Move a collector result to a new status through the transition guard
    Transition {
        id: i64,

        #[arg(value_parser = parse_status)]
        status: CollectorResultStatus,

        /// Recorded in the status history entry
        #[arg(long, default_value = "cli")]
        source: String,

        #[arg(long)]
        reason: Option<String>,

        /// Store this answer text with the transition
        #[arg(long)]
        raw_answer: Option<String>,

        #[arg(long)]
        error_message: Option<String>,
    },
    /// Print a collector result and its status history
    ShowResult { id: i64 },
}

fn parse_status(raw: &str) -> Result<CollectorResultStatus, String> {
    raw.parse().map_err(|e: geovis_core::CoreError| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = geovis_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Score {
            answers,
            entities,
            collector,
            local_only,
            brand_id,
            query_id,
        } => {
            let target = brand_id.zip(query_id);
            let options = score::ScoreOptions {
                answers,
                entities: entities.unwrap_or_else(|| config.entities_path.clone()),
                collector,
                local_only,
                target,
            };
            score::run_score(&config, options).await?;
        }
        Commands::Migrate => {
            let pool = geovis_db::connect_pool_from_config(&config).await?;
            let applied = geovis_db::run_migrations(&pool).await?;
            println!("migrations applied: {applied}");
        }
        Commands::Transition {
            id,
            status,
            source,
            reason,
            raw_answer,
            error_message,
        } => {
            let pool = geovis_db::connect_pool_from_config(&config).await?;
            let ctx = geovis_db::TransitionContext { source, reason };
            let fields = geovis_db::TransitionFields {
                raw_answer,
                error_message,
            };
            results::run_transition(&pool, id, status, &ctx, &fields).await?;
        }
        Commands::ShowResult { id } => {
            let pool = geovis_db::connect_pool_from_config(&config).await?;
            results::run_show_result(&pool, id).await?;
        }
    }

    Ok(())
}
