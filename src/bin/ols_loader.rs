//! Command-line ontology loader.
//!
//! Loads one or more ontologies from the Ontology Lookup Service into the
//! configured PostgreSQL database. Intended for manual runs and cron jobs;
//! scheduled pipelines go through the `pipeline` module instead.

use clap::Parser;
use ols_loader::config::LoaderConfig;
use ols_loader::database::{self, DatabaseConfig};
use ols_loader::loader::OlsLoader;
use std::time::Duration;

/// Ontology Lookup Service loader
#[derive(Parser, Debug)]
#[command(name = "ols_loader")]
#[command(about = "Load ontologies from the EMBL-EBI Ontology Lookup Service into PostgreSQL")]
struct Args {
    /// Ontology short names to load (e.g. "go", "so")
    #[arg(required = true)]
    ontologies: Vec<String>,

    /// Wipe prior ontology state and meta rows before loading
    #[arg(long, short = 'w')]
    wipe: bool,

    /// OLS API root URL
    #[arg(long, env = "OLS_BASE_URL")]
    base_url: Option<String>,

    /// Schema version recorded in the meta table
    #[arg(long, env = "ENS_VERSION")]
    db_version: Option<String>,

    /// Attempts per remote call before giving up on a network failure
    #[arg(long, default_value_t = 5)]
    max_retry: u32,

    /// Seconds to wait between retry attempts
    #[arg(long, default_value_t = 5)]
    retry_wait: u64,

    /// Drop and recreate the whole schema before loading anything
    #[arg(long)]
    reset_schema: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = LoaderConfig {
        wipe: args.wipe,
        max_retry: args.max_retry,
        retry_wait: Duration::from_secs(args.retry_wait),
        ..LoaderConfig::default()
    };
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if args.db_version.is_some() {
        config.db_version = args.db_version;
    }

    let pool = DatabaseConfig::default().connect().await?;
    if args.reset_schema {
        database::reset_schema(&pool).await?;
    } else {
        database::init_schema(&pool).await?;
    }

    let loader = OlsLoader::new(pool, config)?;
    loader.init_meta().await?;

    for ontology in &args.ontologies {
        let created = loader.load_all(ontology).await?;
        println!(
            "{}: {}",
            ontology,
            if created { "loaded" } else { "updated" }
        );
    }

    Ok(())
}
