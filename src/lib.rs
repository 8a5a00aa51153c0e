//! OLS Loader - ontology synchronization from the EMBL-EBI Ontology Lookup Service
//!
//! This crate fetches an ontology's metadata and full term set from the OLS
//! REST API and persists terms, synonyms, alternate identifiers, subset
//! memberships and inter-term relations into a normalized PostgreSQL schema.
//! Repeated loads converge to the same database state through an explicit
//! get-or-create primitive; remote calls go through a bounded retry gateway.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ols_loader::config::LoaderConfig;
//! use ols_loader::database::DatabaseConfig;
//! use ols_loader::loader::OlsLoader;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let pool = DatabaseConfig::default().connect().await?;
//! ols_loader::database::init_schema(&pool).await?;
//!
//! let loader = OlsLoader::new(pool, LoaderConfig::default())?;
//! let first_load = loader.load_all("go").await?;
//! println!("first load of go: {}", first_load);
//! # Ok(())
//! # }
//! ```

// Loader configuration (env-backed defaults)
pub mod config;

// OLS REST client, DTOs and the retry gateway
pub mod ols;

// Database integration: pool, schema, row models, upsert primitive
pub mod database;

// Ontology loading orchestration
pub mod loader;

// Workflow-harness adapter for pipeline chaining
pub mod pipeline;

pub use config::LoaderConfig;
pub use loader::{OlsLoader, OntologyRef};
pub use ols::client::{OlsApi, OlsClient, OlsError};
pub use ols::retry::RetryClient;
