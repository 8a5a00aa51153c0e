//! Database connection and schema management
//!
//! All loader tables live in the `ols` PostgreSQL schema. Logical uniqueness
//! (term accession, ontology name+namespace, meta key, the relation tuple)
//! is enforced by the upsert primitive rather than storage constraints;
//! cascade delete is expressed with `ON DELETE CASCADE` foreign keys so
//! wiping an ontology removes its whole subtree in one statement.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

pub mod models;
pub mod upsert;

pub use models::{
    AltIdRow, ClosureRow, MetaRow, OntologyRow, RelationRow, RelationTypeRow, SubsetRow,
    SynonymRow, SynonymScope, TermRow,
};
pub use upsert::{get_or_create, UpsertSpec};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost:5432/ols".to_string()),
            max_connections: std::env::var("DATABASE_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            connection_timeout: Duration::from_secs(30),
        }
    }
}

impl DatabaseConfig {
    pub async fn connect(&self) -> Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.connection_timeout)
            .connect(&self.database_url)
            .await
            .context("Failed to connect to database")?;
        info!("Database connection pool created");
        Ok(pool)
    }
}

const SCHEMA_DDL: &[&str] = &[
    "CREATE SCHEMA IF NOT EXISTS ols",
    r#"CREATE TABLE IF NOT EXISTS ols.meta (
        meta_id UUID PRIMARY KEY,
        meta_key TEXT NOT NULL,
        meta_value TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS ols.ontology (
        ontology_id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        namespace TEXT NOT NULL,
        version TEXT,
        title TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS ols.term (
        term_id UUID PRIMARY KEY,
        ontology_id UUID NOT NULL REFERENCES ols.ontology(ontology_id) ON DELETE CASCADE,
        accession TEXT NOT NULL,
        name TEXT,
        description TEXT,
        is_root BOOLEAN NOT NULL DEFAULT FALSE,
        is_obsolete BOOLEAN NOT NULL DEFAULT FALSE,
        iri TEXT,
        subsets TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS ols.relation_type (
        relation_type_id UUID PRIMARY KEY,
        name TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS ols.relation (
        relation_id UUID PRIMARY KEY,
        parent_term_id UUID NOT NULL REFERENCES ols.term(term_id) ON DELETE CASCADE,
        child_term_id UUID NOT NULL REFERENCES ols.term(term_id) ON DELETE CASCADE,
        relation_type_id UUID NOT NULL REFERENCES ols.relation_type(relation_type_id),
        ontology_id UUID NOT NULL REFERENCES ols.ontology(ontology_id) ON DELETE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS ols.synonym (
        synonym_id UUID PRIMARY KEY,
        term_id UUID NOT NULL REFERENCES ols.term(term_id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        scope VARCHAR(16) NOT NULL,
        db_xref TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS ols.alt_id (
        alt_id UUID PRIMARY KEY,
        term_id UUID NOT NULL REFERENCES ols.term(term_id) ON DELETE CASCADE,
        accession TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS ols.subset (
        subset_id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        definition TEXT NOT NULL DEFAULT ''
    )"#,
    r#"CREATE TABLE IF NOT EXISTS ols.closure (
        closure_id UUID PRIMARY KEY,
        child_term_id UUID NOT NULL REFERENCES ols.term(term_id) ON DELETE CASCADE,
        parent_term_id UUID NOT NULL REFERENCES ols.term(term_id) ON DELETE CASCADE,
        subparent_term_id UUID REFERENCES ols.term(term_id) ON DELETE CASCADE,
        distance INTEGER NOT NULL,
        ontology_id UUID NOT NULL REFERENCES ols.ontology(ontology_id) ON DELETE CASCADE
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_term_accession ON ols.term(accession)",
    "CREATE INDEX IF NOT EXISTS idx_ontology_name ON ols.ontology(name)",
    "CREATE INDEX IF NOT EXISTS idx_meta_key ON ols.meta(meta_key)",
];

/// Create the `ols` schema and all loader tables. Idempotent.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA_DDL {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to run DDL: {}", &statement[..40.min(statement.len())]))?;
    }
    Ok(())
}

/// Drop and recreate the `ols` schema. Destroys all loaded data.
pub async fn reset_schema(pool: &PgPool) -> Result<()> {
    sqlx::query("DROP SCHEMA IF EXISTS ols CASCADE")
        .execute(pool)
        .await
        .context("Failed to drop ols schema")?;
    init_schema(pool).await
}
