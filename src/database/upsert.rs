//! Get-or-create upsert primitive
//!
//! Every loading step converges through [`get_or_create`]: look up an
//! existing row by exact match criteria, or insert one merging the criteria
//! with creation fields, inside the caller's transaction. Calling it twice
//! with identical criteria returns the same row and never duplicates.
//!
//! Uniqueness lives here, not in storage constraints, so the behavior is
//! explicit and testable per entity.

use super::models::{
    MetaRow, OntologyRow, RelationRow, RelationTypeRow, SubsetRow, SynonymRow, SynonymScope,
    TermRow,
};
use crate::ols::types::{OlsOntology, OlsTerm};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgConnection, Postgres, Transaction};
use uuid::Uuid;

/// A scoped transactional session.
pub type PgTx<'a> = Transaction<'a, Postgres>;

/// One upsertable record: match criteria plus creation fields.
#[async_trait]
pub trait UpsertSpec: Send + Sized {
    type Row: Send;

    /// Look up an existing row matching the criteria exactly.
    async fn find(&self, conn: &mut PgConnection) -> Result<Option<Self::Row>>;

    /// Insert a new row merging criteria and creation fields.
    async fn insert(self, conn: &mut PgConnection) -> Result<Self::Row>;
}

/// Find the row matching `spec`, or create it within `tx`.
/// Returns the row and whether it was newly created.
pub async fn get_or_create<S: UpsertSpec>(tx: &mut PgTx<'_>, spec: S) -> Result<(S::Row, bool)> {
    if let Some(row) = spec.find(&mut **tx).await? {
        return Ok((row, false));
    }
    let row = spec.insert(&mut **tx).await?;
    Ok((row, true))
}

// ---------------------------------------------------------------------------
// Meta
// ---------------------------------------------------------------------------

/// Matches on `meta_key`.
#[derive(Debug, Clone)]
pub struct MetaSpec {
    pub meta_key: String,
    pub meta_value: String,
}

#[async_trait]
impl UpsertSpec for MetaSpec {
    type Row = MetaRow;

    async fn find(&self, conn: &mut PgConnection) -> Result<Option<MetaRow>> {
        sqlx::query_as::<_, MetaRow>(
            "SELECT meta_id, meta_key, meta_value FROM ols.meta WHERE meta_key = $1",
        )
        .bind(&self.meta_key)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to look up meta row")
    }

    async fn insert(self, conn: &mut PgConnection) -> Result<MetaRow> {
        sqlx::query_as::<_, MetaRow>(
            r#"INSERT INTO ols.meta (meta_id, meta_key, meta_value)
               VALUES ($1, $2, $3)
               RETURNING meta_id, meta_key, meta_value"#,
        )
        .bind(Uuid::new_v4())
        .bind(&self.meta_key)
        .bind(&self.meta_value)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to insert meta row")
    }
}

// ---------------------------------------------------------------------------
// Ontology
// ---------------------------------------------------------------------------

/// Matches on the (name, namespace) identity pair.
#[derive(Debug, Clone)]
pub struct OntologySpec {
    pub name: String,
    pub namespace: String,
    pub version: Option<String>,
    pub title: Option<String>,
}

impl OntologySpec {
    /// Build from remote metadata, with an optional namespace override.
    pub fn from_remote(remote: &OlsOntology, namespace: Option<&str>) -> Self {
        Self {
            name: remote.ontology_id.clone(),
            namespace: namespace.unwrap_or_else(|| remote.namespace()).to_string(),
            version: remote.version().map(str::to_string),
            title: remote.title().map(str::to_string),
        }
    }
}

#[async_trait]
impl UpsertSpec for OntologySpec {
    type Row = OntologyRow;

    async fn find(&self, conn: &mut PgConnection) -> Result<Option<OntologyRow>> {
        sqlx::query_as::<_, OntologyRow>(
            r#"SELECT ontology_id, name, namespace, version, title
               FROM ols.ontology WHERE name = $1 AND namespace = $2"#,
        )
        .bind(&self.name)
        .bind(&self.namespace)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to look up ontology")
    }

    async fn insert(self, conn: &mut PgConnection) -> Result<OntologyRow> {
        sqlx::query_as::<_, OntologyRow>(
            r#"INSERT INTO ols.ontology (ontology_id, name, namespace, version, title)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING ontology_id, name, namespace, version, title"#,
        )
        .bind(Uuid::new_v4())
        .bind(&self.name)
        .bind(&self.namespace)
        .bind(&self.version)
        .bind(&self.title)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to insert ontology")
    }
}

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

/// Matches on accession only: a term accession is globally unique.
#[derive(Debug, Clone)]
pub struct TermSpec {
    pub accession: String,
    pub ontology_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_root: bool,
    pub is_obsolete: bool,
    pub iri: Option<String>,
    pub subsets: Option<String>,
}

impl TermSpec {
    /// Build from a remote term record owned by `ontology_id`.
    pub fn from_remote(accession: &str, remote: &OlsTerm, ontology_id: Uuid) -> Self {
        let subsets = remote.subset_names();
        Self {
            accession: accession.to_string(),
            ontology_id,
            name: remote.label.clone(),
            description: remote.description().map(str::to_string),
            is_root: remote.is_root,
            is_obsolete: remote.is_obsolete,
            iri: Some(remote.iri.clone()),
            subsets: if subsets.is_empty() {
                None
            } else {
                Some(subsets.join(","))
            },
        }
    }
}

#[async_trait]
impl UpsertSpec for TermSpec {
    type Row = TermRow;

    async fn find(&self, conn: &mut PgConnection) -> Result<Option<TermRow>> {
        sqlx::query_as::<_, TermRow>(
            r#"SELECT term_id, ontology_id, accession, name, description,
                      is_root, is_obsolete, iri, subsets
               FROM ols.term WHERE accession = $1"#,
        )
        .bind(&self.accession)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to look up term by accession")
    }

    async fn insert(self, conn: &mut PgConnection) -> Result<TermRow> {
        sqlx::query_as::<_, TermRow>(
            r#"INSERT INTO ols.term
                   (term_id, ontology_id, accession, name, description,
                    is_root, is_obsolete, iri, subsets)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING term_id, ontology_id, accession, name, description,
                         is_root, is_obsolete, iri, subsets"#,
        )
        .bind(Uuid::new_v4())
        .bind(self.ontology_id)
        .bind(&self.accession)
        .bind(&self.name)
        .bind(&self.description)
        .bind(self.is_root)
        .bind(self.is_obsolete)
        .bind(&self.iri)
        .bind(&self.subsets)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to insert term")
    }
}

// ---------------------------------------------------------------------------
// RelationType
// ---------------------------------------------------------------------------

/// Matches on name within the controlled relation vocabulary.
#[derive(Debug, Clone)]
pub struct RelationTypeSpec {
    pub name: String,
}

#[async_trait]
impl UpsertSpec for RelationTypeSpec {
    type Row = RelationTypeRow;

    async fn find(&self, conn: &mut PgConnection) -> Result<Option<RelationTypeRow>> {
        sqlx::query_as::<_, RelationTypeRow>(
            "SELECT relation_type_id, name FROM ols.relation_type WHERE name = $1",
        )
        .bind(&self.name)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to look up relation type")
    }

    async fn insert(self, conn: &mut PgConnection) -> Result<RelationTypeRow> {
        sqlx::query_as::<_, RelationTypeRow>(
            r#"INSERT INTO ols.relation_type (relation_type_id, name)
               VALUES ($1, $2)
               RETURNING relation_type_id, name"#,
        )
        .bind(Uuid::new_v4())
        .bind(&self.name)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to insert relation type")
    }
}

// ---------------------------------------------------------------------------
// Relation
// ---------------------------------------------------------------------------

/// Matches on the full (parent, child, type, ontology) tuple.
#[derive(Debug, Clone)]
pub struct RelationSpec {
    pub parent_term_id: Uuid,
    pub child_term_id: Uuid,
    pub relation_type_id: Uuid,
    pub ontology_id: Uuid,
}

#[async_trait]
impl UpsertSpec for RelationSpec {
    type Row = RelationRow;

    async fn find(&self, conn: &mut PgConnection) -> Result<Option<RelationRow>> {
        sqlx::query_as::<_, RelationRow>(
            r#"SELECT relation_id, parent_term_id, child_term_id, relation_type_id, ontology_id
               FROM ols.relation
               WHERE parent_term_id = $1 AND child_term_id = $2
                 AND relation_type_id = $3 AND ontology_id = $4"#,
        )
        .bind(self.parent_term_id)
        .bind(self.child_term_id)
        .bind(self.relation_type_id)
        .bind(self.ontology_id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to look up relation")
    }

    async fn insert(self, conn: &mut PgConnection) -> Result<RelationRow> {
        sqlx::query_as::<_, RelationRow>(
            r#"INSERT INTO ols.relation
                   (relation_id, parent_term_id, child_term_id, relation_type_id, ontology_id)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING relation_id, parent_term_id, child_term_id, relation_type_id, ontology_id"#,
        )
        .bind(Uuid::new_v4())
        .bind(self.parent_term_id)
        .bind(self.child_term_id)
        .bind(self.relation_type_id)
        .bind(self.ontology_id)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to insert relation")
    }
}

// ---------------------------------------------------------------------------
// Synonym
// ---------------------------------------------------------------------------

/// Matches on (term, name): a structured OBO synonym wins over a plain
/// synonym string carrying the same label.
#[derive(Debug, Clone)]
pub struct SynonymSpec {
    pub term_id: Uuid,
    pub name: String,
    pub scope: SynonymScope,
    pub db_xref: Option<String>,
}

#[async_trait]
impl UpsertSpec for SynonymSpec {
    type Row = SynonymRow;

    async fn find(&self, conn: &mut PgConnection) -> Result<Option<SynonymRow>> {
        sqlx::query_as::<_, SynonymRow>(
            r#"SELECT synonym_id, term_id, name, scope, db_xref
               FROM ols.synonym WHERE term_id = $1 AND name = $2"#,
        )
        .bind(self.term_id)
        .bind(&self.name)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to look up synonym")
    }

    async fn insert(self, conn: &mut PgConnection) -> Result<SynonymRow> {
        sqlx::query_as::<_, SynonymRow>(
            r#"INSERT INTO ols.synonym (synonym_id, term_id, name, scope, db_xref)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING synonym_id, term_id, name, scope, db_xref"#,
        )
        .bind(Uuid::new_v4())
        .bind(self.term_id)
        .bind(&self.name)
        .bind(self.scope)
        .bind(&self.db_xref)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to insert synonym")
    }
}

// ---------------------------------------------------------------------------
// Subset
// ---------------------------------------------------------------------------

/// Matches on name, the subset identity.
#[derive(Debug, Clone)]
pub struct SubsetSpec {
    pub name: String,
    pub definition: String,
}

#[async_trait]
impl UpsertSpec for SubsetSpec {
    type Row = SubsetRow;

    async fn find(&self, conn: &mut PgConnection) -> Result<Option<SubsetRow>> {
        sqlx::query_as::<_, SubsetRow>(
            "SELECT subset_id, name, definition FROM ols.subset WHERE name = $1",
        )
        .bind(&self.name)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to look up subset")
    }

    async fn insert(self, conn: &mut PgConnection) -> Result<SubsetRow> {
        sqlx::query_as::<_, SubsetRow>(
            r#"INSERT INTO ols.subset (subset_id, name, definition)
               VALUES ($1, $2, $3)
               RETURNING subset_id, name, definition"#,
        )
        .bind(Uuid::new_v4())
        .bind(&self.name)
        .bind(&self.definition)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to insert subset")
    }
}
