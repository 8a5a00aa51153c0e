//! Row models for the `ols` schema.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Synonym matching scope, stored as its uppercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SynonymScope {
    Exact,
    Broad,
    Narrow,
    Related,
}

impl SynonymScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "EXACT",
            Self::Broad => "BROAD",
            Self::Narrow => "NARROW",
            Self::Related => "RELATED",
        }
    }
}

impl std::fmt::Display for SynonymScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A (name, namespace)-scoped ontology record. One remote ontology resource
/// may fan out into several rows, one per term namespace encountered.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OntologyRow {
    pub ontology_id: Uuid,
    pub name: String,
    pub namespace: String,
    pub version: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TermRow {
    pub term_id: Uuid,
    pub ontology_id: Uuid,
    /// Accession code, e.g. `GO:0000001`. Globally unique.
    pub accession: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_root: bool,
    pub is_obsolete: bool,
    pub iri: Option<String>,
    /// Comma-separated subset membership names, as reported by the source.
    pub subsets: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RelationTypeRow {
    pub relation_type_id: Uuid,
    pub name: String,
}

/// A directed edge, always stored parent → child.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RelationRow {
    pub relation_id: Uuid,
    pub parent_term_id: Uuid,
    pub child_term_id: Uuid,
    pub relation_type_id: Uuid,
    pub ontology_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SynonymRow {
    pub synonym_id: Uuid,
    pub term_id: Uuid,
    pub name: String,
    pub scope: SynonymScope,
    pub db_xref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AltIdRow {
    pub alt_id: Uuid,
    pub term_id: Uuid,
    pub accession: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubsetRow {
    pub subset_id: Uuid,
    pub name: String,
    pub definition: String,
}

/// Precomputed transitive-relation row. Populated by a downstream closure
/// builder, carried here for cascade-delete semantics.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClosureRow {
    pub closure_id: Uuid,
    pub child_term_id: Uuid,
    pub parent_term_id: Uuid,
    pub subparent_term_id: Option<Uuid>,
    pub distance: i32,
    pub ontology_id: Uuid,
}

/// Process-wide key-value bookkeeping row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MetaRow {
    pub meta_id: Uuid,
    pub meta_key: String,
    pub meta_value: String,
}
