//! OLS loading orchestration
//!
//! Maps remote OLS records into the normalized `ols` schema: ontology
//! metadata, terms, relations (with directionality normalization), synonyms,
//! alternate identifiers and subset memberships. Repeated loads converge via
//! the get-or-create primitive; auxiliary attributes use full-replace
//! semantics. Each public entry point commits in its own transactional
//! scope; `load_all` spans several independently-committed scopes.

use crate::config::LoaderConfig;
use crate::database::models::{OntologyRow, SubsetRow, SynonymScope, TermRow};
use crate::database::upsert::{
    get_or_create, MetaSpec, OntologySpec, PgTx, RelationSpec, RelationTypeSpec, SubsetSpec,
    SynonymSpec, TermSpec,
};
use crate::ols::client::{OlsApi, OlsClient};
use crate::ols::retry::RetryClient;
use crate::ols::types::{OlsOntology, OlsTerm};
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info, warn};

/// Timestamp layout used in meta bookkeeping values.
const META_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source relation names folded into the stored controlled vocabulary.
/// Both hierarchy directions map to `is_a`; direction is normalized
/// separately by [`relation_endpoints`].
const RELATION_MAP: &[(&str, &str)] = &[("parents", "is_a"), ("children", "is_a")];

/// Derived or transitive link names that never become direct edges.
const IGNORED_RELATIONS: &[&str] = &[
    "self",
    "graph",
    "jstree",
    "descendants",
    "ancestors",
    "hierarchicalParents",
    "hierarchicalAncestors",
    "hierarchicalChildren",
    "hierarchicalDescendants",
];

/// OBO synonym scope names mapped to the stored scope vocabulary.
const SYNONYM_SCOPES: &[(&str, SynonymScope)] = &[
    ("hasExactSynonym", SynonymScope::Exact),
    ("hasBroadSynonym", SynonymScope::Broad),
    ("hasNarrowSynonym", SynonymScope::Narrow),
    ("hasRelatedSynonym", SynonymScope::Related),
];

/// Ontologies whose terms may appear as relation endpoints. Related terms
/// defined anywhere else are skipped.
pub const ALLOWED_ONTOLOGIES: &[&str] = &[
    "go", "so", "pato", "hp", "vt", "efo", "po", "eo", "to", "chebi", "pr", "fypo", "peco", "bfo",
    "bto", "cl", "cmo", "eco", "mod", "mp", "ogms", "uo",
];

fn mapped_relation_name(rel_name: &str) -> &str {
    RELATION_MAP
        .iter()
        .find(|(from, _)| *from == rel_name)
        .map(|(_, to)| *to)
        .unwrap_or(rel_name)
}

fn synonym_scope(obo_scope: &str) -> Option<SynonymScope> {
    SYNONYM_SCOPES
        .iter()
        .find(|(name, _)| *name == obo_scope)
        .map(|(_, scope)| *scope)
}

/// Normalize edge direction: a `children`-sourced relation makes the current
/// term the parent; any other source makes it the child. The stored edge
/// always points parent → child.
fn relation_endpoints<'a>(
    rel_name: &str,
    term: &'a TermRow,
    related: &'a TermRow,
) -> (&'a TermRow, &'a TermRow) {
    if rel_name == "children" {
        (term, related)
    } else {
        (related, term)
    }
}

/// The three accepted forms of an ontology reference.
#[derive(Debug)]
pub enum OntologyRef<'a> {
    /// Short ontology name, resolved against the remote source.
    Name(&'a str),
    /// An already-persisted ontology record.
    Record(&'a OntologyRow),
    /// Remote metadata not yet persisted.
    Remote(&'a OlsOntology),
}

/// Orchestrates loading one ontology from OLS into the backing store.
pub struct OlsLoader<A: OlsApi> {
    pool: PgPool,
    client: RetryClient<A>,
    config: LoaderConfig,
}

impl OlsLoader<OlsClient> {
    pub fn new(pool: PgPool, config: LoaderConfig) -> Result<Self> {
        let client = OlsClient::new(&config)?;
        Ok(Self::with_client(pool, client, config))
    }
}

impl<A: OlsApi> OlsLoader<A> {
    /// Build a loader over any [`OlsApi`] implementation. Tests use this to
    /// drive the orchestration from a canned source.
    pub fn with_client(pool: PgPool, client: A, config: LoaderConfig) -> Self {
        let retry = RetryClient::new(client, config.max_retry, config.retry_wait);
        Self {
            pool,
            client: retry,
            config,
        }
    }

    /// Record schema bookkeeping meta rows (`schema_version`, `schema_type`).
    pub async fn init_meta(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let version = self.config.db_version.clone().unwrap_or_default();
        get_or_create(
            &mut tx,
            MetaSpec {
                meta_key: "schema_version".to_string(),
                meta_value: version,
            },
        )
        .await?;
        get_or_create(
            &mut tx,
            MetaSpec {
                meta_key: "schema_type".to_string(),
                meta_value: "ontology".to_string(),
            },
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Load an ontology's metadata, terms, relations and auxiliary
    /// attributes, bookkeeping the load in meta rows. Returns whether this
    /// was the first load of that ontology (load-date meta newly created).
    pub async fn load_all(&self, ontology_name: &str) -> Result<bool> {
        if self.config.wipe {
            info!(ontology = ontology_name, "Removing ontology before reload");
            self.wipe_ontology(ontology_name).await?;
            let mut tx = self.pool.begin().await?;
            let deleted = sqlx::query("DELETE FROM ols.meta WHERE meta_key LIKE $1")
                .bind(format!("%{}%", ontology_name))
                .execute(&mut *tx)
                .await
                .context("Failed to delete ontology meta rows")?
                .rows_affected();
            tx.commit().await?;
            debug!(ontology = ontology_name, deleted, "Removed meta rows");
        } else {
            info!(ontology = ontology_name, "Updating ontology in place");
        }

        let start = Utc::now();
        let mut tx = self.pool.begin().await?;
        let created = self
            .set_meta(
                &mut tx,
                &format!("{}_load_date", ontology_name),
                &format!(
                    "{}/{}",
                    ontology_name.to_uppercase(),
                    start.format(META_DATE_FORMAT)
                ),
            )
            .await?;
        tx.commit().await?;

        let m_ontology = self.load_ontology(ontology_name, Some(ontology_name)).await?;
        let nb_terms = self
            .load_ontology_terms(OntologyRef::Record(&m_ontology))
            .await?;
        info!(
            ontology = ontology_name,
            terms = nb_terms,
            "Ontology load complete"
        );

        let elapsed = (Utc::now() - start).num_milliseconds() as f64 / 1000.0;
        let mut tx = self.pool.begin().await?;
        self.set_meta(
            &mut tx,
            &format!("{}_load_time", ontology_name),
            &format!("{:.3}", elapsed),
        )
        .await?;
        tx.commit().await?;

        Ok(created)
    }

    /// Fetch remote ontology metadata and upsert its record, bookkeeping the
    /// source file date. The namespace override, when given, takes
    /// precedence over the remote namespace.
    pub async fn load_ontology(
        &self,
        ontology_name: &str,
        namespace: Option<&str>,
    ) -> Result<OntologyRow> {
        let mut tx = self.pool.begin().await?;
        let row = self.load_ontology_in(&mut tx, ontology_name, namespace).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn load_ontology_in(
        &self,
        tx: &mut PgTx<'_>,
        ontology_name: &str,
        namespace: Option<&str>,
    ) -> Result<OntologyRow> {
        let o_ontology = self.client.ontology(ontology_name).await?;
        if let Some(stamp) = o_ontology.updated_stamp() {
            self.set_meta(
                tx,
                &format!("{}_file_date", ontology_name),
                &format!("{}/{}", ontology_name.to_uppercase(), stamp),
            )
            .await?;
        } else {
            debug!(ontology = ontology_name, "No source file date reported");
        }
        let (row, _created) =
            get_or_create(tx, OntologySpec::from_remote(&o_ontology, namespace)).await?;
        info!(
            ontology = %row.name,
            namespace = %row.namespace,
            "Loaded ontology"
        );
        Ok(row)
    }

    /// Delete every ontology record with this name, across namespaces.
    /// Cascade removes dependent terms, relations, synonyms, alt-ids and
    /// closures. Returns false when nothing matched.
    pub async fn wipe_ontology(&self, ontology_name: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let affected = sqlx::query("DELETE FROM ols.ontology WHERE name = $1")
            .bind(ontology_name)
            .execute(&mut *tx)
            .await
            .context("Failed to delete ontology")?
            .rows_affected();
        tx.commit().await?;
        if affected == 0 {
            debug!(ontology = ontology_name, "Ontology not found, nothing wiped");
            return Ok(false);
        }
        info!(ontology = ontology_name, rows = affected, "Wiped ontology");
        Ok(true)
    }

    /// Fetch the full term listing and persist every term that is defining
    /// for its ontology and carries an accession. Terms merely referenced
    /// from elsewhere are skipped at this stage. Returns the count
    /// persisted.
    pub async fn load_ontology_terms(&self, ontology: OntologyRef<'_>) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let m_ontology = self.resolve_ontology(&mut tx, &ontology).await?;
        let o_terms = self.client.terms(&m_ontology.name).await?;
        info!(
            ontology = %m_ontology.name,
            count = o_terms.len(),
            "Loading terms"
        );
        let mut nb_terms = 0;
        for o_term in &o_terms {
            if !o_term.is_defining_ontology || o_term.obo_id.is_none() {
                debug!(iri = %o_term.iri, "Skipping non-defining or accession-less term");
                continue;
            }
            // One ontology resource fans out into one row per term namespace.
            let namespace = o_term
                .obo_name_space
                .clone()
                .unwrap_or_else(|| m_ontology.name.clone());
            let (ns_ontology, _) = get_or_create(
                &mut tx,
                OntologySpec {
                    name: m_ontology.name.clone(),
                    namespace,
                    version: m_ontology.version.clone(),
                    title: m_ontology.title.clone(),
                },
            )
            .await?;
            self.load_term(o_term, OntologyRef::Record(&ns_ontology), &mut tx)
                .await?;
            nb_terms += 1;
        }
        tx.commit().await?;
        Ok(nb_terms)
    }

    /// Upsert one term and its relations, synonyms, alt-ids and subsets
    /// within the caller's transaction.
    pub async fn load_term(
        &self,
        o_term: &OlsTerm,
        ontology: OntologyRef<'_>,
        tx: &mut PgTx<'_>,
    ) -> Result<TermRow> {
        let m_ontology = self.resolve_ontology(tx, &ontology).await?;
        let accession = o_term
            .obo_id
            .as_deref()
            .with_context(|| format!("Remote term {} has no accession", o_term.iri))?;
        let (m_term, _created) = get_or_create(
            tx,
            TermSpec::from_remote(accession, o_term, m_ontology.ontology_id),
        )
        .await?;
        info!(term = %m_term.accession, "Loading term");

        let relation_types: Vec<String> = o_term
            .relation_type_names()
            .into_iter()
            .filter(|name| !IGNORED_RELATIONS.contains(&name.as_str()))
            .collect();
        debug!(term = %m_term.accession, ?relation_types, "Relations to load");

        self.load_term_relations(tx, &m_term, o_term, &relation_types)
            .await?;
        self.load_term_synonyms(tx, &m_term, o_term).await?;
        self.load_alt_ids(tx, &m_term, o_term).await?;
        self.load_term_subsets(tx, &m_term, &m_ontology.name).await?;
        Ok(m_term)
    }

    /// Replace the term's relation edges. Existing edges where the term is
    /// parent or child are deleted, then re-derived from the remote source
    /// one relation type at a time. Returns the count of edges created.
    async fn load_term_relations(
        &self,
        tx: &mut PgTx<'_>,
        m_term: &TermRow,
        o_term: &OlsTerm,
        relation_types: &[String],
    ) -> Result<usize> {
        sqlx::query("DELETE FROM ols.relation WHERE parent_term_id = $1 OR child_term_id = $1")
            .bind(m_term.term_id)
            .execute(&mut **tx)
            .await
            .context("Failed to delete prior relations")?;

        let mut n_relations = 0;
        for rel_name in relation_types {
            let (relation_type, _) = get_or_create(
                tx,
                RelationTypeSpec {
                    name: mapped_relation_name(rel_name).to_string(),
                },
            )
            .await?;
            let o_relatives = self.client.related_terms(o_term, rel_name).await?;
            debug!(
                term = %m_term.accession,
                relation = rel_name.as_str(),
                related = o_relatives.len(),
                "Loading relation"
            );
            for o_related in &o_relatives {
                if o_related.obo_id.is_none()
                    || !ALLOWED_ONTOLOGIES.contains(&o_related.ontology_name.as_str())
                {
                    debug!(iri = %o_related.iri, "Ignored related term");
                    continue;
                }
                let detail;
                let o_details = if o_related.is_defining_ontology {
                    o_related
                } else {
                    detail = self.client.term_by_iri(&o_related.iri).await?;
                    &detail
                };
                let Some(related_accession) = o_details.obo_id.as_deref() else {
                    debug!(iri = %o_details.iri, "Related term detail has no accession");
                    continue;
                };
                let o_onto = self.client.ontology(&o_details.ontology_name).await?;
                let namespace = o_related
                    .obo_name_space
                    .clone()
                    .unwrap_or_else(|| o_onto.namespace().to_string());
                let (r_ontology, _) = get_or_create(
                    tx,
                    OntologySpec {
                        name: o_onto.ontology_id.clone(),
                        namespace,
                        version: o_onto.version().map(str::to_string),
                        title: o_onto.title().map(str::to_string),
                    },
                )
                .await?;
                let (m_related, _) = get_or_create(
                    tx,
                    TermSpec::from_remote(related_accession, o_details, r_ontology.ontology_id),
                )
                .await?;
                let (parent, child) = relation_endpoints(rel_name, m_term, &m_related);
                let (_relation, created) = get_or_create(
                    tx,
                    RelationSpec {
                        parent_term_id: parent.term_id,
                        child_term_id: child.term_id,
                        relation_type_id: relation_type.relation_type_id,
                        ontology_id: m_term.ontology_id,
                    },
                )
                .await?;
                if created {
                    n_relations += 1;
                }
                debug!(
                    parent = %parent.accession,
                    relation = %relation_type.name,
                    child = %child.accession,
                    "Loaded relation"
                );
            }
        }
        Ok(n_relations)
    }

    /// Replace the term's synonyms from both remote sources: structured OBO
    /// synonyms first (their cross-references win), then plain synonym
    /// strings typed EXACT.
    async fn load_term_synonyms(
        &self,
        tx: &mut PgTx<'_>,
        m_term: &TermRow,
        o_term: &OlsTerm,
    ) -> Result<usize> {
        sqlx::query("DELETE FROM ols.synonym WHERE term_id = $1")
            .bind(m_term.term_id)
            .execute(&mut **tx)
            .await
            .context("Failed to delete prior synonyms")?;

        let mut n_synonyms = 0;
        for obo_synonym in o_term.obo_synonym.iter().flatten() {
            let Some(scope) = obo_synonym.scope.as_deref().and_then(synonym_scope) else {
                warn!(
                    term = %m_term.accession,
                    scope = ?obo_synonym.scope,
                    "Unknown synonym scope, skipped"
                );
                continue;
            };
            let db_xref = obo_synonym.xrefs.first().and_then(|xref| {
                match (xref.database.as_deref(), xref.id.as_deref()) {
                    (Some(database), Some(id)) => Some(format!("{}:{}", database, id)),
                    _ => None,
                }
            });
            let (_synonym, created) = get_or_create(
                tx,
                SynonymSpec {
                    term_id: m_term.term_id,
                    name: obo_synonym.name.clone(),
                    scope,
                    db_xref,
                },
            )
            .await?;
            if created {
                n_synonyms += 1;
            }
        }
        for name in o_term.synonyms.iter().flatten() {
            let (_synonym, created) = get_or_create(
                tx,
                SynonymSpec {
                    term_id: m_term.term_id,
                    name: name.clone(),
                    scope: SynonymScope::Exact,
                    db_xref: None,
                },
            )
            .await?;
            if created {
                n_synonyms += 1;
            }
        }
        debug!(term = %m_term.accession, synonyms = n_synonyms, "Loaded synonyms");
        Ok(n_synonyms)
    }

    /// Replace the term's alternate identifiers with the freshly fetched set.
    async fn load_alt_ids(
        &self,
        tx: &mut PgTx<'_>,
        m_term: &TermRow,
        o_term: &OlsTerm,
    ) -> Result<usize> {
        sqlx::query("DELETE FROM ols.alt_id WHERE term_id = $1")
            .bind(m_term.term_id)
            .execute(&mut **tx)
            .await
            .context("Failed to delete prior alt ids")?;

        for accession in &o_term.annotation.has_alternative_id {
            sqlx::query("INSERT INTO ols.alt_id (alt_id, term_id, accession) VALUES ($1, $2, $3)")
                .bind(uuid::Uuid::new_v4())
                .bind(m_term.term_id)
                .bind(accession)
                .execute(&mut **tx)
                .await
                .context("Failed to insert alt id")?;
        }
        debug!(
            term = %m_term.accession,
            alt_ids = o_term.annotation.has_alternative_id.len(),
            "Loaded alt ids"
        );
        Ok(o_term.annotation.has_alternative_id.len())
    }

    /// Resolve the term's subset memberships through the remote property
    /// search. A search returning zero or multiple candidates is skipped
    /// silently; exactly one candidate yields an upserted subset carrying
    /// the property definition.
    async fn load_term_subsets(
        &self,
        tx: &mut PgTx<'_>,
        m_term: &TermRow,
        ontology_name: &str,
    ) -> Result<Vec<SubsetRow>> {
        let Some(subsets) = m_term.subsets.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(Vec::new());
        };
        info!(term = %m_term.accession, subsets, "Loading term subsets");
        let mut loaded = Vec::new();
        for subset_name in subsets.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let docs = self
                .client
                .search_properties(subset_name, ontology_name)
                .await?;
            if docs.len() != 1 {
                debug!(
                    subset = subset_name,
                    candidates = docs.len(),
                    "Ambiguous subset search, skipped"
                );
                continue;
            }
            let details = self.client.property_detail(&docs[0]).await?;
            let (subset, _created) = get_or_create(
                tx,
                SubsetSpec {
                    name: subset_name.to_string(),
                    definition: details.definition().unwrap_or_default().to_string(),
                },
            )
            .await?;
            loaded.push(subset);
        }
        Ok(loaded)
    }

    async fn resolve_ontology(
        &self,
        tx: &mut PgTx<'_>,
        ontology: &OntologyRef<'_>,
    ) -> Result<OntologyRow> {
        match ontology {
            OntologyRef::Name(name) => self.load_ontology_in(tx, name, None).await,
            OntologyRef::Record(row) => Ok((*row).clone()),
            OntologyRef::Remote(remote) => {
                let (row, _created) =
                    get_or_create(tx, OntologySpec::from_remote(remote, None)).await?;
                Ok(row)
            }
        }
    }

    /// Upsert a meta row, updating the value in place when the key exists.
    /// Returns whether the row was newly created.
    async fn set_meta(&self, tx: &mut PgTx<'_>, key: &str, value: &str) -> Result<bool> {
        let (meta, created) = get_or_create(
            tx,
            MetaSpec {
                meta_key: key.to_string(),
                meta_value: value.to_string(),
            },
        )
        .await?;
        if !created {
            debug!(key, value, "Updating meta row");
            sqlx::query("UPDATE ols.meta SET meta_value = $1 WHERE meta_id = $2")
                .bind(value)
                .bind(meta.meta_id)
                .execute(&mut **tx)
                .await
                .context("Failed to update meta row")?;
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn term_row(accession: &str) -> TermRow {
        TermRow {
            term_id: Uuid::new_v4(),
            ontology_id: Uuid::new_v4(),
            accession: accession.to_string(),
            name: None,
            description: None,
            is_root: false,
            is_obsolete: false,
            iri: None,
            subsets: None,
        }
    }

    #[test]
    fn hierarchy_names_fold_into_is_a() {
        assert_eq!(mapped_relation_name("parents"), "is_a");
        assert_eq!(mapped_relation_name("children"), "is_a");
        assert_eq!(mapped_relation_name("part_of"), "part_of");
    }

    #[test]
    fn children_sourced_edges_are_reversed() {
        let term = term_row("GO:0000001");
        let related = term_row("GO:0000002");

        let (parent, child) = relation_endpoints("children", &term, &related);
        assert_eq!(parent.accession, "GO:0000001");
        assert_eq!(child.accession, "GO:0000002");

        let (parent, child) = relation_endpoints("parents", &term, &related);
        assert_eq!(parent.accession, "GO:0000002");
        assert_eq!(child.accession, "GO:0000001");

        // any non-children source keeps the current term as child
        let (parent, child) = relation_endpoints("part_of", &term, &related);
        assert_eq!(parent.accession, "GO:0000002");
        assert_eq!(child.accession, "GO:0000001");
    }

    #[test]
    fn synonym_scopes_map_to_stored_vocabulary() {
        assert_eq!(synonym_scope("hasExactSynonym"), Some(SynonymScope::Exact));
        assert_eq!(synonym_scope("hasBroadSynonym"), Some(SynonymScope::Broad));
        assert_eq!(synonym_scope("hasNarrowSynonym"), Some(SynonymScope::Narrow));
        assert_eq!(
            synonym_scope("hasRelatedSynonym"),
            Some(SynonymScope::Related)
        );
        assert_eq!(synonym_scope("hasWeirdSynonym"), None);
    }

    #[test]
    fn derived_links_are_ignored() {
        for name in ["graph", "jstree", "ancestors", "hierarchicalChildren", "self"] {
            assert!(IGNORED_RELATIONS.contains(&name));
        }
        assert!(!IGNORED_RELATIONS.contains(&"parents"));
        assert!(!IGNORED_RELATIONS.contains(&"children"));
    }

    #[test]
    fn allow_list_covers_the_core_ontologies() {
        assert_eq!(ALLOWED_ONTOLOGIES.len(), 22);
        assert!(ALLOWED_ONTOLOGIES.contains(&"go"));
        assert!(ALLOWED_ONTOLOGIES.contains(&"bto"));
        assert!(!ALLOWED_ONTOLOGIES.contains(&"cvdo"));
    }
}
