//! DTOs for the OLS REST API payloads.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ontology metadata from `GET /ontologies/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OlsOntology {
    #[serde(rename = "ontologyId")]
    pub ontology_id: String,
    /// Source file update stamp, RFC 3339.
    pub updated: Option<String>,
    #[serde(default)]
    pub config: OntologyConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OntologyConfig {
    pub title: Option<String>,
    pub version: Option<String>,
    pub namespace: Option<String>,
}

impl OlsOntology {
    /// Remote namespace, falling back to the ontology identifier.
    pub fn namespace(&self) -> &str {
        self.config.namespace.as_deref().unwrap_or(&self.ontology_id)
    }

    pub fn version(&self) -> Option<&str> {
        self.config.version.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.config.title.as_deref()
    }

    /// The `updated` stamp normalized to `%Y-%m-%d %H:%M:%S`, or the raw
    /// string when it does not parse as RFC 3339. `None` when the source
    /// reports no update stamp.
    pub fn updated_stamp(&self) -> Option<String> {
        self.updated.as_deref().map(|raw| {
            DateTime::<FixedOffset>::parse_from_rfc3339(raw)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|_| raw.to_string())
        })
    }
}

/// A term record, from the term listing or a term detail lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OlsTerm {
    pub iri: String,
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<Vec<String>>,
    pub obo_id: Option<String>,
    pub ontology_name: String,
    #[serde(default)]
    pub is_obsolete: bool,
    #[serde(default)]
    pub is_root: bool,
    #[serde(default)]
    pub is_defining_ontology: bool,
    #[serde(default)]
    pub obo_name_space: Option<String>,
    /// Plain synonym labels.
    #[serde(default)]
    pub synonyms: Option<Vec<String>>,
    /// Structured OBO synonyms with scope and cross-references.
    #[serde(default)]
    pub obo_synonym: Option<Vec<OboSynonym>>,
    #[serde(default)]
    pub in_subset: Option<Vec<String>>,
    #[serde(default)]
    pub annotation: TermAnnotation,
    #[serde(default, rename = "_links")]
    pub links: HashMap<String, OlsLink>,
}

impl OlsTerm {
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_ref()
            .and_then(|d| d.first())
            .map(String::as_str)
    }

    /// Relation type names exposed by the term, derived from its link map.
    /// Sorted for deterministic load order.
    pub fn relation_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.links.keys().cloned().collect();
        names.sort();
        names
    }

    /// Subset membership names. OLS reports a list, but individual entries
    /// may themselves be comma-separated.
    pub fn subset_names(&self) -> Vec<String> {
        self.in_subset
            .iter()
            .flatten()
            .flat_map(|entry| entry.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermAnnotation {
    #[serde(default)]
    pub has_alternative_id: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OboSynonym {
    pub name: String,
    /// e.g. `hasExactSynonym`, `hasBroadSynonym`.
    pub scope: Option<String>,
    #[serde(default)]
    pub xrefs: Vec<SynonymXref>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynonymXref {
    pub database: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OlsLink {
    pub href: String,
}

/// One page of the term listing (`_embedded.terms` plus paging state).
#[derive(Debug, Clone, Deserialize)]
pub struct TermPage {
    #[serde(rename = "_embedded")]
    pub embedded: Option<EmbeddedTerms>,
    #[serde(default)]
    pub page: PageInfo,
    #[serde(rename = "_links", default)]
    pub links: PageLinks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedTerms {
    #[serde(default)]
    pub terms: Vec<OlsTerm>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub number: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageLinks {
    pub next: Option<OlsLink>,
}

/// Search response envelope from `GET /search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub response: SearchResults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    #[serde(rename = "numFound", default)]
    pub num_found: u64,
    #[serde(default)]
    pub docs: Vec<SearchDoc>,
}

/// A candidate resource returned by the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDoc {
    pub iri: String,
    pub ontology_name: String,
    pub short_form: Option<String>,
    pub label: Option<String>,
}

/// Property detail, used for subset definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OlsProperty {
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<Vec<String>>,
}

impl OlsProperty {
    pub fn definition(&self) -> Option<&str> {
        self.description
            .as_ref()
            .and_then(|d| d.first())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_ontology_metadata() {
        let json = r#"{
            "ontologyId": "go",
            "updated": "2024-03-01T12:30:00.000+0000",
            "config": {
                "title": "Gene Ontology",
                "version": "2024-03-01",
                "namespace": "go"
            }
        }"#;
        let onto: OlsOntology = serde_json::from_str(json).unwrap();
        assert_eq!(onto.ontology_id, "go");
        assert_eq!(onto.namespace(), "go");
        assert_eq!(onto.version(), Some("2024-03-01"));
        assert_eq!(onto.updated_stamp().as_deref(), Some("2024-03-01 12:30:00"));
    }

    #[test]
    fn updated_stamp_keeps_unparseable_value() {
        let mut onto = OlsOntology {
            ontology_id: "so".into(),
            updated: Some("not a date".into()),
            config: OntologyConfig::default(),
        };
        assert_eq!(onto.updated_stamp().as_deref(), Some("not a date"));

        onto.updated = None;
        assert_eq!(onto.updated_stamp(), None);
    }

    #[test]
    fn deserialize_term_record() {
        let json = r#"{
            "iri": "http://purl.obolibrary.org/obo/GO_0000001",
            "label": "mitochondrion inheritance",
            "description": ["The distribution of mitochondria."],
            "obo_id": "GO:0000001",
            "ontology_name": "go",
            "is_obsolete": false,
            "is_defining_ontology": true,
            "obo_name_space": "biological_process",
            "synonyms": ["mitochondrial inheritance"],
            "obo_synonym": [
                {
                    "name": "mito inheritance",
                    "scope": "hasNarrowSynonym",
                    "xrefs": [{"database": "GOC", "id": "mcc"}]
                }
            ],
            "in_subset": ["gosubset_prok,goslim_yeast"],
            "annotation": {
                "has_alternative_id": ["GO:0000002"],
                "created_by": ["someone"]
            },
            "_links": {
                "self": {"href": "https://www.ebi.ac.uk/ols/api/terms/1"},
                "parents": {"href": "https://www.ebi.ac.uk/ols/api/terms/1/parents"},
                "children": {"href": "https://www.ebi.ac.uk/ols/api/terms/1/children"},
                "graph": {"href": "https://www.ebi.ac.uk/ols/api/terms/1/graph"}
            }
        }"#;
        let term: OlsTerm = serde_json::from_str(json).unwrap();
        assert_eq!(term.obo_id.as_deref(), Some("GO:0000001"));
        assert!(term.is_defining_ontology);
        assert_eq!(term.description(), Some("The distribution of mitochondria."));
        assert_eq!(term.annotation.has_alternative_id, vec!["GO:0000002"]);
        assert_eq!(
            term.relation_type_names(),
            vec!["children", "graph", "parents", "self"]
        );
        assert_eq!(term.subset_names(), vec!["gosubset_prok", "goslim_yeast"]);
    }

    #[test]
    fn deserialize_term_page_and_search_response() {
        let page_json = r#"{
            "_embedded": {"terms": [{"iri": "http://x", "ontology_name": "go"}]},
            "page": {"size": 500, "totalElements": 1, "totalPages": 1, "number": 0},
            "_links": {"self": {"href": "http://x"}}
        }"#;
        let page: TermPage = serde_json::from_str(page_json).unwrap();
        assert_eq!(page.page.total_pages, 1);
        assert_eq!(page.embedded.unwrap().terms.len(), 1);
        assert!(page.links.next.is_none());

        let search_json = r#"{
            "response": {
                "numFound": 1,
                "docs": [{
                    "iri": "http://purl.obolibrary.org/obo/go#gosubset_prok",
                    "ontology_name": "go",
                    "short_form": "gosubset_prok",
                    "label": "Prokaryotic GO subset"
                }]
            }
        }"#;
        let search: SearchResponse = serde_json::from_str(search_json).unwrap();
        assert_eq!(search.response.num_found, 1);
        assert_eq!(search.response.docs[0].ontology_name, "go");
    }
}
