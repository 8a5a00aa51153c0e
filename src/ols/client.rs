//! OLS REST client
//!
//! HTTP client for the EMBL-EBI Ontology Lookup Service. The loader consumes
//! it through the [`OlsApi`] trait so tests can substitute a canned source.

use super::types::{
    OlsOntology, OlsProperty, OlsTerm, SearchDoc, SearchResponse, TermPage,
};
use crate::config::LoaderConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Errors from the remote ontology source.
///
/// Only [`OlsError::Network`] is transient: it covers connection and
/// transport-level failures from the HTTP send path and is the single class
/// the retry gateway recovers from. Everything else propagates immediately.
#[derive(Debug, thiserror::Error)]
pub enum OlsError {
    #[error("network error calling {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("OLS API returned {status} for {url}")]
    Api { status: StatusCode, url: String },
    #[error("failed to decode OLS response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid OLS URL {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("no OLS resource found for {0}")]
    NotFound(String),
}

impl OlsError {
    /// Whether the retry gateway may recover from this failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, OlsError::Network { .. })
    }
}

/// The four remote capabilities the loader depends on, plus the term-detail
/// and relation accessors derived from them.
#[async_trait]
pub trait OlsApi: Send + Sync {
    /// Fetch ontology metadata by short name.
    async fn ontology(&self, name: &str) -> Result<OlsOntology, OlsError>;

    /// Fetch the complete term listing for an ontology, draining pagination.
    async fn terms(&self, ontology: &str) -> Result<Vec<OlsTerm>, OlsError>;

    /// Fetch full term detail by IRI, preferring the defining-ontology entry.
    async fn term_by_iri(&self, iri: &str) -> Result<OlsTerm, OlsError>;

    /// Fetch terms related to `o_term` through the named relation link.
    async fn related_terms(
        &self,
        o_term: &OlsTerm,
        relation: &str,
    ) -> Result<Vec<OlsTerm>, OlsError>;

    /// Search for property resources matching `query` within an ontology.
    async fn search_properties(
        &self,
        query: &str,
        ontology: &str,
    ) -> Result<Vec<SearchDoc>, OlsError>;

    /// Fetch the detail of a property resource found through search.
    async fn property_detail(&self, doc: &SearchDoc) -> Result<OlsProperty, OlsError>;
}

/// reqwest-backed [`OlsApi`] implementation.
pub struct OlsClient {
    http: Client,
    base_url: String,
    page_size: usize,
}

impl OlsClient {
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        })
    }

    fn parse_url(raw: &str) -> Result<Url, OlsError> {
        Url::parse(raw).map_err(|source| OlsError::InvalidUrl {
            url: raw.to_string(),
            source,
        })
    }

    fn url_with_params(raw: &str, params: &[(&str, &str)]) -> Result<Url, OlsError> {
        Url::parse_with_params(raw, params).map_err(|source| OlsError::InvalidUrl {
            url: raw.to_string(),
            source,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, OlsError> {
        debug!(url = %url, "GET");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| OlsError::Network {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(OlsError::Api {
                status,
                url: url.to_string(),
            });
        }
        response.json::<T>().await.map_err(|source| OlsError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Drain a paginated term collection starting at `first`, following
    /// `_links.next` until exhausted.
    async fn drain_term_pages(&self, first: Url) -> Result<Vec<OlsTerm>, OlsError> {
        let mut terms = Vec::new();
        let mut next = Some(first);
        while let Some(url) = next {
            let page: TermPage = self.get_json(url).await?;
            if let Some(embedded) = page.embedded {
                terms.extend(embedded.terms);
            }
            next = match page.links.next {
                Some(link) => Some(Self::parse_url(&link.href)?),
                None => None,
            };
        }
        Ok(terms)
    }
}

#[async_trait]
impl OlsApi for OlsClient {
    async fn ontology(&self, name: &str) -> Result<OlsOntology, OlsError> {
        let url = Self::parse_url(&format!("{}/ontologies/{}", self.base_url, name))?;
        self.get_json(url).await
    }

    async fn terms(&self, ontology: &str) -> Result<Vec<OlsTerm>, OlsError> {
        let first = Self::url_with_params(
            &format!("{}/ontologies/{}/terms", self.base_url, ontology),
            &[("page", "0"), ("size", &self.page_size.to_string())],
        )?;
        self.drain_term_pages(first).await
    }

    async fn term_by_iri(&self, iri: &str) -> Result<OlsTerm, OlsError> {
        let url = Self::url_with_params(&format!("{}/terms", self.base_url), &[("iri", iri)])?;
        let page: TermPage = self.get_json(url).await?;
        let mut terms = page.embedded.map(|e| e.terms).unwrap_or_default();
        if let Some(idx) = terms.iter().position(|t| t.is_defining_ontology) {
            return Ok(terms.swap_remove(idx));
        }
        if terms.is_empty() {
            return Err(OlsError::NotFound(iri.to_string()));
        }
        Ok(terms.swap_remove(0))
    }

    async fn related_terms(
        &self,
        o_term: &OlsTerm,
        relation: &str,
    ) -> Result<Vec<OlsTerm>, OlsError> {
        let Some(link) = o_term.links.get(relation) else {
            return Ok(Vec::new());
        };
        let first = Self::parse_url(&link.href)?;
        self.drain_term_pages(first).await
    }

    async fn search_properties(
        &self,
        query: &str,
        ontology: &str,
    ) -> Result<Vec<SearchDoc>, OlsError> {
        let url = Self::url_with_params(
            &format!("{}/search", self.base_url),
            &[("q", query), ("ontology", ontology), ("type", "property")],
        )?;
        let response: SearchResponse = self.get_json(url).await?;
        Ok(response.response.docs)
    }

    async fn property_detail(&self, doc: &SearchDoc) -> Result<OlsProperty, OlsError> {
        // OLS requires the property IRI to be percent-encoded twice.
        let encoded = double_encode(&doc.iri);
        let url = Self::parse_url(&format!(
            "{}/ontologies/{}/properties/{}",
            self.base_url, doc.ontology_name, encoded
        ))?;
        self.get_json(url).await
    }
}

fn double_encode(iri: &str) -> String {
    let once: String = url::form_urlencoded::byte_serialize(iri.as_bytes()).collect();
    url::form_urlencoded::byte_serialize(once.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_encoding_escapes_percent_signs() {
        let encoded = double_encode("http://purl.obolibrary.org/obo/go#gosubset_prok");
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('#'));
        // the single-pass '%' must itself be escaped
        assert!(encoded.contains("%25"));
    }

    #[test]
    fn only_network_errors_are_transient() {
        let api = OlsError::Api {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            url: "http://example.test".into(),
        };
        assert!(!api.is_transient());
        assert!(!OlsError::NotFound("x".into()).is_transient());
    }
}
