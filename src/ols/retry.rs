//! Retry gateway for the OLS client
//!
//! Every remote call goes through [`RetryClient`]. Transient network
//! failures are retried after a fixed pause, up to `max_retry` attempts in
//! total; the last failure is then surfaced to the caller. Non-network
//! errors propagate immediately.

use super::client::{OlsApi, OlsError};
use super::types::{OlsOntology, OlsProperty, OlsTerm, SearchDoc};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

pub struct RetryClient<A: OlsApi> {
    inner: A,
    max_retry: u32,
    retry_wait: Duration,
}

impl<A: OlsApi> RetryClient<A> {
    pub fn new(inner: A, max_retry: u32, retry_wait: Duration) -> Self {
        Self {
            inner,
            max_retry: max_retry.max(1),
            retry_wait,
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    async fn with_retry<T, F, Fut>(&self, what: &str, op: F) -> Result<T, OlsError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, OlsError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    warn!(call = what, attempt, error = %e, "Network error calling OLS");
                    if attempt >= self.max_retry {
                        error!(call = what, attempt, "Max OLS API retries reached");
                        return Err(e);
                    }
                    sleep(self.retry_wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn ontology(&self, name: &str) -> Result<OlsOntology, OlsError> {
        self.with_retry("ontology", || self.inner.ontology(name)).await
    }

    pub async fn terms(&self, ontology: &str) -> Result<Vec<OlsTerm>, OlsError> {
        self.with_retry("terms", || self.inner.terms(ontology)).await
    }

    pub async fn term_by_iri(&self, iri: &str) -> Result<OlsTerm, OlsError> {
        self.with_retry("term", || self.inner.term_by_iri(iri)).await
    }

    pub async fn related_terms(
        &self,
        o_term: &OlsTerm,
        relation: &str,
    ) -> Result<Vec<OlsTerm>, OlsError> {
        self.with_retry("related_terms", || self.inner.related_terms(o_term, relation))
            .await
    }

    pub async fn search_properties(
        &self,
        query: &str,
        ontology: &str,
    ) -> Result<Vec<SearchDoc>, OlsError> {
        self.with_retry("search", || self.inner.search_properties(query, ontology))
            .await
    }

    pub async fn property_detail(&self, doc: &SearchDoc) -> Result<OlsProperty, OlsError> {
        self.with_retry("detail", || self.inner.property_detail(doc)).await
    }
}
