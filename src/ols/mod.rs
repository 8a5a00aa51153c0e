//! OLS REST API integration
//!
//! DTOs mirroring the OLS JSON payloads, the reqwest-backed client behind
//! the [`OlsApi`](client::OlsApi) seam, and the bounded retry gateway that
//! wraps every remote call.

pub mod client;
pub mod retry;
pub mod types;

pub use client::{OlsApi, OlsClient, OlsError};
pub use retry::RetryClient;
pub use types::{OboSynonym, OlsOntology, OlsProperty, OlsTerm, SearchDoc};
