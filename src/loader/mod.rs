//! Ontology loading orchestration.

pub mod ols_loader;

pub use ols_loader::{OlsLoader, OntologyRef, ALLOWED_ONTOLOGIES};
