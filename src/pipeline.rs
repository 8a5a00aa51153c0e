//! Workflow-harness adapter
//!
//! Thin seam for running the loader as a pipeline step inside a host
//! workflow scheduler. A step fetches its input, runs, and writes output
//! events onto a [`Dataflow`] sink for downstream chaining.

use crate::loader::OlsLoader;
use crate::ols::client::OlsApi;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

/// Collects (branch, payload) events emitted by a step for downstream
/// consumers.
#[derive(Debug, Default)]
pub struct Dataflow {
    events: Vec<(u16, Value)>,
}

impl Dataflow {
    pub fn emit(&mut self, branch: u16, payload: Value) {
        self.events.push((branch, payload));
    }

    pub fn events(&self) -> &[(u16, Value)] {
        &self.events
    }
}

/// A pipeline step lifecycle: defaults, input, work, output.
#[async_trait]
pub trait Runnable {
    fn param_defaults(&self) -> Value {
        json!({ "db_version": 96 })
    }

    async fn fetch_input(&mut self) -> Result<()> {
        Ok(())
    }

    async fn run(&mut self) -> Result<()>;

    async fn write_output(&mut self, flow: &mut Dataflow) -> Result<()>;
}

/// Minimal chaining example: combines two input values and flows the result
/// downstream on branch 2.
pub struct CombineStep {
    pub alpha: i64,
    pub beta: i64,
    gamma: Option<i64>,
}

impl CombineStep {
    pub fn new(alpha: i64, beta: i64) -> Self {
        Self {
            alpha,
            beta,
            gamma: None,
        }
    }
}

#[async_trait]
impl Runnable for CombineStep {
    async fn fetch_input(&mut self) -> Result<()> {
        info!(alpha = self.alpha, beta = self.beta, "Fetched step input");
        Ok(())
    }

    async fn run(&mut self) -> Result<()> {
        self.gamma = Some(self.alpha + self.beta);
        Ok(())
    }

    async fn write_output(&mut self, flow: &mut Dataflow) -> Result<()> {
        flow.emit(2, json!({ "gamma": self.gamma }));
        Ok(())
    }
}

/// Production step: loads one ontology end to end and flows whether this
/// was its first load.
pub struct OntologyLoadStep<A: OlsApi> {
    loader: OlsLoader<A>,
    ontology_name: String,
    created: Option<bool>,
}

impl<A: OlsApi> OntologyLoadStep<A> {
    pub fn new(loader: OlsLoader<A>, ontology_name: impl Into<String>) -> Self {
        Self {
            loader,
            ontology_name: ontology_name.into(),
            created: None,
        }
    }
}

#[async_trait]
impl<A: OlsApi> Runnable for OntologyLoadStep<A> {
    async fn run(&mut self) -> Result<()> {
        let created = self.loader.load_all(&self.ontology_name).await?;
        self.created = Some(created);
        Ok(())
    }

    async fn write_output(&mut self, flow: &mut Dataflow) -> Result<()> {
        flow.emit(
            2,
            json!({ "ontology": self.ontology_name, "created": self.created }),
        );
        Ok(())
    }
}

/// Drive a step through its full lifecycle, returning the emitted events.
pub async fn run_step<S: Runnable + Send>(step: &mut S) -> Result<Dataflow> {
    let mut flow = Dataflow::default();
    step.fetch_input().await?;
    step.run().await?;
    step.write_output(&mut flow).await?;
    Ok(flow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn combine_step_flows_the_sum_downstream() {
        let mut step = CombineStep::new(40, 2);
        assert_eq!(step.param_defaults()["db_version"], 96);

        let flow = run_step(&mut step).await.unwrap();
        assert_eq!(flow.events().len(), 1);
        let (branch, payload) = &flow.events()[0];
        assert_eq!(*branch, 2);
        assert_eq!(payload["gamma"], 42);
    }
}
