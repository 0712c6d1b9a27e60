//! Orchestrator REST client
//!
//! Issues one authenticated request per call. No retries, no backoff.

use super::error::{ProxyError, ProxyResult};
use super::operation::{DagRunFilter, HttpMethod, OrchestratorRequest};
use crate::config::OrchestratorConfig;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::time::Duration;

/// Blocking client for the orchestrator REST API
#[derive(Clone)]
pub struct OrchestratorClient {
    base_url: String,
    authorization: String,
    agent: ureq::Agent,
}

impl OrchestratorClient {
    /// Create a client from the orchestrator config section
    pub fn new(config: &OrchestratorConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout))
            .build();
        let credentials = STANDARD.encode(format!("{}:{}", config.username, config.password));

        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            authorization: format!("Basic {}", credentials),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and parse the JSON response
    ///
    /// Non-2xx statuses, transport failures and undecodable bodies come back
    /// as a tagged [`ProxyError`].
    pub fn send(&self, request: &OrchestratorRequest) -> ProxyResult {
        let url = format!("{}{}", self.base_url, request.path);
        tracing::debug!(
            operation = request.operation.name(),
            method = %request.method(),
            %url,
            "orchestrator request"
        );

        let mut call = self
            .agent
            .request(request.method().as_str(), &url)
            .set("Authorization", &self.authorization)
            .set("Content-Type", "application/json");
        for (key, value) in &request.query {
            call = call.query(key, value);
        }

        let response = match (request.method(), &request.body) {
            (HttpMethod::Post, Some(body)) => call.send_json(body),
            _ => call.call(),
        }
        .map_err(|e| {
            let err = ProxyError::from(e);
            tracing::warn!(operation = request.operation.name(), error = %err, "orchestrator call failed");
            err
        })?;

        response
            .into_json::<serde_json::Value>()
            .map_err(|e| ProxyError::decode(e.to_string()))
    }

    pub fn get_connections(&self) -> ProxyResult {
        self.send(&OrchestratorRequest::list_connections())
    }

    pub fn get_dags(&self) -> ProxyResult {
        self.send(&OrchestratorRequest::list_dags())
    }

    pub fn get_dag(&self, dag_id: &str) -> ProxyResult {
        self.send(&OrchestratorRequest::dag_details(dag_id))
    }

    pub fn get_tasks(&self, dag_id: &str) -> ProxyResult {
        self.send(&OrchestratorRequest::dag_tasks(dag_id))
    }

    pub fn get_task(&self, dag_id: &str, task_id: &str) -> ProxyResult {
        self.send(&OrchestratorRequest::task(dag_id, task_id))
    }

    pub fn get_dag_runs(&self, dag_id: &str) -> ProxyResult {
        self.send(&OrchestratorRequest::dag_runs(dag_id))
    }

    pub fn trigger_dag_run(&self, dag_id: &str) -> ProxyResult {
        self.send(&OrchestratorRequest::trigger_dag_run(dag_id))
    }

    pub fn get_dag_runs_batch(&self, filter: &DagRunFilter) -> ProxyResult {
        self.send(&OrchestratorRequest::dag_runs_batch(filter))
    }
}
