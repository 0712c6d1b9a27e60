//! Orchestrator operations
//!
//! The fixed set of REST calls the proxy knows how to make, and the request
//! shapes they translate into.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;

/// Page size used when listing connections
pub const CONNECTIONS_PAGE_LIMIT: u32 = 1000;

/// Server-side page limit for the cross-DAG run listing
pub const DAG_RUNS_PAGE_LIMIT: u32 = 10000;

/// HTTP method of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the orchestrator REST calls exposed as a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListConnections,
    ListDags,
    GetDag,
    ListTasks,
    GetTask,
    ListDagRuns,
    TriggerDagRun,
    ListDagRunsBatch,
}

/// Static description of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub method: HttpMethod,
    pub path_template: &'static str,
}

impl Operation {
    /// Every operation, in registration order
    pub const ALL: [Operation; 8] = [
        Operation::ListConnections,
        Operation::ListDags,
        Operation::GetDag,
        Operation::ListTasks,
        Operation::GetTask,
        Operation::ListDagRuns,
        Operation::TriggerDagRun,
        Operation::ListDagRunsBatch,
    ];

    pub fn descriptor(&self) -> OperationDescriptor {
        let (name, method, path_template) = match self {
            Operation::ListConnections => ("get_connections", HttpMethod::Get, "/connections"),
            Operation::ListDags => ("get_dags", HttpMethod::Get, "/dags"),
            Operation::GetDag => ("get_dag", HttpMethod::Get, "/dags/{dag_id}/details"),
            Operation::ListTasks => ("get_tasks", HttpMethod::Get, "/dags/{dag_id}/tasks"),
            Operation::GetTask => (
                "get_task",
                HttpMethod::Get,
                "/dags/{dag_id}/tasks/{task_id}",
            ),
            Operation::ListDagRuns => ("get_dag_runs", HttpMethod::Get, "/dags/{dag_id}/dagRuns"),
            Operation::TriggerDagRun => (
                "trigger_dag_run",
                HttpMethod::Post,
                "/dags/{dag_id}/dagRuns",
            ),
            Operation::ListDagRunsBatch => (
                "get_dag_runs_batch",
                HttpMethod::Post,
                "/dags/~/dagRuns/list",
            ),
        };
        OperationDescriptor {
            name,
            method,
            path_template,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    pub fn method(&self) -> HttpMethod {
        self.descriptor().method
    }

    /// Look up an operation by its tool name
    pub fn from_name(name: &str) -> Option<Operation> {
        Operation::ALL.into_iter().find(|op| op.name() == name)
    }
}

/// Filters for the cross-DAG run listing
///
/// Blank fields mean "no filter". `dag_ids` and `states` are comma separated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DagRunFilter {
    pub dag_ids: String,
    pub states: String,
    pub start_date_gte: String,
    pub start_date_lte: String,
}

impl DagRunFilter {
    /// Build the `~/dagRuns/list` request body, omitting blank filters
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("page_limit".to_string(), json!(DAG_RUNS_PAGE_LIMIT));

        if let Some(ids) = split_list(&self.dag_ids) {
            body.insert("dag_ids".to_string(), json!(ids));
        }
        if let Some(states) = split_list(&self.states) {
            body.insert("states".to_string(), json!(states));
        }
        if !self.start_date_gte.trim().is_empty() {
            body.insert("start_date_gte".to_string(), json!(self.start_date_gte.trim()));
        }
        if !self.start_date_lte.trim().is_empty() {
            body.insert("start_date_lte".to_string(), json!(self.start_date_lte.trim()));
        }

        Value::Object(body)
    }
}

fn split_list(raw: &str) -> Option<Vec<String>> {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// A concrete request against the orchestrator API
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorRequest {
    pub operation: Operation,
    /// Path relative to the API base, with parameters already substituted
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl OrchestratorRequest {
    fn new(operation: Operation, path_params: &[(&str, &str)]) -> Self {
        Self {
            operation,
            path: render_path(operation.descriptor().path_template, path_params),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn list_connections() -> Self {
        let mut req = Self::new(Operation::ListConnections, &[]);
        req.query
            .push(("limit".to_string(), CONNECTIONS_PAGE_LIMIT.to_string()));
        req
    }

    pub fn list_dags() -> Self {
        Self::new(Operation::ListDags, &[])
    }

    pub fn dag_details(dag_id: &str) -> Self {
        Self::new(Operation::GetDag, &[("dag_id", dag_id)])
    }

    pub fn dag_tasks(dag_id: &str) -> Self {
        Self::new(Operation::ListTasks, &[("dag_id", dag_id)])
    }

    pub fn task(dag_id: &str, task_id: &str) -> Self {
        Self::new(
            Operation::GetTask,
            &[("dag_id", dag_id), ("task_id", task_id)],
        )
    }

    pub fn dag_runs(dag_id: &str) -> Self {
        Self::new(Operation::ListDagRuns, &[("dag_id", dag_id)])
    }

    /// Trigger a run; the orchestrator receives an empty JSON object
    pub fn trigger_dag_run(dag_id: &str) -> Self {
        let mut req = Self::new(Operation::TriggerDagRun, &[("dag_id", dag_id)]);
        req.body = Some(json!({}));
        req
    }

    pub fn dag_runs_batch(filter: &DagRunFilter) -> Self {
        let mut req = Self::new(Operation::ListDagRunsBatch, &[]);
        req.body = Some(filter.to_body());
        req
    }

    pub fn method(&self) -> HttpMethod {
        self.operation.method()
    }
}

/// Substitute `{name}` placeholders with percent-encoded values
fn render_path(template: &str, params: &[(&str, &str)]) -> String {
    params.iter().fold(template.to_string(), |path, (name, value)| {
        path.replace(&format!("{{{}}}", name), &urlencoding::encode(value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_operation_names_are_unique() {
        let mut names: Vec<_> = Operation::ALL.iter().map(|op| op.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Operation::ALL.len());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            Operation::from_name("trigger_dag_run"),
            Some(Operation::TriggerDagRun)
        );
        assert_eq!(Operation::from_name("drop_database"), None);
    }

    #[test]
    fn test_path_substitution() {
        let req = OrchestratorRequest::task("load_sales", "extract");
        assert_eq!(req.path, "/dags/load_sales/tasks/extract");
        assert_eq!(req.method(), HttpMethod::Get);
    }

    #[test]
    fn test_path_parameters_are_encoded() {
        let req = OrchestratorRequest::dag_details("a b/c");
        assert_eq!(req.path, "/dags/a%20b%2Fc/details");

        let req = OrchestratorRequest::dag_details("etl.v2~daily_ü");
        assert_eq!(req.path, "/dags/etl.v2~daily_%C3%BC/details");
    }

    #[test]
    fn test_list_connections_is_paged() {
        let req = OrchestratorRequest::list_connections();
        assert_eq!(req.path, "/connections");
        assert_eq!(req.query, vec![("limit".to_string(), "1000".to_string())]);
    }

    #[test]
    fn test_trigger_has_empty_body() {
        let req = OrchestratorRequest::trigger_dag_run("load_sales");
        assert_eq!(req.path, "/dags/load_sales/dagRuns");
        assert_eq!(req.method(), HttpMethod::Post);
        assert_eq!(req.body, Some(json!({})));
    }

    #[test]
    fn test_blank_filters_are_omitted() {
        let filter = DagRunFilter {
            dag_ids: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(filter.to_body(), json!({ "page_limit": 10000 }));
    }

    #[test]
    fn test_filters_are_split() {
        let filter = DagRunFilter {
            dag_ids: "load_sales, load_orders,".to_string(),
            states: "failed".to_string(),
            start_date_gte: "2024-01-01T00:00:00Z".to_string(),
            start_date_lte: String::new(),
        };
        assert_eq!(
            filter.to_body(),
            json!({
                "page_limit": 10000,
                "dag_ids": ["load_sales", "load_orders"],
                "states": ["failed"],
                "start_date_gte": "2024-01-01T00:00:00Z"
            })
        );
        let req = OrchestratorRequest::dag_runs_batch(&filter);
        assert_eq!(req.path, "/dags/~/dagRuns/list");
    }
}
