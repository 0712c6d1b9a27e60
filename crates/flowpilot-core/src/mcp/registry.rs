//! Tool registry
//!
//! Wraps each orchestrator operation as a named tool with a description and
//! declared parameters. Argument defaults (blank string = no filter) are
//! resolved here; the proxy receives fully-shaped requests.

use super::protocol::{JsonRpcError, ToolCallResult, ToolDescriptor};
use crate::orchestrator::{DagRunFilter, Operation, OrchestratorClient, OrchestratorRequest};
use serde_json::{json, Map, Value};

/// A declared tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolParam {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

const DAG_ID: ToolParam = ToolParam {
    name: "dag_id",
    description: "ID of the DAG",
    required: true,
};

const TASK_ID: ToolParam = ToolParam {
    name: "task_id",
    description: "ID of the task within the DAG",
    required: true,
};

const BATCH_FILTERS: [ToolParam; 4] = [
    ToolParam {
        name: "dag_ids",
        description: "Comma separated DAG IDs to include; empty string for all DAGs",
        required: false,
    },
    ToolParam {
        name: "states",
        description: "Comma separated run states (queued, running, success, failed); empty string for any state",
        required: false,
    },
    ToolParam {
        name: "start_date_gte",
        description: "Only runs started at or after this ISO-8601 timestamp; empty string for no lower bound",
        required: false,
    },
    ToolParam {
        name: "start_date_lte",
        description: "Only runs started at or before this ISO-8601 timestamp; empty string for no upper bound",
        required: false,
    },
];

/// A registered tool
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub operation: Operation,
    pub description: &'static str,
    pub params: &'static [ToolParam],
}

impl ToolSpec {
    pub fn name(&self) -> &'static str {
        self.operation.name()
    }

    /// JSON schema for the arguments, derived from the declared parameters
    pub fn argument_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in self.params {
            let mut prop = json!({
                "type": "string",
                "description": param.description,
            });
            if !param.required {
                prop["default"] = json!("");
            }
            properties.insert(param.name.to_string(), prop);
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description.to_string(),
            input_schema: self.argument_schema(),
        }
    }

    /// Turn JSON arguments into an orchestrator request
    pub fn build_request(&self, args: &Value) -> Result<OrchestratorRequest, JsonRpcError> {
        let request = match self.operation {
            Operation::ListConnections => OrchestratorRequest::list_connections(),
            Operation::ListDags => OrchestratorRequest::list_dags(),
            Operation::GetDag => OrchestratorRequest::dag_details(&required(args, "dag_id")?),
            Operation::ListTasks => OrchestratorRequest::dag_tasks(&required(args, "dag_id")?),
            Operation::GetTask => OrchestratorRequest::task(
                &required(args, "dag_id")?,
                &required(args, "task_id")?,
            ),
            Operation::ListDagRuns => OrchestratorRequest::dag_runs(&required(args, "dag_id")?),
            Operation::TriggerDagRun => {
                OrchestratorRequest::trigger_dag_run(&required(args, "dag_id")?)
            }
            Operation::ListDagRunsBatch => OrchestratorRequest::dag_runs_batch(&DagRunFilter {
                dag_ids: optional(args, "dag_ids"),
                states: optional(args, "states"),
                start_date_gte: optional(args, "start_date_gte"),
                start_date_lte: optional(args, "start_date_lte"),
            }),
        };
        Ok(request)
    }
}

/// Extract a required, non-empty string argument
fn required(args: &Value, key: &str) -> Result<String, JsonRpcError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            JsonRpcError::with_data(
                super::protocol::error_codes::INVALID_PARAMS,
                format!("Missing required argument: {}", key),
                json!({ "suggestion": format!("Add \"{}\": \"<value>\" to arguments", key) }),
            )
        })
}

/// Extract an optional string argument; absent means blank (no filter)
fn optional(args: &Value, key: &str) -> String {
    match args.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(","),
        _ => String::new(),
    }
}

/// The fixed set of orchestrator tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolSpec>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        let tools = vec![
            ToolSpec {
                operation: Operation::ListConnections,
                description: "Fetch all available Airflow connections via the Airflow REST API",
                params: &[],
            },
            ToolSpec {
                operation: Operation::ListDags,
                description: "Fetch all available Airflow DAGs and return the list of them",
                params: &[],
            },
            ToolSpec {
                operation: Operation::GetDag,
                description: "Get a simplified view of the DAG that retains all essential details",
                params: &[DAG_ID],
            },
            ToolSpec {
                operation: Operation::ListTasks,
                description: "List all tasks of a DAG",
                params: &[DAG_ID],
            },
            ToolSpec {
                operation: Operation::GetTask,
                description: "Get the details of a single task of a DAG",
                params: &[DAG_ID, TASK_ID],
            },
            ToolSpec {
                operation: Operation::ListDagRuns,
                description: "List the runs of a DAG",
                params: &[DAG_ID],
            },
            ToolSpec {
                operation: Operation::TriggerDagRun,
                description: "Trigger a new run of a DAG and return the created run",
                params: &[DAG_ID],
            },
            ToolSpec {
                operation: Operation::ListDagRunsBatch,
                description: "List DAG runs across DAGs, optionally filtered by DAG IDs, states and start date range",
                params: &BATCH_FILTERS,
            },
        ];
        Self { tools }
    }

    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(ToolSpec::descriptor).collect()
    }

    /// `tools/list` result payload
    pub fn list_tools_json(&self) -> Value {
        json!({ "tools": self.descriptors() })
    }

    /// Run a tool against the orchestrator (blocking)
    ///
    /// Unknown tools and missing arguments are JSON-RPC errors. Proxy failures
    /// are successful calls carrying `isError: true`.
    pub fn call(
        &self,
        client: &OrchestratorClient,
        name: &str,
        args: &Value,
    ) -> Result<ToolCallResult, JsonRpcError> {
        let spec = self
            .get(name)
            .ok_or_else(|| JsonRpcError::method_not_found(name))?;
        let request = spec.build_request(args)?;

        match client.send(&request) {
            Ok(value) => {
                let text = serde_json::to_string_pretty(&value)
                    .unwrap_or_else(|_| "Error serializing result".to_string());
                Ok(ToolCallResult::text(text))
            }
            Err(err) => {
                tracing::warn!(tool = name, error = %err, "tool execution failed");
                Ok(ToolCallResult::error(format!("Error: {}", err)))
            }
        }
    }
}
