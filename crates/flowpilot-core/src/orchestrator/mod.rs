//! Orchestrator API proxy
//!
//! Translates the fixed set of named operations into authenticated calls
//! against the Airflow REST API (`/api/v1`).

mod client;
mod error;
mod operation;

pub use client::OrchestratorClient;
pub use error::{ProxyError, ProxyErrorKind, ProxyResult};
pub use operation::{
    DagRunFilter, HttpMethod, Operation, OperationDescriptor, OrchestratorRequest,
    CONNECTIONS_PAGE_LIMIT, DAG_RUNS_PAGE_LIMIT,
};
