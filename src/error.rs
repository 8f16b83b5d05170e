//! Error types for the orchestrator
//!
//! Only a broken knowledge base, invalid configuration or an I/O failure while writing the
//! report stop a run. Unknown identifiers and failed tool executions are not errors: they are
//! logged and degrade to "unknown" or "found nothing".

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(#[from] KnowledgeBaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// None of the file patterns matched a file
    #[error("No files match the given patterns: {}", .0.join(", "))]
    NoTargets(Vec<String>),

    #[error("Unknown vulnerability: {0}")]
    UnknownVulnerability(String),
}

/// Failures while loading the knowledge base file. Always fatal.
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed knowledge base {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParsingFailed(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Failures reported by an execution service.
///
/// The controller never propagates these: a failed invocation is logged and treated as an
/// invocation that found nothing.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with status {status}")]
    Failed { command: String, status: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse results in {file}: {reason}")]
    ResultParse { file: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
