//! # Execution Service
//!
//! The boundary between the decision engine and the tools themselves. The engine hands over a
//! set of tool names and the target files and gets back, per tool, the findings it produced.
//! How tools are sandboxed, parallelized or limited is up to the implementation.

pub mod sarif;
pub mod smartbugs;

pub use smartbugs::SmartBugsService;

use crate::config::ExecutionConfig;
use crate::error::ExecutionError;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Findings per tool name.
pub type ToolResults = BTreeMap<String, Vec<Finding>>;

/// Runs analysis tools against contract files.
///
/// A tool that fails, times out or is killed is reported like a tool that found nothing:
/// either it is missing from the returned map or its list is empty.
pub trait ExecutionService {
    fn invoke(
        &mut self,
        tools: &BTreeSet<String>,
        targets: &[PathBuf],
        config: &ExecutionConfig,
    ) -> Result<ToolResults, ExecutionError>;
}

/// One result reported by a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    /// Vulnerability references (ids or names) attached to the result.
    pub sbo: Vec<String>,
    /// Contract file the result points at, if the tool reported a location.
    pub target: Option<String>,
    /// Every other field of the tool's result, untouched.
    pub native: Map<String, Value>,
}

impl Finding {
    pub fn new<I, S>(sbo: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sbo: sbo.into_iter().map(Into::into).collect(),
            target: None,
            native: Map::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.native.insert(key.into(), value);
        self
    }
}

/// Whether any tool in `results` reported at least one finding.
pub fn found_anything(results: &ToolResults) -> bool {
    results.values().any(|findings| !findings.is_empty())
}
