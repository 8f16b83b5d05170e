use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Base of the public vulnerability catalog; the vulnerability id is appended.
pub const DEFAULT_CATALOG_URL: &str =
    "https://smart-contracts-vulns-data-model.github.io/smart-vulnerabilities/main?vulnerability=";

/// Tools SmartBugs can run.
pub const DEFAULT_SUPPORTED_TOOLS: [&str; 19] = [
    "confuzzius",
    "conkas",
    "ethainter",
    "ethor",
    "honeybadger",
    "madmax",
    "maian",
    "manticore",
    "mythril",
    "osiris",
    "oyente",
    "pakala",
    "securify",
    "sfuzz",
    "slither",
    "solhint",
    "teether",
    "vandal",
    "smartcheck",
];

// Docker memory syntax: 512m, 1g, 1073741824
static MEM_LIMIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1-9][0-9]*[bkmgBKMG]?$").unwrap());

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub knowledge_base: KnowledgeBaseConfig,
    pub smartbugs: SmartBugsConfig,
    pub execution: ExecutionConfig,
    pub tools: ToolsConfig,
    pub orchestration: OrchestrationConfig,
    pub output: OutputConfig,
}

/// Where the vulnerability knowledge base lives and how its entries are linked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseConfig {
    pub path: PathBuf,
    pub catalog_url: String,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./smart-vulnerabilities/src/data/out.json"),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
        }
    }
}

/// How to launch SmartBugs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartBugsConfig {
    /// Command line prefix, split on whitespace (e.g. "python3 smartbugs/sb").
    pub command: String,
    /// Directory in which the temporary results directory is created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_parent: Option<PathBuf>,
}

impl Default for SmartBugsConfig {
    fn default() -> Self {
        Self {
            command: "./smartbugs/smartbugs".to_string(),
            results_parent: None,
        }
    }
}

/// Resource settings forwarded to every tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Number of parallel processes.
    pub processes: usize,
    /// Timeout for each task in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// CPU quota for docker containers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_quota: Option<u64>,
    /// Memory quota for docker containers, like 512m or 1g.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mem_limit: Option<String>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            processes: 1,
            timeout: None,
            cpu_quota: None,
            mem_limit: None,
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "processes",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.timeout == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                reason: "must be at least 1 second".to_string(),
            });
        }
        if let Some(mem) = &self.mem_limit
            && !MEM_LIMIT.is_match(mem)
        {
            return Err(ConfigError::InvalidValue {
                field: "mem_limit",
                reason: format!("'{}' is not a memory size like 512m or 1g", mem),
            });
        }
        Ok(())
    }
}

/// Tools the orchestrator may select
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Empty means every tool of the knowledge base.
    pub supported: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            supported: DEFAULT_SUPPORTED_TOOLS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    /// Invoke a tool again when a later phase selects it.
    pub rerun_invoked_tools: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from("data.json"),
        }
    }
}
