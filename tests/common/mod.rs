#![allow(dead_code)]

use smartbugs_orchestrator::config::ExecutionConfig;
use smartbugs_orchestrator::error::ExecutionError;
use smartbugs_orchestrator::execution::{ExecutionService, Finding, ToolResults};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// slither detects Reentrancy, mythril detects its cross-function variant, Gas griefing is
/// enabled by Reentrancy and detected by nobody, and Front running impacts the variant.
pub const KNOWLEDGE_BASE: &str = r#"{
    "tools": [
        {"id": "T1", "name": "slither"},
        {"id": "T2", "name": "mythril"},
        {"id": "T3", "name": "oyente"}
    ],
    "vulnerabilities": [
        {"id": "V1", "name": "Reentrancy", "level": "L1", "tools": ["T1"],
         "categories": ["C1"], "description": "State change after external call"},
        {"id": "V2", "name": "Cross-function reentrancy", "level": "L1", "tools": ["T2"],
         "parent_vulnerabilities": ["V1"]},
        {"id": "V3", "name": "Gas griefing", "level": "L2", "enabling_vulnerabilities": ["V1"]},
        {"id": "V4", "name": "Front running", "tools": ["T3"], "impacting_vulnerabilities": ["V2"]}
    ],
    "levels": [{"id": "L1", "name": "High"}, {"id": "L2", "name": "Medium"}],
    "categories": [{"id": "C1", "name": "Control flow"}],
    "attacks": [],
    "references": [],
    "cwes": [],
    "swcs": [],
    "mitigations": []
}"#;

pub fn write_knowledge_base(dir: &Path) -> PathBuf {
    let path = dir.join("out.json");
    fs::write(&path, KNOWLEDGE_BASE).unwrap();
    path
}

/// In-memory execution service returning canned findings and recording every call.
#[derive(Default)]
pub struct ScriptedService {
    pub findings: BTreeMap<String, Vec<Finding>>,
    pub failing: BTreeSet<String>,
    pub calls: Vec<BTreeSet<String>>,
}

impl ScriptedService {
    pub fn finds(mut self, tool: &str, sbo: &[&str]) -> Self {
        self.findings
            .entry(tool.to_string())
            .or_default()
            .push(Finding::new(sbo.iter().copied()).with_target("contracts/Bank.sol"));
        self
    }

    /// Any call including `tool` fails.
    pub fn fails_with(mut self, tool: &str) -> Self {
        self.failing.insert(tool.to_string());
        self
    }
}

impl ExecutionService for ScriptedService {
    fn invoke(
        &mut self,
        tools: &BTreeSet<String>,
        _targets: &[PathBuf],
        _config: &ExecutionConfig,
    ) -> Result<ToolResults, ExecutionError> {
        self.calls.push(tools.clone());
        if tools.iter().any(|t| self.failing.contains(t)) {
            return Err(ExecutionError::Failed {
                command: "smartbugs".to_string(),
                status: 1,
            });
        }
        Ok(tools
            .iter()
            .map(|t| (t.clone(), self.findings.get(t).cloned().unwrap_or_default()))
            .collect())
    }
}

impl ExecutionService for &mut ScriptedService {
    fn invoke(
        &mut self,
        tools: &BTreeSet<String>,
        targets: &[PathBuf],
        config: &ExecutionConfig,
    ) -> Result<ToolResults, ExecutionError> {
        (**self).invoke(tools, targets, config)
    }
}

pub fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}
