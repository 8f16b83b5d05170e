use crate::execution::{Finding, ToolResults};
use std::collections::{BTreeMap, BTreeSet};

/// Findings accumulated over a whole run, keyed by tool.
///
/// Merging is a union: a finding already recorded for a tool is not stored twice, and nothing
/// is ever removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultAggregator {
    findings: BTreeMap<String, Vec<Finding>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one invocation's results; returns how many findings were new.
    pub fn merge(&mut self, results: &ToolResults) -> usize {
        let mut added = 0;
        for (tool, findings) in results {
            let recorded = self.findings.entry(tool.clone()).or_default();
            for finding in findings {
                if !recorded.contains(finding) {
                    recorded.push(finding.clone());
                    added += 1;
                }
            }
        }
        added
    }

    pub fn findings(&self) -> &BTreeMap<String, Vec<Finding>> {
        &self.findings
    }

    pub fn is_empty(&self) -> bool {
        self.findings.values().all(Vec::is_empty)
    }

    pub fn finding_count(&self) -> usize {
        self.findings.values().map(Vec::len).sum()
    }

    /// Every vulnerability reference carried by any finding, as reported.
    pub fn references(&self) -> BTreeSet<String> {
        self.findings
            .values()
            .flatten()
            .flat_map(|f| f.sbo.iter().cloned())
            .collect()
    }
}
