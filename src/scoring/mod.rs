//! # Coverage Scoring
//!
//! Ranks the available tools into tiers by how many vulnerabilities they are credited with.
//!
//! A tool is credited with every vulnerability it detects directly and with the direct parents
//! of those vulnerabilities: spotting a specialization counts as evidence for the general case.
//! Tools with the same credited count share a tier; tier 0 holds the widest coverage.
//!
//! The scorer keeps no state between calls. Tiers are recomputed from the knowledge base on
//! every request.

use crate::knowledge::{KnowledgeBase, Tool};
use serde::Serialize;
use std::collections::BTreeSet;

/// One rank group of tools sharing the same credited coverage size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageTier {
    pub rank: usize,
    pub coverage: usize,
    pub tools: Vec<String>,
}

/// A tool together with the vulnerability ids it is credited with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolScore {
    pub tool: String,
    pub credited: BTreeSet<String>,
}

pub struct CoverageScorer<'kb> {
    kb: &'kb KnowledgeBase,
    tools: Vec<&'kb Tool>,
}

impl<'kb> CoverageScorer<'kb> {
    /// Score only the tools whose names appear in `supported` (all tools if empty).
    pub fn new(kb: &'kb KnowledgeBase, supported: &[String]) -> Self {
        Self {
            kb,
            tools: kb.available_tools(supported),
        }
    }

    /// Vulnerability ids credited to `tool`: direct detections plus their parents.
    pub fn credited(&self, tool: &Tool) -> BTreeSet<String> {
        let mut credited = BTreeSet::new();
        for vuln in self.kb.vulnerabilities() {
            if vuln.is_detected_by(&tool.id) {
                credited.insert(vuln.id.clone());
                credited.extend(vuln.parent_vulnerabilities.iter().cloned());
            }
        }
        credited
    }

    /// Every available tool with its credited set, widest coverage first.
    ///
    /// The sort is stable, so tools with equal coverage keep knowledge base order.
    pub fn scores(&self) -> Vec<ToolScore> {
        let mut scores: Vec<ToolScore> = self
            .tools
            .iter()
            .map(|tool| ToolScore {
                tool: tool.name.clone(),
                credited: self.credited(tool),
            })
            .collect();
        scores.sort_by(|a, b| b.credited.len().cmp(&a.credited.len()));
        scores
    }

    /// All tiers in strictly decreasing coverage order.
    pub fn tiers(&self) -> Vec<CoverageTier> {
        let mut tiers: Vec<CoverageTier> = Vec::new();
        for score in self.scores() {
            let size = score.credited.len();
            match tiers.last_mut() {
                Some(tier) if tier.coverage == size => tier.tools.push(score.tool),
                _ => tiers.push(CoverageTier {
                    rank: tiers.len(),
                    coverage: size,
                    tools: vec![score.tool],
                }),
            }
        }
        tiers
    }

    /// Tool names at `tier`, or an empty list once the tiers are exhausted.
    pub fn best_tools(&self, tier: usize) -> Vec<String> {
        self.tiers()
            .into_iter()
            .nth(tier)
            .map(|t| t.tools)
            .unwrap_or_default()
    }
}
