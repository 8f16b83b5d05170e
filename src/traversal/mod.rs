//! # Relationship Traversal
//!
//! One-hop navigation of the vulnerability graph and the mapping from vulnerabilities back to
//! the tools able to detect them.
//!
//! Forward relations (`enabling`, `impacting`, `parents`) read the stored id lists. Reverse
//! relations (`enabled_by`, `impacted_by`, `children`) scan the whole graph and never include
//! the queried vulnerability itself.

use crate::knowledge::{KnowledgeBase, Tool, Vulnerability};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The relationship followed by one expansion phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Vulnerabilities enabled by the found one.
    Enabled,
    /// Vulnerabilities the found one impacts.
    Impactant,
    /// Vulnerabilities that enable the found one.
    Enabling,
    /// Vulnerabilities that impact the found one.
    Impacting,
}

impl Relation {
    /// Fixed order in which the expansion phases run.
    pub const EXPANSION_ORDER: [Relation; 4] = [
        Self::Enabled,
        Self::Impactant,
        Self::Enabling,
        Self::Impacting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Impactant => "impacted",
            Self::Enabling => "enabling",
            Self::Impacting => "impacting",
        }
    }

    /// How a found vulnerability relates to its frontier, e.g. "enables".
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Enabled => "enables",
            Self::Impactant => "is impactant on",
            Self::Enabling => "is enabled by",
            Self::Impacting => "is impacted by",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which tools can look for which part of a frontier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoveragePlan {
    /// Tool name -> frontier vulnerabilities it detects directly.
    pub capable: BTreeMap<String, BTreeSet<String>>,
    /// Frontier vulnerabilities at least one tool detects.
    pub covered: BTreeSet<String>,
    /// Frontier vulnerabilities no available tool detects.
    pub blind: BTreeSet<String>,
}

impl CoveragePlan {
    pub fn tools(&self) -> BTreeSet<String> {
        self.capable.keys().cloned().collect()
    }
}

pub struct RelationshipTraversal<'kb> {
    kb: &'kb KnowledgeBase,
}

impl<'kb> RelationshipTraversal<'kb> {
    pub fn new(kb: &'kb KnowledgeBase) -> Self {
        Self { kb }
    }

    pub fn enabling(&self, v: &Vulnerability) -> Vec<String> {
        v.enabling_vulnerabilities.clone()
    }

    pub fn enabled_by(&self, v: &Vulnerability) -> Vec<String> {
        self.reverse_scan(v, |w| w.is_enabled_by(&v.id))
    }

    pub fn impacting(&self, v: &Vulnerability) -> Vec<String> {
        v.impacting_vulnerabilities.clone()
    }

    pub fn impacted_by(&self, v: &Vulnerability) -> Vec<String> {
        self.reverse_scan(v, |w| w.is_impacted_by(&v.id))
    }

    pub fn parents(&self, v: &Vulnerability) -> Vec<String> {
        v.parent_vulnerabilities.clone()
    }

    /// Vulnerabilities that list `v` as a parent.
    pub fn children(&self, v: &Vulnerability) -> Vec<String> {
        self.reverse_scan(v, |w| w.has_parent(&v.id))
    }

    pub fn related(&self, v: &Vulnerability, relation: Relation) -> Vec<String> {
        match relation {
            Relation::Enabled => self.enabled_by(v),
            Relation::Impactant => self.impacted_by(v),
            Relation::Enabling => self.enabling(v),
            Relation::Impacting => self.impacting(v),
        }
    }

    /// Vulnerability ids listing `tool` directly. No parent propagation.
    pub fn connected_vulnerabilities(&self, tool: &Tool) -> BTreeSet<String> {
        self.kb
            .vulnerabilities()
            .iter()
            .filter(|v| v.is_detected_by(&tool.id))
            .map(|v| v.id.clone())
            .collect()
    }

    /// Match `frontier` against the strict detection sets of `tools`.
    pub fn plan_coverage(&self, frontier: &BTreeSet<String>, tools: &[&Tool]) -> CoveragePlan {
        let mut plan = CoveragePlan::default();
        if frontier.is_empty() {
            return plan;
        }

        for tool in tools {
            let hits: BTreeSet<String> = self
                .connected_vulnerabilities(tool)
                .intersection(frontier)
                .cloned()
                .collect();
            if !hits.is_empty() {
                plan.covered.extend(hits.iter().cloned());
                plan.capable.insert(tool.name.clone(), hits);
            }
        }

        plan.blind = frontier.difference(&plan.covered).cloned().collect();
        plan
    }

    fn reverse_scan<F>(&self, v: &Vulnerability, matches: F) -> Vec<String>
    where
        F: Fn(&Vulnerability) -> bool,
    {
        self.kb
            .vulnerabilities()
            .iter()
            .filter(|w| w.id != v.id && matches(*w))
            .map(|w| w.id.clone())
            .collect()
    }
}
