//! Turns accumulated findings into the human-readable report.
//!
//! Every vulnerability reference of every finding is replaced by the full knowledge base
//! record with its identifiers resolved to names and a catalog link in place of the id.
//! Enrichment only reads the findings, so it can run any number of times.

use super::ResultAggregator;
use crate::execution::Finding;
use crate::knowledge::{KnowledgeBase, RecordKind, ReferenceLink, Vulnerability};
use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A vulnerability with every identifier resolved to a name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedVulnerability {
    pub url: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    pub categories: Vec<String>,
    pub attacks: Vec<String>,
    pub cwes: Vec<String>,
    pub swcs: Vec<String>,
    pub mitigations: Vec<String>,
    pub references: Vec<ReferenceLink>,
    pub tools: Vec<String>,
    pub parent_vulnerabilities: Vec<String>,
    pub enabling_vulnerabilities: Vec<String>,
    pub impacting_vulnerabilities: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A tool result with its vulnerability references expanded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedFinding {
    #[serde(flatten)]
    pub native: Map<String, Value>,
    pub sbo: Vec<EnrichedVulnerability>,
    /// References that match no vulnerability of the knowledge base.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved_sbo: Vec<String>,
}

/// Final report: tool name -> enriched findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EnrichedReport {
    pub tools: BTreeMap<String, Vec<EnrichedFinding>>,
}

impl EnrichedReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub struct Enricher<'kb> {
    kb: &'kb KnowledgeBase,
    catalog_url: String,
}

impl<'kb> Enricher<'kb> {
    pub fn new(kb: &'kb KnowledgeBase, catalog_url: impl Into<String>) -> Self {
        Self {
            kb,
            catalog_url: catalog_url.into(),
        }
    }

    pub fn vulnerability_url(&self, id: &str) -> String {
        format!("{}{}", self.catalog_url, id)
    }

    pub fn enrich(&self, aggregator: &ResultAggregator) -> EnrichedReport {
        let tools = aggregator
            .findings()
            .iter()
            .map(|(tool, findings)| {
                let enriched = findings.iter().map(|f| self.enrich_finding(f)).collect();
                (tool.clone(), enriched)
            })
            .collect();
        EnrichedReport { tools }
    }

    pub fn enrich_finding(&self, finding: &Finding) -> EnrichedFinding {
        let mut sbo = Vec::new();
        let mut unresolved_sbo = Vec::new();
        for reference in &finding.sbo {
            match self.kb.vulnerability(reference) {
                Some(vuln) => sbo.push(self.enrich_vulnerability(vuln)),
                None => {
                    warn!("Finding references unknown vulnerability '{}'", reference);
                    unresolved_sbo.push(reference.clone());
                }
            }
        }
        EnrichedFinding {
            native: finding.native.clone(),
            sbo,
            unresolved_sbo,
        }
    }

    pub fn enrich_vulnerability(&self, vuln: &Vulnerability) -> EnrichedVulnerability {
        let kb = self.kb;
        let references = vuln
            .references
            .iter()
            .map(|r| ReferenceLink {
                ref_id: kb.resolve_name(RecordKind::Reference, &r.ref_id),
                extra: r.extra.clone(),
            })
            .collect();

        EnrichedVulnerability {
            url: self.vulnerability_url(&vuln.id),
            name: vuln.name.clone(),
            level: vuln
                .level
                .as_deref()
                .map(|l| kb.resolve_name(RecordKind::Level, l)),
            categories: kb.resolve_names(RecordKind::Category, &vuln.categories),
            attacks: kb.resolve_names(RecordKind::Attack, &vuln.attacks),
            cwes: kb.resolve_names(RecordKind::Cwe, &vuln.cwes),
            swcs: kb.resolve_names(RecordKind::Swc, &vuln.swcs),
            mitigations: kb.resolve_names(RecordKind::Mitigation, &vuln.mitigations),
            references,
            tools: kb.resolve_names(RecordKind::Tool, &vuln.tools),
            parent_vulnerabilities: kb
                .resolve_names(RecordKind::Vulnerability, &vuln.parent_vulnerabilities),
            enabling_vulnerabilities: kb
                .resolve_names(RecordKind::Vulnerability, &vuln.enabling_vulnerabilities),
            impacting_vulnerabilities: kb
                .resolve_names(RecordKind::Vulnerability, &vuln.impacting_vulnerabilities),
            extra: vuln.extra.clone(),
        }
    }
}
