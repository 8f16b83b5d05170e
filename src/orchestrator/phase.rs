//! The expansion phase runner, shared by all four relationship phases.

use super::progress::format_list;
use super::Orchestrator;
use crate::execution::ExecutionService;
use crate::knowledge::RecordKind;
use crate::traversal::{CoveragePlan, Relation, RelationshipTraversal};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// What one expansion phase saw and did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub relation: Relation,
    /// Found vulnerability id -> its non-empty relation set.
    pub related: BTreeMap<String, Vec<String>>,
    pub frontier: BTreeSet<String>,
    pub plan: CoveragePlan,
    /// Tools invoked by this phase.
    pub invoked: BTreeSet<String>,
    /// Capable tools not invoked because they already ran.
    pub skipped: BTreeSet<String>,
    pub tools_with_findings: BTreeSet<String>,
    /// Frontier vulnerabilities reported by the tools this phase invoked.
    pub targets_found: BTreeSet<String>,
}

impl PhaseReport {
    fn new(relation: Relation) -> Self {
        Self {
            relation,
            related: BTreeMap::new(),
            frontier: BTreeSet::new(),
            plan: CoveragePlan::default(),
            invoked: BTreeSet::new(),
            skipped: BTreeSet::new(),
            tools_with_findings: BTreeSet::new(),
            targets_found: BTreeSet::new(),
        }
    }
}

impl<'kb, S: ExecutionService> Orchestrator<'kb, S> {
    pub(super) fn run_expansion(&mut self, relation: Relation) {
        let kb = self.kb;
        let traversal = RelationshipTraversal::new(kb);
        let mut report = PhaseReport::new(relation);
        self.reporter
            .success(format!("Running tools spotting {} vulns...", relation));

        for (id, vuln) in self.found_vulnerabilities() {
            let related = traversal.related(vuln, relation);
            if related.is_empty() {
                continue;
            }
            self.reporter.info(format!(
                "The vulnerability {} {}: {}",
                vuln.name,
                relation.verb(),
                format_list(kb.resolve_names(RecordKind::Vulnerability, &related))
            ));
            report.frontier.extend(related.iter().cloned());
            report.related.insert(id, related);
        }

        if report.frontier.is_empty() {
            self.reporter.info(format!("No {} vulns to look for", relation));
        } else {
            self.search_frontier(&traversal, &mut report);
        }

        self.reporter
            .success(format!("Finished running tools spotting {} vulns", relation));
        self.phases.push(report);
    }

    fn search_frontier(&mut self, traversal: &RelationshipTraversal<'kb>, report: &mut PhaseReport) {
        let kb = self.kb;
        let relation = report.relation;
        report.plan = traversal.plan_coverage(&report.frontier, &self.tools);
        debug!(
            "{} phase: {} covered, {} blind",
            relation,
            report.plan.covered.len(),
            report.plan.blind.len()
        );

        if !report.plan.blind.is_empty() {
            self.reporter.error(format!(
                "These vulnerabilities can't be spotted by any supported tool: {}",
                format_list(report.plan.blind.iter().map(|id| kb.vulnerability_label(id)))
            ));
        }

        let (to_run, skipped) = self.select(&report.plan.tools());
        if !skipped.is_empty() {
            self.reporter.info(format!(
                "{} already ran, their findings are merged",
                format_list(&skipped)
            ));
        }
        report.skipped = skipped;
        if to_run.is_empty() {
            return;
        }

        let covered = report
            .plan
            .covered
            .iter()
            .map(|id| kb.vulnerability_label(id))
            .collect::<Vec<_>>();
        self.reporter.success(format!(
            "Trying {} tools to spot {} {} vulns",
            format_list(&to_run),
            format_list(&covered),
            relation
        ));

        let results = self.invoke(&to_run);
        for (tool, findings) in &results {
            if findings.is_empty() {
                continue;
            }
            report.tools_with_findings.insert(tool.clone());
            self.reporter.success(format!("{} found something!", tool));

            let hits: BTreeSet<&str> = findings
                .iter()
                .flat_map(|f| f.sbo.iter())
                .filter_map(|r| kb.vulnerability(r))
                .filter(|v| report.frontier.contains(&v.id))
                .map(|v| v.id.as_str())
                .collect();
            for id in hits {
                self.reporter.success(format!(
                    "{} found the {} vuln {}",
                    tool,
                    relation,
                    kb.vulnerability_label(id)
                ));
                report.targets_found.insert(id.to_string());
            }
        }
        if report.tools_with_findings.is_empty() {
            self.reporter
                .warning(format!("Nothing found by {}", format_list(&to_run)));
        } else if report.targets_found.is_empty() {
            self.reporter.warning(format!(
                "No {} vulns found by {}",
                relation,
                format_list(&to_run)
            ));
        }
        report.invoked = to_run;
    }
}

#[cfg(test)]
mod tests {
    use super::super::{MessageKind, OrchestrationSettings, Orchestrator};
    use crate::config::ExecutionConfig;
    use crate::error::ExecutionError;
    use crate::execution::{ExecutionService, Finding, ToolResults};
    use crate::knowledge::KnowledgeBase;
    use crate::traversal::Relation;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    /// t1 finds V1 on every call; t2 finds V3 on every call.
    struct Fixed;

    impl ExecutionService for Fixed {
        fn invoke(
            &mut self,
            tools: &BTreeSet<String>,
            _targets: &[PathBuf],
            _config: &ExecutionConfig,
        ) -> Result<ToolResults, ExecutionError> {
            Ok(tools
                .iter()
                .map(|t| {
                    let findings = match t.as_str() {
                        "t1" => vec![Finding::new(["V1"])],
                        "t2" => vec![Finding::new(["v3"])],
                        _ => Vec::new(),
                    };
                    (t.clone(), findings)
                })
                .collect())
        }
    }

    /// t1 finds V1; t2 reports whatever it was given.
    struct SecondReports(Vec<&'static str>);

    impl ExecutionService for SecondReports {
        fn invoke(
            &mut self,
            tools: &BTreeSet<String>,
            _targets: &[PathBuf],
            _config: &ExecutionConfig,
        ) -> Result<ToolResults, ExecutionError> {
            Ok(tools
                .iter()
                .map(|t| {
                    let findings = match t.as_str() {
                        "t1" => vec![Finding::new(["V1"])],
                        "t2" if !self.0.is_empty() => vec![Finding::new(self.0.clone())],
                        _ => Vec::new(),
                    };
                    (t.clone(), findings)
                })
                .collect())
        }
    }

    fn warned(outcome: &super::super::OrchestrationOutcome, text: &str) -> bool {
        outcome
            .transcript
            .iter()
            .any(|m| m.kind == MessageKind::Warning && m.text == text)
    }

    const GRAPH: &str = r#"{
        "tools": [{"id": "T1", "name": "t1"}, {"id": "T2", "name": "t2"}],
        "vulnerabilities": [
            {"id": "V1", "name": "v1", "tools": ["T1"]},
            {"id": "V3", "name": "v3", "tools": ["T2"], "enabling_vulnerabilities": ["V1"]},
            {"id": "V5", "name": "v5", "tools": ["T1"], "enabling_vulnerabilities": ["V1"]}
        ]
    }"#;

    fn settings(rerun: bool) -> OrchestrationSettings {
        OrchestrationSettings {
            targets: vec![PathBuf::from("Bank.sol")],
            requested_tools: vec!["t1".to_string()],
            supported_tools: Vec::new(),
            execution: ExecutionConfig::default(),
            rerun_invoked_tools: rerun,
        }
    }

    #[test]
    fn test_enabled_phase_runs_capable_tools() {
        let kb = KnowledgeBase::from_json_str(GRAPH).unwrap();
        let outcome = Orchestrator::new(&kb, Fixed, settings(false))
            .quiet(true)
            .run();

        let enabled = &outcome.phases[0];
        assert_eq!(enabled.relation, Relation::Enabled);
        assert_eq!(enabled.related["V1"], vec!["V3", "V5"]);
        assert_eq!(enabled.frontier.len(), 2);
        assert!(enabled.plan.blind.is_empty());
        // t1 already ran as a seed; its V5 coverage still counts
        assert_eq!(enabled.skipped, BTreeSet::from(["t1".to_string()]));
        assert_eq!(enabled.invoked, BTreeSet::from(["t2".to_string()]));
        assert_eq!(enabled.targets_found, BTreeSet::from(["V3".to_string()]));
        assert!(
            outcome
                .transcript
                .iter()
                .any(|m| m.kind == MessageKind::Success && m.text == "t2 found the enabled vuln v3")
        );
    }

    #[test]
    fn test_rerun_policy_reinvokes_tools() {
        let kb = KnowledgeBase::from_json_str(GRAPH).unwrap();
        let outcome = Orchestrator::new(&kb, Fixed, settings(true))
            .quiet(true)
            .run();
        let enabled = &outcome.phases[0];
        assert!(enabled.skipped.is_empty());
        assert_eq!(enabled.invoked.len(), 2);
        // Re-running never duplicates stored findings
        assert_eq!(outcome.findings.findings()["t1"].len(), 1);
    }

    #[test]
    fn test_empty_frontier_invokes_nothing() {
        let kb = KnowledgeBase::from_json_str(GRAPH).unwrap();
        let outcome = Orchestrator::new(&kb, Fixed, settings(false))
            .quiet(true)
            .run();
        // Nothing impacts or is impacted by anything in this graph
        for phase in &outcome.phases[1..] {
            if phase.relation == Relation::Enabling {
                continue;
            }
            assert!(phase.frontier.is_empty());
            assert!(phase.plan.blind.is_empty());
            assert!(phase.invoked.is_empty());
        }
    }

    #[test]
    fn test_findings_outside_frontier_are_not_targets() {
        let kb = KnowledgeBase::from_json_str(GRAPH).unwrap();
        let outcome = Orchestrator::new(&kb, SecondReports(vec!["V9"]), settings(false))
            .quiet(true)
            .run();

        let enabled = &outcome.phases[0];
        assert_eq!(enabled.invoked, BTreeSet::from(["t2".to_string()]));
        assert_eq!(enabled.tools_with_findings, BTreeSet::from(["t2".to_string()]));
        assert!(enabled.targets_found.is_empty());
        assert!(warned(&outcome, "No enabled vulns found by [t2]"));
        assert!(!warned(&outcome, "Nothing found by [t2]"));
    }

    #[test]
    fn test_silent_phase_tools_warn_nothing_found() {
        let kb = KnowledgeBase::from_json_str(GRAPH).unwrap();
        let outcome = Orchestrator::new(&kb, SecondReports(Vec::new()), settings(false))
            .quiet(true)
            .run();

        let enabled = &outcome.phases[0];
        assert!(enabled.tools_with_findings.is_empty());
        assert!(warned(&outcome, "Nothing found by [t2]"));
        assert!(!warned(&outcome, "No enabled vulns found by [t2]"));
    }
}
