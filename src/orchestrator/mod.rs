//! # Orchestration
//!
//! Drives a run through its phases:
//!
//! ```text
//! Start -> RunSeededTools | RunBestTools -> Expand(enabled) -> Expand(impactant)
//!       -> Expand(enabling) -> Expand(impacting) -> Done
//! ```
//!
//! The seeded path runs the tools the user asked for; if there are none, or they find nothing,
//! tools are tried tier by tier from the widest coverage down until one tier finds something.
//! Without any seed finding the run ends right away. Each expansion phase then follows one
//! relationship from everything found so far, runs the tools able to detect the reached
//! vulnerabilities and reports the ones no tool can detect.
//!
//! Everything is sequential: a phase finishes, including its tool invocation, before the next
//! one starts.

pub mod phase;
pub mod progress;

pub use phase::PhaseReport;
pub use progress::{MessageKind, ProgressMessage, ProgressReporter};

use crate::config::{Config, ExecutionConfig};
use crate::execution::{found_anything, ExecutionService, ToolResults};
use crate::knowledge::{KnowledgeBase, Tool, Vulnerability};
use crate::report::ResultAggregator;
use crate::scoring::CoverageScorer;
use crate::traversal::Relation;
use log::{debug, warn};
use progress::format_list;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// States of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum State {
    Start,
    RunSeededTools,
    RunBestTools,
    Expand(Relation),
    Done,
}

impl State {
    fn first_expansion() -> Self {
        Self::Expand(Relation::EXPANSION_ORDER[0])
    }

    fn after_expansion(relation: Relation) -> Self {
        Relation::EXPANSION_ORDER
            .iter()
            .position(|r| *r == relation)
            .and_then(|pos| Relation::EXPANSION_ORDER.get(pos + 1))
            .map(|next| Self::Expand(*next))
            .unwrap_or(Self::Done)
    }
}

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct OrchestrationSettings {
    pub targets: Vec<PathBuf>,
    /// Tools explicitly requested; non-empty selects the seeded path.
    pub requested_tools: Vec<String>,
    /// Tools that may be selected; empty means every knowledge base tool.
    pub supported_tools: Vec<String>,
    pub execution: ExecutionConfig,
    pub rerun_invoked_tools: bool,
}

impl OrchestrationSettings {
    pub fn from_config(config: &Config, targets: Vec<PathBuf>, requested_tools: Vec<String>) -> Self {
        Self {
            targets,
            requested_tools,
            supported_tools: config.tools.supported.clone(),
            execution: config.execution.clone(),
            rerun_invoked_tools: config.orchestration.rerun_invoked_tools,
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct OrchestrationOutcome {
    /// States in the order they were entered, ending with `Done`.
    pub states: Vec<State>,
    pub findings: ResultAggregator,
    pub phases: Vec<PhaseReport>,
    /// Tool sets handed to the execution service, in call order.
    pub invocations: Vec<BTreeSet<String>>,
    pub transcript: Vec<ProgressMessage>,
}

impl OrchestrationOutcome {
    pub fn found_anything(&self) -> bool {
        !self.findings.is_empty()
    }

    /// Vulnerabilities reached by any expansion phase that no available tool detects.
    pub fn blind_spots(&self) -> BTreeSet<String> {
        self.phases
            .iter()
            .flat_map(|p| p.plan.blind.iter().cloned())
            .collect()
    }
}

pub struct Orchestrator<'kb, S> {
    kb: &'kb KnowledgeBase,
    service: S,
    settings: OrchestrationSettings,
    tools: Vec<&'kb Tool>,
    aggregator: ResultAggregator,
    reporter: ProgressReporter,
    invoked: BTreeSet<String>,
    invocations: Vec<BTreeSet<String>>,
    phases: Vec<PhaseReport>,
}

impl<'kb, S: ExecutionService> Orchestrator<'kb, S> {
    pub fn new(kb: &'kb KnowledgeBase, service: S, settings: OrchestrationSettings) -> Self {
        let tools = kb.available_tools(&settings.supported_tools);
        Self {
            kb,
            service,
            settings,
            tools,
            aggregator: ResultAggregator::new(),
            reporter: ProgressReporter::new(false),
            invoked: BTreeSet::new(),
            invocations: Vec::new(),
            phases: Vec::new(),
        }
    }

    /// Record progress messages without printing them.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.reporter = ProgressReporter::new(quiet);
        self
    }

    pub fn run(mut self) -> OrchestrationOutcome {
        let mut states = Vec::new();
        let mut state = State::Start;
        loop {
            states.push(state);
            debug!("Entering state {:?}", state);
            state = match state {
                State::Start => {
                    if self.settings.requested_tools.is_empty() {
                        self.reporter.info("No input tools");
                        State::RunBestTools
                    } else {
                        State::RunSeededTools
                    }
                }
                State::RunSeededTools => {
                    if self.run_seeded_tools() {
                        State::first_expansion()
                    } else {
                        State::RunBestTools
                    }
                }
                State::RunBestTools => {
                    if self.run_best_tools() {
                        State::first_expansion()
                    } else {
                        State::Done
                    }
                }
                State::Expand(relation) => {
                    self.run_expansion(relation);
                    State::after_expansion(relation)
                }
                State::Done => break,
            };
        }

        OrchestrationOutcome {
            states,
            findings: self.aggregator,
            phases: self.phases,
            invocations: self.invocations,
            transcript: self.reporter.into_transcript(),
        }
    }

    fn run_seeded_tools(&mut self) -> bool {
        let mut seeded = BTreeSet::new();
        for name in &self.settings.requested_tools {
            if let Some(tool) = self.kb.tool(name) {
                seeded.insert(tool.name.clone());
            } else {
                self.reporter
                    .warning(format!("Tool {} is not in the knowledge base, skipping it", name));
            }
        }
        if seeded.is_empty() {
            self.reporter.warning("None of the input tools can be run");
            return false;
        }

        self.reporter.success("Running input tools...");
        let results = self.invoke(&seeded);
        let found = self.announce_results(&results);
        if found {
            self.reporter.success("Finished running input tools");
        } else {
            self.reporter.warning("Nothing found by input tools");
        }
        found
    }

    fn run_best_tools(&mut self) -> bool {
        self.reporter.success("Running best tools...");
        let tiers = CoverageScorer::new(self.kb, &self.settings.supported_tools).tiers();

        for tier in tiers {
            let candidates: BTreeSet<String> = tier.tools.iter().cloned().collect();
            let (to_run, already_run) = self.select(&candidates);
            if to_run.is_empty() {
                self.reporter.info(format!(
                    "{} already ran without findings, skipping depth {}",
                    format_list(&already_run),
                    tier.rank
                ));
                continue;
            }

            self.reporter.success(format!(
                "Trying {} (depth {}, {} vulnerabilities)...",
                format_list(&to_run),
                tier.rank,
                tier.coverage
            ));
            let results = self.invoke(&to_run);
            if self.announce_results(&results) {
                self.reporter.success("Finished running best tools");
                return true;
            }
            self.reporter.warning(format!(
                "Nothing found by {} with depth {}",
                format_list(&to_run),
                tier.rank
            ));
        }

        self.reporter.success("No vulnerabilities found");
        false
    }

    /// Split `candidates` into tools to invoke and tools skipped because they already ran.
    fn select(&self, candidates: &BTreeSet<String>) -> (BTreeSet<String>, BTreeSet<String>) {
        if self.settings.rerun_invoked_tools {
            return (candidates.clone(), BTreeSet::new());
        }
        candidates
            .iter()
            .cloned()
            .partition(|tool| !self.invoked.contains(tool))
    }

    /// Run `tools` and merge what they found. A failed invocation counts as no findings.
    fn invoke(&mut self, tools: &BTreeSet<String>) -> ToolResults {
        self.invoked.extend(tools.iter().cloned());
        self.invocations.push(tools.clone());

        match self
            .service
            .invoke(tools, &self.settings.targets, &self.settings.execution)
        {
            Ok(results) => {
                let added = self.aggregator.merge(&results);
                debug!("{} new findings from {}", added, format_list(tools));
                results
            }
            Err(e) => {
                warn!("Execution of {} failed: {}", format_list(tools), e);
                self.reporter
                    .warning(format!("Running {} failed: {}", format_list(tools), e));
                ToolResults::new()
            }
        }
    }

    /// Report every tool that found something; true if any did.
    fn announce_results(&mut self, results: &ToolResults) -> bool {
        for (tool, findings) in results {
            if !findings.is_empty() {
                self.reporter.success(format!("{} found something!", tool));
            }
        }
        found_anything(results)
    }

    /// Knowledge base vulnerabilities referenced by the accumulated findings, by id.
    fn found_vulnerabilities(&self) -> BTreeMap<String, &'kb Vulnerability> {
        let kb = self.kb;
        let mut found = BTreeMap::new();
        for reference in self.aggregator.references() {
            match kb.vulnerability(&reference) {
                Some(v) => {
                    found.insert(v.id.clone(), v);
                }
                None => debug!("Finding references unknown vulnerability '{}'", reference),
            }
        }
        found
    }
}
