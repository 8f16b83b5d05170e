//! # SmartBugs Orchestrator
//!
//! Decides which SmartBugs analysis tools to run over a set of smart contracts, and in which
//! order, using a knowledge graph of vulnerabilities, tools and relationships between
//! vulnerabilities.
//!
//! ## Features
//!
//! - **Coverage tiers**: tools are ranked by how many vulnerabilities they are credited with
//!   and tried tier by tier until one finds something
//! - **Graph expansion**: from every vulnerability found, the enabled, impacted, enabling and
//!   impacting vulnerabilities are looked for with the tools able to detect them
//! - **Blind spots**: related vulnerabilities no supported tool detects are reported
//! - **Enriched report**: findings carry the full knowledge base record of every vulnerability
//!
//! ## Example
//!
//! ```rust,no_run
//! use smartbugs_orchestrator::config::{Config, SmartBugsConfig};
//! use smartbugs_orchestrator::execution::SmartBugsService;
//! use smartbugs_orchestrator::knowledge::KnowledgeBase;
//! use smartbugs_orchestrator::orchestrator::{OrchestrationSettings, Orchestrator};
//! use std::path::{Path, PathBuf};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let kb = KnowledgeBase::from_path(Path::new("out.json"))?;
//! let service = SmartBugsService::new(&SmartBugsConfig::default())?;
//! let settings =
//!     OrchestrationSettings::from_config(&config, vec![PathBuf::from("Bank.sol")], Vec::new());
//! let outcome = Orchestrator::new(&kb, service, settings).run();
//! println!("{} findings", outcome.findings.finding_count());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod common;
pub mod config;
pub mod error;
pub mod execution;
pub mod handlers;
pub mod knowledge;
pub mod orchestrator;
pub mod report;
pub mod scoring;
pub mod traversal;

// Re-export commonly used types and functions
pub use error::{OrchestratorError, Result};
pub use knowledge::KnowledgeBase;
pub use orchestrator::{OrchestrationOutcome, OrchestrationSettings, Orchestrator};
use cli::{Cli, Commands};

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run_command(cli: Cli) -> Result<()> {
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(path) = cli.knowledge_base {
        config.knowledge_base.path = path;
    }

    match cli.command {
        Commands::Run {
            files,
            tools,
            processes,
            timeout,
            cpu_quota,
            mem_limit,
            output,
        } => {
            // Command line values win over the config file
            if let Some(processes) = processes {
                config.execution.processes = processes;
            }
            if timeout.is_some() {
                config.execution.timeout = timeout;
            }
            if cpu_quota.is_some() {
                config.execution.cpu_quota = cpu_quota;
            }
            if mem_limit.is_some() {
                config.execution.mem_limit = mem_limit;
            }
            if let Some(output) = output {
                config.output.report_path = output;
            }
            handlers::handle_run(&config, &files, tools, cli.quiet)
        }
        Commands::Tiers { format } => handlers::handle_tiers(&config, format),
        Commands::Inspect {
            vulnerability,
            format,
        } => handlers::handle_inspect(&config, &vulnerability, format),
    }
}
