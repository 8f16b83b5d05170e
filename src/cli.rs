use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sbo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pick SmartBugs tools by vulnerability coverage and report blind spots")]
#[command(long_about = "Runs the SmartBugs tools that cover the most vulnerabilities first, then follows the vulnerability knowledge graph from everything found to run the tools able to detect related vulnerabilities, and reports the related vulnerabilities no supported tool can detect.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the vulnerability knowledge base JSON
    #[arg(short = 'k', long, global = true, value_name = "FILE")]
    pub knowledge_base: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Orchestrate SmartBugs over the given contracts and write the enriched report
    Run {
        /// Glob patterns of the contracts to analyze
        #[arg(short, long = "files", value_name = "PATTERN", num_args = 1.., required = true)]
        files: Vec<String>,

        /// Tools to run first instead of the best covering ones
        #[arg(short, long = "tools", value_name = "TOOL", num_args = 1..)]
        tools: Vec<String>,

        /// Number of parallel processes
        #[arg(long, value_name = "N")]
        processes: Option<usize>,

        /// Timeout for each task in seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,

        /// CPU quota for docker containers
        #[arg(long, value_name = "N")]
        cpu_quota: Option<u64>,

        /// Memory quota for docker containers, like 512m or 1g
        #[arg(long, value_name = "MEM")]
        mem_limit: Option<String>,

        /// Where to write the JSON report
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show the coverage tiers the tools are tried in
    Tiers {
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show how a vulnerability relates to the rest of the knowledge base
    Inspect {
        /// Vulnerability id or name
        #[arg(value_name = "VULNERABILITY")]
        vulnerability: String,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
