//! Execution service backed by the SmartBugs command line.
//!
//! Each invocation runs SmartBugs once for the whole tool set, with SARIF output enabled and
//! results redirected into a fresh temporary directory. The SARIF files are read back into
//! findings and the directory is removed before returning.

use super::{sarif, ExecutionService, ToolResults};
use crate::common::{execute_command, split_command};
use crate::config::{ExecutionConfig, SmartBugsConfig};
use crate::error::{ConfigError, ExecutionError};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Run id passed to SmartBugs; also the name of the second results path component.
pub const RUN_ID: &str = "sbo";

/// Keeps the tool name as the first path component below the results directory.
const RESULTS_LAYOUT: &str = "${TOOL}/${RUNID}/${FILENAME}";

#[derive(Debug, Clone)]
pub struct SmartBugsService {
    program: String,
    leading_args: Vec<String>,
    results_parent: Option<PathBuf>,
    show_progress: bool,
}

impl SmartBugsService {
    pub fn new(config: &SmartBugsConfig) -> Result<Self, ConfigError> {
        let (program, leading_args) =
            split_command(&config.command).ok_or_else(|| ConfigError::InvalidValue {
                field: "smartbugs.command",
                reason: "must not be empty".to_string(),
            })?;
        Ok(Self {
            program,
            leading_args,
            results_parent: config.results_parent.clone(),
            show_progress: false,
        })
    }

    /// Show a spinner while SmartBugs runs.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Full argument list for one SmartBugs run.
    pub fn build_args(
        &self,
        tools: &BTreeSet<String>,
        targets: &[PathBuf],
        config: &ExecutionConfig,
        results_dir: &Path,
    ) -> Vec<String> {
        let mut args = self.leading_args.clone();

        args.push("-t".to_string());
        args.extend(tools.iter().cloned());
        args.push("-f".to_string());
        args.extend(targets.iter().map(|t| t.display().to_string()));

        args.push("--processes".to_string());
        args.push(config.processes.to_string());
        if let Some(timeout) = config.timeout {
            args.push("--timeout".to_string());
            args.push(timeout.to_string());
        }
        if let Some(quota) = config.cpu_quota {
            args.push("--cpu-quota".to_string());
            args.push(quota.to_string());
        }
        if let Some(mem) = &config.mem_limit {
            args.push("--mem-limit".to_string());
            args.push(mem.clone());
        }

        args.push("--sarif".to_string());
        args.push("--runid".to_string());
        args.push(RUN_ID.to_string());
        args.push("--results".to_string());
        args.push(format!("{}/{}", results_dir.display(), RESULTS_LAYOUT));
        args
    }

    fn results_dir(&self) -> std::io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("sbo-results-");
        match &self.results_parent {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
    }

    fn start_spinner(&self, tools: &BTreeSet<String>) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg} [{elapsed}]") {
            spinner.set_style(style);
        }
        spinner.set_message(format!(
            "Running {}...",
            tools.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
        spinner.enable_steady_tick(Duration::from_millis(80));
        Some(spinner)
    }
}

impl ExecutionService for SmartBugsService {
    fn invoke(
        &mut self,
        tools: &BTreeSet<String>,
        targets: &[PathBuf],
        config: &ExecutionConfig,
    ) -> Result<ToolResults, ExecutionError> {
        if tools.is_empty() || targets.is_empty() {
            return Ok(ToolResults::new());
        }

        let results_dir = self.results_dir()?;
        let args = self.build_args(tools, targets, config, results_dir.path());
        info!("Running {} {}", self.program, args.join(" "));

        let spinner = self.start_spinner(tools);
        let output = execute_command(&self.program, &args);
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        let output = output.map_err(|source| ExecutionError::Spawn {
            command: self.program.clone(),
            source,
        })?;

        debug!("SmartBugs stdout:\n{}", String::from_utf8_lossy(&output.stdout));
        if !output.status.success() {
            // Whatever was written before the failure is still collected
            warn!(
                "{}",
                ExecutionError::Failed {
                    command: self.program.clone(),
                    status: output.status.code().unwrap_or(-1),
                }
            );
            debug!("SmartBugs stderr:\n{}", String::from_utf8_lossy(&output.stderr));
        }

        let results = collect_results(results_dir.path())?;
        if let Err(e) = results_dir.close() {
            warn!("Failed to remove SmartBugs results directory: {}", e);
        }
        Ok(results)
    }
}

/// Read every SARIF file below `results_dir`, keyed by the tool directory it sits in.
pub fn collect_results(results_dir: &Path) -> Result<ToolResults, ExecutionError> {
    let pattern = format!(
        "{}/**/*.sarif",
        glob::Pattern::escape(&results_dir.to_string_lossy())
    );
    let entries = glob::glob(&pattern).map_err(|e| ExecutionError::ResultParse {
        file: results_dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut results = ToolResults::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable result path: {}", e);
                continue;
            }
        };
        let Some(tool) = tool_name(results_dir, &path) else {
            warn!("Cannot tell which tool produced {}", path.display());
            continue;
        };

        // A broken file only costs its own tool's results
        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| sarif::parse_log(&content).map_err(|e| e.to_string()));
        let findings = match parsed {
            Ok(log) => sarif::findings(log),
            Err(reason) => {
                warn!(
                    "{}",
                    ExecutionError::ResultParse {
                        file: path.clone(),
                        reason,
                    }
                );
                Vec::new()
            }
        };
        debug!("{}: {} results in {}", tool, findings.len(), path.display());
        results.entry(tool).or_default().extend(findings);
    }
    Ok(results)
}

fn tool_name(results_dir: &Path, file: &Path) -> Option<String> {
    file.strip_prefix(results_dir)
        .ok()?
        .components()
        .next()?
        .as_os_str()
        .to_str()
        .map(str::to_string)
}
