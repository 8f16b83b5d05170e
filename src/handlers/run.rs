use crate::{
    config::Config,
    error::{ConfigError, OrchestratorError},
    execution::SmartBugsService,
    knowledge::KnowledgeBase,
    orchestrator::{OrchestrationSettings, Orchestrator},
    report::{print_summary, write_report, Enricher},
};
use colored::Colorize;
use log::{info, warn};
use std::path::PathBuf;

pub fn handle_run(
    config: &Config,
    patterns: &[String],
    tools: Vec<String>,
    quiet: bool,
) -> crate::Result<()> {
    config.execution.validate()?;
    let targets = expand_patterns(patterns)?;
    info!("{} contracts to analyze", targets.len());

    let kb = KnowledgeBase::from_path(&config.knowledge_base.path)?;
    let service = SmartBugsService::new(&config.smartbugs)?.with_progress(!quiet);

    if !quiet {
        println!("{}", "Welcome to SmartBugs Orchestrator!".bold());
    }

    let settings = OrchestrationSettings::from_config(config, targets, tools);
    let outcome = Orchestrator::new(&kb, service, settings).quiet(quiet).run();

    // The report is written even when nothing was found
    let report = Enricher::new(&kb, config.knowledge_base.catalog_url.as_str())
        .enrich(&outcome.findings);
    write_report(&report, &config.output.report_path)?;

    if !quiet {
        print_summary(&outcome, &kb);
        println!("Report saved to: {}", config.output.report_path.display());
    }
    Ok(())
}

/// Expand glob patterns into the files they match, in pattern order without duplicates.
pub fn expand_patterns(patterns: &[String]) -> crate::Result<Vec<PathBuf>> {
    let mut targets: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let entries = glob::glob(pattern).map_err(|e| ConfigError::InvalidValue {
            field: "files",
            reason: format!("'{}': {}", pattern, e),
        })?;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => {
                    if !targets.contains(&path) {
                        targets.push(path);
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable path: {}", e),
            }
        }
    }

    if targets.is_empty() {
        return Err(OrchestratorError::NoTargets(patterns.to_vec()));
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn pattern(dir: &TempDir, suffix: &str) -> String {
        format!("{}/{}", dir.path().display(), suffix)
    }

    #[test]
    fn test_expand_patterns_recursive_and_deduplicated() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("A.sol"), "contract A {}").unwrap();
        fs::write(dir.path().join("nested").join("B.sol"), "contract B {}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let targets =
            expand_patterns(&[pattern(&dir, "**/*.sol"), pattern(&dir, "A.sol")]).unwrap();
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|t| t.extension().unwrap() == "sol"));
    }

    #[test]
    fn test_no_match_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = expand_patterns(&[pattern(&dir, "*.sol")]).unwrap_err();
        assert!(matches!(err, OrchestratorError::NoTargets(_)));
    }

    #[test]
    fn test_invalid_pattern_is_a_config_error() {
        let err = expand_patterns(&["[".to_string()]).unwrap_err();
        assert!(matches!(err, OrchestratorError::Config(_)));
    }

    #[test]
    fn test_invalid_memory_limit_stops_before_running() {
        let mut config = Config::default();
        config.execution.mem_limit = Some("lots".to_string());
        let err = handle_run(&config, &["*.sol".to_string()], Vec::new(), true).unwrap_err();
        assert!(matches!(err, OrchestratorError::Config(_)));
    }
}
