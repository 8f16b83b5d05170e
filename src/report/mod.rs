//! Accumulated findings and the final report.

pub mod aggregator;
pub mod display;
pub mod enrich;

pub use aggregator::ResultAggregator;
pub use display::{format_summary, print_summary};
pub use enrich::{EnrichedFinding, EnrichedReport, EnrichedVulnerability, Enricher};

use log::info;
use std::fs;
use std::path::Path;

/// Write the report as pretty JSON, creating parent directories as needed.
pub fn write_report(report: &EnrichedReport, path: &Path) -> crate::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, report.to_json()?)?;
    info!("Report written to {}", path.display());
    Ok(())
}
