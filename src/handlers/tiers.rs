use crate::{
    cli::OutputFormat,
    config::Config,
    knowledge::KnowledgeBase,
    scoring::{CoverageScorer, CoverageTier},
};
use colored::Colorize;

pub fn handle_tiers(config: &Config, format: OutputFormat) -> crate::Result<()> {
    let kb = KnowledgeBase::from_path(&config.knowledge_base.path)?;
    let tiers = CoverageScorer::new(&kb, &config.tools.supported).tiers();

    let output = match format {
        OutputFormat::Table => format_tiers_table(&tiers),
        OutputFormat::Json => serde_json::to_string_pretty(&tiers)?,
    };
    println!("{}", output);
    Ok(())
}

fn format_tiers_table(tiers: &[CoverageTier]) -> String {
    let mut output = String::new();

    output.push_str("\nCoverage Tiers\n");
    output.push_str(&format!("{}\n", "=".repeat(60)));
    if tiers.is_empty() {
        output.push_str("No supported tool is in the knowledge base.\n");
        return output;
    }

    for tier in tiers {
        let header = format!(
            "Depth {} ({} vulnerabilities)",
            tier.rank, tier.coverage
        );
        let header = if tier.coverage == 0 {
            header.dimmed()
        } else {
            header.bold()
        };
        output.push_str(&format!("{}\n", header));
        for tool in &tier.tools {
            output.push_str(&format!("  - {}\n", tool));
        }
    }
    output
}
