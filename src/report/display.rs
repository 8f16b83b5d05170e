use crate::knowledge::KnowledgeBase;
use crate::orchestrator::OrchestrationOutcome;
use colored::Colorize;

/// Plain-text run summary: findings per tool, vulnerabilities found and blind spots.
pub fn format_summary(outcome: &OrchestrationOutcome, kb: &KnowledgeBase) -> String {
    let mut output = String::new();

    output.push_str("\nSmartBugs Orchestrator Summary\n");
    output.push_str(&format!("{}\n", "=".repeat(60)));
    output.push_str(&format!(
        "Tool invocations: {}\n",
        outcome.invocations.len()
    ));

    let findings = outcome.findings.findings();
    if findings.is_empty() {
        output.push_str("\nNo tool reported anything.\n");
    } else {
        output.push_str("\nFindings per tool:\n");
        let width = findings.keys().map(String::len).max().unwrap_or(0);
        for (tool, list) in findings {
            output.push_str(&format!("  {:<width$}  {}\n", tool, list.len(), width = width));
        }
    }

    let found = outcome.findings.references();
    if found.is_empty() {
        output.push_str("\nNo vulnerabilities found.\n");
    } else {
        output.push_str(&format!("\nVulnerabilities found ({}):\n", found.len()));
        for reference in &found {
            output.push_str(&format!("  - {}\n", kb.vulnerability_label(reference)));
        }
    }

    let blind = outcome.blind_spots();
    if !blind.is_empty() {
        output.push_str(&format!(
            "\nBlind spots, no supported tool detects ({}):\n",
            blind.len()
        ));
        for id in &blind {
            output.push_str(&format!("  - {}\n", kb.vulnerability_label(id)));
        }
    }

    output
}

pub fn print_summary(outcome: &OrchestrationOutcome, kb: &KnowledgeBase) {
    let summary = format_summary(outcome, kb);
    if outcome.blind_spots().is_empty() {
        println!("{}", summary);
    } else {
        // Blind spots are advisory errors
        println!("{}", summary.yellow());
    }
}
