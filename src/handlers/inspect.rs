use crate::{
    cli::OutputFormat,
    config::Config,
    error::OrchestratorError,
    knowledge::{KnowledgeBase, RecordKind, Tool, Vulnerability},
    report::Enricher,
    traversal::RelationshipTraversal,
};
use colored::Colorize;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Relation groups shown for a vulnerability, in display order.
const RELATIONS: [&str; 6] = [
    "parents",
    "children",
    "enabling",
    "enabled_by",
    "impacting",
    "impacted_by",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedVulnerability {
    pub id: String,
    pub name: String,
    /// Some supported tool detects it directly.
    pub detectable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub id: String,
    pub name: String,
    pub url: String,
    pub detected_by: Vec<String>,
    pub relations: BTreeMap<&'static str, Vec<RelatedVulnerability>>,
}

impl InspectReport {
    /// Related vulnerability ids no supported tool detects.
    pub fn blind_spots(&self) -> BTreeSet<&str> {
        self.relations
            .values()
            .flatten()
            .filter(|r| !r.detectable)
            .map(|r| r.id.as_str())
            .collect()
    }
}

pub fn handle_inspect(config: &Config, key: &str, format: OutputFormat) -> crate::Result<()> {
    let kb = KnowledgeBase::from_path(&config.knowledge_base.path)?;
    let report = inspect_vulnerability(&kb, config, key)?;

    let output = match format {
        OutputFormat::Table => format_inspect_table(&report),
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
    };
    println!("{}", output);
    Ok(())
}

pub fn inspect_vulnerability(
    kb: &KnowledgeBase,
    config: &Config,
    key: &str,
) -> crate::Result<InspectReport> {
    let vuln = kb
        .vulnerability(key)
        .ok_or_else(|| OrchestratorError::UnknownVulnerability(key.to_string()))?;
    let traversal = RelationshipTraversal::new(kb);
    let tools = kb.available_tools(&config.tools.supported);

    let groups: [Vec<String>; 6] = [
        traversal.parents(vuln),
        traversal.children(vuln),
        traversal.enabling(vuln),
        traversal.enabled_by(vuln),
        traversal.impacting(vuln),
        traversal.impacted_by(vuln),
    ];
    let reached: BTreeSet<String> = groups.iter().flatten().cloned().collect();
    let plan = traversal.plan_coverage(&reached, &tools);

    let relations = RELATIONS
        .into_iter()
        .zip(groups)
        .map(|(label, ids)| {
            let related = ids
                .into_iter()
                .map(|id| RelatedVulnerability {
                    name: kb.vulnerability_label(&id),
                    detectable: plan.covered.contains(&id),
                    id,
                })
                .collect();
            (label, related)
        })
        .collect();

    Ok(InspectReport {
        id: vuln.id.clone(),
        name: vuln.name.clone(),
        url: Enricher::new(kb, config.knowledge_base.catalog_url.as_str())
            .vulnerability_url(&vuln.id),
        detected_by: detecting_tools(kb, vuln, &tools),
        relations,
    })
}

fn detecting_tools(kb: &KnowledgeBase, vuln: &Vulnerability, tools: &[&Tool]) -> Vec<String> {
    let available: BTreeSet<&str> = tools.iter().map(|t| t.id.as_str()).collect();
    vuln.tools
        .iter()
        .filter(|id| available.contains(id.as_str()))
        .map(|id| kb.resolve_name(RecordKind::Tool, id))
        .collect()
}

fn format_inspect_table(report: &InspectReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n{} ({})\n", report.name.bold(), report.id));
    output.push_str(&format!("{}\n", "=".repeat(60)));
    output.push_str(&format!("Catalog: {}\n", report.url));
    if report.detected_by.is_empty() {
        output.push_str(&format!("{}\n", "Detected by: no supported tool".red()));
    } else {
        output.push_str(&format!("Detected by: {}\n", report.detected_by.join(", ")));
    }

    for label in RELATIONS {
        let Some(related) = report.relations.get(label) else {
            continue;
        };
        if related.is_empty() {
            continue;
        }
        output.push_str(&format!("\n{}:\n", label.replace('_', " ")));
        for r in related {
            if r.detectable {
                output.push_str(&format!("  - {} ({})\n", r.name, r.id));
            } else {
                output.push_str(&format!(
                    "  - {} ({}) {}\n",
                    r.name,
                    r.id,
                    "no supported tool".red()
                ));
            }
        }
    }
    output
}
