//! Reading SARIF logs written by SmartBugs.
//!
//! SmartBugs tags each SARIF result with an `sbo` array naming the knowledge base
//! vulnerabilities it corresponds to. Entries are plain strings (id or name) or objects
//! carrying an `id` or `name`. The rest of the result is kept as the tool produced it.
//!
//! SARIF Specification: https://sarifweb.azurewebsites.net/

use super::Finding;
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

/// SARIF 2.1.0 log, reduced to what the orchestrator reads.
#[derive(Debug, Deserialize)]
pub struct SarifLog {
    #[serde(default)]
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Deserialize)]
pub struct SarifRun {
    #[serde(default)]
    pub results: Vec<Map<String, Value>>,
}

pub fn parse_log(content: &str) -> Result<SarifLog, serde_json::Error> {
    serde_json::from_str(content)
}

/// All results of all runs of a log as findings.
pub fn findings(log: SarifLog) -> Vec<Finding> {
    log.runs
        .into_iter()
        .flat_map(|run| run.results)
        .map(finding_from_result)
        .collect()
}

/// Split a SARIF result into its vulnerability references, target and native fields.
pub fn finding_from_result(mut result: Map<String, Value>) -> Finding {
    let sbo = match result.remove("sbo") {
        Some(Value::Array(entries)) => entries.iter().filter_map(vulnerability_ref).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            debug!("Ignoring malformed sbo field: {}", other);
            Vec::new()
        }
    };
    let target = result
        .get("locations")
        .and_then(|l| l.get(0))
        .and_then(|l| l.pointer("/physicalLocation/artifactLocation/uri"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Finding {
        sbo,
        target,
        native: result,
    }
}

fn vulnerability_ref(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(obj) => obj
            .get("id")
            .or_else(|| obj.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        other => {
            debug!("Ignoring malformed sbo entry: {}", other);
            None
        }
    }
}
