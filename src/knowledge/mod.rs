//! # Knowledge Base
//!
//! Loads the static vulnerability/tool graph once and answers lookups by id or name.
//!
//! The graph is trusted input: referential integrity is assumed, not checked. A lookup that
//! finds nothing returns `None`, and [`KnowledgeBase::resolve_name`] falls back to the raw id
//! while logging a warning so that typos in the graph remain visible.

pub mod types;

pub use types::{
    CatalogEntry, KnowledgeGraph, Record, RecordKind, ReferenceLink, Tool, Vulnerability,
};

use crate::error::KnowledgeBaseError;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;

/// Lookup positions for one record kind.
#[derive(Debug, Default)]
struct KindIndex {
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl KindIndex {
    fn insert(&mut self, position: usize, id: &str, name: Option<&str>) {
        // First record wins on duplicate keys
        self.by_id.entry(id.to_string()).or_insert(position);
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            self.by_name.entry(name.to_string()).or_insert(position);
        }
    }

    fn find(&self, key: &str, by_name: bool) -> Option<usize> {
        self.by_id
            .get(key)
            .or_else(|| if by_name { self.by_name.get(key) } else { None })
            .copied()
    }
}

/// Read-only, indexed view over a [`KnowledgeGraph`].
#[derive(Debug)]
pub struct KnowledgeBase {
    graph: KnowledgeGraph,
    index: HashMap<RecordKind, KindIndex>,
}

impl KnowledgeBase {
    /// Build the lookup index over an already parsed graph.
    pub fn new(graph: KnowledgeGraph) -> Self {
        let mut index: HashMap<RecordKind, KindIndex> = HashMap::new();

        let vulns = index.entry(RecordKind::Vulnerability).or_default();
        for (pos, v) in graph.vulnerabilities.iter().enumerate() {
            vulns.insert(pos, &v.id, Some(&v.name));
        }

        let tools = index.entry(RecordKind::Tool).or_default();
        for (pos, t) in graph.tools.iter().enumerate() {
            tools.insert(pos, &t.id, Some(&t.name));
        }

        for kind in RecordKind::CATALOGS {
            let entries = catalog(&graph, kind);
            let kind_index = index.entry(kind).or_default();
            for (pos, e) in entries.iter().enumerate() {
                kind_index.insert(pos, &e.id, None);
            }
        }

        debug!(
            "Indexed knowledge base: {} vulnerabilities, {} tools",
            graph.vulnerabilities.len(),
            graph.tools.len()
        );

        Self { graph, index }
    }

    /// Load and index the knowledge base file. Any failure is fatal.
    pub fn from_path(path: &Path) -> Result<Self, KnowledgeBaseError> {
        let content = std::fs::read_to_string(path).map_err(|source| KnowledgeBaseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content).map_err(|source| KnowledgeBaseError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        let graph: KnowledgeGraph = serde_json::from_str(content)?;
        Ok(Self::new(graph))
    }

    /// Look up a record by id, or by name for vulnerabilities and tools.
    pub fn lookup(&self, kind: RecordKind, key: &str) -> Option<Record<'_>> {
        let position = self.index.get(&kind)?.find(key, kind.is_named())?;
        match kind {
            RecordKind::Vulnerability => self
                .graph
                .vulnerabilities
                .get(position)
                .map(Record::Vulnerability),
            RecordKind::Tool => self.graph.tools.get(position).map(Record::Tool),
            _ => catalog(&self.graph, kind)
                .get(position)
                .map(|e| Record::Entry(kind, e)),
        }
    }

    pub fn vulnerability(&self, key: &str) -> Option<&Vulnerability> {
        self.lookup(RecordKind::Vulnerability, key)
            .and_then(|r| r.as_vulnerability())
    }

    pub fn tool(&self, key: &str) -> Option<&Tool> {
        self.lookup(RecordKind::Tool, key).and_then(|r| r.as_tool())
    }

    /// Human-readable name for `id`, or the raw id when the record is unknown or unnamed.
    pub fn resolve_name(&self, kind: RecordKind, id: &str) -> String {
        match self.lookup(kind, id) {
            Some(record) if !record.name().is_empty() => record.name().to_string(),
            Some(_) => {
                warn!("{} '{}' has no name, keeping the raw id", kind, id);
                id.to_string()
            }
            None => {
                warn!("Unknown {} id '{}' in knowledge base, keeping the raw id", kind, id);
                id.to_string()
            }
        }
    }

    pub fn resolve_names(&self, kind: RecordKind, ids: &[String]) -> Vec<String> {
        ids.iter().map(|id| self.resolve_name(kind, id)).collect()
    }

    /// Display name of a vulnerability id without the unknown-id warning.
    pub fn vulnerability_label(&self, id: &str) -> String {
        self.vulnerability(id)
            .filter(|v| !v.name.is_empty())
            .map(|v| v.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn vulnerabilities(&self) -> &[Vulnerability] {
        &self.graph.vulnerabilities
    }

    pub fn tools(&self) -> &[Tool] {
        &self.graph.tools
    }

    /// Tools the orchestrator may invoke: KB tools whose name is in `supported`, in KB order.
    ///
    /// An empty `supported` list makes every KB tool available.
    pub fn available_tools(&self, supported: &[String]) -> Vec<&Tool> {
        if supported.is_empty() {
            return self.graph.tools.iter().collect();
        }
        for name in supported {
            if self.tool(name).is_none() {
                warn!("Supported tool '{}' is not in the knowledge base", name);
            }
        }
        self.graph
            .tools
            .iter()
            .filter(|t| supported.iter().any(|s| s == &t.name))
            .collect()
    }
}

fn catalog(graph: &KnowledgeGraph, kind: RecordKind) -> &[CatalogEntry] {
    match kind {
        RecordKind::Level => &graph.levels,
        RecordKind::Category => &graph.categories,
        RecordKind::Attack => &graph.attacks,
        RecordKind::Reference => &graph.references,
        RecordKind::Cwe => &graph.cwes,
        RecordKind::Swc => &graph.swcs,
        RecordKind::Mitigation => &graph.mitigations,
        RecordKind::Vulnerability | RecordKind::Tool => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPH: &str = r#"{
        "tools": [{"id": "T1", "name": "slither"}, {"id": "T2", "name": "mythril"}],
        "vulnerabilities": [
            {"id": "V1", "name": "Reentrancy", "level": "L1", "categories": ["C1"], "tools": ["T1"]},
            {"id": "V2", "name": "Cross-function reentrancy", "parent_vulnerabilities": ["V1"], "tools": ["T2"]}
        ],
        "levels": [{"id": "L1", "name": "High"}],
        "categories": [{"id": "C1", "name": "Control flow"}],
        "cwes": [{"id": "CWE-841"}]
    }"#;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::from_json_str(GRAPH).unwrap()
    }

    #[test]
    fn test_lookup_by_id_and_name() {
        let kb = kb();
        assert_eq!(kb.vulnerability("V1").map(|v| v.name.as_str()), Some("Reentrancy"));
        assert_eq!(kb.vulnerability("Reentrancy").map(|v| v.id.as_str()), Some("V1"));
        assert_eq!(kb.tool("mythril").map(|t| t.id.as_str()), Some("T2"));
        assert_eq!(
            kb.lookup(RecordKind::Level, "L1").map(|r| r.name()),
            Some("High")
        );
    }

    #[test]
    fn test_catalog_lookup_is_id_only() {
        let kb = kb();
        assert!(kb.lookup(RecordKind::Category, "Control flow").is_none());
        assert!(kb.lookup(RecordKind::Category, "C1").is_some());
    }

    #[test]
    fn test_missing_lookup_is_none() {
        let kb = kb();
        assert!(kb.lookup(RecordKind::Vulnerability, "V404").is_none());
        assert!(kb.lookup(RecordKind::Swc, "SWC-107").is_none());
    }

    #[test]
    fn test_resolve_name_passes_unknown_through() {
        let kb = kb();
        assert_eq!(kb.resolve_name(RecordKind::Category, "C1"), "Control flow");
        assert_eq!(kb.resolve_name(RecordKind::Category, "C9"), "C9");
        // Known but unnamed
        assert_eq!(kb.resolve_name(RecordKind::Cwe, "CWE-841"), "CWE-841");
    }

    #[test]
    fn test_available_tools_filters_in_kb_order() {
        let kb = kb();
        let supported = vec!["mythril".to_string(), "slither".to_string(), "oyente".to_string()];
        let names: Vec<_> = kb.available_tools(&supported).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["slither", "mythril"]);

        let only = vec!["mythril".to_string()];
        assert_eq!(kb.available_tools(&only).len(), 1);
        assert_eq!(kb.available_tools(&[]).len(), 2);
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(KnowledgeBase::from_json_str("{\"tools\": 3}").is_err());
        assert!(KnowledgeBase::from_json_str("{\"vulnerabilities\": []}").is_err());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = KnowledgeBase::from_path(Path::new("/nonexistent/out.json")).unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::Read { .. }));
    }
}
