//! Records of the vulnerability knowledge graph.
//!
//! Every record is keyed by a stable `id`. Relationships are stored as lists of ids and are
//! resolved lazily through [`KnowledgeBase`](super::KnowledgeBase). Fields the orchestrator
//! does not interpret (descriptions, links, ...) are kept in `extra` so they survive into the
//! final report unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The kinds of records held by the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    Vulnerability,
    Tool,
    Level,
    Category,
    Attack,
    Reference,
    Cwe,
    Swc,
    Mitigation,
}

impl RecordKind {
    /// Catalog kinds are the plain `{id, name}` tables.
    pub const CATALOGS: [RecordKind; 7] = [
        Self::Level,
        Self::Category,
        Self::Attack,
        Self::Reference,
        Self::Cwe,
        Self::Swc,
        Self::Mitigation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vulnerability => "vulnerability",
            Self::Tool => "tool",
            Self::Level => "level",
            Self::Category => "category",
            Self::Attack => "attack",
            Self::Reference => "reference",
            Self::Cwe => "cwe",
            Self::Swc => "swc",
            Self::Mitigation => "mitigation",
        }
    }

    /// Whether records of this kind can also be looked up by name.
    pub fn is_named(&self) -> bool {
        matches!(self, Self::Vulnerability | Self::Tool)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A vulnerability class and its relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Severity level id.
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub attacks: Vec<String>,
    #[serde(default)]
    pub cwes: Vec<String>,
    #[serde(default)]
    pub swcs: Vec<String>,
    #[serde(default)]
    pub mitigations: Vec<String>,
    #[serde(default)]
    pub references: Vec<ReferenceLink>,
    /// Tools that directly detect this vulnerability.
    #[serde(default)]
    pub tools: Vec<String>,
    /// More general vulnerabilities this one specializes.
    #[serde(default)]
    pub parent_vulnerabilities: Vec<String>,
    /// Vulnerabilities whose presence enables this one.
    #[serde(default)]
    pub enabling_vulnerabilities: Vec<String>,
    /// Vulnerabilities that impact this one.
    #[serde(default)]
    pub impacting_vulnerabilities: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Vulnerability {
    pub fn is_detected_by(&self, tool_id: &str) -> bool {
        self.tools.iter().any(|t| t == tool_id)
    }

    pub fn has_parent(&self, vulnerability_id: &str) -> bool {
        self.parent_vulnerabilities.iter().any(|p| p == vulnerability_id)
    }

    pub fn is_enabled_by(&self, vulnerability_id: &str) -> bool {
        self.enabling_vulnerabilities.iter().any(|e| e == vulnerability_id)
    }

    pub fn is_impacted_by(&self, vulnerability_id: &str) -> bool {
        self.impacting_vulnerabilities.iter().any(|i| i == vulnerability_id)
    }
}

/// A citation attached to a vulnerability; `ref_id` points into the references table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLink {
    pub ref_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An analysis tool known to the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A row of one of the plain catalogs (levels, categories, CWEs, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The knowledge base document as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub tools: Vec<Tool>,
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default)]
    pub levels: Vec<CatalogEntry>,
    #[serde(default)]
    pub categories: Vec<CatalogEntry>,
    #[serde(default)]
    pub attacks: Vec<CatalogEntry>,
    #[serde(default)]
    pub references: Vec<CatalogEntry>,
    #[serde(default)]
    pub cwes: Vec<CatalogEntry>,
    #[serde(default)]
    pub swcs: Vec<CatalogEntry>,
    #[serde(default)]
    pub mitigations: Vec<CatalogEntry>,
}

/// A borrowed view of any knowledge base record.
#[derive(Debug, Clone, Copy)]
pub enum Record<'kb> {
    Vulnerability(&'kb Vulnerability),
    Tool(&'kb Tool),
    Entry(RecordKind, &'kb CatalogEntry),
}

impl<'kb> Record<'kb> {
    pub fn id(&self) -> &'kb str {
        match self {
            Self::Vulnerability(v) => &v.id,
            Self::Tool(t) => &t.id,
            Self::Entry(_, e) => &e.id,
        }
    }

    pub fn name(&self) -> &'kb str {
        match self {
            Self::Vulnerability(v) => &v.name,
            Self::Tool(t) => &t.name,
            Self::Entry(_, e) => &e.name,
        }
    }

    pub fn as_vulnerability(&self) -> Option<&'kb Vulnerability> {
        match self {
            Self::Vulnerability(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_tool(&self) -> Option<&'kb Tool> {
        match self {
            Self::Tool(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vulnerability_missing_lists_default_to_empty() {
        let v: Vulnerability = serde_json::from_str(r#"{"id": "V1", "name": "Reentrancy"}"#).unwrap();
        assert!(v.tools.is_empty());
        assert!(v.parent_vulnerabilities.is_empty());
        assert!(v.level.is_none());
        assert!(v.extra.is_empty());
    }

    #[test]
    fn test_vulnerability_keeps_unknown_fields() {
        let v: Vulnerability = serde_json::from_str(
            r#"{"id": "V1", "name": "Reentrancy", "description": "External call before state update"}"#,
        )
        .unwrap();
        assert_eq!(
            v.extra.get("description").and_then(|d| d.as_str()),
            Some("External call before state update")
        );
    }

    #[test]
    fn test_relationship_predicates() {
        let v: Vulnerability = serde_json::from_str(
            r#"{"id": "V3", "name": "c", "tools": ["T1"], "parent_vulnerabilities": ["V1"],
                "enabling_vulnerabilities": ["V2"], "impacting_vulnerabilities": ["V4"]}"#,
        )
        .unwrap();
        assert!(v.is_detected_by("T1"));
        assert!(!v.is_detected_by("T2"));
        assert!(v.has_parent("V1"));
        assert!(v.is_enabled_by("V2"));
        assert!(v.is_impacted_by("V4"));
    }
}
