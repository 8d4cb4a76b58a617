//! Scenario Catalog
//!
//! Practice scenarios are plain data: each one names the process narrative the
//! persona is allowed to talk about, who the persona is, and which professional
//! standards the debrief is graded against. Adding a scenario means editing the
//! JSON catalog, never the code.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// The catalog compiled into the binary, used when no override file is configured.
const BUILTIN_CATALOG: &str = include_str!("../scenarios/default.json");

/// Errors raised while loading a scenario catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read scenario catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed scenario catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Scenario catalog contains no scenarios")]
    Empty,
    #[error("Duplicate scenario id: '{0}'")]
    DuplicateId(String),
}

/// A single walkthrough practice scenario.
///
/// Document fields hold references to files already stored with the hosted
/// service. They are passed through untouched; the service rejects bad ones
/// when the session is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique key within the catalog (e.g., "gw_p2p").
    pub id: String,
    /// Display name shown in the selection menu.
    pub name: String,
    /// The process narrative the persona's knowledge is limited to.
    pub process_document_id: String,
    pub persona_name: String,
    pub persona_role: String,
    /// Standards the debrief evaluates the interview against, in order.
    #[serde(alias = "standards_ids", default)]
    pub standards_document_ids: Vec<String>,
}

impl Scenario {
    /// All document references for the session's knowledge store: the process
    /// document first, followed by every standards document.
    pub fn document_ids(&self) -> Vec<String> {
        std::iter::once(self.process_document_id.clone())
            .chain(self.standards_document_ids.iter().cloned())
            .collect()
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    scenarios: Vec<Scenario>,
}

/// An ordered, non-empty list of scenarios with unique ids.
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
}

impl ScenarioCatalog {
    /// Builds a catalog from already-constructed scenarios.
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self, CatalogError> {
        if scenarios.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for scenario in &scenarios {
            if !seen.insert(scenario.id.as_str()) {
                return Err(CatalogError::DuplicateId(scenario.id.clone()));
            }
        }
        Ok(Self { scenarios })
    }

    /// Parses a catalog of the form `{ "scenarios": [ ... ] }`.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.scenarios)
    }

    /// Reads and parses a catalog file.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Always false for a successfully constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Looks up a scenario by its zero-based position.
    pub fn get(&self, index: usize) -> Option<&Scenario> {
        self.scenarios.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) fn scenario(id: &str, persona: &str, role: &str, doc: &str) -> Scenario {
        Scenario {
            id: id.to_string(),
            name: format!("{} walkthrough", id),
            process_document_id: doc.to_string(),
            persona_name: persona.to_string(),
            persona_role: role.to_string(),
            standards_document_ids: vec!["file-pcaob".to_string(), "file-coso".to_string()],
        }
    }

    #[test]
    fn test_builtin_catalog_loads_in_order() {
        let catalog = ScenarioCatalog::builtin().expect("builtin catalog should parse");

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.scenarios()[0].id, "gw_p2p");
        assert_eq!(catalog.scenarios()[0].persona_name, "Sarah");
        assert_eq!(catalog.scenarios()[1].id, "ic_o2c");
        assert_eq!(catalog.scenarios()[1].persona_role, "Accounts Receivable Manager");
        assert_eq!(catalog.scenarios()[1].standards_document_ids.len(), 2);
    }

    #[test]
    fn test_standards_ids_alias_is_accepted() {
        let json = r#"{"scenarios": [{
            "id": "payroll",
            "name": "Another Client - Payroll Process",
            "process_document_id": "file-payroll",
            "persona_name": "Charles",
            "persona_role": "HR Specialist",
            "standards_ids": ["file-pcaob"]
        }]}"#;

        let catalog = ScenarioCatalog::from_json(json).unwrap();
        assert_eq!(
            catalog.find("payroll").unwrap().standards_document_ids,
            vec!["file-pcaob".to_string()]
        );
    }

    #[test]
    fn test_document_ids_put_process_document_first() {
        let s = scenario("a", "Sarah", "Clerk", "file-process");
        assert_eq!(
            s.document_ids(),
            vec!["file-process", "file-pcaob", "file-coso"]
        );
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        let err = ScenarioCatalog::from_json(r#"{"scenarios": []}"#).unwrap_err();
        assert!(matches!(err, CatalogError::Empty));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let err = ScenarioCatalog::new(vec![
            scenario("dup", "Sarah", "Clerk", "file-1"),
            scenario("dup", "David", "Manager", "file-2"),
        ])
        .unwrap_err();
        match err {
            CatalogError::DuplicateId(id) => assert_eq!(id, "dup"),
            other => panic!("Expected DuplicateId, got {:?}", other),
        }
    }

    #[test]
    fn test_document_references_are_not_validated() {
        let catalog =
            ScenarioCatalog::new(vec![scenario("odd", "Sarah", "Clerk", "not even a file id")])
                .unwrap();
        assert_eq!(catalog.get(0).unwrap().process_document_id, "not even a file id");
        assert!(catalog.get(1).is_none());
    }

    #[test]
    fn test_from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"scenarios": [{{"id": "x", "name": "X", "process_document_id": "file-x",
               "persona_name": "Pat", "persona_role": "Buyer", "standards_document_ids": []}}]}}"#
        )
        .unwrap();

        let catalog = ScenarioCatalog::from_path(file.path()).unwrap();
        assert_eq!(catalog.find("x").unwrap().persona_name, "Pat");
    }

    #[test]
    fn test_from_path_missing_file_reports_path() {
        let err = ScenarioCatalog::from_path(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
