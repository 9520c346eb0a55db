//! Report assembly and rendering.
//!
//! [`Report::assemble`] snapshots a validated [`Project`]; renderers only
//! format it.
//!
//! - [`terminal`]: colored tables with a summary box; `--quiet` prints one line.
//! - JSON output is the serialized [`Report`].

pub mod terminal;

use serde::Serialize;

use crate::models::Project;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub project: Option<String>,
    pub version: String,
    pub hash: String,
    pub validated: Vec<ValidatedEntry>,
    pub violations: Vec<ViolationEntry>,
    pub summary: Summary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidatedEntry {
    pub name: String,
    pub version: String,
    pub license: String,
    pub license_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub direct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViolationEntry {
    pub name: String,
    pub version: String,
    pub direct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub validated: usize,
    pub violations: usize,
}

impl Report {
    pub fn assemble(project: &Project) -> Self {
        let validated: Vec<ValidatedEntry> = project
            .validated()
            .map(|i| ValidatedEntry {
                name: i.name.clone(),
                version: i.version.clone(),
                license: i.license.to_string(),
                license_name: i.license.name.clone(),
                url: i.url.clone(),
                direct: i.is_direct,
                hash: i.hash.clone(),
            })
            .collect();
        let violations: Vec<ViolationEntry> = project
            .violations()
            .map(|i| ViolationEntry {
                name: i.name.clone(),
                version: i.version.clone(),
                direct: i.is_direct,
                hash: i.hash.clone(),
            })
            .collect();

        Self {
            project: project.name.clone(),
            version: project.version.clone(),
            hash: project.hash(),
            summary: Summary {
                total: project.len(),
                validated: project.validated_count(),
                violations: project.violation_count(),
            },
            validated,
            violations,
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// "there was 1 dependency" / "there were 3 dependencies"
pub fn found_phrase(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("there was {} {}", count, singular)
    } else {
        format!("there were {} {}", count, plural)
    }
}
