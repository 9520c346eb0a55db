use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Version recorded for imports found by scanning source files.
pub const VERSION_NOT_APPLICABLE: &str = "n/a";

/// Version recorded for imports that belong to the Go standard library.
pub const VERSION_STANDARD_LIBRARY: &str = "Standard Library";

/// Key of the "not available" license sentinel.
pub const LICENSE_UNKNOWN_KEY: &str = "na";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("import name cannot be empty")]
    EmptyName,
    #[error("import `{0}` already exists")]
    DuplicateName(String),
}

/// A license as known to the license table, keyed by its lowercase SPDX id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct License {
    pub key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl License {
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            alt_name: None,
            link: None,
        }
    }

    /// The "not available" sentinel used whenever a lookup fails.
    pub fn unknown() -> Self {
        Self {
            key: LICENSE_UNKNOWN_KEY.to_string(),
            name: "Not Available".to_string(),
            alt_name: Some("N/A".to_string()),
            link: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.key == LICENSE_UNKNOWN_KEY
    }
}

impl std::fmt::Display for License {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.alt_name {
            Some(alt) if self.is_unknown() => write!(f, "{}", alt),
            _ => write!(f, "{}", self.key),
        }
    }
}

/// One dependency edge of the scanned project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Import {
    pub name: String,
    pub version: String,
    pub branch: String,
    pub revision: String,
    pub is_direct: bool,
    pub license: License,
    pub url: Option<String>,
    pub hash: Option<String>,
}

impl Import {
    fn new(name: &str, version: &str, branch: &str, revision: &str, is_direct: bool) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            branch: branch.to_string(),
            revision: revision.to_string(),
            is_direct,
            license: License::unknown(),
            url: None,
            hash: None,
        }
    }
}

/// Which side of the whitelist an import landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Validated,
    Violation,
}

/// Aggregate root for one scan.
///
/// Imports are only ever added through [`Project::insert_import`]; the two
/// classification sets hold names that always key into `imports`, and an
/// import sits in at most one of them.
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub name: Option<String>,
    pub version: String,
    imports: BTreeMap<String, Import>,
    validated: BTreeSet<String>,
    violations: BTreeSet<String>,
}

impl Project {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Register a newly discovered dependency.
    pub fn insert_import(
        &mut self,
        name: &str,
        version: &str,
        branch: &str,
        revision: &str,
        is_direct: bool,
    ) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.imports.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        self.imports.insert(
            name.to_string(),
            Import::new(name, version, branch, revision, is_direct),
        );
        Ok(())
    }

    #[cfg(test)]
    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.imports.values()
    }

    pub fn import(&self, name: &str) -> Option<&Import> {
        self.imports.get(name)
    }

    pub fn import_names(&self) -> Vec<String> {
        self.imports.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    pub fn validated(&self) -> impl Iterator<Item = &Import> {
        self.validated.iter().filter_map(|n| self.imports.get(n))
    }

    pub fn violations(&self) -> impl Iterator<Item = &Import> {
        self.violations.iter().filter_map(|n| self.imports.get(n))
    }

    pub fn validated_count(&self) -> usize {
        self.validated.len()
    }

    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    #[cfg(test)]
    pub fn classification(&self, name: &str) -> Option<Classification> {
        if self.validated.contains(name) {
            Some(Classification::Validated)
        } else if self.violations.contains(name) {
            Some(Classification::Violation)
        } else {
            None
        }
    }

    /// Project hash over module name and version.
    pub fn hash(&self) -> String {
        content_hash(self.name.as_deref().unwrap_or_default(), &self.version)
    }

    /// Place `name` into exactly one classification set. Unknown names are ignored.
    pub(crate) fn classify(&mut self, name: &str, classification: Classification) {
        if !self.imports.contains_key(name) {
            return;
        }
        match classification {
            Classification::Validated => {
                self.violations.remove(name);
                self.validated.insert(name.to_string());
            }
            Classification::Violation => {
                self.validated.remove(name);
                self.violations.insert(name.to_string());
            }
        }
    }

    pub(crate) fn import_mut(&mut self, name: &str) -> Option<&mut Import> {
        self.imports.get_mut(name)
    }
}

/// Stable hex-encoded SHA-256 over `name` followed by `version`.
pub fn content_hash(name: &str, version: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(version.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_import() {
        let mut proj = Project::new("v1");
        proj.insert_import("github.com/spf13/cobra", "v1.0.0", "", "", true)
            .unwrap();

        let imp = proj.import("github.com/spf13/cobra").unwrap();
        assert_eq!(imp.version, "v1.0.0");
        assert!(imp.is_direct);
        assert!(imp.license.is_unknown());
        assert_eq!(imp.hash, None);
    }

    #[test]
    fn test_insert_empty_name() {
        let mut proj = Project::new("v1");
        assert_eq!(
            proj.insert_import("", "v1.0.0", "", "", true),
            Err(RegistryError::EmptyName)
        );
        assert!(proj.is_empty());
    }

    #[test]
    fn test_duplicate_keeps_first_entry() {
        let mut proj = Project::new("v1");
        proj.insert_import("github.com/a/b", "v1.0.0", "", "", true)
            .unwrap();

        let err = proj
            .insert_import("github.com/a/b", "v2.0.0", "main", "abc", false)
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("github.com/a/b".into()));

        assert_eq!(proj.len(), 1);
        let imp = proj.import("github.com/a/b").unwrap();
        assert_eq!(imp.version, "v1.0.0");
        assert!(imp.is_direct);
    }

    #[test]
    fn test_classify_moves_between_sets() {
        let mut proj = Project::new("v1");
        proj.insert_import("github.com/a/b", "v1", "", "", true).unwrap();

        proj.classify("github.com/a/b", Classification::Violation);
        proj.classify("github.com/a/b", Classification::Validated);

        assert_eq!(proj.validated_count(), 1);
        assert_eq!(proj.violation_count(), 0);
        assert_eq!(
            proj.classification("github.com/a/b"),
            Some(Classification::Validated)
        );

        // not registered, so nothing to classify
        proj.classify("github.com/c/d", Classification::Violation);
        assert_eq!(proj.violation_count(), 0);
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = content_hash("github.com/a/b", "v1.0.0");
        assert_eq!(a, content_hash("github.com/a/b", "v1.0.0"));
        assert_ne!(a, content_hash("github.com/a/b", "v1.0.1"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_unknown_license_display() {
        assert_eq!(License::unknown().to_string(), "N/A");
        assert_eq!(License::new("mit", "MIT License").to_string(), "mit");
    }
}
