use std::path::Path;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{read_manifest, register, CollectError, Collector};
use crate::models::Project;

const LOCK_FILE: &str = "Gopkg.lock";

#[derive(Debug, Deserialize)]
struct GopkgLock {
    #[serde(default)]
    projects: Vec<GopkgLockProject>,
}

#[derive(Debug, Deserialize)]
struct GopkgLockProject {
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    branch: String,
    #[serde(default)]
    revision: String,
}

/// Collector for projects managed by `dep`.
///
/// The lock file does not tell direct and transitive dependencies apart, so
/// every entry is registered as direct.
pub struct GopkgLockCollector;

impl Collector for GopkgLockCollector {
    fn can_handle(&self, path: &Path) -> bool {
        path.join(LOCK_FILE).is_file()
    }

    fn collect(
        &self,
        cancel: &CancellationToken,
        project: &mut Project,
        path: &Path,
    ) -> Result<(), CollectError> {
        if cancel.is_cancelled() {
            return Err(CollectError::Cancelled);
        }
        let lock_path = path.join(LOCK_FILE);
        let content = read_manifest(&lock_path)?;
        let lock: GopkgLock =
            toml::from_str(&content).map_err(|e| CollectError::ManifestParse {
                path: lock_path,
                message: e.to_string(),
            })?;

        for p in &lock.projects {
            register(project, &p.name, &p.version, &p.branch, &p.revision, true);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        LOCK_FILE
    }
}
