//! Dependency collectors for Go projects, tried in priority order.
//!
//! - [`gomod`]: `go.mod` module manifest (authoritative when present).
//! - [`gopkg`]: `Gopkg.lock` produced by `dep`.
//! - [`source_tree`]: import declarations scanned from `*.go` files; last
//!   resort, carries no version information.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::models::Project;

pub mod gomod;
pub mod gopkg;
pub mod source_tree;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to read {}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },
    #[error("dependency collection cancelled")]
    Cancelled,
    #[error("no dependencies found in {}", path.display())]
    NoDependenciesFound {
        path: PathBuf,
        #[source]
        last: Option<Box<CollectError>>,
    },
}

pub trait Collector {
    /// Cheap existence check; never parses.
    fn can_handle(&self, path: &Path) -> bool;

    /// Populate `project` with the dependencies found under `path`.
    fn collect(
        &self,
        cancel: &CancellationToken,
        project: &mut Project,
        path: &Path,
    ) -> Result<(), CollectError>;

    fn name(&self) -> &'static str;
}

/// Collectors in priority order: module manifest, lock file, source tree.
pub fn default_collectors() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(gomod::GoModCollector),
        Box::new(gopkg::GopkgLockCollector),
        Box::new(source_tree::SourceTreeCollector),
    ]
}

/// Run `collectors` in order until one registers at least one import.
///
/// A failing or empty collector is logged and the next one is tried; a
/// collector's partial registrations are discarded before falling back. A
/// module name found by an empty collector is kept.
pub fn collect_dependencies(
    cancel: &CancellationToken,
    collectors: &[Box<dyn Collector>],
    project: &mut Project,
    root: &Path,
) -> Result<(), CollectError> {
    let mut last_error = None;

    for collector in collectors {
        if cancel.is_cancelled() {
            return Err(CollectError::Cancelled);
        }
        if !collector.can_handle(root) {
            tracing::debug!("{} collector cannot handle {}", collector.name(), root.display());
            continue;
        }

        let mut attempt = project.clone();
        match collector.collect(cancel, &mut attempt, root) {
            Ok(()) if !attempt.is_empty() => {
                tracing::info!(
                    "{} collector found {} dependencies",
                    collector.name(),
                    attempt.len()
                );
                *project = attempt;
                return Ok(());
            }
            Ok(()) => {
                if project.name.is_none() {
                    project.name = attempt.name;
                }
                tracing::warn!(
                    "{} collector found no dependencies, trying next collector",
                    collector.name()
                );
            }
            Err(CollectError::Cancelled) => return Err(CollectError::Cancelled),
            Err(e) => {
                tracing::warn!("{} collector failed: {}, trying next collector", collector.name(), e);
                last_error = Some(Box::new(e));
            }
        }
    }

    Err(CollectError::NoDependenciesFound {
        path: root.to_path_buf(),
        last: last_error,
    })
}

pub(crate) fn read_manifest(path: &Path) -> Result<String, CollectError> {
    std::fs::read_to_string(path).map_err(|source| CollectError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Insert an import found by a parser. Duplicates and empty names are skipped.
pub(crate) fn register(
    project: &mut Project,
    name: &str,
    version: &str,
    branch: &str,
    revision: &str,
    is_direct: bool,
) {
    if let Err(e) = project.insert_import(name, version, branch, revision, is_direct) {
        tracing::debug!("skipping import: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        name: &'static str,
        imports: &'static [&'static str],
        fail: bool,
    }

    impl Collector for Fixed {
        fn can_handle(&self, _path: &Path) -> bool {
            true
        }

        fn collect(
            &self,
            _cancel: &CancellationToken,
            project: &mut Project,
            path: &Path,
        ) -> Result<(), CollectError> {
            for name in self.imports {
                register(project, name, "v1", "", "", true);
            }
            if self.fail {
                return Err(CollectError::ManifestParse {
                    path: path.to_path_buf(),
                    message: "broken".into(),
                });
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    fn chain(collectors: Vec<Fixed>) -> Vec<Box<dyn Collector>> {
        collectors
            .into_iter()
            .map(|c| Box::new(c) as Box<dyn Collector>)
            .collect()
    }

    #[test]
    fn test_first_successful_collector_wins() {
        let collectors = chain(vec![
            Fixed { name: "first", imports: &["github.com/a/a"], fail: false },
            Fixed { name: "second", imports: &["github.com/b/b"], fail: false },
        ]);
        let mut proj = Project::new("v1");
        collect_dependencies(&CancellationToken::new(), &collectors, &mut proj, Path::new("."))
            .unwrap();

        assert_eq!(proj.import_names(), vec!["github.com/a/a".to_string()]);
    }

    #[test]
    fn test_falls_back_on_error_and_discards_partial_results() {
        let collectors = chain(vec![
            Fixed { name: "broken", imports: &["github.com/partial/x"], fail: true },
            Fixed { name: "empty", imports: &[], fail: false },
            Fixed { name: "good", imports: &["github.com/b/b"], fail: false },
        ]);
        let mut proj = Project::new("v1");
        collect_dependencies(&CancellationToken::new(), &collectors, &mut proj, Path::new("."))
            .unwrap();

        assert_eq!(proj.import_names(), vec!["github.com/b/b".to_string()]);
    }

    #[test]
    fn test_no_dependencies_found_carries_last_error() {
        let collectors = chain(vec![
            Fixed { name: "broken", imports: &[], fail: true },
            Fixed { name: "empty", imports: &[], fail: false },
        ]);
        let mut proj = Project::new("v1");
        let err = collect_dependencies(
            &CancellationToken::new(),
            &collectors,
            &mut proj,
            Path::new("."),
        )
        .unwrap_err();

        match err {
            CollectError::NoDependenciesFound { last: Some(last), .. } => {
                assert!(matches!(*last, CollectError::ManifestParse { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_before_first_collector() {
        let collectors = chain(vec![Fixed { name: "first", imports: &["a/b"], fail: false }]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut proj = Project::new("v1");
        let err = collect_dependencies(&cancel, &collectors, &mut proj, Path::new("."))
            .unwrap_err();
        assert!(matches!(err, CollectError::Cancelled));
        assert!(proj.is_empty());
    }

    #[test]
    fn test_manifest_preferred_over_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("go.mod"),
            "module example.com/app\n\nrequire github.com/spf13/cobra v1.0.0\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("Gopkg.lock"),
            "[[projects]]\n  name = \"github.com/pkg/errors\"\n  version = \"v0.8.1\"\n",
        )
        .unwrap();

        let mut proj = Project::new("v1");
        collect_dependencies(
            &CancellationToken::new(),
            &default_collectors(),
            &mut proj,
            dir.path(),
        )
        .unwrap();

        assert_eq!(proj.import_names(), vec!["github.com/spf13/cobra".to_string()]);
        assert_eq!(proj.name.as_deref(), Some("example.com/app"));
    }

    #[test]
    fn test_module_name_survives_empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module example.com/app\n\ngo 1.22\n").unwrap();
        std::fs::write(
            dir.path().join("main.go"),
            "package main\n\nimport \"github.com/pkg/errors\"\n",
        )
        .unwrap();

        let mut proj = Project::new("v1");
        collect_dependencies(
            &CancellationToken::new(),
            &default_collectors(),
            &mut proj,
            dir.path(),
        )
        .unwrap();

        assert_eq!(proj.name.as_deref(), Some("example.com/app"));
        assert_eq!(proj.import_names(), vec!["github.com/pkg/errors".to_string()]);
    }

    #[test]
    fn test_falls_back_to_source_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("main.go"),
            "package main\n\nimport \"github.com/pkg/errors\"\n\nfunc main() {}\n",
        )
        .unwrap();

        let mut proj = Project::new("v1");
        collect_dependencies(
            &CancellationToken::new(),
            &default_collectors(),
            &mut proj,
            dir.path(),
        )
        .unwrap();

        let imp = proj.import("github.com/pkg/errors").unwrap();
        assert_eq!(imp.version, crate::models::VERSION_NOT_APPLICABLE);
    }
}
