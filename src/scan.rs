use std::path::Path;

use indicatif::ProgressBar;
use tokio_util::sync::CancellationToken;

use crate::collector::{collect_dependencies, CollectError, Collector};
use crate::config::GolangConfig;
use crate::license::Resolver;
use crate::models::Project;
use crate::validate::validate_project;

/// One scan: collect the imports of a project directory, then classify them.
pub struct Scanner {
    collectors: Vec<Box<dyn Collector>>,
    resolver: Resolver,
    golang: GolangConfig,
}

impl Scanner {
    pub fn new(collectors: Vec<Box<dyn Collector>>, resolver: Resolver, golang: GolangConfig) -> Self {
        Self {
            collectors,
            resolver,
            golang,
        }
    }

    /// Build the import registry for `root`.
    fn collect(
        &self,
        cancel: &CancellationToken,
        root: &Path,
        version: &str,
    ) -> Result<Project, CollectError> {
        let mut project = Project::new(version);
        collect_dependencies(cancel, &self.collectors, &mut project, root)?;
        Ok(project)
    }

    /// Collect, then validate. `progress` is sized once the imports are known.
    pub async fn scan(
        &self,
        cancel: &CancellationToken,
        root: &Path,
        version: &str,
        progress: Option<&ProgressBar>,
    ) -> Result<Project, CollectError> {
        let mut project = self.collect(cancel, root, version)?;
        tracing::debug!("{} imports collected from {}", project.len(), root.display());
        if let Some(pb) = progress {
            pb.set_length(project.len() as u64);
        }
        validate_project(cancel, &mut project, &self.golang, &self.resolver, progress).await;
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::default_collectors;
    use crate::license::{LicenseError, LicenseProvider, LicenseTable};
    use crate::report::Report;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedProvider {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LicenseProvider for FixedProvider {
        fn supports(&self, import_path: &str) -> bool {
            import_path.starts_with("github.com/")
        }

        async fn get_license(
            &self,
            _cancel: &CancellationToken,
            _import_path: &str,
            _version: &str,
            _branch: &str,
            _url: &str,
        ) -> Result<String, LicenseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("apache-2.0".into())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn scanner() -> (Scanner, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Resolver::new(
            vec![Box::new(FixedProvider {
                calls: calls.clone(),
            })],
            LicenseTable::default(),
        );
        (
            Scanner::new(default_collectors(), resolver, GolangConfig::default()),
            calls,
        )
    }

    #[tokio::test]
    async fn test_go_module_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("go.mod"),
            "module example.com/app\n\ngo 1.24\n\nrequire (\n\tgithub.com/spf13/cobra v1.0.0\n\tgithub.com/x/y v0.1.0 // indirect\n)\n",
        )
        .unwrap();

        let (scanner, calls) = scanner();
        let project = scanner
            .scan(&CancellationToken::new(), dir.path(), "v1.2.3", None)
            .await
            .unwrap();

        assert_eq!(project.name.as_deref(), Some("example.com/app"));
        assert_eq!(project.len(), 2);
        assert_eq!(project.validated_count(), 2);
        assert!(project.imports().all(|i| i.hash.is_some()));
        assert!(!project.import("github.com/x/y").unwrap().is_direct);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let report = Report::assemble(&project);
        assert!(report.is_compliant());
        assert_eq!(report.validated[0].license, "apache-2.0");
    }

    #[tokio::test]
    async fn test_unknown_source_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("go.mod"),
            "module example.com/app\n\nrequire example.com/unknown v1.0.0\n",
        )
        .unwrap();

        let (scanner, calls) = scanner();
        let project = scanner
            .scan(&CancellationToken::new(), dir.path(), "n/a", None)
            .await
            .unwrap();

        let report = Report::assemble(&project);
        assert!(!report.is_compliant());
        assert_eq!(report.violations[0].name, "example.com/unknown");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_go_mod_shadows_gopkg_lock() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("go.mod"),
            "module m\n\nrequire github.com/from/gomod v1.0.0\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("Gopkg.lock"),
            "[[projects]]\n  name = \"github.com/from/dep\"\n  version = \"v0.1.0\"\n",
        )
        .unwrap();

        let (scanner, _) = scanner();
        let project = scanner
            .collect(&CancellationToken::new(), dir.path(), "n/a")
            .unwrap();
        assert_eq!(project.import_names(), vec!["github.com/from/gomod".to_string()]);
    }

    #[tokio::test]
    async fn test_source_tree_fallback_with_stdlib() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("main.go"),
            "package main\n\nimport (\n\t\"fmt\"\n\t\"github.com/pkg/errors\"\n)\n",
        )
        .unwrap();

        let (scanner, calls) = scanner();
        let project = scanner
            .scan(&CancellationToken::new(), dir.path(), "n/a", None)
            .await
            .unwrap();

        assert_eq!(project.validated_count(), 2);
        assert_eq!(project.import("fmt").unwrap().version, "Standard Library");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scan_sizes_and_advances_progress() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("go.mod"),
            "module m\n\nrequire (\n\tgithub.com/a/b v1.0.0\n\texample.com/c v0.1.0\n)\n",
        )
        .unwrap();

        let pb = ProgressBar::hidden();
        let (scanner, _) = scanner();
        scanner
            .scan(&CancellationToken::new(), dir.path(), "n/a", Some(&pb))
            .await
            .unwrap();
        assert_eq!(pb.length(), Some(2));
        assert_eq!(pb.position(), 2);
    }

    #[tokio::test]
    async fn test_module_without_requirements_passes_on_own_packages() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module example.com/app\n\ngo 1.22\n").unwrap();
        std::fs::create_dir_all(dir.path().join("internal/util")).unwrap();
        std::fs::write(
            dir.path().join("main.go"),
            "package main\n\nimport (\n\t\"fmt\"\n\t\"example.com/app/internal/util\"\n)\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("internal/util/util.go"),
            "package util\n\nimport \"strings\"\n",
        )
        .unwrap();

        let (scanner, calls) = scanner();
        let project = scanner
            .scan(&CancellationToken::new(), dir.path(), "n/a", None)
            .await
            .unwrap();

        assert_eq!(project.name.as_deref(), Some("example.com/app"));
        assert_eq!(project.import_names(), vec!["fmt".to_string(), "strings".to_string()]);
        assert!(Report::assemble(&project).is_compliant());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (scanner, _) = scanner();
        let err = scanner
            .scan(&CancellationToken::new(), dir.path(), "n/a", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::NoDependenciesFound { .. }));
    }
}
