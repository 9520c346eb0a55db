use indicatif::ProgressBar;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::GolangConfig;
use crate::license::Resolver;
use crate::models::{content_hash, Classification, Project, VERSION_STANDARD_LIBRARY};

/// Classify every import of `project` against the whitelist, resolving
/// licenses for the whitelisted ones.
///
/// Standard-library imports are validated without a lookup; imports from
/// any other source are violations and never reach the network.
pub async fn validate_project(
    cancel: &CancellationToken,
    project: &mut Project,
    config: &GolangConfig,
    resolver: &Resolver,
    progress: Option<&ProgressBar>,
) {
    for name in project.import_names() {
        if let Some(pb) = progress {
            pb.set_message(name.clone());
        }

        let classification = if config.is_stdlib(&name) {
            if let Some(import) = project.import_mut(&name) {
                import.version = VERSION_STANDARD_LIBRARY.to_string();
            }
            Classification::Validated
        } else if config.is_whitelisted(&name) {
            let url = canonical_url(&name);
            let (version, branch) = match project.import(&name) {
                Some(i) => (i.version.clone(), i.branch.clone()),
                None => continue,
            };
            let license = resolver
                .get_with_context(cancel, &name, &version, &branch, url.as_deref().unwrap_or_default())
                .await;
            if let Some(import) = project.import_mut(&name) {
                import.license = license;
                import.url = url;
            }
            Classification::Validated
        } else {
            tracing::debug!("{} is not from a whitelisted source", name);
            Classification::Violation
        };

        project.classify(&name, classification);
        if let Some(import) = project.import_mut(&name) {
            import.hash = Some(content_hash(&import.name, &import.version));
        }

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }
}

/// `https://<import path>`, if that forms a valid URL.
fn canonical_url(import_path: &str) -> Option<String> {
    match Url::parse(&format!("https://{}", import_path)) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::debug!("{} is not a valid URL: {}", import_path, e);
            None
        }
    }
}
