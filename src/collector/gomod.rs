use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio_util::sync::CancellationToken;

use super::{read_manifest, register, CollectError, Collector};
use crate::models::Project;

const MANIFEST: &str = "go.mod";

static MODULE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^module\s+"?([^\s"]+)"?\s*(?://.*)?$"#).expect("valid module regex")
});

/// Any directive that opens a parenthesised block, e.g. `require (` or `replace (`.
static BLOCK_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z]+)\s*\(\s*(?://.*)?$").expect("valid block regex")
});

static REQUIRE_INLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^require\s+(.+)$").expect("valid require regex")
});

/// `<path> <version> [// comment]`
static REQUIREMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^"?([^\s"]+)"?\s+([^\s/]\S*)\s*(?://\s*(.*?))?\s*$"#)
        .expect("valid requirement regex")
});

/// Collector for Go module projects.
pub struct GoModCollector;

impl Collector for GoModCollector {
    fn can_handle(&self, path: &Path) -> bool {
        path.join(MANIFEST).is_file()
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
        let content = read_manifest(&path.join(MANIFEST))?;
        parse_go_mod(project, &content);
        Ok(())
    }

    fn name(&self) -> &'static str {
        MANIFEST
    }
}

/// A single dependency line out of a `require` directive.
#[derive(Debug, PartialEq)]
struct Requirement<'a> {
    path: &'a str,
    version: &'a str,
    is_direct: bool,
}

/// Scan `go.mod` content line by line, registering every requirement.
///
/// The module line sets the project name. A `require (` block ends at the
/// first line starting with an unindented `)`, or at any line that itself
/// opens a block; that line is then handled as a top-level directive.
pub fn parse_go_mod(project: &mut Project, content: &str) {
    let mut in_require_block = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if in_require_block {
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }
            if line.starts_with(')') {
                in_require_block = false;
                continue;
            }
            if !BLOCK_START.is_match(trimmed) {
                match parse_requirement(trimmed) {
                    Some(req) => register(project, req.path, req.version, "", "", req.is_direct),
                    None => tracing::debug!("ignoring go.mod line: {}", trimmed),
                }
                continue;
            }
            tracing::debug!("unterminated require block before: {}", trimmed);
            in_require_block = false;
        }

        if let Some(caps) = MODULE_LINE.captures(trimmed) {
            project.name = Some(caps[1].to_string());
        } else if let Some(caps) = BLOCK_START.captures(trimmed) {
            in_require_block = &caps[1] == "require";
        } else if let Some(caps) = REQUIRE_INLINE.captures(trimmed) {
            let rest = caps[1].trim();
            // `require (path version)` written on one line
            let rest = match rest.strip_prefix('(') {
                Some(inner) => inner.trim_end().trim_end_matches(')'),
                None => rest,
            };
            if let Some(req) = parse_requirement(rest.trim()) {
                register(project, req.path, req.version, "", "", req.is_direct);
            }
        }
    }
}

fn parse_requirement(text: &str) -> Option<Requirement<'_>> {
    let caps = REQUIREMENT.captures(text)?;
    let comment = caps.get(3).map(|m| m.as_str());
    Some(Requirement {
        path: caps.get(1)?.as_str(),
        version: caps.get(2)?.as_str(),
        is_direct: !is_indirect_marker(comment),
    })
}

/// Only an exact `indirect` comment (optionally followed by `;`) marks a
/// transitive dependency; anything else counts as direct.
fn is_indirect_marker(comment: Option<&str>) -> bool {
    match comment.map(str::trim) {
        Some("indirect") => true,
        Some(c) => c.starts_with("indirect;"),
        None => false,
    }
}
