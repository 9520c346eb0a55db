use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use walkdir::{DirEntry, WalkDir};

use super::{register, CollectError, Collector};
use crate::models::{Project, VERSION_NOT_APPLICABLE};

/// One import spec: optional name (`foo`, `.`, `_`) then an interpreted or raw string.
static IMPORT_SPEC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:[\p{L}_][\p{L}\p{N}_]*|\.)?\s*(?:"([^"]+)"|`([^`]+)`)\s*$"#)
        .expect("valid import spec regex")
});

/// Fallback collector that reads the import declarations of every `.go` file.
///
/// Versions cannot be recovered this way; every import is recorded as
/// [`VERSION_NOT_APPLICABLE`] and direct.
pub struct SourceTreeCollector;

impl Collector for SourceTreeCollector {
    fn can_handle(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn collect(
        &self,
        cancel: &CancellationToken,
        project: &mut Project,
        path: &Path,
    ) -> Result<(), CollectError> {
        let mut imports = BTreeSet::new();

        for file in go_files(path) {
            if cancel.is_cancelled() {
                return Err(CollectError::Cancelled);
            }
            let file = file.map_err(|e| CollectError::ManifestRead {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| path.to_path_buf()),
                source: e.into(),
            })?;
            let src = std::fs::read_to_string(&file).map_err(|source| {
                CollectError::ManifestRead {
                    path: file.clone(),
                    source,
                }
            })?;
            imports.extend(scan_imports(&src));
        }

        tracing::debug!("found {} distinct imports under {}", imports.len(), path.display());
        let module = project.name.clone();
        for name in &imports {
            if module.as_deref().is_some_and(|m| is_own_package(m, name)) {
                tracing::debug!("skipping {}: package of the scanned module", name);
                continue;
            }
            register(project, name, VERSION_NOT_APPLICABLE, "", "", true);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "source tree"
    }
}

/// Lazily walk `root` yielding `.go` files, skipping `vendor`, `testdata`,
/// and directories the go tool ignores (leading `.` or `_`).
pub fn go_files(root: &Path) -> impl Iterator<Item = Result<PathBuf, walkdir::Error>> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored_dir(e))
        .filter_map(|entry| match entry {
            Ok(e) if e.file_type().is_file() && is_go_file(e.path()) => {
                Some(Ok(e.into_path()))
            }
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
}

/// `import` is `module` itself or one of its subpackages.
fn is_own_package(module: &str, import: &str) -> bool {
    import
        .strip_prefix(module)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name == "vendor" || name == "testdata" || name.starts_with('.') || name.starts_with('_')
}

fn is_go_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "go")
}

/// Extract the import paths declared in one Go source file.
///
/// Only the file header is read: scanning stops at the first top-level
/// declaration that is neither the package clause nor an import.
pub fn scan_imports(src: &str) -> BTreeSet<String> {
    let code = strip_comments(src);
    let mut imports = BTreeSet::new();
    let mut in_group = false;

    for line in code.lines() {
        let mut rest = line.trim();
        if rest.is_empty() {
            continue;
        }

        if !in_group {
            if keyword_tail(rest, "package").is_some() {
                continue;
            }
            let Some(after) = keyword_tail(rest, "import") else {
                break;
            };
            match after.strip_prefix('(') {
                Some(group) => {
                    in_group = true;
                    rest = group.trim();
                }
                None => {
                    collect_specs(after, &mut imports);
                    continue;
                }
            }
        }

        match rest.find(')') {
            Some(end) => {
                collect_specs(&rest[..end], &mut imports);
                in_group = false;
            }
            None => collect_specs(rest, &mut imports),
        }
    }

    imports
}

/// Text following `keyword` when `line` starts with it as a whole word.
fn keyword_tail<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let tail = line.strip_prefix(keyword)?;
    match tail.chars().next() {
        None => Some(tail),
        Some(c) if c.is_whitespace() || c == '(' || c == '"' || c == '`' => Some(tail.trim_start()),
        Some(_) => None,
    }
}

fn collect_specs(text: &str, imports: &mut BTreeSet<String>) {
    for spec in text.split(';') {
        let spec = spec.trim();
        if spec.is_empty() {
            continue;
        }
        if let Some(caps) = IMPORT_SPEC.captures(spec) {
            if let Some(path) = caps.get(1).or_else(|| caps.get(2)) {
                imports.insert(path.as_str().to_string());
            }
        }
    }
}

/// Replace `//` and `/* */` comments with whitespace, keeping line breaks
/// and leaving string and rune literals untouched.
fn strip_comments(src: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Str,
        RawStr,
        Rune,
    }

    let mut out = String::with_capacity(src.len());
    let mut state = State::Code;
    let mut chars = src.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push(' ');
                    state = State::BlockComment;
                }
                '"' => {
                    out.push(c);
                    state = State::Str;
                }
                '`' => {
                    out.push(c);
                    state = State::RawStr;
                }
                '\'' => {
                    out.push(c);
                    state = State::Rune;
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '\n' {
                    out.push('\n');
                } else if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                }
            }
            State::Str | State::Rune => {
                out.push(c);
                let close = if state == State::Str { '"' } else { '\'' };
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == close || c == '\n' {
                    state = State::Code;
                }
            }
            State::RawStr => {
                out.push(c);
                if c == '`' {
                    state = State::Code;
                }
            }
        }
    }

    out
}
