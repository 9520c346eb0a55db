use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Root configuration structure, deserialized from `.lic/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Go import classification rules.
    #[serde(default)]
    pub golang: GolangConfig,
    /// GitHub license provider settings.
    #[serde(default)]
    pub github: GitHubConfig,
}

/// Decides which imports are trusted for license auto-validation.
#[derive(Debug, Deserialize)]
pub struct GolangConfig {
    /// Source hosts whose imports get their license looked up.
    /// Anything else is reported as a violation.
    #[serde(default = "default_whitelist_domains")]
    pub whitelist_domains: Vec<String>,
    /// Import paths considered part of the Go standard library.
    #[serde(default = "default_stdlib_packages")]
    pub stdlib_packages: BTreeSet<String>,
}

impl Default for GolangConfig {
    fn default() -> Self {
        Self {
            whitelist_domains: default_whitelist_domains(),
            stdlib_packages: default_stdlib_packages(),
        }
    }
}

impl GolangConfig {
    pub fn is_stdlib(&self, import: &str) -> bool {
        self.stdlib_packages.contains(import)
    }

    /// Whether `import` lives under one of the whitelisted domains.
    ///
    /// Matches the domain exactly or as a leading path segment:
    /// `github.com/a/b` matches `github.com`, `mygithub.company.com/a/b` and
    /// `evil.com/github.com/fake` do not.
    pub fn is_whitelisted(&self, import: &str) -> bool {
        self.whitelist_domains.iter().any(|domain| {
            let domain = domain.trim_end_matches('/');
            !domain.is_empty()
                && (import == domain
                    || import
                        .strip_prefix(domain)
                        .is_some_and(|rest| rest.starts_with('/')))
        })
    }
}

/// Settings for the GitHub repository metadata API.
#[derive(Debug, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Environment variable holding an optional bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Additional attempts after the first failed request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token_env: default_token_env(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl GitHubConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Read the token from the configured environment variable, ignoring blanks.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

fn default_whitelist_domains() -> Vec<String> {
    ["github.com", "gopkg.in", "golang.org"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_token_env() -> String {
    "LIC_GITHUB_ACCESS_TOKEN".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Go standard library import paths as of Go 1.24.
fn default_stdlib_packages() -> BTreeSet<String> {
    #[rustfmt::skip]
    const PACKAGES: &[&str] = &[
        "archive", "archive/tar", "archive/zip",
        "bufio", "builtin", "bytes",
        "cmp",
        "compress", "compress/bzip2", "compress/flate", "compress/gzip", "compress/lzw", "compress/zlib",
        "container", "container/heap", "container/list", "container/ring",
        "context",
        "crypto", "crypto/aes", "crypto/cipher", "crypto/des", "crypto/dsa", "crypto/ecdh",
        "crypto/ecdsa", "crypto/ed25519", "crypto/elliptic", "crypto/hmac", "crypto/md5",
        "crypto/rand", "crypto/rc4", "crypto/rsa", "crypto/sha1", "crypto/sha256", "crypto/sha512",
        "crypto/subtle", "crypto/tls", "crypto/x509", "crypto/x509/pkix",
        "database", "database/sql", "database/sql/driver",
        "debug", "debug/buildinfo", "debug/dwarf", "debug/elf", "debug/gosym", "debug/macho",
        "debug/pe", "debug/plan9obj",
        "embed",
        "encoding", "encoding/ascii85", "encoding/asn1", "encoding/base32", "encoding/base64",
        "encoding/binary", "encoding/csv", "encoding/gob", "encoding/hex", "encoding/json",
        "encoding/pem", "encoding/xml",
        "errors", "expvar", "flag", "fmt",
        "go", "go/ast", "go/build", "go/constant", "go/doc", "go/format", "go/importer",
        "go/parser", "go/printer", "go/scanner", "go/token", "go/types",
        "hash", "hash/adler32", "hash/crc32", "hash/crc64", "hash/fnv", "hash/maphash",
        "html", "html/template",
        "image", "image/color", "image/color/palette", "image/draw", "image/gif", "image/jpeg",
        "image/png",
        "index", "index/suffixarray",
        "io", "io/fs", "io/ioutil",
        "iter",
        "log", "log/slog", "log/syslog",
        "maps",
        "math", "math/big", "math/bits", "math/cmplx", "math/rand", "math/rand/v2",
        "mime", "mime/multipart", "mime/quotedprintable",
        "net", "net/http", "net/http/cgi", "net/http/cookiejar", "net/http/fcgi",
        "net/http/httptest", "net/http/httptrace", "net/http/httputil", "net/http/pprof",
        "net/mail", "net/netip", "net/rpc", "net/rpc/jsonrpc", "net/smtp", "net/textproto",
        "net/url",
        "os", "os/exec", "os/signal", "os/user",
        "path", "path/filepath",
        "plugin", "reflect",
        "regexp", "regexp/syntax",
        "runtime", "runtime/cgo", "runtime/coverage", "runtime/debug", "runtime/metrics",
        "runtime/pprof", "runtime/trace",
        "slices", "sort", "strconv", "strings",
        "sync", "sync/atomic",
        "syscall", "syscall/js",
        "testing", "testing/fstest", "testing/iotest", "testing/quick", "testing/slogtest",
        "text", "text/scanner", "text/tabwriter", "text/template", "text/template/parse",
        "time",
        "unicode", "unicode/utf16", "unicode/utf8",
        "unique", "unsafe",
    ];
    PACKAGES.iter().map(|p| p.to_string()).collect()
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `<project_path>/.lic/config.toml`
/// 3. `~/.config/lic/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".lic").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("lic").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("invalid config {}", path.display()))?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_whitelist_prefix_match() {
        let cfg = GolangConfig::default();
        assert!(cfg.is_whitelisted("github.com/a/b"));
        assert!(cfg.is_whitelisted("github.com"));
        assert!(cfg.is_whitelisted("gopkg.in/yaml.v3"));
        assert!(cfg.is_whitelisted("golang.org/x/net/context"));
    }

    #[test]
    fn test_whitelist_rejects_substring() {
        let cfg = GolangConfig::default();
        assert!(!cfg.is_whitelisted("mygithub.company.com/a/b"));
        assert!(!cfg.is_whitelisted("evil.com/github.com/fake"));
        assert!(!cfg.is_whitelisted("github.community/a/b"));
        assert!(!cfg.is_whitelisted("example.com/unknown"));
    }

    #[test]
    fn test_whitelist_ignores_empty_domain() {
        let cfg = GolangConfig {
            whitelist_domains: vec![String::new(), "example.com/".into()],
            ..GolangConfig::default()
        };
        assert!(!cfg.is_whitelisted("/foo"));
        assert!(cfg.is_whitelisted("example.com/unknown"));
    }

    #[test]
    fn test_stdlib_lookup() {
        let cfg = GolangConfig::default();
        assert!(cfg.is_stdlib("fmt"));
        assert!(cfg.is_stdlib("net/http"));
        assert!(!cfg.is_stdlib("github.com/spf13/cobra"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "[golang]").unwrap();
        writeln!(f, "whitelist_domains = [\"example.com\"]").unwrap();
        writeln!(f, "[github]").unwrap();
        writeln!(f, "max_retries = 5").unwrap();

        let cfg = load_config(Path::new("/nonexistent"), Some(f.path())).unwrap();
        assert_eq!(cfg.golang.whitelist_domains, vec!["example.com".to_string()]);
        assert!(cfg.golang.is_stdlib("fmt"));
        assert_eq!(cfg.github.max_retries, 5);
        assert_eq!(cfg.github.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.github.api_url, "https://api.github.com");
    }

    #[test]
    fn test_project_config_is_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".lic")).unwrap();
        std::fs::write(
            dir.path().join(".lic").join("config.toml"),
            "[golang]\nstdlib_packages = [\"fmt\"]\n",
        )
        .unwrap();

        let cfg = load_config(dir.path(), None).unwrap();
        assert!(cfg.golang.is_stdlib("fmt"));
        assert!(!cfg.golang.is_stdlib("net/http"));
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "[golang").unwrap();
        assert!(load_config(Path::new("."), Some(f.path())).is_err());
    }
}
