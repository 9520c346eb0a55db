use std::path::PathBuf;

use clap::Parser;

use crate::models::VERSION_NOT_APPLICABLE;

#[derive(Parser, Debug)]
#[command(
    name = "lic",
    about = "Inventory Go dependencies, resolve their licenses, and flag imports from non-whitelisted sources",
    version
)]
pub struct Cli {
    /// Go project directory to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Config file [default: ./.lic/config.toml, fallback ~/.config/lic/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Version of the scanned project, used in the project hash
    #[arg(long, value_name = "VERSION", default_value = VERSION_NOT_APPLICABLE)]
    pub project_version: String,

    /// Skip remote license lookups; whitelist checks still run
    #[arg(long)]
    pub offline: bool,

    /// Debug logging and list standard-library imports in the report
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print the summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["lic"]);
        assert_eq!(cli.path, PathBuf::from("."));
        assert_eq!(cli.project_version, "n/a");
        assert!(matches!(cli.report, ReportFormat::Terminal));
        assert!(!cli.offline);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "lic",
            "./svc",
            "--report",
            "json",
            "--project-version",
            "v1.4.0",
            "--offline",
            "-q",
        ]);
        assert_eq!(cli.path, PathBuf::from("./svc"));
        assert_eq!(cli.project_version, "v1.4.0");
        assert!(matches!(cli.report, ReportFormat::Json));
        assert!(cli.offline && cli.quiet);
    }
}
