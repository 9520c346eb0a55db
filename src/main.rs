//! `lic`: inventory a Go project's dependencies, resolve their licenses, and
//! gate on a source whitelist.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and load config ([`config::load_config`]).
//! 2. Collect imports through the collector chain ([`collector`]):
//!    `go.mod`, then `Gopkg.lock`, then the `.go` source tree.
//! 3. Classify imports against the whitelist, resolving licenses of the
//!    whitelisted ones through GitHub ([`validate`], [`license`], [`registry`]).
//! 4. Render the report ([`report`]).
//! 5. Exit `0` (compliant) or `1` (violations, or nothing to scan).

mod cli;
mod collector;
mod config;
mod license;
mod models;
mod registry;
mod report;
mod scan;
mod validate;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cli::{Cli, ReportFormat};
use config::{load_config, GitHubConfig};
use license::github::{GitHubProvider, RetryPolicy};
use license::{LicenseProvider, LicenseTable, Resolver};
use registry::github::GitHubClient;
use report::Report;
use scan::Scanner;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the project is compliant.
async fn run() -> Result<bool> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("lic=debug")
    } else {
        EnvFilter::new("lic=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let path = cli
        .path
        .canonicalize()
        .unwrap_or_else(|_| cli.path.clone());
    let config = load_config(&path, cli.config.as_deref())?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, finishing with what is resolved so far");
                cancel.cancel();
            }
        }
    });

    let providers = if cli.offline {
        Vec::new()
    } else {
        github_providers(&config.github)?
    };
    let licenses = LicenseTable::default();
    tracing::debug!("{} known license keys", licenses.len());
    let resolver = Resolver::new(providers, licenses);
    let scanner = Scanner::new(collector::default_collectors(), resolver, config.golang);

    let pb = (!cli.quiet).then(progress_bar).transpose()?;
    let project = scanner
        .scan(&cancel, &path, &cli.project_version, pb.as_ref())
        .await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let project = project?;

    let report = Report::assemble(&project);
    match cli.report {
        ReportFormat::Terminal => report::terminal::render(&report, cli.verbose, cli.quiet),
        ReportFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(report.is_compliant())
}

fn github_providers(config: &GitHubConfig) -> Result<Vec<Box<dyn LicenseProvider>>> {
    let token = config.token();
    if token.is_none() {
        tracing::debug!("{} not set, using unauthenticated GitHub requests", config.token_env);
    }
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()?;
    let provider = GitHubProvider::new(
        Box::new(GitHubClient::new(client, &config.api_url, token)),
        RetryPolicy::from_config(config),
    );
    Ok(vec![Box::new(provider)])
}

fn progress_bar() -> Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
