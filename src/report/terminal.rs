use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use super::{found_phrase, Report};
use crate::models::VERSION_STANDARD_LIBRARY;

/// Render a colored terminal report.
///
/// With `verbose`, the validated table also lists standard-library imports.
pub fn render(report: &Report, verbose: bool, quiet: bool) {
    if quiet {
        println!("{}", summary_line(report));
        return;
    }

    println!(
        "\n {} v{}",
        "lic".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        " Report for {} {}",
        report.project.as_deref().unwrap_or("<unnamed project>").bold(),
        report.version
    );
    println!(" Project hash: {}\n", report.hash.dimmed());

    let s = &report.summary;
    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Total imports   : {:>4}", s.total));
    println!(
        " │  {:<48} │",
        format!("{}  Validated    : {:>4}", "✓".green(), s.validated)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Violations   : {:>4}", "✗".red(), s.violations)
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    println!(
        " During the scan {} found.\n",
        found_phrase(s.validated, "validated dependency", "validated dependencies")
    );
    if s.validated > 0 {
        render_validated(report, verbose);
        println!();
    }

    if s.violations > 0 {
        println!(
            " {} Additionally {} found:\n",
            "[VIOLATION]".red().bold(),
            found_phrase(s.violations, "import from a non-whitelisted source", "imports from non-whitelisted sources")
        );
        render_violations(report);
        println!();
    }
}

fn render_validated(report: &Report, verbose: bool) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Import").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Direct").add_attribute(Attribute::Bold),
        ]);

    let mut hidden = 0;
    for entry in &report.validated {
        if !verbose && entry.version == VERSION_STANDARD_LIBRARY {
            hidden += 1;
            continue;
        }
        let license_color = if entry.license == "N/A" {
            Color::DarkGrey
        } else {
            Color::Green
        };
        table.add_row(vec![
            Cell::new(&entry.name),
            Cell::new(&entry.version),
            Cell::new(&entry.license).fg(license_color),
            direct_cell(entry.direct),
        ]);
    }

    println!("{}", table);
    if hidden > 0 {
        println!(
            " {} standard library import(s) hidden, use --verbose to list them",
            hidden
        );
    }
}

fn render_violations(report: &Report) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Import").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("Direct").add_attribute(Attribute::Bold),
        ]);

    for entry in &report.violations {
        table.add_row(vec![
            Cell::new(&entry.name).fg(Color::Red),
            Cell::new(&entry.version),
            direct_cell(entry.direct),
        ]);
    }

    println!("{}", table);
}

fn direct_cell(direct: bool) -> Cell {
    let text = if direct { "yes" } else { "no" };
    Cell::new(text).set_alignment(CellAlignment::Center)
}

fn summary_line(report: &Report) -> String {
    let s = &report.summary;
    format!(
        "Total: {}  Validated: {}  Violations: {}",
        s.total,
        s.validated.to_string().green(),
        s.violations.to_string().red(),
    )
}
