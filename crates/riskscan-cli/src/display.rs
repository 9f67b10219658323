use colored::*;
use riskscan_core::checks::{CheckStep, RiskCheck};
use riskscan_core::tools::ToolKind;
use riskscan_core::{Outcome, ScanReport, NO_FINDINGS, UNKNOWN_RISK};
use std::path::PathBuf;

/// Print a full scan report to the terminal.
pub fn print_scan_report(report: &ScanReport) {
    println!();
    println!(
        "{}",
        format!(
            " riskscan v{} — Scan completed for repository \"{}\"",
            env!("CARGO_PKG_VERSION"),
            report.repository_name()
        )
        .bold()
    );
    println!(" {} {}", "|-".dimmed(), report.target.display());
    println!();
    println!(" {}", "=".repeat(60).dimmed());

    for result in &report.results {
        println!();
        println!(" {} {}", "Risk:".bold(), result.category.cyan().bold());
        match &result.outcome {
            Outcome::Completed(text) if text == NO_FINDINGS => {
                println!(" {} {}", "OK".green().bold(), text);
            }
            Outcome::Completed(text) if text == UNKNOWN_RISK => {
                println!(" {} {}", "??".yellow().bold(), text);
            }
            Outcome::Completed(text) => {
                println!(" {}", "Result:".bold());
                for line in text.lines() {
                    println!("   {}", line);
                }
            }
            Outcome::Failed(error) => {
                println!(" {} {}", "ERROR".red().bold(), error);
            }
        }
    }

    println!();
    println!(" {}", "=".repeat(60).dimmed());
    println!();

    let failed = report.failures().count();
    println!(" {}", "Summary".bold().underline());
    println!(
        " {} Categories scanned: {}",
        "|-".dimmed(),
        report.len()
    );
    println!(
        " {} Failed checks:      {}",
        "|-".dimmed(),
        if failed > 0 {
            failed.to_string().red().bold().to_string()
        } else {
            "0".to_string()
        }
    );
    println!(
        " {} Duration:           {:.1}s",
        "|-".dimmed(),
        report.duration_secs()
    );
    println!();
}

/// Print the registry of risk categories.
pub fn print_categories(checks: &[RiskCheck]) {
    println!();
    println!(" {}", "Risk Categories".bold().underline());
    for check in checks {
        let steps: Vec<String> = check
            .steps
            .iter()
            .map(|step| match step {
                CheckStep::Tool(step) => step.tool.to_string(),
                CheckStep::LoggingConfig => "logging-config search".to_string(),
            })
            .collect();
        println!(
            " {} {} {}",
            "|-".dimmed(),
            check.label.cyan(),
            format!("({})", steps.join(" + ")).dimmed()
        );
    }
    println!();
}

/// Print tool availability as gathered by `riskscan doctor`.
pub fn print_doctor(statuses: &[(ToolKind, PathBuf, Result<String, String>)]) {
    println!();
    println!(" {}", "External Tools".bold().underline());
    for (tool, program, status) in statuses {
        match status {
            Ok(version) => println!(
                " {} {:<9} {} {}",
                "OK".green().bold(),
                tool.to_string(),
                version,
                format!("({})", program.display()).dimmed()
            ),
            Err(error) => println!(
                " {} {:<9} {}",
                "MISSING".red().bold(),
                tool.to_string(),
                error
            ),
        }
    }
    println!();
}
