//! Output formatting for contractlint results.
//!
//! Supports three renderings of one `RunReport`:
//! - Pretty: colored terminal output for human readability
//! - Markdown: the document persisted under the project root
//! - JSON: structured output for programmatic consumption

use colored::*;
use std::fmt::Write as _;
use std::path::Path;

use crate::contract::{Contract, Matcher};
use crate::error::{Error, Result};
use crate::summary::{Recommendation, RunReport};
use crate::verify::CheckResult;

/// Current UTC time for the document header.
pub fn timestamp() -> String {
    let format = time::macros::format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second] UTC"
    );
    time::OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Status rows for the key interface section: configured labels, or every
/// interface check when none are configured.
pub fn key_interface_rows(report: &RunReport, contract: &Contract) -> Vec<(String, bool)> {
    let passed = |name: &str| report.result(name).map(|r| r.passed).unwrap_or(false);

    if !contract.report.key_interfaces.is_empty() {
        return contract
            .report
            .key_interfaces
            .iter()
            .map(|k| (k.label.clone(), passed(&k.check)))
            .collect();
    }

    contract
        .checks
        .iter()
        .filter_map(|c| match &c.matcher {
            Matcher::Interface { interface, .. } => Some((interface.clone(), passed(&c.name))),
            _ => None,
        })
        .collect()
}

/// Measured values with their report labels.
pub fn measurement_rows<'a>(report: &'a RunReport, contract: &'a Contract) -> Vec<(&'a str, usize)> {
    report
        .measurements()
        .map(|(name, value)| {
            let label = contract.check(name).map(|c| c.label()).unwrap_or(name);
            (label, value)
        })
        .collect()
}

// =============================================================================
// Markdown document
// =============================================================================

/// Render the persisted report document.
pub fn render_markdown(
    report: &RunReport,
    contract: &Contract,
    root: &Path,
    generated_at: &str,
) -> String {
    let mut out = String::new();
    let stats = &report.stats;

    let _ = writeln!(out, "# {}\n", contract.report_title());
    let _ = writeln!(out, "**Generated**: {}", generated_at);
    let _ = writeln!(out, "**Project root**: {}", root.display());
    if !contract.name.is_empty() {
        let _ = writeln!(out, "**Contract**: {}", contract.name);
    }
    out.push('\n');

    if report.cancelled {
        out.push_str("> Run cancelled before all checks were evaluated.\n\n");
    }

    out.push_str("## Overall result\n\n");
    let _ = writeln!(out, "- **Total checks**: {}", stats.total);
    let _ = writeln!(out, "- **Passed**: {}", stats.passed);
    let _ = writeln!(out, "- **Failed**: {}", stats.failed);
    let _ = writeln!(out, "- **Pass rate**: {:.1}%", stats.pass_rate);
    let _ = writeln!(out, "- **Issues**: {}", stats.issue_count);
    let _ = writeln!(
        out,
        "- **Files inspected**: {} ({} missing)",
        stats.files_inspected, stats.files_missing
    );
    if stats.informational > 0 {
        let _ = writeln!(out, "- **Informational checks**: {}", stats.informational);
    }
    for (label, value) in measurement_rows(report, contract) {
        let _ = writeln!(out, "- **{}**: {}", label, value);
    }
    out.push('\n');

    out.push_str("## Check results\n\n");
    if report.results.is_empty() {
        out.push_str("No checks were evaluated.\n");
    }
    for r in &report.results {
        let _ = writeln!(out, "{}", markdown_result_line(r));
    }
    out.push('\n');

    let rows = key_interface_rows(report, contract);
    if !rows.is_empty() {
        out.push_str("## Key interface status\n\n");
        for (label, ok) in rows {
            let _ = writeln!(out, "- {} {}", if ok { "[OK]" } else { "[XX]" }, label);
        }
        out.push('\n');
    }

    out.push_str("## Issues\n\n");
    if report.issues.is_empty() {
        out.push_str("No issues.\n");
    }
    for (i, issue) in report.issues.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. `{}` [{}] {}",
            i + 1,
            issue.check,
            issue.kind,
            issue.message
        );
    }
    out.push('\n');

    out.push_str("## Recommendation\n\n");
    let _ = writeln!(
        out,
        "{} **{}**",
        report.recommendation.tag(),
        report.recommendation.message()
    );

    out
}

fn markdown_result_line(r: &CheckResult) -> String {
    let mut line = format!("- {} **{}**", r.tag(), r.name);
    if !r.message.is_empty() {
        let _ = write!(line, " - {}", r.message);
    }
    if let Some(t) = &r.tally {
        let _ = write!(line, " ({}/{})", t.found, t.required);
    }
    line
}

/// Write a rendered document, replacing any previous report.
pub fn save(path: &Path, content: &str) -> Result<()> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)
    };
    write().map_err(|source| Error::ReportWrite {
        path: path.to_path_buf(),
        source,
    })
}

// =============================================================================
// JSON
// =============================================================================

/// Write the run report as pretty JSON on stdout.
pub fn write_json(report: &RunReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(report: &RunReport, contract: &Contract, root: &Path) {
    // Header
    println!();
    print!("  ");
    print!("{}", "contractlint".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Project:  ".dimmed());
    println!("{}", root.display());
    if !contract.name.is_empty() {
        print!("  {}", "Contract: ".dimmed());
        println!("{}", contract.name);
    }
    println!();

    write_results(&report.results);
    println!();

    write_stats(report, contract);
    println!();

    if !report.issues.is_empty() {
        write_issues(report);
        println!();
    }

    write_final_status(report);
    println!();
}

fn write_results(results: &[CheckResult]) {
    println!("  {} ({}):", "Checks".bold(), results.len());
    for r in results {
        let tag = if r.informational {
            r.tag().cyan()
        } else if r.passed {
            r.tag().green()
        } else {
            r.tag().red()
        };
        print!("    {}: {}", tag, r.name);
        if !r.message.is_empty() {
            print!(" {}", format!("- {}", r.message).dimmed());
        }
        println!();
    }
}

fn write_stats(report: &RunReport, contract: &Contract) {
    let s = &report.stats;
    println!("  {}", "Summary:".bold());
    println!("    {:<18} {}", "Total checks", s.total);
    println!("    {:<18} {}", "Passed", s.passed.to_string().green());
    if s.failed > 0 {
        println!("    {:<18} {}", "Failed", s.failed.to_string().red());
    } else {
        println!("    {:<18} {}", "Failed", s.failed);
    }
    println!("    {:<18} {:.1}%", "Pass rate", s.pass_rate);
    println!("    {:<18} {}", "Issues", s.issue_count);
    println!(
        "    {:<18} {} ({} missing)",
        "Files inspected", s.files_inspected, s.files_missing
    );
    for (label, value) in measurement_rows(report, contract) {
        println!("    {:<18} {}", label, value);
    }
}

fn write_issues(report: &RunReport) {
    println!("  {} ({}):", "Issues".bold(), report.issues.len());
    for (i, issue) in report.issues.iter().enumerate() {
        println!(
            "    {:>3}. {:<22}{}",
            i + 1,
            issue.kind.as_str().dimmed(),
            issue.message
        );
    }
}

fn write_final_status(report: &RunReport) {
    let tag = match report.recommendation {
        Recommendation::Compliant => report.recommendation.tag().green(),
        Recommendation::MinorGaps => report.recommendation.tag().yellow(),
        Recommendation::SignificantGaps => report.recommendation.tag().red(),
    };
    print!("  {} {}  ", tag, report.recommendation.message());

    if report.all_passed() {
        print!("{}", "PASSED".green());
    } else {
        print!("{}", "FAILED".red());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusStats;
    use crate::verify::IssueKind;
    use tempfile::TempDir;

    fn contract() -> Contract {
        serde_yaml::from_str(
            r#"
name: Sample
report:
  key_interfaces:
    - { label: "Provider::GetInstance()", check: provider }
    - { label: "Zero-copy buffers", check: zero_copy }
checks:
  - name: provider
    kind: interface
    interface: Provider
    declaration: a.h
    implementation: a.cpp
    methods: [GetInstance]
  - { name: zero_copy, kind: exists, paths: [b.cpp] }
"#,
        )
        .unwrap()
    }

    fn report() -> RunReport {
        let results = vec![
            CheckResult::pass("provider", "interface", "all 1 methods implemented"),
            CheckResult::fail("zero_copy", "exists", "missing 1 of 1 files")
                .issue(IssueKind::MissingResource, "file not found: b.cpp"),
        ];
        RunReport::aggregate("Sample", results, CorpusStats::default(), false)
    }

    #[test]
    fn test_markdown_sections() {
        let md = render_markdown(&report(), &contract(), Path::new("/proj"), "2026-01-01 00:00:00 UTC");
        assert!(md.starts_with("# Sample verification report\n"));
        assert!(md.contains("**Generated**: 2026-01-01 00:00:00 UTC"));
        assert!(md.contains("## Overall result"));
        assert!(md.contains("- **Pass rate**: 50.0%"));
        assert!(md.contains("- [PASS] **provider** - all 1 methods implemented"));
        assert!(md.contains("- [FAIL] **zero_copy** - missing 1 of 1 files"));
        assert!(md.contains("## Key interface status"));
        assert!(md.contains("- [OK] Provider::GetInstance()"));
        assert!(md.contains("- [XX] Zero-copy buffers"));
        assert!(md.contains("1. `zero_copy` [missing_resource] file not found: b.cpp"));
        assert!(md.contains("[ERROR] **Several checks failed"));
    }

    #[test]
    fn test_markdown_measurements() {
        let mut c = contract();
        c.checks.push(
            serde_yaml::from_str(
                "{ name: dhlog_files, description: Files using DHLOG, kind: count, files: [a.cpp], tokens: [DHLOGI], unit: files }",
            )
            .unwrap(),
        );
        let mut results = report().results;
        results.push(
            CheckResult::pass("dhlog_files", "count", "1 of 1 files")
                .with_value(1)
                .informational(true),
        );
        let r = RunReport::aggregate("Sample", results, CorpusStats::default(), false);

        let md = render_markdown(&r, &c, Path::new("/proj"), "t");
        assert!(md.contains("- **Total checks**: 2"));
        assert!(md.contains("- **Informational checks**: 1"));
        assert!(md.contains("- **Files using DHLOG**: 1"));
        assert!(md.contains("- [INFO] **dhlog_files** - 1 of 1 files"));
    }

    #[test]
    fn test_markdown_deterministic_apart_from_timestamp() {
        let a = render_markdown(&report(), &contract(), Path::new("/proj"), "t");
        let b = render_markdown(&report(), &contract(), Path::new("/proj"), "t");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_interfaces_default_to_interface_checks() {
        let mut c = contract();
        c.report.key_interfaces.clear();
        let rows = key_interface_rows(&report(), &c);
        assert_eq!(rows, vec![("Provider".to_string(), true)]);
    }

    #[test]
    fn test_save_overwrites() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out/report.md");
        save(&path, "first run with a long body").unwrap();
        save(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_save_unwritable_destination() {
        let temp = TempDir::new().unwrap();
        // A directory cannot be overwritten with a file.
        let err = save(temp.path(), "x").unwrap_err();
        assert!(matches!(err, Error::ReportWrite { .. }));
    }

    #[test]
    fn test_json_round_trip_fields() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["stats"]["total"], 2);
        assert_eq!(json["recommendation"], "significant_gaps");
        assert_eq!(json["issues"][0]["kind"], "missing_resource");
    }
}
