//! Pure formatting functions for UI output.
//!
//! Everything the commands print goes through here; interaction lives in the
//! parent module.

use crate::config::Config;
use crate::domain::record::{IssueSummary, VersionRecord};
use crate::domain::template::TemplateRegistry;
use crate::lifecycle::{
    ActionFailure, ArchiveReport, CleanupReport, CreateReport, DeleteReport, ListReport,
    ListedVersion,
};
use crate::warning::LifecycleWarning;
use console::style;

/// Error line, `ERROR:` in red.
pub fn error_line(message: &str) -> String {
    format!("{} {}", style("ERROR:").red(), message)
}

/// Status line, arrow in yellow.
pub fn status_line(message: &str) -> String {
    format!("{} {}", style("→").yellow(), message)
}

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{}", error_line(message));
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{}", status_line(message));
}

/// Display a lifecycle warning to the user.
pub fn display_warning(warning: &LifecycleWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

fn display_failures(failures: &[ActionFailure]) {
    for failure in failures {
        display_error(&format!("{}: {}", failure.name, failure.error));
    }
}

/// Verb for an action, in the conditional when nothing was sent.
pub fn action_verb(verb: &str, dry_run: bool) -> String {
    if dry_run {
        format!("Would {}", verb)
    } else {
        let mut chars = verb.chars();
        match chars.next() {
            Some(first) => {
                let rest: String = chars.collect();
                let past = if rest.ends_with('e') {
                    format!("{}d", rest)
                } else {
                    format!("{}ed", rest)
                };
                format!("{}{}", first.to_uppercase(), past)
            }
            None => String::new(),
        }
    }
}

/// One-line count summary, e.g. `PROJECT1: 3 created, 1 skipped, 0 failed`.
pub fn summary_line(project: &str, counts: &[(usize, &str)]) -> String {
    let parts: Vec<String> = counts
        .iter()
        .map(|(count, label)| format!("{} {}", count, label))
        .collect();
    format!("{}: {}", project, parts.join(", "))
}

fn dry_run_banner(project: &str, dry_run: bool) {
    if dry_run {
        println!(
            "\n{} {}",
            style(format!("[{}]", project)).bold(),
            style("dry run, no changes sent").dim()
        );
    } else {
        println!("\n{}", style(format!("[{}]", project)).bold());
    }
}

/// Display the outcome of `create` for one project.
pub fn display_create_report(report: &CreateReport) {
    dry_run_banner(&report.project, report.dry_run);
    for warning in &report.warnings {
        display_warning(warning);
    }
    for name in &report.created {
        display_success(&format!("{} {}", action_verb("create", report.dry_run), name));
    }
    for name in &report.skipped {
        for line in skipped_lines(name, report.skipped_issues.get(name)) {
            println!("{}", line);
        }
    }
    display_failures(&report.failed);

    let created = if report.dry_run { "to create" } else { "created" };
    println!(
        "{}",
        summary_line(
            &report.project,
            &[
                (report.created.len(), created),
                (report.skipped.len(), "skipped"),
                (report.failed.len(), "failed"),
            ]
        )
    );
}

/// Lines for a version `create` skipped, followed by its attached issues.
pub fn skipped_lines(name: &str, issues: Option<&Vec<IssueSummary>>) -> Vec<String> {
    match issues {
        Some(issues) if !issues.is_empty() => {
            let mut lines = vec![status_line(&format!(
                "Skipped {} (already exists with {} issue(s))",
                name,
                issues.len()
            ))];
            lines.extend(issues.iter().map(issue_line));
            lines
        }
        _ => vec![status_line(&format!(
            "Skipped {} (already exists, no issues assigned)",
            name
        ))],
    }
}

fn issue_line(issue: &IssueSummary) -> String {
    format!(
        "      {} {} ({}, {})",
        style(&issue.key).cyan(),
        issue.summary,
        issue.issue_type,
        issue.status
    )
}

/// Display the outcome of `delete`.
pub fn display_delete_report(report: &DeleteReport) {
    dry_run_banner(&report.project, report.dry_run);
    let verb = action_verb("delete", report.dry_run);
    match &report.moved_to {
        Some(target) => display_success(&format!(
            "{} {} after moving {} issue(s) to {}",
            verb, report.name, report.issue_count, target
        )),
        None if report.issue_count > 0 => display_success(&format!(
            "{} {} detaching {} issue(s)",
            verb, report.name, report.issue_count
        )),
        None => display_success(&format!("{} {}", verb, report.name)),
    }
}

/// Display the outcome of `cleanup` for one project.
pub fn display_cleanup_report(report: &CleanupReport) {
    dry_run_banner(&report.project, report.dry_run);
    for warning in &report.warnings {
        display_warning(warning);
    }
    for name in &report.deleted {
        display_success(&format!("{} {}", action_verb("delete", report.dry_run), name));
    }
    display_failures(&report.failed);

    let deleted = if report.dry_run { "to delete" } else { "deleted" };
    println!(
        "{}",
        summary_line(
            &report.project,
            &[
                (report.scanned, "scanned"),
                (report.deleted.len(), deleted),
                (report.failed.len(), "failed"),
            ]
        )
    );
}

/// Display the outcome of `archive` for one project.
pub fn display_archive_report(report: &ArchiveReport) {
    dry_run_banner(&report.project, report.dry_run);
    for warning in &report.warnings {
        display_warning(warning);
    }
    for name in &report.archived {
        display_success(&format!("{} {}", action_verb("archive", report.dry_run), name));
    }
    display_failures(&report.failed);

    let archived = if report.dry_run { "to archive" } else { "archived" };
    println!(
        "{}",
        summary_line(
            &report.project,
            &[
                (report.scanned, "scanned"),
                (report.archived.len(), archived),
                (report.failed.len(), "failed"),
            ]
        )
    );
}

/// Short state label of a version.
pub fn version_state(record: &VersionRecord) -> &'static str {
    if record.archived {
        "archived"
    } else if record.released {
        "released"
    } else {
        "unreleased"
    }
}

/// One `list` line: name, state, tracker id, then whatever is known.
pub fn version_line(listed: &ListedVersion) -> String {
    let record = &listed.record;
    let state = match version_state(record) {
        "released" => style("released").green(),
        "archived" => style("archived").dim(),
        other => style(other).yellow(),
    };
    let mut line = format!("  {:<40} {:<10} [ID: {}]", record.name, state, record.id);
    if let Some(date) = record.release_date {
        line.push_str(&format!(" {}", date));
    }
    if let Some(template) = &listed.template {
        line.push_str(&format!(" [{}]", template));
    }
    if let Some(count) = record.issue_count {
        line.push_str(&format!(" {} issue(s)", count));
    }
    line
}

/// Display the versions of a project, with issues when they were fetched.
pub fn display_version_list(report: &ListReport) {
    println!(
        "\n{} ({} version(s))",
        style(format!("Versions of {}", report.project)).bold(),
        report.versions.len()
    );

    for listed in &report.versions {
        println!("{}", version_line(listed));
        for issue in listed.issues.iter().flatten() {
            println!("{}", issue_line(issue));
        }
    }

    for warning in &report.warnings {
        display_warning(warning);
    }
}

/// Display the resolved configuration with the API token masked.
pub fn display_config(config: &Config, registry: &TemplateRegistry) {
    println!("{}", style("Resolved configuration").bold());
    match config.to_masked_toml() {
        Ok(text) => println!("{}", text),
        Err(e) => display_error(&e.to_string()),
    }

    println!("{}", style("Templates per project:").bold());
    for project in &config.project_keys {
        println!("  {} -> {}", project, config.templates_for(project).join(", "));
    }

    println!("{}", style("Compiled templates:").bold());
    for id in registry.ids() {
        if let Some(template) = registry.get(id) {
            println!("  {}", template);
        }
    }
}
