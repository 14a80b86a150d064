//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and user input handling

use std::io::{self, Write};

use anyhow::Result;
use console::style;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_archive_report, display_cleanup_report, display_config, display_create_report,
    display_delete_report, display_error, display_status, display_success, display_version_list,
    display_warning,
};

fn read_line() -> Result<String> {
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Interpret a 1-based menu selection; empty input picks `default`.
///
/// # Returns
/// * `Some(index)` - 0-based index of the chosen option
/// * `None` - Input is not a number within `1..=len`
pub fn parse_selection(input: &str, len: usize, default: usize) -> Option<usize> {
    let index = if input.trim().is_empty() {
        default
    } else {
        input.trim().parse::<usize>().ok()?
    };

    (index > 0 && index <= len).then(|| index - 1)
}

/// Prompts user to select one of `options` from a numbered list.
///
/// If only one option is available, returns it directly without prompting.
/// Default selection is the first option if user presses Enter.
///
/// # Returns
/// * `Ok(usize)` - 0-based index of the selection
/// * `Err` - If selection is invalid or input fails
pub fn select_option(title: &str, options: &[String]) -> Result<usize> {
    if options.len() == 1 {
        return Ok(0);
    }

    println!("\n{}", style(title).bold());
    for (i, option) in options.iter().enumerate() {
        println!("  {}. {}", i + 1, option);
    }

    print!("\nSelect (1-{}) [default: 1]: ", options.len());
    let input = read_line()?;

    parse_selection(&input, options.len(), 1)
        .ok_or_else(|| anyhow::anyhow!("Invalid selection '{}'", input))
}

/// Prompts user to select one of the configured projects.
pub fn select_project(projects: &[String]) -> Result<String> {
    if projects.is_empty() {
        return Err(anyhow::anyhow!("No projects configured (set project_keys)"));
    }
    let index = select_option("Configured projects:", projects)?;
    Ok(projects[index].clone())
}

/// Prompts for free text; empty input returns `default` (or `None`).
pub fn prompt_text(prompt: &str, default: Option<&str>) -> Result<Option<String>> {
    match default {
        Some(default) => print!("{} [{}]: ", prompt, default),
        None => print!("{}: ", prompt),
    }
    let input = read_line()?;

    if input.is_empty() {
        Ok(default.map(str::to_string))
    } else {
        Ok(Some(input))
    }
}

/// Prompts user to confirm an action with a yes/no prompt.
///
/// Accepts "y" or "yes" (case-insensitive) as confirmation.
/// Default is "no" if user presses Enter.
pub fn confirm_action(prompt: &str) -> Result<bool> {
    print!("\n{} (y/N): ", prompt);
    let response = read_line()?.to_lowercase();
    Ok(response == "y" || response == "yes")
}
