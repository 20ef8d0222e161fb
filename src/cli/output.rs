//! CLI output formatting

use crate::core::{event::DeployEvent, state::PipelineOutcome};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format a deployment event for display
pub fn format_event(event: &DeployEvent) -> String {
    match event {
        DeployEvent::PipelineStarted {
            run_id,
            reference,
            path,
            dry_run,
        } => {
            let mode = if *dry_run {
                format!(" {}", style("(dry run)").yellow())
            } else {
                String::new()
            };
            format!(
                "{} Deploying version {} to {}{} ({})",
                ROCKET,
                style(reference).bold(),
                style(path.display()).cyan(),
                mode,
                style(&run_id.to_string()[..8]).dim()
            )
        }
        DeployEvent::StepStarted { message, .. } => format!("{} {}", INFO, message),
        DeployEvent::CommandStarted { command, .. } => {
            format!("   {} {}", style("Running:").dim(), command)
        }
        DeployEvent::StepSkipped { step, reason } => format!(
            "{} {} skipped: {}",
            SKIP,
            style(step.name()).dim(),
            style(reason).dim()
        ),
        DeployEvent::StepCompleted { step } => format!("{} {}", CHECK, style(step.name()).green()),
        DeployEvent::StepFailed {
            code,
            message,
            command,
            output,
            ..
        } => {
            let mut lines = vec![
                format!("{} {}", CROSS, style(code.headline()).red().bold()),
                format!("   {}", message),
            ];
            if let Some(command) = command {
                lines.push(format!("{} {}", style("Command used:").bold(), command));
            }
            if !output.is_empty() {
                lines.push(format_block(output, terminal_width()));
            }
            lines.join("\n")
        }
        DeployEvent::PipelineCompleted { success: true, .. } => {
            format!("{} {}", CHECK, style("Deployment success").green().bold())
        }
        DeployEvent::PipelineCompleted { success: false, .. } => {
            format!("{} {}", CROSS, style("Deployment failed").red().bold())
        }
    }
}

/// Render captured output as a padded block
///
/// Lines longer than `width` columns are wrapped onto extra rows, never cut.
pub fn format_block(lines: &[String], width: usize) -> String {
    let inner = width.saturating_sub(4).max(1);
    let rows: Vec<String> = lines.iter().flat_map(|line| wrap(line, inner)).collect();
    let longest = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);

    let blank = format!("  {}  ", " ".repeat(longest));
    let mut block = Vec::with_capacity(rows.len() + 2);
    block.push(style(blank.clone()).on_red().to_string());
    for row in rows {
        let padded = format!("  {:<width$}  ", row, width = longest);
        block.push(style(padded).white().on_red().to_string());
    }
    block.push(style(blank).on_red().to_string());
    block.join("\n")
}

/// Split a line into rows of at most `width` characters
fn wrap(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(width).map(|chunk| chunk.iter().collect()).collect()
}

/// Summarize an outcome as pretty JSON
pub fn format_json(outcome: &PipelineOutcome) -> serde_json::Result<String> {
    serde_json::to_string_pretty(outcome)
}

fn terminal_width() -> usize {
    term_size::dimensions_stdout().map(|(w, _)| w).unwrap_or(80)
}
