//! Output formatting for plans and graph summaries.

use clap::ValueEnum;
use sensorpath_lib::{GraphSummary, PathPlan, RenderMode, TourPlan};
use serde::Serialize;

/// How command results are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text, one sensor per line.
    #[default]
    Text,
    /// Markdown-flavoured text.
    Rich,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    fn render_mode(self) -> RenderMode {
        match self {
            OutputFormat::Rich => RenderMode::RichText,
            OutputFormat::Text | OutputFormat::Json => RenderMode::PlainText,
        }
    }
}

pub fn format_path(
    plan: &PathPlan,
    from: &str,
    to: &str,
    format: OutputFormat,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => to_json(plan),
        _ => Ok(plan.render(from, to, format.render_mode())),
    }
}

pub fn format_tour(plan: &TourPlan, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => to_json(plan),
        _ => Ok(plan.render(format.render_mode())),
    }
}

pub fn format_summary(summary: &GraphSummary, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => to_json(summary),
        _ => Ok(summary.render()),
    }
}

fn to_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut rendered = serde_json::to_string_pretty(value)?;
    rendered.push('\n');
    Ok(rendered)
}
