//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde, plain emits one value per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use smartsec_core::ArmingState;

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Arming state label, colored by severity when enabled.
pub fn paint_arming_state(state: ArmingState, color: bool) -> String {
    let label = state.to_string();
    if !color {
        return label;
    }
    match state {
        ArmingState::Disarmed => label.green().to_string(),
        ArmingState::Triggered => label.red().bold().to_string(),
        ArmingState::ArmedAway | ArmingState::ArmedNight | ArmingState::ArmedStay => {
            label.yellow().to_string()
        }
    }
}

/// Yes/no flag, highlighted when set.
pub fn paint_flag(set: bool, color: bool) -> String {
    match (set, color) {
        (true, true) => "yes".red().to_string(),
        (true, false) => "yes".into(),
        (false, _) => "no".into(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, which returns a pre-formatted string.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Render one item of a stream: a single line for every format except YAML,
/// which emits a document separator.
pub fn render_stream_item<T>(
    format: &OutputFormat,
    data: &T,
    line_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => line_fn(data),
        OutputFormat::Json | OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => format!("---\n{}", render_yaml(data).trim_end()),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

/// Two-column key/value table used by detail views.
#[derive(Tabled)]
pub struct Field {
    #[tabled(rename = "Field")]
    pub name: &'static str,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\":\"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}
