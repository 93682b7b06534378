//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use hcsync_core::Device;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// A status line, green when color is on.
pub fn success(message: &str, color: bool) -> String {
    if color {
        message.green().bold().to_string()
    } else {
        message.to_owned()
    }
}

/// A secondary line (separators, retry notices), dimmed when color is on.
pub fn muted(message: &str, color: bool) -> String {
    if color {
        message.dimmed().to_string()
    } else {
        message.to_owned()
    }
}

// ── Rows ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id().to_string(),
            name: d.name().to_owned(),
            kind: d.kind().name().to_owned(),
            enabled: if d.enabled() { "yes" } else { "no" }.to_owned(),
        }
    }
}

/// Serializable view of one temperature sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub id: i64,
    pub name: String,
    pub value: Option<f64>,
    pub average: Option<f64>,
    pub unit: String,
    pub samples: usize,
}

impl Reading {
    /// Readings for every temperature sensor in `devices`, in order.
    pub fn collect(devices: &[Device]) -> Vec<Self> {
        devices
            .iter()
            .filter_map(|d| {
                let sensor = d.as_temperature_sensor()?;
                Some(Self {
                    id: d.id().get(),
                    name: d.name().to_owned(),
                    value: sensor.current(),
                    average: sensor.average(),
                    unit: sensor.unit().to_owned(),
                    samples: sensor.history().len(),
                })
            })
            .collect()
    }

    /// `[id]: name - value unit`
    pub fn line(&self) -> String {
        format!(
            "[{}]: {} - {} {}",
            self.id,
            self.name,
            fmt_value(self.value),
            self.unit
        )
    }
}

#[derive(Tabled)]
pub struct ReadingRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Current")]
    value: String,
    #[tabled(rename = "Average")]
    average: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Samples")]
    samples: usize,
}

impl From<&Reading> for ReadingRow {
    fn from(r: &Reading) -> Self {
        Self {
            id: r.id,
            name: r.name.clone(),
            value: fmt_value(r.value),
            average: r.average.map_or_else(|| "-".into(), |v| format!("{v:.2}")),
            unit: r.unit.clone(),
            samples: r.samples,
        }
    }
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `line_fn` on each item to emit one line per item
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    line_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    let rendered = match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false)?,
        OutputFormat::JsonCompact => render_json(data, true)?,
        OutputFormat::Yaml => render_yaml(data)?,
        OutputFormat::Plain => data.iter().map(&line_fn).collect::<Vec<_>>().join("\n"),
    };
    Ok(rendered)
}

/// Device inventory listing.
pub fn render_devices(format: &OutputFormat, devices: &[Device]) -> Result<String, CliError> {
    render_list(format, devices, |d| DeviceRow::from(d), |d| d.to_string())
}

/// Temperature sensor readings.
pub fn render_readings(format: &OutputFormat, readings: &[Reading]) -> Result<String, CliError> {
    render_list(format, readings, |r| ReadingRow::from(r), Reading::line)
}

/// Print the rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Internal(format!("JSON serialization failed: {e}")))
}

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data)
        .map_err(|e| CliError::Internal(format!("YAML serialization failed: {e}")))
}
