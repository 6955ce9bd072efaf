// Output formatting for CLI

use crate::cli::CliResult;
use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Pretty,
    /// Compact JSON, one document per line
    Json,
    /// Flattened key: value lines
    KeyValue,
    /// Aligned table
    Table,
}

/// Format and output data
pub struct OutputFormatter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Serialize and output one record
    pub fn output<T: Serialize>(&self, record: &T, writer: &mut dyn Write) -> CliResult<()> {
        let value = serde_json::to_value(record)?;
        self.output_value(&value, writer)
    }

    /// Output a JSON value
    pub fn output_value(&self, value: &serde_json::Value, writer: &mut dyn Write) -> CliResult<()> {
        match self.format {
            OutputFormat::Pretty => {
                writeln!(writer, "{}", serde_json::to_string_pretty(value)?)?;
            }
            OutputFormat::Json => {
                writeln!(writer, "{}", serde_json::to_string(value)?)?;
            }
            OutputFormat::KeyValue => {
                for (key, value) in flatten(value) {
                    writeln!(writer, "{}: {}", key, value)?;
                }
                writeln!(writer)?;
            }
            OutputFormat::Table => {
                self.output_table(value, writer)?;
            }
        }
        Ok(())
    }

    /// Output as table
    fn output_table(&self, value: &serde_json::Value, writer: &mut dyn Write) -> CliResult<()> {
        let rows = flatten(value);
        let max_key_len = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

        writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;
        for (key, value) in &rows {
            writeln!(
                writer,
                "{:<width$} {}",
                format!("{}:", key),
                value,
                width = max_key_len + 1
            )?;
        }
        writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;
        Ok(())
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if !self.quiet {
            eprintln!("  {}", message);
        }
    }
}

/// Flatten nested objects into sorted `a.b` keys
fn flatten(value: &serde_json::Value) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    flatten_into(String::new(), value, &mut rows);
    rows
}

fn flatten_into(prefix: String, value: &serde_json::Value, rows: &mut Vec<(String, String)>) {
    match value {
        serde_json::Value::Object(obj) => {
            let mut items: Vec<_> = obj.iter().collect();
            items.sort_by(|a, b| a.0.cmp(b.0));
            for (key, value) in items {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(key, value, rows);
            }
        }
        other => rows.push((prefix, format_value(other))),
    }
}

/// Format a scalar JSON value for display
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "(none)".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Array(arr) => arr
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(", "),
        serde_json::Value::Object(obj) => format!("{{{} items}}", obj.len()),
    }
}

/// Progress indicator for batch operations
pub struct ProgressBar {
    total: usize,
    current: usize,
    show: bool,
}

impl ProgressBar {
    pub fn new(total: usize, show: bool) -> Self {
        Self {
            total,
            current: 0,
            show,
        }
    }

    pub fn increment(&mut self) {
        self.current += 1;
        if self.show && self.total > 0 {
            let percent = (self.current * 100) / self.total;
            eprint!("\r[{}/{}] ({}%)", self.current, self.total, percent);
            if self.current == self.total {
                eprintln!();
            }
            std::io::stderr().flush().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(format: OutputFormat, value: &serde_json::Value) -> String {
        let mut out = Vec::new();
        OutputFormatter::new(format, true)
            .output_value(value, &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_key_value_flattens() {
        let value = json!({
            "title": "Gong",
            "tags": {"artist": null, "containers": {"id3v1": true}},
        });
        assert_eq!(
            render(OutputFormat::KeyValue, &value),
            "tags.artist: (none)\ntags.containers.id3v1: true\ntitle: Gong\n\n"
        );
    }

    #[test]
    fn test_json_compact() {
        let value = json!({"title": "Gong"});
        assert_eq!(render(OutputFormat::Json, &value), "{\"title\":\"Gong\"}\n");
    }

    #[test]
    fn test_table() {
        let value = json!({"a": 1, "bbb": ["x", "y"]});
        let table = render(OutputFormat::Table, &value);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[1], "a:   1");
        assert_eq!(lines[2], "bbb: x, y");
    }
}
