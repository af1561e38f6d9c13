/// Output formatting: table, record, JSON and bare-value modes. TTY detection.
use std::io::{self, IsTerminal, Write};

use colored::Colorize;
use comfy_table::{Cell, Table, presets::UTF8_BORDERS_ONLY};
use serde::Serialize;
use serde_json::{Value, json};

use super::args::{OutputArgs, OutputFormat};
use crate::format::{RecordResult, TableResult, cell_text};
use crate::types::{ErrorOutput, Outcome};

/// Resolve the effective output format, handling `--json` flag and TTY auto-detection.
#[must_use]
pub fn resolve_format(fmt: OutputFormat, json_flag: bool) -> OutputFormat {
    if json_flag {
        return OutputFormat::Json;
    }
    if fmt == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        fmt
    }
}

/// Output context passed to all formatters.
pub struct OutputCtx {
    pub format: OutputFormat,
    pub fields: Option<Vec<String>>,
    pub no_header: bool,
}

impl OutputCtx {
    /// Construct from a command's output flags.
    #[must_use]
    pub fn new(args: &OutputArgs) -> Self {
        let format = resolve_format(args.output, args.json);
        let fields = args
            .fields
            .as_deref()
            .map(|f| f.split(',').map(str::trim).map(str::to_owned).collect());
        Self {
            format,
            fields,
            no_header: args.no_header,
        }
    }

    /// A context with a fixed format, no projection and headers on.
    #[cfg(test)]
    #[must_use]
    pub fn with_format(format: OutputFormat) -> Self {
        Self {
            format,
            fields: None,
            no_header: false,
        }
    }

    /// Whether markers should be painted: only for human-readable tables and records.
    #[must_use]
    pub fn colors(&self) -> bool {
        matches!(self.format, OutputFormat::Table | OutputFormat::Auto)
    }

    fn is_json(&self) -> bool {
        matches!(
            self.format,
            OutputFormat::Json | OutputFormat::Compact | OutputFormat::Ndjson
        )
    }
}

/// Render a command outcome.
///
/// # Errors
///
/// Returns any I/O error from `out`.
pub fn write_outcome(outcome: &Outcome, ctx: &OutputCtx, out: &mut dyn Write) -> io::Result<()> {
    match outcome {
        Outcome::Done => Ok(()),
        Outcome::Success(message) => write_success(message, ctx, out),
        Outcome::Text(text) => writeln!(out, "{}", text.trim_end()),
        Outcome::Table(table) => match &ctx.fields {
            Some(fields) => write_table(&table.clone().project(fields), ctx, out),
            None => write_table(table, ctx, out),
        },
        Outcome::Record(record) => match &ctx.fields {
            Some(fields) => write_record(&record.clone().project(fields), ctx, out),
            None => write_record(record, ctx, out),
        },
    }
}

// --- Success confirmations ---

fn write_success(message: &str, ctx: &OutputCtx, out: &mut dyn Write) -> io::Result<()> {
    if ctx.is_json() {
        let body = json!({"ok": true, "message": message});
        write_json(&body, ctx.format, out)
    } else {
        writeln!(out, "{} {message}", "SUCCESS".green())
    }
}

// --- Tables ---

fn write_table(table: &TableResult, ctx: &OutputCtx, out: &mut dyn Write) -> io::Result<()> {
    match ctx.format {
        OutputFormat::Json | OutputFormat::Compact => {
            write_json(&table.to_objects(), ctx.format, out)
        }
        OutputFormat::Ndjson => write_ndjson(&table.to_objects(), out),
        OutputFormat::Value => {
            for row in &table.rows {
                let cells: Vec<String> = row.iter().map(cell_text).collect();
                writeln!(out, "{}", cells.join(" "))?;
            }
            Ok(())
        }
        OutputFormat::Table | OutputFormat::Auto => {
            let mut rendered = Table::new();
            rendered.load_preset(UTF8_BORDERS_ONLY);
            if !ctx.no_header {
                rendered.set_header(table.labels());
            }
            for row in &table.rows {
                rendered.add_row(row.iter().map(|v| Cell::new(cell_text(v))));
            }
            writeln!(out, "{rendered}")
        }
    }
}

// --- Records ---

fn write_record(record: &RecordResult, ctx: &OutputCtx, out: &mut dyn Write) -> io::Result<()> {
    match ctx.format {
        OutputFormat::Json | OutputFormat::Compact => {
            write_json(&record.to_object(), ctx.format, out)
        }
        OutputFormat::Ndjson => write_ndjson(&[record.to_object()], out),
        OutputFormat::Value => {
            for value in record.values() {
                writeln!(out, "{}", cell_text(&value))?;
            }
            Ok(())
        }
        OutputFormat::Table | OutputFormat::Auto => {
            let mut rendered = Table::new();
            rendered.load_preset(UTF8_BORDERS_ONLY);
            if !ctx.no_header {
                rendered.set_header(["Field", "Value"]);
            }
            for (column, value) in &record.fields {
                rendered.add_row([column.label(), cell_text(value)]);
            }
            writeln!(out, "{rendered}")
        }
    }
}

// --- Error output ---

/// Write a structured error.
pub fn write_error(err: &ErrorOutput, format: OutputFormat, out: &mut dyn Write) {
    match format {
        OutputFormat::Json | OutputFormat::Compact | OutputFormat::Ndjson => {
            let s = serde_json::to_string_pretty(err).unwrap_or_default();
            let _ = writeln!(out, "{s}");
        }
        _ => {
            let _ = writeln!(out, "Error: {}", err.error.message);
            if let Some(candidates) = &err.error.candidates {
                if !candidates.is_empty() {
                    let _ = writeln!(out, "  Did you mean:");
                    for c in candidates {
                        let _ = writeln!(out, "    {c}");
                    }
                }
            }
        }
    }
}

// --- Generic JSON helpers ---

fn write_json<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
    out: &mut dyn Write,
) -> io::Result<()> {
    let rendered = if format == OutputFormat::Compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    match rendered {
        Ok(s) => writeln!(out, "{s}"),
        Err(e) => writeln!(io::stderr(), "JSON serialization error: {e}"),
    }
}

fn write_ndjson(values: &[Value], out: &mut dyn Write) -> io::Result<()> {
    for v in values {
        writeln!(out, "{v}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ColumnSpec, to_record, to_table};

    fn render(outcome: &Outcome, ctx: &OutputCtx) -> String {
        let mut buf = Vec::new();
        write_outcome(outcome, ctx, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn nodes() -> TableResult {
        let items = vec![
            json!({"name": "n1", "ip": "10.0.0.1"}),
            json!({"name": "n2", "ip": null}),
        ];
        to_table(&items, &[ColumnSpec::new("name"), ColumnSpec::new("ip").labeled("IP")])
    }

    #[test]
    fn test_table_mode_prints_headers_and_cells() {
        let text = render(&Outcome::Table(nodes()), &OutputCtx::with_format(OutputFormat::Table));
        assert!(text.contains("Name"));
        assert!(text.contains("IP"));
        assert!(text.lines().any(|l| l.contains("n1") && l.contains("10.0.0.1")));
    }

    #[test]
    fn test_no_header() {
        let mut ctx = OutputCtx::with_format(OutputFormat::Table);
        ctx.no_header = true;
        let text = render(&Outcome::Table(nodes()), &ctx);
        assert!(!text.contains("Name"));
        assert!(text.contains("n2"));
    }

    #[test]
    fn test_json_mode_uses_labels() {
        let text = render(&Outcome::Table(nodes()), &OutputCtx::with_format(OutputFormat::Json));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!([{"Name": "n1", "IP": "10.0.0.1"}, {"Name": "n2", "IP": null}]));
    }

    #[test]
    fn test_value_mode_and_projection() {
        let mut ctx = OutputCtx::with_format(OutputFormat::Value);
        ctx.fields = Some(vec!["name".to_owned()]);
        let text = render(&Outcome::Table(nodes()), &ctx);
        assert_eq!(text, "n1\nn2\n");
    }

    #[test]
    fn test_record_json() {
        let record = to_record(&json!({"status": "green"}), &[ColumnSpec::new("status")]);
        let text = render(&Outcome::Record(record), &OutputCtx::with_format(OutputFormat::Compact));
        assert_eq!(text.trim(), r#"{"Status":"green"}"#);
    }

    #[test]
    fn test_success_json_and_done() {
        let ctx = OutputCtx::with_format(OutputFormat::Compact);
        let text = render(&Outcome::Success("Index logs created".to_owned()), &ctx);
        assert_eq!(text.trim(), r#"{"ok":true,"message":"Index logs created"}"#);
        assert_eq!(render(&Outcome::Done, &ctx), "");
    }

    #[test]
    fn test_colors_only_for_tables() {
        assert!(OutputCtx::with_format(OutputFormat::Table).colors());
        for format in [
            OutputFormat::Json,
            OutputFormat::Compact,
            OutputFormat::Ndjson,
            OutputFormat::Value,
        ] {
            assert!(!OutputCtx::with_format(format).colors(), "{format:?}");
        }
    }

    #[test]
    fn test_write_error_lists_candidates() {
        let err = crate::errors::CliError::UnknownCommand {
            input: "snapshot".to_owned(),
            candidates: vec!["snapshot list".to_owned(), "snapshot show".to_owned()],
        };
        let mut buf = Vec::new();
        write_error(&ErrorOutput::from_cli_error(&err), OutputFormat::Table, &mut buf);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Error: Unknown command 'snapshot'"));
        assert!(text.contains("    snapshot show"));
    }
}
