//! Output formatting utilities

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::OutputFormat;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Table
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// Print a single record as YAML or JSON
pub fn print_record<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match effective_format(format, false) {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let yaml = serde_yml::to_string(value).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

/// Print list rows in the requested format
///
/// `id_of` extracts the value printed by `--format id`.
pub fn print_rows<R>(rows: &[R], format: OutputFormat, id_of: impl Fn(&R) -> String) -> Result<()>
where
    R: Tabled + Serialize,
{
    match effective_format(format, true) {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(rows).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(rows).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                writer.serialize(row).into_diagnostic()?;
            }
            writer.flush().into_diagnostic()?;
        }
        OutputFormat::Id => {
            for row in rows {
                println!("{}", id_of(row));
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            let mut table = Table::new(rows);
            table.with(Style::sharp());
            println!("{}", table);
        }
    }
    Ok(())
}
