//! Output formatting for CLI commands.

use crate::error::CliError;
use clap::ValueEnum;
use plantops_workflow::registry::{self, NodeCategory};
use plantops_workflow::ValidationReport;
use std::fmt::{self, Write};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Renders a validation report.
pub fn report(report: &ValidationReport, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Text => Ok(report.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(report).map_err(CliError::Encode),
    }
}

/// Renders the node palette grouped by category, optionally limited to one.
pub fn catalog(category: Option<NodeCategory>, format: OutputFormat) -> Result<String, CliError> {
    let groups: Vec<_> = registry::categories()
        .iter()
        .copied()
        .filter(|candidate| category.is_none_or(|category| *candidate == category))
        .collect();

    if format == OutputFormat::Json {
        let entries: Vec<_> = groups
            .iter()
            .flat_map(|group| registry::list_by_category(*group))
            .collect();
        return serde_json::to_string_pretty(&entries).map_err(CliError::Encode);
    }

    let mut out = String::new();
    write_palette(&mut out, &groups).map_err(CliError::Format)?;
    Ok(out)
}

fn write_palette(out: &mut impl Write, groups: &[NodeCategory]) -> fmt::Result {
    for group in groups {
        writeln!(out, "[{group}]")?;
        for descriptor in registry::list_by_category(*group) {
            writeln!(
                out,
                "  {:<13} {:<14} {}",
                descriptor.kind.as_str(),
                descriptor.label,
                descriptor.summary
            )?;
            let fields: Vec<_> = descriptor.fields.iter().map(|field| field.name).collect();
            if !fields.is_empty() {
                writeln!(out, "  {:<13} fields: {}", "", fields.join(", "))?;
            }
        }
    }
    Ok(())
}
