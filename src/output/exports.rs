use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::analysis::ComprehensiveAnalysis;
use crate::config::OutputFormat;

use super::summary::render_summary;

/// Writes a triage report in the requested format.
pub fn export_analysis(
    analysis: &ComprehensiveAnalysis,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            writeln!(output, "{}", render_summary(analysis))?;
            Ok(())
        }
        OutputFormat::Json => export_json(analysis, pretty, output),
    }
}

pub fn export_json<T: Serialize + ?Sized>(value: &T, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}
