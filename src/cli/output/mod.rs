//! CLI output formatting module
//!
//! Renders a finished result tree in the format chosen on the command line.
//! Rendering never alters the tree.

pub mod tree;

use anyhow::Result;

use crate::cli::types::OutputFormat;
use crate::domain::models::measurement::Measurement;
use crate::services::export::result_lines;

pub use tree::render_measurement_tree;

/// Render `root` for stdout.
pub fn render(root: &Measurement, format: OutputFormat, use_color: bool) -> Result<String> {
    Ok(match format {
        OutputFormat::Terminal => render_measurement_tree(root, use_color),
        OutputFormat::Result => {
            let mut out = result_lines(root).join("\n");
            if !out.is_empty() {
                out.push('\n');
            }
            out
        }
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(root)?;
            out.push('\n');
            out
        }
    })
}
