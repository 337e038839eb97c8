//! CQL command implementation

use crate::cli::CqlArgs;
use crate::output::OutputWriter;
use crate::output_types::CqlOutput;
use anyhow::Result;
use geopipes_pipeline::CqlFilter;

/// Syntax errors propagate and are rendered with a caret under the offending position
pub fn execute(args: CqlArgs, output: &OutputWriter) -> Result<()> {
    let filter = CqlFilter::compile(&args.expression)?;

    if output.is_json() {
        return output.result(CqlOutput {
            expression: filter.expression().to_string(),
            valid: true,
        });
    }

    output.success(format!("Valid CQL: {}", filter.expression()));
    Ok(())
}
