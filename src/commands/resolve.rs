use anyhow::Result;
use log::debug;
use std::io::Write;

use crate::context::OsdepsContext;

/// Writes the plan of `names`, as JSON or as indented sections.
pub fn print_plan<W: Write>(
    context: &OsdepsContext,
    names: &[String],
    json: bool,
    out: &mut W,
) -> Result<()> {
    let partition = context.partition(names)?;
    debug!(
        "native: [{}], secondary: [{}]",
        partition.native.join(", "),
        partition.secondary.join(", ")
    );
    let plan = context.build_partition(&partition)?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &plan)?;
        writeln!(out)?;
        return Ok(());
    }

    if plan.is_empty() {
        writeln!(out, "Nothing to install.")?;
        return Ok(());
    }
    if !plan.native_packages.is_empty() {
        writeln!(out, "OS packages:")?;
        for package in &plan.native_packages {
            writeln!(out, "  {}", package)?;
        }
    }
    if !plan.shell_snippets.is_empty() {
        writeln!(out, "Shell snippets:")?;
        for snippet in &plan.shell_snippets {
            for line in snippet.lines() {
                writeln!(out, "  {}", line)?;
            }
        }
    }
    if !plan.secondary_packages.is_empty() {
        writeln!(out, "Gems:")?;
        for package in &plan.secondary_packages {
            writeln!(out, "  {}", package)?;
        }
    }
    Ok(())
}
