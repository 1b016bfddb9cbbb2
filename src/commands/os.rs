use anyhow::Result;
use std::io::Write;

use crate::context::OsdepsContext;

/// `name:tags`, then whether packages can be installed automatically.
pub fn print_os<W: Write>(context: &OsdepsContext, out: &mut W) -> Result<()> {
    match context.os() {
        Some(os) => {
            writeln!(out, "{}", os)?;
            if !context.is_supported_os() {
                writeln!(out, "(no automatic package installation on {})", os.name)?;
            }
        }
        None => writeln!(out, "unknown")?,
    }
    Ok(())
}
