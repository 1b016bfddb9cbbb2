use anyhow::{Result, bail};
use std::io::Write;

use crate::context::OsdepsContext;
use crate::plan::Availability;
use crate::resolver::Resolution;

/// Writes one line per name and fails when any of them is missing.
pub fn check_with<W: Write>(context: &OsdepsContext, names: &[String], out: &mut W) -> Result<()> {
    let mut missing = 0;
    for name in names {
        match context.availability_of(name)? {
            Availability::Available => writeln!(out, "{}: available", name)?,
            Availability::Missing(resolution) => {
                missing += 1;
                writeln!(out, "{}: missing ({})", name, reason(&resolution))?;
            }
        }
    }

    if missing > 0 {
        bail!("{} of {} dependencies cannot be installed", missing, names.len());
    }
    Ok(())
}

fn reason(resolution: &Resolution) -> &'static str {
    match resolution {
        Resolution::NoDefinition => "no definition",
        Resolution::UnknownOs => "unknown operating system",
        Resolution::WrongOs => "not defined for this operating system",
        Resolution::WrongOsVersion => "not defined for this operating system version",
        Resolution::Ignore | Resolution::Packages(_) | Resolution::ShellSnippet(_) => "available",
    }
}
