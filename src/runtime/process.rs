//! External commands.

use anyhow::{Context, Result, bail};
use std::process::Command;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn command_output_impl(&self, program: &str, args: &[String]) -> Result<String> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute {}", program))?;

        if !output.status.success() {
            bail!(
                "{} {} failed ({}): {}",
                program,
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
