use anyhow::Result;
use log::{info, warn};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::io::Write;

use crate::{
    application::{InstallOptions, InstallUseCase, Installer},
    installed::{GemQuery, NoSecondaryQuery, SecondaryQuery, checker_for},
    plan::SecondaryCommand,
    runtime::Runtime,
};

use super::config::Config;

#[derive(Debug, Clone, Default)]
pub struct ScriptOptions {
    /// Also reinstall gems that have a newer version
    pub update: bool,
    /// Allow pre-release gems
    pub prerelease: bool,
    /// Do not leave out what is already installed
    pub all: bool,
}

/// Installer that writes what it is given instead of running it.
///
/// The output is a shell script: the native install script first, then the
/// secondary command line. Names to install by hand become comments.
pub struct ScriptPrinter<W: Write> {
    out: RefCell<W>,
}

impl<W: Write> ScriptPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write> Installer for ScriptPrinter<W> {
    fn run_script(&self, _packages: &BTreeSet<String>, script: &str) -> Result<()> {
        let mut out = self.out.borrow_mut();
        out.write_all(script.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    fn run_secondary(&self, _packages: &BTreeSet<String>, command_line: &[String]) -> Result<()> {
        let mut out = self.out.borrow_mut();
        writeln!(out, "{}", command_line.join(" "))?;
        out.flush()?;
        Ok(())
    }

    fn install_manually(&self, names: &[String]) -> Result<()> {
        warn!(
            "The operating system is unknown or unsupported, install these yourself: {}",
            names.join(", ")
        );
        let mut out = self.out.borrow_mut();
        writeln!(out, "# To be installed manually:")?;
        for name in names {
            writeln!(out, "#   {}", name)?;
        }
        Ok(())
    }
}

/// Runs the install use case for `names` with `installer`.
pub fn install_with<R: Runtime>(
    config: &Config<R>,
    names: &[String],
    options: &ScriptOptions,
    installer: &dyn Installer,
) -> Result<()> {
    let checker = if options.all {
        None
    } else {
        config
            .context
            .os()
            .and_then(|os| checker_for(&config.runtime, &os.name))
    };
    let gem_query = GemQuery::new(
        &config.runtime,
        SecondaryCommand::default().program,
        options.prerelease,
    );
    let secondary: &dyn SecondaryQuery = if options.all {
        &NoSecondaryQuery
    } else {
        &gem_query
    };

    let install_options = InstallOptions {
        update: options.update,
        prerelease: options.prerelease,
    };
    let mut use_case = InstallUseCase::new(&config.context, installer, secondary, install_options);
    if let Some(checker) = checker.as_deref() {
        use_case = use_case.with_installed_check(checker);
    }

    if !use_case.install(names)? {
        info!("Nothing to install.");
    }
    Ok(())
}
