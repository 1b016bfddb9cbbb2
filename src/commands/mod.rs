use anyhow::Result;
use std::io;

use crate::runtime::Runtime;

pub mod config;
mod check;
mod os;
mod resolve;
mod script;

pub use check::check_with;
pub use os::print_os;
pub use resolve::print_plan;
pub use script::{ScriptOptions, ScriptPrinter, install_with};

use config::{Config, Options};

/// Print the detected (or overridden) operating system
#[tracing::instrument(skip(runtime, options))]
pub fn os<R: Runtime>(runtime: R, options: &Options) -> Result<()> {
    let config = Config::new(runtime, options)?;
    print_os(&config.context, &mut io::stdout())
}

/// Print the plan for `names`
#[tracing::instrument(skip(runtime, options))]
pub fn resolve<R: Runtime>(runtime: R, options: &Options, names: &[String], json: bool) -> Result<()> {
    let config = Config::new(runtime, options)?;
    print_plan(&config.context, names, json, &mut io::stdout())
}

/// Print the availability of `names`, failing when one is missing
#[tracing::instrument(skip(runtime, options))]
pub fn check<R: Runtime>(runtime: R, options: &Options, names: &[String]) -> Result<()> {
    let config = Config::new(runtime, options)?;
    check_with(&config.context, names, &mut io::stdout())
}

/// Print the install script and secondary command for `names`
#[tracing::instrument(skip(runtime, options))]
pub fn script<R: Runtime>(
    runtime: R,
    options: &Options,
    names: &[String],
    script_options: &ScriptOptions,
) -> Result<()> {
    let config = Config::new(runtime, options)?;
    let printer = ScriptPrinter::new(io::stdout());
    install_with(&config, names, script_options, &printer)
}
