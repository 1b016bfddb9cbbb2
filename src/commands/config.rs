use anyhow::Result;
use log::{debug, info};
use std::path::PathBuf;

use crate::{
    alias::AliasTable,
    context::OsdepsContext,
    definition::{DefinitionSources, MergeConflict, load_sources},
    os::{OsDetector, OsIdentity, OsReleaseDetector},
    runtime::Runtime,
};

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Extra definition files, merged in order over the defaults.
    pub definitions: Vec<PathBuf>,
    /// Skip the default definitions.
    pub no_default: bool,
    /// Stripped from file names in override warnings.
    pub root: Option<PathBuf>,
    /// Bypasses OS detection.
    pub os: Option<OsIdentity>,
    /// `(requested, target)` pairs.
    pub aliases: Vec<(String, String)>,
    /// Selects the `ruby` alias (`ruby18` or `ruby19`).
    pub ruby_version: Option<String>,
}

pub struct Config<R: Runtime> {
    pub runtime: R,
    pub context: OsdepsContext,
    pub conflicts: Vec<MergeConflict>,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, options: &Options) -> Result<Self> {
        let os = match &options.os {
            Some(os) => Some(os.clone()),
            None => OsReleaseDetector::new(&runtime).detect(),
        };
        Self::with_os(runtime, options, os)
    }

    /// Like [`Config::new`], asking `detector` when no OS was given.
    pub fn with_detector(runtime: R, options: &Options, detector: &dyn OsDetector) -> Result<Self> {
        let os = options.os.clone().or_else(|| detector.detect());
        Self::with_os(runtime, options, os)
    }

    fn with_os(runtime: R, options: &Options, os: Option<OsIdentity>) -> Result<Self> {
        let sources = DefinitionSources {
            include_default: !options.no_default,
            files: options.definitions.clone(),
            include_user: true,
            root_dir: options.root.clone(),
        };
        let (definitions, conflicts) = load_sources(&runtime, &sources)?;
        debug!("{} definition(s) loaded", definitions.len());

        let mut aliases = AliasTable::new();
        if let Some(version) = &options.ruby_version {
            aliases.register_ruby(version);
        }
        for (requested, target) in &options.aliases {
            aliases.register(target.clone(), requested.clone());
        }

        match &os {
            Some(os) => info!("Operating system: {}", os),
            None => info!("Operating system: unknown"),
        }

        Ok(Self {
            runtime,
            context: OsdepsContext::new(definitions, os).with_aliases(aliases),
            conflicts,
        })
    }
}
