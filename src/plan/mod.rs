//! Aggregating resolutions into an installation plan.

mod script;

use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::alias::AliasTable;
use crate::definition::DefinitionSet;
use crate::error::OsdepsError;
use crate::os::OsIdentity;
use crate::partition::partition;
use crate::resolver::{Resolution, resolve};

pub use script::{InstallCommands, PACKAGES_SLOT, ROOT_PREAMBLE, SecondaryCommand, generate_script};

/// Everything to install for a batch of dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedPlan {
    /// Packages for the native package manager.
    pub native_packages: BTreeSet<String>,
    /// Shell fragments, in request order.
    pub shell_snippets: Vec<String>,
    /// Packages for the secondary package manager.
    pub secondary_packages: BTreeSet<String>,
}

impl ResolvedPlan {
    pub fn is_empty(&self) -> bool {
        !self.has_native_work() && self.secondary_packages.is_empty()
    }

    /// True when there is something for the install script to do.
    pub fn has_native_work(&self) -> bool {
        !self.native_packages.is_empty() || !self.shell_snippets.is_empty()
    }
}

/// Resolves every native name and collects the results.
///
/// Fails on the first name that cannot be resolved, then with
/// [`OsdepsError::UnsupportedOs`] when native names were requested for an OS
/// without install command. A partial plan is never returned.
pub fn build_plan(
    native: &[String],
    secondary: &[String],
    definitions: &DefinitionSet,
    os: Option<&OsIdentity>,
    commands: &InstallCommands,
) -> Result<ResolvedPlan, OsdepsError> {
    let os_label = || {
        os.map(ToString::to_string)
            .unwrap_or_else(|| "unknown".to_string())
    };

    let mut plan = ResolvedPlan {
        secondary_packages: secondary.iter().cloned().collect(),
        ..Default::default()
    };

    for name in native {
        match resolve(name, definitions, os) {
            Resolution::NoDefinition => {
                return Err(OsdepsError::NoDefinition { name: name.clone() });
            }
            Resolution::UnknownOs => return Err(OsdepsError::UnknownOs { name: name.clone() }),
            Resolution::WrongOs => {
                return Err(OsdepsError::WrongOs {
                    name: name.clone(),
                    os: os_label(),
                });
            }
            Resolution::WrongOsVersion => {
                return Err(OsdepsError::WrongOsVersion {
                    name: name.clone(),
                    os: os_label(),
                });
            }
            Resolution::Ignore => debug!("{} needs nothing on {}", name, os_label()),
            Resolution::Packages(packages) => {
                debug!("{} resolves to {}", name, packages.join(", "));
                plan.native_packages.extend(packages);
            }
            Resolution::ShellSnippet(snippet) => plan.shell_snippets.push(snippet),
        }
    }

    if let Some(os) = os
        && !native.is_empty()
        && !commands.is_supported(&os.name)
    {
        return Err(OsdepsError::UnsupportedOs { os: os.name.clone() });
    }

    Ok(plan)
}

/// Whether a single dependency can be satisfied on this OS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "resolution", rename_all = "snake_case")]
pub enum Availability {
    Available,
    Missing(Resolution),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// Checks one dependency the way an install would see it.
///
/// Names that do not end up in the native bucket (ignored or secondary) are
/// always available.
pub fn availability_of(
    name: &str,
    aliases: &AliasTable,
    definitions: &DefinitionSet,
    os: Option<&OsIdentity>,
) -> Result<Availability, OsdepsError> {
    let partition = partition([name], aliases, definitions, os)?;
    let Some(native) = partition.native.first() else {
        return Ok(Availability::Available);
    };

    let resolution = resolve(native, definitions, os);
    if resolution.is_available() {
        Ok(Availability::Available)
    } else {
        Ok(Availability::Missing(resolution))
    }
}

/// Shortcut for [`availability_of`]; errors count as unavailable.
pub fn has(
    name: &str,
    aliases: &AliasTable,
    definitions: &DefinitionSet,
    os: Option<&OsIdentity>,
) -> bool {
    availability_of(name, aliases, definitions, os).is_ok_and(|availability| availability.is_available())
}
