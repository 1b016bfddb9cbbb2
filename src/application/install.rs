//! Install use case - orchestrates the dependency installation flow.
//!
//! This use case coordinates:
//! - Partitioning between native and secondary packages
//! - Plan building for the host OS
//! - Filtering of what is already installed
//! - Hand-off to an [`Installer`]

use anyhow::Result;
use log::{debug, info, warn};
use std::collections::BTreeSet;

use crate::context::OsdepsContext;
use crate::installed::{
    InstalledPackages, SecondaryQuery, filter_installed, filter_uptodate_secondary,
};
use crate::plan::{ResolvedPlan, SecondaryCommand, generate_script};

/// Options for the install use case
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Reinstall secondary packages that have a newer published version
    pub update: bool,
    /// Allow pre-release versions of secondary packages
    pub prerelease: bool,
}

/// Acts on the decisions of the install use case.
///
/// Nothing in the crate runs package managers itself: implementations decide
/// whether to execute, print or record what they are given.
#[cfg_attr(test, mockall::automock)]
pub trait Installer {
    /// Install `packages` natively by running `script`.
    fn run_script(&self, packages: &BTreeSet<String>, script: &str) -> Result<()>;

    /// Install `packages` through the secondary package manager.
    fn run_secondary(&self, packages: &BTreeSet<String>, command_line: &[String]) -> Result<()>;

    /// The host OS is not supported: `names` have to be installed by hand.
    fn install_manually(&self, names: &[String]) -> Result<()>;
}

/// Install use case - remembers what it already handled during the process.
pub struct InstallUseCase<'a> {
    context: &'a OsdepsContext,
    installer: &'a dyn Installer,
    installed: Option<&'a dyn InstalledPackages>,
    secondary: &'a dyn SecondaryQuery,
    options: InstallOptions,
    handled: BTreeSet<String>,
}

impl<'a> InstallUseCase<'a> {
    pub fn new(
        context: &'a OsdepsContext,
        installer: &'a dyn Installer,
        secondary: &'a dyn SecondaryQuery,
        options: InstallOptions,
    ) -> Self {
        Self {
            context,
            installer,
            installed: None,
            secondary,
            options,
            handled: BTreeSet::new(),
        }
    }

    /// Skip native packages `checker` reports as installed.
    pub fn with_installed_check(mut self, checker: &'a dyn InstalledPackages) -> Self {
        self.installed = Some(checker);
        self
    }

    /// Names already handed to the installer.
    pub fn handled(&self) -> &BTreeSet<String> {
        &self.handled
    }

    /// Installs `names`, skipping the ones handled by a previous call.
    ///
    /// Returns whether an install script or a secondary command was handed to
    /// the installer. Resolution errors abort before anything is handed off.
    #[tracing::instrument(skip(self))]
    pub fn install(&mut self, names: &[String]) -> Result<bool> {
        let pending: Vec<String> = names
            .iter()
            .filter(|name| !self.handled.contains(*name))
            .cloned()
            .collect();
        if pending.is_empty() {
            debug!("Nothing left to install");
            return Ok(false);
        }

        let partition = self.context.partition(&pending)?;
        let mut plan = if self.context.is_supported_os() {
            let mut plan = self.context.build_partition(&partition)?;
            if let Some(checker) = self.installed {
                plan.native_packages = filter_installed(&plan.native_packages, checker);
            }
            plan
        } else {
            if !partition.native.is_empty() {
                warn!(
                    "No automatic installation on this operating system for: {}",
                    partition.native.join(", ")
                );
                self.installer.install_manually(&partition.native)?;
                // The notice was given, a retry must not repeat it.
                let manual: Vec<String> = pending
                    .iter()
                    .filter(|name| {
                        let target = self.context.aliases().resolve(name);
                        partition.native.iter().any(|native| native == target)
                    })
                    .cloned()
                    .collect();
                self.handled.extend(manual);
            }
            ResolvedPlan {
                secondary_packages: partition.secondary.iter().cloned().collect(),
                ..Default::default()
            }
        };
        plan.secondary_packages =
            filter_uptodate_secondary(&plan.secondary_packages, self.secondary, self.options.update);

        let mut did_something = false;

        if plan.has_native_work()
            && let Some(os) = self.context.os()
            && let Some(script) = generate_script(self.context.commands(), &os.name, &plan)
        {
            info!("Installing OS packages: {}", join(&plan.native_packages));
            self.installer.run_script(&plan.native_packages, &script)?;
            did_something = true;
        }

        if !plan.secondary_packages.is_empty() {
            let command = SecondaryCommand {
                prerelease: self.options.prerelease,
                ..Default::default()
            };
            let command_line = command.command_line(&plan.secondary_packages);
            info!("Installing secondary packages: {}", join(&plan.secondary_packages));
            self.installer
                .run_secondary(&plan.secondary_packages, &command_line)?;
            did_something = true;
        }

        self.handled.extend(pending);
        Ok(did_something)
    }
}

fn join(packages: &BTreeSet<String>) -> String {
    packages.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::from_yaml_str;
    use crate::installed::{MockInstalledPackages, MockSecondaryQuery, NoSecondaryQuery};
    use crate::os::OsIdentity;
    use crate::plan::ROOT_PREAMBLE;
    use mockall::predicate::always;

    const DEFS: &str = "\
libxml2:
  debian: libxml2-dev
  haiku: libxml2
cmake:
  debian: cmake
rake: gem
nokogiri:
  debian: libxslt1-dev
  gem: nokogiri
";

    fn context(os: &str) -> OsdepsContext {
        let definitions = from_yaml_str(DEFS, None).unwrap();
        OsdepsContext::new(definitions, Some(os.parse().unwrap()))
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_install_native_and_secondary() {
        let ctx = context("debian:sid");
        let mut installer = MockInstaller::new();
        installer
            .expect_run_script()
            .withf(|packages, script| {
                packages.len() == 2
                    && script.starts_with("#! /bin/bash\n")
                    && script.contains(ROOT_PREAMBLE)
                    && script.contains("apt-get install -y 'libxml2-dev' 'libxslt1-dev'")
            })
            .times(1)
            .returning(|_, _| Ok(()));
        installer
            .expect_run_secondary()
            .withf(|_, command_line| command_line == ["gem", "install", "nokogiri", "rake"])
            .times(1)
            .returning(|_, _| Ok(()));
        installer.expect_install_manually().never();

        let mut use_case =
            InstallUseCase::new(&ctx, &installer, &NoSecondaryQuery, InstallOptions::default());
        assert!(use_case.install(&names(&["libxml2", "nokogiri", "rake"])).unwrap());
        assert_eq!(use_case.handled().len(), 3);
    }

    #[test]
    fn test_install_skips_handled_names() {
        let ctx = context("debian:sid");
        let mut installer = MockInstaller::new();
        installer
            .expect_run_script()
            .times(1)
            .returning(|_, _| Ok(()));

        let mut use_case =
            InstallUseCase::new(&ctx, &installer, &NoSecondaryQuery, InstallOptions::default());
        assert!(use_case.install(&names(&["cmake"])).unwrap());
        assert!(!use_case.install(&names(&["cmake"])).unwrap());
    }

    #[test]
    fn test_install_filters_installed_packages() {
        let ctx = context("debian:sid");
        let mut checker = MockInstalledPackages::new();
        checker.expect_is_installed().returning(|_| true);
        let mut installer = MockInstaller::new();
        installer.expect_run_script().never();
        installer.expect_run_secondary().never();

        let mut use_case =
            InstallUseCase::new(&ctx, &installer, &NoSecondaryQuery, InstallOptions::default())
                .with_installed_check(&checker);
        assert!(!use_case.install(&names(&["cmake", "libxml2"])).unwrap());
    }

    #[test]
    fn test_install_filters_uptodate_secondary() {
        let ctx = context("debian:sid");
        let mut query = MockSecondaryQuery::new();
        query
            .expect_installed_version()
            .returning(|_| Some("13.0.0".into()));
        query
            .expect_latest_version()
            .returning(|_| Some("13.1.0".into()));

        let mut installer = MockInstaller::new();
        installer.expect_run_secondary().never();
        let mut use_case =
            InstallUseCase::new(&ctx, &installer, &query, InstallOptions::default());
        assert!(!use_case.install(&names(&["rake"])).unwrap());

        let mut installer = MockInstaller::new();
        installer
            .expect_run_secondary()
            .withf(|_, command_line| command_line == ["gem", "install", "--prerelease", "rake"])
            .times(1)
            .returning(|_, _| Ok(()));
        let options = InstallOptions {
            update: true,
            prerelease: true,
        };
        let mut use_case = InstallUseCase::new(&ctx, &installer, &query, options);
        assert!(use_case.install(&names(&["rake"])).unwrap());
    }

    #[test]
    fn test_unsupported_os_falls_back_to_manual() {
        let ctx = context("haiku:r1");
        let mut installer = MockInstaller::new();
        installer
            .expect_install_manually()
            .withf(|names| names == ["libxml2"])
            .times(1)
            .returning(|_| Ok(()));
        installer.expect_run_script().never();
        installer
            .expect_run_secondary()
            .with(always(), always())
            .times(1)
            .returning(|_, _| Ok(()));

        let mut use_case =
            InstallUseCase::new(&ctx, &installer, &NoSecondaryQuery, InstallOptions::default());
        assert!(use_case.install(&names(&["libxml2", "rake"])).unwrap());
    }

    #[test]
    fn test_manual_names_are_handled_even_if_secondary_fails() {
        let ctx = context("haiku:r1");
        let mut installer = MockInstaller::new();
        installer
            .expect_install_manually()
            .times(1)
            .returning(|_| Ok(()));
        installer
            .expect_run_secondary()
            .times(2)
            .returning(|_, _| Err(anyhow::anyhow!("gem failed")));

        let mut use_case =
            InstallUseCase::new(&ctx, &installer, &NoSecondaryQuery, InstallOptions::default());
        assert!(use_case.install(&names(&["libxml2", "rake"])).is_err());
        assert!(use_case.handled().contains("libxml2"));
        assert!(!use_case.handled().contains("rake"));

        assert!(use_case.install(&names(&["libxml2", "rake"])).is_err());
    }

    #[test]
    fn test_resolution_error_aborts_before_hand_off() {
        let ctx = context("debian:sid");
        let mut installer = MockInstaller::new();
        installer.expect_run_script().never();
        installer.expect_run_secondary().never();

        let mut use_case =
            InstallUseCase::new(&ctx, &installer, &NoSecondaryQuery, InstallOptions::default());
        let err = use_case.install(&names(&["rake", "boost"])).unwrap_err();
        assert!(err.to_string().contains("boost"));
        assert!(use_case.handled().is_empty());
    }

    #[test]
    fn test_unknown_os_is_not_supported() {
        let definitions = from_yaml_str(DEFS, None).unwrap();
        let ctx = OsdepsContext::new(definitions, None::<OsIdentity>);
        let mut installer = MockInstaller::new();
        installer
            .expect_install_manually()
            .times(1)
            .returning(|_| Ok(()));

        let mut use_case =
            InstallUseCase::new(&ctx, &installer, &NoSecondaryQuery, InstallOptions::default());
        assert!(!use_case.install(&names(&["cmake"])).unwrap());
    }
}
