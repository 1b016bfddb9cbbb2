//! Installed-package checks used to drop work that is already done.
//!
//! Native packages are checked against the package database of the host when
//! one is known (dpkg on Debian and Ubuntu). Secondary packages are compared
//! with the latest published version when updates are requested.

use log::{debug, warn};
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::runtime::Runtime;

/// Default location of the dpkg database.
pub const DPKG_STATUS_FILE: &str = "/var/lib/dpkg/status";

const INSTALLED_STATUS: &str = "install ok installed";

static DEBIAN_PACKAGE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\w[a-z0-9+.-]+)").expect("valid package name pattern")
});

#[cfg_attr(test, mockall::automock)]
pub trait InstalledPackages {
    fn is_installed(&self, package: &str) -> bool;
}

/// Installed packages according to a dpkg status file, read on first use.
pub struct DpkgStatus<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
    installed: OnceCell<BTreeSet<String>>,
}

impl<'a, R: Runtime> DpkgStatus<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self::with_path(runtime, DPKG_STATUS_FILE)
    }

    pub fn with_path(runtime: &'a R, path: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            path: path.into(),
            installed: OnceCell::new(),
        }
    }

    fn installed(&self) -> &BTreeSet<String> {
        self.installed.get_or_init(|| match self.runtime.read_to_string(&self.path) {
            Ok(content) => {
                let installed = parse_dpkg_status(&content);
                debug!("{} package(s) installed according to {:?}", installed.len(), self.path);
                installed
            }
            Err(e) => {
                warn!("Cannot read the dpkg database: {:#}", e);
                BTreeSet::new()
            }
        })
    }
}

impl<R: Runtime> InstalledPackages for DpkgStatus<'_, R> {
    fn is_installed(&self, package: &str) -> bool {
        let Some(captures) = DEBIAN_PACKAGE_NAME.captures(package) else {
            warn!("{} is not a valid Debian package name", package);
            return false;
        };
        self.installed().contains(&captures[1])
    }
}

/// Names of the packages whose status is `install ok installed`.
pub fn parse_dpkg_status(content: &str) -> BTreeSet<String> {
    let mut installed = BTreeSet::new();
    let mut package: Option<&str> = None;

    for line in content.lines() {
        if line.trim().is_empty() {
            package = None;
        } else if let Some(name) = line.strip_prefix("Package:") {
            package = Some(name.trim());
        } else if let Some(status) = line.strip_prefix("Status:")
            && status.trim() == INSTALLED_STATUS
            && let Some(name) = package
        {
            installed.insert(name.to_string());
        }
    }
    installed
}

/// The installed-package check for `os_name`, if the OS has one.
pub fn checker_for<'a, R: Runtime>(
    runtime: &'a R,
    os_name: &str,
) -> Option<Box<dyn InstalledPackages + 'a>> {
    match os_name {
        "debian" | "ubuntu" => Some(Box::new(DpkgStatus::new(runtime))),
        _ => None,
    }
}

/// Drops the packages `checker` reports as installed.
pub fn filter_installed(
    packages: &BTreeSet<String>,
    checker: &dyn InstalledPackages,
) -> BTreeSet<String> {
    packages
        .iter()
        .filter(|package| {
            let installed = checker.is_installed(package);
            if installed {
                debug!("{} is already installed", package);
            }
            !installed
        })
        .cloned()
        .collect()
}

/// Versions known to the secondary package manager.
#[cfg_attr(test, mockall::automock)]
pub trait SecondaryQuery {
    /// Highest installed version, `None` when not installed.
    fn installed_version(&self, name: &str) -> Option<String>;
    /// Highest published version, `None` when unknown.
    fn latest_version(&self, name: &str) -> Option<String>;
}

/// Reports every package as missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSecondaryQuery;

impl SecondaryQuery for NoSecondaryQuery {
    fn installed_version(&self, _name: &str) -> Option<String> {
        None
    }

    fn latest_version(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Queries RubyGems through `gem list`.
pub struct GemQuery<'a, R: Runtime> {
    runtime: &'a R,
    program: String,
    prerelease: bool,
}

impl<'a, R: Runtime> GemQuery<'a, R> {
    pub fn new(runtime: &'a R, program: impl Into<String>, prerelease: bool) -> Self {
        Self {
            runtime,
            program: program.into(),
            prerelease,
        }
    }

    fn list(&self, name: &str, scope: &str) -> Option<String> {
        let mut args = vec!["list".to_string(), scope.to_string(), "--exact".to_string()];
        if self.prerelease && scope == "--remote" {
            args.push("--prerelease".to_string());
        }
        args.push(name.to_string());

        match self.runtime.command_output(&self.program, &args) {
            Ok(output) => highest_listed_version(&output, name),
            Err(e) => {
                warn!("Cannot query {} for {}: {:#}", self.program, name, e);
                None
            }
        }
    }
}

impl<R: Runtime> SecondaryQuery for GemQuery<'_, R> {
    fn installed_version(&self, name: &str) -> Option<String> {
        self.list(name, "--local")
    }

    fn latest_version(&self, name: &str) -> Option<String> {
        self.list(name, "--remote")
    }
}

/// Highest version on the `name (1.2.0, default: 1.1.0)` line of `gem list`.
fn highest_listed_version(output: &str, name: &str) -> Option<String> {
    let prefix = format!("{} (", name);
    let line = output.lines().find(|line| line.starts_with(&prefix))?;
    let versions = line.strip_prefix(&prefix)?.strip_suffix(')')?;
    versions
        .split(',')
        .map(|v| v.trim().trim_start_matches("default:").trim())
        .map(|v| v.split_whitespace().next().unwrap_or(v))
        .filter(|v| !v.is_empty())
        .max_by(|a, b| compare_versions(a, b))
        .map(str::to_string)
}

/// Drops secondary packages that need no work.
///
/// A package is kept when it is not installed, or when `check_updates` is set
/// and a newer version is published.
pub fn filter_uptodate_secondary(
    packages: &BTreeSet<String>,
    query: &dyn SecondaryQuery,
    check_updates: bool,
) -> BTreeSet<String> {
    packages
        .iter()
        .filter(|name| {
            let Some(installed) = query.installed_version(name) else {
                return true;
            };
            if !check_updates {
                debug!("{} {} is already installed", name, installed);
                return false;
            }
            match query.latest_version(name) {
                Some(latest) if compare_versions(&latest, &installed) == Ordering::Greater => {
                    debug!("{} can be updated from {} to {}", name, installed, latest);
                    true
                }
                _ => false,
            }
        })
        .cloned()
        .collect()
}

/// Segment-wise version comparison: numeric segments compare as numbers,
/// missing segments count as `0`, and a textual segment sorts before a
/// numeric one (`1.0.rc1 < 1.0.0`).
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<&str> = a.split('.').collect();
    let right: Vec<&str> = b.split('.').collect();

    for i in 0..left.len().max(right.len()) {
        let l = left.get(i).copied().unwrap_or("0");
        let r = right.get(i).copied().unwrap_or("0");
        let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
            (Ok(l), Ok(r)) => l.cmp(&r),
            (Ok(_), Err(_)) => Ordering::Greater,
            (Err(_), Ok(_)) => Ordering::Less,
            (Err(_), Err(_)) => l.cmp(r),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
