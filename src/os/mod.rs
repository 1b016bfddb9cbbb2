//! Operating system identity.
//!
//! An [`OsIdentity`] is the lookup key for definitions: a lowercase family name
//! plus a pool of version tags (codename, version number, ...). Detection lives
//! in [`detect`]; everything else only reads the value.

mod detect;

use anyhow::Result;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub use detect::{OsDetector, OsReleaseDetector};

#[cfg(test)]
pub use detect::MockOsDetector;

/// Detected operating system: family name and version tags, all lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsIdentity {
    pub name: String,
    pub version_tags: BTreeSet<String>,
}

impl OsIdentity {
    pub fn new<I, S>(name: &str, version_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.trim().to_lowercase(),
            version_tags: version_tags
                .into_iter()
                .map(|tag| tag.as_ref().trim().to_lowercase())
                .filter(|tag| !tag.is_empty())
                .collect(),
        }
    }
}

impl fmt::Display for OsIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version_tags.is_empty() {
            write!(f, "{}", self.name)
        } else {
            let tags: Vec<&str> = self.version_tags.iter().map(String::as_str).collect();
            write!(f, "{}:{}", self.name, tags.join(","))
        }
    }
}

/// Parses `name` or `name:tag1,tag2`.
impl FromStr for OsIdentity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, tags) = match s.split_once(':') {
            Some((name, tags)) => (name, tags),
            None => (s, ""),
        };
        if name.trim().is_empty() {
            anyhow::bail!("Invalid operating system '{}'. Expected 'name' or 'name:version,...'.", s)
        }
        Ok(OsIdentity::new(name, tags.split(',')))
    }
}
