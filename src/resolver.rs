//! Resolution of one dependency for one operating system.
//!
//! Both the OS lookup and the version lookup use a first-applicable-rule
//! policy: entries are tried in the order they were written and the first one
//! that applies wins, even when a later one would be more specific. Version
//! patterns are unanchored regular expressions, so `6` matches `16.04`.

use serde::Serialize;

use crate::definition::{Definition, DefinitionSet, Entry, SECONDARY};
use crate::os::OsIdentity;

/// Outcome of resolving one dependency name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Resolution {
    /// No definition at all for this name.
    NoDefinition,
    /// The operating system could not be detected.
    UnknownOs,
    /// Defined, but not for this operating system.
    WrongOs,
    /// Defined for this operating system, but not for this version of it.
    WrongOsVersion,
    /// Nothing to install on this operating system.
    Ignore,
    /// Packages for the native package manager.
    Packages(Vec<String>),
    /// A shell fragment that installs the dependency.
    ShellSnippet(String),
}

impl Resolution {
    /// True for outcomes that can be acted on (or safely skipped).
    pub fn is_available(&self) -> bool {
        matches!(
            self,
            Resolution::Ignore | Resolution::Packages(_) | Resolution::ShellSnippet(_)
        )
    }
}

/// Resolves `name` against `definitions` for `os`.
pub fn resolve(name: &str, definitions: &DefinitionSet, os: Option<&OsIdentity>) -> Resolution {
    let Some(definition) = definitions.get(name) else {
        return Resolution::NoDefinition;
    };
    let Some(os) = os else {
        return Resolution::UnknownOs;
    };

    let platforms = match definition {
        Definition::Platforms(platforms) => platforms,
        // Nothing to do natively for these.
        Definition::Ignore | Definition::Secondary => return Resolution::Ignore,
        Definition::Directive(_) => return Resolution::WrongOs,
    };

    let Some((_, entry)) = platforms
        .iter()
        .find(|(names, _)| os_names_match(names, &os.name))
    else {
        return Resolution::WrongOs;
    };

    let entry = match entry {
        Entry::Versions(rules) => {
            let mut native_rules = rules.iter().filter(|rule| rule.key != SECONDARY);
            match native_rules.find(|rule| rule.matches(&os.version_tags)) {
                Some(rule) => &rule.entry,
                None => return Resolution::WrongOsVersion,
            }
        }
        other => other,
    };

    match entry {
        Entry::Ignore => Resolution::Ignore,
        Entry::Packages(names) => Resolution::Packages(names.clone()),
        Entry::Text(text) if has_word_char(text) => Resolution::Packages(vec![text.clone()]),
        Entry::Text(text) => Resolution::ShellSnippet(text.clone()),
        // Rejected when the definition was loaded.
        Entry::Versions(_) => Resolution::WrongOsVersion,
    }
}

/// `debian, Ubuntu` contains `ubuntu`.
pub(crate) fn os_names_match(names: &str, os_name: &str) -> bool {
    names
        .split(',')
        .any(|name| name.trim().to_lowercase() == os_name)
}

fn has_word_char(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphanumeric() || c == '_')
}
