//! Splitting requested dependencies between the native package manager and the
//! secondary one.

use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::alias::AliasTable;
use crate::definition::{Definition, DefinitionSet, Entry, SECONDARY};
use crate::error::OsdepsError;
use crate::os::OsIdentity;
use crate::resolver::os_names_match;

/// Result of [`partition`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Partition {
    /// Dependency names to resolve for the native package manager.
    pub native: Vec<String>,
    /// Package names for the secondary package manager.
    pub secondary: Vec<String>,
    /// Alias targets mapped to the name that was asked for.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub requested_as: BTreeMap<String, String>,
}

impl Partition {
    pub fn is_empty(&self) -> bool {
        self.native.is_empty() && self.secondary.is_empty()
    }

    /// `ruby (alias of ruby19)` for an alias target, `name` otherwise.
    pub fn label(&self, name: &str) -> String {
        label(&self.requested_as, name)
    }

    /// Rewrites the dependency named by `err` the way it was requested.
    pub fn report(&self, err: OsdepsError) -> OsdepsError {
        let label = err.dependency().map(|name| self.label(name));
        match label {
            Some(label) => err.with_dependency(label),
            None => err,
        }
    }
}

/// Splits `names` into native and secondary buckets.
///
/// Names go through `aliases` first and are deduplicated afterwards. A name
/// without any definition is classified as native: the resolver reports it as
/// missing later on. An unrecognized directive aborts the whole call.
///
/// A `gem` key below an OS entry is only lifted out when that entry is the one
/// the resolver would pick for `os`.
pub fn partition<I, S>(
    names: I,
    aliases: &AliasTable,
    definitions: &DefinitionSet,
    os: Option<&OsIdentity>,
) -> Result<Partition, OsdepsError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = Vec::<String>::new();
    let mut requested_as = BTreeMap::new();
    for name in names {
        let name = name.as_ref();
        let resolved = aliases.resolve(name);
        if seen.iter().any(|n| n == resolved) {
            continue;
        }
        if resolved != name {
            debug!("{} is an alias of {}", name, resolved);
            requested_as.insert(resolved.to_string(), name.to_string());
        }
        seen.push(resolved.to_string());
    }

    let mut result = Partition::default();
    for name in seen {
        let Some(definition) = definitions.get(&name) else {
            result.native.push(name);
            continue;
        };

        match definition {
            Definition::Ignore => debug!("Ignoring {}", name),
            Definition::Secondary => push_unique(&mut result.secondary, name),
            Definition::Directive(directive) => {
                return Err(OsdepsError::UnknownDirective {
                    directive: directive.clone(),
                    name: label(&requested_as, &name),
                });
            }
            Definition::Platforms(platforms) => {
                let host_entry = os.and_then(|os| {
                    platforms
                        .iter()
                        .position(|(names, _)| os_names_match(names, &os.name))
                });
                let mut has_native = false;
                for (index, (key, entry)) in platforms.iter().enumerate() {
                    if key == SECONDARY {
                        for package in entry.package_names() {
                            push_unique(&mut result.secondary, package);
                        }
                        continue;
                    }
                    let Entry::Versions(rules) = entry else {
                        has_native = true;
                        continue;
                    };
                    if host_entry != Some(index) {
                        has_native = true;
                        continue;
                    }
                    // The OS entry only stays native if rules other than gem remain.
                    let mut native_rules = rules.is_empty();
                    for rule in rules {
                        if rule.key == SECONDARY {
                            for package in rule.entry.package_names() {
                                push_unique(&mut result.secondary, package);
                            }
                        } else {
                            native_rules = true;
                        }
                    }
                    has_native |= native_rules;
                }
                if has_native {
                    result.native.push(name);
                }
            }
        }
    }

    result.requested_as = requested_as;
    Ok(result)
}

fn label(requested_as: &BTreeMap<String, String>, name: &str) -> String {
    match requested_as.get(name) {
        Some(requested) => format!("{} (alias of {})", requested, name),
        None => name.to_string(),
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
