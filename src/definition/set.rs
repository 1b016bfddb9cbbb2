//! Definition set: merged definitions plus the file each one came from.

use log::warn;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::Definition;
use crate::error::OsdepsError;

/// A definition overridden by a later source during [`DefinitionSet::merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    pub name: String,
    pub previous: Option<PathBuf>,
    pub replacement: Option<PathBuf>,
}

impl fmt::Display for MergeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "osdeps definition for {}, previously defined in {} overridden by {}",
            self.name,
            display_source(self.previous.as_deref()),
            display_source(self.replacement.as_deref()),
        )
    }
}

fn display_source(source: Option<&Path>) -> String {
    source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}

/// All known definitions, keyed by dependency name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionSet {
    definitions: BTreeMap<String, Definition>,
    sources: BTreeMap<String, PathBuf>,
}

impl DefinitionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a whole document and builds a set from it.
    ///
    /// Any malformed entry fails the whole document. A null document (empty
    /// file) gives an empty set.
    pub fn from_value(value: &Value, source: Option<&Path>) -> Result<Self, OsdepsError> {
        let source_name = display_source(source);
        let mapping = match value {
            Value::Null => return Ok(Self::new()),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(OsdepsError::malformed(
                    source_name,
                    "/",
                    "expected a mapping from dependency names to definitions",
                ));
            }
        };

        let mut set = Self::new();
        for (key, value) in mapping {
            let name = match key {
                Value::String(s) if !s.trim().is_empty() => s.clone(),
                _ => {
                    return Err(OsdepsError::malformed(
                        source_name,
                        "/",
                        "dependency names must be non-empty strings. Don't forget to put quotes around numbers",
                    ));
                }
            };
            let definition = Definition::from_value(&name, value, &source_name)?;
            set.insert(name, definition, source.map(Path::to_path_buf));
        }
        Ok(set)
    }

    /// Adds or replaces one definition.
    pub fn insert(&mut self, name: impl Into<String>, definition: Definition, source: Option<PathBuf>) {
        let name = name.into();
        match source {
            Some(source) => {
                self.sources.insert(name.clone(), source);
            }
            None => {
                self.sources.remove(&name);
            }
        }
        self.definitions.insert(name, definition);
    }

    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// File the definition of `name` was taken from.
    pub fn source_of(&self, name: &str) -> Option<&Path> {
        self.sources.get(name).map(PathBuf::as_path)
    }

    /// Merges `other` into `self`; definitions of `other` take precedence.
    ///
    /// Every definition that actually changes is logged as a warning and
    /// returned. `root_dir` is stripped from the reported sources.
    pub fn merge(&mut self, other: DefinitionSet, root_dir: Option<&Path>) -> Vec<MergeConflict> {
        let mut conflicts = Vec::new();
        let DefinitionSet {
            definitions,
            sources,
        } = other;

        for (name, definition) in definitions {
            if let Some(current) = self.definitions.get(&name)
                && *current != definition
            {
                let conflict = MergeConflict {
                    previous: self.source_of(&name).map(|p| relative_to(p, root_dir)),
                    replacement: sources.get(&name).map(|p| relative_to(p, root_dir)),
                    name: name.clone(),
                };
                warn!("{}", conflict);
                conflicts.push(conflict);
            }
            self.definitions.insert(name, definition);
        }
        self.sources.extend(sources);

        conflicts
    }
}

fn relative_to(path: &Path, root_dir: Option<&Path>) -> PathBuf {
    root_dir
        .and_then(|root| path.strip_prefix(root).ok())
        .unwrap_or(path)
        .to_path_buf()
}
