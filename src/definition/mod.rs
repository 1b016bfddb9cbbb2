//! Dependency definitions.
//!
//! A definition says how a dependency is obtained: skipped, delegated to the
//! secondary package manager, or installed natively with OS (and optionally OS
//! version) specific packages. Raw YAML only becomes a [`Definition`] through
//! validation, so a tree that made it into a [`DefinitionSet`] never has to be
//! checked again at resolution time.
//!
//! ```yaml
//! libxml2:
//!   debian,ubuntu: libxml2-dev
//!   gentoo: dev-libs/libxml2
//! nokogiri: gem
//! ruby:
//!   debian:
//!     sid,unstable: [ruby1.9.1, ruby1.9.1-dev]
//!     "6.0": ruby1.8-dev
//!   gem: rake
//! ```

mod loader;
mod set;

use regex::Regex;
use serde_yaml::Value;

use crate::error::OsdepsError;

pub use loader::{
    DEFAULT_DEFINITIONS_ENV, DefinitionSources, builtin_definitions, from_yaml_str, load_default,
    load_file, load_sources, user_definitions_path,
};
pub use set::{DefinitionSet, MergeConflict};

/// Directive meaning "skip this dependency".
pub const IGNORE: &str = "ignore";
/// Directive (and platform key) meaning "install through the secondary package manager".
pub const SECONDARY: &str = "gem";

/// Top-level definition of one dependency.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// `ignore`: nothing to install anywhere.
    Ignore,
    /// `gem`: a secondary package with the same name as the dependency.
    Secondary,
    /// Any other literal. Accepted at load time, rejected when partitioned.
    Directive(String),
    /// Ordered mapping from a comma separated OS name list to an entry.
    Platforms(Vec<(String, Entry)>),
}

/// What a platform key (or a version key) maps to.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// `~`, empty, or `ignore`.
    Ignore,
    /// A list of package names.
    Packages(Vec<String>),
    /// A package name, or a shell snippet when it has no word character.
    Text(String),
    /// Version specific entries, first matching rule wins.
    Versions(Vec<VersionRule>),
}

/// One version key: comma separated regular expressions and the entry they select.
#[derive(Debug, Clone)]
pub struct VersionRule {
    pub key: String,
    pub patterns: Vec<Regex>,
    pub entry: Entry,
}

impl PartialEq for VersionRule {
    // Patterns are compiled from the key.
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.entry == other.entry
    }
}

impl VersionRule {
    /// True when any pattern matches anywhere in any of the tags.
    pub fn matches<'a, I>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = &'a String> + Clone,
    {
        self.patterns
            .iter()
            .any(|pattern| tags.clone().into_iter().any(|tag| pattern.is_match(tag)))
    }
}

impl Definition {
    /// Validates `value` and builds the definition of `name`.
    ///
    /// `source` only appears in error messages.
    pub fn from_value(name: &str, value: &Value, source: &str) -> Result<Self, OsdepsError> {
        match value {
            Value::String(s) => Ok(match s.as_str() {
                IGNORE => Definition::Ignore,
                SECONDARY => Definition::Secondary,
                other => Definition::Directive(other.to_string()),
            }),
            Value::Mapping(mapping) => {
                let mut platforms = Vec::with_capacity(mapping.len());
                for (key, value) in mapping {
                    let key = key_str(key, source, name)?;
                    let path = format!("{}/{}", name, key);
                    let entry = parse_entry(value, source, &path, true)?;
                    if key == SECONDARY && matches!(entry, Entry::Versions(_)) {
                        return Err(OsdepsError::malformed(
                            source,
                            path,
                            "the gem entry must be a package name or a list of package names",
                        ));
                    }
                    platforms.push((key.to_string(), entry));
                }
                Ok(Definition::Platforms(platforms))
            }
            other => Err(OsdepsError::malformed(
                source,
                name,
                format!(
                    "expected a string or a mapping, found {}",
                    describe(other)
                ),
            )),
        }
    }

    /// Platform entries, empty for directives.
    pub fn platforms(&self) -> &[(String, Entry)] {
        match self {
            Definition::Platforms(platforms) => platforms,
            _ => &[],
        }
    }
}

impl Entry {
    /// Names listed under a `gem` platform key.
    pub fn package_names(&self) -> Vec<String> {
        match self {
            Entry::Packages(names) => names.clone(),
            Entry::Text(name) if !name.is_empty() => vec![name.clone()],
            Entry::Text(_) | Entry::Ignore | Entry::Versions(_) => Vec::new(),
        }
    }
}

fn parse_entry(
    value: &Value,
    source: &str,
    path: &str,
    allow_versions: bool,
) -> Result<Entry, OsdepsError> {
    match value {
        Value::Null => Ok(Entry::Ignore),
        // An empty string only means "nothing" for a whole OS entry. Below a
        // version key it is an (empty) shell snippet.
        Value::String(s) if s == IGNORE || (s.is_empty() && allow_versions) => Ok(Entry::Ignore),
        Value::String(s) => Ok(Entry::Text(s.clone())),
        Value::Sequence(items) => {
            let mut names = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => names.push(s.clone()),
                    other => return Err(type_error(source, path, other)),
                }
            }
            if names.is_empty() {
                Ok(Entry::Ignore)
            } else {
                Ok(Entry::Packages(names))
            }
        }
        Value::Mapping(mapping) if allow_versions => {
            let mut rules = Vec::with_capacity(mapping.len());
            for (key, value) in mapping {
                let key = key_str(key, source, path)?;
                let rule_path = format!("{}/{}", path, key);
                let mut patterns = Vec::new();
                for token in key.split(',').map(|t| t.trim().to_lowercase()) {
                    if token.is_empty() {
                        continue;
                    }
                    let pattern = Regex::new(&token).map_err(|e| {
                        OsdepsError::malformed(
                            source,
                            &rule_path,
                            format!("invalid version pattern '{}': {}", token, e),
                        )
                    })?;
                    patterns.push(pattern);
                }
                let entry = parse_entry(value, source, &rule_path, false)?;
                rules.push(VersionRule {
                    key: key.to_string(),
                    patterns,
                    entry,
                });
            }
            Ok(Entry::Versions(rules))
        }
        Value::Mapping(_) => Err(OsdepsError::malformed(
            source,
            path,
            "expected a package name, a list of package names or a shell snippet, found a mapping",
        )),
        other => Err(type_error(source, path, other)),
    }
}

fn key_str<'a>(key: &'a Value, source: &str, path: &str) -> Result<&'a str, OsdepsError> {
    match key {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        Value::String(_) => Err(OsdepsError::malformed(source, path, "found an empty key")),
        other => Err(type_error(source, path, other)),
    }
}

fn type_error(source: &str, path: &str, value: &Value) -> OsdepsError {
    OsdepsError::malformed(
        source,
        path,
        format!(
            "found {}. Don't forget to put quotes around numbers",
            describe(value)
        ),
    )
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "a null value",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str, yaml: &str) -> Result<Definition, OsdepsError> {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        Definition::from_value(name, &value, "test.osdeps")
    }

    #[test]
    fn test_directives() {
        assert_eq!(parse("a", "ignore").unwrap(), Definition::Ignore);
        assert_eq!(parse("a", "gem").unwrap(), Definition::Secondary);
        assert_eq!(
            parse("a", "pip").unwrap(),
            Definition::Directive("pip".into())
        );
    }

    #[test]
    fn test_platforms_keep_insertion_order() {
        let def = parse("a", "ubuntu: b\ndebian,ubuntu: c\narch: d\n").unwrap();
        let keys: Vec<&str> = def.platforms().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["ubuntu", "debian,ubuntu", "arch"]);
    }

    #[test]
    fn test_entry_shapes() {
        let def = parse(
            "a",
            "debian: [a-dev, b-dev]\ngentoo: dev-libs/a\narch: ~\nfedora: ignore\nsuse: []\n",
        )
        .unwrap();
        let entries: Vec<&Entry> = def.platforms().iter().map(|(_, e)| e).collect();
        assert_eq!(
            entries[0],
            &Entry::Packages(vec!["a-dev".into(), "b-dev".into()])
        );
        assert_eq!(entries[1], &Entry::Text("dev-libs/a".into()));
        assert_eq!(entries[2], &Entry::Ignore);
        assert_eq!(entries[3], &Entry::Ignore);
        assert_eq!(entries[4], &Entry::Ignore);
    }

    #[test]
    fn test_empty_string_below_version_key_is_text() {
        let def = parse("a", "debian:\n  sid: \"\"\nubuntu: \"\"\n").unwrap();
        let Entry::Versions(rules) = &def.platforms()[0].1 else {
            panic!("expected version rules");
        };
        assert_eq!(rules[0].entry, Entry::Text(String::new()));
        assert_eq!(def.platforms()[1].1, Entry::Ignore);
    }

    #[test]
    fn test_version_rules() {
        let def = parse("a", "debian:\n  sid, unstable: foo-sid\n  \"6.0\": foo-6\n").unwrap();
        let Entry::Versions(rules) = &def.platforms()[0].1 else {
            panic!("expected version rules");
        };
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].key, "sid, unstable");
        assert_eq!(rules[0].patterns.len(), 2);
        assert_eq!(rules[0].entry, Entry::Text("foo-sid".into()));
    }

    #[test]
    fn test_version_rule_matches_partially() {
        let def = parse("a", "ubuntu:\n  \"6\": foo\n").unwrap();
        let Entry::Versions(rules) = &def.platforms()[0].1 else {
            panic!("expected version rules");
        };
        let tags = vec!["16.04".to_string()];
        assert!(rules[0].matches(&tags));
        let tags = vec!["lucid".to_string()];
        assert!(!rules[0].matches(&tags));
    }

    #[test]
    fn test_unquoted_number_key_is_rejected() {
        let err = parse("a", "debian:\n  6.0: foo\n").unwrap_err();
        assert!(matches!(err, OsdepsError::Malformed { .. }));
        assert!(err.to_string().contains("put quotes around numbers"));
        assert!(err.to_string().contains("a/debian"));
    }

    #[test]
    fn test_number_value_is_rejected() {
        let err = parse("a", "debian: 42\n").unwrap_err();
        assert!(err.to_string().contains("found a number"));
    }

    #[test]
    fn test_non_string_list_item_is_rejected() {
        let err = parse("a", "debian: [foo, true]\n").unwrap_err();
        assert!(err.to_string().contains("found a boolean"));
    }

    #[test]
    fn test_top_level_list_is_rejected() {
        let err = parse("a", "[foo, bar]").unwrap_err();
        assert!(err.to_string().contains("expected a string or a mapping"));
    }

    #[test]
    fn test_nested_mapping_below_version_is_rejected() {
        let err = parse("a", "debian:\n  sid:\n    amd64: foo\n").unwrap_err();
        assert!(err.to_string().contains("a/debian/sid"));
        assert!(err.to_string().contains("found a mapping"));
    }

    #[test]
    fn test_invalid_version_pattern_is_rejected() {
        let err = parse("a", "debian:\n  \"sid(\": foo\n").unwrap_err();
        assert!(err.to_string().contains("invalid version pattern"));
    }

    #[test]
    fn test_gem_key_must_name_packages() {
        let err = parse("a", "gem:\n  sid: foo\n").unwrap_err();
        assert!(err.to_string().contains("the gem entry"));

        let def = parse("a", "gem: [foo, bar]\n").unwrap();
        assert_eq!(def.platforms()[0].1.package_names(), vec!["foo", "bar"]);
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let err = parse("a", "\"\": foo\n").unwrap_err();
        assert!(err.to_string().contains("empty key"));
    }
}
