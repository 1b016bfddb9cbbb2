//! Alias table: names substituted before any definition lookup.

use log::debug;
use std::collections::HashMap;

/// Maps a requested dependency name to the name actually looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes requests for `requested` resolve the definition of `target`.
    pub fn register(&mut self, target: impl Into<String>, requested: impl Into<String>) {
        let (target, requested) = (target.into(), requested.into());
        debug!("Aliasing {} to {}", requested, target);
        self.aliases.insert(requested, target);
    }

    /// Registers `ruby` as an alias of the version specific package
    /// (`ruby18` before 1.9.0, `ruby19` from then on).
    pub fn register_ruby(&mut self, ruby_version: &str) {
        let package = if ruby_version_before_1_9(ruby_version) {
            "ruby18"
        } else {
            "ruby19"
        };
        self.register(package, "ruby");
    }

    /// The name to look up for `name`.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

fn ruby_version_before_1_9(version: &str) -> bool {
    let mut parts = version
        .trim()
        .split('.')
        .map(|part| part.parse::<u32>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    (major, minor) < (1, 9)
}
