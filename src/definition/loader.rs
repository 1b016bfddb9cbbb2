//! Loading definition sets from YAML files.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

use super::{DefinitionSet, MergeConflict};
use crate::runtime::Runtime;

/// Environment variable replacing the built-in default definitions.
pub const DEFAULT_DEFINITIONS_ENV: &str = "OSDEPS_DEFAULT_DEFINITIONS";

const BUILTIN_SOURCE: &str = "<builtin>/default.osdeps";
const BUILTIN: &str = include_str!("../default.osdeps");

/// Which files make up the definitions of a run, in merge order.
#[derive(Debug, Clone, Default)]
pub struct DefinitionSources {
    /// Start from the default definitions (built-in or `OSDEPS_DEFAULT_DEFINITIONS`).
    pub include_default: bool,
    /// Extra files, each overriding the previous ones.
    pub files: Vec<PathBuf>,
    /// Merge `<config_dir>/osdeps/local.osdeps` last when it exists.
    pub include_user: bool,
    /// Stripped from file names in override warnings.
    pub root_dir: Option<PathBuf>,
}

/// Parses a YAML document into a validated set.
pub fn from_yaml_str(content: &str, source: Option<&Path>) -> Result<DefinitionSet> {
    let value: Value = if content.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(content)?
    };
    Ok(DefinitionSet::from_value(&value, source)?)
}

/// Loads and validates one definition file.
#[tracing::instrument(skip(runtime))]
pub fn load_file<R: Runtime>(runtime: &R, path: &Path) -> Result<DefinitionSet> {
    let content = runtime.read_to_string(path)?;
    let set = from_yaml_str(&content, Some(path)).with_context(|| format!("error in {:?}", path))?;
    debug!("Loaded {} definition(s) from {:?}", set.len(), path);
    Ok(set)
}

/// Definitions shipped with the binary.
pub fn builtin_definitions() -> Result<DefinitionSet> {
    from_yaml_str(BUILTIN, Some(Path::new(BUILTIN_SOURCE)))
        .context("error in the built-in default definitions")
}

/// Loads the default definitions, honouring `OSDEPS_DEFAULT_DEFINITIONS`.
///
/// A value that does not point to a file is reported and ignored.
pub fn load_default<R: Runtime>(runtime: &R) -> Result<DefinitionSet> {
    if let Ok(file) = runtime.env_var(DEFAULT_DEFINITIONS_ENV) {
        let path = PathBuf::from(&file);
        if runtime.is_file(&path) {
            return load_file(runtime, &path);
        }
        warn!(
            "{} (from {}) is not a file, falling back to the built-in definitions",
            file, DEFAULT_DEFINITIONS_ENV
        );
    }
    builtin_definitions()
}

/// `<config_dir>/osdeps/local.osdeps`
pub fn user_definitions_path<R: Runtime>(runtime: &R) -> Option<PathBuf> {
    runtime
        .config_dir()
        .map(|dir| dir.join("osdeps").join("local.osdeps"))
}

/// Loads and merges every source, later sources overriding earlier ones.
#[tracing::instrument(skip(runtime))]
pub fn load_sources<R: Runtime>(
    runtime: &R,
    sources: &DefinitionSources,
) -> Result<(DefinitionSet, Vec<MergeConflict>)> {
    let root_dir = sources.root_dir.as_deref();
    let mut set = if sources.include_default {
        load_default(runtime)?
    } else {
        DefinitionSet::new()
    };
    let mut conflicts = Vec::new();

    for file in &sources.files {
        conflicts.extend(set.merge(load_file(runtime, file)?, root_dir));
    }

    if sources.include_user
        && let Some(path) = user_definitions_path(runtime)
        && runtime.is_file(&path)
    {
        conflicts.extend(set.merge(load_file(runtime, &path)?, root_dir));
    }

    Ok((set, conflicts))
}
