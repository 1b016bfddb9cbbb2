//! Runtime abstraction for system operations.
//!
//! Everything that touches the host (environment, files, directories) goes
//! through [`Runtime`] so detection, loading and installed-package checks can be
//! tested against a mock.
//!
//! # Structure
//!
//! - `env` - Environment variables and system directories
//! - `fs` - File system reads and checks
//! - `process` - External commands

mod env;
mod fs;
mod process;

use anyhow::Result;
use std::env as std_env;
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // File System
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;

    // Directories
    fn config_dir(&self) -> Option<PathBuf>;

    // Processes
    /// Runs `program` and returns its standard output. Fails on a non-zero exit.
    fn command_output(&self, program: &str, args: &[String]) -> Result<String>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.is_file_impl(path)
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.config_dir_impl()
    }

    fn command_output(&self, program: &str, args: &[String]) -> Result<String> {
        self.command_output_impl(program, args)
    }
}
