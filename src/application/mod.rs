//! Application layer - use cases that coordinate the resolution core with the
//! collaborators that act on its decisions.

mod install;

pub use install::{InstallOptions, InstallUseCase, Installer};

#[cfg(test)]
pub use install::MockInstaller;
