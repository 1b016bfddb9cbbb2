//! Process-scoped resolution context.

use crate::alias::AliasTable;
use crate::definition::DefinitionSet;
use crate::error::OsdepsError;
use crate::os::OsIdentity;
use crate::partition::{Partition, partition};
use crate::plan::{Availability, InstallCommands, ResolvedPlan, availability_of, build_plan};
use crate::resolver::{Resolution, resolve};

/// Definitions, aliases, host OS and install commands of one run.
///
/// The OS is detected once by whoever builds the context and never changes
/// afterwards.
#[derive(Debug, Clone)]
pub struct OsdepsContext {
    definitions: DefinitionSet,
    aliases: AliasTable,
    os: Option<OsIdentity>,
    commands: InstallCommands,
}

impl OsdepsContext {
    pub fn new(definitions: DefinitionSet, os: Option<OsIdentity>) -> Self {
        Self {
            definitions,
            aliases: AliasTable::new(),
            os,
            commands: InstallCommands::default(),
        }
    }

    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_commands(mut self, commands: InstallCommands) -> Self {
        self.commands = commands;
        self
    }

    pub fn definitions(&self) -> &DefinitionSet {
        &self.definitions
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn os(&self) -> Option<&OsIdentity> {
        self.os.as_ref()
    }

    pub fn commands(&self) -> &InstallCommands {
        &self.commands
    }

    /// True when the OS is known and has an install command.
    pub fn is_supported_os(&self) -> bool {
        self.os
            .as_ref()
            .is_some_and(|os| self.commands.is_supported(&os.name))
    }

    pub fn partition<I, S>(&self, names: I) -> Result<Partition, OsdepsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        partition(names, &self.aliases, &self.definitions, self.os.as_ref())
    }

    /// Resolves `name` after alias substitution.
    pub fn resolve(&self, name: &str) -> Resolution {
        resolve(self.aliases.resolve(name), &self.definitions, self.os.as_ref())
    }

    pub fn build_plan(
        &self,
        native: &[String],
        secondary: &[String],
    ) -> Result<ResolvedPlan, OsdepsError> {
        build_plan(
            native,
            secondary,
            &self.definitions,
            self.os.as_ref(),
            &self.commands,
        )
    }

    /// Builds the plan of a partition. Errors name aliased dependencies the
    /// way they were requested.
    pub fn build_partition(&self, partition: &Partition) -> Result<ResolvedPlan, OsdepsError> {
        self.build_plan(&partition.native, &partition.secondary)
            .map_err(|err| partition.report(err))
    }

    /// Partitions then builds the plan of `names` in one go.
    pub fn plan_for<I, S>(&self, names: I) -> Result<ResolvedPlan, OsdepsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let partition = self.partition(names)?;
        self.build_partition(&partition)
    }

    pub fn availability_of(&self, name: &str) -> Result<Availability, OsdepsError> {
        availability_of(name, &self.aliases, &self.definitions, self.os.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.availability_of(name)
            .is_ok_and(|availability| availability.is_available())
    }
}
