//! Install commands and shell script generation.

use std::collections::{BTreeMap, BTreeSet};

use super::ResolvedPlan;

/// Placeholder replaced by the quoted package list in install templates.
pub const PACKAGES_SLOT: &str = "{packages}";

/// Re-runs the script through sudo when it is not already running as root.
pub const ROOT_PREAMBLE: &str = r#"# Gain root access using sudo
if test `id -u` != "0"; then
    exec sudo /bin/bash $0 "$@"

fi
"#;

const SHEBANG: &str = "#! /bin/bash";

/// Install command template per OS family.
///
/// An OS is supported exactly when it has a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommands {
    templates: BTreeMap<String, String>,
}

impl Default for InstallCommands {
    fn default() -> Self {
        let apt = "export DEBIAN_FRONTEND=noninteractive; apt-get install -y {packages}";
        let mut commands = Self::empty();
        commands.insert("debian", apt);
        commands.insert("ubuntu", apt);
        commands.insert("gentoo", "emerge --noreplace {packages}");
        commands.insert("arch", "pacman -Sy --noconfirm {packages}");
        commands
    }
}

impl InstallCommands {
    /// No template at all: every OS is unsupported.
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, os_name: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(os_name.into(), template.into());
    }

    pub fn is_supported(&self, os_name: &str) -> bool {
        self.templates.contains_key(os_name)
    }

    pub fn template(&self, os_name: &str) -> Option<&str> {
        self.templates.get(os_name).map(String::as_str)
    }

    /// The install command for `packages`, each one single-quoted.
    pub fn render<'a, I>(&self, os_name: &str, packages: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let template = self.template(os_name)?;
        let quoted: Vec<String> = packages
            .into_iter()
            .map(|package| format!("'{}'", package))
            .collect();
        Some(template.replace(PACKAGES_SLOT, &quoted.join(" ")))
    }
}

/// Builds the bash script installing the native part of `plan`.
///
/// Returns `None` when `os_name` has no install command. The install command
/// line is left out when the plan only has shell snippets.
pub fn generate_script(
    commands: &InstallCommands,
    os_name: &str,
    plan: &ResolvedPlan,
) -> Option<String> {
    let install = commands.render(os_name, &plan.native_packages)?;

    let mut script = String::new();
    script.push_str(SHEBANG);
    script.push('\n');
    script.push_str(ROOT_PREAMBLE);
    if !plan.native_packages.is_empty() {
        script.push_str(&install);
        script.push('\n');
    }
    for snippet in &plan.shell_snippets {
        script.push_str(snippet);
        if !snippet.ends_with('\n') {
            script.push('\n');
        }
    }
    Some(script)
}

/// Command line of the secondary package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryCommand {
    pub program: String,
    pub prerelease: bool,
}

impl Default for SecondaryCommand {
    fn default() -> Self {
        Self {
            program: "gem".to_string(),
            prerelease: false,
        }
    }
}

impl SecondaryCommand {
    /// `gem install [--prerelease] <packages>`
    pub fn command_line(&self, packages: &BTreeSet<String>) -> Vec<String> {
        let mut args = vec![self.program.clone(), "install".to_string()];
        if self.prerelease {
            args.push("--prerelease".to_string());
        }
        args.extend(packages.iter().cloned());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(packages: &[&str], snippets: &[&str]) -> ResolvedPlan {
        ResolvedPlan {
            native_packages: packages.iter().map(|p| p.to_string()).collect(),
            shell_snippets: snippets.iter().map(|s| s.to_string()).collect(),
            secondary_packages: BTreeSet::new(),
        }
    }

    #[test]
    fn test_default_templates() {
        let commands = InstallCommands::default();
        for os in ["debian", "ubuntu", "gentoo", "arch"] {
            assert!(commands.is_supported(os), "{}", os);
        }
        assert!(!commands.is_supported("fedora"));
        assert!(!InstallCommands::empty().is_supported("debian"));
    }

    #[test]
    fn test_render_quotes_packages() {
        let commands = InstallCommands::default();
        let packages: BTreeSet<String> = ["libxml2-dev".to_string(), "cmake".to_string()].into();
        assert_eq!(
            commands.render("gentoo", &packages).unwrap(),
            "emerge --noreplace 'cmake' 'libxml2-dev'"
        );
        assert_eq!(commands.render("fedora", &packages), None);
    }

    #[test]
    fn test_generate_script() {
        let commands = InstallCommands::default();
        let script = generate_script(&commands, "debian", &plan(&["cmake", "git-core"], &[
            "cd /tmp && ./install.sh",
        ]))
        .unwrap();

        let expected = format!(
            "#! /bin/bash\n{}export DEBIAN_FRONTEND=noninteractive; apt-get install -y 'cmake' 'git-core'\ncd /tmp && ./install.sh\n",
            ROOT_PREAMBLE
        );
        assert_eq!(script, expected);
    }

    #[test]
    fn test_generate_script_with_snippets_only() {
        let commands = InstallCommands::default();
        let script = generate_script(&commands, "arch", &plan(&[], &["- ; -"])).unwrap();
        assert!(!script.contains("pacman"));
        assert!(script.ends_with("- ; -\n"));
    }

    #[test]
    fn test_generate_script_unsupported_os() {
        let commands = InstallCommands::default();
        assert_eq!(generate_script(&commands, "haiku", &plan(&["a"], &[])), None);
    }

    #[test]
    fn test_secondary_command_line() {
        let packages: BTreeSet<String> = ["rake".to_string(), "hoe".to_string()].into();
        let command = SecondaryCommand::default();
        assert_eq!(command.command_line(&packages), vec!["gem", "install", "hoe", "rake"]);

        let command = SecondaryCommand {
            prerelease: true,
            ..Default::default()
        };
        assert_eq!(
            command.command_line(&packages),
            vec!["gem", "install", "--prerelease", "hoe", "rake"]
        );
    }
}
