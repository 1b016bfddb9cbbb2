use anyhow::Result;
use clap::Parser;
use osdeps::commands::{self, ScriptOptions, config::Options};
use osdeps::os::OsIdentity;
use std::path::PathBuf;

/// osdeps - OS dependency resolver
///
/// Turns abstract dependency names into the packages, shell snippets and gems
/// that provide them on this operating system.
///
/// Definitions come from the built-in defaults (or OSDEPS_DEFAULT_DEFINITIONS),
/// the files given with --definitions, and <config dir>/osdeps/local.osdeps.
///
/// Examples:
///   osdeps resolve libxml2 cmake    # Show what would be installed
///   osdeps script libxml2 > deps.sh # Generate the install script
#[derive(Parser, Debug)]
#[command(author, version = env!("OSDEPS_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Additional definition file, overriding the previous ones (repeatable)
    #[arg(long = "definitions", short = 'd', value_name = "FILE", global = true)]
    pub definitions: Vec<PathBuf>,

    /// Do not load the default definitions
    #[arg(long = "no-default", global = true)]
    pub no_default: bool,

    /// Root directory stripped from file names in messages (also via OSDEPS_ROOT)
    #[arg(long = "root", env = "OSDEPS_ROOT", value_name = "PATH", global = true)]
    pub root: Option<PathBuf>,

    /// Operating system to use instead of detecting it (also via OSDEPS_OPERATING_SYSTEM)
    #[arg(
        long = "os",
        env = "OSDEPS_OPERATING_SYSTEM",
        value_name = "NAME[:VERSION,...]",
        global = true
    )]
    pub os: Option<OsIdentity>,

    /// Resolve REQUESTED with the definition of TARGET (repeatable)
    #[arg(
        long = "alias",
        value_name = "REQUESTED=TARGET",
        value_parser = parse_alias,
        global = true
    )]
    pub aliases: Vec<(String, String)>,

    /// Ruby version selecting the definition of `ruby` (ruby18 or ruby19)
    #[arg(long = "ruby-version", value_name = "VERSION", global = true)]
    pub ruby_version: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the operating system
    Os,

    /// Print the packages, snippets and gems needed by the dependencies
    Resolve(ResolveArgs),

    /// Check that the dependencies can be installed on this operating system
    Check(CheckArgs),

    /// Print the install script for the dependencies
    Script(ScriptArgs),
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    /// Dependency names
    #[arg(value_name = "NAME", required = true)]
    pub names: Vec<String>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Dependency names
    #[arg(value_name = "NAME", required = true)]
    pub names: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct ScriptArgs {
    /// Dependency names
    #[arg(value_name = "NAME", required = true)]
    pub names: Vec<String>,

    /// Also reinstall gems that have a newer version
    #[arg(long)]
    pub update: bool,

    /// Allow pre-release gems
    #[arg(long)]
    pub prerelease: bool,

    /// Include packages that are already installed
    #[arg(long)]
    pub all: bool,
}

fn parse_alias(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((requested, target)) if !requested.trim().is_empty() && !target.trim().is_empty() => {
            Ok((requested.trim().to_string(), target.trim().to_string()))
        }
        _ => Err(format!("invalid alias '{}', expected REQUESTED=TARGET", s)),
    }
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            definitions: self.definitions.clone(),
            no_default: self.no_default,
            root: self.root.clone(),
            os: self.os.clone(),
            aliases: self.aliases.clone(),
            ruby_version: self.ruby_version.clone(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = osdeps::runtime::RealRuntime;
    let options = cli.options();

    match cli.command {
        Commands::Os => commands::os(runtime, &options)?,
        Commands::Resolve(args) => commands::resolve(runtime, &options, &args.names, args.json)?,
        Commands::Check(args) => commands::check(runtime, &options, &args.names)?,
        Commands::Script(args) => {
            let script_options = ScriptOptions {
                update: args.update,
                prerelease: args.prerelease,
                all: args.all,
            };
            commands::script(runtime, &options, &args.names, &script_options)?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_resolve_parsing() {
        let cli = Cli::try_parse_from(["osdeps", "resolve", "libxml2", "cmake", "--json"]).unwrap();
        match cli.command {
            Commands::Resolve(args) => {
                assert_eq!(args.names, vec!["libxml2", "cmake"]);
                assert!(args.json);
            }
            _ => panic!("Expected Resolve command"),
        }
        assert!(cli.definitions.is_empty());
        assert!(!cli.no_default);
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "osdeps",
            "--os",
            "Debian:sid,unstable",
            "-d",
            "/a.osdeps",
            "check",
            "git",
            "--definitions",
            "/b.osdeps",
            "--alias",
            "ruby=ruby19",
        ])
        .unwrap();

        let os = cli.os.clone().unwrap();
        assert_eq!(os.name, "debian");
        assert!(os.version_tags.contains("unstable"));
        assert_eq!(
            cli.definitions,
            vec![PathBuf::from("/a.osdeps"), PathBuf::from("/b.osdeps")]
        );
        assert_eq!(cli.aliases, vec![("ruby".to_string(), "ruby19".to_string())]);
    }

    #[test]
    fn test_cli_script_flags() {
        let cli =
            Cli::try_parse_from(["osdeps", "script", "rake", "--update", "--prerelease"]).unwrap();
        match cli.command {
            Commands::Script(args) => {
                assert!(args.update);
                assert!(args.prerelease);
                assert!(!args.all);
            }
            _ => panic!("Expected Script command"),
        }
    }

    #[test]
    fn test_cli_requires_names() {
        assert!(Cli::try_parse_from(["osdeps", "resolve"]).is_err());
        assert!(Cli::try_parse_from(["osdeps", "check"]).is_err());
    }

    #[test]
    fn test_cli_invalid_alias() {
        assert!(Cli::try_parse_from(["osdeps", "--alias", "ruby", "os"]).is_err());
        assert!(parse_alias("=ruby19").is_err());
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        let result = Cli::try_parse_from(["osdeps", "libxml2"]);
        assert!(result.is_err());
    }
}
