//! Command-line definition

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

/// Flags shared by every subcommand
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct GlobalArgs {
    pub(crate) verbose: u8,
    pub(crate) log_json: bool,
    pub(crate) json: bool,
    pub(crate) config: Option<PathBuf>,
    pub(crate) jobs: Option<usize>,
}

/// What to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    /// Copy, assign identifiers, remap
    Duplicate {
        origin: PathBuf,
        target: Option<PathBuf>,
        excludes: Vec<PathBuf>,
    },
    /// Remap an already copied tree
    Remap { origin: PathBuf, duplicate: PathBuf },
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invocation {
    pub(crate) global: GlobalArgs,
    pub(crate) action: Action,
}

pub(crate) fn command() -> Command {
    Command::new("dirdup")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Duplicate an asset directory and remap identifier references to the copy")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Raise log verbosity (-v debug, -vv trace)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print the report as JSON"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("YAML configuration file"),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .global(true)
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Documents rewritten at once"),
        )
        .subcommand(
            Command::new("duplicate")
                .about("Copy a directory, assign new identifiers, and remap references")
                .arg(
                    Arg::new("origin")
                        .required(true)
                        .value_name("ORIGIN")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory to duplicate"),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf))
                        .help("Destination (default: first free `<ORIGIN>(copy)` sibling)"),
                )
                .arg(
                    Arg::new("exclude")
                        .long("exclude")
                        .value_name("REL")
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(PathBuf))
                        .help("Subtree of ORIGIN not to copy (repeatable)"),
                ),
        )
        .subcommand(
            Command::new("remap")
                .about("Remap references of a tree another host already copied")
                .arg(
                    Arg::new("origin")
                        .required(true)
                        .value_name("ORIGIN")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("duplicate")
                        .required(true)
                        .value_name("DUPLICATE")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

impl Invocation {
    /// Read parsed matches; `None` for an unknown subcommand
    pub(crate) fn from_matches(matches: &ArgMatches) -> Option<Self> {
        let (name, args) = matches.subcommand()?;
        let global = GlobalArgs {
            verbose: args.get_count("verbose"),
            log_json: args.get_flag("log-json"),
            json: args.get_flag("json"),
            config: args.get_one::<PathBuf>("config").cloned(),
            jobs: args.get_one::<usize>("jobs").copied(),
        };
        let action = match name {
            "duplicate" => Action::Duplicate {
                origin: args.get_one::<PathBuf>("origin")?.clone(),
                target: args.get_one::<PathBuf>("target").cloned(),
                excludes: args
                    .get_many::<PathBuf>("exclude")
                    .map(|values| values.cloned().collect())
                    .unwrap_or_default(),
            },
            "remap" => Action::Remap {
                origin: args.get_one::<PathBuf>("origin")?.clone(),
                duplicate: args.get_one::<PathBuf>("duplicate")?.clone(),
            },
            _ => return None,
        };
        Some(Self { global, action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Invocation {
        let matches = command().try_get_matches_from(args).unwrap();
        Invocation::from_matches(&matches).unwrap()
    }

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn duplicate_with_excludes_and_globals() {
        let invocation = parse(&[
            "dirdup",
            "duplicate",
            "Assets/Level",
            "--exclude",
            "Textures",
            "--exclude",
            "Audio",
            "-j",
            "3",
            "-vv",
            "--json",
        ]);
        assert_eq!(
            invocation,
            Invocation {
                global: GlobalArgs {
                    verbose: 2,
                    json: true,
                    jobs: Some(3),
                    ..GlobalArgs::default()
                },
                action: Action::Duplicate {
                    origin: PathBuf::from("Assets/Level"),
                    target: None,
                    excludes: vec![PathBuf::from("Textures"), PathBuf::from("Audio")],
                },
            }
        );
    }

    #[test]
    fn globals_before_subcommand() {
        let invocation = parse(&["dirdup", "--config", "dirdup.yaml", "remap", "A", "B"]);
        assert_eq!(invocation.global.config, Some(PathBuf::from("dirdup.yaml")));
        assert_eq!(
            invocation.action,
            Action::Remap {
                origin: PathBuf::from("A"),
                duplicate: PathBuf::from("B"),
            }
        );
    }

    #[test]
    fn remap_requires_both_trees() {
        assert!(command().try_get_matches_from(["dirdup", "remap", "A"]).is_err());
    }

    #[test]
    fn jobs_must_be_a_number() {
        assert!(command()
            .try_get_matches_from(["dirdup", "duplicate", "A", "--jobs", "many"])
            .is_err());
    }
}
