//! Command line parsing and [`Action`] construction.

use std::path::PathBuf;

/// The action to carry out.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Action {
    /// Inspect a descriptor image.
    Inspect {
        /// The path to the descriptor image.
        path: PathBuf,
        /// Whether to enable verbose diagnostics.
        verbose: bool,
    },
}

/// Parses arguments to construct an [`Action`].
pub fn parse_arguments() -> Action {
    let mut matches = command_parser().get_matches();
    let (subcommand_name, subcommand_matches) =
        matches.remove_subcommand().expect("subcommand required");
    match subcommand_name.as_str() {
        "inspect" => parse_inspect_arguments(subcommand_matches),
        name => unreachable!("unexpected subcommand {name:?}"),
    }
}

/// Parses subcommand arguments for the [`Action::Inspect`] subcommand.
pub fn parse_inspect_arguments(mut matches: clap::ArgMatches) -> Action {
    let path = matches
        .remove_one::<PathBuf>("image")
        .expect("image is a required argument");
    let verbose = matches.get_flag("verbose");

    Action::Inspect { path, verbose }
}

/// Returns the clap command parser.
pub fn command_parser() -> clap::Command {
    let image_arg = clap::Arg::new("image")
        .help("The path to the cell or system descriptor image")
        .value_parser(clap::builder::PathBufValueParser::new())
        .value_name("IMAGE")
        .value_hint(clap::builder::ValueHint::FilePath)
        .required(true);

    let verbose_arg = clap::Arg::new("verbose")
        .help("Enable verbose diagnostics")
        .long("verbose")
        .short('v')
        .action(clap::ArgAction::SetTrue);

    let inspect_subcommand = clap::Command::new("inspect")
        .about("Validates a descriptor image and prints its layout")
        .arg_required_else_help(true)
        .arg(image_arg)
        .arg(verbose_arg);

    clap::Command::new("cell-config-ctl")
        .about("Utility for inspecting cell and system descriptor images")
        .subcommand(inspect_subcommand)
        .subcommand_required(true)
        .arg_required_else_help(true)
}
