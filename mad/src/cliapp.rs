//! This module implements the definition of the command line app.

use std::path::PathBuf;

use clap::{Arg, Command, value_parser};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const ABOUT: &str = "Decodes statsd datagrams into metric records.";

pub fn make_app() -> Command {
    Command::new("mad")
        .disable_help_subcommand(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .max_term_width(79)
        .version(VERSION)
        .about(ABOUT)
        .arg(
            Arg::new("config")
                .value_name("CONFIG")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("The path to the config folder."),
        )
        .arg(
            Arg::new("log_level")
                .value_name("LEVEL")
                .long("log-level")
                .global(true)
                .env("MAD_LOG_LEVEL")
                .help("The log level: off, error, warn, info, debug or trace."),
        )
        .arg(
            Arg::new("log_format")
                .value_name("FORMAT")
                .long("log-format")
                .global(true)
                .env("MAD_LOG_FORMAT")
                .help("The log format: auto, pretty, simplified or json."),
        )
        .subcommand(
            Command::new("decode")
                .about("Decode a statsd datagram")
                .after_help(
                    "This decodes all lines of a single datagram and prints every record \
                     as a line of JSON.  Lines are separated by newlines.  If any line is \
                     invalid, the entire datagram is rejected.",
                )
                .arg(
                    Arg::new("file")
                        .value_name("FILE")
                        .value_parser(value_parser!(PathBuf))
                        .help("The file containing the datagram.  Reads stdin if omitted."),
                ),
        )
        .subcommand(
            Command::new("types")
                .about("Print the statsd type registry")
                .after_help(
                    "This prints every recognized type token along with the metric kind, \
                     the unit and whether the type accepts a sample rate.",
                ),
        )
}
