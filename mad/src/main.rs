//! Command line decoder for statsd datagrams.
//!
//! # Usage
//!
//! ```text
//! mad [-c CONFIG] decode [FILE]
//! mad [-c CONFIG] types
//! ```
//!
//! `decode` reads a single datagram from `FILE` or stdin and prints one JSON record per decoded
//! line. If any line of the datagram is invalid, nothing is printed and the command fails with
//! the reason and the offending line.
//!
//! `types` prints the statsd type tokens recognized with the active configuration.
//!
//! The configuration is read from `config.yml` in the config folder, which defaults to `.mad`.

mod cli;
mod cliapp;
mod setup;

use std::process;

pub fn main() {
    let exit_code = match cli::execute() {
        Ok(()) => 0,
        Err(err) => {
            mad_log::ensure_error(&err);
            1
        }
    };

    process::exit(exit_code);
}
