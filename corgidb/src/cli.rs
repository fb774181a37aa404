//! Command line of the `corgidb` binary.

use clap::Command;
use std::ffi::OsString;

/// What the binary was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Run the HTTP service (no subcommand).
    Serve,
    /// Store the database password in the keyring, then exit.
    Login,
}

pub fn command() -> Command {
    Command::new("corgidb")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reconciles the coronagraph archive schema and serves reconciliation jobs")
        .subcommand(
            Command::new("login")
                .about("Prompt for the database password and store it in the system keyring"),
        )
}

/// Parses `args` (including the program name). Unknown subcommands and
/// arguments are errors.
pub fn parse_mode<I, T>(args: I) -> Result<Mode, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    Ok(match matches.subcommand() {
        Some(("login", _)) => Mode::Login,
        _ => Mode::Serve,
    })
}
