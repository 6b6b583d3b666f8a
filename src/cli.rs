//! Clap adapter for treefig.
//!
//! Flags never go through clap to reach the config: the flag loader reads
//! argv itself. This module only builds a clap [`Command`] that mirrors a
//! compiled tree, so an app can print `--help` (or validate argv with clap's
//! error messages) from the same struct it loads. Compiled only with the
//! `clap` Cargo feature (on by default).
//!
//! Keys inside list or map elements (`--servers-<n>-host`) have no fixed
//! name and are left out; the container itself is an appendable argument.

use clap::{Arg, ArgAction, Command};

use crate::describe::{self, UsageRow};
use crate::loader::DEFAULT_CONFIG_FILE_FLAG;
use crate::node::{Node, Shape};
use crate::scalar::ScalarKind;

/// A help-only clap command named `name` with one argument per settable key,
/// plus the config-file flag.
pub fn command(name: impl Into<String>, root: &Node<'_>) -> Command {
    let mut command = Command::new(name.into()).arg(
        Arg::new("config-file")
            .short('f')
            .long(DEFAULT_CONFIG_FILE_FLAG)
            .value_name("PATHS")
            .action(ArgAction::Append)
            .help("Comma-separated config files to load"),
    );

    for row in describe::rows(root) {
        if row.is_element() {
            continue;
        }
        command = command.arg(arg(&row));
    }
    command
}

fn arg(row: &UsageRow) -> Arg {
    let flag = row.flag();
    let long = flag.trim_start_matches('-').to_string();
    let arg = Arg::new(row.key())
        .long(long)
        .value_name(row.kind().to_uppercase())
        .help(row.description.clone());

    match row.shape {
        Shape::Scalar(ScalarKind::Bool) => arg
            .num_args(0..=1)
            .default_missing_value("true")
            .action(ArgAction::Set),
        Shape::Dynamic(_) => arg.action(ArgAction::Append),
        _ => arg.action(ArgAction::Set),
    }
}
