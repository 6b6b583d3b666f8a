//! Bind a typed config struct to environment variables, config files and
//! command-line flags, with no flag definitions and no schema file.
//!
//! ```ignore
//! #[derive(Configure, Default)]
//! struct AppConfig {
//!     /// Address to bind.
//!     host: String,
//!     port: u16,
//!     servers: Vec<Upstream>,
//! }
//!
//! let mut config = AppConfig::default();
//! treefig::load(&mut config)?;
//! ```
//!
//! That call reads every environment variable, then the files named by `-f`
//! and `$CONFIG_FILE`, then the remaining flags, and writes what it finds
//! straight into `config`. `--port 8080`, `PORT=8080` and `port: 8080` in a
//! YAML file all land in the same field.
//!
//! # One key dialect
//!
//! Every source speaks flat string pairs keyed in one canonical form: dotted,
//! lower-case, with `.`, `-` and `_` interchangeable and a split at each
//! lower-to-upper boundary. `maxConns`, `max-conns`, `MAX_CONNS` and
//! `max.conns` are the same key. See [`case`].
//!
//! Nesting is just more segments. A struct field `primary` holding a `port`
//! is `primary.port`, so `--primary-port`, `PRIMARY_PORT` or
//! `primary: {port: 1}` all reach it.
//!
//! # Lists and maps
//!
//! A `Vec<T>` or a string-keyed map is filled from whatever element keys the
//! source actually has. `servers.0.host` and `servers.2.host` produce a
//! three-element list with a default in the middle; `labels.team` inserts
//! `"team"`. Element types nest freely: lists of structs, maps of lists.
//!
//! On the command line, a flag given twice becomes a list:
//! `--tag a --tag b` is `tag.0 = a`, `tag.1 = b`.
//!
//! # How it works
//!
//! [`Node::compile`] walks the config value once through its [`Configure`]
//! impl and builds a tree whose leaves borrow the struct's fields. Each
//! source flattens its input into a [`FlatStore`] and the tree is filled from
//! it. A list or map node holds a single template describing its element;
//! filling builds one fresh element per discovered key from that template and
//! moves it into the container.
//!
//! # Strict mode
//!
//! By default, files and flags are strict: a key nothing in the struct reads
//! fails the load, naming the key as it was written (`unused flag --prot`).
//! The environment is lenient unless [`TreefigBuilder::strict_env`] is set,
//! since it is full of unrelated variables.
//!
//! # Pipeline
//!
//! [`Treefig::builder()`] controls the env prefix, strictness, the
//! config-file flag and variable names, extra file formats, and extra
//! loaders. Loaders run in order and each one overrides the last:
//!
//! ```text
//! Environment     PREFIX_KEY=value
//!      ↑ overridden by
//! Config files    -f a.yaml,b.toml   and   CONFIG_FILE=c.json
//!      ↑ overridden by
//! Flags           --key value
//! ```
//!
//! # Describing a config
//!
//! [`describe::listing`] pairs each key with its current value and
//! [`describe::usage`] prints a flag / env var / type / description table
//! from the same tree. With the `clap` feature, [`cli::command`] builds a
//! clap `Command` for `--help`.
//!
//! # Logging
//!
//! Loading emits `tracing` events: `debug` per loader and file, `trace` per
//! assigned value. No subscriber is installed.

pub mod case;
pub mod describe;
pub mod dynamic;
pub mod error;
pub mod file;
pub mod flag;
pub mod loader;
pub mod node;
pub mod scalar;
pub mod store;

mod builder;
#[cfg(feature = "clap")]
pub mod cli;
mod fill;

#[cfg(test)]
mod fixtures;

pub use builder::{Treefig, TreefigBuilder};
pub use dynamic::{Dynamic, DynamicKind, Visit};
pub use error::{Result, TreefigError};
pub use file::{Flattener, Formats};
pub use loader::{EnvLoader, FileLoader, FlagLoader, Loader, Loaders};
pub use node::{Binding, Configure, Node, Shape};
pub use scalar::{Scalar, ScalarKind};
pub use store::{FlatStore, Source};
#[cfg(feature = "derive")]
pub use treefig_derive::Configure;

/// Load `config` with the default pipeline from the process environment and
/// `std::env::args()`.
pub fn load<C: Configure + ?Sized>(config: &mut C) -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    Treefig::default().load(config, &args)
}
