//! Source adapters.
//!
//! A [`Loader`] turns one kind of input into a [`FlatStore`], fills the tree
//! from it and, when strict, fails on keys nothing read. Loaders run in order
//! against the same compiled tree, so a later loader overrides whatever an
//! earlier one assigned. Each loader checks only its own store.
//!
//! The stock loaders:
//!
//! | Loader | Input | Unused report |
//! |---|---|---|
//! | [`EnvLoader`] | `PREFIX_KEY=value` variables | `unused env PREFIX_KEY` |
//! | [`FileLoader`] | files named by `-f` and `$CONFIG_FILE` | `unused keys key` |
//! | [`FlagLoader`] | `--key value` arguments | `unused flag --key` |

use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::case;
use crate::error::{Result, TreefigError};
use crate::file::{self, Flattener, Formats};
use crate::flag;
use crate::node::Node;
use crate::store::FlatStore;

pub const DEFAULT_CONFIG_FILE_FLAG: &str = "f";
pub const DEFAULT_CONFIG_FILE_ENV: &str = "CONFIG_FILE";

/// Setting a channel name to this disables the channel.
pub const DISABLED: &str = "-";

pub trait Loader {
    /// Fill `root` from this loader's source. `args` excludes the program name.
    fn load(&self, root: &mut Node<'_>, args: &[String]) -> Result<()>;
}

/// Loaders applied in order, stopping at the first failure.
#[derive(Default)]
pub struct Loaders(Vec<Box<dyn Loader>>);

impl Loaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, loader: impl Loader + 'static) {
        self.0.push(Box::new(loader));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Loader for Loaders {
    fn load(&self, root: &mut Node<'_>, args: &[String]) -> Result<()> {
        for loader in &self.0 {
            loader.load(root, args)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Loaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loaders").field("len", &self.0.len()).finish()
    }
}

// --- environment ---

/// Loads `PREFIX_KEY=value` environment variables.
///
/// With a prefix, only variables starting with `PREFIX_` are read and the
/// prefix is stripped before normalization: `APP_SERVER_PORT` fills
/// `server.port`. Without one, every variable is read.
#[derive(Debug, Clone, Default)]
pub struct EnvLoader {
    pub prefix: Option<String>,
    pub disallow_unused: bool,
    vars: Option<Vec<(String, String)>>,
}

impl EnvLoader {
    pub fn new(prefix: Option<&str>) -> Self {
        EnvLoader {
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
            ..Default::default()
        }
    }

    pub fn disallow_unused(mut self, disallow: bool) -> Self {
        self.disallow_unused = disallow;
        self
    }

    /// Read from `vars` instead of the process environment.
    pub fn vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }
}

/// Build a store from `vars`, keeping those under `{prefix}_` with the prefix
/// stripped.
pub fn env_to_store(
    prefix: Option<&str>,
    vars: impl IntoIterator<Item = (String, String)>,
) -> FlatStore {
    let needle = prefix.map(|p| format!("{p}_"));
    let mut store = FlatStore::new();
    for (key, value) in vars {
        let name = match &needle {
            Some(needle) => match key.strip_prefix(needle.as_str()) {
                Some(rest) => rest,
                None => continue,
            },
            None => key.as_str(),
        };
        if !name.is_empty() {
            store.set(name, value);
        }
    }
    store
}

impl Loader for EnvLoader {
    fn load(&self, root: &mut Node<'_>, _args: &[String]) -> Result<()> {
        let prefix = self.prefix.as_deref();
        let mut store = match &self.vars {
            Some(vars) => env_to_store(prefix, vars.iter().cloned()),
            None => env_to_store(prefix, std::env::vars()),
        };
        debug!(prefix = prefix.unwrap_or_default(), keys = store.len(), "loading env");
        root.fill(&mut store)?;

        if self.disallow_unused {
            let unused = store.unused(&[]);
            if !unused.is_empty() {
                let unused = unused
                    .into_iter()
                    .map(|key| match prefix {
                        Some(prefix) => format!("{prefix}_{key}"),
                        None => key,
                    })
                    .collect();
                return Err(TreefigError::UnusedEnv(unused));
            }
        }
        Ok(())
    }
}

// --- files ---

/// Loads config files named on the command line and in the environment.
///
/// Paths come from the `-f` flag (comma-separated, and the flag may repeat),
/// then from `$CONFIG_FILE` (comma-separated). Either channel is turned off
/// by naming it [`DISABLED`]. All files go into one store, in that order.
#[derive(Debug)]
pub struct FileLoader {
    pub disallow_unused: bool,
    pub config_file_flag: String,
    pub config_file_env: String,
    formats: Formats,
    env_value: Option<Option<String>>,
}

impl Default for FileLoader {
    fn default() -> Self {
        FileLoader {
            disallow_unused: false,
            config_file_flag: DEFAULT_CONFIG_FILE_FLAG.to_string(),
            config_file_env: DEFAULT_CONFIG_FILE_ENV.to_string(),
            formats: Formats::default(),
            env_value: None,
        }
    }
}

impl FileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disallow_unused(mut self, disallow: bool) -> Self {
        self.disallow_unused = disallow;
        self
    }

    pub fn config_file_flag(mut self, flag: &str) -> Self {
        self.config_file_flag = flag.to_string();
        self
    }

    pub fn config_file_env(mut self, env: &str) -> Self {
        self.config_file_env = env.to_string();
        self
    }

    /// Register a flattener for another file extension.
    pub fn format(mut self, extension: &str, flattener: impl Flattener + 'static) -> Self {
        self.formats.register(extension, flattener);
        self
    }

    /// Use `value` as the config-file variable instead of reading the process
    /// environment. `None` behaves as if it were unset.
    pub fn env_value(mut self, value: Option<&str>) -> Self {
        self.env_value = Some(value.map(str::to_string));
        self
    }

    /// Config file paths named by `args` and the environment, in load order.
    pub fn paths(&self, args: &[String]) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if self.config_file_flag != DISABLED {
            // syntax errors are the flag loader's to report
            if let Ok(flags) = flag::parse_args(args) {
                let key = case::to_dot_case(&self.config_file_flag);
                let indexed = (0..).map_while(|i| flags.value(&format!("{key}.{i}")));
                for list in flags.value(&key).into_iter().chain(indexed) {
                    if !list.is_empty() {
                        paths.extend(file::split_paths(list));
                    }
                }
            }
        }

        if self.config_file_env != DISABLED {
            let value = match &self.env_value {
                Some(value) => value.clone(),
                None => std::env::var(&self.config_file_env).ok(),
            };
            if let Some(list) = value.filter(|list| !list.is_empty()) {
                paths.extend(file::split_paths(&list));
            }
        }

        paths
    }
}

impl Loader for FileLoader {
    fn load(&self, root: &mut Node<'_>, args: &[String]) -> Result<()> {
        let paths = self.paths(args);
        if paths.is_empty() {
            return Ok(());
        }
        let mut store = self.formats.flatten_files(&paths)?;
        debug!(files = paths.len(), keys = store.len(), "loading config files");
        root.fill(&mut store)?;

        if self.disallow_unused {
            let unused = store.unused(&[]);
            if !unused.is_empty() {
                return Err(TreefigError::UnusedKeys(unused));
            }
        }
        Ok(())
    }
}

// --- flags ---

/// Loads `--key value` arguments.
///
/// Keys in `escape_unused` are never reported unused; by default that is the
/// config-file flag, which the [`FileLoader`] reads.
#[derive(Debug, Clone)]
pub struct FlagLoader {
    pub disallow_unused: bool,
    pub escape_unused: Vec<String>,
}

impl Default for FlagLoader {
    fn default() -> Self {
        FlagLoader {
            disallow_unused: false,
            escape_unused: vec![DEFAULT_CONFIG_FILE_FLAG.to_string()],
        }
    }
}

impl FlagLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disallow_unused(mut self, disallow: bool) -> Self {
        self.disallow_unused = disallow;
        self
    }

    pub fn escape_unused<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.escape_unused = keys.into_iter().map(Into::into).collect();
        self
    }
}

impl Loader for FlagLoader {
    fn load(&self, root: &mut Node<'_>, args: &[String]) -> Result<()> {
        let mut store = flag::parse_args(args)?;
        debug!(keys = store.len(), "loading flags");
        root.fill(&mut store)?;

        if self.disallow_unused {
            let escape: Vec<&str> = self.escape_unused.iter().map(String::as_str).collect();
            let unused = store.unused(&escape);
            if !unused.is_empty() {
                let unused = unused.into_iter().map(|key| format!("--{key}")).collect();
                return Err(TreefigError::UnusedFlags(unused));
            }
        }
        Ok(())
    }
}
