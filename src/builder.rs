use tracing::debug;

use crate::error::Result;
use crate::file::Flattener;
use crate::loader::{DISABLED, EnvLoader, FileLoader, FlagLoader, Loader, Loaders};
use crate::node::{Configure, Node};

/// A configured loading pipeline.
///
/// [`Treefig::default()`] reads the environment (lenient), then config files
/// (strict), then flags (strict). Use [`Treefig::builder()`] to change any of
/// that.
#[derive(Debug)]
pub struct Treefig {
    loaders: Loaders,
}

impl Treefig {
    pub fn builder() -> TreefigBuilder {
        TreefigBuilder::new()
    }

    /// A pipeline of exactly `loaders`, in order.
    pub fn from_loaders(loaders: Loaders) -> Self {
        Treefig { loaders }
    }

    /// Compile `config` and run every loader against it. `args` excludes the
    /// program name.
    ///
    /// On failure, fields assigned before the failing step keep their new
    /// values.
    pub fn load<C: Configure + ?Sized>(&self, config: &mut C, args: &[String]) -> Result<()> {
        let mut root = Node::compile(config)?;
        debug!(
            nodes = root.flat().len(),
            loaders = self.loaders.len(),
            "loading config"
        );
        self.loaders.load(&mut root, args)
    }
}

impl Default for Treefig {
    fn default() -> Self {
        TreefigBuilder::new().build()
    }
}

/// Builder for the stock env, file and flag pipeline.
#[derive(Debug)]
pub struct TreefigBuilder {
    env_prefix: Option<String>,
    env_enabled: bool,
    strict: bool,
    strict_env: bool,
    file: FileLoader,
    extra: Loaders,
}

impl TreefigBuilder {
    fn new() -> Self {
        Self {
            env_prefix: None,
            env_enabled: true,
            strict: true,
            strict_env: false,
            file: FileLoader::new(),
            extra: Loaders::new(),
        }
    }

    /// Only read environment variables starting with `{prefix}_`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Enable or disable strict mode for files and flags (default: `true`).
    /// In strict mode, keys nothing in the config reads produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Strict mode for the environment (default: `false`). Only sensible
    /// together with [`env_prefix`](Self::env_prefix).
    pub fn strict_env(mut self, strict: bool) -> Self {
        self.strict_env = strict;
        self
    }

    /// Name of the flag listing config files (default: `f`, `"-"` disables).
    pub fn config_file_flag(mut self, flag: &str) -> Self {
        self.file = self.file.config_file_flag(flag);
        self
    }

    /// Name of the variable listing config files (default: `CONFIG_FILE`,
    /// `"-"` disables).
    pub fn config_file_env(mut self, env: &str) -> Self {
        self.file = self.file.config_file_env(env);
        self
    }

    /// Read files with `extension` through `flattener`.
    pub fn format(mut self, extension: &str, flattener: impl Flattener + 'static) -> Self {
        self.file = self.file.format(extension, flattener);
        self
    }

    /// Append a loader after the stock ones.
    pub fn loader(mut self, loader: impl Loader + 'static) -> Self {
        self.extra.push(loader);
        self
    }

    pub fn build(self) -> Treefig {
        let mut loaders = Loaders::new();

        if self.env_enabled {
            loaders.push(
                EnvLoader::new(self.env_prefix.as_deref()).disallow_unused(self.strict_env),
            );
        }

        let escape: Vec<String> = if self.file.config_file_flag == DISABLED {
            Vec::new()
        } else {
            vec![self.file.config_file_flag.clone()]
        };
        loaders.push(self.file.disallow_unused(self.strict));
        loaders.push(
            FlagLoader::new()
                .disallow_unused(self.strict)
                .escape_unused(escape),
        );
        loaders.push(self.extra);

        Treefig { loaders }
    }

    /// Build and load in one step.
    pub fn load<C: Configure + ?Sized>(self, config: &mut C, args: &[String]) -> Result<()> {
        self.build().load(config, args)
    }
}
