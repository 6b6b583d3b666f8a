//! Structured config files, flattened into a [`FlatStore`].
//!
//! A mapping contributes `parent.child`, a sequence `parent.0`, `parent.1`, and
//! so on; scalars are written with [`FlatStore::set`]. Several files (and
//! several YAML documents in one file) all land in the same store in order, so
//! a later file overrides an earlier one key by key.
//!
//! The format is picked by file extension through [`Formats`]. YAML (`.yaml`,
//! `.yml`), TOML and JSON are registered by default; anything else can be added
//! with [`Formats::register`]. A path without an extension, or with one nobody
//! registered, is an error rather than a skip.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;
use yaml_rust2::parser::{Event, EventReceiver, Parser};
use yaml_rust2::scanner::TScalarStyle;

use crate::case::DOT;
use crate::error::{Result, TreefigError};
use crate::store::FlatStore;

/// Flattens one file's contents into a store.
pub trait Flattener {
    fn flatten(&self, store: &mut FlatStore, data: &str, path: &Path) -> Result<()>;
}

impl<F> Flattener for F
where
    F: Fn(&mut FlatStore, &str, &Path) -> Result<()>,
{
    fn flatten(&self, store: &mut FlatStore, data: &str, path: &Path) -> Result<()> {
        self(store, data, path)
    }
}

/// Extension-keyed flattener registry.
pub struct Formats {
    by_extension: IndexMap<String, Box<dyn Flattener>>,
}

impl Formats {
    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Formats {
            by_extension: IndexMap::new(),
        }
    }

    /// Register `flattener` for `extension` (with or without the leading dot),
    /// replacing any previous one.
    pub fn register(&mut self, extension: &str, flattener: impl Flattener + 'static) {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self.by_extension.insert(extension, Box::new(flattener));
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.by_extension.keys().map(String::as_str)
    }

    /// The flattener for `path`'s extension.
    pub fn for_path(&self, path: &Path) -> Result<&dyn Flattener> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| TreefigError::MissingExtension(path.to_path_buf()))?;
        self.by_extension
            .get(&extension.to_ascii_lowercase())
            .map(|flattener| flattener.as_ref())
            .ok_or_else(|| TreefigError::UnsupportedExtension(extension.to_string()))
    }

    /// Read and flatten `paths` in order into one store.
    pub fn flatten_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<FlatStore> {
        if paths.iter().any(|path| path.as_ref().as_os_str().is_empty()) {
            return Err(TreefigError::EmptyFilePath);
        }

        let mut store = FlatStore::new();
        for path in paths {
            let path = path.as_ref();
            let flattener = self.for_path(path)?;
            let data = std::fs::read_to_string(path).map_err(|source| TreefigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let before = store.len();
            flattener.flatten(&mut store, &data, path)?;
            debug!(path = %path.display(), keys = store.len() - before, "flattened config file");
        }
        Ok(store)
    }
}

impl Default for Formats {
    fn default() -> Self {
        let mut formats = Formats::empty();
        formats.register("yaml", Yaml);
        formats.register("yml", Yaml);
        formats.register("toml", Toml);
        formats.register("json", Json);
        formats
    }
}

impl fmt::Debug for Formats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.extensions()).finish()
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}{DOT}{key}")
    }
}

/// Write a scalar, unless it sits at the document root.
fn set(store: &mut FlatStore, key: &str, value: String) {
    if !key.is_empty() {
        store.set(key, value);
    }
}

// --- YAML ---

/// YAML, including multi-document streams.
///
/// Scalars keep the text they were written with: `1.10` stays `1.10` and
/// `01234` keeps its leading zero. Plain `~`, `null` and empty scalars are
/// stored as the empty string. Aliases expand to the anchored node.
#[derive(Debug, Clone, Copy, Default)]
pub struct Yaml;

impl Flattener for Yaml {
    fn flatten(&self, store: &mut FlatStore, data: &str, path: &Path) -> Result<()> {
        let mut events = YamlEvents::default();
        Parser::new_from_str(data)
            .load(&mut events, true)
            .map_err(|source| TreefigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;

        let mut walker = YamlWalker {
            events: &events.0,
            anchors: HashMap::new(),
            store,
            path,
        };
        let mut at = 0;
        while at < events.0.len() {
            at = match &events.0[at] {
                Event::Scalar(..)
                | Event::SequenceStart(..)
                | Event::MappingStart(..)
                | Event::Alias(_) => walker.node(at, "")?,
                _ => at + 1,
            };
        }
        Ok(())
    }
}

#[derive(Default)]
struct YamlEvents(Vec<Event>);

impl EventReceiver for YamlEvents {
    fn on_event(&mut self, event: Event) {
        self.0.push(event);
    }
}

struct YamlWalker<'e, 's> {
    events: &'e [Event],
    /// anchor id -> event range of the anchored node
    anchors: HashMap<usize, (usize, usize)>,
    store: &'s mut FlatStore,
    path: &'e Path,
}

impl YamlWalker<'_, '_> {
    /// Flatten the node starting at `at` under `key`; returns the index past it.
    fn node(&mut self, at: usize, key: &str) -> Result<usize> {
        let events = self.events;
        let (next, anchor) = match events.get(at) {
            Some(Event::Scalar(value, style, anchor, _)) => {
                set(self.store, key, yaml_text(value, *style));
                (at + 1, *anchor)
            }
            Some(Event::SequenceStart(anchor, _)) => {
                let mut cursor = at + 1;
                let mut index = 0usize;
                while !matches!(events.get(cursor), Some(Event::SequenceEnd) | None) {
                    cursor = self.node(cursor, &join(key, &index.to_string()))?;
                    index += 1;
                }
                (cursor + 1, *anchor)
            }
            Some(Event::MappingStart(anchor, _)) => {
                let mut cursor = at + 1;
                while !matches!(events.get(cursor), Some(Event::MappingEnd) | None) {
                    let child = match events.get(cursor) {
                        Some(Event::Scalar(child, style, ..)) => yaml_text(child, *style),
                        _ => {
                            return Err(TreefigError::YamlKey {
                                path: self.path.to_path_buf(),
                                parent: key.to_string(),
                            });
                        }
                    };
                    cursor = self.node(cursor + 1, &join(key, &child))?;
                }
                (cursor + 1, *anchor)
            }
            Some(Event::Alias(id)) => {
                if let Some(&(start, _)) = self.anchors.get(id) {
                    self.node(start, key)?;
                }
                (at + 1, 0)
            }
            _ => (at + 1, 0),
        };
        if anchor > 0 {
            self.anchors.insert(anchor, (at, next));
        }
        Ok(next)
    }
}

fn yaml_text(value: &str, style: TScalarStyle) -> String {
    let null = matches!(value, "" | "~" | "null" | "Null" | "NULL");
    if style == TScalarStyle::Plain && null {
        String::new()
    } else {
        value.to_string()
    }
}

// --- TOML ---

#[derive(Debug, Clone, Copy, Default)]
pub struct Toml;

impl Flattener for Toml {
    fn flatten(&self, store: &mut FlatStore, data: &str, path: &Path) -> Result<()> {
        let table: toml::Table = toml::from_str(data).map_err(|source| TreefigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        for (key, value) in &table {
            flatten_toml(store, key, value);
        }
        Ok(())
    }
}

fn flatten_toml(store: &mut FlatStore, key: &str, value: &toml::Value) {
    use toml::Value;

    match value {
        Value::Table(table) => {
            for (child, value) in table {
                flatten_toml(store, &join(key, child), value);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten_toml(store, &join(key, &index.to_string()), value);
            }
        }
        Value::String(s) => set(store, key, s.clone()),
        Value::Integer(i) => set(store, key, i.to_string()),
        Value::Float(f) => set(store, key, f.to_string()),
        Value::Boolean(b) => set(store, key, b.to_string()),
        Value::Datetime(dt) => set(store, key, dt.to_string()),
    }
}

// --- JSON ---

#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Flattener for Json {
    fn flatten(&self, store: &mut FlatStore, data: &str, path: &Path) -> Result<()> {
        let value: serde_json::Value =
            serde_json::from_str(data).map_err(|source| TreefigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        flatten_json(store, "", &value);
        Ok(())
    }
}

fn flatten_json(store: &mut FlatStore, key: &str, value: &serde_json::Value) {
    use serde_json::Value;

    match value {
        Value::Object(object) => {
            for (child, value) in object {
                flatten_json(store, &join(key, child), value);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten_json(store, &join(key, &index.to_string()), value);
            }
        }
        Value::Null => set(store, key, String::new()),
        Value::Bool(b) => set(store, key, b.to_string()),
        Value::Number(n) => set(store, key, n.to_string()),
        Value::String(s) => set(store, key, s.clone()),
    }
}

/// Split a comma-separated path list. Paths are taken as written.
pub fn split_paths(list: &str) -> Vec<PathBuf> {
    list.split(',').map(PathBuf::from).collect()
}
