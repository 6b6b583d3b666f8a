use std::path::PathBuf;

use thiserror::Error;

use crate::scalar::ScalarKind;

pub type Result<T, E = TreefigError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TreefigError {
    // --- schema ---
    #[error("type {type_name} cannot be the root of a config, only structs can")]
    UnsupportedRoot { type_name: &'static str },

    #[error("type {type_name} cannot be embedded, only structs can")]
    UnsupportedEmbed { type_name: &'static str },

    #[error("duplicate key '{key}': fields '{first}' and '{second}' normalize to the same key")]
    DuplicateKey {
        key: String,
        first: &'static str,
        second: &'static str,
    },

    // --- source syntax ---
    #[error("bad flag syntax: {0}")]
    BadFlag(String),

    #[error("expected config file path, but got empty string")]
    EmptyFilePath,

    #[error("unrecognized config file extension, file: {0}")]
    MissingExtension(PathBuf),

    #[error("unsupported config file extension: {0}")]
    UnsupportedExtension(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: yaml_rust2::ScanError,
    },

    #[error("Failed to parse {path}: mapping key under '{parent}' is not a scalar")]
    YamlKey { path: PathBuf, parent: String },

    #[error("Failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    // --- value parse ---
    #[error("Invalid value for '{key}': cannot parse '{value}' as {kind}")]
    InvalidValue {
        key: String,
        value: String,
        kind: ScalarKind,
    },

    #[error("Invalid index for '{key}': '{segment}' is not a list position")]
    InvalidIndex { key: String, segment: String },

    // --- unused keys ---
    #[error("unused env {}", .0.join(", "))]
    UnusedEnv(Vec<String>),

    #[error("unused keys {}", .0.join(", "))]
    UnusedKeys(Vec<String>),

    #[error("unused flag {}", .0.join(", "))]
    UnusedFlags(Vec<String>),
}
