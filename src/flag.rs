//! GNU-style long flag parsing into a [`FlatStore`].
//!
//! There is no flag registry: every `--name` is configuration data, addressed
//! by its normalized name. The grammar:
//!
//! - `--name value` or `-name value` assigns `value`.
//! - `--name=value` assigns in a single token.
//! - `--name` followed by another flag (or nothing) is a boolean, `"true"`.
//! - `--` ends flag parsing; so does the first token that is not a flag.
//!   Everything after is positional and ignored.
//!
//! A flag given more than once becomes a list: `--tag a --tag b` yields
//! `tag.0 = a` and `tag.1 = b`, and the bare `tag` key is never written.

use std::collections::HashMap;

use crate::error::{Result, TreefigError};
use crate::store::FlatStore;

/// Parse `args` (without the program name) into a store.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<FlatStore> {
    let mut set = FlagSet::default();
    let mut rest = args.iter().map(|arg| arg.as_ref()).peekable();

    while let Some(&token) = rest.peek() {
        let Some(name) = flag_name(token)? else {
            break;
        };
        rest.next();
        let Some(name) = name else {
            // "--" terminator
            break;
        };

        if let Some((name, value)) = name.split_once('=') {
            set.push(name, value);
            continue;
        }

        match rest.peek() {
            Some(&next) if !next.starts_with('-') => {
                set.push(name, next);
                rest.next();
            }
            _ => set.push(name, "true"),
        }
    }

    Ok(set.into_store())
}

/// Classify a token.
///
/// `Ok(None)` means not a flag, `Ok(Some(None))` is the `--` terminator,
/// `Ok(Some(Some(name)))` a flag name with its dashes removed.
fn flag_name(token: &str) -> Result<Option<Option<&str>>> {
    if token.len() < 2 || !token.starts_with('-') {
        return Ok(None);
    }
    if token == "--" {
        return Ok(Some(None));
    }
    let name = token
        .strip_prefix("--")
        .unwrap_or_else(|| &token[1..]);
    if name.starts_with('-') || name.starts_with('=') {
        return Err(TreefigError::BadFlag(token.to_string()));
    }
    Ok(Some(Some(name)))
}

#[derive(Default)]
struct FlagSet<'a> {
    order: Vec<&'a str>,
    values: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> FlagSet<'a> {
    fn push(&mut self, name: &'a str, value: &'a str) {
        let values = self.values.entry(name).or_default();
        if values.is_empty() {
            self.order.push(name);
        }
        values.push(value);
    }

    fn into_store(self) -> FlatStore {
        let mut store = FlatStore::new();
        for name in self.order {
            match self.values[name].as_slice() {
                [single] => store.set(name, *single),
                many => {
                    for (index, value) in many.iter().enumerate() {
                        store.set(&format!("{name}.{index}"), *value);
                    }
                }
            }
        }
        store
    }
}
