//! The tree filler.
//!
//! Only leaves and dynamic nodes are looked at directly; struct nodes are
//! walked through. A leaf whose key is absent (or empty) in the store keeps
//! whatever value it already had.

use tracing::trace;

use crate::error::{Result, TreefigError};
use crate::node::{Binding, Node};
use crate::store::Source;

pub(crate) fn fill(node: &mut Node<'_>, source: &mut dyn Source) -> Result<()> {
    let Node {
        key,
        binding,
        children,
        ..
    } = node;

    match binding {
        Binding::Dynamic(container) => match children.first() {
            Some(template) => container.fill(key, template, source),
            None => Ok(()),
        },
        Binding::Scalar(scalar) => {
            let raw = source.lookup(key);
            if raw.is_empty() {
                return Ok(());
            }
            trace!(key = %key, value = raw, "assigning");
            scalar
                .assign(raw)
                .map_err(|_| TreefigError::InvalidValue {
                    key: key.clone(),
                    value: raw.to_string(),
                    kind: scalar.kind(),
                })
        }
        Binding::Struct | Binding::Detached(_) => {
            for child in children.iter_mut() {
                fill(child, source)?;
            }
            Ok(())
        }
    }
}
