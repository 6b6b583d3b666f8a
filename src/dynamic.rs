//! Maps and sequences.
//!
//! A dynamic node's cardinality is unknown until the data arrives. Filling
//! asks the store which segments exist under `key.`, builds one element per
//! segment from the node's template, and folds the results into the
//! container.
//!
//! Each element is built by [`instantiate`]: a fresh `T::default()` owned by
//! the call, a detached clone of the template re-keyed to the element's
//! position, the scratch value compiled into the clone, the clone filled,
//! then dropped. The value is returned to the container by move, so sibling
//! elements never share storage.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use indexmap::IndexMap;
use tracing::trace;

use crate::case::DOT;
use crate::error::{Result, TreefigError};
use crate::fill;
use crate::node::{Configure, Node};
use crate::store::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicKind {
    Map,
    Sequence,
}

/// A container the filler grows from discovered store keys.
pub trait Dynamic {
    fn kind(&self) -> DynamicKind;

    /// Discover elements under `key.` and build them from `template`.
    fn fill(&mut self, key: &str, template: &Node<'_>, source: &mut dyn Source) -> Result<()>;

    /// Call `visit` with each element's segment and the element bound into a
    /// clone of `template` keyed at `key.segment`, in container order.
    fn elements(&mut self, key: &str, template: &Node<'_>, visit: &mut Visit<'_>) -> Result<()>;
}

/// Callback for [`Dynamic::elements`].
pub type Visit<'v> = dyn FnMut(&str, &mut Node<'_>) -> Result<()> + 'v;

/// Build one element at `prefix` + `segment` from `template`.
pub fn instantiate<T: Configure + Default>(
    template: &Node<'_>,
    prefix: &str,
    segment: &str,
    source: &mut dyn Source,
) -> Result<T> {
    let mut value = T::default();
    {
        let mut clone = template.clone_shape();
        clone.rekey(prefix, &format!("{prefix}{segment}"));
        value.compile(&mut clone)?;
        trace!(key = %clone.key(), "instantiating element");
        fill::fill(&mut clone, source)?;
    }
    Ok(value)
}

fn visit_element<T: Configure>(
    key: &str,
    template: &Node<'_>,
    segment: &str,
    element: &mut T,
    visit: &mut Visit<'_>,
) -> Result<()> {
    let prefix = format!("{key}{DOT}");
    let mut clone = template.clone_shape();
    clone.rekey(&prefix, &format!("{prefix}{segment}"));
    element.compile(&mut clone)?;
    visit(segment, &mut clone)
}

impl<T: Configure + Default> Dynamic for Vec<T> {
    fn kind(&self) -> DynamicKind {
        DynamicKind::Sequence
    }

    fn fill(&mut self, key: &str, template: &Node<'_>, source: &mut dyn Source) -> Result<()> {
        let prefix = format!("{key}{DOT}");
        let segments = source.child_keys_with_prefix(&prefix);
        if segments.is_empty() {
            return Ok(());
        }

        let mut len = self.len();
        let mut elements = Vec::with_capacity(segments.len());
        for segment in segments {
            let index = segment
                .parse::<usize>()
                .ok()
                .and_then(|index| index.checked_add(1).map(|next| (index, next)));
            let Some((index, next)) = index else {
                return Err(TreefigError::InvalidIndex {
                    key: format!("{prefix}{segment}"),
                    segment,
                });
            };
            len = len.max(next);
            elements.push((index, instantiate::<T>(template, &prefix, &segment, source)?));
        }

        // grow, never shrink; gaps stay at their default
        if len > self.len() {
            self.try_reserve(len - self.len()).map_err(|_| {
                let segment = (len - 1).to_string();
                TreefigError::InvalidIndex {
                    key: format!("{prefix}{segment}"),
                    segment,
                }
            })?;
            self.resize_with(len, T::default);
        }
        for (index, element) in elements {
            self[index] = element;
        }
        Ok(())
    }

    fn elements(&mut self, key: &str, template: &Node<'_>, visit: &mut Visit<'_>) -> Result<()> {
        for (index, element) in self.iter_mut().enumerate() {
            visit_element(key, template, &index.to_string(), element, visit)?;
        }
        Ok(())
    }
}

impl<T: Configure + Default> Configure for Vec<T> {
    fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
        node.bind_dynamic::<T>(self, "nth item in list")
    }
}

macro_rules! map_dynamic {
    ($map:ident $(, $hasher:ident)?) => {
        impl<T: Configure + Default $(, $hasher: BuildHasher)?> Dynamic for $map<String, T $(, $hasher)?> {
            fn kind(&self) -> DynamicKind {
                DynamicKind::Map
            }

            fn fill(
                &mut self,
                key: &str,
                template: &Node<'_>,
                source: &mut dyn Source,
            ) -> Result<()> {
                let prefix = format!("{key}{DOT}");
                for segment in source.child_keys_with_prefix(&prefix) {
                    let element = instantiate::<T>(template, &prefix, &segment, source)?;
                    self.insert(segment, element);
                }
                Ok(())
            }

            fn elements(
                &mut self,
                key: &str,
                template: &Node<'_>,
                visit: &mut Visit<'_>,
            ) -> Result<()> {
                for (segment, element) in self.iter_mut() {
                    visit_element(key, template, segment, element, visit)?;
                }
                Ok(())
            }
        }

        impl<T: Configure + Default $(, $hasher: BuildHasher)?> Configure for $map<String, T $(, $hasher)?> {
            fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
                node.bind_dynamic::<T>(self, "indexed value by key in map")
            }
        }
    };
}

map_dynamic!(HashMap, S);
map_dynamic!(IndexMap, S);
map_dynamic!(BTreeMap);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::Server;
    use crate::store::FlatStore;

    #[derive(Default)]
    struct Lists {
        numbers: Vec<i32>,
        grid: Vec<Vec<u8>>,
        servers: Vec<Server>,
    }

    impl Configure for Lists {
        fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
            node.bind_struct();
            let Lists {
                numbers,
                grid,
                servers,
            } = self;
            node.field("numbers", "numbers", "", numbers)?;
            node.field("grid", "grid", "", grid)?;
            node.field("servers", "servers", "", servers)
        }
    }

    #[derive(Default)]
    struct Maps {
        labels: HashMap<String, String>,
        ordered: IndexMap<String, u16>,
        nested: BTreeMap<String, BTreeMap<String, bool>>,
        servers: BTreeMap<String, Server>,
    }

    impl Configure for Maps {
        fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
            node.bind_struct();
            let Maps {
                labels,
                ordered,
                nested,
                servers,
            } = self;
            node.field("labels", "labels", "", labels)?;
            node.field("ordered", "ordered", "", ordered)?;
            node.field("nested", "nested", "", nested)?;
            node.field("servers", "servers", "", servers)
        }
    }

    fn fill<C: Configure>(config: &mut C, pairs: &[(&str, &str)]) -> Result<FlatStore> {
        let mut store: FlatStore = pairs.iter().copied().collect();
        Node::compile(config)?.fill(&mut store)?;
        Ok(store)
    }

    #[test]
    fn sparse_sequence_pads_with_defaults() {
        let mut lists = Lists::default();
        fill(&mut lists, &[("numbers.2", "9")]).unwrap();
        assert_eq!(lists.numbers, vec![0, 0, 9]);
    }

    #[test]
    fn sequence_never_shrinks() {
        let mut lists = Lists {
            numbers: vec![1, 2, 3, 4],
            ..Default::default()
        };
        fill(&mut lists, &[("numbers.1", "20")]).unwrap();
        assert_eq!(lists.numbers, vec![1, 20, 3, 4]);
    }

    #[test]
    fn absent_sequence_untouched() {
        let mut lists = Lists::default();
        fill(&mut lists, &[("other", "x")]).unwrap();
        assert!(lists.numbers.is_empty());
        assert!(lists.servers.is_empty());
    }

    #[test]
    fn sequence_of_sequences() {
        let mut lists = Lists::default();
        fill(&mut lists, &[("grid.0.1", "5"), ("grid.1.0", "7")]).unwrap();
        assert_eq!(lists.grid, vec![vec![0, 5], vec![7]]);
    }

    #[test]
    fn sequence_of_structs() {
        let mut lists = Lists::default();
        fill(
            &mut lists,
            &[
                ("servers.1.host", "b"),
                ("servers.0.host", "a"),
                ("servers.0.port", "80"),
                ("servers.1.tags.0", "edge"),
            ],
        )
        .unwrap();
        assert_eq!(lists.servers.len(), 2);
        assert_eq!(lists.servers[0].host, "a");
        assert_eq!(lists.servers[0].port, 80);
        assert!(lists.servers[0].tags.is_empty());
        assert_eq!(lists.servers[1].host, "b");
        assert_eq!(lists.servers[1].tags, vec!["edge"]);
    }

    #[test]
    fn non_integer_index_fails() {
        let mut lists = Lists::default();
        let err = fill(&mut lists, &[("numbers.first", "1")]).unwrap_err();
        assert!(matches!(
            err,
            TreefigError::InvalidIndex { ref segment, .. } if segment == "first"
        ));
    }

    #[test]
    fn unallocatable_index_fails() {
        let mut lists = Lists::default();
        let err = fill(&mut lists, &[("numbers.18446744073709551614", "9")]).unwrap_err();
        assert!(matches!(err, TreefigError::InvalidIndex { .. }));
        assert!(lists.numbers.is_empty());
    }

    #[test]
    fn index_past_usize_fails() {
        let mut lists = Lists::default();
        let err = fill(&mut lists, &[("numbers.18446744073709551616", "9")]).unwrap_err();
        assert!(matches!(err, TreefigError::InvalidIndex { .. }));
    }

    #[test]
    fn map_of_strings() {
        let mut maps = Maps::default();
        fill(&mut maps, &[("labels.x", "v1"), ("labels.y", "v2")]).unwrap();
        assert_eq!(maps.labels.len(), 2);
        assert_eq!(maps.labels["x"], "v1");
        assert_eq!(maps.labels["y"], "v2");
    }

    #[test]
    fn index_map_keeps_discovery_order() {
        let mut maps = Maps::default();
        fill(&mut maps, &[("ordered.zeta", "1"), ("ordered.alpha", "2")]).unwrap();
        let keys: Vec<&str> = maps.ordered.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn map_of_maps() {
        let mut maps = Maps::default();
        fill(
            &mut maps,
            &[("nested.a.on", "true"), ("nested.a.off", "f"), ("nested.b.on", "1")],
        )
        .unwrap();
        assert!(maps.nested["a"]["on"]);
        assert!(!maps.nested["a"]["off"]);
        assert_eq!(maps.nested["b"].len(), 1);
    }

    #[test]
    fn map_of_structs_marks_keys_used() {
        let mut maps = Maps::default();
        let store = fill(
            &mut maps,
            &[("servers.east.host", "e"), ("servers.east.port", "81")],
        )
        .unwrap();
        assert_eq!(maps.servers["east"].host, "e");
        assert_eq!(maps.servers["east"].port, 81);
        assert!(store.unused(&[]).is_empty());
    }

    #[test]
    fn map_keeps_existing_entries() {
        let mut maps = Maps::default();
        maps.labels.insert("keep".into(), "me".into());
        fill(&mut maps, &[("labels.new", "v")]).unwrap();
        assert_eq!(maps.labels.len(), 2);
    }

    #[test]
    fn element_parse_error_names_full_key() {
        let mut maps = Maps::default();
        let err = fill(&mut maps, &[("ordered.web", "http")]).unwrap_err();
        assert!(matches!(
            err,
            TreefigError::InvalidValue { ref key, .. } if key == "ordered.web"
        ));
    }
}
