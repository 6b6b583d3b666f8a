//! Human-readable views of a compiled tree.
//!
//! [`listing`] pairs every key with its current value. [`usage`] is a table
//! of every key the sources can set, with element positions shown as `<n>`
//! for lists and `<key>` for maps:
//!
//! ```text
//!   --host                 APP_HOST                 string  Address to bind.
//!   --servers              APP_SERVERS              list    Upstream servers.
//!   --servers-<n>-port     APP_SERVERS_<n>_PORT     u16
//! ```

use crate::case::{self, DOT};
use crate::dynamic::DynamicKind;
use crate::error::Result;
use crate::node::{Binding, Node, Shape};

const SEQUENCE_SLOT: &str = "<n>";
const MAP_SLOT: &str = "<key>";

/// Render the value bound at `node`.
///
/// Scalars render as they would be written in a source; lists as `[a,b]`;
/// maps and structs as `{k=v,...}`. Detached nodes have no value and render
/// empty.
pub fn render(node: &mut Node<'_>) -> Result<String> {
    let Node {
        key,
        binding,
        children,
        ..
    } = node;

    match binding {
        Binding::Scalar(scalar) => Ok(scalar.render()),
        Binding::Dynamic(container) => {
            let Some(template) = children.first() else {
                return Ok(String::new());
            };
            let kind = container.kind();
            let mut items = Vec::new();
            container.elements(key, template, &mut |segment, element| {
                items.push((segment.to_string(), render(element)?));
                Ok(())
            })?;
            Ok(match kind {
                DynamicKind::Sequence => {
                    let values: Vec<String> = items.into_iter().map(|(_, value)| value).collect();
                    format!("[{}]", values.join(","))
                }
                DynamicKind::Map => braced(items),
            })
        }
        Binding::Struct => {
            let mut items = Vec::with_capacity(children.len());
            for child in children.iter_mut() {
                let name = child.name.clone();
                items.push((name, render(child)?));
            }
            Ok(braced(items))
        }
        Binding::Detached(_) => Ok(String::new()),
    }
}

fn braced(items: Vec<(String, String)>) -> String {
    let items: Vec<String> = items
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    format!("{{{}}}", items.join(","))
}

impl Node<'_> {
    /// See [`render`].
    pub fn render_value(&mut self) -> Result<String> {
        render(self)
    }
}

/// Every scalar as `(key, rendered value)`, sorted by key.
///
/// Lists and maps are listed element by element (`tags.0`, `servers.east.port`),
/// so the pairs fed back into a [`FlatStore`](crate::FlatStore) and filled
/// into a fresh value reproduce this one. Empty containers contribute nothing.
pub fn listing(root: &mut Node<'_>) -> Result<Vec<(String, String)>> {
    let mut rows = Vec::new();
    list_into(root, &mut rows)?;
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(rows)
}

fn list_into(node: &mut Node<'_>, rows: &mut Vec<(String, String)>) -> Result<()> {
    let Node {
        key,
        binding,
        children,
        ..
    } = node;

    match binding {
        Binding::Scalar(scalar) => rows.push((key.clone(), scalar.render())),
        Binding::Dynamic(container) => {
            if let Some(template) = children.first() {
                container.elements(key, template, &mut |_, element| list_into(element, rows))?;
            }
        }
        Binding::Struct => {
            for child in children.iter_mut() {
                list_into(child, rows)?;
            }
        }
        Binding::Detached(_) => {}
    }
    Ok(())
}

/// One settable key, as [`usage`] prints it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRow {
    /// Key segments, with `<n>` / `<key>` standing in for element positions.
    pub segments: Vec<String>,
    pub shape: Shape,
    pub description: String,
}

impl UsageRow {
    /// `string`, `u16`, `list`, `map`, ...
    pub fn kind(&self) -> String {
        shape_name(self.shape)
    }

    pub fn key(&self) -> String {
        self.segments.join(".")
    }

    pub fn flag(&self) -> String {
        format!("--{}", self.project(case::to_dash_case, "-"))
    }

    pub fn env(&self, prefix: Option<&str>) -> String {
        let name = self.project(case::to_screaming_case, "_");
        match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}_{name}"),
            _ => name,
        }
    }

    /// Whether this row sits inside a list or map element.
    pub fn is_element(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| is_slot(segment))
    }

    fn project(&self, convert: fn(&str) -> String, delimiter: &str) -> String {
        let segments: Vec<String> = self
            .segments
            .iter()
            .map(|segment| {
                if is_slot(segment) {
                    segment.clone()
                } else {
                    convert(segment)
                }
            })
            .collect();
        segments.join(delimiter)
    }
}

fn is_slot(segment: &str) -> bool {
    segment == SEQUENCE_SLOT || segment == MAP_SLOT
}

fn shape_name(shape: Shape) -> String {
    match shape {
        Shape::Struct => "struct".to_string(),
        Shape::Scalar(kind) => kind.to_string(),
        Shape::Dynamic(DynamicKind::Sequence) => "list".to_string(),
        Shape::Dynamic(DynamicKind::Map) => "map".to_string(),
    }
}

/// Every settable key, in tree order, descending into element templates.
pub fn rows(root: &Node<'_>) -> Vec<UsageRow> {
    let mut rows = Vec::new();
    rows_into(root, Vec::new(), &mut rows);
    rows
}

fn rows_into(node: &Node<'_>, segments: Vec<String>, rows: &mut Vec<UsageRow>) {
    if (node.children().is_empty() || node.is_dynamic()) && !segments.is_empty() {
        rows.push(UsageRow {
            segments: segments.clone(),
            shape: node.shape(),
            description: node.description().to_string(),
        });
    }

    match node.shape() {
        Shape::Dynamic(kind) => {
            if let Some(template) = node.template() {
                let slot = match kind {
                    DynamicKind::Sequence => SEQUENCE_SLOT,
                    DynamicKind::Map => MAP_SLOT,
                };
                let mut segments = segments;
                segments.push(slot.to_string());
                rows_into(template, segments, rows);
            }
        }
        _ => {
            for child in node.children() {
                let rest = child.key().strip_prefix(node.key()).unwrap_or(child.key());
                let mut child_segments = segments.clone();
                child_segments.extend(
                    rest.split(DOT)
                        .filter(|segment| !segment.is_empty())
                        .map(str::to_string),
                );
                rows_into(child, child_segments, rows);
            }
        }
    }
}

/// Aligned flag / env / kind / description table, one row per settable key.
pub fn usage(root: &Node<'_>, env_prefix: Option<&str>) -> String {
    let table: Vec<[String; 4]> = rows(root)
        .into_iter()
        .map(|row| {
            [
                row.flag(),
                row.env(env_prefix),
                row.kind(),
                row.description.clone(),
            ]
        })
        .collect();

    let mut widths = [0usize; 3];
    for cells in &table {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    for [flag, env, kind, description] in &table {
        let line = format!(
            "  {flag:<fw$}  {env:<ew$}  {kind:<kw$}  {description}",
            fw = widths[0],
            ew = widths[1],
            kw = widths[2],
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Everything, Nested, Server, Widths};
    use crate::store::FlatStore;

    #[test]
    fn render_scalars_lists_and_structs() {
        let mut server = Server {
            host: "h".into(),
            port: 80,
            tags: vec!["a".into(), "b".into()],
        };
        let mut root = Node::compile(&mut server).unwrap();
        assert_eq!(root.render_value().unwrap(), "{host=h,port=80,tags=[a,b]}");
    }

    #[test]
    fn render_maps_and_nested_lists() {
        let mut everything = Everything::default();
        everything.limits.insert("cpu".into(), 2);
        everything.limits.insert("mem".into(), 512);
        everything.matrix = vec![vec![1, 2], vec![], vec![3]];
        let mut root = Node::compile(&mut everything).unwrap();
        let listing = listing(&mut root).unwrap();
        let get = |key: &str| {
            listing
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("limits.cpu"), Some("2"));
        assert_eq!(get("limits.mem"), Some("512"));
        assert_eq!(get("matrix.0.1"), Some("2"));
        assert_eq!(get("matrix.2.0"), Some("3"));
        assert_eq!(get("matrix"), None);
        assert!(listing.iter().all(|(k, _)| !k.starts_with("servers")));
        assert_eq!(get("nested.log.level"), Some(""));

        assert!(root.render_value().unwrap().contains("matrix=[[1,2],[],[3]]"));
    }

    #[test]
    fn listing_is_sorted_by_key() {
        let mut nested = Nested::default();
        let mut root = Node::compile(&mut nested).unwrap();
        let keys: Vec<String> = listing(&mut root)
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(
            keys,
            vec!["log.level", "primary.host", "primary.port", "primary.tags"]
        );
    }

    #[test]
    fn listing_refills_to_the_same_values() {
        let mut widths = Widths {
            i8: i8::MIN,
            i16: i16::MAX,
            i32: i32::MIN,
            i64: i64::MAX,
            isize: isize::MIN,
            u8: u8::MAX,
            u16: u16::MAX,
            u32: u32::MAX,
            u64: u64::MAX,
            usize: usize::MAX,
            f32: f32::MIN_POSITIVE,
            f64: f64::MAX,
        };
        let mut store: FlatStore = {
            let mut root = Node::compile(&mut widths).unwrap();
            listing(&mut root).unwrap().into_iter().collect()
        };

        let mut copy = Widths::default();
        Node::compile(&mut copy).unwrap().fill(&mut store).unwrap();
        assert_eq!(copy, widths);
    }

    #[test]
    fn listing_refills_lists_and_maps() {
        let mut everything = Everything {
            name: "svc".into(),
            enabled: true,
            servers: vec![
                Server {
                    host: "a".into(),
                    port: 80,
                    tags: vec!["x".into(), "y".into()],
                },
                Server {
                    host: "b".into(),
                    ..Default::default()
                },
            ],
            matrix: vec![vec![1, 2], vec![], vec![3]],
            ..Default::default()
        };
        everything.labels.insert("team".into(), "core".into());
        everything.limits.insert("cpu".into(), 2);
        everything.nested.primary.tags = vec!["edge".into()];

        let mut store: FlatStore = {
            let mut root = Node::compile(&mut everything).unwrap();
            listing(&mut root).unwrap().into_iter().collect()
        };
        assert_eq!(store.value("servers.0.tags.1"), Some("y"));
        assert_eq!(store.value("labels.team"), Some("core"));

        let mut copy = Everything::default();
        Node::compile(&mut copy).unwrap().fill(&mut store).unwrap();
        assert!(store.unused(&[]).is_empty());
        assert_eq!(copy, everything);
    }

    #[test]
    fn rows_descend_into_templates() {
        let mut everything = Everything::default();
        let root = Node::compile(&mut everything).unwrap();
        let keys: Vec<String> = rows(&root).iter().map(UsageRow::key).collect();
        assert!(keys.contains(&"servers".to_string()));
        assert!(keys.contains(&"servers.<n>.host".to_string()));
        assert!(keys.contains(&"servers.<n>.tags.<n>".to_string()));
        assert!(keys.contains(&"labels.<key>".to_string()));
        assert!(keys.contains(&"matrix.<n>.<n>".to_string()));
        assert!(keys.contains(&"nested.log.level".to_string()));
        assert!(!keys.contains(&"nested".to_string()));
    }

    #[test]
    fn row_projections_keep_slots() {
        let row = UsageRow {
            segments: vec!["servers".into(), "<n>".into(), "maxConns".into()],
            shape: Shape::Scalar(crate::scalar::ScalarKind::U16),
            description: String::new(),
        };
        assert_eq!(row.flag(), "--servers-<n>-max-conns");
        assert_eq!(row.env(Some("APP")), "APP_SERVERS_<n>_MAX_CONNS");
        assert_eq!(row.env(None), "SERVERS_<n>_MAX_CONNS");
        assert!(row.is_element());
        assert_eq!(row.kind(), "u16");
    }

    #[test]
    fn usage_table_is_aligned() {
        let mut server = Server::default();
        let root = Node::compile(&mut server).unwrap();
        let text = usage(&root, Some("APP"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "  --host      APP_HOST      string  Address to bind.");
        assert_eq!(lines[1], "  --port      APP_PORT      u16     Port to listen on.");
        assert_eq!(lines[2], "  --tags      APP_TAGS      list");
        assert_eq!(
            lines[3],
            "  --tags-<n>  APP_TAGS_<n>  string  nth item in list"
        );
    }
}
