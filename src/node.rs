//! The compiled schema tree.
//!
//! A [`Node`] is one position in the shape of a config type. [`Node::compile`]
//! walks a config value once, through its [`Configure`] impl, and produces a
//! tree whose leaves hold live `&mut` borrows into that value. Filling the
//! tree writes straight into the caller's struct.
//!
//! # Shape
//!
//! - Struct fields become named children keyed `parent.child`.
//! - Embedded fields splice their children into the current node.
//! - `Vec`s and maps are *dynamic*: exactly one child, the template, which
//!   describes the element type and is never bound to storage. At fill time
//!   the template is cloned once per element found in the store.
//! - `Option<T>` and `Box<T>` are transparent.
//! - Scalars are leaves.
//!
//! # Bindings
//!
//! [`Binding`] makes ownership explicit. `Struct`, `Scalar` and `Dynamic`
//! borrow caller storage for `'a`; `Detached` carries only a [`Shape`] and
//! is what templates (and fresh template clones) hold. A clone gets storage
//! by compiling a locally owned scratch value into it: struct fields find
//! their cloned child by field identifier and attach in place, keeping the
//! clone's re-keyed keys.

use std::fmt;

use crate::case::{self, DOT};
use crate::dynamic::{Dynamic, DynamicKind};
use crate::error::{Result, TreefigError};
use crate::scalar::{Scalar, ScalarKind};
use crate::store::Source;

/// Schema description of a config type.
///
/// Implemented for scalars, `Vec`, string-keyed maps, `Option` and `Box`.
/// Structs get it from `#[derive(Configure)]`, or by hand:
///
/// ```ignore
/// impl Configure for Server {
///     fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> treefig::Result<()> {
///         node.bind_struct();
///         let Server { host, port } = self;
///         node.field("host", "host", "Address to bind.", host)?;
///         node.field("port", "port", "", port)
///     }
/// }
/// ```
pub trait Configure {
    /// Bind `self` into `node`.
    fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()>;
}

/// What a node is, independent of any storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Struct,
    Scalar(ScalarKind),
    Dynamic(DynamicKind),
}

/// Where a node's value lives.
pub enum Binding<'a> {
    /// No storage. Templates and unattached clones.
    Detached(Shape),
    /// A struct in caller storage; its fields are bound through the children.
    Struct,
    Scalar(&'a mut dyn Scalar),
    Dynamic(&'a mut dyn Dynamic),
}

impl Binding<'_> {
    pub fn shape(&self) -> Shape {
        match self {
            Binding::Detached(shape) => *shape,
            Binding::Struct => Shape::Struct,
            Binding::Scalar(scalar) => Shape::Scalar(scalar.kind()),
            Binding::Dynamic(dynamic) => Shape::Dynamic(dynamic.kind()),
        }
    }
}

impl fmt::Debug for Binding<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Detached(shape) => f.debug_tuple("Detached").field(shape).finish(),
            Binding::Struct => f.write_str("Struct"),
            Binding::Scalar(scalar) => f.debug_tuple("Scalar").field(&scalar.render()).finish(),
            Binding::Dynamic(dynamic) => f.debug_tuple("Dynamic").field(&dynamic.kind()).finish(),
        }
    }
}

#[derive(Debug)]
pub struct Node<'a> {
    pub(crate) key: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) field: &'static str,
    pub(crate) binding: Binding<'a>,
    pub(crate) children: Vec<Node<'a>>,
}

impl<'a> Node<'a> {
    /// Compile `config` into a tree bound to it. The root must be a struct.
    pub fn compile<C: Configure + ?Sized>(config: &'a mut C) -> Result<Self> {
        let mut root = Node::new(String::new(), String::new(), String::new(), "");
        config.compile(&mut root)?;
        if root.shape() != Shape::Struct {
            return Err(TreefigError::UnsupportedRoot {
                type_name: std::any::type_name::<C>(),
            });
        }
        Ok(root)
    }

    fn new(key: String, name: String, description: String, field: &'static str) -> Self {
        Node {
            key,
            name,
            description,
            field,
            binding: Binding::Detached(Shape::Struct),
            children: Vec::new(),
        }
    }

    /// Canonical dotted key from the root. Empty at the root; template
    /// positions show up as an empty segment (`servers..host`).
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Identifier of the struct field this node was compiled from.
    pub fn field_ident(&self) -> &'static str {
        self.field
    }

    pub fn children(&self) -> &[Node<'a>] {
        &self.children
    }

    pub fn binding(&self) -> &Binding<'a> {
        &self.binding
    }

    pub fn shape(&self) -> Shape {
        self.binding.shape()
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.shape(), Shape::Dynamic(_))
    }

    pub fn is_detached(&self) -> bool {
        matches!(self.binding, Binding::Detached(_))
    }

    /// The element template of a dynamic node.
    pub fn template(&self) -> Option<&Node<'a>> {
        if self.is_dynamic() {
            self.children.first()
        } else {
            None
        }
    }

    /// Fill every bound value from `source`.
    pub fn fill(&mut self, source: &mut dyn Source) -> Result<()> {
        crate::fill::fill(self, source)
    }

    /// Leaf and dynamic nodes, sorted by key.
    pub fn flat(&self) -> Vec<&Node<'a>> {
        let mut nodes = Vec::new();
        self.walk(&mut |node| nodes.push(node));
        nodes.sort_by(|a, b| a.key.cmp(&b.key));
        nodes
    }

    /// Visit the units a filler looks at: leaves and dynamic nodes. Struct
    /// nodes are only passed through.
    pub fn walk<'n>(&'n self, visit: &mut impl FnMut(&'n Node<'a>)) {
        if self.children.is_empty() || self.is_dynamic() {
            visit(self);
        } else {
            for child in &self.children {
                child.walk(visit);
            }
        }
    }

    // --- binding, called from `Configure` impls ---

    pub fn bind_struct(&mut self) {
        self.binding = Binding::Struct;
    }

    pub fn bind_scalar(&mut self, value: &'a mut dyn Scalar) {
        self.binding = Binding::Scalar(value);
    }

    /// Bind a map or sequence whose elements are `T`. A fresh node gets a
    /// template child compiled from `T::default()`; a clone keeps its own.
    pub fn bind_dynamic<T: Configure + Default>(
        &mut self,
        container: &'a mut dyn Dynamic,
        description: &str,
    ) -> Result<()> {
        if self.children.is_empty() {
            let template = Node::compile_template::<T>(&self.key, description)?;
            self.children.push(template);
        }
        self.binding = Binding::Dynamic(container);
        Ok(())
    }

    /// Add (or, on a clone, re-attach) the child for struct field `field`.
    ///
    /// `name` is the display name; the child's key is the parent key joined
    /// with the normalized name.
    pub fn field<T: Configure + ?Sized>(
        &mut self,
        field: &'static str,
        name: &str,
        description: &str,
        value: &'a mut T,
    ) -> Result<()> {
        let detached = self
            .children
            .iter()
            .position(|child| child.field == field && child.is_detached());

        let index = match detached {
            Some(index) => index,
            None => {
                let key = join(&self.key, &case::to_dot_case(name));
                if let Some(existing) = self.children.iter().find(|child| child.key == key) {
                    return Err(TreefigError::DuplicateKey {
                        key,
                        first: existing.field,
                        second: field,
                    });
                }
                self.children.push(Node::new(
                    key,
                    name.to_string(),
                    description.to_string(),
                    field,
                ));
                self.children.len() - 1
            }
        };

        value.compile(&mut self.children[index])
    }

    /// Splice an embedded struct's fields into this node.
    pub fn embed<T: Configure + ?Sized>(&mut self, value: &'a mut T) -> Result<()> {
        value.compile(self)?;
        if !matches!(self.binding, Binding::Struct) {
            return Err(TreefigError::UnsupportedEmbed {
                type_name: std::any::type_name::<T>(),
            });
        }
        Ok(())
    }

    // --- templates ---

    /// Compile `T`'s shape under `parent_key` and drop the scratch storage.
    fn compile_template<T: Configure + Default>(
        parent_key: &str,
        description: &str,
    ) -> Result<Self> {
        let mut scratch = T::default();
        let mut node = Node::new(
            format!("{parent_key}{DOT}"),
            String::new(),
            description.to_string(),
            "",
        );
        scratch.compile(&mut node)?;
        Ok(node.detach())
    }

    /// Same tree, no storage.
    fn detach<'b>(self) -> Node<'b> {
        Node {
            binding: Binding::Detached(self.binding.shape()),
            key: self.key,
            name: self.name,
            description: self.description,
            field: self.field,
            children: self.children.into_iter().map(|child| child.detach()).collect(),
        }
    }

    /// Deep copy of the shape, every node detached.
    pub fn clone_shape<'b>(&self) -> Node<'b> {
        Node {
            key: self.key.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            field: self.field,
            binding: Binding::Detached(self.shape()),
            children: self.children.iter().map(|child| child.clone_shape()).collect(),
        }
    }

    /// Swap the leading `old` of every key in the subtree for `new`.
    pub fn rekey(&mut self, old: &str, new: &str) {
        if let Some(rest) = self.key.strip_prefix(old) {
            self.key = format!("{new}{rest}");
        }
        for child in &mut self.children {
            child.rekey(old, new);
        }
    }
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}{DOT}{name}")
    }
}

macro_rules! scalar_configure {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Configure for $ty {
                fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
                    node.bind_scalar(self);
                    Ok(())
                }
            }
        )*
    };
}

scalar_configure!(String, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<T: Configure + Default> Configure for Option<T> {
    fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
        self.get_or_insert_with(T::default).compile(node)
    }
}

impl<T: Configure + ?Sized> Configure for Box<T> {
    fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
        (**self).compile(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Embedded, Everything, Nested, Server};
    use std::collections::HashMap;

    fn keys(node: &Node<'_>) -> Vec<String> {
        node.flat().iter().map(|n| n.key().to_string()).collect()
    }

    #[test]
    fn struct_fields_become_children() {
        let mut config = Server::default();
        let root = Node::compile(&mut config).unwrap();
        assert_eq!(root.key(), "");
        assert_eq!(keys(&root), vec!["host", "port", "tags"]);
        let host = &root.children()[0];
        assert_eq!(host.name(), "host");
        assert_eq!(host.field_ident(), "host");
        assert_eq!(host.description(), "Address to bind.");
        assert_eq!(host.shape(), Shape::Scalar(ScalarKind::String));
    }

    #[test]
    fn nested_keys_are_dotted_and_normalized() {
        let mut config = Nested::default();
        let root = Node::compile(&mut config).unwrap();
        assert_eq!(
            keys(&root),
            vec!["log.level", "primary.host", "primary.port", "primary.tags"]
        );
    }

    #[test]
    fn embedded_fields_splice_into_parent() {
        let mut config = Embedded::default();
        let root = Node::compile(&mut config).unwrap();
        assert_eq!(keys(&root), vec!["debug", "host", "port", "tags"]);
    }

    #[test]
    fn dynamic_nodes_have_one_template() {
        let mut config = Everything::default();
        let root = Node::compile(&mut config).unwrap();
        let servers = root
            .children()
            .iter()
            .find(|n| n.key() == "servers")
            .unwrap();
        assert!(servers.is_dynamic());
        assert_eq!(servers.children().len(), 1);
        let template = servers.template().unwrap();
        assert!(template.is_detached());
        assert_eq!(template.key(), "servers.");
        assert_eq!(template.description(), "nth item in list");
        let template_keys: Vec<&str> = template.children().iter().map(|n| n.key()).collect();
        assert_eq!(
            template_keys,
            vec!["servers..host", "servers..port", "servers..tags"]
        );
        // the element's own list carries its own template
        assert_eq!(template.children()[2].children()[0].key(), "servers..tags.");
    }

    #[test]
    fn template_clone_rekeys_subtree() {
        let mut config = Everything::default();
        let root = Node::compile(&mut config).unwrap();
        let servers = root.children().iter().find(|n| n.key() == "servers").unwrap();
        let mut clone: Node<'_> = servers.template().unwrap().clone_shape();
        clone.rekey("servers.", "servers.7");
        assert_eq!(clone.key(), "servers.7");
        assert_eq!(clone.children()[2].key(), "servers.7.tags");
        assert_eq!(clone.children()[2].children()[0].key(), "servers.7.tags.");
    }

    #[test]
    fn option_is_allocated() {
        #[derive(Default)]
        struct Holder {
            inner: Option<Server>,
        }
        impl Configure for Holder {
            fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
                node.bind_struct();
                node.field("inner", "inner", "", &mut self.inner)
            }
        }

        let mut holder = Holder::default();
        {
            let root = Node::compile(&mut holder).unwrap();
            assert_eq!(root.flat().len(), 3);
        }
        assert!(holder.inner.is_some());
    }

    #[test]
    fn duplicate_normalized_names_fail() {
        #[derive(Default)]
        struct Clash {
            foo_bar: String,
            foo_bar_2: String,
        }
        impl Configure for Clash {
            fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
                node.bind_struct();
                node.field("foo_bar", "foo_bar", "", &mut self.foo_bar)?;
                node.field("foo_bar_2", "fooBar", "", &mut self.foo_bar_2)
            }
        }

        let mut clash = Clash::default();
        let err = Node::compile(&mut clash).unwrap_err();
        assert!(matches!(err, TreefigError::DuplicateKey { ref key, .. } if key == "foo.bar"));
    }

    #[test]
    fn embedding_a_scalar_fails() {
        #[derive(Default)]
        struct Bad {
            port: u16,
        }
        impl Configure for Bad {
            fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
                node.bind_struct();
                node.embed(&mut self.port)
            }
        }

        let mut bad = Bad::default();
        let err = Node::compile(&mut bad).unwrap_err();
        assert!(err.to_string().contains("u16"));
    }

    #[test]
    fn non_struct_root_fails() {
        let mut map: HashMap<String, String> = HashMap::new();
        let err = Node::compile(&mut map).unwrap_err();
        assert!(matches!(err, TreefigError::UnsupportedRoot { .. }));
    }

    #[test]
    fn walk_skips_struct_nodes() {
        let mut config = Nested::default();
        let root = Node::compile(&mut config).unwrap();
        let mut visited = Vec::new();
        root.walk(&mut |n| visited.push(n.key().to_string()));
        assert!(!visited.contains(&"primary".to_string()));
        assert!(visited.contains(&"primary.tags".to_string()));
    }
}
