#[cfg(test)]
pub mod test {
    use std::collections::{BTreeMap, HashMap};

    use crate::error::Result;
    use crate::node::{Configure, Node};

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Server {
        /// Address to bind.
        pub host: String,
        pub port: u16,
        pub tags: Vec<String>,
    }

    impl Configure for Server {
        fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
            node.bind_struct();
            let Server { host, port, tags } = self;
            node.field("host", "host", "Address to bind.", host)?;
            node.field("port", "port", "Port to listen on.", port)?;
            node.field("tags", "tags", "", tags)
        }
    }

    #[derive(Debug, Default, PartialEq)]
    pub struct Nested {
        pub log_level: String,
        pub primary: Server,
    }

    impl Configure for Nested {
        fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
            node.bind_struct();
            let Nested { log_level, primary } = self;
            node.field("log_level", "logLevel", "Minimum level logged.", log_level)?;
            node.field("primary", "primary", "", primary)
        }
    }

    // -- Embedding: Server's fields sit next to `debug` --------------------------

    #[derive(Debug, Default, PartialEq)]
    pub struct Embedded {
        pub server: Server,
        pub debug: bool,
    }

    impl Configure for Embedded {
        fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
            node.bind_struct();
            let Embedded { server, debug } = self;
            node.embed(server)?;
            node.field("debug", "debug", "Enable debug output.", debug)
        }
    }

    // -- Every supported kind ----------------------------------------------------

    #[derive(Debug, Default, PartialEq)]
    pub struct Widths {
        pub i8: i8,
        pub i16: i16,
        pub i32: i32,
        pub i64: i64,
        pub isize: isize,
        pub u8: u8,
        pub u16: u16,
        pub u32: u32,
        pub u64: u64,
        pub usize: usize,
        pub f32: f32,
        pub f64: f64,
    }

    impl Configure for Widths {
        fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
            node.bind_struct();
            node.field("i8", "i8", "", &mut self.i8)?;
            node.field("i16", "i16", "", &mut self.i16)?;
            node.field("i32", "i32", "", &mut self.i32)?;
            node.field("i64", "i64", "", &mut self.i64)?;
            node.field("isize", "isize", "", &mut self.isize)?;
            node.field("u8", "u8", "", &mut self.u8)?;
            node.field("u16", "u16", "", &mut self.u16)?;
            node.field("u32", "u32", "", &mut self.u32)?;
            node.field("u64", "u64", "", &mut self.u64)?;
            node.field("usize", "usize", "", &mut self.usize)?;
            node.field("f32", "f32", "", &mut self.f32)?;
            node.field("f64", "f64", "", &mut self.f64)
        }
    }

    #[derive(Debug, Default, PartialEq)]
    pub struct Everything {
        pub name: String,
        pub enabled: bool,
        pub widths: Widths,
        pub servers: Vec<Server>,
        pub labels: HashMap<String, String>,
        pub limits: BTreeMap<String, u32>,
        pub matrix: Vec<Vec<i32>>,
        pub backup: Option<Server>,
        pub nested: Box<Nested>,
    }

    impl Configure for Everything {
        fn compile<'a>(&'a mut self, node: &mut Node<'a>) -> Result<()> {
            node.bind_struct();
            let Everything {
                name,
                enabled,
                widths,
                servers,
                labels,
                limits,
                matrix,
                backup,
                nested,
            } = self;
            node.field("name", "name", "Service name.", name)?;
            node.field("enabled", "enabled", "", enabled)?;
            node.field("widths", "widths", "", widths)?;
            node.field("servers", "servers", "Upstream servers.", servers)?;
            node.field("labels", "labels", "", labels)?;
            node.field("limits", "limits", "", limits)?;
            node.field("matrix", "matrix", "", matrix)?;
            node.field("backup", "backup", "", backup)?;
            node.field("nested", "nested", "", nested)
        }
    }

    #[test]
    fn everything_compiles() {
        let mut everything = Everything::default();
        let root = Node::compile(&mut everything).unwrap();
        assert_eq!(root.children().len(), 9);
    }
}
