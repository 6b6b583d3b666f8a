//! Scalar leaves: the types a single store value parses into.
//!
//! Integers are parsed in base 10 and must fit their declared width, so
//! `300` is an error for a `u8` rather than a silent wrap. Booleans accept
//! the usual spellings (`1`, `t`, `true`, `TRUE`, `0`, `f`, `false`, ...).

use std::fmt;

/// The declared kind of a scalar leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::String => "string",
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::Isize => "isize",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::Usize => "usize",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// Returned when a raw string does not parse into a scalar's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseFailure;

/// A leaf value the filler can assign from a string.
pub trait Scalar {
    fn kind(&self) -> ScalarKind;

    /// Replace the value with `raw` parsed per [`kind`](Self::kind).
    fn assign(&mut self, raw: &str) -> Result<(), ParseFailure>;

    /// String form that [`assign`](Self::assign) parses back to the same value.
    fn render(&self) -> String;
}

impl Scalar for String {
    fn kind(&self) -> ScalarKind {
        ScalarKind::String
    }

    fn assign(&mut self, raw: &str) -> Result<(), ParseFailure> {
        raw.clone_into(self);
        Ok(())
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl Scalar for bool {
    fn kind(&self) -> ScalarKind {
        ScalarKind::Bool
    }

    fn assign(&mut self, raw: &str) -> Result<(), ParseFailure> {
        *self = parse_bool(raw)?;
        Ok(())
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

pub fn parse_bool(raw: &str) -> Result<bool, ParseFailure> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(ParseFailure),
    }
}

macro_rules! from_str_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                fn kind(&self) -> ScalarKind {
                    ScalarKind::$kind
                }

                fn assign(&mut self, raw: &str) -> Result<(), ParseFailure> {
                    *self = raw.parse().map_err(|_| ParseFailure)?;
                    Ok(())
                }

                fn render(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

from_str_scalar! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
}
