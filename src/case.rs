//! Key normalization.
//!
//! Every source spells keys its own way: struct fields arrive as `fooBar` or
//! `foo_bar`, env vars as `FOO_BAR`, flags as `foo-bar`, YAML as whatever the
//! author typed. They all collapse into one canonical dotted dialect:
//!
//! | Input | `to_dot_case` |
//! |-------|---------------|
//! | `fooBar` | `foo.bar` |
//! | `foo-bar` | `foo.bar` |
//! | `foo_bar` | `foo.bar` |
//! | `FOO_BAR` | `foo.bar` |
//! | `foo.bar` | `foo.bar` |
//!
//! The dash and screaming projections exist for rendering flags and env var
//! names back to the user.

pub const DOT: char = '.';
pub const DASH: char = '-';
pub const UNDERSCORE: char = '_';

/// Canonical form, e.g. `logLevel` → `log.level`.
pub fn to_dot_case(s: &str) -> String {
    replace_delimiter(s, DOT).to_lowercase()
}

/// Flag form, e.g. `log.level` → `log-level`.
pub fn to_dash_case(s: &str) -> String {
    replace_delimiter(s, DASH).to_lowercase()
}

/// Env var form, e.g. `log.level` → `LOG_LEVEL`.
pub fn to_screaming_case(s: &str) -> String {
    replace_delimiter(s, UNDERSCORE).to_uppercase()
}

/// Swap every `.`, `-` and `_` for `delimiter`, and split camel case humps
/// (`[a-z0-9]` followed by `[A-Z]`) with it. Case is left alone.
pub fn replace_delimiter(s: &str, delimiter: char) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev: Option<char> = None;
    for c in s.chars() {
        if is_delimiter(c) {
            out.push(delimiter);
        } else {
            if c.is_ascii_uppercase()
                && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
            {
                out.push(delimiter);
            }
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

fn is_delimiter(c: char) -> bool {
    c == DOT || c == DASH || c == UNDERSCORE
}
