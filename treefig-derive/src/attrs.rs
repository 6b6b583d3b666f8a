//! `#[configure(...)]` field attributes and doc comments.

use syn::{Attribute, Expr, ExprLit, Field, Lit, LitStr, Meta};

/// What a field contributes to the tree.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    pub name: Option<String>,
    pub description: Option<String>,
    pub skip: bool,
    pub embed: bool,
}

impl FieldAttrs {
    pub fn parse(field: &Field) -> syn::Result<Self> {
        let mut attrs = FieldAttrs::default();

        for attr in &field.attrs {
            if !attr.path().is_ident("configure") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    attrs.name = Some(value.value());
                } else if meta.path.is_ident("description") {
                    let value: LitStr = meta.value()?.parse()?;
                    attrs.description = Some(value.value());
                } else if meta.path.is_ident("skip") {
                    attrs.skip = true;
                } else if meta.path.is_ident("embed") {
                    attrs.embed = true;
                } else {
                    return Err(meta.error(
                        "unknown configure attribute, expected `name`, `description`, `skip` or `embed`",
                    ));
                }
                Ok(())
            })?;
        }

        if attrs.embed && (attrs.name.is_some() || attrs.description.is_some()) {
            return Err(syn::Error::new_spanned(
                field,
                "an embedded field has no key of its own, `name` and `description` do not apply",
            ));
        }

        if attrs.description.is_none() {
            attrs.description = doc_comment(&field.attrs);
        }
        Ok(attrs)
    }
}

/// `///` lines joined into one sentence-ish string.
fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}
