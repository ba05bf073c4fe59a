use syn::{Attribute, Expr, Lit, Meta};

use crate::ir::Annotation;

/// Check if an attribute with the given name exists
pub fn has_attr(attrs: &[Attribute], attr_name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(attr_name))
}

/// Joined `///` text, one leading space removed per line.
pub fn doc_string(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .filter_map(|a| match &a.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(expr_lit) => match &expr_lit.lit {
                    Lit::Str(s) => Some(s.value()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').map(str::to_string).unwrap_or(line))
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

/// Every attribute except docs and `skip`, as model annotations.
pub fn annotations(attrs: &[Attribute], skip: &str) -> Vec<Annotation> {
    attrs
        .iter()
        .filter(|a| !a.path().is_ident("doc") && !a.path().is_ident(skip))
        .map(Annotation::from_syn)
        .collect()
}

/// Flags accepted on a member inside a mocked item: `#[mockable(exclude)]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberFlags {
    pub exclude: bool,
}

/// Parse member flags from every `#[attr_name(..)]`; unknown keys are errors.
pub fn member_flags(attrs: &[Attribute], attr_name: &str) -> syn::Result<MemberFlags> {
    let mut flags = MemberFlags::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident(attr_name)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("exclude") {
                flags.exclude = true;
                Ok(())
            } else {
                Err(meta.error("unknown member option; expected `exclude`"))
            }
        })?;
    }
    Ok(flags)
}

/// Remove every `#[attr_name..]` so the re-emitted item compiles without the helper attribute.
pub fn strip(attrs: &mut Vec<Attribute>, attr_name: &str) {
    attrs.retain(|a| !a.path().is_ident(attr_name));
}
