//! Symbolic type model used throughout the type-shape model.
//!
//! `TypeRef` is a plain-data mirror of the subset of Rust type syntax that mock
//! synthesis cares about. Unlike `syn::Type` it is `Send + Sync`, so whole batches
//! of processable types can be generated on worker threads. Anything the model
//! does not understand structurally is carried as `Verbatim` text and re-lexed
//! when rendered.

use std::collections::HashMap;
use std::fmt;

use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use quote::{quote, ToTokens};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Unit,
    Never,
    Path(PathRef),
    Reference { lifetime: Option<String>, mutable: bool, inner: Box<TypeRef> },
    Tuple(Vec<TypeRef>),
    Array { elem: Box<TypeRef>, len: String },
    Slice(Box<TypeRef>),
    TraitObject(Vec<Bound>),
    ImplTrait(Vec<Bound>),
    Verbatim(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathRef {
    pub global: bool,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    pub ident: String,
    pub args: Vec<GenericArg>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericArg {
    Type(TypeRef),
    Lifetime(String),
    Binding { name: String, ty: TypeRef },
    Const(String),
}

/// A trait or lifetime bound. Lifetimes are stored without the leading tick.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Bound {
    Trait(PathRef),
    Maybe(PathRef),
    Lifetime(String),
}

impl PathRef {
    pub fn ident(name: impl Into<String>) -> Self {
        Self { global: false, segments: vec![Segment { ident: name.into(), args: Vec::new() }] }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<GenericArg>) -> Self {
        Self { global: false, segments: vec![Segment { ident: name.into(), args }] }
    }

    pub fn last(&self) -> Option<&Segment> { self.segments.last() }

    pub fn last_ident_is(&self, name: &str) -> bool {
        self.last().is_some_and(|seg| seg.ident == name)
    }

    /// A single bare identifier such as `T` or `u8`.
    pub fn as_single_ident(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [seg] if !self.global && seg.args.is_empty() => Some(seg.ident.as_str()),
            _ => None,
        }
    }

    /// Same path with the last segment renamed, keeping its generic arguments.
    pub fn renamed_last(&self, name: &str) -> Self {
        let mut out = self.clone();
        if let Some(last) = out.segments.last_mut() {
            last.ident = name.to_string();
        }
        out
    }

    pub fn from_syn(path: &syn::Path) -> Option<Self> {
        let mut segments = Vec::with_capacity(path.segments.len());
        for seg in &path.segments {
            let args = match &seg.arguments {
                syn::PathArguments::None => Vec::new(),
                syn::PathArguments::AngleBracketed(ab) => {
                    let mut args = Vec::with_capacity(ab.args.len());
                    for arg in &ab.args {
                        args.push(GenericArg::from_syn(arg)?);
                    }
                    args
                }
                syn::PathArguments::Parenthesized(_) => return None,
            };
            segments.push(Segment { ident: seg.ident.to_string(), args });
        }
        Some(Self { global: path.leading_colon.is_some(), segments })
    }
}

impl GenericArg {
    fn from_syn(arg: &syn::GenericArgument) -> Option<Self> {
        Some(match arg {
            syn::GenericArgument::Type(ty) => GenericArg::Type(TypeRef::from_syn(ty)),
            syn::GenericArgument::Lifetime(lt) => GenericArg::Lifetime(lt.ident.to_string()),
            syn::GenericArgument::AssocType(assoc) if assoc.generics.is_none() => GenericArg::Binding {
                name: assoc.ident.to_string(),
                ty: TypeRef::from_syn(&assoc.ty),
            },
            syn::GenericArgument::Const(expr) => GenericArg::Const(expr.to_token_stream().to_string()),
            _ => return None,
        })
    }
}

impl Bound {
    pub fn from_syn(bound: &syn::TypeParamBound) -> Option<Self> {
        match bound {
            syn::TypeParamBound::Trait(tb) if tb.lifetimes.is_none() => {
                let path = PathRef::from_syn(&tb.path)?;
                Some(match tb.modifier {
                    syn::TraitBoundModifier::Maybe(_) => Bound::Maybe(path),
                    syn::TraitBoundModifier::None => Bound::Trait(path),
                })
            }
            syn::TypeParamBound::Lifetime(lt) => Some(Bound::Lifetime(lt.ident.to_string())),
            _ => None,
        }
    }

    pub fn is_trait(&self, name: &str) -> bool {
        matches!(self, Bound::Trait(path) if path.last_ident_is(name))
    }
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self { TypeRef::Path(PathRef::ident(name)) }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Path(PathRef::with_args(name, args.into_iter().map(GenericArg::Type).collect()))
    }

    pub fn reference(inner: TypeRef) -> Self {
        TypeRef::Reference { lifetime: None, mutable: false, inner: Box::new(inner) }
    }

    pub fn static_str() -> Self {
        TypeRef::Reference { lifetime: Some("static".into()), mutable: false, inner: Box::new(TypeRef::named("str")) }
    }

    pub fn as_path(&self) -> Option<&PathRef> {
        if let TypeRef::Path(p) = self { Some(p) } else { None }
    }

    pub fn is_unit(&self) -> bool {
        match self {
            TypeRef::Unit => true,
            TypeRef::Tuple(elems) => elems.is_empty(),
            _ => false,
        }
    }

    /// Total conversion from `syn`; unsupported shapes fall back to `Verbatim`.
    pub fn from_syn(ty: &syn::Type) -> Self {
        let converted = match ty {
            syn::Type::Tuple(t) if t.elems.is_empty() => Some(TypeRef::Unit),
            syn::Type::Tuple(t) => Some(TypeRef::Tuple(t.elems.iter().map(TypeRef::from_syn).collect())),
            syn::Type::Never(_) => Some(TypeRef::Never),
            syn::Type::Path(tp) if tp.qself.is_none() => PathRef::from_syn(&tp.path).map(TypeRef::Path),
            syn::Type::Reference(r) => Some(TypeRef::Reference {
                lifetime: r.lifetime.as_ref().map(|lt| lt.ident.to_string()),
                mutable: r.mutability.is_some(),
                inner: Box::new(TypeRef::from_syn(&r.elem)),
            }),
            syn::Type::Array(a) => Some(TypeRef::Array {
                elem: Box::new(TypeRef::from_syn(&a.elem)),
                len: a.len.to_token_stream().to_string(),
            }),
            syn::Type::Slice(s) => Some(TypeRef::Slice(Box::new(TypeRef::from_syn(&s.elem)))),
            syn::Type::TraitObject(t) => bounds_from_syn(t.bounds.iter()).map(TypeRef::TraitObject),
            syn::Type::ImplTrait(t) => bounds_from_syn(t.bounds.iter()).map(TypeRef::ImplTrait),
            syn::Type::Paren(p) => Some(TypeRef::from_syn(&p.elem)),
            syn::Type::Group(g) => Some(TypeRef::from_syn(&g.elem)),
            _ => None,
        };
        converted.unwrap_or_else(|| TypeRef::Verbatim(ty.to_token_stream().to_string()))
    }

    /// True when the type holds no borrow shorter than `'static`.
    pub fn is_static(&self) -> bool {
        match self {
            TypeRef::Unit | TypeRef::Never => true,
            TypeRef::Path(p) => path_is_static(p),
            TypeRef::Reference { lifetime, inner, .. } => lifetime.as_deref() == Some("static") && inner.is_static(),
            TypeRef::Tuple(elems) => elems.iter().all(TypeRef::is_static),
            TypeRef::Array { elem, .. } | TypeRef::Slice(elem) => elem.is_static(),
            TypeRef::TraitObject(bounds) | TypeRef::ImplTrait(bounds) => bounds.iter().all(|b| match b {
                Bound::Trait(p) | Bound::Maybe(p) => path_is_static(p),
                Bound::Lifetime(lt) => lt == "static",
            }),
            TypeRef::Verbatim(text) => !text.contains('&') && !text.contains('\''),
        }
    }

    /// True when any path in the type starts with `Self`.
    pub fn mentions_self(&self) -> bool {
        let mut found = false;
        self.visit_paths(&mut |p| {
            if p.segments.first().is_some_and(|s| s.ident == "Self") {
                found = true;
            }
        });
        found || matches!(self, TypeRef::Verbatim(text) if text.split(|c: char| !c.is_alphanumeric() && c != '_').any(|w| w == "Self"))
    }

    /// Replace every bare `Self` with `with`; `Self::Assoc` paths are left untouched.
    pub fn replace_self(&self, with: &TypeRef) -> TypeRef {
        self.map_single_idents(&|name| (name == "Self").then(|| with.clone()))
    }

    /// Substitute bare type-parameter names.
    pub fn substitute(&self, map: &HashMap<String, TypeRef>) -> TypeRef {
        self.map_single_idents(&|name| map.get(name).cloned())
    }

    fn map_single_idents(&self, f: &dyn Fn(&str) -> Option<TypeRef>) -> TypeRef {
        match self {
            TypeRef::Path(p) => {
                if let Some(replacement) = p.as_single_ident().and_then(f) {
                    return replacement;
                }
                TypeRef::Path(map_path(p, f))
            }
            TypeRef::Reference { lifetime, mutable, inner } => TypeRef::Reference {
                lifetime: lifetime.clone(),
                mutable: *mutable,
                inner: Box::new(inner.map_single_idents(f)),
            },
            TypeRef::Tuple(elems) => TypeRef::Tuple(elems.iter().map(|e| e.map_single_idents(f)).collect()),
            TypeRef::Array { elem, len } => TypeRef::Array { elem: Box::new(elem.map_single_idents(f)), len: len.clone() },
            TypeRef::Slice(elem) => TypeRef::Slice(Box::new(elem.map_single_idents(f))),
            TypeRef::TraitObject(bounds) => TypeRef::TraitObject(map_bounds(bounds, f)),
            TypeRef::ImplTrait(bounds) => TypeRef::ImplTrait(map_bounds(bounds, f)),
            other => other.clone(),
        }
    }

    fn visit_paths(&self, visit: &mut dyn FnMut(&PathRef)) {
        match self {
            TypeRef::Path(p) => visit_path(p, visit),
            TypeRef::Reference { inner, .. } => inner.visit_paths(visit),
            TypeRef::Tuple(elems) => elems.iter().for_each(|e| e.visit_paths(visit)),
            TypeRef::Array { elem, .. } | TypeRef::Slice(elem) => elem.visit_paths(visit),
            TypeRef::TraitObject(bounds) | TypeRef::ImplTrait(bounds) => {
                for b in bounds {
                    if let Bound::Trait(p) | Bound::Maybe(p) = b {
                        visit_path(p, visit);
                    }
                }
            }
            TypeRef::Unit | TypeRef::Never | TypeRef::Verbatim(_) => {}
        }
    }
}

fn bounds_from_syn<'a>(bounds: impl Iterator<Item = &'a syn::TypeParamBound>) -> Option<Vec<Bound>> {
    bounds.map(Bound::from_syn).collect()
}

fn path_is_static(p: &PathRef) -> bool {
    p.segments.iter().flat_map(|s| s.args.iter()).all(|arg| match arg {
        GenericArg::Type(t) | GenericArg::Binding { ty: t, .. } => t.is_static(),
        GenericArg::Lifetime(lt) => lt == "static",
        GenericArg::Const(_) => true,
    })
}

fn visit_path(p: &PathRef, visit: &mut dyn FnMut(&PathRef)) {
    visit(p);
    for arg in p.segments.iter().flat_map(|s| s.args.iter()) {
        if let GenericArg::Type(t) | GenericArg::Binding { ty: t, .. } = arg {
            t.visit_paths(visit);
        }
    }
}

fn map_path(p: &PathRef, f: &dyn Fn(&str) -> Option<TypeRef>) -> PathRef {
    let segments = p
        .segments
        .iter()
        .map(|seg| Segment {
            ident: seg.ident.clone(),
            args: seg
                .args
                .iter()
                .map(|arg| match arg {
                    GenericArg::Type(t) => GenericArg::Type(t.map_single_idents(f)),
                    GenericArg::Binding { name, ty } => GenericArg::Binding { name: name.clone(), ty: ty.map_single_idents(f) },
                    other => other.clone(),
                })
                .collect(),
        })
        .collect();
    PathRef { global: p.global, segments }
}

fn map_bounds(bounds: &[Bound], f: &dyn Fn(&str) -> Option<TypeRef>) -> Vec<Bound> {
    bounds
        .iter()
        .map(|b| match b {
            Bound::Trait(p) => Bound::Trait(map_path(p, f)),
            Bound::Maybe(p) => Bound::Maybe(map_path(p, f)),
            Bound::Lifetime(lt) => Bound::Lifetime(lt.clone()),
        })
        .collect()
}

/// Identifier from model text, honouring the `r#` prefix.
pub fn ident(name: &str) -> Ident {
    match name.strip_prefix("r#") {
        Some(raw) => Ident::new_raw(raw, Span::call_site()),
        None => Ident::new(name, Span::call_site()),
    }
}

pub fn lifetime(name: &str) -> syn::Lifetime {
    syn::Lifetime::new(&format!("'{name}"), Span::call_site())
}

/// Re-lex text captured from a token stream.
pub fn verbatim(text: &str) -> TokenStream2 {
    text.parse().unwrap_or_default()
}

impl ToTokens for TypeRef {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        let ts = match self {
            TypeRef::Unit => quote!(()),
            TypeRef::Never => quote!(!),
            TypeRef::Path(p) => p.to_token_stream(),
            TypeRef::Reference { lifetime: lt, mutable, inner } => {
                let lt = lt.as_deref().map(lifetime);
                let mutability = mutable.then(|| quote!(mut));
                quote!(& #lt #mutability #inner)
            }
            TypeRef::Tuple(elems) if elems.is_empty() => quote!(()),
            TypeRef::Tuple(elems) if elems.len() == 1 => {
                let only = &elems[0];
                quote!((#only,))
            }
            TypeRef::Tuple(elems) => quote!(( #( #elems ),* )),
            TypeRef::Array { elem, len } => {
                let len = verbatim(len);
                quote!([#elem; #len])
            }
            TypeRef::Slice(elem) => quote!([#elem]),
            TypeRef::TraitObject(bounds) => quote!(dyn #( #bounds )+*),
            TypeRef::ImplTrait(bounds) => quote!(impl #( #bounds )+*),
            TypeRef::Verbatim(text) => verbatim(text),
        };
        tokens.extend(ts);
    }
}

impl ToTokens for PathRef {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        let colon = self.global.then(|| quote!(::));
        let segments = self.segments.iter().map(|seg| {
            let name = ident(&seg.ident);
            if seg.args.is_empty() {
                quote!(#name)
            } else {
                let args = &seg.args;
                quote!(#name < #( #args ),* >)
            }
        });
        tokens.extend(quote!(#colon #( #segments )::*));
    }
}

impl ToTokens for GenericArg {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        let ts = match self {
            GenericArg::Type(t) => t.to_token_stream(),
            GenericArg::Lifetime(lt) => lifetime(lt).to_token_stream(),
            GenericArg::Binding { name, ty } => {
                let name = ident(name);
                quote!(#name = #ty)
            }
            GenericArg::Const(text) => verbatim(text),
        };
        tokens.extend(ts);
    }
}

impl ToTokens for Bound {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        let ts = match self {
            Bound::Trait(p) => p.to_token_stream(),
            Bound::Maybe(p) => quote!(? #p),
            Bound::Lifetime(lt) => lifetime(lt).to_token_stream(),
        };
        tokens.extend(ts);
    }
}

// Display renders compact Rust syntax; used for member signatures and messages.

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Unit => f.write_str("()"),
            TypeRef::Never => f.write_str("!"),
            TypeRef::Path(p) => write!(f, "{p}"),
            TypeRef::Reference { lifetime, mutable, inner } => {
                f.write_str("&")?;
                if let Some(lt) = lifetime {
                    write!(f, "'{lt} ")?;
                }
                if *mutable {
                    f.write_str("mut ")?;
                }
                write!(f, "{inner}")
            }
            TypeRef::Tuple(elems) if elems.len() == 1 => write!(f, "({},)", elems[0]),
            TypeRef::Tuple(elems) => write!(f, "({})", join(elems, ", ")),
            TypeRef::Array { elem, len } => write!(f, "[{elem}; {len}]"),
            TypeRef::Slice(elem) => write!(f, "[{elem}]"),
            TypeRef::TraitObject(bounds) => write!(f, "dyn {}", join(bounds, " + ")),
            TypeRef::ImplTrait(bounds) => write!(f, "impl {}", join(bounds, " + ")),
            TypeRef::Verbatim(text) => f.write_str(text),
        }
    }
}

impl fmt::Display for PathRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.global {
            f.write_str("::")?;
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("::")?;
            }
            f.write_str(&seg.ident)?;
            if !seg.args.is_empty() {
                write!(f, "<{}>", join(&seg.args, ", "))?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for GenericArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenericArg::Type(t) => write!(f, "{t}"),
            GenericArg::Lifetime(lt) => write!(f, "'{lt}"),
            GenericArg::Binding { name, ty } => write!(f, "{name} = {ty}"),
            GenericArg::Const(text) => f.write_str(text),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Trait(p) => write!(f, "{p}"),
            Bound::Maybe(p) => write!(f, "?{p}"),
            Bound::Lifetime(lt) => write!(f, "'{lt}"),
        }
    }
}

fn join<T: fmt::Display>(items: &[T], sep: &str) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn conv(ty: syn::Type) -> TypeRef { TypeRef::from_syn(&ty) }

    #[test]
    fn converts_common_shapes() {
        assert_eq!(conv(parse_quote!(())), TypeRef::Unit);
        assert_eq!(conv(parse_quote!(u8)), TypeRef::named("u8"));
        assert_eq!(conv(parse_quote!(&'static str)), TypeRef::static_str());
        assert_eq!(conv(parse_quote!(Vec<String>)), TypeRef::generic("Vec", vec![TypeRef::named("String")]));
        assert!(matches!(conv(parse_quote!(Box<dyn Clock + Send>)), TypeRef::Path(_)));
    }

    #[test]
    fn parenthesized_paths_fall_back_to_verbatim() {
        let ty = conv(parse_quote!(Box<dyn Fn(u8) -> u8>));
        let TypeRef::Path(path) = &ty else { panic!("outer type stays a path") };
        let inner = path.last().and_then(|seg| seg.args.first());
        assert!(matches!(inner, Some(GenericArg::Type(TypeRef::Verbatim(_)))));
        let ts = ty.to_token_stream();
        let reparsed: syn::Type = syn::parse2(ts).expect("verbatim type re-lexes");
        assert!(matches!(reparsed, syn::Type::Path(_)));
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(conv(parse_quote!(&mut [u8])).to_string(), "&mut [u8]");
        assert_eq!(conv(parse_quote!(std::collections::HashMap<String, Vec<u8>>)).to_string(), "std::collections::HashMap<String, Vec<u8>>");
        assert_eq!(conv(parse_quote!((u8,))).to_string(), "(u8,)");
        assert_eq!(conv(parse_quote!(Box<dyn Repo<u8> + Send>)).to_string(), "Box<dyn Repo<u8> + Send>");
    }

    #[test]
    fn tokens_round_trip_through_syn() {
        let original: syn::Type = parse_quote!(Option<&'static [(u8, char); 4]>);
        let back: syn::Type = syn::parse2(TypeRef::from_syn(&original).to_token_stream()).expect("valid type tokens");
        assert_eq!(back, original);

        let single: syn::Type = parse_quote!((u8,));
        let back: syn::Type = syn::parse2(TypeRef::from_syn(&single).to_token_stream()).expect("valid type tokens");
        assert_eq!(back, single);
    }

    #[test]
    fn static_detection() {
        assert!(conv(parse_quote!(String)).is_static());
        assert!(conv(parse_quote!(Option<&'static str>)).is_static());
        assert!(!conv(parse_quote!(&str)).is_static());
        assert!(!conv(parse_quote!(Cow<'a, str>)).is_static());
    }

    #[test]
    fn self_replacement_and_substitution() {
        let ty = conv(parse_quote!(Option<Self>));
        assert!(ty.mentions_self());
        let replaced = ty.replace_self(&TypeRef::named("Widget"));
        assert_eq!(replaced.to_string(), "Option<Widget>");
        assert!(!replaced.mentions_self());

        let mut map = HashMap::new();
        map.insert("T".to_string(), TypeRef::named("u32"));
        assert_eq!(conv(parse_quote!(Vec<T>)).substitute(&map).to_string(), "Vec<u32>");
    }
}
