use crate::types::{GenericArg, PathRef, TypeRef};

fn single_type_arg(path: &PathRef) -> Option<&TypeRef> {
    path.last().and_then(|seg| match seg.args.as_slice() {
        [GenericArg::Type(t)] => Some(t),
        _ => None,
    })
}

fn wrapped<'a>(ty: &'a TypeRef, wrapper: &str) -> Option<&'a TypeRef> {
    match ty {
        TypeRef::Path(p) if p.last_ident_is(wrapper) => single_type_arg(p),
        _ => None,
    }
}

/// Returns true if type is `Option<T>`
pub fn is_option(ty: &TypeRef) -> bool { wrapped(ty, "Option").is_some() }

/// If type is `Option<T>`, return `T`
pub fn unwrap_option(ty: &TypeRef) -> Option<&TypeRef> { wrapped(ty, "Option") }

/// Removes one layer of nullability; non-optional types are returned as-is.
pub fn strip_option(ty: &TypeRef) -> &TypeRef { unwrap_option(ty).unwrap_or(ty) }

/// Returns true if type is `PhantomData<T>`
pub fn is_phantom_data(ty: &TypeRef) -> bool {
    matches!(ty, TypeRef::Path(p) if p.last_ident_is("PhantomData"))
}

/// Owning smart pointers that can hold a trait object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pointer {
    Box,
    Rc,
    Arc,
}

impl Pointer {
    pub fn name(self) -> &'static str {
        match self {
            Pointer::Box => "Box",
            Pointer::Rc => "Rc",
            Pointer::Arc => "Arc",
        }
    }

    /// Fully qualified path usable from any crate.
    pub fn path(self) -> &'static str {
        match self {
            Pointer::Box => "::std::boxed::Box",
            Pointer::Rc => "::std::rc::Rc",
            Pointer::Arc => "::std::sync::Arc",
        }
    }
}

/// If type is `Box<T>`, `Rc<T>` or `Arc<T>`, return the pointer and `T`
pub fn unwrap_pointer(ty: &TypeRef) -> Option<(Pointer, &TypeRef)> {
    [Pointer::Box, Pointer::Rc, Pointer::Arc]
        .into_iter()
        .find_map(|p| wrapped(ty, p.name()).map(|inner| (p, inner)))
}

const INTEGERS: &[&str] = &["i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize"];

const DEFAULT_CONSTRUCTIBLE: &[&str] = &[
    "String", "PathBuf", "OsString", "Vec", "VecDeque", "LinkedList", "BinaryHeap", "HashMap", "HashSet",
    "BTreeMap", "BTreeSet",
];

fn bare_name(ty: &TypeRef) -> Option<&str> { ty.as_path().and_then(PathRef::as_single_ident) }

pub fn is_bool(ty: &TypeRef) -> bool { bare_name(ty) == Some("bool") }

pub fn is_char(ty: &TypeRef) -> bool { bare_name(ty) == Some("char") }

pub fn is_integer(ty: &TypeRef) -> bool { bare_name(ty).is_some_and(|n| INTEGERS.contains(&n)) }

pub fn is_float(ty: &TypeRef) -> bool { matches!(bare_name(ty), Some("f32" | "f64")) }

/// `String`, `PathBuf` and the std collections, matched on the last path segment.
pub fn is_std_default(ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Path(p) => p.last().is_some_and(|seg| DEFAULT_CONSTRUCTIBLE.contains(&seg.ident.as_str())),
        _ => false,
    }
}

/// `&str` with any lifetime.
pub fn is_str_ref(ty: &TypeRef) -> bool {
    matches!(ty, TypeRef::Reference { mutable: false, inner, .. } if bare_name(inner) == Some("str"))
}

/// `&[T]` with any lifetime.
pub fn is_slice_ref(ty: &TypeRef) -> bool {
    matches!(ty, TypeRef::Reference { mutable: false, inner, .. } if matches!(**inner, TypeRef::Slice(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn conv(ty: syn::Type) -> TypeRef { TypeRef::from_syn(&ty) }

    #[test]
    fn option_helpers() {
        let ty = conv(parse_quote!(Option<String>));
        assert!(is_option(&ty));
        assert_eq!(strip_option(&ty), &TypeRef::named("String"));
        let plain = conv(parse_quote!(u8));
        assert_eq!(strip_option(&plain), &plain);
    }

    #[test]
    fn pointer_helpers() {
        let ty = conv(parse_quote!(std::sync::Arc<dyn Clock>));
        let (ptr, inner) = unwrap_pointer(&ty).expect("arc");
        assert_eq!(ptr, Pointer::Arc);
        assert!(matches!(inner, TypeRef::TraitObject(_)));
        assert!(unwrap_pointer(&conv(parse_quote!(Vec<u8>))).is_none());
    }

    #[test]
    fn phantom_data_helpers() {
        assert!(is_phantom_data(&conv(parse_quote!(::core::marker::PhantomData<MyT>))));
    }

    #[test]
    fn primitive_categories() {
        assert!(is_bool(&conv(parse_quote!(bool))));
        assert!(is_integer(&conv(parse_quote!(u64))));
        assert!(is_float(&conv(parse_quote!(f32))));
        assert!(is_char(&conv(parse_quote!(char))));
        assert!(is_str_ref(&conv(parse_quote!(&'static str))));
        assert!(is_slice_ref(&conv(parse_quote!(&[u8]))));
        assert!(is_std_default(&conv(parse_quote!(std::collections::HashMap<String, u8>))));
        assert!(!is_std_default(&conv(parse_quote!(Widget))));
    }
}
