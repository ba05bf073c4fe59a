//! Constructor-argument synthesis for class-kind types.
//!
//! Every constructor parameter receives either a nested auto-mock (for dependencies the
//! catalog can mock), a recursive constructor call (for catalog classes), or a literal
//! placeholder chosen from the parameter's type category. Anything else is a `Shape`
//! error naming the parameter.

use std::collections::{BTreeMap, HashMap};

use crate::common::type_utils::{self as tu, Pointer};
use crate::error::GenerateError;
use crate::ir::{Constructor, Param, ProcessableType, TypeKind, TypeParam};
use crate::types::{Bound, GenericArg, PathRef, TypeRef};

/// Maximum nesting of recursive constructor calls.
pub const MAX_DEPTH: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub kind: TypeKind,
    pub generated_name: String,
    pub constructor: Option<Constructor>,
    pub type_params: Vec<TypeParam>,
}

/// Types known to one generation run, keyed by source name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self { Self::default() }

    pub fn from_types<'a>(types: impl IntoIterator<Item = &'a ProcessableType>) -> Self {
        let mut catalog = Self::new();
        for ty in types {
            catalog.insert_type(ty);
        }
        catalog
    }

    pub fn insert_type(&mut self, ty: &ProcessableType) {
        self.entries.insert(
            ty.source_name.clone(),
            CatalogEntry {
                kind: ty.kind,
                generated_name: ty.generated_name.clone(),
                constructor: ty.constructor.clone(),
                type_params: ty.type_params.clone(),
            },
        );
    }

    /// Registers an interface mocked elsewhere (e.g. by its own `#[mockable]`).
    pub fn declare_interface(&mut self, source_name: impl Into<String>, generated_name: impl Into<String>) {
        let entry = CatalogEntry {
            kind: TypeKind::Interface,
            generated_name: generated_name.into(),
            constructor: None,
            type_params: Vec::new(),
        };
        self.entries.entry(source_name.into()).or_insert(entry);
    }

    pub fn get(&self, source_name: &str) -> Option<&CatalogEntry> { self.entries.get(source_name) }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Source name of another entry whose source or generated name equals `generated`.
    pub fn collision(&self, source_name: &str, generated: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, entry)| name.as_str() != source_name && (name.as_str() == generated || entry.generated_name == generated))
            .map(|(name, _)| name.as_str())
    }

    fn interface_of(&self, path: &PathRef) -> Option<&CatalogEntry> {
        let name = &path.last()?.ident;
        self.get(name).filter(|e| e.kind == TypeKind::Interface)
    }

    fn class_of(&self, path: &PathRef) -> Option<&CatalogEntry> {
        let name = &path.last()?.ident;
        self.get(name).filter(|e| e.kind == TypeKind::Class)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    False,
    Zero,
    ZeroFloat,
    NulChar,
    Unit,
    EmptyStr,
    EmptySlice,
    Default,
    PhantomData,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrapper {
    Some,
    Pointer(Pointer),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgValue {
    Literal(Placeholder),
    Wrap { wrapper: Wrapper, inner: Box<ArgValue> },
    Tuple(Vec<ArgValue>),
    /// `core::array::from_fn(|_| elem)`
    Array(Box<ArgValue>),
    /// A configured mock of a catalog interface, optionally boxed and cast to `target`.
    AutoMock { mock: TypeRef, pointer: Option<Pointer>, target: TypeRef, stubs_unit_by_default: bool },
    /// `<source>::constructor(args)` for a catalog class.
    Construct { source: TypeRef, constructor: String, args: Vec<ArgValue> },
}

impl ArgValue {
    /// True when building this value needs the dispatch runtime.
    pub fn requires_dispatch(&self) -> bool {
        match self {
            ArgValue::AutoMock { .. } => true,
            ArgValue::Literal(_) => false,
            ArgValue::Wrap { inner, .. } | ArgValue::Array(inner) => inner.requires_dispatch(),
            ArgValue::Tuple(items) | ArgValue::Construct { args: items, .. } => items.iter().any(ArgValue::requires_dispatch),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedArg {
    pub param: Param,
    pub value: ArgValue,
}

impl SynthesizedArg {
    pub fn requires_dispatch(&self) -> bool { self.value.requires_dispatch() }
}

/// Synthesizes arguments for every constructor parameter, in declaration order.
pub fn synthesize(ty: &ProcessableType, catalog: &Catalog) -> Result<Vec<SynthesizedArg>, GenerateError> {
    let mut resolver = Resolver::new(ty, catalog);
    ty.constructor_params()
        .iter()
        .map(|param| {
            let value = resolver.value_for(&param.name, &param.ty, 0)?;
            Ok(SynthesizedArg { param: param.clone(), value })
        })
        .collect()
}

struct Resolver<'a> {
    catalog: &'a Catalog,
    owner: &'a ProcessableType,
    memo: HashMap<TypeRef, ArgValue>,
    stack: Vec<String>,
    /// Set when the last failure was a cycle or the depth bound, which `Option` absorbs as `None`.
    cut_off: bool,
}

impl<'a> Resolver<'a> {
    fn new(owner: &'a ProcessableType, catalog: &'a Catalog) -> Self {
        let mut stack = Vec::with_capacity(MAX_DEPTH);
        stack.push(owner.source_name.clone());
        Self { catalog, owner, memo: HashMap::new(), stack, cut_off: false }
    }

    fn shape(&self, param: &str, reason: String) -> GenerateError {
        GenerateError::shape(&self.owner.source_name, param, reason)
    }

    fn cut(&mut self, param: &str, reason: String) -> GenerateError {
        self.cut_off = true;
        self.shape(param, reason)
    }

    fn value_for(&mut self, param: &str, ty: &TypeRef, depth: usize) -> Result<ArgValue, GenerateError> {
        if let Some(hit) = self.memo.get(ty) {
            return Ok(hit.clone());
        }
        if depth > MAX_DEPTH {
            return Err(self.cut(param, format!("constructor dependencies nest deeper than {MAX_DEPTH} levels")));
        }
        let value = self.compute(param, ty, depth)?;
        self.memo.insert(ty.clone(), value.clone());
        Ok(value)
    }

    fn compute(&mut self, param: &str, ty: &TypeRef, depth: usize) -> Result<ArgValue, GenerateError> {
        if let Some(inner) = tu::unwrap_option(ty) {
            if self.is_mockable(inner) {
                let outer = std::mem::replace(&mut self.cut_off, false);
                let resolved = self.value_for(param, inner, depth);
                let cut_off = std::mem::replace(&mut self.cut_off, outer);
                return match resolved {
                    Ok(inner) => Ok(ArgValue::Wrap { wrapper: Wrapper::Some, inner: Box::new(inner) }),
                    Err(_) if cut_off => Ok(ArgValue::Literal(Placeholder::None)),
                    Err(e) => Err(e),
                };
            }
            return Ok(ArgValue::Literal(Placeholder::None));
        }
        if let Some(mock) = self.auto_mock(ty) {
            return Ok(mock);
        }
        if let Some((pointer, inner)) = tu::unwrap_pointer(ty) {
            let inner = self.value_for(param, inner, depth + 1)?;
            return Ok(ArgValue::Wrap { wrapper: Wrapper::Pointer(pointer), inner: Box::new(inner) });
        }
        let catalog = self.catalog;
        if let Some(path) = ty.as_path() {
            if let Some(entry) = catalog.class_of(path) {
                return self.construct(param, ty, path, entry, depth);
            }
        }
        if let Some(literal) = literal_for(ty) {
            return Ok(ArgValue::Literal(literal));
        }
        match ty {
            TypeRef::Tuple(items) => {
                let values = items.iter().map(|t| self.value_for(param, t, depth + 1)).collect::<Result<_, _>>()?;
                Ok(ArgValue::Tuple(values))
            }
            TypeRef::Array { elem, .. } => Ok(ArgValue::Array(Box::new(self.value_for(param, elem, depth + 1)?))),
            _ => self.fallback(param, ty),
        }
    }

    fn fallback(&self, param: &str, ty: &TypeRef) -> Result<ArgValue, GenerateError> {
        let name = ty.as_path().and_then(PathRef::as_single_ident);
        if let Some(tp) = name.and_then(|n| self.owner.type_params.iter().find(|p| p.name == n)) {
            return if tp.has_bound("Default") {
                Ok(ArgValue::Literal(Placeholder::Default))
            } else {
                Err(self.shape(param, format!("type parameter `{}` needs a `Default` bound to be constructed", tp.name)))
            };
        }
        let last = ty.as_path().and_then(PathRef::last).map(|seg| seg.ident.as_str());
        if last.is_some_and(|n| self.owner.configuration.default_constructible.contains(n)) {
            return Ok(ArgValue::Literal(Placeholder::Default));
        }
        Err(self.shape(param, format!("no placeholder value for `{ty}`; list it in `default_constructible` or make it mockable")))
    }

    fn is_mockable(&self, ty: &TypeRef) -> bool {
        self.interface_bound(ty).is_some() || ty.as_path().is_some_and(|p| self.catalog.class_of(p).is_some())
    }

    /// The trait path of `Box<dyn I>`, `Rc<dyn I>`, `Arc<dyn I>` or `impl I` when `I` is a catalog interface.
    fn interface_bound<'t>(&self, ty: &'t TypeRef) -> Option<(Option<Pointer>, &'t PathRef)> {
        let (pointer, bounds) = match ty {
            TypeRef::ImplTrait(bounds) => (None, bounds),
            _ => match tu::unwrap_pointer(ty)? {
                (pointer, TypeRef::TraitObject(bounds)) => (Some(pointer), bounds),
                _ => return None,
            },
        };
        bounds.iter().find_map(|b| match b {
            Bound::Trait(path) if self.catalog.interface_of(path).is_some() => Some((pointer, path)),
            _ => None,
        })
    }

    fn auto_mock(&self, ty: &TypeRef) -> Option<ArgValue> {
        let (pointer, path) = self.interface_bound(ty)?;
        let entry = self.catalog.interface_of(path)?;
        Some(ArgValue::AutoMock {
            mock: TypeRef::Path(path.renamed_last(&entry.generated_name)),
            pointer,
            target: ty.clone(),
            stubs_unit_by_default: self.owner.configuration.stubs_unit_by_default,
        })
    }

    fn construct(
        &mut self,
        param: &str,
        ty: &TypeRef,
        path: &PathRef,
        entry: &CatalogEntry,
        depth: usize,
    ) -> Result<ArgValue, GenerateError> {
        let name = path.last().map(|s| s.ident.clone()).unwrap_or_default();
        if self.stack.contains(&name) {
            let mut cycle = self.stack.clone();
            cycle.push(name);
            return Err(self.cut(param, format!("cyclic constructor dependency {}", cycle.join(" -> "))));
        }
        let Some(ctor) = entry.constructor.as_ref() else {
            return Err(self.shape(param, format!("`{name}` has no known constructor")));
        };
        let args_of_use: Vec<&TypeRef> = path
            .last()
            .map(|seg| seg.args.iter().filter_map(|a| if let GenericArg::Type(t) = a { Some(t) } else { None }).collect())
            .unwrap_or_default();
        let substitutions: HashMap<String, TypeRef> = entry
            .type_params
            .iter()
            .zip(args_of_use)
            .map(|(p, t)| (p.name.clone(), t.clone()))
            .collect();

        self.stack.push(name);
        let mut args = Vec::with_capacity(ctor.params.len());
        for nested in &ctor.params {
            let nested_ty = nested.ty.substitute(&substitutions);
            match self.value_for(param, &nested_ty, depth + 1) {
                Ok(v) => args.push(v),
                Err(e) => {
                    self.stack.pop();
                    return Err(e);
                }
            }
        }
        self.stack.pop();
        Ok(ArgValue::Construct { source: ty.clone(), constructor: ctor.name.clone(), args })
    }
}

/// Literal placeholders for the fixed type categories.
fn literal_for(ty: &TypeRef) -> Option<Placeholder> {
    Some(if ty.is_unit() {
        Placeholder::Unit
    } else if tu::is_bool(ty) {
        Placeholder::False
    } else if tu::is_integer(ty) {
        Placeholder::Zero
    } else if tu::is_float(ty) {
        Placeholder::ZeroFloat
    } else if tu::is_char(ty) {
        Placeholder::NulChar
    } else if tu::is_str_ref(ty) {
        Placeholder::EmptyStr
    } else if tu::is_slice_ref(ty) {
        Placeholder::EmptySlice
    } else if tu::is_phantom_data(ty) {
        Placeholder::PhantomData
    } else if tu::is_std_default(ty) {
        Placeholder::Default
    } else {
        return None;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Configuration, GlobalConfig, TypeOverrides};
    use syn::parse_quote;

    fn ty(t: syn::Type) -> TypeRef { TypeRef::from_syn(&t) }

    fn class(name: &str, params: Vec<Param>) -> ProcessableType {
        ProcessableType::new(TypeKind::Class, name, Configuration::default())
            .with_constructor(Constructor { name: "new".into(), params })
    }

    fn catalog_with_dependency() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.declare_interface("Dependency", "DependencyMock");
        catalog
    }

    #[test]
    fn literal_placeholders_in_order() {
        let widget = class(
            "Widget",
            vec![
                Param::new("flag", ty(parse_quote!(bool))),
                Param::new("count", ty(parse_quote!(u32))),
                Param::new("ratio", ty(parse_quote!(f64))),
                Param::new("label", ty(parse_quote!(&'static str))),
                Param::new("names", ty(parse_quote!(Vec<String>))),
                Param::new("maybe", ty(parse_quote!(Option<u8>))),
            ],
        );
        let args = synthesize(&widget, &Catalog::new()).expect("synthesizable");
        let values: Vec<_> = args.iter().map(|a| a.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                ArgValue::Literal(Placeholder::False),
                ArgValue::Literal(Placeholder::Zero),
                ArgValue::Literal(Placeholder::ZeroFloat),
                ArgValue::Literal(Placeholder::EmptyStr),
                ArgValue::Literal(Placeholder::Default),
                ArgValue::Literal(Placeholder::None),
            ]
        );
        assert!(args.iter().all(|a| !a.requires_dispatch()));
    }

    #[test]
    fn mockable_dependency_becomes_auto_mock() {
        let widget = class("Widget", vec![Param::new("dep", ty(parse_quote!(Box<dyn Dependency>)))]);
        let args = synthesize(&widget, &catalog_with_dependency()).expect("synthesizable");
        assert!(args[0].requires_dispatch());
        match &args[0].value {
            ArgValue::AutoMock { mock, pointer, stubs_unit_by_default, .. } => {
                assert_eq!(mock.to_string(), "DependencyMock");
                assert_eq!(*pointer, Some(Pointer::Box));
                assert!(*stubs_unit_by_default);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn nullable_mockable_dependency_is_wrapped_in_some() {
        let widget = class("Widget", vec![Param::new("dep", ty(parse_quote!(Option<Box<dyn Dependency>>)))]);
        let args = synthesize(&widget, &catalog_with_dependency()).expect("synthesizable");
        assert!(matches!(&args[0].value, ArgValue::Wrap { wrapper: Wrapper::Some, inner } if matches!(**inner, ArgValue::AutoMock { .. })));
    }

    #[test]
    fn auto_mock_inherits_enclosing_unit_policy() {
        let cfg = Configuration::resolve(
            &GlobalConfig::default(),
            &TypeOverrides { stubs_unit_by_default: Some(false), ..TypeOverrides::default() },
        );
        let widget = ProcessableType::new(TypeKind::Class, "Widget", cfg).with_constructor(Constructor {
            name: "new".into(),
            params: vec![Param::new("dep", ty(parse_quote!(impl Dependency)))],
        });
        let args = synthesize(&widget, &catalog_with_dependency()).expect("synthesizable");
        assert!(matches!(args[0].value, ArgValue::AutoMock { stubs_unit_by_default: false, pointer: None, .. }));
    }

    #[test]
    fn catalog_classes_are_constructed_recursively() {
        let engine = class("Engine", vec![Param::new("rpm", ty(parse_quote!(u32)))]);
        let car = class("Car", vec![Param::new("engine", ty(parse_quote!(Engine)))]);
        let catalog = Catalog::from_types([&engine, &car]);
        let args = synthesize(&car, &catalog).expect("synthesizable");
        assert_eq!(
            args[0].value,
            ArgValue::Construct {
                source: TypeRef::named("Engine"),
                constructor: "new".into(),
                args: vec![ArgValue::Literal(Placeholder::Zero)],
            }
        );
    }

    #[test]
    fn cycles_are_shape_errors() {
        let a = class("A", vec![Param::new("b", ty(parse_quote!(B)))]);
        let b = class("B", vec![Param::new("a", ty(parse_quote!(A)))]);
        let catalog = Catalog::from_types([&a, &b]);
        let err = synthesize(&a, &catalog).unwrap_err();
        assert!(matches!(&err, GenerateError::Shape { item, reason, .. } if item == "b" && reason.contains("A -> B -> A")));
    }

    #[test]
    fn nullable_self_reference_is_none() {
        let node = class(
            "Node",
            vec![Param::new("parent", ty(parse_quote!(Option<Node>))), Param::new("name", ty(parse_quote!(String)))],
        );
        let catalog = Catalog::from_types([&node]);
        let args = synthesize(&node, &catalog).expect("synthesizable");
        assert_eq!(args[0].value, ArgValue::Literal(Placeholder::None));
        assert_eq!(args[1].value, ArgValue::Literal(Placeholder::Default));
    }

    #[test]
    fn nullable_edge_breaks_a_longer_cycle() {
        let a = class("A", vec![Param::new("b", ty(parse_quote!(B)))]);
        let b = class("B", vec![Param::new("a", ty(parse_quote!(Option<A>))), Param::new("n", ty(parse_quote!(u8)))]);
        let catalog = Catalog::from_types([&a, &b]);
        let args = synthesize(&a, &catalog).expect("synthesizable");
        assert_eq!(
            args[0].value,
            ArgValue::Construct {
                source: TypeRef::named("B"),
                constructor: "new".into(),
                args: vec![ArgValue::Literal(Placeholder::None), ArgValue::Literal(Placeholder::Zero)],
            }
        );
    }

    #[test]
    fn unknown_types_name_the_parameter() {
        let widget = class("Widget", vec![Param::new("socket", ty(parse_quote!(TcpStream)))]);
        let err = synthesize(&widget, &Catalog::new()).unwrap_err();
        assert_eq!(err.item(), "socket");
    }

    #[test]
    fn type_params_need_default_bound() {
        let with_default = class("Holder", vec![Param::new("value", ty(parse_quote!(T)))])
            .with_type_param(TypeParam::new("T").with_bound(Bound::Trait(PathRef::ident("Default"))));
        let args = synthesize(&with_default, &Catalog::new()).expect("synthesizable");
        assert_eq!(args[0].value, ArgValue::Literal(Placeholder::Default));

        let without = class("Holder", vec![Param::new("value", ty(parse_quote!(T)))]).with_type_param(TypeParam::new("T"));
        assert!(synthesize(&without, &Catalog::new()).is_err());
    }

    #[test]
    fn configured_default_constructible_types() {
        let cfg = Configuration::resolve(
            &GlobalConfig::default(),
            &TypeOverrides { default_constructible: Some(["Settings".to_string()].into_iter().collect()), ..TypeOverrides::default() },
        );
        let widget = ProcessableType::new(TypeKind::Class, "Widget", cfg).with_constructor(Constructor {
            name: "new".into(),
            params: vec![Param::new("settings", ty(parse_quote!(Settings)))],
        });
        let args = synthesize(&widget, &Catalog::new()).expect("synthesizable");
        assert_eq!(args[0].value, ArgValue::Literal(Placeholder::Default));
    }

    #[test]
    fn compound_placeholders() {
        let widget = class(
            "Widget",
            vec![
                Param::new("pair", ty(parse_quote!((u8, char)))),
                Param::new("grid", ty(parse_quote!([bool; 4]))),
                Param::new("boxed", ty(parse_quote!(Box<String>))),
            ],
        );
        let args = synthesize(&widget, &Catalog::new()).expect("synthesizable");
        assert_eq!(
            args[0].value,
            ArgValue::Tuple(vec![ArgValue::Literal(Placeholder::Zero), ArgValue::Literal(Placeholder::NulChar)])
        );
        assert_eq!(args[1].value, ArgValue::Array(Box::new(ArgValue::Literal(Placeholder::False))));
        assert!(matches!(&args[2].value, ArgValue::Wrap { wrapper: Wrapper::Pointer(Pointer::Box), .. }));
    }
}
