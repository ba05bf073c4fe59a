//! `#[mockable]` front end: lowers a trait or an inherent impl into the type-shape model,
//! runs the pipeline and re-emits the item followed by its mock.

use std::collections::{BTreeSet, HashMap};

use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{quote, ToTokens};
use syn::{
    parse::{Parse, ParseStream},
    FnArg, GenericParam, Ident, ImplItem, Item, ItemImpl, ItemTrait, LitBool, LitStr, Pat, ReturnType, Signature,
    Token, TraitItem, TypeParamBound,
};

use crate::common::attrs;
use crate::common::diag::{self, Collector};
use crate::config::{Configuration, GlobalConfig, TypeOverrides};
use crate::ctor::Catalog;
use crate::emit;
use crate::generate::generate;
use crate::ir::{
    Constructor, FunctionSpec, MemberRef, MemberSpec, OwnerRef, Param, ProcessableType, Receiver, TypeKind, TypeParam,
    Visibility,
};
use crate::types::{Bound, TypeRef};

const ATTR: &str = "mockable";

/// Parsed `#[mockable(key = value, ...)]` arguments.
pub struct MockableArgs {
    pub name: Option<LitStr>,
    pub vis: Option<LitStr>,
    pub stubs_unit_by_default: Option<LitBool>,
    pub exclude: Option<LitStr>,
    pub exclude_default_members: Option<LitBool>,
    pub platform_namespaces: Option<LitStr>,
    pub constructor: Option<LitStr>,
    pub auto_mock: Option<LitStr>,
    pub default_constructible: Option<LitStr>,
    pub module: Option<LitStr>,
    pub crate_path: Option<LitStr>,
    pub span: Span,
}

impl MockableArgs {
    pub fn empty() -> Self {
        Self {
            name: None,
            vis: None,
            stubs_unit_by_default: None,
            exclude: None,
            exclude_default_members: None,
            platform_namespaces: None,
            constructor: None,
            auto_mock: None,
            default_constructible: None,
            module: None,
            crate_path: None,
            span: Span::call_site(),
        }
    }
}

fn set<T>(slot: &mut Option<T>, key: &Ident, value: T) -> syn::Result<()> {
    if slot.is_some() {
        return Err(syn::Error::new_spanned(key, format!("duplicate mockable option `{key}`")));
    }
    *slot = Some(value);
    Ok(())
}

impl Parse for MockableArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = MockableArgs { span: input.span(), ..MockableArgs::empty() };

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            match key.to_string().as_str() {
                "name" => set(&mut args.name, &key, input.parse()?)?,
                "vis" => set(&mut args.vis, &key, input.parse()?)?,
                "stubs_unit_by_default" => set(&mut args.stubs_unit_by_default, &key, input.parse()?)?,
                "exclude" => set(&mut args.exclude, &key, input.parse()?)?,
                "exclude_default_members" => set(&mut args.exclude_default_members, &key, input.parse()?)?,
                "platform_namespaces" => set(&mut args.platform_namespaces, &key, input.parse()?)?,
                "constructor" => set(&mut args.constructor, &key, input.parse()?)?,
                "auto_mock" => set(&mut args.auto_mock, &key, input.parse()?)?,
                "default_constructible" => set(&mut args.default_constructible, &key, input.parse()?)?,
                "module" => set(&mut args.module, &key, input.parse()?)?,
                "crate_path" => set(&mut args.crate_path, &key, input.parse()?)?,
                _ => return Err(syn::Error::new_spanned(key, "unknown mockable option")),
            }
            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

/// Comma-separated entries of a string list option.
fn list(lit: &LitStr) -> Vec<String> {
    lit.value().split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

fn ident_list(lit: &LitStr) -> syn::Result<BTreeSet<String>> {
    list(lit)
        .into_iter()
        .map(|entry| {
            let last = entry.rsplit("::").next().unwrap_or_default().trim().to_string();
            syn::parse_str::<Ident>(&last).map(|_| last).map_err(|_| diag::err_on(lit, &format!("`{entry}` is not a type name")))
        })
        .collect()
}

impl MockableArgs {
    /// Per-type overrides; member-level `#[mockable(exclude)]` entries are merged into `exclude`.
    pub fn overrides(&self, flagged: &[MemberRef]) -> syn::Result<TypeOverrides> {
        let mut overrides = TypeOverrides {
            stubs_unit_by_default: self.stubs_unit_by_default.as_ref().map(LitBool::value),
            exclude_default_members: self.exclude_default_members.as_ref().map(LitBool::value),
            ..TypeOverrides::default()
        };
        if let Some(name) = &self.name {
            syn::parse_str::<Ident>(&name.value()).map_err(|_| diag::err_on(name, "`name` must be a plain identifier"))?;
            overrides.generated_name = Some(name.value());
        }
        if let Some(ctor) = &self.constructor {
            syn::parse_str::<Ident>(&ctor.value()).map_err(|_| diag::err_on(ctor, "`constructor` must be a plain identifier"))?;
            overrides.constructor = Some(ctor.value());
        }
        if let Some(path) = &self.crate_path {
            syn::parse_str::<syn::Path>(&path.value()).map_err(|_| diag::err_on(path, "`crate_path` must be a path"))?;
            overrides.runtime_path = Some(path.value());
        }
        if let Some(ns) = &self.platform_namespaces {
            overrides.platform_namespaces = Some(list(ns).into_iter().collect());
        }
        if let Some(auto) = &self.auto_mock {
            overrides.auto_mock = Some(ident_list(auto)?);
        }
        if let Some(defaults) = &self.default_constructible {
            overrides.default_constructible = Some(ident_list(defaults)?);
        }
        if self.exclude.is_some() || !flagged.is_empty() {
            let mut excluded: BTreeSet<MemberRef> = flagged.iter().cloned().collect();
            if let Some(lit) = &self.exclude {
                for entry in list(lit) {
                    let member = MemberRef::parse(&entry)
                        .ok_or_else(|| diag::err_on(lit, &format!("`{entry}` is not `member` or `Owner::member`")))?;
                    excluded.insert(member);
                }
            }
            overrides.excluded_members = Some(excluded);
        }
        Ok(overrides)
    }

    pub fn requested_vis(&self) -> syn::Result<Option<Visibility>> {
        self.vis
            .as_ref()
            .map(|lit| {
                syn::parse_str::<syn::Visibility>(&lit.value())
                    .map(|v| Visibility::from_syn(&v))
                    .map_err(|_| diag::err_on(lit, "`vis` must be a visibility such as `pub(crate)`"))
            })
            .transpose()
    }
}

/// Maps model item names back to source spans for error reporting.
pub struct SpanTable {
    spans: HashMap<String, Span>,
    fallback: Span,
}

impl SpanTable {
    fn new(fallback: Span) -> Self { Self { spans: HashMap::new(), fallback } }

    fn insert(&mut self, name: impl Into<String>, span: Span) { self.spans.entry(name.into()).or_insert(span); }

    pub fn lookup(&self, item: &str) -> Span { self.spans.get(item).copied().unwrap_or(self.fallback) }
}

/// A lowered declaration plus the spans needed to report errors against it.
pub struct Lowered {
    pub ty: ProcessableType,
    pub spans: SpanTable,
}

fn provenance(args: &MockableArgs, name: &str) -> String {
    match &args.module {
        Some(module) => format!("{}::{name}", module.value()),
        None => name.to_string(),
    }
}

fn lower_type_params(generics: &syn::Generics, errors: &mut Collector) -> Vec<TypeParam> {
    let mut params = Vec::new();
    for param in &generics.params {
        match param {
            GenericParam::Type(tp) => {
                let mut out = TypeParam::new(tp.ident.to_string());
                for bound in &tp.bounds {
                    match Bound::from_syn(bound) {
                        Some(b) => out.bounds.push(b),
                        None => errors.push(diag::err_on(bound, "this bound is not supported on mocked type parameters")),
                    }
                }
                out.default = tp.default.as_ref().map(TypeRef::from_syn);
                params.push(out);
            }
            GenericParam::Lifetime(lt) => errors.push(diag::err_on(lt, "mocked types cannot have lifetime parameters")),
            GenericParam::Const(c) => errors.push(diag::err_on(c, "mocked types cannot have const parameters")),
        }
    }
    if let Some(wc) = &generics.where_clause {
        errors.push(diag::err_on(wc, "move `where` bounds onto the type parameters of a mocked type"));
    }
    params
}

/// Lowers one method signature. Shapes the model cannot render are recorded as restrictions;
/// they are reported if the member is retained or must be scaffolded as a required trait member.
fn lower_fn(sig: &Signature, owner: &OwnerRef, is_abstract: bool, vis: Visibility) -> FunctionSpec {
    let mut restriction = None;
    let mut restrict = |reason: &str| {
        restriction.get_or_insert_with(|| reason.to_string());
    };
    if sig.asyncness.is_some() {
        restrict("is `async`");
    }
    if sig.abi.is_some() || sig.variadic.is_some() {
        restrict("uses a foreign ABI");
    }
    if sig.generics.type_params().next().is_some() || sig.generics.const_params().next().is_some() {
        restrict("declares its own type or const parameters");
    }
    if sig.generics.where_clause.is_some() {
        restrict("has a `where` clause");
    }
    let receiver = match sig.receiver() {
        Some(r) if r.colon_token.is_some() => {
            restrict("uses a typed `self` receiver");
            Receiver::Ref
        }
        Some(r) => match &r.reference {
            Some((_, Some(_))) => {
                restrict("names the lifetime of `self`");
                Receiver::Ref
            }
            Some(_) if r.mutability.is_some() => Receiver::RefMut,
            Some(_) => Receiver::Ref,
            None => Receiver::Value,
        },
        None => {
            restrict("has no `self` receiver");
            Receiver::Ref
        }
    };
    let mut params = Vec::new();
    for (i, input) in sig.inputs.iter().enumerate() {
        let FnArg::Typed(pt) = input else { continue };
        if matches!(&*pt.ty, syn::Type::ImplTrait(_)) {
            restrict("takes an `impl Trait` argument, which leaves the trait unusable as `dyn`");
        }
        let name = match &*pt.pat {
            Pat::Ident(pi) => pi.ident.to_string(),
            _ => format!("arg{i}"),
        };
        params.push(Param::new(name, TypeRef::from_syn(&pt.ty)));
    }
    let output = match &sig.output {
        ReturnType::Default => TypeRef::Unit,
        ReturnType::Type(_, ty) => TypeRef::from_syn(ty),
    };
    FunctionSpec {
        name: sig.ident.to_string(),
        owner: owner.clone(),
        receiver,
        params,
        output,
        lifetimes: sig.generics.lifetimes().map(|l| l.lifetime.ident.to_string()).collect(),
        is_abstract,
        is_unsafe: sig.unsafety.is_some(),
        vis,
        restriction,
    }
}

fn is_marker_bound(bound: &TypeParamBound) -> bool {
    match bound {
        TypeParamBound::Lifetime(lt) => lt.ident == "static",
        TypeParamBound::Trait(tb) => tb
            .path
            .segments
            .last()
            .is_some_and(|s| matches!(s.ident.to_string().as_str(), "Send" | "Sync" | "Unpin") && s.arguments.is_empty()),
        _ => false,
    }
}

fn record_params(spans: &mut SpanTable, sig: &Signature) {
    for input in &sig.inputs {
        if let FnArg::Typed(pt) = input {
            if let Pat::Ident(pi) = &*pt.pat {
                spans.insert(pi.ident.to_string(), pi.ident.span());
            }
        }
    }
}

/// Lowers a trait into an interface-kind type.
pub fn lower_trait(item: &ItemTrait, args: &MockableArgs, global: &GlobalConfig) -> syn::Result<Lowered> {
    let mut errors = Collector::new();
    let name = item.ident.to_string();
    let owner = OwnerRef::new("", name.clone());
    let mut spans = SpanTable::new(item.ident.span());
    spans.insert(name.clone(), item.ident.span());

    if item.unsafety.is_some() {
        errors.push(diag::err_on(&item.unsafety, "unsafe traits cannot be mocked"));
    }
    if item.auto_token.is_some() {
        errors.push(diag::err_on(&item.auto_token, "auto traits cannot be mocked"));
    }
    for bound in item.supertraits.iter().filter(|b| !is_marker_bound(b)) {
        errors.push(diag::err_on(bound, "only `Send`, `Sync`, `Unpin` and `'static` supertraits can be mocked"));
    }
    let type_params = lower_type_params(&item.generics, &mut errors);

    let mut members = Vec::new();
    let mut flagged = Vec::new();
    for trait_item in &item.items {
        match trait_item {
            TraitItem::Fn(f) => {
                match attrs::member_flags(&f.attrs, ATTR) {
                    Ok(flags) if flags.exclude => flagged.push(MemberRef::new(None, f.sig.ident.to_string())),
                    Ok(_) => {}
                    Err(e) => errors.push(e),
                }
                spans.insert(f.sig.ident.to_string(), f.sig.ident.span());
                record_params(&mut spans, &f.sig);
                members.push(MemberSpec::Function(lower_fn(&f.sig, &owner, f.default.is_none(), Visibility::Public)));
            }
            TraitItem::Type(t) => errors.push(diag::err_on(&t.ident, "traits with associated types cannot be mocked")),
            TraitItem::Const(c) => errors.push(diag::err_on(&c.ident, "traits with associated constants cannot be mocked")),
            other => errors.push(diag::err_on(other, "unsupported trait item")),
        }
    }

    let overrides = args.overrides(&flagged)?;
    let configuration = Configuration::resolve(global, &overrides);
    let source_vis = Visibility::from_syn(&item.vis);
    let visibility = match args.requested_vis()? {
        Some(requested) => source_vis.narrowest(&requested),
        None => source_vis,
    };
    if let Some(lit) = &args.name {
        spans.insert(lit.value(), lit.span());
    }

    let mut ty = ProcessableType::new(TypeKind::Interface, name.clone(), configuration).with_visibility(visibility);
    ty.type_params = type_params;
    ty.members = members;
    ty.annotations = attrs::annotations(&item.attrs, ATTR);
    ty.docs = attrs::doc_string(&item.attrs);
    ty.provenance.push(crate::ir::Provenance(provenance(args, &name)));
    errors.into_result(Lowered { ty, spans })
}

/// Lowers an inherent impl block into a class-kind type.
pub fn lower_impl(item: &ItemImpl, args: &MockableArgs, global: &GlobalConfig) -> syn::Result<Lowered> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(diag::err_on(path, "expected an inherent impl; put `#[mockable]` on the trait to mock it"));
    }
    let mut errors = Collector::new();
    let syn::Type::Path(self_path) = &*item.self_ty else {
        return Err(diag::err_on(&item.self_ty, "expected `impl Type { .. }`"));
    };
    let Some(last) = self_path.path.segments.last() else {
        return Err(diag::err_on(&item.self_ty, "expected `impl Type { .. }`"));
    };
    let name = last.ident.to_string();
    let owner = OwnerRef::new("", name.clone());
    let mut spans = SpanTable::new(last.ident.span());
    spans.insert(name.clone(), last.ident.span());

    let type_params = lower_type_params(&item.generics, &mut errors);
    let declared: Vec<String> = match &last.arguments {
        syn::PathArguments::None => Vec::new(),
        syn::PathArguments::AngleBracketed(ab) => ab.args.iter().map(|a| a.to_token_stream().to_string()).collect(),
        syn::PathArguments::Parenthesized(p) => {
            errors.push(diag::err_on(p, "expected `impl Type { .. }`"));
            Vec::new()
        }
    };
    let impl_names: Vec<String> = type_params.iter().map(|p| p.name.clone()).collect();
    if declared != impl_names {
        errors.push(diag::err_on(&item.self_ty, "the impl must be generic over exactly the type's own parameters, in order"));
    }

    let global_ctor = args.constructor.as_ref().map(LitStr::value).unwrap_or_else(|| global.constructor.clone());
    let mut constructor = None;
    let mut ctor_vis = Visibility::Public;
    let mut members = Vec::new();
    let mut flagged = Vec::new();
    for impl_item in &item.items {
        let ImplItem::Fn(f) = impl_item else { continue };
        let fn_name = f.sig.ident.to_string();
        match attrs::member_flags(&f.attrs, ATTR) {
            Ok(flags) if flags.exclude => flagged.push(MemberRef::new(None, fn_name.clone())),
            Ok(_) => {}
            Err(e) => errors.push(e),
        }
        spans.insert(fn_name.clone(), f.sig.ident.span());
        record_params(&mut spans, &f.sig);
        if f.sig.receiver().is_none() {
            if fn_name == global_ctor {
                let returns_self = match &f.sig.output {
                    ReturnType::Type(_, ty) => {
                        let ty = TypeRef::from_syn(ty);
                        ty.as_path().is_some_and(|p| p.last_ident_is("Self") || p.last_ident_is(&name))
                    }
                    ReturnType::Default => false,
                };
                if returns_self {
                    let lowered = lower_fn(&f.sig, &owner, false, Visibility::from_syn(&f.vis));
                    ctor_vis = lowered.vis.clone();
                    constructor = Some(Constructor { name: fn_name, params: lowered.params });
                } else {
                    errors.push(diag::err_on(&f.sig.ident, "the mock constructor must return `Self`"));
                }
            }
            continue;
        }
        members.push(MemberSpec::Function(lower_fn(&f.sig, &owner, false, Visibility::from_syn(&f.vis))));
    }

    let overrides = args.overrides(&flagged)?;
    let configuration = Configuration::resolve(global, &overrides);
    let visibility = match args.requested_vis()? {
        Some(requested) => ctor_vis.narrowest(&requested),
        None => ctor_vis,
    };
    if let Some(lit) = &args.name {
        spans.insert(lit.value(), lit.span());
    }
    spans.insert(configuration.constructor.clone(), last.ident.span());

    let mut ty = ProcessableType::new(TypeKind::Class, name.clone(), configuration).with_visibility(visibility);
    ty.type_params = type_params;
    ty.constructor = constructor;
    ty.members = members;
    ty.annotations = attrs::annotations(&item.attrs, ATTR);
    ty.docs = attrs::doc_string(&item.attrs);
    ty.provenance.push(crate::ir::Provenance(provenance(args, &name)));
    errors.into_result(Lowered { ty, spans })
}

/// Removes member-level `#[mockable(..)]` helpers so the original item compiles unchanged.
pub fn strip_member_attrs(item: &mut Item) {
    match item {
        Item::Trait(t) => {
            for trait_item in &mut t.items {
                if let TraitItem::Fn(f) = trait_item {
                    attrs::strip(&mut f.attrs, ATTR);
                }
            }
        }
        Item::Impl(i) => {
            for impl_item in &mut i.items {
                if let ImplItem::Fn(f) = impl_item {
                    attrs::strip(&mut f.attrs, ATTR);
                }
            }
        }
        _ => {}
    }
}

/// The catalog for a single attribute expansion: the type itself plus configured auto-mocks.
pub fn catalog_for(ty: &ProcessableType) -> Catalog {
    let mut catalog = Catalog::from_types([ty]);
    for name in &ty.configuration.auto_mock {
        catalog.declare_interface(name.clone(), format!("{name}{}", ty.configuration.mock_suffix));
    }
    catalog
}

/// Entry point used by the `#[mockable]` attribute.
pub fn expand_mockable(args: MockableArgs, mut item: Item) -> TokenStream2 {
    let global = GlobalConfig::default();
    let lowered = match &item {
        Item::Trait(t) => lower_trait(t, &args, &global),
        Item::Impl(i) => lower_impl(i, &args, &global),
        other => Err(diag::err_on(other, "`#[mockable]` applies to a trait or an inherent impl block")),
    };
    strip_member_attrs(&mut item);

    let lowered = match lowered {
        Ok(l) => l,
        Err(e) => {
            let err = e.to_compile_error();
            return quote! { #item #err };
        }
    };

    let catalog = catalog_for(&lowered.ty);
    match generate(&lowered.ty, &catalog) {
        Ok(generation) => {
            let mock = emit::emit(&generation.model);
            let warnings = emit::emit_diagnostics(&generation.diagnostics, args.exclude.as_ref().map_or(args.span, |l| l.span()));
            quote! { #item #mock #warnings }
        }
        Err(e) => {
            let err = diag::generate_error(&e, lowered.spans.lookup(e.item())).to_compile_error();
            quote! { #item #err }
        }
    }
}
