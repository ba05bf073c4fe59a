//! Type-shape model: an immutable description of one processable type.
//!
//! Built once per type by a declaration front end (see `attr::mockable`) or by hand
//! in tests, then handed to `generate`. Nothing in here is mutated by the pipeline;
//! every transformation works on copies.

use std::fmt;

use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};

use crate::config::Configuration;
use crate::types::{verbatim, Bound, TypeRef};

/// Inheritance kind of the described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A concrete struct described through its inherent impl; the mock wraps a base instance.
    Class,
    /// A trait; the mock implements it.
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Visibility {
    Private,
    /// `pub(super)`, `pub(self)` or `pub(in path)`; holds the text inside the parentheses.
    Restricted(String),
    Crate,
    Public,
}

impl Visibility {
    fn rank(&self) -> u8 {
        match self {
            Visibility::Private => 0,
            Visibility::Restricted(_) => 1,
            Visibility::Crate => 2,
            Visibility::Public => 3,
        }
    }

    /// The narrower of two visibilities. Generated items never exceed the source.
    pub fn narrowest(&self, other: &Visibility) -> Visibility {
        match (self, other) {
            (Visibility::Restricted(a), Visibility::Restricted(b)) => narrower_scope(a, b),
            _ if other.rank() < self.rank() => other.clone(),
            _ => self.clone(),
        }
    }

    pub fn from_syn(vis: &syn::Visibility) -> Self {
        match vis {
            syn::Visibility::Public(_) => Visibility::Public,
            syn::Visibility::Inherited => Visibility::Private,
            syn::Visibility::Restricted(r) => {
                let path = &r.path;
                if r.in_token.is_none() && path.is_ident("crate") {
                    Visibility::Crate
                } else if r.in_token.is_none() && path.is_ident("self") {
                    Visibility::Private
                } else {
                    let inner = if r.in_token.is_some() { quote!(in #path) } else { quote!(#path) };
                    Visibility::Restricted(inner.to_string())
                }
            }
        }
    }
}

/// Module path segments of a `Restricted` visibility, without the leading `in`.
fn scope_segments(restricted: &str) -> Vec<String> {
    let compact: String = restricted.split_whitespace().collect();
    let path = compact.strip_prefix("in").unwrap_or(&compact);
    path.split("::").filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Both scopes are ancestors of the declaring module. Absolute (`crate::..`) paths narrow as they
/// get longer, `super` chains narrow as they get shorter; unrelated paths fall back to the
/// declaring module itself.
fn narrower_scope(a: &str, b: &str) -> Visibility {
    let (sa, sb) = (scope_segments(a), scope_segments(b));
    if sa == sb {
        return Visibility::Restricted(a.to_string());
    }
    let absolute = |s: &[String]| s.first().is_some_and(|f| f == "crate");
    let relative = |s: &[String]| !s.is_empty() && s.iter().all(|f| f == "super");
    if absolute(&sa) && absolute(&sb) {
        let (short, long, long_text) = if sa.len() <= sb.len() { (&sa, &sb, b) } else { (&sb, &sa, a) };
        if long.starts_with(short) {
            return Visibility::Restricted(long_text.to_string());
        }
    } else if relative(&sa) && relative(&sb) {
        let text = if sa.len() <= sb.len() { a } else { b };
        return Visibility::Restricted(text.to_string());
    }
    Visibility::Private
}

impl ToTokens for Visibility {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        match self {
            Visibility::Private => {}
            Visibility::Public => tokens.extend(quote!(pub)),
            Visibility::Crate => tokens.extend(quote!(pub(crate))),
            Visibility::Restricted(inner) => {
                let inner = verbatim(inner);
                tokens.extend(quote!(pub(#inner)));
            }
        }
    }
}

/// Declared variance. Rust declarations are always `Invariant`; other front ends may
/// carry `in`/`out` projections, which the normalizer strips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variance {
    #[default]
    Invariant,
    Covariant,
    Contravariant,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParam {
    pub name: String,
    pub bounds: Vec<Bound>,
    pub variance: Variance,
    pub default: Option<TypeRef>,
}

impl TypeParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), bounds: Vec::new(), variance: Variance::Invariant, default: None }
    }

    pub fn with_bound(mut self, bound: Bound) -> Self {
        self.bounds.push(bound);
        self
    }

    pub fn has_bound(&self, trait_name: &str) -> bool { self.bounds.iter().any(|b| b.is_trait(trait_name)) }

    pub fn as_type(&self) -> TypeRef { TypeRef::named(self.name.clone()) }
}

impl ToTokens for TypeParam {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        let name = crate::types::ident(&self.name);
        let bounds = &self.bounds;
        let bounds = (!bounds.is_empty()).then(|| quote!(: #( #bounds )+*));
        let default = self.default.as_ref().map(|d| quote!(= #d));
        tokens.extend(quote!(#name #bounds #default));
    }
}

/// The type that declares a member, qualified by the top-level namespace it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerRef {
    pub namespace: String,
    pub name: String,
}

impl OwnerRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), name: name.into() }
    }

    /// `Debug`, `std::fmt::Debug` and `::core::fmt::Debug` resolve to the last segment
    /// as name and the first segment as namespace.
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim().trim_start_matches("::");
        let segments: Vec<&str> = trimmed.split("::").map(str::trim).collect();
        let name = segments.last().copied().unwrap_or_default();
        let namespace = if segments.len() > 1 { segments[0] } else { "" };
        Self::new(namespace, name)
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.name) }
}

/// `(owner, name)` pair used by exclusion lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberRef {
    /// Owner type name; `None` matches members of the processed type itself.
    pub owner: Option<String>,
    pub name: String,
}

impl MemberRef {
    pub fn new(owner: Option<&str>, name: impl Into<String>) -> Self {
        Self { owner: owner.map(str::to_string), name: name.into() }
    }

    /// Parses `"name"` or `"Owner::name"`; a leading path on the owner is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (owner, name) = match text.rsplit_once("::") {
            Some((owner, name)) => (Some(OwnerRef::from_path(owner).name), name.trim()),
            None => (None, text),
        };
        let valid = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_');
        if !valid(name) || owner.as_deref().is_some_and(|o| !valid(o)) {
            return None;
        }
        Some(Self { owner, name: name.to_string() })
    }

    pub fn matches(&self, source_name: &str, owner: &OwnerRef, name: &str) -> bool {
        self.name == name && self.owner.as_deref().map_or(owner.name == source_name, |o| o == owner.name)
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{owner}::{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self { Self { name: name.into(), ty } }

    pub fn is_nullable(&self) -> bool { crate::common::type_utils::is_option(&self.ty) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    Ref,
    RefMut,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSpec {
    pub name: String,
    pub owner: OwnerRef,
    pub receiver: Receiver,
    pub params: Vec<Param>,
    pub output: TypeRef,
    /// Lifetime parameters declared on the method, without the tick.
    pub lifetimes: Vec<String>,
    pub is_abstract: bool,
    pub is_unsafe: bool,
    pub vis: Visibility,
    /// Set by the front end when the declaration cannot be mocked; reported only if retained.
    pub restriction: Option<String>,
}

impl FunctionSpec {
    pub fn new(owner: OwnerRef, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner,
            receiver: Receiver::Ref,
            params: Vec::new(),
            output: TypeRef::Unit,
            lifetimes: Vec::new(),
            is_abstract: true,
            is_unsafe: false,
            vis: Visibility::Public,
            restriction: None,
        }
    }

    pub fn receiver(mut self, receiver: Receiver) -> Self {
        self.receiver = receiver;
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.params.push(Param::new(name, ty));
        self
    }

    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.output = ty;
        self
    }

    pub fn provided(mut self) -> Self {
        self.is_abstract = false;
        self
    }
}

/// A property is an accessor pair: `name(&self) -> T` and, when mutable, `set_name(&mut self, T)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertySpec {
    pub name: String,
    pub owner: OwnerRef,
    pub ty: TypeRef,
    pub mutable: bool,
    pub is_abstract: bool,
    pub vis: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberSpec {
    Property(PropertySpec),
    Function(FunctionSpec),
}

impl MemberSpec {
    pub fn name(&self) -> &str {
        match self {
            MemberSpec::Property(p) => &p.name,
            MemberSpec::Function(f) => &f.name,
        }
    }

    pub fn owner(&self) -> &OwnerRef {
        match self {
            MemberSpec::Property(p) => &p.owner,
            MemberSpec::Function(f) => &f.owner,
        }
    }

    pub fn is_abstract(&self) -> bool {
        match self {
            MemberSpec::Property(p) => p.is_abstract,
            MemberSpec::Function(f) => f.is_abstract,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constructor {
    pub name: String,
    pub params: Vec<Param>,
}

/// An attribute carried from the declaration, split into path name and full meta text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Annotation {
    pub name: String,
    pub meta: String,
}

impl Annotation {
    pub fn new(name: impl Into<String>, meta: impl Into<String>) -> Self {
        Self { name: name.into(), meta: meta.into() }
    }

    pub fn from_syn(attr: &syn::Attribute) -> Self {
        let name = attr.path().segments.iter().map(|s| s.ident.to_string()).collect::<Vec<_>>().join("::");
        Self { name, meta: attr.meta.to_token_stream().to_string() }
    }
}

impl ToTokens for Annotation {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        let meta = verbatim(&self.meta);
        tokens.extend(quote!(#[#meta]));
    }
}

/// Originating reference (source location or declaration path). Carried, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Provenance(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessableType {
    pub kind: TypeKind,
    pub source_name: String,
    pub generated_name: String,
    pub visibility: Visibility,
    pub type_params: Vec<TypeParam>,
    /// Class kind only.
    pub constructor: Option<Constructor>,
    pub members: Vec<MemberSpec>,
    pub annotations: Vec<Annotation>,
    pub docs: Option<String>,
    pub provenance: Vec<Provenance>,
    pub configuration: Configuration,
}

impl ProcessableType {
    /// The generated name comes from the configuration (explicit override or suffix convention).
    pub fn new(kind: TypeKind, source_name: impl Into<String>, configuration: Configuration) -> Self {
        let source_name = source_name.into();
        Self {
            kind,
            generated_name: configuration.generated_name_for(&source_name),
            source_name,
            visibility: Visibility::Public,
            type_params: Vec::new(),
            constructor: None,
            members: Vec::new(),
            annotations: Vec::new(),
            docs: None,
            provenance: Vec::new(),
            configuration,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_type_param(mut self, param: TypeParam) -> Self {
        self.type_params.push(param);
        self
    }

    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    pub fn with_member(mut self, member: MemberSpec) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_docs(mut self, docs: impl Into<String>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    pub fn with_provenance(mut self, provenance: impl Into<String>) -> Self {
        self.provenance.push(Provenance(provenance.into()));
        self
    }

    pub fn is_class(&self) -> bool { self.kind == TypeKind::Class }
    pub fn is_interface(&self) -> bool { self.kind == TypeKind::Interface }

    pub fn constructor_params(&self) -> &[Param] {
        self.constructor.as_ref().map_or(&[], |c| c.params.as_slice())
    }

    /// Owner reference for members declared directly on this type.
    pub fn own_owner(&self) -> OwnerRef { OwnerRef::new("", self.source_name.clone()) }

    /// `Source<T, U>` with the declared parameter names.
    pub fn source_type(&self) -> TypeRef {
        TypeRef::generic(self.source_name.clone(), self.type_params.iter().map(TypeParam::as_type).collect())
    }
}
