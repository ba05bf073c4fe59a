//! Rust emission backend: renders a `MockModel` into items placed next to the source.

pub mod builders;
pub mod gen;

use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote, quote_spanned, ToTokens};

use crate::ctor::{ArgValue, Placeholder, Wrapper};
use crate::error::Diagnostic;
use crate::factory::{Factory, FactoryKind};
use crate::generate::{MockModel, Supertype};
use crate::ir::{Receiver, TypeKind, Visibility};
use crate::members::SynthesizedMember;
use crate::types::{ident, lifetime, verbatim};
use builders::ImplBuilder;
use gen::{CodeGen, Conditional, Noop, Predicate};

const DISPATCH_FIELD: &str = "__mockwright";
const SPY_FIELD: &str = "__spy";
const BASE_FIELD: &str = "__base";

/// Everything the generated code needs, in emission order.
pub type MockGen = crate::seq![
    StructDecl,
    InherentImpl,
    Conditional<IsInterface, ContractImpl, Noop>,
    MockedImpl,
    Conditional<IsClass, DerefImpls, Noop>,
];

/// Renders the generated items for one model.
pub fn emit(model: &MockModel) -> TokenStream2 { MockGen::generate(model) }

/// Non-fatal diagnostics surface as deprecation warnings at `span`.
pub fn emit_diagnostics(diagnostics: &[Diagnostic], span: Span) -> TokenStream2 {
    let warnings = diagnostics.iter().enumerate().map(|(i, d)| {
        let note = format!("mockwright: {d}");
        let name = format_ident!("mockwright_warning_{}", i);
        quote_spanned! {span=>
            const _: () = {
                #[deprecated(note = #note)]
                #[allow(non_upper_case_globals)]
                const #name: () = ();
                #name
            };
        }
    });
    quote! { #( #warnings )* }
}

fn rt(model: &MockModel) -> TokenStream2 { verbatim(&model.runtime_path) }

fn field(name: &str) -> proc_macro2::Ident { format_ident!("{}", name) }

/// Type of the held spy instance.
fn spy_holder(model: &MockModel) -> TokenStream2 {
    let source = model.source_type();
    match model.kind {
        TypeKind::Interface => quote! { ::core::option::Option<::std::boxed::Box<dyn #source>> },
        TypeKind::Class => quote! { ::core::option::Option<#source> },
    }
}

fn doc_lines(docs: &str) -> TokenStream2 {
    let lines = docs.lines().map(|l| format!(" {}", l.trim_end()));
    quote! { #( #[doc = #lines] )* }
}

fn provenance_docs(model: &MockModel) -> TokenStream2 {
    if model.provenance.is_empty() {
        return TokenStream2::new();
    }
    let origins = model.provenance.iter().map(|p| format!("`{}`", p.0)).collect::<Vec<_>>().join(", ");
    let line = format!(" Generated from {origins}.");
    quote! { #[doc = ""] #[doc = #line] }
}

pub struct IsClass;
impl Predicate<MockModel> for IsClass {
    fn test(model: &MockModel) -> bool { model.kind == TypeKind::Class }
}

pub struct IsInterface;
impl Predicate<MockModel> for IsInterface {
    fn test(model: &MockModel) -> bool { model.kind == TypeKind::Interface }
}

/// The mock struct: base instance (class kind), dispatch handle and spy holder.
pub struct StructDecl;
impl CodeGen<MockModel> for StructDecl {
    type Output = TokenStream2;
    fn generate(model: &MockModel) -> TokenStream2 {
        let vis = &model.visibility;
        let name = ident(&model.name);
        let params = &model.type_params;
        let generics = (!params.is_empty()).then(|| quote! { < #( #params ),* > });
        let rt = rt(model);
        let docs = model.docs.as_deref().map(doc_lines).unwrap_or_else(|| {
            let line = format!(" Mock of [`{}`].", model.source_name);
            quote! { #[doc = #line] }
        });
        let provenance = provenance_docs(model);
        let annotations = &model.annotations;
        let dispatch = field(DISPATCH_FIELD);
        let spy = field(SPY_FIELD);
        let spy_ty = spy_holder(model);
        let base = match &model.supertype {
            Supertype::Extends { .. } => {
                let base = field(BASE_FIELD);
                let source = &model.type_params;
                let source_ty = crate::generics::parameterized(&model.source_name, source);
                quote! { #base: #source_ty, }
            }
            Supertype::Implements(_) => TokenStream2::new(),
        };
        quote! {
            #docs
            #provenance
            #( #annotations )*
            #vis struct #name #generics {
                #base
                #dispatch: #rt::Dispatch,
                #[allow(dead_code)]
                #spy: #spy_ty,
            }
        }
    }
}

/// Member identities, the private constructor, factories and (class kind) the members.
pub struct InherentImpl;
impl CodeGen<MockModel> for InherentImpl {
    type Output = TokenStream2;
    fn generate(model: &MockModel) -> TokenStream2 {
        let self_ty = model.self_type();
        let consts = model.members.iter().map(|m| member_const(model, m));
        let factories = model.factories.iter().map(|f| factory(model, f));
        let members: Vec<TokenStream2> = match model.kind {
            TypeKind::Class => model.members.iter().map(|m| member_fn(model, m, true)).collect(),
            TypeKind::Interface => Vec::new(),
        };
        ImplBuilder::new(self_ty.to_token_stream(), &model.impl_params)
            .static_params()
            .with_attrs(quote! { #[allow(dead_code)] })
            .add_methods(consts)
            .add_method(constructor(model))
            .add_methods(factories)
            .add_methods(members)
            .build()
    }
}

/// Interface kind: the trait implementation, one dispatch-backed method per member.
pub struct ContractImpl;
impl CodeGen<MockModel> for ContractImpl {
    type Output = TokenStream2;
    fn generate(model: &MockModel) -> TokenStream2 {
        let Supertype::Implements(contract) = &model.supertype else { return TokenStream2::new() };
        let members = model.members.iter().map(|m| member_fn(model, m, false));
        let scaffolds = model.excluded_required.iter().map(|m| excluded_fn(model, m));
        ImplBuilder::new(model.self_type().to_token_stream(), &model.impl_params)
            .implement_trait(contract.to_token_stream())
            .static_params()
            .add_methods(members)
            .add_methods(scaffolds)
            .build()
    }
}

/// `Mocked` gives the runtime access to the dispatch handle and builds nested auto-mocks.
pub struct MockedImpl;
impl CodeGen<MockModel> for MockedImpl {
    type Output = TokenStream2;
    fn generate(model: &MockModel) -> TokenStream2 {
        let rt = rt(model);
        let dispatch = field(DISPATCH_FIELD);
        ImplBuilder::new(model.self_type().to_token_stream(), &model.impl_params)
            .implement_trait(quote! { #rt::Mocked })
            .static_params()
            .add_method(quote! {
                fn dispatch(&self) -> &#rt::Dispatch { &self.#dispatch }
            })
            .add_method(quote! {
                fn configured(stubs_unit_by_default: bool) -> Self {
                    Self::__mockwright_new(::core::option::Option::None, stubs_unit_by_default)
                }
            })
            .build()
    }
}

/// Class kind: non-dispatched API of the base stays reachable through deref.
pub struct DerefImpls;
impl CodeGen<MockModel> for DerefImpls {
    type Output = TokenStream2;
    fn generate(model: &MockModel) -> TokenStream2 {
        let base = field(BASE_FIELD);
        let source = model.source_type();
        let self_ty = model.self_type().to_token_stream();
        let deref = ImplBuilder::new(self_ty.clone(), &model.impl_params)
            .implement_trait(quote! { ::core::ops::Deref })
            .add_assoc_type(quote!(Target), source.to_token_stream())
            .add_method(quote! { fn deref(&self) -> &Self::Target { &self.#base } })
            .build();
        let deref_mut = ImplBuilder::new(self_ty, &model.impl_params)
            .implement_trait(quote! { ::core::ops::DerefMut })
            .add_method(quote! { fn deref_mut(&mut self) -> &mut Self::Target { &mut self.#base } })
            .build();
        quote! { #deref #deref_mut }
    }
}

fn member_vis(model: &MockModel, member: &SynthesizedMember) -> Visibility {
    match model.kind {
        TypeKind::Interface => model.visibility.clone(),
        TypeKind::Class => model.visibility.narrowest(&member.vis),
    }
}

fn member_const(model: &MockModel, member: &SynthesizedMember) -> TokenStream2 {
    let rt = rt(model);
    let vis = member_vis(model, member);
    let name = ident(&member.const_name);
    let owner = &member.id.owner;
    let method = &member.id.name;
    let signature = &member.id.signature;
    let doc = format!(" Identity of `{}::{}`.", owner, method.trim_start_matches("r#"));
    quote! {
        #[doc = #doc]
        #vis const #name: #rt::MemberId = #rt::MemberId::new(#owner, #method, #signature);
    }
}

fn constructor(model: &MockModel) -> TokenStream2 {
    let rt = rt(model);
    let dispatch = field(DISPATCH_FIELD);
    let spy = field(SPY_FIELD);
    let spy_ty = spy_holder(model);
    let source_name = &model.source_name;
    let base = match &model.supertype {
        Supertype::Extends { base, constructor, args } => {
            let base_field = field(BASE_FIELD);
            let ctor = ident(constructor);
            let args = args.iter().map(|a| arg_value(&rt, &a.value));
            quote! { #base_field: <#base>::#ctor( #( #args ),* ), }
        }
        Supertype::Implements(_) => TokenStream2::new(),
    };
    quote! {
        #[doc(hidden)]
        fn __mockwright_new(spy: #spy_ty, stubs_unit_by_default: bool) -> Self {
            Self {
                #base
                #dispatch: #rt::Dispatch::configure(#source_name, stubs_unit_by_default),
                #spy: spy,
            }
        }
    }
}

fn arg_value(rt: &TokenStream2, value: &ArgValue) -> TokenStream2 {
    match value {
        ArgValue::Literal(p) => match p {
            Placeholder::False => quote!(false),
            Placeholder::Zero => quote!(0),
            Placeholder::ZeroFloat => quote!(0.0),
            Placeholder::NulChar => quote!('\0'),
            Placeholder::Unit => quote!(()),
            Placeholder::EmptyStr => quote!(""),
            Placeholder::EmptySlice => quote!(&[]),
            Placeholder::Default => quote!(::core::default::Default::default()),
            Placeholder::PhantomData => quote!(::core::marker::PhantomData),
            Placeholder::None => quote!(::core::option::Option::None),
        },
        ArgValue::Wrap { wrapper, inner } => {
            let inner = arg_value(rt, inner);
            match wrapper {
                Wrapper::Some => quote!(::core::option::Option::Some(#inner)),
                Wrapper::Pointer(p) => {
                    let path = verbatim(p.path());
                    quote!(#path::new(#inner))
                }
            }
        }
        ArgValue::Tuple(items) => {
            let items = items.iter().map(|i| arg_value(rt, i));
            quote!(( #( #items, )* ))
        }
        ArgValue::Array(elem) => {
            let elem = arg_value(rt, elem);
            quote!(::core::array::from_fn(|_| #elem))
        }
        ArgValue::AutoMock { mock, pointer, target, stubs_unit_by_default } => {
            let built = quote!(<#mock as #rt::Mocked>::configured(#stubs_unit_by_default));
            match pointer {
                Some(p) => {
                    let path = verbatim(p.path());
                    quote!((#path::new(#built) as #target))
                }
                None => built,
            }
        }
        ArgValue::Construct { source, constructor, args } => {
            let ctor = ident(constructor);
            let args = args.iter().map(|a| arg_value(rt, a));
            quote!(<#source>::#ctor( #( #args ),* ))
        }
    }
}

fn factory(model: &MockModel, f: &Factory) -> TokenStream2 {
    let rt = rt(model);
    let vis = &f.visibility;
    let name = ident(f.name());
    let returns = &f.returns;
    let stubs = f.stubs_unit_by_default;
    let witness = f.witness.as_ref().map(|w| quote! { #[allow(unused_variables)] witness: #rt::Witness<#w>, });
    let on = f.spy_param.as_ref().map(|s| quote! { on: #s });
    let source = model.source_type();
    let spy_value = match (f.is_spy(), model.kind) {
        (false, _) => quote!(::core::option::Option::None),
        (true, TypeKind::Interface) => {
            quote!(::core::option::Option::Some(::std::boxed::Box::new(on) as ::std::boxed::Box<dyn #source>))
        }
        (true, TypeKind::Class) => quote!(::core::option::Option::Some(on)),
    };
    let doc = match f.kind {
        FactoryKind::Mock => format!(" Creates a mock of `{}`; unstubbed calls fail.", model.source_name),
        FactoryKind::Any => " Same as `mock`; for arguments whose behavior does not matter.".to_string(),
        FactoryKind::Spy => " Creates a spy; unstubbed calls are forwarded to `on`.".to_string(),
        FactoryKind::SpyOn => " Creates a spy on `on` without a type witness.".to_string(),
    };
    let provenance = (!f.provenance.is_empty()).then(|| {
        let origins = f.provenance.iter().map(|p| p.0.as_str()).collect::<Vec<_>>().join(", ");
        let line = format!(" Generated from `{origins}`.");
        quote! { #[doc = ""] #[doc = #line] }
    });
    quote! {
        #[doc = #doc]
        #provenance
        #vis fn #name( #witness #on ) -> #returns {
            Self::__mockwright_new(#spy_value, #stubs)
        }
    }
}

fn signature(member: &SynthesizedMember) -> TokenStream2 {
    let name = ident(&member.method);
    let lifetimes = member.lifetimes.iter().map(|l| lifetime(l));
    let generics = (!member.lifetimes.is_empty()).then(|| quote! { < #( #lifetimes ),* > });
    let receiver = match member.receiver {
        Receiver::Ref => quote!(&self),
        Receiver::RefMut => quote!(&mut self),
        Receiver::Value => quote!(self),
    };
    let params = member.params.iter().map(|p| {
        let n = ident(&p.name);
        let t = &p.ty;
        quote!(#n: #t)
    });
    let unsafety = member.is_unsafe.then(|| quote!(unsafe));
    let output = (!member.returns_unit).then(|| {
        let o = &member.output;
        quote!(-> #o)
    });
    quote! { #unsafety fn #name #generics (#receiver, #( #params ),*) #output }
}

fn member_fn(model: &MockModel, member: &SynthesizedMember, inherent: bool) -> TokenStream2 {
    let rt = rt(model);
    let dispatch = field(DISPATCH_FIELD);
    let spy = field(SPY_FIELD);
    let id = ident(&member.const_name);
    let method = ident(&member.method);
    let args = member.params.iter().map(|p| ident(&p.name));
    let spy_access = match (member.receiver, model.kind) {
        (Receiver::Ref, TypeKind::Interface) => quote!(self.#spy.as_deref()),
        (Receiver::RefMut, TypeKind::Interface) => quote!(self.#spy.as_deref_mut()),
        (Receiver::Ref, TypeKind::Class) => quote!(self.#spy.as_ref()),
        (Receiver::RefMut, TypeKind::Class) => quote!(self.#spy.as_mut()),
        (Receiver::Value, _) => quote!(self.#spy),
    };
    let forward = if member.is_unsafe {
        quote!(unsafe { __mockwright_spy.#method( #( #args ),* ) })
    } else {
        quote!(__mockwright_spy.#method( #( #args ),* ))
    };
    let body = if member.returns_unit {
        quote! {
            match #rt::Dispatch::invoke_unit(&self.#dispatch, Self::#id, #spy_access) {
                #rt::Invocation::Replay(()) => {}
                #rt::Invocation::FallThrough(__mockwright_spy) => #forward,
            }
        }
    } else {
        let output = &member.output;
        quote! {
            match #rt::Dispatch::invoke::<#output, _>(&self.#dispatch, Self::#id, #spy_access) {
                #rt::Invocation::Replay(__mockwright_value) => __mockwright_value,
                #rt::Invocation::FallThrough(__mockwright_spy) => #forward,
            }
        }
    };
    let sig = signature(member);
    let vis = inherent.then(|| member_vis(model, member));
    let allow_unsafe = member.is_unsafe.then(|| quote!(#[allow(unused_unsafe)]));
    quote! {
        #allow_unsafe
        #vis #sig {
            #body
        }
    }
}

fn excluded_fn(model: &MockModel, member: &SynthesizedMember) -> TokenStream2 {
    let sig = signature(member);
    let message = format!("`{}::{}` is excluded from `{}`", member.id.owner, member.id.name, model.name);
    quote! {
        #[allow(unused_variables)]
        #sig {
            ::core::unimplemented!(#message)
        }
    }
}
