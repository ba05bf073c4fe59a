use proc_macro2::TokenStream as TokenStream2;
use quote::quote;

use crate::ir::TypeParam;

/// Builder for generating impl blocks on a generated (possibly generic) type
pub struct ImplBuilder {
    target: TokenStream2,
    params: Vec<TypeParam>,
    predicates: Vec<TokenStream2>,
    trait_name: Option<TokenStream2>,
    items: Vec<TokenStream2>,
    impl_attrs: Vec<TokenStream2>,
}

impl ImplBuilder {
    /// `target` is the full self type, e.g. `RepoMock<T>`; `params` become `impl<..>`.
    pub fn new(target: TokenStream2, params: &[TypeParam]) -> Self {
        Self {
            target,
            params: params.to_vec(),
            predicates: Vec::new(),
            trait_name: None,
            items: Vec::new(),
            impl_attrs: Vec::new(),
        }
    }

    /// Add a trait implementation
    pub fn implement_trait(mut self, trait_name: TokenStream2) -> Self {
        self.trait_name = Some(trait_name);
        self
    }

    /// Require `'static` on every type parameter
    pub fn static_params(mut self) -> Self {
        for p in &self.params {
            let name = crate::types::ident(&p.name);
            self.predicates.push(quote! { #name: 'static });
        }
        self
    }

    /// Add a method (or any other item) to the impl block
    pub fn add_method(mut self, method: TokenStream2) -> Self {
        self.items.push(method);
        self
    }

    pub fn add_methods(mut self, methods: impl IntoIterator<Item = TokenStream2>) -> Self {
        self.items.extend(methods);
        self
    }

    /// Add an associated type declaration: `type Name = Ty;`
    pub fn add_assoc_type(mut self, name: TokenStream2, ty: TokenStream2) -> Self {
        self.items.push(quote! { type #name = #ty; });
        self
    }

    /// Attach arbitrary attributes to the impl block (e.g., cfg, allow, etc.)
    pub fn with_attrs(mut self, attrs: TokenStream2) -> Self {
        self.impl_attrs.push(attrs);
        self
    }

    /// Build the final impl block
    pub fn build(self) -> TokenStream2 {
        let target = &self.target;
        let params = &self.params;
        let generics = (!params.is_empty()).then(|| quote! { < #( #params ),* > });
        let predicates = &self.predicates;
        let where_clause = (!predicates.is_empty()).then(|| quote! { where #( #predicates ),* });
        let items = &self.items;
        let impl_attrs = &self.impl_attrs;
        let for_trait = self.trait_name.as_ref().map(|t| quote! { #t for });

        quote! {
            #( #impl_attrs )*
            impl #generics #for_trait #target #where_clause {
                #( #items )*
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bound, PathRef};

    #[test]
    fn inherent_impl_without_generics() {
        let ts = ImplBuilder::new(quote!(WidgetMock), &[]).add_method(quote!(fn a(&self) {})).build();
        let item: syn::ItemImpl = syn::parse2(ts).expect("valid impl");
        assert!(item.trait_.is_none());
        assert!(item.generics.params.is_empty());
        assert_eq!(item.items.len(), 1);
    }

    #[test]
    fn trait_impl_with_static_params() {
        let params = vec![TypeParam::new("T").with_bound(Bound::Trait(PathRef::ident("Clone")))];
        let ts = ImplBuilder::new(quote!(RepoMock<T>), &params)
            .implement_trait(quote!(Repo<T>))
            .static_params()
            .with_attrs(quote!(#[allow(dead_code)]))
            .build();
        let item: syn::ItemImpl = syn::parse2(ts).expect("valid impl");
        assert!(item.trait_.is_some());
        assert_eq!(item.generics.params.len(), 1);
        assert_eq!(item.generics.where_clause.map(|w| w.predicates.len()), Some(1));
        assert_eq!(item.attrs.len(), 1);
    }
}
