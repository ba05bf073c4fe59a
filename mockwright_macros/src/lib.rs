use proc_macro::TokenStream;
use syn::{parse_macro_input, Item};

use mockwright_core::MockableArgs;

// =====================
// Attribute macro: #[mockable]
// On a trait: generates `TraitMock` implementing the trait through a dispatch ledger.
// On an inherent impl: generates `TypeMock` wrapping an instance built from placeholder
// constructor arguments, with every method dispatched.
// =====================
#[proc_macro_attribute]
pub fn mockable(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as MockableArgs);
    let item = parse_macro_input!(item as Item);

    mockwright_core::expand_mockable(args, item).into()
}
