//! Composable generators for the parts of a mock.
//!
//! Each part of the emitted code (struct, inherent impl, trait impl, ...) is a small
//! zero-sized generator implementing `CodeGen<MockModel>`. `Chain` and `Conditional`
//! compose them, and `seq!` reads the full emission order off a single type alias.

use proc_macro2::TokenStream as TokenStream2;

/// A generator that transforms an input into generated tokens.
pub trait CodeGen<Input> {
    type Output;
    fn generate(input: &Input) -> Self::Output;
}

/// A boolean test on an input, used for branching.
pub trait Predicate<Input> {
    fn test(input: &Input) -> bool;
}

/// Run A then B; concatenate outputs.
pub struct Chain<A, B>(core::marker::PhantomData<(A, B)>);

impl<Input, A, B> CodeGen<Input> for Chain<A, B>
where
    A: CodeGen<Input, Output = TokenStream2>,
    B: CodeGen<Input, Output = TokenStream2>,
{
    type Output = TokenStream2;
    fn generate(input: &Input) -> Self::Output {
        let a = A::generate(input);
        let b = B::generate(input);
        quote::quote! { #a #b }
    }
}

/// If P::test(input) { T } else { F }
pub struct Conditional<P, T, F>(core::marker::PhantomData<(P, T, F)>);

impl<Input, P, T, F> CodeGen<Input> for Conditional<P, T, F>
where
    P: Predicate<Input>,
    T: CodeGen<Input, Output = TokenStream2>,
    F: CodeGen<Input, Output = TokenStream2>,
{
    type Output = TokenStream2;
    fn generate(input: &Input) -> Self::Output {
        if P::test(input) { T::generate(input) } else { F::generate(input) }
    }
}

/// Produces nothing; the usual "else" branch.
pub struct Noop;

impl<Input> CodeGen<Input> for Noop {
    type Output = TokenStream2;
    fn generate(_: &Input) -> Self::Output { TokenStream2::new() }
}

/// Sequence generators left to right: `seq![A, B, C]` is `Chain<A, Chain<B, C>>`.
#[macro_export]
macro_rules! seq {
    ($single:ty) => { $single };
    ($first:ty, $second:ty) => {
        $crate::emit::gen::Chain<$first, $second>
    };
    ($first:ty, $($rest:ty),+ $(,)?) => {
        $crate::emit::gen::Chain<$first, $crate::seq![$($rest),+]>
    };
}
