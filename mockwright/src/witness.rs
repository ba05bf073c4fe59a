use std::fmt;
use std::marker::PhantomData;

/// Zero-sized marker naming the mocked type at a factory call site.
pub struct Witness<T: ?Sized>(PhantomData<fn() -> *const T>);

impl<T: ?Sized> Witness<T> {
    pub const fn new() -> Self { Witness(PhantomData) }
}

impl<T: ?Sized> Clone for Witness<T> {
    fn clone(&self) -> Self { *self }
}

impl<T: ?Sized> Copy for Witness<T> {}

impl<T: ?Sized> Default for Witness<T> {
    fn default() -> Self { Self::new() }
}

impl<T: ?Sized> fmt::Debug for Witness<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Witness<{}>", std::any::type_name::<T>()) }
}

pub const fn witness<T: ?Sized>() -> Witness<T> { Witness::new() }
