//! Mocks and spies generated by `#[mockable]`.
//!
//! ```ignore
//! #[mockwright::mockable]
//! pub trait Greeter {
//!     fn greet(&self, name: &str) -> String;
//! }
//!
//! let mock = GreeterMock::mock(mockwright::witness());
//! mockwright::given(&mock, GreeterMock::GREET).returns(String::from("hi"));
//! assert_eq!(mock.greet("Ann"), "hi");
//! ```

mod dispatch;
mod failure;
mod stub;
mod witness;

pub use dispatch::{Dispatch, Invocation, MemberId, Mocked};
pub use failure::DispatchFailure;
pub use mockwright_macros::mockable;
pub use stub::{given, invocations, reset, Stubbing};
pub use witness::{witness, Witness};
