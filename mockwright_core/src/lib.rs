//! Mock and spy synthesis for traits and inherent impls.
//!
//! The pipeline lowers a declaration into [`ir::ProcessableType`], resolves its
//! [`config::Configuration`], filters and synthesizes members, constructor arguments and
//! factories into a [`generate::MockModel`], and finally emits Rust through [`emit::emit`].

/// Generation-time logging; compiled out unless the `log` feature is on.
#[macro_export]
#[doc(hidden)]
macro_rules! gen_log {
    ($lvl:ident, $($arg:tt)+) => {{
        #[cfg(feature = "log")]
        log::$lvl!(target: "mockwright_core", $($arg)+);
        #[cfg(not(feature = "log"))]
        {
            if false {
                let _ = ::std::format!($($arg)+);
            }
        }
    }};
}

pub mod types;
pub mod ir;
pub mod config;
pub mod error;
pub mod filter;
pub mod generics;
pub mod ctor;
pub mod members;
pub mod factory;
pub mod annotations;
pub mod generate;
pub mod emit;
pub mod attr;
pub mod common;

pub use attr::mockable::{expand_mockable, MockableArgs};
pub use common::{attrs, diag, type_utils};
pub use config::{Configuration, GlobalConfig, TypeOverrides};
pub use ctor::Catalog;
pub use error::{Diagnostic, GenerateError};
pub use generate::{generate, generate_batch, Generation, MockModel};
pub use ir::{ProcessableType, TypeKind};
