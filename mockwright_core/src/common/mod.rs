pub mod attrs;
pub mod diag;
pub mod type_utils;
