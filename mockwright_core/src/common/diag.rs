use proc_macro2::Span;
use quote::ToTokens;
use syn::{spanned::Spanned, Error as SynError};

use crate::error::GenerateError;

/// Create a span-aware error on the given AST node.
pub fn err_on<T: Spanned + ToTokens>(node: &T, msg: &str) -> SynError {
    SynError::new_spanned(node, msg)
}

/// Create an error at a specific span
pub fn err_at_span(span: Span, msg: &str) -> SynError {
    SynError::new(span, msg)
}

/// Attach a generation failure to the span of the item it names.
pub fn generate_error(err: &GenerateError, span: Span) -> SynError {
    SynError::new(span, err.to_string())
}

/// Collector that aggregates multiple syn::Error values and returns a single error.
#[derive(Default)]
pub struct Collector {
    agg: Option<SynError>,
}

impl Collector {
    pub fn new() -> Self { Self { agg: None } }
    pub fn push(&mut self, err: SynError) {
        if let Some(ref mut a) = self.agg {
            a.combine(err);
        } else {
            self.agg = Some(err);
        }
    }
    pub fn is_empty(&self) -> bool { self.agg.is_none() }
    pub fn into_result<T>(self, ok: T) -> Result<T, SynError> { self.agg.map_or(Ok(ok), Err) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_err_on_contains_message() {
        let ident: syn::Ident = parse_quote!(fetch);
        let err = err_on(&ident, "async methods cannot be mocked");
        assert!(format!("{}", err).contains("async"));
    }

    #[test]
    fn collector_combines_errors() {
        let mut c = Collector::new();
        assert!(c.is_empty());
        c.push(err_at_span(Span::call_site(), "first"));
        c.push(generate_error(&GenerateError::shape("Widget", "dep", "no placeholder"), Span::call_site()));
        let err = c.into_result(()).unwrap_err();
        let messages: Vec<String> = err.into_iter().map(|e| e.to_string()).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].contains("dep"));
    }
}
