use std::fmt;

use thiserror::Error;

/// Fatal, per-type generation failure. Other types in the same batch are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// A constructor argument or member shape cannot be synthesized.
    #[error("cannot mock `{type_name}`: {reason} (at `{item}`)")]
    Shape { type_name: String, item: String, reason: String },
    #[error("cannot mock `{type_name}`: generated name `{name}` {reason}")]
    NamingConflict { type_name: String, name: String, reason: String },
    /// A declaration the Rust backend cannot express, e.g. an `async fn`.
    #[error("cannot mock `{type_name}`: `{item}` {reason}")]
    Unsupported { type_name: String, item: String, reason: String },
}

impl GenerateError {
    pub fn shape(type_name: &str, item: impl Into<String>, reason: impl Into<String>) -> Self {
        GenerateError::Shape { type_name: type_name.to_string(), item: item.into(), reason: reason.into() }
    }

    pub fn unsupported(type_name: &str, item: impl Into<String>, reason: impl Into<String>) -> Self {
        GenerateError::Unsupported { type_name: type_name.to_string(), item: item.into(), reason: reason.into() }
    }

    pub fn naming(type_name: &str, name: impl Into<String>, reason: impl Into<String>) -> Self {
        GenerateError::NamingConflict { type_name: type_name.to_string(), name: name.into(), reason: reason.into() }
    }

    pub fn type_name(&self) -> &str {
        match self {
            GenerateError::Shape { type_name, .. }
            | GenerateError::NamingConflict { type_name, .. }
            | GenerateError::Unsupported { type_name, .. } => type_name,
        }
    }

    /// Name of the offending item, used by front ends to pick a span.
    pub fn item(&self) -> &str {
        match self {
            GenerateError::Shape { item, .. } | GenerateError::Unsupported { item, .. } => item,
            GenerateError::NamingConflict { name, .. } => name,
        }
    }
}

/// Non-fatal configuration problem; the offending entry is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    UnknownExclusion { type_name: String, entry: String },
}

impl Diagnostic {
    pub fn entry(&self) -> &str {
        match self {
            Diagnostic::UnknownExclusion { entry, .. } => entry,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownExclusion { type_name, entry } => {
                write!(f, "excluded member `{entry}` does not exist on `{type_name}`; entry ignored")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_item() {
        let err = GenerateError::shape("Widget", "dep", "no placeholder for `Socket`");
        let msg = err.to_string();
        assert!(msg.contains("Widget"));
        assert!(msg.contains("`dep`"));
        assert_eq!(err.item(), "dep");
        assert_eq!(err.type_name(), "Widget");
    }

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::UnknownExclusion { type_name: "Widget".into(), entry: "nope".into() };
        assert!(d.to_string().contains("`nope`"));
    }
}
