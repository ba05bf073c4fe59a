use thiserror::Error;

use crate::dispatch::MemberId;

/// A call the mock could not answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchFailure {
    #[error("`{member}` was called on a `{type_name}` mock but never stubbed")]
    NeverStubbed { type_name: &'static str, member: MemberId },
    #[error("`{member}` on a `{type_name}` mock was stubbed with a value that is not a `{expected}`")]
    ReturnTypeMismatch { type_name: &'static str, member: MemberId, expected: &'static str },
}

impl DispatchFailure {
    pub fn member(&self) -> MemberId {
        match self {
            DispatchFailure::NeverStubbed { member, .. } | DispatchFailure::ReturnTypeMismatch { member, .. } => *member,
        }
    }

    /// Fails the current test.
    #[track_caller]
    pub fn raise(self) -> ! {
        #[cfg(feature = "log")]
        log::error!(target: "mockwright", "{self}");
        panic!("{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAINT: MemberId = MemberId::new("Widget", "paint", "() -> String");

    #[test]
    fn never_stubbed_message() {
        let f = DispatchFailure::NeverStubbed { type_name: "Widget", member: PAINT };
        assert_eq!(f.to_string(), "`Widget::paint` was called on a `Widget` mock but never stubbed");
        assert_eq!(f.member(), PAINT);
    }

    #[test]
    #[should_panic(expected = "never stubbed")]
    fn raise_panics() {
        DispatchFailure::NeverStubbed { type_name: "Widget", member: PAINT }.raise();
    }
}
