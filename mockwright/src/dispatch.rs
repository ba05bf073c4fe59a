use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::failure::DispatchFailure;

/// Identity of one mockable member: declaring owner, name and rendered signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId {
    owner: &'static str,
    name: &'static str,
    signature: &'static str,
}

impl MemberId {
    pub const fn new(owner: &'static str, name: &'static str, signature: &'static str) -> Self {
        Self { owner, name, signature }
    }

    pub fn owner(&self) -> &'static str { self.owner }

    pub fn name(&self) -> &'static str { self.name.trim_start_matches("r#") }

    pub fn signature(&self) -> &'static str { self.signature }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}::{}", self.owner, self.name()) }
}

pub(crate) type Answer = Arc<dyn Fn() -> Box<dyn Any> + Send + Sync>;

#[derive(Default)]
struct Ledger {
    stubs: HashMap<MemberId, Answer>,
    calls: Vec<MemberId>,
}

/// Outcome of routing one call.
#[derive(Debug, PartialEq, Eq)]
pub enum Invocation<R, S> {
    /// A stubbed (or default unit) value to return as-is.
    Replay(R),
    /// No stub; forward the call to the spied instance.
    FallThrough(S),
}

/// Per-mock dispatch handle. Clones share the same ledger.
#[derive(Clone)]
pub struct Dispatch {
    type_name: &'static str,
    stubs_unit_by_default: bool,
    ledger: Arc<Mutex<Ledger>>,
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ledger = self.lock();
        f.debug_struct("Dispatch")
            .field("type_name", &self.type_name)
            .field("stubs_unit_by_default", &self.stubs_unit_by_default)
            .field("stubbed", &ledger.stubs.len())
            .field("calls", &ledger.calls.len())
            .finish()
    }
}

impl Dispatch {
    pub fn configure(type_name: &'static str, stubs_unit_by_default: bool) -> Self {
        Self { type_name, stubs_unit_by_default, ledger: Arc::default() }
    }

    pub fn type_name(&self) -> &'static str { self.type_name }

    pub fn stubs_unit_by_default(&self) -> bool { self.stubs_unit_by_default }

    fn lock(&self) -> MutexGuard<'_, Ledger> { self.ledger.lock().unwrap_or_else(PoisonError::into_inner) }

    /// Records the call and returns its answer, if any. The lock is released before the answer runs.
    fn record(&self, member: MemberId) -> Option<Answer> {
        let mut ledger = self.lock();
        ledger.calls.push(member);
        ledger.stubs.get(&member).cloned()
    }

    /// Routes a call: stubbed answer first, then the spied instance.
    pub fn try_invoke<R: 'static, S>(&self, member: MemberId, spy: Option<S>) -> Result<Invocation<R, S>, DispatchFailure> {
        if let Some(answer) = self.record(member) {
            #[cfg(feature = "log")]
            log::trace!(target: "mockwright", "{}: replaying stub for `{}`", self.type_name, member);
            return answer().downcast::<R>().map(|value| Invocation::Replay(*value)).map_err(|_| {
                DispatchFailure::ReturnTypeMismatch {
                    type_name: self.type_name,
                    member,
                    expected: std::any::type_name::<R>(),
                }
            });
        }
        match spy {
            Some(spy) => Ok(Invocation::FallThrough(spy)),
            None => Err(DispatchFailure::NeverStubbed { type_name: self.type_name, member }),
        }
    }

    /// Like [`Dispatch::try_invoke`] for members returning `()`, which replay `()` when
    /// unstubbed if the mock was configured to.
    pub fn try_invoke_unit<S>(&self, member: MemberId, spy: Option<S>) -> Result<Invocation<(), S>, DispatchFailure> {
        match self.try_invoke::<(), S>(member, spy) {
            Err(DispatchFailure::NeverStubbed { .. }) if self.stubs_unit_by_default => Ok(Invocation::Replay(())),
            other => other,
        }
    }

    /// Panics with the [`DispatchFailure`] message when the call cannot be answered.
    #[track_caller]
    pub fn invoke<R: 'static, S>(&self, member: MemberId, spy: Option<S>) -> Invocation<R, S> {
        self.try_invoke(member, spy).unwrap_or_else(|failure| failure.raise())
    }

    #[track_caller]
    pub fn invoke_unit<S>(&self, member: MemberId, spy: Option<S>) -> Invocation<(), S> {
        self.try_invoke_unit(member, spy).unwrap_or_else(|failure| failure.raise())
    }

    pub(crate) fn stub(&self, member: MemberId, answer: Answer) {
        #[cfg(feature = "log")]
        log::debug!(target: "mockwright", "{}: stubbing `{}`", self.type_name, member);
        self.lock().stubs.insert(member, answer);
    }

    pub fn invocations(&self, member: MemberId) -> usize {
        self.lock().calls.iter().filter(|m| **m == member).count()
    }

    /// Forget every stub and recorded call.
    pub fn reset(&self) {
        let mut ledger = self.lock();
        ledger.stubs.clear();
        ledger.calls.clear();
    }
}

/// Implemented by every generated mock.
pub trait Mocked: Sized {
    fn dispatch(&self) -> &Dispatch;

    /// A fresh mock with no spy, used when a mock is needed as a constructor argument.
    fn configured(stubs_unit_by_default: bool) -> Self;
}
