use std::any::Any;
use std::sync::Arc;

use crate::dispatch::{Dispatch, MemberId, Mocked};

/// Pending stub for one member of one mock; finish it with [`returns`](Stubbing::returns)
/// or [`answers`](Stubbing::answers).
#[must_use = "a stub does nothing until `returns` or `answers` is called"]
pub struct Stubbing<'a> {
    dispatch: &'a Dispatch,
    member: MemberId,
}

impl<'a> Stubbing<'a> {
    /// Every later call returns a clone of `value`.
    pub fn returns<R>(self, value: R)
    where
        R: Clone + Send + Sync + 'static,
    {
        self.answers(move || value.clone())
    }

    /// Every later call returns whatever `answer` produces.
    pub fn answers<R, F>(self, answer: F)
    where
        R: 'static,
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.dispatch.stub(self.member, Arc::new(move || Box::new(answer()) as Box<dyn Any>));
    }
}

/// Start stubbing `member` on `mock`. Stubs on a spy take precedence over the spied instance.
pub fn given<M: Mocked>(mock: &M, member: MemberId) -> Stubbing<'_> {
    Stubbing { dispatch: mock.dispatch(), member }
}

/// Number of calls to `member` recorded so far, stubbed or not.
pub fn invocations<M: Mocked>(mock: &M, member: MemberId) -> usize { mock.dispatch().invocations(member) }

pub fn reset<M: Mocked>(mock: &M) { mock.dispatch().reset() }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Invocation;
    use std::rc::Rc;

    const COUNT: MemberId = MemberId::new("Counter", "count", "() -> u32");
    const SHARED: MemberId = MemberId::new("Counter", "shared", "() -> Rc<u32>");

    struct CounterMock {
        dispatch: Dispatch,
    }

    impl Mocked for CounterMock {
        fn dispatch(&self) -> &Dispatch { &self.dispatch }
        fn configured(stubs_unit_by_default: bool) -> Self {
            Self { dispatch: Dispatch::configure("Counter", stubs_unit_by_default) }
        }
    }

    impl CounterMock {
        fn count(&self) -> u32 {
            match self.dispatch.invoke::<u32, ()>(COUNT, None) {
                Invocation::Replay(v) => v,
                Invocation::FallThrough(()) => unreachable!(),
            }
        }
    }

    #[test]
    fn returns_and_counts() {
        let mock = CounterMock::configured(true);
        given(&mock, COUNT).returns(3u32);
        assert_eq!(mock.count(), 3);
        assert_eq!(mock.count(), 3);
        assert_eq!(invocations(&mock, COUNT), 2);
        reset(&mock);
        assert_eq!(invocations(&mock, COUNT), 0);
    }

    #[test]
    fn answers_can_build_non_send_values() {
        let mock = CounterMock::configured(true);
        given(&mock, SHARED).answers(|| Rc::new(9u32));
        let value = mock.dispatch.invoke::<Rc<u32>, ()>(SHARED, None);
        assert_eq!(value, Invocation::Replay(Rc::new(9)));
    }

    #[test]
    fn later_stub_replaces_earlier() {
        let mock = CounterMock::configured(true);
        given(&mock, COUNT).returns(1u32);
        given(&mock, COUNT).answers(|| 2u32);
        assert_eq!(mock.count(), 2);
    }
}
