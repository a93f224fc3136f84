//! Authorization guard chain.
//!
//! Guards run before a resolver method, in list order (the most recently
//! declared guard sits at the front). Each guard receives the request and
//! response handles plus a [`Next`] continuation. A guard allows the call to
//! progress by calling [`Next::proceed`]; returning without doing so denies
//! the call. Denial is silent: the field resolves to null and no error is
//! reported.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::context::{RequestHandle, ResponseHandle};

/// An authorization check registered against a resolver method.
pub type Guard = Arc<dyn Fn(&RequestHandle, &ResponseHandle, Next<'_>) + Send + Sync>;

/// Wraps a closure as a [`Guard`].
pub fn guard<F>(f: F) -> Guard
where
    F: Fn(&RequestHandle, &ResponseHandle, Next<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Continuation handed to a guard.
///
/// Consumed on use, so a guard can advance the chain at most once.
pub struct Next<'a> {
    proceeded: &'a mut bool,
}

impl Next<'_> {
    /// Lets the chain advance to the next guard.
    pub fn proceed(self) {
        *self.proceeded = true;
    }
}

/// Progress of a chain evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Pending,
    Running(usize),
    Allowed,
    Denied,
}

/// Final outcome of running a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Allowed,
    /// The guard at index `at` did not call its continuation.
    Denied { at: usize },
}

impl GuardOutcome {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Ordered list of guards for one resolver method.
#[derive(Clone, Default)]
pub struct GuardChain {
    guards: Vec<Guard>,
}

impl GuardChain {
    #[must_use]
    pub fn new(guards: Vec<Guard>) -> Self {
        Self { guards }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Runs every guard in order, stopping at the first that does not proceed.
    ///
    /// An empty chain allows the call.
    pub fn run(&self, req: &RequestHandle, res: &ResponseHandle) -> GuardOutcome {
        let mut state = GuardState::Pending;
        trace!(?state, guards = self.guards.len(), "Evaluating guard chain");

        for (index, guard) in self.guards.iter().enumerate() {
            state = GuardState::Running(index);
            trace!(?state, "Running guard");

            let mut proceeded = false;
            guard(
                req,
                res,
                Next {
                    proceeded: &mut proceeded,
                },
            );

            if !proceeded {
                state = GuardState::Denied;
                debug!(?state, at = index, "Guard did not proceed, denying call");
                return GuardOutcome::Denied { at: index };
            }
        }

        state = GuardState::Allowed;
        trace!(?state, "Guard chain passed");
        GuardOutcome::Allowed
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str, proceed: bool) -> Guard {
        let log = Arc::clone(log);
        guard(move |_, _, next| {
            log.lock().push(name);
            if proceed {
                next.proceed();
            }
        })
    }

    #[test]
    fn test_empty_chain_allows() {
        let chain = GuardChain::default();
        let outcome = chain.run(&RequestHandle::default(), &ResponseHandle::default());
        assert_eq!(outcome, GuardOutcome::Allowed);
    }

    #[test]
    fn test_all_guards_proceed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = GuardChain::new(vec![
            recording(&log, "b", true),
            recording(&log, "a", true),
        ]);

        let outcome = chain.run(&RequestHandle::default(), &ResponseHandle::default());
        assert!(outcome.is_allowed());
        assert_eq!(*log.lock(), ["b", "a"]);
    }

    #[test]
    fn test_guard_without_continuation_denies() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = GuardChain::new(vec![
            recording(&log, "b", true),
            recording(&log, "a", false),
            recording(&log, "never", true),
        ]);

        let outcome = chain.run(&RequestHandle::default(), &ResponseHandle::default());
        assert_eq!(outcome, GuardOutcome::Denied { at: 1 });
        assert_eq!(*log.lock(), ["b", "a"]);
    }

    #[test]
    fn test_guard_can_write_response() {
        let chain = GuardChain::new(vec![guard(|req, res, next| {
            if req.header("authorization").is_some() {
                next.proceed();
            } else {
                res.set_status(401);
            }
        })]);

        let res = ResponseHandle::default();
        let outcome = chain.run(&RequestHandle::default(), &res);
        assert!(!outcome.is_allowed());
        assert_eq!(res.status(), Some(401));
    }
}
