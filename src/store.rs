use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::behavior::Behavior;
use crate::call::CallSignature;
use crate::lock;
use crate::matcher::CallPattern;

/// A configured rule: a pattern, what to do when it matches, and the
/// bookkeeping verification reads back.
#[derive(Debug)]
pub struct Expectation {
    id: u64,
    pattern: CallPattern,
    behavior: Behavior,
    origin: Origin,
    verifiable: AtomicBool,
    hits: AtomicUsize,
}

/// Explicit setups versus the ones the engine registers on its own behalf
/// (tracked property slots, links of a recursive setup path).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Origin {
    Explicit,
    Implicit,
}

impl Expectation {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn pattern(&self) -> &CallPattern {
        &self.pattern
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    pub fn is_verifiable(&self) -> bool {
        self.verifiable.load(Ordering::Acquire)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Acquire)
    }

    pub(crate) fn is_implicit(&self) -> bool {
        self.origin == Origin::Implicit
    }

    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::AcqRel);
    }
}

/// Handle to a registered expectation.
#[derive(Clone, Debug)]
pub struct ExpectationHandle(Arc<Expectation>);

impl ExpectationHandle {
    /// Flags the expectation so that
    /// [verify_all_expectations_met](crate::Double::verify_all_expectations_met)
    /// requires it to have matched at least once.
    pub fn verifiable(self) -> Self {
        self.0.verifiable.store(true, Ordering::Release);
        self
    }

    pub fn hits(&self) -> usize {
        self.0.hits()
    }

    pub fn pattern(&self) -> &CallPattern {
        self.0.pattern()
    }
}

/// Ordered expectations of one double.
#[derive(Debug, Default)]
pub(crate) struct ExpectationStore {
    expectations: Mutex<Vec<Arc<Expectation>>>,
    next_id: AtomicU64,
}

impl ExpectationStore {
    pub fn register(
        &self,
        pattern: CallPattern,
        behavior: Behavior,
        origin: Origin,
    ) -> ExpectationHandle {
        let expectation = Arc::new(Expectation {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            pattern,
            behavior,
            origin,
            verifiable: AtomicBool::new(false),
            hits: AtomicUsize::new(0),
        });
        lock(&self.expectations).push(expectation.clone());
        ExpectationHandle(expectation)
    }

    /// Most recently registered expectation matching `call`.
    ///
    /// Matching runs on a snapshot, so predicates may call back into the double.
    pub fn find(&self, call: &CallSignature) -> Option<Arc<Expectation>> {
        self.snapshot()
            .into_iter()
            .rev()
            .find(|expectation| expectation.pattern.matches(call))
    }

    pub fn reset_hits(&self) {
        for expectation in lock(&self.expectations).iter() {
            expectation.hits.store(0, Ordering::Release);
        }
    }

    /// Registration-ordered copy of the store.
    pub fn snapshot(&self) -> Vec<Arc<Expectation>> {
        lock(&self.expectations).clone()
    }
}
