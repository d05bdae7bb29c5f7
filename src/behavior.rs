use std::fmt;
use std::sync::{Arc, Mutex};

use crate::lock;
use crate::value::{IntoValue, Value};

/// The error type a configured `Throw` behavior produces.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What an expectation does once it matched a call.
#[derive(Clone)]
pub enum Behavior {
    Return(Value),
    /// Computes the result from the live arguments.
    Compute(Arc<dyn Fn(&[Value]) -> Value + Send + Sync>),
    /// Fails the call. The factory runs on every resolution, so a replayed
    /// sequence step fails again with a fresh error.
    Throw(Arc<dyn Fn() -> BoxError + Send + Sync>),
    Sequence(Sequence),
    /// Delegates to the real instance behind a class double.
    CallBase,
    /// Reads or writes an in-memory property slot.
    Track(PropertySlot),
}

impl Behavior {
    pub fn returns(value: impl IntoValue) -> Self {
        Behavior::Return(value.into_value())
    }

    pub fn compute(f: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
        Behavior::Compute(Arc::new(f))
    }

    pub fn throws<E, F>(f: F) -> Self
    where
        E: Into<BoxError>,
        F: Fn() -> E + Send + Sync + 'static,
    {
        Behavior::Throw(Arc::new(move || f().into()))
    }

    pub fn sequence(steps: impl IntoIterator<Item = Behavior>) -> Self {
        Behavior::Sequence(Sequence::new(steps))
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::Return(value) => f.debug_tuple("Return").field(value).finish(),
            Behavior::Compute(_) => f.write_str("Compute(..)"),
            Behavior::Throw(_) => f.write_str("Throw(..)"),
            Behavior::Sequence(sequence) => fmt::Debug::fmt(sequence, f),
            Behavior::CallBase => f.write_str("CallBase"),
            Behavior::Track(slot) => fmt::Debug::fmt(slot, f),
        }
    }
}

/// Successive responses to the same matched pattern.
///
/// Each resolution advances the cursor by one, even when the step throws. Once
/// exhausted the last step is replayed indefinitely. Clones share the cursor.
#[derive(Clone, Default)]
pub struct Sequence(Arc<Mutex<SequenceState>>);

#[derive(Default)]
struct SequenceState {
    steps: Vec<Behavior>,
    cursor: usize,
}

impl Sequence {
    pub fn new(steps: impl IntoIterator<Item = Behavior>) -> Self {
        Self(Arc::new(Mutex::new(SequenceState {
            steps: steps.into_iter().collect(),
            cursor: 0,
        })))
    }

    pub(crate) fn push(&self, step: Behavior) {
        lock(&self.0).steps.push(step);
    }

    /// The step for this resolution, or `None` for an empty sequence.
    pub(crate) fn advance(&self) -> Option<Behavior> {
        let mut state = lock(&self.0);
        let last = state.steps.len().checked_sub(1)?;
        let step = state.steps[state.cursor.min(last)].clone();
        if state.cursor <= last {
            state.cursor += 1;
        }
        Some(step)
    }

    pub fn len(&self) -> usize {
        lock(&self.0).steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.0);
        f.debug_struct("Sequence")
            .field("steps", &state.steps)
            .field("cursor", &state.cursor)
            .finish()
    }
}

/// Backing storage of a tracked property. `None` until first written.
#[derive(Clone, Debug, Default)]
pub struct PropertySlot(Arc<Mutex<Option<Value>>>);

impl PropertySlot {
    pub fn new(initial: Option<Value>) -> Self {
        Self(Arc::new(Mutex::new(initial)))
    }

    pub fn read(&self) -> Option<Value> {
        lock(&self.0).clone()
    }

    pub fn write(&self, value: Value) {
        *lock(&self.0) = Some(value);
    }

    /// Stores `value` unless something was written in the meantime, and
    /// returns whatever the slot holds afterwards.
    pub(crate) fn read_or_init(&self, value: Value) -> Value {
        lock(&self.0).get_or_insert(value).clone()
    }
}
