use std::collections::HashSet;
use std::sync::Mutex;

use crate::call::CallSignature;
use crate::lock;

/// One entry of a double's invocation log.
#[derive(Clone, Debug)]
pub struct Invocation {
    seq: u64,
    call: CallSignature,
    matched: Option<u64>,
    accounted: bool,
}

impl Invocation {
    /// Position in the log, monotonic per double. Clearing the log does not
    /// restart the count.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn call(&self) -> &CallSignature {
        &self.call
    }

    /// Id of the expectation that resolved this call, if any.
    pub fn matched(&self) -> Option<u64> {
        self.matched
    }

    /// Whether verification has covered this entry.
    pub fn is_accounted(&self) -> bool {
        self.accounted
    }
}

#[derive(Debug, Default)]
struct LogState {
    next_seq: u64,
    entries: Vec<Invocation>,
}

/// Append-only record of every intercepted call.
///
/// Append and sequence numbering happen under one lock, so a double may be
/// exercised from several threads at once.
#[derive(Debug, Default)]
pub(crate) struct InvocationLog {
    state: Mutex<LogState>,
}

impl InvocationLog {
    pub fn append(&self, call: CallSignature) -> u64 {
        let mut state = lock(&self.state);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.push(Invocation {
            seq,
            call,
            matched: None,
            accounted: false,
        });
        seq
    }

    pub fn record_match(&self, seq: u64, expectation: u64) {
        let mut state = lock(&self.state);
        if let Some(entry) = state.entries.iter_mut().rev().find(|entry| entry.seq == seq) {
            entry.matched = Some(expectation);
        }
    }

    pub fn mark_accounted(&self, seqs: &HashSet<u64>) {
        if seqs.is_empty() {
            return;
        }
        let mut state = lock(&self.state);
        for entry in state.entries.iter_mut() {
            if seqs.contains(&entry.seq) {
                entry.accounted = true;
            }
        }
    }

    pub fn snapshot(&self) -> Vec<Invocation> {
        lock(&self.state).entries.clone()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).entries.is_empty()
    }

    /// Whether anything was ever appended, cleared entries included.
    pub fn has_recorded(&self) -> bool {
        lock(&self.state).next_seq > 0
    }

    /// Forgets every entry. Sequence numbers keep counting.
    pub fn clear(&self) {
        lock(&self.state).entries.clear();
    }
}
