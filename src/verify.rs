//! Post-hoc verification of a double's invocation log.
//!
//! Successful checks mark the log entries they covered as *accounted*;
//! [Double::verify_no_other_calls] then judges whatever is left. It should run
//! last in a verification session, since it only sees the accounting state at
//! the moment it is called.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::call::CallSignature;
use crate::matcher::CallPattern;
use crate::store::Expectation;
use crate::{Double, Failure};

/// How many times a pattern is expected to have been called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Times {
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
    /// Inclusive on both ends.
    Between(usize, usize),
}

impl Times {
    pub const fn never() -> Self {
        Times::Exactly(0)
    }

    pub const fn once() -> Self {
        Times::Exactly(1)
    }

    pub const fn exactly(count: usize) -> Self {
        Times::Exactly(count)
    }

    pub const fn at_least(count: usize) -> Self {
        Times::AtLeast(count)
    }

    pub const fn at_least_once() -> Self {
        Times::AtLeast(1)
    }

    pub const fn at_most(count: usize) -> Self {
        Times::AtMost(count)
    }

    pub const fn at_most_once() -> Self {
        Times::AtMost(1)
    }

    pub const fn between(from: usize, to: usize) -> Self {
        Times::Between(from, to)
    }

    pub fn admits(self, count: usize) -> bool {
        match self {
            Times::Exactly(expected) => count == expected,
            Times::AtLeast(min) => count >= min,
            Times::AtMost(max) => count <= max,
            Times::Between(from, to) => (from..=to).contains(&count),
        }
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Times::Exactly(0) => f.write_str("never"),
            Times::Exactly(1) => f.write_str("exactly once"),
            Times::Exactly(n) => write!(f, "exactly {n} times"),
            Times::AtLeast(1) => f.write_str("at least once"),
            Times::AtLeast(n) => write!(f, "at least {n} times"),
            Times::AtMost(1) => f.write_str("at most once"),
            Times::AtMost(n) => write!(f, "at most {n} times"),
            Times::Between(from, to) => write!(f, "between {from} and {to} times"),
        }
    }
}

#[derive(Debug, Error)]
pub enum VerificationFailed {
    #[error(
        "expected invocation on the double {times}, but was {actual} times: {type_name}.{pattern}{}{}",
        render_performed(.type_name, .performed),
        render_near_miss(.near_miss)
    )]
    Count {
        type_name: String,
        pattern: String,
        times: Times,
        actual: usize,
        performed: Vec<CallSignature>,
        near_miss: Option<String>,
    },

    #[error(
        "{type_name}: the following setups were not matched:{}",
        render_bullets(.unmet)
    )]
    UnmetExpectations {
        type_name: String,
        unmet: Vec<String>,
    },

    #[error(
        "{type_name}: this double failed verification due to the following unverified invocations:{}",
        render_calls(.type_name, .calls)
    )]
    UnverifiedInvocations {
        type_name: String,
        calls: Vec<CallSignature>,
    },

    #[error("{} doubles failed verification:{}", .0.len(), render_nested(.0))]
    Multiple(Vec<VerificationFailed>),
}

fn render_bullets(lines: &[String]) -> String {
    lines.iter().map(|line| format!("\n    {line}")).collect()
}

fn render_calls(type_name: &str, calls: &[CallSignature]) -> String {
    calls
        .iter()
        .map(|call| format!("\n    {type_name}.{call}"))
        .collect()
}

fn render_performed(type_name: &str, calls: &[CallSignature]) -> String {
    if calls.is_empty() {
        return "\n\nNo invocations performed.".to_owned();
    }
    format!(
        "\n\nPerformed invocations:{}",
        render_calls(type_name, calls)
    )
}

fn render_near_miss(diff: &Option<String>) -> String {
    match diff {
        Some(diff) => format!("\n\nClosest invocation:\n{diff}"),
        None => String::new(),
    }
}

fn render_nested(failures: &[VerificationFailed]) -> String {
    failures
        .iter()
        .map(|failure| format!("\n\n{failure}"))
        .collect()
}

#[cfg(feature = "pretty-print")]
fn describe_near_miss(expected: &str, actual: &str) -> String {
    pretty_assertions::StrComparison::new(expected, actual).to_string()
}

#[cfg(not(feature = "pretty-print"))]
fn describe_near_miss(expected: &str, actual: &str) -> String {
    format!("    expected: {expected}\n    found:    {actual}")
}

impl Double {
    /// Checks how often calls matching `pattern` occurred. On success the
    /// matching log entries count as accounted.
    pub fn verify(&self, pattern: &CallPattern, times: Times) -> Result<(), Failure> {
        self.check_called(pattern, times).map_err(Failure::from)
    }

    /// Fails unless every expectation flagged verifiable matched at least once.
    pub fn verify_all_expectations_met(&self) -> Result<(), Failure> {
        self.check_expectations(Expectation::is_verifiable)
            .map_err(Failure::from)
    }

    /// Fails unless every explicit setup matched at least once.
    pub fn verify_all_setups(&self) -> Result<(), Failure> {
        self.check_expectations(|expectation| !expectation.is_implicit())
            .map_err(Failure::from)
    }

    /// Fails with every logged call no earlier successful verification
    /// accounted for.
    pub fn verify_no_other_calls(&self) -> Result<(), Failure> {
        self.check_no_other_calls().map_err(Failure::from)
    }

    pub(crate) fn check_called(
        &self,
        pattern: &CallPattern,
        times: Times,
    ) -> Result<(), VerificationFailed> {
        let invocations = self.0.log.snapshot();
        let matching: HashSet<u64> = invocations
            .iter()
            .filter(|invocation| pattern.matches(invocation.call()))
            .map(|invocation| invocation.seq())
            .collect();
        let actual = matching.len();

        if times.admits(actual) {
            self.0.log.mark_accounted(&matching);
            debug!(double = %self, pattern = %pattern, actual, "verified");
            return Ok(());
        }

        let expected = format!("{}.{pattern}", self.type_name());
        let near_miss = invocations
            .iter()
            .rev()
            .map(|invocation| invocation.call())
            .find(|call| pattern.targets(call) && !pattern.matches(call))
            .map(|call| describe_near_miss(&expected, &format!("{}.{call}", self.type_name())));
        debug!(double = %self, pattern = %pattern, actual, %times, "verification failed");
        Err(VerificationFailed::Count {
            type_name: self.type_name().to_owned(),
            pattern: pattern.to_string(),
            times,
            actual,
            performed: invocations
                .into_iter()
                .map(|invocation| invocation.call().clone())
                .collect(),
            near_miss,
        })
    }

    pub(crate) fn check_expectations(
        &self,
        select: impl Fn(&Expectation) -> bool,
    ) -> Result<(), VerificationFailed> {
        let selected: Vec<_> = self
            .0
            .store
            .snapshot()
            .into_iter()
            .filter(|expectation| select(expectation))
            .collect();

        let unmet: Vec<String> = selected
            .iter()
            .filter(|expectation| expectation.hits() == 0)
            .map(|expectation| format!("{}.{}", self.type_name(), expectation.pattern()))
            .collect();
        if !unmet.is_empty() {
            debug!(double = %self, unmet = unmet.len(), "unmet expectations");
            return Err(VerificationFailed::UnmetExpectations {
                type_name: self.type_name().to_owned(),
                unmet,
            });
        }

        let ids: HashSet<u64> = selected.iter().map(|expectation| expectation.id()).collect();
        let covered: HashSet<u64> = self
            .0
            .log
            .snapshot()
            .iter()
            .filter(|invocation| invocation.matched().map_or(false, |id| ids.contains(&id)))
            .map(|invocation| invocation.seq())
            .collect();
        self.0.log.mark_accounted(&covered);
        Ok(())
    }

    pub(crate) fn check_no_other_calls(&self) -> Result<(), VerificationFailed> {
        let calls: Vec<CallSignature> = self
            .0
            .log
            .snapshot()
            .into_iter()
            .filter(|invocation| !invocation.is_accounted())
            .map(|invocation| invocation.call().clone())
            .collect();
        if calls.is_empty() {
            return Ok(());
        }
        debug!(double = %self, unverified = calls.len(), "unverified invocations");
        Err(VerificationFailed::UnverifiedInvocations {
            type_name: self.type_name().to_owned(),
            calls,
        })
    }
}
