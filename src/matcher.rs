use std::fmt;
use std::sync::Arc;

use crate::call::{CallKind, CallSignature};
use crate::value::{write_joined, FromValue, IntoValue, Value};

/// Predicate over a single positional argument.
#[derive(Clone)]
pub enum Matcher {
    Any,
    Literal(Value),
    Predicate {
        description: String,
        test: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
    },
}

impl Matcher {
    pub fn any() -> Self {
        Matcher::Any
    }

    /// Matches an argument structurally equal to `value`.
    pub fn eq(value: impl IntoValue) -> Self {
        Matcher::Literal(value.into_value())
    }

    /// Matches any argument for which `test` holds.
    pub fn satisfies(
        description: impl Into<String>,
        test: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Matcher::Predicate {
            description: description.into(),
            test: Arc::new(test),
        }
    }

    /// Typed predicate: the live argument is converted to `T` first, and an
    /// argument that does not convert never matches.
    pub fn is<T, F>(test: F) -> Self
    where
        T: FromValue + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::satisfies(
            format!("is::<{}>(..)", std::any::type_name::<T>()),
            move |value: &Value| {
                T::from_value(value.clone())
                    .map(|typed| test(&typed))
                    .unwrap_or(false)
            },
        )
    }

    /// Matches any argument equal to one of `values`.
    pub fn is_in<V: IntoValue>(values: impl IntoIterator<Item = V>) -> Self {
        let values: Vec<Value> = values.into_iter().map(IntoValue::into_value).collect();
        let description = format!("is_in([{}])", crate::value::join(&values));
        Self::satisfies(description, move |value: &Value| values.contains(value))
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Literal(expected) => expected == value,
            Matcher::Predicate { test, .. } => test(value),
        }
    }
}

impl From<Value> for Matcher {
    fn from(value: Value) -> Self {
        Matcher::Literal(value)
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Any => f.write_str("_"),
            Matcher::Literal(value) => write!(f, "{value}"),
            Matcher::Predicate { description, .. } => f.write_str(description),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Any => f.write_str("Any"),
            Matcher::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Matcher::Predicate { description, .. } => {
                f.debug_tuple("Predicate").field(description).finish()
            }
        }
    }
}

/// A member, an access kind and one [Matcher] per positional argument.
#[derive(Clone, Debug)]
pub struct CallPattern {
    member: String,
    kind: CallKind,
    matchers: Vec<Matcher>,
}

impl CallPattern {
    pub fn method(member: impl Into<String>, matchers: impl IntoIterator<Item = Matcher>) -> Self {
        Self {
            member: member.into(),
            kind: CallKind::Method,
            matchers: matchers.into_iter().collect(),
        }
    }

    pub fn get(member: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            kind: CallKind::Get,
            matchers: Vec::new(),
        }
    }

    pub fn set(member: impl Into<String>, value: Matcher) -> Self {
        Self {
            member: member.into(),
            kind: CallKind::Set,
            matchers: vec![value],
        }
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn kind(&self) -> CallKind {
        self.kind
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Same member, kind and arity, regardless of argument values.
    pub fn targets(&self, call: &CallSignature) -> bool {
        self.kind == call.kind()
            && self.member == call.member()
            && self.matchers.len() == call.args().len()
    }

    pub fn matches(&self, call: &CallSignature) -> bool {
        self.targets(call)
            && self
                .matchers
                .iter()
                .zip(call.args())
                .all(|(matcher, arg)| matcher.matches(arg))
    }
}

impl fmt::Display for CallPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CallKind::Method => {
                write!(f, "{}(", self.member)?;
                write_joined(f, &self.matchers)?;
                f.write_str(")")
            }
            CallKind::Get => f.write_str(&self.member),
            CallKind::Set => {
                write!(f, "{} = ", self.member)?;
                write_joined(f, &self.matchers)
            }
        }
    }
}
