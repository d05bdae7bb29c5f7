use std::fmt;

use crate::value::{write_joined, IntoValue, Value};

/// How a member was accessed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
    Method,
    Get,
    Set,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallKind::Method => f.write_str("method"),
            CallKind::Get => f.write_str("getter"),
            CallKind::Set => f.write_str("setter"),
        }
    }
}

/// Immutable description of one invocation delivered to a double.
#[derive(Clone, Debug, PartialEq)]
pub struct CallSignature {
    member: String,
    kind: CallKind,
    args: Vec<Value>,
}

impl CallSignature {
    pub fn method(member: impl Into<String>, args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            member: member.into(),
            kind: CallKind::Method,
            args: args.into_iter().collect(),
        }
    }

    pub fn get(member: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            kind: CallKind::Get,
            args: Vec::new(),
        }
    }

    pub fn set(member: impl Into<String>, value: impl IntoValue) -> Self {
        Self {
            member: member.into(),
            kind: CallKind::Set,
            args: vec![value.into_value()],
        }
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn kind(&self) -> CallKind {
        self.kind
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

impl fmt::Display for CallSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CallKind::Method => {
                write!(f, "{}(", self.member)?;
                write_joined(f, &self.args)?;
                f.write_str(")")
            }
            CallKind::Get => f.write_str(&self.member),
            CallKind::Set => {
                write!(f, "{} = ", self.member)?;
                write_joined(f, &self.args)
            }
        }
    }
}
