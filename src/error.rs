use thiserror::Error;

use crate::behavior::BoxError;
use crate::call::{CallKind, CallSignature};
use crate::value::{join, Value};
use crate::verify::VerificationFailed;

/// Everything that can go wrong while building, exercising or verifying a
/// double.
#[derive(Debug, Error)]
pub enum Failure {
    /// A Strict double received a call no expectation matched.
    #[error(
        "{type_name}.{call} invocation failed with behavior mode Strict: \
         all invocations on the double must have a corresponding setup"
    )]
    UnexpectedInvocation {
        type_name: String,
        call: CallSignature,
    },

    #[error(transparent)]
    Verification(#[from] VerificationFailed),

    /// The capability is not exposed to double generation.
    #[error("cannot create a double for `{type_name}` because it is not accessible")]
    NotAccessible { type_name: String },

    #[error("no constructor of `{type_name}` matches the arguments ({})", join(.args))]
    NoMatchingConstructor { type_name: String, args: Vec<Value> },

    /// The error a `Throw` behavior was configured with, untouched.
    #[error(transparent)]
    Configured(BoxError),

    #[error("{type_name}.{call} has no base implementation to call")]
    NoBaseImplementation {
        type_name: String,
        call: CallSignature,
    },

    #[error("`{type_name}` has no {kind} `{member}`")]
    UnknownMember {
        type_name: String,
        member: String,
        kind: CallKind,
    },

    #[error("`{type_name}.{member}` does not declare a fakeable type")]
    NotFakeable { type_name: String, member: String },

    #[error("expected a value of type `{expected}`, found {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// The value strategy may only change before the first call is logged.
    #[error("the default value strategy of `{type_name}` cannot change once the double has been exercised")]
    AlreadyExercised { type_name: String },
}

impl Failure {
    pub fn configured(error: impl Into<BoxError>) -> Self {
        Failure::Configured(error.into())
    }

    pub fn type_mismatch(expected: impl ToString, actual: &Value) -> Self {
        Failure::TypeMismatch {
            expected: expected.to_string(),
            actual: format!("{} `{actual}`", actual.kind_name()),
        }
    }

    /// Recovers the configured error if it is an `E`.
    pub fn into_configured<E>(self) -> Result<E, Self>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Failure::Configured(error) => match error.downcast::<E>() {
                Ok(error) => Ok(*error),
                Err(error) => Err(Failure::Configured(error)),
            },
            other => Err(other),
        }
    }

    pub fn configured_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Failure::Configured(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }
}
