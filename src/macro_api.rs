use std::error::Error;

use crate::{CallSignature, Double, Failure, FromValue, IntoValue, Value};

pub use once_cell::sync::OnceCell;

/// Dispatches `call` and decodes the result as the method's return type.
///
/// Panics with the failure's message on any failure.
#[track_caller]
pub fn eval<T: FromValue>(double: &Double, call: CallSignature) -> T {
    match double.invoke(call).and_then(T::from_value) {
        Ok(value) => value,
        Err(failure) => panic!("{failure}"),
    }
}

/// Like [eval] for methods returning `Result<T, E>`: a configured error that
/// is an `E` is handed back unchanged. Panics on any other failure.
#[track_caller]
pub fn eval_fallible<T, E>(double: &Double, call: CallSignature) -> Result<T, E>
where
    T: FromValue,
    E: Error + 'static,
{
    match double.invoke(call).and_then(T::from_value) {
        Ok(value) => Ok(value),
        Err(failure) => match failure.into_configured::<E>() {
            Ok(error) => Err(error),
            Err(failure) => panic!("{failure}"),
        },
    }
}

/// Decodes argument `index` of a call forwarded to a real implementation.
pub fn arg<T: FromValue>(call: &CallSignature, index: usize) -> Result<T, Failure> {
    T::from_value(call.args().get(index).cloned().unwrap_or(Value::Null))
}

/// Encodes the result of a real implementation.
pub fn ret<T: IntoValue>(value: T) -> Result<Value, Failure> {
    Ok(value.into_value())
}

/// Encodes the result of a fallible real implementation, passing its error on
/// as a configured one.
pub fn ret_fallible<T, E>(result: Result<T, E>) -> Result<Value, Failure>
where
    T: IntoValue,
    E: Error + Send + Sync + 'static,
{
    result.map(IntoValue::into_value).map_err(Failure::configured)
}

/// Failure of a real implementation asked for a member it does not have.
pub fn unknown_member(double_type: &str, call: &CallSignature) -> Failure {
    Failure::UnknownMember {
        type_name: double_type.to_owned(),
        member: call.member().to_owned(),
        kind: call.kind(),
    }
}
