//! Runtime test doubles for interfaces and classes.
//!
//! A [Double] stands in for a [Capability]: a descriptor listing the methods
//! and properties of a type, the type each member declares and, for classes,
//! how to build the real instance behind it. Every call on a double goes
//! through one dispatch path which logs it, looks for the most recently
//! registered matching expectation and resolves its behavior. Calls nothing
//! was configured for either fail ([Mode::Strict]) or get a value from the
//! double's [DefaultValueProvider] ([Mode::Loose]).
//!
//! ```rust
//! use understudy::*;
//!
//! let foo = Capability::interface("IFoo")
//!     .method("DoSomething", [ValueType::Text], ValueType::Bool)
//!     .build();
//!
//! let double = Double::new(foo).unwrap();
//! double
//!     .setup(CallPattern::method("DoSomething", [Matcher::eq("ping")]))
//!     .returns(true);
//!
//! assert_eq!(
//!     double.call_method("DoSomething", [Value::from("ping")]).unwrap(),
//!     Value::Bool(true)
//! );
//! assert_eq!(
//!     double.call_method("DoSomething", [Value::from("pong")]).unwrap(),
//!     Value::Bool(false)
//! );
//!
//! double
//!     .verify(
//!         &CallPattern::method("DoSomething", [Matcher::any()]),
//!         Times::exactly(2),
//!     )
//!     .unwrap();
//! double.verify_no_other_calls().unwrap();
//! ```
//!
//! # Traits
//! The [macro@double] attribute derives the capability of a Rust trait together
//! with a double type implementing it:
//!
//! ```rust
//! use understudy::*;
//!
//! #[double]
//! pub trait Greeter {
//!     fn greet(&self, name: &str) -> String;
//! }
//!
//! let greeter: GreeterDouble = fake().unwrap();
//! greeter
//!     .setup(CallPattern::method("greet", [Matcher::any()]))
//!     .returns_with(|args| Value::Text(format!("hello {}", args[0].as_text().unwrap_or(""))));
//!
//! assert_eq!(greeter.greet("you"), "hello you");
//! ```

#![forbid(unsafe_code)]

mod behavior;
mod call;
mod capability;
mod defaults;
mod double;
mod error;
mod log;
mod matcher;
mod repository;
mod store;
mod value;
mod verify;

/// Items generated code refers to. Not meant to be used directly.
#[doc(hidden)]
pub mod macro_api;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use behavior::{Behavior, BoxError, PropertySlot, Sequence};
pub use call::{CallKind, CallSignature};
pub use capability::{
    Base, Capability, CapabilityBuilder, CapabilityKind, Constructor, Member, MemberShape,
};
pub use defaults::{DefaultValueProvider, EmptyDefault, MockDefault, MAX_NESTING_DEPTH};
pub use double::{Double, DoubleBuilder, Mode, SequenceSetup, Setup};
pub use error::Failure;
pub use log::Invocation;
pub use matcher::{CallPattern, Matcher};
pub use repository::Repository;
pub use store::{Expectation, ExpectationHandle};
pub use value::{FromValue, IntoValue, ObjectType, Value, ValueType};
pub use verify::{Times, VerificationFailed};

/// Generates a capability and a double type for a trait.
///
/// ```rust
/// # use understudy::*;
/// #[double(name = Store)]
/// pub trait Storage {
///     #[double(get = "Size")]
///     fn size(&self) -> i64;
///
///     #[double(rename = "Put")]
///     fn put(&mut self, key: String, value: i64) -> bool;
/// }
///
/// let store: Store = fake().unwrap();
/// store.setup(CallPattern::get("Size")).returns(3);
/// assert_eq!(store.size(), 3);
/// ```
///
/// # Attributes on the trait
/// * `name = Ident`: name of the generated double type. Defaults to the trait
///   name followed by `Double`.
/// * `partial`: the trait describes a class. The double delegates
///   unconfigured and sealed members to a real implementation passed to the
///   generated `partial` constructor.
/// * `expose`: generate an accessible capability even for a private trait.
/// * `prefix = path`: path to this crate, for re-exports.
///
/// # Attributes on methods
/// * `get = "Name"`, `set = "Name"`: the method reads or writes property
///   `Name` instead of being a method member.
/// * `rename = "Name"`: member name of the method.
/// * `sealed`: calls to the method cannot be intercepted.
pub use understudy_macros::double;

/// A native type backed by a [Double], usually generated by [macro@double].
pub trait Fake: Sized {
    /// The capability every double of this type is built for.
    fn capability() -> Capability;

    fn from_double(double: Double) -> Self;

    fn double(&self) -> &Double;
}

/// A Loose double of `T` using the empty default value strategy.
pub fn fake<T: Fake>() -> Result<T, Failure> {
    Double::new(T::capability()).map(T::from_double)
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // a panicking predicate must not take the double down with it
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
