//! Descriptors of fakeable surfaces.
//!
//! A [Capability] plays the part a generated proxy class plays in runtimes with
//! runtime code generation: it lists every member a double answers for, the
//! type each member declares, and, for class doubles, which members may be
//! intercepted at all and how to build the real instance the rest delegates to.

use std::fmt;
use std::sync::Arc;

use crate::call::{CallKind, CallSignature};
use crate::value::{Value, ValueType};
use crate::Failure;

/// Whether a capability describes a pure interface or a class with a real
/// implementation behind it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapabilityKind {
    Interface,
    Class,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MemberShape {
    Method {
        params: Vec<ValueType>,
        returns: ValueType,
    },
    Property {
        ty: ValueType,
        readable: bool,
        writable: bool,
    },
}

/// One member of a capability.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    name: String,
    shape: MemberShape,
    overridable: bool,
}

impl Member {
    pub fn method(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ValueType>,
        returns: ValueType,
    ) -> Self {
        Self {
            name: name.into(),
            shape: MemberShape::Method {
                params: params.into_iter().collect(),
                returns,
            },
            overridable: true,
        }
    }

    /// A readable and writable property.
    pub fn property(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            shape: MemberShape::Property {
                ty,
                readable: true,
                writable: true,
            },
            overridable: true,
        }
    }

    pub fn read_only(mut self) -> Self {
        if let MemberShape::Property { writable, .. } = &mut self.shape {
            *writable = false;
        }
        self
    }

    pub fn write_only(mut self) -> Self {
        if let MemberShape::Property { readable, .. } = &mut self.shape {
            *readable = false;
        }
        self
    }

    /// Marks the member as not interceptable. Calls to it on a class double go
    /// straight to the real instance.
    pub fn sealed(mut self) -> Self {
        self.overridable = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &MemberShape {
        &self.shape
    }

    pub fn is_overridable(&self) -> bool {
        self.overridable
    }

    pub fn is_property(&self) -> bool {
        matches!(self.shape, MemberShape::Property { .. })
    }

    pub fn is_readable(&self) -> bool {
        matches!(self.shape, MemberShape::Property { readable: true, .. })
    }

    pub fn is_writable(&self) -> bool {
        matches!(self.shape, MemberShape::Property { writable: true, .. })
    }

    /// Whether `call` addresses this member with a supported access kind and
    /// arity.
    pub fn accepts(&self, call: &CallSignature) -> bool {
        if self.name != call.member() {
            return false;
        }
        match (&self.shape, call.kind()) {
            (MemberShape::Method { params, .. }, CallKind::Method) => {
                params.len() == call.args().len()
            }
            (MemberShape::Property { readable, .. }, CallKind::Get) => *readable,
            (MemberShape::Property { writable, .. }, CallKind::Set) => {
                *writable && call.args().len() == 1
            }
            _ => false,
        }
    }

    /// The type a call of `kind` produces.
    pub fn declared(&self, kind: CallKind) -> ValueType {
        match (&self.shape, kind) {
            (MemberShape::Method { returns, .. }, _) => returns.clone(),
            (MemberShape::Property { .. }, CallKind::Set) => ValueType::Unit,
            (MemberShape::Property { ty, .. }, _) => ty.clone(),
        }
    }
}

/// The real instance behind a class double.
///
/// Implementations form the delegation table of the real object: every member
/// the double does not intercept ends up here, as does every call resolved
/// with `CallBase`.
///
/// The double holds an exclusive lock on the instance while `dispatch` runs.
/// A dispatch may call back into its own double, but only for members that
/// resolve without reaching the instance again; a call that lands back in
/// `dispatch` deadlocks.
pub trait Base: Send {
    fn dispatch(&mut self, call: &CallSignature) -> Result<Value, Failure>;
}

impl<F> Base for F
where
    F: FnMut(&CallSignature) -> Result<Value, Failure> + Send,
{
    fn dispatch(&mut self, call: &CallSignature) -> Result<Value, Failure> {
        self(call)
    }
}

type BuildFn = dyn Fn(Vec<Value>) -> Result<Box<dyn Base>, Failure> + Send + Sync;

/// A class constructor: its parameter types and how to build the real
/// instance from matching arguments.
#[derive(Clone)]
pub struct Constructor {
    params: Vec<ValueType>,
    build: Arc<BuildFn>,
}

impl Constructor {
    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    pub fn admits(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self.params.iter().zip(args).all(|(ty, arg)| ty.admits(arg))
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Descriptor of a fakeable type. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Capability(Arc<CapabilityInner>);

#[derive(Debug)]
struct CapabilityInner {
    name: String,
    kind: CapabilityKind,
    accessible: bool,
    members: Vec<Member>,
    constructors: Vec<Constructor>,
}

impl Capability {
    pub fn interface(name: impl Into<String>) -> CapabilityBuilder {
        CapabilityBuilder::new(name.into(), CapabilityKind::Interface)
    }

    pub fn class(name: impl Into<String>) -> CapabilityBuilder {
        CapabilityBuilder::new(name.into(), CapabilityKind::Class)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> CapabilityKind {
        self.0.kind
    }

    pub fn is_accessible(&self) -> bool {
        self.0.accessible
    }

    pub fn members(&self) -> &[Member] {
        &self.0.members
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.0.constructors
    }

    /// First member accepting `call`.
    pub fn member_for(&self, call: &CallSignature) -> Option<&Member> {
        self.0.members.iter().find(|member| member.accepts(call))
    }

    pub fn property(&self, name: &str) -> Option<&Member> {
        self.0
            .members
            .iter()
            .find(|member| member.is_property() && member.name == name)
    }

    /// Builds the real instance with the first constructor admitting `args`.
    pub(crate) fn construct(&self, args: Vec<Value>) -> Result<Box<dyn Base>, Failure> {
        match self.0.constructors.iter().find(|ctor| ctor.admits(&args)) {
            Some(ctor) => (ctor.build)(args),
            None => Err(Failure::NoMatchingConstructor {
                type_name: self.0.name.clone(),
                args,
            }),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

#[must_use]
pub struct CapabilityBuilder {
    inner: CapabilityInner,
}

impl CapabilityBuilder {
    fn new(name: String, kind: CapabilityKind) -> Self {
        Self {
            inner: CapabilityInner {
                name,
                kind,
                accessible: true,
                members: Vec::new(),
                constructors: Vec::new(),
            },
        }
    }

    pub fn member(mut self, member: Member) -> Self {
        self.inner.members.push(member);
        self
    }

    pub fn method(
        self,
        name: impl Into<String>,
        params: impl IntoIterator<Item = ValueType>,
        returns: ValueType,
    ) -> Self {
        self.member(Member::method(name, params, returns))
    }

    pub fn property(self, name: impl Into<String>, ty: ValueType) -> Self {
        self.member(Member::property(name, ty))
    }

    /// Adds a class constructor.
    pub fn constructor<B, F>(mut self, params: impl IntoIterator<Item = ValueType>, build: F) -> Self
    where
        B: Base + 'static,
        F: Fn(Vec<Value>) -> Result<B, Failure> + Send + Sync + 'static,
    {
        self.inner.constructors.push(Constructor {
            params: params.into_iter().collect(),
            build: Arc::new(move |args| build(args).map(|base| Box::new(base) as Box<dyn Base>)),
        });
        self
    }

    /// Whether doubles may be generated for this type at all.
    pub fn accessible(mut self, accessible: bool) -> Self {
        self.inner.accessible = accessible;
        self
    }

    pub fn build(mut self) -> Capability {
        if self.inner.kind == CapabilityKind::Interface {
            for member in &mut self.inner.members {
                member.overridable = true;
            }
        }
        Capability(Arc::new(self.inner))
    }
}
