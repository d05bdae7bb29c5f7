use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, trace, warn};

use crate::behavior::{Behavior, BoxError, PropertySlot, Sequence};
use crate::call::{CallKind, CallSignature};
use crate::capability::{Base, Capability, CapabilityKind};
use crate::defaults::{DefaultValueProvider, EmptyDefault, MAX_NESTING_DEPTH};
use crate::log::{Invocation, InvocationLog};
use crate::matcher::{CallPattern, Matcher};
use crate::store::{ExpectationHandle, ExpectationStore, Origin};
use crate::value::{IntoValue, Value, ValueType};
use crate::{lock, Failure};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// What a double does with a call no expectation matched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Fall back to the default value strategy.
    #[default]
    Loose,
    /// Fail with [Failure::UnexpectedInvocation].
    Strict,
}

/// A generated stand-in for a capability.
///
/// `Double` is a handle: clones refer to the same double, with the same
/// expectations and the same invocation log.
#[derive(Clone)]
pub struct Double(pub(crate) Arc<Inner>);

pub(crate) struct Inner {
    id: u64,
    capability: Capability,
    mode: Mode,
    call_base: bool,
    default_value: Mutex<Arc<dyn DefaultValueProvider>>,
    pub(crate) store: ExpectationStore,
    pub(crate) log: InvocationLog,
    base: Option<Mutex<Box<dyn Base>>>,
    tree: Arc<Tree>,
    // Nested doubles this one created. Always deeper than `self`, so the
    // ownership graph has no cycles.
    children: Mutex<Vec<Double>>,
    depth: usize,
}

/// State shared by a root double and every double nested under it.
///
/// Any double of the tree keeps it alive, so a nested double still grows the
/// tree after its root is gone.
#[derive(Default)]
struct Tree {
    nested: Mutex<HashMap<String, Weak<Inner>>>,
}

/// Builds a [Double].
#[must_use]
pub struct DoubleBuilder {
    capability: Capability,
    mode: Mode,
    call_base: bool,
    default_value: Arc<dyn DefaultValueProvider>,
    args: Vec<Value>,
    base: Option<Box<dyn Base>>,
    parent: Option<(Arc<Tree>, usize)>,
}

impl DoubleBuilder {
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            mode: Mode::default(),
            call_base: false,
            default_value: Arc::new(EmptyDefault),
            args: Vec::new(),
            base: None,
            parent: None,
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn strict(self) -> Self {
        self.mode(Mode::Strict)
    }

    pub fn loose(self) -> Self {
        self.mode(Mode::Loose)
    }

    /// Route unmatched calls of a Loose class double to the real instance
    /// instead of the default value strategy.
    pub fn call_base(mut self, call_base: bool) -> Self {
        self.call_base = call_base;
        self
    }

    pub fn default_value(self, provider: impl DefaultValueProvider + 'static) -> Self {
        self.default_value_shared(Arc::new(provider))
    }

    pub fn default_value_shared(mut self, provider: Arc<dyn DefaultValueProvider>) -> Self {
        self.default_value = provider;
        self
    }

    /// Constructor arguments of a class double.
    pub fn args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    /// Supplies the real instance directly instead of constructing one.
    pub fn base(mut self, base: impl Base + 'static) -> Self {
        self.base = Some(Box::new(base));
        self
    }

    fn nested_in(mut self, tree: Arc<Tree>, depth: usize) -> Self {
        self.parent = Some((tree, depth));
        self
    }

    pub fn build(self) -> Result<Double, Failure> {
        let type_name = self.capability.name().to_owned();
        if !self.capability.is_accessible() {
            return Err(Failure::NotAccessible { type_name });
        }

        let base = match (self.base, self.capability.kind()) {
            (Some(base), _) if self.args.is_empty() => Some(base),
            (None, CapabilityKind::Class) => Some(self.capability.construct(self.args)?),
            (None, CapabilityKind::Interface) if self.args.is_empty() => None,
            _ => {
                return Err(Failure::NoMatchingConstructor {
                    type_name,
                    args: self.args,
                })
            }
        };

        let (tree, depth) = self.parent.unwrap_or_default();

        let double = Double(Arc::new(Inner {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            capability: self.capability,
            mode: self.mode,
            call_base: self.call_base,
            default_value: Mutex::new(self.default_value),
            store: ExpectationStore::default(),
            log: InvocationLog::default(),
            base: base.map(Mutex::new),
            tree,
            children: Mutex::default(),
            depth,
        }));
        debug!(double = %double, mode = ?double.mode(), depth, "double created");
        Ok(double)
    }
}

impl Double {
    pub fn builder(capability: Capability) -> DoubleBuilder {
        DoubleBuilder::new(capability)
    }

    /// A Loose double with the empty default strategy.
    pub fn new(capability: Capability) -> Result<Self, Failure> {
        Self::builder(capability).build()
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn type_name(&self) -> &str {
        self.0.capability.name()
    }

    pub fn capability(&self) -> &Capability {
        &self.0.capability
    }

    pub fn mode(&self) -> Mode {
        self.0.mode
    }

    /// Nesting level inside its double tree; zero for a root.
    pub fn depth(&self) -> usize {
        self.0.depth
    }

    pub fn default_value_provider(&self) -> Arc<dyn DefaultValueProvider> {
        lock(&self.0.default_value).clone()
    }

    /// Replaces the return-value strategy.
    ///
    /// Only allowed before the first call was logged; afterwards results
    /// already handed out would disagree with the new strategy.
    pub fn set_default_value(
        &self,
        provider: impl DefaultValueProvider + 'static,
    ) -> Result<(), Failure> {
        if self.0.log.has_recorded() {
            return Err(Failure::AlreadyExercised {
                type_name: self.type_name().to_owned(),
            });
        }
        *lock(&self.0.default_value) = Arc::new(provider);
        Ok(())
    }

    /// Single dispatch path for method calls, property reads and writes.
    pub fn invoke(&self, call: CallSignature) -> Result<Value, Failure> {
        let Some(member) = self.0.capability.member_for(&call) else {
            return Err(Failure::UnknownMember {
                type_name: self.type_name().to_owned(),
                member: call.member().to_owned(),
                kind: call.kind(),
            });
        };
        let declared = member.declared(call.kind());

        if !member.is_overridable() {
            trace!(double = %self, call = %call, "sealed member, delegating to base");
            return self.call_base(&call);
        }

        let seq = self.0.log.append(call.clone());
        trace!(double = %self, seq, call = %call, "intercepted call");

        match self.0.store.find(&call) {
            Some(expectation) => {
                self.0.log.record_match(seq, expectation.id());
                expectation.hit();
                self.resolve(expectation.behavior(), &call, &declared)
            }
            None => self.fallback(&call, &declared),
        }
    }

    pub fn call_method(
        &self,
        member: &str,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<Value, Failure> {
        self.invoke(CallSignature::method(member, args))
    }

    pub fn get(&self, member: &str) -> Result<Value, Failure> {
        self.invoke(CallSignature::get(member))
    }

    pub fn set(&self, member: &str, value: impl IntoValue) -> Result<(), Failure> {
        self.invoke(CallSignature::set(member, value)).map(|_| ())
    }

    fn resolve(
        &self,
        behavior: &Behavior,
        call: &CallSignature,
        declared: &ValueType,
    ) -> Result<Value, Failure> {
        match behavior {
            Behavior::Return(value) => Ok(value.clone()),
            Behavior::Compute(compute) => Ok(compute(call.args())),
            Behavior::Throw(error) => Err(Failure::Configured(error())),
            Behavior::Sequence(sequence) => match sequence.advance() {
                Some(step) => self.resolve(&step, call, declared),
                None => Ok(self.default_for(declared)),
            },
            Behavior::CallBase => self.call_base(call),
            Behavior::Track(slot) => match call.kind() {
                CallKind::Set => {
                    slot.write(call.args().first().cloned().unwrap_or(Value::Null));
                    Ok(Value::Unit)
                }
                CallKind::Get | CallKind::Method => match slot.read() {
                    Some(value) => Ok(value),
                    None => Ok(slot.read_or_init(self.default_for(declared))),
                },
            },
        }
    }

    fn fallback(&self, call: &CallSignature, declared: &ValueType) -> Result<Value, Failure> {
        match self.0.mode {
            Mode::Strict => {
                debug!(double = %self, call = %call, "no setup matched in strict mode");
                Err(Failure::UnexpectedInvocation {
                    type_name: self.type_name().to_owned(),
                    call: call.clone(),
                })
            }
            Mode::Loose if self.0.call_base && self.0.base.is_some() => self.call_base(call),
            Mode::Loose => Ok(self.default_for(declared)),
        }
    }

    fn call_base(&self, call: &CallSignature) -> Result<Value, Failure> {
        match &self.0.base {
            Some(base) => lock(base).dispatch(call),
            None => Err(Failure::NoBaseImplementation {
                type_name: self.type_name().to_owned(),
                call: call.clone(),
            }),
        }
    }

    fn default_for(&self, declared: &ValueType) -> Value {
        let provider = self.default_value_provider();
        provider.default_value(declared, self)
    }

    /// The nested double for `capability` in this double's tree, built on
    /// first request. `None` past [MAX_NESTING_DEPTH] or when the capability
    /// cannot be built without arguments.
    pub(crate) fn nested(&self, capability: Capability) -> Option<Double> {
        let depth = self.0.depth + 1;
        if depth > MAX_NESTING_DEPTH {
            debug!(double = %self, depth, "nesting depth exhausted");
            return None;
        }
        let mut nested = lock(&self.0.tree.nested);
        if let Some(existing) = nested.get(capability.name()).and_then(Weak::upgrade) {
            return Some(Double(existing));
        }

        let built = DoubleBuilder::new(capability)
            .mode(self.0.mode)
            .default_value_shared(self.default_value_provider())
            .nested_in(self.0.tree.clone(), depth)
            .build();
        match built {
            Ok(double) => {
                nested.insert(double.type_name().to_owned(), Arc::downgrade(&double.0));
                lock(&self.0.children).push(double.clone());
                Some(double)
            }
            Err(failure) => {
                debug!(double = %self, %failure, "cannot build nested double");
                None
            }
        }
    }

    /// Starts configuring what calls matching `pattern` do.
    pub fn setup(&self, pattern: CallPattern) -> Setup {
        let addressed = self
            .0
            .capability
            .members()
            .iter()
            .any(|member| member.name() == pattern.member() && member.is_overridable());
        if !addressed {
            warn!(
                double = %self,
                pattern = %pattern,
                "setup does not address an overridable member and will never match"
            );
        }
        Setup {
            double: self.clone(),
            pattern,
        }
    }

    /// Configures successive responses to calls matching `pattern`.
    pub fn setup_sequence(&self, pattern: CallPattern) -> SequenceSetup {
        let sequence = Sequence::default();
        let handle = self
            .setup(pattern)
            .behaves(Behavior::Sequence(sequence.clone()));
        SequenceSetup { sequence, handle }
    }

    /// Turns a property into an in-memory slot. Reads before the first write
    /// return the default value strategy's value.
    pub fn setup_property(&self, name: &str) -> Result<PropertySlot, Failure> {
        self.track_property(name, None)
    }

    pub fn setup_property_with(
        &self,
        name: &str,
        initial: impl IntoValue,
    ) -> Result<PropertySlot, Failure> {
        self.track_property(name, Some(initial.into_value()))
    }

    /// Tracks every overridable property of the capability.
    pub fn setup_all_properties(&self) {
        let names: Vec<String> = self
            .0
            .capability
            .members()
            .iter()
            .filter(|member| member.is_property() && member.is_overridable())
            .map(|member| member.name().to_owned())
            .collect();
        for name in names {
            // every name comes from the capability itself
            let _ = self.track_property(&name, None);
        }
    }

    fn track_property(&self, name: &str, initial: Option<Value>) -> Result<PropertySlot, Failure> {
        let Some(member) = self.0.capability.property(name) else {
            return Err(Failure::UnknownMember {
                type_name: self.type_name().to_owned(),
                member: name.to_owned(),
                kind: CallKind::Get,
            });
        };
        let slot = PropertySlot::new(initial);
        if member.is_readable() {
            self.0.store.register(
                CallPattern::get(name),
                Behavior::Track(slot.clone()),
                Origin::Implicit,
            );
        }
        if member.is_writable() {
            self.0.store.register(
                CallPattern::set(name, Matcher::any()),
                Behavior::Track(slot.clone()),
                Origin::Implicit,
            );
        }
        debug!(double = %self, property = name, "tracking property");
        Ok(slot)
    }

    /// Recursive setup: walks `path` through getters (or parameterless
    /// methods) returning fakeable types, creating nested doubles as needed,
    /// and configures `pattern` on the double at the end of the path.
    pub fn setup_path(&self, path: &[&str], pattern: CallPattern) -> Result<Setup, Failure> {
        let mut target = self.clone();
        for step in path {
            target = target.nested_at(step)?;
        }
        Ok(target.setup(pattern))
    }

    fn nested_at(&self, name: &str) -> Result<Double, Failure> {
        let capability = &self.0.capability;
        let (pattern, member) = if let Some(member) = capability.property(name) {
            (CallPattern::get(name), member)
        } else if let Some(member) = capability.member_for(&CallSignature::method(name, [])) {
            (CallPattern::method(name, []), member)
        } else {
            return Err(Failure::UnknownMember {
                type_name: self.type_name().to_owned(),
                member: name.to_owned(),
                kind: CallKind::Get,
            });
        };

        let existing = self.0.store.snapshot().into_iter().rev().find_map(|expectation| {
            let link = expectation.pattern();
            let same_link = link.member() == name
                && link.kind() == pattern.kind()
                && link.matchers().is_empty();
            match expectation.behavior() {
                Behavior::Return(Value::Double(double)) if same_link => Some(double.clone()),
                _ => None,
            }
        });
        if let Some(existing) = existing {
            return Ok(existing);
        }

        let not_fakeable = || Failure::NotFakeable {
            type_name: self.type_name().to_owned(),
            member: name.to_owned(),
        };
        let declared = member.declared(pattern.kind());
        let Some(object) = declared.object_type() else {
            return Err(not_fakeable());
        };
        let capability = object.capability().ok_or_else(not_fakeable)?;
        let nested = self.nested(capability).ok_or_else(not_fakeable)?;
        self.0.store.register(
            pattern,
            Behavior::Return(Value::Double(nested.clone())),
            Origin::Implicit,
        );
        Ok(nested)
    }

    /// Every call logged so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.0.log.snapshot()
    }

    /// Forgets logged calls, verification accounting and expectation hit
    /// counts. Expectations themselves stay.
    pub fn reset_calls(&self) {
        self.0.log.clear();
        self.0.store.reset_hits();
        debug!(double = %self, "calls reset");
    }
}

impl PartialEq for Double {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Double {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Double<{}>", self.type_name())
    }
}

impl fmt::Debug for Double {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Double")
            .field("type_name", &self.type_name())
            .field("id", &self.0.id)
            .field("mode", &self.0.mode)
            .field("depth", &self.0.depth)
            .finish_non_exhaustive()
    }
}

/// Pending setup; choosing a behavior registers the expectation.
#[must_use = "a setup is only registered once a behavior is chosen"]
pub struct Setup {
    double: Double,
    pattern: CallPattern,
}

impl Setup {
    pub fn returns(self, value: impl IntoValue) -> ExpectationHandle {
        self.behaves(Behavior::returns(value))
    }

    pub fn returns_with(
        self,
        f: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> ExpectationHandle {
        self.behaves(Behavior::compute(f))
    }

    pub fn throws<E, F>(self, f: F) -> ExpectationHandle
    where
        E: Into<BoxError>,
        F: Fn() -> E + Send + Sync + 'static,
    {
        self.behaves(Behavior::throws(f))
    }

    pub fn calls_base(self) -> ExpectationHandle {
        self.behaves(Behavior::CallBase)
    }

    pub fn behaves(self, behavior: Behavior) -> ExpectationHandle {
        debug!(
            double = %self.double,
            pattern = %self.pattern,
            behavior = ?behavior,
            "setup registered"
        );
        self.double
            .0
            .store
            .register(self.pattern, behavior, Origin::Explicit)
    }
}

/// A registered sequence expectation accepting further steps.
pub struct SequenceSetup {
    sequence: Sequence,
    handle: ExpectationHandle,
}

impl SequenceSetup {
    pub fn then(self, step: Behavior) -> Self {
        self.sequence.push(step);
        self
    }

    pub fn returns(self, value: impl IntoValue) -> Self {
        self.then(Behavior::returns(value))
    }

    pub fn returns_with(self, f: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
        self.then(Behavior::compute(f))
    }

    pub fn throws<E, F>(self, f: F) -> Self
    where
        E: Into<BoxError>,
        F: Fn() -> E + Send + Sync + 'static,
    {
        self.then(Behavior::throws(f))
    }

    pub fn calls_base(self) -> Self {
        self.then(Behavior::CallBase)
    }

    pub fn verifiable(self) -> Self {
        Self {
            sequence: self.sequence,
            handle: self.handle.verifiable(),
        }
    }

    pub fn handle(&self) -> &ExpectationHandle {
        &self.handle
    }
}
