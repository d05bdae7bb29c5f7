use pretty_assertions::assert_eq;
use understudy::*;

#[double]
pub trait Foo {
    #[double(rename = "DoSomething")]
    fn do_something(&self, arg: &str) -> bool;
}

#[test]
fn trait_double_answers_configured_calls() {
    let foo: FooDouble = fake().unwrap();
    foo.setup(CallPattern::method("DoSomething", [Matcher::eq("foo")]))
        .returns(true);

    assert!(foo.do_something("foo"));
    assert!(!foo.do_something("bar"));
    foo.verify(
        &CallPattern::method("DoSomething", [Matcher::any()]),
        Times::exactly(2),
    )
    .unwrap();
}

#[test]
fn trait_double_works_behind_trait_objects() {
    fn run(foo: &dyn Foo) -> bool {
        foo.do_something("foo")
    }

    let foo: FooDouble = fake().unwrap();
    foo.setup(CallPattern::method("DoSomething", [Matcher::any()]))
        .returns(true);
    assert!(run(&foo));
}

#[test]
#[should_panic(expected = "invocation failed with behavior mode Strict")]
fn strict_trait_double_panics_on_unconfigured_call() {
    let double = Double::builder(FooDouble::capability())
        .strict()
        .build()
        .unwrap();
    let foo = FooDouble::from_double(double);
    foo.do_something("bar");
}

#[derive(Debug, thiserror::Error)]
#[error("not found: {0}")]
pub struct NotFound(String);

#[double(name = Store)]
pub trait Storage: Send + Sync {
    #[double(get = "Size")]
    fn size(&self) -> i64;

    #[double(get = "Label")]
    fn label(&self) -> String;

    #[double(set = "Label")]
    fn set_label(&mut self, label: String);

    fn load(&self, key: &str) -> Result<String, NotFound>;

    fn keys(&self) -> Vec<String>;
}

#[test]
fn capability_lists_methods_and_properties() {
    let capability = Store::capability();
    assert_eq!(capability.name(), "Storage");
    assert_eq!(capability.kind(), CapabilityKind::Interface);
    assert!(capability.is_accessible());

    let size = capability.property("Size").unwrap();
    assert!(size.is_readable());
    assert!(!size.is_writable());
    let label = capability.property("Label").unwrap();
    assert!(label.is_readable() && label.is_writable());
    assert!(capability
        .member_for(&CallSignature::method("load", [Value::from("k")]))
        .is_some());
}

#[test]
fn properties_through_accessor_methods() {
    let mut store: Store = fake().unwrap();
    store.setup(CallPattern::get("Size")).returns(3);
    store.setup_property("Label").unwrap();

    assert_eq!(store.size(), 3);
    assert_eq!(store.label(), "");
    store.set_label("groceries".to_owned());
    assert_eq!(store.label(), "groceries");
}

#[test]
fn fallible_methods_return_configured_errors() {
    let store: Store = fake().unwrap();
    store
        .setup(CallPattern::method("load", [Matcher::eq("missing")]))
        .throws(|| NotFound("missing".into()));
    store
        .setup(CallPattern::method("load", [Matcher::eq("present")]))
        .returns("value");

    assert_eq!(store.load("present").unwrap(), "value");
    assert_eq!(store.load("other").unwrap(), "");
    let error = store.load("missing").unwrap_err();
    assert_eq!(error.0, "missing");
}

#[test]
#[should_panic(expected = "wrong kind of error")]
fn foreign_configured_error_panics() {
    let store: Store = fake().unwrap();
    store
        .setup(CallPattern::method("load", [Matcher::any()]))
        .throws(|| std::io::Error::new(std::io::ErrorKind::Other, "wrong kind of error"));
    let _ = store.load("key");
}

#[test]
fn list_results_default_to_empty() {
    let store: Store = fake().unwrap();
    assert_eq!(store.keys(), Vec::<String>::new());
    store
        .setup(CallPattern::method("keys", []))
        .returns(vec!["a", "b"]);
    assert_eq!(store.keys(), vec!["a".to_owned(), "b".to_owned()]);
}

#[double]
pub trait Baz {
    #[double(get = "Name")]
    fn name(&self) -> String;
}

#[double]
pub trait Bar {
    fn baz(&self) -> Box<dyn Baz>;
}

#[double]
pub trait Root {
    fn bar(&self) -> Box<dyn Bar>;
}

#[test]
fn mock_default_chain_through_trait_objects() {
    let double = Double::builder(RootDouble::capability())
        .default_value(MockDefault)
        .build()
        .unwrap();
    let root = RootDouble::from_double(double);

    assert_eq!(root.bar().baz().name(), "");
}

#[test]
fn path_setup_through_trait_objects() {
    let root: RootDouble = fake().unwrap();
    root.setup_path(&["bar", "baz"], CallPattern::get("Name"))
        .unwrap()
        .returns("deep");

    assert_eq!(root.bar().baz().name(), "deep");
}

#[test]
fn empty_default_hands_out_fresh_trait_objects() {
    let root: RootDouble = fake().unwrap();
    assert_eq!(root.bar().baz().name(), "");
    root.verify(&CallPattern::method("bar", []), Times::once()).unwrap();
}

#[test]
fn nested_trait_objects_outlive_their_root() {
    fn detached_bar() -> Box<dyn Bar> {
        let double = Double::builder(RootDouble::capability())
            .default_value(MockDefault)
            .build()
            .unwrap();
        RootDouble::from_double(double).bar()
    }

    let bar = detached_bar();
    assert_eq!(bar.baz().name(), "");
    assert_eq!(bar.baz().name(), "");
}

#[double]
pub trait Directory {
    fn find(&self, key: &str) -> Option<i64>;
    fn alias(&self) -> Option<String>;
    fn parent(&self) -> Option<Box<dyn Baz>>;
}

#[test]
fn optional_results_default_to_none() {
    let directory: DirectoryDouble = fake().unwrap();
    assert_eq!(directory.find("missing"), None);
    assert_eq!(directory.alias(), None);
    assert!(directory.parent().is_none());

    directory
        .setup(CallPattern::method("find", [Matcher::eq("present")]))
        .returns(0);
    assert_eq!(directory.find("present"), Some(0));
}

#[test]
fn optional_trait_objects_are_grown_by_mock_default() {
    let double = Double::builder(DirectoryDouble::capability())
        .default_value(MockDefault)
        .build()
        .unwrap();
    let directory = DirectoryDouble::from_double(double);
    assert_eq!(directory.find("missing"), None);
    assert_eq!(directory.parent().map(|baz| baz.name()), Some(String::new()));
}

#[double(partial)]
pub trait Greeter {
    fn greet(&self, name: &str) -> String;

    #[double(sealed)]
    fn language(&self) -> String;

    fn count(&mut self) -> i64;
}

struct English {
    greeted: i64,
}

impl Greeter for English {
    fn greet(&self, name: &str) -> String {
        format!("Hello, {name}!")
    }

    fn language(&self) -> String {
        "en".to_owned()
    }

    fn count(&mut self) -> i64 {
        self.greeted += 1;
        self.greeted
    }
}

#[test]
fn partial_double_intercepts_overridable_members() {
    let double = GreeterDouble::partial(English { greeted: 0 }).build().unwrap();
    let greeter = GreeterDouble::from_double(double);
    greeter
        .setup(CallPattern::method("greet", [Matcher::eq("Bob")]))
        .returns("Hi Bob");

    assert_eq!(greeter.capability().kind(), CapabilityKind::Class);
    assert_eq!(greeter.greet("Bob"), "Hi Bob");
    assert_eq!(greeter.greet("Alice"), "");
    assert_eq!(greeter.language(), "en");
    assert_eq!(greeter.invocations().len(), 2);
}

#[test]
fn partial_double_calls_base_when_asked() {
    let double = GreeterDouble::partial(English { greeted: 0 })
        .call_base(true)
        .build()
        .unwrap();
    let mut greeter = GreeterDouble::from_double(double);
    greeter
        .setup(CallPattern::method("greet", [Matcher::eq("Bob")]))
        .returns("Hi Bob");

    assert_eq!(greeter.greet("Bob"), "Hi Bob");
    assert_eq!(greeter.greet("Alice"), "Hello, Alice!");
    assert_eq!(greeter.count(), 1);
    assert_eq!(greeter.count(), 2);
}

#[test]
fn partial_double_needs_a_real_instance() {
    assert!(matches!(
        fake::<GreeterDouble>(),
        Err(Failure::NoMatchingConstructor { .. })
    ));
}

#[double]
trait Hidden {
    fn run(&self);
}

#[double(expose, name = Exposed)]
trait Internal {
    fn run(&self);
}

#[test]
fn private_traits_are_not_accessible_unless_exposed() {
    assert!(matches!(
        fake::<HiddenDouble>(),
        Err(Failure::NotAccessible { .. })
    ));

    let exposed: Exposed = fake().unwrap();
    exposed.run();
    exposed
        .verify(&CallPattern::method("run", []), Times::once())
        .unwrap();
}

#[test]
fn repository_creates_trait_doubles() {
    let repository = Repository::new(Mode::Strict);
    let foo: FooDouble = repository.fake().unwrap();
    foo.setup(CallPattern::method("DoSomething", [Matcher::any()]))
        .returns(true)
        .verifiable();

    assert!(repository.verify().is_err());
    assert!(foo.do_something("x"));
    repository.verify().unwrap();
    repository.verify_no_other_calls().unwrap();
}
