use pretty_assertions::assert_eq;
use understudy::*;

fn baz() -> Capability {
    Capability::interface("IBaz")
        .property("Name", ValueType::Text)
        .method("Ping", [ValueType::Int], ValueType::Bool)
        .build()
}

fn bar() -> Capability {
    Capability::interface("IBar")
        .member(Member::property("Baz", ValueType::object("IBaz", baz)).read_only())
        .build()
}

fn foo() -> Capability {
    Capability::interface("IFoo")
        .member(Member::property("Bar", ValueType::object("IBar", bar)).read_only())
        .method("GetBar", [], ValueType::object("IBar", bar))
        .property("Label", ValueType::Text)
        .build()
}

fn walk(double: &Double, path: &[&str]) -> Value {
    let mut value = Value::Double(double.clone());
    for step in path {
        let Value::Double(current) = value else {
            panic!("{step} reached through a non-double value {value}");
        };
        value = current.get(step).unwrap();
    }
    value
}

#[test]
fn path_setup_configures_the_leaf() {
    let double = Double::new(foo()).unwrap();
    double
        .setup_path(&["Bar", "Baz"], CallPattern::get("Name"))
        .unwrap()
        .returns("bar");

    assert_eq!(walk(&double, &["Bar", "Baz", "Name"]), Value::from("bar"));
}

#[test]
fn path_setups_share_intermediate_doubles() {
    let double = Double::new(foo()).unwrap();
    double
        .setup_path(&["Bar", "Baz"], CallPattern::get("Name"))
        .unwrap()
        .returns("bar");
    double
        .setup_path(&["Bar", "Baz"], CallPattern::method("Ping", [Matcher::eq(1)]))
        .unwrap()
        .returns(true);

    let baz = walk(&double, &["Bar", "Baz"]);
    let baz = baz.as_double().unwrap();
    assert_eq!(baz.get("Name").unwrap(), Value::from("bar"));
    assert_eq!(
        baz.call_method("Ping", [Value::from(1)]).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn path_through_parameterless_method() {
    let double = Double::new(foo()).unwrap();
    double
        .setup_path(&["GetBar", "Baz"], CallPattern::get("Name"))
        .unwrap()
        .returns("via method");

    let bar = double.call_method("GetBar", []).unwrap();
    assert_eq!(
        walk(bar.as_double().unwrap(), &["Baz", "Name"]),
        Value::from("via method")
    );
}

#[test]
fn path_through_non_object_member_fails() {
    let double = Double::new(foo()).unwrap();
    let failure = double
        .setup_path(&["Label"], CallPattern::get("Name"))
        .err()
        .unwrap();
    assert!(matches!(failure, Failure::NotFakeable { .. }));
}

#[test]
fn path_links_are_not_required_by_verify_all() {
    let double = Double::new(foo()).unwrap();
    double
        .setup_path(&["Bar", "Baz"], CallPattern::get("Name"))
        .unwrap()
        .returns("bar");

    double.verify_all_setups().unwrap();

    let baz = walk(&double, &["Bar", "Baz"]);
    let baz = baz.as_double().unwrap();
    assert!(baz.verify_all_setups().is_err());
    baz.get("Name").unwrap();
    baz.verify_all_setups().unwrap();
}

#[test]
fn mock_default_chain_ends_in_empty_leaf() {
    let double = Double::builder(foo())
        .default_value(MockDefault)
        .build()
        .unwrap();

    assert_eq!(walk(&double, &["Bar", "Baz", "Name"]), Value::from(""));
}

#[test]
fn empty_default_chain_stops_at_null() {
    let double = Double::new(foo()).unwrap();
    assert_eq!(double.get("Bar").unwrap(), Value::Null);
}

#[test]
fn mock_default_chain_survives_dropping_the_root() {
    let double = Double::builder(foo())
        .default_value(MockDefault)
        .build()
        .unwrap();
    let bar = double.get("Bar").unwrap();
    drop(double);

    let bar = bar.as_double().unwrap();
    let baz = bar.get("Baz").unwrap();
    assert_eq!(baz.as_double().unwrap().depth(), 2);
    assert_eq!(bar.get("Baz").unwrap(), baz);
    assert_eq!(walk(bar, &["Baz", "Name"]), Value::from(""));
}

#[test]
fn mock_default_chain_keeps_identity_between_walks() {
    let double = Double::builder(foo())
        .default_value(MockDefault)
        .build()
        .unwrap();

    let first = walk(&double, &["Bar", "Baz"]);
    let second = walk(&double, &["Bar", "Baz"]);
    assert_eq!(first, second);
}
