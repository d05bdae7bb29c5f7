use pretty_assertions::assert_eq;
use understudy::*;

#[derive(Debug, thiserror::Error)]
#[error("connection reset")]
struct ConnectionReset;

fn reader() -> Capability {
    Capability::interface("IReader")
        .method("Next", [], ValueType::Text)
        .method("Count", [], ValueType::Int)
        .build()
}

#[test]
fn steps_resolve_in_order_and_the_last_repeats() {
    let double = Double::new(reader()).unwrap();
    double
        .setup_sequence(CallPattern::method("Next", []))
        .returns("a")
        .throws(|| ConnectionReset)
        .returns("b");

    assert_eq!(double.call_method("Next", []).unwrap(), Value::from("a"));
    let failure = double.call_method("Next", []).unwrap_err();
    assert!(failure.configured_ref::<ConnectionReset>().is_some());
    assert_eq!(double.call_method("Next", []).unwrap(), Value::from("b"));
    assert_eq!(double.call_method("Next", []).unwrap(), Value::from("b"));
}

#[test]
fn throwing_last_step_keeps_throwing() {
    let double = Double::new(reader()).unwrap();
    double
        .setup_sequence(CallPattern::method("Next", []))
        .returns("only")
        .throws(|| ConnectionReset);

    assert_eq!(double.call_method("Next", []).unwrap(), Value::from("only"));
    for _ in 0..3 {
        assert!(double.call_method("Next", []).is_err());
    }
}

#[test]
fn empty_sequence_falls_back_to_default() {
    let double = Double::new(reader()).unwrap();
    let _ = double.setup_sequence(CallPattern::method("Count", []));
    assert_eq!(double.call_method("Count", []).unwrap(), Value::Int(0));
}

#[test]
fn computed_steps_see_arguments() {
    let capability = Capability::interface("ICounter")
        .method("Add", [ValueType::Int], ValueType::Int)
        .build();
    let double = Double::new(capability).unwrap();
    double
        .setup_sequence(CallPattern::method("Add", [Matcher::any()]))
        .returns_with(|args| Value::Int(args[0].as_int().unwrap_or(0) + 1))
        .returns(100);

    assert_eq!(
        double.call_method("Add", [Value::from(1)]).unwrap(),
        Value::Int(2)
    );
    assert_eq!(
        double.call_method("Add", [Value::from(1)]).unwrap(),
        Value::Int(100)
    );
}

#[test]
fn sequences_of_separate_doubles_do_not_interfere() {
    let first = Double::new(reader()).unwrap();
    let second = Double::new(reader()).unwrap();
    for double in [&first, &second] {
        double
            .setup_sequence(CallPattern::method("Count", []))
            .returns(1)
            .returns(2);
    }

    assert_eq!(first.call_method("Count", []).unwrap(), Value::Int(1));
    assert_eq!(first.call_method("Count", []).unwrap(), Value::Int(2));
    assert_eq!(second.call_method("Count", []).unwrap(), Value::Int(1));
}
