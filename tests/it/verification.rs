use pretty_assertions::assert_eq;
use understudy::*;

fn foo() -> Capability {
    Capability::interface("IFoo")
        .method("DoSomething", [ValueType::Text], ValueType::Bool)
        .method("Submit", [], ValueType::Unit)
        .property("Name", ValueType::Text)
        .build()
}

fn do_something(matcher: Matcher) -> CallPattern {
    CallPattern::method("DoSomething", [matcher])
}

#[test]
fn verify_counts_matching_calls() {
    let double = Double::new(foo()).unwrap();
    double.call_method("DoSomething", [Value::from("ping")]).unwrap();
    double.call_method("DoSomething", [Value::from("ping")]).unwrap();
    double.call_method("DoSomething", [Value::from("pong")]).unwrap();

    double
        .verify(&do_something(Matcher::eq("ping")), Times::exactly(2))
        .unwrap();
    double
        .verify(&do_something(Matcher::any()), Times::between(1, 3))
        .unwrap();
    double.verify(&CallPattern::method("Submit", []), Times::never()).unwrap();
    assert!(double
        .verify(&do_something(Matcher::eq("pong")), Times::at_least(2))
        .is_err());
}

#[test]
fn count_failure_names_type_member_and_counts() {
    let double = Double::new(foo()).unwrap();
    double.call_method("DoSomething", [Value::from("bar")]).unwrap();

    let failure = double
        .verify(&do_something(Matcher::eq("foo")), Times::once())
        .unwrap_err();
    let message = failure.to_string();
    assert!(message.starts_with(
        "expected invocation on the double exactly once, but was 0 times: IFoo.DoSomething(\"foo\")"
    ));
    assert!(message.contains("Performed invocations:\n    IFoo.DoSomething(\"bar\")"));
    assert!(message.contains("Closest invocation:"));
}

#[test]
fn count_failure_without_calls() {
    let double = Double::new(foo()).unwrap();
    let failure = double
        .verify(&CallPattern::method("Submit", []), Times::at_least_once())
        .unwrap_err();
    assert!(failure.to_string().ends_with("No invocations performed."));
    assert!(matches!(
        failure,
        Failure::Verification(VerificationFailed::Count { actual: 0, .. })
    ));
}

#[test]
fn no_other_calls_on_empty_log() {
    let double = Double::new(foo()).unwrap();
    double.verify_no_other_calls().unwrap();
}

#[test]
fn no_other_calls_enumerates_unverified_invocations() {
    let double = Double::new(foo()).unwrap();
    double.call_method("DoSomething", [Value::from("foo")]).unwrap();
    double.set("Name", "bar").unwrap();
    double.call_method("Submit", []).unwrap();

    double
        .verify(&do_something(Matcher::any()), Times::once())
        .unwrap();

    let failure = double.verify_no_other_calls().unwrap_err();
    assert_eq!(
        failure.to_string(),
        "IFoo: this double failed verification due to the following unverified invocations:\n    \
         IFoo.Name = \"bar\"\n    \
         IFoo.Submit()"
    );

    double
        .verify(&CallPattern::set("Name", Matcher::any()), Times::once())
        .unwrap();
    double
        .verify(&CallPattern::method("Submit", []), Times::once())
        .unwrap();
    double.verify_no_other_calls().unwrap();
}

#[test]
fn failed_verification_accounts_nothing() {
    let double = Double::new(foo()).unwrap();
    double.call_method("Submit", []).unwrap();

    assert!(double
        .verify(&CallPattern::method("Submit", []), Times::exactly(2))
        .is_err());
    assert!(double.verify_no_other_calls().is_err());
}

#[test]
fn verifiable_expectations_must_be_met() {
    let double = Double::new(foo()).unwrap();
    double
        .setup(do_something(Matcher::eq("foo")))
        .returns(true)
        .verifiable();
    double.setup(CallPattern::method("Submit", [])).returns(());

    let failure = double.verify_all_expectations_met().unwrap_err();
    assert_eq!(
        failure.to_string(),
        "IFoo: the following setups were not matched:\n    IFoo.DoSomething(\"foo\")"
    );

    double.call_method("DoSomething", [Value::from("foo")]).unwrap();
    double.verify_all_expectations_met().unwrap();
    double.verify_no_other_calls().unwrap();
}

#[test]
fn verify_all_covers_every_explicit_setup() {
    let double = Double::new(foo()).unwrap();
    double.setup(do_something(Matcher::any())).returns(true);
    double.setup(CallPattern::method("Submit", [])).returns(());

    double.call_method("DoSomething", [Value::from("x")]).unwrap();
    double.verify_all_expectations_met().unwrap();
    assert!(double.verify_all_setups().is_err());

    double.call_method("Submit", []).unwrap();
    double.verify_all_setups().unwrap();
}

#[test]
fn handle_reports_hits() {
    let double = Double::new(foo()).unwrap();
    let handle = double.setup(CallPattern::method("Submit", [])).returns(());
    double.call_method("Submit", []).unwrap();
    double.call_method("Submit", []).unwrap();
    assert_eq!(handle.hits(), 2);
}

#[test]
fn reset_calls_forgets_log_and_hits() {
    let double = Double::new(foo()).unwrap();
    let handle = double.setup(CallPattern::method("Submit", [])).returns(());
    double.call_method("Submit", []).unwrap();

    double.reset_calls();
    assert!(double.invocations().is_empty());
    assert_eq!(handle.hits(), 0);
    double.verify_no_other_calls().unwrap();
    double
        .verify(&CallPattern::method("Submit", []), Times::never())
        .unwrap();

    double.call_method("Submit", []).unwrap();
    assert_eq!(double.invocations()[0].seq(), 1);
}
