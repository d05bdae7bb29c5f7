use pretty_assertions::assert_eq;
use understudy::*;

struct RealQux {
    name: String,
    count: i64,
}

impl Base for RealQux {
    fn dispatch(&mut self, call: &CallSignature) -> Result<Value, Failure> {
        match (call.kind(), call.member()) {
            (CallKind::Get, "Name") => Ok(Value::from(self.name.clone())),
            (CallKind::Get, "Count") => Ok(Value::from(self.count)),
            (CallKind::Method, "Increment") => {
                self.count += 1;
                Ok(Value::from(self.count))
            }
            (CallKind::Method, "Describe") => {
                Ok(Value::Text(format!("{} #{}", self.name, self.count)))
            }
            _ => Err(Failure::NoBaseImplementation {
                type_name: "Qux".into(),
                call: call.clone(),
            }),
        }
    }
}

fn qux() -> Capability {
    Capability::class("Qux")
        .member(Member::property("Name", ValueType::Text).read_only().sealed())
        .member(Member::property("Count", ValueType::Int).read_only())
        .method("Increment", [], ValueType::Int)
        .method("Describe", [], ValueType::Text)
        .constructor([ValueType::Text, ValueType::Int], |args| {
            Ok(RealQux {
                name: String::from_value(args[0].clone())?,
                count: i64::from_value(args[1].clone())?,
            })
        })
        .constructor([], |_| {
            Ok(RealQux {
                name: "default".into(),
                count: 0,
            })
        })
        .build()
}

#[test]
fn constructor_arguments_pick_the_constructor() {
    let double = Double::builder(qux())
        .args([Value::from("quux"), Value::from(10)])
        .call_base(true)
        .build()
        .unwrap();
    assert_eq!(double.get("Name").unwrap(), Value::from("quux"));
    assert_eq!(double.get("Count").unwrap(), Value::Int(10));

    let double = Double::builder(qux()).call_base(true).build().unwrap();
    assert_eq!(double.get("Name").unwrap(), Value::from("default"));
}

#[test]
fn unmatched_constructor_arguments_fail() {
    let failure = Double::builder(qux())
        .args([Value::from(10), Value::from("quux")])
        .build()
        .unwrap_err();
    assert!(matches!(failure, Failure::NoMatchingConstructor { .. }));
    assert!(failure.to_string().contains("(10, \"quux\")"));
}

#[test]
fn sealed_members_pass_through_unlogged() {
    let double = Double::builder(qux())
        .args([Value::from("quux"), Value::from(10)])
        .build()
        .unwrap();
    double.setup(CallPattern::get("Name")).returns("intercepted");

    assert_eq!(double.get("Name").unwrap(), Value::from("quux"));
    assert!(double.invocations().is_empty());
}

#[test]
fn overridable_members_are_intercepted() {
    let double = Double::builder(qux())
        .args([Value::from("quux"), Value::from(10)])
        .build()
        .unwrap();
    double
        .setup(CallPattern::method("Describe", []))
        .returns("fake");

    assert_eq!(double.call_method("Describe", []).unwrap(), Value::from("fake"));
    // loose without call_base: the default value strategy answers
    assert_eq!(double.call_method("Increment", []).unwrap(), Value::Int(0));
}

#[test]
fn call_base_setup_delegates_to_real_instance() {
    let double = Double::builder(qux())
        .args([Value::from("quux"), Value::from(10)])
        .build()
        .unwrap();
    double
        .setup(CallPattern::method("Increment", []))
        .calls_base();

    assert_eq!(double.call_method("Increment", []).unwrap(), Value::Int(11));
    assert_eq!(double.call_method("Increment", []).unwrap(), Value::Int(12));
    assert_eq!(
        double.call_method("Describe", []).unwrap(),
        Value::from("")
    );
}

#[test]
fn call_base_mode_delegates_unmatched_calls() {
    let double = Double::builder(qux())
        .args([Value::from("quux"), Value::from(10)])
        .call_base(true)
        .build()
        .unwrap();
    double
        .setup(CallPattern::get("Count"))
        .returns(99);

    assert_eq!(double.get("Count").unwrap(), Value::Int(99));
    assert_eq!(
        double.call_method("Describe", []).unwrap(),
        Value::from("quux #10")
    );
    assert_eq!(double.invocations().len(), 2);
}

#[test]
fn supplied_base_replaces_construction() {
    let double = Double::builder(qux())
        .base(RealQux {
            name: "given".into(),
            count: 3,
        })
        .call_base(true)
        .build()
        .unwrap();
    assert_eq!(double.call_method("Describe", []).unwrap(), Value::from("given #3"));
}

#[test]
fn closures_can_serve_as_base() {
    let capability = Capability::class("Clock")
        .method("Now", [], ValueType::Int)
        .build();
    let mut ticks = 0;
    let double = Double::builder(capability)
        .base(move |_: &CallSignature| {
            ticks += 1;
            Ok::<_, Failure>(Value::from(ticks))
        })
        .call_base(true)
        .build()
        .unwrap();

    assert_eq!(double.call_method("Now", []).unwrap(), Value::Int(1));
    assert_eq!(double.call_method("Now", []).unwrap(), Value::Int(2));
}

#[test]
fn base_can_call_back_into_intercepted_members() {
    let this = std::sync::Arc::new(once_cell::sync::OnceCell::<Double>::new());
    let capability = Capability::class("Template")
        .method("Render", [], ValueType::Text)
        .method("Greeting", [], ValueType::Text)
        .build();
    let base = {
        let this = this.clone();
        move |call: &CallSignature| {
            let double = this.get().ok_or_else(|| Failure::NoBaseImplementation {
                type_name: "Template".into(),
                call: call.clone(),
            })?;
            let greeting = String::from_value(double.call_method("Greeting", [])?)?;
            Ok::<_, Failure>(Value::Text(format!("<p>{greeting}</p>")))
        }
    };
    let double = Double::builder(capability)
        .base(base)
        .call_base(true)
        .build()
        .unwrap();
    double
        .setup(CallPattern::method("Greeting", []))
        .returns("hi");
    this.set(double.clone()).unwrap();

    assert_eq!(double.call_method("Render", []).unwrap(), Value::from("<p>hi</p>"));
    assert_eq!(double.invocations().len(), 2);
}
