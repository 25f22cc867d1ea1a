use super::build;
use crate::value::Value;

#[test_log::test]
fn value_cycle_terminates_with_one_warning_per_access() {
    let env = build(
        "\
a() -> bool:
    return b.val or true

b() -> bool:
    return a.val or false
",
    );

    // The build-time priming pass already exercised the cycle; count
    // warnings for one isolated refresh.
    env.take_diagnostics();
    env.refresh().unwrap();

    let a = env.get_node("a").unwrap();
    let b = env.get_node("b").unwrap();
    assert!(a.value().is_some());
    assert!(b.value().is_some());

    let cyclic: Vec<_> = env
        .diagnostics()
        .into_iter()
        .filter(|d| d.message.contains("cyclic dependency detected"))
        .collect();
    assert_eq!(cyclic.len(), 2);
}

#[test]
fn value_cycle_resolves_deterministically() {
    let env = build(
        "\
a() -> bool:
    return b.val or true

b() -> bool:
    return a.val or false
",
    );
    env.refresh().unwrap();

    // a saw b's empty cache first, fell back to `true`; b then read a's
    // resolved value. One refresh of staleness, not an error.
    assert_eq!(env.get_node("a").unwrap().value(), Some(Value::Bool(true)));
    assert_eq!(env.get_node("b").unwrap().value(), Some(Value::Bool(false)));

    env.refresh().unwrap();
    assert_eq!(env.get_node("a").unwrap().value(), Some(Value::Bool(true)));
}

#[test]
fn enablement_cycle_terminates_with_a_warning() {
    let env = build(
        "\
x() -> bool:
    require(y.val)
    return true

y() -> bool:
    require(x.val)
    return true
",
    );

    let x = env.get_node("x").unwrap();
    let y = env.get_node("y").unwrap();
    x.set_value(Some(Value::Bool(true))).unwrap();
    y.set_value(Some(Value::Bool(true))).unwrap();

    env.take_diagnostics();
    env.refresh().unwrap();

    assert!(x.enabled());
    assert!(env
        .diagnostics()
        .iter()
        .any(|d| d.message.contains("cyclic enablement dependency")));
}
