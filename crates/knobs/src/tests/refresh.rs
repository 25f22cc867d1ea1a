use pretty_assertions::assert_eq;

use super::{build, build_err};
use crate::builder::NodeBuilder;
use crate::environment::ConfigEnvironment;
use crate::properties::NodeStatus;
use crate::value::Value;

#[test]
fn bodies_resolve_default_values() {
    let env = build(
        "\
smp() -> bool:
    \"Enable symmetric multiprocessing\"
    return true

max_cpus() -> int:
    return 64
",
    );
    env.refresh().unwrap();

    let smp = env.get_node("smp").unwrap();
    assert_eq!(smp.value(), Some(Value::Bool(true)));
    assert_eq!(smp.status(), NodeStatus::Latest);
    assert_eq!(
        smp.help_text().as_deref(),
        Some("Enable symmetric multiprocessing")
    );
    assert_eq!(
        env.get_node("max_cpus").unwrap().value(),
        Some(Value::Int(64))
    );
}

#[test]
fn refresh_is_idempotent() {
    let env = build(
        "\
gate() -> bool:
    return true

smp() -> bool:
    require(gate.val)

name() -> str:
    return \"cpu-${smp.val}\"
",
    );

    env.refresh().unwrap();
    let first: Vec<_> = env
        .nodes()
        .iter()
        .map(|n| (n.name().to_string(), n.value(), n.enabled()))
        .collect();

    env.refresh().unwrap();
    let second: Vec<_> = env
        .nodes()
        .iter()
        .map(|n| (n.name().to_string(), n.value(), n.enabled()))
        .collect();

    assert_eq!(first, second);
}

#[test]
fn external_write_takes_precedence_until_cleared() {
    let env = build("level() -> int:\n    return 1\n");
    let level = env.get_node("level").unwrap();
    assert_eq!(level.value(), Some(Value::Int(1)));

    level.set_value(Some(Value::Int(3))).unwrap();
    env.refresh().unwrap();
    assert_eq!(level.value(), Some(Value::Int(3)));

    level.clear_value();
    env.refresh().unwrap();
    assert_eq!(level.value(), Some(Value::Int(1)));
}

#[test]
fn readonly_value_is_overwritten_every_refresh() {
    let env = build("@ readonly\nlimit() -> int:\n    return 7\n");
    let limit = env.get_node("limit").unwrap();

    let err = limit.set_value(Some(Value::Int(5))).unwrap_err();
    assert!(err.to_string().contains("limit is readonly"));

    // Even a restore-style raw write is clobbered by the body's result.
    limit.set_value_raw(Some(Value::Int(5)));
    env.refresh().unwrap();
    assert_eq!(limit.value(), Some(Value::Int(7)));
}

#[test]
fn type_constraint_violation_fails_refresh_without_corrupting_others() {
    let env = build(
        "\
other() -> int:
    return 3

mode() -> \"a\" | \"b\":
    return \"a\"
",
    );

    env.get_node("mode")
        .unwrap()
        .set_value(Some(Value::from("c")))
        .unwrap();
    let err = env.refresh().unwrap_err();
    assert!(err.to_string().contains("unmatched type"));
    assert!(err.to_string().contains("mode"));

    assert_eq!(env.get_node("other").unwrap().value(), Some(Value::Int(3)));
}

#[test]
fn shared_context_defines_globals() {
    let env = build(
        "\
default_width = 8

width() -> int:
    return default_width
",
    );
    assert_eq!(env.get_node("width").unwrap().value(), Some(Value::Int(8)));
}

#[test]
fn builtins_are_callable_from_context_and_bodies() {
    let env = ConfigEnvironment::new();
    env.register_builtin("double", |args| match args {
        [Value::Int(i)] => Ok(Some(Value::Int(i * 2))),
        _ => anyhow::bail!("double() expects one integer"),
    });

    NodeBuilder::build_source(
        &env,
        "test.knob",
        "\
doubled = double(21)

answer() -> int:
    return doubled
",
    )
    .unwrap();

    assert_eq!(
        env.get_node("answer").unwrap().value(),
        Some(Value::Int(42))
    );
}

#[test]
fn env_builtin_falls_back_to_default() {
    let env = build(
        "\
target() -> str:
    return env(\"KNOBS_SURELY_UNSET_VARIABLE\", \"generic\")
",
    );
    assert_eq!(
        env.get_node("target").unwrap().value(),
        Some(Value::from("generic"))
    );
}

#[test]
fn interpolation_reads_live_values() {
    let env = build(
        "\
isa() -> str:
    return \"x86_64\"

triple() -> str:
    return \"${isa.val}-unknown-none\"
",
    );
    assert_eq!(
        env.get_node("triple").unwrap().value(),
        Some(Value::from("x86_64-unknown-none"))
    );
}

#[test]
fn body_error_carries_node_identity_and_location() {
    let err = build_err(
        "\
broken() -> int:
    return nonexistent_name
",
    );
    let message = err.to_string();
    assert!(message.contains("test.knob:1:1"));
    assert!(message.contains("fatal error: broken"));
    assert!(message.contains("undefined name 'nonexistent_name'"));
}

#[test]
fn undeclared_dependency_reference_is_fatal() {
    let err = build_err(
        "\
t() -> bool:
    require(ghost.val)
",
    );
    assert!(err.to_string().contains("config: 'ghost' does not exist"));
}
