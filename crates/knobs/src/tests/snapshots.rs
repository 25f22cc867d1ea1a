use pretty_assertions::assert_eq;

use super::build;
use crate::snapshot::{restore, snapshot};
use crate::value::Value;

const GRAPH: &str = "\
cmdline() -> str:
    return \"console=ttyS0\"

max_cpus() -> int:
    return 8

smp() -> bool:
    return true
";

#[test]
fn snapshot_round_trip_reproduces_written_values() {
    let env = build(GRAPH);

    env.get_node("cmdline")
        .unwrap()
        .set_value(Some(Value::from("loglevel=7")))
        .unwrap();
    env.get_node("max_cpus")
        .unwrap()
        .set_value(Some(Value::Int(64)))
        .unwrap();
    env.get_node("smp")
        .unwrap()
        .set_value(Some(Value::Bool(false)))
        .unwrap();
    env.refresh().unwrap();

    let saved = snapshot(&env);

    // Back to defaults, then restore.
    env.clear_values();
    env.refresh().unwrap();
    assert_eq!(
        env.get_node("max_cpus").unwrap().value(),
        Some(Value::Int(8))
    );

    restore(&env, &saved).unwrap();
    assert_eq!(
        env.get_node("cmdline").unwrap().value(),
        Some(Value::from("loglevel=7"))
    );
    assert_eq!(
        env.get_node("max_cpus").unwrap().value(),
        Some(Value::Int(64))
    );
    assert_eq!(
        env.get_node("smp").unwrap().value(),
        Some(Value::Bool(false))
    );
}

#[test]
fn unknown_snapshot_names_warn_and_are_skipped() {
    let env = build(GRAPH);
    let mut saved = snapshot(&env);
    saved.insert("retired_option".to_string(), Value::Bool(true));

    env.take_diagnostics();
    restore(&env, &saved).unwrap();

    assert!(env.diagnostics().iter().any(|d| {
        d.node == "retired_option" && d.message.contains("missing node")
    }));
}

#[test]
fn snapshot_files_round_trip_as_json() {
    let env = build(GRAPH);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    crate::snapshot::save_snapshot(&env, &path).unwrap();

    let env2 = build(GRAPH);
    env2.get_node("max_cpus")
        .unwrap()
        .set_value(Some(Value::Int(2)))
        .unwrap();
    crate::snapshot::load_snapshot(&env2, &path).unwrap();

    assert_eq!(
        env2.get_node("max_cpus").unwrap().value(),
        Some(Value::Int(8))
    );
}
