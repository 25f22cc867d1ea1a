//! End-to-end pass over a small but representative option graph.

use knobs::builder::NodeBuilder;
use knobs::environment::ConfigEnvironment;
use knobs::export::{export, CHeader, MakefileFragment};
use knobs::snapshot::{restore, snapshot};
use knobs::Value;

const KERNEL: &str = "\
default_isa = \"x86_64\"

platform():
    \"\"\"
    Target platform selection.
    \"\"\"

    isa() -> \"x86_64\" | \"aarch64\" | \"riscv64\":
        return default_isa

    smp() -> bool:
        \"Enable symmetric multiprocessing\"
        return true

    @ readonly
    max_cpus() -> int:
        require(smp.val)
        return 64

memory():
    \"Memory management\"

    huge_pages() -> bool:
        require(smp.val)

    page_size() -> 4096 | 16384:
        return 4096

@ parent := memory
numa() -> bool:
    require(smp.val and huge_pages.val)
";

fn build() -> ConfigEnvironment {
    let env = ConfigEnvironment::new();
    NodeBuilder::build_source(&env, "kernel.knob", KERNEL).unwrap();
    env.refresh().unwrap();
    env
}

#[test]
fn whole_graph_resolves_and_gates() {
    let env = build();

    assert_eq!(
        env.get_node("isa").unwrap().value(),
        Some(Value::from("x86_64"))
    );
    assert_eq!(
        env.get_node("max_cpus").unwrap().value(),
        Some(Value::Int(64))
    );
    assert_eq!(
        env.get_node("numa").unwrap().value(),
        Some(Value::Bool(true))
    );
    assert!(env.get_node("numa").unwrap().enabled());

    // Turning SMP off ripples through require() chains and group links.
    env.get_node("smp")
        .unwrap()
        .set_value(Some(Value::Bool(false)))
        .unwrap();
    env.refresh().unwrap();

    assert!(!env.get_node("max_cpus").unwrap().enabled());
    assert!(!env.get_node("huge_pages").unwrap().enabled());
    assert!(!env.get_node("numa").unwrap().enabled());
    assert!(env.get_node("page_size").unwrap().enabled());

    env.get_node("smp")
        .unwrap()
        .set_value(Some(Value::Bool(true)))
        .unwrap();
    env.refresh().unwrap();
    assert!(env.get_node("numa").unwrap().enabled());
}

#[test]
fn exports_render_every_term() {
    let env = build();

    let mut makefile = Vec::new();
    export(&env, &MakefileFragment, &mut makefile).unwrap();
    let makefile = String::from_utf8(makefile).unwrap();
    assert!(makefile.contains("CONFIG_ISA := x86_64"));
    assert!(makefile.contains("CONFIG_SMP := y"));
    assert!(makefile.contains("CONFIG_MAX_CPUS := 64"));

    let mut header = Vec::new();
    export(&env, &CHeader, &mut header).unwrap();
    let header = String::from_utf8(header).unwrap();
    assert!(header.contains("#define CONFIG_ISA_X86_64"));
    assert!(header.contains("#define CONFIG_SMP"));
    assert!(header.contains("#define CONFIG_PAGE_SIZE 4096"));
}

#[test]
fn snapshot_survives_a_rebuild() {
    let env = build();
    env.get_node("isa")
        .unwrap()
        .set_value(Some(Value::from("riscv64")))
        .unwrap();
    env.refresh().unwrap();
    let saved = snapshot(&env);

    let env = ConfigEnvironment::new();
    NodeBuilder::build_source(&env, "kernel.knob", KERNEL).unwrap();
    restore(&env, &saved).unwrap();

    assert_eq!(
        env.get_node("isa").unwrap().value(),
        Some(Value::from("riscv64"))
    );
}

#[test]
fn help_text_reaches_the_editor_surface() {
    let env = build();
    assert_eq!(
        env.get_node("platform").unwrap().help_text().as_deref(),
        Some("Target platform selection.")
    );
    assert_eq!(
        env.get_node("smp").unwrap().help_text().as_deref(),
        Some("Enable symmetric multiprocessing")
    );
}
