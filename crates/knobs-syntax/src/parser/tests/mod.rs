use pretty_assertions::assert_eq;

use crate::ast::{
    BodyItem, BoolOp, CompareOp, ExprKind, InterpPart, Item, Literal, ModifierExpr, StmtKind,
    TypeAtom,
};
use crate::parser::{parse_expression, parse_source};

fn declaration(input: &str) -> crate::ast::Declaration {
    let file = parse_source(input).unwrap();
    match file.items.into_iter().next().unwrap() {
        Item::Declaration(d) => d,
        other => panic!("expected declaration, got {other:?}"),
    }
}

#[test]
fn group_and_term_shapes() {
    let d = declaration("platform():\n    \"help\"\n");
    assert_eq!(d.name, "platform");
    assert!(d.type_expr.is_none());

    let d = declaration("smp() -> bool:\n    return true\n");
    assert_eq!(d.name, "smp");
    let ty = d.type_expr.unwrap();
    assert_eq!(ty.alternatives, vec![TypeAtom::Kind("bool".into())]);
}

#[test]
fn type_unions() {
    let d = declaration("isa() -> \"x86_64\" | \"aarch64\":\n    return \"x86_64\"\n");
    let ty = d.type_expr.unwrap();
    assert!(ty.is_union());
    assert_eq!(
        ty.alternatives,
        vec![
            TypeAtom::Literal(Literal::Str("x86_64".into())),
            TypeAtom::Literal(Literal::Str("aarch64".into())),
        ]
    );

    let d = declaration("align() -> 4 | 8 | 16:\n    return 8\n");
    assert_eq!(d.type_expr.unwrap().alternatives.len(), 3);
}

#[test]
fn modifiers_parse_into_neutral_records() {
    let input = "\
@ \"Enable SMP\"
@ readonly
@ parent := platform
@ arch := x86
smp() -> bool:
    return true
";
    let d = declaration(input);
    assert_eq!(d.modifiers.len(), 4);
    assert!(matches!(
        &d.modifiers[0],
        ModifierExpr::Text { value, .. } if value == "Enable SMP"
    ));
    assert!(matches!(
        &d.modifiers[1],
        ModifierExpr::Marker { name, .. } if name == "readonly"
    ));
    assert!(matches!(
        &d.modifiers[2],
        ModifierExpr::Binding { key, value, .. } if key == "parent" && value == "platform"
    ));
    assert!(matches!(
        &d.modifiers[3],
        ModifierExpr::Binding { key, value, .. } if key == "arch" && value == "x86"
    ));
}

#[test]
fn unrecognized_modifier_is_kept_verbatim() {
    let d = declaration("@ 42 what\nx() -> int:\n    return 1\n");
    assert!(matches!(
        &d.modifiers[0],
        ModifierExpr::Unknown { text, .. } if text == "@ 42 what"
    ));
}

#[test]
fn nested_declarations() {
    let input = "\
platform():
    \"top level\"

    smp() -> bool:
        return true

    max_cpus() -> int:
        require(smp.val)
        return 64
";
    let d = declaration(input);
    let nested: Vec<_> = d
        .body
        .iter()
        .filter_map(|i| match i {
            BodyItem::Declaration(d) => Some(d.name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(nested, vec!["smp".to_string(), "max_cpus".to_string()]);
}

#[test]
fn require_is_an_ordinary_call_statement() {
    let d = declaration("t() -> bool:\n    require(a.val and not b.val)\n    return true\n");
    let stmt = match &d.body[0] {
        BodyItem::Statement(s) => s,
        other => panic!("{other:?}"),
    };
    match &stmt.kind {
        StmtKind::Expr(e) => match &e.kind {
            ExprKind::Call { func, args } => {
                assert_eq!(func, "require");
                assert!(matches!(
                    args[0].kind,
                    ExprKind::Bool {
                        op: BoolOp::And,
                        ..
                    }
                ));
            }
            other => panic!("{other:?}"),
        },
        other => panic!("{other:?}"),
    }
}

#[test]
fn expressions() {
    let e = parse_expression("a.val == \"x\" or not flag").unwrap();
    assert!(matches!(
        e.kind,
        ExprKind::Bool {
            op: BoolOp::Or,
            ..
        }
    ));

    let e = parse_expression("n.val >= -1").unwrap();
    match e.kind {
        ExprKind::Compare { op, .. } => assert_eq!(op, CompareOp::Ge),
        other => panic!("{other:?}"),
    }

    let e = parse_expression("env(\"KNOBS_ARCH\", \"x86_64\")").unwrap();
    match e.kind {
        ExprKind::Call { func, args } => {
            assert_eq!(func, "env");
            assert_eq!(args.len(), 2);
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn string_interpolation() {
    let e = parse_expression("\"cpu-${isa.val}-smp\"").unwrap();
    match e.kind {
        ExprKind::Interp(parts) => {
            assert_eq!(parts.len(), 3);
            assert!(matches!(&parts[0], InterpPart::Text(t) if t == "cpu-"));
            assert!(matches!(
                &parts[1],
                InterpPart::Expr(e) if matches!(&e.kind, ExprKind::Attr { target, attr }
                    if target == "isa" && attr == "val")
            ));
            assert!(matches!(&parts[2], InterpPart::Text(t) if t == "-smp"));
        }
        other => panic!("{other:?}"),
    }

    // Escaped dollar does not interpolate.
    let e = parse_expression("\"cost \\$5\"").unwrap();
    assert!(matches!(
        e.kind,
        ExprKind::Literal(Literal::Str(s)) if s == "cost $5"
    ));
}

#[test]
fn flagged_constructs_still_parse() {
    let input = "\
t() -> int:
    if a.val:
        x = 1
    else:
        x = 2
    while x < 3:
        x = 3
    struct point:
        y = 1
    return 1
";
    let d = declaration(input);
    let kinds: Vec<_> = d
        .body
        .iter()
        .filter_map(|i| match i {
            BodyItem::Statement(s) => Some(&s.kind),
            _ => None,
        })
        .collect();
    assert!(matches!(kinds[0], StmtKind::If { .. }));
    assert!(matches!(kinds[1], StmtKind::While { .. }));
    assert!(matches!(kinds[2], StmtKind::Struct { .. }));
    assert!(matches!(kinds[3], StmtKind::Return(_)));
}

#[test]
fn top_level_statements_and_includes() {
    let input = "\
include \"arch/x86.knob\"
arch_default = \"x86_64\"

platform():
    \"help\"
";
    let file = parse_source(input).unwrap();
    assert!(matches!(&file.items[0], Item::Include(i) if i.path == "arch/x86.knob"));
    assert!(matches!(
        &file.items[1],
        Item::Statement(s) if matches!(&s.kind, StmtKind::Assign { .. })
    ));
    assert!(matches!(&file.items[2], Item::Declaration(_)));
}

#[test]
fn multiline_help_string() {
    let input = "g():\n    \"\"\"\n    line one\n    line two\n    \"\"\"\n";
    let d = declaration(input);
    match &d.body[0] {
        BodyItem::Statement(s) => match &s.kind {
            StmtKind::Expr(e) => {
                assert!(matches!(
                    &e.kind,
                    ExprKind::Literal(Literal::Str(s)) if s.contains("line one")
                ));
            }
            other => panic!("{other:?}"),
        },
        other => panic!("{other:?}"),
    }
}

#[test]
fn parse_errors_carry_spans() {
    let err = parse_source("t() -> :\n    return 1\n").unwrap_err();
    assert!(err.message.contains("expected a type"));
}
