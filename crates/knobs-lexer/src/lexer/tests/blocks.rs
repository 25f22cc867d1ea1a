use pretty_assertions::assert_eq;

use super::kinds;
use crate::lexer::tokenize;
use crate::token::{LexerErrorKind, TokenKind};

#[test]
fn indentation_opens_and_closes_blocks() {
    let input = "a():\n    x = 1\n    b():\n        y = 2\nz = 3\n";
    assert_eq!(
        kinds(input),
        vec![
            TokenKind::Identifier,
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Identifier,
            TokenKind::Equals,
            TokenKind::Int,
            TokenKind::Newline,
            TokenKind::Identifier,
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Identifier,
            TokenKind::Equals,
            TokenKind::Int,
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Dedent,
            TokenKind::Identifier,
            TokenKind::Equals,
            TokenKind::Int,
            TokenKind::Newline,
        ]
    );
}

#[test]
fn blank_and_comment_lines_do_not_affect_indentation() {
    let input = "a():\n    x = 1\n\n    # note\n    y = 2\n";
    let k = kinds(input);
    let indents = k.iter().filter(|k| **k == TokenKind::Indent).count();
    let dedents = k.iter().filter(|k| **k == TokenKind::Dedent).count();
    assert_eq!(indents, 1);
    assert_eq!(dedents, 1);
}

#[test]
fn dedents_are_closed_at_end_of_input() {
    let input = "a():\n    x = 1";
    let k = kinds(input);
    assert_eq!(k.last(), Some(&TokenKind::Dedent));
}

#[test]
fn inconsistent_dedent_is_reported() {
    let input = "a():\n        x = 1\n    y = 2\n";
    let has_error = tokenize(input).iter().any(|t| {
        matches!(
            t.kind,
            TokenKind::Error(e) if e.kind() == LexerErrorKind::InconsistentDedent
        )
    });
    assert!(has_error);
}

#[test]
fn tab_indentation_is_reported() {
    let input = "a():\n\tx = 1\n";
    let has_error = tokenize(input).iter().any(|t| {
        matches!(
            t.kind,
            TokenKind::Error(e) if e.kind() == LexerErrorKind::TabIndentation
        )
    });
    assert!(has_error);
}

#[test]
fn newlines_inside_parentheses_do_not_open_blocks() {
    let input = "require(\n    a.val\n)\n";
    let k = kinds(input);
    assert!(!k.contains(&TokenKind::Indent));
    assert!(!k.contains(&TokenKind::Dedent));
}
