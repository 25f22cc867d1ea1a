use pretty_assertions::assert_eq;

use crate::lexer::tokenize;
use crate::token::{LexerErrorKind, Token, TokenKind};

mod blocks;

pub(crate) fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input)
        .into_iter()
        .filter(|t| !t.is_trivia())
        .map(|t| t.kind)
        .collect()
}

#[test]
fn lengths_cover_input() {
    let input = "@ readonly\nmax_cpus() -> int:\n    return 0x40\n";
    let total: usize = tokenize(input).iter().map(|t| t.len).sum();
    assert_eq!(total, input.len());
}

#[test]
fn punctuation_and_operators() {
    assert_eq!(
        kinds("a() -> int:"),
        vec![
            TokenKind::Identifier,
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::Arrow,
            TokenKind::Identifier,
            TokenKind::Colon,
        ]
    );

    assert_eq!(
        kinds("x == 1 != 2 <= 3 >= 4 < 5 > 6"),
        vec![
            TokenKind::Identifier,
            TokenKind::EqualsEquals,
            TokenKind::Int,
            TokenKind::NotEquals,
            TokenKind::Int,
            TokenKind::LessEquals,
            TokenKind::Int,
            TokenKind::GreaterEquals,
            TokenKind::Int,
            TokenKind::LessThan,
            TokenKind::Int,
            TokenKind::GreaterThan,
            TokenKind::Int,
        ]
    );
}

#[test]
fn keywords_and_identifiers() {
    assert_eq!(
        kinds("return require and or not true false returning"),
        vec![
            TokenKind::Return,
            TokenKind::Identifier,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Not,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Identifier,
        ]
    );
}

#[test]
fn numbers() {
    let tokens: Vec<Token> = tokenize("12 0x1f 0")
        .into_iter()
        .filter(|t| !t.is_trivia())
        .collect();
    assert_eq!(
        tokens,
        vec![
            Token {
                kind: TokenKind::Int,
                len: 2
            },
            Token {
                kind: TokenKind::Int,
                len: 4
            },
            Token {
                kind: TokenKind::Int,
                len: 1
            },
        ]
    );
}

#[test]
fn comments_run_to_end_of_line() {
    assert_eq!(
        kinds("x # trailing, with : and ( noise\ny"),
        vec![
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::Identifier,
        ]
    );
}

#[test]
fn stray_bang_is_an_error() {
    let tokens = tokenize("!x");
    assert!(matches!(
        tokens[0].kind,
        TokenKind::Error(e) if e.kind() == LexerErrorKind::UnexpectedCharacter
    ));
}
