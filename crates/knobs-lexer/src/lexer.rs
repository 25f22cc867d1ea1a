use std::ops::Range;

use muncher::Muncher;
use phf::{self, phf_map};

use crate::token::{LexerError, LexerErrorKind, Token, TokenKind};

pub type Span = Range<usize>;

static KNOBS_KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "and" => TokenKind::And,
    "or" => TokenKind::Or,
    "not" => TokenKind::Not,
    "return" => TokenKind::Return,
    "if" => TokenKind::If,
    "elif" => TokenKind::Elif,
    "else" => TokenKind::Else,
    "while" => TokenKind::While,
    "for" => TokenKind::For,
    "in" => TokenKind::In,
    "struct" => TokenKind::Struct,
    "include" => TokenKind::Include,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
};

fn is_identifier_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn error_token(kind: LexerErrorKind, len: usize) -> Token {
    Token {
        kind: TokenKind::Error(LexerError { kind }),
        len,
    }
}

#[inline]
fn scan_comment(start: usize, m: &mut Muncher) -> Token {
    while let Some(c) = m.peek() {
        if *c == '\n' {
            break;
        }
        m.eat();
    }
    m.reset_peek();

    Token {
        len: m.position() - start,
        kind: TokenKind::Comment,
    }
}

#[inline]
fn scan_whitespace(start: usize, m: &mut Muncher) -> Token {
    while let Some(c) = m.peek() {
        match c {
            ' ' | '\r' | '\t' => {
                m.eat();
            }
            _ => break,
        }
    }
    m.reset_peek();

    Token {
        len: m.position() - start,
        kind: TokenKind::Whitespace,
    }
}

#[inline]
fn scan_string(start: usize, m: &mut Muncher) -> Token {
    // Opening quote already eaten. A bare newline terminates the token
    // without being consumed, so line tracking stays intact.
    loop {
        match m.peek().copied() {
            None | Some('\n') => {
                m.reset_peek();
                return error_token(LexerErrorKind::UnterminatedString, m.position() - start);
            }
            Some('\\') => {
                m.eat();
                m.eat();
            }
            Some('"') => {
                m.eat();
                return Token {
                    kind: TokenKind::Str,
                    len: m.position() - start,
                };
            }
            Some(_) => {
                m.eat();
            }
        }
    }
}

#[inline]
fn scan_multiline_string(start: usize, m: &mut Muncher) -> Token {
    loop {
        match m.eat() {
            None => {
                return error_token(LexerErrorKind::UnterminatedString, m.position() - start);
            }
            Some('"') => {
                if matches!(m.peek(), Some(&'"')) && matches!(m.peek(), Some(&'"')) {
                    m.eat();
                    m.eat();
                    return Token {
                        kind: TokenKind::MultilineStr,
                        len: m.position() - start,
                    };
                }
                m.reset_peek();
            }
            Some(_) => {}
        }
    }
}

#[inline]
fn scan_number(first_char: char, start: usize, m: &mut Muncher) -> Token {
    let hex = first_char == '0' && matches!(m.peek(), Some(&'x') | Some(&'X'));
    m.reset_peek();

    if hex {
        m.eat();
        while let Some(c) = m.peek() {
            if c.is_ascii_hexdigit() {
                m.eat();
            } else {
                break;
            }
        }
    } else {
        while let Some(c) = m.peek() {
            if c.is_ascii_digit() {
                m.eat();
            } else {
                break;
            }
        }
    }
    m.reset_peek();

    Token {
        kind: TokenKind::Int,
        len: m.position() - start,
    }
}

#[inline]
fn scan_identifier_or_keyword<'a>(input: &'a str, start: usize, m: &mut Muncher) -> Token {
    while let Some(c) = m.peek() {
        if is_identifier_char(*c) {
            m.eat();
        } else {
            break;
        }
    }
    m.reset_peek();

    let text = &input[start..m.position()];
    let kind = KNOBS_KEYWORDS
        .get(text)
        .copied()
        .unwrap_or(TokenKind::Identifier);

    Token {
        kind,
        len: m.position() - start,
    }
}

/// Measure the indentation of the line about to be scanned and emit
/// `Indent`/`Dedent` markers against the indent stack. The consumed
/// whitespace is emitted as an ordinary `Whitespace` token first so that
/// token lengths still sum to the input length; the markers themselves
/// are zero-length.
fn handle_line_start(m: &mut Muncher, indents: &mut Vec<usize>, tokens: &mut Vec<Token>) {
    let start = m.position();
    let mut width = 0usize;
    let mut saw_tab = false;

    while let Some(c) = m.peek() {
        match c {
            ' ' => {
                m.eat();
                width += 1;
            }
            '\t' => {
                m.eat();
                saw_tab = true;
            }
            _ => break,
        }
    }
    m.reset_peek();

    let ws_len = m.position() - start;
    if ws_len > 0 {
        tokens.push(Token {
            kind: TokenKind::Whitespace,
            len: ws_len,
        });
    }

    // Blank and comment-only lines never open or close blocks.
    let next = m.peek().copied();
    m.reset_peek();
    if matches!(next, None | Some('\n') | Some('#')) {
        return;
    }

    if saw_tab {
        tokens.push(error_token(LexerErrorKind::TabIndentation, 0));
        return;
    }

    let top = *indents.last().unwrap();
    if width > top {
        indents.push(width);
        tokens.push(Token {
            kind: TokenKind::Indent,
            len: 0,
        });
    } else if width < top {
        while width < *indents.last().unwrap() {
            indents.pop();
            tokens.push(Token {
                kind: TokenKind::Dedent,
                len: 0,
            });
        }
        if width != *indents.last().unwrap() {
            tokens.push(error_token(LexerErrorKind::InconsistentDedent, 0));
        }
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut m = Muncher::new(input);
    let mut tokens = Vec::new();
    let mut indents: Vec<usize> = vec![0];
    let mut depth = 0usize;
    let mut at_line_start = true;

    loop {
        if at_line_start && depth == 0 {
            handle_line_start(&mut m, &mut indents, &mut tokens);
            at_line_start = false;
            continue;
        }

        let start = m.position();
        let Some(c) = m.eat() else { break };

        let token = match c {
            '\n' => {
                if depth == 0 {
                    at_line_start = true;
                }
                Token {
                    kind: TokenKind::Newline,
                    len: 1,
                }
            }
            ' ' | '\r' | '\t' => scan_whitespace(start, &mut m),
            '#' => scan_comment(start, &mut m),
            '"' => {
                if matches!(m.peek(), Some(&'"')) && matches!(m.peek(), Some(&'"')) {
                    m.eat();
                    m.eat();
                    scan_multiline_string(start, &mut m)
                } else {
                    m.reset_peek();
                    scan_string(start, &mut m)
                }
            }
            '@' => Token {
                kind: TokenKind::At,
                len: 1,
            },
            '(' => {
                depth += 1;
                Token {
                    kind: TokenKind::OpenParen,
                    len: 1,
                }
            }
            ')' => {
                depth = depth.saturating_sub(1);
                Token {
                    kind: TokenKind::CloseParen,
                    len: 1,
                }
            }
            '{' => {
                depth += 1;
                Token {
                    kind: TokenKind::OpenBrace,
                    len: 1,
                }
            }
            '}' => {
                depth = depth.saturating_sub(1);
                Token {
                    kind: TokenKind::CloseBrace,
                    len: 1,
                }
            }
            '|' => Token {
                kind: TokenKind::Pipe,
                len: 1,
            },
            ',' => Token {
                kind: TokenKind::Comma,
                len: 1,
            },
            '.' => Token {
                kind: TokenKind::Dot,
                len: 1,
            },
            ':' => match m.peek() {
                Some(&'=') => {
                    m.eat();
                    Token {
                        kind: TokenKind::ColonEquals,
                        len: 2,
                    }
                }
                _ => {
                    m.reset_peek();
                    Token {
                        kind: TokenKind::Colon,
                        len: 1,
                    }
                }
            },
            '-' => match m.peek() {
                Some(&'>') => {
                    m.eat();
                    Token {
                        kind: TokenKind::Arrow,
                        len: 2,
                    }
                }
                _ => {
                    m.reset_peek();
                    Token {
                        kind: TokenKind::Minus,
                        len: 1,
                    }
                }
            },
            '=' => match m.peek() {
                Some(&'=') => {
                    m.eat();
                    Token {
                        kind: TokenKind::EqualsEquals,
                        len: 2,
                    }
                }
                _ => {
                    m.reset_peek();
                    Token {
                        kind: TokenKind::Equals,
                        len: 1,
                    }
                }
            },
            '!' => match m.peek() {
                Some(&'=') => {
                    m.eat();
                    Token {
                        kind: TokenKind::NotEquals,
                        len: 2,
                    }
                }
                _ => {
                    m.reset_peek();
                    error_token(LexerErrorKind::UnexpectedCharacter, 1)
                }
            },
            '<' => match m.peek() {
                Some(&'=') => {
                    m.eat();
                    Token {
                        kind: TokenKind::LessEquals,
                        len: 2,
                    }
                }
                _ => {
                    m.reset_peek();
                    Token {
                        kind: TokenKind::LessThan,
                        len: 1,
                    }
                }
            },
            '>' => match m.peek() {
                Some(&'=') => {
                    m.eat();
                    Token {
                        kind: TokenKind::GreaterEquals,
                        len: 2,
                    }
                }
                _ => {
                    m.reset_peek();
                    Token {
                        kind: TokenKind::GreaterThan,
                        len: 1,
                    }
                }
            },
            c if c.is_ascii_digit() => scan_number(c, start, &mut m),
            c if is_identifier_start_char(c) => scan_identifier_or_keyword(input, start, &mut m),
            _ => error_token(LexerErrorKind::UnexpectedCharacter, c.len_utf8()),
        };

        tokens.push(token);
    }

    while indents.len() > 1 {
        indents.pop();
        tokens.push(Token {
            kind: TokenKind::Dedent,
            len: 0,
        });
    }

    tokens
}

#[cfg(test)]
mod tests;
