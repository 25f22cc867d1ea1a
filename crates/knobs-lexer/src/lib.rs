pub mod lexer;
pub mod token;

pub use lexer::{tokenize, Span};
pub use token::{LexerError, LexerErrorKind, Token, TokenKind};
