use knobs_lexer::{tokenize, Span, TokenKind};
use thiserror::Error;

use crate::ast::{
    BodyItem, BoolOp, CompareOp, Declaration, Expr, ExprKind, Include, InterpPart, Item, Literal,
    ModifierExpr, SourceFile, Stmt, StmtKind, TypeAtom, TypeExpr, UnaryOp,
};

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    fn new(message: impl Into<String>, span: Span) -> Self {
        ParseError {
            message: message.into(),
            span,
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

pub fn parse_source(input: &str) -> ParseResult<SourceFile> {
    let mut parser = Parser::new(input)?;
    parser.parse_file()
}

/// Parse a single expression, e.g. an interpolation segment.
pub fn parse_expression(input: &str) -> ParseResult<Expr> {
    let mut parser = Parser::new(input)?;
    parser.skip_blank_lines();
    let expr = parser.parse_expr()?;
    parser.skip_blank_lines();
    while parser.eat(TokenKind::Dedent) {}
    if !parser.at_end() {
        return Err(ParseError::new(
            "unexpected trailing input after expression",
            parser.current_span(),
        ));
    }
    Ok(expr)
}

struct Parser<'t> {
    input: &'t str,
    tokens: Vec<(TokenKind, &'t str, Span)>,
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(input: &'t str) -> ParseResult<Self> {
        let mut tokens = Vec::new();
        let mut start = 0;
        for token in tokenize(input) {
            let span = start..start + token.len;
            let text = &input[span.clone()];
            start += token.len;

            if let TokenKind::Error(e) = token.kind {
                return Err(ParseError::new(e.to_string(), span));
            }
            if token.is_trivia() {
                continue;
            }
            tokens.push((token.kind, text, span));
        }

        Ok(Parser {
            input,
            tokens,
            pos: 0,
        })
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.0)
    }

    fn peek_nth(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.0)
    }

    fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, _, span)) => span.clone(),
            None => self.input.len()..self.input.len(),
        }
    }

    fn bump(&mut self) -> (TokenKind, &'t str, Span) {
        let t = self.tokens[self.pos].clone();
        self.pos += 1;
        t
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<(TokenKind, &'t str, Span)> {
        if self.at(kind) {
            return Ok(self.bump());
        }

        let expected = kind
            .get_fixed_str()
            .map(|s| format!("'{s}'"))
            .unwrap_or_else(|| format!("{kind:?}"));
        Err(ParseError::new(
            format!("expected {expected}, got {}", self.describe_current()),
            self.current_span(),
        ))
    }

    fn describe_current(&self) -> String {
        match self.tokens.get(self.pos) {
            Some((TokenKind::Newline, ..)) => "end of line".into(),
            Some((TokenKind::Indent, ..)) => "indent".into(),
            Some((TokenKind::Dedent, ..)) => "dedent".into(),
            Some((_, text, _)) => format!("'{text}'"),
            None => "end of input".into(),
        }
    }

    fn skip_blank_lines(&mut self) {
        while self.eat(TokenKind::Newline) {}
    }

    /// Statement terminator: a newline, or the end of the enclosing block.
    fn end_line(&mut self) -> ParseResult<()> {
        if self.eat(TokenKind::Newline) {
            return Ok(());
        }
        match self.peek() {
            None | Some(TokenKind::Dedent) => Ok(()),
            _ => Err(ParseError::new(
                format!("expected end of line, got {}", self.describe_current()),
                self.current_span(),
            )),
        }
    }

    fn at_declaration(&self) -> bool {
        self.peek() == Some(TokenKind::Identifier)
            && self.peek_nth(1) == Some(TokenKind::OpenParen)
            && self.peek_nth(2) == Some(TokenKind::CloseParen)
            && matches!(
                self.peek_nth(3),
                Some(TokenKind::Colon) | Some(TokenKind::Arrow)
            )
    }

    fn parse_file(&mut self) -> ParseResult<SourceFile> {
        let mut items = Vec::new();

        loop {
            self.skip_blank_lines();
            if self.at_end() {
                break;
            }

            if self.at(TokenKind::At) || self.at_declaration() {
                items.push(Item::Declaration(self.parse_declaration()?));
            } else if self.at(TokenKind::Include) {
                items.push(Item::Include(self.parse_include()?));
            } else {
                items.push(Item::Statement(self.parse_stmt()?));
            }
        }

        Ok(SourceFile { items })
    }

    fn parse_include(&mut self) -> ParseResult<Include> {
        let (_, _, start) = self.expect(TokenKind::Include)?;
        let (_, text, end) = self.expect(TokenKind::Str)?;
        let path = unescape_plain(&text[1..text.len() - 1]);
        self.end_line()?;
        Ok(Include {
            path,
            span: start.start..end.end,
        })
    }

    fn parse_declaration(&mut self) -> ParseResult<Declaration> {
        let start = self.current_span().start;

        let mut modifiers = Vec::new();
        while self.at(TokenKind::At) {
            modifiers.push(self.parse_modifier()?);
            self.skip_blank_lines();
        }

        if !self.at_declaration() {
            return Err(ParseError::new(
                "expected a declaration after modifiers",
                self.current_span(),
            ));
        }

        let (_, name, name_span) = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::OpenParen)?;
        self.expect(TokenKind::CloseParen)?;

        let type_expr = if self.eat(TokenKind::Arrow) {
            Some(self.parse_type_expr()?)
        } else {
            None
        };

        self.expect(TokenKind::Colon)?;
        let (body, end) = self.parse_body(name_span.end)?;

        Ok(Declaration {
            modifiers,
            name: name.to_string(),
            type_expr,
            body,
            span: start..end,
        })
    }

    fn parse_modifier(&mut self) -> ParseResult<ModifierExpr> {
        let (_, _, at_span) = self.expect(TokenKind::At)?;
        let start = at_span.start;

        let at_line_end =
            |kind: Option<TokenKind>| matches!(kind, None | Some(TokenKind::Newline));

        // Anything outside the closed modifier shapes is swallowed whole;
        // the build phase warns and drops it.
        let modifier = match self.peek() {
            Some(TokenKind::Str) if at_line_end(self.peek_nth(1)) => {
                let (_, text, span) = self.bump();
                ModifierExpr::Text {
                    value: unescape_plain(&text[1..text.len() - 1]),
                    span: start..span.end,
                }
            }
            Some(TokenKind::Identifier) if at_line_end(self.peek_nth(1)) => {
                let (_, name, name_span) = self.bump();
                ModifierExpr::Marker {
                    name: name.to_string(),
                    span: start..name_span.end,
                }
            }
            Some(TokenKind::Identifier)
                if self.peek_nth(1) == Some(TokenKind::ColonEquals)
                    && self.peek_nth(2) == Some(TokenKind::Identifier)
                    && at_line_end(self.peek_nth(3)) =>
            {
                let (_, key, _) = self.bump();
                self.bump();
                let (_, value, value_span) = self.bump();
                ModifierExpr::Binding {
                    key: key.to_string(),
                    value: value.to_string(),
                    span: start..value_span.end,
                }
            }
            _ => self.unknown_modifier_rest(start),
        };

        self.end_line()?;
        Ok(modifier)
    }

    /// Swallow the rest of a modifier line we do not understand; the build
    /// phase warns and drops it.
    fn unknown_modifier_rest(&mut self, start: usize) -> ModifierExpr {
        let mut end = start + 1;
        while !matches!(self.peek(), None | Some(TokenKind::Newline)) {
            let (_, _, span) = self.bump();
            end = span.end;
        }
        ModifierExpr::Unknown {
            text: self.input[start..end].trim_end().to_string(),
            span: start..end,
        }
    }

    fn parse_type_expr(&mut self) -> ParseResult<TypeExpr> {
        let start = self.current_span().start;
        let mut alternatives = vec![self.parse_type_atom()?];
        let mut end = self.tokens[self.pos - 1].2.end;

        while self.eat(TokenKind::Pipe) {
            alternatives.push(self.parse_type_atom()?);
            end = self.tokens[self.pos - 1].2.end;
        }

        Ok(TypeExpr {
            alternatives,
            span: start..end,
        })
    }

    fn parse_type_atom(&mut self) -> ParseResult<TypeAtom> {
        match self.peek() {
            Some(TokenKind::Str) => {
                let (_, text, _) = self.bump();
                Ok(TypeAtom::Literal(Literal::Str(unescape_plain(
                    &text[1..text.len() - 1],
                ))))
            }
            Some(TokenKind::Int) => {
                let (_, text, span) = self.bump();
                Ok(TypeAtom::Literal(Literal::Int(parse_int(text, &span)?)))
            }
            Some(TokenKind::Minus) => {
                self.bump();
                let (_, text, span) = self.expect(TokenKind::Int)?;
                Ok(TypeAtom::Literal(Literal::Int(-parse_int(text, &span)?)))
            }
            Some(TokenKind::True) => {
                self.bump();
                Ok(TypeAtom::Literal(Literal::Bool(true)))
            }
            Some(TokenKind::False) => {
                self.bump();
                Ok(TypeAtom::Literal(Literal::Bool(false)))
            }
            Some(TokenKind::Identifier) => {
                let (_, name, _) = self.bump();
                Ok(TypeAtom::Kind(name.to_string()))
            }
            _ => Err(ParseError::new(
                format!("expected a type, got {}", self.describe_current()),
                self.current_span(),
            )),
        }
    }

    fn parse_body(&mut self, header_end: usize) -> ParseResult<(Vec<BodyItem>, usize)> {
        self.expect(TokenKind::Newline)?;
        self.skip_blank_lines();
        self.expect(TokenKind::Indent)?;

        let mut items = Vec::new();
        let mut end = header_end;

        loop {
            self.skip_blank_lines();
            if self.eat(TokenKind::Dedent) || self.at_end() {
                break;
            }

            if self.at(TokenKind::At) || self.at_declaration() {
                let decl = self.parse_declaration()?;
                end = decl.span.end;
                items.push(BodyItem::Declaration(decl));
            } else {
                let stmt = self.parse_stmt()?;
                end = stmt.span.end;
                items.push(BodyItem::Statement(stmt));
            }
        }

        Ok((items, end))
    }

    fn parse_stmt_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(TokenKind::Newline)?;
        self.skip_blank_lines();
        self.expect(TokenKind::Indent)?;

        let mut stmts = Vec::new();
        loop {
            self.skip_blank_lines();
            if self.eat(TokenKind::Dedent) || self.at_end() {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }

        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span().start;

        match self.peek() {
            Some(TokenKind::Return) => {
                self.bump();
                let expr = if matches!(self.peek(), None | Some(TokenKind::Newline) | Some(TokenKind::Dedent))
                {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let end = expr
                    .as_ref()
                    .map(|e| e.span.end)
                    .unwrap_or(start + "return".len());
                self.end_line()?;
                Ok(Stmt {
                    kind: StmtKind::Return(expr),
                    span: start..end,
                })
            }
            Some(TokenKind::If) => self.parse_if(start),
            Some(TokenKind::While) => {
                self.bump();
                let test = self.parse_expr()?;
                self.expect(TokenKind::Colon)?;
                let end = test.span.end;
                let body = self.parse_stmt_block()?;
                Ok(Stmt {
                    kind: StmtKind::While { test, body },
                    span: start..end,
                })
            }
            Some(TokenKind::For) => {
                self.bump();
                let (_, var, _) = self.expect(TokenKind::Identifier)?;
                self.expect(TokenKind::In)?;
                let iter = self.parse_expr()?;
                self.expect(TokenKind::Colon)?;
                let end = iter.span.end;
                let body = self.parse_stmt_block()?;
                Ok(Stmt {
                    kind: StmtKind::For {
                        var: var.to_string(),
                        iter,
                        body,
                    },
                    span: start..end,
                })
            }
            Some(TokenKind::Struct) => {
                self.bump();
                let (_, name, name_span) = self.expect(TokenKind::Identifier)?;
                self.expect(TokenKind::Colon)?;
                let body = self.parse_stmt_block()?;
                Ok(Stmt {
                    kind: StmtKind::Struct {
                        name: name.to_string(),
                        body,
                    },
                    span: start..name_span.end,
                })
            }
            _ => {
                let expr = self.parse_expr()?;
                if self.eat(TokenKind::Equals) {
                    if !matches!(expr.kind, ExprKind::Name(_) | ExprKind::Attr { .. }) {
                        return Err(ParseError::new(
                            "invalid assignment target",
                            expr.span.clone(),
                        ));
                    }
                    let value = self.parse_expr()?;
                    let end = value.span.end;
                    self.end_line()?;
                    return Ok(Stmt {
                        kind: StmtKind::Assign {
                            target: expr,
                            value,
                        },
                        span: start..end,
                    });
                }

                let end = expr.span.end;
                self.end_line()?;
                Ok(Stmt {
                    kind: StmtKind::Expr(expr),
                    span: start..end,
                })
            }
        }
    }

    fn parse_if(&mut self, start: usize) -> ParseResult<Stmt> {
        // Consumes `if` or `elif`.
        self.bump();
        let test = self.parse_expr()?;
        self.expect(TokenKind::Colon)?;
        let end = test.span.end;
        let then_body = self.parse_stmt_block()?;

        let else_body = match self.peek() {
            Some(TokenKind::Elif) => {
                let elif_start = self.current_span().start;
                vec![self.parse_if(elif_start)?]
            }
            Some(TokenKind::Else) => {
                self.bump();
                self.expect(TokenKind::Colon)?;
                self.parse_stmt_block()?
            }
            _ => Vec::new(),
        };

        Ok(Stmt {
            kind: StmtKind::If {
                test,
                then_body,
                else_body,
            },
            span: start..end,
        })
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let first = self.parse_and()?;
        if !self.at(TokenKind::Or) {
            return Ok(first);
        }

        let start = first.span.start;
        let mut operands = vec![first];
        while self.eat(TokenKind::Or) {
            operands.push(self.parse_and()?);
        }
        let end = operands.last().unwrap().span.end;

        Ok(Expr {
            kind: ExprKind::Bool {
                op: BoolOp::Or,
                operands,
            },
            span: start..end,
        })
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let first = self.parse_not()?;
        if !self.at(TokenKind::And) {
            return Ok(first);
        }

        let start = first.span.start;
        let mut operands = vec![first];
        while self.eat(TokenKind::And) {
            operands.push(self.parse_not()?);
        }
        let end = operands.last().unwrap().span.end;

        Ok(Expr {
            kind: ExprKind::Bool {
                op: BoolOp::And,
                operands,
            },
            span: start..end,
        })
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if self.at(TokenKind::Not) {
            let (_, _, span) = self.bump();
            let operand = self.parse_not()?;
            let end = operand.span.end;
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span: span.start..end,
            });
        }

        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let lhs = self.parse_unary()?;

        let op = match self.peek() {
            Some(TokenKind::EqualsEquals) => CompareOp::Eq,
            Some(TokenKind::NotEquals) => CompareOp::Ne,
            Some(TokenKind::LessThan) => CompareOp::Lt,
            Some(TokenKind::LessEquals) => CompareOp::Le,
            Some(TokenKind::GreaterThan) => CompareOp::Gt,
            Some(TokenKind::GreaterEquals) => CompareOp::Ge,
            _ => return Ok(lhs),
        };
        self.bump();

        let rhs = self.parse_unary()?;
        let span = lhs.span.start..rhs.span.end;

        Ok(Expr {
            kind: ExprKind::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        })
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.at(TokenKind::Minus) {
            let (_, _, span) = self.bump();
            let operand = self.parse_unary()?;
            let end = operand.span.end;
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                },
                span: span.start..end,
            });
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_atom()?;

        loop {
            if self.at(TokenKind::Dot) {
                self.bump();
                let (_, attr, attr_span) = self.expect(TokenKind::Identifier)?;
                let target = match &expr.kind {
                    ExprKind::Name(n) => n.clone(),
                    _ => {
                        return Err(ParseError::new(
                            "chained attribute access is not supported",
                            expr.span.start..attr_span.end,
                        ));
                    }
                };
                expr = Expr {
                    span: expr.span.start..attr_span.end,
                    kind: ExprKind::Attr {
                        target,
                        attr: attr.to_string(),
                    },
                };
            } else if self.at(TokenKind::OpenParen) {
                let func = match &expr.kind {
                    ExprKind::Name(n) => n.clone(),
                    _ => {
                        return Err(ParseError::new(
                            "only plain function names can be called",
                            expr.span.clone(),
                        ));
                    }
                };
                self.bump();
                let (args, end) = self.parse_call_args()?;
                expr = Expr {
                    span: expr.span.start..end,
                    kind: ExprKind::Call { func, args },
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_call_args(&mut self) -> ParseResult<(Vec<Expr>, usize)> {
        let mut args = Vec::new();

        self.skip_blank_lines();
        if self.at(TokenKind::CloseParen) {
            let (_, _, span) = self.bump();
            return Ok((args, span.end));
        }

        loop {
            args.push(self.parse_expr()?);
            self.skip_blank_lines();
            if self.eat(TokenKind::Comma) {
                self.skip_blank_lines();
                if self.at(TokenKind::CloseParen) {
                    break;
                }
                continue;
            }
            break;
        }

        let (_, _, span) = self.expect(TokenKind::CloseParen)?;
        Ok((args, span.end))
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        match self.peek() {
            Some(TokenKind::Int) => {
                let (_, text, span) = self.bump();
                let value = parse_int(text, &span)?;
                Ok(Expr {
                    kind: ExprKind::Literal(Literal::Int(value)),
                    span,
                })
            }
            Some(TokenKind::True) => {
                let (_, _, span) = self.bump();
                Ok(Expr {
                    kind: ExprKind::Literal(Literal::Bool(true)),
                    span,
                })
            }
            Some(TokenKind::False) => {
                let (_, _, span) = self.bump();
                Ok(Expr {
                    kind: ExprKind::Literal(Literal::Bool(false)),
                    span,
                })
            }
            Some(TokenKind::Str) => {
                let (_, text, span) = self.bump();
                let kind = decode_string(&text[1..text.len() - 1], &span)?;
                Ok(Expr { kind, span })
            }
            Some(TokenKind::MultilineStr) => {
                let (_, text, span) = self.bump();
                Ok(Expr {
                    kind: ExprKind::Literal(Literal::Str(
                        text[3..text.len() - 3].to_string(),
                    )),
                    span,
                })
            }
            Some(TokenKind::Identifier) => {
                let (_, name, span) = self.bump();
                Ok(Expr {
                    kind: ExprKind::Name(name.to_string()),
                    span,
                })
            }
            Some(TokenKind::OpenParen) => {
                self.bump();
                self.skip_blank_lines();
                let inner = self.parse_expr()?;
                self.skip_blank_lines();
                self.expect(TokenKind::CloseParen)?;
                Ok(inner)
            }
            Some(TokenKind::OpenBrace) => self.parse_map(),
            _ => Err(ParseError::new(
                format!("expected an expression, got {}", self.describe_current()),
                self.current_span(),
            )),
        }
    }

    fn parse_map(&mut self) -> ParseResult<Expr> {
        let (_, _, open) = self.expect(TokenKind::OpenBrace)?;
        let mut entries = Vec::new();

        self.skip_blank_lines();
        if self.at(TokenKind::CloseBrace) {
            let (_, _, close) = self.bump();
            return Ok(Expr {
                kind: ExprKind::Map(entries),
                span: open.start..close.end,
            });
        }

        loop {
            let key = self.parse_expr()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expr()?;
            entries.push((key, value));
            self.skip_blank_lines();
            if self.eat(TokenKind::Comma) {
                self.skip_blank_lines();
                if self.at(TokenKind::CloseBrace) {
                    break;
                }
                continue;
            }
            break;
        }

        let (_, _, close) = self.expect(TokenKind::CloseBrace)?;
        Ok(Expr {
            kind: ExprKind::Map(entries),
            span: open.start..close.end,
        })
    }
}

fn parse_int(text: &str, span: &Span) -> ParseResult<i64> {
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else {
        text.parse()
    };

    parsed.map_err(|_| ParseError::new(format!("invalid integer literal '{text}'"), span.clone()))
}

/// Unescape a string that is not allowed to interpolate (include paths,
/// labels, type literals).
fn unescape_plain(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Decode a double-quoted string body, splitting out `${...}` segments.
fn decode_string(raw: &str, span: &Span) -> ParseResult<ExprKind> {
    let chars: Vec<char> = raw.chars().collect();
    let mut parts: Vec<InterpPart> = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 1;
            match chars.get(i) {
                Some('n') => text.push('\n'),
                Some('t') => text.push('\t'),
                Some('r') => text.push('\r'),
                Some(&other) => text.push(other),
                None => text.push('\\'),
            }
            i += 1;
            continue;
        }

        if c == '$' && chars.get(i + 1) == Some(&'{') {
            let mut j = i + 2;
            while j < chars.len() && chars[j] != '}' {
                j += 1;
            }
            if j == chars.len() {
                return Err(ParseError::new("unterminated interpolation", span.clone()));
            }

            let snippet: String = chars[i + 2..j].iter().collect();
            let inner = parse_expression(&snippet).map_err(|e| {
                ParseError::new(
                    format!("in interpolation '{snippet}': {}", e.message),
                    span.clone(),
                )
            })?;

            if !text.is_empty() {
                parts.push(InterpPart::Text(std::mem::take(&mut text)));
            }
            parts.push(InterpPart::Expr(Expr {
                kind: inner.kind,
                span: span.clone(),
            }));
            i = j + 1;
            continue;
        }

        text.push(c);
        i += 1;
    }

    if parts.is_empty() {
        return Ok(ExprKind::Literal(Literal::Str(text)));
    }

    if !text.is_empty() {
        parts.push(InterpPart::Text(text));
    }
    Ok(ExprKind::Interp(parts))
}

#[cfg(test)]
mod tests;
