//! The parser, turning source text into an [ast::Program].
//!
//! This is a hand-written recursive descent parser over the token stream produced by the modal
//! [lexer]. The lexer decides on its own when to switch between normal and template mode, so the
//! whole source is tokenized upfront, and the parser can look ahead freely. Lookahead is needed to
//! tell an arrow function `(a, b) => a` from a parenthesized expression.
//!
//! The accepted language is a subset of JavaScript: declarations, `return`, blocks, `if` and
//! `while` statements, and expressions made of literals, template literals, arrays, objects,
//! member accesses, calls, arrow functions, the conditional operator, and unary and binary
//! operators. Semicolons are optional. Some of those constructs are only parsed to be rejected
//! with a precise error by the type checker.
use codespan::FileId;

use crate::{
    ast::{
        ArrowBody, BinaryOp, DeclKind, Declarator, Expr, ExprKind, Literal, MemberProp, NodeId,
        Pattern, Program, PropKey, Property, Stmt, StmtKind, Template, UnaryOp,
    },
    identifier::LocIdent,
    position::{RawSpan, TermPos},
};

use error::ParseError;
use lexer::{Lexer, NormalToken, SpannedToken, TemplateToken, Token};

pub mod annotation;
pub mod error;
pub mod lexer;


/// Parse a whole program.
pub fn parse(src_id: FileId, source: &str) -> Result<Program, ParseError> {
    let tokens = Lexer::new(source)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| ParseError::from_lexical(err, src_id))?;

    let mut parser = Parser {
        src_id,
        source,
        tokens,
        cursor: 0,
        next_id: 0,
    };

    let mut body = Vec::new();
    while !parser.at_end() {
        if let Some(stmt) = parser.statement()? {
            body.push(stmt);
        }
    }

    Ok(Program {
        body,
        pos: parser.pos(0, source.len()),
    })
}

type ParseResult<T> = Result<T, ParseError>;

struct Parser<'input> {
    src_id: FileId,
    source: &'input str,
    tokens: Vec<SpannedToken<'input>>,
    cursor: usize,
    next_id: u32,
}

/// Binary operators by precedence level, from the loosest to the tightest. `**` is handled
/// separately, since it's right-associative.
const BINARY_LEVELS: &[&[(NormalToken<'static>, BinaryOp)]] = &[
    &[(NormalToken::DoublePipe, BinaryOp::Or)],
    &[(NormalToken::DoubleAnd, BinaryOp::And)],
    &[
        (NormalToken::TripleEq, BinaryOp::StrictEq),
        (NormalToken::NotDoubleEq, BinaryOp::StrictNeq),
    ],
    &[
        (NormalToken::Lt, BinaryOp::Lt),
        (NormalToken::Gt, BinaryOp::Gt),
        (NormalToken::Le, BinaryOp::Le),
        (NormalToken::Ge, BinaryOp::Ge),
    ],
    &[
        (NormalToken::Plus, BinaryOp::Add),
        (NormalToken::Minus, BinaryOp::Sub),
    ],
    &[
        (NormalToken::Star, BinaryOp::Mul),
        (NormalToken::Slash, BinaryOp::Div),
        (NormalToken::Percent, BinaryOp::Rem),
    ],
];

impl<'input> Parser<'input> {
    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn pos(&self, start: usize, end: usize) -> TermPos {
        TermPos::Original(RawSpan::from_range(self.src_id, start..end))
    }

    fn at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token<'input>> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token<'input>> {
        self.tokens.get(self.cursor + n).map(|(_, token, _)| token)
    }

    fn peek_normal(&self) -> Option<&NormalToken<'input>> {
        match self.peek() {
            Some(Token::Normal(token)) => Some(token),
            _ => None,
        }
    }

    fn check(&self, expected: &NormalToken) -> bool {
        self.peek_normal() == Some(expected)
    }

    /// The start offset of the next token, or the end of the source.
    fn next_start(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .map_or(self.source.len(), |(start, _, _)| *start)
    }

    /// The end offset of the last consumed token.
    fn prev_end(&self) -> usize {
        self.cursor
            .checked_sub(1)
            .and_then(|prev| self.tokens.get(prev))
            .map_or(0, |(_, _, end)| *end)
    }

    fn bump(&mut self) -> Option<SpannedToken<'input>> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn eat(&mut self, expected: &NormalToken) -> bool {
        if self.check(expected) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &NormalToken) -> ParseResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{}`", Token::Normal(expected.clone()))))
        }
    }

    /// Build an error for the next token, which doesn't match any of the expected alternatives.
    fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.cursor) {
            Some((start, token, end)) => {
                let expected = match token {
                    Token::Normal(NormalToken::DoubleEq | NormalToken::NotEq) => {
                        format!("{expected} (only strict equality `===` and `!==` is supported)")
                    }
                    _ => expected.to_owned(),
                };

                ParseError::UnexpectedToken {
                    found: token.to_string(),
                    expected,
                    span: RawSpan::from_range(self.src_id, *start..*end),
                }
            }
            None => ParseError::UnexpectedEof {
                expected: expected.to_owned(),
                span: RawSpan::from_range(self.src_id, self.source.len()..self.source.len()),
            },
        }
    }

    /// Whether there is a line break between the last consumed token and the next one.
    fn newline_before_next(&self) -> bool {
        let start = self.prev_end();
        let end = self.next_start();
        self.source
            .get(start..end)
            .is_some_and(|between| between.contains('\n'))
    }

    fn ident(&mut self, expected: &str) -> ParseResult<LocIdent> {
        match self.peek_normal() {
            Some(NormalToken::Identifier(name)) => {
                let name = *name;
                let (start, _, end) = self.tokens[self.cursor];
                self.cursor += 1;
                Ok(LocIdent::new_with_pos(name, self.pos(start, end)))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// A property name: an identifier, or a keyword, which are allowed after a dot and as object
    /// keys.
    fn property_name(&mut self) -> ParseResult<LocIdent> {
        let label = match self.peek_normal() {
            Some(NormalToken::Identifier(name)) => name.to_string(),
            Some(
                token @ (NormalToken::Let
                | NormalToken::Const
                | NormalToken::Var
                | NormalToken::Return
                | NormalToken::If
                | NormalToken::Else
                | NormalToken::While
                | NormalToken::True
                | NormalToken::False),
            ) => Token::Normal(token.clone()).to_string(),
            _ => return Err(self.unexpected("a property name")),
        };

        let (start, _, end) = self.tokens[self.cursor];
        self.cursor += 1;
        Ok(LocIdent::new_with_pos(label, self.pos(start, end)))
    }

    fn mk_stmt(&mut self, start: usize, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.fresh_id(),
            pos: self.pos(start, self.prev_end()),
            kind,
        }
    }

    fn mk_expr(&mut self, start: usize, kind: ExprKind) -> Expr {
        Expr {
            id: self.fresh_id(),
            pos: self.pos(start, self.prev_end()),
            kind,
        }
    }

    /// Parse a statement. Return `None` for an empty statement.
    fn statement(&mut self) -> ParseResult<Option<Stmt>> {
        let start = self.next_start();

        let kind = match self.peek_normal() {
            Some(NormalToken::Semicolon) => {
                self.cursor += 1;
                return Ok(None);
            }
            Some(NormalToken::Let | NormalToken::Const | NormalToken::Var) => {
                let kind = match self.bump() {
                    Some((_, Token::Normal(NormalToken::Const), _)) => DeclKind::Const,
                    Some((_, Token::Normal(NormalToken::Var), _)) => DeclKind::Var,
                    _ => DeclKind::Let,
                };

                let mut declarators = vec![self.declarator()?];
                while self.eat(&NormalToken::Comma) {
                    declarators.push(self.declarator()?);
                }

                StmtKind::Decl { kind, declarators }
            }
            Some(NormalToken::Return) => {
                self.cursor += 1;

                let ends_here = self.at_end()
                    || self.newline_before_next()
                    || self.check(&NormalToken::Semicolon)
                    || self.check(&NormalToken::RBrace);

                if ends_here {
                    StmtKind::Return(None)
                } else {
                    StmtKind::Return(Some(self.expression()?))
                }
            }
            Some(NormalToken::LBrace) => {
                self.cursor += 1;
                StmtKind::Block(self.block_rest()?)
            }
            Some(NormalToken::If) => {
                self.cursor += 1;
                let test = self.paren_expression()?;
                let consequent = Box::new(self.required_statement()?);
                let alternate = if self.eat(&NormalToken::Else) {
                    Some(Box::new(self.required_statement()?))
                } else {
                    None
                };

                StmtKind::If {
                    test,
                    consequent,
                    alternate,
                }
            }
            Some(NormalToken::While) => {
                self.cursor += 1;
                let test = self.paren_expression()?;
                let body = Box::new(self.required_statement()?);

                StmtKind::While { test, body }
            }
            _ => StmtKind::Expr(self.expression()?),
        };

        self.eat(&NormalToken::Semicolon);
        Ok(Some(self.mk_stmt(start, kind)))
    }

    /// The body of an `if` or a `while`, where an empty statement is still a statement.
    fn required_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.next_start();

        match self.statement()? {
            Some(stmt) => Ok(stmt),
            None => Ok(self.mk_stmt(start, StmtKind::Block(Vec::new()))),
        }
    }

    /// The statements of a block, after the opening brace. Consume the closing brace.
    fn block_rest(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = Vec::new();

        loop {
            if self.eat(&NormalToken::RBrace) {
                return Ok(stmts);
            }

            if self.at_end() {
                return Err(self.unexpected("`}`"));
            }

            if let Some(stmt) = self.statement()? {
                stmts.push(stmt);
            }
        }
    }

    fn declarator(&mut self) -> ParseResult<Declarator> {
        let start = self.next_start();
        let pattern = self.pattern()?;
        let init = if self.eat(&NormalToken::Equals) {
            Some(self.assignment()?)
        } else {
            None
        };

        Ok(Declarator {
            pattern,
            init,
            pos: self.pos(start, self.prev_end()),
        })
    }

    fn pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.next_start();

        let (close, is_object) = match self.peek_normal() {
            Some(NormalToken::LBrace) => (NormalToken::RBrace, true),
            Some(NormalToken::LBracket) => (NormalToken::RBracket, false),
            _ => return Ok(Pattern::Ident(self.ident("an identifier or a pattern")?)),
        };

        self.cursor += 1;
        let mut ids = Vec::new();

        while !self.eat(&close) {
            ids.push(self.ident("an identifier")?);

            if !self.eat(&NormalToken::Comma) {
                self.expect(&close)?;
                break;
            }
        }

        let pos = self.pos(start, self.prev_end());
        Ok(if is_object {
            Pattern::Object(ids, pos)
        } else {
            Pattern::Array(ids, pos)
        })
    }

    fn paren_expression(&mut self) -> ParseResult<Expr> {
        self.expect(&NormalToken::LParen)?;
        let expr = self.expression()?;
        self.expect(&NormalToken::RParen)?;
        Ok(expr)
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    /// Arrow functions, assignments and everything with a higher precedence.
    fn assignment(&mut self) -> ParseResult<Expr> {
        if self.at_arrow() {
            return self.arrow();
        }

        let start = self.next_start();
        let target = self.conditional()?;

        if self.eat(&NormalToken::Equals) {
            let value = self.assignment()?;
            return Ok(self.mk_expr(
                start,
                ExprKind::Assign {
                    target: Box::new(target),
                    value: Box::new(value),
                },
            ));
        }

        Ok(target)
    }

    /// Look ahead for the start of an arrow function: `x =>` or `(...) =>`.
    fn at_arrow(&self) -> bool {
        match self.peek_normal() {
            Some(NormalToken::Identifier(_)) => {
                self.peek_nth(1) == Some(&Token::Normal(NormalToken::FatArrow))
            }
            Some(NormalToken::LParen) => {
                let mut depth = 0usize;

                for (offset, (_, token, _)) in self.tokens[self.cursor..].iter().enumerate() {
                    match token {
                        Token::Normal(NormalToken::LParen) => depth += 1,
                        Token::Normal(NormalToken::RParen) => {
                            depth -= 1;
                            if depth == 0 {
                                return self.peek_nth(offset + 1)
                                    == Some(&Token::Normal(NormalToken::FatArrow));
                            }
                        }
                        _ => (),
                    }
                }

                false
            }
            _ => false,
        }
    }

    fn arrow(&mut self) -> ParseResult<Expr> {
        let start = self.next_start();

        let params = if self.eat(&NormalToken::LParen) {
            let mut params = Vec::new();

            while !self.eat(&NormalToken::RParen) {
                params.push(self.pattern()?);

                if !self.eat(&NormalToken::Comma) {
                    self.expect(&NormalToken::RParen)?;
                    break;
                }
            }

            params
        } else {
            vec![Pattern::Ident(self.ident("a parameter")?)]
        };

        self.expect(&NormalToken::FatArrow)?;

        let body = if self.check(&NormalToken::LBrace) {
            let body_start = self.next_start();
            self.cursor += 1;
            let stmts = self.block_rest()?;
            ArrowBody::Block(stmts, self.pos(body_start, self.prev_end()))
        } else {
            ArrowBody::Expr(Box::new(self.assignment()?))
        };

        Ok(self.mk_expr(start, ExprKind::Arrow { params, body }))
    }

    fn conditional(&mut self) -> ParseResult<Expr> {
        let start = self.next_start();
        let test = self.binary(0)?;

        if !self.eat(&NormalToken::QuestionMark) {
            return Ok(test);
        }

        let consequent = self.assignment()?;
        self.expect(&NormalToken::Colon)?;
        let alternate = self.assignment()?;

        Ok(self.mk_expr(
            start,
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
        ))
    }

    /// Left-associative binary operators of precedence `level` and above.
    fn binary(&mut self, level: usize) -> ParseResult<Expr> {
        let Some(operators) = BINARY_LEVELS.get(level) else {
            return self.exponent();
        };

        let start = self.next_start();
        let mut left = self.binary(level + 1)?;

        loop {
            let op = operators
                .iter()
                .find(|(token, _)| self.check(token))
                .map(|(_, op)| *op);

            let Some(op) = op else {
                return Ok(left);
            };

            self.cursor += 1;
            let right = self.binary(level + 1)?;
            left = self.mk_expr(
                start,
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
    }

    fn exponent(&mut self) -> ParseResult<Expr> {
        let start = self.next_start();
        let base = self.unary()?;

        if !self.eat(&NormalToken::DoubleStar) {
            return Ok(base);
        }

        let exponent = self.exponent()?;
        Ok(self.mk_expr(
            start,
            ExprKind::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            },
        ))
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let start = self.next_start();

        let op = match self.peek_normal() {
            Some(NormalToken::Minus) => UnaryOp::Neg,
            Some(NormalToken::Plus) => UnaryOp::Plus,
            Some(NormalToken::Bang) => UnaryOp::Not,
            _ => return self.postfix(),
        };
        self.cursor += 1;

        // A negated number literal is a literal.
        if let (UnaryOp::Neg, Some(NormalToken::NumLiteral(n))) = (op, self.peek_normal()) {
            let n = *n;
            self.cursor += 1;
            return Ok(self.mk_expr(start, ExprKind::Literal(Literal::Num(-n))));
        }

        let arg = self.unary()?;
        Ok(self.mk_expr(
            start,
            ExprKind::Unary {
                op,
                arg: Box::new(arg),
            },
        ))
    }

    /// Member accesses, calls and tagged templates.
    fn postfix(&mut self) -> ParseResult<Expr> {
        let start = self.next_start();
        let mut expr = self.primary()?;

        loop {
            let kind = match self.peek_normal() {
                Some(NormalToken::Dot) => {
                    self.cursor += 1;
                    ExprKind::Member {
                        object: Box::new(expr),
                        property: MemberProp::Ident(self.property_name()?),
                    }
                }
                Some(NormalToken::LBracket) => {
                    self.cursor += 1;
                    let property = self.expression()?;
                    self.expect(&NormalToken::RBracket)?;
                    ExprKind::Member {
                        object: Box::new(expr),
                        property: MemberProp::Computed(Box::new(property)),
                    }
                }
                Some(NormalToken::LParen) => {
                    self.cursor += 1;
                    let args = self.list(&NormalToken::RParen)?;
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    }
                }
                Some(NormalToken::Backtick) => ExprKind::TaggedTemplate {
                    tag: Box::new(expr),
                    quasi: self.template()?,
                },
                _ => return Ok(expr),
            };

            expr = self.mk_expr(start, kind);
        }
    }

    /// A comma-separated list of expressions, with an optional trailing comma, after the opening
    /// delimiter. Consume the closing delimiter.
    fn list(&mut self, close: &NormalToken) -> ParseResult<Vec<Expr>> {
        let mut exprs = Vec::new();

        while !self.eat(close) {
            exprs.push(self.assignment()?);

            if !self.eat(&NormalToken::Comma) {
                self.expect(close)?;
                break;
            }
        }

        Ok(exprs)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let start = self.next_start();

        let kind = match self.peek() {
            Some(Token::Normal(NormalToken::Backtick)) => ExprKind::Template(self.template()?),
            Some(Token::Normal(NormalToken::Identifier(_))) => {
                ExprKind::Ident(self.ident("an identifier")?)
            }
            Some(Token::Normal(NormalToken::NumLiteral(n))) => {
                let n = *n;
                self.cursor += 1;
                ExprKind::Literal(Literal::Num(n))
            }
            Some(Token::Normal(NormalToken::StrLiteral(s))) => {
                let s = s.clone();
                self.cursor += 1;
                ExprKind::Literal(Literal::Str(s))
            }
            Some(Token::Normal(NormalToken::True)) => {
                self.cursor += 1;
                ExprKind::Literal(Literal::Bool(true))
            }
            Some(Token::Normal(NormalToken::False)) => {
                self.cursor += 1;
                ExprKind::Literal(Literal::Bool(false))
            }
            Some(Token::Normal(NormalToken::LParen)) => {
                self.cursor += 1;
                let expr = self.expression()?;
                self.expect(&NormalToken::RParen)?;
                return Ok(expr);
            }
            Some(Token::Normal(NormalToken::LBracket)) => {
                self.cursor += 1;
                ExprKind::Array(self.list(&NormalToken::RBracket)?)
            }
            Some(Token::Normal(NormalToken::LBrace)) => {
                self.cursor += 1;
                ExprKind::Object(self.object_rest()?)
            }
            _ => return Err(self.unexpected("an expression")),
        };

        Ok(self.mk_expr(start, kind))
    }

    /// The properties of an object literal, after the opening brace. Consume the closing brace.
    fn object_rest(&mut self) -> ParseResult<Vec<Property>> {
        let mut props = Vec::new();

        while !self.eat(&NormalToken::RBrace) {
            props.push(self.property()?);

            if !self.eat(&NormalToken::Comma) {
                self.expect(&NormalToken::RBrace)?;
                break;
            }
        }

        Ok(props)
    }

    fn property(&mut self) -> ParseResult<Property> {
        let start = self.next_start();

        let key = match self.peek_normal() {
            Some(NormalToken::StrLiteral(s)) => {
                let lit = Literal::Str(s.clone());
                let (start, _, end) = self.tokens[self.cursor];
                self.cursor += 1;
                PropKey::Literal(lit, self.pos(start, end))
            }
            Some(NormalToken::NumLiteral(n)) => {
                let lit = Literal::Num(*n);
                let (start, _, end) = self.tokens[self.cursor];
                self.cursor += 1;
                PropKey::Literal(lit, self.pos(start, end))
            }
            Some(NormalToken::LBracket) => {
                self.cursor += 1;
                let key = self.expression()?;
                self.expect(&NormalToken::RBracket)?;
                PropKey::Computed(Box::new(key))
            }
            _ => {
                let id = self.property_name()?;

                // Shorthand property: `{ x }` stands for `{ x: x }`.
                if self.check(&NormalToken::Comma) || self.check(&NormalToken::RBrace) {
                    let value = Expr {
                        id: self.fresh_id(),
                        pos: id.pos,
                        kind: ExprKind::Ident(id),
                    };

                    return Ok(Property {
                        key: PropKey::Ident(id),
                        value,
                        pos: id.pos,
                    });
                }

                PropKey::Ident(id)
            }
        };

        self.expect(&NormalToken::Colon)?;
        let value = self.assignment()?;

        Ok(Property {
            key,
            value,
            pos: self.pos(start, self.prev_end()),
        })
    }

    /// A template literal, starting at its opening backtick.
    fn template(&mut self) -> ParseResult<Template> {
        let start = self.next_start();
        self.expect(&NormalToken::Backtick)?;

        let mut quasis = Vec::new();
        let mut exprs = Vec::new();
        let mut current = String::new();

        loop {
            match self.bump() {
                Some((_, Token::Template(TemplateToken::Literal(s)), _)) => current.push_str(s),
                Some((_, Token::Template(TemplateToken::EscapedChar(c)), _)) => current.push(c),
                Some((_, Token::Template(TemplateToken::Interpolation), _)) => {
                    quasis.push(std::mem::take(&mut current));
                    exprs.push(self.expression()?);
                    self.expect(&NormalToken::RBrace)?;
                }
                Some((_, Token::Template(TemplateToken::Backtick), _)) => {
                    quasis.push(current);
                    break;
                }
                // The lexer only produces template tokens until the closing backtick, and fails
                // if it's missing.
                _ => {
                    self.cursor = self.cursor.saturating_sub(1);
                    return Err(self.unexpected("the end of the template literal"));
                }
            }
        }

        Ok(Template {
            quasis,
            exprs,
            pos: self.pos(start, self.prev_end()),
        })
    }
}
