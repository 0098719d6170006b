//! The lexer, transforming an input string to a stream of tokens.
//!
//! A modal lexer is implemented on top of two [logos](https://github.com/maciejhirsz/logos)
//! lexers in order to support template literals with arbitrary interpolated expressions:
//!
//! ```text
//! `total: ${ sum({ x: 1 }.x) } items`
//! ```
//!
//! Once `${` is encountered, the lexer has to switch back to lexing expressions as usual. But at
//! the end of the interpolated expression, ` items` must be lexed as template text again. Since
//! the interpolated expression is arbitrary, it can contain nested `{` and `}` (here, an object
//! literal), and templates which themselves have interpolated expressions, and so on. This isn't
//! lexable with regular expressions only.
//!
//! The lexer is thus either in *normal* mode or in *template* mode, and maintains a stack of the
//! modes it left. In normal mode, it counts the braces opened since the mode was entered: a closing
//! `}` when the count is zero ends the current interpolated expression, and the lexer goes back to
//! template mode.
use logos::{FilterResult, Logos};
use std::ops::Range;

use super::error::LexicalError;

fn string_literal<'input>(lex: &mut logos::Lexer<'input, NormalToken<'input>>) -> String {
    let slice = lex.slice();
    unescape(&slice[1..slice.len() - 1])
}

/// Skip a block comment, after its opening `/*`. An unterminated comment is an error.
fn block_comment<'input>(
    lex: &mut logos::Lexer<'input, NormalToken<'input>>,
) -> FilterResult<(), ()> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => {
            lex.bump(lex.remainder().len());
            FilterResult::Error(())
        }
    }
}

fn num_literal<'input>(lex: &mut logos::Lexer<'input, NormalToken<'input>>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn hex_literal<'input>(lex: &mut logos::Lexer<'input, NormalToken<'input>>) -> Option<f64> {
    u64::from_str_radix(&lex.slice()[2..], 16)
        .ok()
        .map(|n| n as f64)
}

/// Replace the escape sequences of a string literal by the characters they stand for. An escaped
/// character without special meaning stands for itself.
pub fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }

        match chars.next() {
            Some(escaped) => result.push(escape_char(escaped)),
            None => result.push('\\'),
        }
    }

    result
}

fn escape_char(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'v' => '\u{b}',
        c => c,
    }
}

/// The tokens in normal mode.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum NormalToken<'input> {
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Identifier(&'input str),
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", num_literal)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", num_literal)]
    #[regex(r"0[xX][0-9a-fA-F]+", hex_literal)]
    NumLiteral(f64),
    #[regex(r#""([^"\\\n]|\\.)*""#, string_literal)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, string_literal)]
    StrLiteral(String),
    /// A string literal missing its closing quote. It's shorter than a proper string literal, so
    /// it's only produced when the closing quote is indeed missing.
    #[regex(r#""([^"\\\n]|\\.)*"#)]
    #[regex(r#"'([^'\\\n]|\\.)*"#)]
    UnterminatedStr,

    /// Never produced: block comments are skipped by their callback.
    #[token("/*", block_comment)]
    BlockComment,

    #[token("let")]
    Let,
    #[token("const")]
    Const,
    #[token("var")]
    Var,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("?")]
    QuestionMark,
    #[token("=>")]
    FatArrow,
    #[token("=")]
    Equals,
    #[token("==")]
    DoubleEq,
    #[token("===")]
    TripleEq,
    #[token("!=")]
    NotEq,
    #[token("!==")]
    NotDoubleEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    DoubleStar,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&&")]
    DoubleAnd,
    #[token("||")]
    DoublePipe,
    #[token("!")]
    Bang,
    #[token("`")]
    Backtick,
}

/// Words which can't be used as identifiers.
pub const KEYWORDS: &[&str] = &[
    "let", "const", "var", "return", "if", "else", "while", "true", "false",
];

/// The tokens in template mode.
#[derive(Logos, Debug, PartialEq, Clone)]
pub enum TemplateToken<'input> {
    #[regex(r"[^`$\\]+")]
    // A dollar sign which doesn't start an interpolation is part of the text. It has a lower
    // matching priority than `Interpolation` according to Logos' rules.
    #[token("$")]
    Literal(&'input str),
    #[regex(r"\\(.|\n)", |lex| lex.slice().chars().nth(1).map(escape_char))]
    EscapedChar(char),
    #[token("${")]
    Interpolation,
    #[token("`")]
    Backtick,
}

/// The tokens of the modal lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'input> {
    Normal(NormalToken<'input>),
    Template(TemplateToken<'input>),
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use NormalToken::*;

        let repr = match self {
            Token::Template(TemplateToken::Literal(s)) => return write!(f, "{s}"),
            Token::Template(TemplateToken::EscapedChar(c)) => return write!(f, "\\{c}"),
            Token::Template(TemplateToken::Interpolation) => "${",
            Token::Template(TemplateToken::Backtick) => "`",
            Token::Normal(token) => match token {
                Identifier(id) => return write!(f, "{id}"),
                NumLiteral(n) => return write!(f, "{n}"),
                StrLiteral(s) => return write!(f, "{s:?}"),
                UnterminatedStr => "\"",
                BlockComment => "/*",
                Let => "let",
                Const => "const",
                Var => "var",
                Return => "return",
                If => "if",
                Else => "else",
                While => "while",
                True => "true",
                False => "false",
                LBrace => "{",
                RBrace => "}",
                LBracket => "[",
                RBracket => "]",
                LParen => "(",
                RParen => ")",
                Comma => ",",
                Semicolon => ";",
                Colon => ":",
                Dot => ".",
                Ellipsis => "...",
                QuestionMark => "?",
                FatArrow => "=>",
                Equals => "=",
                DoubleEq => "==",
                TripleEq => "===",
                NotEq => "!=",
                NotDoubleEq => "!==",
                Lt => "<",
                Le => "<=",
                Gt => ">",
                Ge => ">=",
                Plus => "+",
                Minus => "-",
                Star => "*",
                DoubleStar => "**",
                Slash => "/",
                Percent => "%",
                DoubleAnd => "&&",
                DoublePipe => "||",
                Bang => "!",
                Backtick => "`",
            },
        };

        write!(f, "{repr}")
    }
}

pub type SpannedToken<'input> = (usize, Token<'input>, usize);
type NormalLexer<'input> = logos::Lexer<'input, NormalToken<'input>>;
type TemplateLexer<'input> = logos::Lexer<'input, TemplateToken<'input>>;

enum ModalLexer<'input> {
    Normal {
        /// The number of braces opened since this mode was entered.
        brace_count: usize,
        logos_lexer: NormalLexer<'input>,
    },
    Template {
        /// The offset of the opening backtick, for error reporting.
        start: usize,
        logos_lexer: TemplateLexer<'input>,
    },
}

/// A mode left for another one, together with its state, to be restored later.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Mode {
    Normal { brace_count: usize },
    Template { start: usize },
}

pub struct Lexer<'input> {
    // The underlying lexer is taken out during mode switches, which consume it to build the lexer
    // of the new mode. It's only `None` in between, or after an unrecoverable error.
    lexer: Option<ModalLexer<'input>>,
    modes: Vec<Mode>,
}

impl<'input> Lexer<'input> {
    pub fn new(s: &'input str) -> Self {
        Lexer {
            lexer: Some(ModalLexer::Normal {
                brace_count: 0,
                logos_lexer: NormalToken::lexer(s),
            }),
            modes: Vec::new(),
        }
    }

    /// Enter template mode, on an opening backtick.
    fn enter_template(&mut self, start: usize) {
        self.lexer = match self.lexer.take() {
            Some(ModalLexer::Normal {
                brace_count,
                logos_lexer,
            }) => {
                self.modes.push(Mode::Normal { brace_count });
                Some(ModalLexer::Template {
                    start,
                    logos_lexer: logos_lexer.morph(),
                })
            }
            other => other,
        };
    }

    /// Leave template mode, on a closing backtick.
    fn leave_template(&mut self) {
        self.lexer = match (self.lexer.take(), self.modes.last().copied()) {
            (Some(ModalLexer::Template { logos_lexer, .. }), Some(Mode::Normal { brace_count })) => {
                self.modes.pop();
                Some(ModalLexer::Normal {
                    brace_count,
                    logos_lexer: logos_lexer.morph(),
                })
            }
            (other, _) => other,
        };
    }

    /// Enter normal mode, on the `${` starting an interpolated expression.
    fn enter_interpolation(&mut self) {
        self.lexer = match self.lexer.take() {
            Some(ModalLexer::Template { start, logos_lexer }) => {
                self.modes.push(Mode::Template { start });
                Some(ModalLexer::Normal {
                    brace_count: 0,
                    logos_lexer: logos_lexer.morph(),
                })
            }
            other => other,
        };
    }

    /// Go back to template mode, on the `}` closing an interpolated expression.
    fn leave_interpolation(&mut self) {
        self.lexer = match (self.lexer.take(), self.modes.last().copied()) {
            (Some(ModalLexer::Normal { logos_lexer, .. }), Some(Mode::Template { start })) => {
                self.modes.pop();
                Some(ModalLexer::Template {
                    start,
                    logos_lexer: logos_lexer.morph(),
                })
            }
            (other, _) => other,
        };
    }

    /// Update the brace counter on a closing brace. Return `true` if this brace closes the current
    /// interpolated expression.
    fn close_brace(&mut self) -> bool {
        let in_interpolation = matches!(self.modes.last(), Some(Mode::Template { .. }));

        match &mut self.lexer {
            Some(ModalLexer::Normal { brace_count, .. }) if *brace_count > 0 => {
                *brace_count -= 1;
                false
            }
            Some(ModalLexer::Normal { .. }) => in_interpolation,
            _ => false,
        }
    }

    fn open_brace(&mut self) {
        if let Some(ModalLexer::Normal { brace_count, .. }) = &mut self.lexer {
            *brace_count += 1;
        }
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Result<SpannedToken<'input>, LexicalError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (result, span): (Result<Token<'input>, ()>, Range<usize>) =
            match self.lexer.as_mut()? {
                ModalLexer::Normal { logos_lexer, .. } => {
                    let result = logos_lexer.next()?;
                    (result.map(Token::Normal), logos_lexer.span())
                }
                ModalLexer::Template { start, logos_lexer } => match logos_lexer.next() {
                    Some(result) => (result.map(Token::Template), logos_lexer.span()),
                    None => {
                        let start = *start;
                        self.lexer = None;
                        return Some(Err(LexicalError::UnterminatedTemplate(start..start + 1)));
                    }
                },
            };

        let token = match result {
            Ok(token) => token,
            Err(()) => {
                self.lexer = None;
                return Some(Err(LexicalError::Generic(span)));
            }
        };

        match &token {
            Token::Normal(NormalToken::UnterminatedStr) => {
                self.lexer = None;
                return Some(Err(LexicalError::UnterminatedString(span)));
            }
            Token::Normal(NormalToken::Backtick) => self.enter_template(span.start),
            Token::Normal(NormalToken::LBrace) => self.open_brace(),
            Token::Normal(NormalToken::RBrace) => {
                if self.close_brace() {
                    self.leave_interpolation();
                }
            }
            Token::Template(TemplateToken::Interpolation) => self.enter_interpolation(),
            Token::Template(TemplateToken::Backtick) => self.leave_template(),
            _ => (),
        }

        Some(Ok((span.start, token, span.end)))
    }
}
