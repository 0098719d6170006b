use std::ops::Range;

use codespan::FileId;

use crate::position::RawSpan;

/// An error raised by the lexer, located by a byte range of the source being lexed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LexicalError {
    /// Generic lexer error.
    Generic(Range<usize>),
    /// A string literal without its closing quote on the same line.
    UnterminatedString(Range<usize>),
    /// A template literal without its closing backtick. The range is the opening backtick.
    UnterminatedTemplate(Range<usize>),
}

/// An error raised by the lexer or the parser.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid token")]
    InvalidToken(RawSpan),
    #[error("unterminated string literal")]
    UnterminatedString(RawSpan),
    #[error("unterminated template literal")]
    UnterminatedTemplate(RawSpan),
    #[error("unexpected token `{found}`, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        span: RawSpan,
    },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String, span: RawSpan },
}

impl ParseError {
    pub fn from_lexical(error: LexicalError, src_id: FileId) -> Self {
        match error {
            LexicalError::Generic(range) => {
                ParseError::InvalidToken(RawSpan::from_range(src_id, range))
            }
            LexicalError::UnterminatedString(range) => {
                ParseError::UnterminatedString(RawSpan::from_range(src_id, range))
            }
            LexicalError::UnterminatedTemplate(range) => {
                ParseError::UnterminatedTemplate(RawSpan::from_range(src_id, range))
            }
        }
    }

    pub fn span(&self) -> RawSpan {
        match self {
            ParseError::InvalidToken(span)
            | ParseError::UnterminatedString(span)
            | ParseError::UnterminatedTemplate(span)
            | ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. } => *span,
        }
    }
}
