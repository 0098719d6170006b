//! Define types of positions and position spans.
//!
//! The positions defined in this module are represented by the id of the corresponding source and
//! raw byte indices. They are prefixed with Raw to differentiate them from codespan's types and
//! indicate that they do not store human friendly data like lines and columns. Use
//! [RawSpan::location] to recover those from the file database.
use codespan::{ByteIndex, FileId, Files};
use serde::Serialize;
use std::{
    cmp::{max, min},
    ops::Range,
};

/// A position span identified by a starting byte offset and an ending byte offset in a file.
///
/// `end` is the offset of the last character plus one.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct RawSpan {
    pub src_id: FileId,
    pub start: ByteIndex,
    pub end: ByteIndex,
}

impl RawSpan {
    /// Fuse two spans if they are from the same source file. The resulting span is the smallest
    /// span that contain both `self` and `other`.
    pub fn fuse(self, other: RawSpan) -> Option<RawSpan> {
        if self.src_id == other.src_id {
            Some(RawSpan {
                src_id: self.src_id,
                start: min(self.start, other.start),
                end: max(self.end, other.end),
            })
        } else {
            None
        }
    }

    /// Create a span from a numeric range. If either start or end is too large to be represented,
    /// `u32::MAX` is used instead.
    pub fn from_range<T>(src_id: FileId, range: Range<T>) -> Self
    where
        u32: TryFrom<T>,
    {
        RawSpan {
            src_id,
            start: ByteIndex(u32::try_from(range.start).unwrap_or(u32::MAX)),
            end: ByteIndex(u32::try_from(range.end).unwrap_or(u32::MAX)),
        }
    }

    /// Convert this span to a `usize` range, as expected by codespan labels.
    pub fn to_range(self) -> Range<usize> {
        self.start.to_usize()..self.end.to_usize()
    }

    /// Resolve the human friendly location of this span: source name, line and column range.
    /// Lines and columns are 1-based. Returns `None` if the span doesn't belong to `files`.
    pub fn location(&self, files: &Files<String>) -> Option<SourceLocation> {
        let start = files.location(self.src_id, self.start).ok()?;
        let end = files.location(self.src_id, self.end).ok()?;

        Some(SourceLocation {
            source: files.name(self.src_id).to_string_lossy().into_owned(),
            line: start.line.to_usize() + 1,
            start_column: start.column.to_usize() + 1,
            end_line: end.line.to_usize() + 1,
            end_column: end.column.to_usize() + 1,
        })
    }
}

impl From<RawSpan> for codespan::Span {
    fn from(span: RawSpan) -> Self {
        codespan::Span::new(span.start, span.end)
    }
}

/// A resolved, human friendly location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub source: String,
    pub line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.start_column)
    }
}

/// The position span of a node.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum TermPos {
    /// The node exactly corresponds to an original expression in the source.
    Original(RawSpan),
    /// The node couldn't be assigned a position (usually built programmatically, or compiled from
    /// an annotation).
    #[default]
    None,
}

impl TermPos {
    /// Apply a transformation to the inner position, if any.
    pub fn map<F: FnOnce(RawSpan) -> RawSpan>(self, f: F) -> Self {
        match self {
            TermPos::Original(x) => TermPos::Original(f(x)),
            TermPos::None => TermPos::None,
        }
    }

    pub fn as_opt_ref(&self) -> Option<&RawSpan> {
        match self {
            TermPos::Original(pos) => Some(pos),
            TermPos::None => None,
        }
    }

    pub fn into_opt(self) -> Option<RawSpan> {
        match self {
            TermPos::Original(pos) => Some(pos),
            TermPos::None => None,
        }
    }

    /// Return `self` if `self` not [Self::None], or `other` otherwise.
    pub fn or(self, other: Self) -> Self {
        if let TermPos::None = self {
            other
        } else {
            self
        }
    }

    /// Fuse two positions if they are both defined and in the same file. Return the defined one
    /// if only one of them is.
    pub fn fuse(self, other: Self) -> Self {
        match (self, other) {
            (TermPos::Original(sp1), TermPos::Original(sp2)) => sp1
                .fuse(sp2)
                .map(TermPos::Original)
                .unwrap_or(TermPos::Original(sp1)),
            (TermPos::None, pos) | (pos, TermPos::None) => pos,
        }
    }
}
