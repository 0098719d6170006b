//! Error types and error reporting.
//!
//! Define the error types of the different phases (parsing, scoping and type inference), together
//! with functions to generate a [codespan](https://crates.io/crates/codespan-reporting) diagnostic
//! from them.
pub use codespan::{FileId, Files};
pub use codespan_reporting::diagnostic::{Diagnostic, Label, LabelStyle};

use crate::{
    ast::NodeRef,
    identifier::{Ident, LocIdent},
    position::{RawSpan, TermPos},
    pretty::Allocator,
    typ::{compress, Type, TypeF},
    typecheck::Typing,
};

pub use crate::parser::error::ParseError;

pub mod report;
pub mod suggest;

/// A general error occurring during parsing or type inference.
#[derive(Debug, Clone)]
pub enum Error {
    ParseError(ParseError),
    ScopeError(ScopeError),
    TypecheckError(TypecheckError),
    IOError(IOError),
}

/// A recoverable type error. Inference stops at the first one, but the environment built so far
/// is still returned.
#[derive(Debug, Clone)]
pub enum TypecheckError {
    /// Two types which should have been equal aren't.
    TypeMismatch { left: Type, right: Type },
    /// The callee of a call can't accept the arguments.
    CallArgument {
        /// The call expression.
        call: NodeRef,
        /// The callee expression.
        callee: NodeRef,
        callee_typing: Typing,
        arg_typings: Vec<Typing>,
        /// The index of the first argument whose type is one side of the underlying mismatch, if
        /// any.
        bad_arg_index: Option<usize>,
        cause: Box<TypecheckError>,
    },
    /// The elements of an array literal don't have a common type.
    ArrayLiteral {
        node: NodeRef,
        elem_typings: Vec<Typing>,
        cause: Box<TypecheckError>,
    },
    /// Accessed a property which a closed record doesn't have.
    NoSuchProperty {
        node: NodeRef,
        record: Type,
        label: LocIdent,
    },
    /// Accessed a property on something which isn't an object.
    NotAnObject {
        node: NodeRef,
        typ: Type,
        label: LocIdent,
    },
}

/// A fatal error: the program uses an unknown name, redefines one, or uses syntax outside of the
/// supported subset.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScopeError {
    #[error("unbound identifier `{id}`")]
    UnboundIdentifier {
        id: LocIdent,
        /// The names visible at this point, for suggestions.
        in_scope: Vec<Ident>,
    },
    #[error("`{id}` is already defined in this scope")]
    AlreadyDefined { id: LocIdent, previous: TermPos },
    #[error("unsupported syntax: {description}")]
    UnsupportedSyntax { description: String, pos: TermPos },
    #[error("duplicate property `{label}` in object literal")]
    DuplicateLabel { label: LocIdent, previous: TermPos },
    #[error("object keys must be identifiers, strings or numbers")]
    InvalidObjectKey { pos: TermPos },
    #[error("invalid assumption: {message}")]
    InvalidAssumption { message: String, pos: TermPos },
    #[error("record type with more than one row variable")]
    MultipleRowVariables { pos: TermPos, record: Type },
}

/// An error occurring while reading a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IOError(pub String);

impl From<std::io::Error> for IOError {
    fn from(error: std::io::Error) -> IOError {
        IOError(error.to_string())
    }
}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Error {
        Error::ParseError(error)
    }
}

impl From<ScopeError> for Error {
    fn from(error: ScopeError) -> Error {
        Error::ScopeError(error)
    }
}

impl From<TypecheckError> for Error {
    fn from(error: TypecheckError) -> Error {
        Error::TypecheckError(error)
    }
}

impl From<IOError> for Error {
    fn from(error: IOError) -> Error {
        Error::IOError(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::IOError(error.into())
    }
}

/// A trait for converting an error to a diagnostic.
pub trait IntoDiagnostics {
    /// Convert an error to a list of printable formatted diagnostics.
    ///
    /// `files` is mutable for the sake of [label_alt]: a type which doesn't correspond to any
    /// position in the sources is added as a snippet of its own, so that it can still be pointed
    /// at.
    fn into_diagnostics(self, files: &mut Files<String>) -> Vec<Diagnostic<FileId>>;
}

impl IntoDiagnostics for Diagnostic<FileId> {
    fn into_diagnostics(self, _files: &mut Files<String>) -> Vec<Diagnostic<FileId>> {
        vec![self]
    }
}

/// The name of the snippets added by [label_alt].
pub const UNKNOWN_SOURCE_NAME: &str = "<unknown> (generated by type inference)";

/// Create a primary label from a span.
fn primary(span: &RawSpan) -> Label<FileId> {
    Label::primary(span.src_id, span.to_range())
}

/// Create a secondary label from a span.
fn secondary(span: &RawSpan) -> Label<FileId> {
    Label::secondary(span.src_id, span.to_range())
}

/// Create a label from an optional position, or fall back to annotating the text `alt` if the
/// position is `None`. The fallback snippet is added to `files`.
fn label_alt(
    pos: TermPos,
    alt: String,
    style: LabelStyle,
    files: &mut Files<String>,
) -> Label<FileId> {
    match pos.into_opt() {
        Some(span) => Label::new(style, span.src_id, span.to_range()),
        None => {
            let range = 0..alt.len();
            Label::new(style, files.add(UNKNOWN_SOURCE_NAME, alt), range)
        }
    }
}

fn pos_of(typ: &Type) -> TermPos {
    typ.src.map(|node| node.pos).unwrap_or_default()
}

fn cardinal(number: usize) -> String {
    let suffix = match (number % 10, number % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{number}{suffix}")
}

fn mk_expected_msg(expected: &str) -> String {
    format!("Expected an expression of type `{expected}`")
}

fn mk_inferred_msg(inferred: &str) -> String {
    format!("Found an expression of type `{inferred}`")
}

impl IntoDiagnostics for Error {
    fn into_diagnostics(self, files: &mut Files<String>) -> Vec<Diagnostic<FileId>> {
        match self {
            Error::ParseError(err) => err.into_diagnostics(files),
            Error::ScopeError(err) => err.into_diagnostics(files),
            Error::TypecheckError(err) => err.into_diagnostics(files),
            Error::IOError(err) => err.into_diagnostics(files),
        }
    }
}

impl IntoDiagnostics for ParseError {
    fn into_diagnostics(self, _files: &mut Files<String>) -> Vec<Diagnostic<FileId>> {
        let span = self.span();
        let notes = match &self {
            ParseError::UnterminatedTemplate(_) => {
                vec![String::from("Template literals are closed by a backtick (`)")]
            }
            _ => Vec::new(),
        };

        vec![Diagnostic::error()
            .with_message(self.to_string())
            .with_labels(vec![primary(&span)])
            .with_notes(notes)]
    }
}

impl IntoDiagnostics for IOError {
    fn into_diagnostics(self, _files: &mut Files<String>) -> Vec<Diagnostic<FileId>> {
        vec![Diagnostic::error().with_message(self.0)]
    }
}

impl IntoDiagnostics for ScopeError {
    fn into_diagnostics(self, _files: &mut Files<String>) -> Vec<Diagnostic<FileId>> {
        let message = self.to_string();
        let mut labels = Vec::new();
        let mut notes = Vec::new();

        match self {
            ScopeError::UnboundIdentifier { id, in_scope } => {
                if let Some(span) = id.pos.as_opt_ref() {
                    labels.push(primary(span).with_message("this identifier is unbound"));
                }

                let candidates: Vec<&str> = in_scope.iter().map(Ident::label).collect();
                suggest::add_suggestion(&mut notes, &candidates, id.label());
            }
            ScopeError::AlreadyDefined { id, previous } => {
                if let Some(span) = id.pos.as_opt_ref() {
                    labels.push(primary(span).with_message("redefined here"));
                }
                if let Some(span) = previous.as_opt_ref() {
                    labels.push(secondary(span).with_message("previously defined here"));
                }
                notes.push(String::from(
                    "A name can only be bound once per scope. Shadowing is allowed in nested \
                    functions.",
                ));
            }
            ScopeError::UnsupportedSyntax { pos, .. } => {
                if let Some(span) = pos.as_opt_ref() {
                    labels.push(primary(span));
                }
                notes.push(String::from(
                    "Only `let` bindings, expression statements and `return` are supported, with \
                    a subset of JavaScript expressions.",
                ));
            }
            ScopeError::DuplicateLabel { label, previous } => {
                if let Some(span) = label.pos.as_opt_ref() {
                    labels.push(primary(span).with_message("duplicate property"));
                }
                if let Some(span) = previous.as_opt_ref() {
                    labels.push(secondary(span).with_message("first defined here"));
                }
            }
            ScopeError::InvalidObjectKey { pos } => {
                if let Some(span) = pos.as_opt_ref() {
                    labels.push(primary(span).with_message("computed key"));
                }
                notes.push(String::from(
                    "The type of an object must be known statically: computed keys aren't \
                    supported.",
                ));
            }
            ScopeError::InvalidAssumption { pos, .. } => {
                if let Some(span) = pos.as_opt_ref() {
                    labels.push(primary(span));
                }
                notes.push(String::from(
                    "An assumption has the form $assume`name: Type`, for example \
                    $assume`parseInt: (String) => Num`.",
                ));
            }
            ScopeError::MultipleRowVariables { pos, record } => {
                if let Some(span) = pos.as_opt_ref() {
                    labels.push(primary(span));
                }
                notes.push(format!("The record type is `{record}`"));
            }
        }

        vec![Diagnostic::error()
            .with_message(message)
            .with_labels(labels)
            .with_notes(notes)]
    }
}

impl IntoDiagnostics for TypecheckError {
    fn into_diagnostics(self, files: &mut Files<String>) -> Vec<Diagnostic<FileId>> {
        // All the types of one diagnostic are rendered with the same allocator, so that a
        // variable is named the same way everywhere.
        let allocator = Allocator::default();

        match self {
            TypecheckError::TypeMismatch { left, right } => {
                let left_str = allocator.render(&left);
                let right_str = allocator.render(&right);

                vec![Diagnostic::error()
                    .with_message("incompatible types")
                    .with_labels(mismatch_labels(&allocator, &left, &right))
                    .with_notes(vec![
                        mk_expected_msg(&left_str),
                        mk_inferred_msg(&right_str),
                        String::from("These types are not compatible"),
                    ])]
            }
            TypecheckError::CallArgument {
                call,
                callee,
                callee_typing,
                arg_typings,
                bad_arg_index,
                cause,
            } => {
                let callee_str = allocator.render(&callee_typing.typ);
                let mut labels = Vec::new();

                match bad_arg_index.and_then(|index| Some((index, arg_typings.get(index)?))) {
                    Some((index, arg)) => {
                        labels.push(label_alt(
                            pos_of(&arg.typ),
                            allocator.render(&arg.typ),
                            LabelStyle::Primary,
                            files,
                        ).with_message(format!(
                            "the {} argument has type `{}`",
                            cardinal(index + 1),
                            allocator.render(&arg.typ)
                        )));
                    }
                    None => {
                        if let Some(span) = call.pos.as_opt_ref() {
                            labels.push(primary(span).with_message("this call"));
                        }
                    }
                }

                if let Some(span) = callee.pos.as_opt_ref() {
                    labels.push(
                        secondary(span).with_message(format!("this function has type `{callee_str}`")),
                    );
                }

                let args = arg_typings
                    .iter()
                    .map(|arg| allocator.render(&arg.typ))
                    .collect::<Vec<_>>()
                    .join(", ");

                let mut notes = vec![format!(
                    "The function of type `{callee_str}` was called with arguments of type \
                    `({args})`"
                )];
                notes.extend(cause_notes(&allocator, *cause));

                vec![Diagnostic::error()
                    .with_message("function called with incompatible arguments")
                    .with_labels(labels)
                    .with_notes(notes)]
            }
            TypecheckError::ArrayLiteral {
                node,
                elem_typings,
                cause,
            } => {
                let mut labels: Vec<_> = node
                    .pos
                    .as_opt_ref()
                    .map(|span| primary(span).with_message("in this array"))
                    .into_iter()
                    .collect();

                labels.extend(elem_typings.iter().filter_map(|elem| {
                    pos_of(&elem.typ).as_opt_ref().map(|span| {
                        secondary(span)
                            .with_message(format!("has type `{}`", allocator.render(&elem.typ)))
                    })
                }));

                let mut notes =
                    vec![String::from("All the elements of an array must have the same type")];
                notes.extend(cause_notes(&allocator, *cause));

                vec![Diagnostic::error()
                    .with_message("array elements have incompatible types")
                    .with_labels(labels)
                    .with_notes(notes)]
            }
            TypecheckError::NoSuchProperty {
                node,
                record,
                label,
            } => {
                let record_str = allocator.render(&record);
                let pos = label.pos.or(node.pos);
                let labels = pos
                    .as_opt_ref()
                    .map(|span| {
                        vec![primary(span).with_message(format!("`{label}` is not a property of this object"))]
                    })
                    .unwrap_or_default();

                let mut notes = vec![format!("The object has type `{record_str}`")];

                if let TypeF::Record(rows) = &record.typ {
                    if let Ok(compressed) = compress(rows) {
                        let candidates: Vec<&str> =
                            compressed.labels.keys().map(Ident::label).collect();
                        suggest::add_suggestion(&mut notes, &candidates, label.label());
                    }
                }

                vec![Diagnostic::error()
                    .with_message(format!("missing property `{label}`"))
                    .with_labels(labels)
                    .with_notes(notes)]
            }
            TypecheckError::NotAnObject { node, typ, label } => {
                let labels = node
                    .pos
                    .as_opt_ref()
                    .map(|span| vec![primary(span).with_message("this property access")])
                    .unwrap_or_default();

                vec![Diagnostic::error()
                    .with_message(format!("property `{label}` accessed on a non-object"))
                    .with_labels(labels)
                    .with_notes(vec![format!(
                        "The accessed expression has type `{}`, which isn't an object type",
                        allocator.render(&typ)
                    )])]
            }
        }
    }
}

/// Label both sides of a mismatch, when they have a position.
fn mismatch_labels(allocator: &Allocator, left: &Type, right: &Type) -> Vec<Label<FileId>> {
    let mut labels = Vec::new();

    if let Some(span) = pos_of(left).as_opt_ref() {
        labels.push(primary(span).with_message(format!("this has type `{}`", allocator.render(left))));
    }

    if let Some(span) = pos_of(right).as_opt_ref() {
        labels.push(
            secondary(span).with_message(format!("this has type `{}`", allocator.render(right))),
        );
    }

    labels
}

/// Notes describing the underlying cause of a contextual error.
fn cause_notes(allocator: &Allocator, cause: TypecheckError) -> Vec<String> {
    match cause {
        TypecheckError::TypeMismatch { left, right } => vec![
            mk_expected_msg(&allocator.render(&left)),
            mk_inferred_msg(&allocator.render(&right)),
        ],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeId;

    #[test]
    fn cardinals() {
        assert_eq!(cardinal(1), "1st");
        assert_eq!(cardinal(2), "2nd");
        assert_eq!(cardinal(3), "3rd");
        assert_eq!(cardinal(4), "4th");
        assert_eq!(cardinal(11), "11th");
        assert_eq!(cardinal(22), "22nd");
    }

    #[test]
    fn unbound_identifier_suggests_a_name() {
        let err = ScopeError::UnboundIdentifier {
            id: LocIdent::new("pioint"),
            in_scope: vec![Ident::new("point"), Ident::new("id")],
        };

        let diags = err.into_diagnostics(&mut Files::new());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "unbound identifier `pioint`");
        assert!(diags[0].notes.iter().any(|note| note.contains("`point`")));
    }

    #[test]
    fn positionless_argument_is_shown_as_a_snippet() {
        let node = NodeRef {
            id: NodeId(0),
            pos: TermPos::None,
        };
        let err = TypecheckError::CallArgument {
            call: node,
            callee: node,
            callee_typing: Typing::closed(Type::arrow(vec![TypeF::Num.into()], TypeF::Num.into())),
            arg_typings: vec![Typing::closed(TypeF::Str.into())],
            bad_arg_index: Some(0),
            cause: Box::new(TypecheckError::TypeMismatch {
                left: TypeF::Num.into(),
                right: TypeF::Str.into(),
            }),
        };

        let mut files = Files::new();
        let diags = err.into_diagnostics(&mut files);

        assert_eq!(diags[0].labels.len(), 1);
        assert_eq!(
            files.source(diags[0].labels[0].file_id).as_str(),
            "String"
        );
        assert!(diags[0]
            .notes
            .contains(&String::from("Expected an expression of type `Num`")));
    }
}
