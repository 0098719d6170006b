//! Internal error types for type inference.
//!
//! There is a hierarchy between error types, from the most local to the most high-level:
//! - [`UnifError`], raised by the unification engine, which only knows about types;
//! - [`InferError`], the error of the constraint generator, which is either a recoverable
//!   [`TypecheckError`] or a fatal [`ScopeError`].
//!
//! A [`UnifError`] is converted at the call site of the unification, where the context (a call,
//! an array literal, ...) is known.
use super::typing::Typing;
use crate::{
    ast::NodeRef,
    error::{ScopeError, TypecheckError},
    typ::{eq, Type},
};

/// Error during unification.
#[derive(Debug, Clone)]
pub enum UnifError {
    /// Two incompatible types met.
    TypeMismatch { left: Type, right: Type },
    /// A record type had more than one row variable.
    MultipleRowVars { record: Type },
}

impl UnifError {
    /// Convert to an inference error without any additional context.
    pub fn into_infer_error(self) -> InferError {
        match self {
            UnifError::TypeMismatch { left, right } => {
                TypecheckError::TypeMismatch { left, right }.into()
            }
            UnifError::MultipleRowVars { record } => ScopeError::MultipleRowVariables {
                pos: record.src.map(|node| node.pos).unwrap_or_default(),
                record,
            }
            .into(),
        }
    }

    /// Convert an error raised while unifying a callee with the arguments of a call. The
    /// responsible argument is the first one whose type originates from the same node as one side
    /// of the mismatch or, failing that, the first one whose type is equal to one side.
    pub fn into_call_error(
        self,
        call: NodeRef,
        callee: NodeRef,
        callee_typing: &Typing,
        arg_typings: &[Typing],
    ) -> InferError {
        match self {
            UnifError::TypeMismatch { left, right } => {
                let same_origin = |typ: &Type| {
                    typ.src.is_some() && (typ.src == left.src || typ.src == right.src)
                };
                let bad_arg_index = arg_typings
                    .iter()
                    .position(|arg| same_origin(&arg.typ))
                    .or_else(|| {
                        arg_typings
                            .iter()
                            .position(|arg| eq(&arg.typ, &left) || eq(&arg.typ, &right))
                    });

                TypecheckError::CallArgument {
                    call,
                    callee,
                    callee_typing: callee_typing.clone(),
                    arg_typings: arg_typings.to_vec(),
                    bad_arg_index,
                    cause: Box::new(TypecheckError::TypeMismatch { left, right }),
                }
                .into()
            }
            err => err.into_infer_error(),
        }
    }

    /// Convert an error raised while unifying the elements of an array literal.
    pub fn into_array_error(self, node: NodeRef, elem_typings: &[Typing]) -> InferError {
        match self {
            UnifError::TypeMismatch { left, right } => TypecheckError::ArrayLiteral {
                node,
                elem_typings: elem_typings.to_vec(),
                cause: Box::new(TypecheckError::TypeMismatch { left, right }),
            }
            .into(),
            err => err.into_infer_error(),
        }
    }
}

/// Error of the constraint generator.
#[derive(Debug, Clone)]
pub enum InferError {
    /// Recoverable: reported alongside the environment built so far.
    Type(TypecheckError),
    /// Fatal: aborts the whole run.
    Scope(ScopeError),
}

impl From<TypecheckError> for InferError {
    fn from(err: TypecheckError) -> Self {
        InferError::Type(err)
    }
}

impl From<ScopeError> for InferError {
    fn from(err: ScopeError) -> Self {
        InferError::Scope(err)
    }
}
