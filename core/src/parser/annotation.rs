//! Type annotations, as written in `$assume` pragmas and in tests.
//!
//! The syntax mirrors the way types are printed:
//!
//! ```text
//! Num  Bool  String  Undefined  ()         leaves (`Number` and `Boolean` are accepted too)
//! a  b  elem                               type variables
//! (Num, a) => a                            functions
//! Array(Num)  Map(String, a)  Foo          containers
//! { x: Num, "full name": String }          closed records
//! { ...r, x: Num }                         open records, `r` being a row variable
//! ```
//!
//! Every occurrence of a variable name within an annotation denotes the same variable. Type
//! variables and row variables live in separate namespaces.
use std::{collections::HashMap, str::FromStr};

use indexmap::IndexMap;
use logos::Logos;

use crate::{
    identifier::Ident,
    typ::{eq, NamedVar, RowVar, Type, TypeF, VarKind, VarRef},
};

use super::lexer::unescape;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotationError {
    #[error("invalid character at offset {0}")]
    InvalidToken(usize),
    #[error("unexpected `{found}` at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        offset: usize,
    },
    #[error("unexpected end of annotation, expected {0}")]
    UnexpectedEnd(&'static str),
    #[error("a record type can't have more than one row variable")]
    MultipleRowVariables,
}

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n]+")]
enum AnnotToken<'input> {
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident(&'input str),
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(&lex.slice()[1..lex.slice().len() - 1]))]
    Str(String),
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("=>")]
    FatArrow,
    #[token("...")]
    Ellipsis,
}

impl std::fmt::Display for AnnotToken<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotToken::Ident(id) => write!(f, "{id}"),
            AnnotToken::Str(s) => write!(f, "{s:?}"),
            AnnotToken::LParen => write!(f, "("),
            AnnotToken::RParen => write!(f, ")"),
            AnnotToken::LBrace => write!(f, "{{"),
            AnnotToken::RBrace => write!(f, "}}"),
            AnnotToken::Comma => write!(f, ","),
            AnnotToken::Colon => write!(f, ":"),
            AnnotToken::FatArrow => write!(f, "=>"),
            AnnotToken::Ellipsis => write!(f, "..."),
        }
    }
}

/// A compiled type annotation.
#[derive(Clone, Debug)]
pub struct Annotation {
    typ: Type,
}

impl Annotation {
    pub fn compile(src: &str) -> Result<Self, AnnotationError> {
        let tokens = AnnotToken::lexer(src)
            .spanned()
            .map(|(token, span)| {
                token
                    .map(|token| (token, span.start))
                    .map_err(|()| AnnotationError::InvalidToken(span.start))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut parser = AnnotParser {
            tokens,
            cursor: 0,
            type_vars: HashMap::new(),
            row_vars: HashMap::new(),
        };

        let typ = parser.typ()?;

        match parser.tokens.get(parser.cursor) {
            None => Ok(Annotation { typ }),
            Some((token, offset)) => Err(AnnotationError::UnexpectedToken {
                found: token.to_string(),
                expected: "the end of the annotation",
                offset: *offset,
            }),
        }
    }

    /// The annotated type. Its variables are unbound annotation variables.
    pub fn typ(&self) -> &Type {
        &self.typ
    }

    /// Check whether an inferred type is an instance of this annotation up to the renaming of
    /// variables. Each call starts from unbound variables, so an annotation can be matched
    /// against several types.
    pub fn matches(&self, ty: &Type) -> bool {
        let mut slots: HashMap<(VarKind, Ident), NamedVar> = HashMap::new();

        let pattern = self.typ.map_vars(&mut |kind, var| match var {
            VarRef::Named(named) => VarRef::Named(
                slots
                    .entry((kind, named.name))
                    .or_insert_with(|| NamedVar::new(named.name))
                    .clone(),
            ),
            VarRef::Id(id) => VarRef::Id(*id),
        });

        eq(&pattern, ty)
    }
}

impl FromStr for Annotation {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Annotation::compile(s)
    }
}

impl std::fmt::Display for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.typ)
    }
}

struct AnnotParser<'input> {
    tokens: Vec<(AnnotToken<'input>, usize)>,
    cursor: usize,
    type_vars: HashMap<Ident, NamedVar>,
    row_vars: HashMap<Ident, NamedVar>,
}

impl<'input> AnnotParser<'input> {
    fn peek(&self) -> Option<&AnnotToken<'input>> {
        self.tokens.get(self.cursor).map(|(token, _)| token)
    }

    fn eat(&mut self, expected: &AnnotToken) -> bool {
        if self.peek() == Some(expected) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &'static str) -> AnnotationError {
        match self.tokens.get(self.cursor) {
            Some((token, offset)) => AnnotationError::UnexpectedToken {
                found: token.to_string(),
                expected,
                offset: *offset,
            },
            None => AnnotationError::UnexpectedEnd(expected),
        }
    }

    fn expect(&mut self, expected: &AnnotToken, descr: &'static str) -> Result<(), AnnotationError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(descr))
        }
    }

    fn type_var(&mut self, name: &str) -> Type {
        let name = Ident::from(name);
        let var = self
            .type_vars
            .entry(name)
            .or_insert_with(|| NamedVar::new(name));

        TypeF::Var(VarRef::Named(var.clone())).into()
    }

    fn row_var(&mut self, name: &str) -> RowVar {
        let name = Ident::from(name);
        let var = self
            .row_vars
            .entry(name)
            .or_insert_with(|| NamedVar::new(name));

        RowVar {
            var: VarRef::Named(var.clone()),
            src: None,
        }
    }

    /// A comma-separated list of types, after the opening parenthesis. Consume the closing one.
    fn type_list(&mut self) -> Result<Vec<Type>, AnnotationError> {
        let mut types = Vec::new();

        while !self.eat(&AnnotToken::RParen) {
            types.push(self.typ()?);

            if !self.eat(&AnnotToken::Comma) {
                self.expect(&AnnotToken::RParen, "`)`")?;
                break;
            }
        }

        Ok(types)
    }

    fn typ(&mut self) -> Result<Type, AnnotationError> {
        let token = self.peek().cloned();

        match token {
            Some(AnnotToken::LParen) => {
                self.cursor += 1;
                let mut types = self.type_list()?;

                if self.eat(&AnnotToken::FatArrow) {
                    let range = self.typ()?;
                    Ok(Type::arrow(types, range))
                } else if types.is_empty() {
                    Ok(TypeF::Undefined.into())
                } else if types.len() == 1 {
                    Ok(types.remove(0))
                } else {
                    Err(self.unexpected("`=>`"))
                }
            }
            Some(AnnotToken::LBrace) => {
                self.cursor += 1;
                self.record_rest()
            }
            Some(AnnotToken::Ident(name)) => {
                self.cursor += 1;

                let leaf = match name {
                    "Num" | "Number" => Some(TypeF::Num),
                    "Bool" | "Boolean" => Some(TypeF::Bool),
                    "String" => Some(TypeF::Str),
                    "Undefined" => Some(TypeF::Undefined),
                    _ => None,
                };

                if let Some(leaf) = leaf {
                    return Ok(leaf.into());
                }

                if name.starts_with(|c: char| c.is_ascii_uppercase()) {
                    let args = if self.eat(&AnnotToken::LParen) {
                        self.type_list()?
                    } else {
                        Vec::new()
                    };

                    Ok(Type::con(name, args))
                } else {
                    Ok(self.type_var(name))
                }
            }
            _ => Err(self.unexpected("a type")),
        }
    }

    /// The fields of a record type, after the opening brace. Consume the closing brace.
    fn record_rest(&mut self) -> Result<Type, AnnotationError> {
        let mut fields = IndexMap::new();
        let mut row_var = None;

        while !self.eat(&AnnotToken::RBrace) {
            let token = self.peek().cloned();

            let row_var_name = match &token {
                Some(AnnotToken::Ellipsis) => {
                    self.cursor += 1;
                    match self.peek().cloned() {
                        Some(AnnotToken::Ident(name)) => {
                            self.cursor += 1;
                            Some(name)
                        }
                        _ => return Err(self.unexpected("a row variable")),
                    }
                }
                Some(AnnotToken::Ident(name))
                    if !matches!(
                        self.tokens.get(self.cursor + 1),
                        Some((AnnotToken::Colon, _))
                    ) =>
                {
                    self.cursor += 1;
                    Some(*name)
                }
                _ => None,
            };

            if let Some(name) = row_var_name {
                if row_var.is_some() {
                    return Err(AnnotationError::MultipleRowVariables);
                }
                row_var = Some(self.row_var(name));
            } else {
                let label = match token {
                    Some(AnnotToken::Ident(name)) => Ident::from(name),
                    Some(AnnotToken::Str(s)) => Ident::from(s),
                    _ => return Err(self.unexpected("a label or a row variable")),
                };
                self.cursor += 1;

                self.expect(&AnnotToken::Colon, "`:`")?;
                fields.insert(label, self.typ()?);
            }

            if !self.eat(&AnnotToken::Comma) {
                self.expect(&AnnotToken::RBrace, "`}`")?;
                break;
            }
        }

        Ok(Type::record_of(fields, row_var))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::typ::VarSupply;

    fn roundtrip(src: &str) -> String {
        Annotation::compile(src).unwrap().to_string()
    }

    #[test]
    fn printing_compiled_annotations() {
        assert_eq!(roundtrip("Number"), "Num");
        assert_eq!(roundtrip("()"), "Undefined");
        assert_eq!(roundtrip("((Num))"), "Num");
        assert_eq!(roundtrip("(elem, Boolean) => Array(elem)"), "(elem, Bool) => Array(elem)");
        assert_eq!(roundtrip("Promise"), "Promise");
        assert_eq!(roundtrip("(a) => (b) => a"), "(a) => (b) => a");
        assert_eq!(roundtrip(r#"{ x: Num, "full name": String }"#), r#"{ x: Num, "full name": String }"#);
        assert_eq!(roundtrip("{ ...r, x: Num }"), "{ ...r, x: Num }");
        assert_eq!(roundtrip("{ r, x: Num }"), "{ ...r, x: Num }");
        assert_eq!(roundtrip("{}"), "{}");
    }

    #[test]
    fn variables_are_shared_by_name() {
        let annot = Annotation::compile("(a, b) => a").unwrap();

        let TypeF::Arrow { domain, range } = &annot.typ().typ else {
            panic!("expected an arrow");
        };

        assert_matches!(
            (&domain[0].typ, &domain[1].typ, &range.typ),
            (TypeF::Var(VarRef::Named(a1)), TypeF::Var(VarRef::Named(b)), TypeF::Var(VarRef::Named(a2)))
                if a1.name == a2.name && a1.name != b.name
        );
    }

    #[test]
    fn matching() {
        let mut vars = VarSupply::new();
        let a = vars.fresh_type_var(None);
        let b = vars.fresh_type_var(None);
        let id = Type::arrow(vec![a.clone()], a.clone());
        let konst = Type::arrow(vec![a.clone()], b.clone());

        let annot = Annotation::compile("(x) => x").unwrap();
        assert!(annot.matches(&id));
        assert!(!annot.matches(&konst));
        // Matching doesn't leave any binding behind.
        let other_id = Type::arrow(vec![b.clone()], b);
        assert!(annot.matches(&other_id));

        let num = Annotation::compile("(Num) => Num").unwrap();
        assert!(!num.matches(&id));
        assert!(num.matches(&Type::arrow(vec![TypeF::Num.into()], TypeF::Num.into())));
    }

    #[test]
    fn matching_records() {
        let mut vars = VarSupply::new();
        let r = vars.fresh_row_var(None);
        let fields: IndexMap<Ident, Type> =
            [(Ident::from("x"), Type::from(TypeF::Num))].into_iter().collect();

        let open = Type::record_of(fields.clone(), Some(r));
        let closed = Type::record_of(fields, None);

        let annot = Annotation::compile("{ ...s, x: Num }").unwrap();
        assert!(annot.matches(&open));
        assert!(!annot.matches(&closed));
        assert!(Annotation::compile("{ x: Number }").unwrap().matches(&closed));
    }

    #[test]
    fn errors() {
        assert_matches!(
            Annotation::compile("(Num"),
            Err(AnnotationError::UnexpectedEnd("`)`"))
        );
        assert_matches!(
            Annotation::compile("Num Bool"),
            Err(AnnotationError::UnexpectedToken { offset: 4, .. })
        );
        assert_matches!(
            Annotation::compile("(Num, Bool)"),
            Err(AnnotationError::UnexpectedEnd("`=>`"))
        );
        assert_matches!(Annotation::compile("Num | Bool"), Err(AnnotationError::InvalidToken(4)));
        assert_matches!(
            Annotation::compile("{ ...r, ...s }"),
            Err(AnnotationError::MultipleRowVariables)
        );
    }
}
