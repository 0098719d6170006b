//! Pretty-printing of types.
//!
//! Variables don't have meaningful names internally, only numeric ids. They are given names in
//! order of appearance: `a`, `b`, `c`... for type variables and `r`, `s`, `t`... for row
//! variables. The naming is stored in the [Allocator], so that several types rendered with the
//! same allocator (say, the two sides of a type mismatch) name the same variable the same way.
//! Annotation variables which haven't been bound yet keep the name written by the user.
use std::{cell::RefCell, collections::HashMap, fmt};

use indexmap::IndexMap;
use pretty::docs;
pub use pretty::{DocAllocator, DocBuilder, Pretty};

use crate::{
    identifier::{is_valid_identifier, Ident},
    typ::{Row, Type, TypeF, VarId, VarKind, VarRef},
};

/// The maximum width of the output before the pretty-printer starts breaking lines.
pub const WIDTH: usize = 80;

const TYPE_VAR_LETTERS: &[u8] = b"abcdefghijklmnopq";
const ROW_VAR_LETTERS: &[u8] = b"rstuvwxyz";

/// Names given to the variables encountered so far.
#[derive(Debug, Default)]
pub struct NameReg {
    type_vars: HashMap<VarId, String>,
    row_vars: HashMap<VarId, String>,
}

impl NameReg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the name of a variable, generating a new one if this variable hasn't been seen yet.
    pub fn name(&mut self, kind: VarKind, var: &VarRef) -> String {
        let id = match (var.id(), var) {
            (Some(id), _) => id,
            (None, VarRef::Named(named)) => return named.name.to_string(),
            (None, VarRef::Id(id)) => *id,
        };

        let (names, letters) = match kind {
            VarKind::Type => (&mut self.type_vars, TYPE_VAR_LETTERS),
            VarKind::Row => (&mut self.row_vars, ROW_VAR_LETTERS),
        };

        let count = names.len();
        names
            .entry(id)
            .or_insert_with(|| gen_name(letters, count))
            .clone()
    }
}

/// Generate the `index`-th name out of `letters`, adding a numeric suffix once all the letters
/// have been used: `a`, ..., `q`, `a1`, ..., `q1`, `a2`, ...
fn gen_name(letters: &[u8], index: usize) -> String {
    let letter = char::from(letters[index % letters.len()]);

    match index / letters.len() {
        0 => letter.to_string(),
        suffix => format!("{letter}{suffix}"),
    }
}

/// Return the label as is if it's a valid identifier, or quoted otherwise.
pub fn ident_quoted(ident: impl Into<Ident>) -> String {
    let ident = ident.into();
    let label = ident.label();

    if is_valid_identifier(label) {
        label.to_owned()
    } else {
        format!("{label:?}")
    }
}

/// The allocator used to build the documents. It carries the naming of variables.
pub struct Allocator {
    inner: pretty::BoxAllocator,
    names: RefCell<NameReg>,
}

impl Default for Allocator {
    fn default() -> Self {
        Self {
            inner: pretty::BoxAllocator,
            names: RefCell::new(NameReg::new()),
        }
    }
}

impl Allocator {
    /// Render a type to a string. Variables are named consistently across all the types rendered
    /// with the same allocator.
    pub fn render(&self, typ: &Type) -> String {
        Rendered {
            allocator: self,
            typ,
        }
        .to_string()
    }

    fn var_name(&self, kind: VarKind, var: &VarRef) -> String {
        self.names.borrow_mut().name(kind, var)
    }

    fn comma_list<'a, I>(&'a self, docs: I) -> DocBuilder<'a, Self>
    where
        I: IntoIterator<Item = DocBuilder<'a, Self>>,
    {
        self.intersperse(docs, docs![self, ",", self.line()])
    }

    fn record_type<'a>(&'a self, rows: &[Row]) -> DocBuilder<'a, Self> {
        let mut row_vars = Vec::new();
        let mut fields: IndexMap<Ident, &Type> = IndexMap::new();

        for row in rows {
            match row {
                Row::Set(set) => fields.extend(set.iter().map(|(label, typ)| (*label, typ))),
                Row::Var(rv) => row_vars.push(&rv.var),
            }
        }

        if row_vars.is_empty() && fields.is_empty() {
            return self.text("{}");
        }

        let row_vars = row_vars
            .into_iter()
            .map(|var| self.text(format!("...{}", self.var_name(VarKind::Row, var))));
        let fields = fields
            .into_iter()
            .map(|(label, typ)| docs![self, ident_quoted(label), ":", self.space(), typ]);

        docs![self, self.line(), self.comma_list(row_vars.chain(fields))]
            .nest(2)
            .append(self.line())
            .braces()
            .group()
    }
}

impl<'a> DocAllocator<'a> for Allocator {
    type Doc = pretty::BoxDoc<'a>;

    fn alloc(&'a self, doc: pretty::Doc<'a, Self::Doc>) -> Self::Doc {
        self.inner.alloc(doc)
    }

    fn alloc_column_fn(
        &'a self,
        f: impl Fn(usize) -> Self::Doc + 'a,
    ) -> <Self::Doc as pretty::DocPtr<'a, ()>>::ColumnFn {
        self.inner.alloc_column_fn(f)
    }

    fn alloc_width_fn(
        &'a self,
        f: impl Fn(isize) -> Self::Doc + 'a,
    ) -> <Self::Doc as pretty::DocPtr<'a, ()>>::WidthFn {
        self.inner.alloc_width_fn(f)
    }
}

impl<'a> Pretty<'a, Allocator> for &Type {
    fn pretty(self, allocator: &'a Allocator) -> DocBuilder<'a, Allocator> {
        match &self.typ {
            TypeF::Num => allocator.text("Num"),
            TypeF::Bool => allocator.text("Bool"),
            TypeF::Str => allocator.text("String"),
            TypeF::Undefined => allocator.text("Undefined"),
            TypeF::Var(var) => allocator.text(allocator.var_name(VarKind::Type, var)),
            TypeF::RowVar(var) => allocator.text(allocator.var_name(VarKind::Row, var)),
            TypeF::Arrow { domain, range } => docs![
                allocator,
                allocator
                    .comma_list(domain.iter().map(|typ| typ.pretty(allocator)))
                    .nest(2)
                    .parens(),
                allocator.space(),
                "=>",
                allocator.line(),
                range.as_ref()
            ]
            .group(),
            TypeF::Con { name, args } if args.is_empty() => allocator.text(name.to_string()),
            TypeF::Con { name, args } => docs![
                allocator,
                name.to_string(),
                allocator
                    .comma_list(args.iter().map(|typ| typ.pretty(allocator)))
                    .nest(2)
                    .parens()
            ]
            .group(),
            TypeF::Record(rows) => allocator.record_type(rows),
        }
    }
}

struct Rendered<'a> {
    allocator: &'a Allocator,
    typ: &'a Type,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doc: DocBuilder<'_, Allocator, ()> = self.typ.pretty(self.allocator);
        doc.render_fmt(WIDTH, f)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let allocator = Allocator::default();
        let doc: DocBuilder<'_, Allocator, ()> = self.pretty(&allocator);
        doc.render_fmt(WIDTH, f)
    }
}
