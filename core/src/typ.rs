//! Type terms.
//!
//! The type language is made of concrete leaves (`Num`, `Bool`, `String` and `Undefined`),
//! functions, generic containers such as `Array(Num)`, extensible records and unification
//! variables.
//!
//! ## Records and rows
//!
//! A record type is an ordered list of rows. A row is either a concrete set of labels with their
//! types, or a row variable standing for "possibly more fields". Labels are scoped: when the same
//! label appears in several row sets, the one coming last wins. For example:
//!
//! ```text
//! { ...r, x: Num }
//! ```
//!
//! is a record with at least the field `x`, and possibly others described by `r`. Substituting `r`
//! with another record splices the rows of that record in place of `r`.
//!
//! ## Variables
//!
//! Type variables and row variables are identified by a [VarId] drawn from two distinct counters
//! of a [VarSupply]. A variable compiled from a type annotation instead starts without id and with
//! a symbolic name (see [NamedVar]). It receives an id on first contact during an equality
//! comparison with [eq]: this lets an annotation such as `(a) => a` match any inferred identity
//! function, whatever the id of its variable. The binding is one-shot: once bound, the annotation
//! variable only equals the variable it was first compared with.
//!
//! ## Back-references
//!
//! Each type optionally carries a [NodeRef] to the AST node it originates from. It's only used for
//! error reporting and never participates in equality.
//!
//! All the operations defined here return new values. Types are freely shared between typings.
use std::{cell::Cell, collections::HashMap, rc::Rc};

use indexmap::IndexMap;

use crate::{ast::NodeRef, identifier::Ident};

/// The identifier of a type or a row variable.
pub type VarId = usize;

/// Distinguish type variables from row variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarKind {
    Type,
    Row,
}

/// Hands out fresh variable ids. Type variables and row variables use separate counters, and a
/// supply only guarantees uniqueness within itself: each inference run owns its own.
#[derive(Clone, Debug, Default)]
pub struct VarSupply {
    next_type_var: VarId,
    next_row_var: VarId,
}

impl VarSupply {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self, kind: VarKind) -> VarId {
        let counter = match kind {
            VarKind::Type => &mut self.next_type_var,
            VarKind::Row => &mut self.next_row_var,
        };
        let id = *counter;
        *counter += 1;
        id
    }

    /// Create a fresh type variable.
    pub fn fresh_type_var(&mut self, src: Option<NodeRef>) -> Type {
        Type {
            typ: TypeF::Var(VarRef::Id(self.next_id(VarKind::Type))),
            src,
        }
    }

    /// Create a fresh row variable.
    pub fn fresh_row_var(&mut self, src: Option<NodeRef>) -> RowVar {
        RowVar {
            var: VarRef::Id(self.next_id(VarKind::Row)),
            src,
        }
    }
}

/// A variable coming from a type annotation. All the occurrences of the same name in one
/// annotation share the same slot.
#[derive(Clone, Debug)]
pub struct NamedVar {
    pub name: Ident,
    slot: Rc<Cell<Option<VarId>>>,
}

impl NamedVar {
    pub fn new(name: Ident) -> Self {
        NamedVar {
            name,
            slot: Rc::new(Cell::new(None)),
        }
    }

    /// The id this variable has been bound to, if any.
    pub fn bound(&self) -> Option<VarId> {
        self.slot.get()
    }

    fn bind(&self, id: VarId) {
        self.slot.set(Some(id));
    }
}

/// A reference to a variable: either an id, or an annotation variable.
#[derive(Clone, Debug)]
pub enum VarRef {
    Id(VarId),
    Named(NamedVar),
}

impl VarRef {
    /// The id of this variable, or `None` for an unbound annotation variable.
    pub fn id(&self) -> Option<VarId> {
        match self {
            VarRef::Id(id) => Some(*id),
            VarRef::Named(named) => named.bound(),
        }
    }

    /// Compare two variables. If one side is an unbound annotation variable and the other one has
    /// an id, the unbound side is bound to this id and the comparison succeeds.
    fn matches(&self, other: &VarRef) -> bool {
        match (self.id(), other.id()) {
            (Some(id1), Some(id2)) => id1 == id2,
            (None, Some(id)) => self.bind(id),
            (Some(id), None) => other.bind(id),
            (None, None) => match (self, other) {
                (VarRef::Named(v1), VarRef::Named(v2)) => v1.name == v2.name,
                _ => false,
            },
        }
    }

    fn bind(&self, id: VarId) -> bool {
        match self {
            VarRef::Named(named) => {
                named.bind(id);
                true
            }
            VarRef::Id(_) => false,
        }
    }
}

/// A row variable inside a record type.
#[derive(Clone, Debug)]
pub struct RowVar {
    pub var: VarRef,
    pub src: Option<NodeRef>,
}

impl RowVar {
    /// The row variable as a standalone type, as used in constraints and substitutions.
    pub fn to_type(&self) -> Type {
        Type {
            typ: TypeF::RowVar(self.var.clone()),
            src: self.src,
        }
    }
}

/// A row of a record type.
#[derive(Clone, Debug)]
pub enum Row {
    Set(IndexMap<Ident, Type>),
    Var(RowVar),
}

/// The shape of a type.
#[derive(Clone, Debug)]
pub enum TypeF {
    Num,
    Bool,
    Str,
    Undefined,
    Var(VarRef),
    RowVar(VarRef),
    Arrow {
        domain: Vec<Type>,
        range: Box<Type>,
    },
    /// A generic container, such as `Array(Num)`.
    Con {
        name: Ident,
        args: Vec<Type>,
    },
    Record(Vec<Row>),
}

impl TypeF {
    /// Is this a bare type or row variable.
    pub fn is_var(&self) -> bool {
        matches!(self, TypeF::Var(_) | TypeF::RowVar(_))
    }
}

/// A type with an optional back-reference to the node it comes from.
#[derive(Clone, Debug)]
pub struct Type {
    pub typ: TypeF,
    pub src: Option<NodeRef>,
}

impl From<TypeF> for Type {
    fn from(typ: TypeF) -> Self {
        Type { typ, src: None }
    }
}

impl Type {
    pub fn with_src(self, src: NodeRef) -> Self {
        Type {
            src: Some(src),
            ..self
        }
    }

    pub fn arrow(domain: Vec<Type>, range: Type) -> Self {
        TypeF::Arrow {
            domain,
            range: Box::new(range),
        }
        .into()
    }

    pub fn con(name: impl Into<Ident>, args: Vec<Type>) -> Self {
        TypeF::Con {
            name: name.into(),
            args,
        }
        .into()
    }

    pub fn array(elem: Type) -> Self {
        Type::con("Array", vec![elem])
    }

    /// Build a record type from a list of rows, merging adjacent row sets.
    pub fn record(rows: Vec<Row>) -> Self {
        TypeF::Record(merge_rows(rows)).into()
    }

    /// Build a record type with the given fields, closed or open depending on `row_var`.
    pub fn record_of(fields: IndexMap<Ident, Type>, row_var: Option<RowVar>) -> Self {
        let mut rows: Vec<Row> = row_var.into_iter().map(Row::Var).collect();
        rows.push(Row::Set(fields));
        Type::record(rows)
    }

    /// Rebuild this type, replacing every variable (including the row variables of records) with
    /// the result of `f`. The variant of each variable is preserved.
    pub fn map_vars(&self, f: &mut impl FnMut(VarKind, &VarRef) -> VarRef) -> Type {
        let typ = match &self.typ {
            TypeF::Var(v) => TypeF::Var(f(VarKind::Type, v)),
            TypeF::RowVar(v) => TypeF::RowVar(f(VarKind::Row, v)),
            TypeF::Arrow { domain, range } => TypeF::Arrow {
                domain: domain.iter().map(|ty| ty.map_vars(f)).collect(),
                range: Box::new(range.map_vars(f)),
            },
            TypeF::Con { name, args } => TypeF::Con {
                name: *name,
                args: args.iter().map(|ty| ty.map_vars(f)).collect(),
            },
            TypeF::Record(rows) => TypeF::Record(
                rows.iter()
                    .map(|row| match row {
                        Row::Set(fields) => Row::Set(
                            fields
                                .iter()
                                .map(|(label, ty)| (*label, ty.map_vars(f)))
                                .collect(),
                        ),
                        Row::Var(rv) => Row::Var(RowVar {
                            var: f(VarKind::Row, &rv.var),
                            src: rv.src,
                        }),
                    })
                    .collect(),
            ),
            leaf @ (TypeF::Num | TypeF::Bool | TypeF::Str | TypeF::Undefined) => leaf.clone(),
        };

        Type { typ, src: self.src }
    }
}

/// Merge adjacent row sets. Labels of the later set shadow the ones of the earlier set.
fn merge_rows(rows: Vec<Row>) -> Vec<Row> {
    let mut merged: Vec<Row> = Vec::with_capacity(rows.len());

    for row in rows {
        match row {
            Row::Set(fields) => {
                if let Some(Row::Set(prev)) = merged.last_mut() {
                    prev.extend(fields);
                } else {
                    merged.push(Row::Set(fields));
                }
            }
            var @ Row::Var(_) => merged.push(var),
        }
    }

    merged
}

/// The flattened view of a record type: every visible label with its type, and the row variable
/// if the record is open.
#[derive(Clone, Debug)]
pub struct CompressedRecord {
    pub labels: IndexMap<Ident, Type>,
    pub row_var: Option<RowVar>,
}

/// A record type with more than one row variable, which the record algorithm doesn't handle.
#[derive(Clone, Debug)]
pub struct MultipleRowVarsError {
    pub row_vars: Vec<RowVar>,
}

/// Compress the rows of a record into a single label map and at most one row variable. Later rows
/// shadow earlier ones.
pub fn compress(rows: &[Row]) -> Result<CompressedRecord, MultipleRowVarsError> {
    let mut labels = IndexMap::new();
    let mut row_vars = Vec::new();

    for row in rows {
        match row {
            Row::Set(fields) => {
                for (label, ty) in fields {
                    labels.insert(*label, ty.clone());
                }
            }
            Row::Var(rv) => row_vars.push(rv.clone()),
        }
    }

    if row_vars.len() > 1 {
        return Err(MultipleRowVarsError { row_vars });
    }

    Ok(CompressedRecord {
        labels,
        row_var: row_vars.pop(),
    })
}

/// Structural equality. See the module documentation for the special treatment of annotation
/// variables.
pub fn eq(a: &Type, b: &Type) -> bool {
    match (&a.typ, &b.typ) {
        (TypeF::Num, TypeF::Num)
        | (TypeF::Bool, TypeF::Bool)
        | (TypeF::Str, TypeF::Str)
        | (TypeF::Undefined, TypeF::Undefined) => true,
        (TypeF::Var(v1), TypeF::Var(v2)) | (TypeF::RowVar(v1), TypeF::RowVar(v2)) => v1.matches(v2),
        (
            TypeF::Arrow {
                domain: dom1,
                range: range1,
            },
            TypeF::Arrow {
                domain: dom2,
                range: range2,
            },
        ) => {
            dom1.len() == dom2.len()
                && dom1.iter().zip(dom2).all(|(t1, t2)| eq(t1, t2))
                && eq(range1, range2)
        }
        (
            TypeF::Con {
                name: name1,
                args: args1,
            },
            TypeF::Con {
                name: name2,
                args: args2,
            },
        ) => {
            name1 == name2
                && args1.len() == args2.len()
                && args1.iter().zip(args2).all(|(t1, t2)| eq(t1, t2))
        }
        (TypeF::Record(rows1), TypeF::Record(rows2)) => records_eq(rows1, rows2),
        _ => false,
    }
}

fn records_eq(rows1: &[Row], rows2: &[Row]) -> bool {
    let (Ok(rec1), Ok(rec2)) = (compress(rows1), compress(rows2)) else {
        return false;
    };

    let row_vars_eq = match (&rec1.row_var, &rec2.row_var) {
        (Some(rv1), Some(rv2)) => rv1.var.matches(&rv2.var),
        (None, None) => true,
        _ => false,
    };

    row_vars_eq
        && rec1.labels.len() == rec2.labels.len()
        && rec1
            .labels
            .iter()
            .all(|(label, ty)| rec2.labels.get(label).is_some_and(|ty2| eq(ty, ty2)))
}

/// A binding of a variable to a type.
#[derive(Clone, Debug)]
pub struct Substitution {
    /// Always a bare type variable or row variable.
    pub var: Type,
    pub replacement: Type,
}

impl Substitution {
    pub fn new(var: Type, replacement: Type) -> Self {
        debug_assert!(var.typ.is_var());
        Substitution { var, replacement }
    }
}

/// Apply a substitution to a type. The replacement inherits the back-reference of the node it
/// replaces, if any. The replacement itself is not traversed.
pub fn substitute(sub: &Substitution, ty: &Type) -> Type {
    if eq(&sub.var, ty) {
        return Type {
            typ: sub.replacement.typ.clone(),
            src: ty.src.or(sub.replacement.src),
        };
    }

    let typ = match &ty.typ {
        TypeF::Arrow { domain, range } => TypeF::Arrow {
            domain: domain.iter().map(|ty| substitute(sub, ty)).collect(),
            range: Box::new(substitute(sub, range)),
        },
        TypeF::Con { name, args } => TypeF::Con {
            name: *name,
            args: args.iter().map(|ty| substitute(sub, ty)).collect(),
        },
        TypeF::Record(rows) => TypeF::Record(substitute_rows(sub, rows)),
        _ => return ty.clone(),
    };

    Type { typ, src: ty.src }
}

fn substitute_rows(sub: &Substitution, rows: &[Row]) -> Vec<Row> {
    let mut result = Vec::with_capacity(rows.len());

    for row in rows {
        match row {
            Row::Set(fields) => result.push(Row::Set(
                fields
                    .iter()
                    .map(|(label, ty)| (*label, substitute(sub, ty)))
                    .collect(),
            )),
            Row::Var(rv) if eq(&sub.var, &rv.to_type()) => match &sub.replacement.typ {
                TypeF::Record(spliced) => result.extend(spliced.iter().cloned()),
                TypeF::RowVar(var) => result.push(Row::Var(RowVar {
                    var: var.clone(),
                    src: rv.src.or(sub.replacement.src),
                })),
                // A row variable bound to a non-record type is ill-kinded. It can't come out of
                // unification, which only binds row variables to records or row variables.
                _ => result.push(row.clone()),
            },
            Row::Var(_) => result.push(row.clone()),
        }
    }

    merge_rows(result)
}

/// Apply a list of substitutions, in order.
pub fn apply_subs(subs: &[Substitution], ty: &Type) -> Type {
    subs.iter()
        .fold(ty.clone(), |acc, sub| substitute(sub, &acc))
}

/// Key of the cache used by [fresh].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarKey {
    Id(VarKind, VarId),
    Named(VarKind, Ident),
}

/// Map from original variables to their fresh replacement.
pub type FreshCache = HashMap<VarKey, VarId>;

/// Copy a type, replacing every variable with a fresh one. Repeated occurrences of the same
/// variable, within this type or across several calls sharing the same `cache`, are replaced by
/// the same fresh variable. Unbound annotation variables are keyed by name.
pub fn fresh(vars: &mut VarSupply, cache: &mut FreshCache, ty: &Type) -> Type {
    ty.map_vars(&mut |kind, var| {
        let key = match (var.id(), var) {
            (Some(id), _) => VarKey::Id(kind, id),
            (None, VarRef::Named(named)) => VarKey::Named(kind, named.name),
            // `id()` only returns `None` for annotation variables.
            (None, VarRef::Id(id)) => VarKey::Id(kind, *id),
        };

        VarRef::Id(*cache.entry(key).or_insert_with(|| vars.next_id(kind)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(id: VarId) -> Type {
        TypeF::Var(VarRef::Id(id)).into()
    }

    fn named(var: &NamedVar) -> Type {
        TypeF::Var(VarRef::Named(var.clone())).into()
    }

    fn row_var(id: VarId) -> RowVar {
        RowVar {
            var: VarRef::Id(id),
            src: None,
        }
    }

    fn fields(fields: impl IntoIterator<Item = (&'static str, Type)>) -> IndexMap<Ident, Type> {
        fields
            .into_iter()
            .map(|(label, ty)| (Ident::new(label), ty))
            .collect()
    }

    #[test]
    fn eq_is_reflexive_and_symmetric() {
        let ty = Type::arrow(
            vec![var(0), Type::array(TypeF::Num.into())],
            Type::record_of(fields([("x", var(0))]), Some(row_var(0))),
        );
        let other = Type::arrow(vec![var(1)], TypeF::Str.into());

        assert!(eq(&ty, &ty));
        assert!(eq(&other, &other));
        assert!(!eq(&ty, &other));
        assert!(!eq(&other, &ty));
    }

    #[test]
    fn eq_ignores_label_order() {
        let rec1 = Type::record_of(
            fields([("x", TypeF::Num.into()), ("y", TypeF::Str.into())]),
            None,
        );
        let rec2 = Type::record_of(
            fields([("y", TypeF::Str.into()), ("x", TypeF::Num.into())]),
            None,
        );
        let open = Type::record_of(
            fields([("y", TypeF::Str.into()), ("x", TypeF::Num.into())]),
            Some(row_var(3)),
        );

        assert!(eq(&rec1, &rec2));
        assert!(!eq(&rec1, &open));
    }

    #[test]
    fn annotation_variable_binds_once() {
        let a = NamedVar::new(Ident::new("a"));

        assert!(eq(&named(&a), &var(7)));
        assert_eq!(a.bound(), Some(7));
        assert!(eq(&named(&a), &var(7)));
        assert!(!eq(&named(&a), &var(8)));
        assert!(!eq(&var(8), &named(&a)));
    }

    #[test]
    fn annotation_variables_are_shared_within_a_type() {
        let a = NamedVar::new(Ident::new("a"));
        let annot = Type::arrow(vec![named(&a)], named(&a));

        assert!(eq(&annot, &Type::arrow(vec![var(1)], var(1))));

        let b = NamedVar::new(Ident::new("b"));
        let annot = Type::arrow(vec![named(&b)], named(&b));
        assert!(!eq(&annot, &Type::arrow(vec![var(1)], var(2))));
    }

    #[test]
    fn substitute_replaces_exact_matches_only() {
        let sub = Substitution::new(var(0), TypeF::Num.into());
        let ty = Type::arrow(vec![var(0), var(1)], Type::array(var(0)));

        let result = substitute(&sub, &ty);
        assert!(eq(
            &result,
            &Type::arrow(vec![TypeF::Num.into(), var(1)], Type::array(TypeF::Num.into()))
        ));
        // The input is left untouched.
        assert!(eq(&ty, &Type::arrow(vec![var(0), var(1)], Type::array(var(0)))));
    }

    #[test]
    fn substitute_is_idempotent() {
        let sub = Substitution::new(var(0), Type::array(var(1)));
        let ty = Type::record_of(fields([("x", var(0)), ("y", var(2))]), None);

        let once = substitute(&sub, &ty);
        let twice = substitute(&sub, &once);
        assert!(eq(&once, &twice));
    }

    #[test]
    fn substitute_keeps_the_visited_source() {
        use crate::{ast::NodeId, position::TermPos};

        let node = NodeRef {
            id: NodeId(42),
            pos: TermPos::None,
        };
        let sub = Substitution::new(var(0), TypeF::Num.into());
        let result = substitute(&sub, &var(0).with_src(node));

        assert_eq!(result.src, Some(node));
    }

    #[test]
    fn substituting_a_row_variable_splices_rows() {
        let rec = Type::record_of(fields([("x", TypeF::Num.into())]), Some(row_var(0)));
        let sub = Substitution::new(
            row_var(0).to_type(),
            Type::record_of(fields([("y", TypeF::Str.into())]), Some(row_var(1))),
        );

        let result = substitute(&sub, &rec);
        let expected = Type::record_of(
            fields([("x", TypeF::Num.into()), ("y", TypeF::Str.into())]),
            Some(row_var(1)),
        );
        assert!(eq(&result, &expected));

        let TypeF::Record(rows) = &result.typ else {
            panic!("expected a record")
        };
        // The two label sets got merged.
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn later_rows_shadow_earlier_ones() {
        let rec = Type::record(vec![
            Row::Set(fields([("x", TypeF::Num.into())])),
            Row::Var(row_var(0)),
            Row::Set(fields([("x", TypeF::Str.into())])),
        ]);
        let TypeF::Record(rows) = &rec.typ else {
            panic!("expected a record")
        };
        let compressed = compress(rows).unwrap();

        assert!(eq(&compressed.labels[&Ident::new("x")], &TypeF::Str.into()));
        assert!(compressed.row_var.is_some());
    }

    #[test]
    fn compress_rejects_two_row_variables() {
        let rows = vec![Row::Var(row_var(0)), Row::Var(row_var(1))];
        assert!(compress(&rows).is_err());
    }

    #[test]
    fn fresh_shares_the_cache() {
        let mut vars = VarSupply::new();
        // Burn a few ids so fresh variables can't collide with the original ones by accident.
        for _ in 0..10 {
            vars.fresh_type_var(None);
        }
        let mut cache = FreshCache::new();

        let ty1 = fresh(&mut vars, &mut cache, &Type::arrow(vec![var(0)], var(0)));
        let ty2 = fresh(&mut vars, &mut cache, &var(0));

        let TypeF::Arrow { domain, .. } = &ty1.typ else {
            panic!("expected an arrow")
        };
        assert!(eq(&ty1, &Type::arrow(vec![var(10)], var(10))));
        assert!(eq(&domain[0], &ty2));
    }
}
