//! Unification of extensible records, following Leijen's scoped labels.
//!
//! Both records are first [compressed](crate::typ::compress) to a map of labels and an optional row
//! variable. Labels present on both sides must have equal types. A label present on one side only
//! must be provided by the row variable of the other side. The row variables are then bound to the
//! leftovers of the opposite side:
//!
//! ```text
//! { ...r1, x: Num } ~ { ...r2, y: Str }
//!   r1 ~ { ...r3, y: Str }
//!   r2 ~ { ...r3, x: Num }
//! ```
//!
//! where `r3` is a fresh row variable shared by both sides, which keeps the two records open.
use indexmap::IndexMap;
use log::trace;

use super::{error::UnifError, unif::Constraint};
use crate::{
    identifier::Ident,
    typ::{compress, CompressedRecord, Type, TypeF, VarSupply},
};

/// Unify two record types. Returns the constraints to push back onto the worklist.
pub fn unify_records(
    vars: &mut VarSupply,
    left: &Type,
    right: &Type,
) -> Result<Vec<Constraint>, UnifError> {
    let left_rec = compress_record(left)?;
    let right_rec = compress_record(right)?;
    let mismatch = || UnifError::TypeMismatch {
        left: left.clone(),
        right: right.clone(),
    };

    let mut constraints = Vec::new();
    // Labels of the left record that the right row variable must provide, and conversely.
    let mut for_right: IndexMap<Ident, Type> = IndexMap::new();
    let mut for_left: IndexMap<Ident, Type> = IndexMap::new();

    for (label, ty) in &left_rec.labels {
        match right_rec.labels.get(label) {
            Some(right_ty) => constraints.push(Constraint::new(ty.clone(), right_ty.clone())),
            None if right_rec.row_var.is_some() => {
                for_right.insert(*label, ty.clone());
            }
            None => return Err(mismatch()),
        }
    }

    for (label, ty) in &right_rec.labels {
        if left_rec.labels.contains_key(label) {
            continue;
        }

        if left_rec.row_var.is_none() {
            return Err(mismatch());
        }

        for_left.insert(*label, ty.clone());
    }

    match (left_rec.row_var, right_rec.row_var) {
        (Some(left_var), Some(right_var)) => {
            match (for_left.is_empty(), for_right.is_empty()) {
                (false, false) => {
                    let shared = vars.fresh_row_var(None);
                    trace!("records: splitting rows around a fresh row variable");
                    constraints.push(Constraint::new(
                        left_var.to_type(),
                        Type::record_of(for_left, Some(shared.clone())),
                    ));
                    constraints.push(Constraint::new(
                        right_var.to_type(),
                        Type::record_of(for_right, Some(shared)),
                    ));
                }
                (false, true) => constraints.push(Constraint::new(
                    left_var.to_type(),
                    Type::record_of(for_left, None),
                )),
                (true, false) => constraints.push(Constraint::new(
                    right_var.to_type(),
                    Type::record_of(for_right, None),
                )),
                // Same labels on both sides. Unlike the leftover cases, nothing would otherwise
                // relate the two tails, so they are unified with each other: `{ ...r, x: a }` and
                // `{ ...s, x: b }` end up with `r ~ s`.
                (true, true) => {
                    constraints.push(Constraint::new(left_var.to_type(), right_var.to_type()))
                }
            }
        }
        // `for_left` is necessarily empty: a label missing from the left record would have been
        // rejected above.
        (None, Some(right_var)) if !for_right.is_empty() => constraints.push(Constraint::new(
            right_var.to_type(),
            Type::record_of(for_right, None),
        )),
        (Some(left_var), None) if !for_left.is_empty() => constraints.push(Constraint::new(
            left_var.to_type(),
            Type::record_of(for_left, None),
        )),
        _ => (),
    }

    Ok(constraints)
}

fn compress_record(record: &Type) -> Result<CompressedRecord, UnifError> {
    match &record.typ {
        TypeF::Record(rows) => compress(rows).map_err(|_| UnifError::MultipleRowVars {
            record: record.clone(),
        }),
        _ => Err(UnifError::TypeMismatch {
            left: record.clone(),
            right: record.clone(),
        }),
    }
}
