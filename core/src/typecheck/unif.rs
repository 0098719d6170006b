//! The unification engine.
//!
//! Unification works on a worklist of [Constraint]s. Solving a constraint either discards it, binds
//! a variable, or decomposes it into smaller constraints that are pushed back onto the same
//! worklist. Bindings are applied eagerly to every remaining constraint, so a variable never
//! appears in the worklist once it has been bound. The output is the ordered list of
//! [Substitution]s performed, to be applied in order with [crate::typ::apply_subs].
//!
//! There is no occurs check: binding a variable to a type containing it is accepted. Since a
//! substitution never traverses its own replacement, this terminates, but the resulting type is
//! cyclic in spirit.
use std::collections::VecDeque;

use indexmap::IndexMap;
use log::trace;

use super::{error::UnifError, record, typing::MonoEnv};
use crate::{
    identifier::Ident,
    typ::{eq, substitute, Substitution, Type, TypeF, VarSupply},
};

/// A pending obligation that two types be made equal.
#[derive(Clone, Debug)]
pub struct Constraint {
    pub left: Type,
    pub right: Type,
}

impl Constraint {
    pub fn new(left: Type, right: Type) -> Self {
        Constraint { left, right }
    }

    fn substitute(&self, sub: &Substitution) -> Constraint {
        Constraint {
            left: substitute(sub, &self.left),
            right: substitute(sub, &self.right),
        }
    }
}

/// Solve a list of constraints.
pub fn unify(
    vars: &mut VarSupply,
    constraints: Vec<Constraint>,
) -> Result<Vec<Substitution>, UnifError> {
    let mut worklist = VecDeque::from(constraints);
    let mut subs = Vec::new();

    while let Some(Constraint { left, right }) = worklist.pop_front() {
        // Normalize a lone variable to the left.
        let (left, right) = if right.typ.is_var() && !left.typ.is_var() {
            (right, left)
        } else {
            (left, right)
        };

        if eq(&left, &right) {
            continue;
        }

        if left.typ.is_var() {
            let sub = Substitution::new(left, right);
            trace!("unify: bind {} := {}", sub.var, sub.replacement);

            for constr in worklist.iter_mut() {
                *constr = constr.substitute(&sub);
            }
            subs.push(sub);
            continue;
        }

        let decomposed = match (&left.typ, &right.typ) {
            (
                TypeF::Arrow {
                    domain: dom1,
                    range: range1,
                },
                TypeF::Arrow {
                    domain: dom2,
                    range: range2,
                },
            ) if dom1.len() == dom2.len() => {
                let mut constrs = vec![Constraint::new((**range1).clone(), (**range2).clone())];
                constrs.extend(
                    dom1.iter()
                        .zip(dom2)
                        .map(|(ty1, ty2)| Constraint::new(ty1.clone(), ty2.clone())),
                );
                Some(constrs)
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
            ) if name1 == name2 && args1.len() == args2.len() => Some(
                args1
                    .iter()
                    .zip(args2)
                    .map(|(ty1, ty2)| Constraint::new(ty1.clone(), ty2.clone()))
                    .collect(),
            ),
            (TypeF::Record(_), TypeF::Record(_)) => {
                Some(record::unify_records(vars, &left, &right)?)
            }
            _ => None,
        };

        match decomposed {
            Some(constrs) => {
                trace!(
                    "unify: decompose {left} ~ {right} into {} constraint(s)",
                    constrs.len()
                );
                worklist.extend(constrs);
            }
            None => {
                trace!("unify: mismatch {left} ~ {right}");
                return Err(UnifError::TypeMismatch { left, right });
            }
        }
    }

    Ok(subs)
}

/// Reconcile several monomorphic environments. For every name mentioned in any of them, a fresh
/// variable is created and constrained to be equal to every requirement on this name. The `extra`
/// constraints are solved afterwards, together with those.
pub fn unify_mono_envs(
    vars: &mut VarSupply,
    mono_envs: &[&MonoEnv],
    extra: Vec<Constraint>,
) -> Result<Vec<Substitution>, UnifError> {
    let mut usages: IndexMap<Ident, Vec<&Type>> = IndexMap::new();

    for mono_env in mono_envs {
        for (name, ty) in mono_env.iter() {
            usages.entry(*name).or_default().push(ty);
        }
    }

    let mut constraints = Vec::new();

    for tys in usages.into_values() {
        let shared = vars.fresh_type_var(None);
        constraints.extend(
            tys.into_iter()
                .map(|ty| Constraint::new(shared.clone(), ty.clone())),
        );
    }

    constraints.extend(extra);
    unify(vars, constraints)
}
