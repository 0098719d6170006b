//! Typings: the pair of a monomorphic environment and a type.
//!
//! A typing `Δ ⊢ τ` reads "assuming the free variables of Δ have the listed types, this expression
//! has type τ". Free variables are function parameters of enclosing scopes: their types are only
//! known once every use site has been seen, so each use records its own requirement in Δ and the
//! requirements are reconciled by [super::unif::unify_mono_envs] at the binding site.
use indexmap::IndexMap;

use crate::{
    identifier::Ident,
    typ::{apply_subs, fresh, FreshCache, Substitution, Type, VarSupply},
};

/// A monomorphic environment (Δ): the types required from free variables.
pub type MonoEnv = IndexMap<Ident, Type>;

#[derive(Clone, Debug)]
pub struct Typing {
    pub mono_env: MonoEnv,
    pub typ: Type,
}

impl Typing {
    pub fn new(mono_env: MonoEnv, typ: Type) -> Self {
        Typing { mono_env, typ }
    }

    /// A typing without any requirement on free variables.
    pub fn closed(typ: Type) -> Self {
        Typing {
            mono_env: MonoEnv::new(),
            typ,
        }
    }

    /// Return a copy of this typing where every variable has been replaced with a fresh one. The
    /// monomorphic environment and the type share the same cache, so that a variable occurring in
    /// both is still shared in the copy.
    pub fn instantiate(&self, vars: &mut VarSupply) -> Typing {
        let mut cache = FreshCache::new();

        let mono_env = self
            .mono_env
            .iter()
            .map(|(name, ty)| (*name, fresh(vars, &mut cache, ty)))
            .collect();
        let typ = fresh(vars, &mut cache, &self.typ);

        Typing { mono_env, typ }
    }
}

/// Apply every substitution, in order, to every entry of every monomorphic environment, and merge
/// the results. When several environments mention the same name, the last one wins.
pub fn substitute_and_aggregate(subs: &[Substitution], mono_envs: &[&MonoEnv]) -> MonoEnv {
    mono_envs
        .iter()
        .flat_map(|mono_env| mono_env.iter())
        .map(|(name, ty)| (*name, apply_subs(subs, ty)))
        .collect()
}
