//! The polymorphic environment (Γ): the typings of the variables in scope.
use super::typing::Typing;
use crate::{environment::Environment, error::ScopeError, identifier::Ident, identifier::LocIdent};

#[derive(Clone, Debug)]
struct Binding {
    id: LocIdent,
    typing: Typing,
    /// Registered by `$assume` rather than inferred.
    assumed: bool,
}

/// A chain of scopes mapping names to typings. Only the innermost scope can be extended.
#[derive(Clone, Debug, Default)]
pub struct TypeEnv {
    env: Environment<Ident, Binding>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a nested scope, e.g. for a function body.
    pub fn child(&self) -> Self {
        TypeEnv {
            env: self.env.child(),
        }
    }

    /// Find the typing of the nearest binding of `id`.
    pub fn lookup(&self, id: &LocIdent) -> Result<&Typing, ScopeError> {
        self.get(id.ident())
            .ok_or_else(|| ScopeError::UnboundIdentifier {
                id: *id,
                in_scope: self.names(),
            })
    }

    /// Every name visible from this scope, innermost first.
    pub fn names(&self) -> Vec<Ident> {
        let mut names: Vec<Ident> = Vec::new();

        for name in self.env.iter_layers().flat_map(|layer| layer.keys()) {
            if !names.contains(name) {
                names.push(*name);
            }
        }

        names
    }

    /// Same as [Self::lookup], without error.
    pub fn get(&self, name: impl Into<Ident>) -> Option<&Typing> {
        self.env
            .get(&name.into())
            .map(|binding| &binding.typing)
    }

    /// Bind `id` in the current scope. Fails if `id` is already bound in this very scope.
    pub fn assign(&mut self, id: LocIdent, typing: Typing) -> Result<(), ScopeError> {
        if let Some(previous) = self.env.get_current(&id.ident()) {
            return Err(ScopeError::AlreadyDefined {
                id,
                previous: previous.id.pos,
            });
        }

        self.env.insert(
            id.ident(),
            Binding {
                id,
                typing,
                assumed: false,
            },
        );
        Ok(())
    }

    /// Register an axiomatic typing for `id` in the current scope, replacing any previous one.
    pub fn assume(&mut self, id: LocIdent, typing: Typing) {
        self.env.insert(
            id.ident(),
            Binding {
                id,
                typing,
                assumed: true,
            },
        );
    }

    /// Whether a definition of `name` in the current scope must be inferred. Returns `false` if the
    /// name has been assumed in this scope: the assumption takes precedence over the definition.
    pub fn should_infer(&self, name: Ident) -> bool {
        !self
            .env
            .get_current(&name)
            .is_some_and(|binding| binding.assumed)
    }

    /// The bindings of the current scope, in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&LocIdent, &Typing)> {
        self.env
            .iter_current()
            .map(|(_, binding)| (&binding.id, &binding.typing))
    }
}
