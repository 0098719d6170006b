//! Type inference.
//!
//! Inference is compositional, in the style of Érdi's "compositional type checking". Each
//! expression is given a [Typing]: a monomorphic environment listing what the expression requires
//! from the free variables it uses, together with its type. Typings are combined bottom-up: the
//! typing of a compound expression is obtained by [unifying](unif::unify_mono_envs) the
//! environments of its sub-expressions, plus the constraints specific to the construct (for
//! example, the callee of a call must be a function accepting the arguments).
//!
//! # Let-polymorphism
//!
//! Let-bound names are stored in the polymorphic environment ([TypeEnv]) with their full typing.
//! Each use of a name [instantiates](Typing::instantiate) this typing with fresh variables, so
//! that every use site can specialize it independently:
//!
//! ```text
//! let id = (x) => x
//! let a = id(1)     // Num
//! let b = id("s")   // String
//! ```
//!
//! Function parameters, on the other hand, are monomorphic. A parameter `x` is bound to the typing
//! `{ x: t } ⊢ t`, so that each use records a requirement on `x` in its environment. At the
//! function boundary, all the requirements on `x` are unified with the parameter type and `x` is
//! removed from the environment: only the requirements on variables of enclosing scopes escape.
//!
//! # Records
//!
//! Records are extensible, with row variables and scoped labels. See [record].
//!
//! # Errors
//!
//! Inference stops at the first error. A [TypecheckError] is recoverable: [type_check] returns it
//! together with the environment built so far. A [ScopeError] (unknown identifier, redefinition,
//! unsupported syntax) is fatal.
use indexmap::IndexMap;
use log::debug;

use crate::{
    ast::{
        ArrowBody, DeclKind, Declarator, Expr, ExprKind, Literal, MemberProp, NodeRef, Pattern,
        Program, PropKey, Stmt, StmtKind, Template,
    },
    error::{ScopeError, TypecheckError},
    identifier::{is_valid_identifier, Ident, LocIdent},
    parser::annotation::Annotation,
    position::TermPos,
    typ::{apply_subs, compress, fresh, FreshCache, Type, TypeF, VarSupply},
};

pub mod env;
pub mod error;
pub mod record;
pub mod typing;
pub mod unif;

pub use env::TypeEnv;
pub use typing::{MonoEnv, Typing};

use error::{InferError, UnifError};
use typing::substitute_and_aggregate;
use unif::{unify_mono_envs, Constraint};

/// The tag of the pragma registering an axiomatic typing: ``$assume`name: Type` ``.
pub const ASSUME_TAG: &str = "$assume";

/// The result of a successful run: the top-level environment, and the recoverable error which
/// stopped inference, if any. When there is an error, the environment only contains the bindings
/// defined before the faulty statement.
#[derive(Debug)]
pub struct InferResult {
    pub env: TypeEnv,
    pub type_error: Option<TypecheckError>,
}

/// Infer the types of the top-level bindings of a program.
pub fn type_check(program: &Program) -> Result<InferResult, ScopeError> {
    let mut checker = Checker::new();
    let mut env = TypeEnv::new();
    let mut typings = BlockTypings::default();

    match checker.check_block(&mut env, &program.body, BlockKind::TopLevel, &mut typings) {
        Ok(()) => Ok(InferResult {
            env,
            type_error: None,
        }),
        Err(InferError::Type(err)) => {
            debug!("type error, stopping inference");
            Ok(InferResult {
                env,
                type_error: Some(err),
            })
        }
        Err(InferError::Scope(err)) => Err(err),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlockKind {
    TopLevel,
    Function,
}

/// The typings collected while checking the statements of a block.
#[derive(Default)]
struct BlockTypings {
    statements: Vec<Typing>,
    /// Set by the first `return` statement. Checking stops there.
    returned: Option<Typing>,
}

/// Owns the state of one inference run.
struct Checker {
    vars: VarSupply,
}

impl Checker {
    fn new() -> Self {
        Checker {
            vars: VarSupply::new(),
        }
    }

    fn check_block(
        &mut self,
        env: &mut TypeEnv,
        stmts: &[Stmt],
        kind: BlockKind,
        typings: &mut BlockTypings,
    ) -> Result<(), InferError> {
        for stmt in stmts {
            self.check_stmt(env, stmt, kind, typings)?;

            if typings.returned.is_some() {
                break;
            }
        }

        Ok(())
    }

    fn check_stmt(
        &mut self,
        env: &mut TypeEnv,
        stmt: &Stmt,
        kind: BlockKind,
        typings: &mut BlockTypings,
    ) -> Result<(), InferError> {
        match &stmt.kind {
            StmtKind::Decl {
                kind: decl_kind,
                declarators,
            } => {
                let (id, init) = let_binding(stmt, *decl_kind, declarators)?;

                if !env.should_infer(id.ident()) {
                    debug!("`{id}` is assumed, skipping its definition");
                    return Ok(());
                }

                let typing = match &init.kind {
                    ExprKind::Arrow { params, body } => {
                        self.infer_def(env, id, init.node_ref(), params, body)?
                    }
                    _ => self.infer_expr(env, init)?,
                };

                debug!("inferred `{id}`: {}", typing.typ);
                typings.statements.push(typing.clone());
                env.assign(id, typing)?;
            }
            StmtKind::Expr(expr) => match self.assumption(expr)? {
                Some((id, typing)) => {
                    debug!("assuming `{id}`: {}", typing.typ);
                    env.assume(id, typing);
                }
                None => {
                    let typing = self.infer_expr(env, expr)?;
                    typings.statements.push(typing);
                }
            },
            StmtKind::Return(arg) => {
                if kind == BlockKind::TopLevel {
                    return Err(unsupported("`return` outside of a function", stmt.pos));
                }

                let typing = match arg {
                    Some(expr) => self.infer_expr(env, expr)?,
                    None => Typing::closed(Type::from(TypeF::Undefined).with_src(stmt.node_ref())),
                };
                typings.returned = Some(typing);
            }
            StmtKind::Block(stmts) => {
                let mut scope = env.child();
                self.check_block(&mut scope, stmts, kind, typings)?;
            }
            StmtKind::If { .. } => return Err(unsupported("`if` statements", stmt.pos)),
            StmtKind::While { .. } => return Err(unsupported("loops", stmt.pos)),
        }

        Ok(())
    }

    /// Recognize the `$assume` pragma and compile its annotation.
    fn assumption(&mut self, expr: &Expr) -> Result<Option<(LocIdent, Typing)>, InferError> {
        let ExprKind::TaggedTemplate { tag, quasi } = &expr.kind else {
            return Ok(None);
        };

        match &tag.kind {
            ExprKind::Ident(tag_id) if tag_id.label() == ASSUME_TAG => (),
            _ => return Err(unsupported("tagged templates", expr.pos)),
        }

        let invalid = |message: String| ScopeError::InvalidAssumption {
            message,
            pos: quasi.pos,
        };

        let text = match quasi {
            Template { quasis, exprs, .. } if exprs.is_empty() && quasis.len() == 1 => &quasis[0],
            _ => {
                return Err(invalid(String::from(
                    "interpolation is not allowed in an assumption",
                ))
                .into())
            }
        };

        let (name, annotation) = text
            .split_once(':')
            .ok_or_else(|| invalid(String::from("expected `name: Type`")))?;
        let name = name.trim();

        if !is_valid_identifier(name) {
            return Err(invalid(format!("`{name}` is not a valid identifier")).into());
        }

        let annotation =
            Annotation::compile(annotation).map_err(|err| invalid(err.to_string()))?;
        let typ = fresh(&mut self.vars, &mut FreshCache::new(), annotation.typ());

        Ok(Some((
            LocIdent::new_with_pos(name, quasi.pos),
            Typing::closed(typ),
        )))
    }

    fn infer_expr(&mut self, env: &TypeEnv, expr: &Expr) -> Result<Typing, InferError> {
        let node = expr.node_ref();

        match &expr.kind {
            ExprKind::Literal(lit) => {
                let typ = match lit {
                    Literal::Num(_) => TypeF::Num,
                    Literal::Str(_) => TypeF::Str,
                    Literal::Bool(_) => TypeF::Bool,
                };
                Ok(Typing::closed(Type::from(typ).with_src(node)))
            }
            ExprKind::Ident(id) => Ok(env.lookup(id)?.instantiate(&mut self.vars)),
            ExprKind::Binary { op, left, right } => {
                let left_typing = self.infer_expr(env, left)?;
                let right_typing = self.infer_expr(env, right)?;

                let (extra, result) = if op.is_arithmetic() {
                    (
                        vec![
                            Constraint::new(
                                left_typing.typ.clone(),
                                Type::from(TypeF::Num).with_src(left.node_ref()),
                            ),
                            Constraint::new(
                                right_typing.typ.clone(),
                                Type::from(TypeF::Num).with_src(right.node_ref()),
                            ),
                        ],
                        TypeF::Num,
                    )
                } else {
                    let operand = self.vars.fresh_type_var(Some(node));
                    (
                        vec![
                            Constraint::new(left_typing.typ.clone(), operand.clone()),
                            Constraint::new(right_typing.typ.clone(), operand),
                        ],
                        TypeF::Bool,
                    )
                };

                let envs = [&left_typing.mono_env, &right_typing.mono_env];
                let subs = unify_mono_envs(&mut self.vars, &envs, extra)
                    .map_err(UnifError::into_infer_error)?;

                Ok(Typing::new(
                    substitute_and_aggregate(&subs, &envs),
                    Type::from(result).with_src(node),
                ))
            }
            ExprKind::Array(elems) => {
                let elem_typings = elems
                    .iter()
                    .map(|elem| self.infer_expr(env, elem))
                    .collect::<Result<Vec<_>, _>>()?;
                let elem = self.vars.fresh_type_var(Some(node));

                let extra = elem_typings
                    .iter()
                    .map(|typing| Constraint::new(elem.clone(), typing.typ.clone()))
                    .collect();
                let envs: Vec<_> = elem_typings.iter().map(|typing| &typing.mono_env).collect();
                let subs = unify_mono_envs(&mut self.vars, &envs, extra)
                    .map_err(|err| err.into_array_error(node, &elem_typings))?;

                Ok(Typing::new(
                    substitute_and_aggregate(&subs, &envs),
                    Type::array(apply_subs(&subs, &elem)).with_src(node),
                ))
            }
            ExprKind::Object(props) => {
                let mut labels: IndexMap<Ident, LocIdent> = IndexMap::new();
                let mut prop_typings = Vec::with_capacity(props.len());

                for prop in props {
                    let label = match &prop.key {
                        PropKey::Ident(id) => *id,
                        PropKey::Literal(Literal::Str(s), pos) => LocIdent::new_with_pos(s, *pos),
                        PropKey::Literal(Literal::Num(n), pos) => {
                            LocIdent::new_with_pos(n.to_string(), *pos)
                        }
                        PropKey::Literal(Literal::Bool(b), pos) => {
                            LocIdent::new_with_pos(b.to_string(), *pos)
                        }
                        PropKey::Computed(key) => {
                            return Err(ScopeError::InvalidObjectKey { pos: key.pos }.into())
                        }
                    };

                    if let Some(previous) = labels.get(&label.ident()) {
                        return Err(ScopeError::DuplicateLabel {
                            label,
                            previous: previous.pos,
                        }
                        .into());
                    }

                    labels.insert(label.ident(), label);
                    prop_typings.push(self.infer_expr(env, &prop.value)?);
                }

                let envs: Vec<_> = prop_typings.iter().map(|typing| &typing.mono_env).collect();
                let subs = unify_mono_envs(&mut self.vars, &envs, Vec::new())
                    .map_err(UnifError::into_infer_error)?;

                let fields = labels
                    .keys()
                    .zip(&prop_typings)
                    .map(|(label, typing)| (*label, apply_subs(&subs, &typing.typ)))
                    .collect();

                Ok(Typing::new(
                    substitute_and_aggregate(&subs, &envs),
                    Type::record_of(fields, None).with_src(node),
                ))
            }
            ExprKind::Member { object, property } => {
                let label = match property {
                    MemberProp::Ident(id) => *id,
                    MemberProp::Computed(_) => {
                        return Err(unsupported("computed member access", expr.pos))
                    }
                };

                self.infer_member(env, node, object, label)
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let test_typing = self.infer_expr(env, test)?;
                let cons_typing = self.infer_expr(env, consequent)?;
                let alt_typing = self.infer_expr(env, alternate)?;

                let extra = vec![
                    Constraint::new(
                        test_typing.typ.clone(),
                        Type::from(TypeF::Bool).with_src(test.node_ref()),
                    ),
                    Constraint::new(cons_typing.typ.clone(), alt_typing.typ.clone()),
                ];
                let envs = [
                    &test_typing.mono_env,
                    &cons_typing.mono_env,
                    &alt_typing.mono_env,
                ];
                let subs = unify_mono_envs(&mut self.vars, &envs, extra)
                    .map_err(UnifError::into_infer_error)?;

                Ok(Typing::new(
                    substitute_and_aggregate(&subs, &envs),
                    apply_subs(&subs, &cons_typing.typ),
                ))
            }
            ExprKind::Arrow { params, body } => self.infer_abs(env, node, params, body),
            ExprKind::Call { callee, args } => {
                let callee_typing = self.infer_expr(env, callee)?;
                let arg_typings = args
                    .iter()
                    .map(|arg| self.infer_expr(env, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                let result = self.vars.fresh_type_var(Some(node));

                let expected = Type::arrow(
                    arg_typings.iter().map(|typing| typing.typ.clone()).collect(),
                    result.clone(),
                )
                .with_src(node);

                let mut envs: Vec<_> = arg_typings.iter().map(|typing| &typing.mono_env).collect();
                envs.push(&callee_typing.mono_env);

                let subs = unify_mono_envs(
                    &mut self.vars,
                    &envs,
                    vec![Constraint::new(callee_typing.typ.clone(), expected)],
                )
                .map_err(|err| {
                    err.into_call_error(node, callee.node_ref(), &callee_typing, &arg_typings)
                })?;

                Ok(Typing::new(
                    substitute_and_aggregate(&subs, &envs),
                    apply_subs(&subs, &result),
                ))
            }
            ExprKind::Template(template) => {
                let typings = template
                    .exprs
                    .iter()
                    .map(|expr| self.infer_expr(env, expr))
                    .collect::<Result<Vec<_>, _>>()?;

                let envs: Vec<_> = typings.iter().map(|typing| &typing.mono_env).collect();
                let subs = unify_mono_envs(&mut self.vars, &envs, Vec::new())
                    .map_err(UnifError::into_infer_error)?;

                Ok(Typing::new(
                    substitute_and_aggregate(&subs, &envs),
                    Type::from(TypeF::Str).with_src(node),
                ))
            }
            ExprKind::TaggedTemplate { .. } => Err(unsupported(
                "tagged templates in expression position",
                expr.pos,
            )),
            ExprKind::Unary { op, .. } => {
                Err(unsupported(&format!("the unary operator `{op}`"), expr.pos))
            }
            ExprKind::Assign { .. } => Err(unsupported("assignments", expr.pos)),
        }
    }

    /// Member access. The object must be a record, which either lists the label, or is open and
    /// can thus be extended with it.
    fn infer_member(
        &mut self,
        env: &TypeEnv,
        node: NodeRef,
        object: &Expr,
        label: LocIdent,
    ) -> Result<Typing, InferError> {
        let obj_typing = self.infer_expr(env, object)?;

        let TypeF::Record(rows) = &obj_typing.typ.typ else {
            return Err(TypecheckError::NotAnObject {
                node,
                typ: obj_typing.typ.clone(),
                label,
            }
            .into());
        };

        let record = compress(rows).map_err(|_| {
            UnifError::MultipleRowVars {
                record: obj_typing.typ.clone(),
            }
            .into_infer_error()
        })?;

        if let Some(typ) = record.labels.get(&label.ident()) {
            return Ok(Typing::new(obj_typing.mono_env.clone(), typ.clone()));
        }

        if record.row_var.is_none() {
            return Err(TypecheckError::NoSuchProperty {
                node,
                record: obj_typing.typ.clone(),
                label,
            }
            .into());
        }

        let field = self.vars.fresh_type_var(Some(node));
        let rest = self.vars.fresh_row_var(Some(node));
        let expected = Type::record_of(
            IndexMap::from([(label.ident(), field.clone())]),
            Some(rest),
        );

        let envs = [&obj_typing.mono_env];
        let subs = unify_mono_envs(
            &mut self.vars,
            &envs,
            vec![Constraint::new(obj_typing.typ.clone(), expected)],
        )
        .map_err(UnifError::into_infer_error)?;

        Ok(Typing::new(
            substitute_and_aggregate(&subs, &envs),
            apply_subs(&subs, &field),
        ))
    }

    /// Bind the parameters of a function in `scope`. Each parameter `x` gets the typing
    /// `{ x: t } ⊢ t` for a fresh `t`.
    fn bind_params(
        &mut self,
        scope: &mut TypeEnv,
        params: &[Pattern],
    ) -> Result<Vec<(Ident, Type)>, InferError> {
        params
            .iter()
            .map(|param| match param {
                Pattern::Ident(id) => {
                    let typ = self.vars.fresh_type_var(None);
                    scope.assign(
                        *id,
                        Typing::new(MonoEnv::from([(id.ident(), typ.clone())]), typ.clone()),
                    )?;
                    Ok((id.ident(), typ))
                }
                Pattern::Object(_, pos) | Pattern::Array(_, pos) => {
                    Err(unsupported("destructuring", *pos))
                }
            })
            .collect()
    }

    /// Infer the typing of a function body, in the scope of the function.
    fn infer_body(&mut self, scope: &mut TypeEnv, body: &ArrowBody) -> Result<Typing, InferError> {
        match body {
            ArrowBody::Expr(expr) => self.infer_expr(scope, expr),
            ArrowBody::Block(stmts, _) => {
                let mut typings = BlockTypings::default();
                self.check_block(scope, stmts, BlockKind::Function, &mut typings)?;

                let returned = typings
                    .returned
                    .unwrap_or_else(|| Typing::closed(TypeF::Undefined.into()));

                let mut envs: Vec<_> = typings
                    .statements
                    .iter()
                    .map(|typing| &typing.mono_env)
                    .collect();
                envs.push(&returned.mono_env);

                let subs = unify_mono_envs(&mut self.vars, &envs, Vec::new())
                    .map_err(UnifError::into_infer_error)?;

                Ok(Typing::new(
                    substitute_and_aggregate(&subs, &envs),
                    apply_subs(&subs, &returned.typ),
                ))
            }
        }
    }

    /// A function bound by `let`. The name of the function is bound monomorphically in its own
    /// body, which allows self-reference. The function type is unified with the uses of the name
    /// and of the parameters, which are then removed from the resulting environment.
    fn infer_def(
        &mut self,
        env: &TypeEnv,
        name: LocIdent,
        node: NodeRef,
        params: &[Pattern],
        body: &ArrowBody,
    ) -> Result<Typing, InferError> {
        let self_var = self.vars.fresh_type_var(None);
        let mut self_scope = env.child();
        self_scope.assign(
            name,
            Typing::new(
                MonoEnv::from([(name.ident(), self_var.clone())]),
                self_var,
            ),
        )?;

        let mut scope = self_scope.child();
        let params = self.bind_params(&mut scope, params)?;
        let body_typing = self.infer_body(&mut scope, body)?;

        let fn_type = Type::arrow(
            params.iter().map(|(_, typ)| typ.clone()).collect(),
            body_typing.typ.clone(),
        )
        .with_src(node);

        // A parameter named like the function hides the function in its body. Mono-env entries
        // are grouped by name, so the self entry must stay out of the unification in that case.
        let shadowed = params.iter().any(|(param, _)| *param == name.ident());
        let self_env = MonoEnv::from([(name.ident(), fn_type.clone())]);
        let param_envs: Vec<MonoEnv> = params
            .iter()
            .map(|(param, typ)| MonoEnv::from([(*param, typ.clone())]))
            .collect();

        let mut envs = Vec::new();
        if !shadowed {
            envs.push(&self_env);
        }
        envs.extend(param_envs.iter());
        envs.push(&body_typing.mono_env);

        let subs = unify_mono_envs(&mut self.vars, &envs, Vec::new())
            .map_err(UnifError::into_infer_error)?;

        let (mut mono_env, typ) = if shadowed {
            (
                substitute_and_aggregate(&subs, &[&body_typing.mono_env]),
                apply_subs(&subs, &fn_type),
            )
        } else {
            let mut mono_env =
                substitute_and_aggregate(&subs, &[&self_env, &body_typing.mono_env]);
            let typ = mono_env
                .shift_remove(&name.ident())
                .unwrap_or_else(|| apply_subs(&subs, &fn_type));
            (mono_env, typ)
        };

        for (param, _) in &params {
            mono_env.shift_remove(param);
        }

        Ok(Typing::new(mono_env, typ))
    }

    /// An anonymous function. Same as [Self::infer_def], without the self-reference.
    fn infer_abs(
        &mut self,
        env: &TypeEnv,
        node: NodeRef,
        params: &[Pattern],
        body: &ArrowBody,
    ) -> Result<Typing, InferError> {
        let mut scope = env.child();
        let params = self.bind_params(&mut scope, params)?;
        let body_typing = self.infer_body(&mut scope, body)?;

        let param_envs: Vec<MonoEnv> = params
            .iter()
            .map(|(param, typ)| MonoEnv::from([(*param, typ.clone())]))
            .collect();
        let mut envs: Vec<_> = param_envs.iter().collect();
        envs.push(&body_typing.mono_env);

        let subs = unify_mono_envs(&mut self.vars, &envs, Vec::new())
            .map_err(UnifError::into_infer_error)?;

        let mut mono_env = substitute_and_aggregate(&subs, &[&body_typing.mono_env]);
        let domain = params
            .iter()
            .map(|(param, typ)| {
                mono_env
                    .shift_remove(param)
                    .unwrap_or_else(|| apply_subs(&subs, typ))
            })
            .collect();

        Ok(Typing::new(
            mono_env,
            Type::arrow(domain, apply_subs(&subs, &body_typing.typ)).with_src(node),
        ))
    }
}

/// Check that a declaration is a simple `let x = e` and extract the identifier and the bound
/// expression.
fn let_binding<'a>(
    stmt: &Stmt,
    kind: DeclKind,
    declarators: &'a [Declarator],
) -> Result<(LocIdent, &'a Expr), ScopeError> {
    if kind != DeclKind::Let {
        return Err(unsupported_syntax(
            &format!("`{kind}` declarations"),
            stmt.pos,
        ));
    }

    let [decl] = declarators else {
        return Err(unsupported_syntax("multiple declarators", stmt.pos));
    };

    let Pattern::Ident(id) = &decl.pattern else {
        return Err(unsupported_syntax("destructuring", decl.pattern.pos()));
    };

    let Some(init) = &decl.init else {
        return Err(unsupported_syntax(
            "declarations without initializer",
            decl.pos,
        ));
    };

    Ok((*id, init))
}

fn unsupported_syntax(description: &str, pos: TermPos) -> ScopeError {
    ScopeError::UnsupportedSyntax {
        description: description.to_owned(),
        pos,
    }
}

fn unsupported(description: &str, pos: TermPos) -> InferError {
    unsupported_syntax(description, pos).into()
}
