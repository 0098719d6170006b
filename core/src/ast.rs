//! The abstract syntax tree handed to the type checker.
//!
//! Every node carries a [NodeId], unique within one parse, and a [TermPos]. Types built during
//! inference point back to the node they originate from through a [NodeRef], which is only used
//! for diagnostics.
//!
//! The tree is able to represent a few constructs the checker rejects (`const` declarations,
//! destructuring, `if`, assignments...), so that they are reported as unsupported syntax instead
//! of generic parse errors.
use crate::{identifier::LocIdent, position::TermPos};

/// Stable identity of a node within one parsed program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// A non-owning reference to a node: its identity and its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub id: NodeId,
    pub pos: TermPos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub pos: TermPos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub id: NodeId,
    pub pos: TermPos,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn node_ref(&self) -> NodeRef {
        NodeRef {
            id: self.id,
            pos: self.pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Decl {
        kind: DeclKind,
        declarators: Vec<Declarator>,
    },
    Expr(Expr),
    Return(Option<Expr>),
    Block(Vec<Stmt>),
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Let,
    Const,
    Var,
}

impl std::fmt::Display for DeclKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclKind::Let => write!(f, "let"),
            DeclKind::Const => write!(f, "const"),
            DeclKind::Var => write!(f, "var"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub pattern: Pattern,
    pub init: Option<Expr>,
    pub pos: TermPos,
}

/// A binding pattern. Only plain identifiers are supported by the checker.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Ident(LocIdent),
    Object(Vec<LocIdent>, TermPos),
    Array(Vec<LocIdent>, TermPos),
}

impl Pattern {
    pub fn pos(&self) -> TermPos {
        match self {
            Pattern::Ident(id) => id.pos,
            Pattern::Object(_, pos) | Pattern::Array(_, pos) => *pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub pos: TermPos,
    pub kind: ExprKind,
}

impl Expr {
    pub fn node_ref(&self) -> NodeRef {
        NodeRef {
            id: self.id,
            pos: self.pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Ident(LocIdent),
    Array(Vec<Expr>),
    Object(Vec<Property>),
    Member {
        object: Box<Expr>,
        property: MemberProp,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        arg: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Arrow {
        params: Vec<Pattern>,
        body: ArrowBody,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Template(Template),
    TaggedTemplate {
        tag: Box<Expr>,
        quasi: Template,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Num(f64),
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropKey,
    pub value: Expr,
    pub pos: TermPos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
    Ident(LocIdent),
    Literal(Literal, TermPos),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
    Ident(LocIdent),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>, TermPos),
}

/// A template literal. `quasis` always has one more element than `exprs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub quasis: Vec<String>,
    pub exprs: Vec<Expr>,
    pub pos: TermPos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Lt,
    Gt,
    Le,
    Ge,
    StrictEq,
    StrictNeq,
    And,
    Or,
}

impl BinaryOp {
    /// Arithmetic operators only operate on numbers. The other ones are comparison or logical
    /// operators, which require both operands to have the same type and return a boolean.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Sub
                | BinaryOp::Mul
                | BinaryOp::Div
                | BinaryOp::Rem
                | BinaryOp::Pow
        )
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNeq => "!==",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{op}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}
