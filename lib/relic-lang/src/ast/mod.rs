use crate::context::{Arena, NodeId, Symbol};
use crate::types::ScalarType;

pub type SourceId = usize;
pub type Span = std::ops::Range<usize>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Loc {
    pub source: SourceId,
    pub span: Span,
}

impl Loc {
    pub fn merge(self, other: Loc) -> Loc {
        Loc {
            source: self.source,
            span: self.span.start..other.span.end,
        }
    }

    /// Create a synthetic/generated location (used for generated code)
    pub fn generated() -> Self {
        Loc {
            source: 0,
            span: 0..0,
        }
    }
}

impl chumsky::span::Span for Loc {
    type Context = SourceId;
    type Offset = usize;

    fn new(context: Self::Context, range: std::ops::Range<Self::Offset>) -> Self {
        Loc {
            source: context,
            span: range,
        }
    }

    fn context(&self) -> Self::Context {
        self.source
    }
    fn start(&self) -> Self::Offset {
        self.span.start
    }
    fn end(&self) -> Self::Offset {
        self.span.end
    }
}

impl ariadne::Span for Loc {
    type SourceId = SourceId;

    fn source(&self) -> &Self::SourceId {
        &self.source
    }

    fn start(&self) -> usize {
        self.span.start
    }

    fn end(&self) -> usize {
        self.span.end
    }
}

pub type StmtId = NodeId<Stmt>;
pub type ExprId = NodeId<Expr>;

/// One translation unit. Statements and expressions live in arenas and are
/// referenced by id; top-level items keep their source order.
#[derive(Debug, Default)]
pub struct Ast {
    pub stmts: Arena<Stmt>,
    pub exprs: Arena<Expr>,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone)]
pub enum Item {
    Function(FuncItem),
    Decl(Declaration),
}

#[derive(Debug, Clone)]
pub struct FuncItem {
    pub ret: ScalarType,
    pub name: Symbol,
    pub params: Vec<ParamDecl>,
    pub body: Vec<StmtId>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub ty: ScalarType,
    pub name: Symbol,
    pub loc: Loc,
}

/// `spec declarator, declarator, ...;` where every declarator in the list
/// shares the one type produced by the specifier.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub spec: TypeSpec,
    pub declarators: Vec<Declarator>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct Declarator {
    pub name: Symbol,
    pub init: Option<ExprId>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub enum TypeSpec {
    Scalar(ScalarType),
    Struct(StructSpec),
}

/// A `struct` specifier. `tag` and `members` are both optional in the
/// grammar, but at least one of them is always present: `struct s`,
/// `struct s { ... }`, or `struct { ... }`.
#[derive(Debug, Clone)]
pub struct StructSpec {
    pub tag: Option<Symbol>,
    pub members: Option<Vec<MemberDecl>>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct MemberDecl {
    pub spec: TypeSpec,
    pub names: Vec<(Symbol, Loc)>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Decl(Declaration),
    Expr(ExprId),
    Return(ExprId),
    If {
        cond: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    While {
        cond: ExprId,
        body: StmtId,
    },
    Block(Vec<StmtId>),
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Integer(i64),
    Variable(Symbol),
    Assign {
        lhs: ExprId,
        rhs: ExprId,
    },
    Binary {
        op: BinOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Member {
        base: ExprId,
        member: Symbol,
    },
    Call {
        callee: Symbol,
        args: Vec<ExprId>,
    },
    SizeOf(ExprId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}
