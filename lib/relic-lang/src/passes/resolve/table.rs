//! Side tables produced by resolution, keyed by AST ids.

use std::collections::HashMap;

use crate::ast::{Ast, ExprId, Loc, StmtId};
use crate::context::{Arena, NodeId, Symbol};
use crate::types::{ScalarType, TypeRef, TypeTable};

pub type VarId = NodeId<VarDef>;
pub type FuncId = NodeId<FuncDef>;

/// A resolved variable: its type and where its bytes live at run time.
#[derive(Debug, Clone)]
pub struct VarDef {
    pub name: Symbol,
    pub ty: TypeRef,
    pub storage: Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Byte offset into the enclosing function's frame.
    Local { offset: usize },
    /// Byte offset into the file scope data segment.
    Global { offset: usize },
}

#[derive(Debug, Clone)]
pub struct FuncDef {
    pub name: Symbol,
    pub ret: ScalarType,
    pub params: Vec<VarId>,
    pub arity: usize,
    pub body: Vec<StmtId>,
    /// Frame bytes for parameters and every local in the body; filled in
    /// once the body has been resolved.
    pub frame_size: usize,
    pub loc: Loc,
}

/// A resolved `base.member` access: where the member sits inside its
/// aggregate and what type comes out.
#[derive(Debug, Clone, Copy)]
pub struct MemberAccess {
    pub offset: usize,
    pub ty: TypeRef,
}

#[derive(Default)]
pub struct Resolutions {
    pub vars: Arena<VarDef>,
    pub funcs: Arena<FuncDef>,
    /// Variable reference -> definition it resolved to.
    pub var_uses: HashMap<ExprId, VarId>,
    /// Member access -> offset and member type.
    pub member_accesses: HashMap<ExprId, MemberAccess>,
    /// Call -> target function.
    pub call_targets: HashMap<ExprId, FuncId>,
    /// Type of every expression that resolved cleanly.
    pub expr_types: HashMap<ExprId, TypeRef>,
    /// Declaration statement -> variables it introduced, in declarator
    /// order, so initializers can run in order at execution time.
    pub decl_vars: HashMap<StmtId, Vec<VarId>>,
    /// Function name -> definition, for call and entry point lookup.
    pub func_by_name: HashMap<Symbol, FuncId>,
}

/// A fully resolved program: the AST plus every table the runtime needs.
pub struct ResolvedProgram {
    pub ast: Ast,
    pub types: TypeTable,
    pub resolutions: Resolutions,
    /// Bytes needed for file scope variables, zero initialized at startup.
    pub globals_size: usize,
}
