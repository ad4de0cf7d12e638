//! Declaration resolution.
//!
//! Turns a parsed unit into a [`ResolvedProgram`]:
//!
//! 1. **Function collection**: function names and arities go into a flat
//!    table first, so calls resolve regardless of definition order.
//! 2. **Item resolution**: declarations and function bodies are resolved in
//!    source order against a scope stack with separate tag and variable
//!    namespaces. Struct specifiers register types in the type table and
//!    member lists are laid out as they complete.
//! 3. **Expression resolution**: variable uses, calls, and member accesses
//!    are resolved to ids and byte offsets recorded in side tables.
//!
//! ## Module organization
//!
//! - `scope`: scope stack for nested tag/variable bindings
//! - `table`: side tables mapping AST nodes to resolved entities
//! - `resolver`: the resolution pass itself

pub mod scope;
pub mod table;

mod resolver;

pub use resolver::DeclResolver;
pub use table::{FuncDef, FuncId, MemberAccess, ResolvedProgram, Resolutions, Storage, VarDef, VarId};
