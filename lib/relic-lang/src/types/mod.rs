//! The struct type registry.
//!
//! Every `struct` declaration instance gets its own [`TypeId`]; two types are
//! the same type exactly when their ids are equal, regardless of tag spelling
//! or member shape. Aggregates start incomplete (forward declarations) and
//! are completed at most once by attaching a member list.

pub mod layout;

use crate::context::{Arena, Interner, NodeId, Symbol};
use crate::error::CompileErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Char,
    Short,
    Int,
    Long,
}

impl ScalarType {
    pub fn size(self) -> usize {
        match self {
            ScalarType::Char => 1,
            ScalarType::Short => 2,
            ScalarType::Int => 4,
            ScalarType::Long => 8,
        }
    }

    /// Scalars are naturally aligned: alignment equals size.
    pub fn align(self) -> usize {
        self.size()
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Char => "char",
            ScalarType::Short => "short",
            ScalarType::Int => "int",
            ScalarType::Long => "long",
        }
    }
}

pub type TypeId = NodeId<AggregateType>;

/// A resolved type: either a scalar or a reference to an aggregate by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef {
    Scalar(ScalarType),
    Aggregate(TypeId),
}

impl TypeRef {
    pub fn is_scalar(self) -> bool {
        matches!(self, TypeRef::Scalar(_))
    }
}

#[derive(Debug, Clone)]
pub struct Member {
    pub name: Symbol,
    pub ty: TypeRef,
    pub offset: usize,
}

/// A struct type. `size` and `align` are meaningful only once `complete`
/// is set; member names are unique within one aggregate.
#[derive(Debug)]
pub struct AggregateType {
    pub tag: Option<Symbol>,
    pub members: Vec<Member>,
    pub size: usize,
    pub align: usize,
    pub complete: bool,
}

impl AggregateType {
    pub fn member(&self, name: Symbol) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Default)]
pub struct TypeTable {
    aggregates: Arena<AggregateType>,
}

impl TypeTable {
    /// Registers a new incomplete aggregate and returns its identity.
    pub fn declare_incomplete(&mut self, tag: Option<Symbol>) -> TypeId {
        self.aggregates.alloc(AggregateType {
            tag,
            members: Vec::new(),
            size: 0,
            align: 1,
            complete: false,
        })
    }

    /// Registers a new aggregate and lays it out immediately.
    pub fn define(
        &mut self,
        tag: Option<Symbol>,
        members: Vec<(Symbol, TypeRef)>,
    ) -> Result<TypeId, CompileErrorKind> {
        let layout = layout::compute_layout(self, &members)?;
        Ok(self.aggregates.alloc(AggregateType {
            tag,
            members: layout.members,
            size: layout.size,
            align: layout.align,
            complete: true,
        }))
    }

    /// Attaches a member list to a previously declared aggregate, keeping its
    /// identity. Completing an aggregate twice is a redefinition.
    pub fn complete(
        &mut self,
        id: TypeId,
        members: Vec<(Symbol, TypeRef)>,
    ) -> Result<(), CompileErrorKind> {
        if self.aggregates.get(id).complete {
            return Err(CompileErrorKind::Redefinition {
                tag: self.aggregates.get(id).tag,
            });
        }
        let layout = layout::compute_layout(self, &members)?;
        let agg = self.aggregates.get_mut(id);
        agg.members = layout.members;
        agg.size = layout.size;
        agg.align = layout.align;
        agg.complete = true;
        Ok(())
    }

    pub fn get(&self, id: TypeId) -> &AggregateType {
        self.aggregates.get(id)
    }

    /// Size and alignment of a type, or `None` while an aggregate is still
    /// incomplete.
    pub fn size_align(&self, ty: &TypeRef) -> Option<(usize, usize)> {
        match ty {
            TypeRef::Scalar(scalar) => Some((scalar.size(), scalar.align())),
            TypeRef::Aggregate(id) => {
                let agg = self.get(*id);
                agg.complete.then_some((agg.size, agg.align))
            }
        }
    }

    pub fn size_of(&self, ty: &TypeRef) -> Option<usize> {
        self.size_align(ty).map(|(size, _)| size)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &AggregateType)> {
        self.aggregates.iter()
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// Human-readable type name for diagnostics.
    pub fn describe(&self, ty: &TypeRef, interner: &Interner) -> String {
        match ty {
            TypeRef::Scalar(scalar) => scalar.name().to_string(),
            TypeRef::Aggregate(id) => match self.get(*id).tag {
                Some(tag) => format!(
                    "struct {}",
                    interner.try_resolve(tag).unwrap_or("<unknown>")
                ),
                None => "struct <anonymous>".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_interner() -> (TypeTable, Interner) {
        (TypeTable::default(), Interner::default())
    }

    #[test]
    fn forward_declaration_then_completion_keeps_identity() {
        let (mut table, mut interner) = table_with_interner();
        let tag = interner.intern("node");
        let a = interner.intern("a");

        let id = table.declare_incomplete(Some(tag));
        assert!(!table.get(id).complete);
        assert_eq!(table.size_align(&TypeRef::Aggregate(id)), None);

        table
            .complete(id, vec![(a, TypeRef::Scalar(ScalarType::Int))])
            .unwrap();
        let agg = table.get(id);
        assert!(agg.complete);
        assert_eq!(agg.size, 4);
        assert_eq!(agg.align, 4);
        assert_eq!(agg.member(a).unwrap().offset, 0);
    }

    #[test]
    fn completing_twice_is_a_redefinition() {
        let (mut table, mut interner) = table_with_interner();
        let tag = interner.intern("s");
        let a = interner.intern("a");

        let id = table.declare_incomplete(Some(tag));
        table
            .complete(id, vec![(a, TypeRef::Scalar(ScalarType::Char))])
            .unwrap();
        let err = table
            .complete(id, vec![(a, TypeRef::Scalar(ScalarType::Long))])
            .unwrap_err();
        assert!(matches!(err, CompileErrorKind::Redefinition { .. }));
    }

    #[test]
    fn define_is_complete_immediately() {
        let (mut table, mut interner) = table_with_interner();
        let a = interner.intern("a");
        let b = interner.intern("b");

        let id = table
            .define(
                None,
                vec![
                    (a, TypeRef::Scalar(ScalarType::Int)),
                    (b, TypeRef::Scalar(ScalarType::Char)),
                ],
            )
            .unwrap();
        let agg = table.get(id);
        assert!(agg.complete);
        assert_eq!(agg.tag, None);
        assert_eq!(agg.size, 8);
    }

    #[test]
    fn distinct_declarations_get_distinct_ids() {
        let (mut table, mut interner) = table_with_interner();
        let tag = interner.intern("s");
        let a = interner.intern("a");

        let first = table
            .define(Some(tag), vec![(a, TypeRef::Scalar(ScalarType::Int))])
            .unwrap();
        let second = table
            .define(Some(tag), vec![(a, TypeRef::Scalar(ScalarType::Int))])
            .unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn member_with_incomplete_type_cannot_be_laid_out() {
        let (mut table, mut interner) = table_with_interner();
        let fwd = interner.intern("fwd");
        let x = interner.intern("x");

        let incomplete = table.declare_incomplete(Some(fwd));
        let err = table
            .define(None, vec![(x, TypeRef::Aggregate(incomplete))])
            .unwrap_err();
        assert!(matches!(err, CompileErrorKind::IncompleteType { .. }));
    }
}
