//! Member layout: offsets, sizes, and alignment for aggregate types.

use crate::context::Symbol;
use crate::error::CompileErrorKind;
use crate::types::{Member, TypeRef, TypeTable};

#[derive(Debug)]
pub struct Layout {
    pub members: Vec<Member>,
    pub size: usize,
    pub align: usize,
}

/// Rounds `value` up to the next multiple of `align`.
/// `align` must be a power of two.
pub fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// Walks the member list in declaration order, placing each member at the
/// next offset aligned to its own alignment. The aggregate's alignment is
/// the maximum member alignment (1 when there are no members) and its size
/// is padded up to a multiple of that, so arrays of the aggregate would tile
/// correctly.
///
/// Fails when a member's type is an aggregate that has not been completed,
/// since such a member has no size.
pub fn compute_layout(
    table: &TypeTable,
    members: &[(Symbol, TypeRef)],
) -> Result<Layout, CompileErrorKind> {
    let mut cursor = 0;
    let mut align = 1;
    let mut laid_out = Vec::with_capacity(members.len());

    for (name, ty) in members {
        let (size, member_align) = table.size_align(ty).ok_or_else(|| {
            let tag = match ty {
                TypeRef::Aggregate(id) => table.get(*id).tag,
                TypeRef::Scalar(_) => None,
            };
            CompileErrorKind::IncompleteType { tag }
        })?;

        cursor = align_up(cursor, member_align);
        laid_out.push(Member {
            name: *name,
            ty: *ty,
            offset: cursor,
        });
        cursor += size;
        align = align.max(member_align);
    }

    Ok(Layout {
        members: laid_out,
        size: align_up(cursor, align),
        align,
    })
}
