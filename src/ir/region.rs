//! Region descriptors of `rdregion` / `wrregion` calls.
//!
//! A region selects `num_elements` lanes of a vector laid out as rows of `width` lanes: lane
//! `i` sits at `offset + (i / width) * vstride + (i % width) * stride`, all counted in
//! elements. `offset` comes from the byte index operand.

use super::{intrinsic::region_operand, Function, InstRef, IntrinsicId, ValueRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub num_elements: u32,
    pub vstride: i64,
    pub width: u32,
    pub stride: i64,
    pub offset: u64,
}
impl Region {
    /// Region of an rdregion; its lane count is the result's.
    pub fn of_read(func: &Function<'_>, inst: InstRef) -> Option<Self> {
        let data = func.inst(inst);
        if !data.intrinsic_id().is_some_and(IntrinsicId::is_rdregion) {
            return None;
        }

        Self::from_operands(
            func,
            data.ty.element_count()?,
            data.ty.scalar_type()?.byte_size(),
            data.operands
                .get(region_operand::RD_VSTRIDE..=region_operand::RD_INDEX)?,
        )
    }

    /// Region of a wrregion; its lane count is the new value's.
    pub fn of_write(func: &Function<'_>, inst: InstRef) -> Option<Self> {
        let data = func.inst(inst);
        if !data.intrinsic_id().is_some_and(IntrinsicId::is_wrregion) {
            return None;
        }

        let new_ty = func.value_type(*data.operands.get(region_operand::NEW_VALUE)?);
        Self::from_operands(
            func,
            new_ty.element_count()?,
            new_ty.scalar_type()?.byte_size(),
            data.operands
                .get(region_operand::WR_VSTRIDE..=region_operand::WR_INDEX)?,
        )
    }

    /// `shape` is vstride, width, stride, index in that order. Every one must be a constant
    /// scalar.
    fn from_operands(
        func: &Function<'_>,
        num_elements: u32,
        element_bytes: u32,
        shape: &[ValueRef],
    ) -> Option<Self> {
        let &[vstride, width, stride, index] = shape else {
            return None;
        };
        if element_bytes == 0 {
            return None;
        }

        Some(Self {
            num_elements,
            vstride: func.const_sext(vstride)?,
            width: u32::try_from(func.const_zext(width)?).ok()?,
            stride: func.const_sext(stride)?,
            offset: func.const_zext(index)? / u64::from(element_bytes),
        })
    }

    /// Element offsets of every lane, or `None` when the region is degenerate or reaches
    /// outside `[0, parent_elements)`.
    pub fn element_offsets(&self, parent_elements: u32) -> Option<Vec<usize>> {
        if self.width == 0 {
            return None;
        }

        (0..self.num_elements)
            .map(|i| {
                let row = i64::from(i / self.width);
                let col = i64::from(i % self.width);
                let offset = i64::try_from(self.offset)
                    .ok()?
                    .checked_add(row.checked_mul(self.vstride)?)?
                    .checked_add(col.checked_mul(self.stride)?)?;

                usize::try_from(offset)
                    .ok()
                    .filter(|&x| x < parent_elements as usize)
            })
            .collect()
    }
}
