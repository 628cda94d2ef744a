use crate::ir::{
    intrinsic::{pred_region_operand, region_operand},
    Function, InstRef, IntrinsicId,
};

/// What a GenX region intrinsic does to its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionOp {
    NotARegionOp,
    /// `rdregioni` / `rdregionf`
    Read,
    /// `wrregioni` / `wrregionf`
    Write,
    /// `wrpredregion`
    PredicateWrite,
}
impl RegionOp {
    pub const fn of_intrinsic(id: Option<IntrinsicId>) -> Self {
        match id {
            Some(IntrinsicId::RdRegionI | IntrinsicId::RdRegionF) => Self::Read,
            Some(IntrinsicId::WrRegionI | IntrinsicId::WrRegionF) => Self::Write,
            Some(IntrinsicId::WrPredRegion) => Self::PredicateWrite,
            // wrconstregion writes are never rewritten
            Some(
                IntrinsicId::WrConstRegion | IntrinsicId::RdPredRegion | IntrinsicId::Other,
            )
            | None => Self::NotARegionOp,
        }
    }

    #[inline]
    pub fn of(func: &Function<'_>, inst: InstRef) -> Self {
        Self::of_intrinsic(func.intrinsic_id(inst))
    }

    #[inline(always)]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write | Self::PredicateWrite)
    }

    /// Position of the value being overwritten, for the write variants.
    pub const fn old_value_operand(self) -> Option<usize> {
        match self {
            Self::Write => Some(region_operand::OLD_VALUE),
            Self::PredicateWrite => Some(pred_region_operand::OLD_VALUE),
            Self::Read | Self::NotARegionOp => None,
        }
    }

    /// Position of the value being written, for the write variants.
    pub const fn new_value_operand(self) -> Option<usize> {
        match self {
            Self::Write => Some(region_operand::NEW_VALUE),
            Self::PredicateWrite => Some(pred_region_operand::NEW_VALUE),
            Self::Read | Self::NotARegionOp => None,
        }
    }
}
