//! GenX intrinsic identification.
//!
//! Intrinsic callees carry type-mangling suffixes (`llvm.genx.rdregioni.v4i32.v8i32.i16`), so a
//! callee is identified by the first dotted component after the `llvm.genx.` prefix.

const GENX_PREFIX: &str = "llvm.genx.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicId {
    RdRegionI,
    RdRegionF,
    WrRegionI,
    WrRegionF,
    WrConstRegion,
    RdPredRegion,
    WrPredRegion,
    /// Any other `llvm.genx.*` intrinsic.
    Other,
}
impl IntrinsicId {
    pub fn lookup(callee: &str) -> Option<Self> {
        let rest = callee.strip_prefix(GENX_PREFIX)?;
        let base = rest.split_once('.').map_or(rest, |(base, _)| base);

        Some(match base {
            "rdregioni" => Self::RdRegionI,
            "rdregionf" => Self::RdRegionF,
            "wrregioni" => Self::WrRegionI,
            "wrregionf" => Self::WrRegionF,
            "wrconstregion" => Self::WrConstRegion,
            "rdpredregion" => Self::RdPredRegion,
            "wrpredregion" => Self::WrPredRegion,
            _ => Self::Other,
        })
    }

    #[inline(always)]
    pub const fn is_rdregion(self) -> bool {
        matches!(self, Self::RdRegionI | Self::RdRegionF)
    }

    /// `wrregioni`/`wrregionf`. `wrconstregion` is deliberately not included.
    #[inline(always)]
    pub const fn is_wrregion(self) -> bool {
        matches!(self, Self::WrRegionI | Self::WrRegionF)
    }

    /// Operand count of a well-formed call, when the intrinsic has a fixed layout.
    pub const fn operand_count(self) -> Option<usize> {
        match self {
            Self::RdRegionI | Self::RdRegionF => Some(region_operand::RD_OPERAND_COUNT),
            Self::WrRegionI | Self::WrRegionF | Self::WrConstRegion => {
                Some(region_operand::WR_OPERAND_COUNT)
            }
            Self::RdPredRegion => Some(pred_region_operand::RD_OPERAND_COUNT),
            Self::WrPredRegion => Some(pred_region_operand::WR_OPERAND_COUNT),
            Self::Other => None,
        }
    }
}

/// Operand positions of `rdregion*` / `wrregion*`.
pub mod region_operand {
    pub const OLD_VALUE: usize = 0;
    pub const NEW_VALUE: usize = 1;

    pub const RD_VSTRIDE: usize = 1;
    pub const RD_INDEX: usize = 4;
    pub const RD_OPERAND_COUNT: usize = 6;

    pub const WR_VSTRIDE: usize = 2;
    pub const WR_INDEX: usize = 5;
    pub const PREDICATE: usize = 7;
    pub const WR_OPERAND_COUNT: usize = 8;

    /// vstride, width, stride and index sit contiguously in both layouts, from `*_VSTRIDE`
    /// up to `*_INDEX`.
    pub const SHAPE_PARAMETER_COUNT: usize = 4;
}

/// Operand positions of `rdpredregion` / `wrpredregion`.
pub mod pred_region_operand {
    pub const OLD_VALUE: usize = 0;
    pub const NEW_VALUE: usize = 1;

    pub const RD_OPERAND_COUNT: usize = 2;

    pub const WR_OFFSET: usize = 2;
    pub const WR_OPERAND_COUNT: usize = 3;
}
