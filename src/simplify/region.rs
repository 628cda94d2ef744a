//! Algebraic rules for region intrinsics whose operands are not all constant.

use crate::{
    ir::{
        intrinsic::{pred_region_operand, region_operand},
        Constant, Function, IntrinsicId, ValueRef,
    },
    ty::TypeRef,
};

use super::{classify::RegionOp, Simplified};

/// Tries to express a region intrinsic call as one of its operands or as a constant.
///
/// `args` are the call's operands. Calls whose operand list or shape operands are not what
/// the intrinsic expects are left alone. The function is only read.
pub fn simplify_region_intrinsic<'t>(
    id: IntrinsicId,
    ret_ty: TypeRef<'t>,
    args: &[ValueRef],
    func: &Function<'t>,
) -> Option<Simplified<'t>> {
    if id.operand_count() != Some(args.len()) {
        return None;
    }

    match RegionOp::of_intrinsic(Some(id)) {
        RegionOp::Read => simplify_read(ret_ty, args, func),
        RegionOp::Write => simplify_write(ret_ty, args, func),
        RegionOp::PredicateWrite => simplify_predicate_write(ret_ty, args, func),
        RegionOp::NotARegionOp => None,
    }
}

/// Whether a region of `ty`'s shape with these parameters covers `ty` lane for lane.
///
/// Mirrors the hardware rule: the starting element is 0 (or out of range), rows are laid
/// back to back, and lanes advance.
fn is_whole_region(
    func: &Function<'_>,
    ty: TypeRef<'_>,
    shape: &[ValueRef],
) -> bool {
    let &[vstride, width, stride, index] = shape else {
        return false;
    };
    let (Some(num_elements), Some(s)) = (ty.element_count(), ty.scalar_type()) else {
        return false;
    };
    let element_bytes = u64::from(s.byte_size());
    if element_bytes == 0 || func.value_type(index).is_vector() {
        return false;
    }
    let (Some(index), Some(width)) = (func.const_zext(index), func.const_zext(width)) else {
        return false;
    };

    let num_elements = u64::from(num_elements);
    let element_index = index / element_bytes;
    let starts_at_origin = element_index == 0 || element_index >= num_elements;
    let rows_contiguous = width == num_elements
        || func
            .const_sext(vstride)
            .is_some_and(|v| i64::try_from(width) == Ok(v));
    let lanes_advance = num_elements == 1 || func.const_sext(stride).is_some_and(|x| x != 0);

    starts_at_origin && rows_contiguous && lanes_advance
}

fn simplify_read<'t>(
    ret_ty: TypeRef<'t>,
    args: &[ValueRef],
    func: &Function<'t>,
) -> Option<Simplified<'t>> {
    let old = args[region_operand::OLD_VALUE];
    let old_ty = func.value_type(old);

    let shape = &args[region_operand::RD_VSTRIDE..][..region_operand::SHAPE_PARAMETER_COUNT];
    if old_ty == ret_ty && is_whole_region(func, ret_ty, shape) {
        return Some(Simplified::Existing(old));
    }

    // reading anything out of a splat yields the same lanes, whatever the index operand is,
    // so this also applies when the whole-region test above declined on the index
    if old_ty.scalar_type() != ret_ty.scalar_type() {
        return None;
    }
    let element = func.splat_value(old)?;
    Some(Simplified::Constant(Constant::splat(ret_ty, element)))
}

fn simplify_write<'t>(
    ret_ty: TypeRef<'t>,
    args: &[ValueRef],
    func: &Function<'t>,
) -> Option<Simplified<'t>> {
    let old = args[region_operand::OLD_VALUE];
    let new = args[region_operand::NEW_VALUE];
    let mask = func.as_constant(args[region_operand::PREDICATE]);
    let shape = &args[region_operand::WR_VSTRIDE..][..region_operand::SHAPE_PARAMETER_COUNT];

    if func.value_type(new) == ret_ty
        && mask.is_some_and(Constant::is_all_ones_value)
        && is_whole_region(func, ret_ty, shape)
    {
        return Some(Simplified::Existing(new));
    }

    if mask.is_some_and(Constant::is_null_value) {
        return Some(Simplified::Existing(old));
    }

    // writing back what was just read from the same place
    let rd = new
        .as_inst()
        .filter(|&r| func.intrinsic_id(r).is_some_and(IntrinsicId::is_rdregion))?;
    let rd_args = &func.inst(rd).operands;
    if rd_args.len() != region_operand::RD_OPERAND_COUNT {
        return None;
    }
    let rd_shape =
        &rd_args[region_operand::RD_VSTRIDE..][..region_operand::SHAPE_PARAMETER_COUNT];

    (rd_args[region_operand::OLD_VALUE] == old && rd_shape == shape)
        .then_some(Simplified::Existing(old))
}

fn simplify_predicate_write<'t>(
    ret_ty: TypeRef<'t>,
    args: &[ValueRef],
    func: &Function<'t>,
) -> Option<Simplified<'t>> {
    let new = args[pred_region_operand::NEW_VALUE];

    (func.value_type(new) == ret_ty
        && func.const_zext(args[pred_region_operand::WR_OFFSET]) == Some(0))
    .then_some(Simplified::Existing(new))
}

#[cfg(test)]
mod tests {
    use typed_arena::Arena;

    use super::*;
    use crate::{parser::parse_module, ty::TypeContext};

    /// Simplifies the instruction named `%r` in the first function of `source`.
    fn simplify_r(source: &str) -> Option<String> {
        let arena = Arena::new();
        let types = TypeContext::new(&arena);
        let module = parse_module(source, &types).unwrap();
        let f = &module.functions[0];
        let r = f
            .instructions()
            .find(|&i| f.inst(i).name.as_deref() == Some("r"))
            .unwrap();
        let data = f.inst(r);

        simplify_region_intrinsic(data.intrinsic_id()?, data.ty, &data.operands, f).map(|s| {
            match s {
                Simplified::Existing(v) => f.value_to_string(v),
                Simplified::Constant(c) => c.to_string(),
            }
        })
    }

    fn read(ret: &str, old: &str, shape: &str) -> String {
        format!(
            "define void @f(<4 x i32> %v, <4 x float> %fv, i16 %i, <2 x i16> %vi) {{
  %r = call {ret} @llvm.genx.rdregioni({old}, {shape}, i32 undef)
  ret void
}}"
        )
    }

    #[test]
    fn whole_read_is_the_source() {
        let whole = "i32 4, i32 4, i32 1, i16 0";
        assert_eq!(
            simplify_r(&read("<4 x i32>", "<4 x i32> %v", whole)),
            Some("<4 x i32> %v".into())
        );
        // rows laid back to back: width == vstride
        assert_eq!(
            simplify_r(&read("<4 x i32>", "<4 x i32> %v", "i32 2, i32 2, i32 1, i16 0")),
            Some("<4 x i32> %v".into())
        );
        // starting index past the end counts as the origin
        assert_eq!(
            simplify_r(&read("<4 x i32>", "<4 x i32> %v", "i32 4, i32 4, i32 1, i16 16")),
            Some("<4 x i32> %v".into())
        );
        assert_eq!(
            simplify_r(
                "define <4 x float> @f(<4 x float> %v) {
  %r = call <4 x float> @llvm.genx.rdregionf.v4f32.v4f32.i16(<4 x float> %v, i32 4, i32 4, i32 1, i16 0, i32 undef)
  ret <4 x float> %r
}"
            ),
            Some("<4 x float> %v".into())
        );
    }

    #[test]
    fn partial_reads_are_kept() {
        // starts at element 1
        assert_eq!(
            simplify_r(&read("<4 x i32>", "<4 x i32> %v", "i32 4, i32 4, i32 1, i16 4")),
            None
        );
        // rows overlap
        assert_eq!(
            simplify_r(&read("<4 x i32>", "<4 x i32> %v", "i32 0, i32 2, i32 1, i16 0")),
            None
        );
        // every lane reads the same element
        assert_eq!(
            simplify_r(&read("<4 x i32>", "<4 x i32> %v", "i32 4, i32 4, i32 0, i16 0")),
            None
        );
        // runtime index
        assert_eq!(
            simplify_r(&read("<4 x i32>", "<4 x i32> %v", "i32 4, i32 4, i32 1, i16 %i")),
            None
        );
        // vector index over a non-splat source
        assert_eq!(
            simplify_r(&read(
                "<4 x i32>",
                "<4 x i32> %v",
                "i32 4, i32 4, i32 1, <2 x i16> %vi"
            )),
            None
        );
    }

    #[test]
    fn single_lane_read_with_zero_stride() {
        assert_eq!(
            simplify_r(
                "define <1 x i32> @f(<1 x i32> %v) {
  %r = call <1 x i32> @llvm.genx.rdregioni(<1 x i32> %v, i32 0, i32 1, i32 0, i16 0, i32 undef)
  ret <1 x i32> %r
}"
            ),
            Some("<1 x i32> %v".into())
        );
    }

    #[test]
    fn reads_of_splats_are_splats() {
        let fives = "<4 x i32> <i32 5, i32 5, i32 5, i32 5>";
        assert_eq!(
            simplify_r(&read("<2 x i32>", fives, "i32 0, i32 2, i32 1, i16 %i")),
            Some("<2 x i32> <i32 5, i32 5>".into())
        );
        assert_eq!(
            simplify_r(&read("<2 x i32>", fives, "i32 8, i32 1, i32 0, <2 x i16> %vi")),
            Some("<2 x i32> <i32 5, i32 5>".into())
        );
        assert_eq!(
            simplify_r(&read("i32", "<4 x i32> zeroinitializer", "i32 0, i32 1, i32 0, i16 %i")),
            Some("i32 0".into())
        );
        assert_eq!(
            simplify_r(&read(
                "<2 x i32>",
                "<4 x i32> <i32 5, i32 6, i32 5, i32 5>",
                "i32 0, i32 2, i32 1, i16 %i"
            )),
            None
        );
    }

    fn write(new: &str, shape: &str, pred: &str) -> String {
        format!(
            "define void @f(<4 x i32> %old, <4 x i32> %new, <2 x i32> %narrow, i16 %i, <4 x i1> %p) {{
  %r = call <4 x i32> @llvm.genx.wrregioni(<4 x i32> %old, {new}, {shape}, i32 undef, {pred})
  ret void
}}"
        )
    }

    #[test]
    fn whole_unmasked_write_is_the_new_value() {
        let whole = "i32 4, i32 4, i32 1, i16 0";
        assert_eq!(
            simplify_r(&write("<4 x i32> %new", whole, "i1 true")),
            Some("<4 x i32> %new".into())
        );
        assert_eq!(
            simplify_r(&write(
                "<4 x i32> %new",
                whole,
                "<4 x i1> <i1 true, i1 true, i1 true, i1 true>"
            )),
            Some("<4 x i32> %new".into())
        );
        // some lanes masked off
        assert_eq!(
            simplify_r(&write(
                "<4 x i32> %new",
                whole,
                "<4 x i1> <i1 true, i1 false, i1 true, i1 true>"
            )),
            None
        );
        assert_eq!(simplify_r(&write("<4 x i32> %new", whole, "<4 x i1> %p")), None);
        // narrower than the destination
        assert_eq!(
            simplify_r(&write("<2 x i32> %narrow", "i32 2, i32 2, i32 1, i16 0", "i1 true")),
            None
        );
    }

    #[test]
    fn null_predicate_keeps_the_old_value() {
        assert_eq!(
            simplify_r(&write(
                "<2 x i32> %narrow",
                "i32 2, i32 2, i32 1, i16 4",
                "<4 x i1> zeroinitializer"
            )),
            Some("<4 x i32> %old".into())
        );
        // the whole-write rule declines on a runtime index, the mask still decides
        assert_eq!(
            simplify_r(&write("<4 x i32> %new", "i32 4, i32 4, i32 1, i16 %i", "i1 false")),
            Some("<4 x i32> %old".into())
        );
        assert_eq!(
            simplify_r(&write(
                "<4 x i32> undef",
                "i32 4, i32 4, i32 1, i16 0",
                "i1 false"
            )),
            Some("<4 x i32> %old".into())
        );
    }

    #[test]
    fn write_back_of_a_read_cancels() {
        let raw = |rd_shape: &str, wr_old: &str| {
            format!(
                "define <8 x i32> @f(<8 x i32> %old, <8 x i32> %other, <8 x i1> %p) {{
  %rd = call <2 x i32> @llvm.genx.rdregioni(<8 x i32> %old, {rd_shape}, i32 undef)
  %r = call <8 x i32> @llvm.genx.wrregioni(<8 x i32> {wr_old}, <2 x i32> %rd, i32 0, i32 2, i32 2, i16 4, i32 undef, <8 x i1> %p)
  ret <8 x i32> %r
}}"
            )
        };

        assert_eq!(
            simplify_r(&raw("i32 0, i32 2, i32 2, i16 4", "%old")),
            Some("<8 x i32> %old".into())
        );
        assert_eq!(simplify_r(&raw("i32 0, i32 2, i32 1, i16 4", "%old")), None);
        assert_eq!(simplify_r(&raw("i32 0, i32 2, i32 2, i16 4", "%other")), None);
    }

    #[test]
    fn constant_region_writes_are_never_simplified() {
        assert_eq!(
            simplify_r(
                "define <4 x i32> @f(<4 x i32> %old, <4 x i32> %new) {
  %r = call <4 x i32> @llvm.genx.wrconstregion(<4 x i32> %old, <4 x i32> %new, i32 4, i32 4, i32 1, i16 0, i32 undef, i1 false)
  ret <4 x i32> %r
}"
            ),
            None
        );
    }

    #[test]
    fn predicate_writes_at_offset_zero() {
        let pred_write = |new: &str, offset: &str| {
            format!(
                "define <4 x i1> @f(<4 x i1> %o, <4 x i1> %n, <2 x i1> %half) {{
  %r = call <4 x i1> @llvm.genx.wrpredregion.v4i1.v4i1(<4 x i1> %o, {new}, i32 {offset})
  ret <4 x i1> %r
}}"
            )
        };

        assert_eq!(
            simplify_r(&pred_write("<4 x i1> %n", "0")),
            Some("<4 x i1> %n".into())
        );
        assert_eq!(simplify_r(&pred_write("<4 x i1> %n", "4")), None);
        assert_eq!(simplify_r(&pred_write("<2 x i1> %half", "0")), None);
    }

    #[test]
    fn malformed_calls_decline() {
        assert_eq!(
            simplify_r(
                "define <4 x i32> @f(<4 x i32> %v) {
  %r = call <4 x i32> @llvm.genx.rdregioni(<4 x i32> %v, i32 4, i32 4)
  ret <4 x i32> %r
}"
            ),
            None
        );
        // predicate lanes have no byte layout
        assert_eq!(
            simplify_r(
                "define <4 x i1> @f(<4 x i1> %v) {
  %r = call <4 x i1> @llvm.genx.rdregioni(<4 x i1> %v, i32 4, i32 4, i32 1, i16 0, i32 undef)
  ret <4 x i1> %r
}"
            ),
            None
        );
    }
}
