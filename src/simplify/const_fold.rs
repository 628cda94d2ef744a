use crate::ir::{intrinsic::region_operand, region::Region, Constant, Function, InstRef};

use super::classify::RegionOp;

/// Evaluates GenX intrinsic calls whose inputs are all constant.
pub trait ConstantFolder {
    fn fold<'t>(&self, func: &Function<'t>, inst: InstRef) -> Option<Constant<'t>>;
}

/// Folds region reads and writes by evaluating the region lane by lane.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegionConstantFolder;
impl ConstantFolder for RegionConstantFolder {
    fn fold<'t>(&self, func: &Function<'t>, inst: InstRef) -> Option<Constant<'t>> {
        match RegionOp::of(func, inst) {
            RegionOp::Read => fold_read(func, inst),
            RegionOp::Write => fold_write(func, inst),
            RegionOp::PredicateWrite | RegionOp::NotARegionOp => None,
        }
    }
}

fn fold_read<'t>(func: &Function<'t>, inst: InstRef) -> Option<Constant<'t>> {
    let data = func.inst(inst);
    let old = func.as_constant(*data.operands.get(region_operand::OLD_VALUE)?)?;
    if old.ty.scalar_type() != data.ty.scalar_type() {
        return None;
    }
    if old.is_undef() {
        return Some(Constant::undef(data.ty));
    }

    let region = Region::of_read(func, inst)?;
    let lanes = old.elements()?;
    let picked = region
        .element_offsets(u32::try_from(lanes.len()).ok()?)?
        .into_iter()
        .map(|n| lanes[n])
        .collect::<Vec<_>>();

    Some(if data.ty.is_vector() {
        Constant::vector(data.ty, picked).canonicalize()
    } else {
        Constant::scalar(data.ty, *picked.first()?)
    })
}

fn fold_write<'t>(func: &Function<'t>, inst: InstRef) -> Option<Constant<'t>> {
    let data = func.inst(inst);
    let constant_operand = |n: usize| func.as_constant(*data.operands.get(n)?);
    let old = constant_operand(region_operand::OLD_VALUE)?;
    let new = constant_operand(region_operand::NEW_VALUE)?;
    let mask = constant_operand(region_operand::PREDICATE)?;
    if old.ty != data.ty || !data.ty.is_vector() {
        return None;
    }

    let region = Region::of_write(func, inst)?;
    let mut lanes = old.elements()?;
    let written = new.elements()?;
    let enabled = mask.elements()?;
    let offsets = region.element_offsets(u32::try_from(lanes.len()).ok()?)?;

    for (n, (dst, value)) in offsets.into_iter().zip(written).enumerate() {
        // a scalar predicate covers every lane
        let on = match enabled.as_slice() {
            &[single] => single,
            xs => *xs.get(n)?,
        };
        if !on.is_null() {
            lanes[dst] = value;
        }
    }

    Some(Constant::vector(data.ty, lanes).canonicalize())
}
