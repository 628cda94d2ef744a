//! Target-independent simplification of ordinary instructions.

use crate::ir::{BinaryOp, Constant, Function, InstKind, InstRef, ScalarConst, ValueRef};

use super::Simplified;

/// Simplification of instructions that are not GenX intrinsic calls.
pub trait InstSimplify {
    fn simplify<'t>(&self, func: &Function<'t>, inst: InstRef) -> Option<Simplified<'t>>;
}

/// Integer algebraic identities, integer constant folding, trivial selects and no-op bitcasts.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicInstSimplify;
impl InstSimplify for BasicInstSimplify {
    fn simplify<'t>(&self, func: &Function<'t>, inst: InstRef) -> Option<Simplified<'t>> {
        let data = func.inst(inst);

        match (&data.kind, data.operands.as_slice()) {
            (&InstKind::Binary(op), &[lhs, rhs]) => simplify_binary(func, inst, op, lhs, rhs),
            (InstKind::Select, &[cond, then_value, else_value]) => {
                if then_value == else_value {
                    return Some(Simplified::Existing(then_value));
                }

                let c = func.as_constant(cond)?;
                if c.is_all_ones_value() {
                    Some(Simplified::Existing(then_value))
                } else if c.is_null_value() {
                    Some(Simplified::Existing(else_value))
                } else {
                    None
                }
            }
            (InstKind::BitCast, &[src]) => {
                (func.value_type(src) == data.ty).then_some(Simplified::Existing(src))
            }
            _ => None,
        }
    }
}

/// Whether `v` is a constant whose lanes all satisfy `pred`.
fn all_lanes(func: &Function<'_>, v: ValueRef, pred: impl Fn(ScalarConst) -> bool) -> bool {
    func.as_constant(v)
        .and_then(Constant::elements)
        .is_some_and(|xs| xs.into_iter().all(pred))
}

fn simplify_binary<'t>(
    func: &Function<'t>,
    inst: InstRef,
    op: BinaryOp,
    lhs: ValueRef,
    rhs: ValueRef,
) -> Option<Simplified<'t>> {
    let ty = func.inst(inst).ty;
    let s = ty.scalar_type().filter(|s| !s.is_float())?;
    let zero = || Simplified::Constant(Constant::splat(ty, ScalarConst::Int(0)));
    let is_zero = |v| all_lanes(func, v, |x| x == ScalarConst::Int(0));
    let is_one = |v| all_lanes(func, v, |x| x == ScalarConst::Int(1));

    if let (Some(a), Some(b)) = (
        func.as_constant(lhs).and_then(Constant::elements),
        func.as_constant(rhs).and_then(Constant::elements),
    ) {
        let folded = a
            .into_iter()
            .zip(b)
            .map(|(x, y)| Some(ScalarConst::Int(op.apply(x.zext()?, y.zext()?) & s.int_mask())))
            .collect::<Option<Vec<_>>>()?;

        return Some(Simplified::Constant(if ty.is_vector() {
            Constant::vector(ty, folded).canonicalize()
        } else {
            Constant::scalar(ty, *folded.first()?)
        }));
    }

    match op {
        BinaryOp::Add | BinaryOp::Or if is_zero(rhs) => Some(Simplified::Existing(lhs)),
        BinaryOp::Add | BinaryOp::Or if is_zero(lhs) => Some(Simplified::Existing(rhs)),
        BinaryOp::Sub if is_zero(rhs) => Some(Simplified::Existing(lhs)),
        BinaryOp::Mul if is_one(rhs) => Some(Simplified::Existing(lhs)),
        BinaryOp::Mul if is_one(lhs) => Some(Simplified::Existing(rhs)),
        BinaryOp::Mul | BinaryOp::And if is_zero(rhs) || is_zero(lhs) => Some(zero()),
        BinaryOp::Sub | BinaryOp::Xor if lhs == rhs => Some(zero()),
        BinaryOp::And | BinaryOp::Or if lhs == rhs => Some(Simplified::Existing(lhs)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use typed_arena::Arena;

    use super::*;
    use crate::{parser::parse_module, ty::TypeContext};

    fn simplify_r(body: &str) -> Option<String> {
        let arena = Arena::new();
        let types = TypeContext::new(&arena);
        let module = parse_module(
            &format!(
                "define void @f(i32 %a, i32 %b, <2 x i16> %v, i1 %c, <2 x i1> %vc) {{\n  {body}\n  ret void\n}}"
            ),
            &types,
        )
        .unwrap();
        let f = &module.functions[0];
        let r = f.instructions().next().unwrap();

        BasicInstSimplify.simplify(f, r).map(|s| match s {
            Simplified::Existing(v) => f.value_to_string(v),
            Simplified::Constant(c) => c.to_string(),
        })
    }

    #[test]
    fn integer_identities() {
        assert_eq!(simplify_r("%r = add i32 %a, 0"), Some("i32 %a".into()));
        assert_eq!(simplify_r("%r = add i32 0, %a"), Some("i32 %a".into()));
        assert_eq!(simplify_r("%r = sub i32 %a, 0"), Some("i32 %a".into()));
        assert_eq!(simplify_r("%r = sub i32 0, %a"), None);
        assert_eq!(simplify_r("%r = sub i32 %a, %a"), Some("i32 0".into()));
        assert_eq!(simplify_r("%r = mul i32 %a, 1"), Some("i32 %a".into()));
        assert_eq!(simplify_r("%r = mul i32 %a, 0"), Some("i32 0".into()));
        assert_eq!(simplify_r("%r = and i32 %a, %a"), Some("i32 %a".into()));
        assert_eq!(simplify_r("%r = and i32 0, %a"), Some("i32 0".into()));
        assert_eq!(simplify_r("%r = or i32 %a, %a"), Some("i32 %a".into()));
        assert_eq!(simplify_r("%r = or i32 %a, 0"), Some("i32 %a".into()));
        assert_eq!(simplify_r("%r = xor i32 %a, %a"), Some("i32 0".into()));
        assert_eq!(simplify_r("%r = add i32 %a, %b"), None);
        assert_eq!(
            simplify_r("%r = xor <2 x i16> %v, %v"),
            Some("<2 x i16> zeroinitializer".into())
        );
        assert_eq!(
            simplify_r("%r = mul <2 x i16> %v, <i16 1, i16 1>"),
            Some("<2 x i16> %v".into())
        );
    }

    #[test]
    fn integer_constant_folding_wraps() {
        assert_eq!(
            simplify_r("%r = add i32 2147483647, 1"),
            Some("i32 -2147483648".into())
        );
        assert_eq!(
            simplify_r("%r = sub <2 x i16> <i16 1, i16 5>, <i16 2, i16 5>"),
            Some("<2 x i16> <i16 -1, i16 0>".into())
        );
        assert_eq!(simplify_r("%r = add i32 undef, 1"), None);
    }

    #[test]
    fn selects_and_bitcasts() {
        assert_eq!(simplify_r("%r = select i1 true, i32 %a, i32 %b"), Some("i32 %a".into()));
        assert_eq!(simplify_r("%r = select i1 false, i32 %a, i32 %b"), Some("i32 %b".into()));
        assert_eq!(simplify_r("%r = select i1 %c, i32 %a, i32 %a"), Some("i32 %a".into()));
        assert_eq!(simplify_r("%r = select i1 %c, i32 %a, i32 %b"), None);
        assert_eq!(
            simplify_r("%r = select <2 x i1> <i1 true, i1 false>, <2 x i16> %v, <2 x i16> zeroinitializer"),
            None
        );
        assert_eq!(simplify_r("%r = bitcast i32 %a to i32"), Some("i32 %a".into()));
        assert_eq!(simplify_r("%r = bitcast i32 %a to float"), None);
    }
}
