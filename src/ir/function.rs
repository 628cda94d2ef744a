use crate::ty::TypeRef;

use super::{
    Argument, Block, BlockRef, ConstRef, Constant, ConstantPool, InstData, InstKind, InstRef,
    IntrinsicId, ScalarConst, ValueRef,
};

/// A function body: an arena of instruction slots addressed by [`InstRef`], the blocks that
/// order them, and the function's constant table.
///
/// Erased instructions leave an empty slot behind so that handles stay stable.
#[derive(Debug, Clone)]
pub struct Function<'t> {
    pub name: String,
    pub args: Vec<Argument<'t>>,
    pub return_type: TypeRef<'t>,
    pub blocks: Vec<Block>,
    instructions: Vec<Option<InstData<'t>>>,
    constants: ConstantPool<'t>,
}
impl<'t> Function<'t> {
    pub fn new(name: impl Into<String>, args: Vec<Argument<'t>>, return_type: TypeRef<'t>) -> Self {
        Self {
            name: name.into(),
            args,
            return_type,
            blocks: Vec::new(),
            instructions: Vec::new(),
            constants: ConstantPool::new(),
        }
    }

    pub fn add_block(&mut self, label: impl Into<String>) -> BlockRef {
        self.blocks.push(Block {
            label: label.into(),
            instructions: Vec::new(),
        });

        BlockRef(self.blocks.len() - 1)
    }

    #[inline]
    pub fn block(&self, b: BlockRef) -> &Block {
        &self.blocks[b.0]
    }

    /// Appends an instruction at the end of `block` and registers it as a user of its operands.
    pub fn append(
        &mut self,
        block: BlockRef,
        name: Option<String>,
        ty: TypeRef<'t>,
        kind: InstKind,
        operands: Vec<ValueRef>,
    ) -> InstRef {
        let r = InstRef(self.instructions.len());
        for x in operands.iter() {
            if let &ValueRef::Inst(src) = x {
                self.inst_mut(src).users.push(r);
            }
        }
        self.instructions.push(Some(InstData {
            name,
            ty,
            kind,
            operands,
            users: Vec::new(),
            block,
        }));
        self.blocks[block.0].instructions.push(r);

        r
    }

    #[inline]
    pub fn get(&self, r: InstRef) -> Option<&InstData<'t>> {
        self.instructions.get(r.0).and_then(Option::as_ref)
    }

    #[inline]
    pub fn contains(&self, r: InstRef) -> bool {
        self.get(r).is_some()
    }

    /// Panics on an erased handle: holding one is a bug in the caller.
    #[inline]
    pub fn inst(&self, r: InstRef) -> &InstData<'t> {
        match self.get(r) {
            Some(x) => x,
            None => panic!("use of erased instruction {r:?}"),
        }
    }

    #[inline]
    fn inst_mut(&mut self, r: InstRef) -> &mut InstData<'t> {
        match self.instructions.get_mut(r.0).and_then(Option::as_mut) {
            Some(x) => x,
            None => panic!("use of erased instruction {r:?}"),
        }
    }

    /// Live instructions in program order.
    pub fn instructions(&self) -> impl Iterator<Item = InstRef> + '_ {
        self.blocks
            .iter()
            .flat_map(|b| b.instructions.iter().copied())
    }

    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instructions.len()).sum()
    }

    #[inline]
    pub fn operand(&self, inst: InstRef, index: usize) -> ValueRef {
        self.inst(inst).operands[index]
    }

    pub fn value_type(&self, v: ValueRef) -> TypeRef<'t> {
        match v {
            ValueRef::Arg(n) => self.args[n].ty,
            ValueRef::Const(c) => self.constants.get(c).ty,
            ValueRef::Inst(i) => self.inst(i).ty,
        }
    }

    #[inline]
    pub fn constant(&mut self, c: Constant<'t>) -> ValueRef {
        ValueRef::Const(self.constants.intern(c))
    }

    #[inline]
    pub fn constant_data(&self, r: ConstRef) -> &Constant<'t> {
        self.constants.get(r)
    }

    #[inline]
    pub fn as_constant(&self, v: ValueRef) -> Option<&Constant<'t>> {
        v.as_const().map(|c| self.constants.get(c))
    }

    #[inline]
    pub fn is_undef(&self, v: ValueRef) -> bool {
        self.as_constant(v).is_some_and(Constant::is_undef)
    }

    #[inline]
    pub fn splat_value(&self, v: ValueRef) -> Option<ScalarConst> {
        self.as_constant(v).and_then(Constant::splat_value)
    }

    /// Zero-extended value of a scalar integer constant.
    pub fn const_zext(&self, v: ValueRef) -> Option<u64> {
        self.as_constant(v)?.as_scalar()?.zext()
    }

    /// Sign-extended value of a scalar integer constant.
    pub fn const_sext(&self, v: ValueRef) -> Option<i64> {
        let c = self.as_constant(v)?;
        c.as_scalar()?.sext(c.ty.scalar_type()?)
    }

    #[inline]
    pub fn intrinsic_id(&self, inst: InstRef) -> Option<IntrinsicId> {
        self.inst(inst).intrinsic_id()
    }

    #[inline]
    pub fn is_genx_intrinsic(&self, inst: InstRef) -> bool {
        self.intrinsic_id(inst).is_some()
    }

    /// Redirects every use of `inst` to `value`. `inst` is left without users.
    pub fn replace_all_uses_with(&mut self, inst: InstRef, value: ValueRef) {
        assert_ne!(
            value,
            ValueRef::Inst(inst),
            "replacing {inst:?} with itself"
        );

        let mut users = core::mem::take(&mut self.inst_mut(inst).users);
        users.sort();
        users.dedup();
        for u in users {
            let mut redirected = 0;
            self.inst_mut(u).relocate_operands(|x| {
                if *x == ValueRef::Inst(inst) {
                    *x = value;
                    redirected += 1;
                }
            });
            if let ValueRef::Inst(target) = value {
                let target_users = &mut self.inst_mut(target).users;
                target_users.extend(core::iter::repeat(u).take(redirected));
            }
        }
    }

    /// Removes an instruction that no longer has any user.
    pub fn erase(&mut self, inst: InstRef) {
        let data = match self.instructions.get_mut(inst.0).and_then(Option::take) {
            Some(x) => x,
            None => panic!("erasing already erased instruction {inst:?}"),
        };
        assert!(
            data.users.is_empty(),
            "erasing {inst:?} which still has users {:?}",
            data.users
        );

        for x in data.operands.iter() {
            if let &ValueRef::Inst(src) = x {
                let users = &mut self.inst_mut(src).users;
                if let Some(p) = users.iter().position(|&u| u == inst) {
                    users.swap_remove(p);
                }
            }
        }
        self.blocks[data.block.0].instructions.retain(|&x| x != inst);
    }
}

#[cfg(test)]
mod tests {
    use typed_arena::Arena;

    use super::*;
    use crate::ir::BinaryOp;
    use crate::ty::{ScalarType, TypeContext};

    #[test]
    fn use_lists_follow_replacement_and_erasure() {
        let arena = Arena::new();
        let types = TypeContext::new(&arena);
        let i32t = types.scalar(ScalarType::I32);
        let mut f = Function::new(
            "f",
            vec![Argument {
                name: "a".into(),
                ty: i32t,
            }],
            i32t,
        );
        let entry = f.add_block("entry");
        let one = f.constant(Constant::scalar(i32t, ScalarConst::Int(1)));
        let x = f.append(
            entry,
            Some("x".into()),
            i32t,
            InstKind::Binary(BinaryOp::Add),
            vec![ValueRef::Arg(0), one],
        );
        let y = f.append(
            entry,
            Some("y".into()),
            i32t,
            InstKind::Binary(BinaryOp::Mul),
            vec![x.into(), x.into()],
        );
        let ret = f.append(entry, None, types.void(), InstKind::Ret, vec![y.into()]);
        assert_eq!(f.inst(x).users, vec![y, y]);

        f.replace_all_uses_with(x, ValueRef::Arg(0));
        assert!(f.inst(x).users.is_empty());
        assert_eq!(f.inst(y).operands, vec![ValueRef::Arg(0), ValueRef::Arg(0)]);

        f.erase(x);
        assert!(!f.contains(x));
        assert_eq!(f.instructions().collect::<Vec<_>>(), vec![y, ret]);

        // redirecting onto an instruction keeps that instruction's use list exact
        let z = f.append(
            entry,
            Some("z".into()),
            i32t,
            InstKind::Binary(BinaryOp::Add),
            vec![ValueRef::Arg(0), one],
        );
        f.replace_all_uses_with(y, z.into());
        assert_eq!(f.inst(z).users, vec![ret]);
    }

    #[test]
    #[should_panic(expected = "still has users")]
    fn erasing_a_used_instruction_is_a_bug() {
        let arena = Arena::new();
        let types = TypeContext::new(&arena);
        let i32t = types.scalar(ScalarType::I32);
        let mut f = Function::new("f", Vec::new(), i32t);
        let entry = f.add_block("entry");
        let one = f.constant(Constant::scalar(i32t, ScalarConst::Int(1)));
        let x = f.append(
            entry,
            None,
            i32t,
            InstKind::Binary(BinaryOp::Add),
            vec![one, one],
        );
        f.append(entry, None, types.void(), InstKind::Ret, vec![x.into()]);

        f.erase(x);
    }
}
