use crate::ty::TypeRef;

pub mod constant;
pub mod function;
pub mod intrinsic;
mod print;
pub mod region;

pub use self::constant::{Constant, ConstantKind, ConstantPool, ScalarConst};
pub use self::function::Function;
pub use self::intrinsic::IntrinsicId;

#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstRef(pub usize);
impl core::fmt::Debug for InstRef {
    #[inline(always)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockRef(pub usize);

#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstRef(pub usize);
impl core::fmt::Debug for ConstRef {
    #[inline(always)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// An operand: a function argument, an interned constant, or the result of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueRef {
    Arg(usize),
    Const(ConstRef),
    Inst(InstRef),
}
impl ValueRef {
    #[inline(always)]
    pub const fn as_inst(self) -> Option<InstRef> {
        match self {
            Self::Inst(r) => Some(r),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn as_const(self) -> Option<ConstRef> {
        match self {
            Self::Const(r) => Some(r),
            _ => None,
        }
    }
}
impl From<InstRef> for ValueRef {
    #[inline(always)]
    fn from(value: InstRef) -> Self {
        Self::Inst(value)
    }
}
impl From<ConstRef> for ValueRef {
    #[inline(always)]
    fn from(value: ConstRef) -> Self {
        Self::Const(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
}
impl BinaryOp {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "add" => Some(Self::Add),
            "sub" => Some(Self::Sub),
            "mul" => Some(Self::Mul),
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "xor" => Some(Self::Xor),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
        }
    }

    /// Integer semantics on masked lanes; wrapping like the hardware.
    pub const fn apply(self, a: u64, b: u64) -> u64 {
        match self {
            Self::Add => a.wrapping_add(b),
            Self::Sub => a.wrapping_sub(b),
            Self::Mul => a.wrapping_mul(b),
            Self::And => a & b,
            Self::Or => a | b,
            Self::Xor => a ^ b,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstKind {
    Call {
        callee: String,
        intrinsic: Option<IntrinsicId>,
    },
    Binary(BinaryOp),
    Select,
    BitCast,
    Ret,
    Br(BlockRef),
    CondBr {
        then_block: BlockRef,
        else_block: BlockRef,
    },
}
impl InstKind {
    pub fn call(callee: impl Into<String>) -> Self {
        let callee = callee.into();
        let intrinsic = IntrinsicId::lookup(&callee);

        Self::Call { callee, intrinsic }
    }
}

#[derive(Debug, Clone)]
pub struct InstData<'t> {
    pub name: Option<String>,
    pub ty: TypeRef<'t>,
    pub kind: InstKind,
    pub operands: Vec<ValueRef>,
    /// One entry per use, so an instruction using a value twice is listed twice.
    pub users: Vec<InstRef>,
    pub block: BlockRef,
}
impl InstData<'_> {
    #[inline]
    pub fn intrinsic_id(&self) -> Option<IntrinsicId> {
        match self.kind {
            InstKind::Call { intrinsic, .. } => intrinsic,
            _ => None,
        }
    }

    pub fn relocate_operands(&mut self, mut relocator: impl FnMut(&mut ValueRef)) -> bool {
        self.operands.iter_mut().fold(false, |modified, x| {
            let x0 = *x;
            relocator(x);
            modified || *x != x0
        })
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub label: String,
    pub instructions: Vec<InstRef>,
}

#[derive(Debug, Clone)]
pub struct Argument<'t> {
    pub name: String,
    pub ty: TypeRef<'t>,
}

#[derive(Debug, Clone, Default)]
pub struct Module<'t> {
    pub functions: Vec<Function<'t>>,
}
