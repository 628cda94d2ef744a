use std::collections::HashMap;

use crate::ty::{ScalarType, TypeRef};

use super::ConstRef;

/// A single lane of a constant. Integers are stored zero-extended and masked to their
/// bit width; floating point lanes keep the bits of the value widened to `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarConst {
    Int(u64),
    Float(u64),
}
impl ScalarConst {
    #[inline]
    pub const fn zero(ty: ScalarType) -> Self {
        if ty.is_float() {
            Self::Float(0)
        } else {
            Self::Int(0)
        }
    }

    #[inline]
    pub const fn int(ty: ScalarType, value: i64) -> Self {
        Self::Int(value as u64 & ty.int_mask())
    }

    #[inline]
    pub fn float(value: f64) -> Self {
        Self::Float(value.to_bits())
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        matches!(self, Self::Int(0) | Self::Float(0))
    }

    #[inline]
    pub const fn is_all_ones(self, ty: ScalarType) -> bool {
        match self {
            Self::Int(v) => v == ty.int_mask(),
            Self::Float(_) => false,
        }
    }

    #[inline]
    pub const fn zext(self) -> Option<u64> {
        match self {
            Self::Int(v) => Some(v),
            Self::Float(_) => None,
        }
    }

    pub const fn sext(self, ty: ScalarType) -> Option<i64> {
        match self {
            Self::Int(v) => {
                let shift = 64 - ty.bit_width();
                Some(((v << shift) as i64) >> shift)
            }
            Self::Float(_) => None,
        }
    }

    pub fn write(
        self,
        ty: ScalarType,
        f: &mut (impl std::fmt::Write + ?Sized),
    ) -> std::fmt::Result {
        match (ty, self) {
            (ScalarType::I1, Self::Int(v)) => f.write_str(if v != 0 { "true" } else { "false" }),
            (_, Self::Int(_)) => write!(f, "{}", self.sext(ty).unwrap_or_default()),
            (_, Self::Float(bits)) if f64::from_bits(bits).is_finite() => {
                write!(f, "{:?}", f64::from_bits(bits))
            }
            // nan and infinities have no decimal spelling
            (_, Self::Float(bits)) => write!(f, "0x{bits:016X}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstantKind {
    Undef,
    /// `zeroinitializer`
    Zero,
    Scalar(ScalarConst),
    Vector(Vec<ScalarConst>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constant<'t> {
    pub ty: TypeRef<'t>,
    pub kind: ConstantKind,
}
impl<'t> Constant<'t> {
    #[inline]
    pub const fn undef(ty: TypeRef<'t>) -> Self {
        Self {
            ty,
            kind: ConstantKind::Undef,
        }
    }

    #[inline]
    pub const fn zero(ty: TypeRef<'t>) -> Self {
        Self {
            ty,
            kind: ConstantKind::Zero,
        }
    }

    #[inline]
    pub const fn scalar(ty: TypeRef<'t>, value: ScalarConst) -> Self {
        Self {
            ty,
            kind: ConstantKind::Scalar(value),
        }
    }

    #[inline]
    pub fn vector(ty: TypeRef<'t>, elements: Vec<ScalarConst>) -> Self {
        Self {
            ty,
            kind: ConstantKind::Vector(elements),
        }
    }

    /// Broadcasts `element` over every lane of `ty`.
    pub fn splat(ty: TypeRef<'t>, element: ScalarConst) -> Self {
        match ty.element_count() {
            Some(n) if ty.is_vector() => {
                Self::vector(ty, vec![element; n as usize]).canonicalize()
            }
            _ => Self::scalar(ty, element),
        }
    }

    /// Uniqued form: an all-null vector is `zeroinitializer`, a null scalar is a plain zero.
    pub fn canonicalize(self) -> Self {
        match self.kind {
            ConstantKind::Vector(ref xs) if xs.iter().all(|x| x.is_null()) => Self::zero(self.ty),
            ConstantKind::Zero if !self.ty.is_vector() => match self.ty.scalar_type() {
                Some(s) => Self::scalar(self.ty, ScalarConst::zero(s)),
                None => self,
            },
            _ => self,
        }
    }

    #[inline]
    pub const fn is_undef(&self) -> bool {
        matches!(self.kind, ConstantKind::Undef)
    }

    /// The common lane value of a vector constant whose lanes are all equal.
    pub fn splat_value(&self) -> Option<ScalarConst> {
        if !self.ty.is_vector() {
            return None;
        }

        match self.kind {
            ConstantKind::Zero => self.ty.scalar_type().map(ScalarConst::zero),
            ConstantKind::Vector(ref xs) => {
                let (&first, rest) = xs.split_first()?;
                rest.iter().all(|&x| x == first).then_some(first)
            }
            ConstantKind::Undef | ConstantKind::Scalar(_) => None,
        }
    }

    pub fn is_null_value(&self) -> bool {
        match self.kind {
            ConstantKind::Zero => true,
            ConstantKind::Scalar(x) => x.is_null(),
            ConstantKind::Vector(ref xs) => xs.iter().all(|x| x.is_null()),
            ConstantKind::Undef => false,
        }
    }

    pub fn is_all_ones_value(&self) -> bool {
        let Some(s) = self.ty.scalar_type() else {
            return false;
        };

        match self.kind {
            ConstantKind::Scalar(x) => x.is_all_ones(s),
            ConstantKind::Vector(ref xs) => xs.iter().all(|x| x.is_all_ones(s)),
            ConstantKind::Zero | ConstantKind::Undef => false,
        }
    }

    /// The value of a scalar constant.
    pub fn as_scalar(&self) -> Option<ScalarConst> {
        match self.kind {
            ConstantKind::Scalar(x) => Some(x),
            ConstantKind::Zero if !self.ty.is_vector() => self.ty.scalar_type().map(ScalarConst::zero),
            _ => None,
        }
    }

    /// Every lane, in order. `None` for `undef`.
    pub fn elements(&self) -> Option<Vec<ScalarConst>> {
        match self.kind {
            ConstantKind::Undef => None,
            ConstantKind::Zero => {
                let s = self.ty.scalar_type()?;
                Some(vec![ScalarConst::zero(s); self.ty.element_count()? as usize])
            }
            ConstantKind::Scalar(x) => Some(vec![x]),
            ConstantKind::Vector(ref xs) => Some(xs.clone()),
        }
    }

    /// Writes the literal without its type prefix.
    pub fn write_literal(&self, f: &mut (impl std::fmt::Write + ?Sized)) -> std::fmt::Result {
        match self.kind {
            ConstantKind::Undef => f.write_str("undef"),
            ConstantKind::Zero => f.write_str("zeroinitializer"),
            ConstantKind::Scalar(x) => match self.ty.scalar_type() {
                Some(s) => x.write(s, f),
                None => f.write_str("undef"),
            },
            ConstantKind::Vector(ref xs) => {
                let Some(s) = self.ty.scalar_type() else {
                    return f.write_str("undef");
                };
                f.write_char('<')?;
                for (n, x) in xs.iter().enumerate() {
                    if n > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{s} ")?;
                    x.write(s, f)?;
                }
                f.write_char('>')
            }
        }
    }
}

impl core::fmt::Display for Constant<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ", self.ty)?;
        self.write_literal(f)
    }
}

/// Per-function constant table. Equal constants share one [`ConstRef`], which makes value
/// identity comparisons on constant operands meaningful.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool<'t> {
    constants: Vec<Constant<'t>>,
    index: HashMap<Constant<'t>, ConstRef>,
}
impl<'t> ConstantPool<'t> {
    pub fn new() -> Self {
        Self {
            constants: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn intern(&mut self, c: Constant<'t>) -> ConstRef {
        let c = c.canonicalize();
        if let Some(&r) = self.index.get(&c) {
            return r;
        }

        let r = ConstRef(self.constants.len());
        self.constants.push(c.clone());
        self.index.insert(c, r);
        r
    }

    #[inline]
    pub fn get(&self, r: ConstRef) -> &Constant<'t> {
        &self.constants[r.0]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use typed_arena::Arena;

    use super::*;
    use crate::ty::TypeContext;

    #[test]
    fn splat_detection() {
        let arena = Arena::new();
        let types = TypeContext::new(&arena);
        let v4i32 = types.vector(ScalarType::I32, 4);

        let fives = Constant::splat(v4i32, ScalarConst::int(ScalarType::I32, 5));
        assert_eq!(fives.splat_value(), Some(ScalarConst::Int(5)));

        let mixed = Constant::vector(
            v4i32,
            [1, 2, 1, 1]
                .into_iter()
                .map(|x| ScalarConst::int(ScalarType::I32, x))
                .collect(),
        );
        assert_eq!(mixed.splat_value(), None);

        assert_eq!(Constant::zero(v4i32).splat_value(), Some(ScalarConst::Int(0)));
        assert_eq!(Constant::undef(v4i32).splat_value(), None);
        let scalar = Constant::scalar(types.scalar(ScalarType::I32), ScalarConst::Int(5));
        assert_eq!(scalar.splat_value(), None);
    }

    #[test]
    fn predicate_masks() {
        let arena = Arena::new();
        let types = TypeContext::new(&arena);
        let v4i1 = types.vector(ScalarType::I1, 4);

        let all_true = Constant::splat(v4i1, ScalarConst::int(ScalarType::I1, 1));
        assert!(all_true.is_all_ones_value());
        assert!(!all_true.is_null_value());
        assert!(Constant::zero(v4i1).is_null_value());
        assert!(!Constant::undef(v4i1).is_null_value());
        assert!(!Constant::undef(v4i1).is_all_ones_value());

        let scalar_true = Constant::scalar(types.scalar(ScalarType::I1), ScalarConst::Int(1));
        assert!(scalar_true.is_all_ones_value());
    }

    #[test]
    fn pool_uniques_equal_constants() {
        let arena = Arena::new();
        let types = TypeContext::new(&arena);
        let v2i16 = types.vector(ScalarType::I16, 2);
        let mut pool = ConstantPool::new();

        let a = pool.intern(Constant::splat(v2i16, ScalarConst::int(ScalarType::I16, -1)));
        let b = pool.intern(Constant::vector(
            v2i16,
            vec![ScalarConst::Int(0xffff), ScalarConst::Int(0xffff)],
        ));
        assert_eq!(a, b);

        // all-null vectors collapse into zeroinitializer
        let z = pool.intern(Constant::splat(v2i16, ScalarConst::Int(0)));
        assert_eq!(z, pool.intern(Constant::zero(v2i16)));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn sign_extension_and_literals() {
        let arena = Arena::new();
        let types = TypeContext::new(&arena);
        let x = ScalarConst::int(ScalarType::I16, -4);
        assert_eq!(x.zext(), Some(0xfffc));
        assert_eq!(x.sext(ScalarType::I16), Some(-4));

        let mut s = String::new();
        Constant::vector(
            types.vector(ScalarType::I1, 2),
            vec![ScalarConst::Int(1), ScalarConst::Int(0)],
        )
        .write_literal(&mut s)
        .unwrap();
        assert_eq!(s, "<i1 true, i1 false>");
    }
}
