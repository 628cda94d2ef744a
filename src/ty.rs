use std::{cell::RefCell, collections::HashMap};

use typed_arena::Arena;

use crate::utils::Interned;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    I1,
    I8,
    I16,
    I32,
    I64,
    Half,
    Float,
    Double,
}
impl ScalarType {
    #[inline(always)]
    pub const fn bit_width(self) -> u32 {
        match self {
            Self::I1 => 1,
            Self::I8 => 8,
            Self::I16 | Self::Half => 16,
            Self::I32 | Self::Float => 32,
            Self::I64 | Self::Double => 64,
        }
    }

    /// Storage size in whole bytes. Zero for `i1`, which has no byte-addressable layout.
    #[inline(always)]
    pub const fn byte_size(self) -> u32 {
        self.bit_width() / 8
    }

    #[inline(always)]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Half | Self::Float | Self::Double)
    }

    #[inline(always)]
    pub const fn int_mask(self) -> u64 {
        match self.bit_width() {
            64 => u64::MAX,
            w => (1u64 << w) - 1,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "i1" => Some(Self::I1),
            "i8" => Some(Self::I8),
            "i16" => Some(Self::I16),
            "i32" => Some(Self::I32),
            "i64" => Some(Self::I64),
            "half" => Some(Self::Half),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::I1 => "i1",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Half => "half",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}
impl core::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Void,
    Scalar(ScalarType),
    Vector(ScalarType, u32),
}
impl ValueType {
    #[inline(always)]
    pub const fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            Self::Void => None,
            &Self::Scalar(s) | &Self::Vector(s, _) => Some(s),
        }
    }

    /// Number of lanes; scalars count as a single lane.
    #[inline(always)]
    pub const fn element_count(&self) -> Option<u32> {
        match self {
            Self::Void => None,
            Self::Scalar(_) => Some(1),
            &Self::Vector(_, n) => Some(n),
        }
    }

    #[inline(always)]
    pub const fn is_vector(&self) -> bool {
        matches!(self, Self::Vector(_, _))
    }

    #[inline(always)]
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }
}
impl core::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Vector(s, n) => write!(f, "<{n} x {s}>"),
        }
    }
}

pub type TypeRef<'t> = Interned<'t, ValueType>;

/// Uniques [`ValueType`]s so that type equality is handle identity.
pub struct TypeContext<'t> {
    arena: &'t Arena<ValueType>,
    interned: RefCell<HashMap<ValueType, &'t ValueType>>,
}
impl<'t> TypeContext<'t> {
    pub fn new(arena: &'t Arena<ValueType>) -> Self {
        Self {
            arena,
            interned: RefCell::new(HashMap::new()),
        }
    }

    pub fn get(&self, ty: ValueType) -> TypeRef<'t> {
        if let Some(&t) = self.interned.borrow().get(&ty) {
            return Interned(t);
        }

        let t: &'t ValueType = self.arena.alloc(ty);
        self.interned.borrow_mut().insert(ty, t);
        Interned(t)
    }

    #[inline]
    pub fn void(&self) -> TypeRef<'t> {
        self.get(ValueType::Void)
    }

    #[inline]
    pub fn scalar(&self, s: ScalarType) -> TypeRef<'t> {
        self.get(ValueType::Scalar(s))
    }

    #[inline]
    pub fn vector(&self, s: ScalarType, count: u32) -> TypeRef<'t> {
        self.get(ValueType::Vector(s, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interned_types_compare_by_identity() {
        let arena = Arena::new();
        let types = TypeContext::new(&arena);

        let a = types.vector(ScalarType::I32, 4);
        let b = types.get(ValueType::Vector(ScalarType::I32, 4));
        let c = types.vector(ScalarType::Float, 4);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "<4 x i32>");
    }

    #[test]
    fn predicate_lanes_have_no_byte_size() {
        assert_eq!(ScalarType::I1.byte_size(), 0);
        assert_eq!(ScalarType::Half.byte_size(), 2);
        assert_eq!(ScalarType::I1.int_mask(), 1);
        assert_eq!(ScalarType::I64.int_mask(), u64::MAX);
    }
}
