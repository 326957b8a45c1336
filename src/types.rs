//! The type model: primitive tags, pointer/int constructors, and the
//! builtin name table used by both the parser-facing resolver and the
//! C emitter's type-mapping step.

use crate::intern::{TypeId, TypeKey, TypePool};
use std::fmt;

/// Top-level discriminant stored in a `TypeKey.tag`. Kept as a plain `u8`
/// in the interner so `TypeKey` stays `Copy`-cheap to hash; this enum is
/// the typed view callers actually work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeTag {
    Bool = 0,
    Int = 1,
    Float = 2,
    AnyOpaque = 3,
    PtrOne = 4,
    PtrTwo = 5,
}

/// Pointer modifier bitmask, stored in `TypeKey.modifiers`.
pub const MOD_CONST: u32 = 1 << 0;
pub const MOD_VOLATILE: u32 = 1 << 1;
pub const MOD_ALLOWZERO: u32 = 1 << 2;

/// Bit widths recognised for `ty_f*`, stored in `TypeKey.bits` alongside
/// `TypeTag::Float`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    F16,
    F32,
    F64,
    F80,
    F128,
}

impl FloatWidth {
    fn bits(self) -> u16 {
        match self {
            FloatWidth::F16 => 16,
            FloatWidth::F32 => 32,
            FloatWidth::F64 => 64,
            FloatWidth::F80 => 80,
            FloatWidth::F128 => 128,
        }
    }
}

/// A resolved, structural view of a `TypeId`'s `TypeKey` — what callers
/// outside `intern.rs` actually pattern-match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeData {
    Bool,
    Int { bits: u16, signed: bool },
    Float { bits: u16 },
    AnyOpaque,
    /// Single/multi/c/sentinel pointer (spec §3 collapses these into one
    /// constructor; the distinguishing detail lives in `modifiers`).
    PtrOne { modifiers: u32, pointee: TypeId },
    /// Double-indirection pointer (`**T`).
    PtrTwo { modifiers: u32, pointee: TypeId },
}

impl TypeData {
    fn to_key(&self) -> TypeKey {
        match self {
            TypeData::Bool => TypeKey {
                tag: TypeTag::Bool as u8,
                modifiers: 0,
                child: None,
                bits: 0,
                signed: false,
            },
            TypeData::Int { bits, signed } => TypeKey {
                tag: TypeTag::Int as u8,
                modifiers: 0,
                child: None,
                bits: *bits,
                signed: *signed,
            },
            TypeData::Float { bits } => TypeKey {
                tag: TypeTag::Float as u8,
                modifiers: 0,
                child: None,
                bits: *bits,
                signed: false,
            },
            TypeData::AnyOpaque => TypeKey {
                tag: TypeTag::AnyOpaque as u8,
                modifiers: 0,
                child: None,
                bits: 0,
                signed: false,
            },
            TypeData::PtrOne { modifiers, pointee } => TypeKey {
                tag: TypeTag::PtrOne as u8,
                modifiers: *modifiers,
                child: Some(*pointee),
                bits: 0,
                signed: false,
            },
            TypeData::PtrTwo { modifiers, pointee } => TypeKey {
                tag: TypeTag::PtrTwo as u8,
                modifiers: *modifiers,
                child: Some(*pointee),
                bits: 0,
                signed: false,
            },
        }
    }

    fn from_key(key: &TypeKey) -> TypeData {
        if key.tag == TypeTag::Bool as u8 {
            TypeData::Bool
        } else if key.tag == TypeTag::Int as u8 {
            TypeData::Int {
                bits: key.bits,
                signed: key.signed,
            }
        } else if key.tag == TypeTag::Float as u8 {
            TypeData::Float { bits: key.bits }
        } else if key.tag == TypeTag::AnyOpaque as u8 {
            TypeData::AnyOpaque
        } else if key.tag == TypeTag::PtrOne as u8 {
            TypeData::PtrOne {
                modifiers: key.modifiers,
                pointee: key.child.expect("ptr_one key always carries a child"),
            }
        } else if key.tag == TypeTag::PtrTwo as u8 {
            TypeData::PtrTwo {
                modifiers: key.modifiers,
                pointee: key.child.expect("ptr_two key always carries a child"),
            }
        } else {
            unreachable!("unknown TypeTag discriminant {}", key.tag)
        }
    }
}

/// Owns the `TypePool` plus convenience constructors/lookups for the
/// builtin primitive table. One instance per compile.
pub struct TypeTable {
    pool: TypePool,
    pub bool_id: TypeId,
    pub anyopaque_id: TypeId,
}

impl TypeTable {
    pub fn new() -> Self {
        let mut pool = TypePool::new();
        let bool_id = pool.put(TypeData::Bool.to_key());
        let anyopaque_id = pool.put(TypeData::AnyOpaque.to_key());
        TypeTable {
            pool,
            bool_id,
            anyopaque_id,
        }
    }

    pub fn put(&mut self, data: TypeData) -> TypeId {
        self.pool.put(data.to_key())
    }

    pub fn get(&self, id: TypeId) -> TypeData {
        TypeData::from_key(self.pool.get(id))
    }

    pub fn int(&mut self, bits: u16, signed: bool) -> TypeId {
        self.put(TypeData::Int { bits, signed })
    }

    pub fn float(&mut self, width: FloatWidth) -> TypeId {
        self.put(TypeData::Float { bits: width.bits() })
    }

    pub fn ptr_one(&mut self, modifiers: u32, pointee: TypeId) -> TypeId {
        self.put(TypeData::PtrOne { modifiers, pointee })
    }

    pub fn ptr_two(&mut self, modifiers: u32, pointee: TypeId) -> TypeId {
        self.put(TypeData::PtrTwo { modifiers, pointee })
    }

    /// Resolve a builtin primitive name (`u8`, `i32`, `usize`, `c_int`,
    /// `f64`, `bool`, `anyopaque`, …) to a `TypeId`, or `None` if `name`
    /// is not one of the fixed builtin spellings.
    pub fn resolve_builtin_name(&mut self, name: &str) -> Option<TypeId> {
        if name == "bool" {
            return Some(self.bool_id);
        }
        if name == "anyopaque" {
            return Some(self.anyopaque_id);
        }
        if let Some(rest) = name.strip_prefix('u') {
            if let Ok(bits) = rest.parse::<u16>() {
                return Some(self.int(bits, false));
            }
        }
        if let Some(rest) = name.strip_prefix('i') {
            if let Ok(bits) = rest.parse::<u16>() {
                return Some(self.int(bits, true));
            }
        }
        match name {
            "isize" => return Some(self.int(POINTER_WIDTH, true)),
            "usize" => return Some(self.int(POINTER_WIDTH, false)),
            "c_char" => return Some(self.int(8, true)),
            "c_short" => return Some(self.int(16, true)),
            "c_ushort" => return Some(self.int(16, false)),
            "c_int" => return Some(self.int(32, true)),
            "c_uint" => return Some(self.int(32, false)),
            "c_long" => return Some(self.int(64, true)),
            "c_ulong" => return Some(self.int(64, false)),
            "c_longlong" => return Some(self.int(64, true)),
            "c_ulonglong" => return Some(self.int(64, false)),
            "f16" => return Some(self.float(FloatWidth::F16)),
            "f32" => return Some(self.float(FloatWidth::F32)),
            "f64" => return Some(self.float(FloatWidth::F64)),
            "f80" => return Some(self.float(FloatWidth::F80)),
            "f128" => return Some(self.float(FloatWidth::F128)),
            _ => {}
        }
        None
    }

    /// Map a resolved `TypeId` to the C type spelling used by the emitter.
    pub fn c_type_name(&self, id: TypeId) -> String {
        match self.get(id) {
            TypeData::Bool => "bool".to_string(),
            TypeData::AnyOpaque => "void".to_string(),
            TypeData::Int { bits, signed } => {
                let prefix = if signed { "int" } else { "uint" };
                format!("{prefix}{bits}_t")
            }
            TypeData::Float { bits } => match bits {
                32 => "float".to_string(),
                64 => "double".to_string(),
                _ => "long double".to_string(),
            },
            TypeData::PtrOne { pointee, .. } | TypeData::PtrTwo { pointee, .. } => {
                format!("{}*", self.c_type_name(pointee))
            }
        }
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Host pointer width used for `isize`/`usize` resolution; this compiler
/// always targets the host's own pointer width since it emits portable C
/// relying on `<stdint.h>` rather than cross-compiling.
const POINTER_WIDTH: u16 = (std::mem::size_of::<usize>() * 8) as u16;

impl fmt::Display for TypeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeData::Bool => write!(f, "bool"),
            TypeData::AnyOpaque => write!(f, "anyopaque"),
            TypeData::Int { bits, signed } => {
                write!(f, "{}{bits}", if *signed { "i" } else { "u" })
            }
            TypeData::Float { bits } => write!(f, "f{bits}"),
            TypeData::PtrOne { pointee, .. } => write!(f, "*{pointee:?}"),
            TypeData::PtrTwo { pointee, .. } => write!(f, "**{pointee:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_int_names_resolve() {
        let mut t = TypeTable::new();
        let u32_id = t.resolve_builtin_name("u32").unwrap();
        assert_eq!(
            t.get(u32_id),
            TypeData::Int {
                bits: 32,
                signed: false
            }
        );
        let i8_id = t.resolve_builtin_name("i8").unwrap();
        assert_eq!(
            t.get(i8_id),
            TypeData::Int {
                bits: 8,
                signed: true
            }
        );
    }

    #[test]
    fn non_builtin_name_rejected() {
        let mut t = TypeTable::new();
        assert!(t.resolve_builtin_name("MyStruct").is_none());
    }

    #[test]
    fn pointer_dedup_by_structural_equality() {
        let mut t = TypeTable::new();
        let u8_id = t.resolve_builtin_name("u8").unwrap();
        let p1 = t.ptr_one(MOD_CONST, u8_id);
        let p2 = t.ptr_one(MOD_CONST, u8_id);
        assert_eq!(p1, p2);
        let p3 = t.ptr_one(0, u8_id);
        assert_ne!(p1, p3);
    }

    #[test]
    fn c_type_name_mapping() {
        let mut t = TypeTable::new();
        let u32_id = t.resolve_builtin_name("u32").unwrap();
        assert_eq!(t.c_type_name(u32_id), "uint32_t");
        assert_eq!(t.c_type_name(t.anyopaque_id), "void");
        assert_eq!(t.c_type_name(t.bool_id), "bool");
    }

    #[test]
    fn c_int_maps_to_32_bit_signed() {
        let mut t = TypeTable::new();
        let c_int = t.resolve_builtin_name("c_int").unwrap();
        assert_eq!(t.c_type_name(c_int), "int32_t");
    }
}
