//! String and type interning pools.
//!
//! Both pools share the same scheme: hash the candidate with fnv-1a as a
//! cheap prefilter, then linearly scan the bucket for a byte-exact (or
//! structural, for types) match before allocating a new id. Ids are stable
//! for the process lifetime and are never reassigned; id 0 is reserved for
//! the empty string / an unused type slot.

use std::collections::HashMap;

/// fnv-1a 64-bit, the prefilter hash for both pools.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrId(pub u32);

impl StrId {
    /// Reserved for the empty string; `StringPool::new` pre-populates it.
    pub const EMPTY: StrId = StrId(0);
}

/// Interns byte strings (identifiers, string-literal contents) to stable
/// 32-bit ids. `put` is idempotent: interning the same bytes twice returns
/// the same id.
#[derive(Debug, Default)]
pub struct StringPool {
    entries: Vec<Box<str>>,
    buckets: HashMap<u64, Vec<StrId>>,
}

impl StringPool {
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::new(),
            buckets: HashMap::new(),
        };
        let id = pool.put("");
        debug_assert_eq!(id, StrId::EMPTY);
        pool
    }

    pub fn put(&mut self, s: &str) -> StrId {
        let hash = fnv1a(s.as_bytes());
        if let Some(bucket) = self.buckets.get(&hash) {
            for &id in bucket {
                if self.entries[id.0 as usize].as_ref() == s {
                    return id;
                }
            }
        }
        let id = StrId(self.entries.len() as u32);
        self.entries.push(s.into());
        self.buckets.entry(hash).or_default().push(id);
        id
    }

    pub fn get(&self, id: StrId) -> &str {
        &self.entries[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 32-bit id into a `TypePool`. Id 0 is never assigned by `TypePool::put`
/// (the pool's first real entry starts at 1); callers use it as a sentinel
/// for "no type yet" where that's meaningful (e.g. an unresolved forward ref).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const NONE: TypeId = TypeId(0);
}

/// Structural key a `TypePool` hashes and compares by. Two types are the
/// same type iff their keys are equal — this is what makes `TypeId`
/// equality a valid proxy for type equality everywhere else in the crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
    pub tag: u8,
    pub modifiers: u32,
    pub child: Option<TypeId>,
    pub bits: u16,
    pub signed: bool,
}

impl TypeKey {
    fn hash_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(12);
        buf.push(self.tag);
        buf.extend_from_slice(&self.modifiers.to_le_bytes());
        buf.extend_from_slice(&self.child.map(|c| c.0).unwrap_or(u32::MAX).to_le_bytes());
        buf.extend_from_slice(&self.bits.to_le_bytes());
        buf.push(self.signed as u8);
        buf
    }
}

/// Interns `TypeKey`s to stable ids. A pointer type and the type it points
/// to get distinct ids, but two pointer types with identical keys (same
/// modifiers, same pointee id) are deduplicated into one.
#[derive(Debug, Default)]
pub struct TypePool {
    entries: Vec<TypeKey>,
    buckets: HashMap<u64, Vec<TypeId>>,
}

impl TypePool {
    pub fn new() -> Self {
        TypePool {
            entries: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    pub fn put(&mut self, key: TypeKey) -> TypeId {
        let hash = fnv1a(&key.hash_bytes());
        if let Some(bucket) = self.buckets.get(&hash) {
            for &id in bucket {
                if self.entries[(id.0 - 1) as usize] == key {
                    return id;
                }
            }
        }
        let id = TypeId(self.entries.len() as u32 + 1);
        self.entries.push(key);
        self.buckets.entry(hash).or_default().push(id);
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeKey {
        &self.entries[(id.0 - 1) as usize]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_id_zero() {
        let pool = StringPool::new();
        assert_eq!(pool.get(StrId::EMPTY), "");
    }

    #[test]
    fn put_is_idempotent() {
        let mut pool = StringPool::new();
        let a = pool.put("hello");
        let b = pool.put("hello");
        assert_eq!(a, b);
        assert_eq!(pool.get(a), "hello");
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let mut pool = StringPool::new();
        let a = pool.put("foo");
        let b = pool.put("bar");
        assert_ne!(a, b);
    }

    #[test]
    fn hash_collisions_still_resolve_by_bytes() {
        let mut pool = StringPool::new();
        let ids: Vec<_> = (0..500).map(|i| pool.put(&format!("sym{i}"))).collect();
        for (i, &id) in ids.iter().enumerate() {
            assert_eq!(pool.get(id), format!("sym{i}"));
        }
    }

    #[test]
    fn type_pool_dedupes_structurally_equal_keys() {
        let mut pool = TypePool::new();
        let k1 = TypeKey {
            tag: 1,
            modifiers: 0,
            child: None,
            bits: 32,
            signed: true,
        };
        let k2 = k1.clone();
        let id1 = pool.put(k1);
        let id2 = pool.put(k2);
        assert_eq!(id1, id2);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn type_pool_ids_start_at_one() {
        let mut pool = TypePool::new();
        let id = pool.put(TypeKey {
            tag: 0,
            modifiers: 0,
            child: None,
            bits: 0,
            signed: false,
        });
        assert_eq!(id, TypeId(1));
        assert_ne!(id, TypeId::NONE);
    }

    #[test]
    fn pointer_type_distinct_from_pointee() {
        let mut pool = TypePool::new();
        let pointee = pool.put(TypeKey {
            tag: 1,
            modifiers: 0,
            child: None,
            bits: 32,
            signed: true,
        });
        let ptr = pool.put(TypeKey {
            tag: 2,
            modifiers: 1,
            child: Some(pointee),
            bits: 0,
            signed: false,
        });
        assert_ne!(pointee, ptr);
    }
}
