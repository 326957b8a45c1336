//! Three-address IR: functions, basic blocks, instructions, terminators.
//!
//! Mirrors the reference `IrOp`/`IrTermTag` split (`examples/original_source
//! /src/Ir.h`), generalized to Rust index-newtype arenas instead of a
//! hand-rolled C arena: blocks, temps and variables are identified by a
//! `u32` index into their owning `IrFunc`'s `Vec`s, never by pointer.

use crate::intern::{StrId, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IrBlockId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IrTempId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IrVarId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrUnaryOp {
    Negate,
    BitNot,
    LogicalNot,
    AddressOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LogicalAnd,
    LogicalOr,
}

/// Every possible IR instruction payload. `dest` on `IrInst` is
/// `Option<IrTempId>`: present for value-producing ops, `None` for pure
/// side-effecting ones (`store_var`, `unreachable`).
pub enum IrOp {
    ConstNum(i64),
    ConstChar(u8),
    ConstBytes(StrId),
    LoadVar(IrVarId),
    StoreVar(IrVarId, IrTempId),
    LoadArg(IrVarId),
    Unary(IrUnaryOp, IrTempId),
    Binary(IrBinaryOp, IrTempId, IrTempId),
    /// Callee symbol plus up to 16 argument temps (spec §4.5.4).
    Call(StrId, Vec<IrTempId>),
    Copy(IrTempId),
    Unreachable,
}

pub struct IrInst {
    pub dest: Option<IrTempId>,
    pub ty: TypeId,
    pub op: IrOp,
}

/// The terminator ending a basic block. `Next` is a bug sentinel: every
/// block must be replaced with a real terminator before the function is
/// considered lowered (spec §4.5.5/§4.5.6).
pub enum IrTerm {
    Jmp(IrBlockId),
    Br { cond: IrTempId, then_blk: IrBlockId, else_blk: IrBlockId },
    Ret(Option<IrTempId>),
    Next,
}

pub struct IrBlock {
    pub insts: Vec<IrInst>,
    pub term: IrTerm,
}

impl IrBlock {
    fn new() -> Self {
        IrBlock {
            insts: Vec::new(),
            term: IrTerm::Next,
        }
    }

    pub fn is_terminated(&self) -> bool {
        !matches!(self.term, IrTerm::Next)
    }
}

pub struct IrVar {
    pub name: StrId,
    pub ty: TypeId,
}

pub struct IrFunc {
    pub name: StrId,
    pub is_static: bool,
    pub return_type: Option<TypeId>,
    pub params: Vec<IrVarId>,
    pub blocks: Vec<IrBlock>,
    pub vars: Vec<IrVar>,
    next_temp: u32,
}

impl IrFunc {
    pub fn new(name: StrId, is_static: bool) -> Self {
        IrFunc {
            name,
            is_static,
            return_type: None,
            params: Vec::new(),
            blocks: Vec::new(),
            vars: Vec::new(),
            next_temp: 0,
        }
    }

    pub fn new_block(&mut self) -> IrBlockId {
        let id = IrBlockId(self.blocks.len() as u32);
        self.blocks.push(IrBlock::new());
        id
    }

    pub fn block_mut(&mut self, id: IrBlockId) -> &mut IrBlock {
        &mut self.blocks[id.0 as usize]
    }

    pub fn block(&self, id: IrBlockId) -> &IrBlock {
        &self.blocks[id.0 as usize]
    }

    pub fn new_temp(&mut self) -> IrTempId {
        let id = IrTempId(self.next_temp);
        self.next_temp += 1;
        id
    }

    /// Linear-scan variable lookup by name (spec §3: "small tables
    /// expected per function"). Shadowing is undefined — the first match
    /// wins, per spec §9.
    pub fn find_var(&self, name: StrId) -> Option<IrVarId> {
        self.vars
            .iter()
            .position(|v| v.name == name)
            .map(|i| IrVarId(i as u32))
    }

    pub fn new_var(&mut self, name: StrId, ty: TypeId) -> IrVarId {
        if let Some(existing) = self.find_var(name) {
            return existing;
        }
        let id = IrVarId(self.vars.len() as u32);
        self.vars.push(IrVar { name, ty });
        id
    }

    pub fn var(&self, id: IrVarId) -> &IrVar {
        &self.vars[id.0 as usize]
    }

    /// True once every block carries a real terminator (spec §8
    /// invariant: "no block has a `next` terminator after lowering
    /// completes").
    pub fn is_fully_terminated(&self) -> bool {
        self.blocks.iter().all(IrBlock::is_terminated)
    }
}

#[derive(Default)]
pub struct IrProgram {
    pub funcs: Vec<IrFunc>,
}

impl IrProgram {
    pub fn new() -> Self {
        IrProgram { funcs: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::StringPool;

    #[test]
    fn temps_are_dense_and_monotonic() {
        let mut pool = StringPool::new();
        let name = pool.put("f");
        let mut f = IrFunc::new(name, false);
        let t0 = f.new_temp();
        let t1 = f.new_temp();
        assert_eq!(t0, IrTempId(0));
        assert_eq!(t1, IrTempId(1));
    }

    #[test]
    fn var_lookup_is_idempotent_by_name() {
        let mut pool = StringPool::new();
        let name = pool.put("x");
        let mut f = IrFunc::new(pool.put("f"), false);
        let v1 = f.new_var(name, crate::intern::TypeId::NONE);
        let v2 = f.new_var(name, crate::intern::TypeId::NONE);
        assert_eq!(v1, v2);
    }

    #[test]
    fn unterminated_block_is_detected() {
        let mut pool = StringPool::new();
        let mut f = IrFunc::new(pool.put("f"), false);
        f.new_block();
        assert!(!f.is_fully_terminated());
        f.block_mut(IrBlockId(0)).term = IrTerm::Ret(None);
        assert!(f.is_fully_terminated());
    }
}
