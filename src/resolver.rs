//! Semantic resolver: maps AST type-expressions to interned type ids and
//! extracts symbol names, per spec §4.4.

use crate::ast::{Ast, NodeId, NodeKind, PrefixTypeOpKind, PrimaryLeaf};
use crate::diagnostics::CompileError;
use crate::intern::{StrId, TypeId};
use crate::types::{TypeData, TypeTable};

pub struct Resolver<'a> {
    ast: &'a Ast,
    strings: &'a crate::intern::StringPool,
    types: &'a mut TypeTable,
}

impl<'a> Resolver<'a> {
    pub fn new(ast: &'a Ast, strings: &'a crate::intern::StringPool, types: &'a mut TypeTable) -> Self {
        Resolver { ast, strings, types }
    }

    /// For a type-expr that is a plain identifier suffix chain, returns
    /// the innermost identifier token text. Fails for anything else.
    pub fn eval_symbol_name(&self, node: NodeId) -> Result<StrId, CompileError> {
        match &self.ast.get(node).kind {
            NodeKind::PrimaryTypeExpr(data) => match &data.leaf {
                PrimaryLeaf::Identifier(id) => Ok(*id),
                _ => Err(CompileError::semantic("evalSymbolName: not an identifier leaf")),
            },
            NodeKind::SuffixExpr(data) => self.eval_symbol_name(data.primary),
            _ => Err(CompileError::semantic("evalSymbolName: not a symbol-shaped node")),
        }
    }

    /// Walks a type-expr (prefix ops, primary type-expr), recognising
    /// prefix `*`/`**` as pointer-of constructors and primitive
    /// identifiers via the fixed builtin table. Non-builtin identifiers
    /// fail: symbol-level type resolution is out of scope (spec §4.4).
    pub fn eval_type_name(&mut self, node: NodeId) -> Result<TypeId, CompileError> {
        match &self.ast.get(node).kind {
            NodeKind::PrefixTypeOp(data) => {
                let modifiers = data.modifiers;
                let inner = data.inner;
                match data.kind {
                    PrefixTypeOpKind::Ptr => {
                        let pointee = self.eval_type_name(inner)?;
                        Ok(self.types.ptr_one(modifiers, pointee))
                    }
                    PrefixTypeOpKind::Optional => self.eval_type_name(inner),
                    _ => Err(CompileError::semantic(
                        "evalTypeName: unsupported prefix type op",
                    )),
                }
            }
            NodeKind::PrimaryTypeExpr(data) => match &data.leaf {
                PrimaryLeaf::Identifier(id) => {
                    let name = self.strings.get(*id).to_string();
                    self.types
                        .resolve_builtin_name(&name)
                        .ok_or_else(|| {
                            CompileError::semantic(format!(
                                "evalTypeName: '{name}' is not a builtin type; symbol-level type resolution is out of scope"
                            ))
                        })
                }
                _ => Err(CompileError::semantic("evalTypeName: not a type-shaped leaf")),
            },
            _ => Err(CompileError::semantic("evalTypeName: not a type expression")),
        }
    }

    /// Minimal peer-type resolution: identity is the identity; two
    /// integers of the same sign-class pick the wider; two floats pick
    /// the wider; mixed classes fail (spec §9 open question, decided:
    /// hard failure, see DESIGN.md).
    pub fn peer_resolve_type(&mut self, a: TypeId, b: TypeId) -> Result<TypeId, CompileError> {
        if a == b {
            return Ok(a);
        }
        match (self.types.get(a), self.types.get(b)) {
            (TypeData::Int { bits: ba, signed: sa }, TypeData::Int { bits: bb, signed: sb })
                if sa == sb =>
            {
                Ok(if ba >= bb { a } else { b })
            }
            (TypeData::Float { bits: ba }, TypeData::Float { bits: bb }) => {
                Ok(if ba >= bb { a } else { b })
            }
            _ => Err(CompileError::semantic(
                "peerResolveType: mixed int/float (or other incompatible) peer types are undefined",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{PrimaryTypeExprData, Span};
    use crate::intern::StringPool;

    fn leaf_ident(ast: &mut Ast, strings: &mut StringPool, name: &str) -> NodeId {
        let id = strings.put(name);
        ast.push(
            NodeKind::PrimaryTypeExpr(Box::new(PrimaryTypeExprData {
                leaf: PrimaryLeaf::Identifier(id),
            })),
            Span { start: 0, end: 0 },
        )
    }

    #[test]
    fn eval_symbol_name_on_identifier() {
        let mut ast = Ast::new();
        let mut strings = StringPool::new();
        let node = leaf_ident(&mut ast, &mut strings, "foo");
        let mut types = TypeTable::new();
        let resolver = Resolver::new(&ast, &strings, &mut types);
        let id = resolver.eval_symbol_name(node).unwrap();
        assert_eq!(strings.get(id), "foo");
    }

    #[test]
    fn eval_type_name_resolves_builtin() {
        let mut ast = Ast::new();
        let mut strings = StringPool::new();
        let node = leaf_ident(&mut ast, &mut strings, "u32");
        let mut types = TypeTable::new();
        let mut resolver = Resolver::new(&ast, &strings, &mut types);
        let ty = resolver.eval_type_name(node).unwrap();
        assert_eq!(types.get(ty), TypeData::Int { bits: 32, signed: false });
    }

    #[test]
    fn eval_type_name_rejects_non_builtin() {
        let mut ast = Ast::new();
        let mut strings = StringPool::new();
        let node = leaf_ident(&mut ast, &mut strings, "MyStruct");
        let mut types = TypeTable::new();
        let mut resolver = Resolver::new(&ast, &strings, &mut types);
        assert!(resolver.eval_type_name(node).is_err());
    }

    #[test]
    fn peer_resolve_picks_wider_int() {
        let ast = Ast::new();
        let strings = StringPool::new();
        let mut types = TypeTable::new();
        let u8_id = types.resolve_builtin_name("u8").unwrap();
        let u32_id = types.resolve_builtin_name("u32").unwrap();
        let mut resolver = Resolver::new(&ast, &strings, &mut types);
        let peer = resolver.peer_resolve_type(u8_id, u32_id).unwrap();
        assert_eq!(peer, u32_id);
    }

    #[test]
    fn peer_resolve_rejects_mixed_int_float() {
        let ast = Ast::new();
        let strings = StringPool::new();
        let mut types = TypeTable::new();
        let u32_id = types.resolve_builtin_name("u32").unwrap();
        let f32_id = types.resolve_builtin_name("f32").unwrap();
        let mut resolver = Resolver::new(&ast, &strings, &mut types);
        assert!(resolver.peer_resolve_type(u32_id, f32_id).is_err());
    }
}
