//! Textual dump renderers for `-tokens`/`-ast`/`-ir` (spec §6). Stable and
//! indentation-based so the golden-test suite can diff against them.

use std::fmt::Write as _;

use crate::ast::{Ast, NodeId, NodeKind, PrimaryLeaf};
use crate::buffer::SourceFile;
use crate::intern::StringPool;
use crate::ir::{IrOp, IrProgram, IrTerm};
use crate::token::Token;

/// `|<index>: <tag-name>: <slice>` per line (spec §6).
pub fn render_tokens(tokens: &[Token], src: &SourceFile) -> String {
    let mut out = String::new();
    for (i, tok) in tokens.iter().enumerate() {
        let slice = src.slice(tok.start, tok.end).as_str();
        let _ = writeln!(out, "|{i}: {}: {slice}", tok.kind.name());
    }
    out
}

/// Nested, indented AST dump rooted at `root`.
pub fn render_ast(ast: &Ast, root: NodeId, strings: &StringPool) -> String {
    let mut out = String::new();
    render_node(ast, root, strings, 0, &mut out);
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn render_node(ast: &Ast, id: NodeId, strings: &StringPool, depth: usize, out: &mut String) {
    let node = ast.get(id);
    indent(out, depth);
    let _ = writeln!(out, "{}", node.kind.tag_name());
    for child in children_of(&node.kind) {
        render_node(ast, child, strings, depth + 1, out);
    }
    if let Some(leaf) = leaf_of(&node.kind) {
        indent(out, depth + 1);
        let _ = writeln!(out, "{}", describe_leaf(leaf, strings));
    }
}

fn describe_leaf(leaf: &PrimaryLeaf, strings: &StringPool) -> String {
    match leaf {
        PrimaryLeaf::NumberLiteral(id) => format!("number_literal {}", strings.get(*id)),
        PrimaryLeaf::CharLiteral(id) => format!("char_literal {}", strings.get(*id)),
        PrimaryLeaf::StringLiteral(id) => format!("string_literal {}", strings.get(*id)),
        PrimaryLeaf::Identifier(id) => format!("identifier {}", strings.get(*id)),
        PrimaryLeaf::Unreachable => "unreachable".to_string(),
        PrimaryLeaf::Builtin { name, .. } => format!("builtin @{}", strings.get(*name)),
        PrimaryLeaf::GroupedExpr(_) => "grouped_expr".to_string(),
    }
}

fn leaf_of(kind: &NodeKind) -> Option<&PrimaryLeaf> {
    match kind {
        NodeKind::PrimaryTypeExpr(data) => Some(&data.leaf),
        _ => None,
    }
}

/// The direct AST children of a node, in source order, for dump purposes.
/// This intentionally only walks the subset of shapes the lowering pass
/// understands (spec §4.5) plus the handful of container-level shapes
/// needed to reach them; exotic shapes render as a leaf with no children.
fn children_of(kind: &NodeKind) -> Vec<NodeId> {
    match kind {
        NodeKind::ContainerMembers(data) => data.decls.clone(),
        NodeKind::DeclFn(data) => {
            let mut v: Vec<NodeId> = data.proto.params.iter().filter_map(|p| p.type_expr).collect();
            if let Some(rt) = data.proto.return_type {
                v.push(rt);
            }
            if let Some(body) = data.body {
                v.push(body);
            }
            v
        }
        NodeKind::Block(data) => data.statements.clone(),
        NodeKind::VarDeclStatement(data) => {
            let mut v = Vec::new();
            if let Some(t) = data.type_expr {
                v.push(t);
            }
            if let Some(init) = data.init {
                v.push(init);
            }
            v
        }
        NodeKind::IfStatement(data) => {
            let mut v = vec![data.cond, data.then_branch];
            if let Some(e) = data.else_branch {
                v.push(e);
            }
            v
        }
        NodeKind::IfExpr(data) => {
            let mut v = vec![data.cond, data.then_expr];
            if let Some(e) = data.else_expr {
                v.push(e);
            }
            v
        }
        NodeKind::WhileStatement(data) => {
            let mut v = vec![data.cond];
            if let Some(c) = data.continue_expr {
                v.push(c);
            }
            v.push(data.body);
            v
        }
        NodeKind::ForStatement(data) => vec![data.item.start, data.item.end, data.body],
        NodeKind::LabeledStatement(data) => vec![data.inner],
        NodeKind::BinaryExpr(data) => vec![data.lhs, data.rhs],
        NodeKind::UnaryExpr(data) => vec![data.inner],
        NodeKind::SingleAssignExpr(data) => vec![data.lhs, data.rhs],
        NodeKind::MultiAssignExpr(data) => {
            let mut v = data.lhs.clone();
            v.push(data.rhs);
            v
        }
        NodeKind::ReturnExpr(data) => data.value.into_iter().collect(),
        NodeKind::SuffixExpr(data) => {
            let mut v = vec![data.primary];
            v.extend(&data.suffixes);
            v
        }
        NodeKind::FnCallArguments(data) => data.args.clone(),
        NodeKind::PrefixTypeOp(data) => vec![data.inner],
        NodeKind::SuffixTypeOp(data) => vec![data.inner],
        NodeKind::PrimaryTypeExpr(data) => match &data.leaf {
            PrimaryLeaf::GroupedExpr(inner) => vec![*inner],
            PrimaryLeaf::Builtin { args, .. } => args.clone(),
            _ => Vec::new(),
        },
        NodeKind::DeferStatement(inner)
        | NodeKind::ErrdeferStatement { body: inner, .. }
        | NodeKind::SuspendStatement(inner)
        | NodeKind::NosuspendStatement(inner)
        | NodeKind::ComptimeStatement(inner) => vec![*inner],
        _ => Vec::new(),
    }
}

/// Textual IR dump: one function per block, `block_<id>:` labels,
/// instructions as `t<id> = op(args)`, terminators as `goto`/`if`/`return`.
pub fn render_ir(program: &IrProgram, strings: &StringPool) -> String {
    let mut out = String::new();
    for func in &program.funcs {
        let _ = writeln!(out, "fn {}{}", strings.get(func.name), if func.is_static { " (static)" } else { "" });
        for (i, block) in func.blocks.iter().enumerate() {
            let _ = writeln!(out, "block_{i}:");
            for inst in &block.insts {
                render_inst(inst, strings, &mut out);
            }
            render_term(&block.term, &mut out);
        }
    }
    out
}

fn render_inst(inst: &crate::ir::IrInst, strings: &StringPool, out: &mut String) {
    let lhs = match inst.dest {
        Some(t) => format!("  t{} = ", t.0),
        None => "  ".to_string(),
    };
    let rhs = match &inst.op {
        IrOp::ConstNum(n) => format!("const_num {n}"),
        IrOp::ConstChar(c) => format!("const_char {c}"),
        IrOp::ConstBytes(id) => format!("const_bytes {:?}", strings.get(*id)),
        IrOp::LoadVar(v) => format!("load_var v{}", v.0),
        IrOp::StoreVar(v, t) => format!("store_var v{} t{}", v.0, t.0),
        IrOp::LoadArg(v) => format!("load_arg v{}", v.0),
        IrOp::Unary(op, t) => format!("{op:?} t{}", t.0),
        IrOp::Binary(op, a, b) => format!("{op:?} t{} t{}", a.0, b.0),
        IrOp::Call(name, args) => {
            let arg_list = args.iter().map(|a| format!("t{}", a.0)).collect::<Vec<_>>().join(", ");
            format!("call {}({arg_list})", strings.get(*name))
        }
        IrOp::Copy(t) => format!("copy t{}", t.0),
        IrOp::Unreachable => "unreachable".to_string(),
    };
    let _ = writeln!(out, "{lhs}{rhs}");
}

fn render_term(term: &IrTerm, out: &mut String) {
    match term {
        IrTerm::Jmp(b) => {
            let _ = writeln!(out, "  goto block_{}", b.0);
        }
        IrTerm::Br { cond, then_blk, else_blk } => {
            let _ = writeln!(
                out,
                "  if t{} goto block_{} else goto block_{}",
                cond.0, then_blk.0, else_blk.0
            );
        }
        IrTerm::Ret(Some(t)) => {
            let _ = writeln!(out, "  return t{}", t.0);
        }
        IrTerm::Ret(None) => {
            let _ = writeln!(out, "  return");
        }
        IrTerm::Next => {
            let _ = writeln!(out, "  <next (unterminated)>");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    #[test]
    fn tokens_render_one_line_each() {
        let src = SourceFile::new("t.sub", "fn f".to_string());
        let tokens = Lexer::tokenize_all(src.text());
        let rendered = render_tokens(&tokens, &src);
        assert!(rendered.contains("token_keyword_fn"));
        assert!(rendered.contains("token_identifier"));
        assert_eq!(rendered.lines().count(), tokens.len());
    }

    #[test]
    fn ast_dump_nests_binary_expr_children() {
        let mut ast = Ast::new();
        let mut strings = StringPool::new();
        let a = ast.push(
            NodeKind::PrimaryTypeExpr(Box::new(crate::ast::PrimaryTypeExprData {
                leaf: PrimaryLeaf::Identifier(strings.put("a")),
            })),
            crate::ast::Span { start: 0, end: 1 },
        );
        let b = ast.push(
            NodeKind::PrimaryTypeExpr(Box::new(crate::ast::PrimaryTypeExprData {
                leaf: PrimaryLeaf::Identifier(strings.put("b")),
            })),
            crate::ast::Span { start: 0, end: 1 },
        );
        let bin = ast.push(
            NodeKind::BinaryExpr(Box::new(crate::ast::BinaryExprData {
                op: crate::ast::BinOp::Add,
                lhs: a,
                rhs: b,
            })),
            crate::ast::Span { start: 0, end: 1 },
        );
        let rendered = render_ast(&ast, bin, &strings);
        assert!(rendered.starts_with("binary_expr"));
        assert!(rendered.contains("identifier a"));
        assert!(rendered.contains("identifier b"));
    }

    #[test]
    fn ir_dump_shows_block_labels_and_terminators() {
        let mut pool = StringPool::new();
        let name = pool.put("f");
        let mut func = crate::ir::IrFunc::new(name, false);
        let b0 = func.new_block();
        let t0 = func.new_temp();
        func.block_mut(b0).insts.push(crate::ir::IrInst {
            dest: Some(t0),
            ty: crate::intern::TypeId::NONE,
            op: IrOp::ConstNum(1),
        });
        func.block_mut(b0).term = IrTerm::Ret(Some(t0));
        let mut program = IrProgram::new();
        program.funcs.push(func);
        let rendered = render_ir(&program, &pool);
        assert!(rendered.contains("fn f"));
        assert!(rendered.contains("block_0:"));
        assert!(rendered.contains("return t0"));
    }
}
