//! AST → IR lowering (spec §4.5): flattens structured control flow into a
//! CFG of basic blocks and expands expression-level branching (`if`-as-
//! expression) into a destination temp materialised across both arms.

use crate::ast::{
    Ast, AssignOp, BinOp, NodeId, NodeKind, PrimaryLeaf, UnaryOp,
};
use crate::diagnostics::CompileError;
use crate::intern::StringPool;
use crate::ir::{IrBinaryOp, IrBlockId, IrFunc, IrOp, IrProgram, IrTempId, IrTerm, IrUnaryOp};
use crate::resolver::Resolver;
use crate::types::TypeTable;

const MAX_CALL_ARGS: usize = 16;

pub fn lower_program(
    ast: &Ast,
    root: NodeId,
    strings: &StringPool,
    types: &mut TypeTable,
) -> Result<IrProgram, CompileError> {
    let mut program = IrProgram::new();
    let NodeKind::ContainerMembers(data) = &ast.get(root).kind else {
        return Err(CompileError::semantic("lowering root is not container_members"));
    };
    for &decl in &data.decls {
        if let NodeKind::DeclFn(fn_data) = &ast.get(decl).kind {
            if fn_data.body.is_some() {
                program.funcs.push(lower_function(ast, decl, strings, types)?);
            }
        }
    }
    Ok(program)
}

struct FnCtx<'a> {
    ast: &'a Ast,
    strings: &'a StringPool,
    types: &'a mut TypeTable,
    func: IrFunc,
    cur: IrBlockId,
}

impl<'a> FnCtx<'a> {
    fn is_discard(&self, id: crate::intern::StrId) -> bool {
        self.strings.get(id) == "_"
    }

    fn emit(&mut self, op: IrOp, ty: crate::intern::TypeId) -> IrTempId {
        let dest = self.func.new_temp();
        self.func.block_mut(self.cur).insts.push(crate::ir::IrInst {
            dest: Some(dest),
            ty,
            op,
        });
        dest
    }

    fn emit_void(&mut self, op: IrOp, ty: crate::intern::TypeId) {
        self.func.block_mut(self.cur).insts.push(crate::ir::IrInst { dest: None, ty, op });
    }

    /// A variable slot with no source name, for compiler-synthesised
    /// destinations (e.g. an `if_expr`'s materialised value). Bypasses
    /// `new_var`'s by-name dedup since no identifier names it.
    fn new_anon_var(&mut self, ty: crate::intern::TypeId) -> crate::ir::IrVarId {
        let id = crate::ir::IrVarId(self.func.vars.len() as u32);
        self.func.vars.push(crate::ir::IrVar { name: crate::intern::StrId::EMPTY, ty });
        id
    }

    fn terminate(&mut self, term: IrTerm) {
        debug_assert!(
            !self.func.block(self.cur).is_terminated(),
            "a block terminator may only be set once (spec §4.5.5)"
        );
        self.func.block_mut(self.cur).term = term;
    }

    /// After setting a terminator the current block is detached; any
    /// further emission must select a fresh block first (spec §4.5.5).
    fn open_fresh_block(&mut self) {
        self.cur = self.func.new_block();
    }

    fn switch_to(&mut self, id: IrBlockId) {
        self.cur = id;
    }

    fn resolver(&mut self) -> Resolver<'_> {
        Resolver::new(self.ast, self.strings, &mut *self.types)
    }
}

fn lower_function(
    ast: &Ast,
    decl: NodeId,
    strings: &StringPool,
    types: &mut TypeTable,
) -> Result<IrFunc, CompileError> {
    let NodeKind::DeclFn(fn_data) = &ast.get(decl).kind else {
        unreachable!("lower_function called on a non-decl_fn node");
    };
    let name = fn_data
        .proto
        .name
        .ok_or_else(|| CompileError::semantic("function declaration without a name"))?;
    let is_static = !fn_data.proto.is_pub;
    let mut func = IrFunc::new(name, is_static);
    let entry = func.new_block();

    let mut ctx = FnCtx {
        ast,
        strings,
        types,
        func,
        cur: entry,
    };

    if let Some(return_type_expr) = fn_data.proto.return_type {
        let rt = ctx.resolver().eval_type_name(return_type_expr).ok();
        ctx.func.return_type = rt;
    }

    for param in &fn_data.proto.params {
        if param.is_varargs {
            continue;
        }
        let Some(pname) = param.name else { continue };
        let ty = match param.type_expr {
            Some(te) => ctx.resolver().eval_type_name(te)?,
            None => crate::intern::TypeId::NONE,
        };
        let var_id = ctx.func.new_var(pname, ty);
        ctx.func.params.push(var_id);
        ctx.emit_void(IrOp::LoadArg(var_id), ty);
    }

    if let Some(body) = fn_data.body {
        lower_block(&mut ctx, body)?;
    }

    if !ctx.func.block(ctx.cur).is_terminated() {
        ctx.terminate(IrTerm::Ret(None));
    }

    Ok(ctx.func)
}

fn lower_block(ctx: &mut FnCtx, node: NodeId) -> Result<(), CompileError> {
    let NodeKind::Block(data) = &ctx.ast.get(node).kind else {
        return Err(CompileError::semantic(format!(
            "expected a block, found {}",
            ctx.ast.get(node).kind.tag_name()
        )));
    };
    let statements = data.statements.clone();
    for stmt in statements {
        lower_statement(ctx, stmt)?;
    }
    Ok(())
}

fn lower_statement(ctx: &mut FnCtx, node: NodeId) -> Result<(), CompileError> {
    match &ctx.ast.get(node).kind {
        NodeKind::VarDeclStatement(data) => {
            let name = data.name;
            let type_expr = data.type_expr;
            let init = data.init;
            let ty = match type_expr {
                Some(te) => ctx.resolver().eval_type_name(te)?,
                None => crate::intern::TypeId::NONE,
            };
            let var_id = ctx.func.new_var(name, ty);
            if let Some(init) = init {
                let temp = lower_expr(ctx, init)?;
                ctx.emit_void(IrOp::StoreVar(var_id, temp), ty);
            }
            Ok(())
        }
        NodeKind::SingleAssignExpr(data) => {
            let (op, lhs, rhs) = (data.op, data.lhs, data.rhs);
            let var_name = ctx.resolver().eval_symbol_name(lhs)?;
            if ctx.is_discard(var_name) {
                lower_expr(ctx, rhs)?;
                return Ok(());
            }
            let var_id = ctx.func.find_var(var_name).ok_or_else(|| {
                CompileError::semantic(format!(
                    "assignment to undeclared variable '{}'",
                    ctx.strings.get(var_name)
                ))
            })?;
            let ty = ctx.func.var(var_id).ty;
            if op == AssignOp::Assign {
                let temp = lower_expr(ctx, rhs)?;
                ctx.emit_void(IrOp::StoreVar(var_id, temp), ty);
                return Ok(());
            }
            let lhs_temp = ctx.emit(IrOp::LoadVar(var_id), ty);
            let rhs_temp = lower_expr(ctx, rhs)?;
            let bin_op = assign_op_to_binary(op)?;
            let result = ctx.emit(IrOp::Binary(bin_op, lhs_temp, rhs_temp), ty);
            ctx.emit_void(IrOp::StoreVar(var_id, result), ty);
            Ok(())
        }
        NodeKind::MultiAssignExpr(_) => Err(CompileError::semantic(
            "multi-assign is not supported by IR lowering",
        )),
        NodeKind::IfStatement(data) => {
            let (cond, then_branch, else_branch) = (data.cond, data.then_branch, data.else_branch);
            let cond_temp = lower_expr(ctx, cond)?;
            let body_blk = ctx.func.new_block();
            let else_blk = ctx.func.new_block();
            let next_blk = ctx.func.new_block();
            ctx.terminate(IrTerm::Br { cond: cond_temp, then_blk: body_blk, else_blk });

            ctx.switch_to(body_blk);
            lower_statement(ctx, then_branch)?;
            if !ctx.func.block(ctx.cur).is_terminated() {
                ctx.terminate(IrTerm::Jmp(next_blk));
            }

            ctx.switch_to(else_blk);
            if let Some(else_branch) = else_branch {
                lower_statement(ctx, else_branch)?;
            }
            if !ctx.func.block(ctx.cur).is_terminated() {
                ctx.terminate(IrTerm::Jmp(next_blk));
            }

            ctx.switch_to(next_blk);
            Ok(())
        }
        NodeKind::LabeledStatement(data) => {
            if data.label.is_none() {
                return lower_statement(ctx, data.inner);
            }
            Err(CompileError::semantic("labeled statements are not supported by IR lowering"))
        }
        NodeKind::WhileStatement(data) => {
            let (cond, continue_expr, body) = (data.cond, data.continue_expr, data.body);
            let cond_blk = ctx.func.new_block();
            let body_blk = ctx.func.new_block();
            let cont_blk = ctx.func.new_block();
            let next_blk = ctx.func.new_block();
            ctx.terminate(IrTerm::Jmp(cond_blk));

            ctx.switch_to(cond_blk);
            let cond_temp = lower_expr(ctx, cond)?;
            ctx.terminate(IrTerm::Br { cond: cond_temp, then_blk: body_blk, else_blk: next_blk });

            ctx.switch_to(body_blk);
            lower_statement(ctx, body)?;
            if !ctx.func.block(ctx.cur).is_terminated() {
                ctx.terminate(IrTerm::Jmp(cont_blk));
            }

            ctx.switch_to(cont_blk);
            if let Some(continue_expr) = continue_expr {
                // may be a plain expr or a single_assign_expr (spec §4.2
                // models the while continue-clause as an assign-expr).
                lower_statement(ctx, continue_expr)?;
            }
            if !ctx.func.block(ctx.cur).is_terminated() {
                ctx.terminate(IrTerm::Jmp(cond_blk));
            }

            ctx.switch_to(next_blk);
            Ok(())
        }
        NodeKind::ForStatement(data) => {
            let item = &data.item;
            let (range_start, range_end, index_name, body) =
                (item.start, item.end, item.index_name, data.body);
            let ty = crate::intern::TypeId::NONE;
            let idx_var = ctx.func.new_var(index_name, ty);
            let start_temp = lower_expr(ctx, range_start)?;
            ctx.emit_void(IrOp::StoreVar(idx_var, start_temp), ty);

            let cond_blk = ctx.func.new_block();
            let body_blk = ctx.func.new_block();
            let cont_blk = ctx.func.new_block();
            let next_blk = ctx.func.new_block();
            ctx.terminate(IrTerm::Jmp(cond_blk));

            ctx.switch_to(cond_blk);
            let idx_temp = ctx.emit(IrOp::LoadVar(idx_var), ty);
            let end_temp = lower_expr(ctx, range_end)?;
            let cmp = ctx.emit(IrOp::Binary(IrBinaryOp::Lt, idx_temp, end_temp), ty);
            ctx.terminate(IrTerm::Br { cond: cmp, then_blk: body_blk, else_blk: next_blk });

            ctx.switch_to(body_blk);
            lower_statement(ctx, body)?;
            if !ctx.func.block(ctx.cur).is_terminated() {
                ctx.terminate(IrTerm::Jmp(cont_blk));
            }

            ctx.switch_to(cont_blk);
            let idx_reload = ctx.emit(IrOp::LoadVar(idx_var), ty);
            let one = ctx.emit(IrOp::ConstNum(1), ty);
            let incremented = ctx.emit(IrOp::Binary(IrBinaryOp::Add, idx_reload, one), ty);
            ctx.emit_void(IrOp::StoreVar(idx_var, incremented), ty);
            ctx.terminate(IrTerm::Jmp(cond_blk));

            ctx.switch_to(next_blk);
            Ok(())
        }
        NodeKind::ReturnExpr(data) => {
            let value = match data.value {
                Some(v) => Some(lower_expr(ctx, v)?),
                None => None,
            };
            ctx.terminate(IrTerm::Ret(value));
            ctx.open_fresh_block();
            Ok(())
        }
        NodeKind::Block(_) => lower_block(ctx, node),
        NodeKind::DeferStatement(_) => Err(stub_error("defer_statement")),
        NodeKind::ErrdeferStatement { .. } => Err(stub_error("errdefer_statement")),
        NodeKind::SuspendStatement(_) => Err(stub_error("suspend_statement")),
        NodeKind::NosuspendStatement(_) => Err(stub_error("nosuspend_statement")),
        NodeKind::ComptimeStatement(_) => Err(stub_error("comptime_statement")),
        _ => lower_statement_expr(ctx, node),
    }
}

/// A bare expression used as a statement (e.g. a call with a discarded
/// result): lower it for side effects and drop the resulting temp.
fn lower_statement_expr(ctx: &mut FnCtx, node: NodeId) -> Result<(), CompileError> {
    lower_expr(ctx, node).map(|_| ())
}

fn stub_error(tag: &str) -> CompileError {
    CompileError::semantic(format!("{tag} is parsed but not lowered by this IR"))
}

fn assign_op_to_binary(op: AssignOp) -> Result<IrBinaryOp, CompileError> {
    Ok(match op {
        AssignOp::AddAssign => IrBinaryOp::Add,
        AssignOp::SubAssign => IrBinaryOp::Sub,
        AssignOp::MulAssign => IrBinaryOp::Mul,
        AssignOp::DivAssign => IrBinaryOp::Div,
        AssignOp::ModAssign => IrBinaryOp::Mod,
        AssignOp::BitAndAssign => IrBinaryOp::BitAnd,
        AssignOp::BitOrAssign => IrBinaryOp::BitOr,
        AssignOp::BitXorAssign => IrBinaryOp::BitXor,
        AssignOp::ShlAssign => IrBinaryOp::Shl,
        AssignOp::ShrAssign => IrBinaryOp::Shr,
        AssignOp::Assign => {
            return Err(CompileError::semantic("internal: plain '=' has no binary op"))
        }
    })
}

fn unary_op_to_ir(op: UnaryOp) -> Result<IrUnaryOp, CompileError> {
    Ok(match op {
        UnaryOp::Negate => IrUnaryOp::Negate,
        UnaryOp::BitNot => IrUnaryOp::BitNot,
        UnaryOp::LogicalNot => IrUnaryOp::LogicalNot,
        UnaryOp::AddressOf => IrUnaryOp::AddressOf,
        UnaryOp::Try | UnaryOp::NegateWrap => {
            return Err(CompileError::semantic("'try'/wrapping-negate unary ops are reserved"))
        }
    })
}

fn binop_to_ir(op: BinOp) -> Result<IrBinaryOp, CompileError> {
    use BinOp::*;
    Ok(match op {
        Add | AddWrap => IrBinaryOp::Add,
        Sub | SubWrap => IrBinaryOp::Sub,
        Mul | MulWrap => IrBinaryOp::Mul,
        Div => IrBinaryOp::Div,
        Mod => IrBinaryOp::Mod,
        BitAnd => IrBinaryOp::BitAnd,
        BitOr => IrBinaryOp::BitOr,
        BitXor => IrBinaryOp::BitXor,
        Shl => IrBinaryOp::Shl,
        Shr => IrBinaryOp::Shr,
        Eq => IrBinaryOp::Eq,
        NotEq => IrBinaryOp::NotEq,
        Lt => IrBinaryOp::Lt,
        LtEq => IrBinaryOp::LtEq,
        Gt => IrBinaryOp::Gt,
        GtEq => IrBinaryOp::GtEq,
        LogicalAnd => IrBinaryOp::LogicalAnd,
        LogicalOr => IrBinaryOp::LogicalOr,
        AddSat | SubSat | MulSat | ShlSat | ArrayCat | ArrayMult | ErrorUnionMerge | Orelse
        | Catch | MergeErrorSets => {
            return Err(CompileError::semantic(
                "array-concat/array-mult, saturating arithmetic, error-union/error-set \
                 operators and orelse/catch are not supported by IR lowering",
            ))
        }
    })
}

fn lower_expr(ctx: &mut FnCtx, node: NodeId) -> Result<IrTempId, CompileError> {
    match &ctx.ast.get(node).kind {
        NodeKind::UnaryExpr(data) => {
            let ops = data.ops.clone();
            let inner = data.inner;
            let mut cur = lower_expr(ctx, inner)?;
            let ty = crate::intern::TypeId::NONE;
            for op in ops.iter().rev() {
                let ir_op = unary_op_to_ir(*op)?;
                cur = ctx.emit(IrOp::Unary(ir_op, cur), ty);
            }
            Ok(cur)
        }
        NodeKind::BinaryExpr(data) => {
            let (op, lhs, rhs) = (data.op, data.lhs, data.rhs);
            let lhs_temp = lower_expr(ctx, lhs)?;
            let rhs_temp = lower_expr(ctx, rhs)?;
            let ir_op = binop_to_ir(op)?;
            Ok(ctx.emit(IrOp::Binary(ir_op, lhs_temp, rhs_temp), crate::intern::TypeId::NONE))
        }
        NodeKind::ReturnExpr(data) => {
            let value = match data.value {
                Some(v) => Some(lower_expr(ctx, v)?),
                None => None,
            };
            ctx.terminate(IrTerm::Ret(value));
            ctx.open_fresh_block();
            Ok(ctx.emit(IrOp::ConstNum(0), crate::intern::TypeId::NONE))
        }
        NodeKind::IfExpr(data) => {
            let (cond, payload, then_expr, else_expr) =
                (data.cond, data.payload, data.then_expr, data.else_expr);
            let _ = payload; // open question: payload binding is not propagated (DESIGN.md)
            let ty = crate::intern::TypeId::NONE;
            // A temp is single-assignment (spec §8): the then/else arms
            // can't both define the same temp, so the destination has to
            // be a variable slot, stored to from each arm and reloaded
            // once both join in `next`.
            let dst = ctx.new_anon_var(ty);

            let cond_temp = lower_expr(ctx, cond)?;
            let then_blk = ctx.func.new_block();
            let else_blk = ctx.func.new_block();
            let next_blk = ctx.func.new_block();
            ctx.terminate(IrTerm::Br { cond: cond_temp, then_blk, else_blk });

            ctx.switch_to(then_blk);
            let then_val = lower_expr(ctx, then_expr)?;
            ctx.emit_void(IrOp::StoreVar(dst, then_val), ty);
            ctx.terminate(IrTerm::Jmp(next_blk));

            ctx.switch_to(else_blk);
            let else_expr = else_expr.ok_or_else(|| {
                CompileError::semantic("if_expr used in expression position requires an else arm")
            })?;
            let else_val = lower_expr(ctx, else_expr)?;
            ctx.emit_void(IrOp::StoreVar(dst, else_val), ty);
            ctx.terminate(IrTerm::Jmp(next_blk));

            ctx.switch_to(next_blk);
            Ok(ctx.emit(IrOp::LoadVar(dst), ty))
        }
        NodeKind::PrimaryTypeExpr(data) => lower_primary_leaf(ctx, &data.leaf),
        NodeKind::SuffixExpr(data) => lower_suffix_expr(ctx, data.primary, &data.suffixes),
        NodeKind::IfPrefix { cond, payload } => {
            let _ = payload;
            lower_expr(ctx, *cond)
        }
        other => Err(CompileError::semantic(format!(
            "{} is not supported by IR lowering",
            other.tag_name()
        ))),
    }
}

fn lower_primary_leaf(
    ctx: &mut FnCtx,
    leaf: &PrimaryLeaf,
) -> Result<IrTempId, CompileError> {
    let ty = crate::intern::TypeId::NONE;
    match leaf {
        PrimaryLeaf::NumberLiteral(id) => {
            let text = ctx.strings.get(*id).replace('_', "");
            let value = parse_number_literal(&text)?;
            Ok(ctx.emit(IrOp::ConstNum(value), ty))
        }
        PrimaryLeaf::CharLiteral(id) => {
            let text = ctx.strings.get(*id);
            let inner = text.trim_matches('\'');
            let byte = inner.bytes().next().unwrap_or(0);
            Ok(ctx.emit(IrOp::ConstChar(byte), ty))
        }
        PrimaryLeaf::StringLiteral(id) => Ok(ctx.emit(IrOp::ConstBytes(*id), ty)),
        PrimaryLeaf::Identifier(id) => {
            let var_id = ctx.func.find_var(*id).ok_or_else(|| {
                CompileError::semantic(format!("use of undeclared variable '{}'", ctx.strings.get(*id)))
            })?;
            Ok(ctx.emit(IrOp::LoadVar(var_id), ty))
        }
        PrimaryLeaf::Unreachable => {
            ctx.emit_void(IrOp::Unreachable, ty);
            Ok(ctx.emit(IrOp::ConstNum(0), ty))
        }
        PrimaryLeaf::Builtin { .. } => {
            Err(CompileError::semantic("builtin calls are not supported by IR lowering"))
        }
        PrimaryLeaf::GroupedExpr(inner) => lower_expr(ctx, *inner),
    }
}

fn parse_number_literal(text: &str) -> Result<i64, CompileError> {
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else if let Some(oct) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
        i64::from_str_radix(oct, 8)
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2)
    } else {
        return text
            .parse::<i64>()
            .map_err(|_| CompileError::semantic(format!("malformed number literal '{text}'")));
    };
    parsed.map_err(|_| CompileError::semantic(format!("malformed number literal '{text}'")))
}

fn lower_suffix_expr(
    ctx: &mut FnCtx,
    primary: NodeId,
    suffixes: &[NodeId],
) -> Result<IrTempId, CompileError> {
    if suffixes.len() == 1 {
        if let NodeKind::FnCallArguments(call) = &ctx.ast.get(suffixes[0]).kind {
            let args = call.args.clone();
            if args.len() > MAX_CALL_ARGS {
                return Err(CompileError::semantic(format!(
                    "call with {} arguments exceeds the {MAX_CALL_ARGS}-argument limit",
                    args.len()
                )));
            }
            let callee_name = ctx.resolver().eval_symbol_name(primary)?;
            let mut arg_temps = Vec::with_capacity(args.len());
            for arg in args {
                arg_temps.push(lower_expr(ctx, arg)?);
            }
            return Ok(ctx.emit(IrOp::Call(callee_name, arg_temps), crate::intern::TypeId::NONE));
        }
    }
    Err(CompileError::semantic(
        "only a single fn_call_arguments suffix is supported by IR lowering",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SourceFile;
    use crate::parser::Parser;

    fn lower_src(src: &str) -> Result<IrProgram, CompileError> {
        let file = SourceFile::new("t.sub", src.to_string());
        let file = Box::leak(Box::new(file));
        let pool = StringPool::new();
        let pool = Box::leak(Box::new(pool));
        let out = Parser::parse(file, pool).expect("parse should succeed");
        let mut types = TypeTable::new();
        lower_program(&out.ast, out.root, pool, &mut types)
    }

    #[test]
    fn trivial_function_lowers_to_one_func_with_ret() {
        let program = lower_src("pub fn main() c_int { return 0; }").unwrap();
        assert_eq!(program.funcs.len(), 1);
        let f = &program.funcs[0];
        assert!(f.is_fully_terminated());
    }

    #[test]
    fn while_loop_has_four_blocks_in_order() {
        let program = lower_src(
            "fn f() void { var i: u32 = 0; while (i != 10) : (i += 1) { _ = i; } }",
        )
        .unwrap();
        let f = &program.funcs[0];
        // entry + cond + body + cont + next = 5 blocks
        assert_eq!(f.blocks.len(), 5);
        assert!(f.is_fully_terminated());
    }

    #[test]
    fn if_expr_materialises_destination_across_both_arms() {
        let program =
            lower_src("fn f(a: bool, b: u32, c: u32) u32 { return if (a) b else c; }").unwrap();
        let func = &program.funcs[0];
        assert!(func.is_fully_terminated());

        // then_blk and else_blk each store the same destination variable,
        // and the join block reloads it rather than discarding the value.
        let store_vars: Vec<_> = func
            .blocks
            .iter()
            .flat_map(|b| &b.insts)
            .filter_map(|inst| match &inst.op {
                IrOp::StoreVar(v, _) => Some(*v),
                _ => None,
            })
            .collect();
        assert_eq!(store_vars.len(), 2, "both arms should store into the destination var");
        assert_eq!(store_vars[0], store_vars[1], "both arms must target the same var");

        let loads_dst = func.blocks.iter().flat_map(|b| &b.insts).any(|inst| {
            matches!(&inst.op, IrOp::LoadVar(v) if *v == store_vars[0])
        });
        assert!(loads_dst, "the join block must reload the materialised destination");
    }

    #[test]
    fn unary_stack_applies_right_to_left() {
        let program = lower_src("fn f(x: i32) i32 { return -~!x; }").unwrap();
        let func = &program.funcs[0];
        let entry = func.block(IrBlockId(0));
        let unary_ops: Vec<_> = entry
            .insts
            .iter()
            .filter_map(|inst| match &inst.op {
                IrOp::Unary(op, _) => Some(*op),
                _ => None,
            })
            .collect();
        assert_eq!(
            unary_ops,
            vec![IrUnaryOp::LogicalNot, IrUnaryOp::BitNot, IrUnaryOp::Negate]
        );
    }

    #[test]
    fn multi_assign_is_rejected_by_lowering() {
        let err = lower_src("fn f() void { var a: u32 = 0; var b: u32 = 0; a, b = c; }").unwrap_err();
        assert!(matches!(err, CompileError::Semantic(_)));
    }

    #[test]
    fn defer_is_rejected_by_lowering() {
        let err = lower_src("fn f() void { defer { } }").unwrap_err();
        assert!(matches!(err, CompileError::Semantic(msg) if msg.contains("defer_statement")));
    }

    #[test]
    fn call_with_too_many_arguments_is_rejected() {
        let args = (0..17).map(|i| format!("{i}")).collect::<Vec<_>>().join(", ");
        let src = format!("fn g() void {{ }} fn f() void {{ g({args}); }}");
        let err = lower_src(&src).unwrap_err();
        assert!(matches!(err, CompileError::Semantic(msg) if msg.contains("exceeds")));
    }
}
