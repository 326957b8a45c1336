//! C code emitter (spec §4.6): a stateless printer over the lowered IR.
//!
//! Mirrors the teacher's `CodeGen` design in spirit — a single growable
//! output `String` threaded through `write!`/`writeln!` calls, plus one
//! small piece of bookkeeping (which symbols have been forward-declared) —
//! generalized from LLVM-IR-as-text to a C11 translation unit. Blocks
//! become `block_<id>:` labels; `IrTerm` becomes `goto`/`if`/`return`. No
//! attempt is made to re-fold the CFG back into structured control flow.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::diagnostics::CompileError;
use crate::intern::{StrId, TypeId};
use crate::ir::{IrBinaryOp, IrFunc, IrInst, IrOp, IrProgram, IrTerm, IrUnaryOp, IrVarId};
use crate::types::TypeTable;

/// Default C type for a temp/variable whose declared type did not resolve
/// (spec §4.4 only resolves a fixed builtin subset; anything else is left
/// as `TypeId::NONE` by the resolver and printed as this fallback rather
/// than aborting emission — lowering is where unsupported types are
/// rejected, per §4.5.6; emission only ever sees what lowering let through).
const FALLBACK_C_TYPE: &str = "int32_t";

pub struct CodeGen<'a> {
    types: &'a TypeTable,
    out: String,
    forward_declared: HashSet<StrId>,
}

impl<'a> CodeGen<'a> {
    pub fn new(types: &'a TypeTable) -> Self {
        CodeGen {
            types,
            out: String::new(),
            forward_declared: HashSet::new(),
        }
    }

    pub fn emit_program(
        mut self,
        program: &IrProgram,
        strings: &crate::intern::StringPool,
        binary_name: &str,
        version: &str,
        prelude: Option<&str>,
    ) -> Result<String, CompileError> {
        self.emit_prologue(binary_name, version, prelude)?;
        for func in &program.funcs {
            self.emit_forward_decl(func, strings)?;
        }
        writeln!(self.out)?;
        for func in &program.funcs {
            self.emit_function(func, strings)?;
        }
        Ok(self.out)
    }

    fn c_type(&self, ty: TypeId) -> String {
        if ty == TypeId::NONE {
            FALLBACK_C_TYPE.to_string()
        } else {
            self.types.c_type_name(ty)
        }
    }

    fn emit_prologue(
        &mut self,
        binary_name: &str,
        version: &str,
        prelude: Option<&str>,
    ) -> Result<(), CompileError> {
        writeln!(self.out, "/* Generated by {binary_name} {version} */")?;
        if prelude.is_some() {
            writeln!(self.out, "#include \"prelude.h\"")?;
        } else {
            writeln!(self.out, "#include <stddef.h>")?;
            writeln!(self.out, "#include <stdbool.h>")?;
            writeln!(self.out, "#include <stdint.h>")?;
        }
        Ok(())
    }

    fn signature(&self, func: &IrFunc, strings: &crate::intern::StringPool) -> String {
        let ret = func
            .return_type
            .map(|t| self.c_type(t))
            .unwrap_or_else(|| "void".to_string());
        let storage = if func.is_static { "static " } else { "" };
        let params: Vec<String> = func
            .params
            .iter()
            .map(|&v| format!("{} {}", self.c_type(func.var(v).ty), var_name(v)))
            .collect();
        let params = if params.is_empty() {
            "void".to_string()
        } else {
            params.join(", ")
        };
        format!("{storage}{ret} {}({params})", strings.get(func.name))
    }

    fn emit_forward_decl(
        &mut self,
        func: &IrFunc,
        strings: &crate::intern::StringPool,
    ) -> Result<(), CompileError> {
        if self.forward_declared.insert(func.name) {
            writeln!(self.out, "{};", self.signature(func, strings))?;
        }
        Ok(())
    }

    fn emit_function(&mut self, func: &IrFunc, strings: &crate::intern::StringPool) -> Result<(), CompileError> {
        writeln!(self.out, "{} {{", self.signature(func, strings))?;
        let param_slots: HashSet<u32> = func.params.iter().map(|v| v.0).collect();
        for (slot, var) in func.vars.iter().enumerate() {
            if param_slots.contains(&(slot as u32)) {
                continue;
            }
            writeln!(
                self.out,
                "  {} {};",
                self.c_type(var.ty),
                var_name(IrVarId(slot as u32))
            )?;
        }
        for (i, block) in func.blocks.iter().enumerate() {
            writeln!(self.out, "block_{i}:")?;
            for inst in &block.insts {
                self.emit_inst(inst, strings)?;
            }
            self.emit_term(&block.term)?;
        }
        writeln!(self.out, "}}")?;
        writeln!(self.out)?;
        Ok(())
    }

    fn emit_inst(&mut self, inst: &IrInst, strings: &crate::intern::StringPool) -> Result<(), CompileError> {
        let mut ty_override = None;
        let rhs = match &inst.op {
            IrOp::ConstNum(n) => n.to_string(),
            IrOp::ConstChar(c) => format!("'{}'", escape_c_char(*c)),
            IrOp::ConstBytes(id) => {
                ty_override = Some("const char*");
                escape_c_string(strings.get(*id))
            }
            IrOp::LoadVar(v) | IrOp::LoadArg(v) => var_name(*v),
            IrOp::StoreVar(v, t) => {
                writeln!(self.out, "  {} = {};", var_name(*v), temp_name(*t))?;
                return Ok(());
            }
            IrOp::Unary(op, t) => format!("{}{}", unary_op_str(*op), temp_name(*t)),
            IrOp::Binary(op, a, b) => {
                format!("{} {} {}", temp_name(*a), binary_op_str(*op), temp_name(*b))
            }
            IrOp::Call(name, args) => {
                let arg_list = args.iter().map(|a| temp_name(*a)).collect::<Vec<_>>().join(", ");
                format!("{}({arg_list})", strings.get(*name))
            }
            IrOp::Copy(t) => temp_name(*t),
            IrOp::Unreachable => {
                writeln!(self.out, "  /* unreachable */")?;
                return Ok(());
            }
        };
        match inst.dest {
            Some(t) => {
                let ty = ty_override.map(str::to_string).unwrap_or_else(|| self.c_type(inst.ty));
                writeln!(self.out, "  {ty} {} = {rhs};", temp_name(t))?
            }
            None => writeln!(self.out, "  {rhs};")?,
        }
        Ok(())
    }

    fn emit_term(&mut self, term: &IrTerm) -> Result<(), CompileError> {
        match term {
            IrTerm::Jmp(b) => writeln!(self.out, "  goto block_{};", b.0)?,
            IrTerm::Br { cond, then_blk, else_blk } => writeln!(
                self.out,
                "  if ({}) goto block_{}; else goto block_{};",
                temp_name(*cond),
                then_blk.0,
                else_blk.0
            )?,
            IrTerm::Ret(Some(t)) => writeln!(self.out, "  return {};", temp_name(*t))?,
            IrTerm::Ret(None) => writeln!(self.out, "  return;")?,
            IrTerm::Next => {
                return Err(CompileError::semantic(
                    "a block with an unset terminator reached the emitter (lowering bug)",
                ))
            }
        }
        Ok(())
    }
}

fn var_name(id: IrVarId) -> String {
    format!("v{}", id.0)
}

fn temp_name(id: crate::ir::IrTempId) -> String {
    format!("t{}", id.0)
}

fn escape_c_char(byte: u8) -> String {
    match byte {
        b'\'' => "\\'".to_string(),
        b'\\' => "\\\\".to_string(),
        b'\n' => "\\n".to_string(),
        b'\t' => "\\t".to_string(),
        0x20..=0x7e => (byte as char).to_string(),
        _ => format!("\\x{byte:02x}"),
    }
}

fn escape_c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for b in s.bytes() {
        out.push_str(&match b {
            b'"' => "\\\"".to_string(),
            b'\\' => "\\\\".to_string(),
            b'\n' => "\\n".to_string(),
            b'\t' => "\\t".to_string(),
            0x20..=0x7e => (b as char).to_string(),
            _ => format!("\\x{b:02x}"),
        });
    }
    out.push('"');
    out
}

fn unary_op_str(op: IrUnaryOp) -> &'static str {
    match op {
        IrUnaryOp::Negate => "-",
        IrUnaryOp::BitNot => "~",
        IrUnaryOp::LogicalNot => "!",
        IrUnaryOp::AddressOf => "&",
    }
}

fn binary_op_str(op: IrBinaryOp) -> &'static str {
    match op {
        IrBinaryOp::Add => "+",
        IrBinaryOp::Sub => "-",
        IrBinaryOp::Mul => "*",
        IrBinaryOp::Div => "/",
        IrBinaryOp::Mod => "%",
        IrBinaryOp::BitAnd => "&",
        IrBinaryOp::BitOr => "|",
        IrBinaryOp::BitXor => "^",
        IrBinaryOp::Shl => "<<",
        IrBinaryOp::Shr => ">>",
        IrBinaryOp::Eq => "==",
        IrBinaryOp::NotEq => "!=",
        IrBinaryOp::Lt => "<",
        IrBinaryOp::LtEq => "<=",
        IrBinaryOp::Gt => ">",
        IrBinaryOp::GtEq => ">=",
        IrBinaryOp::LogicalAnd => "&&",
        IrBinaryOp::LogicalOr => "||",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::StringPool;
    use crate::ir::{IrFunc, IrInst};

    #[test]
    fn forward_declares_before_definitions() {
        let mut strings = StringPool::new();
        let name = strings.put("f");
        let mut func = IrFunc::new(name, false);
        let b0 = func.new_block();
        func.block_mut(b0).term = IrTerm::Ret(None);
        let mut program = IrProgram::new();
        program.funcs.push(func);

        let types = TypeTable::new();
        let gen = CodeGen::new(&types);
        let out = gen.emit_program(&program, &strings, "subc", "0.1.0", None).unwrap();
        let decl_pos = out.find("void f(void);").unwrap();
        let def_pos = out.find("void f(void) {").unwrap();
        assert!(decl_pos < def_pos);
    }

    #[test]
    fn binary_instruction_is_one_c_statement() {
        let mut strings = StringPool::new();
        let name = strings.put("f");
        let mut func = IrFunc::new(name, false);
        let b0 = func.new_block();
        let t0 = func.new_temp();
        let t1 = func.new_temp();
        let t2 = func.new_temp();
        func.block_mut(b0).insts.push(IrInst {
            dest: Some(t0),
            ty: TypeId::NONE,
            op: IrOp::ConstNum(1),
        });
        func.block_mut(b0).insts.push(IrInst {
            dest: Some(t1),
            ty: TypeId::NONE,
            op: IrOp::ConstNum(2),
        });
        func.block_mut(b0).insts.push(IrInst {
            dest: Some(t2),
            ty: TypeId::NONE,
            op: IrOp::Binary(IrBinaryOp::Add, t0, t1),
        });
        func.block_mut(b0).term = IrTerm::Ret(Some(t2));
        let mut program = IrProgram::new();
        program.funcs.push(func);

        let types = TypeTable::new();
        let gen = CodeGen::new(&types);
        let out = gen.emit_program(&program, &strings, "subc", "0.1.0", None).unwrap();
        assert!(out.contains("int32_t t2 = t0 + t1;"));
    }

    #[test]
    fn prologue_has_generated_header_first() {
        let strings = StringPool::new();
        let program = IrProgram::new();
        let types = TypeTable::new();
        let gen = CodeGen::new(&types);
        let out = gen.emit_program(&program, &strings, "subc", "0.1.0", None).unwrap();
        assert!(out.starts_with("/* Generated by subc 0.1.0 */"));
        assert!(out.contains("#include <stdint.h>"));
    }
}
