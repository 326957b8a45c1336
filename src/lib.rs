//! Source-to-source compiler library: tokenizer, parser, resolver, IR
//! lowering and C emitter, assembled into a handful of entry points a
//! binary (or an embedder) can call without spawning a process.

pub mod ast;
pub mod buffer;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod intern;
pub mod ir;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod render;
pub mod resolver;
pub mod token;
pub mod types;

use std::fs;
use std::path::Path;

use buffer::SourceFile;
use codegen::CodeGen;
use config::CompilerConfig;
use diagnostics::CompileError;
use intern::StringPool;
use ir::IrProgram;
use lexer::Lexer;
use parser::Parser;
use types::TypeTable;

/// A parsed source file: enough for a `-tokens`/`-ast` dump without paying
/// for lowering or emission.
pub struct ParsedSource {
    pub source: SourceFile,
    pub ast: ast::Ast,
    pub root: ast::NodeId,
    pub strings: StringPool,
}

/// A lowered source file: enough for an `-ir` dump without paying for
/// emission.
pub struct LoweredSource {
    pub source: SourceFile,
    pub ast: ast::Ast,
    pub root: ast::NodeId,
    pub strings: StringPool,
    pub ir: IrProgram,
    pub types: TypeTable,
}

/// Everything produced by a successful compile, for callers that want the
/// final C text alongside every intermediate artifact.
pub struct CompileArtifacts {
    pub source: SourceFile,
    pub ast: ast::Ast,
    pub root: ast::NodeId,
    pub strings: StringPool,
    pub ir: IrProgram,
    pub c_source: String,
}

/// Tokenize and parse, stopping short of semantic resolution (spec §4.2).
pub fn parse_source(source_path: &Path, source_text: String) -> Result<ParsedSource, CompileError> {
    let source = SourceFile::new(source_path, source_text);
    let mut strings = StringPool::new();
    tracing::debug!(path = %source_path.display(), "parsing");
    let output = Parser::parse(&source, &mut strings)?;
    Ok(ParsedSource {
        source,
        ast: output.ast,
        root: output.root,
        strings,
    })
}

/// Parse and lower to IR, stopping short of C emission (spec §4.5).
pub fn lower_source(source_path: &Path, source_text: String) -> Result<LoweredSource, CompileError> {
    let parsed = parse_source(source_path, source_text)?;
    let mut types = TypeTable::new();
    tracing::debug!(path = %source_path.display(), "lowering");
    let ir = lower::lower_program(&parsed.ast, parsed.root, &parsed.strings, &mut types)?;
    Ok(LoweredSource {
        source: parsed.source,
        ast: parsed.ast,
        root: parsed.root,
        strings: parsed.strings,
        ir,
        types,
    })
}

/// Run the full pipeline and return every intermediate artifact, without
/// touching the filesystem beyond an optional `prelude.h` read.
pub fn compile_source(
    source_path: &Path,
    source_text: String,
    config: &CompilerConfig,
    binary_name: &str,
    version: &str,
) -> Result<CompileArtifacts, CompileError> {
    let lowered = lower_source(source_path, source_text)?;

    let prelude = config
        .lib_dir
        .as_ref()
        .map(|dir| fs::read_to_string(dir.join("prelude.h")))
        .transpose()?;

    tracing::debug!(path = %source_path.display(), "emitting C");
    let c_source = CodeGen::new(&lowered.types)
        .emit_program(&lowered.ir, &lowered.strings, binary_name, version, prelude.as_deref())?;

    Ok(CompileArtifacts {
        source: lowered.source,
        ast: lowered.ast,
        root: lowered.root,
        strings: lowered.strings,
        ir: lowered.ir,
        c_source,
    })
}

/// Compile a file on disk straight through to a `.c` file on disk (spec
/// §6's default, no-dump-flags behaviour).
pub fn compile_file(
    source_path: &Path,
    config: &CompilerConfig,
    binary_name: &str,
    version: &str,
) -> Result<CompileArtifacts, CompileError> {
    let text = fs::read_to_string(source_path)?;
    let artifacts = compile_source(source_path, text, config, binary_name, version)?;
    fs::write(&config.output, &artifacts.c_source)?;
    Ok(artifacts)
}

/// Tokenize a source file without parsing it, for `-tokens` dumps and
/// anything that wants raw lexical structure.
pub fn tokenize_file(source_path: &Path) -> Result<(SourceFile, Vec<token::Token>), CompileError> {
    let text = fs::read_to_string(source_path)?;
    let source = SourceFile::new(source_path, text);
    let tokens = Lexer::tokenize_all(source.text());
    Ok((source, tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn compiles_trivial_function_to_c() {
        let config = CompilerConfig::new(PathBuf::from("out.c"));
        let artifacts = compile_source(
            Path::new("t.sub"),
            "fn add(a: i32, b: i32) i32 { return a + b; }".to_string(),
            &config,
            "subc",
            "0.1.0",
        )
        .unwrap();
        assert!(artifacts.c_source.contains("add"));
        assert!(artifacts.c_source.contains("return"));
        assert_eq!(artifacts.ir.funcs.len(), 1);
    }

    #[test]
    fn reports_located_syntax_errors() {
        let config = CompilerConfig::new(PathBuf::from("out.c"));
        let err = compile_source(
            Path::new("t.sub"),
            "fn add(a: i32, b: i32) i32 {".to_string(),
            &config,
            "subc",
            "0.1.0",
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Syntax { .. }));
    }

    #[test]
    fn tokenize_file_reads_and_tokenizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.sub");
        fs::write(&path, "fn f").unwrap();
        let (_src, tokens) = tokenize_file(&path).unwrap();
        assert!(tokens.len() >= 2);
    }
}
