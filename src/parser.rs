//! Recursive-descent parser: token stream → AST.
//!
//! Two function flavours, matching spec §4.2/§9:
//! - `parse_*` returns `ParseResult<NodeId> = Result<NodeId, NoMatch>` and
//!   restores the cursor on a miss, so callers can try alternatives.
//! - `expect_*` commits: it either returns a `NodeId` or a located
//!   `CompileError::Syntax`. There is no recoverable path past an
//!   `expect_*` failure, so it returns `Result<_, CompileError>` rather
//!   than the `ParseResult` sentinel.

use crate::ast::{
    Ast, AssignOp, BinOp, BinaryExprData, BlockData, ContainerMembersData, DeclFnData,
    FnCallArgumentsData, FnProtoData, ForItemData, ForStatementData, IfExprData, IfStatementData,
    MultiAssignExprData, NodeId, NodeKind, ParamDecl, PrefixTypeOpData, PrefixTypeOpKind,
    PrimaryLeaf, PrimaryTypeExprData, ReturnExprData, SingleAssignExprData, Span, SuffixExprData,
    SuffixTypeOpData, SuffixTypeOpKind, UnaryExprData, UnaryOp, VarDeclData, WhileStatementData,
};
use crate::buffer::SourceFile;
use crate::diagnostics::CompileError;
use crate::intern::StringPool;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Sentinel "no match" for speculative `parse_*` productions.
pub struct NoMatch;
pub type ParseResult<T> = Result<T, NoMatch>;

/// Reference uses 3000; exceeding it on a loop that should be making
/// progress each iteration is a parser bug, not malformed input.
const LOOP_GUARD: u32 = 3000;

pub struct ParseOutput {
    pub ast: Ast,
    pub root: NodeId,
}

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    src: &'a SourceFile,
    ast: Ast,
    strings: &'a mut StringPool,
}

impl<'a> Parser<'a> {
    pub fn parse(
        src: &'a SourceFile,
        strings: &'a mut StringPool,
    ) -> Result<ParseOutput, CompileError> {
        let tokens = Lexer::tokenize_all(src.text());
        let mut parser = Parser {
            tokens,
            pos: 0,
            src,
            ast: Ast::new(),
            strings,
        };
        let root = parser.expect_container_members()?;
        parser.expect_eof()?;
        Ok(ParseOutput { ast: parser.ast, root })
    }

    // --- cursor plumbing -------------------------------------------------

    fn cur(&self) -> Token {
        self.tokens[self.pos]
    }

    fn cur_kind(&self) -> TokenKind {
        self.cur().kind
    }

    fn text(&self, tok: Token) -> &str {
        self.src.slice(tok.start, tok.end).as_str()
    }

    fn bump(&mut self) -> Token {
        let t = self.cur();
        if !t.kind.is_eof() {
            self.pos += 1;
        }
        t
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.cur_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn snapshot(&self) -> usize {
        self.pos
    }

    fn span_from(&self, start_pos: usize) -> Span {
        let start = self.tokens[start_pos].start;
        let end = self.tokens[self.pos.saturating_sub(1).max(start_pos)].end;
        Span { start, end }
    }

    fn push(&mut self, start_pos: usize, kind: NodeKind) -> NodeId {
        let span = self.span_from(start_pos);
        self.ast.push(kind, span)
    }

    fn error_here(&self, message: impl Into<String>) -> CompileError {
        let tok = self.cur();
        let line = self.src.line_of(tok.start);
        let column = self.src.column_of(tok.start);
        CompileError::Syntax {
            message: message.into(),
            line,
            column,
            line_text: self.src.line_text(tok.start).to_string(),
        }
    }

    fn expect_token(&mut self, kind: TokenKind, what: &str) -> Result<Token, CompileError> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.error_here(format!(
                "expected {what} ({}), found {}",
                kind.name(),
                self.cur_kind().name()
            )))
        }
    }

    fn expect_eof(&mut self) -> Result<(), CompileError> {
        self.expect_token(TokenKind::token_eof, "end of file").map(|_| ())
    }

    fn intern_ident(&mut self, tok: Token) -> crate::intern::StrId {
        let s = self.text(tok).to_string();
        self.strings.put(&s)
    }

    // --- top level ---------------------------------------------------------

    fn expect_container_members(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        let mut decls = Vec::new();
        let fields = Vec::new();
        let mut guard = 0;
        while !self.at(TokenKind::token_eof) {
            guard += 1;
            if guard > LOOP_GUARD {
                return Err(self.error_here("loop guard exceeded while parsing container members"));
            }
            let before = self.pos;
            let decl = self.expect_top_level_decl()?;
            decls.push(decl);
            debug_assert!(self.pos > before, "top-level decl parse must advance the cursor");
        }
        Ok(self.push(
            start,
            NodeKind::ContainerMembers(Box::new(ContainerMembersData { decls, fields })),
        ))
    }

    fn expect_top_level_decl(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        let is_pub = self.eat(TokenKind::token_keyword_pub);
        let is_export = self.eat(TokenKind::token_keyword_export);
        let is_extern = self.eat(TokenKind::token_keyword_extern);

        if self.at(TokenKind::token_keyword_fn) {
            return self.expect_fn_decl(start, is_pub, is_export, is_extern);
        }
        if self.at(TokenKind::token_keyword_const) || self.at(TokenKind::token_keyword_var) {
            let decl = self.expect_var_decl_statement()?;
            return Ok(decl);
        }
        if self.eat(TokenKind::token_keyword_test) {
            let name = if self.at(TokenKind::token_string_literal) {
                let tok = self.bump();
                Some(self.intern_ident(tok))
            } else {
                None
            };
            let body = self.expect_block()?;
            return Ok(self.push(start, NodeKind::TestDecl { name, body }));
        }
        if self.eat(TokenKind::token_keyword_comptime) {
            let body = self.expect_block()?;
            return Ok(self.push(start, NodeKind::ComptimeDecl { body }));
        }
        Err(self.error_here(format!(
            "expected a top-level declaration, found {}",
            self.cur_kind().name()
        )))
    }

    fn expect_fn_decl(
        &mut self,
        start: usize,
        is_pub: bool,
        is_export: bool,
        is_extern: bool,
    ) -> Result<NodeId, CompileError> {
        self.expect_token(TokenKind::token_keyword_fn, "'fn'")?;
        let name_tok = self.expect_token(TokenKind::token_identifier, "function name")?;
        let name = Some(self.intern_ident(name_tok));
        self.expect_token(TokenKind::token_l_paren, "'('")?;
        let params = self.expect_param_decl_list()?;
        self.expect_token(TokenKind::token_r_paren, "')'")?;
        let return_type = Some(self.expect_type_expr()?);

        let proto = FnProtoData {
            name,
            params,
            return_type,
            is_pub,
            is_export,
            is_extern,
            is_inline: false,
        };

        if self.eat(TokenKind::token_semicolon) {
            // extern prototype with no body
            return Ok(self.push(
                start,
                NodeKind::DeclFn(Box::new(DeclFnData {
                    proto: Box::new(proto),
                    body: None,
                })),
            ));
        }
        let body = self.expect_block()?;
        Ok(self.push(
            start,
            NodeKind::DeclFn(Box::new(DeclFnData {
                proto: Box::new(proto),
                body: Some(body),
            })),
        ))
    }

    fn expect_param_decl_list(&mut self) -> Result<Vec<ParamDecl>, CompileError> {
        let mut params = Vec::new();
        if self.at(TokenKind::token_r_paren) {
            return Ok(params);
        }
        let mut guard = 0;
        loop {
            guard += 1;
            if guard > LOOP_GUARD {
                return Err(self.error_here("loop guard exceeded while parsing parameters"));
            }
            if self.eat(TokenKind::token_ellipsis3) {
                params.push(ParamDecl {
                    name: None,
                    is_comptime: false,
                    is_noalias: false,
                    type_expr: None,
                    is_varargs: true,
                });
                break;
            }
            let is_comptime = self.eat(TokenKind::token_keyword_comptime);
            let is_noalias = self.eat(TokenKind::token_keyword_noalias);
            let name = if self.at(TokenKind::token_identifier) {
                let tok = self.bump();
                Some(self.intern_ident(tok))
            } else {
                None
            };
            let type_expr = if name.is_some() {
                self.expect_token(TokenKind::token_colon, "':'")?;
                Some(self.expect_type_expr()?)
            } else {
                Some(self.expect_type_expr()?)
            };
            params.push(ParamDecl {
                name,
                is_comptime,
                is_noalias,
                type_expr,
                is_varargs: false,
            });
            if !self.eat(TokenKind::token_comma) {
                break;
            }
            if self.at(TokenKind::token_r_paren) {
                break;
            }
        }
        Ok(params)
    }

    // --- types ---------------------------------------------------------

    fn expect_type_expr(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        if self.at(TokenKind::token_asterisk) || self.at(TokenKind::token_asterisk_asterisk) {
            self.bump();
            let modifiers = self.expect_pointer_modifiers();
            let inner = self.expect_type_expr()?;
            return Ok(self.push(
                start,
                NodeKind::PrefixTypeOp(Box::new(PrefixTypeOpData {
                    kind: PrefixTypeOpKind::Ptr,
                    modifiers,
                    inner,
                })),
            ));
        }
        if self.eat(TokenKind::token_question_mark) {
            let inner = self.expect_type_expr()?;
            return Ok(self.push(
                start,
                NodeKind::PrefixTypeOp(Box::new(PrefixTypeOpData {
                    kind: PrefixTypeOpKind::Optional,
                    modifiers: 0,
                    inner,
                })),
            ));
        }
        self.expect_primary_type_expr()
    }

    fn expect_pointer_modifiers(&mut self) -> u32 {
        use crate::types::{MOD_ALLOWZERO, MOD_CONST, MOD_VOLATILE};
        let mut modifiers = 0;
        let mut guard = 0;
        loop {
            guard += 1;
            if guard > LOOP_GUARD {
                break;
            }
            if self.eat(TokenKind::token_keyword_const) {
                modifiers |= MOD_CONST;
            } else if self.eat(TokenKind::token_keyword_volatile) {
                modifiers |= MOD_VOLATILE;
            } else if self.eat(TokenKind::token_keyword_allowzero) {
                modifiers |= MOD_ALLOWZERO;
            } else {
                break;
            }
        }
        modifiers
    }

    fn expect_primary_type_expr(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        if self.at(TokenKind::token_identifier) {
            let tok = self.bump();
            let id = self.intern_ident(tok);
            return Ok(self.push(
                start,
                NodeKind::PrimaryTypeExpr(Box::new(PrimaryTypeExprData {
                    leaf: PrimaryLeaf::Identifier(id),
                })),
            ));
        }
        Err(self.error_here("expected a type expression"))
    }

    // --- statements ------------------------------------------------------

    fn expect_block(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        self.expect_token(TokenKind::token_l_brace, "'{'")?;
        let mut statements = Vec::new();
        let mut guard = 0;
        while !self.at(TokenKind::token_r_brace) {
            guard += 1;
            if guard > LOOP_GUARD {
                return Err(self.error_here("loop guard exceeded while parsing a block"));
            }
            let before = self.pos;
            statements.push(self.expect_statement()?);
            debug_assert!(self.pos > before, "statement parse must advance the cursor");
        }
        self.expect_token(TokenKind::token_r_brace, "'}'")?;
        Ok(self.push(
            start,
            NodeKind::Block(Box::new(BlockData { label: None, statements })),
        ))
    }

    fn expect_statement(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        if self.at(TokenKind::token_keyword_const) || self.at(TokenKind::token_keyword_var) {
            return self.expect_var_decl_statement();
        }
        if self.eat(TokenKind::token_keyword_return) {
            let value = if self.at(TokenKind::token_semicolon) {
                None
            } else {
                Some(self.expect_expr()?)
            };
            self.expect_token(TokenKind::token_semicolon, "';'")?;
            return Ok(self.push(start, NodeKind::ReturnExpr(Box::new(ReturnExprData { value }))));
        }
        if self.at(TokenKind::token_keyword_if) {
            return self.expect_if_statement();
        }
        if self.at(TokenKind::token_keyword_while) {
            return self.expect_while_statement();
        }
        if self.at(TokenKind::token_keyword_for) {
            return self.expect_for_statement();
        }
        if self.eat(TokenKind::token_keyword_defer) {
            let inner = self.expect_block_or_statement_expr()?;
            return Ok(self.push(start, NodeKind::DeferStatement(inner)));
        }
        if self.eat(TokenKind::token_keyword_errdefer) {
            let inner = self.expect_block_or_statement_expr()?;
            return Ok(self.push(
                start,
                NodeKind::ErrdeferStatement { payload: None, body: inner },
            ));
        }
        if self.eat(TokenKind::token_keyword_suspend) {
            let inner = self.expect_block_or_statement_expr()?;
            return Ok(self.push(start, NodeKind::SuspendStatement(inner)));
        }
        if self.eat(TokenKind::token_keyword_nosuspend) {
            let inner = self.expect_block_or_statement_expr()?;
            return Ok(self.push(start, NodeKind::NosuspendStatement(inner)));
        }
        if self.eat(TokenKind::token_keyword_comptime) {
            let inner = self.expect_block_or_statement_expr()?;
            return Ok(self.push(start, NodeKind::ComptimeStatement(inner)));
        }
        if self.at(TokenKind::token_l_brace) {
            return self.expect_block();
        }
        self.expect_expr_statement()
    }

    fn expect_block_or_statement_expr(&mut self) -> Result<NodeId, CompileError> {
        if self.at(TokenKind::token_l_brace) {
            self.expect_block()
        } else {
            let e = self.expect_expr()?;
            self.expect_token(TokenKind::token_semicolon, "';'")?;
            Ok(e)
        }
    }

    fn expect_var_decl_statement(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        let is_const = self.at(TokenKind::token_keyword_const);
        self.bump(); // const|var
        let name_tok = self.expect_token(TokenKind::token_identifier, "variable name")?;
        let name = self.intern_ident(name_tok);
        let type_expr = if self.eat(TokenKind::token_colon) {
            Some(self.expect_type_expr()?)
        } else {
            None
        };
        let init = if self.eat(TokenKind::token_equal) {
            Some(self.expect_expr()?)
        } else {
            None
        };
        self.expect_token(TokenKind::token_semicolon, "';'")?;
        Ok(self.push(
            start,
            NodeKind::VarDeclStatement(Box::new(VarDeclData {
                name,
                is_const,
                is_pub: false,
                type_expr,
                init,
            })),
        ))
    }

    fn expect_if_statement(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        self.expect_token(TokenKind::token_keyword_if, "'if'")?;
        self.expect_token(TokenKind::token_l_paren, "'('")?;
        let cond = self.expect_expr()?;
        self.expect_token(TokenKind::token_r_paren, "')'")?;
        let then_branch = self.expect_statement_or_block()?;
        let else_branch = if self.eat(TokenKind::token_keyword_else) {
            Some(self.expect_statement_or_block()?)
        } else {
            None
        };
        Ok(self.push(
            start,
            NodeKind::IfStatement(Box::new(IfStatementData {
                cond,
                payload: None,
                then_branch,
                else_branch,
            })),
        ))
    }

    /// `if (cond) then_expr else else_expr` in expression position (spec
    /// §4.5.4 `if_expr`). Unlike `expect_if_statement`, both arms are
    /// expressions, not statements/blocks; the else arm is optional in the
    /// grammar but lowering requires it once the value is actually used.
    fn expect_if_expr(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        self.expect_token(TokenKind::token_keyword_if, "'if'")?;
        self.expect_token(TokenKind::token_l_paren, "'('")?;
        let cond = self.expect_expr()?;
        self.expect_token(TokenKind::token_r_paren, "')'")?;
        let then_expr = self.expect_expr()?;
        let else_expr = if self.eat(TokenKind::token_keyword_else) {
            Some(self.expect_expr()?)
        } else {
            None
        };
        Ok(self.push(
            start,
            NodeKind::IfExpr(Box::new(IfExprData {
                cond,
                payload: None,
                then_expr,
                else_expr,
            })),
        ))
    }

    fn expect_statement_or_block(&mut self) -> Result<NodeId, CompileError> {
        if self.at(TokenKind::token_l_brace) {
            self.expect_block()
        } else {
            self.expect_statement()
        }
    }

    fn expect_while_statement(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        self.expect_token(TokenKind::token_keyword_while, "'while'")?;
        self.expect_token(TokenKind::token_l_paren, "'('")?;
        let cond = self.expect_expr()?;
        self.expect_token(TokenKind::token_r_paren, "')'")?;
        let continue_expr = if self.eat(TokenKind::token_colon) {
            self.expect_token(TokenKind::token_l_paren, "'('")?;
            let e = self.expect_assign_expr()?;
            self.expect_token(TokenKind::token_r_paren, "')'")?;
            Some(e)
        } else {
            None
        };
        let body = self.expect_statement_or_block()?;
        Ok(self.push(
            start,
            NodeKind::WhileStatement(Box::new(WhileStatementData { cond, continue_expr, body })),
        ))
    }

    fn expect_for_statement(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        self.expect_token(TokenKind::token_keyword_for, "'for'")?;
        self.expect_token(TokenKind::token_l_paren, "'('")?;
        let range_start = self.expect_expr()?;
        self.expect_token(TokenKind::token_ellipsis2, "'..'")?;
        let range_end = self.expect_expr()?;
        self.expect_token(TokenKind::token_r_paren, "')'")?;
        self.expect_token(TokenKind::token_pipe, "'|'")?;
        let index_tok = self.expect_token(TokenKind::token_identifier, "loop index name")?;
        let index_name = self.intern_ident(index_tok);
        self.expect_token(TokenKind::token_pipe, "'|'")?;
        let body = self.expect_statement_or_block()?;
        Ok(self.push(
            start,
            NodeKind::ForStatement(Box::new(ForStatementData {
                item: Box::new(ForItemData {
                    start: range_start,
                    end: range_end,
                    index_name,
                }),
                body,
            })),
        ))
    }

    fn expect_expr_statement(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        let first = self.expect_expr()?;
        if self.eat(TokenKind::token_comma) {
            let mut lhs = vec![first];
            let mut guard = 0;
            loop {
                guard += 1;
                if guard > LOOP_GUARD {
                    return Err(self.error_here("loop guard exceeded while parsing multi-assign"));
                }
                lhs.push(self.expect_expr()?);
                if !self.eat(TokenKind::token_comma) {
                    break;
                }
            }
            self.expect_token(TokenKind::token_equal, "'='")?;
            let rhs = self.expect_expr()?;
            self.expect_token(TokenKind::token_semicolon, "';'")?;
            return Ok(self.push(
                start,
                NodeKind::MultiAssignExpr(Box::new(MultiAssignExprData { lhs, rhs })),
            ));
        }
        if let Some(op) = assign_op_for(self.cur_kind()) {
            self.bump();
            let rhs = self.expect_expr()?;
            self.expect_token(TokenKind::token_semicolon, "';'")?;
            return Ok(self.push(
                start,
                NodeKind::SingleAssignExpr(Box::new(SingleAssignExprData { op, lhs: first, rhs })),
            ));
        }
        self.expect_token(TokenKind::token_semicolon, "';'")?;
        Ok(first)
    }

    /// A single (non-multi) assignment or plain expression, with no
    /// trailing `;` — used by the `while` continue-expr clause, which
    /// sits inside its own parens rather than terminating a statement.
    fn expect_assign_expr(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        let first = self.expect_expr()?;
        if let Some(op) = assign_op_for(self.cur_kind()) {
            self.bump();
            let rhs = self.expect_expr()?;
            return Ok(self.push(
                start,
                NodeKind::SingleAssignExpr(Box::new(SingleAssignExprData { op, lhs: first, rhs })),
            ));
        }
        Ok(first)
    }

    // --- expressions -----------------------------------------------------

    fn expect_expr(&mut self) -> Result<NodeId, CompileError> {
        self.expect_binary_expr(0)
    }

    fn expect_binary_expr(&mut self, min_prec: u8) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        let mut lhs = self.expect_unary_expr()?;
        let mut guard = 0;
        loop {
            guard += 1;
            if guard > LOOP_GUARD {
                return Err(self.error_here("loop guard exceeded while parsing a binary expression"));
            }
            let Some(op) = binop_for(self.cur_kind()) else {
                break;
            };
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.bump();
            let rhs = self.expect_binary_expr(prec + 1)?;
            lhs = self.push(start, NodeKind::BinaryExpr(Box::new(BinaryExprData { op, lhs, rhs })));
        }
        Ok(lhs)
    }

    fn expect_unary_expr(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        let mut ops = Vec::new();
        let mut guard = 0;
        loop {
            guard += 1;
            if guard > LOOP_GUARD {
                return Err(self.error_here("loop guard exceeded while parsing unary prefix ops"));
            }
            let op = if self.eat(TokenKind::token_minus) {
                UnaryOp::Negate
            } else if self.eat(TokenKind::token_tilde) {
                UnaryOp::BitNot
            } else if self.eat(TokenKind::token_bang) {
                UnaryOp::LogicalNot
            } else if self.eat(TokenKind::token_ampersand) {
                UnaryOp::AddressOf
            } else if self.eat(TokenKind::token_keyword_try) {
                UnaryOp::Try
            } else if self.eat(TokenKind::token_minus_percent) {
                UnaryOp::NegateWrap
            } else {
                break;
            };
            ops.push(op);
        }
        let inner = self.expect_suffix_expr()?;
        if ops.is_empty() {
            return Ok(inner);
        }
        Ok(self.push(start, NodeKind::UnaryExpr(Box::new(UnaryExprData { ops, inner }))))
    }

    fn expect_suffix_expr(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        let primary = self.expect_primary_expr()?;
        let mut suffixes = Vec::new();
        let mut guard = 0;
        loop {
            guard += 1;
            if guard > LOOP_GUARD {
                return Err(self.error_here("loop guard exceeded while parsing suffix ops"));
            }
            if self.at(TokenKind::token_l_paren) {
                let call_start = self.snapshot();
                self.bump();
                let mut args = Vec::new();
                if !self.at(TokenKind::token_r_paren) {
                    let mut arg_guard = 0;
                    loop {
                        arg_guard += 1;
                        if arg_guard > LOOP_GUARD {
                            return Err(self.error_here("loop guard exceeded while parsing call arguments"));
                        }
                        args.push(self.expect_expr()?);
                        if !self.eat(TokenKind::token_comma) {
                            break;
                        }
                        if self.at(TokenKind::token_r_paren) {
                            break;
                        }
                    }
                }
                self.expect_token(TokenKind::token_r_paren, "')'")?;
                let callee = suffixes.last().copied().unwrap_or(primary);
                let node = self.push(
                    call_start,
                    NodeKind::FnCallArguments(Box::new(FnCallArgumentsData { callee, args })),
                );
                suffixes.push(node);
                continue;
            }
            if self.eat(TokenKind::token_period) {
                if self.eat(TokenKind::token_asterisk) {
                    let inner = suffixes.last().copied().unwrap_or(primary);
                    let node = self.push(
                        start,
                        NodeKind::SuffixTypeOp(Box::new(SuffixTypeOpData {
                            kind: SuffixTypeOpKind::Deref,
                            name: None,
                            inner,
                        })),
                    );
                    suffixes.push(node);
                    continue;
                }
                if self.eat(TokenKind::token_question_mark) {
                    let inner = suffixes.last().copied().unwrap_or(primary);
                    let node = self.push(
                        start,
                        NodeKind::SuffixTypeOp(Box::new(SuffixTypeOpData {
                            kind: SuffixTypeOpKind::AssertMaybe,
                            name: None,
                            inner,
                        })),
                    );
                    suffixes.push(node);
                    continue;
                }
                let name_tok = self.expect_token(TokenKind::token_identifier, "member name")?;
                let name = self.intern_ident(name_tok);
                let inner = suffixes.last().copied().unwrap_or(primary);
                let node = self.push(
                    start,
                    NodeKind::SuffixTypeOp(Box::new(SuffixTypeOpData {
                        kind: SuffixTypeOpKind::NamedAccess,
                        name: Some(name),
                        inner,
                    })),
                );
                suffixes.push(node);
                continue;
            }
            break;
        }
        if suffixes.is_empty() {
            return Ok(primary);
        }
        Ok(self.push(start, NodeKind::SuffixExpr(Box::new(SuffixExprData { primary, suffixes }))))
    }

    fn expect_primary_expr(&mut self) -> Result<NodeId, CompileError> {
        let start = self.snapshot();
        if self.at(TokenKind::token_keyword_if) {
            return self.expect_if_expr();
        }
        if self.at(TokenKind::token_number_literal) {
            let tok = self.bump();
            let text = self.text(tok).to_string();
            let id = self.strings.put(&text);
            return Ok(self.push(
                start,
                NodeKind::PrimaryTypeExpr(Box::new(PrimaryTypeExprData {
                    leaf: PrimaryLeaf::NumberLiteral(id),
                })),
            ));
        }
        if self.at(TokenKind::token_char_literal) {
            let tok = self.bump();
            let text = self.text(tok).to_string();
            let id = self.strings.put(&text);
            return Ok(self.push(
                start,
                NodeKind::PrimaryTypeExpr(Box::new(PrimaryTypeExprData {
                    leaf: PrimaryLeaf::CharLiteral(id),
                })),
            ));
        }
        if self.at(TokenKind::token_string_literal) {
            let tok = self.bump();
            let text = self.text(tok).to_string();
            let id = self.strings.put(&text);
            return Ok(self.push(
                start,
                NodeKind::PrimaryTypeExpr(Box::new(PrimaryTypeExprData {
                    leaf: PrimaryLeaf::StringLiteral(id),
                })),
            ));
        }
        if self.eat(TokenKind::token_keyword_unreachable) {
            return Ok(self.push(
                start,
                NodeKind::PrimaryTypeExpr(Box::new(PrimaryTypeExprData {
                    leaf: PrimaryLeaf::Unreachable,
                })),
            ));
        }
        if self.at(TokenKind::token_identifier) {
            let tok = self.bump();
            let id = self.intern_ident(tok);
            return Ok(self.push(
                start,
                NodeKind::PrimaryTypeExpr(Box::new(PrimaryTypeExprData {
                    leaf: PrimaryLeaf::Identifier(id),
                })),
            ));
        }
        if self.eat(TokenKind::token_l_paren) {
            let inner = self.expect_expr()?;
            self.expect_token(TokenKind::token_r_paren, "')'")?;
            return Ok(self.push(
                start,
                NodeKind::PrimaryTypeExpr(Box::new(PrimaryTypeExprData {
                    leaf: PrimaryLeaf::GroupedExpr(inner),
                })),
            ));
        }
        if self.at(TokenKind::token_builtin) {
            let tok = self.bump();
            let name = self.intern_ident(tok);
            let mut args = Vec::new();
            if self.eat(TokenKind::token_l_paren) {
                if !self.at(TokenKind::token_r_paren) {
                    let mut guard = 0;
                    loop {
                        guard += 1;
                        if guard > LOOP_GUARD {
                            return Err(self.error_here("loop guard exceeded while parsing builtin arguments"));
                        }
                        args.push(self.expect_expr()?);
                        if !self.eat(TokenKind::token_comma) {
                            break;
                        }
                    }
                }
                self.expect_token(TokenKind::token_r_paren, "')'")?;
            }
            return Ok(self.push(
                start,
                NodeKind::PrimaryTypeExpr(Box::new(PrimaryTypeExprData {
                    leaf: PrimaryLeaf::Builtin { name, args },
                })),
            ));
        }
        Err(self.error_here(format!("expected an expression, found {}", self.cur_kind().name())))
    }
}

fn assign_op_for(kind: TokenKind) -> Option<AssignOp> {
    use TokenKind::*;
    Some(match kind {
        token_equal => AssignOp::Assign,
        token_plus_equal => AssignOp::AddAssign,
        token_minus_equal => AssignOp::SubAssign,
        token_asterisk_equal => AssignOp::MulAssign,
        token_slash_equal => AssignOp::DivAssign,
        token_percent_equal => AssignOp::ModAssign,
        token_ampersand_equal => AssignOp::BitAndAssign,
        token_pipe_equal => AssignOp::BitOrAssign,
        token_caret_equal => AssignOp::BitXorAssign,
        token_angle_bracket_angle_bracket_left_equal => AssignOp::ShlAssign,
        token_angle_bracket_angle_bracket_right_equal => AssignOp::ShrAssign,
        _ => return None,
    })
}

fn binop_for(kind: TokenKind) -> Option<BinOp> {
    use TokenKind::*;
    Some(match kind {
        token_plus => BinOp::Add,
        token_plus_percent => BinOp::AddWrap,
        token_plus_pipe => BinOp::AddSat,
        token_minus => BinOp::Sub,
        token_minus_percent => BinOp::SubWrap,
        token_minus_pipe => BinOp::SubSat,
        token_asterisk => BinOp::Mul,
        token_asterisk_percent => BinOp::MulWrap,
        token_asterisk_pipe => BinOp::MulSat,
        token_slash => BinOp::Div,
        token_percent => BinOp::Mod,
        token_ampersand => BinOp::BitAnd,
        token_pipe => BinOp::BitOr,
        token_caret => BinOp::BitXor,
        token_angle_bracket_angle_bracket_left => BinOp::Shl,
        token_angle_bracket_angle_bracket_left_pipe => BinOp::ShlSat,
        token_angle_bracket_angle_bracket_right => BinOp::Shr,
        token_equal_equal => BinOp::Eq,
        token_bang_equal => BinOp::NotEq,
        token_angle_bracket_left => BinOp::Lt,
        token_angle_bracket_left_equal => BinOp::LtEq,
        token_angle_bracket_right => BinOp::Gt,
        token_angle_bracket_right_equal => BinOp::GtEq,
        token_keyword_and => BinOp::LogicalAnd,
        token_keyword_or => BinOp::LogicalOr,
        token_plus_plus => BinOp::ArrayCat,
        token_asterisk_asterisk => BinOp::ArrayMult,
        token_keyword_orelse => BinOp::Orelse,
        token_keyword_catch => BinOp::Catch,
        token_pipe_pipe => BinOp::MergeErrorSets,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<ParseOutput, CompileError> {
        let file = SourceFile::new("t.sub", src.to_string());
        let file = Box::leak(Box::new(file));
        let pool = StringPool::new();
        let pool = Box::leak(Box::new(pool));
        Parser::parse(file, pool)
    }

    #[test]
    fn trivial_function_parses() {
        let out = parse("pub fn main() c_int { return 0; }").unwrap();
        let root = out.ast.get(out.root);
        match &root.kind {
            NodeKind::ContainerMembers(data) => assert_eq!(data.decls.len(), 1),
            _ => panic!("expected container_members root"),
        }
    }

    #[test]
    fn precedence_nests_multiplication_under_addition() {
        let out = parse("fn f() void { const x = a + b * c; }").unwrap();
        assert!(out.ast.len() > 1);
    }

    #[test]
    fn unexpected_token_produces_located_syntax_error() {
        let err = parse("fn f(").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { .. }));
    }

    #[test]
    fn empty_source_parses_to_empty_container_members() {
        let out = parse("").unwrap();
        match &out.ast.get(out.root).kind {
            NodeKind::ContainerMembers(data) => assert!(data.decls.is_empty()),
            _ => panic!("expected container_members root"),
        }
    }

    #[test]
    fn while_with_continue_expr_parses() {
        let out = parse("fn f() void { var i: u32 = 0; while (i != 10) : (i += 1) { _ = i; } }");
        assert!(out.is_ok());
    }

    #[test]
    fn multi_assign_parses_as_multi_assign_node() {
        let out = parse("fn f() void { a, b = c; }").unwrap();
        assert!(out.ast.len() > 1);
    }

    #[test]
    fn if_in_var_init_position_parses_as_if_expr() {
        let out = parse("fn f() void { const x: u32 = if (a) b else c; }").unwrap();
        let found = (0..out.ast.len())
            .any(|i| matches!(out.ast.get(NodeId(i as u32)).kind, NodeKind::IfExpr(_)));
        assert!(found, "expected an if_expr node in the tree");
    }

    #[test]
    fn if_in_return_position_parses_as_if_expr() {
        let out = parse("fn f() u32 { return if (a) b else c; }").unwrap();
        let found = (0..out.ast.len())
            .any(|i| matches!(out.ast.get(NodeId(i as u32)).kind, NodeKind::IfExpr(_)));
        assert!(found, "expected an if_expr node in the tree");
    }

    #[test]
    fn if_in_statement_position_still_parses_as_if_statement() {
        let out = parse("fn f() void { if (a) { } }").unwrap();
        let root = out.ast.get(out.root);
        let NodeKind::ContainerMembers(data) = &root.kind else { panic!("expected container_members root") };
        let NodeKind::DeclFn(fn_data) = &out.ast.get(data.decls[0]).kind else { panic!("expected decl_fn") };
        let NodeKind::Block(block) = &out.ast.get(fn_data.body.unwrap()).kind else { panic!("expected block") };
        assert!(matches!(out.ast.get(block.statements[0]).kind, NodeKind::IfStatement(_)));
    }
}
