//! Hand-rolled DFA tokenizer.
//!
//! `Lexer::next` advances one token at a time and never buffers lookahead
//! beyond the single byte needed to decide between adjacent operator
//! spellings (`<` vs `<<` vs `<<|` vs `<<|=`, etc). Invalid input produces
//! `token_invalid` rather than aborting — the parser decides what to do
//! with it, per the tokenizer's failure semantics.

use crate::token::{keyword_lookup, Token, TokenKind};

pub struct Lexer<'src> {
    src: &'src [u8],
    pos: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        let bytes = src.as_bytes();
        let pos = if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            3
        } else {
            0
        };
        Lexer { src: bytes, pos }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    /// Collect every token up front; used by `-tokens` dumps and tests.
    /// Streaming consumers should prefer repeated calls to `next`.
    pub fn tokenize_all(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next();
            let eof = tok.kind.is_eof();
            out.push(tok);
            if eof {
                break;
            }
        }
        out
    }

    pub fn next(&mut self) -> Token {
        self.skip_trivia();
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Token::new(TokenKind::token_eof, start as u32, start as u32);
        };

        let kind = match c {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_identifier_or_keyword(),
            b'0'..=b'9' => self.lex_number(),
            b'@' => self.lex_builtin_or_raw_identifier(),
            b'"' => self.lex_string_literal(),
            b'\'' => self.lex_char_literal(),
            b'\\' => self.lex_multiline_string_line(),
            _ => self.lex_operator(),
        };
        Token::new(kind, start as u32, self.pos as u32)
    }

    /// Skip whitespace and `//` line comments (not `///`/`//!`, which are
    /// significant tokens). Doc comments are left for `next` to lex.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.pos += 1;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    if matches!(self.peek_at(2), Some(b'/') | Some(b'!')) {
                        return;
                    }
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.pos += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn lex_identifier_or_keyword(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.peek(), Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap();
        keyword_lookup(text).unwrap_or(TokenKind::token_identifier)
    }

    /// `@name` builtins, or `@"raw identifier"`.
    fn lex_builtin_or_raw_identifier(&mut self) -> TokenKind {
        self.pos += 1; // consume '@'
        if self.peek() == Some(b'"') {
            return self.lex_string_literal_body(TokenKind::token_identifier);
        }
        if !matches!(self.peek(), Some(b'a'..=b'z' | b'A'..=b'Z' | b'_')) {
            return TokenKind::token_invalid;
        }
        while matches!(self.peek(), Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')) {
            self.pos += 1;
        }
        TokenKind::token_builtin
    }

    fn lex_string_literal(&mut self) -> TokenKind {
        self.lex_string_literal_body(TokenKind::token_string_literal)
    }

    fn lex_string_literal_body(&mut self, ok_kind: TokenKind) -> TokenKind {
        debug_assert_eq!(self.peek(), Some(b'"'));
        self.pos += 1;
        loop {
            match self.bump() {
                None | Some(b'\n') => return TokenKind::token_invalid,
                Some(b'"') => return ok_kind,
                Some(b'\\') => {
                    if self.bump().is_none() {
                        return TokenKind::token_invalid;
                    }
                }
                _ => {}
            }
        }
    }

    fn lex_char_literal(&mut self) -> TokenKind {
        self.pos += 1;
        loop {
            match self.bump() {
                None | Some(b'\n') => return TokenKind::token_invalid,
                Some(b'\'') => return TokenKind::token_char_literal,
                Some(b'\\') => {
                    if self.bump().is_none() {
                        return TokenKind::token_invalid;
                    }
                }
                _ => {}
            }
        }
    }

    /// A `\\...` continuation line of a multiline string literal, up to
    /// (not including) the newline.
    fn lex_multiline_string_line(&mut self) -> TokenKind {
        self.pos += 1;
        if self.peek() != Some(b'\\') {
            return TokenKind::token_invalid;
        }
        self.pos += 1;
        while !matches!(self.peek(), None | Some(b'\n')) {
            self.pos += 1;
        }
        TokenKind::token_multiline_string_literal_line
    }

    fn lex_number(&mut self) -> TokenKind {
        let radix_prefix = if self.peek() == Some(b'0') {
            match self.peek_at(1) {
                Some(b'x') | Some(b'X') => {
                    self.pos += 2;
                    true
                }
                Some(b'o') | Some(b'O') => {
                    self.pos += 2;
                    true
                }
                Some(b'b') | Some(b'B') => {
                    self.pos += 2;
                    true
                }
                _ => false,
            }
        } else {
            false
        };

        let is_digit_like =
            |b: u8| b.is_ascii_alphanumeric() || b == b'_';
        while matches!(self.peek(), Some(b) if is_digit_like(b)) {
            self.pos += 1;
        }

        if !radix_prefix && self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9'))
        {
            self.pos += 1;
            while matches!(self.peek(), Some(b) if is_digit_like(b)) {
                self.pos += 1;
            }
        }

        if matches!(self.peek(), Some(b'e' | b'E' | b'p' | b'P')) {
            let save = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if matches!(self.peek(), Some(b'0'..=b'9')) {
                while matches!(self.peek(), Some(b) if is_digit_like(b)) {
                    self.pos += 1;
                }
            } else {
                self.pos = save;
            }
        }

        TokenKind::token_number_literal
    }

    /// The operator lattice: longest legal match wins. Each arm checks its
    /// longest spelling first and falls through to shorter prefixes.
    fn lex_operator(&mut self) -> TokenKind {
        let c = self.bump().expect("lex_operator called at eof");
        match c {
            b'!' => self.maybe_eq(TokenKind::token_bang, TokenKind::token_bang_equal),
            b'|' => {
                if self.peek() == Some(b'|') {
                    self.pos += 1;
                    TokenKind::token_pipe_pipe
                } else {
                    self.maybe_eq(TokenKind::token_pipe, TokenKind::token_pipe_equal)
                }
            }
            b'=' => {
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                    TokenKind::token_equal_equal
                } else if self.peek() == Some(b'>') {
                    self.pos += 1;
                    TokenKind::token_equal_angle_bracket_right
                } else {
                    TokenKind::token_equal
                }
            }
            b'(' => TokenKind::token_l_paren,
            b')' => TokenKind::token_r_paren,
            b';' => TokenKind::token_semicolon,
            b'%' => self.maybe_eq(TokenKind::token_percent, TokenKind::token_percent_equal),
            b'{' => TokenKind::token_l_brace,
            b'}' => TokenKind::token_r_brace,
            b'[' => TokenKind::token_l_bracket,
            b']' => TokenKind::token_r_bracket,
            b'.' => {
                if self.peek() == Some(b'*') {
                    self.pos += 1;
                    TokenKind::token_period_asterisk
                } else if self.peek() == Some(b'.') {
                    self.pos += 1;
                    if self.peek() == Some(b'.') {
                        self.pos += 1;
                        TokenKind::token_ellipsis3
                    } else {
                        TokenKind::token_ellipsis2
                    }
                } else {
                    TokenKind::token_period
                }
            }
            b'^' => self.maybe_eq(TokenKind::token_caret, TokenKind::token_caret_equal),
            b'+' => {
                if self.peek() == Some(b'+') {
                    self.pos += 1;
                    TokenKind::token_plus_plus
                } else if self.peek() == Some(b'%') {
                    self.pos += 1;
                    self.maybe_eq(TokenKind::token_plus_percent, TokenKind::token_plus_percent_equal)
                } else if self.peek() == Some(b'|') {
                    self.pos += 1;
                    self.maybe_eq(TokenKind::token_plus_pipe, TokenKind::token_plus_pipe_equal)
                } else {
                    self.maybe_eq(TokenKind::token_plus, TokenKind::token_plus_equal)
                }
            }
            b'-' => {
                if self.peek() == Some(b'%') {
                    self.pos += 1;
                    self.maybe_eq(TokenKind::token_minus_percent, TokenKind::token_minus_percent_equal)
                } else if self.peek() == Some(b'|') {
                    self.pos += 1;
                    self.maybe_eq(TokenKind::token_minus_pipe, TokenKind::token_minus_pipe_equal)
                } else if self.peek() == Some(b'>') {
                    self.pos += 1;
                    TokenKind::token_arrow
                } else {
                    self.maybe_eq(TokenKind::token_minus, TokenKind::token_minus_equal)
                }
            }
            b'*' => {
                if self.peek() == Some(b'*') {
                    self.pos += 1;
                    TokenKind::token_asterisk_asterisk
                } else if self.peek() == Some(b'%') {
                    self.pos += 1;
                    self.maybe_eq(TokenKind::token_asterisk_percent, TokenKind::token_asterisk_percent_equal)
                } else if self.peek() == Some(b'|') {
                    self.pos += 1;
                    self.maybe_eq(TokenKind::token_asterisk_pipe, TokenKind::token_asterisk_pipe_equal)
                } else {
                    self.maybe_eq(TokenKind::token_asterisk, TokenKind::token_asterisk_equal)
                }
            }
            b':' => TokenKind::token_colon,
            b'/' => {
                if self.peek() == Some(b'/') {
                    self.pos += 1;
                    if self.peek() == Some(b'!') {
                        self.pos += 1;
                        self.skip_to_eol();
                        TokenKind::token_container_doc_comment
                    } else if self.peek() == Some(b'/') {
                        self.pos += 1;
                        self.skip_to_eol();
                        TokenKind::token_doc_comment
                    } else {
                        self.skip_to_eol();
                        TokenKind::token_doc_comment
                    }
                } else {
                    self.maybe_eq(TokenKind::token_slash, TokenKind::token_slash_equal)
                }
            }
            b',' => TokenKind::token_comma,
            b'&' => self.maybe_eq(TokenKind::token_ampersand, TokenKind::token_ampersand_equal),
            b'?' => TokenKind::token_question_mark,
            b'<' => {
                if self.peek() == Some(b'<') {
                    self.pos += 1;
                    if self.peek() == Some(b'|') {
                        self.pos += 1;
                        self.maybe_eq(
                            TokenKind::token_angle_bracket_angle_bracket_left_pipe,
                            TokenKind::token_angle_bracket_angle_bracket_left_pipe_equal,
                        )
                    } else {
                        self.maybe_eq(
                            TokenKind::token_angle_bracket_angle_bracket_left,
                            TokenKind::token_angle_bracket_angle_bracket_left_equal,
                        )
                    }
                } else {
                    self.maybe_eq(
                        TokenKind::token_angle_bracket_left,
                        TokenKind::token_angle_bracket_left_equal,
                    )
                }
            }
            b'>' => {
                if self.peek() == Some(b'>') {
                    self.pos += 1;
                    self.maybe_eq(
                        TokenKind::token_angle_bracket_angle_bracket_right,
                        TokenKind::token_angle_bracket_angle_bracket_right_equal,
                    )
                } else {
                    self.maybe_eq(
                        TokenKind::token_angle_bracket_right,
                        TokenKind::token_angle_bracket_right_equal,
                    )
                }
            }
            b'~' => TokenKind::token_tilde,
            _ => TokenKind::token_invalid,
        }
    }

    fn maybe_eq(&mut self, plain: TokenKind, with_eq: TokenKind) -> TokenKind {
        if self.peek() == Some(b'=') {
            self.pos += 1;
            with_eq
        } else {
            plain
        }
    }

    fn skip_to_eol(&mut self) {
        while !matches!(self.peek(), None | Some(b'\n')) {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::tokenize_all(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn trivial_function_tokens() {
        let got = kinds("pub fn main() c_int { return 0; }");
        assert_eq!(
            got,
            vec![
                token_keyword_pub,
                token_keyword_fn,
                token_identifier,
                token_l_paren,
                token_r_paren,
                token_identifier,
                token_l_brace,
                token_keyword_return,
                token_number_literal,
                token_semicolon,
                token_r_brace,
                token_eof,
            ]
        );
    }

    #[test]
    fn empty_source_is_single_eof() {
        assert_eq!(kinds(""), vec![token_eof]);
    }

    #[test]
    fn bom_is_skipped() {
        let src = "\u{FEFF}fn";
        let got = kinds(src);
        assert_eq!(got, vec![token_keyword_fn, token_eof]);
    }

    #[test]
    fn underscored_number_is_one_token() {
        let toks = Lexer::tokenize_all("1_000_000");
        assert_eq!(toks[0].kind, token_number_literal);
        assert_eq!(toks[0].start, 0);
        assert_eq!(toks[0].end, 9);
    }

    #[test]
    fn dot_forms_disambiguate() {
        assert_eq!(kinds("."), vec![token_period, token_eof]);
        assert_eq!(kinds(".."), vec![token_ellipsis2, token_eof]);
        assert_eq!(kinds("..."), vec![token_ellipsis3, token_eof]);
    }

    #[test]
    fn longest_operator_match_wins() {
        assert_eq!(kinds("<<|="), vec![token_angle_bracket_angle_bracket_left_pipe_equal, token_eof]);
        assert_eq!(kinds("<<|"), vec![token_angle_bracket_angle_bracket_left_pipe, token_eof]);
        assert_eq!(kinds("<<"), vec![token_angle_bracket_angle_bracket_left, token_eof]);
        assert_eq!(kinds("<"), vec![token_angle_bracket_left, token_eof]);
    }

    #[test]
    fn string_literal_with_nested_slash_slash() {
        let toks = Lexer::tokenize_all(r#""not // a comment""#);
        assert_eq!(toks[0].kind, token_string_literal);
        assert_eq!(toks.len(), 2);
    }

    #[test]
    fn doc_and_container_doc_comments() {
        assert_eq!(kinds("/// hi"), vec![token_doc_comment, token_eof]);
        assert_eq!(kinds("//! hi"), vec![token_container_doc_comment, token_eof]);
        assert_eq!(kinds("// hi\nfn"), vec![token_keyword_fn, token_eof]);
    }

    #[test]
    fn invalid_byte_yields_token_invalid_not_abort() {
        let toks = Lexer::tokenize_all("`");
        assert_eq!(toks[0].kind, token_invalid);
        assert_eq!(toks[1].kind, token_eof);
    }

    #[test]
    fn builtin_and_raw_identifier() {
        assert_eq!(kinds("@import"), vec![token_builtin, token_eof]);
        assert_eq!(kinds(r#"@"weird name""#), vec![token_identifier, token_eof]);
    }

    #[test]
    fn hex_bin_oct_literals() {
        for src in ["0xFF", "0b1010", "0o17"] {
            assert_eq!(kinds(src), vec![token_number_literal, token_eof]);
        }
    }
}
