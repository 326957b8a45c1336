//! The single error type threaded through every fallible entry point.
//!
//! Mirrors the teacher's `CodeGenError` shape: a handful of located,
//! `String`-carrying variants plus `From` impls for the handful of
//! standard-library error types the pipeline actually produces, so `?`
//! works end to end without an intermediate `map_err`.

use std::fmt;

#[derive(Debug)]
pub enum CompileError {
    /// A byte sequence the tokenizer could not classify.
    Lexical { message: String, line: usize, column: usize, line_text: String },
    /// An `expect*` parser rule hit an unexpected token.
    Syntax { message: String, line: usize, column: usize, line_text: String },
    /// A construct the resolver/lowering pass does not support.
    Semantic(String),
    Io(std::io::Error),
    Fmt(fmt::Error),
}

impl CompileError {
    pub fn semantic(message: impl Into<String>) -> Self {
        CompileError::Semantic(message.into())
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lexical { message, line, column, line_text } => {
                write_located(f, "lexical error", message, *line, *column, line_text)
            }
            CompileError::Syntax { message, line, column, line_text } => {
                write_located(f, "syntax error", message, *line, *column, line_text)
            }
            CompileError::Semantic(message) => write!(f, "semantic error: {message}"),
            CompileError::Io(e) => write!(f, "io error: {e}"),
            CompileError::Fmt(e) => write!(f, "format error: {e}"),
        }
    }
}

fn write_located(
    f: &mut fmt::Formatter<'_>,
    kind: &str,
    message: &str,
    line: usize,
    column: usize,
    line_text: &str,
) -> fmt::Result {
    writeln!(f, "{kind}: {message}")?;
    writeln!(f, "  --> line {}, column {}", line + 1, column + 1)?;
    writeln!(f, "  | {line_text}")?;
    write!(f, "  | {}^", " ".repeat(column))
}

impl std::error::Error for CompileError {}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Io(e)
    }
}

impl From<fmt::Error> for CompileError {
    fn from(e: fmt::Error) -> Self {
        CompileError::Fmt(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn located_error_renders_caret_under_column() {
        let err = CompileError::Syntax {
            message: "expected ')'".to_string(),
            line: 2,
            column: 4,
            line_text: "    fn f(".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("line 3, column 5"));
        assert!(rendered.ends_with('^'));
    }

    #[test]
    fn io_error_converts_via_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CompileError = io_err.into();
        assert!(matches!(err, CompileError::Io(_)));
    }
}
