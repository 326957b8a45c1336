//! Compiler configuration: CLI flags plus optional `compiler.toml` defaults.
//!
//! Mirrors the teacher's `LintConfig::from_toml`/merge pair: a serde struct
//! parsed straight out of a TOML string, with an explicit merge step so one
//! side (here, the command line) wins over the other (the file).

use std::path::PathBuf;

use serde::Deserialize;

use crate::diagnostics::CompileError;

/// Project-level defaults, loaded from a `compiler.toml` pointed to by
/// `-config`. Every field is optional: an absent field simply leaves
/// whatever the CLI (or built-in default) already provided untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub output: Option<PathBuf>,
    pub lib_dir: Option<PathBuf>,
    pub report: Option<bool>,
    pub no_emit_bin: Option<bool>,
}

impl FileConfig {
    pub fn from_toml(text: &str) -> Result<Self, CompileError> {
        toml::from_str(text)
            .map_err(|e| CompileError::semantic(format!("failed to parse compiler.toml: {e}")))
    }
}

/// Fully resolved configuration driving one compilation (spec §6). Built by
/// starting from defaults, merging in a `FileConfig` if `-config` was given,
/// then overwriting with whatever was passed explicitly on the command line.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Path to the generated `.c` file. Defaults to the source stem with a
    /// `.c` extension.
    pub output: PathBuf,
    /// Directory holding `prelude.h`, used instead of the stdlib include set
    /// when `-lib` is given.
    pub lib_dir: Option<PathBuf>,
    /// Print a one-line summary of the compile after emission.
    pub report: bool,
    /// Stop after writing the `.c` file; skip invoking a C compiler.
    pub no_emit_bin: bool,
}

impl CompilerConfig {
    pub fn new(default_output: PathBuf) -> Self {
        CompilerConfig {
            output: default_output,
            lib_dir: None,
            report: false,
            no_emit_bin: false,
        }
    }

    /// Apply a loaded `compiler.toml`'s values, but only where this config
    /// still holds a default. CLI flags are applied after this call and
    /// always win (spec §6: "CLI flags always override file-provided
    /// defaults").
    pub fn merge_file_defaults(&mut self, file: FileConfig) {
        if let Some(output) = file.output {
            self.output = output;
        }
        if let Some(lib_dir) = file.lib_dir {
            self.lib_dir = Some(lib_dir);
        }
        if let Some(report) = file.report {
            self.report = report;
        }
        if let Some(no_emit_bin) = file.no_emit_bin {
            self.no_emit_bin = no_emit_bin;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_parses_partial_toml() {
        let cfg = FileConfig::from_toml(r#"report = true"#).unwrap();
        assert_eq!(cfg.report, Some(true));
        assert!(cfg.output.is_none());
    }

    #[test]
    fn merge_only_overwrites_fields_the_file_sets() {
        let mut cfg = CompilerConfig::new(PathBuf::from("out.c"));
        cfg.merge_file_defaults(FileConfig {
            output: None,
            lib_dir: Some(PathBuf::from("/opt/sub/lib")),
            report: None,
            no_emit_bin: None,
        });
        assert_eq!(cfg.output, PathBuf::from("out.c"));
        assert_eq!(cfg.lib_dir, Some(PathBuf::from("/opt/sub/lib")));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = FileConfig::from_toml("not = [valid").unwrap_err();
        assert!(matches!(err, CompileError::Semantic(_)));
    }
}
