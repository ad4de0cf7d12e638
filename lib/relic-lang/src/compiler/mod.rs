//! Compiler orchestration module
//!
//! This module coordinates the compilation pipeline:
//! Source -> Parse -> Resolve
//!
//! Parsing builds the AST and interns every identifier it sees. Resolution
//! walks the items in source order, populating the type table and the side
//! tables the evaluator reads. Errors from both phases are collected into a
//! [`CompilationResult`] instead of stopping at the first failure.

use std::path::PathBuf;

use ariadne::Report;

use crate::ast::Loc;
use crate::context::Interner;
use crate::error::{CompileError, CompileErrorKind};
use crate::passes::parse::Parser;
use crate::passes::resolve::{DeclResolver, ResolvedProgram};

/// Result of compilation with access to the interner and source text
///
/// This struct provides both the compilation result (success or errors)
/// and the interner, which is needed for formatting error messages with
/// resolved symbol names. The source text is kept alongside so reports
/// can be rendered against it.
pub struct CompilationResult {
    /// The compiled program (if compilation succeeded)
    pub program: Option<ResolvedProgram>,
    /// Compilation errors (empty if successful)
    pub errors: Vec<CompileError>,
    /// The interner holding every symbol the program mentions
    pub interner: Interner,
    /// The source text the error locations point into
    pub source: String,
}

impl CompilationResult {
    /// Check if compilation was successful
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.program.is_some()
    }

    /// Check if compilation failed
    pub fn is_err(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Build an Ariadne report for every collected error
    pub fn reports(&self) -> Vec<Report<'_, Loc>> {
        self.errors
            .iter()
            .map(|e| e.report(&self.interner))
            .collect()
    }
}

/// Compiler input options
#[derive(Debug, Clone)]
pub enum CompilerInput {
    /// Compile a single file as the whole program
    File(PathBuf),
    /// Compile an in-memory source string
    Source(String),
}

pub struct Compiler {
    /// The source ID for error reporting
    source_id: usize,
}

impl Compiler {
    pub fn new() -> Self {
        Self { source_id: 0 }
    }

    /// Compile input through the full pipeline
    ///
    /// Pipeline: Parse → Resolve
    pub fn compile(&self, input: CompilerInput) -> CompilationResult {
        let src = match input {
            CompilerInput::File(path) => match std::fs::read_to_string(&path) {
                Ok(src) => src,
                Err(e) => {
                    let error = CompileError::new(
                        CompileErrorKind::Runtime(format!(
                            "failed to read '{}': {}",
                            path.display(),
                            e
                        )),
                        Loc::generated(),
                    );
                    return CompilationResult {
                        program: None,
                        errors: vec![error],
                        interner: Interner::default(),
                        source: String::new(),
                    };
                }
            },
            CompilerInput::Source(src) => src,
        };

        self.compile_source(src)
    }

    fn compile_source(&self, src: String) -> CompilationResult {
        let mut interner = Interner::default();

        // Phase 1: Parse source → AST
        let ast = match Parser::parse(&src, self.source_id, &mut interner) {
            Ok(ast) => ast,
            Err(errors) => {
                return CompilationResult {
                    program: None,
                    errors: errors.0,
                    interner,
                    source: src,
                };
            }
        };
        tracing::debug!(items = ast.items.len(), "parsing finished");

        // Phase 2: Resolve declarations, lay out aggregates, bind every use
        match DeclResolver::new(ast, &interner).resolve() {
            Ok(program) => CompilationResult {
                program: Some(program),
                errors: Vec::new(),
                interner,
                source: src,
            },
            Err(errors) => CompilationResult {
                program: None,
                errors: errors.0,
                interner,
                source: src,
            },
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn compiles_a_file_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fixture.c");
        fs::write(&path, "int main() { return 6; }").unwrap();

        let result = Compiler::new().compile(CompilerInput::File(path));
        assert!(result.is_ok(), "expected a clean compile: {:?}", result.errors);
    }

    #[test]
    fn missing_file_is_an_error_not_a_panic() {
        let result =
            Compiler::new().compile(CompilerInput::File(PathBuf::from("/no/such/file.c")));

        assert!(result.is_err());
        assert!(result.program.is_none());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn source_strings_compile_without_touching_disk() {
        let src = r#"
            struct point { int x; int y; };

            int main() {
                struct point p;
                p.x = 4;
                return p.x;
            }
        "#;

        let result = Compiler::new().compile(CompilerInput::Source(src.to_string()));
        assert!(result.is_ok(), "{:?}", result.errors);

        let program = result.program.unwrap();
        assert_eq!(program.types.len(), 1);
    }

    #[test]
    fn resolution_keeps_going_after_the_first_error() {
        let src = "int main() { return a + b; }";

        let result = Compiler::new().compile(CompilerInput::Source(src.to_string()));
        assert!(result.is_err());
        assert_eq!(result.errors.len(), 2);
    }
}
