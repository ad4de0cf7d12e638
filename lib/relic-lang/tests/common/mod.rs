use relic_lang::context::Interner;
use relic_lang::error::CompileErrors;
use relic_lang::passes::parse::Parser;
use relic_lang::passes::resolve::{DeclResolver, ResolvedProgram};
use relic_lang::runtime::Evaluator;

/// Full pipeline: parse and resolve one source. The interner comes back with
/// the program so tests can turn symbols back into names.
pub fn compile(src: &str) -> Result<(ResolvedProgram, Interner), CompileErrors> {
    let mut interner = Interner::default();
    let ast = Parser::parse(src, 0, &mut interner)?;
    let program = DeclResolver::new(ast, &interner).resolve()?;
    Ok((program, interner))
}

/// Compiles and runs `main`, panicking on any failure.
pub fn run(src: &str) -> i64 {
    let (program, interner) = match compile(src) {
        Ok(compiled) => compiled,
        Err(errors) => panic!("expected a clean compile, got {:#?}", errors.0),
    };
    match Evaluator::new(&program, &interner).run_main() {
        Ok(code) => code,
        Err(error) => panic!("runtime failure: {}", error.message(&interner)),
    }
}
