use relic_lang::compiler::{Compiler, CompilerInput};
use relic_lang::runtime::Evaluator;

pub fn main() {
    let src = r#"
        struct point { int x; int y; };

        int manhattan() {
            struct point p;
            p.x = 40;
            p.y = 2;
            return p.x + p.y;
        }

        int main() {
            return manhattan();
        }
    "#;

    let result = Compiler::new().compile(CompilerInput::Source(src.to_string()));

    let program = match result.program {
        Some(program) => program,
        None => {
            for error in &result.errors {
                eprintln!("✗ {}", error.message(&result.interner));
            }
            return;
        }
    };

    match Evaluator::new(&program, &result.interner).run_main() {
        Ok(code) => println!("✓ main returned {code}"),
        Err(e) => eprintln!("✗ runtime failure: {}", e.message(&result.interner)),
    }
}
