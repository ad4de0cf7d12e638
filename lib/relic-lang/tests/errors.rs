//! Integration tests: error kinds and diagnostics
//!
//! These tests verify that the compiler produces the *right kind* of error
//! with meaningful messages, and that resolution keeps going after the
//! first failure instead of hiding everything behind it.

use relic_lang::compiler::{Compiler, CompilerInput};
use relic_lang::context::Interner;
use relic_lang::error::{CompileError, CompileErrorKind, ErrorSuggestion};
use relic_lang::runtime::Evaluator;

fn compile(src: &str) -> (Vec<CompileError>, Interner) {
    let result = Compiler::new().compile(CompilerInput::Source(src.to_string()));
    (result.errors, result.interner)
}

/// Extract the first error from a compilation failure.
fn first_error(src: &str) -> (CompileError, Interner) {
    let (mut errors, interner) = compile(src);
    if errors.is_empty() {
        panic!("expected compilation to fail for:\n{}", src);
    }
    (errors.remove(0), interner)
}

/// Compile cleanly, run `main`, and hand back the runtime failure.
fn run_error(src: &str) -> (CompileError, Interner) {
    let result = Compiler::new().compile(CompilerInput::Source(src.to_string()));
    assert!(result.is_ok(), "expected a clean compile: {:?}", result.errors);
    let program = result.program.unwrap();
    let error = match Evaluator::new(&program, &result.interner).run_main() {
        Ok(code) => panic!("expected a runtime failure, main returned {}", code),
        Err(error) => error,
    };
    (error, result.interner)
}

// -------------------------------------------------------------------
// Syntax errors
// -------------------------------------------------------------------

#[test]
fn unclosed_brace_is_a_syntax_error() {
    let (err, _) = first_error("int main() { return 0;");
    assert!(
        matches!(err.kind, CompileErrorKind::Parse(_)),
        "expected Parse error, got {:?}",
        err.kind
    );
}

#[test]
fn file_scope_initializers_are_syntax_errors() {
    let (err, _) = first_error("int x = 1;");
    assert!(
        matches!(err.kind, CompileErrorKind::Parse(_)),
        "expected Parse error, got {:?}",
        err.kind
    );
}

// -------------------------------------------------------------------
// Tag errors
// -------------------------------------------------------------------

#[test]
fn unknown_tag_names_the_missing_struct() {
    let (err, interner) = first_error(
        r#"
        int main() {
            struct missing m;
            return 0;
        }
    "#,
    );
    match err.kind {
        CompileErrorKind::UnknownTag { tag } => {
            assert_eq!(interner.resolve(tag), "missing");
        }
        other => panic!("expected UnknownTag, got {:?}", other),
    }
}

#[test]
fn unknown_tag_suggests_a_close_spelling() {
    let (err, _) = first_error(
        r#"
        struct point { int x; int y; };

        int main() {
            struct pont p;
            return 0;
        }
    "#,
    );
    assert!(matches!(err.kind, CompileErrorKind::UnknownTag { .. }));
    assert!(
        matches!(
            &err.suggestions[..],
            [ErrorSuggestion::DidYouMean { suggestion, .. }] if suggestion == "point"
        ),
        "expected a did-you-mean note, got {:?}",
        err.suggestions
    );
}

#[test]
fn a_tag_is_not_visible_outside_its_scope() {
    let (err, interner) = first_error(
        r#"
        int define_it() {
            struct hidden { int x; };
            return 0;
        }

        int main() {
            struct hidden h;
            return 0;
        }
    "#,
    );
    match err.kind {
        CompileErrorKind::UnknownTag { tag } => {
            assert_eq!(interner.resolve(tag), "hidden");
        }
        other => panic!("expected UnknownTag, got {:?}", other),
    }
}

// -------------------------------------------------------------------
// Incomplete types
// -------------------------------------------------------------------

#[test]
fn declaring_a_variable_of_an_incomplete_type_fails() {
    let (err, _) = first_error(
        r#"
        int main() {
            struct node;
            struct node n;
            return 0;
        }
    "#,
    );
    assert!(
        matches!(err.kind, CompileErrorKind::IncompleteType { tag: Some(_) }),
        "expected IncompleteType, got {:?}",
        err.kind
    );
}

#[test]
fn incomplete_declarations_still_bind_the_name() {
    // `n` stays usable, so the follow-up error is about the type being
    // incomplete, not about an undefined variable.
    let (errors, _) = compile(
        r#"
        int main() {
            struct node;
            struct node n;
            n.value = 1;
            return 0;
        }
    "#,
    );
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| matches!(e.kind, CompileErrorKind::IncompleteType { .. })));
}

#[test]
fn incomplete_member_types_poison_the_aggregate() {
    let (errors, _) = compile(
        r#"
        int main() {
            struct fwd;
            struct holder { struct fwd inner; };
            struct holder h;
            return 0;
        }
    "#,
    );
    // Laying out `holder` fails, and the declaration of `h` then sees an
    // incomplete type.
    assert!(errors.len() >= 2);
    assert!(errors
        .iter()
        .all(|e| matches!(e.kind, CompileErrorKind::IncompleteType { .. })));
}

// -------------------------------------------------------------------
// Member errors
// -------------------------------------------------------------------

#[test]
fn unknown_member_names_member_and_struct() {
    let (err, interner) = first_error(
        r#"
        struct point { int x; int y; };

        int main() {
            struct point p;
            return p.z;
        }
    "#,
    );
    match err.kind {
        CompileErrorKind::UnknownMember { member, tag } => {
            assert_eq!(interner.resolve(member), "z");
            assert_eq!(tag.map(|t| interner.resolve(t)), Some("point"));
        }
        other => panic!("expected UnknownMember, got {:?}", other),
    }
}

#[test]
fn member_typos_get_a_suggestion() {
    let (err, _) = first_error(
        r#"
        struct box { int width; int height; };

        int main() {
            struct box b;
            return b.heigth;
        }
    "#,
    );
    assert!(matches!(err.kind, CompileErrorKind::UnknownMember { .. }));
    assert!(
        matches!(
            &err.suggestions[..],
            [ErrorSuggestion::DidYouMean { suggestion, .. }] if suggestion == "height"
        ),
        "expected a did-you-mean note, got {:?}",
        err.suggestions
    );
}

#[test]
fn member_access_on_a_scalar_is_rejected() {
    let (err, _) = first_error(
        r#"
        int main() {
            int x;
            return x.field;
        }
    "#,
    );
    assert!(matches!(err.kind, CompileErrorKind::NotAnAggregate));
}

#[test]
fn duplicate_members_are_reported_and_skipped() {
    // The rest of the list survives, so the only error is the duplicate.
    let (errors, interner) = compile(
        r#"
        struct twice { int a; int a; int b; };

        int main() {
            struct twice t;
            t.b = 5;
            return t.b;
        }
    "#,
    );
    assert_eq!(errors.len(), 1);
    match errors[0].kind {
        CompileErrorKind::DuplicateMember { member, .. } => {
            assert_eq!(interner.resolve(member), "a");
        }
        ref other => panic!("expected DuplicateMember, got {:?}", other),
    }
}

// -------------------------------------------------------------------
// Redefinitions
// -------------------------------------------------------------------

#[test]
fn nesting_a_tag_inside_its_own_definition_is_a_redefinition() {
    let (err, _) = first_error(
        r#"
        int main() {
            struct s { struct s { int x; } inner; };
            return 0;
        }
    "#,
    );
    assert!(
        matches!(err.kind, CompileErrorKind::Redefinition { tag: Some(_) }),
        "expected Redefinition, got {:?}",
        err.kind
    );
}

#[test]
fn redeclaring_a_variable_in_one_scope_fails() {
    let (err, interner) = first_error(
        r#"
        int main() {
            int x;
            char x;
            return 0;
        }
    "#,
    );
    match err.kind {
        CompileErrorKind::AlreadyDefined(name) => {
            assert_eq!(interner.resolve(name), "x");
        }
        other => panic!("expected AlreadyDefined, got {:?}", other),
    }
}

#[test]
fn duplicate_function_names_fail() {
    let (err, _) = first_error(
        r#"
        int twice() { return 1; }
        int twice() { return 2; }

        int main() { return twice(); }
    "#,
    );
    assert!(matches!(err.kind, CompileErrorKind::AlreadyDefined(_)));
}

#[test]
fn duplicate_parameter_names_fail() {
    let (err, _) = first_error(
        r#"
        int f(int a, int a) { return a; }

        int main() { return f(1, 2); }
    "#,
    );
    assert!(matches!(err.kind, CompileErrorKind::AlreadyDefined(_)));
}

// -------------------------------------------------------------------
// Undefined names
// -------------------------------------------------------------------

#[test]
fn undefined_variables_suggest_close_names() {
    let (err, interner) = first_error(
        r#"
        int main() {
            int count;
            count = 1;
            return counte;
        }
    "#,
    );
    match err.kind {
        CompileErrorKind::UndefinedVariable { name } => {
            assert_eq!(interner.resolve(name), "counte");
        }
        ref other => panic!("expected UndefinedVariable, got {:?}", other),
    }
    assert!(
        matches!(
            &err.suggestions[..],
            [ErrorSuggestion::DidYouMean { suggestion, .. }] if suggestion == "count"
        ),
        "expected a did-you-mean note, got {:?}",
        err.suggestions
    );
}

#[test]
fn undefined_functions_suggest_close_names() {
    let (err, interner) = first_error(
        r#"
        int helper(int x) { return x; }

        int main() {
            return helpr(1);
        }
    "#,
    );
    match err.kind {
        CompileErrorKind::UndefinedFunction { name } => {
            assert_eq!(interner.resolve(name), "helpr");
        }
        ref other => panic!("expected UndefinedFunction, got {:?}", other),
    }
    assert!(!err.suggestions.is_empty());
}

// -------------------------------------------------------------------
// Type and arity mismatches
// -------------------------------------------------------------------

#[test]
fn wrong_argument_counts_are_reported() {
    let (err, _) = first_error(
        r#"
        int add(int a, int b) { return a + b; }

        int main() {
            return add(1);
        }
    "#,
    );
    match err.kind {
        CompileErrorKind::ArityMismatch { expected, actual } => {
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
        }
        ref other => panic!("expected ArityMismatch, got {:?}", other),
    }
}

#[test]
fn structs_are_not_arithmetic_operands() {
    let (err, _) = first_error(
        r#"
        struct s { int a; };

        int main() {
            struct s x;
            struct s y;
            return x + y;
        }
    "#,
    );
    assert!(matches!(err.kind, CompileErrorKind::TypeMismatch));
    assert_eq!(
        err.context.as_deref(),
        Some("operand of '+' must be a scalar, found struct s")
    );
}

#[test]
fn struct_assignment_requires_the_same_declaration() {
    let (err, _) = first_error(
        r#"
        int main() {
            struct a { int v; } x;
            struct b { int v; } y;
            x = y;
            return 0;
        }
    "#,
    );
    assert!(matches!(err.kind, CompileErrorKind::TypeMismatch));
    assert_eq!(
        err.context.as_deref(),
        Some("cannot assign struct b to struct a")
    );
}

#[test]
fn same_tag_in_different_scopes_is_a_different_type() {
    let (err, _) = first_error(
        r#"
        struct s { int a; };
        struct s g;

        int main() {
            struct s { int a; };
            struct s l;
            l = g;
            return 0;
        }
    "#,
    );
    assert!(matches!(err.kind, CompileErrorKind::TypeMismatch));
}

#[test]
fn assigning_to_a_non_lvalue_fails() {
    let (err, _) = first_error(
        r#"
        int main() {
            int x;
            1 = x;
            return 0;
        }
    "#,
    );
    assert_eq!(
        err.context.as_deref(),
        Some("left side of assignment is not assignable")
    );
}

#[test]
fn struct_assignment_needs_a_place_on_the_right() {
    let (err, _) = first_error(
        r#"
        struct s { int a; };

        int main() {
            struct s x;
            struct s y;
            struct s z;
            x = (y = z);
            return 0;
        }
    "#,
    );
    assert_eq!(
        err.context.as_deref(),
        Some("struct assignment needs a variable or member on the right")
    );
}

#[test]
fn conditions_must_be_scalars() {
    let (err, _) = first_error(
        r#"
        struct s { int a; };

        int main() {
            struct s x;
            if (x) return 1;
            return 0;
        }
    "#,
    );
    assert_eq!(
        err.context.as_deref(),
        Some("condition must be a scalar, found struct s")
    );
}

#[test]
fn struct_arguments_are_rejected() {
    let (err, _) = first_error(
        r#"
        struct s { int a; };

        int scan(int x) { return x; }

        int main() {
            struct s v;
            return scan(v);
        }
    "#,
    );
    assert_eq!(
        err.context.as_deref(),
        Some("argument must be a scalar, found struct s")
    );
}

#[test]
fn returning_a_struct_is_rejected() {
    let (err, _) = first_error(
        r#"
        struct s { int a; };

        int main() {
            struct s v;
            return v;
        }
    "#,
    );
    assert_eq!(
        err.context.as_deref(),
        Some("return value must be a scalar, found struct s")
    );
}

#[test]
fn struct_initializers_are_rejected() {
    let (err, _) = first_error(
        r#"
        int main() {
            struct s { int a; } x = 1;
            return 0;
        }
    "#,
    );
    assert!(matches!(err.kind, CompileErrorKind::TypeMismatch));
    assert_eq!(
        err.context.as_deref(),
        Some("cannot initialize struct s from an expression")
    );
}

// -------------------------------------------------------------------
// Multiple errors collected
// -------------------------------------------------------------------

#[test]
fn errors_accumulate_across_functions() {
    let (errors, _) = compile(
        r#"
        int first() { return nope; }
        int second() { return alsono; }

        int main() { return 0; }
    "#,
    );
    assert!(
        errors.len() >= 2,
        "expected at least 2 errors, got {}",
        errors.len()
    );
}

// -------------------------------------------------------------------
// Runtime failures
// -------------------------------------------------------------------

#[test]
fn division_by_zero_fails_at_runtime() {
    let (err, interner) = run_error(
        r#"
        int main() {
            int zero;
            zero = 0;
            return 7 / zero;
        }
    "#,
    );
    assert!(matches!(err.kind, CompileErrorKind::Runtime(_)));
    assert!(err.message(&interner).contains("division by zero"));
}

#[test]
fn remainder_by_zero_fails_at_runtime() {
    let (err, interner) = run_error(
        r#"
        int main() {
            int zero;
            zero = 0;
            return 7 % zero;
        }
    "#,
    );
    assert!(err.message(&interner).contains("remainder by zero"));
}

#[test]
fn runaway_recursion_hits_the_call_depth_limit() {
    let (err, interner) = run_error(
        r#"
        int main() {
            return main();
        }
    "#,
    );
    assert!(err.message(&interner).contains("call depth"));
}

#[test]
fn a_missing_main_function_is_reported() {
    let (err, interner) = run_error("int helper() { return 1; }");
    assert!(err.message(&interner).contains("no 'main' function"));
}

#[test]
fn main_must_not_take_parameters() {
    let (err, interner) = run_error("int main(int argc) { return argc; }");
    assert!(err.message(&interner).contains("must not take parameters"));
}
