use std::cell::RefCell;
use std::rc::Rc;

use chumsky::input::Stream;
use chumsky::prelude::*;
use chumsky::Parser as ChumskyParser;
use logos::Logos;

use crate::ast::{Ast, Loc};
use crate::context::Interner;
use crate::error::{CompileError, CompileErrorKind, CompileErrors};
use crate::parser::grammar::{parse_unit, AstCtx};
use crate::parser::lexer::Token;

pub struct Parser;

impl Parser {
    /// Lexes and parses one translation unit. The interner is borrowed from
    /// the caller so symbols stay valid across the later passes.
    pub fn parse(src: &str, source: usize, interner: &mut Interner) -> Result<Ast, CompileErrors> {
        let ast = Rc::new(RefCell::new(Ast::default()));
        let shared = Rc::new(RefCell::new(std::mem::take(interner)));

        let ctx = AstCtx {
            ast: ast.clone(),
            interner: shared.clone(),
        };

        // Lexer failures surface as Token::Error so the parser can report
        // them at a real location instead of the lexer bailing out early.
        let tokens = Token::lexer(src).spanned().map(|(token, span)| {
            let token = token.unwrap_or(Token::Error);
            (token, Loc { source, span })
        });

        let eoi = Loc {
            source,
            span: src.len()..src.len(),
        };
        let stream = Stream::from_iter(tokens).map(eoi, |(token, loc): (_, _)| (token, loc));

        let result = parse_unit(&ctx).parse(stream).into_result();

        // Hand the interner back whether or not parsing succeeded; errors
        // still need it to render symbol names.
        *interner = std::mem::take(&mut *shared.borrow_mut());

        match result {
            Ok(items) => {
                let mut ast = ast.borrow_mut();
                ast.items = items;
                Ok(std::mem::take(&mut *ast))
            }
            Err(errors) => Err(CompileErrors(
                errors
                    .into_iter()
                    .map(|err| {
                        CompileError::new(
                            CompileErrorKind::Parse(err.reason().to_string()),
                            err.span().clone(),
                        )
                    })
                    .collect(),
            )),
        }
    }
}
