use std::cell::RefCell;
use std::rc::Rc;

use chumsky::input::ValueInput;
use chumsky::pratt::postfix;
use chumsky::prelude::*;

use crate::ast::{
    Ast, BinOp, Declaration, Declarator, Expr, ExprId, ExprKind, FuncItem, Item, Loc, MemberDecl,
    ParamDecl, Stmt, StmtId, StmtKind, StructSpec, TypeSpec,
};
use crate::context::{Interner, Symbol};
use crate::parser::lexer::Token;
use crate::types::ScalarType;

type ParserError<'a> = extra::Err<Rich<'a, Token<'a>, Loc>>;

/// Shared allocation context for the parsers. Nodes go straight into the
/// arenas as they are recognized; the parsers themselves only hand back ids.
#[derive(Clone)]
pub struct AstCtx {
    pub ast: Rc<RefCell<Ast>>,
    pub interner: Rc<RefCell<Interner>>,
}

impl AstCtx {
    pub fn intern(&self, s: &str) -> Symbol {
        self.interner.borrow_mut().intern(s)
    }

    pub fn alloc_stmt(&self, kind: StmtKind, loc: Loc) -> StmtId {
        self.ast.borrow_mut().stmts.alloc(Stmt { kind, loc })
    }

    pub fn alloc_expr(&self, kind: ExprKind, loc: Loc) -> ExprId {
        self.ast.borrow_mut().exprs.alloc(Expr { kind, loc })
    }
}

fn parse_ident<'a, I>(ctx: &'a AstCtx) -> impl Parser<'a, I, Symbol, ParserError<'a>> + Clone
where
    I: ValueInput<'a, Token = Token<'a>, Span = Loc>,
{
    select! { Token::Identifier(ident) => ctx.intern(ident) }
}

fn parse_scalar_type<'a, I>() -> impl Parser<'a, I, ScalarType, ParserError<'a>> + Clone
where
    I: ValueInput<'a, Token = Token<'a>, Span = Loc>,
{
    select! {
        Token::Char => ScalarType::Char,
        Token::Short => ScalarType::Short,
        Token::Int => ScalarType::Int,
        Token::Long => ScalarType::Long,
    }
}

/// Type specifier: a scalar keyword or a `struct` specifier. A specifier
/// carries everything to the left of the declarators, so `struct s { ... }`
/// and a bare `struct s` both land here; nested member definitions recurse.
fn parse_type_spec<'a, I>(ctx: &'a AstCtx) -> impl Parser<'a, I, TypeSpec, ParserError<'a>> + Clone
where
    I: ValueInput<'a, Token = Token<'a>, Span = Loc>,
{
    recursive(|type_spec| {
        let member_name = parse_ident(ctx).map_with(|name, e| (name, e.span()));

        let member_decl = type_spec
            .then(
                member_name
                    .separated_by(just(Token::Comma))
                    .at_least(1)
                    .collect::<Vec<_>>(),
            )
            .then_ignore(just(Token::Semi))
            .map_with(|(spec, names), e| MemberDecl {
                spec,
                names,
                loc: e.span(),
            });

        let member_list = member_decl
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace));

        // `struct s`, `struct s { ... }`, or anonymous `struct { ... }`.
        let tagged = parse_ident(ctx)
            .then(member_list.clone().or_not())
            .map(|(tag, members)| (Some(tag), members));
        let anonymous = member_list.map(|members| (None, Some(members)));

        let struct_spec = just(Token::Struct)
            .ignore_then(tagged.or(anonymous))
            .map_with(|(tag, members), e| {
                TypeSpec::Struct(StructSpec {
                    tag,
                    members,
                    loc: e.span(),
                })
            });

        parse_scalar_type().map(TypeSpec::Scalar).or(struct_spec)
    })
}

/// `spec declarator, ...;` with optional `= expr` initializers. Initializers
/// are a block scope construct, so item level callers pass `allow_init:
/// false` and `int x = 1;` at file scope fails to parse.
fn parse_declaration<'a, I>(
    ctx: &'a AstCtx,
    allow_init: bool,
) -> impl Parser<'a, I, Declaration, ParserError<'a>> + Clone
where
    I: ValueInput<'a, Token = Token<'a>, Span = Loc>,
{
    let init = if allow_init {
        just(Token::Eq)
            .ignore_then(parse_expr(ctx))
            .or_not()
            .boxed()
    } else {
        empty().to(None::<ExprId>).boxed()
    };

    let declarator = parse_ident(ctx).then(init).map_with(|(name, init), e| Declarator {
        name,
        init,
        loc: e.span(),
    });

    parse_type_spec(ctx)
        .then(declarator.separated_by(just(Token::Comma)).collect::<Vec<_>>())
        .then_ignore(just(Token::Semi))
        .map_with(|(spec, declarators), e| Declaration {
            spec,
            declarators,
            loc: e.span(),
        })
}

fn parse_expr<'a, I>(ctx: &'a AstCtx) -> impl Parser<'a, I, ExprId, ParserError<'a>> + Clone
where
    I: ValueInput<'a, Token = Token<'a>, Span = Loc>,
{
    recursive(|expr| {
        let integer = select! { Token::Integer(value) => ExprKind::Integer(value) }
            .map_with(|kind, e| ctx.alloc_expr(kind, e.span()));

        let call_args = expr
            .clone()
            .separated_by(just(Token::Comma))
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        // An identifier followed by an argument list is a call, otherwise a
        // variable reference.
        let ident_based =
            parse_ident(ctx)
                .then(call_args.or_not())
                .map_with(|(name, args), e| match args {
                    Some(args) => ctx.alloc_expr(ExprKind::Call { callee: name, args }, e.span()),
                    None => ctx.alloc_expr(ExprKind::Variable(name), e.span()),
                });

        let paren = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let atom = choice((integer, ident_based, paren))
            .map_with(|expr, e| (expr, e.span()))
            .boxed();

        // Member access binds tightest; the pratt fold chains `a.b.c` left
        // to right and keeps the merged location alongside the id.
        let postfix_expr = atom
            .pratt((postfix(
                10,
                just(Token::Dot)
                    .ignore_then(parse_ident(ctx))
                    .map_with(|member, e| (member, e.span())),
                |(base, base_loc): (ExprId, Loc), (member, member_loc): (Symbol, Loc), _| {
                    let loc = base_loc.merge(member_loc);
                    let id = ctx.alloc_expr(ExprKind::Member { base, member }, loc.clone());
                    (id, loc)
                },
            ),))
            .map(|(expr, _)| expr)
            .boxed();

        let unary = recursive(|unary| {
            // `-x` has no node of its own; it parses as `0 - x`.
            let negate = just(Token::Minus)
                .ignore_then(unary.clone())
                .map_with(|operand, e| {
                    let loc: Loc = e.span();
                    let zero = ctx.alloc_expr(ExprKind::Integer(0), loc.clone());
                    ctx.alloc_expr(
                        ExprKind::Binary {
                            op: BinOp::Sub,
                            lhs: zero,
                            rhs: operand,
                        },
                        loc,
                    )
                });

            let size_of = just(Token::Sizeof)
                .ignore_then(unary)
                .map_with(|operand, e| ctx.alloc_expr(ExprKind::SizeOf(operand), e.span()));

            choice((negate, size_of, postfix_expr))
        });

        let product_op = choice((
            just(Token::Star).to(BinOp::Mul),
            just(Token::Slash).to(BinOp::Div),
            just(Token::Percent).to(BinOp::Rem),
        ));
        let product = unary
            .clone()
            .foldl_with(product_op.then(unary).repeated(), |lhs, (op, rhs), e| {
                ctx.alloc_expr(ExprKind::Binary { op, lhs, rhs }, e.span())
            });

        let sum_op = choice((
            just(Token::Plus).to(BinOp::Add),
            just(Token::Minus).to(BinOp::Sub),
        ));
        let sum = product
            .clone()
            .foldl_with(sum_op.then(product).repeated(), |lhs, (op, rhs), e| {
                ctx.alloc_expr(ExprKind::Binary { op, lhs, rhs }, e.span())
            });

        let relational_op = choice((
            just(Token::Le).to(BinOp::Le),
            just(Token::Ge).to(BinOp::Ge),
            just(Token::Lt).to(BinOp::Lt),
            just(Token::Gt).to(BinOp::Gt),
        ));
        let relational = sum
            .clone()
            .foldl_with(relational_op.then(sum).repeated(), |lhs, (op, rhs), e| {
                ctx.alloc_expr(ExprKind::Binary { op, lhs, rhs }, e.span())
            });

        let equality_op = choice((
            just(Token::EqEq).to(BinOp::Eq),
            just(Token::BangEq).to(BinOp::Ne),
        ));
        let equality = relational.clone().foldl_with(
            equality_op.then(relational).repeated(),
            |lhs, (op, rhs), e| ctx.alloc_expr(ExprKind::Binary { op, lhs, rhs }, e.span()),
        );

        // Assignment is right associative: `a = b = c` assigns c to both.
        equality
            .clone()
            .then(just(Token::Eq).ignore_then(expr).or_not())
            .map_with(|(lhs, rhs), e| match rhs {
                Some(rhs) => ctx.alloc_expr(ExprKind::Assign { lhs, rhs }, e.span()),
                None => lhs,
            })
    })
}

fn parse_stmt<'a, I>(ctx: &'a AstCtx) -> impl Parser<'a, I, StmtId, ParserError<'a>> + Clone
where
    I: ValueInput<'a, Token = Token<'a>, Span = Loc>,
{
    recursive(|stmt| {
        let decl = parse_declaration(ctx, true)
            .map_with(|decl, e| ctx.alloc_stmt(StmtKind::Decl(decl), e.span()));

        let return_stmt = just(Token::Return)
            .ignore_then(parse_expr(ctx))
            .then_ignore(just(Token::Semi))
            .map_with(|value, e| ctx.alloc_stmt(StmtKind::Return(value), e.span()));

        let cond = parse_expr(ctx).delimited_by(just(Token::LParen), just(Token::RParen));

        let if_stmt = just(Token::If)
            .ignore_then(cond.clone())
            .then(stmt.clone())
            .then(just(Token::Else).ignore_then(stmt.clone()).or_not())
            .map_with(|((cond, then_branch), else_branch), e| {
                ctx.alloc_stmt(
                    StmtKind::If {
                        cond,
                        then_branch,
                        else_branch,
                    },
                    e.span(),
                )
            });

        let while_stmt = just(Token::While)
            .ignore_then(cond)
            .then(stmt.clone())
            .map_with(|(cond, body), e| {
                ctx.alloc_stmt(StmtKind::While { cond, body }, e.span())
            });

        let block = stmt
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map_with(|stmts, e| ctx.alloc_stmt(StmtKind::Block(stmts), e.span()));

        let expr_stmt = parse_expr(ctx)
            .then_ignore(just(Token::Semi))
            .map_with(|expr, e| ctx.alloc_stmt(StmtKind::Expr(expr), e.span()));

        choice((decl, return_stmt, if_stmt, while_stmt, block, expr_stmt))
    })
}

fn parse_function<'a, I>(ctx: &'a AstCtx) -> impl Parser<'a, I, FuncItem, ParserError<'a>> + Clone
where
    I: ValueInput<'a, Token = Token<'a>, Span = Loc>,
{
    let param = parse_scalar_type()
        .then(parse_ident(ctx))
        .map_with(|(ty, name), e| ParamDecl {
            ty,
            name,
            loc: e.span(),
        });

    let params = param
        .separated_by(just(Token::Comma))
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LParen), just(Token::RParen));

    let body = parse_stmt(ctx)
        .repeated()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LBrace), just(Token::RBrace));

    parse_scalar_type()
        .then(parse_ident(ctx))
        .then(params)
        .then(body)
        .map_with(|(((ret, name), params), body), e| FuncItem {
            ret,
            name,
            params,
            body,
            loc: e.span(),
        })
}

fn parse_item<'a, I>(ctx: &'a AstCtx) -> impl Parser<'a, I, Item, ParserError<'a>> + Clone
where
    I: ValueInput<'a, Token = Token<'a>, Span = Loc>,
{
    // Functions and file scope declarations both start with a type
    // specifier; the parenthesized parameter list after the name is what
    // tells them apart.
    choice((
        parse_function(ctx).map(Item::Function),
        parse_declaration(ctx, false).map(Item::Decl),
    ))
}

pub fn parse_unit<'a, I>(ctx: &'a AstCtx) -> impl Parser<'a, I, Vec<Item>, ParserError<'a>>
where
    I: ValueInput<'a, Token = Token<'a>, Span = Loc>,
{
    parse_item(ctx)
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
}
