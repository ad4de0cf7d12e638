use std::fmt;

use logos::Logos;

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n\f]+", skip r"//[^\n]*", skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum Token<'a> {
    #[token("struct")]
    Struct,
    #[token("char")]
    Char,
    #[token("short")]
    Short,
    #[token("int")]
    Int,
    #[token("long")]
    Long,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("sizeof")]
    Sizeof,

    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice())]
    Identifier(&'a str),
    #[regex(r"[0-9]+", |lex| lex.slice().parse().ok())]
    Integer(i64),

    /// Stand-in for input the lexer could not recognise; never produced by
    /// a token rule, only substituted for lex failures so the parser can
    /// report them with a span.
    Error,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Struct => write!(f, "struct"),
            Token::Char => write!(f, "char"),
            Token::Short => write!(f, "short"),
            Token::Int => write!(f, "int"),
            Token::Long => write!(f, "long"),
            Token::Return => write!(f, "return"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::Sizeof => write!(f, "sizeof"),
            Token::EqEq => write!(f, "=="),
            Token::BangEq => write!(f, "!="),
            Token::Le => write!(f, "<="),
            Token::Ge => write!(f, ">="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Eq => write!(f, "="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::Semi => write!(f, ";"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Integer(value) => write!(f, "{}", value),
            Token::Error => write!(f, "<invalid token>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token<'_>> {
        Token::lexer(src).map(|t| t.unwrap_or(Token::Error)).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            lex("struct simple s;"),
            vec![
                Token::Struct,
                Token::Identifier("simple"),
                Token::Identifier("s"),
                Token::Semi,
            ]
        );
        // Keyword prefixes stay identifiers.
        assert_eq!(lex("structx intx"), vec![
            Token::Identifier("structx"),
            Token::Identifier("intx"),
        ]);
    }

    #[test]
    fn compound_operators_take_priority() {
        assert_eq!(
            lex("a <= b == c = 1"),
            vec![
                Token::Identifier("a"),
                Token::Le,
                Token::Identifier("b"),
                Token::EqEq,
                Token::Identifier("c"),
                Token::Eq,
                Token::Integer(1),
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            lex("int a; // trailing\n/* block\n comment **/ int b;"),
            vec![
                Token::Int,
                Token::Identifier("a"),
                Token::Semi,
                Token::Int,
                Token::Identifier("b"),
                Token::Semi,
            ]
        );
    }

    #[test]
    fn unknown_input_becomes_error_token() {
        assert_eq!(lex("a @ b"), vec![
            Token::Identifier("a"),
            Token::Error,
            Token::Identifier("b"),
        ]);
    }
}
