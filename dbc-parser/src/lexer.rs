//! Lexer for contract predicate expressions using logos

use std::fmt;
use std::ops::Range;

use logos::{Lexer as LogosLexer, Logos};

use crate::error::ParseError;

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token<'a> {
    // Keywords
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("in")]
    In,
    #[token("is")]
    Is,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("None")]
    Nil,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,

    // Arithmetic
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    StarStar,
    #[token("/")]
    Slash,
    #[token("//")]
    SlashSlash,
    #[token("%")]
    Percent,

    // Comparison
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("<=")]
    LessEq,
    #[token(">=")]
    GreaterEq,

    // Literals
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unquote(lex.slice()))]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unquote(lex.slice()))]
    String(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Ident(&'a str),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::And => write!(f, "keyword 'and'"),
            Token::Or => write!(f, "keyword 'or'"),
            Token::Not => write!(f, "keyword 'not'"),
            Token::In => write!(f, "keyword 'in'"),
            Token::Is => write!(f, "keyword 'is'"),
            Token::If => write!(f, "keyword 'if'"),
            Token::Else => write!(f, "keyword 'else'"),
            Token::For => write!(f, "keyword 'for'"),
            Token::True => write!(f, "'True'"),
            Token::False => write!(f, "'False'"),
            Token::Nil => write!(f, "'None'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Comma => write!(f, "','"),
            Token::Dot => write!(f, "'.'"),
            Token::Colon => write!(f, "':'"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::StarStar => write!(f, "'**'"),
            Token::Slash => write!(f, "'/'"),
            Token::SlashSlash => write!(f, "'//'"),
            Token::Percent => write!(f, "'%'"),
            Token::EqEq => write!(f, "'=='"),
            Token::NotEq => write!(f, "'!='"),
            Token::Less => write!(f, "'<'"),
            Token::Greater => write!(f, "'>'"),
            Token::LessEq => write!(f, "'<='"),
            Token::GreaterEq => write!(f, "'>='"),
            Token::Integer(n) => write!(f, "integer {}", n),
            Token::Float(x) => write!(f, "float {}", x),
            Token::String(s) => write!(f, "string {:?}", s),
            Token::Ident(name) => write!(f, "identifier '{}'", name),
        }
    }
}

/// Strip the surrounding quotes of a string literal and process escapes
fn unquote(literal: &str) -> String {
    process_string_escapes(&literal[1..literal.len() - 1])
}

/// Process escape sequences in strings
pub fn process_string_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some('0') => result.push('\0'),
                Some(c) => {
                    result.push('\\');
                    result.push(c);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// A token together with its byte range in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    pub span: Range<usize>,
}

pub struct Lexer<'a> {
    inner: LogosLexer<'a, Token<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: Token::lexer(source),
        }
    }

    /// Lex the whole source, failing on the first invalid token
    pub fn tokenize(self) -> Result<Vec<Spanned<'a>>, ParseError> {
        self.collect()
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Spanned<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.inner.next()?;
        let span = self.inner.span();
        Some(match result {
            Ok(token) => Ok(Spanned { token, span }),
            Err(()) => {
                let text = self.inner.slice();
                if text.chars().all(|c| c.is_ascii_digit()) {
                    Err(ParseError::InvalidNumber(text.to_string()))
                } else {
                    Err(ParseError::InvalidToken {
                        position: span.start,
                        text: text.to_string(),
                    })
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod tests;
