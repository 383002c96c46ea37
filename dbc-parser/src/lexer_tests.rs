//! Tests for the predicate lexer

use super::*;

fn tokens(source: &str) -> Vec<Token<'_>> {
    Lexer::new(source)
        .tokenize()
        .expect("source should lex")
        .into_iter()
        .map(|spanned| spanned.token)
        .collect()
}

#[test]
fn test_keywords() {
    assert_eq!(
        tokens("and or not in is if else for True False None"),
        vec![
            Token::And,
            Token::Or,
            Token::Not,
            Token::In,
            Token::Is,
            Token::If,
            Token::Else,
            Token::For,
            Token::True,
            Token::False,
            Token::Nil,
        ]
    );
}

#[test]
fn test_keyword_prefix_is_identifier() {
    assert_eq!(
        tokens("android origin nothing"),
        vec![
            Token::Ident("android"),
            Token::Ident("origin"),
            Token::Ident("nothing"),
        ]
    );
}

#[test]
fn test_dunder_identifiers() {
    assert_eq!(
        tokens("__ret__ __old__ self"),
        vec![
            Token::Ident("__ret__"),
            Token::Ident("__old__"),
            Token::Ident("self"),
        ]
    );
}

#[test]
fn test_numbers() {
    assert_eq!(
        tokens("42 3.14 1e3 2.5e-1"),
        vec![
            Token::Integer(42),
            Token::Float(3.14),
            Token::Float(1000.0),
            Token::Float(0.25),
        ]
    );
}

#[test]
fn test_integer_overflow_is_invalid_number() {
    let err = Lexer::new("99999999999999999999").tokenize().unwrap_err();
    assert_eq!(err, ParseError::InvalidNumber("99999999999999999999".to_string()));
}

#[test]
fn test_strings_with_both_quotes() {
    assert_eq!(
        tokens(r#""a" 'b' "it's" 'say \"hi\"' "tab\there""#),
        vec![
            Token::String("a".to_string()),
            Token::String("b".to_string()),
            Token::String("it's".to_string()),
            Token::String("say \"hi\"".to_string()),
            Token::String("tab\there".to_string()),
        ]
    );
}

#[test]
fn test_operators_prefer_longest_match() {
    assert_eq!(
        tokens("** * // / <= < >= > == !="),
        vec![
            Token::StarStar,
            Token::Star,
            Token::SlashSlash,
            Token::Slash,
            Token::LessEq,
            Token::Less,
            Token::GreaterEq,
            Token::Greater,
            Token::EqEq,
            Token::NotEq,
        ]
    );
}

#[test]
fn test_attribute_access_tokens() {
    assert_eq!(
        tokens("self.bla>5"),
        vec![
            Token::Ident("self"),
            Token::Dot,
            Token::Ident("bla"),
            Token::Greater,
            Token::Integer(5),
        ]
    );
}

#[test]
fn test_spans() {
    let spanned = Lexer::new("a  == b").tokenize().unwrap();
    assert_eq!(spanned[0].span, 0..1);
    assert_eq!(spanned[1].span, 3..5);
    assert_eq!(spanned[2].span, 6..7);
}

#[test]
fn test_invalid_character() {
    let err = Lexer::new("a ! b").tokenize().unwrap_err();
    assert_eq!(
        err,
        ParseError::InvalidToken {
            position: 2,
            text: "!".to_string()
        }
    );
}

#[test]
fn test_escape_processing() {
    assert_eq!(process_string_escapes(r"a\nb"), "a\nb");
    assert_eq!(process_string_escapes(r"\q"), "\\q");
    assert_eq!(process_string_escapes("trailing\\"), "trailing\\");
}
