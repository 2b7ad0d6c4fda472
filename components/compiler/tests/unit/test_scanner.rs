//! Tests for the scanner

use compiler::{Scanner, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    Scanner::new(source).map(|token| token.kind).collect()
}

#[test]
fn test_keywords_and_identifiers() {
    assert_eq!(
        kinds("class fun var classy _x break continue"),
        vec![
            TokenKind::Class,
            TokenKind::Fun,
            TokenKind::Var,
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::Break,
            TokenKind::Continue,
        ]
    );
}

#[test]
fn test_ternary_punctuation() {
    assert_eq!(
        kinds("a ? b : c"),
        vec![
            TokenKind::Identifier,
            TokenKind::Question,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Identifier,
        ]
    );
}

#[test]
fn test_comments_and_lines() {
    let tokens: Vec<_> = Scanner::new("// header\nvar x; // trailing\n\nprint x;").collect();
    assert_eq!(tokens[0].line, 2);
    assert_eq!(tokens[0].kind, TokenKind::Var);
    let print = tokens
        .iter()
        .find(|token| token.kind == TokenKind::Print)
        .unwrap();
    assert_eq!(print.line, 4);
}

#[test]
fn test_string_lexeme_keeps_quotes() {
    let tokens: Vec<_> = Scanner::new("\"hi there\"").collect();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].lexeme, "\"hi there\"");
}

#[test]
fn test_multiline_string_reports_opening_line() {
    let tokens: Vec<_> = Scanner::new("\"a\nb\" x").collect();
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn test_unterminated_string_reports_opening_line() {
    let mut scanner = Scanner::new("\"abc\n\n\n");
    let token = scanner.next_token();
    assert_eq!(token.kind, TokenKind::Error);
    assert_eq!(token.line, 1);
    assert_eq!(scanner.line(), 4);
}

#[test]
fn test_unterminated_string() {
    let tokens: Vec<_> = Scanner::new("\"open").collect();
    assert_eq!(tokens[0].kind, TokenKind::Error);
    assert_eq!(tokens[0].lexeme, "Unterminated string.");
}

#[test]
fn test_number_lexemes() {
    let lexemes: Vec<_> = Scanner::new("1 2.5 .5")
        .map(|token| (token.kind, token.lexeme))
        .collect();
    assert_eq!(
        lexemes,
        vec![
            (TokenKind::Number, "1"),
            (TokenKind::Number, "2.5"),
            (TokenKind::Dot, "."),
            (TokenKind::Number, "5"),
        ]
    );
}
