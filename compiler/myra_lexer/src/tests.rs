use crate::tokenize;
use myra_diagnostic::DiagnosticBag;
use myra_ir::{ForeignTarget, Token, TokenKind};
use pretty_assertions::assert_eq;

fn lex(src: &str) -> Vec<Token> {
    let mut bag = DiagnosticBag::new();
    let tokens = tokenize(src, "test.myra", &mut bag).expect("lexing must not abort");
    assert!(!bag.has_errors(), "unexpected lex errors: {:?}", bag.diagnostics());
    tokens
}

fn kinds(src: &str) -> Vec<TokenKind> {
    lex(src).into_iter().map(|t| t.kind).collect()
}

#[test]
fn test_empty_input_is_just_eof() {
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
}

#[test]
fn test_keywords_case_insensitive() {
    assert_eq!(
        kinds("BEGIN begin Begin"),
        vec![
            TokenKind::KwBegin,
            TokenKind::KwBegin,
            TokenKind::KwBegin,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_identifier_spelling_preserved() {
    assert_eq!(
        kinds("FooBar"),
        vec![TokenKind::Ident("FooBar".to_string()), TokenKind::Eof]
    );
}

#[test]
fn test_decimal_and_hex_numbers() {
    assert_eq!(
        kinds("42 0FFH 1abH"),
        vec![
            TokenKind::Int(42),
            TokenKind::Int(0xFF),
            TokenKind::Int(0x1AB),
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_floats() {
    assert_eq!(
        kinds("3.14 2.5e-8 1e5"),
        vec![
            TokenKind::Float(3.14f64.to_bits()),
            TokenKind::Float(2.5e-8f64.to_bits()),
            TokenKind::Float(1e5f64.to_bits()),
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_integer_range_is_not_a_float() {
    assert_eq!(
        kinds("1..3"),
        vec![
            TokenKind::Int(1),
            TokenKind::DotDot,
            TokenKind::Int(3),
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_string_with_doubled_quote() {
    assert_eq!(
        kinds("'it''s'"),
        vec![TokenKind::Str("it's".to_string()), TokenKind::Eof]
    );
}

#[test]
fn test_single_char_classifies_as_char() {
    assert_eq!(
        kinds("'x'"),
        vec![TokenKind::Char("x".to_string()), TokenKind::Eof]
    );
    // A doubled quote collapsing to one character is still a char literal.
    assert_eq!(
        kinds("''''"),
        vec![TokenKind::Char("'".to_string()), TokenKind::Eof]
    );
}

#[test]
fn test_wide_literals() {
    assert_eq!(
        kinds("L'w' L'wide'"),
        vec![
            TokenKind::WideChar("w".to_string()),
            TokenKind::WideStr("wide".to_string()),
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_ident_starting_with_l_is_not_wide() {
    assert_eq!(
        kinds("List"),
        vec![TokenKind::Ident("List".to_string()), TokenKind::Eof]
    );
}

#[test]
fn test_symbols() {
    assert_eq!(
        kinds(":= <> <= >= .. ... : . ^"),
        vec![
            TokenKind::Assign,
            TokenKind::NotEq,
            TokenKind::LtEq,
            TokenKind::GtEq,
            TokenKind::DotDot,
            TokenKind::Ellipsis,
            TokenKind::Colon,
            TokenKind::Dot,
            TokenKind::Caret,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_comments_are_trivia() {
    assert_eq!(
        kinds("a // line\nb (* block\nstill *) c"),
        vec![
            TokenKind::Ident("a".to_string()),
            TokenKind::Ident("b".to_string()),
            TokenKind::Ident("c".to_string()),
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_directive() {
    assert_eq!(
        kinds("#optimization releasefast"),
        vec![
            TokenKind::Directive("optimization".to_string()),
            TokenKind::Ident("releasefast".to_string()),
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_foreign_block_with_target() {
    let toks = kinds("#startcpp header\n#include <cmath>\n#endcpp");
    assert_eq!(
        toks,
        vec![
            TokenKind::ForeignBlock {
                target: Some(ForeignTarget::Header),
                text: "\n#include <cmath>\n".to_string(),
            },
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_foreign_block_without_target() {
    let toks = kinds("#startcpp int x = 0; #endcpp");
    assert_eq!(
        toks,
        vec![
            TokenKind::ForeignBlock {
                target: None,
                text: " int x = 0; ".to_string(),
            },
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_unknown_char_becomes_one_char_ident() {
    assert_eq!(
        kinds("a ? b"),
        vec![
            TokenKind::Ident("a".to_string()),
            TokenKind::Ident("?".to_string()),
            TokenKind::Ident("b".to_string()),
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_token_spans_slice_the_source() {
    let src = "while Count <= 10 do";
    for token in lex(src) {
        if let TokenKind::Ident(text) = &token.kind {
            assert_eq!(&src[token.pos.span.to_range()], text.as_str());
        }
    }
}

#[test]
fn test_location_monotonicity() {
    let src = "module exe M;\nbegin\n  x := 1;\nend.";
    let tokens = lex(src);
    for pair in tokens.windows(2) {
        let (a, b) = (&pair[0].pos, &pair[1].pos);
        assert!(
            b.line > a.line || (b.line == a.line && b.column >= a.column),
            "locations must be monotone: {a:?} then {b:?}"
        );
    }
}

#[test]
fn test_crlf_line_tracking() {
    let tokens = lex("a\r\nb");
    assert_eq!(tokens[0].pos.line, 1);
    assert_eq!(tokens[1].pos.line, 2);
    assert_eq!(tokens[1].pos.column, 1);
}

#[test]
fn test_unterminated_string_reports_error() {
    let mut bag = DiagnosticBag::new();
    let tokens = tokenize("'oops", "test.myra", &mut bag).expect("must not abort");
    assert!(bag.has_errors());
    assert_eq!(tokens.last().map(|t| t.kind.clone()), Some(TokenKind::Eof));
}

#[test]
fn test_unterminated_block_comment_reports_error() {
    let mut bag = DiagnosticBag::new();
    let tokens = tokenize("(* never closed", "test.myra", &mut bag).expect("must not abort");
    assert!(bag.has_errors());
    assert_eq!(tokens.last().map(|t| t.kind.clone()), Some(TokenKind::Eof));
}

#[test]
fn test_string_with_line_break_reports_error() {
    let mut bag = DiagnosticBag::new();
    tokenize("'a\nb'", "test.myra", &mut bag).expect("must not abort");
    assert!(bag.has_errors());
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Tokenisation terminates and ends in EOF for arbitrary input.
        #[test]
        fn tokenize_always_terminates_with_eof(src in ".*") {
            let mut bag = DiagnosticBag::new();
            if let Ok(tokens) = tokenize(&src, "fuzz.myra", &mut bag) {
                prop_assert!(matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)));
            }
        }

        /// Token locations never move backwards.
        #[test]
        fn locations_are_monotone(src in "[ -~\n]*") {
            let mut bag = DiagnosticBag::new();
            if let Ok(tokens) = tokenize(&src, "fuzz.myra", &mut bag) {
                for pair in tokens.windows(2) {
                    let (a, b) = (&pair[0].pos, &pair[1].pos);
                    prop_assert!(
                        b.line > a.line || (b.line == a.line && b.column >= a.column)
                    );
                }
            }
        }
    }
}
