//! Token-level scan of a function body for call sites.

use logos::Logos;

#[derive(Debug, Logos, PartialEq, Clone, Copy)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
enum Token {
    #[regex("[_a-zA-Z][_a-zA-Z0-9]*")]
    Identifier,
    #[token("(")]
    OpenParen,
    #[regex(r#""([^"\\]|\\.)*""#)]
    String,
}

/// Control-flow keywords that read like call sites when followed by `(`.
const KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "return", "let", "const", "fn",
];

/// Collect every `ident(` call site in `body`, in source order.
///
/// Duplicates are kept so callers see the body's true call sequence;
/// deduplication is the tracer's job. Comments and string literals are
/// skipped. Any other token (operators, literals, braces) just separates an
/// identifier from a following `(`.
pub fn call_sites(body: &str) -> Vec<String> {
    let mut lexer = Token::lexer(body);
    let mut calls = Vec::new();
    let mut pending: Option<String> = None;
    while let Some(tok) = lexer.next() {
        match tok {
            Ok(Token::Identifier) => pending = Some(lexer.slice().to_string()),
            Ok(Token::OpenParen) => {
                if let Some(name) = pending.take() {
                    if !KEYWORDS.contains(&name.as_str()) {
                        calls.push(name);
                    }
                }
            },
            _ => pending = None,
        }
    }
    calls
}
