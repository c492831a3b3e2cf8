//! Token construction shorthands used by the lexer.

/// Builds a [`Token`](crate::lexer::tokens::Token) from its kind, text and span.
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $span:expr) => {
        Token {
            kind: $kind,
            value: $value,
            span: $span,
        }
    };
}

/// Lexer handler for fixed punctuation: emits `$kind` with the literal text
/// and moves the cursor past it.
///
/// ```ignore
/// pattern!("^->", MK_DEFAULT_HANDLER!(TokenKind::Arrow, "->"))
/// ```
#[macro_export]
macro_rules! MK_DEFAULT_HANDLER {
    ($kind:expr, $value:literal) => {
        |lexer: &mut Lexer, _regex: &Regex| {
            let span = lexer.span_of($value.len());
            lexer.push(MK_TOKEN!($kind, String::from($value), span));
            lexer.advance_n($value.len());
        }
    };
}
