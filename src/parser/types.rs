//! Type annotation parsing.
//!
//! A type is a single name, optionally followed by an element count in
//! variable declarations (`Integer[4]`).

use crate::{
    ast::types::TypeTag,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::parser::Parser;

pub fn parse_type(parser: &mut Parser) -> Result<TypeTag, Error> {
    let error = parser.syntax_error("type name");
    let token = parser.expect_error(TokenKind::Identifier, Some(error))?;

    Ok(TypeTag::from_name(&token.value))
}

/// Parses `[N]` after a declared type, if present.
pub fn parse_array_size(parser: &mut Parser) -> Result<Option<u32>, Error> {
    if parser.current_token_kind() != TokenKind::OpenBracket {
        return Ok(None);
    }
    parser.advance();

    let error = parser.syntax_error("array size");
    let token = parser.expect_error(TokenKind::Integer, Some(error))?;
    let size = token.value.parse::<u32>().map_err(|_| {
        Error::new(
            ErrorImpl::NumberParseError {
                token: token.value.clone(),
            },
            token.span.start.clone(),
        )
    })?;

    parser.expect(TokenKind::CloseBracket)?;
    Ok(Some(size))
}
