use crate::{
    ast::expressions::{BinaryOperator, Expr, ExprKind, UnaryOperator},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let Some(nud_fn) = parser.get_nud_lookup().get(&token_kind).copied() else {
        return Err(parser.syntax_error("expression"));
    };

    let mut left = nud_fn(parser)?;

    // While the next operator binds tighter than the current level, keep extending lhs
    loop {
        let token_kind = parser.current_token_kind();
        let next_bp = parser
            .get_bp_lookup()
            .get(&token_kind)
            .copied()
            .unwrap_or(BindingPower::Default);

        if next_bp <= bp {
            break;
        }

        let Some(led_fn) = parser.get_led_lookup().get(&token_kind).copied() else {
            return Err(parser.syntax_error("operator"));
        };

        left = led_fn(parser, left, next_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.current_token().clone();

    let kind = match token.kind {
        TokenKind::Integer => ExprKind::Integer(parse_number(&token.value, &token.span)?),
        TokenKind::Float => ExprKind::Float(parse_float(&token.value, &token.span)?),
        TokenKind::True => ExprKind::Boolean(true),
        TokenKind::False => ExprKind::Boolean(false),
        TokenKind::String => ExprKind::String(token.value.clone()),
        TokenKind::Char => {
            let mut chars = token.value.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => ExprKind::Char(ch),
                _ => return Err(parser.syntax_error("single character literal")),
            }
        }
        _ => return Err(parser.syntax_error("literal")),
    };

    parser.advance();
    Ok(Expr::new(kind, token.span))
}

fn parse_number<T: std::str::FromStr>(value: &str, span: &Span) -> Result<T, Error> {
    value.parse().map_err(|_| {
        Error::new(
            ErrorImpl::NumberParseError {
                token: value.to_string(),
            },
            span.start.clone(),
        )
    })
}

// `f32::from_str` saturates to infinity instead of failing.
fn parse_float(value: &str, span: &Span) -> Result<f32, Error> {
    let number: f32 = parse_number(value, span)?;
    if !number.is_finite() {
        return Err(Error::new(
            ErrorImpl::NumberParseError {
                token: value.to_string(),
            },
            span.start.clone(),
        ));
    }

    Ok(number)
}

/// Identifier, call `f(a, b)` or element read `xs[i]`, decided by the token
/// right after the name.
pub fn parse_identifier_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.expect(TokenKind::Identifier)?;

    match parser.current_token_kind() {
        TokenKind::OpenParen => {
            parser.advance();
            let arguments = parse_expr_list(parser, TokenKind::CloseParen)?;
            let end = parser.expect(TokenKind::CloseParen)?.span.end;

            Ok(Expr::new(
                ExprKind::Call {
                    callee: token.value,
                    arguments,
                },
                Span {
                    start: token.span.start,
                    end,
                },
            ))
        }
        TokenKind::OpenBracket => {
            parser.advance();
            let index = parse_expr(parser, BindingPower::Default)?;
            let end = parser.expect(TokenKind::CloseBracket)?.span.end;

            Ok(Expr::new(
                ExprKind::Index {
                    array: token.value,
                    index: Box::new(index),
                },
                Span {
                    start: token.span.start,
                    end,
                },
            ))
        }
        _ => Ok(Expr::new(ExprKind::Identifier(token.value), token.span)),
    }
}

/// Comma separated expressions up to (not including) `close`.
fn parse_expr_list(parser: &mut Parser, close: TokenKind) -> Result<Vec<Expr>, Error> {
    let mut items = vec![];

    if parser.current_token_kind() == close {
        return Ok(items);
    }

    loop {
        items.push(parse_expr(parser, BindingPower::Default)?);

        if parser.current_token_kind() != TokenKind::Comma {
            break;
        }
        parser.advance();
    }

    Ok(items)
}

fn binary_operator(kind: TokenKind) -> Option<BinaryOperator> {
    Some(match kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Dash => BinaryOperator::Subtract,
        TokenKind::Star => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Equals => BinaryOperator::Equals,
        TokenKind::NotEquals => BinaryOperator::NotEquals,
        TokenKind::Less => BinaryOperator::Less,
        TokenKind::LessEquals => BinaryOperator::LessEquals,
        TokenKind::Greater => BinaryOperator::Greater,
        TokenKind::GreaterEquals => BinaryOperator::GreaterEquals,
        TokenKind::And => BinaryOperator::And,
        TokenKind::Or => BinaryOperator::Or,
        _ => return None,
    })
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let Some(operator) = binary_operator(parser.current_token_kind()) else {
        return Err(parser.syntax_error("binary operator"));
    };
    parser.advance();

    let right = parse_expr(parser, bp)?;
    let span = left.span.to(&right.span);

    Ok(Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        },
        span,
    ))
}

pub fn parse_unary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let operator = if operator_token.kind == TokenKind::Not {
        UnaryOperator::Not
    } else {
        UnaryOperator::Negate
    };

    // A minus directly on an integer literal is part of the literal, so the
    // full `i32` range can be written.
    if operator == UnaryOperator::Negate && parser.current_token_kind() == TokenKind::Integer {
        let literal = parser.advance().clone();
        let text = format!("-{}", literal.value);
        let value = parse_number(&text, &literal.span)?;

        return Ok(Expr::new(
            ExprKind::Integer(value),
            operator_token.span.to(&literal.span),
        ));
    }

    let operand = parse_expr(parser, BindingPower::Unary)?;
    let span = operator_token.span.to(&operand.span);

    Ok(Expr::new(
        ExprKind::Unary {
            operator,
            operand: Box::new(operand),
        },
        span,
    ))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

pub fn parse_array_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.expect(TokenKind::OpenBracket)?.span.start;
    let elements = parse_expr_list(parser, TokenKind::CloseBracket)?;
    let end = parser.expect(TokenKind::CloseBracket)?.span.end;

    Ok(Expr::new(ExprKind::Array(elements), Span { start, end }))
}
