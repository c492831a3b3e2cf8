use crate::{
    ast::{
        expressions::ExprKind,
        statements::{BlockStmt, FnDeclStmt, Stmt, StmtKind, VarDeclStmt},
        types::TypeTag,
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
    Span,
};

use super::{
    parser::Parser,
    types::{parse_array_size, parse_type},
};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    if let Some(stmt_fn) = parser
        .get_stmt_lookup()
        .get(&parser.current_token_kind())
        .copied()
    {
        return stmt_fn(parser);
    }

    let stmt = parse_simple_stmt(parser)?;
    let end = parser.expect(TokenKind::Semicolon)?.span.end;

    Ok(Stmt::new(
        stmt.kind,
        Span {
            start: stmt.span.start,
            end,
        },
    ))
}

/// Assignment or bare expression, without the trailing semicolon.
pub fn parse_simple_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let expr = parse_expr(parser, BindingPower::Default)?;

    if parser.current_token_kind() != TokenKind::Assignment {
        let span = expr.span.clone();
        return Ok(Stmt::new(StmtKind::Expression(expr), span));
    }

    let (identifier, index) = match expr.kind {
        ExprKind::Identifier(name) => (name, None),
        ExprKind::Index { array, index } => (array, Some(*index)),
        _ => return Err(parser.syntax_error(TokenKind::Semicolon.to_string())),
    };
    parser.advance();

    let value = parse_expr(parser, BindingPower::Default)?;
    let span = expr.span.to(&value.span);

    Ok(Stmt::new(
        StmtKind::Assignment {
            identifier,
            index,
            value,
        },
        span,
    ))
}

pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let error = parser.syntax_error("identifier");
    let identifier = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    parser.expect(TokenKind::Colon)?;
    let var_type = parse_type(parser)?;
    let array_size = parse_array_size(parser)?;

    let assigned_value = if parser.current_token_kind() == TokenKind::Assignment {
        parser.advance();
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    let end = parser.expect(TokenKind::Semicolon)?.span.end;

    Ok(Stmt::new(
        StmtKind::VarDecl(VarDeclStmt {
            identifier,
            var_type,
            array_size,
            assigned_value,
        }),
        Span { start, end },
    ))
}

pub fn parse_block(parser: &mut Parser) -> Result<(BlockStmt, Span), Error> {
    let start = parser.expect(TokenKind::OpenCurly)?.span.start;

    let mut body = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly && parser.has_tokens() {
        body.push(parse_stmt(parser)?);
    }

    let end = parser.expect(TokenKind::CloseCurly)?.span.end;

    Ok((BlockStmt { body }, Span { start, end }))
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let (block, span) = parse_block(parser)?;
    Ok(Stmt::new(StmtKind::Block(block), span))
}

/// Handles `if` and `elif`. Each `elif` becomes a nested `If` in the else slot.
pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let (then_body, then_span) = parse_block(parser)?;

    let else_body = match parser.current_token_kind() {
        TokenKind::Elif => Some(Box::new(parse_if_stmt(parser)?)),
        TokenKind::Else => {
            parser.advance();
            if parser.current_token_kind() == TokenKind::If {
                Some(Box::new(parse_if_stmt(parser)?))
            } else {
                Some(Box::new(parse_block_stmt(parser)?))
            }
        }
        _ => None,
    };

    let end = match &else_body {
        Some(stmt) => stmt.span.end.clone(),
        None => then_span.end,
    };

    Ok(Stmt::new(
        StmtKind::If {
            condition,
            then_body,
            else_body,
        },
        Span { start, end },
    ))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let (body, body_span) = parse_block(parser)?;

    Ok(Stmt::new(
        StmtKind::While { condition, body },
        Span {
            start,
            end: body_span.end,
        },
    ))
}

pub fn parse_for_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();
    parser.expect(TokenKind::OpenParen)?;

    let init = match parser.current_token_kind() {
        TokenKind::Semicolon => {
            parser.advance();
            None
        }
        TokenKind::Let => Some(Box::new(parse_var_decl_stmt(parser)?)),
        _ => {
            let stmt = parse_simple_stmt(parser)?;
            parser.expect(TokenKind::Semicolon)?;
            Some(Box::new(stmt))
        }
    };

    let condition = if parser.current_token_kind() != TokenKind::Semicolon {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };
    parser.expect(TokenKind::Semicolon)?;

    let increment = if parser.current_token_kind() != TokenKind::CloseParen {
        Some(Box::new(parse_simple_stmt(parser)?))
    } else {
        None
    };
    parser.expect(TokenKind::CloseParen)?;

    let (body, body_span) = parse_block(parser)?;

    Ok(Stmt::new(
        StmtKind::For {
            init,
            condition,
            increment,
            body,
        },
        Span {
            start,
            end: body_span.end,
        },
    ))
}

pub fn parse_fn_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let identifier = parser.expect(TokenKind::Identifier)?.value;

    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = Vec::new();
    if parser.current_token_kind() != TokenKind::CloseParen {
        loop {
            let name = parser.expect(TokenKind::Identifier)?.value;
            parser.expect(TokenKind::Colon)?;
            parameters.push((name, parse_type(parser)?));

            if parser.current_token_kind() != TokenKind::Comma {
                break;
            }
            parser.advance();
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    let return_type = if parser.current_token_kind() == TokenKind::Arrow {
        parser.advance();
        parse_type(parser)?
    } else {
        TypeTag::Void
    };

    let (body, body_span) = parse_block(parser)?;

    Ok(Stmt::new(
        StmtKind::FnDecl(FnDeclStmt {
            identifier,
            parameters,
            return_type,
            body,
        }),
        Span {
            start,
            end: body_span.end,
        },
    ))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let value = if parser.current_token_kind() != TokenKind::Semicolon {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    let end = parser.expect(TokenKind::Semicolon)?.span.end;

    Ok(Stmt::new(StmtKind::Return(value), Span { start, end }))
}

pub fn parse_print_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let value = parse_expr(parser, BindingPower::Default)?;
    let end = parser.expect(TokenKind::Semicolon)?.span.end;

    Ok(Stmt::new(StmtKind::Print(value), Span { start, end }))
}

/// `break;` and `continue;`.
pub fn parse_loop_control_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let token = parser.advance().clone();
    let end = parser.expect(TokenKind::Semicolon)?.span.end;

    let kind = if token.kind == TokenKind::Break {
        StmtKind::Break
    } else {
        StmtKind::Continue
    };

    Ok(Stmt::new(
        kind,
        Span {
            start: token.span.start,
            end,
        },
    ))
}
