use std::collections::VecDeque;
use minic_errors::Reporter;
use ast::{BinaryOp, Expr, Function, Ident, Item, Param, Program, Statement, Type, UnaryOp};
use position::{Position, Span, Spanned};
use tokens::{Keyword, Token};


pub fn parse(tokens: Vec<Spanned<Token>>, reporter: Reporter) -> Program {
    let mut parser = Parser::new(tokens, reporter);
    parser.parse_program()
}

type ParseResult<T> = Result<T, ()>;

const LEVEL_COUNT: usize = 9;

struct Parser {
    reporter: Reporter,
    tokens: VecDeque<Spanned<Token>>,
    next_token: Option<Spanned<Token>>,
    prev_span: Option<Span>,
}

impl Parser {
    fn new(tokens: Vec<Spanned<Token>>, reporter: Reporter) -> Self {
        let mut tokens = tokens.into_iter().collect::<VecDeque<_>>();
        let next_token = tokens.pop_front();
        Parser {
            reporter,
            tokens,
            next_token,
            prev_span: None,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.next_token.as_ref().map(Spanned::value)
    }

    fn peek_span(&self) -> Span {
        match self.next_token {
            Some(ref tok) => Spanned::span(tok),
            None => match self.prev_span {
                Some(span) => Span::empty_at(span.end),
                None => Span::empty_at(Position::new(0, 0)),
            },
        }
    }

    fn advance(&mut self) -> Option<Spanned<Token>> {
        let tok = self.next_token.take();
        if let Some(ref tok) = tok {
            self.prev_span = Some(Spanned::span(tok));
        }
        self.next_token = self.tokens.pop_front();
        tok
    }

    fn check(&mut self, tok: &Token) -> bool {
        if self.peek() == Some(tok) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error<T>(&mut self, expected: &str) -> ParseResult<T> {
        // the lexer already complained about Token::Error
        if self.peek() != Some(&Token::Error) {
            let got = match self.peek() {
                Some(tok) => format!("`{}`", tok),
                None => "end of input".into(),
            };
            let span = self.peek_span();
            self.reporter
                .error(format!("expected {}, got {}", expected, got), span);
        }
        Err(())
    }

    fn expect(&mut self, tok: Token) -> ParseResult<Span> {
        if self.peek() == Some(&tok) {
            Ok(Spanned::span(&self.advance().unwrap()))
        } else {
            self.error(&format!("`{}`", tok))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<Spanned<Ident>> {
        match self.peek() {
            Some(&Token::Ident(_)) => {
                let tok = self.advance().unwrap();
                let span = Spanned::span(&tok);
                match Spanned::into_value(tok) {
                    Token::Ident(name) => Ok(Spanned::new(Ident(name), span)),
                    _ => unreachable!(),
                }
            }
            _ => self.error("identifier"),
        }
    }

    /// Skip tokens until a statement or item boundary, so one parse error
    /// does not cascade into dozens of bogus ones.
    fn synchronize(&mut self) {
        loop {
            match self.peek() {
                None |
                Some(&Token::RightBrace) |
                Some(&Token::Keyword(Keyword::Int)) |
                Some(&Token::Keyword(Keyword::Char)) |
                Some(&Token::Keyword(Keyword::If)) |
                Some(&Token::Keyword(Keyword::Return)) => break,
                Some(&Token::Semicolon) => {
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn parse_program(&mut self) -> Program {
        let mut items = Vec::new();
        while self.peek().is_some() {
            match self.parse_item() {
                Ok(item) => items.push(item),
                Err(()) => {
                    self.synchronize();
                    // a stray `}` would otherwise stall the item loop
                    if self.peek() == Some(&Token::RightBrace) {
                        self.advance();
                    }
                }
            }
        }
        Program { items }
    }

    fn parse_type(&mut self) -> ParseResult<Spanned<Type>> {
        match self.peek() {
            Some(&Token::Keyword(Keyword::Int)) => {
                let span = Spanned::span(&self.advance().unwrap());
                Ok(Spanned::new(Type::Int, span))
            }
            Some(&Token::Keyword(Keyword::Char)) => {
                let span = Spanned::span(&self.advance().unwrap());
                Ok(Spanned::new(Type::Char, span))
            }
            _ => self.error("type"),
        }
    }

    fn parse_item(&mut self) -> ParseResult<Spanned<Item>> {
        let typ = self.parse_type()?;
        let name = self.expect_ident()?;
        if self.check(&Token::LeftParen) {
            let params = self.parse_params()?;
            self.expect(Token::LeftBrace)?;
            let body = self.parse_block_body()?;
            let span = Spanned::span(&typ).merge(self.prev_span.unwrap_or_else(|| self.peek_span()));
            let function = Function {
                return_type: typ,
                name,
                params,
                body,
            };
            Ok(Spanned::new(Item::Function(function), span))
        } else {
            let value = if self.check(&Token::Assign) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            let end = self.expect(Token::Semicolon)?;
            let span = Spanned::span(&typ).merge(end);
            Ok(Spanned::new(Item::Global(typ, name, value), span))
        }
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        let mut params = Vec::new();
        if self.check(&Token::RightParen) {
            return Ok(params);
        }
        loop {
            let typ = self.parse_type()?;
            let name = self.expect_ident()?;
            params.push(Param { typ, name });
            if !self.check(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RightParen)?;
        Ok(params)
    }

    /// Parse statements up to and including the closing `}`.
    fn parse_block_body(&mut self) -> ParseResult<Vec<Spanned<Statement>>> {
        let mut statements = Vec::new();
        loop {
            match self.peek() {
                Some(&Token::RightBrace) => {
                    self.advance();
                    return Ok(statements);
                }
                None => return self.error("`}`"),
                _ => match self.parse_statement() {
                    Ok(statement) => statements.push(statement),
                    Err(()) => {
                        let span = self.peek_span();
                        self.synchronize();
                        statements.push(Spanned::new(Statement::Error, span));
                    }
                },
            }
        }
    }

    fn parse_statement(&mut self) -> ParseResult<Spanned<Statement>> {
        match self.peek() {
            Some(&Token::LeftBrace) => {
                let start = Spanned::span(&self.advance().unwrap());
                let body = self.parse_block_body()?;
                let span = start.merge(self.prev_span.unwrap());
                Ok(Spanned::new(Statement::Block(body), span))
            }
            Some(&Token::Keyword(Keyword::If)) => self.parse_if(),
            Some(&Token::Keyword(Keyword::Return)) => {
                let start = Spanned::span(&self.advance().unwrap());
                let value = if self.peek() == Some(&Token::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let end = self.expect(Token::Semicolon)?;
                Ok(Spanned::new(Statement::Return(value), start.merge(end)))
            }
            Some(&Token::Keyword(Keyword::Int)) | Some(&Token::Keyword(Keyword::Char)) => {
                let typ = self.parse_type()?;
                let name = self.expect_ident()?;
                let value = if self.check(&Token::Assign) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                let end = self.expect(Token::Semicolon)?;
                let span = Spanned::span(&typ).merge(end);
                Ok(Spanned::new(Statement::Decl(typ, name, value), span))
            }
            _ => {
                let expr = self.parse_expr()?;
                let end = self.expect(Token::Semicolon)?;
                let span = Spanned::span(&expr).merge(end);
                Ok(Spanned::new(Statement::Expr(expr), span))
            }
        }
    }

    fn parse_if(&mut self) -> ParseResult<Spanned<Statement>> {
        let start = Spanned::span(&self.advance().unwrap());
        self.expect(Token::LeftParen)?;
        let condition = self.parse_expr()?;
        self.expect(Token::RightParen)?;
        let then = self.parse_statement()?;
        let (else_branch, end) = if self.check(&Token::Keyword(Keyword::Else)) {
            let statement = self.parse_statement()?;
            let span = Spanned::span(&statement);
            (Some(Box::new(statement)), span)
        } else {
            (None, Spanned::span(&then))
        };
        let span = start.merge(end);
        Ok(Spanned::new(
            Statement::If(condition, Box::new(then), else_branch),
            span,
        ))
    }

    fn parse_expr(&mut self) -> ParseResult<Spanned<Expr>> {
        self.parse_assign()
    }

    // assignment is right-associative; whether the left side is a valid
    // assignment target is checked by the semantic analyser
    fn parse_assign(&mut self) -> ParseResult<Spanned<Expr>> {
        let lhs = self.parse_binary(0)?;
        if self.check(&Token::Assign) {
            let rhs = self.parse_assign()?;
            let span = Spanned::span(&lhs).merge(Spanned::span(&rhs));
            Ok(Spanned::new(
                Expr::Assign(Box::new(lhs), Box::new(rhs)),
                span,
            ))
        } else {
            Ok(lhs)
        }
    }

    // binary operator precedence, level 0 binding loosest
    fn level_operator(level: usize, token: &Token) -> Option<BinaryOp> {
        match (level, token) {
            (0, &Token::Or) => Some(BinaryOp::Or),
            (1, &Token::And) => Some(BinaryOp::And),
            (2, &Token::Pipe) => Some(BinaryOp::BitOr),
            (3, &Token::Caret) => Some(BinaryOp::BitXor),
            (4, &Token::Ampersand) => Some(BinaryOp::BitAnd),
            (5, &Token::Equal) => Some(BinaryOp::Equal),
            (5, &Token::NotEqual) => Some(BinaryOp::NotEqual),
            (6, &Token::Less) => Some(BinaryOp::Less),
            (6, &Token::LessEqual) => Some(BinaryOp::LessEqual),
            (6, &Token::Greater) => Some(BinaryOp::Greater),
            (6, &Token::GreaterEqual) => Some(BinaryOp::GreaterEqual),
            (7, &Token::Plus) => Some(BinaryOp::Add),
            (7, &Token::Minus) => Some(BinaryOp::Subtract),
            (8, &Token::Star) => Some(BinaryOp::Multiply),
            (8, &Token::Slash) => Some(BinaryOp::Divide),
            (8, &Token::Percent) => Some(BinaryOp::Modulo),
            _ => None,
        }
    }

    fn parse_binary(&mut self, level: usize) -> ParseResult<Spanned<Expr>> {
        if level == LEVEL_COUNT {
            return self.parse_unary();
        }
        let mut lhs = self.parse_binary(level + 1)?;
        loop {
            let op = match self.match_operator(level) {
                Some(op) => op,
                None => return Ok(lhs),
            };
            let rhs = self.parse_binary(level + 1)?;
            let span = Spanned::span(&lhs).merge(Spanned::span(&rhs));
            lhs = Spanned::new(
                Expr::Binary(Box::new(lhs), op, Box::new(rhs)),
                span,
            );
        }
    }

    fn match_operator(&mut self, level: usize) -> Option<Spanned<BinaryOp>> {
        let op = match self.peek() {
            Some(tok) => Self::level_operator(level, tok),
            None => None,
        };
        op.map(|op| {
            let span = Spanned::span(&self.advance().unwrap());
            Spanned::new(op, span)
        })
    }

    fn parse_unary(&mut self) -> ParseResult<Spanned<Expr>> {
        let op = match self.peek() {
            Some(&Token::Plus) => Some(UnaryOp::Plus),
            Some(&Token::Minus) => Some(UnaryOp::Minus),
            Some(&Token::Not) => Some(UnaryOp::Not),
            _ => None,
        };
        match op {
            Some(op) => {
                let op_span = Spanned::span(&self.advance().unwrap());
                let operand = self.parse_unary()?;
                let span = op_span.merge(Spanned::span(&operand));
                Ok(Spanned::new(
                    Expr::Unary(Spanned::new(op, op_span), Box::new(operand)),
                    span,
                ))
            }
            None => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Spanned<Expr>> {
        match self.peek() {
            Some(&Token::Number(value)) => {
                let span = Spanned::span(&self.advance().unwrap());
                Ok(Spanned::new(Expr::Number(value), span))
            }
            Some(&Token::Char(value)) => {
                let span = Spanned::span(&self.advance().unwrap());
                Ok(Spanned::new(Expr::Char(value), span))
            }
            Some(&Token::Ident(_)) => {
                let name = self.expect_ident()?;
                if self.check(&Token::LeftParen) {
                    let args = self.parse_args()?;
                    let span = Spanned::span(&name).merge(self.prev_span.unwrap());
                    Ok(Spanned::new(Expr::Call(name, args), span))
                } else {
                    let span = Spanned::span(&name);
                    let name = Spanned::into_value(name);
                    Ok(Spanned::new(Expr::Var(name), span))
                }
            }
            Some(&Token::LeftParen) => {
                let start = Spanned::span(&self.advance().unwrap());
                let inner = self.parse_expr()?;
                let end = self.expect(Token::RightParen)?;
                let span = start.merge(end);
                Ok(Spanned::new(Expr::Parens(Box::new(inner)), span))
            }
            Some(&Token::Error) => {
                let span = Spanned::span(&self.advance().unwrap());
                Ok(Spanned::new(Expr::Error, span))
            }
            _ => self.error("expression"),
        }
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Spanned<Expr>>> {
        let mut args = Vec::new();
        if self.check(&Token::RightParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if !self.check(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RightParen)?;
        Ok(args)
    }
}
