use std::{mem, sync::Arc};

use crate::{
    ast::{
        ArgumentList, ArithmeticOp, ComparisonOp, Literal, LogicalOp, Node, Spanned, Token,
        UnaryOp,
    },
    error::SyntaxError,
    lexer::Lexer,
    stack::ensure_sufficient_stack,
};

/// Parses a complete query into a single root [`Node`].
///
/// # Examples
///
/// ```
/// use thyme_query::{parse, Node};
///
/// let node = parse("user.name").unwrap();
/// assert!(matches!(node, Node::MemberAccess { .. }));
/// ```
pub fn parse(query: &str) -> Result<Node, SyntaxError> {
    Parser::new(query)?.parse()
}

pub struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
}

impl Parser {
    pub fn new(query: &str) -> Result<Self, SyntaxError> {
        let tokens = Lexer::new(query).tokenize()?;
        tracing::trace!(count = tokens.len(), "lexed query");
        Ok(Parser {
            tokens,
            position: 0,
        })
    }

    fn current(&self) -> &Token {
        self.peek(0)
    }

    fn peek(&self, offset: usize) -> &Token {
        // tokenize() always ends with Eof, so clamp to it
        let index = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[index].token
    }

    fn offset(&self) -> usize {
        let index = self.position.min(self.tokens.len() - 1);
        self.tokens[index].offset
    }

    fn advance(&mut self) -> Token {
        let index = self.position.min(self.tokens.len() - 1);
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        // Eof is kept in place, every other token is taken exactly once
        if self.tokens[index].token == Token::Eof {
            Token::Eof
        } else {
            mem::replace(&mut self.tokens[index].token, Token::Null)
        }
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(self.current()) == mem::discriminant(token)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.offset())
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        match self.current() {
            Token::Eof => self.error(format!("Expected {}, got end of input", expected)),
            token => self.error(format!("Expected {}, got {:?}", expected, token)),
        }
    }

    fn expect(&mut self, expected: Token, description: &str) -> Result<(), SyntaxError> {
        if !self.check(&expected) {
            return Err(self.unexpected(description));
        }
        self.advance();
        Ok(())
    }

    pub fn parse(&mut self) -> Result<Node, SyntaxError> {
        let node = self.parse_expression()?;
        if !self.check(&Token::Eof) {
            return Err(self.unexpected("end of input"));
        }
        Ok(node)
    }

    pub fn parse_expression(&mut self) -> Result<Node, SyntaxError> {
        ensure_sufficient_stack(|| self.parse_or())
    }

    fn parse_or(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_and()?;

        while self.check(&Token::OrOr) {
            self.advance();
            let right = self.parse_and()?;

            left = Node::Logical {
                left: Box::new(left),
                op: LogicalOp::Or,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_comparison()?;

        while self.check(&Token::AndAnd) {
            self.advance();
            let right = self.parse_comparison()?;

            left = Node::Logical {
                left: Box::new(left),
                op: LogicalOp::And,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_coalesce()?;

        loop {
            let op = match self.current() {
                Token::EqEq => ComparisonOp::Equal,
                Token::EqEqEq => ComparisonOp::Identical,
                Token::NotEq => ComparisonOp::NotEqual,
                Token::NotEqEq => ComparisonOp::NotIdentical,
                Token::Lt => ComparisonOp::Less,
                Token::LtEq => ComparisonOp::LessEqual,
                Token::Gt => ComparisonOp::Greater,
                Token::GtEq => ComparisonOp::GreaterEqual,
                _ => break,
            };

            self.advance();
            let right = self.parse_coalesce()?;

            left = Node::Comparison {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// `a ?? b ?? c` groups as `a ?? (b ?? c)`
    fn parse_coalesce(&mut self) -> Result<Node, SyntaxError> {
        let left = self.parse_ternary()?;

        if self.check(&Token::Coalesce) {
            self.advance();
            let right = ensure_sufficient_stack(|| self.parse_coalesce())?;
            return Ok(Node::Coalesce {
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn parse_ternary(&mut self) -> Result<Node, SyntaxError> {
        let condition = self.parse_additive()?;

        match self.current() {
            Token::Elvis => {
                self.advance();
                let otherwise = ensure_sufficient_stack(|| self.parse_ternary())?;
                Ok(Node::Ternary {
                    condition: Box::new(condition),
                    then: None,
                    otherwise: Box::new(otherwise),
                })
            }
            Token::Question => {
                self.advance();
                // Delimited by ':', so the branch may be any expression
                let then = self.parse_expression()?;
                self.expect(Token::Colon, "':' in ternary expression")?;
                let otherwise = ensure_sufficient_stack(|| self.parse_ternary())?;
                Ok(Node::Ternary {
                    condition: Box::new(condition),
                    then: Some(Box::new(then)),
                    otherwise: Box::new(otherwise),
                })
            }
            _ => Ok(condition),
        }
    }

    fn parse_additive(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current() {
                Token::Plus => ArithmeticOp::Add,
                Token::Minus => ArithmeticOp::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;

            left = Node::Arithmetic {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current() {
                Token::Star => ArithmeticOp::Multiply,
                Token::Slash => ArithmeticOp::Divide,
                Token::Percent => ArithmeticOp::Modulo,
                _ => break,
            };

            self.advance();
            let right = self.parse_unary()?;

            left = Node::Arithmetic {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node, SyntaxError> {
        match self.current() {
            Token::Minus => {
                self.advance();
                // i64::MIN has no positive literal, so fold it before the range check
                if matches!(self.current(), Token::Integer(n) if *n == i64::MIN.unsigned_abs())
                    && !matches!(self.peek(1), Token::Dot | Token::QuestionDot | Token::LBracket)
                {
                    self.advance();
                    return Ok(Node::Literal(Literal::Integer(i64::MIN)));
                }
                let operand = ensure_sufficient_stack(|| self.parse_unary())?;
                // Fold negative number literals
                Ok(match operand {
                    Node::Literal(Literal::Integer(n)) if n != i64::MIN => {
                        Node::Literal(Literal::Integer(-n))
                    }
                    Node::Literal(Literal::Float(n)) => Node::Literal(Literal::Float(-n)),
                    operand => Node::Unary {
                        op: UnaryOp::Negate,
                        operand: Box::new(operand),
                    },
                })
            }
            Token::Bang => {
                self.advance();
                let operand = ensure_sufficient_stack(|| self.parse_unary())?;
                Ok(Node::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                })
            }
            _ => self.parse_postfix(),
        }
    }

    /// Member access, subscripts and method calls, chained left to right
    fn parse_postfix(&mut self) -> Result<Node, SyntaxError> {
        let mut node = self.parse_primary()?;

        loop {
            match self.current() {
                Token::Dot | Token::QuestionDot => {
                    let null_safe = self.check(&Token::QuestionDot);
                    self.advance();

                    if null_safe && self.check(&Token::LBracket) {
                        node = self.parse_subscript(node, true)?;
                        continue;
                    }

                    let name = self.parse_member_name()?;

                    if self.check(&Token::LParen) {
                        let args = self.parse_arguments()?;
                        node = Node::MethodCall {
                            target: Box::new(node),
                            name,
                            args,
                            null_safe,
                        };
                    } else {
                        node = Node::MemberAccess {
                            target: Box::new(node),
                            name,
                            null_safe,
                        };
                    }
                }
                Token::LBracket => node = self.parse_subscript(node, false)?,
                Token::LParen => {
                    return Err(self.error(
                        "Only functions and methods can be called; wrap the expression in a function",
                    ));
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_member_name(&mut self) -> Result<String, SyntaxError> {
        match self.current() {
            Token::Identifier(_) => match self.advance() {
                Token::Identifier(name) => Ok(name),
                _ => unreachable!("checked above"),
            },
            Token::Integer(n) => {
                let name = n.to_string();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("member name after '.'")),
        }
    }

    fn parse_subscript(&mut self, target: Node, null_safe: bool) -> Result<Node, SyntaxError> {
        self.expect(Token::LBracket, "'['")?;
        let key = self.parse_expression()?;
        self.expect(Token::RBracket, "']' after subscript")?;

        Ok(Node::Subscript {
            target: Box::new(target),
            key: Box::new(key),
            null_safe,
        })
    }

    /// Parse primary expressions (atoms): literals, identifiers, calls,
    /// groups, array literals and closures
    fn parse_primary(&mut self) -> Result<Node, SyntaxError> {
        match self.current() {
            Token::Integer(n) => {
                let (n, offset) = (*n, self.offset());
                self.advance();
                i64::try_from(n)
                    .map(|n| Node::Literal(Literal::Integer(n)))
                    .map_err(|_| SyntaxError::new(format!("Integer out of range: {}", n), offset))
            }

            Token::Float(_) | Token::String(_) | Token::Boolean(_) | Token::Null => {
                let literal = match self.advance() {
                    Token::Float(n) => Literal::Float(n),
                    Token::String(s) => Literal::String(s),
                    Token::Boolean(b) => Literal::Boolean(b),
                    _ => Literal::Null,
                };
                Ok(Node::Literal(literal))
            }

            Token::Identifier(_) => {
                let Token::Identifier(name) = self.advance() else {
                    unreachable!("checked above")
                };

                if self.check(&Token::LParen) {
                    let args = self.parse_arguments()?;
                    Ok(Node::GlobalFunctionCall { name, args })
                } else {
                    Ok(Node::Variable { name })
                }
            }

            Token::LParen if self.closure_ahead() => self.parse_closure(),

            Token::LParen => {
                self.advance();
                let node = self.parse_expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(node)
            }

            Token::LBracket => {
                self.advance();
                self.parse_array_literal()
            }

            Token::Eof => Err(self.error("Unexpected end of input")),

            token => Err(self.error(format!("Unexpected token {:?}", token))),
        }
    }

    /// Looks past `(` for `)` or `ident, ident)` followed by `=>`
    fn closure_ahead(&self) -> bool {
        let mut offset = 1;
        if matches!(self.peek(offset), Token::RParen) {
            return matches!(self.peek(offset + 1), Token::Arrow);
        }

        loop {
            if !matches!(self.peek(offset), Token::Identifier(_)) {
                return false;
            }
            offset += 1;

            match self.peek(offset) {
                Token::Comma => offset += 1,
                Token::RParen => return matches!(self.peek(offset + 1), Token::Arrow),
                _ => return false,
            }
        }
    }

    fn parse_closure(&mut self) -> Result<Node, SyntaxError> {
        self.expect(Token::LParen, "'('")?;

        let mut params: Vec<String> = vec![];
        while !self.check(&Token::RParen) {
            let offset = self.offset();
            let Token::Identifier(name) = self.advance() else {
                return Err(SyntaxError::new("Expected closure parameter name", offset));
            };

            if params.contains(&name) {
                return Err(SyntaxError::new(
                    format!("Duplicate closure parameter '{}'", name),
                    offset,
                ));
            }
            params.push(name);

            if !self.check(&Token::RParen) {
                self.expect(Token::Comma, "',' between closure parameters")?;
            }
        }

        self.expect(Token::RParen, "')'")?;
        self.expect(Token::Arrow, "'=>'")?;

        let body = self.parse_expression()?;

        Ok(Node::Closure {
            params,
            body: Arc::new(body),
        })
    }

    fn parse_arguments(&mut self) -> Result<ArgumentList, SyntaxError> {
        self.expect(Token::LParen, "'('")?;

        let mut items = vec![];
        while !self.check(&Token::RParen) {
            items.push(self.parse_expression()?);

            if !self.check(&Token::RParen) {
                self.expect(Token::Comma, "',' or ')' in argument list")?;
            }
        }

        self.expect(Token::RParen, "')'")?;
        Ok(ArgumentList::new(items))
    }

    fn parse_array_literal(&mut self) -> Result<Node, SyntaxError> {
        let mut items = vec![];

        while !self.check(&Token::RBracket) {
            items.push(self.parse_expression()?);

            if !self.check(&Token::RBracket) {
                self.expect(Token::Comma, "',' or ']' in array literal")?;
            }
        }

        self.expect(Token::RBracket, "']'")?;
        Ok(Node::ArrayList { items })
    }
}
