use crate::{
    ast::{Spanned, Token},
    error::SyntaxError,
};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    // A number or keyword right after `.` is a member name (`items.0.1`, `page.null`).
    after_dot: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            after_dot: false,
        }
    }

    /// Lexes the whole input, ending with a single [`Token::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn advance_by(&mut self, count: usize) {
        self.position += count;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.position)
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, SyntaxError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('0') => result.push('\0'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some('u') => {
                            result.push(self.read_unicode_escape()?);
                            continue;
                        }
                        Some(ch) => {
                            return Err(self.error(format!("Invalid escape sequence: \\{}", ch)));
                        }
                        None => {
                            return Err(self.error("Unterminated string: unexpected end after backslash"));
                        }
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(SyntaxError::new("Unterminated string: missing closing quote", start))
    }

    /// Reads `u{XXXX}` after a backslash, leaving the cursor past the `}`.
    fn read_unicode_escape(&mut self) -> Result<char, SyntaxError> {
        self.advance(); // Consume 'u'
        if self.current_char() != Some('{') {
            return Err(self.error("Expected '{' in unicode escape"));
        }
        self.advance();

        let mut digits = String::new();
        while let Some(ch) = self.current_char() {
            if ch == '}' {
                break;
            }
            digits.push(ch);
            self.advance();
        }
        if self.current_char() != Some('}') {
            return Err(self.error("Unterminated unicode escape"));
        }
        self.advance();

        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(format!("Invalid unicode escape: \\u{{{}}}", digits)))
    }

    fn read_number(&mut self) -> Result<Token, SyntaxError> {
        let start = self.position;
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && !self.after_dot
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if is_float {
            number
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| SyntaxError::new(format!("Invalid float: {}", number), start))
        } else {
            number
                .parse::<u64>()
                .map(Token::Integer)
                .map_err(|_| SyntaxError::new(format!("Integer out of range: {}", number), start))
        }
    }

    /// Consumes `len` characters and yields `token`.
    fn symbol(&mut self, len: usize, token: Token) -> Result<Token, SyntaxError> {
        self.advance_by(len);
        Ok(token)
    }

    pub fn next_token(&mut self) -> Result<Spanned, SyntaxError> {
        self.skip_whitespace();
        let offset = self.position;

        let token = match self.current_char() {
            None => Ok(Token::Eof),
            Some('.') => self.symbol(1, Token::Dot),
            Some(',') => self.symbol(1, Token::Comma),
            Some('(') => self.symbol(1, Token::LParen),
            Some(')') => self.symbol(1, Token::RParen),
            Some('[') => self.symbol(1, Token::LBracket),
            Some(']') => self.symbol(1, Token::RBracket),
            Some(':') => self.symbol(1, Token::Colon),
            Some('+') => self.symbol(1, Token::Plus),
            Some('-') => self.symbol(1, Token::Minus),
            Some('*') => self.symbol(1, Token::Star),
            Some('/') => self.symbol(1, Token::Slash),
            Some('%') => self.symbol(1, Token::Percent),
            Some('?') => match self.peek_char(1) {
                Some('?') => self.symbol(2, Token::Coalesce),
                Some(':') => self.symbol(2, Token::Elvis),
                Some('.') => self.symbol(2, Token::QuestionDot),
                _ => self.symbol(1, Token::Question),
            },
            Some('=') => match (self.peek_char(1), self.peek_char(2)) {
                (Some('='), Some('=')) => self.symbol(3, Token::EqEqEq),
                (Some('='), _) => self.symbol(2, Token::EqEq),
                (Some('>'), _) => self.symbol(2, Token::Arrow),
                _ => Err(self.error("Unexpected '=' (did you mean '==' or '=>'?)")),
            },
            Some('!') => match (self.peek_char(1), self.peek_char(2)) {
                (Some('='), Some('=')) => self.symbol(3, Token::NotEqEq),
                (Some('='), _) => self.symbol(2, Token::NotEq),
                _ => self.symbol(1, Token::Bang),
            },
            Some('<') => match self.peek_char(1) {
                Some('=') => self.symbol(2, Token::LtEq),
                _ => self.symbol(1, Token::Lt),
            },
            Some('>') => match self.peek_char(1) {
                Some('=') => self.symbol(2, Token::GtEq),
                _ => self.symbol(1, Token::Gt),
            },
            Some('&') => match self.peek_char(1) {
                Some('&') => self.symbol(2, Token::AndAnd),
                _ => Err(self.error("Unexpected '&' (did you mean '&&'?)")),
            },
            Some('|') => match self.peek_char(1) {
                Some('|') => self.symbol(2, Token::OrOr),
                _ => Err(self.error("Unexpected '|' (did you mean '||'?)")),
            },
            Some('"') => self.read_string('"').map(Token::String),
            Some('\'') => self.read_string('\'').map(Token::String),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();

                Ok(match ident.as_str() {
                    // Member names are never keywords: `page.null`, `user.and`
                    _ if self.after_dot => Token::Identifier(ident),
                    "and" => Token::AndAnd,
                    "or" => Token::OrOr,
                    "true" => Token::Boolean(true),
                    "false" => Token::Boolean(false),
                    "null" => Token::Null,
                    _ => Token::Identifier(ident),
                })
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some(ch) => Err(self.error(format!("Unexpected character '{}'", ch))),
        }?;

        self.after_dot = matches!(token, Token::Dot | Token::QuestionDot);
        Ok(Spanned { token, offset })
    }
}
