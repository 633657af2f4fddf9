use crate::error::{JungError, Span};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Question,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // One or two character tokens
    Equal,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,

    // Literals
    Identifier,
    String,
    Integer,
    Double,
    True,
    False,
    Null,

    // Keywords
    Let,
    If,
    Else,
    While,
    For,
    In,
    Fn,
    Return,
    Break,
    Continue,
    Import,
    Try,
    Catch,
    Throw,
    Class,
    New,
    This,
    Print,
    And,
    Or,
    Not,

    // Markers bracketing the token stream of an interpolated string
    InterpBegin,
    InterpEnd,

    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    /// Precomputed value for number tokens; 0.0 otherwise.
    pub number: f64,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span) -> Self {
        Self {
            token_type,
            lexeme,
            number: 0.0,
            span,
        }
    }
}

pub struct Lexer {
    source: String,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: u32,
    start_line: u32,
    keywords: HashMap<&'static str, TokenType>,
}

impl Lexer {
    pub fn new(source: String) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("let", TokenType::Let);
        keywords.insert("if", TokenType::If);
        keywords.insert("else", TokenType::Else);
        keywords.insert("while", TokenType::While);
        keywords.insert("for", TokenType::For);
        keywords.insert("in", TokenType::In);
        keywords.insert("fn", TokenType::Fn);
        keywords.insert("return", TokenType::Return);
        keywords.insert("break", TokenType::Break);
        keywords.insert("continue", TokenType::Continue);
        keywords.insert("import", TokenType::Import);
        keywords.insert("try", TokenType::Try);
        keywords.insert("catch", TokenType::Catch);
        keywords.insert("throw", TokenType::Throw);
        keywords.insert("class", TokenType::Class);
        keywords.insert("new", TokenType::New);
        keywords.insert("this", TokenType::This);
        keywords.insert("print", TokenType::Print);
        keywords.insert("true", TokenType::True);
        keywords.insert("false", TokenType::False);
        keywords.insert("null", TokenType::Null);
        keywords.insert("and", TokenType::And);
        keywords.insert("or", TokenType::Or);
        keywords.insert("not", TokenType::Not);

        // Jungian vocabulary -- each alias maps to the same token kind as its
        // conventional counterpart, so nothing past the lexer knows the
        // second vocabulary exists.
        keywords.insert("perceive", TokenType::Let);
        keywords.insert("dream", TokenType::Fn);
        keywords.insert("individuation", TokenType::Fn);
        keywords.insert("archetype", TokenType::Class);
        keywords.insert("complex", TokenType::Class);
        keywords.insert("confront", TokenType::Try);
        keywords.insert("embrace", TokenType::Catch);
        keywords.insert("reject", TokenType::Throw);
        keywords.insert("project", TokenType::Print);
        keywords.insert("manifest", TokenType::Return);
        keywords.insert("unconscious", TokenType::Null);
        keywords.insert("Self", TokenType::This);
        keywords.insert("emerge", TokenType::New);
        keywords.insert("integrate", TokenType::Import);

        Self {
            source,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            start_line: 1,
            keywords,
        }
    }

    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, JungError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            "".to_string(),
            Span::single(self.current, self.line),
        ));

        Ok(self.tokens.clone())
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) -> Result<(), JungError> {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            '[' => self.add_token(TokenType::LeftBracket),
            ']' => self.add_token(TokenType::RightBracket),
            ',' => self.add_token(TokenType::Comma),
            ':' => self.add_token(TokenType::Colon),
            ';' => self.add_token(TokenType::Semicolon),
            '.' => self.add_token(TokenType::Dot),
            '?' => self.add_token(TokenType::Question),
            '%' => self.add_token(TokenType::Percent),
            '+' => {
                let token_type = if self.match_char('=') {
                    TokenType::PlusEqual
                } else {
                    TokenType::Plus
                };
                self.add_token(token_type);
            }
            '-' => {
                let token_type = if self.match_char('=') {
                    TokenType::MinusEqual
                } else {
                    TokenType::Minus
                };
                self.add_token(token_type);
            }
            '*' => {
                let token_type = if self.match_char('=') {
                    TokenType::StarEqual
                } else {
                    TokenType::Star
                };
                self.add_token(token_type);
            }
            '/' => {
                if self.match_char('/') {
                    // Comment goes until end of line
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else if self.match_char('=') {
                    self.add_token(TokenType::SlashEqual);
                } else {
                    self.add_token(TokenType::Slash);
                }
            }
            '#' => {
                while self.peek() != '\n' && !self.is_at_end() {
                    self.advance();
                }
            }
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(token_type);
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::BangEqual);
                } else {
                    return Err(JungError::lex_error(
                        Span::single(self.start, self.start_line),
                        "Unexpected character: '!'".to_string(),
                    ));
                }
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }
            ' ' | '\r' | '\t' | '\n' => {
                // Whitespace; line counting happens in advance()
            }
            '"' => self.string()?,
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            _ => {
                return Err(JungError::lex_error(
                    Span::single(self.start, self.start_line),
                    format!("Unexpected character: '{}'", c),
                ));
            }
        }

        Ok(())
    }

    fn advance(&mut self) -> char {
        match self.source[self.current..].chars().next() {
            Some(c) => {
                self.current += c.len_utf8();
                if c == '\n' {
                    self.line += 1;
                }
                c
            }
            None => '\0',
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn peek(&self) -> char {
        self.source[self.current..].chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    /// Scan a string literal. A plain literal becomes one string token; a
    /// literal containing `${...}` becomes an InterpBegin marker, alternating
    /// string and expression tokens, and an InterpEnd marker. The opening
    /// quote has already been consumed.
    fn string(&mut self) -> Result<(), JungError> {
        let mut literal = String::new();
        let mut has_interp = false;

        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\\' {
                self.advance();
                if self.is_at_end() {
                    break;
                }
                let escaped = self.advance();
                match escaped {
                    'n' => literal.push('\n'),
                    't' => literal.push('\t'),
                    '"' => literal.push('"'),
                    '\\' => literal.push('\\'),
                    '$' => literal.push('$'),
                    other => literal.push(other),
                }
            } else if self.peek() == '$' && self.peek_next() == '{' {
                if !has_interp {
                    has_interp = true;
                    self.tokens.push(Token::new(
                        TokenType::InterpBegin,
                        "".to_string(),
                        Span::single(self.start, self.start_line),
                    ));
                }
                if !literal.is_empty() {
                    self.tokens.push(Token::new(
                        TokenType::String,
                        std::mem::take(&mut literal),
                        Span::new(self.start, self.current, self.start_line),
                    ));
                }
                self.advance(); // $
                self.advance(); // {
                self.lex_interpolation()?;
            } else {
                literal.push(self.advance());
            }
        }

        if self.is_at_end() {
            return Err(JungError::lex_error(
                Span::new(self.start, self.current, self.start_line),
                "Unterminated string".to_string(),
            ));
        }

        // Consume the closing "
        self.advance();

        if has_interp {
            if !literal.is_empty() {
                self.tokens.push(Token::new(
                    TokenType::String,
                    literal,
                    Span::new(self.start, self.current, self.start_line),
                ));
            }
            self.tokens.push(Token::new(
                TokenType::InterpEnd,
                "".to_string(),
                Span::single(self.current.saturating_sub(1), self.line),
            ));
        } else {
            self.tokens.push(Token::new(
                TokenType::String,
                literal,
                Span::new(self.start, self.current, self.start_line),
            ));
        }

        Ok(())
    }

    /// Lex the expression inside `${...}` with a nested lexer and splice its
    /// tokens inline, shifted to this source's positions. Nested braces are
    /// part of the expression; the first unmatched `}` closes it.
    fn lex_interpolation(&mut self) -> Result<(), JungError> {
        let expr_start = self.current;
        let expr_line = self.line;
        let mut depth = 1usize;

        while !self.is_at_end() {
            match self.peek() {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(JungError::lex_error(
                Span::new(self.start, self.current, self.start_line),
                "Unterminated string interpolation".to_string(),
            ));
        }

        let expr_end = self.current;
        self.advance(); // }

        let shift = |mut span: Span| {
            span.start += expr_start;
            span.end += expr_start;
            span.line += expr_line - 1;
            span
        };

        let mut sub = Lexer::new(self.source[expr_start..expr_end].to_string());
        let sub_tokens = sub.scan_tokens().map_err(|mut err| {
            err.span = shift(err.span);
            err
        })?;

        for mut token in sub_tokens {
            if token.token_type == TokenType::Eof {
                break;
            }
            token.span = shift(token.span);
            self.tokens.push(token);
        }

        Ok(())
    }

    fn number(&mut self) -> Result<(), JungError> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // Fractional part requires a digit after the dot
        let mut is_double = false;
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_double = true;
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let number_slice = &self.source[self.start..self.current];
        let span = Span::new(self.start, self.current, self.start_line);

        let (token_type, value) = if is_double {
            let value = number_slice.parse::<f64>().map_err(|_| {
                JungError::lex_error(span.clone(), format!("Invalid double: {}", number_slice))
            })?;
            (TokenType::Double, value)
        } else {
            let value = number_slice.parse::<i64>().map_err(|_| {
                JungError::lex_error(span.clone(), format!("Invalid integer: {}", number_slice))
            })?;
            (TokenType::Integer, value as f64)
        };

        let mut token = Token::new(token_type, number_slice.to_string(), span);
        token.number = value;
        self.tokens.push(token);
        Ok(())
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = &self.source[self.start..self.current];
        let token_type = self
            .keywords
            .get(text)
            .copied()
            .unwrap_or(TokenType::Identifier);

        self.add_token(token_type);
    }

    fn add_token(&mut self, token_type: TokenType) {
        let text = self.source[self.start..self.current].to_string();
        self.tokens.push(Token::new(
            token_type,
            text,
            Span::new(self.start, self.current, self.start_line),
        ));
    }
}
