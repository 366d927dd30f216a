//! FHIRPath lexer
//!
//! Turns an expression string into a token stream. Whitespace and comments
//! (`//` to end of line, `/* ... */`) are skipped. Malformed input becomes
//! an [`TokenKind::Error`] token whose text is the message; the parser
//! converts it into a positioned parse error.

use crate::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.current()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.current() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.current().map(&pred).unwrap_or(false) {
            self.bump();
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Skip whitespace and comments; returns an error message for an
    /// unterminated block comment.
    fn skip_trivia(&mut self) -> Result<(), String> {
        loop {
            while self.current().map(char::is_whitespace).unwrap_or(false) {
                self.bump();
            }
            match (self.current(), self.peek()) {
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.current() {
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                            None => return Err("unterminated block comment".into()),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        self.read_while(|c| c.is_alphanumeric() || c == '_')
    }

    /// Shared escape handling for strings and delimited identifiers.
    fn read_escape(&mut self) -> Result<char, String> {
        match self.bump() {
            Some('\'') => Ok('\''),
            Some('"') => Ok('"'),
            Some('`') => Ok('`'),
            Some('\\') => Ok('\\'),
            Some('/') => Ok('/'),
            Some('f') => Ok('\x0C'),
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('u') => {
                let mut code = 0u32;
                for _ in 0..4 {
                    let digit = self
                        .bump()
                        .and_then(|c| c.to_digit(16))
                        .ok_or("invalid unicode escape")?;
                    code = code * 16 + digit;
                }
                char::from_u32(code).ok_or_else(|| "invalid unicode code point".into())
            }
            Some(other) => Ok(other),
            None => Err("incomplete escape sequence".into()),
        }
    }

    /// Read a quoted run terminated by `quote`, with backslash escapes and
    /// doubled-quote escaping.
    fn read_quoted(&mut self, quote: char, what: &str) -> Result<String, String> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.current() {
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        value.push(quote);
                        self.bump();
                        self.bump();
                    } else {
                        self.bump();
                        return Ok(value);
                    }
                }
                Some('\\') => {
                    self.bump();
                    value.push(self.read_escape()?);
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
                None => return Err(format!("unterminated {what}")),
            }
        }
    }

    fn read_digits(&mut self, count: usize, what: &str) -> Result<String, String> {
        let mut out = String::new();
        for _ in 0..count {
            match self.current() {
                Some(c) if c.is_ascii_digit() => {
                    out.push(c);
                    self.bump();
                }
                _ => return Err(format!("expected {count}-digit {what}")),
            }
        }
        Ok(out)
    }

    /// Number literal; returns the text and whether it carried an `L` suffix.
    fn read_number(&mut self) -> (String, bool) {
        let mut text = self.read_while(|c| c.is_ascii_digit());
        if self.current() == Some('.') && self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            text.push('.');
            self.bump();
            text.push_str(&self.read_while(|c| c.is_ascii_digit()));
            return (text, false);
        }
        if self.current() == Some('L') {
            self.bump();
            return (text, true);
        }
        (text, false)
    }

    /// Date part of a temporal literal: YYYY(-MM(-DD)?)?
    fn read_date_part(&mut self) -> Result<String, String> {
        let mut out = self.read_digits(4, "year")?;
        // The dash only belongs to the date when digits follow (so that
        // `@2015-01-01 - 3` still lexes the subtraction).
        if self.current() == Some('-') && self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.bump();
            out.push('-');
            out.push_str(&self.read_digits(2, "month")?);
            if self.current() == Some('-')
                && self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false)
            {
                self.bump();
                out.push('-');
                out.push_str(&self.read_digits(2, "day")?);
            }
        }
        Ok(out)
    }

    /// Time part of a temporal literal: HH(:MM(:SS(.fff)?)?)?
    fn read_time_part(&mut self) -> Result<String, String> {
        let mut out = self.read_digits(2, "hour")?;
        if self.eat(':') {
            out.push(':');
            out.push_str(&self.read_digits(2, "minute")?);
            if self.eat(':') {
                out.push(':');
                out.push_str(&self.read_digits(2, "second")?);
                if self.current() == Some('.')
                    && self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false)
                {
                    self.bump();
                    out.push('.');
                    out.push_str(&self.read_while(|c| c.is_ascii_digit()));
                }
            }
        }
        Ok(out)
    }

    /// Timezone suffix: Z or +HH:MM / -HH:MM.
    fn read_timezone(&mut self) -> Result<String, String> {
        match self.current() {
            Some('Z') => {
                self.bump();
                Ok("Z".into())
            }
            Some(sign @ ('+' | '-')) => {
                self.bump();
                let hours = self.read_digits(2, "timezone hour")?;
                if !self.eat(':') {
                    return Err("expected ':' in timezone offset".into());
                }
                let minutes = self.read_digits(2, "timezone minute")?;
                Ok(format!("{sign}{hours}:{minutes}"))
            }
            _ => Ok(String::new()),
        }
    }

    /// Temporal literal after `@`.
    fn read_temporal(&mut self) -> Result<(String, TokenKind), String> {
        self.bump(); // '@'
        if self.eat('T') {
            return Ok((self.read_time_part()?, TokenKind::TimeLiteral));
        }
        let date = self.read_date_part()?;
        if !self.eat('T') {
            return Ok((date, TokenKind::DateLiteral));
        }
        // A trailing bare T (e.g. @2015T) is a partial datetime.
        if !self.current().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            return Ok((format!("{date}T"), TokenKind::DateTimeLiteral));
        }
        let time = self.read_time_part()?;
        let tz = self.read_timezone()?;
        Ok((format!("{date}T{time}{tz}"), TokenKind::DateTimeLiteral))
    }

    pub fn next_token(&mut self) -> Token {
        let trivia = self.skip_trivia();
        let (position, line, column) = (self.pos, self.line, self.column);
        let token = |kind, text: &str| Token::new(kind, text, position, line, column);
        let error = |message: String| Token::new(TokenKind::Error, message, position, line, column);

        if let Err(message) = trivia {
            return error(message);
        }
        let Some(c) = self.current() else {
            return token(TokenKind::Eof, "");
        };

        match c {
            '.' => {
                self.bump();
                token(TokenKind::Dot, ".")
            }
            ',' => {
                self.bump();
                token(TokenKind::Comma, ",")
            }
            '(' => {
                self.bump();
                token(TokenKind::OpenParen, "(")
            }
            ')' => {
                self.bump();
                token(TokenKind::CloseParen, ")")
            }
            '[' => {
                self.bump();
                token(TokenKind::OpenBracket, "[")
            }
            ']' => {
                self.bump();
                token(TokenKind::CloseBracket, "]")
            }
            '{' => {
                self.bump();
                token(TokenKind::OpenBrace, "{")
            }
            '}' => {
                self.bump();
                token(TokenKind::CloseBrace, "}")
            }
            '+' => {
                self.bump();
                token(TokenKind::Plus, "+")
            }
            '-' => {
                self.bump();
                token(TokenKind::Minus, "-")
            }
            '*' => {
                self.bump();
                token(TokenKind::Star, "*")
            }
            '/' => {
                self.bump();
                token(TokenKind::Slash, "/")
            }
            '&' => {
                self.bump();
                token(TokenKind::Ampersand, "&")
            }
            '|' => {
                self.bump();
                token(TokenKind::Pipe, "|")
            }
            '=' => {
                self.bump();
                token(TokenKind::Equal, "=")
            }
            '~' => {
                self.bump();
                token(TokenKind::Equivalent, "~")
            }
            '<' => {
                self.bump();
                if self.eat('=') {
                    token(TokenKind::LessEqual, "<=")
                } else {
                    token(TokenKind::Less, "<")
                }
            }
            '>' => {
                self.bump();
                if self.eat('=') {
                    token(TokenKind::GreaterEqual, ">=")
                } else {
                    token(TokenKind::Greater, ">")
                }
            }
            '!' => {
                self.bump();
                if self.eat('=') {
                    token(TokenKind::NotEqual, "!=")
                } else if self.eat('~') {
                    token(TokenKind::NotEquivalent, "!~")
                } else {
                    error("unexpected character '!'".into())
                }
            }
            '\'' => match self.read_quoted('\'', "string literal") {
                Ok(value) => Token::new(TokenKind::Str, value, position, line, column),
                Err(message) => error(message),
            },
            '`' => match self.read_quoted('`', "delimited identifier") {
                Ok(value) => {
                    Token::new(TokenKind::DelimitedIdentifier, value, position, line, column)
                }
                Err(message) => error(message),
            },
            '@' => match self.read_temporal() {
                Ok((value, kind)) => Token::new(kind, value, position, line, column),
                Err(message) => error(message),
            },
            '%' => {
                self.bump();
                // Three reference forms: %name, %`name`, %'name'.
                let result = match self.current() {
                    Some('\'') => self.read_quoted('\'', "variable name"),
                    Some('`') => self.read_quoted('`', "variable name"),
                    Some(c) if c.is_alphabetic() || c == '_' => Ok(self.read_identifier()),
                    _ => Err("expected a variable name after '%'".into()),
                };
                match result {
                    Ok(name) if name.is_empty() => error("empty variable name".into()),
                    Ok(name) => Token::new(TokenKind::Variable, name, position, line, column),
                    Err(message) => error(message),
                }
            }
            '$' => {
                self.bump();
                let name = self.read_identifier();
                match name.as_str() {
                    "this" => token(TokenKind::This, "$this"),
                    "index" => token(TokenKind::Index, "$index"),
                    "total" => token(TokenKind::Total, "$total"),
                    "resource" => token(TokenKind::Resource, "$resource"),
                    _ => error(format!("unknown variable '${name}'")),
                }
            }
            c if c.is_ascii_digit() => {
                let (text, is_long) = self.read_number();
                let kind = if is_long {
                    TokenKind::LongNumber
                } else {
                    TokenKind::Number
                };
                Token::new(kind, text, position, line, column)
            }
            c if c.is_alphabetic() || c == '_' => {
                let word = self.read_identifier();
                let kind = match word.as_str() {
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    "as" => TokenKind::As,
                    "is" => TokenKind::Is,
                    "div" => TokenKind::Div,
                    "mod" => TokenKind::Mod,
                    "in" => TokenKind::In,
                    "contains" => TokenKind::Contains,
                    "and" => TokenKind::And,
                    "or" => TokenKind::Or,
                    "xor" => TokenKind::Xor,
                    "implies" => TokenKind::Implies,
                    _ => TokenKind::Identifier,
                };
                Token::new(kind, word, position, line, column)
            }
            other => {
                self.bump();
                error(format!("unexpected character '{other}'"))
            }
        }
    }
}
