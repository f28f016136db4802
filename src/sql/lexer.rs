/// SQL Lexer - converts a statement into tokens

use super::token::{Token, TokenType};
use crate::error::{Result, SqlError};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    offset: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.token_type, TokenType::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let line = self.line;
        let column = self.column;
        let start = self.offset;

        if self.is_eof() {
            return Ok(Token::new(TokenType::Eof, start, start, line, column));
        }

        let ch = self.current_char();

        // Skip comments
        if ch == '-' && self.peek_char() == Some('-') {
            self.skip_line_comment();
            return self.next_token();
        }

        if ch == '/' && self.peek_char() == Some('*') {
            self.skip_block_comment();
            return self.next_token();
        }

        let token_type = match ch {
            // String literals; double quotes double as identifier quoting
            '\'' | '"' => self.read_string(ch, line, column)?,

            '`' => self.read_quoted_identifier(line, column)?,

            '0'..='9' => self.read_number()?,

            c if c.is_alphabetic() || c == '_' => self.read_identifier(),

            '=' => {
                self.advance();
                if self.current_char() == '=' {
                    self.advance();
                }
                TokenType::Eq
            }
            '!' => {
                self.advance();
                if self.current_char() == '=' {
                    self.advance();
                    TokenType::Ne
                } else {
                    return Err(SqlError::Syntax(format!(
                        "Unexpected character '!' at line {} column {}",
                        line, column
                    )));
                }
            }
            '<' => {
                self.advance();
                if self.current_char() == '=' {
                    self.advance();
                    TokenType::Le
                } else if self.current_char() == '>' {
                    self.advance();
                    TokenType::Ne
                } else {
                    TokenType::Lt
                }
            }
            '>' => {
                self.advance();
                if self.current_char() == '=' {
                    self.advance();
                    TokenType::Ge
                } else {
                    TokenType::Gt
                }
            }
            '+' => {
                self.advance();
                TokenType::Plus
            }
            '-' => {
                self.advance();
                TokenType::Minus
            }
            '*' => {
                self.advance();
                TokenType::Star
            }
            '/' => {
                self.advance();
                TokenType::Slash
            }
            '(' => {
                self.advance();
                TokenType::LParen
            }
            ')' => {
                self.advance();
                TokenType::RParen
            }
            ',' => {
                self.advance();
                TokenType::Comma
            }
            ';' => {
                self.advance();
                TokenType::Semicolon
            }
            '.' => {
                self.advance();
                TokenType::Dot
            }
            _ => {
                return Err(SqlError::Syntax(format!(
                    "Unexpected character '{}' at line {} column {}",
                    ch, line, column
                )));
            }
        };

        Ok(Token::new(token_type, start, self.offset, line, column))
    }

    fn current_char(&self) -> char {
        if self.is_eof() {
            '\0'
        } else {
            self.input[self.position]
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        if !self.is_eof() {
            let ch = self.input[self.position];
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.offset += ch.len_utf8();
            self.position += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn skip_line_comment(&mut self) {
        while !self.is_eof() && self.current_char() != '\n' {
            self.advance();
        }
    }

    // An unterminated block comment runs to the end of the statement
    fn skip_block_comment(&mut self) {
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_eof() {
            if self.current_char() == '*' && self.peek_char() == Some('/') {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }
    }

    fn read_string(&mut self, quote: char, line: usize, column: usize) -> Result<TokenType> {
        self.advance(); // skip opening quote
        let mut value = String::new();

        loop {
            if self.is_eof() {
                return Err(SqlError::Syntax(format!(
                    "Unterminated string at line {} column {}",
                    line, column
                )));
            }
            let ch = self.current_char();
            if ch == quote {
                // A doubled quote is an escaped quote
                if self.peek_char() == Some(quote) {
                    value.push(quote);
                    self.advance();
                    self.advance();
                    continue;
                }
                break;
            }
            if ch == '\\' {
                // Only the active quote is unescaped; other pairs stay verbatim
                self.advance();
                if self.is_eof() {
                    value.push('\\');
                    continue;
                }
                let next = self.current_char();
                if next != quote {
                    value.push('\\');
                }
                value.push(next);
            } else {
                value.push(ch);
            }
            self.advance();
        }

        self.advance(); // skip closing quote
        Ok(TokenType::String(value))
    }

    fn read_quoted_identifier(&mut self, line: usize, column: usize) -> Result<TokenType> {
        self.advance(); // skip opening backtick
        let mut value = String::new();

        while !self.is_eof() && self.current_char() != '`' {
            value.push(self.current_char());
            self.advance();
        }

        if self.is_eof() {
            return Err(SqlError::Syntax(format!(
                "Unterminated quoted identifier at line {} column {}",
                line, column
            )));
        }

        self.advance(); // skip closing backtick
        Ok(TokenType::Identifier(value))
    }

    fn read_number(&mut self) -> Result<TokenType> {
        let mut value = String::new();

        while !self.is_eof() && (self.current_char().is_ascii_digit() || self.current_char() == '.') {
            value.push(self.current_char());
            self.advance();
        }

        // Scientific notation (1.5e10), only when digits follow
        if matches!(self.current_char(), 'e' | 'E') {
            let next = self.peek_char();
            let signed = matches!(next, Some('+') | Some('-'))
                && self
                    .input
                    .get(self.position + 2)
                    .map_or(false, |c| c.is_ascii_digit());
            if next.map_or(false, |c| c.is_ascii_digit()) || signed {
                value.push(self.current_char());
                self.advance();
                if signed {
                    value.push(self.current_char());
                    self.advance();
                }
                while !self.is_eof() && self.current_char().is_ascii_digit() {
                    value.push(self.current_char());
                    self.advance();
                }
            }
        }

        value
            .parse::<f64>()
            .map(TokenType::Number)
            .map_err(|_| SqlError::Syntax(format!("Invalid number: {}", value)))
    }

    fn read_identifier(&mut self) -> TokenType {
        let mut value = String::new();

        while !self.is_eof() {
            let ch = self.current_char();
            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        TokenType::from_keyword(&value).unwrap_or(TokenType::Identifier(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(sql: &str) -> Vec<TokenType> {
        Lexer::new(sql)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn test_lexer_simple_select() {
        let tokens = types("SELECT * FROM users");

        assert_eq!(tokens.len(), 5); // SELECT, *, FROM, users, EOF
        assert_eq!(tokens[0], TokenType::Select);
        assert_eq!(tokens[1], TokenType::Star);
        assert_eq!(tokens[2], TokenType::From);
        assert_eq!(tokens[3], TokenType::Identifier("users".into()));
        assert_eq!(tokens[4], TokenType::Eof);
    }

    #[test]
    fn test_lexer_string_escapes() {
        let tokens = types(r"'it''s' 'O\'Brien' 'a;b'");
        assert_eq!(tokens[0], TokenType::String("it's".into()));
        assert_eq!(tokens[1], TokenType::String("O'Brien".into()));
        assert_eq!(tokens[2], TokenType::String("a;b".into()));
    }

    #[test]
    fn test_lexer_backslashes_stay_literal() {
        let tokens = types(r#"'C:\new\table' 'a\\b' "say \"hi\"" 'x\"y' 'end\\'"#);
        assert_eq!(tokens[0], TokenType::String(r"C:\new\table".into()));
        assert_eq!(tokens[1], TokenType::String(r"a\\b".into()));
        assert_eq!(tokens[2], TokenType::String(r#"say "hi""#.into()));
        assert_eq!(tokens[3], TokenType::String(r#"x\"y"#.into()));
        assert_eq!(tokens[4], TokenType::String(r"end\\".into()));
    }

    #[test]
    fn test_lexer_operators() {
        let tokens = types("= != <> < > <= >= + - * /");
        assert_eq!(
            &tokens[..11],
            &[
                TokenType::Eq,
                TokenType::Ne,
                TokenType::Ne,
                TokenType::Lt,
                TokenType::Gt,
                TokenType::Le,
                TokenType::Ge,
                TokenType::Plus,
                TokenType::Minus,
                TokenType::Star,
                TokenType::Slash,
            ]
        );
    }

    #[test]
    fn test_lexer_comments_skipped() {
        let tokens = types("SELECT * -- this is a comment\nFROM /* block */ users");
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[2], TokenType::From);
    }

    #[test]
    fn test_lexer_numbers() {
        let tokens = types("42 3.5 1e3 2e");
        assert_eq!(tokens[0], TokenType::Number(42.0));
        assert_eq!(tokens[1], TokenType::Number(3.5));
        assert_eq!(tokens[2], TokenType::Number(1000.0));
        assert_eq!(tokens[3], TokenType::Number(2.0));
        assert_eq!(tokens[4], TokenType::Identifier("e".into()));
    }

    #[test]
    fn test_lexer_spans_and_positions() {
        let sql = "SELECT name\n  FROM `my table`";
        let tokens = Lexer::new(sql).tokenize().unwrap();
        assert_eq!(&sql[tokens[1].start..tokens[1].end], "name");
        assert_eq!(tokens[2].line, 2);
        assert_eq!(tokens[2].column, 3);
        assert_eq!(tokens[3].token_type, TokenType::Identifier("my table".into()));
    }

    #[test]
    fn test_lexer_errors() {
        assert!(matches!(Lexer::new("'open").tokenize(), Err(SqlError::Syntax(_))));
        assert!(matches!(Lexer::new("a # b").tokenize(), Err(SqlError::Syntax(_))));
    }
}
