// FQL Lexer Implementation
//
// This module implements a lexer that tokenizes filesystem query statements.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::query::error::LexError;

/// FQL Token types
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // Keywords
    SELECT,
    FROM,
    WHERE,
    AND,
    OR,
    NOT,
    LIKE,
    ORDER,
    BY,
    ASC,
    DESC,
    LIMIT,
    GROUP,
    HAVING,
    AS,

    // Aggregate functions
    COUNT,
    SUM,
    AVG,
    MIN,
    MAX,

    // Fields
    NAME,
    PATH,
    SIZE,
    CTIME,
    MTIME,
    ATIME,

    // Dimension functions
    MINUTE,
    HOUR,
    DAY,
    MONTH,
    YEAR,
    FTYPE,

    // Literals
    STRING(String),
    NUMBER(u64),
    DATE(String),
    TIME(String),

    // Paths and aliases
    IDENTIFIER(String),

    // Operators
    EQUALS,       // =
    NotEqual,     // != or <>
    LessThan,     // <
    GreaterThan,  // >
    LessEqual,    // <=
    GreaterEqual, // >=

    // Punctuation
    ASTERISK,   // *
    COMMA,      // ,
    LeftParen,  // (
    RightParen, // )
    SEMICOLON,  // ;

    // Special
    EOF,
    ILLEGAL(String),
}

/// A Token represents a lexical unit of a statement
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub literal: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}({}) at line {}, column {}", self.token_type, self.literal, self.line, self.column)
    }
}

/// Lexer breaking a statement into tokens
pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    ch: Option<char>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer over a statement
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer {
            input: input.chars().peekable(),
            line: 1,
            column: 0,
            ch: None,
        };
        lexer.read_char();
        lexer
    }

    /// Lex the whole input, turning the first illegal token into an error
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            match &token.token_type {
                TokenType::ILLEGAL(reason) => {
                    return Err(LexError {
                        message: reason.clone(),
                        input: token.literal.clone(),
                        line: token.line,
                        column: token.column,
                    });
                }
                TokenType::EOF => {
                    tokens.push(token);
                    return Ok(tokens);
                }
                _ => tokens.push(token),
            }
        }
    }

    /// Read the next character from the input
    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.next();
        self.ch = ch;

        if let Some(c) = ch {
            self.column += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            }
        }

        ch
    }

    /// Peek at the next character without advancing
    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.ch {
            if ch.is_whitespace() {
                self.read_char();
            } else {
                break;
            }
        }
    }

    /// Read a run of word characters starting at the current one
    fn read_word(&mut self) -> String {
        let mut word = String::new();

        if let Some(ch) = self.ch {
            word.push(ch);
        }

        while let Some(next_ch) = self.peek_char() {
            if is_word_char(next_ch) {
                word.push(next_ch);
                self.read_char();
            } else {
                break;
            }
        }

        // Advance past the word
        self.read_char();

        word
    }

    /// Read a string literal delimited by `quote`. Returns `None` when unterminated.
    fn read_string(&mut self, quote: char) -> Option<String> {
        let mut string = String::new();

        // Skip opening quote which is in self.ch
        self.read_char();

        while let Some(ch) = self.ch {
            if ch == quote {
                self.read_char();
                return Some(string);
            }
            string.push(ch);
            self.read_char();
        }

        None
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let mut token = Token {
            token_type: TokenType::EOF,
            literal: String::new(),
            line: self.line,
            column: self.column,
        };

        let Some(ch) = self.ch else {
            return token;
        };

        token.literal = ch.to_string();

        match ch {
            ';' => token.token_type = TokenType::SEMICOLON,
            ',' => token.token_type = TokenType::COMMA,
            '(' => token.token_type = TokenType::LeftParen,
            ')' => token.token_type = TokenType::RightParen,
            '*' => token.token_type = TokenType::ASTERISK,
            '=' => token.token_type = TokenType::EQUALS,
            '!' => {
                if self.peek_char() == Some('=') {
                    self.read_char();
                    token.literal.push('=');
                    token.token_type = TokenType::NotEqual;
                } else {
                    token.token_type = TokenType::ILLEGAL("expected '=' after '!'".to_string());
                }
            }
            '<' => match self.peek_char() {
                Some('=') => {
                    self.read_char();
                    token.literal.push('=');
                    token.token_type = TokenType::LessEqual;
                }
                Some('>') => {
                    self.read_char();
                    token.literal.push('>');
                    token.token_type = TokenType::NotEqual;
                }
                _ => token.token_type = TokenType::LessThan,
            },
            '>' => {
                if self.peek_char() == Some('=') {
                    self.read_char();
                    token.literal.push('=');
                    token.token_type = TokenType::GreaterEqual;
                } else {
                    token.token_type = TokenType::GreaterThan;
                }
            }
            '\'' | '"' => {
                match self.read_string(ch) {
                    Some(value) => {
                        token.literal = format!("{}{}{}", ch, value, ch);
                        token.token_type = TokenType::STRING(value);
                    }
                    None => {
                        token.token_type = TokenType::ILLEGAL("unterminated string literal".to_string());
                    }
                }
                return token; // read_string already advanced
            }
            _ => {
                let word = self.read_word();
                token.token_type = classify_word(&word);
                token.literal = word;
                return token; // read_word already advanced
            }
        }

        self.read_char();
        token
    }
}

/// Characters that may appear in a bare word (paths, aliases, numbers, dates)
fn is_word_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '=' | '(' | ')' | '*' | '<' | '>' | '\'' | '"' | ',' | ';' | '!')
}

/// Decide what a bare word is: number, date, time, keyword or identifier
fn classify_word(word: &str) -> TokenType {
    if word.chars().all(|c| c.is_ascii_digit()) {
        return match word.parse::<u64>() {
            Ok(value) => TokenType::NUMBER(value),
            Err(_) => TokenType::ILLEGAL(format!("number out of range: {}", word)),
        };
    }
    if matches_shape(word, "dddd-dd-dd") {
        return TokenType::DATE(word.to_string());
    }
    if matches_shape(word, "dd:dd:dd") {
        return TokenType::TIME(word.to_string());
    }
    lookup_keyword(word).unwrap_or_else(|| TokenType::IDENTIFIER(word.to_string()))
}

/// `shape` uses `d` for an ASCII digit, every other character must match exactly
fn matches_shape(word: &str, shape: &str) -> bool {
    word.len() == shape.len()
        && word.chars().zip(shape.chars()).all(|(c, s)| match s {
            'd' => c.is_ascii_digit(),
            _ => c == s,
        })
}

/// Case-insensitive keyword lookup
pub fn lookup_keyword(ident: &str) -> Option<TokenType> {
    let token_type = match ident.to_uppercase().as_str() {
        "SELECT" => TokenType::SELECT,
        "FROM" => TokenType::FROM,
        "WHERE" => TokenType::WHERE,
        "AND" => TokenType::AND,
        "OR" => TokenType::OR,
        "NOT" => TokenType::NOT,
        "LIKE" => TokenType::LIKE,
        "ORDER" => TokenType::ORDER,
        "BY" => TokenType::BY,
        "ASC" => TokenType::ASC,
        "DESC" => TokenType::DESC,
        "LIMIT" => TokenType::LIMIT,
        "GROUP" => TokenType::GROUP,
        "HAVING" => TokenType::HAVING,
        "AS" => TokenType::AS,
        "COUNT" => TokenType::COUNT,
        "SUM" => TokenType::SUM,
        "AVG" => TokenType::AVG,
        "MIN" => TokenType::MIN,
        "MAX" => TokenType::MAX,
        "NAME" => TokenType::NAME,
        "PATH" => TokenType::PATH,
        "SIZE" => TokenType::SIZE,
        "CTIME" => TokenType::CTIME,
        "MTIME" => TokenType::MTIME,
        "ATIME" => TokenType::ATIME,
        "MINUTE" => TokenType::MINUTE,
        "HOUR" => TokenType::HOUR,
        "DAY" => TokenType::DAY,
        "MONTH" => TokenType::MONTH,
        "YEAR" => TokenType::YEAR,
        "FTYPE" => TokenType::FTYPE,
        _ => return None,
    };
    Some(token_type)
}
