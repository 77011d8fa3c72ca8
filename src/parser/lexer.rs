//! Lexer (tokenizer) for Lemon source code
//!
//! Converts raw source text into [`Token`]s on demand. The [`Lexer`] is a
//! finite, non-restartable iterator: it yields exactly one [`TokenKind::Eof`]
//! token and then `None`.
//!
//! The lexer never fails. Unrecognized characters, malformed numbers and
//! unterminated block comments come out as [`TokenKind::Invalid`] tokens, and
//! an unterminated string comes out as a [`TokenKind::LiteralStr`] token whose
//! flags mark it ill-formed. The parser decides what to do with them.

use super::ast::SourceLocation;
use serde::Serialize;
use std::fmt;

/// Every token type the lexer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Markers
    Invalid,
    Eof,
    Identifier,

    // Literals
    LiteralInt,
    LiteralFloat,
    LiteralStr,

    // Punctuation
    Semicolon,    // ;
    LeftBracket,  // [
    RightBracket, // ]
    LeftParen,    // (
    RightParen,   // )
    LeftBrace,    // {
    RightBrace,   // }
    Dot,          // .
    Tilde,        // ~
    Comma,        // ,
    Colon,        // :

    // Operators
    Equal,      // =
    EqualEqual, // ==
    NotEqual,   // !=
    Not,        // !
    And,        // &&
    Or,         // ||
    Ampersand,  // &
    BitOr,      // |
    BitXor,     // ^
    LShift,     // <<
    RShift,     // >>
    Greater,    // >
    Geq,        // >=
    Less,       // <
    Leq,        // <=
    Add,        // +
    Minus,      // -
    Star,       // *
    Div,        // /
    Mod,        // %

    // Sequence point keywords, file level
    Struct,
    Func,
    Let,

    // Sequence point keywords, block level
    Return,
    Break,
    Continue,
    Goto,
    Import,
    For,
    While,
    If,
    Switch,

    // Regular keywords
    Else,
    Case,
    Default,
    Fallthrough,
    Label,
    Mut,
    Null,
    True,
    False,
    Pub,
    SelfValue,
    Void,
}

impl TokenKind {
    /// Returns the keyword for `word`, if it is one.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "struct" => TokenKind::Struct,
            "func" => TokenKind::Func,
            "let" => TokenKind::Let,
            "return" => TokenKind::Return,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "goto" => TokenKind::Goto,
            "import" => TokenKind::Import,
            "for" => TokenKind::For,
            "while" => TokenKind::While,
            "if" => TokenKind::If,
            "switch" => TokenKind::Switch,
            "else" => TokenKind::Else,
            "case" => TokenKind::Case,
            "default" => TokenKind::Default,
            "fallthrough" => TokenKind::Fallthrough,
            "label" => TokenKind::Label,
            "mut" => TokenKind::Mut,
            "null" => TokenKind::Null,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "pub" => TokenKind::Pub,
            "self" => TokenKind::SelfValue,
            "void" => TokenKind::Void,
            _ => return None,
        };
        Some(kind)
    }

    /// True for tokens that always begin a new declaration or statement.
    ///
    /// The parser resynchronizes on these after a syntax error.
    pub fn is_sequence_point(self) -> bool {
        matches!(
            self,
            TokenKind::Struct
                | TokenKind::Func
                | TokenKind::Let
                | TokenKind::Pub
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Goto
                | TokenKind::Import
                | TokenKind::For
                | TokenKind::While
                | TokenKind::If
                | TokenKind::Switch
                | TokenKind::LeftBrace
                | TokenKind::Eof
        )
    }

    /// True for the literal kinds stored in [`Expr::Lit`](super::ast::Expr::Lit).
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::LiteralInt
                | TokenKind::LiteralFloat
                | TokenKind::LiteralStr
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }

    /// Fixed spelling of punctuation, operators and keywords.
    pub fn symbol(self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Invalid
            | TokenKind::Eof
            | TokenKind::Identifier
            | TokenKind::LiteralInt
            | TokenKind::LiteralFloat
            | TokenKind::LiteralStr => return None,
            TokenKind::Semicolon => ";",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::Dot => ".",
            TokenKind::Tilde => "~",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Equal => "=",
            TokenKind::EqualEqual => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::Not => "!",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Ampersand => "&",
            TokenKind::BitOr => "|",
            TokenKind::BitXor => "^",
            TokenKind::LShift => "<<",
            TokenKind::RShift => ">>",
            TokenKind::Greater => ">",
            TokenKind::Geq => ">=",
            TokenKind::Less => "<",
            TokenKind::Leq => "<=",
            TokenKind::Add => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Div => "/",
            TokenKind::Mod => "%",
            TokenKind::Struct => "struct",
            TokenKind::Func => "func",
            TokenKind::Let => "let",
            TokenKind::Return => "return",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Goto => "goto",
            TokenKind::Import => "import",
            TokenKind::For => "for",
            TokenKind::While => "while",
            TokenKind::If => "if",
            TokenKind::Switch => "switch",
            TokenKind::Else => "else",
            TokenKind::Case => "case",
            TokenKind::Default => "default",
            TokenKind::Fallthrough => "fallthrough",
            TokenKind::Label => "label",
            TokenKind::Mut => "mut",
            TokenKind::Null => "null",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Pub => "pub",
            TokenKind::SelfValue => "self",
            TokenKind::Void => "void",
        };
        Some(text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Invalid => write!(f, "invalid token"),
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::LiteralInt => write!(f, "integer literal"),
            TokenKind::LiteralFloat => write!(f, "float literal"),
            TokenKind::LiteralStr => write!(f, "string literal"),
            other => match other.symbol() {
                Some(symbol) => write!(f, "'{}'", symbol),
                None => write!(f, "{:?}", other),
            },
        }
    }
}

/// Lexical flags attached to every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenFlags {
    pub well_formed: bool,
    /// Only meaningful when the kind is [`TokenKind::LiteralStr`].
    pub unterminated_string: bool,
}

impl Default for TokenFlags {
    fn default() -> Self {
        TokenFlags {
            well_formed: true,
            unterminated_string: false,
        }
    }
}

/// A single lexed token.
///
/// Identifiers, literals and invalid tokens own their lexeme; punctuation and
/// keywords carry `None` since their kind already spells them.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: Option<String>,
    pub location: SourceLocation,
    pub flags: TokenFlags,
}

impl Token {
    pub fn new(kind: TokenKind, location: SourceLocation) -> Self {
        Token {
            kind,
            lexeme: None,
            location,
            flags: TokenFlags::default(),
        }
    }

    pub fn with_lexeme(kind: TokenKind, lexeme: String, location: SourceLocation) -> Self {
        Token {
            kind,
            lexeme: Some(lexeme),
            location,
            flags: TokenFlags::default(),
        }
    }

    fn invalid(lexeme: String, location: SourceLocation) -> Self {
        Token {
            kind: TokenKind::Invalid,
            lexeme: Some(lexeme),
            location,
            flags: TokenFlags {
                well_formed: false,
                unterminated_string: false,
            },
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.kind != TokenKind::Invalid && self.flags.well_formed
    }

    /// Source text of the token: the lexeme if owned, else the fixed spelling.
    pub fn text(&self) -> &str {
        match &self.lexeme {
            Some(lexeme) => lexeme,
            None => self.kind.symbol().unwrap_or(""),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, &self.lexeme) {
            (TokenKind::Identifier, Some(name)) => write!(f, "identifier '{}'", name),
            (TokenKind::LiteralStr, Some(text)) => write!(f, "string literal \"{}\"", text),
            (TokenKind::Invalid, Some(text)) => write!(f, "invalid token '{}'", text),
            (kind, Some(text)) => write!(f, "{} {}", kind, text),
            (kind, None) => write!(f, "{}", kind),
        }
    }
}

/// Lexer for Lemon source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Lex the whole input, `Eof` included.
    pub fn tokenize(self) -> Vec<Token> {
        self.collect()
    }

    /// Produce the next token; `Eof` once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        if let Some(invalid) = self.skip_whitespace_and_comments() {
            return invalid;
        }

        let loc = self.current_location();
        let ch = match self.advance() {
            Some(ch) => ch,
            None => return Token::new(TokenKind::Eof, loc),
        };

        match ch {
            '"' => self.string_literal(loc),
            '0'..='9' => self.number_literal(ch, loc),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(ch, loc),

            '=' => self.either('=', TokenKind::EqualEqual, TokenKind::Equal, loc),
            '!' => self.either('=', TokenKind::NotEqual, TokenKind::Not, loc),
            '>' => {
                if self.peek() == Some('>') {
                    self.advance();
                    Token::new(TokenKind::RShift, loc)
                } else {
                    self.either('=', TokenKind::Geq, TokenKind::Greater, loc)
                }
            }
            '<' => {
                if self.peek() == Some('<') {
                    self.advance();
                    Token::new(TokenKind::LShift, loc)
                } else {
                    self.either('=', TokenKind::Leq, TokenKind::Less, loc)
                }
            }
            '&' => self.either('&', TokenKind::And, TokenKind::Ampersand, loc),
            '|' => self.either('|', TokenKind::Or, TokenKind::BitOr, loc),
            '^' => Token::new(TokenKind::BitXor, loc),
            '+' => Token::new(TokenKind::Add, loc),
            '-' => Token::new(TokenKind::Minus, loc),
            '*' => Token::new(TokenKind::Star, loc),
            '/' => Token::new(TokenKind::Div, loc),
            '%' => Token::new(TokenKind::Mod, loc),
            ';' => Token::new(TokenKind::Semicolon, loc),
            '[' => Token::new(TokenKind::LeftBracket, loc),
            ']' => Token::new(TokenKind::RightBracket, loc),
            '(' => Token::new(TokenKind::LeftParen, loc),
            ')' => Token::new(TokenKind::RightParen, loc),
            '{' => Token::new(TokenKind::LeftBrace, loc),
            '}' => Token::new(TokenKind::RightBrace, loc),
            '.' => Token::new(TokenKind::Dot, loc),
            '~' => Token::new(TokenKind::Tilde, loc),
            ',' => Token::new(TokenKind::Comma, loc),
            ':' => Token::new(TokenKind::Colon, loc),

            _ => Token::invalid(ch.to_string(), loc),
        }
    }

    /// Two-character operator if the next char is `second`, else the single one.
    fn either(
        &mut self,
        second: char,
        double: TokenKind,
        single: TokenKind,
        loc: SourceLocation,
    ) -> Token {
        if self.peek() == Some(second) {
            self.advance();
            Token::new(double, loc)
        } else {
            Token::new(single, loc)
        }
    }

    /// Parse string literal; the lexeme is the raw text between the quotes
    fn string_literal(&mut self, loc: SourceLocation) -> Token {
        let mut text = String::new();

        while let Some(ch) = self.peek() {
            match ch {
                '"' => {
                    self.advance();
                    return Token::with_lexeme(TokenKind::LiteralStr, text, loc);
                }
                '\n' => break,
                '\\' => {
                    text.push(ch);
                    self.advance();
                    if let Some(escaped) = self.peek().filter(|c| *c != '\n') {
                        text.push(escaped);
                        self.advance();
                    }
                }
                _ => {
                    text.push(ch);
                    self.advance();
                }
            }
        }

        let mut token = Token::with_lexeme(TokenKind::LiteralStr, text, loc);
        token.flags = TokenFlags {
            well_formed: false,
            unterminated_string: true,
        };
        token
    }

    /// Parse numeric literal: integer or `digits.digits` float
    fn number_literal(&mut self, first_digit: char, loc: SourceLocation) -> Token {
        let mut text = String::new();
        text.push(first_digit);
        let mut kind = TokenKind::LiteralInt;
        let mut malformed = false;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else if ch == '.' && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
                if kind == TokenKind::LiteralFloat {
                    malformed = true;
                }
                kind = TokenKind::LiteralFloat;
                text.push(ch);
                self.advance();
            } else if ch.is_ascii_alphabetic() || ch == '_' {
                malformed = true;
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if malformed {
            Token::invalid(text, loc)
        } else {
            Token::with_lexeme(kind, text, loc)
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match TokenKind::keyword(&ident) {
            Some(kind) => Token::new(kind, loc),
            None => Token::with_lexeme(TokenKind::Identifier, ident, loc),
        }
    }

    /// Skip whitespace and comments; an unterminated block comment comes
    /// back as an invalid token.
    fn skip_whitespace_and_comments(&mut self) -> Option<Token> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('/') if self.peek_ahead(1) == Some('/') => self.skip_line_comment(),
                Some('/') if self.peek_ahead(1) == Some('*') => {
                    let start = self.current_location();
                    if !self.skip_block_comment() {
                        return Some(Token::invalid("/*".to_string(), start));
                    }
                }
                _ => return None,
            }
        }
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    /// Skip multi-line comment (/* ... */); false if it never closes
    fn skip_block_comment(&mut self) -> bool {
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return true;
            }
            self.advance();
        }

        false
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}
