//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure:
//! the error type, the token cursor, the fiat loop with its error recovery,
//! and the [`parse`] entry points.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, fiat loop and recovery
//! - `declarations`: struct, function and variable declarations; types
//! - `statements`: blocks, loops, branches, switches and jump statements
//! - `expressions`: the precedence ladder, postfix chains and literals
//!
//! # Error recovery
//!
//! Every production returns `Result<_, ParseError>` and bails out with `?`.
//! Errors are only caught by the fiat loops ([`Parser::parse_fiat_or_recover`]),
//! one per file and one per block, so an error always unwinds to the start of
//! the fiat it occurred in. The loop records the error, skips tokens up to the
//! next sequence point and leaves a [`Fiat::Invalid`] marker in place of the
//! failed fiat. Partially built nodes are owned by the unwinding stack frames
//! and are dropped on the way out.

use crate::parser::ast::*;
use crate::parser::lexer::{Lexer, Token, TokenKind};
use crate::parser::source::{self, ScanOptions, TokenSource};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, warn};

/// Syntax error recorded for one unrecoverable fiat
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {}: {message}", .location.line)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl ParseError {
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        ParseError {
            message: message.into(),
            location,
        }
    }
}

/// Parse `source` with the in-process lexer.
///
/// Returns the file root and its syntax error count. A file with errors is
/// memory-safe but incomplete, and must not be handed to later phases.
pub fn parse(source: &str, name: &str) -> (File, usize) {
    let file = Parser::new(source).parse_file(name);
    let errors = file.error_count();
    (file, errors)
}

/// Like [`parse`], with the token source chosen by `options`.
pub fn parse_with(source: &str, name: &str, options: &ScanOptions) -> (File, usize) {
    let file = Parser::with_source(source::open(source, options)).parse_file(name);
    let errors = file.error_count();
    (file, errors)
}

/// Deepest nesting of blocks, expressions and types the parser descends into.
pub const MAX_NESTING: usize = 64;

/// Recursive descent parser for Lemon
pub struct Parser<S: TokenSource = Lexer> {
    source: S,
    /// Current token at the front; never empty.
    lookahead: VecDeque<Token>,
    previous: SourceLocation,
    /// Tokens consumed so far; used to detect recovery that made no progress.
    consumed: usize,
    /// Nesting depth of blocks being parsed.
    pub(crate) depth: usize,
    /// Recursion depth of nested productions; bounded by [`MAX_NESTING`].
    nesting: usize,
    errors: Vec<ParseError>,
}

impl Parser<Lexer> {
    pub fn new(source: &str) -> Self {
        Parser::with_source(Lexer::new(source))
    }
}

impl<S: TokenSource> Parser<S> {
    pub fn with_source(mut source: S) -> Self {
        let first = source
            .next()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, SourceLocation::new(1, 1)));
        let mut lookahead = VecDeque::with_capacity(4);
        lookahead.push_back(first);

        Parser {
            source,
            lookahead,
            previous: SourceLocation::new(1, 1),
            consumed: 0,
            depth: 0,
            nesting: 0,
            errors: Vec::new(),
        }
    }

    /// Parse the entire file: fiats up to end of input
    pub fn parse_file(mut self, name: &str) -> File {
        debug!(file = name, "parsing");
        let mut file = File::new(name);

        while !self.is_at_end() {
            let fiat = self.parse_fiat_or_recover(&[]);
            if let Fiat::Stmt(Stmt::Import { alias, location }) = &fiat {
                file.imports.push(Import {
                    alias: alias.clone(),
                    location: *location,
                });
            }
            file.fiats.push(fiat);
        }

        if !self.errors.is_empty() {
            warn!(file = name, errors = self.errors.len(), "syntax errors");
        }
        file.diagnostics = self.errors;
        file
    }

    /// Parse one fiat; on error record it, resynchronize, and return an
    /// `Invalid` marker instead.
    ///
    /// `terminators` are extra tokens to stop at besides sequence points,
    /// such as the `}` closing the enclosing block.
    pub(crate) fn parse_fiat_or_recover(&mut self, terminators: &[TokenKind]) -> Fiat {
        let start = self.consumed;
        let depth = self.depth;
        let mark = self.errors.len();
        let location = self.current_location();

        match self.parse_fiat() {
            Ok(fiat) => fiat,
            Err(err) => {
                // Errors recovered inside the failed fiat went with its nodes
                self.errors.truncate(mark);
                warn!(line = err.location.line, "{}", err.message);
                self.errors.push(err);
                self.depth = depth;

                if self.consumed == start && !self.is_at_end() {
                    self.skip_token();
                }
                self.synchronize(terminators);

                Fiat::Invalid { location }
            }
        }
    }

    /// Parse a declaration or a statement
    fn parse_fiat(&mut self) -> Result<Fiat, ParseError> {
        match self.peek_kind() {
            TokenKind::Pub | TokenKind::Struct | TokenKind::Func | TokenKind::Let => {
                Ok(Fiat::Decl(self.parse_declaration()?))
            }
            _ => Ok(Fiat::Stmt(self.parse_statement()?)),
        }
    }

    /// Skip to the next sequence point or terminator without consuming it.
    fn synchronize(&mut self, terminators: &[TokenKind]) {
        loop {
            let token = self.peek();
            if token.kind.is_sequence_point() || terminators.contains(&token.kind) {
                return;
            }
            if !token.is_well_formed() {
                warn!(line = token.location.line, "skipping {}", token);
            }
            self.skip_token();
        }
    }

    /// Run `production` one nesting level deeper.
    pub(crate) fn nested<T>(
        &mut self,
        production: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error_here("nesting too deep"));
        }
        self.nesting += 1;
        let result = production(self);
        self.nesting -= 1;
        result
    }

    // ===== Helper methods =====

    /// Pull from the source, standing in an `Eof` if it ends early.
    fn pull(&mut self) -> Token {
        let last = self.lookahead.back().map(|t| t.location).unwrap_or(self.previous);
        self.source
            .next()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, last))
    }

    /// Make sure `lookahead[n]` exists, never pulling past `Eof`.
    fn fill(&mut self, n: usize) {
        while self.lookahead.len() <= n {
            if self.lookahead.back().is_some_and(|t| t.kind == TokenKind::Eof) {
                return;
            }
            let token = self.pull();
            self.lookahead.push_back(token);
        }
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.lookahead[0]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.lookahead[0].kind
    }

    /// Kind of the token `n` positions ahead; `Eof` past the end.
    pub(crate) fn peek_ahead(&mut self, n: usize) -> TokenKind {
        self.fill(n);
        self.lookahead
            .get(n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    /// Consume the current token. At end of input the `Eof` stays current.
    pub(crate) fn advance(&mut self) -> Token {
        if self.is_at_end() {
            return self.peek().clone();
        }
        let previous = self.previous;
        let token = self
            .lookahead
            .pop_front()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, previous));
        self.fill(0);
        self.previous = token.location;
        self.consumed += 1;
        token
    }

    fn skip_token(&mut self) {
        self.advance();
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    /// Error at the current token: `"{message}, found {token}"`.
    pub(crate) fn error_here(&self, message: &str) -> ParseError {
        let token = self.peek();
        let found = if token.flags.unterminated_string {
            "an unterminated string literal".to_string()
        } else {
            token.to_string()
        };
        ParseError::new(format!("{}, found {}", message, found), token.location)
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(message))
        }
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect(TokenKind::Semicolon, &format!("expected ';' {ctx}"))
            .map(drop)
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> Result<String, ParseError> {
        if self.check(TokenKind::Identifier) {
            let token = self.advance();
            Ok(token.lexeme.unwrap_or_default())
        } else {
            Err(self.error_here(&format!("expected identifier {ctx}")))
        }
    }
}
