//! Lemon source code parser
//!
//! This module transforms Lemon source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`source`]: Token sources, in-process or on a scanner thread
//! - [`parse`]: Parsing (tokens → AST) with error recovery
//! - [`ast`]: AST node definitions
//!
//! # Error Recovery
//!
//! A syntax error never stops the parse. The failing declaration or
//! statement is replaced by a [`ast::Fiat::Invalid`] marker, the parser skips
//! to the next sequence point (`struct`, `func`, `let`, `pub`, `return`,
//! `break`, `continue`, `goto`, `import`, `for`, `while`, `if`, `switch`,
//! `{` or end of input) and carries on. Every error is kept in
//! [`ast::File::diagnostics`].
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser, one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
pub mod lexer;
pub mod parse;
pub mod source;

mod declarations;
mod expressions;
mod statements;

pub use parse::{parse, parse_with, ParseError, Parser};
