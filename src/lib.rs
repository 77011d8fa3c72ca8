//! # Introduction
//!
//! `lemonc` is the front end of a compiler for Lemon, a small statically
//! typed language with structs, pointers, fixed-size arrays, methods and
//! random-variable literals.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST ─┐
//!            ▲                    ├→ Resolver → Program (topological order)
//!            └── imports ─────────┘
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds an AST, recovering from
//!    syntax errors at declaration and statement boundaries.
//! 2. [`resolver`]: follows `import` declarations from a root file, parses
//!    each file once and orders the modules so dependencies come first.
//! 3. [`report`]: renders diagnostics for the command line.
//!
//! Semantic analysis and code generation are not part of this crate.

pub mod parser;
pub mod report;
pub mod resolver;
