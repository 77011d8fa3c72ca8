//! Statement parsing implementation
//!
//! This module handles parsing of all Lemon statement types:
//!
//! - Compound statements: `{ ... }`
//! - Control flow: `if`, `while`, `for`, `switch`
//! - Jump statements: `return`, `break`, `continue`, `goto`, `fallthrough`
//! - Labels and imports
//! - Expression statements: calls, assignments
//!
//! # Grammar
//!
//! ```text
//! stmt   ::= block | for | while | switch | if | return | "break" ";"
//!          | "continue" ";" | "goto" IDENT ";" | "label" IDENT ":"
//!          | "fallthrough" ";" | import | expr ";"
//! block  ::= "{" fiat* "}"
//! for    ::= "for" (let | expr) ";" expr ";" expr block
//! while  ::= "while" expr block
//! if     ::= "if" (let ";")? expr block ("else" (if | block))?
//! switch ::= "switch" expr "{" (("case" expr | "default") ":" fiat*)* "}"
//! import ::= "import" STRING ";"
//! ```
//!
//! Blocks and case bodies run their own fiat loop, so an error inside one
//! is recovered there and the enclosing statement still gets built.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::source::TokenSource;

const BLOCK_END: &[TokenKind] = &[TokenKind::RightBrace];
const CASE_END: &[TokenKind] = &[TokenKind::RightBrace, TokenKind::Case, TokenKind::Default];

impl<S: TokenSource> Parser<S> {
    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => {
                let location = self.advance().location;
                self.expect_semicolon("after 'break'")?;
                Ok(Stmt::Break { location })
            }
            TokenKind::Continue => {
                let location = self.advance().location;
                self.expect_semicolon("after 'continue'")?;
                Ok(Stmt::Continue { location })
            }
            TokenKind::Fallthrough => {
                let location = self.advance().location;
                self.expect_semicolon("after 'fallthrough'")?;
                Ok(Stmt::Fallthrough { location })
            }
            TokenKind::Goto => {
                let location = self.advance().location;
                let label = self.expect_identifier("after 'goto'")?;
                self.expect_semicolon("after goto label")?;
                Ok(Stmt::Goto { label, location })
            }
            TokenKind::Label => {
                let location = self.advance().location;
                let name = self.expect_identifier("after 'label'")?;
                self.expect(TokenKind::Colon, "expected ':' after label name")?;
                Ok(Stmt::Label { name, location })
            }
            TokenKind::Import => self.parse_import(),
            _ => {
                let location = self.current_location();
                let expr = self.parse_expression()?;
                self.expect_semicolon("after expression")?;
                Ok(Stmt::Expr { expr, location })
            }
        }
    }

    /// Parse block: { fiats }
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.nested(Self::parse_block_body)
    }

    fn parse_block_body(&mut self) -> Result<Block, ParseError> {
        let location = self.expect(TokenKind::LeftBrace, "expected '{'")?.location;
        self.depth += 1;

        let mut fiats = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            fiats.push(self.parse_fiat_or_recover(BLOCK_END));
        }

        self.expect(TokenKind::RightBrace, "expected '}' to close block")?;
        self.depth -= 1;

        Ok(Block { fiats, location })
    }

    /// Parse for loop: for init; cond; post { body }
    fn parse_for_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance().location; // 'for'

        let init = if self.check(TokenKind::Let) {
            ForInit::Decl(Box::new(self.parse_variable()?))
        } else {
            ForInit::Expr(self.parse_expression()?)
        };
        self.expect_semicolon("after for-loop initializer")?;

        let cond = self.parse_expression()?;
        self.expect_semicolon("after for-loop condition")?;

        let post = self.parse_expression()?;
        let body = self.parse_block()?;

        Ok(Stmt::For {
            init,
            cond,
            post,
            body,
            location,
        })
    }

    /// Parse while loop: while cond { body }
    fn parse_while_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance().location; // 'while'
        let cond = self.parse_expression()?;
        let body = self.parse_block()?;

        Ok(Stmt::While {
            cond,
            body,
            location,
        })
    }

    /// Parse if statement: if [let ...;] cond { pass } [else (if ... | { fail })]
    fn parse_if_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance().location; // 'if'

        let shortvar = if self.check(TokenKind::Let) {
            let decl = self.parse_variable()?;
            self.expect_semicolon("after short variable declaration")?;
            Some(Box::new(decl))
        } else {
            None
        };

        let cond = self.parse_expression()?;
        let pass = self.parse_block()?;

        let fail = if self.match_token(TokenKind::Else) {
            let stmt = if self.check(TokenKind::If) {
                self.nested(Self::parse_if_statement)?
            } else if self.check(TokenKind::LeftBrace) {
                Stmt::Block(self.parse_block()?)
            } else {
                return Err(self.error_here("expected 'if' or '{' after 'else'"));
            };
            Some(Box::new(stmt))
        } else {
            None
        };

        Ok(Stmt::Branch {
            shortvar,
            cond,
            pass,
            fail,
            location,
        })
    }

    /// Parse switch statement: switch expr { case expr: ... default: ... }
    fn parse_switch_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance().location; // 'switch'
        let controller = self.parse_expression()?;

        self.expect(TokenKind::LeftBrace, "expected '{' after switch expression")?;

        let mut tests = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            tests.push(self.nested(Self::parse_switch_case)?);
        }

        self.expect(TokenKind::RightBrace, "expected '}' after switch cases")?;

        Ok(Stmt::Switch {
            controller,
            tests,
            location,
        })
    }

    fn parse_switch_case(&mut self) -> Result<Test, ParseError> {
        let location = self.current_location();

        let cond = match self.peek_kind() {
            TokenKind::Case => {
                self.advance();
                Some(self.parse_expression()?)
            }
            TokenKind::Default => {
                self.advance();
                None
            }
            _ => return Err(self.error_here("expected 'case' or 'default'")),
        };
        self.expect(TokenKind::Colon, "expected ':' after case label")?;

        // The case body is an implicit block ending at the next label or '}'
        self.depth += 1;
        let mut fiats = Vec::new();
        while !matches!(
            self.peek_kind(),
            TokenKind::Case | TokenKind::Default | TokenKind::RightBrace | TokenKind::Eof
        ) {
            fiats.push(self.parse_fiat_or_recover(CASE_END));
        }
        self.depth -= 1;

        Ok(Test {
            cond,
            pass: Block { fiats, location },
            location,
        })
    }

    /// Parse return: return [expr];
    fn parse_return_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance().location; // 'return'

        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon("after return value")?;

        Ok(Stmt::Return { value, location })
    }

    /// Parse import: import "path";
    fn parse_import(&mut self) -> Result<Stmt, ParseError> {
        let location = self.advance().location; // 'import'
        if self.depth > 0 {
            return Err(ParseError::new(
                "'import' is only allowed at file scope",
                location,
            ));
        }

        if !self.check(TokenKind::LiteralStr) || !self.peek().is_well_formed() {
            return Err(self.error_here("expected import path string"));
        }
        let path = self.advance();
        let alias = path.lexeme.unwrap_or_default();
        if alias.is_empty() {
            return Err(ParseError::new("empty import path", path.location));
        }

        self.expect_semicolon("after import")?;
        Ok(Stmt::Import { alias, location })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::lexer::TokenKind;
    use crate::parser::parse::parse;

    /// Body of the single function in `source`.
    fn function_body(source: &str) -> (Block, usize) {
        let (file, errors) = parse(source, "test.lem");
        match file.fiats.into_iter().next() {
            Some(Fiat::Decl(Decl::Function { body, .. })) => (body, errors),
            other => panic!("Expected function declaration, got {:?}", other),
        }
    }

    fn wrap(body: &str) -> String {
        format!("func f(void) return void {{ {} }}", body)
    }

    #[test]
    fn test_jump_statements() {
        let (body, errors) =
            function_body(&wrap("label top: break; continue; fallthrough; goto top; return;"));

        assert_eq!(errors, 0);
        assert!(matches!(&body.fiats[0], Fiat::Stmt(Stmt::Label { name, .. }) if name == "top"));
        assert!(matches!(body.fiats[1], Fiat::Stmt(Stmt::Break { .. })));
        assert!(matches!(body.fiats[2], Fiat::Stmt(Stmt::Continue { .. })));
        assert!(matches!(body.fiats[3], Fiat::Stmt(Stmt::Fallthrough { .. })));
        assert!(matches!(&body.fiats[4], Fiat::Stmt(Stmt::Goto { label, .. }) if label == "top"));
        assert!(matches!(
            body.fiats[5],
            Fiat::Stmt(Stmt::Return { value: None, .. })
        ));
    }

    #[test]
    fn test_for_loop_with_declaration() {
        let (body, errors) =
            function_body(&wrap("for let mut i: int32 = 0; i < 10; i = i + 1 { f(i); }"));

        assert_eq!(errors, 0);
        match &body.fiats[0] {
            Fiat::Stmt(Stmt::For {
                init, cond, post, body, ..
            }) => {
                assert!(matches!(init, ForInit::Decl(d) if d.name() == "i"));
                assert!(matches!(cond, Expr::Binary { op: TokenKind::Less, .. }));
                assert!(matches!(post, Expr::Assignment { .. }));
                assert_eq!(body.fiats.len(), 1);
            }
            other => panic!("Expected for loop, got {:?}", other),
        }
    }

    #[test]
    fn test_if_else_chain() {
        let (body, errors) = function_body(&wrap(
            "if let n: int32 = g(); n > 0 { } else if n < 0 { } else { return; }",
        ));

        assert_eq!(errors, 0);
        match &body.fiats[0] {
            Fiat::Stmt(Stmt::Branch { shortvar, fail, .. }) => {
                assert!(shortvar.is_some());
                match fail.as_deref() {
                    Some(Stmt::Branch {
                        shortvar: None,
                        fail: Some(last),
                        ..
                    }) => assert!(matches!(**last, Stmt::Block(_))),
                    other => panic!("Expected else-if branch, got {:?}", other),
                }
            }
            other => panic!("Expected branch, got {:?}", other),
        }
    }

    #[test]
    fn test_switch_cases() {
        let (body, errors) = function_body(&wrap(
            "switch x { case 1: f(); fallthrough; case 2: default: g(); }",
        ));

        assert_eq!(errors, 0);
        match &body.fiats[0] {
            Fiat::Stmt(Stmt::Switch { tests, .. }) => {
                assert_eq!(tests.len(), 3);
                assert_eq!(tests[0].pass.fiats.len(), 2);
                assert!(tests[1].pass.fiats.is_empty());
                assert!(tests[2].cond.is_none());
            }
            other => panic!("Expected switch, got {:?}", other),
        }
    }

    #[test]
    fn test_error_in_case_body_recovers_at_next_case() {
        let (body, errors) =
            function_body(&wrap("switch x { case 1: f(; case 2: g(); }"));

        assert_eq!(errors, 1);
        match &body.fiats[0] {
            Fiat::Stmt(Stmt::Switch { tests, .. }) => {
                assert_eq!(tests.len(), 2);
                assert!(matches!(tests[0].pass.fiats[0], Fiat::Invalid { .. }));
                assert_eq!(tests[1].pass.fiats.len(), 1);
            }
            other => panic!("Expected switch, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_block_recovery() {
        let (body, errors) = function_body(&wrap("let x: int32 = ; return 1;"));

        assert_eq!(errors, 1);
        assert_eq!(body.fiats.len(), 2);
        assert!(matches!(body.fiats[0], Fiat::Invalid { .. }));
        assert!(matches!(
            body.fiats[1],
            Fiat::Stmt(Stmt::Return { value: Some(_), .. })
        ));
    }

    #[test]
    fn test_import_rejected_inside_block() {
        let (file, errors) = parse(&wrap("import \"io\";"), "test.lem");

        assert_eq!(errors, 1);
        assert!(file.imports.is_empty());
        assert!(file.diagnostics[0].message.contains("file scope"));
    }

    #[test]
    fn test_empty_import_path() {
        let (file, errors) = parse("import \"\";", "test.lem");

        assert_eq!(errors, 1);
        assert!(file.imports.is_empty());
    }

    #[test]
    fn test_unclosed_block_reports_once() {
        let (file, errors) = parse("func f(void) return void { let x: int32 = 1;", "test.lem");

        assert_eq!(errors, 1);
        assert_eq!(file.invalid_count(), 1);
    }
}
