//! Declaration parsing implementation
//!
//! This module handles parsing of declarations, at file scope or inside
//! blocks:
//!
//! - Struct declarations: `struct Name { x: int32; pub y: *int32; }`
//! - Function declarations: `func name(params) return type [for recv] { ... }`
//! - Variable declarations: `let [mut] name: type = value;`
//! - Types: base names, pointers, fixed-length arrays
//!
//! # Grammar
//!
//! ```text
//! decl     ::= "pub"? (struct | func | let ";")
//! struct   ::= "struct" IDENT "{" member* "}"
//! member   ::= "pub"? IDENT ":" type ";"
//! func     ::= "func" IDENT "(" params ")" "return" ("void" | type) ("for" type)? block
//! params   ::= "void" | param ("," param)*
//! param    ::= "mut"? IDENT ":" type
//! let      ::= "let" "mut"? IDENT ":" type "=" expr
//! type     ::= IDENT | "*" type | "[" INT "]" type
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::source::TokenSource;

impl<S: TokenSource> Parser<S> {
    /// Parse a declaration, with an optional leading `pub`
    pub(crate) fn parse_declaration(&mut self) -> Result<Decl, ParseError> {
        let public = self.match_token(TokenKind::Pub);

        let mut decl = match self.peek_kind() {
            TokenKind::Struct => self.parse_struct_declaration()?,
            TokenKind::Func => self.parse_function_declaration()?,
            TokenKind::Let => {
                let decl = self.parse_variable()?;
                self.expect_semicolon("after variable declaration")?;
                decl
            }
            _ => return Err(self.error_here("expected declaration after 'pub'")),
        };

        decl.set_public(public);
        Ok(decl)
    }

    /// Parse struct declaration: struct Name { members }
    ///
    /// Duplicate member names are accepted; they are a semantic error.
    fn parse_struct_declaration(&mut self) -> Result<Decl, ParseError> {
        let location = self.advance().location; // 'struct'
        let name = self.expect_identifier("after 'struct'")?;

        self.expect(TokenKind::LeftBrace, "expected '{' after struct name")?;

        let mut members = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            let member_location = self.current_location();
            let public = self.match_token(TokenKind::Pub);
            let member_name = self.expect_identifier("for struct member")?;
            self.expect(TokenKind::Colon, "expected ':' after member name")?;
            let typ = self.parse_type()?;
            self.expect_semicolon("after struct member")?;

            members.push(Member {
                name: member_name,
                typ,
                public,
                location: member_location,
            });
        }

        self.expect(TokenKind::RightBrace, "expected '}' after struct members")?;

        Ok(Decl::Struct {
            name,
            members,
            public: false,
            location,
        })
    }

    /// Parse function declaration: func name(params) return type [for recv] { body }
    ///
    /// A malformed header skips the rest of the signature and its body, so the
    /// whole function is one invalid fiat.
    fn parse_function_declaration(&mut self) -> Result<Decl, ParseError> {
        let location = self.advance().location; // 'func'

        let (name, params, ret, receiver) = match self.parse_function_header() {
            Ok(header) => header,
            Err(err) => {
                self.skip_function_rest();
                return Err(err);
            }
        };

        let body = self.parse_block()?;

        Ok(Decl::Function {
            name,
            params,
            ret,
            receiver,
            body,
            public: false,
            location,
        })
    }

    #[allow(clippy::type_complexity)]
    fn parse_function_header(
        &mut self,
    ) -> Result<(String, Vec<Param>, Option<Type>, Option<Type>), ParseError> {
        let name = self.expect_identifier("after 'func'")?;

        self.expect(TokenKind::LeftParen, "expected '(' after function name")?;
        let params = self.parse_parameter_list()?;
        self.expect(TokenKind::RightParen, "expected ')' after parameters")?;

        self.expect(
            TokenKind::Return,
            "expected 'return' and a return type after parameters",
        )?;
        let ret = if self.match_token(TokenKind::Void) {
            None
        } else {
            Some(self.parse_type()?)
        };

        let receiver = if self.match_token(TokenKind::For) {
            Some(self.parse_type()?)
        } else {
            None
        };

        Ok((name, params, ret, receiver))
    }

    /// Skip to the end of a function whose header failed: past the signature,
    /// then past a balanced body if one follows.
    fn skip_function_rest(&mut self) {
        loop {
            let kind = self.peek_kind();
            if kind == TokenKind::LeftBrace || kind == TokenKind::Eof {
                break;
            }
            // 'return' and 'for' belong to the signature here
            if kind.is_sequence_point() && kind != TokenKind::Return && kind != TokenKind::For {
                return;
            }
            self.advance();
        }

        let mut open = 0usize;
        while !self.is_at_end() {
            match self.advance().kind {
                TokenKind::LeftBrace => open += 1,
                TokenKind::RightBrace => {
                    open = open.saturating_sub(1);
                    if open == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Parse parameter list: void | [mut] name: type, ...
    fn parse_parameter_list(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();

        if self.match_token(TokenKind::Void) {
            return Ok(params);
        }

        if self.check(TokenKind::RightParen) {
            return Err(self.error_here("a function without parameters must declare 'void'"));
        }

        loop {
            let location = self.current_location();
            let mutable = self.match_token(TokenKind::Mut);
            let name = self.expect_identifier("for parameter")?;
            self.expect(TokenKind::Colon, "expected ':' after parameter name")?;
            let typ = self.parse_type()?;

            params.push(Param {
                name,
                typ,
                mutable,
                location,
            });

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    /// Parse `let [mut] name: type = value` without the trailing `;`.
    ///
    /// Shared by plain declarations and the short declarations of `if`/`for`.
    pub(crate) fn parse_variable(&mut self) -> Result<Decl, ParseError> {
        let location = self.expect(TokenKind::Let, "expected 'let'")?.location;
        let mutable = self.match_token(TokenKind::Mut);
        let name = self.expect_identifier("after 'let'")?;

        self.expect(TokenKind::Colon, "expected ':' after variable name")?;
        let vartype = self.parse_type()?;

        self.expect(TokenKind::Equal, "expected '=' after variable type")?;
        if !self.starts_expression() {
            return Err(self.error_here("missing rvalue in variable declaration"));
        }
        let value = self.parse_expression()?;

        Ok(Decl::Variable {
            name,
            vartype,
            value,
            mutable,
            public: false,
            location,
        })
    }

    /// Parse type: name | *type | [len]type
    pub(crate) fn parse_type(&mut self) -> Result<Type, ParseError> {
        match self.peek_kind() {
            TokenKind::Identifier => Ok(Type::Base(self.expect_identifier("for type")?)),
            TokenKind::Star => {
                self.advance();
                Ok(Type::pointer(self.nested(Self::parse_type)?))
            }
            TokenKind::LeftBracket => {
                self.advance();
                let len = self.parse_array_length()?;
                self.expect(TokenKind::RightBracket, "expected ']' after array length")?;
                Ok(Type::array(len, self.nested(Self::parse_type)?))
            }
            _ => Err(self.error_here("expected type")),
        }
    }

    fn parse_array_length(&mut self) -> Result<u64, ParseError> {
        if !self.check(TokenKind::LiteralInt) {
            return Err(self.error_here("array length must be an integer literal"));
        }
        let token = self.advance();
        token
            .text()
            .parse::<u64>()
            .map_err(|_| ParseError::new("array length out of range", token.location))
    }
}
