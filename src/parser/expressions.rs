//! Expression parsing implementation
//!
//! This module handles parsing of Lemon expressions by recursive descent,
//! one method per precedence level.
//!
//! # Supported Expressions
//!
//! - Literals: integers, floats, strings, `true`, `false`, `null`
//! - Identifiers and `self`
//! - Binary operators: arithmetic, comparison, logical, bitwise
//! - Unary operators: `-`, `+`, `~`, `!`, `*`, `&`
//! - Casts: `:type: expr`
//! - Postfix: calls `()`, selectors `.`, indexing `[]`
//! - Array literals, with optional `[N] =` index tags
//! - Random-variable literals: `dist ~ (args)`
//!
//! # Precedence
//!
//! From loosest to tightest:
//!
//! ```text
//! =                          right-associative
//! ||
//! &&
//! == != < <= > >=
//! + - | ^
//! * / % << >> &
//! unary, cast
//! postfix
//! ```
//!
//! All binary levels are left-associative.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::source::TokenSource;

const RELATION_OPS: &[TokenKind] = &[
    TokenKind::EqualEqual,
    TokenKind::NotEqual,
    TokenKind::Less,
    TokenKind::Leq,
    TokenKind::Greater,
    TokenKind::Geq,
];

const ADDITIVE_OPS: &[TokenKind] = &[
    TokenKind::Add,
    TokenKind::Minus,
    TokenKind::BitOr,
    TokenKind::BitXor,
];

const TERM_OPS: &[TokenKind] = &[
    TokenKind::Star,
    TokenKind::Div,
    TokenKind::Mod,
    TokenKind::LShift,
    TokenKind::RShift,
    TokenKind::Ampersand,
];

const UNARY_OPS: &[TokenKind] = &[
    TokenKind::Minus,
    TokenKind::Add,
    TokenKind::Tilde,
    TokenKind::Not,
    TokenKind::Star,
    TokenKind::Ampersand,
];

impl<S: TokenSource> Parser<S> {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_assignment)
    }

    /// True if the current token can begin an expression.
    pub(crate) fn starts_expression(&self) -> bool {
        let kind = self.peek_kind();
        kind.is_literal()
            || UNARY_OPS.contains(&kind)
            || matches!(
                kind,
                TokenKind::Identifier
                    | TokenKind::SelfValue
                    | TokenKind::LeftParen
                    | TokenKind::LeftBracket
                    | TokenKind::Colon
            )
    }

    /// Parse assignment (right-associative)
    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let lvalue = self.parse_logical_or()?;

        if self.match_token(TokenKind::Equal) {
            let location = self.previous_location();
            let rvalue = self.nested(Self::parse_assignment)?;
            return Ok(Expr::Assignment {
                lvalue: Box::new(lvalue),
                rvalue: Box::new(rvalue),
                location,
            });
        }

        Ok(lvalue)
    }

    /// Parse logical OR (||)
    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(&[TokenKind::Or], Self::parse_logical_and)
    }

    /// Parse logical AND (&&)
    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(&[TokenKind::And], Self::parse_relation)
    }

    /// Parse equality and comparison (== != < <= > >=)
    fn parse_relation(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(RELATION_OPS, Self::parse_additive)
    }

    /// Parse additive (+ - | ^)
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(ADDITIVE_OPS, Self::parse_term)
    }

    /// Parse multiplicative (* / % << >> &)
    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(TERM_OPS, Self::parse_unary)
    }

    /// One left-associative level: operand (op operand)*
    fn parse_binary(
        &mut self,
        ops: &[TokenKind],
        operand: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut left = operand(self)?;

        while ops.contains(&self.peek_kind()) {
            let token = self.advance();
            let right = operand(self)?;
            left = Expr::Binary {
                op: token.kind,
                left: Box::new(left),
                right: Box::new(right),
                location: token.location,
            };
        }

        Ok(left)
    }

    /// Parse unary operators and casts
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let kind = self.peek_kind();

        if UNARY_OPS.contains(&kind) {
            let location = self.advance().location;
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::Unary {
                op: kind,
                operand: Box::new(operand),
                location,
            });
        }

        if kind == TokenKind::Colon {
            let location = self.advance().location;
            let target = self.parse_type()?;
            self.expect(TokenKind::Colon, "expected ':' after cast type")?;
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::Cast {
                target,
                operand: Box::new(operand),
                location,
            });
        }

        self.parse_postfix()
    }

    /// Parse postfix chain: calls, selectors, indexing
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let location = self.current_location();

            if self.match_token(TokenKind::LeftParen) {
                let args = self.parse_arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    location,
                };
            } else if self.match_token(TokenKind::Dot) {
                let attr = self.expect_identifier("after '.'")?;
                expr = Expr::Selector {
                    name: Box::new(expr),
                    attr,
                    location,
                };
            } else if self.match_token(TokenKind::LeftBracket) {
                let key = self.parse_expression()?;
                self.expect(TokenKind::RightBracket, "expected ']' after index")?;
                expr = Expr::Index {
                    name: Box::new(expr),
                    key: Box::new(key),
                    location,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse argument list after '(' up to and including ')'
    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();

        if self.match_token(TokenKind::RightParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::RightParen, "expected ')' after arguments")?;
        Ok(args)
    }

    /// Parse primary (literals, names, parenthesized expressions, arrays)
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();

        match self.peek_kind() {
            TokenKind::LiteralInt
            | TokenKind::LiteralFloat
            | TokenKind::LiteralStr
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null => {
                if !self.peek().is_well_formed() {
                    return Err(self.error_here("malformed literal"));
                }
                let token = self.advance();
                Ok(Expr::Lit {
                    rep: token.text().to_string(),
                    kind: token.kind,
                    location,
                })
            }
            TokenKind::SelfValue => {
                self.advance();
                Ok(Expr::Ident {
                    name: "self".to_string(),
                    location,
                })
            }
            TokenKind::Identifier => {
                if self.peek_ahead(1) == TokenKind::Tilde {
                    return self.parse_rvar_literal();
                }
                let name = self.expect_identifier("")?;
                Ok(Expr::Ident { name, location })
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RightParen, "expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::LeftBracket => self.parse_array_literal(),
            _ => Err(self.error_here("expected expression")),
        }
    }

    /// Parse random-variable literal: dist ~ (args)
    fn parse_rvar_literal(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        let dist = self.expect_identifier("for distribution")?;
        self.expect(TokenKind::Tilde, "expected '~' after distribution name")?;
        self.expect(TokenKind::LeftParen, "expected '(' after '~'")?;
        let args = self.parse_arguments()?;

        Ok(Expr::RvarLit {
            dist,
            args,
            location,
        })
    }

    /// Parse array literal: [ [N] = a, b, ... ]
    ///
    /// `indices` and `values` always grow together, one slot per entry.
    fn parse_array_literal(&mut self) -> Result<Expr, ParseError> {
        let location = self.advance().location; // '['

        let mut indices = Vec::new();
        let mut values = Vec::new();

        while !self.check(TokenKind::RightBracket) {
            let index = if self.at_index_tag() {
                self.parse_index_tag()?
            } else {
                UNTAGGED
            };
            let value = self.parse_expression()?;

            indices.push(index);
            values.push(value);

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::RightBracket, "expected ']' after array literal")?;

        Ok(Expr::ArrayLit {
            indices,
            values,
            location,
        })
    }

    /// `[` INT `]` `=` starts a tagged entry; anything else is a plain value.
    fn at_index_tag(&mut self) -> bool {
        self.check(TokenKind::LeftBracket)
            && self.peek_ahead(1) == TokenKind::LiteralInt
            && self.peek_ahead(2) == TokenKind::RightBracket
            && self.peek_ahead(3) == TokenKind::Equal
    }

    fn parse_index_tag(&mut self) -> Result<i64, ParseError> {
        self.advance(); // '['
        let token = self.advance();
        let index = token
            .text()
            .parse::<i64>()
            .map_err(|_| ParseError::new("array index out of range", token.location))?;
        self.advance(); // ']'
        self.advance(); // '='
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::lexer::TokenKind;
    use crate::parser::parse::parse;

    /// Initializer of `let v: t = <source>;`
    fn parse_expr(source: &str) -> Expr {
        let (file, errors) = parse(&format!("let v: t = {};", source), "test.lem");
        assert_eq!(errors, 0, "unexpected errors: {:?}", file.diagnostics);
        match file.fiats.into_iter().next() {
            Some(Fiat::Decl(Decl::Variable { value, .. })) => value,
            other => panic!("Expected variable declaration, got {:?}", other),
        }
    }

    fn op_of(expr: &Expr) -> TokenKind {
        match expr {
            Expr::Binary { op, .. } | Expr::Unary { op, .. } => *op,
            other => panic!("Expected operator node, got {:?}", other),
        }
    }

    #[test]
    fn test_term_binds_tighter_than_additive() {
        let expr = parse_expr("1 + 2 * 3");

        match expr {
            Expr::Binary {
                op: TokenKind::Add,
                right,
                ..
            } => assert_eq!(op_of(&right), TokenKind::Star),
            other => panic!("Expected addition, got {:?}", other),
        }
    }

    #[test]
    fn test_binary_left_associative() {
        let expr = parse_expr("a - b - c");

        match expr {
            Expr::Binary { left, right, .. } => {
                assert_eq!(op_of(&left), TokenKind::Minus);
                assert!(matches!(*right, Expr::Ident { ref name, .. } if name == "c"));
            }
            other => panic!("Expected subtraction, got {:?}", other),
        }
    }

    #[test]
    fn test_logical_ladder() {
        let expr = parse_expr("a || b && c == d");

        match expr {
            Expr::Binary {
                op: TokenKind::Or,
                right,
                ..
            } => match *right {
                Expr::Binary {
                    op: TokenKind::And,
                    right,
                    ..
                } => assert_eq!(op_of(&right), TokenKind::EqualEqual),
                other => panic!("Expected conjunction, got {:?}", other),
            },
            other => panic!("Expected disjunction, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_right_associative() {
        let expr = parse_expr("a = b = 1");

        match expr {
            Expr::Assignment { rvalue, .. } => {
                assert!(matches!(*rvalue, Expr::Assignment { .. }))
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_and_cast() {
        let expr = parse_expr(":*int8: &buf");

        match expr {
            Expr::Cast { target, operand, .. } => {
                assert_eq!(target, Type::pointer(Type::base("int8")));
                assert_eq!(op_of(&operand), TokenKind::Ampersand);
            }
            other => panic!("Expected cast, got {:?}", other),
        }
    }

    #[test]
    fn test_postfix_chain() {
        let expr = parse_expr("self.items[i](x, 2)");

        match expr {
            Expr::Call { callee, args, .. } => {
                assert_eq!(args.len(), 2);
                match *callee {
                    Expr::Index { name, .. } => match *name {
                        Expr::Selector { name, attr, .. } => {
                            assert_eq!(attr, "items");
                            assert!(matches!(*name, Expr::Ident { ref name, .. } if name == "self"));
                        }
                        other => panic!("Expected selector, got {:?}", other),
                    },
                    other => panic!("Expected index, got {:?}", other),
                }
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_array_literal_tags() {
        let expr = parse_expr("[ [3] = 1, 2, [0] = 9, ]");

        match expr {
            Expr::ArrayLit {
                indices, values, ..
            } => {
                assert_eq!(indices, vec![3, UNTAGGED, 0]);
                let reps: Vec<&str> = values
                    .iter()
                    .map(|v| match v {
                        Expr::Lit { rep, .. } => rep.as_str(),
                        other => panic!("Expected literal, got {:?}", other),
                    })
                    .collect();
                assert_eq!(reps, vec!["1", "2", "9"]);
            }
            other => panic!("Expected array literal, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_array_is_untagged_value() {
        let expr = parse_expr("[[1], [2] = 3]");

        match expr {
            Expr::ArrayLit {
                indices, values, ..
            } => {
                assert_eq!(indices, vec![UNTAGGED, 2]);
                assert!(matches!(values[0], Expr::ArrayLit { .. }));
            }
            other => panic!("Expected array literal, got {:?}", other),
        }
    }

    #[test]
    fn test_rvar_literal() {
        let expr = parse_expr("normal ~ (0.0, 1.5)");

        match expr {
            Expr::RvarLit { dist, args, .. } => {
                assert_eq!(dist, "normal");
                assert!(matches!(&args[1], Expr::Lit { rep, kind: TokenKind::LiteralFloat, .. } if rep == "1.5"));
            }
            other => panic!("Expected random variable literal, got {:?}", other),
        }
    }

    #[test]
    fn test_keyword_literals() {
        assert!(matches!(parse_expr("null"), Expr::Lit { kind: TokenKind::Null, .. }));
        assert!(matches!(parse_expr("true"), Expr::Lit { ref rep, .. } if rep == "true"));
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let (file, errors) = parse("let s: str = \"abc\nlet t: str = \"ok\";", "test.lem");

        assert_eq!(errors, 1);
        assert!(file.diagnostics[0].message.contains("unterminated"));
        assert!(matches!(&file.fiats[1], Fiat::Decl(d) if d.name() == "t"));
    }
}
