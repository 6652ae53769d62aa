//! Expression parsing implementation
//!
//! This module handles parsing of expressions using one recursive descent
//! method per precedence level.
//!
//! # Supported Expressions
//!
//! - Literals: integers, floats, strings (adjacent literals concatenate),
//!   `True`, `False`, `None`
//! - Names, list displays `[a, b]`, tuples `(a, b)` and bare `a, b`
//! - Arithmetic: `+ - * / // % **`, unary `+ -`
//! - Boolean: `and`, `or`, `not`
//! - Comparisons (chainable): `== != < <= > >= in not in is is not`
//! - Conditional expressions: `a if cond else b`
//! - Postfix: calls `f(x)`, subscripts `a[i]`, attributes `a.b`
//!
//! # Precedence (lowest to highest)
//!
//! ```text
//! test        ::= or_test ['if' or_test 'else' test]
//! or_test     ::= and_test ('or' and_test)*
//! and_test    ::= not_test ('and' not_test)*
//! not_test    ::= 'not' not_test | comparison
//! comparison  ::= arith (comp_op arith)*
//! arith       ::= term (('+'|'-') term)*
//! term        ::= factor (('*'|'/'|'//'|'%') factor)*
//! factor      ::= ('+'|'-') factor | power
//! power       ::= atom_expr ['**' factor]
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use std::rc::Rc;

impl Parser {
    /// Parse `test (',' test)* [',']`, producing a tuple when a comma is present
    pub(crate) fn parse_testlist(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_test()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let location = *first.location();
        let mut elts = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if !self.starts_expression() {
                break;
            }
            elts.push(self.parse_test()?);
        }

        Ok(Expr::Tuple { elts, location })
    }

    /// Assignment target in `for`: binds tighter than comparisons so `in` is not consumed
    pub(crate) fn parse_target_list(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_target()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let location = *first.location();
        let mut elts = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if !self.starts_expression() {
                break;
            }
            elts.push(self.parse_target()?);
        }

        Ok(Expr::Tuple { elts, location })
    }

    pub(crate) fn parse_target(&mut self) -> Result<Expr, ParseError> {
        self.parse_arith()
    }

    /// Parse a full expression including conditional expressions
    pub(crate) fn parse_test(&mut self) -> Result<Expr, ParseError> {
        let body = self.parse_or_test()?;

        if self.match_token(&TokenKind::If) {
            let test = self.parse_or_test()?;
            self.expect_token(&TokenKind::Else, "Expected 'else' in conditional expression")?;
            let orelse = self.parse_test()?;
            let location = *body.location();
            return Ok(Expr::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
                location,
            });
        }

        Ok(body)
    }

    /// Whether the current token can begin an expression
    pub(crate) fn starts_expression(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Str(_)
                | TokenKind::Ident(_)
                | TokenKind::TrueKw
                | TokenKind::FalseKw
                | TokenKind::NoneKw
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Not
        )
    }

    /// Parse logical OR
    fn parse_or_test(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_and_test()?;
        if !self.check(&TokenKind::Or) {
            return Ok(first);
        }

        let location = *first.location();
        let mut values = vec![first];
        while self.match_token(&TokenKind::Or) {
            values.push(self.parse_and_test()?);
        }

        Ok(Expr::BoolOp {
            op: BoolOp::Or,
            values,
            location,
        })
    }

    /// Parse logical AND
    fn parse_and_test(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_not_test()?;
        if !self.check(&TokenKind::And) {
            return Ok(first);
        }

        let location = *first.location();
        let mut values = vec![first];
        while self.match_token(&TokenKind::And) {
            values.push(self.parse_not_test()?);
        }

        Ok(Expr::BoolOp {
            op: BoolOp::And,
            values,
            location,
        })
    }

    /// Parse logical NOT
    fn parse_not_test(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        if self.match_token(&TokenKind::Not) {
            let operand = self.parse_not_test()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                location,
            });
        }

        self.parse_comparison()
    }

    /// Parse a (possibly chained) comparison
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_arith()?;

        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while let Some(op) = self.comparison_operator() {
            ops.push(op);
            comparators.push(self.parse_arith()?);
        }

        if ops.is_empty() {
            return Ok(left);
        }

        let location = *left.location();
        Ok(Expr::Compare {
            left: Box::new(left),
            ops,
            comparators,
            location,
        })
    }

    /// Consume a comparison operator if one is next (two tokens for `not in` / `is not`)
    fn comparison_operator(&mut self) -> Option<CmpOp> {
        let op = match self.peek_kind() {
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::NotEq => CmpOp::NotEq,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Le => CmpOp::LtE,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::Ge => CmpOp::GtE,
            TokenKind::In => CmpOp::In,
            TokenKind::Not if matches!(self.peek_ahead(1), Some(TokenKind::In)) => {
                self.advance();
                CmpOp::NotIn
            }
            TokenKind::Is => {
                if matches!(self.peek_ahead(1), Some(TokenKind::Not)) {
                    self.advance();
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                }
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    /// Parse addition and subtraction
    pub(crate) fn parse_arith(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            let location = *left.location();
            left = Expr::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    /// Parse multiplication, division and modulo
    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::DoubleSlash => BinOp::FloorDiv,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            let location = *left.location();
            left = Expr::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    /// Parse unary plus and minus
    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.parse_factor()?;

        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
            location,
        })
    }

    /// Parse exponentiation (right-associative, binds tighter than unary minus on the left)
    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_atom_expr()?;

        if self.match_token(&TokenKind::DoubleStar) {
            let exponent = self.parse_factor()?;
            let location = *base.location();
            return Ok(Expr::BinOp {
                left: Box::new(base),
                op: BinOp::Pow,
                right: Box::new(exponent),
                location,
            });
        }

        Ok(base)
    }

    /// Parse an atom followed by any number of call, subscript and attribute trailers
    fn parse_atom_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;

        loop {
            let location = *expr.location();
            if self.match_token(&TokenKind::LParen) {
                let args = self.parse_call_arguments()?;
                expr = Expr::Call {
                    func: Box::new(expr),
                    args,
                    location,
                };
            } else if self.match_token(&TokenKind::LBracket) {
                let index = self.parse_testlist()?;
                self.expect_token(&TokenKind::RBracket, "Expected ']' after subscript")?;
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                    location,
                };
            } else if self.match_token(&TokenKind::Dot) {
                let attr = self.expect_identifier()?;
                expr = Expr::Attribute {
                    value: Box::new(expr),
                    attr,
                    location,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse positional call arguments up to and including ')'
    fn parse_call_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();

        while !self.check(&TokenKind::RParen) {
            if matches!(self.peek_kind(), TokenKind::Ident(_))
                && matches!(self.peek_ahead(1), Some(TokenKind::Eq))
            {
                return Err(self.error_here("Keyword arguments are not supported"));
            }
            args.push(self.parse_test()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.expect_token(&TokenKind::RParen, "Expected ')' after arguments")?;
        Ok(args)
    }

    /// Parse primary expressions
    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();

        let constant = match self.peek_kind() {
            TokenKind::Int(n) => Some(Constant::Int(*n)),
            TokenKind::Float(x) => Some(Constant::Float(*x)),
            TokenKind::TrueKw => Some(Constant::Bool(true)),
            TokenKind::FalseKw => Some(Constant::Bool(false)),
            TokenKind::NoneKw => Some(Constant::None),
            _ => None,
        };
        if let Some(value) = constant {
            self.advance();
            return Ok(Expr::Constant { value, location });
        }

        if let TokenKind::Ident(name) = self.peek_kind() {
            let id: Rc<str> = Rc::from(name.as_str());
            self.advance();
            return Ok(Expr::Name { id, location });
        }

        if matches!(self.peek_kind(), TokenKind::Str(_)) {
            // Adjacent string literals concatenate
            let mut text = String::new();
            while let TokenKind::Str(part) = self.peek_kind() {
                text.push_str(part);
                self.advance();
            }
            return Ok(Expr::Constant {
                value: Constant::Str(Rc::from(text)),
                location,
            });
        }

        if self.match_token(&TokenKind::LParen) {
            if self.match_token(&TokenKind::RParen) {
                return Ok(Expr::Tuple {
                    elts: Vec::new(),
                    location,
                });
            }

            let first = self.parse_test()?;
            if !self.check(&TokenKind::Comma) {
                self.expect_token(&TokenKind::RParen, "Expected ')' after expression")?;
                return Ok(first);
            }

            let mut elts = vec![first];
            while self.match_token(&TokenKind::Comma) {
                if self.check(&TokenKind::RParen) {
                    break;
                }
                elts.push(self.parse_test()?);
            }
            self.expect_token(&TokenKind::RParen, "Expected ')' after tuple")?;
            return Ok(Expr::Tuple { elts, location });
        }

        if self.match_token(&TokenKind::LBracket) {
            let mut elts = Vec::new();
            while !self.check(&TokenKind::RBracket) {
                elts.push(self.parse_test()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect_token(&TokenKind::RBracket, "Expected ']' after list elements")?;
            return Ok(Expr::List { elts, location });
        }

        Err(self.error_here(format!("Expected expression, found {}", self.peek())))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn expr(source: &str) -> Expr {
        let module = Parser::new(source).unwrap().parse_module().unwrap();
        match module.body.into_iter().next() {
            Some(Stmt::Expr { value, .. }) => value,
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        match expr("1 + 2 * 3") {
            Expr::BinOp {
                op: BinOp::Add,
                right,
                ..
            } => assert!(matches!(*right, Expr::BinOp { op: BinOp::Mul, .. })),
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_power_binds_tighter_than_unary_minus() {
        match expr("-2 ** 2") {
            Expr::UnaryOp {
                op: UnaryOp::Neg,
                operand,
                ..
            } => assert!(matches!(*operand, Expr::BinOp { op: BinOp::Pow, .. })),
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_not_binds_looser_than_comparison() {
        match expr("not i < n") {
            Expr::UnaryOp {
                op: UnaryOp::Not,
                operand,
                ..
            } => assert!(matches!(*operand, Expr::Compare { .. })),
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_trailers() {
        match expr("xs.append(f(1)[0])") {
            Expr::Call { func, args, .. } => {
                assert!(matches!(*func, Expr::Attribute { ref attr, .. } if &**attr == "append"));
                assert!(matches!(args[0], Expr::Subscript { .. }));
            }
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_tuples_and_parentheses() {
        assert!(matches!(expr("(1)"), Expr::Constant { .. }));
        assert!(matches!(expr("(1,)"), Expr::Tuple { ref elts, .. } if elts.len() == 1));
        assert!(matches!(expr("()"), Expr::Tuple { ref elts, .. } if elts.is_empty()));
        assert!(matches!(expr("1, 2"), Expr::Tuple { ref elts, .. } if elts.len() == 2));
    }

    #[test]
    fn test_string_concatenation() {
        match expr("'a' \"b\"") {
            Expr::Constant {
                value: Constant::Str(s),
                ..
            } => assert_eq!(&*s, "ab"),
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_conditional_expression() {
        assert!(matches!(expr("a if b else c"), Expr::IfExp { .. }));
    }

    #[test]
    fn test_keyword_arguments_rejected() {
        assert!(Parser::new("f(x=1)\n").unwrap().parse_module().is_err());
    }
}
