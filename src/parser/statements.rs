//! Statement parsing implementation
//!
//! This module handles parsing of every statement form:
//!
//! - Simple statements: assignments (plain, augmented, annotated), `return`,
//!   `del`, `raise`, `assert`, `import`, `from ... import`, `global`,
//!   `nonlocal`, `pass`, `break`, `continue`, expression statements
//! - Compound statements: `if`/`elif`/`else`, `while`, `for`, `try`, `with`
//! - Definitions: `def`, `async def`, `class`, with decorators
//!
//! # Grammar
//!
//! ```text
//! statement     ::= compound_stmt | simple_stmts
//! simple_stmts  ::= small_stmt (';' small_stmt)* [';'] NEWLINE
//! block         ::= simple_stmts | NEWLINE INDENT statement+ DEDENT
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::symbols;
use std::rc::Rc;

impl Parser {
    /// Parse one statement line; simple statements separated by `;` yield several nodes
    pub(crate) fn parse_statement(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let loc = self.current_location();

        match self.peek_kind() {
            TokenKind::Def | TokenKind::Async | TokenKind::Class | TokenKind::At => {
                Ok(vec![self.parse_definition()?])
            }
            TokenKind::If => {
                self.advance();
                Ok(vec![self.parse_if_statement(loc)?])
            }
            TokenKind::While => {
                self.advance();
                Ok(vec![self.parse_while_statement(loc)?])
            }
            TokenKind::For => {
                self.advance();
                Ok(vec![self.parse_for_statement(loc)?])
            }
            TokenKind::Try => {
                self.advance();
                Ok(vec![self.parse_try_statement(loc)?])
            }
            TokenKind::With => {
                self.advance();
                Ok(vec![self.parse_with_statement(loc)?])
            }
            TokenKind::Indent => Err(self.error_here("Unexpected indent")),
            TokenKind::Dedent => Err(self.error_here("Unexpected dedent")),
            _ => self.parse_simple_statements(),
        }
    }

    /// Parse the suite following a compound statement header, including the ':'
    pub(crate) fn parse_block(&mut self, ctx: &str) -> Result<Vec<Stmt>, ParseError> {
        self.expect_token(&TokenKind::Colon, &format!("Expected ':' {ctx}"))?;

        if !self.match_token(&TokenKind::Newline) {
            // Single-line suite: `if x: y = 1`
            return self.parse_simple_statements();
        }

        self.expect_token(&TokenKind::Indent, &format!("Expected an indented block {ctx}"))?;

        let mut statements = Vec::new();
        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            statements.extend(self.parse_statement()?);
        }

        self.expect_token(&TokenKind::Dedent, &format!("Expected end of block {ctx}"))?;

        Ok(statements)
    }

    /// Parse `small_stmt (';' small_stmt)* [';'] NEWLINE`
    fn parse_simple_statements(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = vec![self.parse_small_statement()?];

        while self.match_token(&TokenKind::Semicolon) {
            if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Eof) {
                break;
            }
            statements.push(self.parse_small_statement()?);
        }

        if !self.is_at_end() {
            self.expect_token(&TokenKind::Newline, "Expected end of line after statement")?;
        }

        Ok(statements)
    }

    fn parse_small_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();

        match self.peek_kind() {
            TokenKind::Pass => {
                self.advance();
                Ok(Stmt::Pass { location })
            }
            TokenKind::Break => {
                self.advance();
                Ok(Stmt::Break { location })
            }
            TokenKind::Continue => {
                self.advance();
                Ok(Stmt::Continue { location })
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_testlist()?)
                };
                Ok(Stmt::Return { value, location })
            }
            TokenKind::Del => {
                self.advance();
                let mut targets = vec![self.parse_test()?];
                while self.match_token(&TokenKind::Comma) {
                    if self.at_statement_end() {
                        break;
                    }
                    targets.push(self.parse_test()?);
                }
                for target in &targets {
                    self.check_target(target, "delete")?;
                }
                Ok(Stmt::Delete { targets, location })
            }
            TokenKind::Raise => {
                self.advance();
                let exc = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_test()?)
                };
                Ok(Stmt::Raise { exc, location })
            }
            TokenKind::Assert => {
                self.advance();
                let test = self.parse_test()?;
                let msg = if self.match_token(&TokenKind::Comma) {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                Ok(Stmt::Assert {
                    test,
                    msg,
                    location,
                })
            }
            TokenKind::Import => {
                self.advance();
                self.parse_import(location)
            }
            TokenKind::From => {
                self.advance();
                self.parse_import_from(location)
            }
            TokenKind::Global => {
                self.advance();
                let names = self.parse_name_list()?;
                Ok(Stmt::Global { names, location })
            }
            TokenKind::Nonlocal => {
                self.advance();
                let names = self.parse_name_list()?;
                Ok(Stmt::Nonlocal { names, location })
            }
            _ => self.parse_expression_statement(location),
        }
    }

    /// Expression statement or one of the three assignment forms
    fn parse_expression_statement(&mut self, location: SourceLocation) -> Result<Stmt, ParseError> {
        let first = self.parse_testlist()?;

        if self.check(&TokenKind::Eq) {
            let mut targets = vec![first];
            let value = loop {
                self.advance(); // consume '='
                let next = self.parse_testlist()?;
                if self.check(&TokenKind::Eq) {
                    targets.push(next);
                } else {
                    break next;
                }
            };
            for target in &targets {
                self.check_target(target, "assign to")?;
            }
            return Ok(Stmt::Assign {
                targets,
                value,
                location,
            });
        }

        if let Some(op) = self.augmented_operator() {
            self.advance();
            self.check_single_target(&first, "augmented assignment")?;
            let value = self.parse_testlist()?;
            return Ok(Stmt::AugAssign {
                target: first,
                op,
                value,
                location,
            });
        }

        if self.match_token(&TokenKind::Colon) {
            self.check_single_target(&first, "annotated assignment")?;
            let annotation = self.parse_test()?;
            let value = if self.match_token(&TokenKind::Eq) {
                Some(self.parse_testlist()?)
            } else {
                None
            };
            return Ok(Stmt::AnnAssign {
                target: first,
                annotation,
                value,
                location,
            });
        }

        Ok(Stmt::Expr {
            value: first,
            location,
        })
    }

    fn augmented_operator(&self) -> Option<BinOp> {
        match self.peek_kind() {
            TokenKind::PlusEq => Some(BinOp::Add),
            TokenKind::MinusEq => Some(BinOp::Sub),
            TokenKind::StarEq => Some(BinOp::Mul),
            TokenKind::SlashEq => Some(BinOp::Div),
            TokenKind::DoubleSlashEq => Some(BinOp::FloorDiv),
            TokenKind::PercentEq => Some(BinOp::Mod),
            TokenKind::DoubleStarEq => Some(BinOp::Pow),
            _ => None,
        }
    }

    fn check_target(&self, target: &Expr, verb: &str) -> Result<(), ParseError> {
        if target.is_assignable() {
            Ok(())
        } else {
            Err(ParseError {
                message: format!("Cannot {} expression", verb),
                location: *target.location(),
            })
        }
    }

    fn check_single_target(&self, target: &Expr, what: &str) -> Result<(), ParseError> {
        match target {
            Expr::Name { .. } | Expr::Attribute { .. } | Expr::Subscript { .. } => Ok(()),
            _ => Err(ParseError {
                message: format!("Illegal target for {}", what),
                location: *target.location(),
            }),
        }
    }

    fn parse_name_list(&mut self) -> Result<Vec<Rc<str>>, ParseError> {
        let mut names = vec![self.expect_identifier()?];
        while self.match_token(&TokenKind::Comma) {
            names.push(self.expect_identifier()?);
        }
        Ok(names)
    }

    /// `a.b.c`
    fn parse_dotted_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_identifier()?.to_string();
        while self.match_token(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_identifier()?);
        }
        Ok(name)
    }

    fn parse_alias(&mut self, dotted: bool) -> Result<Alias, ParseError> {
        let location = self.current_location();
        let name: Rc<str> = if dotted {
            Rc::from(self.parse_dotted_name()?)
        } else {
            self.expect_identifier()?
        };
        let asname = if self.match_token(&TokenKind::As) {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        Ok(Alias {
            name,
            asname,
            location,
        })
    }

    fn parse_import(&mut self, location: SourceLocation) -> Result<Stmt, ParseError> {
        let mut names = vec![self.parse_alias(true)?];
        while self.match_token(&TokenKind::Comma) {
            names.push(self.parse_alias(true)?);
        }
        Ok(Stmt::Import { names, location })
    }

    fn parse_import_from(&mut self, location: SourceLocation) -> Result<Stmt, ParseError> {
        // Relative imports: leading dots
        let mut module = String::new();
        while self.match_token(&TokenKind::Dot) {
            module.push('.');
        }
        if !self.check(&TokenKind::Import) {
            module.push_str(&self.parse_dotted_name()?);
        }

        self.expect_token(&TokenKind::Import, "Expected 'import' after module name")?;

        let mut names = Vec::new();
        if self.check(&TokenKind::Star) {
            let star_location = self.current_location();
            self.advance();
            names.push(Alias {
                name: Rc::from("*"),
                asname: None,
                location: star_location,
            });
        } else if self.match_token(&TokenKind::LParen) {
            loop {
                names.push(self.parse_alias(false)?);
                if !self.match_token(&TokenKind::Comma) || self.check(&TokenKind::RParen) {
                    break;
                }
            }
            self.expect_token(&TokenKind::RParen, "Expected ')' after imported names")?;
        } else {
            names.push(self.parse_alias(false)?);
            while self.match_token(&TokenKind::Comma) {
                names.push(self.parse_alias(false)?);
            }
        }

        Ok(Stmt::ImportFrom {
            module: Rc::from(module),
            names,
            location,
        })
    }

    /// Parse if statement (the `if`/`elif` keyword is already consumed)
    fn parse_if_statement(&mut self, location: SourceLocation) -> Result<Stmt, ParseError> {
        let test = self.parse_test()?;
        let body = self.parse_block("after if condition")?;

        let orelse = if self.check(&TokenKind::Elif) {
            let elif_location = self.current_location();
            self.advance();
            vec![self.parse_if_statement(elif_location)?]
        } else if self.match_token(&TokenKind::Else) {
            self.parse_block("after 'else'")?
        } else {
            Vec::new()
        };

        Ok(Stmt::If {
            test,
            body,
            orelse,
            location,
        })
    }

    fn parse_while_statement(&mut self, location: SourceLocation) -> Result<Stmt, ParseError> {
        let test = self.parse_test()?;
        let body = self.parse_block("after while condition")?;
        let orelse = if self.match_token(&TokenKind::Else) {
            self.parse_block("after 'else'")?
        } else {
            Vec::new()
        };

        Ok(Stmt::While {
            test,
            body,
            orelse,
            location,
        })
    }

    fn parse_for_statement(&mut self, location: SourceLocation) -> Result<Stmt, ParseError> {
        let target = self.parse_target_list()?;
        self.check_target(&target, "assign to")?;
        self.expect_token(&TokenKind::In, "Expected 'in' after for target")?;
        let iter = self.parse_testlist()?;
        let body = self.parse_block("after for clause")?;
        let orelse = if self.match_token(&TokenKind::Else) {
            self.parse_block("after 'else'")?
        } else {
            Vec::new()
        };

        Ok(Stmt::For {
            target,
            iter,
            body,
            orelse,
            location,
        })
    }

    fn parse_try_statement(&mut self, location: SourceLocation) -> Result<Stmt, ParseError> {
        let body = self.parse_block("after 'try'")?;

        let mut handlers = Vec::new();
        while self.check(&TokenKind::Except) {
            let handler_location = self.current_location();
            self.advance();

            let (kind, name) = if self.check(&TokenKind::Colon) {
                (None, None)
            } else {
                let kind = self.parse_test()?;
                let name = if self.match_token(&TokenKind::As) {
                    Some(self.expect_identifier()?)
                } else {
                    None
                };
                (Some(kind), name)
            };

            let handler_body = self.parse_block("after except clause")?;
            handlers.push(ExceptHandler {
                kind,
                name,
                body: handler_body,
                location: handler_location,
            });
        }

        let orelse = if !handlers.is_empty() && self.match_token(&TokenKind::Else) {
            self.parse_block("after 'else'")?
        } else {
            Vec::new()
        };

        let finalbody = if self.match_token(&TokenKind::Finally) {
            self.parse_block("after 'finally'")?
        } else {
            Vec::new()
        };

        if handlers.is_empty() && finalbody.is_empty() {
            return Err(self.error_here("Expected 'except' or 'finally' block"));
        }

        Ok(Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
            location,
        })
    }

    fn parse_with_statement(&mut self, location: SourceLocation) -> Result<Stmt, ParseError> {
        let mut items = Vec::new();
        loop {
            let context = self.parse_test()?;
            let alias = if self.match_token(&TokenKind::As) {
                let target = self.parse_target()?;
                self.check_target(&target, "assign to")?;
                Some(target)
            } else {
                None
            };
            items.push(WithItem { context, alias });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        let body = self.parse_block("after with items")?;

        Ok(Stmt::With {
            items,
            body,
            location,
        })
    }

    /// Decorators followed by `def`, `async def` or `class`
    fn parse_definition(&mut self) -> Result<Stmt, ParseError> {
        let mut decorators = Vec::new();
        while self.match_token(&TokenKind::At) {
            decorators.push(self.parse_test()?);
            self.expect_token(&TokenKind::Newline, "Expected end of line after decorator")?;
        }

        let location = self.current_location();
        match self.peek_kind() {
            TokenKind::Def => {
                self.advance();
                let def = self.parse_function_definition(decorators, location)?;
                Ok(Stmt::FunctionDef(Rc::new(def)))
            }
            TokenKind::Async => {
                self.advance();
                self.expect_token(&TokenKind::Def, "Expected 'def' after 'async'")?;
                let def = self.parse_function_definition(decorators, location)?;
                Ok(Stmt::AsyncFunctionDef(Rc::new(def)))
            }
            TokenKind::Class => {
                self.advance();
                let def = self.parse_class_definition(decorators, location)?;
                Ok(Stmt::ClassDef(Rc::new(def)))
            }
            _ => Err(self.error_here(format!(
                "Expected function or class definition after decorator, found {}",
                self.peek()
            ))),
        }
    }

    /// Parse function definition after `def`: name(params) [-> type]: body
    fn parse_function_definition(
        &mut self,
        decorators: Vec<Expr>,
        location: SourceLocation,
    ) -> Result<FunctionDef, ParseError> {
        let name = self.expect_identifier()?;
        let code = self.fresh_code();

        self.expect_token(&TokenKind::LParen, "Expected '(' after function name")?;
        let params = self.parse_parameter_list()?;
        self.expect_token(&TokenKind::RParen, "Expected ')' after parameters")?;

        let returns = if self.match_token(&TokenKind::Arrow) {
            Some(self.parse_test()?)
        } else {
            None
        };

        let body = self.parse_block("before function body")?;
        let end_line = self.last_line;
        let scope = symbols::analyze_function(&params, &body);

        Ok(FunctionDef {
            name,
            params,
            body,
            decorators,
            returns,
            code,
            scope,
            location,
            end_line,
        })
    }

    fn parse_parameter_list(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params: Vec<Param> = Vec::new();

        while !self.check(&TokenKind::RParen) {
            let location = self.current_location();
            let name = self.expect_identifier()?;

            if params.iter().any(|p| p.name == name) {
                return Err(ParseError {
                    message: format!("Duplicate argument '{}' in function definition", name),
                    location,
                });
            }

            let annotation = if self.match_token(&TokenKind::Colon) {
                Some(self.parse_test()?)
            } else {
                None
            };

            let default = if self.match_token(&TokenKind::Eq) {
                Some(self.parse_test()?)
            } else {
                None
            };

            if default.is_none() && params.last().is_some_and(|p| p.default.is_some()) {
                return Err(ParseError {
                    message: "Non-default argument follows default argument".to_string(),
                    location,
                });
            }

            params.push(Param {
                name,
                annotation,
                default,
                location,
            });

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    /// Parse class definition after `class`: Name[(bases)]: body
    fn parse_class_definition(
        &mut self,
        decorators: Vec<Expr>,
        location: SourceLocation,
    ) -> Result<ClassDef, ParseError> {
        let name = self.expect_identifier()?;
        let code = self.fresh_code();

        let mut bases = Vec::new();
        if self.match_token(&TokenKind::LParen) {
            while !self.check(&TokenKind::RParen) {
                bases.push(self.parse_test()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect_token(&TokenKind::RParen, "Expected ')' after base classes")?;
        }

        let body = self.parse_block("before class body")?;
        let end_line = self.last_line;

        Ok(ClassDef {
            name,
            bases,
            body,
            decorators,
            code,
            location,
            end_line,
        })
    }
}
