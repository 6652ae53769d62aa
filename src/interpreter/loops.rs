//! Loop statement execution (`while`, `for`).
//!
//! Adds `impl Interpreter` methods for both loop forms. `break` and `continue`
//! are propagated via `LoopBodyResult` so the loop driver can react without
//! inspecting `control_flow` directly.
//!
//! The loop header fires a fresh line event each time control returns to it,
//! so a trace shows the header once per test or item fetch.

use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::{Expr, SourceLocation, Stmt};

/// Result returned by [`Interpreter::execute_loop_body`] to signal how the body ended.
pub(crate) enum LoopBodyResult {
    /// Body completed normally or via `continue`; the loop should iterate again.
    Continue,
    /// `break` was encountered; the loop should exit and skip its `else` block.
    Break,
    /// `return` was triggered. The loop driver unwinds and leaves
    /// `self.control_flow` for the caller.
    Exit,
}

impl Interpreter {
    /// Executes all statements in `body` once.
    pub(crate) fn execute_loop_body(
        &mut self,
        body: &[Stmt],
    ) -> Result<LoopBodyResult, RuntimeError> {
        self.execute_block(body)?;
        match self.control_flow {
            ControlFlow::Normal => Ok(LoopBodyResult::Continue),
            ControlFlow::Continue => {
                self.control_flow = ControlFlow::Normal;
                Ok(LoopBodyResult::Continue)
            }
            ControlFlow::Break => {
                self.control_flow = ControlFlow::Normal;
                Ok(LoopBodyResult::Break)
            }
            ControlFlow::Return => Ok(LoopBodyResult::Exit),
        }
    }

    /// Executes a `while test: body else: orelse` loop.
    ///
    /// The `else` block runs when the test turns false, never after `break`.
    pub(crate) fn execute_while(
        &mut self,
        test: &Expr,
        body: &[Stmt],
        orelse: &[Stmt],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let mut first = true;
        loop {
            if !first {
                self.current_location = location;
                self.mark_line(location.line)?;
            }
            first = false;

            if !self.evaluate_expr(test)?.is_truthy() {
                return self.execute_block(orelse);
            }

            match self.execute_loop_body(body)? {
                LoopBodyResult::Exit | LoopBodyResult::Break => return Ok(()),
                LoopBodyResult::Continue => {}
            }
        }
    }

    /// Executes a `for target in iter: body else: orelse` loop.
    ///
    /// The iterable is evaluated once. Lists are snapshotted when the loop
    /// starts, so appending inside the body does not extend the loop.
    pub(crate) fn execute_for(
        &mut self,
        target: &Expr,
        iter: &Expr,
        body: &[Stmt],
        orelse: &[Stmt],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let iterable = self.evaluate_expr(iter)?;
        let mut items = self.iterate(&iterable, location)?;

        let mut first = true;
        loop {
            if !first {
                self.current_location = location;
                self.mark_line(location.line)?;
            }
            first = false;

            let Some(item) = items.next() else {
                return self.execute_block(orelse);
            };
            self.assign_target(target, item)?;

            match self.execute_loop_body(body)? {
                LoopBodyResult::Exit | LoopBodyResult::Break => return Ok(()),
                LoopBodyResult::Continue => {}
            }
        }
    }
}
