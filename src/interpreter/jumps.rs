//! Non-local control transfer: `return`, `raise` and `try`.
//!
//! Exceptions travel as `Err(RuntimeError::Exception)` through the ordinary
//! `?` chain. A `try` statement intercepts them, and while a handler runs the
//! caught error sits on `self.handling` so a bare `raise` can re-raise it.

use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{exception_matches, Value};
use crate::parser::ast::{ExceptHandler, Expr, SourceLocation, Stmt};
use std::rc::Rc;

impl Interpreter {
    pub(crate) fn execute_return(&mut self, expr: Option<&Expr>) -> Result<(), RuntimeError> {
        self.return_value = match expr {
            Some(expr) => self.evaluate_expr(expr)?,
            None => Value::None,
        };
        self.control_flow = ControlFlow::Return;
        Ok(())
    }

    pub(crate) fn execute_raise(
        &mut self,
        exc: Option<&Expr>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let Some(expr) = exc else {
            return Err(match self.handling.last() {
                Some(active) => active.clone(),
                None => RuntimeError::exception(
                    "RuntimeError",
                    "No active exception to reraise",
                    location,
                ),
            });
        };

        // Raising a class raises a fresh instance of it
        let value = match self.evaluate_expr(expr)? {
            class @ Value::ExceptionType(_) => self.call_value(class, Vec::new(), location)?,
            Value::Class(class) if class.is_exception => {
                self.call_value(Value::Class(class), Vec::new(), location)?
            }
            other => other,
        };

        match value {
            Value::Exception(exc) => Err(RuntimeError::exception(
                &*exc.kind,
                exc.message.clone(),
                location,
            )),
            _ => Err(RuntimeError::type_error(
                "exceptions must derive from BaseException",
                location,
            )),
        }
    }

    pub(crate) fn execute_try(
        &mut self,
        body: &[Stmt],
        handlers: &[ExceptHandler],
        orelse: &[Stmt],
        finalbody: &[Stmt],
    ) -> Result<(), RuntimeError> {
        let outcome = match self.execute_block(body) {
            Ok(()) if self.control_flow == ControlFlow::Normal => self.execute_block(orelse),
            Ok(()) => Ok(()),
            Err(err) if err.is_catchable() && !handlers.is_empty() => {
                self.handle_exception(err, handlers)
            }
            Err(err) => Err(err),
        };

        if finalbody.is_empty() {
            return outcome;
        }
        self.run_finally(finalbody, outcome)
    }

    fn handle_exception(
        &mut self,
        err: RuntimeError,
        handlers: &[ExceptHandler],
    ) -> Result<(), RuntimeError> {
        let Some(handler) = self.find_handler(&err, handlers)? else {
            return Err(err);
        };

        // Caught: a later exception in this frame is a new one
        if let Some(frame) = self.stack.current_frame_mut() {
            frame.exception_reported = false;
        }

        if let (Some(name), Some(exc)) = (&handler.name, err.to_exception_value()) {
            self.store_name(name, Value::Exception(Rc::new(exc)))?;
        }

        self.handling.push(err);
        let result = self.execute_block(&handler.body);
        self.handling.pop();

        // The `as` name is unbound when the handler ends
        if let Some(name) = &handler.name {
            self.delete_name(name).ok();
        }
        result
    }

    /// First handler whose class matches `err`. Each `except` clause that is
    /// tested fires a line event, as it would when stepping through the code.
    fn find_handler<'h>(
        &mut self,
        err: &RuntimeError,
        handlers: &'h [ExceptHandler],
    ) -> Result<Option<&'h ExceptHandler>, RuntimeError> {
        let kind = err.exception_kind().unwrap_or_default();

        for handler in handlers {
            self.current_location = handler.location;
            self.mark_line(handler.location.line)?;

            let Some(kind_expr) = &handler.kind else {
                return Ok(Some(handler));
            };
            let handler_class = self.evaluate_expr(kind_expr)?;
            if handler_matches(kind, &handler_class, handler.location)? {
                return Ok(Some(handler));
            }
        }
        Ok(None)
    }

    /// Run a `finally` block around the pending `outcome`.
    ///
    /// An error raised in the block replaces the outcome. A `return`, `break`
    /// or `continue` in the block discards it.
    fn run_finally(
        &mut self,
        finalbody: &[Stmt],
        outcome: Result<(), RuntimeError>,
    ) -> Result<(), RuntimeError> {
        let saved_flow = self.control_flow;
        let saved_value = std::mem::take(&mut self.return_value);
        self.control_flow = ControlFlow::Normal;

        self.execute_block(finalbody)?;
        if self.control_flow != ControlFlow::Normal {
            return Ok(());
        }

        self.control_flow = saved_flow;
        self.return_value = saved_value;
        outcome
    }
}

fn handler_matches(
    kind: &str,
    handler_class: &Value,
    location: SourceLocation,
) -> Result<bool, RuntimeError> {
    match handler_class {
        Value::ExceptionType(name) => Ok(exception_matches(kind, name)),
        Value::Class(class) if class.is_exception => Ok(kind == &*class.name),
        Value::Tuple(classes) => {
            for class in classes.iter() {
                if handler_matches(kind, class, location)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        _ => Err(RuntimeError::type_error(
            "catching classes that do not inherit from BaseException is not allowed",
            location,
        )),
    }
}
