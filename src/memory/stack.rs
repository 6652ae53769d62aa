//! Call stack implementation
//!
//! This module provides the call stack for code execution:
//! - [`Stack`]: The call stack containing frames
//! - [`StackFrame`]: A single code object's activation record
//! - [`FrameKind`]: Which namespace a frame reads and writes
//! - [`Scope`]: A namespace, optionally chained to the scope it is nested in
//!
//! # Name Resolution
//!
//! Function frames own a fresh [`Scope`] whose parent is the defining
//! function's scope (the closure). Module frames use the interpreter's globals
//! directly. Class bodies write into their own namespace, which becomes the
//! class object's attribute table.

use super::value::Value;
use crate::parser::ast::{CodeId, FunctionDef};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// A namespace of variable bindings
#[derive(Debug, Default)]
pub struct Scope {
    vars: RefCell<FxHashMap<Rc<str>, Value>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    pub fn new(parent: Option<Rc<Scope>>) -> Rc<Self> {
        Rc::new(Scope {
            vars: RefCell::new(FxHashMap::default()),
            parent,
        })
    }

    pub fn parent(&self) -> Option<&Rc<Scope>> {
        self.parent.as_ref()
    }

    /// Look up a binding in this scope only
    pub fn get(&self, name: &str) -> Option<Value> {
        self.vars.borrow().get(name).cloned()
    }

    /// Look up a binding in this scope, then in each enclosing scope
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(value) = scope.get(name) {
                return Some(value);
            }
            current = scope.parent.as_deref();
        }
        None
    }

    pub fn set(&self, name: Rc<str>, value: Value) {
        self.vars.borrow_mut().insert(name, value);
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.vars.borrow_mut().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.borrow().contains_key(name)
    }

    /// The nearest enclosing scope (excluding this one) that binds `name`
    pub fn enclosing_owner(&self, name: &str) -> Option<Rc<Scope>> {
        let mut current = self.parent.clone();
        while let Some(scope) = current {
            if scope.contains(name) {
                return Some(scope);
            }
            current = scope.parent.clone();
        }
        None
    }

    /// Names bound in this scope, sorted
    pub fn names(&self) -> Vec<Rc<str>> {
        let mut names: Vec<Rc<str>> = self.vars.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

/// What kind of code a frame is executing
#[derive(Debug, Clone)]
pub enum FrameKind {
    /// Top-level code; reads and writes the globals
    Module,
    Function {
        def: Rc<FunctionDef>,
        locals: Rc<Scope>,
    },
    Class {
        namespace: Rc<Scope>,
    },
}

/// Stack frame for a running code object
#[derive(Debug, Clone)]
pub struct StackFrame {
    /// Name reported to trace sinks (`<module>`, the function or class name)
    pub function_name: Rc<str>,
    pub code: CodeId,
    /// Line of the statement currently executing
    pub line: usize,
    pub kind: FrameKind,
    /// Whether line, return and exception events fire for this frame
    pub traced: bool,
    /// Whether the in-flight exception has already been reported for this frame
    pub exception_reported: bool,
}

impl StackFrame {
    pub fn new(function_name: Rc<str>, code: CodeId, line: usize, kind: FrameKind) -> Self {
        StackFrame {
            function_name,
            code,
            line,
            kind,
            traced: true,
            exception_reported: false,
        }
    }

    /// The scope that functions defined in this frame close over
    pub fn closure_scope(&self) -> Option<Rc<Scope>> {
        match &self.kind {
            FrameKind::Module => None,
            FrameKind::Function { locals, .. } => Some(locals.clone()),
            // Class bodies are not visible to the methods defined in them
            FrameKind::Class { namespace } => namespace.parent().cloned(),
        }
    }
}

/// The call stack
#[derive(Debug, Clone, Default)]
pub struct Stack {
    frames: Vec<StackFrame>,
}

impl Stack {
    pub fn new() -> Self {
        Stack { frames: Vec::new() }
    }

    /// Push a new stack frame
    pub fn push_frame(&mut self, frame: StackFrame) {
        self.frames.push(frame);
    }

    /// Pop the top stack frame
    pub fn pop_frame(&mut self) -> Option<StackFrame> {
        self.frames.pop()
    }

    /// Get the current (top) frame
    pub fn current_frame(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    /// Get a mutable reference to the current frame
    pub fn current_frame_mut(&mut self) -> Option<&mut StackFrame> {
        self.frames.last_mut()
    }

    /// Get all frames, outermost first
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// Get the depth of the call stack
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_chain_lookup() {
        let outer = Scope::new(None);
        outer.set(Rc::from("x"), Value::Int(1));
        let inner = Scope::new(Some(outer.clone()));
        inner.set(Rc::from("y"), Value::Int(2));

        assert!(matches!(inner.lookup("x"), Some(Value::Int(1))));
        assert!(matches!(inner.lookup("y"), Some(Value::Int(2))));
        assert!(inner.get("x").is_none());
        assert!(outer.lookup("y").is_none());
        assert!(inner
            .enclosing_owner("x")
            .is_some_and(|owner| Rc::ptr_eq(&owner, &outer)));
        assert!(inner.enclosing_owner("y").is_none());
    }

    #[test]
    fn test_stack_push_pop() {
        let mut stack = Stack::new();
        assert!(stack.is_empty());
        stack.push_frame(StackFrame::new(
            Rc::from("<module>"),
            CodeId::MODULE,
            1,
            FrameKind::Module,
        ));
        assert_eq!(stack.depth(), 1);
        stack.current_frame_mut().unwrap().line = 7;
        assert_eq!(stack.current_frame().unwrap().line, 7);
        assert!(stack.pop_frame().is_some());
        assert!(stack.current_frame().is_none());
    }
}
