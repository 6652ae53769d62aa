// Execution engine for the script interpreter

use crate::interpreter::errors::RuntimeError;
use crate::interpreter::output::OutputBuffer;
use crate::memory::stack::{FrameKind, Scope, Stack, StackFrame};
use crate::memory::value::{Builtin, Value, EXCEPTION_TYPES};
use crate::parser::ast::*;
use crate::parser::{parse_module, ParseError};
use crate::trace::{FrameInfo, TraceControl, TraceEvent, TraceSink};
use rustc_hash::FxHashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Name reported for the top-level frame
pub const MODULE_NAME: &str = "<module>";

/// Default limit on nested frames, module frame included
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Items a builtin consumes between two deadline checks
pub(crate) const DEADLINE_STRIDE: usize = 4096;

/// Free native stack below which evaluation moves to a new segment
const STACK_RED_ZONE: usize = 256 * 1024;
/// Size of each extra native stack segment
const STACK_SEGMENT: usize = 4 * 1024 * 1024;

/// Run `f`, first switching to a fresh stack segment when the current one is
/// nearly used up.
///
/// Frames, blocks and expressions all recurse through this, so script
/// recursion is bounded by `ExecConfig::max_depth` rather than by the size of
/// the host thread's stack.
pub(crate) fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, f)
}

/// Execution limits for one interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecConfig {
    /// Wall-clock budget for one `run` or `call`, checked at line events and inside builtins
    pub deadline: Option<Duration>,
    /// Frames deeper than this raise `RecursionError`
    pub max_depth: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        ExecConfig {
            deadline: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Pending non-local control transfer inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlFlow {
    Normal,
    Break,
    Continue,
    Return,
}

/// The main interpreter that executes a parsed module
///
/// Each interpreter owns its globals, its output buffer and its trace sink
/// slot, so independent runs never share state.
pub struct Interpreter {
    /// Parsed module
    module: Rc<Module>,

    config: ExecConfig,

    /// Module namespace
    globals: Rc<Scope>,

    /// Built-in functions and exception classes
    builtins: FxHashMap<Rc<str>, Value>,

    /// Call stack
    pub(crate) stack: Stack,

    /// Captured `print` output
    pub(crate) terminal: OutputBuffer,

    /// Installed trace sink, if any
    sink: Option<Box<dyn TraceSink>>,

    pub(crate) control_flow: ControlFlow,

    /// Value of the last executed `return`
    pub(crate) return_value: Value,

    /// Exceptions whose handlers are currently running, innermost last
    pub(crate) handling: Vec<RuntimeError>,

    /// Start of the current top-level `run` or `call`
    started: Option<Instant>,

    /// Current source location being executed
    pub(crate) current_location: SourceLocation,
}

impl Interpreter {
    /// Create a new interpreter with default limits
    pub fn new(module: impl Into<Rc<Module>>) -> Self {
        Self::with_config(module, ExecConfig::default())
    }

    pub fn with_config(module: impl Into<Rc<Module>>, config: ExecConfig) -> Self {
        let mut builtins = FxHashMap::default();
        for builtin in Builtin::ALL {
            builtins.insert(Rc::from(builtin.name()), Value::Builtin(builtin));
        }
        for (name, _) in EXCEPTION_TYPES {
            let name: Rc<str> = Rc::from(*name);
            builtins.insert(name.clone(), Value::ExceptionType(name));
        }

        Interpreter {
            module: module.into(),
            config,
            globals: Scope::new(None),
            builtins,
            stack: Stack::new(),
            terminal: OutputBuffer::new(),
            sink: None,
            control_flow: ControlFlow::Normal,
            return_value: Value::None,
            handling: Vec::new(),
            started: None,
            current_location: SourceLocation::new(1, 1),
        }
    }

    /// Parse `source` and create an interpreter for it
    pub fn from_source(source: &str) -> Result<Self, ParseError> {
        Ok(Self::new(parse_module(source)?))
    }

    pub fn module(&self) -> &Rc<Module> {
        &self.module
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Bind a global before the module runs
    pub fn bind(&mut self, name: &str, value: Value) {
        self.globals.set(Rc::from(name), value);
    }

    /// Read a global binding
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name)
    }

    /// Output produced by `print`
    pub fn output(&self) -> &OutputBuffer {
        &self.terminal
    }

    // ===== Trace sink slot =====

    /// Install `sink`, returning the sink it replaces
    pub fn set_trace(&mut self, sink: Box<dyn TraceSink>) -> Option<Box<dyn TraceSink>> {
        self.sink.replace(sink)
    }

    /// Remove and return the installed sink
    pub fn take_trace(&mut self) -> Option<Box<dyn TraceSink>> {
        self.sink.take()
    }

    pub fn has_trace(&self) -> bool {
        self.sink.is_some()
    }

    // ===== Entry points =====

    /// Execute the module body from the top
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        let module = Rc::clone(&self.module);
        self.started = Some(Instant::now());
        self.control_flow = ControlFlow::Normal;

        debug!(statements = module.body.len(), "running module");
        let frame = StackFrame::new(Rc::from(MODULE_NAME), CodeId::MODULE, 1, FrameKind::Module);
        self.run_frame(frame, &module.body)?;
        Ok(())
    }

    /// Call a global function by name.
    ///
    /// When no frame is running, the call is made from an untraced host frame,
    /// so only the callee and what it calls produce events.
    pub fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let callee = self
            .globals
            .get(name)
            .filter(|value| matches!(value, Value::Function(_) | Value::Builtin(_)))
            .ok_or_else(|| RuntimeError::NoSuchFunction {
                name: name.to_string(),
            })?;

        let host_frame = self.stack.is_empty();
        if host_frame {
            self.started = Some(Instant::now());
            let mut frame =
                StackFrame::new(Rc::from(MODULE_NAME), CodeId::MODULE, 0, FrameKind::Module);
            frame.traced = false;
            self.stack.push_frame(frame);
        }

        let location = self.current_location;
        let result = self.call_value(callee, args, location);

        if host_frame {
            self.stack.pop_frame();
            self.control_flow = ControlFlow::Normal;
        }
        result
    }

    // ===== Frames and events =====

    /// Push `frame`, execute `body` in it and pop it again on every path
    pub(crate) fn run_frame(
        &mut self,
        frame: StackFrame,
        body: &[Stmt],
    ) -> Result<Value, RuntimeError> {
        if self.stack.depth() >= self.config.max_depth {
            return Err(RuntimeError::exception(
                "RecursionError",
                "maximum recursion depth exceeded",
                self.current_location,
            ));
        }

        trace!(function = %frame.function_name, depth = self.stack.depth() + 1, "enter frame");
        self.stack.push_frame(frame);

        let result = with_stack(|| self.execute_frame_body(body));
        self.control_flow = ControlFlow::Normal;

        let returned = self.fire(TraceEvent::Return);
        self.stack.pop_frame();

        match (result, returned) {
            (Ok(value), Ok(_)) => Ok(value),
            (Err(err), _) | (Ok(_), Err(err)) => Err(err),
        }
    }

    fn execute_frame_body(&mut self, body: &[Stmt]) -> Result<Value, RuntimeError> {
        if self.fire(TraceEvent::Call)? == TraceControl::Detach {
            if let Some(frame) = self.stack.current_frame_mut() {
                frame.traced = false;
            }
        }

        // A class body starts on its header line
        let class_header = match self.stack.current_frame() {
            Some(frame) if matches!(frame.kind, FrameKind::Class { .. }) => Some(frame.line),
            _ => None,
        };
        if let Some(line) = class_header {
            self.mark_line(line)?;
        }

        self.execute_block(body)?;

        if self.control_flow == ControlFlow::Return {
            Ok(std::mem::take(&mut self.return_value))
        } else {
            Ok(Value::None)
        }
    }

    /// Deliver `event` for the current frame to the installed sink
    pub(crate) fn fire(&mut self, event: TraceEvent) -> Result<TraceControl, RuntimeError> {
        let location = self.current_location;
        let Some(sink) = self.sink.as_mut() else {
            return Ok(TraceControl::Continue);
        };
        let Some(frame) = self.stack.current_frame() else {
            return Ok(TraceControl::Continue);
        };
        if event != TraceEvent::Call && !frame.traced {
            return Ok(TraceControl::Continue);
        }

        let info = FrameInfo {
            function: frame.function_name.clone(),
            code: frame.code,
            line: frame.line,
            depth: self.stack.depth(),
        };
        sink.on_event(&info, event)
            .map_err(|source| RuntimeError::Sink { source, location })
    }

    /// Move the current frame to `line` and fire its line event
    pub(crate) fn mark_line(&mut self, line: usize) -> Result<(), RuntimeError> {
        self.check_deadline()?;
        match self.stack.current_frame_mut() {
            Some(frame) => frame.line = line,
            None => {
                return Err(RuntimeError::NoFrame {
                    location: self.current_location,
                })
            }
        }
        self.fire(TraceEvent::Line)?;
        Ok(())
    }

    /// Fire the exception event once per frame an exception passes through
    pub(crate) fn report_exception(&mut self, err: &RuntimeError) -> Result<(), RuntimeError> {
        if !err.is_catchable() {
            return Ok(());
        }
        match self.stack.current_frame_mut() {
            Some(frame) if !frame.exception_reported => frame.exception_reported = true,
            _ => return Ok(()),
        }
        self.fire(TraceEvent::Exception)?;
        Ok(())
    }

    pub(crate) fn check_deadline(&self) -> Result<(), RuntimeError> {
        if let (Some(limit), Some(started)) = (self.config.deadline, self.started) {
            if started.elapsed() > limit {
                return Err(RuntimeError::DeadlineExceeded {
                    limit,
                    location: self.current_location,
                });
            }
        }
        Ok(())
    }

    // ===== Name resolution =====

    pub(crate) fn current_frame(&self) -> Result<&StackFrame, RuntimeError> {
        self.stack.current_frame().ok_or(RuntimeError::NoFrame {
            location: self.current_location,
        })
    }

    /// Resolve a name: local, enclosing functions, globals, builtins
    pub(crate) fn lookup_name(
        &self,
        name: &Rc<str>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match &self.current_frame()?.kind {
            FrameKind::Module => {}
            FrameKind::Function { def, locals } => {
                if def.scope.locals.contains(name) {
                    return locals.get(name).ok_or_else(|| {
                        RuntimeError::exception(
                            "UnboundLocalError",
                            format!(
                                "cannot access local variable '{}' where it is not associated with a value",
                                name
                            ),
                            location,
                        )
                    });
                }
                if !def.scope.globals.contains(name) {
                    if let Some(value) = locals.lookup(name) {
                        return Ok(value);
                    }
                }
            }
            FrameKind::Class { namespace } => {
                if let Some(value) = namespace.lookup(name) {
                    return Ok(value);
                }
            }
        }

        self.globals
            .get(name)
            .or_else(|| self.builtins.get(name).cloned())
            .ok_or_else(|| {
                RuntimeError::exception(
                    "NameError",
                    format!("name '{}' is not defined", name),
                    location,
                )
            })
    }

    /// Bind a name in the namespace the current frame assigns to
    pub(crate) fn store_name(&self, name: &Rc<str>, value: Value) -> Result<(), RuntimeError> {
        match &self.current_frame()?.kind {
            FrameKind::Module => self.globals.set(name.clone(), value),
            FrameKind::Function { def, locals } => {
                if def.scope.globals.contains(name) {
                    self.globals.set(name.clone(), value);
                } else if def.scope.nonlocals.contains(name) {
                    self.nonlocal_owner(locals, name)?.set(name.clone(), value);
                } else {
                    locals.set(name.clone(), value);
                }
            }
            FrameKind::Class { namespace } => namespace.set(name.clone(), value),
        }
        Ok(())
    }

    /// Remove a binding for `del name`
    pub(crate) fn delete_name(&self, name: &Rc<str>) -> Result<(), RuntimeError> {
        let removed = match &self.current_frame()?.kind {
            FrameKind::Module => self.globals.remove(name),
            FrameKind::Function { def, locals } => {
                if def.scope.globals.contains(name) {
                    self.globals.remove(name)
                } else if def.scope.nonlocals.contains(name) {
                    self.nonlocal_owner(locals, name)?.remove(name)
                } else {
                    locals.remove(name)
                }
            }
            FrameKind::Class { namespace } => namespace.remove(name),
        };

        match removed {
            Some(_) => Ok(()),
            None => Err(RuntimeError::exception(
                "NameError",
                format!("name '{}' is not defined", name),
                self.current_location,
            )),
        }
    }

    fn nonlocal_owner(&self, locals: &Rc<Scope>, name: &str) -> Result<Rc<Scope>, RuntimeError> {
        locals
            .enclosing_owner(name)
            .or_else(|| locals.parent().cloned())
            .ok_or_else(|| {
                RuntimeError::exception(
                    "NameError",
                    format!("no binding for nonlocal '{}' found", name),
                    self.current_location,
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Interpreter {
        let mut interp = Interpreter::from_source(source).expect("parse failed");
        interp.run().expect("run failed");
        interp
    }

    #[test]
    fn test_bind_and_read_globals() {
        let mut interp = Interpreter::from_source("result = input_value * 2\n").unwrap();
        interp.bind("input_value", Value::Int(21));
        interp.run().unwrap();
        assert!(matches!(interp.global("result"), Some(Value::Int(42))));
    }

    #[test]
    fn test_call_by_name() {
        let mut interp = run("def add(a, b=10):\n    return a + b\n");
        let value = interp.call("add", vec![Value::Int(1)]).unwrap();
        assert!(matches!(value, Value::Int(11)));
        assert!(matches!(
            interp.call("missing", vec![]),
            Err(RuntimeError::NoSuchFunction { .. })
        ));
    }

    #[test]
    fn test_max_depth_raises_recursion_error() {
        let module = parse_module("def f(n):\n    return f(n + 1)\nf(0)\n").unwrap();
        let mut interp = Interpreter::with_config(
            module,
            ExecConfig {
                deadline: None,
                max_depth: 32,
            },
        );
        let err = interp.run().unwrap_err();
        assert_eq!(err.exception_kind(), Some("RecursionError"));
        assert!(interp.stack.is_empty());
    }

    #[test]
    fn test_deadline_stops_infinite_loop() {
        let module = parse_module("while True:\n    pass\n").unwrap();
        let mut interp = Interpreter::with_config(
            module,
            ExecConfig {
                deadline: Some(Duration::from_millis(20)),
                max_depth: DEFAULT_MAX_DEPTH,
            },
        );
        assert!(matches!(
            interp.run(),
            Err(RuntimeError::DeadlineExceeded { .. })
        ));
    }

    #[test]
    fn test_independent_interpreters_do_not_share_globals() {
        let first = run("x = 1\n");
        let second = run("y = 2\n");
        assert!(first.global("y").is_none());
        assert!(second.global("x").is_none());
    }
}
