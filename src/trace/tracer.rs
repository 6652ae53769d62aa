//! Scoped line-coverage tracer
//!
//! A [`Tracer`] is entered on an interpreter and returns a [`TracerScope`]
//! guard. While the guard lives, the tracer's sink is the interpreter's only
//! sink: it records every line event and forwards all events to the sink that
//! was installed before it. Dropping the guard puts that sink back, also when
//! the run failed or panicked.
//!
//! A tracer is single-use: `Idle → Active → Finished`.

use super::{FrameInfo, LineHit, SinkError, TraceControl, TraceEvent, TraceSink};
use crate::analysis::FunctionRegistry;
use crate::interpreter::Interpreter;
use crate::parser::ast::CodeId;
use rustc_hash::FxHashSet;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use thiserror::Error;
use tracing::debug;

/// Misuse of the tracer lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TracerError {
    #[error("tracer is already active")]
    AlreadyActive,

    #[error("tracer has already finished a run")]
    AlreadyUsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Active,
    Finished,
}

struct TracerState {
    log: Vec<LineHit>,
    /// Sink that was installed when the scope was entered
    prior: Option<Box<dyn TraceSink>>,
    phase: Phase,
    excluded: FxHashSet<CodeId>,
}

/// Records `(function, line)` for every line executed inside its scope
pub struct Tracer {
    state: Rc<RefCell<TracerState>>,
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer {
    pub fn new() -> Self {
        Tracer {
            state: Rc::new(RefCell::new(TracerState {
                log: Vec::new(),
                prior: None,
                phase: Phase::Idle,
                excluded: FxHashSet::default(),
            })),
        }
    }

    /// Install this tracer on `interp` until the returned guard is dropped.
    ///
    /// Any sink already installed keeps receiving every event, after the
    /// tracer has recorded it.
    pub fn enter<'a>(
        &self,
        interp: &'a mut Interpreter,
    ) -> Result<TracerScope<'a>, TracerError> {
        {
            let mut state = self.state.borrow_mut();
            match state.phase {
                Phase::Idle => {}
                Phase::Active => return Err(TracerError::AlreadyActive),
                Phase::Finished => return Err(TracerError::AlreadyUsed),
            }
            state.phase = Phase::Active;
            state.prior = interp.take_trace();
            debug!(chained = state.prior.is_some(), "tracer installed");
        }

        interp.set_trace(Box::new(CoverageSink {
            state: Rc::clone(&self.state),
        }));
        Ok(TracerScope {
            interp,
            state: Rc::clone(&self.state),
        })
    }

    /// Never record lines executed by the code object `code`
    pub fn exclude(&self, code: CodeId) {
        self.state.borrow_mut().excluded.insert(code);
    }

    /// Distinct lines seen so far
    pub fn coverage(&self) -> BTreeSet<LineHit> {
        self.state.borrow().log.iter().cloned().collect()
    }

    /// Every line event in the order it was observed
    pub fn log(&self) -> Vec<LineHit> {
        self.state.borrow().log.clone()
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().phase == Phase::Active
    }

    /// Annotated source of each covered function.
    ///
    /// Names that `registry` cannot resolve to a single definition (the module
    /// itself, or a name defined twice) are left out.
    pub fn render_listing(&self, registry: &FunctionRegistry, source: &str) -> String {
        let coverage = self.coverage();
        let source_lines: Vec<&str> = source.lines().collect();
        let names: BTreeSet<&Rc<str>> = coverage.iter().map(|hit| &hit.function).collect();

        let mut listing = Vec::new();
        for name in names {
            let Some(span) = registry.resolve(name) else {
                continue;
            };
            for lineno in span.lines() {
                let text = source_lines.get(lineno - 1).copied().unwrap_or("");
                let hit = LineHit::new(Rc::clone(name), lineno);
                let marker = if coverage.contains(&hit) { "| " } else { "  " };
                listing.push(format!("{}{:2}  {}\n", marker, lineno, text.trim_end()));
            }
        }
        listing.concat()
    }
}

/// Guard for an active tracer; derefs to the traced interpreter
pub struct TracerScope<'a> {
    interp: &'a mut Interpreter,
    state: Rc<RefCell<TracerState>>,
}

impl Deref for TracerScope<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Interpreter {
        self.interp
    }
}

impl DerefMut for TracerScope<'_> {
    fn deref_mut(&mut self) -> &mut Interpreter {
        self.interp
    }
}

impl Drop for TracerScope<'_> {
    fn drop(&mut self) {
        // The installed sink is the tracer's own
        self.interp.take_trace();

        // A panic mid-event may leave the state borrowed; never panic in drop
        let Ok(mut state) = self.state.try_borrow_mut() else {
            return;
        };
        if let Some(prior) = state.prior.take() {
            self.interp.set_trace(prior);
        }
        state.phase = Phase::Finished;
        debug!(lines = state.log.len(), "tracer removed");
    }
}

struct CoverageSink {
    state: Rc<RefCell<TracerState>>,
}

impl TraceSink for CoverageSink {
    fn on_event(
        &mut self,
        frame: &FrameInfo,
        event: TraceEvent,
    ) -> Result<TraceControl, SinkError> {
        let mut state = self.state.borrow_mut();
        if event == TraceEvent::Line && !state.excluded.contains(&frame.code) {
            state.log.push(LineHit::new(Rc::clone(&frame.function), frame.line));
        }

        if let Some(prior) = state.prior.as_mut() {
            prior.on_event(frame, event)?;
        }
        // Keep line events coming in every frame, whatever the prior sink said
        Ok(TraceControl::Continue)
    }
}
