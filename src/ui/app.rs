//! Coverage viewer application state and logic

use crate::runner::{BatchReport, InputOutcome};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::collections::BTreeSet;
use std::io;
use std::time::Duration;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Runs,
    Source,
    Output,
}

impl FocusedPane {
    /// Move focus to the next pane (runs -> source -> output)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Runs => FocusedPane::Source,
            FocusedPane::Source => FocusedPane::Output,
            FocusedPane::Output => FocusedPane::Runs,
        }
    }

    /// Move focus to the previous pane
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Runs => FocusedPane::Output,
            FocusedPane::Source => FocusedPane::Runs,
            FocusedPane::Output => FocusedPane::Source,
        }
    }
}

/// One run as shown in the viewer
#[derive(Debug, Clone)]
pub struct RunEntry {
    /// Input file path
    pub label: String,
    /// Covered line numbers, across all functions
    pub covered: BTreeSet<usize>,
    pub output: Vec<String>,
    /// `None` when the run failed
    pub percentage: Option<f64>,
    /// Coverage summary, or the error for a failed run
    pub summary: String,
}

impl RunEntry {
    pub fn from_outcome(outcome: &InputOutcome) -> Self {
        let label = outcome.input.display().to_string();
        match &outcome.result {
            Ok(report) => RunEntry {
                label,
                covered: report.coverage.iter().map(|hit| hit.line).collect(),
                output: report.output.clone(),
                percentage: Some(report.percentage()),
                summary: format!("{} {}", report.summary(), report.coverage_text()),
            },
            Err(err) => RunEntry {
                label,
                covered: BTreeSet::new(),
                output: Vec::new(),
                percentage: None,
                summary: err.to_string(),
            },
        }
    }
}

/// The main application state
pub struct App {
    pub runs: Vec<RunEntry>,

    /// The traced script
    pub source_code: String,

    pub selected: usize,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub source_scroll: usize,
    pub output_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,
}

impl App {
    pub fn new(runs: Vec<RunEntry>, source_code: String) -> Self {
        App {
            runs,
            source_code,
            selected: 0,
            focused_pane: FocusedPane::Runs,
            source_scroll: 0,
            output_scroll: 0,
            should_quit: false,
        }
    }

    /// Build the viewer for every outcome of a batch
    pub fn from_batch(batch: &BatchReport, source_code: String) -> Self {
        let runs = batch.outcomes.iter().map(RunEntry::from_outcome).collect();
        Self::new(runs, source_code)
    }

    pub fn selected_run(&self) -> Option<&RunEntry> {
        self.runs.get(self.selected)
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Panes above, status bar at the bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(main_chunks[0]);

        // Left column: Runs (top) | Output (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[0]);

        let empty = BTreeSet::new();
        let (covered, output, summary, failed) = match self.runs.get(self.selected) {
            Some(run) => (
                &run.covered,
                run.output.as_slice(),
                run.summary.as_str(),
                run.percentage.is_none(),
            ),
            None => (&empty, &[][..], "No inputs were run", false),
        };

        super::panes::render_runs_pane(
            frame,
            left_rows[0],
            &self.runs,
            self.selected,
            self.focused_pane == FocusedPane::Runs,
        );

        super::panes::render_output_pane(
            frame,
            left_rows[1],
            output,
            self.focused_pane == FocusedPane::Output,
            &mut self.output_scroll,
        );

        super::panes::render_source_pane(
            frame,
            columns[1],
            &self.source_code,
            covered,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        super::panes::render_status_bar(
            frame,
            main_chunks[1],
            summary,
            self.selected,
            self.runs.len(),
            failed,
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Left => self.select_previous(),
            KeyCode::Right => self.select_next(),
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Runs => self.select_previous(),
                FocusedPane::Source => {
                    self.source_scroll = self.source_scroll.saturating_sub(1);
                }
                FocusedPane::Output => {
                    self.output_scroll = self.output_scroll.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Runs => self.select_next(),
                // Render clamps the offsets to the content
                FocusedPane::Source => {
                    self.source_scroll = self.source_scroll.saturating_add(1);
                }
                FocusedPane::Output => {
                    self.output_scroll = self.output_scroll.saturating_add(1);
                }
            },
            _ => {}
        }
    }

    fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.output_scroll = 0;
        }
    }

    fn select_next(&mut self) {
        if self.selected + 1 < self.runs.len() {
            self.selected += 1;
            self.output_scroll = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn entry(label: &str, lines: &[usize]) -> RunEntry {
        RunEntry {
            label: label.to_string(),
            covered: lines.iter().copied().collect(),
            output: Vec::new(),
            percentage: Some(50.0),
            summary: String::new(),
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let mut app = App::new(vec![entry("1.in", &[1]), entry("2.in", &[2])], String::new());
        press(&mut app, KeyCode::Left);
        assert_eq!(app.selected, 0);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.selected, 1);
        assert_eq!(app.selected_run().map(|run| run.label.as_str()), Some("2.in"));
    }

    #[test]
    fn test_focus_cycles_and_quit() {
        let mut app = App::new(Vec::new(), String::new());
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focused_pane, FocusedPane::Source);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focused_pane, FocusedPane::Runs);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
