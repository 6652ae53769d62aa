//! linecov: statement coverage of a script, one traced run per input file

mod cli;

use std::io;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, EXIT_FAILURE, EXIT_SUCCESS};
use linecov::runner::{discover_inputs, BatchReport, RunReport, Runner};
use linecov::ui::App;

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the reports
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_directive())),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    std::process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    let runner = match Runner::load(&cli.script, cli.runner_config()) {
        Ok(runner) => runner,
        Err(err) => {
            eprintln!("Error: {}", err);
            return EXIT_FAILURE;
        }
    };

    let inputs = match discover_inputs(&cli.input, &cli.ext) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("Error: {}", err);
            return EXIT_FAILURE;
        }
    };
    if inputs.is_empty() {
        warn!(dir = %cli.input.display(), ext = %cli.ext, "no input files found");
    }

    let mut batch = BatchReport::default();
    for input in inputs {
        if !cli.no_echo {
            println!("{}", runner.source());
        }
        println!("{}", input.display());

        let result = runner.run_input(&input);
        match &result {
            Ok(report) => print_report(report),
            Err(err) => eprintln!("Error: {}", err),
        }
        batch.push(input, result);
    }
    info!(runs = batch.len(), failures = batch.failures(), "batch finished");

    if cli.tui {
        if let Err(err) = run_viewer(&batch, runner.source()) {
            eprintln!("Error: {}", err);
            return EXIT_FAILURE;
        }
    }

    if batch.is_success() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

fn print_report(report: &RunReport) {
    for line in &report.output {
        println!("{}", line);
    }
    println!("{}", report.coverage_text());
    if let Some(listing) = &report.listing {
        print!("{}", listing);
    }
    println!("{}", report.summary());
}

fn run_viewer(batch: &BatchReport, source: &str) -> io::Result<()> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::from_batch(batch, source.to_string());
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}
