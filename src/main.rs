mod app;
mod cli;
mod domain;
mod infra;
mod ui;

use crate::app::{AppCommand, AppData, AppEvent, AppModel, EngineFilter};
use crate::cli::CliInvocation;
use crate::domain::{SessionEngine, resolve_local_offset};
use crate::infra::{
    MultiEngineScanOutput, load_session_transcript, resolve_launch_shell, run_launch_command,
    scan_all_sessions,
};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::size as terminal_size;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::File;
use std::io::{self, Stdout, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::sync::mpsc::{Sender, channel};
use std::time::Duration;
use thiserror::Error;
use time::UtcOffset;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    App(#[from] crate::app::AppError),

    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),

    #[error("Failed to launch: {0}")]
    Launch(#[source] io::Error),
}

/// How the interactive session ended.
enum TuiOutcome {
    Quit,
    Launch(String),
}

fn main() -> ExitCode {
    // Must precede every thread spawn, logging included.
    let utc_offset = resolve_local_offset();
    init_logging();

    match run_main(utc_offset) {
        Ok(code) => code,
        Err(error) => {
            warn!(%error, "exiting with error");
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            ExitCode::from(1)
        }
    }
}

fn run_main(utc_offset: UtcOffset) -> Result<ExitCode, MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            return Ok(ExitCode::from(2));
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        CliInvocation::List { engine } => run_list(engine, utc_offset),
        CliInvocation::Tui { engine } => run_tui(engine, utc_offset),
    }
}

fn print_help() {
    let mut out = io::stdout().lock();
    let _ = write!(out, "{}", crate::cli::help_text());
}

/// Installs a file logger when `VBS_LOG` holds a filter directive.
fn init_logging() {
    let Some(directive) = std::env::var("VBS_LOG").ok().filter(|value| !value.trim().is_empty())
    else {
        return;
    };
    let path = std::env::var_os("VBS_LOG_FILE")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("vbs.log"));
    let Ok(file) = File::options().create(true).append(true).open(&path) else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn scan(engine: Option<SessionEngine>) -> MultiEngineScanOutput {
    let output = scan_all_sessions(engine);
    info!(
        sessions = output.sessions.len(),
        warnings = output.warnings.get(),
        "scan complete"
    );
    output
}

/// `true` when there is nothing to show and the caller should exit.
fn nothing_to_show(output: &MultiEngineScanOutput) -> Result<bool, MainError> {
    let mut out = io::stdout().lock();
    crate::cli::report_no_sessions(&mut out, &output.sessions).map_err(MainError::Output)
}

fn run_list(engine: Option<SessionEngine>, utc_offset: UtcOffset) -> Result<ExitCode, MainError> {
    let output = scan(engine);
    {
        let mut err = io::stderr().lock();
        let _ = crate::cli::write_scan_notice(
            &mut err,
            output.notice.as_deref(),
            output.warnings.get(),
        );
    }
    if nothing_to_show(&output)? {
        return Ok(ExitCode::SUCCESS);
    }

    let mut out = io::stdout().lock();
    crate::cli::write_listing(&mut out, &output.sessions, utc_offset).map_err(MainError::Output)?;
    Ok(ExitCode::SUCCESS)
}

fn run_tui(engine: Option<SessionEngine>, utc_offset: UtcOffset) -> Result<ExitCode, MainError> {
    let output = scan(engine);
    if nothing_to_show(&output)? {
        return Ok(ExitCode::SUCCESS);
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let data = AppData {
        sessions: output.sessions,
        warnings: output.warnings,
        notice: output.notice,
        cwd,
        utc_offset,
    };
    let size = terminal_size().unwrap_or((80, 24));
    let mut model = AppModel::new(data, EngineFilter::from(engine), size);

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, &mut model);
    restore_terminal(&mut terminal)?;

    match result? {
        TuiOutcome::Quit => Ok(ExitCode::SUCCESS),
        TuiOutcome::Launch(command) => launch(&command),
    }
}

/// Hands `command` to the user's shell; its exit status becomes ours.
fn launch(command: &str) -> Result<ExitCode, MainError> {
    let shell = resolve_launch_shell();
    let status = run_launch_command(&shell, command).map_err(MainError::Launch)?;
    debug!(?status, "launch finished");
    let code = status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(1);
    Ok(ExitCode::from(code))
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, crate::app::AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), crate::app::AppError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    model: &mut AppModel,
) -> Result<TuiOutcome, crate::app::AppError> {
    let (transcript_tx, transcript_rx) = channel::<AppEvent>();

    loop {
        while let Ok(loaded) = transcript_rx.try_recv() {
            let (next, _command) = app::update(model.clone(), loaded);
            *model = next;
        }

        terminal.draw(|frame| ui::render(frame, model))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }
        let app_event = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Release => continue,
            Event::Key(key) => AppEvent::Key(key),
            Event::Resize(width, height) => AppEvent::Resize(width, height),
            _ => continue,
        };

        let (next, command) = app::update(model.clone(), app_event);
        *model = next;
        match command {
            AppCommand::None => {}
            AppCommand::Quit => return Ok(TuiOutcome::Quit),
            AppCommand::Launch { command } => return Ok(TuiOutcome::Launch(command)),
            AppCommand::LoadTranscript { log_path, engine } => {
                spawn_transcript_load(transcript_tx.clone(), log_path, engine);
            }
        }
    }
}

/// Parses a transcript off the UI thread; the result is tagged with the file it read.
fn spawn_transcript_load(tx: Sender<AppEvent>, log_path: PathBuf, engine: SessionEngine) {
    std::thread::spawn(move || {
        let result = load_session_transcript(&log_path, engine).map_err(|error| error.to_string());
        if let Err(error) = &result {
            warn!(log_path = %log_path.display(), %error, "transcript load failed");
        }
        let _ = tx.send(AppEvent::TranscriptLoaded { log_path, result });
    });
}
