use crate::domain::{Session, SessionEngine, format_list_time};
use std::io::{self, Write};
use thiserror::Error;
use time::UtcOffset;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Tui { engine: Option<SessionEngine> },
    List { engine: Option<SessionEngine> },
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: String, value: String },

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

/// Parses `args` including the program name in position 0.
pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut engine: Option<SessionEngine> = None;
    let mut list = false;
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--list" | "-l" | "list" => list = true,
            "--engine" | "-e" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--engine".to_string()))?;
                engine = parse_engine_flag("--engine", value)?;
            }
            _ if arg.starts_with("--engine=") => {
                engine = parse_engine_flag("--engine", &arg["--engine=".len()..])?;
            }
            _ if arg.starts_with('-') => return Err(CliParseError::UnknownFlag(arg.to_string())),
            _ => return Err(CliParseError::UnexpectedArgument(arg.to_string())),
        }
    }

    if list {
        Ok(CliInvocation::List { engine })
    } else {
        Ok(CliInvocation::Tui { engine })
    }
}

fn parse_engine_flag(flag: &str, value: &str) -> Result<Option<SessionEngine>, CliParseError> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "all" => Ok(None),
        "claude" | "cl" => Ok(Some(SessionEngine::Claude)),
        "codex" | "cx" => Ok(Some(SessionEngine::Codex)),
        other => Err(CliParseError::InvalidFlagValue {
            flag: flag.to_string(),
            value: other.to_string(),
        }),
    }
}

pub fn help_text() -> String {
    format!(
        "{name} - browse and resume Claude Code and Codex sessions\n\nUSAGE:\n  {name} [--engine ENGINE]          Start the interactive browser\n  {name} --list [--engine ENGINE]   Print sessions, newest first (alias: {name} list)\n  {name} --help | --version\n\nENGINE:\n  --engine NAME  Filter by source: all|claude|codex (default: all)\n\nOUTPUT (--list):\n  source │ session-id │ MM-DD HH:MM │ project │ summary\n\nENV:\n  CLAUDE_PROJECTS_DIR   Override Claude projects dir (default: ~/.claude/projects)\n  CODEX_SESSIONS_DIR    Override Codex sessions dir (default: ~/.codex/sessions)\n  VBS_LOG               Enable logging with a tracing filter (e.g. debug)\n  VBS_LOG_FILE          Log file path (default: <temp dir>/vbs.log)\n",
        name = env!("CARGO_PKG_NAME")
    )
}

/// One row of the plain-text listing; the layout is stable for scripting.
pub fn format_listing_line(session: &Session, offset: UtcOffset) -> String {
    format!(
        "{:<6} │ {} │ {} │ {:<14} │ {}",
        session.engine.label(),
        session.short_id,
        format_list_time(session.modified, offset),
        session.project,
        session.display_summary()
    )
}

/// Prints the empty-result message when nothing was found; `true` means stop here.
pub fn report_no_sessions(out: &mut impl Write, sessions: &[Session]) -> io::Result<bool> {
    if !sessions.is_empty() {
        return Ok(false);
    }
    let _ = write_line(out, "No sessions found.")?;
    Ok(true)
}

/// Writes every session, stopping quietly when the reader closes the pipe.
pub fn write_listing(
    out: &mut impl Write,
    sessions: &[Session],
    offset: UtcOffset,
) -> io::Result<()> {
    for session in sessions {
        if !write_line(out, &format_listing_line(session, offset))? {
            break;
        }
    }
    Ok(())
}

pub fn write_scan_notice(
    err: &mut impl Write,
    notice: Option<&str>,
    warnings: usize,
) -> io::Result<()> {
    if let Some(notice) = notice {
        let _ = write_line(err, notice)?;
    }
    if warnings > 0 {
        let _ = write_line(err, &format!("warnings: {warnings}"))?;
    }
    Ok(())
}

fn write_line(out: &mut impl Write, line: &str) -> io::Result<bool> {
    match writeln!(out, "{line}") {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(error) => Err(error),
    }
}
