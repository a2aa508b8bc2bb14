use crate::domain::{
    NewSession, Session, SessionEngine, is_codex_summary_candidate, parse_codex_session_meta,
    parse_codex_user_prompt, parse_json_line, truncate_summary,
};
use crate::infra::{BoundedLines, SCAN_MAX_LINE_BYTES};
use dirs::home_dir;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Codex writes the meta line and the first prompt near the top of the log.
const CODEX_HEAD_SCAN_LINES: usize = 50;
const CODEX_EMPTY_SUMMARY: &str = "(no message)";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScanWarningCount(usize);

impl From<usize> for ScanWarningCount {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl ScanWarningCount {
    pub fn get(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read session file: {0}")]
    ReadFile(String),

    #[error("no session id in {0}")]
    MissingSessionId(String),
}

#[derive(Debug, Error)]
pub enum ResolveDirError {
    #[error("home directory not found")]
    HomeDirNotFound,
}

/// Sessions found under one engine's root.
///
/// A missing or unreadable root is not an error: it yields no sessions and a notice.
#[derive(Clone, Debug, Default)]
pub struct ScanOutput {
    pub sessions: Vec<Session>,
    pub warnings: ScanWarningCount,
    pub notice: Option<String>,
}

impl ScanOutput {
    pub(crate) fn unavailable(notice: String) -> Self {
        Self {
            sessions: Vec::new(),
            warnings: ScanWarningCount::default(),
            notice: Some(notice),
        }
    }
}

pub fn resolve_codex_sessions_dir() -> Result<PathBuf, ResolveDirError> {
    if let Some(override_dir) = std::env::var_os("CODEX_SESSIONS_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let Some(home) = home_dir() else {
        return Err(ResolveDirError::HomeDirNotFound);
    };

    Ok(home.join(".codex").join("sessions"))
}

pub fn scan_codex_sessions_dir(sessions_dir: &Path) -> ScanOutput {
    if !sessions_dir.exists() {
        return ScanOutput::unavailable(format!(
            "Codex sessions dir not found: {}",
            sessions_dir.display()
        ));
    }

    let mut warnings = 0usize;
    let mut sessions: Vec<Session> = Vec::new();

    let walker = WalkDir::new(sessions_dir).follow_links(false).into_iter();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_error) => {
                warnings += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|ext| ext.to_str()) != Some("jsonl") {
            continue;
        }

        match scan_codex_session_file(entry.path()) {
            Ok(session) => sessions.push(session),
            Err(ScanError::MissingSessionId(path)) => {
                trace!(%path, "no session_meta id in Codex log head");
            }
            Err(error) => {
                warn!(%error, "skipping Codex log");
                warnings += 1;
            }
        }
    }

    debug!(
        path = %sessions_dir.display(),
        sessions = sessions.len(),
        warnings,
        "scanned Codex sessions"
    );

    ScanOutput {
        sessions,
        warnings: ScanWarningCount::from(warnings),
        notice: None,
    }
}

fn scan_codex_session_file(path: &Path) -> Result<Session, ScanError> {
    let read_error = |error: io::Error| ScanError::ReadFile(format!("{}: {error}", path.display()));

    let file = File::open(path).map_err(read_error)?;
    let metadata = file.metadata().map_err(read_error)?;
    let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

    let mut lines = BoundedLines::new(BufReader::new(file), SCAN_MAX_LINE_BYTES);
    let mut session_id: Option<String> = None;
    let mut cwd: Option<String> = None;
    let mut summary: Option<String> = None;

    for _ in 0..CODEX_HEAD_SCAN_LINES {
        let Some(Ok(line)) = lines.next_line() else {
            break;
        };
        let Ok(value) = parse_json_line(line) else {
            continue;
        };

        if let Some(meta) = parse_codex_session_meta(&value) {
            session_id = meta.id;
            cwd = meta.cwd;
        }

        if summary.is_none() {
            summary = parse_codex_user_prompt(&value).filter(|text| is_codex_summary_candidate(text));
        }

        if session_id.is_some() && summary.is_some() {
            break;
        }
    }

    let Some(id) = session_id else {
        return Err(ScanError::MissingSessionId(path.display().to_string()));
    };

    let summary = summary
        .map(|text| truncate_summary(&text))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| CODEX_EMPTY_SUMMARY.to_string());

    Session::build(NewSession {
        id,
        engine: SessionEngine::Codex,
        modified,
        cwd: PathBuf::from(cwd.unwrap_or_default()),
        summary,
        log_path: path.to_path_buf(),
        team_name: None,
    })
    .ok_or_else(|| ScanError::MissingSessionId(path.display().to_string()))
}
