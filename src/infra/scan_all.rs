use crate::domain::{Session, SessionEngine};
use crate::infra::{
    ResolveDirError, ScanOutput, ScanWarningCount, resolve_claude_projects_dir,
    resolve_codex_sessions_dir, scan_claude_projects_dir, scan_codex_sessions_dir,
};
use std::cmp::Reverse;
use std::path::{Path, PathBuf};
use std::thread::{self, ScopedJoinHandle};
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct MultiEngineScanOutput {
    /// Newest first.
    pub sessions: Vec<Session>,
    pub warnings: ScanWarningCount,
    pub notice: Option<String>,
}

/// Resolves every enabled engine root and scans them side by side.
///
/// `only` limits the scan to one engine.
pub fn scan_all_sessions(only: Option<SessionEngine>) -> MultiEngineScanOutput {
    let wants = |engine: SessionEngine| only.is_none_or(|only| only == engine);
    let mut notices: Vec<String> = Vec::new();

    let claude_projects_dir = if wants(SessionEngine::Claude) {
        resolve_root(resolve_claude_projects_dir(), "Claude projects dir", &mut notices)
    } else {
        None
    };
    let codex_sessions_dir = if wants(SessionEngine::Codex) {
        resolve_root(resolve_codex_sessions_dir(), "Codex sessions dir", &mut notices)
    } else {
        None
    };

    scan_all_sessions_with_dirs(
        claude_projects_dir.as_deref(),
        codex_sessions_dir.as_deref(),
        notices,
    )
}

fn resolve_root(
    resolved: Result<PathBuf, ResolveDirError>,
    label: &str,
    notices: &mut Vec<String>,
) -> Option<PathBuf> {
    match resolved {
        Ok(dir) => Some(dir),
        Err(ResolveDirError::HomeDirNotFound) => {
            notices.push(format!("{label} disabled: home directory not found"));
            None
        }
    }
}

fn scan_all_sessions_with_dirs(
    claude_projects_dir: Option<&Path>,
    codex_sessions_dir: Option<&Path>,
    notices: Vec<String>,
) -> MultiEngineScanOutput {
    let outputs = thread::scope(|scope| {
        let claude = claude_projects_dir
            .map(|dir| scope.spawn(move || scan_claude_projects_dir(dir)));
        let codex = codex_sessions_dir
            .map(|dir| scope.spawn(move || scan_codex_sessions_dir(dir)));

        [join_scan(claude, "Claude"), join_scan(codex, "Codex")]
    });

    let mut output = merge_scan_outputs(outputs.into_iter().flatten());
    output.notice = join_notices(notices.into_iter().chain(output.notice));
    info!(
        sessions = output.sessions.len(),
        warnings = output.warnings.get(),
        "session scan finished"
    );
    output
}

/// A scanner that panicked contributes nothing but a notice.
fn join_scan(handle: Option<ScopedJoinHandle<'_, ScanOutput>>, label: &str) -> Option<ScanOutput> {
    let handle = handle?;
    match handle.join() {
        Ok(output) => Some(output),
        Err(_panic) => {
            warn!(engine = label, "session scanner panicked");
            Some(ScanOutput::unavailable(format!("{label} scan failed")))
        }
    }
}

/// Concatenates per-engine results and orders them newest first.
///
/// The sort is stable, so sessions with equal timestamps keep their scan order.
fn merge_scan_outputs(outputs: impl IntoIterator<Item = ScanOutput>) -> MultiEngineScanOutput {
    let mut sessions: Vec<Session> = Vec::new();
    let mut warnings = 0usize;
    let mut notices: Vec<String> = Vec::new();

    for output in outputs {
        warnings += output.warnings.get();
        sessions.extend(output.sessions);
        notices.extend(output.notice);
    }

    sessions.sort_by_key(|session| Reverse(session.modified));

    MultiEngineScanOutput {
        sessions,
        warnings: ScanWarningCount::from(warnings),
        notice: join_notices(notices),
    }
}

fn join_notices(notices: impl IntoIterator<Item = String>) -> Option<String> {
    let text = notices
        .into_iter()
        .map(|notice| notice.trim().to_string())
        .filter(|notice| !notice.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewSession;
    use proptest::prelude::*;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    fn session(id: &str, engine: SessionEngine, secs: u64) -> Session {
        Session::build(NewSession {
            id: id.to_string(),
            engine,
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
            cwd: PathBuf::from("/w/p"),
            summary: String::new(),
            log_path: PathBuf::from(format!("/logs/{id}.jsonl")),
            team_name: None,
        })
        .expect("session")
    }

    #[test]
    fn scans_claude_when_codex_missing() {
        let dir = tempdir().expect("tempdir");
        let codex_sessions_dir = dir.path().join("missing-codex");
        let claude_projects = dir.path().join("claude").join("projects");
        let key_dir = claude_projects.join("k");
        fs::create_dir_all(&key_dir).expect("create");
        fs::write(
            key_dir.join("s.jsonl"),
            r#"{"type":"user","cwd":"/tmp/p","sessionId":"s","message":{"content":"hello"}}"#,
        )
        .expect("write");

        let output = scan_all_sessions_with_dirs(
            Some(&claude_projects),
            Some(&codex_sessions_dir),
            Vec::new(),
        );

        assert_eq!(output.sessions.len(), 1);
        assert_eq!(output.sessions[0].summary, "hello");
        let notice = output.notice.expect("notice");
        assert!(notice.contains("Codex sessions dir not found"));
    }

    #[test]
    fn empty_roots_yield_no_sessions() {
        let dir = tempdir().expect("tempdir");
        let claude = dir.path().join("claude");
        let codex = dir.path().join("codex");
        fs::create_dir_all(&claude).expect("create");
        fs::create_dir_all(&codex).expect("create");

        let output = scan_all_sessions_with_dirs(Some(&claude), Some(&codex), Vec::new());
        assert!(output.sessions.is_empty());
        assert_eq!(output.warnings.get(), 0);
        assert!(output.notice.is_none());
    }

    #[test]
    fn skipped_engines_are_not_scanned() {
        let output = scan_all_sessions_with_dirs(None, None, vec!["resolve failed".to_string()]);
        assert!(output.sessions.is_empty());
        assert_eq!(output.notice.as_deref(), Some("resolve failed"));
    }

    #[test]
    fn merge_interleaves_engines_by_time() {
        let claude = ScanOutput {
            sessions: vec![session("c-old", SessionEngine::Claude, 10), session("c-new", SessionEngine::Claude, 30)],
            warnings: ScanWarningCount::from(1usize),
            notice: None,
        };
        let codex = ScanOutput {
            sessions: vec![session("x-mid", SessionEngine::Codex, 20)],
            warnings: ScanWarningCount::from(2usize),
            notice: Some("partial".to_string()),
        };

        let output = merge_scan_outputs([claude, codex]);
        let ids: Vec<&str> = output.sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["c-new", "x-mid", "c-old"]);
        assert_eq!(output.warnings.get(), 3);
        assert_eq!(output.notice.as_deref(), Some("partial"));
    }

    proptest! {
        #[test]
        fn merged_sessions_are_newest_first(
            claude_times in proptest::collection::vec(0u64..1_000, 0..20),
            codex_times in proptest::collection::vec(0u64..1_000, 0..20),
        ) {
            let build = |times: &[u64], engine: SessionEngine, prefix: &str| ScanOutput {
                sessions: times
                    .iter()
                    .enumerate()
                    .map(|(i, secs)| session(&format!("{prefix}-{i:04}"), engine, *secs))
                    .collect(),
                warnings: ScanWarningCount::default(),
                notice: None,
            };
            let output = merge_scan_outputs([
                build(&claude_times, SessionEngine::Claude, "claude"),
                build(&codex_times, SessionEngine::Codex, "codex"),
            ]);

            prop_assert_eq!(output.sessions.len(), claude_times.len() + codex_times.len());
            for pair in output.sessions.windows(2) {
                prop_assert!(pair[0].modified >= pair[1].modified);
            }
        }
    }
}
