use crate::domain::{
    ClaudeUserContent, Message, NewSession, Session, SessionEngine, TranscriptBuilder,
    clean_claude_summary, parse_claude_assistant_content, parse_claude_prompt_line,
    parse_claude_session_header, parse_claude_user_content, parse_json_line, str_field,
    truncate_summary,
};
use crate::infra::{
    BoundedLines, ResolveDirError, SCAN_MAX_LINE_BYTES, ScanError, ScanOutput, ScanWarningCount,
    TRANSCRIPT_MAX_LINE_BYTES,
};
use dirs::home_dir;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, trace, warn};

/// Lines searched for the first record that names its session.
const HEADER_SCAN_LINES: usize = 10;
/// Further lines searched for a usable user prompt when the header has none.
const PROMPT_LOOKAHEAD_LINES: usize = 20;

pub fn resolve_claude_projects_dir() -> Result<PathBuf, ResolveDirError> {
    if let Some(override_dir) = std::env::var_os("CLAUDE_PROJECTS_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let Some(home) = home_dir() else {
        return Err(ResolveDirError::HomeDirNotFound);
    };

    Ok(home.join(".claude").join("projects"))
}

/// Scans `<projects>/<project-key>/*.jsonl`.
///
/// Sub-directories inside a project hold sub-agent traces and are not sessions.
pub fn scan_claude_projects_dir(projects_dir: &Path) -> ScanOutput {
    if !projects_dir.exists() {
        return ScanOutput::unavailable(format!(
            "Claude projects dir not found: {}",
            projects_dir.display()
        ));
    }

    let Ok(entries) = fs::read_dir(projects_dir) else {
        warn!(path = %projects_dir.display(), "Claude projects dir is not readable");
        return ScanOutput::unavailable(format!(
            "Claude projects dir is not readable: {}",
            projects_dir.display()
        ));
    };

    let mut warnings = 0usize;
    let mut sessions: Vec<Session> = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => {
                warnings += 1;
                continue;
            }
        };

        let Ok(file_type) = entry.file_type() else {
            warnings += 1;
            continue;
        };
        if !file_type.is_dir() {
            continue;
        }

        let output = scan_claude_project_key_dir(&entry.path());
        warnings += output.warnings;
        sessions.extend(output.sessions);
    }

    debug!(
        path = %projects_dir.display(),
        sessions = sessions.len(),
        warnings,
        "scanned Claude projects"
    );

    ScanOutput {
        sessions,
        warnings: ScanWarningCount::from(warnings),
        notice: None,
    }
}

struct ScanProjectKeyOutput {
    sessions: Vec<Session>,
    warnings: usize,
}

fn scan_claude_project_key_dir(project_key_dir: &Path) -> ScanProjectKeyOutput {
    let mut sessions: Vec<Session> = Vec::new();
    let mut warnings = 0usize;

    let entries = match fs::read_dir(project_key_dir) {
        Ok(entries) => entries,
        Err(_) => {
            return ScanProjectKeyOutput {
                sessions,
                warnings: 1,
            };
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => {
                warnings += 1;
                continue;
            }
        };

        let Ok(file_type) = entry.file_type() else {
            warnings += 1;
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() || path.extension().and_then(|ext| ext.to_str()) != Some("jsonl") {
            continue;
        }

        match scan_claude_session_file(&path) {
            Ok(session) => sessions.push(session),
            Err(ScanError::MissingSessionId(_)) => {
                trace!(path = %path.display(), "no session id in Claude log head");
            }
            Err(error) => {
                warn!(%error, "skipping Claude log");
                warnings += 1;
            }
        }
    }

    ScanProjectKeyOutput { sessions, warnings }
}

fn scan_claude_session_file(path: &Path) -> Result<Session, ScanError> {
    let read_error = |error: io::Error| ScanError::ReadFile(format!("{}: {error}", path.display()));

    let file = File::open(path).map_err(read_error)?;
    let metadata = file.metadata().map_err(read_error)?;
    let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

    let mut lines = BoundedLines::new(BufReader::new(file), SCAN_MAX_LINE_BYTES);

    let mut header = None;
    for _ in 0..HEADER_SCAN_LINES {
        let Some(Ok(line)) = lines.next_line() else {
            break;
        };
        let Ok(value) = parse_json_line(line) else {
            continue;
        };
        if let Some(found) = parse_claude_session_header(&value) {
            header = Some(found);
            break;
        }
    }
    let Some(header) = header else {
        return Err(ScanError::MissingSessionId(path.display().to_string()));
    };

    let mut summary = header
        .first_prompt
        .as_deref()
        .map(clean_claude_summary)
        .unwrap_or_default();

    if header.line_type.as_deref() != Some("user") || summary.is_empty() {
        for _ in 0..PROMPT_LOOKAHEAD_LINES {
            let Some(Ok(line)) = lines.next_line() else {
                break;
            };
            let Ok(value) = parse_json_line(line) else {
                continue;
            };
            if let Some(prompt) = parse_claude_prompt_line(&value) {
                summary = prompt;
                break;
            }
        }
    }

    Session::build(NewSession {
        id: header.session_id,
        engine: SessionEngine::Claude,
        modified,
        cwd: PathBuf::from(header.cwd.unwrap_or_default()),
        summary: truncate_summary(&summary),
        log_path: path.to_path_buf(),
        team_name: header.team_name,
    })
    .ok_or_else(|| ScanError::MissingSessionId(path.display().to_string()))
}

pub fn load_claude_transcript(path: &Path) -> io::Result<Vec<Message>> {
    let file = File::open(path)?;
    Ok(read_claude_transcript(BufReader::new(file), path))
}

/// `path` only labels log records.
fn read_claude_transcript(reader: impl BufRead, path: &Path) -> Vec<Message> {
    let mut lines = BoundedLines::new(reader, TRANSCRIPT_MAX_LINE_BYTES);
    let mut builder = TranscriptBuilder::new();
    let mut skipped = 0usize;

    while let Some(line) = lines.next_line() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                warn!(path = %path.display(), %error, "Claude transcript read stopped");
                builder.abort(error.transcript_abort());
                break;
            }
        };
        let Ok(value) = parse_json_line(line) else {
            skipped += 1;
            continue;
        };

        match str_field(&value, "type") {
            Some("user") => {
                if let ClaudeUserContent::Text(text) = parse_claude_user_content(&value) {
                    builder.push_user(text);
                }
            }
            Some("assistant") => {
                let content = parse_claude_assistant_content(&value);
                builder.push_assistant(content.text, content.tool_calls);
            }
            _ => {}
        }
    }

    let messages = builder.finish();
    debug!(
        path = %path.display(),
        messages = messages.len(),
        skipped,
        "loaded Claude transcript"
    );
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OVERSIZED_LINE_NOTE, PARSE_ERROR_NOTE, Role};
    use crate::infra::failing_after;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_lines(path: &Path, lines: &[&str]) {
        let mut file = File::create(path).expect("create log");
        for line in lines {
            writeln!(file, "{line}").expect("write");
        }
    }

    #[test]
    fn scans_first_user_line() {
        let dir = tempdir().expect("tempdir");
        let key_dir = dir.path().join("-home-u-proj");
        fs::create_dir_all(&key_dir).expect("create");
        write_lines(
            &key_dir.join("abc123def456.jsonl"),
            &[
                r#"{"type":"user","sessionId":"abc123def456","cwd":"/home/u/proj","message":{"role":"user","content":"Fix the bug"}}"#,
            ],
        );

        let output = scan_claude_projects_dir(dir.path());
        assert!(output.notice.is_none());
        assert_eq!(output.warnings.get(), 0);
        assert_eq!(output.sessions.len(), 1);
        let session = &output.sessions[0];
        assert_eq!(session.id, "abc123def456");
        assert_eq!(session.short_id, "abc1..f456");
        assert_eq!(session.project, "proj");
        assert_eq!(session.summary, "Fix the bug");
        assert_eq!(session.engine, SessionEngine::Claude);
    }

    #[test]
    fn skips_leading_lines_without_session_id() {
        let dir = tempdir().expect("tempdir");
        let key_dir = dir.path().join("k");
        fs::create_dir_all(&key_dir).expect("create");
        write_lines(
            &key_dir.join("s.jsonl"),
            &[
                r#"{"type":"file-history-snapshot","snapshot":{}}"#,
                "not json at all",
                r#"{"type":"summary","sessionId":"sess-0001","cwd":"/w/app"}"#,
                r#"{"type":"user","sessionId":"sess-0001","message":{"content":[{"type":"tool_result","content":"x"}]}}"#,
                r#"{"type":"user","sessionId":"sess-0001","message":{"content":"<teammate-message from=\"lead\">Review the parser</teammate-message>"}}"#,
            ],
        );

        let output = scan_claude_projects_dir(dir.path());
        assert_eq!(output.sessions.len(), 1);
        assert_eq!(output.sessions[0].summary, "Review the parser");
        assert_eq!(output.sessions[0].project, "app");
    }

    #[test]
    fn lookahead_takes_first_non_empty_user_line_verbatim() {
        let dir = tempdir().expect("tempdir");
        let key_dir = dir.path().join("k");
        fs::create_dir_all(&key_dir).expect("create");
        write_lines(
            &key_dir.join("s.jsonl"),
            &[
                r#"{"type":"summary","sessionId":"sess-look","cwd":"/w/app"}"#,
                r#"{"type":"user","sessionId":"sess-look","message":{"content":""}}"#,
                r#"{"type":"user","sessionId":"sess-look","message":{"content":"<local-command-stdout></local-command-stdout>"}}"#,
                r#"{"type":"user","sessionId":"sess-look","message":{"content":"You are a bot. Your task is X"}}"#,
            ],
        );

        let output = scan_claude_projects_dir(dir.path());
        assert_eq!(output.sessions.len(), 1);
        assert_eq!(
            output.sessions[0].summary,
            "<local-command-stdout></local-command-stdout>"
        );
    }

    #[test]
    fn discards_files_without_session_id_in_head() {
        let dir = tempdir().expect("tempdir");
        let key_dir = dir.path().join("k");
        fs::create_dir_all(&key_dir).expect("create");
        let mut lines = vec![r#"{"type":"file-history-snapshot"}"#; 10];
        lines.push(r#"{"type":"user","sessionId":"late","message":{"content":"hi"}}"#);
        write_lines(&key_dir.join("late.jsonl"), &lines);

        let output = scan_claude_projects_dir(dir.path());
        assert!(output.sessions.is_empty());
        assert_eq!(output.warnings.get(), 0);
    }

    #[test]
    fn keeps_session_with_empty_summary() {
        let dir = tempdir().expect("tempdir");
        let key_dir = dir.path().join("k");
        fs::create_dir_all(&key_dir).expect("create");
        write_lines(
            &key_dir.join("s.jsonl"),
            &[r#"{"type":"assistant","sessionId":"s-empty-summary","cwd":"."}"#],
        );

        let output = scan_claude_projects_dir(dir.path());
        assert_eq!(output.sessions.len(), 1);
        assert_eq!(output.sessions[0].summary, "");
        assert_eq!(output.sessions[0].project, "unknown");
    }

    #[test]
    fn delegated_prompt_uses_task_sentence_and_team() {
        let dir = tempdir().expect("tempdir");
        let key_dir = dir.path().join("k");
        fs::create_dir_all(&key_dir).expect("create");
        write_lines(
            &key_dir.join("s.jsonl"),
            &[
                r#"{"type":"user","sessionId":"team-session-1","teamName":"blue","cwd":"/w/api","message":{"content":"You are a tester.\nYour task is to run the suite"}}"#,
            ],
        );

        let output = scan_claude_projects_dir(dir.path());
        let session = &output.sessions[0];
        assert_eq!(session.summary, "Your task is to run the suite");
        assert_eq!(session.team_name.as_deref(), Some("blue"));
    }

    #[test]
    fn ignores_subagent_directories_and_other_files() {
        let dir = tempdir().expect("tempdir");
        let key_dir = dir.path().join("k");
        let sub_dir = key_dir.join("subagents");
        fs::create_dir_all(&sub_dir).expect("create");
        let line = r#"{"type":"user","sessionId":"agent-1","message":{"content":"x"}}"#;
        write_lines(&sub_dir.join("agent.jsonl"), &[line]);
        write_lines(&key_dir.join("notes.txt"), &[line]);
        write_lines(&dir.path().join("stray.jsonl"), &[line]);

        let output = scan_claude_projects_dir(dir.path());
        assert!(output.sessions.is_empty());
    }

    #[test]
    fn missing_projects_dir_returns_notice() {
        let dir = tempdir().expect("tempdir");
        let output = scan_claude_projects_dir(&dir.path().join("missing"));
        assert!(output.sessions.is_empty());
        assert!(output.notice.is_some());
    }

    #[test]
    fn transcript_merges_assistant_lines_and_hides_tool_results() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("s.jsonl");
        write_lines(
            &path,
            &[
                r#"{"type":"user","message":{"role":"user","content":"Fix the bug"}}"#,
                r#"{"type":"assistant","message":{"content":[{"type":"text","text":"A"},{"type":"tool_use","name":"Bash","input":{"command":"cargo test"}}]}}"#,
                r#"{"type":"user","message":{"content":[{"type":"tool_result","content":"ok"}]}}"#,
                r#"{"type":"progress","data":{}}"#,
                "{broken",
                r#"{"type":"assistant","message":{"content":[{"type":"text","text":"B"}]}}"#,
                r#"{"type":"user","message":{"content":"<system-reminder>ignore</system-reminder>"}}"#,
                r#"{"type":"user","message":{"content":[{"type":"text","text":"thanks"}]}}"#,
            ],
        );

        let messages = load_claude_transcript(&path).expect("load");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "Fix the bug");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text, "A\nB");
        assert_eq!(messages[1].tool_calls, vec!["Bash: cargo test"]);
        assert_eq!(messages[2].text, "thanks");
        assert_eq!(messages[2].index, 2);
    }

    #[test]
    fn transcript_reports_oversized_line() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("s.jsonl");
        let huge = format!(
            r#"{{"type":"user","message":{{"content":"{}"}}}}"#,
            "x".repeat(TRANSCRIPT_MAX_LINE_BYTES + 1)
        );
        write_lines(
            &path,
            &[
                r#"{"type":"user","message":{"content":"before"}}"#,
                &huge,
                r#"{"type":"user","message":{"content":"after"}}"#,
            ],
        );

        let messages = load_claude_transcript(&path).expect("load");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "before");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text, OVERSIZED_LINE_NOTE);
    }

    #[test]
    fn transcript_notes_read_failure_after_parsed_messages() {
        let input = concat!(
            r#"{"type":"user","message":{"content":"before"}}"#,
            "\n",
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"reply"}]}}"#,
            "\n",
        );
        let messages = read_claude_transcript(failing_after(input), Path::new("s.jsonl"));

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].text, "before");
        assert_eq!(messages[1].text, "reply");
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].text, PARSE_ERROR_NOTE);
        assert_eq!(messages[2].index, 2);
    }
}
