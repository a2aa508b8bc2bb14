use crate::domain::{
    Message, Role, SessionEngine, TranscriptBuilder, parse_codex_message, parse_json_line,
};
use crate::infra::{BoundedLines, TRANSCRIPT_MAX_LINE_BYTES, load_claude_transcript};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LoadTranscriptError {
    #[error("failed to open session file: {0}")]
    OpenFile(#[from] io::Error),
}

/// Reconstructs the conversation stored in `path`.
///
/// Only failing to open the file is an error. Problems while reading end the transcript
/// with a trailer message instead.
pub fn load_session_transcript(
    path: &Path,
    engine: SessionEngine,
) -> Result<Vec<Message>, LoadTranscriptError> {
    if path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::IsADirectory,
            format!("path is a directory: {}", path.display()),
        )
        .into());
    }

    let messages = match engine {
        SessionEngine::Claude => load_claude_transcript(path)?,
        SessionEngine::Codex => load_codex_transcript(path)?,
    };
    Ok(messages)
}

fn load_codex_transcript(path: &Path) -> io::Result<Vec<Message>> {
    let file = File::open(path)?;
    Ok(read_codex_transcript(BufReader::new(file), path))
}

/// `path` only labels log records.
fn read_codex_transcript(reader: impl BufRead, path: &Path) -> Vec<Message> {
    let mut lines = BoundedLines::new(reader, TRANSCRIPT_MAX_LINE_BYTES);
    let mut builder = TranscriptBuilder::new();
    let mut skipped = 0usize;

    while let Some(line) = lines.next_line() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                warn!(path = %path.display(), %error, "Codex transcript read stopped");
                builder.abort(error.transcript_abort());
                break;
            }
        };
        let Ok(value) = parse_json_line(line) else {
            skipped += 1;
            continue;
        };
        let Some(message) = parse_codex_message(&value) else {
            continue;
        };

        match message.role {
            Role::User => builder.push_user(message.text),
            Role::Assistant => builder.push_assistant(message.text, Vec::new()),
        }
    }

    let messages = builder.finish();
    debug!(
        path = %path.display(),
        messages = messages.len(),
        skipped,
        "loaded Codex transcript"
    );
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OVERSIZED_LINE_NOTE, PARSE_ERROR_NOTE};
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
    fn codex_transcript_merges_assistant_and_skips_boilerplate() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("rollout.jsonl");
        write_lines(
            &path,
            &[
                r#"{"type":"session_meta","payload":{"id":"x","cwd":"/w"}}"#,
                r#"{"type":"response_item","payload":{"type":"message","role":"user","content":[{"type":"input_text","text":"<environment_context>/w</environment_context>"}]}}"#,
                r#"{"type":"response_item","payload":{"type":"message","role":"user","content":[{"type":"input_text","text":"Implement feature"}]}}"#,
                r#"{"type":"response_item","payload":{"type":"function_call","name":"shell","arguments":"{}"}}"#,
                r#"{"type":"response_item","payload":{"type":"message","role":"assistant","content":[{"type":"output_text","text":"Working"}]}}"#,
                r#"{"type":"event_msg","payload":{"type":"token_count"}}"#,
                r#"{"type":"response_item","payload":{"type":"message","role":"assistant","content":[{"type":"output_text","text":"Done"}]}}"#,
            ],
        );

        let messages = load_session_transcript(&path, SessionEngine::Codex).expect("load");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "Implement feature");
        assert_eq!(messages[1].text, "Working\nDone");
        assert_eq!(messages[1].index, 1);
    }

    #[test]
    fn codex_transcript_stops_at_oversized_line() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("rollout.jsonl");
        let huge = "z".repeat(TRANSCRIPT_MAX_LINE_BYTES + 10);
        write_lines(
            &path,
            &[
                r#"{"type":"response_item","payload":{"type":"message","role":"assistant","content":[{"type":"output_text","text":"partial"}]}}"#,
                &huge,
            ],
        );

        let messages = load_session_transcript(&path, SessionEngine::Codex).expect("load");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "partial");
        assert_eq!(messages[1].text, OVERSIZED_LINE_NOTE);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let result = load_session_transcript(&dir.path().join("gone.jsonl"), SessionEngine::Claude);
        assert!(matches!(result, Err(LoadTranscriptError::OpenFile(_))));
    }

    #[test]
    fn directory_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let result = load_session_transcript(dir.path(), SessionEngine::Codex);
        assert!(result.is_err());
    }

    #[test]
    fn codex_transcript_notes_read_failure() {
        let input = concat!(
            r#"{"type":"response_item","payload":{"type":"message","role":"user","content":[{"type":"input_text","text":"Implement feature"}]}}"#,
            "\n",
        );
        let messages = read_codex_transcript(failing_after(input), Path::new("rollout.jsonl"));

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "Implement feature");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text, PARSE_ERROR_NOTE);
    }
}
