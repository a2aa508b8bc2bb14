use crate::domain::{Session, SessionEngine};
use dirs::home_dir;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::info;

const CLAUDE_YOLO_FLAG: &str = "--dangerously-skip-permissions";
const CODEX_YOLO_FLAG: &str = "--dangerously-bypass-approvals-and-sandbox";

/// Wraps `value` in single quotes for a POSIX shell.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

pub fn resume_command(session: &Session) -> String {
    let cwd = shell_quote(&session.cwd.to_string_lossy());
    match session.engine {
        SessionEngine::Claude => format!("cd {cwd} && claude -r {}", session.id),
        SessionEngine::Codex => format!("cd {cwd} && codex resume {}", session.id),
    }
}

/// Command line that starts a fresh session in `dir`.
///
/// An empty `dir` means `fallback_cwd`; a leading `~/` is expanded.
pub fn new_session_command(
    engine: SessionEngine,
    dir: &str,
    yolo: bool,
    fallback_cwd: &Path,
) -> String {
    let dir = dir.trim();
    let dir = if dir.is_empty() {
        fallback_cwd.to_path_buf()
    } else {
        expand_home(dir)
    };

    let (program, yolo_flag) = match engine {
        SessionEngine::Claude => ("claude", CLAUDE_YOLO_FLAG),
        SessionEngine::Codex => ("codex", CODEX_YOLO_FLAG),
    };

    let mut command = format!("cd {} && {program}", shell_quote(&dir.to_string_lossy()));
    if yolo {
        command.push(' ');
        command.push_str(yolo_flag);
    }
    command
}

fn expand_home(dir: &str) -> PathBuf {
    let rest = match dir {
        "~" => Some(""),
        _ => dir.strip_prefix("~/"),
    };
    match (rest, home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(dir),
    }
}

/// Shell used to run a confirmed launch string.
pub fn resolve_launch_shell() -> PathBuf {
    if let Some(shell) = std::env::var_os("SHELL").filter(|shell| !shell.is_empty()) {
        return PathBuf::from(shell);
    }
    if cfg!(target_os = "macos") && Path::new("/bin/zsh").exists() {
        return PathBuf::from("/bin/zsh");
    }
    PathBuf::from("/bin/bash")
}

/// Runs `command` through `shell -c` with the terminal's stdio.
pub fn run_launch_command(shell: &Path, command: &str) -> io::Result<ExitStatus> {
    info!(shell = %shell.display(), command, "launching");
    Command::new(shell).arg("-c").arg(command).status()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewSession;
    use std::time::SystemTime;

    fn session(engine: SessionEngine, cwd: &str) -> Session {
        Session::build(NewSession {
            id: "abc123def456".to_string(),
            engine,
            modified: SystemTime::UNIX_EPOCH,
            cwd: PathBuf::from(cwd),
            summary: String::new(),
            log_path: PathBuf::from("/logs/a.jsonl"),
            team_name: None,
        })
        .expect("session")
    }

    #[test]
    fn quotes_embedded_single_quotes() {
        assert_eq!(shell_quote("/home/u/proj"), "'/home/u/proj'");
        assert_eq!(shell_quote("/tmp/it's"), r"'/tmp/it'\''s'");
    }

    #[test]
    fn resume_commands_per_engine() {
        assert_eq!(
            resume_command(&session(SessionEngine::Claude, "/home/u/proj")),
            "cd '/home/u/proj' && claude -r abc123def456"
        );
        assert_eq!(
            resume_command(&session(SessionEngine::Codex, "/w/it's here")),
            r"cd '/w/it'\''s here' && codex resume abc123def456"
        );
    }

    #[test]
    fn new_session_flags_and_fallback_dir() {
        let cwd = Path::new("/start");
        assert_eq!(
            new_session_command(SessionEngine::Claude, "", false, cwd),
            "cd '/start' && claude"
        );
        assert_eq!(
            new_session_command(SessionEngine::Claude, "/p", true, cwd),
            "cd '/p' && claude --dangerously-skip-permissions"
        );
        assert_eq!(
            new_session_command(SessionEngine::Codex, " /p ", true, cwd),
            "cd '/p' && codex --dangerously-bypass-approvals-and-sandbox"
        );
    }

    #[test]
    fn tilde_expands_only_as_prefix() {
        assert_eq!(expand_home("/a/~/b"), PathBuf::from("/a/~/b"));
        assert_eq!(expand_home("~user/x"), PathBuf::from("~user/x"));
        if let Some(home) = home_dir() {
            assert_eq!(expand_home("~/src"), home.join("src"));
        }
    }

    #[cfg(unix)]
    #[test]
    fn runs_command_through_shell() {
        let status = run_launch_command(Path::new("/bin/sh"), "exit 3").expect("spawn");
        assert_eq!(status.code(), Some(3));
    }
}
