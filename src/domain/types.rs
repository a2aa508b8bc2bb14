use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum SessionEngine {
    Claude,
    Codex,
}

impl SessionEngine {
    pub fn label(self) -> &'static str {
        match self {
            Self::Claude => "Claude",
            Self::Codex => "Codex",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Claude => Self::Codex,
            Self::Codex => Self::Claude,
        }
    }
}

/// One recorded conversation, backed by one log file.
///
/// Built once by a scanner and never mutated afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    pub id: String,
    pub short_id: String,
    pub engine: SessionEngine,
    /// Log file modification time; the only ordering signal across sessions.
    pub modified: SystemTime,
    pub project: String,
    pub cwd: PathBuf,
    pub summary: String,
    pub log_path: PathBuf,
    pub team_name: Option<String>,
}

pub struct NewSession {
    pub id: String,
    pub engine: SessionEngine,
    pub modified: SystemTime,
    pub cwd: PathBuf,
    pub summary: String,
    pub log_path: PathBuf,
    pub team_name: Option<String>,
}

impl Session {
    /// Returns `None` when the source yielded no session id.
    pub fn build(new: NewSession) -> Option<Self> {
        if new.id.is_empty() {
            return None;
        }
        Some(Self {
            short_id: short_id(&new.id),
            project: project_name_from_cwd(&new.cwd),
            id: new.id,
            engine: new.engine,
            modified: new.modified,
            cwd: new.cwd,
            summary: new.summary,
            log_path: new.log_path,
            team_name: new.team_name.filter(|name| !name.is_empty()),
        })
    }

    /// Summary as shown in list rows, prefixed with the team for team sessions.
    pub fn display_summary(&self) -> String {
        match &self.team_name {
            Some(team) => format!("[team:{team}] {}", self.summary),
            None => self.summary.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub tool_calls: Vec<String>,
    /// Position in the reconstructed conversation, after merging.
    pub index: usize,
}

/// `abc123def456` becomes `abc1..f456`; ids shorter than 9 characters are kept.
pub fn short_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() < 9 {
        return id.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}..{tail}")
}

pub fn project_name_from_cwd(cwd: &Path) -> String {
    match cwd.file_name().and_then(|name| name.to_str()) {
        Some(name) if !name.is_empty() && name != "." => name.to_string(),
        _ => "unknown".to_string(),
    }
}
