use crate::domain::{format_tool_call, str_field, strip_angle_tags, strip_teammate_tags};
use serde_json::Value;

const DELEGATED_PREAMBLE: &str = "You are";
const DELEGATED_TASK_MARKER: &str = "Your task is";

/// Fields taken from the first log line that names its session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaudeSessionHeader {
    pub session_id: String,
    pub cwd: Option<String>,
    pub line_type: Option<String>,
    pub team_name: Option<String>,
    pub first_prompt: Option<String>,
}

/// `None` unless the line carries a non-empty `sessionId`.
pub fn parse_claude_session_header(value: &Value) -> Option<ClaudeSessionHeader> {
    let session_id = str_field(value, "sessionId").filter(|id| !id.is_empty())?;
    Some(ClaudeSessionHeader {
        session_id: session_id.to_string(),
        cwd: str_field(value, "cwd").map(str::to_string),
        line_type: str_field(value, "type").map(str::to_string),
        team_name: str_field(value, "teamName")
            .filter(|name| !name.is_empty())
            .map(str::to_string),
        first_prompt: string_content(value).map(str::to_string),
    })
}

fn message_content(value: &Value) -> Option<&Value> {
    value.get("message")?.get("content")
}

fn string_content(value: &Value) -> Option<&str> {
    message_content(value)?.as_str()
}

/// Strips teammate wrappers and markup from a prompt used as a summary.
///
/// Delegated sub-task prompts open with a fixed "You are ..." preamble; for those the
/// summary starts at "Your task is" when the marker is present.
pub fn clean_claude_summary(raw: &str) -> String {
    let text = strip_teammate_tags(raw);
    let text = strip_angle_tags(&text);
    let text = text.trim();
    if text.starts_with(DELEGATED_PREAMBLE) {
        if let Some(start) = text.find(DELEGATED_TASK_MARKER) {
            return text[start..].trim().to_string();
        }
    }
    text.to_string()
}

/// Summary from a later `user` line with non-empty plain-string content.
///
/// Only teammate wrappers are removed; the line is taken even when nothing is left.
pub fn parse_claude_prompt_line(value: &Value) -> Option<String> {
    if str_field(value, "type") != Some("user") {
        return None;
    }
    let raw = string_content(value).filter(|text| !text.is_empty())?;
    Some(strip_teammate_tags(raw).trim().to_string())
}

/// Command echoes, reminders and environment dumps that are not typed by the user.
pub fn is_claude_system_content(text: &str) -> bool {
    text.starts_with("<local-command-")
        || text.starts_with("<command-name>")
        || text.starts_with("<local-command-stdout>")
        || text.starts_with("<local-command-caveat>")
        || text.contains("<system-reminder>")
        || text.starts_with("<environment_context>")
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClaudeUserContent {
    Text(String),
    /// Only tool results; rendered through the preceding assistant tool call.
    ToolResult,
    Empty,
}

pub fn parse_claude_user_content(value: &Value) -> ClaudeUserContent {
    let Some(content) = message_content(value) else {
        return ClaudeUserContent::Empty;
    };

    if let Some(text) = content.as_str() {
        if text.is_empty() || is_claude_system_content(text) {
            return ClaudeUserContent::Empty;
        }
        return ClaudeUserContent::Text(text.to_string());
    }

    let Some(blocks) = content.as_array() else {
        return ClaudeUserContent::Empty;
    };

    let mut has_tool_result = false;
    let mut texts: Vec<&str> = Vec::new();
    for block in blocks {
        match str_field(block, "type") {
            Some("tool_result") => has_tool_result = true,
            Some("text") => {
                if let Some(text) = str_field(block, "text") {
                    if !text.is_empty() && !is_claude_system_content(text) {
                        texts.push(text);
                    }
                }
            }
            _ => {}
        }
    }

    if !texts.is_empty() {
        ClaudeUserContent::Text(texts.join("\n"))
    } else if has_tool_result {
        ClaudeUserContent::ToolResult
    } else {
        ClaudeUserContent::Empty
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClaudeAssistantContent {
    pub text: String,
    pub tool_calls: Vec<String>,
}

pub fn parse_claude_assistant_content(value: &Value) -> ClaudeAssistantContent {
    let Some(content) = message_content(value) else {
        return ClaudeAssistantContent::default();
    };

    if let Some(text) = content.as_str() {
        return ClaudeAssistantContent {
            text: text.to_string(),
            tool_calls: Vec::new(),
        };
    }

    let mut texts: Vec<&str> = Vec::new();
    let mut tool_calls = Vec::new();
    for block in content.as_array().into_iter().flatten() {
        match str_field(block, "type") {
            Some("text") => {
                if let Some(text) = str_field(block, "text").filter(|text| !text.is_empty()) {
                    texts.push(text);
                }
            }
            Some("tool_use") => {
                let name = str_field(block, "name").unwrap_or("tool");
                let input = block.get("input").unwrap_or(&Value::Null);
                tool_calls.push(format_tool_call(name, input));
            }
            _ => {}
        }
    }

    ClaudeAssistantContent {
        text: texts.join("\n"),
        tool_calls,
    }
}
