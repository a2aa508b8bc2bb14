use crate::domain::Role;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line is not a json object")]
    NotAnObject,
}

/// Decodes one log line into a JSON object, leaving field interpretation to the caller.
pub fn parse_json_line(line: &[u8]) -> Result<Value, ParseError> {
    let value: Value = serde_json::from_slice(line)?;
    if !value.is_object() {
        return Err(ParseError::NotAnObject);
    }
    Ok(value)
}

pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CodexSessionMeta {
    pub id: Option<String>,
    pub cwd: Option<String>,
}

/// Reads the `session_meta` payload; `None` for any other line type.
pub fn parse_codex_session_meta(value: &Value) -> Option<CodexSessionMeta> {
    if str_field(value, "type") != Some("session_meta") {
        return None;
    }
    let payload = value.get("payload")?;
    Some(CodexSessionMeta {
        id: str_field(payload, "id")
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        cwd: str_field(payload, "cwd").map(str::to_string),
    })
}

/// First non-empty `input_text` of a user `response_item`.
pub fn parse_codex_user_prompt(value: &Value) -> Option<String> {
    if str_field(value, "type") != Some("response_item") {
        return None;
    }
    let payload = value.get("payload")?;
    if str_field(payload, "role") != Some("user") {
        return None;
    }

    payload
        .get("content")?
        .as_array()?
        .iter()
        .filter(|item| str_field(item, "type") == Some("input_text"))
        .filter_map(|item| str_field(item, "text"))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CodexMessage {
    pub role: Role,
    pub text: String,
}

/// Decodes a `response_item` message line into its rendered text.
///
/// User items carrying environment or instruction boilerplate are dropped one by one,
/// so the returned text may be empty.
pub fn parse_codex_message(value: &Value) -> Option<CodexMessage> {
    if str_field(value, "type") != Some("response_item") {
        return None;
    }
    let payload = value.get("payload")?;
    if str_field(payload, "type") != Some("message") {
        return None;
    }
    let role = Role::parse(str_field(payload, "role")?)?;

    let mut parts: Vec<&str> = Vec::new();
    if let Some(items) = payload.get("content").and_then(Value::as_array) {
        for item in items {
            if !matches!(
                str_field(item, "type"),
                Some("input_text") | Some("output_text")
            ) {
                continue;
            }
            let Some(text) = str_field(item, "text").filter(|text| !text.is_empty()) else {
                continue;
            };
            if role == Role::User && is_metadata_prompt(text) {
                continue;
            }
            parts.push(text);
        }
    }

    Some(CodexMessage {
        role,
        text: parts.join("\n"),
    })
}

/// Environment and instruction dumps Codex injects as user turns.
pub fn is_metadata_prompt(text: &str) -> bool {
    text.contains("<environment_context>")
        || text.contains("AGENTS.md")
        || text.contains("<permissions")
}

/// Whether a user prompt may serve as the session summary.
pub fn is_codex_summary_candidate(text: &str) -> bool {
    !text.is_empty() && !is_metadata_prompt(text) && !text.starts_with('#')
}
