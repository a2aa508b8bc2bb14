use crate::domain::{flatten_line, truncate_value};
use serde_json::Value;

const GENERIC_VALUE_MAX_CHARS: usize = 50;

enum ToolArg {
    /// Rendered as the last three path segments.
    Path(&'static str),
    /// Rendered truncated to the given number of characters.
    Text(&'static str, usize),
}

fn known_tool_arg(name: &str) -> Option<ToolArg> {
    let arg = match name {
        "Read" | "Write" | "Edit" | "MultiEdit" => ToolArg::Path("file_path"),
        "NotebookEdit" => ToolArg::Path("notebook_path"),
        "Glob" => ToolArg::Text("pattern", 60),
        "Grep" => ToolArg::Text("pattern", 40),
        "Bash" => ToolArg::Text("command", 60),
        "WebSearch" => ToolArg::Text("query", 50),
        "WebFetch" => ToolArg::Text("url", 60),
        "Task" | "Agent" => ToolArg::Text("description", 50),
        _ => return None,
    };
    Some(arg)
}

/// One-line summary of a tool invocation, e.g. `Read: src/app/mod.rs`.
pub fn format_tool_call(name: &str, input: &Value) -> String {
    let name = flatten_line(name);
    let Some(params) = input.as_object() else {
        return name;
    };

    if let Some(arg) = known_tool_arg(&name) {
        let rendered = match arg {
            ToolArg::Path(key) => params
                .get(key)
                .and_then(Value::as_str)
                .map(short_path),
            ToolArg::Text(key, max_chars) => params
                .get(key)
                .and_then(Value::as_str)
                .map(|text| truncate_value(text, max_chars)),
        };
        if let Some(rendered) = rendered {
            return format!("{name}: {rendered}");
        }
    }

    params
        .values()
        .filter_map(Value::as_str)
        .find(|text| !text.is_empty())
        .map(|text| format!("{name}: {}", truncate_value(text, GENERIC_VALUE_MAX_CHARS)))
        .unwrap_or(name)
}

fn short_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() <= 3 {
        return flatten_line(path);
    }
    flatten_line(&parts[parts.len() - 3..].join("/"))
}
