use crate::domain::{Message, Role};

pub const PARSE_ERROR_NOTE: &str = "(parse error: some messages may be missing)";
pub const OVERSIZED_LINE_NOTE: &str = "(parse stopped: encountered an oversized line)";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranscriptAbort {
    ReadFailed,
    OversizedLine,
}

impl TranscriptAbort {
    pub fn note(self) -> &'static str {
        match self {
            Self::ReadFailed => PARSE_ERROR_NOTE,
            Self::OversizedLine => OVERSIZED_LINE_NOTE,
        }
    }
}

/// Accumulates messages in source order.
///
/// Indices stay contiguous from 0 and consecutive assistant turns coalesce into one
/// message.
#[derive(Debug, Default)]
pub struct TranscriptBuilder {
    messages: Vec<Message>,
}

impl TranscriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        self.push_new(Role::User, text, Vec::new());
    }

    pub fn push_assistant(&mut self, text: String, tool_calls: Vec<String>) {
        if text.is_empty() && tool_calls.is_empty() {
            return;
        }

        if let Some(prev) = self.messages.last_mut() {
            if prev.role == Role::Assistant {
                if !text.is_empty() {
                    if !prev.text.is_empty() {
                        prev.text.push('\n');
                    }
                    prev.text.push_str(&text);
                }
                prev.tool_calls.extend(tool_calls);
                return;
            }
        }

        self.push_new(Role::Assistant, text, tool_calls);
    }

    /// Appends the trailer that tells the reader why the transcript ends early.
    ///
    /// Never merged into a preceding assistant turn.
    pub fn abort(&mut self, reason: TranscriptAbort) {
        self.push_new(Role::Assistant, reason.note().to_string(), Vec::new());
    }

    pub fn finish(self) -> Vec<Message> {
        self.messages
    }

    fn push_new(&mut self, role: Role, text: String, tool_calls: Vec<String>) {
        let index = self.messages.len();
        self.messages.push(Message {
            role,
            text,
            tool_calls,
            index,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_consecutive_assistant_turns() {
        let mut builder = TranscriptBuilder::new();
        builder.push_user("hi".to_string());
        builder.push_assistant("A".to_string(), vec!["Read: a.rs".to_string()]);
        builder.push_assistant("B".to_string(), vec!["Bash: ls".to_string()]);
        let messages = builder.finish();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text, "A\nB");
        assert_eq!(messages[1].tool_calls, vec!["Read: a.rs", "Bash: ls"]);
    }

    #[test]
    fn merge_skips_separator_for_empty_text() {
        let mut builder = TranscriptBuilder::new();
        builder.push_assistant(String::new(), vec!["Glob: *.rs".to_string()]);
        builder.push_assistant("done".to_string(), Vec::new());
        let messages = builder.finish();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "done");
    }

    #[test]
    fn indices_are_contiguous_after_merges() {
        let mut builder = TranscriptBuilder::new();
        builder.push_user("q1".to_string());
        builder.push_assistant("a".to_string(), Vec::new());
        builder.push_assistant("b".to_string(), Vec::new());
        builder.push_user(String::new());
        builder.push_user("q2".to_string());
        builder.push_assistant("c".to_string(), Vec::new());
        builder.abort(TranscriptAbort::OversizedLine);
        let messages = builder.finish();

        let indices: Vec<usize> = messages.iter().map(|message| message.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(messages[4].text, OVERSIZED_LINE_NOTE);
        assert_eq!(messages[3].text, "c");
    }
}
