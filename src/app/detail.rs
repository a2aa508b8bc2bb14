use crate::app::scroll::{centered_offset, clamp_scroll_offset, max_scroll_offset};
use crate::domain::{Message, Role, Session, wrap_hard};

/// Narrowest width transcripts are laid out for, however small the terminal.
const MIN_RENDER_WIDTH: usize = 40;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DetailLineKind {
    Header(Role),
    Text(Role),
    ToolCall,
    Blank,
}

/// One row of the laid-out transcript, as plain text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DetailLine {
    pub kind: DetailLineKind,
    pub text: String,
}

#[derive(Clone, Debug)]
pub enum DetailContent {
    Loading,
    Loaded(Vec<Message>),
    Failed(String),
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DetailSearch {
    pub query: String,
    /// Line numbers of matching rows, ascending.
    pub matches: Vec<usize>,
    pub current: usize,
}

impl DetailSearch {
    pub fn status(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        if self.matches.is_empty() {
            return Some("No matches".to_string());
        }
        Some(format!("Match {}/{}", self.current + 1, self.matches.len()))
    }

    pub fn current_line(&self) -> Option<usize> {
        self.matches.get(self.current).copied()
    }
}

#[derive(Clone, Debug)]
pub struct DetailView {
    pub session: Session,
    pub content: DetailContent,
    pub lines: Vec<DetailLine>,
    pub offset: usize,
    pub search: DetailSearch,
}

impl DetailView {
    pub fn loading(session: Session) -> Self {
        Self {
            session,
            content: DetailContent::Loading,
            lines: Vec::new(),
            offset: 0,
            search: DetailSearch::default(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.content, DetailContent::Loading)
    }

    pub fn apply_result(&mut self, result: Result<Vec<Message>, String>, terminal_width: u16) {
        self.content = match result {
            Ok(messages) => DetailContent::Loaded(messages),
            Err(error) => DetailContent::Failed(error),
        };
        self.offset = 0;
        self.search = DetailSearch::default();
        self.relayout(terminal_width);
    }

    /// Re-wraps for a new terminal width, keeping the search query.
    pub fn relayout(&mut self, terminal_width: u16) {
        self.lines = match &self.content {
            DetailContent::Loaded(messages) => layout_transcript(messages, terminal_width),
            DetailContent::Loading | DetailContent::Failed(_) => Vec::new(),
        };

        let query = std::mem::take(&mut self.search.query);
        let current = self.search.current;
        self.search = search_lines(&self.lines, query);
        if !self.search.matches.is_empty() {
            self.search.current = current.min(self.search.matches.len() - 1);
        }
    }

    pub fn clamp_offset(&mut self, visible: usize) {
        self.offset = clamp_scroll_offset(self.offset, self.lines.len(), visible);
    }

    pub fn scroll_up(&mut self, rows: usize, visible: usize) {
        self.offset = self.offset.saturating_sub(rows);
        self.clamp_offset(visible);
    }

    pub fn scroll_down(&mut self, rows: usize, visible: usize) {
        self.offset = self.offset.saturating_add(rows);
        self.clamp_offset(visible);
    }

    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
    }

    pub fn scroll_to_bottom(&mut self, visible: usize) {
        self.offset = max_scroll_offset(self.lines.len(), visible);
    }

    /// Replaces the search query; a non-empty query jumps to its first match.
    pub fn commit_search(&mut self, query: String, visible: usize) {
        self.search = search_lines(&self.lines, query);
        self.center_on_current_match(visible);
    }

    pub fn next_match(&mut self, visible: usize) {
        let count = self.search.matches.len();
        if count == 0 {
            return;
        }
        self.search.current = (self.search.current + 1) % count;
        self.center_on_current_match(visible);
    }

    pub fn prev_match(&mut self, visible: usize) {
        let count = self.search.matches.len();
        if count == 0 {
            return;
        }
        self.search.current = (self.search.current + count - 1) % count;
        self.center_on_current_match(visible);
    }

    fn center_on_current_match(&mut self, visible: usize) {
        if let Some(line) = self.search.current_line() {
            self.offset = centered_offset(line, self.lines.len(), visible);
        }
    }

    pub fn scroll_percent(&self, visible: usize) -> Option<usize> {
        if self.lines.is_empty() {
            return None;
        }
        let max_offset = max_scroll_offset(self.lines.len(), visible);
        if max_offset == 0 {
            return Some(0);
        }
        Some(self.offset.min(max_offset) * 100 / max_offset)
    }
}

pub fn render_width(terminal_width: u16) -> usize {
    usize::from(terminal_width)
        .saturating_sub(2)
        .max(MIN_RENDER_WIDTH)
}

/// Lays messages out as a role header, wrapped text, tool calls and a blank separator.
pub fn layout_transcript(messages: &[Message], terminal_width: u16) -> Vec<DetailLine> {
    let width = render_width(terminal_width);
    let mut lines = Vec::new();

    for message in messages {
        let header = match message.role {
            Role::User => " USER",
            Role::Assistant => " ASSISTANT",
        };
        lines.push(DetailLine {
            kind: DetailLineKind::Header(message.role),
            text: header.to_string(),
        });

        if !message.text.is_empty() {
            for wrapped in wrap_hard(&message.text, width - 2) {
                lines.push(DetailLine {
                    kind: DetailLineKind::Text(message.role),
                    text: format!(" {wrapped}"),
                });
            }
        }

        for tool_call in &message.tool_calls {
            lines.push(DetailLine {
                kind: DetailLineKind::ToolCall,
                text: format!(" [Tool: {tool_call}]"),
            });
        }

        lines.push(DetailLine {
            kind: DetailLineKind::Blank,
            text: String::new(),
        });
    }

    lines
}

fn search_lines(lines: &[DetailLine], query: String) -> DetailSearch {
    if query.is_empty() {
        return DetailSearch::default();
    }
    let needle = query.to_lowercase();
    let matches = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.text.to_lowercase().contains(&needle))
        .map(|(index, _)| index)
        .collect();
    DetailSearch {
        query,
        matches,
        current: 0,
    }
}
