mod detail;
mod line_editor;
mod scroll;

use crate::app::scroll::{clamp_cursor, clamp_cursor_window};
use crate::domain::{Message, Session, SessionEngine};
use crate::infra::{ScanWarningCount, new_session_command, resume_command};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::cmp::Reverse;
use std::path::PathBuf;
use thiserror::Error;
use time::UtcOffset;
use tracing::debug;

pub use detail::{DetailContent, DetailLineKind, DetailView};
pub use line_editor::LineEditor;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EngineFilter {
    #[default]
    All,
    Claude,
    Codex,
}

impl EngineFilter {
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Claude => "claude",
            Self::Codex => "codex",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            Self::All => Self::Claude,
            Self::Claude => Self::Codex,
            Self::Codex => Self::All,
        }
    }

    pub fn matches(self, engine: SessionEngine) -> bool {
        match self {
            Self::All => true,
            Self::Claude => engine == SessionEngine::Claude,
            Self::Codex => engine == SessionEngine::Codex,
        }
    }
}

impl From<Option<SessionEngine>> for EngineFilter {
    fn from(engine: Option<SessionEngine>) -> Self {
        match engine {
            None => Self::All,
            Some(SessionEngine::Claude) => Self::Claude,
            Some(SessionEngine::Codex) => Self::Codex,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppData {
    pub sessions: Vec<Session>,
    pub warnings: ScanWarningCount,
    pub notice: Option<String>,
    /// Directory the browser was started from; default for new sessions.
    pub cwd: PathBuf,
    pub utc_offset: UtcOffset,
}

/// The filtered, scrolled session list.
#[derive(Clone, Debug, Default)]
pub struct ListState {
    pub filter: EngineFilter,
    pub query: LineEditor,
    /// Indices into `AppModel::sessions`, newest first.
    pub filtered_indices: Vec<usize>,
    pub selected: usize,
    pub offset: usize,
}

#[derive(Clone, Debug)]
pub struct AppModel {
    pub sessions: Vec<Session>,
    pub warnings: ScanWarningCount,
    pub notice: Option<String>,
    pub cwd: PathBuf,
    pub utc_offset: UtcOffset,
    pub list: ListState,
    pub view: View,
    pub terminal_size: (u16, u16),
}

impl AppModel {
    pub fn new(data: AppData, filter: EngineFilter, terminal_size: (u16, u16)) -> Self {
        let mut sessions = data.sessions;
        sessions.sort_by_key(|session| Reverse(session.modified));

        let mut model = Self {
            sessions,
            warnings: data.warnings,
            notice: data.notice,
            cwd: data.cwd,
            utc_offset: data.utc_offset,
            list: ListState {
                filter,
                ..ListState::default()
            },
            view: View::List,
            terminal_size,
        };
        apply_list_filter(&mut model);
        model
    }

    pub fn selected_session(&self) -> Option<&Session> {
        let index = self.list.filtered_indices.get(self.list.selected)?;
        self.sessions.get(*index)
    }

    /// Session rows that fit between the title/header and the bottom bar.
    pub fn list_visible_rows(&self) -> usize {
        let chrome = match &self.view {
            View::Command(command) if matches!(*command.return_to, View::List) => 5,
            _ => 4,
        };
        usize::from(self.terminal_size.1)
            .saturating_sub(chrome)
            .max(1)
    }

    /// Transcript rows between the title bar and the bottom bar.
    pub fn detail_visible_rows(&self) -> usize {
        usize::from(self.terminal_size.1).saturating_sub(2).max(1)
    }
}

#[derive(Clone, Debug)]
pub enum View {
    List,
    Search,
    Command(CommandView),
    New(NewSessionView),
    Detail(DetailView),
    DetailSearch(DetailSearchView),
}

/// Editable launch line awaiting confirmation.
#[derive(Clone, Debug)]
pub struct CommandView {
    pub editor: LineEditor,
    pub return_to: Box<View>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NewSessionField {
    Tool,
    Dir,
    Mode,
}

impl NewSessionField {
    fn next(self) -> Self {
        match self {
            Self::Tool => Self::Dir,
            Self::Dir => Self::Mode,
            Self::Mode => Self::Tool,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Tool => Self::Mode,
            Self::Dir => Self::Tool,
            Self::Mode => Self::Dir,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewSessionView {
    pub engine: SessionEngine,
    pub dir: LineEditor,
    pub yolo: bool,
    pub focus: NewSessionField,
}

impl NewSessionView {
    pub fn new(cwd: &std::path::Path) -> Self {
        Self {
            engine: SessionEngine::Claude,
            dir: LineEditor::from_text(cwd.to_string_lossy().into_owned()),
            yolo: false,
            focus: NewSessionField::Tool,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DetailSearchView {
    pub detail: DetailView,
    pub editor: LineEditor,
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    /// A background transcript load finished; `log_path` names the file it read.
    TranscriptLoaded {
        log_path: PathBuf,
        result: Result<Vec<Message>, String>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AppCommand {
    None,
    Quit,
    LoadTranscript {
        log_path: PathBuf,
        engine: SessionEngine,
    },
    /// Leave the UI and hand `command` to the shell.
    Launch {
        command: String,
    },
}

pub fn update(model: AppModel, event: AppEvent) -> (AppModel, AppCommand) {
    match event {
        AppEvent::Key(key) => update_on_key(model, key),
        AppEvent::Resize(width, height) => (update_on_resize(model, width, height), AppCommand::None),
        AppEvent::TranscriptLoaded { log_path, result } => (
            apply_transcript_result(model, &log_path, result),
            AppCommand::None,
        ),
    }
}

fn update_on_key(model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    let mut model = model;

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return (model, AppCommand::Quit);
    }

    let view = std::mem::replace(&mut model.view, View::List);
    match view {
        View::List => update_list(model, key),
        View::Search => update_search(model, key),
        View::Command(command) => update_command(model, command, key),
        View::New(form) => update_new_session(model, form, key),
        View::Detail(detail) => update_detail(model, detail, key),
        View::DetailSearch(search) => update_detail_search(model, search, key),
    }
}

fn update_list(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    let len = model.list.filtered_indices.len();
    let page = model.list_visible_rows();

    match key.code {
        KeyCode::Char('q') => return (model, AppCommand::Quit),
        KeyCode::Up | KeyCode::Char('k') => {
            model.list.selected = model.list.selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            model.list.selected = clamp_cursor(model.list.selected + 1, len);
        }
        KeyCode::PageUp => {
            model.list.selected = model.list.selected.saturating_sub(page);
        }
        KeyCode::PageDown => {
            model.list.selected = clamp_cursor(model.list.selected + page, len);
        }
        KeyCode::Home | KeyCode::Char('g') => model.list.selected = 0,
        KeyCode::End | KeyCode::Char('G') => model.list.selected = clamp_cursor(usize::MAX, len),
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
            let Some(session) = model.selected_session().cloned() else {
                return (model, AppCommand::None);
            };
            debug!(log_path = %session.log_path.display(), "opening transcript");
            let command = AppCommand::LoadTranscript {
                log_path: session.log_path.clone(),
                engine: session.engine,
            };
            model.view = View::Detail(DetailView::loading(session));
            return (model, command);
        }
        KeyCode::Char('r') => {
            if let Some(session) = model.selected_session() {
                let editor = LineEditor::from_text(resume_command(session));
                model.view = View::Command(CommandView {
                    editor,
                    return_to: Box::new(View::List),
                });
            }
        }
        KeyCode::Char('n') => {
            model.view = View::New(NewSessionView::new(&model.cwd));
            return (model, AppCommand::None);
        }
        KeyCode::Char('/') => {
            model.view = View::Search;
            return (model, AppCommand::None);
        }
        KeyCode::Tab => {
            model.list.filter = model.list.filter.cycle();
            apply_list_filter(&mut model);
        }
        KeyCode::Esc => {
            if !model.list.query.is_empty() {
                model.list.query.clear();
                apply_list_filter(&mut model);
            }
        }
        _ => {}
    }

    clamp_list_window(&mut model);
    (model, AppCommand::None)
}

fn update_search(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => {
            model.view = View::List;
        }
        _ => {
            let before = model.list.query.text.clone();
            if model.list.query.handle_key(&key) && model.list.query.text != before {
                apply_list_filter(&mut model);
            }
            model.view = View::Search;
        }
    }
    (model, AppCommand::None)
}

fn update_command(
    mut model: AppModel,
    mut command: CommandView,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Esc => {
            model.view = *command.return_to;
            clamp_list_window(&mut model);
            (model, AppCommand::None)
        }
        KeyCode::Enter => {
            let line = command.editor.text.trim().to_string();
            if line.is_empty() {
                model.view = View::Command(command);
                return (model, AppCommand::None);
            }
            model.view = View::Command(command);
            (model, AppCommand::Launch { command: line })
        }
        _ => {
            command.editor.handle_key(&key);
            model.view = View::Command(command);
            (model, AppCommand::None)
        }
    }
}

fn update_new_session(
    mut model: AppModel,
    mut form: NewSessionView,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Esc => {
            model.view = View::List;
            return (model, AppCommand::None);
        }
        KeyCode::Enter => {
            let command = new_session_command(form.engine, &form.dir.text, form.yolo, &model.cwd);
            model.view = View::New(form);
            return (model, AppCommand::Launch { command });
        }
        KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
        KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
        _ => match form.focus {
            NewSessionField::Dir => {
                form.dir.handle_key(&key);
            }
            NewSessionField::Tool => match key.code {
                KeyCode::Left | KeyCode::Char('h') => form.engine = SessionEngine::Claude,
                KeyCode::Right | KeyCode::Char('l') => form.engine = SessionEngine::Codex,
                KeyCode::Char(' ') => form.engine = form.engine.toggle(),
                _ => {}
            },
            NewSessionField::Mode => match key.code {
                KeyCode::Left | KeyCode::Char('h') => form.yolo = false,
                KeyCode::Right | KeyCode::Char('l') => form.yolo = true,
                KeyCode::Char(' ') => form.yolo = !form.yolo,
                _ => {}
            },
        },
    }

    model.view = View::New(form);
    (model, AppCommand::None)
}

fn update_detail(
    mut model: AppModel,
    mut detail: DetailView,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    let visible = model.detail_visible_rows();

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Left | KeyCode::Char('h') => {
            model.view = View::List;
            clamp_list_window(&mut model);
            return (model, AppCommand::None);
        }
        KeyCode::Enter => {
            let editor = LineEditor::from_text(resume_command(&detail.session));
            model.view = View::Command(CommandView {
                editor,
                return_to: Box::new(View::Detail(detail)),
            });
            return (model, AppCommand::None);
        }
        KeyCode::Char('/') => {
            model.view = View::DetailSearch(DetailSearchView {
                detail,
                editor: LineEditor::new(),
            });
            return (model, AppCommand::None);
        }
        KeyCode::Up | KeyCode::Char('k') => detail.scroll_up(1, visible),
        KeyCode::Down | KeyCode::Char('j') => detail.scroll_down(1, visible),
        KeyCode::PageUp | KeyCode::Char('u') => detail.scroll_up(visible, visible),
        KeyCode::PageDown | KeyCode::Char('d') => detail.scroll_down(visible, visible),
        KeyCode::Home | KeyCode::Char('g') => detail.scroll_to_top(),
        KeyCode::End | KeyCode::Char('G') => detail.scroll_to_bottom(visible),
        KeyCode::Char('n') => detail.next_match(visible),
        KeyCode::Char('N') => detail.prev_match(visible),
        _ => {}
    }

    model.view = View::Detail(detail);
    (model, AppCommand::None)
}

fn update_detail_search(
    mut model: AppModel,
    mut search: DetailSearchView,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Esc => {
            model.view = View::Detail(search.detail);
        }
        KeyCode::Enter => {
            let visible = model.detail_visible_rows();
            search.detail.commit_search(search.editor.text, visible);
            model.view = View::Detail(search.detail);
        }
        _ => {
            search.editor.handle_key(&key);
            model.view = View::DetailSearch(search);
        }
    }
    (model, AppCommand::None)
}

fn update_on_resize(mut model: AppModel, width: u16, height: u16) -> AppModel {
    model.terminal_size = (width, height);
    let visible = model.detail_visible_rows();
    if let Some(detail) = detail_view_mut(&mut model.view) {
        detail.relayout(width);
        detail.clamp_offset(visible);
    }
    clamp_list_window(&mut model);
    model
}

/// Applies a finished load only to the detail view that asked for it.
///
/// Results for any other session, or for a view that already has content, are dropped.
fn apply_transcript_result(
    mut model: AppModel,
    log_path: &std::path::Path,
    result: Result<Vec<Message>, String>,
) -> AppModel {
    let width = model.terminal_size.0;
    match detail_view_mut(&mut model.view) {
        Some(detail) if detail.is_loading() && detail.session.log_path == log_path => {
            detail.apply_result(result, width);
        }
        _ => {
            debug!(log_path = %log_path.display(), "discarding stale transcript");
        }
    }
    model
}

/// The detail view currently shown, including one behind a prompt.
fn detail_view_mut(view: &mut View) -> Option<&mut DetailView> {
    match view {
        View::Detail(detail) => Some(detail),
        View::DetailSearch(search) => Some(&mut search.detail),
        View::Command(command) => detail_view_mut(&mut command.return_to),
        View::List | View::Search | View::New(_) => None,
    }
}

/// Recomputes the visible list from the engine filter and the search query.
fn apply_list_filter(model: &mut AppModel) {
    let filter = model.list.filter;
    let query = model.list.query.text.to_lowercase();

    model.list.filtered_indices = model
        .sessions
        .iter()
        .enumerate()
        .filter(|(_, session)| filter.matches(session.engine))
        .filter(|(_, session)| query.is_empty() || session_haystack(session).contains(&query))
        .map(|(index, _)| index)
        .collect();

    model.list.selected = clamp_cursor(model.list.selected, model.list.filtered_indices.len());
    clamp_list_window(model);
}

fn session_haystack(session: &Session) -> String {
    format!(
        "{} {} {} {}",
        session.summary,
        session.project,
        session.id,
        session.team_name.as_deref().unwrap_or_default()
    )
    .to_lowercase()
}

fn clamp_list_window(model: &mut AppModel) {
    let visible = model.list_visible_rows();
    let len = model.list.filtered_indices.len();
    model.list.selected = clamp_cursor(model.list.selected, len);
    model.list.offset = clamp_cursor_window(model.list.selected, model.list.offset, len, visible);
}
