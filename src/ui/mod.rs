mod theme;

use crate::app::{
    AppModel, CommandView, DetailContent, DetailLineKind, DetailView, LineEditor,
    NewSessionField, NewSessionView, View,
};
use crate::domain::{Role, Session, SessionEngine, format_list_time};
use ratatui::prelude::*;
use ratatui::widgets::*;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const SOURCE_COL: usize = 7;
const ID_COL: usize = 10;
const TIME_COL: usize = 12;
const PROJECT_COL: usize = 14;
const MIN_SUMMARY_COL: usize = 20;
const NEW_FORM_WIDTH: u16 = 60;
const NEW_FORM_HEIGHT: u16 = 13;

pub fn render(frame: &mut Frame, model: &AppModel) {
    let area = frame.area();
    if area.width == 0 || area.height == 0 {
        return;
    }

    match &model.view {
        View::List => render_list(frame, area, model, ListBar::Help),
        View::Search => render_list(frame, area, model, ListBar::Search(&model.list.query)),
        View::New(form) => render_new_session(frame, area, form),
        View::Detail(detail) => render_detail(frame, area, model, detail, DetailBar::Help),
        View::DetailSearch(search) => render_detail(
            frame,
            area,
            model,
            &search.detail,
            DetailBar::Prompt("Search: ", &search.editor),
        ),
        View::Command(command) => render_command(frame, area, model, command),
    }
}

fn render_command(frame: &mut Frame, area: Rect, model: &AppModel, command: &CommandView) {
    match command.return_to.as_ref() {
        View::Detail(detail) => render_detail(
            frame,
            area,
            model,
            detail,
            DetailBar::Prompt("Command: ", &command.editor),
        ),
        _ => render_list(frame, area, model, ListBar::Command(&command.editor)),
    }
}

enum ListBar<'a> {
    Help,
    Search(&'a LineEditor),
    Command(&'a LineEditor),
}

fn render_list(frame: &mut Frame, area: Rect, model: &AppModel, bar: ListBar<'_>) {
    let bar_height = match bar {
        ListBar::Command(_) => 2,
        ListBar::Help | ListBar::Search(_) => 1,
    };
    let visible = model.list_visible_rows();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(visible as u16),
            Constraint::Min(0),
            Constraint::Length(bar_height),
        ])
        .split(area);

    frame.render_widget(list_title_line(model), chunks[0]);

    let width = area.width as usize;
    let summary_col = summary_column_width(width);
    let header = [
        pad_right("Source", SOURCE_COL),
        pad_right("Session ID", ID_COL),
        pad_right("Time", TIME_COL),
        pad_right("Project", PROJECT_COL),
        pad_right("Summary", summary_col),
    ]
    .join(" ");
    frame.render_widget(
        Paragraph::new(header).style(theme::bar().add_modifier(Modifier::BOLD)),
        chunks[1],
    );

    let rows: Vec<Line> = model
        .list
        .filtered_indices
        .iter()
        .enumerate()
        .skip(model.list.offset)
        .take(visible)
        .filter_map(|(row, index)| {
            let session = model.sessions.get(*index)?;
            Some(session_row(model, session, row == model.list.selected, width, summary_col))
        })
        .collect();
    if rows.is_empty() {
        frame.render_widget(
            Paragraph::new("  No sessions match.").style(theme::dim()),
            chunks[2],
        );
    } else {
        frame.render_widget(Paragraph::new(rows), chunks[2]);
    }

    match bar {
        ListBar::Help => frame.render_widget(list_help_line(model), chunks[4]),
        ListBar::Search(editor) => render_prompt(frame, chunks[4], "Search: ", editor),
        ListBar::Command(editor) => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Length(1)])
                .split(chunks[4]);
            render_prompt(frame, rows[0], "Command: ", editor);
            frame.render_widget(
                Paragraph::new("  Enter: execute  Esc: cancel").style(theme::dim()),
                rows[1],
            );
        }
    }
}

fn list_title_line(model: &AppModel) -> Paragraph<'static> {
    let mut spans = vec![
        Span::styled(" VibeSession ", theme::title()),
        Span::styled(
            format!(
                "  [{}]  {} sessions",
                model.list.filter.label(),
                model.list.filtered_indices.len()
            ),
            theme::dim(),
        ),
    ];
    let warnings = model.warnings.get();
    if warnings > 0 {
        spans.push(Span::styled(
            format!("  ·  warnings: {warnings}"),
            Style::default().fg(theme::ERROR),
        ));
    }
    Paragraph::new(Line::from(spans))
}

fn list_help_line(model: &AppModel) -> Paragraph<'static> {
    let mut text =
        "  Enter: open  r: resume  n: new  /: search  Tab: filter  Esc: clear  q: quit".to_string();
    if let Some(notice) = model.notice.as_deref().filter(|notice| !notice.trim().is_empty()) {
        text.push_str("  ·  ");
        text.push_str(notice);
    }
    Paragraph::new(text).style(theme::dim())
}

fn summary_column_width(width: usize) -> usize {
    let used = SOURCE_COL + ID_COL + TIME_COL + PROJECT_COL + 6;
    width.saturating_sub(used).max(MIN_SUMMARY_COL)
}

fn session_row(
    model: &AppModel,
    session: &Session,
    selected: bool,
    width: usize,
    summary_col: usize,
) -> Line<'static> {
    let source = pad_right(session.engine.label(), SOURCE_COL);
    let time = format_list_time(session.modified, model.utc_offset);
    let rest = [
        pad_right(&session.short_id, ID_COL),
        pad_right(&time, TIME_COL),
        pad_right(&session.project, PROJECT_COL),
        truncate_width(&session.display_summary(), summary_col),
    ]
    .join(" ");

    if selected {
        let row = format!("{source} {rest}");
        return Line::from(Span::styled(pad_right(&row, width), theme::selected()));
    }

    let engine_color = match session.engine {
        SessionEngine::Claude => theme::CLAUDE,
        SessionEngine::Codex => theme::CODEX,
    };
    Line::from(vec![
        Span::styled(
            source,
            Style::default().fg(engine_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(rest, Style::default().fg(theme::FG)),
    ])
}

enum DetailBar<'a> {
    Help,
    Prompt(&'static str, &'a LineEditor),
}

fn render_detail(
    frame: &mut Frame,
    area: Rect,
    model: &AppModel,
    detail: &DetailView,
    bar: DetailBar<'_>,
) {
    let visible = model.detail_visible_rows();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(visible as u16),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let session = &detail.session;
    let title = format!(
        " {} · {} · {}",
        session.engine.label(),
        session.short_id,
        session.project
    );
    frame.render_widget(
        Paragraph::new(pad_right(&title, area.width as usize))
            .style(theme::bar().fg(theme::BRIGHT).add_modifier(Modifier::BOLD)),
        chunks[0],
    );

    match &detail.content {
        DetailContent::Loading => render_detail_placeholder(frame, chunks[1], "Loading...", theme::dim()),
        DetailContent::Failed(error) => render_detail_placeholder(
            frame,
            chunks[1],
            &format!("Failed to load transcript: {error}"),
            Style::default().fg(theme::ERROR),
        ),
        DetailContent::Loaded(_) if detail.lines.is_empty() => {
            render_detail_placeholder(frame, chunks[1], "No messages found.", theme::dim())
        }
        DetailContent::Loaded(_) => {
            let current_match = detail.search.current_line();
            let width = area.width as usize;
            let lines: Vec<Line> = detail
                .lines
                .iter()
                .enumerate()
                .skip(detail.offset)
                .take(visible)
                .map(|(index, line)| {
                    let style = if current_match == Some(index) {
                        Style::default().fg(Color::Black).bg(theme::MATCH_BG)
                    } else {
                        detail_line_style(line.kind)
                    };
                    let text = match line.kind {
                        DetailLineKind::Header(_) => pad_right(&line.text, width),
                        _ => line.text.clone(),
                    };
                    Line::from(Span::styled(text, style))
                })
                .collect();
            frame.render_widget(Paragraph::new(lines), chunks[1]);
        }
    }

    match bar {
        DetailBar::Prompt(label, editor) => render_prompt(frame, chunks[3], label, editor),
        DetailBar::Help => {
            let mut spans = vec![Span::styled(
                "  Esc: back  Enter: resume  /: search  n/N: match  j/k: scroll",
                theme::dim(),
            )];
            if let Some(status) = detail.search.status() {
                spans.push(Span::styled(format!("  {status}"), theme::dim()));
            }
            if let Some(percent) = detail.scroll_percent(visible) {
                spans.push(Span::styled(format!("  {percent}%"), theme::dim()));
            }
            frame.render_widget(Paragraph::new(Line::from(spans)), chunks[3]);
        }
    }
}

fn render_detail_placeholder(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let lines = vec![Line::from(""), Line::from(Span::styled(format!("  {text}"), style))];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn detail_line_style(kind: DetailLineKind) -> Style {
    match kind {
        DetailLineKind::Header(Role::User) => Style::default()
            .fg(theme::BRIGHT)
            .bg(theme::USER_BG)
            .add_modifier(Modifier::BOLD),
        DetailLineKind::Header(Role::Assistant) => Style::default()
            .fg(theme::BRIGHT)
            .bg(theme::ASSISTANT_BG)
            .add_modifier(Modifier::BOLD),
        DetailLineKind::Text(Role::User) => Style::default(),
        DetailLineKind::Text(Role::Assistant) => Style::default().fg(theme::ASSISTANT_FG),
        DetailLineKind::ToolCall => theme::dim().add_modifier(Modifier::ITALIC),
        DetailLineKind::Blank => Style::default(),
    }
}

fn render_prompt(frame: &mut Frame, area: Rect, label: &'static str, editor: &LineEditor) {
    let line = Line::from(vec![
        Span::styled(label, theme::bar()),
        Span::styled(editor.text.clone(), Style::default().fg(theme::BRIGHT)),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let prefix = UnicodeWidthStr::width(label) + cursor_width(editor);
    let x = area
        .x
        .saturating_add(prefix as u16)
        .min(area.x.saturating_add(area.width.saturating_sub(1)));
    frame.set_cursor_position(Position { x, y: area.y });
}

fn cursor_width(editor: &LineEditor) -> usize {
    editor
        .text
        .chars()
        .take(editor.cursor_col)
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

fn render_new_session(frame: &mut Frame, area: Rect, form: &NewSessionView) {
    let popup = centered_fixed(NEW_FORM_WIDTH, NEW_FORM_HEIGHT, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::ACCENT))
        .padding(Padding::new(2, 2, 1, 1))
        .title(Span::styled(" New Session ", theme::title()));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);

    let engine_index = match form.engine {
        SessionEngine::Claude => 0,
        SessionEngine::Codex => 1,
    };
    frame.render_widget(
        Paragraph::new(radio_line(
            "Tool:",
            &["Claude Code", "Codex"],
            engine_index,
            form.focus == NewSessionField::Tool,
        )),
        rows[0],
    );

    let dir_focused = form.focus == NewSessionField::Dir;
    let dir_line = Line::from(vec![
        field_label("Dir:", dir_focused),
        Span::raw("  "),
        Span::styled(
            if form.dir.is_empty() { "~/projects/my-app".to_string() } else { form.dir.text.clone() },
            if form.dir.is_empty() { theme::dim() } else { Style::default().fg(theme::BRIGHT) },
        ),
    ]);
    frame.render_widget(Paragraph::new(dir_line), rows[1]);
    if dir_focused && rows[1].width > 0 {
        let x = rows[1]
            .x
            .saturating_add((8 + cursor_width(&form.dir)) as u16)
            .min(rows[1].x.saturating_add(rows[1].width.saturating_sub(1)));
        frame.set_cursor_position(Position { x, y: rows[1].y });
    }

    frame.render_widget(
        Paragraph::new(radio_line(
            "Mode:",
            &["Normal", "YOLO"],
            usize::from(form.yolo),
            form.focus == NewSessionField::Mode,
        )),
        rows[2],
    );

    frame.render_widget(
        Paragraph::new("Enter: create  Esc: cancel  Tab: next  ←→: toggle").style(theme::dim()),
        rows[4],
    );
}

fn field_label(label: &str, focused: bool) -> Span<'static> {
    let style = if focused {
        Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme::FG)
    };
    Span::styled(pad_right(label, 6), style)
}

fn radio_line(label: &str, options: &[&str], selected: usize, focused: bool) -> Line<'static> {
    let mut spans = vec![field_label(label, focused), Span::raw("  ")];
    for (index, option) in options.iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw("   "));
        }
        if index == selected {
            let color = if focused { theme::ACCENT } else { theme::BRIGHT };
            spans.push(Span::styled(
                format!("● {option}"),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(format!("○ {option}"), theme::dim()));
        }
    }
    Line::from(spans)
}

fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Pads or cuts `text` to exactly `width` terminal columns.
fn pad_right(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push_str(&" ".repeat(width - used));
    out
}

fn truncate_width(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let mut out = pad_right(text, max_width.saturating_sub(2));
    out.truncate(out.trim_end().len());
    out.push_str("..");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_right_counts_display_columns() {
        assert_eq!(pad_right("abc", 5), "abc  ");
        assert_eq!(pad_right("abcdef", 3), "abc");
        assert_eq!(pad_right("日本", 3), "日 ");
    }

    #[test]
    fn truncate_width_marks_cut() {
        assert_eq!(truncate_width("short", 10), "short");
        assert_eq!(truncate_width("abcdefghij", 6), "abcd..");
    }

    #[test]
    fn summary_column_has_a_floor() {
        assert_eq!(summary_column_width(40), MIN_SUMMARY_COL);
        assert_eq!(summary_column_width(120), 71);
    }

    #[test]
    fn centered_popup_fits_small_areas() {
        let area = Rect::new(0, 0, 30, 8);
        assert_eq!(centered_fixed(60, 13, area), area);
        assert_eq!(centered_fixed(10, 4, area), Rect::new(10, 2, 10, 4));
    }
}
