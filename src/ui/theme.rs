use ratatui::style::{Color, Modifier, Style};

// Dark grays with one blue accent; engine and role colors are the only other hues.
pub const BAR_BG: Color = Color::Rgb(48, 48, 48);
pub const FG: Color = Color::Rgb(208, 208, 208);
pub const BRIGHT: Color = Color::Rgb(238, 238, 238);
pub const DIM: Color = Color::Rgb(108, 108, 108);

pub const ACCENT: Color = Color::Rgb(0, 175, 255);
pub const SELECTED_BG: Color = Color::Rgb(0, 95, 175);

pub const CLAUDE: Color = Color::Rgb(255, 175, 0);
pub const CODEX: Color = Color::Rgb(0, 215, 135);

pub const USER_BG: Color = Color::Rgb(0, 135, 0);
pub const ASSISTANT_BG: Color = Color::Rgb(255, 135, 0);
pub const ASSISTANT_FG: Color = Color::Rgb(188, 188, 188);

pub const MATCH_BG: Color = Color::Rgb(255, 255, 0);
pub const ERROR: Color = Color::Rgb(248, 113, 113);

pub fn bar() -> Style {
    Style::default().fg(FG).bg(BAR_BG)
}

pub fn title() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn dim() -> Style {
    Style::default().fg(DIM)
}

pub fn selected() -> Style {
    Style::default().fg(BRIGHT).bg(SELECTED_BG)
}
