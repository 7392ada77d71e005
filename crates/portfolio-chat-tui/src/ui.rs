use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use portfolio_chat_core::{render_blocks, Hint, Sender, Segment, Theme};
use crate::app::{App, InputMode};

const PANEL_WIDTH: u16 = 56;
const PANEL_HEIGHT: u16 = 26;
const LAUNCHER_WIDTH: u16 = 8;
const LAUNCHER_HEIGHT: u16 = 3;

/// Colors for one widget theme
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub muted: Color,
    pub border: Color,
    pub user: Color,
    pub assistant: Color,
    pub link: Color,
    pub code_fg: Color,
    pub code_bg: Color,
}

pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            bg: Color::Rgb(16, 13, 37),
            fg: Color::White,
            muted: Color::Gray,
            border: Color::Rgb(147, 51, 234),
            user: Color::Rgb(192, 132, 252),
            assistant: Color::Rgb(96, 165, 250),
            link: Color::Cyan,
            code_fg: Color::Green,
            code_bg: Color::Rgb(5, 5, 5),
        },
        Theme::Light => Palette {
            bg: Color::Rgb(249, 250, 251),
            fg: Color::Rgb(17, 24, 39),
            muted: Color::DarkGray,
            border: Color::Rgb(37, 99, 235),
            user: Color::Rgb(124, 58, 237),
            assistant: Color::Rgb(29, 78, 216),
            link: Color::Blue,
            code_fg: Color::Green,
            code_bg: Color::Rgb(5, 5, 5),
        },
        Theme::Accent => Palette {
            bg: Color::Rgb(28, 25, 16),
            fg: Color::Rgb(254, 249, 195),
            muted: Color::Rgb(161, 161, 120),
            border: Color::Yellow,
            user: Color::Yellow,
            assistant: Color::Rgb(253, 224, 71),
            link: Color::Cyan,
            code_fg: Color::Green,
            code_bg: Color::Rgb(5, 5, 5),
        },
    }
}

/// Turn one message into display lines: prose flows, links are
/// underlined, fenced code gets its own shaded lines.
pub fn message_lines(text: &str, palette: &Palette) -> Vec<Line<'static>> {
    let link_style = Style::default().fg(palette.link).add_modifier(Modifier::UNDERLINED);
    let code_style = Style::default().fg(palette.code_fg).bg(palette.code_bg);
    let mut lines: Vec<Line<'static>> = Vec::new();

    for block in render_blocks(text) {
        match block {
            portfolio_chat_core::Block::Prose(segments) => {
                let mut current: Vec<Span<'static>> = Vec::new();
                for segment in segments {
                    match segment {
                        Segment::Text(value) => {
                            let mut parts = value.split('\n');
                            if let Some(first) = parts.next().filter(|p| !p.is_empty()) {
                                current.push(Span::raw(first.to_string()));
                            }
                            for part in parts {
                                lines.push(Line::from(std::mem::take(&mut current)));
                                if !part.is_empty() {
                                    current.push(Span::raw(part.to_string()));
                                }
                            }
                        }
                        Segment::Link(url) => current.push(Span::styled(url, link_style)),
                        // Fenced code always comes out as its own block
                        Segment::Code(_) => {}
                    }
                }
                if !current.is_empty() {
                    lines.push(Line::from(current));
                }
            }
            portfolio_chat_core::Block::Code(code) => {
                for code_line in code.trim_matches('\n').lines() {
                    lines.push(Line::from(Span::styled(format!(" {code_line} "), code_style)));
                }
            }
        }
    }

    lines
}

/// Word-wrap one styled line to `width` columns, keeping each span's
/// style. Whitespace that falls on a break is dropped and words longer
/// than a row are split.
fn wrap_line(line: &Line<'static>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let cells: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|span| {
            let style = line.style.patch(span.style);
            span.content.chars().map(move |c| (c, style))
        })
        .collect();
    if cells.len() <= width {
        return vec![line.clone()];
    }

    let mut rows: Vec<Vec<(char, Style)>> = Vec::new();
    let mut row: Vec<(char, Style)> = Vec::new();
    let mut i = 0;
    while i < cells.len() {
        // Next run of either spaces or non-spaces
        let start = i;
        let is_space = cells[i].0.is_whitespace();
        while i < cells.len() && cells[i].0.is_whitespace() == is_space {
            i += 1;
        }
        let mut word = &cells[start..i];

        if is_space {
            if row.len() + word.len() <= width {
                row.extend_from_slice(word);
            } else if !row.is_empty() {
                rows.push(std::mem::take(&mut row));
            }
            continue;
        }

        if row.len() + word.len() > width {
            while row.last().is_some_and(|(c, _)| c.is_whitespace()) {
                row.pop();
            }
            if !row.is_empty() {
                rows.push(std::mem::take(&mut row));
            }
        }
        while word.len() > width {
            rows.push(word[..width].to_vec());
            word = &word[width..];
        }
        row.extend_from_slice(word);
    }
    if !row.is_empty() || rows.is_empty() {
        rows.push(row);
    }

    rows.into_iter().map(cells_to_line).collect()
}

fn cells_to_line(cells: Vec<(char, Style)>) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    for (c, style) in cells {
        match spans.last_mut() {
            Some(span) if span.style == style => span.content.to_mut().push(c),
            _ => spans.push(Span::styled(c.to_string(), style)),
        }
    }
    Line::from(spans)
}

/// Pre-wrap lines so that one entry is exactly one screen row
fn wrap_lines(lines: &[Line<'static>], width: u16) -> Vec<Line<'static>> {
    lines
        .iter()
        .flat_map(|line| wrap_line(line, width as usize))
        .collect()
}

/// A `width` x `height` box hugging the bottom-right corner of `area`,
/// raised `lift` rows.
fn bottom_right(area: Rect, width: u16, height: u16, lift: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + area.width.saturating_sub(width + 1);
    let y = (area.y + area.height)
        .saturating_sub(height + 1 + lift)
        .max(area.y);
    Rect::new(x, y, width, height)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    if app.shell.is_open() {
        app.launcher_area = None;
        render_panel(app, frame, body_area);
    } else {
        app.chat_area = None;
        render_launcher(app, frame, body_area);
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = if app.conversation.is_pending() {
        Span::styled(" ● waiting ", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("")
    };

    let title = Line::from(vec![
        Span::styled(" Portfolio Chat ", Style::default().fg(Color::Cyan).bold()),
        status,
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = if !app.shell.is_open() {
        " CLOSED "
    } else if app.input_mode == InputMode::Editing {
        " TYPING "
    } else {
        " CHAT "
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let keys: &[(&str, &str)] = match (app.shell.is_open(), app.input_mode) {
        (false, _) => &[(" Enter ", " open "), (" q ", " quit ")],
        (true, InputMode::Normal) => &[
            (" i ", " type "),
            (" j/k ", " scroll "),
            (" t ", " theme "),
            (" Esc ", " close "),
            (" q ", " quit "),
        ],
        (true, InputMode::Editing) => &[(" Enter ", " send "), (" Esc ", " stop typing ")],
    };

    let hints = keys.iter().flat_map(|(key, label)| {
        [Span::styled(*key, key_style), Span::styled(*label, label_style)]
    });

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_launcher(app: &mut App, frame: &mut Frame, area: Rect) {
    let hints = app.shell.visible_hints();

    // Bounce while the attention hint is live
    let lift = if hints.contains(&Hint::Attention) && app.animation_frame == 1 { 1 } else { 0 };
    let launcher = bottom_right(area, LAUNCHER_WIDTH, LAUNCHER_HEIGHT, lift);
    app.launcher_area = Some(launcher);

    let button = Paragraph::new(Line::from(" AI ".bold()).centered())
        .style(Style::default().fg(Color::White).bg(Color::Rgb(124, 58, 237)))
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    frame.render_widget(Clear, launcher);
    frame.render_widget(button, launcher);

    let mut stack = LAUNCHER_HEIGHT + 1;
    for hint in hints {
        let Some(label) = hint.label() else {
            continue;
        };
        let style = match hint {
            Hint::Notify => Style::default().fg(Color::Black).bg(Color::Yellow).bold(),
            _ => Style::default().fg(Color::White).bg(Color::Black),
        };
        let width = label.chars().count() as u16 + 2;
        let bubble = bottom_right(area, width, 1, stack);
        frame.render_widget(Paragraph::new(format!(" {label} ")).style(style), bubble);
        stack += 2;
    }
}

fn render_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let theme = app.shell.theme();
    let colors = palette(theme);
    let panel = bottom_right(area, PANEL_WIDTH, PANEL_HEIGHT, 0);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors.border))
        .style(Style::default().bg(colors.bg).fg(colors.fg))
        .title(Line::from(" Himanshu AI ".bold()))
        .title_top(Line::from(format!(" {} ", theme.as_str())).right_aligned());
    let inner = block.inner(panel);
    frame.render_widget(Clear, panel);
    frame.render_widget(block, panel);

    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(inner);
    app.chat_area = Some(chat_area);

    render_chat(app, frame, chat_area, &colors);
    render_input(app, frame, input_area, &colors);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect, colors: &Palette) {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.conversation.messages() {
        let (label, color) = match msg.sender() {
            Sender::User => ("You:", colors.user),
            Sender::Assistant => ("AI:", colors.assistant),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.extend(message_lines(msg.text(), colors));
        lines.push(Line::default());
    }

    if app.conversation.is_pending() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("AI is thinking{}", dots),
            Style::default().fg(colors.muted).add_modifier(Modifier::ITALIC),
        )));
    }

    // Rows are counted exactly as they are drawn
    let rows = wrap_lines(&lines, area.width);
    app.chat_height = area.height;
    app.chat_total_lines = u16::try_from(rows.len()).unwrap_or(u16::MAX);
    if app.take_follow_latest() {
        app.scroll_to_bottom();
    }
    app.chat_scroll = app.chat_scroll.min(app.max_chat_scroll());

    let chat = Paragraph::new(Text::from(rows))
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect, colors: &Palette) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { colors.border } else { colors.muted };
    let title = if app.conversation.is_pending() {
        " Waiting for reply... "
    } else {
        " Ask "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() && !editing {
        Paragraph::new(Span::styled("Ask about my work...", Style::default().fg(colors.muted)))
    } else {
        let visible_text: String = app.input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(colors.fg))
    };
    frame.render_widget(input.block(input_block), area);

    // Show cursor when editing
    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}
