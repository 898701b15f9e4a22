use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use oracle_core::{NoticeKind, Rendered, Theme};

use crate::app::{App, Field, TextInput, HELPER_CHIPS};

const MAX_VISIBLE_NOTICES: usize = 4;

/// Colors for the current theme
struct Palette {
    bg: Color,
    fg: Color,
    dim: Color,
    accent: Color,
    focus: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                bg: Color::Black,
                fg: Color::White,
                dim: Color::DarkGray,
                accent: Color::Cyan,
                focus: Color::LightMagenta,
            },
            Theme::Light => Self {
                bg: Color::White,
                fg: Color::Black,
                dim: Color::Gray,
                accent: Color::Blue,
                focus: Color::Red,
            },
        }
    }
}

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();

    for (i, segment) in text.split("**").enumerate() {
        if segment.is_empty() {
            continue;
        }
        // Odd segments sit between a pair of markers
        if i % 2 == 1 {
            spans.push(Span::styled(
                segment.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(segment.to_string()));
        }
    }

    // An unmatched marker leaves an even count of segments; show it literally
    if text.matches("**").count() % 2 == 1 {
        return Line::raw(text.to_string());
    }

    Line::from(spans)
}

fn answer_text(answer: &Rendered) -> Text<'static> {
    match answer {
        Rendered::Text(raw) => Text::from(raw.lines().map(parse_markdown_line).collect::<Vec<_>>()),
        Rendered::Html(html) => Text::raw(html.clone()),
    }
}

pub fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();
    let palette = Palette::for_theme(app.theme);

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
        area,
    );

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, &palette, frame, header_area);

    let [prompt_area, image_area, attach_area, chips_area, answer_area] = Layout::vertical([
        Constraint::Length(6),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(3),
    ])
    .areas(body_area);

    render_input(app, &palette, frame, prompt_area, Field::Prompt, " Prompt ", &app.prompt);
    render_input(app, &palette, frame, image_area, Field::ImageUrl, " Image URL ", &app.image_url);

    let attach_title = match &app.attachment_name {
        Some(name) => format!(" Attachment: {} ", name),
        None => " Attach image (path) ".to_string(),
    };
    render_input(app, &palette, frame, attach_area, Field::Attachment, &attach_title, &app.attachment);

    render_chips(&palette, frame, chips_area);
    render_answer(app, &palette, frame, answer_area);
    render_footer(app, &palette, frame, footer_area);
    render_notices(app, frame, area);
}

fn render_header(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Otaku Oracle ", Style::default().fg(palette.accent).bold()),
        Span::styled(format!("{} ", app.base_url()), Style::default().fg(palette.dim)),
        Span::styled(
            format!("[{}] v{}", app.theme.as_str(), env!("CARGO_PKG_VERSION")),
            Style::default().fg(palette.dim),
        ),
    ]);

    frame.render_widget(Paragraph::new(title), area);
}

fn render_input(
    app: &App,
    palette: &Palette,
    frame: &mut Frame,
    area: Rect,
    field: Field,
    title: &str,
    input: &TextInput,
) {
    let focused = app.focus == field;
    let border = if focused {
        Style::default().fg(palette.focus)
    } else {
        Style::default().fg(palette.dim)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title.to_string());

    let inner = block.inner(area);
    let paragraph = Paragraph::new(input.value.clone())
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);

    if focused && inner.width > 0 {
        // Cursor position on the (possibly multi-line) value
        let before: String = input.value.chars().take(input.cursor).collect();
        let row = before.matches('\n').count() as u16;
        let col = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0) as u16;
        let x = inner.x + col.min(inner.width.saturating_sub(1));
        let y = inner.y + row.min(inner.height.saturating_sub(1));
        frame.set_cursor_position((x, y));
    }
}

fn render_chips(palette: &Palette, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(palette.dim).fg(palette.fg);
    let mut spans = Vec::new();
    for (i, chip) in HELPER_CHIPS.iter().enumerate() {
        spans.push(Span::styled(format!(" F{} ", i + 1), key_style));
        spans.push(Span::raw(format!(" {} ", chip)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_answer(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let title = if app.loading {
        let dots = ".".repeat(app.animation_frame as usize + 1);
        format!(" Thinking{:<3} ", dots)
    } else {
        " Answer ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(title);

    let text = match &app.answer {
        Some(answer) => answer_text(answer),
        None => Text::styled("Ask anything about anime and manga.", Style::default().fg(palette.dim)),
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.answer_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_footer(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(palette.dim).fg(palette.fg);

    // Submit hint greys out while a request is in flight
    let ask_style = if app.can_submit() {
        Style::default().bg(palette.accent).fg(palette.bg).bold()
    } else {
        Style::default().bg(palette.dim).fg(palette.bg)
    };

    let hints = vec![
        Span::styled(" Enter ", ask_style),
        Span::raw(" ask "),
        Span::styled(" Tab ", key_style),
        Span::raw(" field "),
        Span::styled(" ^X ", key_style),
        Span::raw(" detach "),
        Span::styled(" ^Y ", key_style),
        Span::raw(" copy "),
        Span::styled(" ^L ", key_style),
        Span::raw(" clear "),
        Span::styled(" ^T ", key_style),
        Span::raw(" theme "),
        Span::styled(" ^C ", key_style),
        Span::raw(" quit "),
    ];

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn render_notices(app: &App, frame: &mut Frame, area: Rect) {
    let width = (area.width / 2).max(30).min(area.width);
    let mut y = area.y + 1;

    for active in app.notices.iter().rev().take(MAX_VISIBLE_NOTICES) {
        let color = match active.notice.kind {
            NoticeKind::Info => Color::Cyan,
            NoticeKind::Warn => Color::Yellow,
            NoticeKind::Error => Color::Red,
        };

        let text_width = width.saturating_sub(2).max(1) as usize;
        let lines = active.notice.message.chars().count().div_ceil(text_width).max(1) as u16;
        let height = lines + 2;
        if y + height > area.bottom() {
            break;
        }

        let rect = Rect::new(area.right().saturating_sub(width), y, width, height);
        let paragraph = Paragraph::new(active.notice.message.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .title(format!(" {} ", active.notice.kind.as_str())),
            );

        frame.render_widget(Clear, rect);
        frame.render_widget(paragraph, rect);
        y += height;
    }
}
