use chrono::Utc;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, List, ListItem, Paragraph, Wrap};

use crate::executor::Transport;
use crate::panel::{Focus, Mode, Panel};
use crate::settings::ThemePreference;

pub fn draw<T: Transport>(frame: &mut Frame, panel: &mut Panel<T>, theme: ThemePreference) {
    let size = frame.area();
    let theme = theme_from(theme);
    frame.render_widget(Block::default().style(theme.panel_style()), size);

    let content = size.inner(Margin {
        vertical: 1,
        horizontal: 2,
    });
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(content);

    let header = Paragraph::new(header_line(panel, &theme)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(theme.border_style())
            .style(theme.panel_style()),
    );
    frame.render_widget(header, chunks[0]);

    draw_description(frame, panel, chunks[1], &theme);
    draw_lists(frame, panel, chunks[2], &theme);

    let footer = Paragraph::new(footer_line(panel, &theme)).style(theme.panel_style());
    frame.render_widget(footer, chunks[3]);

    match panel.mode {
        Mode::Loading => draw_overlay(frame, size, "Loading workspaces from Toggl...", &theme),
        Mode::Error => draw_overlay(
            frame,
            size,
            panel
                .status
                .as_ref()
                .map(|status| status.message.as_str())
                .unwrap_or("Unknown error"),
            &theme,
        ),
        Mode::Ready => {}
    }
}

fn draw_description<T: Transport>(frame: &mut Frame, panel: &Panel<T>, area: Rect, theme: &Theme) {
    let mut spans = vec![Span::raw(panel.description.as_str())];
    if panel.focus == Focus::Description {
        spans.push(Span::styled("▏", Style::default().fg(theme.accent)));
    }
    let paragraph = Paragraph::new(Line::from(spans))
        .style(theme.panel_style())
        .block(focus_block("Description", panel.focus == Focus::Description, theme));
    frame.render_widget(paragraph, area);
}

fn draw_lists<T: Transport>(frame: &mut Frame, panel: &mut Panel<T>, area: Rect, theme: &Theme) {
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let workspace_items: Vec<ListItem> = panel
        .session()
        .workspaces()
        .iter()
        .map(|workspace| ListItem::new(Line::from(workspace.name.clone())).style(theme.panel_style()))
        .collect();
    let project_items: Vec<ListItem> = if panel.session().projects().is_empty() {
        vec![ListItem::new(Line::from(Span::styled("No projects", theme.muted_style())))]
    } else {
        panel
            .session()
            .projects()
            .iter()
            .map(|project| ListItem::new(Line::from(project.name.clone())).style(theme.panel_style()))
            .collect()
    };

    let workspace_focused = panel.focus == Focus::Workspaces;
    let project_focused = panel.focus == Focus::Projects;

    let workspaces = List::new(workspace_items)
        .block(focus_block("Workspace", workspace_focused, theme))
        .highlight_style(theme.highlight_style(workspace_focused))
        .highlight_symbol(if workspace_focused { "▍ " } else { "▏ " });
    frame.render_stateful_widget(workspaces, body[0], &mut panel.workspace_state);

    let projects = List::new(project_items)
        .block(focus_block("Project", project_focused, theme))
        .highlight_style(theme.highlight_style(project_focused))
        .highlight_symbol(if project_focused { "▍ " } else { "▏ " });
    frame.render_stateful_widget(projects, body[1], &mut panel.project_state);
}

fn header_line<T: Transport>(panel: &Panel<T>, theme: &Theme) -> Line<'static> {
    let mut spans = vec![Span::styled("Start timer", theme.title_style())];
    match &panel.current {
        Some(entry) => {
            let elapsed = entry.elapsed_seconds(Utc::now());
            spans.push(Span::styled("  •  Running: ", theme.muted_style()));
            spans.push(Span::styled(
                format!("{} ({})", entry.label(), format_elapsed(elapsed)),
                Style::default().fg(theme.success),
            ));
        }
        None => spans.push(Span::styled("  •  No timer running", theme.muted_style())),
    }
    if let Some(refreshed) = panel.last_refresh {
        spans.push(Span::styled(
            format!("  •  Updated {}", refreshed.format("%H:%M")),
            theme.muted_style(),
        ));
    }
    Line::from(spans)
}

fn footer_line<T: Transport>(panel: &Panel<T>, theme: &Theme) -> Line<'static> {
    if let Some(status) = &panel.status {
        let color = if status.is_error { theme.error } else { theme.success };
        return Line::from(Span::styled(
            status.message.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }
    let key_style = theme.title_style();
    Line::from(vec![
        Span::styled("Enter", key_style),
        Span::styled(" start  ", theme.muted_style()),
        Span::styled("Ctrl+S", key_style),
        Span::styled(" stop  ", theme.muted_style()),
        Span::styled("Tab", key_style),
        Span::styled(" focus  ", theme.muted_style()),
        Span::styled("Ctrl+F", key_style),
        Span::styled(" fill from file  ", theme.muted_style()),
        Span::styled("Ctrl+R", key_style),
        Span::styled(" refresh  ", theme.muted_style()),
        Span::styled("Esc", key_style),
        Span::styled(" quit", theme.muted_style()),
    ])
}

fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

fn draw_overlay(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let block = centered_rect(60, 20, area);
    frame.render_widget(Clear, block);
    let paragraph = Paragraph::new(message)
        .alignment(Alignment::Center)
        .block(panel_block("Status", theme))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, block);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1]);
    vertical[1]
}

fn panel_block(title: &str, theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.border_style())
        .style(theme.panel_style())
        .title(Line::from(Span::styled(
            format!(" {} ", title),
            theme.title_style(),
        )))
}

fn focus_block(title: &str, focused: bool, theme: &Theme) -> Block<'static> {
    let block = panel_block(title, theme);
    if focused {
        block.border_style(Style::default().fg(theme.accent))
    } else {
        block
    }
}

/// Colours the panel draws with. Borders reuse `muted`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Theme {
    panel: Color,
    text: Color,
    muted: Color,
    accent: Color,
    success: Color,
    error: Color,
}

impl Theme {
    fn panel_style(&self) -> Style {
        Style::default().bg(self.panel).fg(self.text)
    }

    fn border_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    fn title_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    fn highlight_style(&self, focused: bool) -> Style {
        if focused {
            Style::default()
                .bg(self.accent)
                .fg(self.panel)
                .add_modifier(Modifier::BOLD)
        } else {
            self.title_style()
        }
    }
}

fn theme_from(pref: ThemePreference) -> Theme {
    match pref {
        ThemePreference::Terminal => Theme {
            panel: Color::Reset,
            text: Color::Reset,
            muted: Color::DarkGray,
            accent: Color::Magenta,
            success: Color::Green,
            error: Color::Red,
        },
        ThemePreference::Dark => Theme {
            panel: Color::Rgb(30, 24, 38),
            text: Color::Rgb(236, 228, 240),
            muted: Color::Rgb(140, 126, 156),
            accent: Color::Rgb(229, 124, 216),
            success: Color::Rgb(110, 204, 150),
            error: Color::Rgb(240, 110, 100),
        },
        ThemePreference::Light => Theme {
            panel: Color::Rgb(252, 250, 248),
            text: Color::Rgb(44, 19, 56),
            muted: Color::Rgb(120, 104, 128),
            accent: Color::Rgb(165, 48, 150),
            success: Color::Rgb(30, 128, 80),
            error: Color::Rgb(196, 48, 48),
        },
    }
}
