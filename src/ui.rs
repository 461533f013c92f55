use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Pane};
use crate::detail_editor::DetailField;
use crate::model::DropdownCandidate;
use crate::theme::Theme;

struct FooterShortcut {
    key: &'static str,
    label: &'static str,
}

const TREE_SHORTCUTS: &[FooterShortcut] = &[
    FooterShortcut { key: "Enter", label: " Details" },
    FooterShortcut { key: "Space", label: " Toggle" },
    FooterShortcut { key: "e/c", label: " Expand/Collapse" },
    FooterShortcut { key: "a/A", label: " Add child/root" },
    FooterShortcut { key: "m", label: " Root" },
    FooterShortcut { key: "r", label: " Refresh" },
    FooterShortcut { key: "Tab", label: " Editor" },
    FooterShortcut { key: "q", label: " Quit" },
];

const DETAIL_SHORTCUTS: &[FooterShortcut] = &[
    FooterShortcut { key: "↑/↓", label: " Field" },
    FooterShortcut { key: "Enter", label: " Choose" },
    FooterShortcut { key: "Ctrl+S", label: " Save" },
    FooterShortcut { key: "Ctrl+D", label: " Delete" },
    FooterShortcut { key: "Tab", label: " Tree" },
    FooterShortcut { key: "Ctrl+C", label: " Quit" },
];

const ENTRY_CURSOR: &str = "▏";

pub fn render(frame: &mut Frame, app: &App) {
    let size = frame.size();
    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.background)),
        size,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(size);

    let header = Paragraph::new(app.title.clone())
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(app.theme.text)
                .bg(app.theme.primary)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(header, chunks[0]);

    let shortcuts = Paragraph::new(footer_line(app))
        .alignment(Alignment::Center)
        .style(Style::default().bg(app.theme.highlight));
    frame.render_widget(shortcuts, chunks[1]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2].inner(&Margin {
            vertical: 0,
            horizontal: 1,
        }));
    render_tree(frame, panes[0], app);
    render_detail(frame, panes[1], app);

    let status = Paragraph::new(app.status_text())
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .bg(app.theme.primary)
                .fg(app.theme.text)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(status, chunks[3]);

    let candidates = &app.store.state().dropdown_items;
    if let Some(index) = app.tree.root_picker() {
        render_picker(frame, " Show subtree ", candidates, index, &app.theme);
    } else if let Some(index) = app.detail.parent_picker() {
        render_picker(frame, " Choose parent ", candidates, index, &app.theme);
    }
}

fn pane_block<'a>(title: &'a str, focused: bool, theme: &Theme) -> Block<'a> {
    let border = if focused { theme.accent } else { theme.surface };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(theme.background).fg(theme.text))
}

fn render_tree(frame: &mut Frame, area: Rect, app: &App) {
    let block = pane_block(" Menus ", app.focus == Pane::Tree, &app.theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let state = app.store.state();
    if state.loading {
        frame.render_widget(Paragraph::new("Loading..."), inner);
        return;
    }
    if let Some(error) = &state.error {
        let text = Paragraph::new(error.clone()).style(Style::default().fg(app.theme.error));
        frame.render_widget(text, inner);
        return;
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);
    frame.render_widget(Paragraph::new(picker_button(app)), sections[0]);

    let (lines, cursor_line) = tree_lines(app, sections[1].width as usize);
    let height = sections[1].height as usize;
    let offset = cursor_line
        .map(|line| line.saturating_sub(height.saturating_sub(1)))
        .unwrap_or(0);
    let body = Paragraph::new(lines).scroll((offset as u16, 0));
    frame.render_widget(body, sections[1]);
}

fn picker_button(app: &App) -> Line<'static> {
    let candidates = &app.store.state().dropdown_items;
    let label = app
        .tree
        .viewing_root()
        .map(str::to_string)
        .or_else(|| candidates.first().map(|candidate| candidate.name.clone()))
        .unwrap_or_else(|| "(no menus)".to_string());
    Line::from(vec![
        Span::styled("Root ", Style::default().fg(app.theme.highlight)),
        Span::styled(
            format!("[ {label} ▾ ]"),
            Style::default()
                .fg(app.theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
    ])
}

/// Visible rows plus the inline entry, and the line the cursor sits on.
fn tree_lines(app: &App, width: usize) -> (Vec<Line<'static>>, Option<usize>) {
    let theme = &app.theme;
    let tree = &app.tree;
    let rows = tree.visible_rows(&app.store.state().menus);
    let focused = app.focus == Pane::Tree && tree.root_picker().is_none();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    let mut cursor_line = None;
    let mut entry_shown = false;
    for (index, row) in rows.iter().enumerate() {
        let marker = match (row.node.has_children(), row.expanded) {
            (false, _) => "  ",
            (true, true) => "▼ ",
            (true, false) => "▶ ",
        };
        let text = format!("{}{}{}", "  ".repeat(row.depth), marker, row.node.name);
        let on_cursor = index == tree.cursor();
        let style = if on_cursor {
            Style::default()
                .fg(theme.text)
                .add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(theme.text)
        };
        let line = Line::from(Span::styled(text, style));
        if on_cursor {
            cursor_line = Some(lines.len());
        }
        if on_cursor && focused && !tree.is_adding_new {
            lines.push(highlight_line_with_width(line, width, theme));
        } else {
            lines.push(line);
        }

        if tree.is_adding_new && !tree.parent_id.is_empty() && tree.parent_id == row.node.id {
            cursor_line = Some(lines.len());
            lines.push(entry_line(app, row.depth + 1, width));
            entry_shown = true;
        }
    }
    if tree.is_adding_new && !entry_shown {
        cursor_line = Some(lines.len());
        lines.push(entry_line(app, 0, width));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No menus yet. Press A to add one.",
            Style::default().fg(theme.highlight),
        )));
    }
    (lines, cursor_line)
}

fn entry_line(app: &App, depth: usize, width: usize) -> Line<'static> {
    let text = format!(
        "{}+ {}{}",
        "  ".repeat(depth),
        app.tree.new_menu_name,
        ENTRY_CURSOR
    );
    highlight_line_with_width(Line::from(text), width, &app.theme)
}

fn render_detail(frame: &mut Frame, area: Rect, app: &App) {
    let block = pane_block(" Details ", app.focus == Pane::Detail, &app.theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }
    let lines = detail_lines(app, inner.width as usize);
    frame.render_widget(Paragraph::new(lines), inner);
}

fn detail_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let theme = &app.theme;
    let state = app.store.state();
    if state.loading {
        return vec![Line::from("Loading ...")];
    }
    if let Some(error) = &state.error {
        return vec![Line::from(Span::styled(
            format!("Error: {error}"),
            Style::default().fg(theme.error),
        ))];
    }

    let draft = &app.detail.draft;
    let active = (app.focus == Pane::Detail && app.detail.parent_picker().is_none())
        .then(|| app.detail.field());

    let label_style = Style::default().fg(theme.highlight);
    let value_style = Style::default().fg(theme.text);
    let field_line = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:<10}"), label_style),
            Span::styled(value, value_style),
        ])
    };
    let selectable = |field: DetailField, line: Line<'static>| {
        if active == Some(field) {
            highlight_line_with_width(line, width, theme)
        } else {
            line
        }
    };

    let parent = match draft.parent_label() {
        "" if draft.is_root() => "(none)".to_string(),
        "" => draft.parent_id.clone().unwrap_or_default(),
        name => name.to_string(),
    };
    let mut name = draft.name.clone();
    if active == Some(DetailField::Name) {
        name.push_str(ENTRY_CURSOR);
    }
    let action_style = Style::default()
        .fg(theme.accent)
        .add_modifier(Modifier::BOLD);

    let mut lines = Vec::new();
    if draft.id.is_empty() {
        lines.push(Line::from(Span::styled(
            "Select a menu and press Enter to edit it.",
            label_style,
        )));
        lines.push(Line::default());
    }
    lines.push(field_line("Menu ID", draft.id.clone()));
    lines.push(field_line("Depth", draft.depth.to_string()));
    lines.push(selectable(
        DetailField::Parent,
        field_line("Parent", format!("{parent} ▾")),
    ));
    lines.push(selectable(DetailField::Name, field_line("Name", name)));
    lines.push(Line::default());
    lines.push(selectable(
        DetailField::Save,
        Line::from(Span::styled("[ Save ]", action_style)),
    ));
    lines.push(selectable(
        DetailField::Delete,
        Line::from(Span::styled("[ Delete ]", action_style)),
    ));
    lines
}

fn render_picker(
    frame: &mut Frame,
    title: &str,
    candidates: &[DropdownCandidate],
    selected: usize,
    theme: &Theme,
) {
    let area = centered_rect(frame.size(), 50, 60);
    frame.render_widget(Clear, area);
    let mut items: Vec<ListItem> = candidates
        .iter()
        .map(|candidate| {
            ListItem::new(format!(
                "{}{}",
                "  ".repeat(candidate.depth as usize),
                candidate.name
            ))
        })
        .collect();
    if items.is_empty() {
        items.push(ListItem::new("No menus available"));
    }
    let list = List::new(items)
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .style(Style::default().bg(theme.surface).fg(theme.text)),
        )
        .highlight_style(
            Style::default()
                .fg(theme.background)
                .bg(theme.highlight)
                .add_modifier(Modifier::BOLD),
        );
    let mut list_state = ListState::default();
    if !candidates.is_empty() {
        list_state.select(Some(selected.min(candidates.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn footer_line(app: &App) -> Line<'static> {
    let shortcuts = match app.focus {
        Pane::Tree => TREE_SHORTCUTS,
        Pane::Detail => DETAIL_SHORTCUTS,
    };
    let key_style = Style::default()
        .fg(app.theme.accent)
        .bg(app.theme.highlight)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default()
        .fg(app.theme.background)
        .bg(app.theme.highlight);
    let mut spans = Vec::new();
    for (index, shortcut) in shortcuts.iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(" | ", label_style));
        }
        spans.push(Span::styled(shortcut.key, key_style));
        spans.push(Span::styled(shortcut.label, label_style));
    }
    Line::from(spans)
}

/// Restyles every span as highlighted and pads the line out to `width`.
fn highlight_line_with_width(mut line: Line<'static>, width: usize, theme: &Theme) -> Line<'static> {
    let mut text_width = 0usize;
    let highlight_style = Style::default()
        .fg(theme.background)
        .bg(theme.highlight)
        .add_modifier(Modifier::BOLD);
    for span in &mut line.spans {
        span.style = highlight_style;
        text_width += UnicodeWidthStr::width(span.content.as_ref());
    }
    if width > text_width {
        line.spans
            .push(Span::styled(" ".repeat(width - text_width), highlight_style));
    }
    line
}

fn centered_rect(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(area);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - height_percent) / 2),
            Constraint::Percentage(height_percent),
            Constraint::Percentage((100 - height_percent) / 2),
        ])
        .split(horizontal[1]);
    vertical[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::model::{MenuNode, MenuOp};
    use crate::store::{Store, StoreMsg};
    use crate::testing::FakeRepository;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    fn app() -> App {
        let (store, _rx) = Store::new(Arc::new(FakeRepository::new()));
        let settings = Settings {
            base_url: "http://localhost:3000".into(),
            title: "Menu Admin".into(),
            theme: "nord".into(),
            request_timeout: Duration::from_secs(1),
            log_file: PathBuf::from("menu-admin.log"),
        };
        App::new(store, &settings)
    }

    fn shop_tree() -> Vec<MenuNode> {
        vec![MenuNode {
            id: "2".into(),
            name: "Shop".into(),
            children: vec![MenuNode {
                id: "3".into(),
                name: "Deals".into(),
                depth: 1,
                parent_id: Some("2".into()),
                ..Default::default()
            }],
            ..Default::default()
        }]
    }

    fn render_snapshot(app: &App) -> String {
        let (width, height) = (100, 20);
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("test terminal");
        terminal.draw(|frame| render(frame, app)).expect("draw");
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();
        for y in 0..height {
            let mut line = String::new();
            for x in 0..width {
                line.push_str(buffer.get(x, y).symbol());
            }
            lines.push(line.trim_end().to_string());
        }
        lines.join("\n")
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn loading_replaces_both_panes() {
        let mut app = app();
        app.store.apply(StoreMsg::Pending(MenuOp::FetchMenus));
        let screen = render_snapshot(&app);
        assert!(screen.contains("Loading..."));
        assert!(screen.contains("Loading ..."));
    }

    #[test]
    fn error_is_shown_in_both_panes() {
        let mut app = app();
        app.store.apply(StoreMsg::Rejected {
            op: MenuOp::FetchMenus,
            message: "Failed to fetch menus".into(),
        });
        let screen = render_snapshot(&app);
        assert!(screen.contains("Error: Failed to fetch menus"));
    }

    #[test]
    fn expanded_branch_shows_marker_and_indented_child() {
        let mut app = app();
        app.store.apply(StoreMsg::MenusFetched(shop_tree()));
        let (lines, _) = tree_lines(&app, 0);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["▶ Shop".to_string()]);

        app.tree.toggle("2");
        let (lines, _) = tree_lines(&app, 0);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["▼ Shop".to_string(), "    Deals".to_string()]);
    }

    #[test]
    fn inline_entry_sits_under_its_parent() {
        let mut app = app();
        app.store.apply(StoreMsg::MenusFetched(shop_tree()));
        app.handle_key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE));
        app.handle_key(KeyEvent::new(KeyCode::Char('X'), KeyModifiers::NONE));
        let (lines, cursor) = tree_lines(&app, 0);
        assert_eq!(line_text(&lines[1]), format!("  + X{ENTRY_CURSOR}"));
        assert_eq!(cursor, Some(1));
    }

    #[test]
    fn detail_pane_lists_draft_fields() {
        let mut app = app();
        app.store.apply(StoreMsg::MenuDetailsFetched(MenuNode {
            id: "3".into(),
            name: "Deals".into(),
            depth: 1,
            parent_id: Some("2".into()),
            parent_name: Some("Shop".into()),
            ..Default::default()
        }));
        app.detail.observe(app.store.state());
        let texts: Vec<String> = detail_lines(&app, 0).iter().map(line_text).collect();
        assert!(texts.contains(&"Parent    Shop ▾".to_string()));
        assert!(texts.contains(&"Name      Deals".to_string()));
        assert!(texts.contains(&"[ Delete ]".to_string()));
    }

    #[test]
    fn picker_button_falls_back_to_first_candidate() {
        let mut app = app();
        app.store.apply(StoreMsg::DropdownItemsFetched(vec![DropdownCandidate {
            id: "1".into(),
            name: "Home".into(),
            depth: 0,
        }]));
        assert_eq!(line_text(&picker_button(&app)), "Root [ Home ▾ ]");
    }

    #[test]
    fn highlight_pads_to_width() {
        let theme = Theme::default();
        let line = highlight_line_with_width(Line::from("Menü"), 8, &theme);
        assert_eq!(line_text(&line), "Menü    ");
    }
}
