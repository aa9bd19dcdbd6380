//! Rendering for the three screens.

use std::collections::HashMap;

use image::RgbaImage;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Points, Rectangle};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;

use super::app::{App, CatalogPane, Screen};
use crate::canvas::{downsample, Surface, CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::colors::tag_color;
use crate::models::Page;
use crate::services::catalog::TagPicker;
use crate::services::{
    AnnotatePhase, AnnotateScreen, CatalogModal, CatalogScreen, DetailScreen, EditorFocus,
    ImageView, LocaleView, NoticeLevel,
};

const FOCUSED: Style = Style::new().fg(Color::Yellow);
const MUTED: Style = Style::new().fg(Color::DarkGray);

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let title = Line::from(vec![
        Span::styled(" pagedesk ", Style::new().fg(Color::Black).bg(Color::Cyan)),
        Span::raw(format!(" {}", app.route)),
    ]);
    frame.render_widget(Paragraph::new(title), chunks[0]);

    match app.screen {
        Screen::Catalog(ref screen) => draw_catalog(frame, chunks[1], screen, app.catalog_pane),
        Screen::Detail(ref screen) => draw_detail(frame, chunks[1], screen),
        Screen::Annotate(ref screen) => draw_annotate(frame, chunks[1], screen),
    }

    frame.render_widget(Paragraph::new(hints(app)).style(MUTED), chunks[2]);
    draw_toasts(frame, app);
}

fn hints(app: &App) -> &'static str {
    match app.screen {
        Screen::Catalog(ref s) if s.modal.is_some() => {
            "Tab next field  ←/→ tag  Space pick tag  Enter submit  Esc close"
        }
        Screen::Catalog(_) => match app.catalog_pane {
            CatalogPane::Search => "type to search  Enter/Esc done",
            CatalogPane::Tags => "←/→ move  Space filter  Tab/Esc back",
            CatalogPane::Table => {
                "↑/↓ select  Enter view  e edit  d delete  / search  Tab tags  n page  t tag  b bulk  x export  q quit"
            }
        },
        Screen::Detail(_) => "i image  l locale  e edit  r reload  Esc back",
        Screen::Annotate(ref s) => match s.focus {
            EditorFocus::Canvas => {
                "a add  Tab select  arrows move  Enter edit text  c clear  s save image  L edit locale  S save locale  v locale view  Esc back"
            }
            EditorFocus::OverlayText => "type text  Enter/Esc done",
            EditorFocus::Locale => "type JSON  Ctrl+S save locale  Esc done",
        },
    }
}

fn tag_spans(tags: &[String]) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    for tag in tags {
        spans.push(Span::styled(format!(" {} ", tag), tag_color(tag).style()));
        spans.push(Span::raw(" "));
    }
    spans
}

/// Tag options with the selection colored and the cursor highlighted.
fn picker_line(picker: &TagPicker, focused: bool) -> Line<'_> {
    if picker.available().is_empty() {
        return Line::styled("no tags", MUTED);
    }
    let mut spans = Vec::new();
    for (i, tag) in picker.available().iter().enumerate() {
        let mut style = if picker.is_selected(tag) {
            tag_color(tag).style()
        } else {
            MUTED
        };
        if focused && i == picker.cursor() {
            style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
        }
        spans.push(Span::styled(format!(" {} ", tag), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn bordered<'a>(title: impl Into<Line<'a>>, focused: bool) -> Block<'a> {
    let block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block.border_style(FOCUSED)
    } else {
        block
    }
}

// ----------------------------------------------------------------------
// Catalog
// ----------------------------------------------------------------------

fn draw_catalog(frame: &mut Frame, area: Rect, screen: &CatalogScreen, pane: CatalogPane) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let search = if screen.search.is_empty() && pane != CatalogPane::Search {
        Line::styled("Search by page name", MUTED)
    } else {
        Line::raw(screen.search.as_str())
    };
    frame.render_widget(
        Paragraph::new(search).block(bordered("Search", pane == CatalogPane::Search)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(picker_line(
            &screen.tags,
            pane == CatalogPane::Tags && screen.modal.is_none(),
        ))
        .block(bordered("Filter by tags", pane == CatalogPane::Tags)),
        chunks[1],
    );

    let rows: Vec<Row> = screen
        .pages
        .iter()
        .map(|page| {
            let annotated = if page.annotated_image().is_some() { "yes" } else { "-" };
            Row::new(vec![
                Cell::from(page.id.as_str()),
                Cell::from(page.name.as_str()),
                Cell::from(Line::from(tag_spans(&page.tags))),
                Cell::from(page.image_link.as_str()),
                Cell::from(annotated),
                Cell::from(locale_summary(page)),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Percentage(18),
            Constraint::Percentage(22),
            Constraint::Percentage(20),
            Constraint::Length(9),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["Id", "Name", "Tags", "Image", "Annotated", "Locale"])
            .style(Style::new().add_modifier(Modifier::BOLD)),
    )
    .block(bordered(
        format!("Pages ({})", screen.pages.len()),
        pane == CatalogPane::Table,
    ))
    .row_highlight_style(Style::new().add_modifier(Modifier::REVERSED));

    let mut state = TableState::default();
    if !screen.pages.is_empty() {
        state.select(Some(screen.selected_row()));
    }
    frame.render_stateful_widget(table, chunks[2], &mut state);

    if let Some(ref modal) = screen.modal {
        draw_modal(frame, area, modal, &screen.tags);
    }
}

/// One-line locale cell: `name=en` pairs, or the parse error.
fn locale_summary(page: &Page) -> Line<'static> {
    match page.locale_table() {
        Ok(table) if table.is_empty() => Line::styled("(empty)", MUTED),
        Ok(table) => Line::raw(
            table
                .rows()
                .map(|[name, _, en, _]| format!("{}={}", name, en))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Err(e) => Line::styled(format!("invalid locale: {}", e), Style::new().fg(Color::Red)),
    }
}

fn draw_modal(frame: &mut Frame, area: Rect, modal: &CatalogModal, tags: &TagPicker) {
    let popup = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup);

    let mut lines = Vec::new();
    for (i, field) in modal.fields.iter().enumerate() {
        let focused = i == modal.focus;
        let marker = if focused { "> " } else { "  " };
        lines.push(Line::styled(
            format!("{}{}", marker, field.label),
            if focused { FOCUSED } else { Style::new() },
        ));
        if field.value.is_empty() {
            lines.push(Line::styled(format!("  {}", field.placeholder), MUTED));
        } else {
            lines.push(Line::raw(format!("  {}", field.value)));
        }
        lines.push(Line::raw(""));
    }

    if modal.kind.uses_tags() {
        let focused = modal.tags_focused();
        lines.push(Line::styled(
            if focused { "> Tags" } else { "  Tags" },
            if focused { FOCUSED } else { Style::new() },
        ));
        lines.push(picker_line(tags, focused));
        lines.push(Line::raw(""));
    }

    if modal.submitting {
        lines.push(Line::styled("Working...", MUTED));
    }
    if let Some(ref error) = modal.error {
        lines.push(Line::styled(error.as_str(), Style::new().fg(Color::Red)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(FOCUSED)
        .title(modal.kind.title());
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        popup,
    );
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

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

// ----------------------------------------------------------------------
// Detail
// ----------------------------------------------------------------------

fn draw_detail(frame: &mut Frame, area: Rect, screen: &DetailScreen) {
    let Some(ref page) = screen.page else {
        let text = if screen.loading { "Loading page..." } else { "Page not loaded" };
        frame.render_widget(Paragraph::new(text).block(bordered("Page", false)), area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let mut tags = vec![Span::raw("Tags: ")];
    tags.extend(tag_spans(&page.tags));
    let info = vec![
        Line::from(vec![
            Span::styled(page.name.as_str(), Style::new().add_modifier(Modifier::BOLD)),
            Span::styled(format!("  ({})", page.id), MUTED),
        ]),
        Line::from(tags),
    ];
    frame.render_widget(Paragraph::new(info).block(bordered("Page", false)), chunks[0]);

    let (title, image) = match screen.image_view() {
        Some(ImageView::Original(link)) => ("Original image", Line::raw(link)),
        Some(ImageView::Annotated(link)) => ("Annotated image", Line::raw(link)),
        Some(ImageView::Missing) | None => (
            "Annotated image",
            Line::styled("No annotated image yet", MUTED),
        ),
    };
    frame.render_widget(Paragraph::new(image).block(bordered(title, false)), chunks[1]);

    if let Some(view) = screen.locale_view() {
        draw_locale(frame, chunks[2], &view, false);
    }
}

fn draw_locale(frame: &mut Frame, area: Rect, view: &LocaleView<'_>, focused: bool) {
    match view {
        LocaleView::Table(table) => {
            let rows: Vec<Row> = table.rows().map(|r| Row::new(r.to_vec())).collect();
            let widget = Table::new(
                rows,
                [
                    Constraint::Percentage(25),
                    Constraint::Percentage(25),
                    Constraint::Percentage(25),
                    Constraint::Percentage(25),
                ],
            )
            .header(
                Row::new(vec!["Name", "ID", "EN", "VN"])
                    .style(Style::new().add_modifier(Modifier::BOLD)),
            )
            .block(bordered("Locale", focused));
            frame.render_widget(widget, area);
        }
        LocaleView::Raw(text) => {
            frame.render_widget(
                Paragraph::new(*text)
                    .wrap(Wrap { trim: false })
                    .block(bordered("Locale (raw)", focused)),
                area,
            );
        }
        LocaleView::Invalid(error) => {
            frame.render_widget(
                Paragraph::new(format!("Invalid locale: {}", error))
                    .style(Style::new().fg(Color::Red))
                    .wrap(Wrap { trim: false })
                    .block(bordered("Locale", focused)),
                area,
            );
        }
    }
}

// ----------------------------------------------------------------------
// Annotate
// ----------------------------------------------------------------------

/// Backdrop samples in canvas coordinates (y up), grouped by quantized color.
fn backdrop_points(image: &RgbaImage, cols: u32, rows: u32) -> Vec<(Color, Vec<(f64, f64)>)> {
    let cell_w = f64::from(CANVAS_WIDTH) / f64::from(cols.max(1));
    let cell_h = f64::from(CANVAS_HEIGHT) / f64::from(rows.max(1));
    let mut buckets: HashMap<[u8; 3], Vec<(f64, f64)>> = HashMap::new();
    for (col, row, pixel) in downsample(image, cols, rows) {
        if pixel[3] < 128 {
            continue;
        }
        let key = [pixel[0] & 0xF0, pixel[1] & 0xF0, pixel[2] & 0xF0];
        let x = (f64::from(col) + 0.5) * cell_w;
        let y = f64::from(CANVAS_HEIGHT) - (f64::from(row) + 0.5) * cell_h;
        buckets.entry(key).or_default().push((x, y));
    }
    buckets
        .into_iter()
        .map(|([r, g, b], coords)| (Color::Rgb(r | 0x08, g | 0x08, b | 0x08), coords))
        .collect()
}

fn draw_annotate(frame: &mut Frame, area: Rect, screen: &AnnotateScreen) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let canvas = screen.canvas();
    let overlays = canvas.overlays();
    let selected = screen.selected();
    let (width, height) = canvas.size();
    let backdrop = if canvas.has_backdrop() { "image loaded" } else { "no image" };

    let block = bordered(
        format!("Canvas {}x{} ({})", width, height, backdrop),
        screen.focus == EditorFocus::Canvas,
    );
    // Half blocks give each terminal cell two vertically stacked samples.
    let inner = block.inner(columns[0]);
    let buckets = canvas
        .backdrop()
        .map(|image| backdrop_points(image, u32::from(inner.width), u32::from(inner.height) * 2))
        .unwrap_or_default();

    let preview = Canvas::default()
        .block(block)
        .marker(Marker::HalfBlock)
        .x_bounds([0.0, f64::from(CANVAS_WIDTH)])
        .y_bounds([0.0, f64::from(CANVAS_HEIGHT)])
        .paint(move |ctx| {
            for (color, coords) in &buckets {
                ctx.draw(&Points {
                    coords,
                    color: *color,
                });
            }
            ctx.layer();
            for (i, overlay) in overlays.iter().enumerate() {
                let h = f64::from(overlay.height());
                let y = f64::from(CANVAS_HEIGHT) - f64::from(overlay.top) - h;
                let color = if Some(i) == selected { Color::Yellow } else { Color::Gray };
                ctx.draw(&Rectangle {
                    x: f64::from(overlay.left),
                    y,
                    width: f64::from(overlay.width),
                    height: h,
                    color,
                });
                ctx.print(
                    f64::from(overlay.left) + 2.0,
                    y + h / 2.0,
                    Line::styled(overlay.text.clone(), Style::new().fg(color)),
                );
            }
        });
    frame.render_widget(preview, columns[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Percentage(40),
            Constraint::Min(0),
        ])
        .split(columns[1]);

    let (phase, style) = match screen.phase {
        AnnotatePhase::Idle => ("idle".to_string(), MUTED),
        AnnotatePhase::Loading => ("loading...".to_string(), MUTED),
        AnnotatePhase::CanvasReady => ("ready".to_string(), Style::new().fg(Color::Green)),
        AnnotatePhase::Editing => ("editing".to_string(), FOCUSED),
        AnnotatePhase::Saving => ("saving...".to_string(), MUTED),
        AnnotatePhase::Failed(ref reason) => {
            (format!("failed: {}", reason), Style::new().fg(Color::Red))
        }
    };
    let name = screen.page.as_ref().map_or("", |p| p.name.as_str());
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(name, Style::new().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(phase, style),
        ]))
        .block(bordered("Page", false)),
        side[0],
    );

    let items: Vec<Line> = if overlays.is_empty() {
        vec![Line::styled("No text yet; press a to add", MUTED)]
    } else {
        overlays
            .iter()
            .enumerate()
            .map(|(i, o)| {
                let line = format!(
                    "{:>2}. ({}, {}) {}",
                    i + 1,
                    o.left,
                    o.top,
                    o.text.replace('\n', " / ")
                );
                if Some(i) == selected {
                    Line::styled(line, FOCUSED)
                } else {
                    Line::raw(line)
                }
            })
            .collect()
    };
    frame.render_widget(
        Paragraph::new(items).block(bordered(
            "Text overlays",
            screen.focus == EditorFocus::OverlayText,
        )),
        side[1],
    );

    frame.render_widget(
        Paragraph::new(screen.locale_input.as_str())
            .wrap(Wrap { trim: false })
            .block(bordered("Edit locale", screen.focus == EditorFocus::Locale)),
        side[2],
    );

    if let Some(view) = screen.locale_view() {
        draw_locale(frame, side[3], &view, false);
    }
}

// ----------------------------------------------------------------------
// Toasts
// ----------------------------------------------------------------------

fn draw_toasts(frame: &mut Frame, app: &App) {
    if app.toasts.is_empty() {
        return;
    }
    let lines: Vec<Line> = app
        .toasts
        .visible()
        .map(|n| {
            let color = match n.level {
                NoticeLevel::Success => Color::Green,
                NoticeLevel::Info => Color::Cyan,
                NoticeLevel::Error => Color::Red,
            };
            Line::styled(n.message.as_str(), Style::new().fg(color))
        })
        .collect();

    let area = frame.area();
    let width = area.width.min(50);
    let height = (lines.len() as u16 + 2).min(area.height);
    let rect = Rect::new(area.x + area.width - width, area.y + 1, width, height);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL)),
        rect,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 60, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 30);
        assert_eq!((inner.x, inner.y), (20, 10));
    }
}
