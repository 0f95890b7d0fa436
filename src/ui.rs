use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span, Text},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, List,
        ListItem, Paragraph, Row, Table, Wrap,
    },
};
use tably_core::render::{PieSlice, Rgb, SeriesPoint, TableView};
use tably_core::{ChartEntry, ChartView, ChatRole, ConversationPhase, MessageEntry, MessageLog, PresentationKind};
use crate::app::App;

const WELCOME: &str = "Welcome to Tably! How can I assist you today?";

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

    // Conversation on the left, latest report on the right
    let [chat_column, report_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(body_area);

    let [chat_area, controls_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(chat_column);

    render_chat(app, frame, chat_area);
    render_controls(app, frame, controls_area);
    render_report(app, frame, report_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Tably ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(format!("[{}]", app.api_url()), Style::default().fg(Color::DarkGray)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.phase() {
        ConversationPhase::Idle => (" ASK ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        ConversationPhase::AwaitingFormat => (" FORMAT ", Style::default().bg(Color::Magenta).fg(Color::White)),
        ConversationPhase::Busy => (" BUSY ", Style::default().bg(Color::Blue).fg(Color::White)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = match app.phase() {
        ConversationPhase::Idle => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" quit ", label_style),
        ],
        ConversationPhase::AwaitingFormat => vec![
            Span::styled(" ←/→ ", key_style),
            Span::styled(" move ", label_style),
            Span::styled(" 1-6 ", key_style),
            Span::styled(" pick ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" choose ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ],
        ConversationPhase::Busy => vec![],
    };
    hints.extend(vec![
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Ctrl+C ", key_style),
        Span::styled(" quit ", label_style),
    ]);

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

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let lines = if app.conversation.log().is_empty() {
        vec![Line::from(Span::styled(WELCOME, Style::default().fg(Color::DarkGray)))]
    } else {
        chat_lines(app.conversation.log())
    };

    app.chat_total_lines = wrapped_height(&lines, app.chat_width);
    if app.follow_tail {
        app.chat_scroll = app.max_chat_scroll();
    } else {
        app.chat_scroll = app.chat_scroll.min(app.max_chat_scroll());
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

/// Flatten the log into styled lines; charts appear as a compact text rendition
fn chat_lines(log: &MessageLog) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for entry in log {
        match entry {
            MessageEntry::Text(text) => {
                let line = match text.role {
                    ChatRole::User => Line::from(vec![
                        Span::styled("You: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                        Span::raw(text.content.clone()),
                    ]),
                    ChatRole::Bot => Line::from(vec![
                        Span::styled("Bot: ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                        Span::raw(text.content.clone()),
                    ]),
                    ChatRole::System => Line::from(Span::styled(
                        text.content.clone(),
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                    )),
                };
                lines.push(line);
            }
            MessageEntry::Chart(chart) => lines.extend(chart_summary(chart)),
        }
        lines.push(Line::default());
    }

    lines
}

fn chart_summary(chart: &ChartEntry) -> Vec<Line<'static>> {
    let heading = Line::from(Span::styled(
        format!("[{} report, {} records]", chart.kind.display_name(), chart.data.len()),
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
    ));
    let mut lines = vec![heading];

    match &chart.view {
        ChartView::Series(points) => {
            lines.extend(points.iter().map(|p| Line::from(format!("  {}: {}", p.label, number_text(p.value)))));
        }
        ChartView::Pie(slices) => {
            lines.extend(slices.iter().map(|s| {
                Line::from(vec![
                    Span::styled("  ● ", Style::default().fg(color(s.color))),
                    Span::raw(format!("{}: {}", s.name, number_text(s.value))),
                ])
            }));
        }
        ChartView::List(items) => {
            lines.extend(items.iter().map(|item| Line::from(format!("  • {}", item))));
        }
        ChartView::Table(table) => {
            lines.push(Line::from(Span::styled(
                format!("  {}", table.columns.join(" | ")),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.extend(table.rows.iter().map(|row| Line::from(format!("  {}", row.join(" | ")))));
        }
        ChartView::Raw(json) => {
            lines.extend(json.lines().map(|l| Line::from(format!("  {}", l))));
        }
    }

    lines
}

/// Row count after wrapping at `width` columns
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    if width == 0 {
        return lines.len().min(u16::MAX as usize) as u16;
    }
    let width = width as usize;
    let total: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum();
    total.min(u16::MAX as usize) as u16
}

fn render_controls(app: &App, frame: &mut Frame, area: Rect) {
    match app.phase() {
        ConversationPhase::Idle => render_input(app, frame, area),
        ConversationPhase::AwaitingFormat => render_format_picker(app, frame, area),
        ConversationPhase::Busy => render_loader(app, frame, area),
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Ask ");

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    // Scroll offset keeps the cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    // Cyan text matches the "You:" style
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

fn render_format_picker(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Choose a format ");

    let mut spans = Vec::new();
    for (i, kind) in PresentationKind::ALL.iter().enumerate() {
        let label = format!(" {} {} ", i + 1, kind.display_name());
        let style = if i == app.format_cursor {
            Style::default().bg(Color::Magenta).fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_loader(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let message = app.loader.message().unwrap_or_default();
    let loader = Paragraph::new(Span::styled(
        message,
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    ))
    .block(block);

    frame.render_widget(loader, area);
}

fn render_report(app: &App, frame: &mut Frame, area: Rect) {
    let latest = app
        .conversation
        .log()
        .iter()
        .rev()
        .find_map(MessageEntry::as_chart);

    let Some(chart) = latest else {
        let placeholder = Paragraph::new("No report yet.\nAsk for something worth charting.")
            .style(Style::default().fg(Color::DarkGray))
            .block(report_block(" Report "));
        frame.render_widget(placeholder, area);
        return;
    };

    let block = report_block(&format!(" Report: {} ", chart.kind.display_name()));
    match &chart.view {
        ChartView::Series(points) if chart.kind == PresentationKind::Line => {
            render_line_chart(points, block, frame, area)
        }
        ChartView::Series(points) => render_bar_chart(points, block, frame, area),
        ChartView::Pie(slices) => render_pie_legend(slices, block, frame, area),
        ChartView::List(items) => {
            let items: Vec<ListItem> = items.iter().map(|i| ListItem::new(format!("• {}", i))).collect();
            frame.render_widget(List::new(items).block(block), area);
        }
        ChartView::Table(table) => render_table(table, block, frame, area),
        ChartView::Raw(json) => {
            let raw = Paragraph::new(json.as_str()).block(block).wrap(Wrap { trim: false });
            frame.render_widget(raw, area);
        }
    }
}

fn report_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title.to_string())
}

fn render_bar_chart(points: &[SeriesPoint], block: Block, frame: &mut Frame, area: Rect) {
    // BarChart only draws unsigned heights
    let bars: Vec<Bar> = points
        .iter()
        .map(|p| {
            let height = p.value.unwrap_or(0.0).max(0.0).round() as u64;
            Bar::default()
                .value(height)
                .label(Line::from(p.label.clone()))
                .text_value(number_text(p.value))
        })
        .collect();

    let inner_width = area.width.saturating_sub(2);
    let count = points.len().max(1);
    let bar_width = ((inner_width as usize / count) as u16).saturating_sub(1).clamp(1, 9);

    let chart = BarChart::default()
        .block(block)
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Rgb(0x88, 0x84, 0xd8)))
        .data(BarGroup::default().bars(&bars));

    frame.render_widget(chart, area);
}

fn render_line_chart(points: &[SeriesPoint], block: Block, frame: &mut Frame, area: Rect) {
    let coords: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.value.map(|v| (i as f64, v)))
        .collect();

    let (min_y, max_y) = coords.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, y)| {
        (lo.min(*y), hi.max(*y))
    });
    let (min_y, max_y) = if coords.is_empty() {
        (0.0, 1.0)
    } else if min_y == max_y {
        (min_y - 1.0, max_y + 1.0)
    } else {
        (min_y, max_y)
    };
    let max_x = points.len().saturating_sub(1).max(1) as f64;

    let x_labels: Vec<Span> = match (points.first(), points.last()) {
        (Some(first), Some(last)) => vec![Span::raw(first.label.clone()), Span::raw(last.label.clone())],
        _ => vec![],
    };

    let dataset = Dataset::default()
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Rgb(0x82, 0xca, 0x9d)))
        .data(&coords);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, max_x])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([min_y, max_y])
                .labels(vec![Span::raw(format_number(min_y)), Span::raw(format_number(max_y))]),
        );

    frame.render_widget(chart, area);
}

fn render_pie_legend(slices: &[PieSlice], block: Block, frame: &mut Frame, area: Rect) {
    let total: f64 = slices.iter().filter_map(|s| s.value).filter(|v| *v > 0.0).sum();
    let bar_room = area.width.saturating_sub(4) as f64 / 2.0;

    let mut lines = Vec::new();
    for slice in slices {
        let share = match slice.value {
            Some(v) if total > 0.0 && v > 0.0 => v / total,
            _ => 0.0,
        };
        let bar = "█".repeat((share * bar_room).round() as usize);
        lines.push(Line::from(vec![
            Span::styled("● ", Style::default().fg(color(slice.color))),
            Span::raw(format!("{} ", slice.name)),
            Span::styled(
                format!("{} ({:.1}%)", number_text(slice.value), share * 100.0),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        lines.push(Line::from(Span::styled(format!("  {}", bar), Style::default().fg(color(slice.color)))));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_table(table: &TableView, block: Block, frame: &mut Frame, area: Rect) {
    if table.columns.is_empty() {
        let empty = Paragraph::new("No rows.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(table.columns.clone())
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = table.rows.iter().map(|r| Row::new(r.clone())).collect();
    let widths = vec![Constraint::Fill(1); table.columns.len()];

    let widget = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(widget, area);
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

fn number_text(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "-".to_string())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;
    use std::time::Duration;
    use tably_core::{
        render as render_chart, AnalysisClient, AnalyzeResponse, Conversation, Outcome, QueryResponse,
        TextEntry,
    };
    use tokio::sync::mpsc;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_chat_lines_prefix_roles() {
        let mut log = MessageLog::new();
        log.push(TextEntry::user("sales today"));
        log.push(TextEntry::bot("Here you go"));
        log.push(TextEntry::system("Format Selected: Bar"));

        let lines = chat_lines(&log);
        let texts: Vec<String> = lines.iter().map(line_text).collect();

        assert_eq!(texts, vec!["You: sales today", "", "Bot: Here you go", "", "Format Selected: Bar", ""]);
    }

    #[test]
    fn test_chart_summary_lists_table_rows() {
        let chart = render_chart(PresentationKind::Table, vec![json!({"a": 1, "b": 2}), json!({"a": 3, "b": 4})]);
        let texts: Vec<String> = chart_summary(&chart).iter().map(line_text).collect();

        assert_eq!(texts, vec!["[Table report, 2 records]", "  a | b", "  1 | 2", "  3 | 4"]);
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::from("abcdefghij"), Line::default(), Line::from("abc")];
        assert_eq!(wrapped_height(&lines, 4), 3 + 1 + 1);
        assert_eq!(wrapped_height(&lines, 0), 3);
    }

    #[test]
    fn test_wrapped_height_saturates() {
        let lines = vec![Line::default(); u16::MAX as usize + 10];
        assert_eq!(wrapped_height(&lines, 0), u16::MAX);
        assert_eq!(wrapped_height(&lines, 80), u16::MAX);
    }

    #[test]
    fn test_bar_chart_with_more_points_than_columns() {
        let points: Vec<SeriesPoint> = (0..70_000)
            .map(|i| SeriesPoint { label: format!("order {}", i), value: Some(i as f64) })
            .collect();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_bar_chart(&points, report_block(" Report: Bar "), frame, area);
            })
            .unwrap();

        let screen: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("Report: Bar"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(12.5), "12.50");
        assert_eq!(number_text(None), "-");
    }

    #[tokio::test]
    async fn test_draws_every_report_kind() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(AnalysisClient::new("http://127.0.0.1:1"), tx, Duration::from_millis(600));
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();

        // Empty log shows the welcome line
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let screen: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("Welcome to Tably!"));

        let data = vec![
            json!({"label": "Jan", "value": 10, "name": "Dine-in"}),
            json!({"label": "Feb", "value": 4, "name": "Takeout"}),
        ];
        for kind in PresentationKind::ALL {
            app.conversation = Conversation::new();
            let request = app.conversation.submit("report").map(|e| e.request());
            assert!(request.is_some());
            app.on_outcome(Outcome::Analyzed {
                request: request.unwrap(),
                result: Ok(AnalyzeResponse::new("", true)),
            });
            let effect = app.conversation.choose_format(kind).unwrap();
            app.on_outcome(Outcome::Queried {
                request: effect.request(),
                result: Ok(QueryResponse::new(data.clone(), kind.as_str())),
            });
            assert!(app.conversation.log().last().unwrap().as_chart().is_some());

            terminal.draw(|frame| render(&mut app, frame)).unwrap();
        }
    }
}
