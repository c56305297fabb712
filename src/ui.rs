use clackr::{
    alignment::{CharStatus, WordAlignment, WordStatus},
    history::{PerformanceBadge, ResultBreakdown, SpeedLevel},
    session::{Lifecycle, Session},
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, Gauge, GraphType, Paragraph, Widget, Wrap},
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn bold_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold_style() -> Style {
    bold_style().add_modifier(Modifier::DIM)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.driver.session();
        match session.lifecycle() {
            Lifecycle::Complete => render_results(
                session,
                &self.config.username,
                self.status.as_deref(),
                area,
                buf,
            ),
            Lifecycle::Idle | Lifecycle::Active => {
                render_typing(session, self.status.as_deref(), area, buf)
            }
        }
    }
}

fn word_spans(word: &WordAlignment) -> Vec<Span<'static>> {
    let green_bold_style = bold_style().fg(Color::Green);
    let red_bold_style = bold_style().fg(Color::Red);

    match word.status {
        WordStatus::CompletedCorrect => vec![Span::styled(word.target.to_string(), green_bold_style)],
        WordStatus::CompletedIncorrect => vec![Span::styled(
            word.target.to_string(),
            red_bold_style.add_modifier(Modifier::CROSSED_OUT),
        )],
        WordStatus::Upcoming if !word.has_cursor() => {
            vec![Span::styled(word.target.to_string(), dim_bold_style())]
        }
        WordStatus::InProgress | WordStatus::Upcoming => {
            let mut spans: Vec<Span<'static>> = word
                .chars
                .iter()
                .map(|cell| {
                    let style = match cell.status {
                        CharStatus::Correct => green_bold_style,
                        CharStatus::Incorrect => red_bold_style.add_modifier(Modifier::REVERSED),
                        CharStatus::Pending => dim_bold_style(),
                        CharStatus::Cursor => dim_bold_style().add_modifier(Modifier::UNDERLINED),
                    };
                    Span::styled(cell.ch.to_string(), style)
                })
                .collect();

            if !word.overflow.is_empty() {
                spans.push(Span::styled(word.overflow.clone(), red_bold_style));
            }
            spans
        }
    }
}

fn render_typing(session: &Session, status: Option<&str>, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // live metrics
            Constraint::Length(1), // time gauge
            Constraint::Length(1),
            Constraint::Min(3), // prompt
            Constraint::Length(1), // status
            Constraint::Length(1), // legend
        ])
        .split(area);

    let metrics = session.metrics();
    let stats = Paragraph::new(Span::styled(
        format!(
            "{:.0} wpm   {:.0}% acc   {} errors   {}s   {}",
            metrics.wpm,
            metrics.accuracy,
            metrics.errors,
            metrics.time_remaining,
            SpeedLevel::classify(metrics.wpm),
        ),
        dim_bold_style(),
    ))
    .alignment(Alignment::Center);
    stats.render(chunks[0], buf);

    let limit = session.time_limit();
    let ratio = if limit == 0 {
        1.0
    } else {
        (limit.saturating_sub(metrics.time_remaining) as f64 / limit as f64).clamp(0.0, 1.0)
    };
    Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio)
        .label(String::new())
        .render(chunks[1], buf);

    let mut spans = Vec::new();
    for (idx, word) in session.alignment().iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw(" "));
        }
        spans.extend(word_spans(word));
    }
    Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    if let Some(status) = status {
        Paragraph::new(Span::styled(
            status.to_string(),
            Style::default().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
    }

    let legend = if session.is_active() {
        "(←) restart / (→) new text / (esc) quit"
    } else {
        "start typing or press (tab) / (→) new text / (esc) quit"
    };
    Paragraph::new(Span::styled(
        legend,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);
}

fn render_results(
    session: &Session,
    username: &str,
    status: Option<&str>,
    area: Rect,
    buf: &mut Buffer,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // headline
            Constraint::Length(1), // details
            Constraint::Length(1), // breakdown
            Constraint::Length(1), // status
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let points: Vec<(f64, f64)> = session
        .wpm_samples()
        .iter()
        .copied()
        .map(Into::into)
        .collect();

    if points.len() > 1 {
        let max_t = points.iter().map(|p| p.0).fold(1.0_f64, f64::max);
        let max_wpm = points.iter().map(|p| p.1).fold(10.0_f64, f64::max).ceil();
        let datasets = vec![Dataset::default()
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(Color::Magenta))
            .graph_type(GraphType::Line)
            .data(&points)];

        Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("seconds")
                    .bounds([0.0, max_t])
                    .labels(vec![
                        Span::styled("0", bold_style()),
                        Span::styled(format!("{max_t:.0}"), bold_style()),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("wpm")
                    .bounds([0.0, max_wpm])
                    .labels(vec![
                        Span::styled("0", bold_style()),
                        Span::styled(format!("{max_wpm:.0}"), bold_style()),
                    ]),
            )
            .render(chunks[0], buf);
    }

    let Some(result) = session.result() else {
        return;
    };

    let headline = format!(
        "{} wpm   {}% acc   {} errors   {}s",
        result.wpm, result.accuracy, result.errors, result.time_limit
    );
    let headline = if username.is_empty() {
        headline
    } else {
        format!("{username}: {headline}")
    };
    Paragraph::new(Span::styled(headline, bold_style()))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} words   {} characters   {}",
            result.words_typed,
            result.characters_typed,
            PerformanceBadge::classify(result.wpm, result.accuracy),
        ),
        dim_bold_style(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    if let Some(breakdown) = ResultBreakdown::from_session(session) {
        Paragraph::new(Span::styled(
            format!(
                "{} cpm   {} correct words   {} word errors   {}",
                breakdown.cpm, breakdown.correct_words, breakdown.word_errors, breakdown.level,
            ),
            dim_bold_style(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }

    if let Some(status) = status {
        Paragraph::new(Span::styled(
            status.to_string(),
            Style::default().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
    }

    Paragraph::new(Span::styled(
        "(r)etry / (n)ew / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[6], buf);
}
