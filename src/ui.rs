use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, Gauge, GraphType, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use typesprint::{
    countdown::TimeLevel,
    render::{progress_percent, word_views, CharState},
    time_series::{chart_bounds, wpm_std_dev},
};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn draw(app: &App, f: &mut Frame) {
    match app.state {
        AppState::Typing => draw_typing(app, f),
        AppState::Results => draw_results(app, f),
    }
}

fn draw_typing(app: &App, f: &mut Frame) {
    let area = f.area();
    let engine = &app.engine;
    let reference = engine.reference();

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);

    let text_width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let reference_text = engine.session().reference_text();
    let prompt_lines = ((reference_text.width() as f64 / text_width as f64).ceil() as u16 + 1).max(1);
    let padding = area.height.saturating_sub(prompt_lines + 5) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(1), // clock + difficulty
            Constraint::Length(1), // time left
            Constraint::Length(1), // live stats
            Constraint::Length(1),
            Constraint::Length(prompt_lines),
            Constraint::Min(0),
            Constraint::Length(1), // help
        ])
        .split(area);

    let clock_style = match app.countdown.level() {
        TimeLevel::Normal => dim_bold_style,
        TimeLevel::Warning => bold_style.fg(Color::Yellow),
        TimeLevel::Critical => bold_style.fg(Color::Red),
    };
    let level = app.config.difficulty.level();
    let header = Line::from(vec![
        Span::styled(level.name, bold_style),
        Span::styled(format!(" ({})", level.description), dim_bold_style),
        Span::raw("   "),
        Span::styled(app.countdown.format_clock(), clock_style),
    ]);
    f.render_widget(Paragraph::new(header).alignment(Alignment::Center), chunks[1]);

    let gauge_color = match app.countdown.level() {
        TimeLevel::Normal => Color::Blue,
        TimeLevel::Warning => Color::Yellow,
        TimeLevel::Critical => Color::Red,
    };
    let time_left = Gauge::default()
        .gauge_style(Style::default().fg(gauge_color))
        .ratio(app.countdown.fraction_remaining().clamp(0.0, 1.0))
        .label("");
    f.render_widget(time_left, chunks[2]);

    let stats = Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {}%",
            app.snapshot.wpm,
            app.snapshot.accuracy,
            progress_percent(engine.input().len(), reference.len())
        ),
        dim_bold_style,
    ))
    .alignment(Alignment::Center);
    f.render_widget(stats, chunks[3]);

    let states = engine.char_states(app.config.show_errors);
    let views = word_views(reference, engine.input().len(), engine.current_word_index());
    let current_word = views.iter().find(|w| w.is_current).map(|w| w.span.clone());
    let in_completed_word =
        |idx: usize| views.iter().any(|w| w.is_completed && !w.is_current && w.span.contains(&idx));

    let spans: Vec<Span> = reference
        .iter()
        .zip(states)
        .enumerate()
        .map(|(idx, (expected, state))| {
            let mut style = match state {
                CharState::Correct => bold_style.fg(Color::Green),
                CharState::Incorrect => bold_style.fg(Color::Red),
                CharState::Cursor => dim_bold_style.add_modifier(Modifier::REVERSED),
                CharState::Untyped => dim_bold_style,
            };
            if current_word.as_ref().is_some_and(|span| span.contains(&idx)) {
                style = style.add_modifier(Modifier::UNDERLINED);
            } else if in_completed_word(idx) {
                style = style.remove_modifier(Modifier::BOLD);
            }

            // show which character was actually typed where it went wrong
            let shown = match (state, engine.input().get(idx)) {
                (CharState::Incorrect, Some(' ')) => "·".to_string(),
                (CharState::Incorrect, Some(typed)) => typed.to_string(),
                _ => expected.to_string(),
            };
            Span::styled(shown, style)
        })
        .collect();

    let passage = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });
    f.render_widget(passage, chunks[5]);

    let help = Paragraph::new(Span::styled(
        "(tab) new passage   (esc) quit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    f.render_widget(help, chunks[7]);
}

fn draw_results(app: &App, f: &mut Frame) {
    let area = f.area();
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let magenta_style = Style::default().fg(Color::Magenta);
    let final_stats = app.final_stats.unwrap_or(app.snapshot);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // time's up / progress
            Constraint::Length(1), // personal bests
            Constraint::Length(1),
            Constraint::Length(app.leaderboard.len() as u16 + 1),
            Constraint::Length(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    draw_chart(app, f, chunks[0], final_stats.elapsed_seconds, bold_style, magenta_style);

    let stats = Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {:.2} sd   {:.1}s",
            final_stats.wpm,
            final_stats.accuracy,
            wpm_std_dev(app.engine.wpm_history()),
            final_stats.elapsed_seconds
        ),
        bold_style,
    ))
    .alignment(Alignment::Center);
    f.render_widget(stats, chunks[1]);

    let reference_len = app.engine.reference().len();
    let outcome = if app.timed_out {
        format!(
            "time's up, {}% of the passage typed",
            progress_percent(final_stats.total_chars, reference_len)
        )
    } else {
        format!(
            "{} correct, {} incorrect",
            final_stats.correct_chars, final_stats.incorrect_chars
        )
    };
    let outcome_style = if app.timed_out {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    f.render_widget(
        Paragraph::new(Span::styled(outcome, outcome_style)).alignment(Alignment::Center),
        chunks[2],
    );

    let summary = &app.summary;
    let bests = format!(
        "best {} wpm   best {}% acc   avg {} wpm",
        summary.best_wpm,
        summary.best_accuracy,
        summary
            .average_wpm
            .map_or("-".to_string(), |avg| format!("{avg:.0}"))
    );
    f.render_widget(
        Paragraph::new(Span::styled(
            bests,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center),
        chunks[3],
    );

    if !app.leaderboard.is_empty() {
        let mut lines = vec![Line::from(Span::styled("leaderboard", bold_style))];
        lines.extend(app.leaderboard.iter().enumerate().map(|(rank, entry)| {
            Line::from(format!(
                "{}. {}  {} wpm  {}%",
                rank + 1,
                entry.username,
                entry.wpm,
                entry.accuracy
            ))
        }));
        f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), chunks[5]);
    }

    let legend = Paragraph::new(Span::styled(
        format!(
            "(r) retry   (d) difficulty: {}   (q) quit",
            app.config.difficulty
        ),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    f.render_widget(legend, chunks[7]);
}

fn draw_chart(
    app: &App,
    f: &mut Frame,
    area: Rect,
    elapsed_seconds: f64,
    bold_style: Style,
    line_style: Style,
) {
    let history = app.engine.wpm_history();
    if history.is_empty() {
        return;
    }

    let (duration, highest_wpm) = chart_bounds(history, elapsed_seconds);
    let data: Vec<(f64, f64)> = history.iter().map(|&p| p.into()).collect();
    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(line_style)
        .graph_type(GraphType::Line)
        .data(&data)];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([1.0, duration])
                .labels(vec![
                    Span::styled("1", bold_style),
                    Span::styled(format!("{duration:.0}"), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm.max(1.0)])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(format!("{highest_wpm:.0}"), bold_style),
                ]),
        );

    f.render_widget(chart, area);
}
