use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};

use super::{
    bold, dim_bold, italic, render_legend, screen::Screen, verdict, wrapped_height,
    HORIZONTAL_MARGIN, VERTICAL_MARGIN,
};
use crate::App;
use prepdrill::drill::{DecisionPoint, DrillEngine, Judge, Judgment, Pacing, Phase};

/// Scenarios and the virtual drill: briefing, countdown and feedback
pub struct TimedScreen;

impl Screen for TimedScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let Some(engine) = app.engine.as_ref() else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Length(1), // progress
                Constraint::Length(1), // padding
                Constraint::Min(1),    // body
                Constraint::Length(1), // legend
            ])
            .split(area);

        render_header(app, engine, chunks[0], buf);

        Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(engine.progress().clamp(0.0, 1.0))
            .label(format!(
                "point {}/{}",
                (engine.current_index() + 1).min(engine.sequence().len()),
                engine.sequence().len()
            ))
            .render(chunks[1], buf);

        let Some(point) = engine.current_point() else {
            return;
        };

        let legend = match engine.phase() {
            Phase::NotStarted => {
                render_briefing(app, engine, point, chunks[3], buf);
                "(enter) start / (esc)ape"
            }
            Phase::Counting => {
                render_countdown(engine, point, chunks[3], buf);
                "(1-9) respond / (←) restart / (esc)ape"
            }
            Phase::Resolved => {
                render_feedback(engine, chunks[3], buf);
                if engine.is_last_point() {
                    "(enter) finish / (←) restart / (esc)ape"
                } else {
                    "(enter) next / (←) restart / (esc)ape"
                }
            }
            Phase::Complete => "(esc)ape",
        };
        render_legend(legend, chunks[4], buf);
    }
}

fn render_header(app: &App, engine: &DrillEngine, area: Rect, buf: &mut Buffer) {
    let title = match engine.sequence().pacing() {
        Pacing::Briefed => &app.module.scenarios.title,
        Pacing::Continuous => &app.module.drill.title,
    };
    Paragraph::new(Line::from(vec![
        Span::styled(format!("{} · ", app.module.title), dim_bold()),
        Span::styled(title.clone(), bold()),
        Span::styled(format!("   score {}%", engine.running_score()), dim_bold()),
    ]))
    .alignment(Alignment::Center)
    .render(area, buf);
}

fn render_briefing(
    app: &App,
    engine: &DrillEngine,
    point: &DecisionPoint,
    area: Rect,
    buf: &mut Buffer,
) {
    let mut lines = Vec::new();
    if engine.current_index() == 0 {
        let (description, meta) = match engine.sequence().pacing() {
            Pacing::Briefed => (&app.module.scenarios.description, None),
            Pacing::Continuous => (
                &app.module.drill.description,
                Some(format!(
                    "{} · about {}",
                    app.module.drill.difficulty, app.module.drill.estimated_time
                )),
            ),
        };
        lines.push(Line::from(Span::styled(description.clone(), italic())));
        if let Some(meta) = meta {
            lines.push(Line::from(Span::styled(meta, dim_bold())));
        }
        lines.push(Line::default());
    }

    lines.push(Line::from(Span::styled(point.prompt.title.clone(), bold())));
    lines.push(Line::from(point.prompt.narrative.clone()));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!(
            "You will have {}s to respond. Press Enter when ready.",
            point.time_limit_secs
        ),
        Style::default().fg(Color::Yellow),
    )));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_countdown(engine: &DrillEngine, point: &DecisionPoint, area: Rect, buf: &mut Buffer) {
    let mut situation = point.prompt.narrative.clone();
    if let Some(extra) = &point.prompt.situation {
        situation.push('\n');
        situation.push_str(extra);
    }
    let narrative_height = wrapped_height(&situation, area.width);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),                // title
            Constraint::Length(narrative_height), // narrative
            Constraint::Length(1),                // padding
            Constraint::Length(1),                // countdown
            Constraint::Length(1),                // padding
            Constraint::Min(1),                   // candidates
        ])
        .split(area);

    Paragraph::new(Span::styled(point.prompt.title.clone(), bold()))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);
    Paragraph::new(situation)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);

    let remaining = engine.remaining_secs().unwrap_or(0);
    let ratio = if point.time_limit_secs == 0 {
        0.0
    } else {
        f64::from(remaining) / f64::from(point.time_limit_secs)
    };
    let urgency = match remaining {
        0..=3 => Color::Red,
        4..=6 => Color::Yellow,
        _ => Color::Green,
    };
    Gauge::default()
        .gauge_style(Style::default().fg(urgency))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{remaining}s"))
        .render(chunks[3], buf);

    let responses = &point.responses;
    let candidates: Vec<Line> = (0..responses.candidate_count())
        .filter_map(|i| responses.candidate_label(i).map(|label| (i, label)))
        .map(|(i, label)| {
            Line::from(vec![
                Span::styled(format!("{}. ", i + 1), dim_bold()),
                Span::styled(label.to_string(), bold()),
            ])
        })
        .collect();
    Paragraph::new(candidates)
        .wrap(Wrap { trim: true })
        .render(chunks[5], buf);
}

fn render_feedback(engine: &DrillEngine, area: Rect, buf: &mut Buffer) {
    let Some(outcome) = engine.last_outcome() else {
        return;
    };
    let headline = match outcome.judgment {
        Judgment::Correct => "Correct!",
        Judgment::Incorrect => "Not quite.",
        Judgment::Unanswered => "Time's up!",
    };

    let mut lines = vec![
        Line::from(Span::styled(headline, verdict(outcome.judgment.is_correct()))),
        Line::default(),
    ];
    if let Some(feedback) = engine.feedback() {
        lines.push(Line::from(feedback.to_string()));
        lines.push(Line::default());
    }
    lines.push(Line::from(Span::styled(
        format!(
            "+{} points · {}s left · score so far {}%",
            outcome.contribution,
            outcome.remaining_secs,
            engine.running_score()
        ),
        dim_bold(),
    )));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}
