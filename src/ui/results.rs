use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use super::{
    bold, dim_bold, italic, render_legend, screen::Screen, verdict, HORIZONTAL_MARGIN,
    VERTICAL_MARGIN,
};
use crate::App;
use prepdrill::{drill::Judgment, progress::SessionProgress};

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // headline
                Constraint::Length(1), // padding
                Constraint::Min(1),    // breakdown
                Constraint::Length(4), // badges and progress
                Constraint::Length(1), // legend
            ])
            .split(area);

        if let Some(err) = &app.error {
            Paragraph::new(Span::styled(err.clone(), Style::default().fg(Color::Red)))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(chunks[2], buf);
        } else {
            let (headline, breakdown) = summary(app);
            Paragraph::new(headline)
                .alignment(Alignment::Center)
                .render(chunks[0], buf);
            Paragraph::new(breakdown)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(chunks[2], buf);
        }

        let mut badge_lines = Vec::new();
        if let Some(badge) = app.new_badge {
            badge_lines.push(Line::from(Span::styled(
                format!(
                    "Badge earned: {} ({}, +{} pts): {}",
                    badge.title, badge.rarity, badge.points, badge.description
                ),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
        }
        if !app.badges.earned().is_empty() {
            badge_lines.push(Line::from(Span::styled(
                format!(
                    "{} · {} pts this session",
                    app.badges.earned().iter().map(|b| b.title).join(" · "),
                    app.badges.total_points()
                ),
                italic(),
            )));
        }
        if let Some(line) = progress_line(&app.progress) {
            badge_lines.push(line);
        }
        Paragraph::new(badge_lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);

        render_legend("(r)etry / (n)ext activity / (esc)ape", chunks[4], buf);
    }
}

fn summary(app: &App) -> (Line<'static>, Vec<Line<'static>>) {
    if let Some(result) = app.quiz.as_ref().and_then(|q| q.result()) {
        let headline = Line::from(vec![
            Span::styled(format!("{}%", result.score), verdict(result.passed)),
            Span::styled(
                format!(
                    "   {}/{} correct   pass mark {}%",
                    result.correct_answers, result.total_questions, app.module.quiz.pass_mark
                ),
                bold(),
            ),
        ]);
        let verdict_line = if result.passed {
            Line::from(Span::styled("Passed", verdict(true)))
        } else {
            Line::from(Span::styled("Not passed yet, review and try again", verdict(false)))
        };
        return (headline, vec![verdict_line]);
    }

    let Some(engine) = app.engine.as_ref() else {
        return (Line::default(), Vec::new());
    };
    let Some(completion) = engine.completion() else {
        return (Line::default(), Vec::new());
    };

    let headline = Line::from(vec![
        Span::styled(
            format!("{}%", completion.final_score),
            verdict(completion.is_perfect()),
        ),
        Span::styled(
            format!(
                "   {}/{} correct   {:.1}s   finished {}",
                completion.correct,
                completion.total,
                completion.elapsed_secs(),
                completion.finished_at.format("%H:%M")
            ),
            bold(),
        ),
    ]);

    let breakdown = engine
        .outcomes()
        .iter()
        .map(|outcome| {
            let mark = match outcome.judgment {
                Judgment::Correct => "✓",
                Judgment::Incorrect => "✗",
                Judgment::Unanswered => "⌛",
            };
            Line::from(vec![
                Span::styled(format!("{mark} "), verdict(outcome.judgment.is_correct())),
                Span::raw(outcome.point_id.clone()),
                Span::styled(
                    format!("   {}s left   +{}", outcome.remaining_secs, outcome.contribution),
                    dim_bold(),
                ),
            ])
        })
        .collect();

    (headline, breakdown)
}

fn progress_line(progress: &SessionProgress) -> Option<Line<'static>> {
    let overall = progress.overall()?;
    let mut parts = Vec::new();
    if let Some(score) = progress.quiz_score {
        parts.push(format!("quiz {score}%"));
    }
    if let Some(score) = progress.scenario_score {
        parts.push(format!("scenarios {score}%"));
    }
    if let Some(score) = progress.drill_score {
        parts.push(format!("drill {score}% ({} done)", progress.drills_completed));
    }
    parts.push(format!("overall {overall}%"));

    Some(Line::from(vec![
        Span::styled("Session: ", dim_bold()),
        Span::raw(parts.into_iter().join(" · ")),
    ]))
}
