use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use super::{
    bold, dim_bold, italic, render_legend, screen::Screen, verdict, wrapped_height,
    HORIZONTAL_MARGIN, VERTICAL_MARGIN,
};
use crate::App;

pub struct QuizScreen;

impl Screen for QuizScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let Some(quiz) = app.quiz.as_ref() else {
            return;
        };
        let Some(question) = quiz.current_question() else {
            Paragraph::new(Span::styled("This module has no quiz questions.", italic()))
                .alignment(Alignment::Center)
                .render(area, buf);
            return;
        };

        let body_width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2);
        let question_height = wrapped_height(&question.question, body_width);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),               // header
                Constraint::Length(1),               // padding
                Constraint::Length(question_height), // question
                Constraint::Length(1),               // padding
                Constraint::Length(question.options.len() as u16),
                Constraint::Length(1), // padding
                Constraint::Min(1),    // verdict
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Line::from(vec![
            Span::styled(format!("{} · ", app.module.quiz.title), dim_bold()),
            Span::styled(
                format!("question {}/{}", quiz.current_index() + 1, quiz.len()),
                bold(),
            ),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        Paragraph::new(Span::styled(question.question.clone(), bold()))
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);

        let checked = quiz.validation();
        let options: Vec<Line> = question
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                let marker = if i == app.quiz_cursor { "›" } else { " " };
                let style = match (quiz.selected() == Some(i), checked) {
                    (true, Some(v)) => verdict(v.is_correct),
                    (true, None) => Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                    (false, _) => Style::default(),
                };
                Line::from(vec![
                    Span::styled(format!("{marker} {}. ", i + 1), dim_bold()),
                    Span::styled(option.clone(), style),
                ])
            })
            .collect();
        Paragraph::new(options).render(chunks[4], buf);

        let mut lines = Vec::new();
        if let Some(validation) = checked {
            let headline = if validation.is_correct {
                "Correct!"
            } else {
                "Incorrect."
            };
            lines.push(Line::from(Span::styled(
                headline,
                verdict(validation.is_correct),
            )));
            lines.push(Line::from(validation.explanation.clone()));
        }
        if let Some(err) = quiz.last_error() {
            lines.push(Line::from(Span::styled(
                err.to_string(),
                Style::default().fg(Color::Red),
            )));
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(chunks[6], buf);

        let legend = match checked {
            None => "(↑/↓ or 1-9) choose / (enter) check / (←) restart / (esc)ape",
            Some(_) if quiz.current_index() + 1 == quiz.len() => "(enter) submit / (esc)ape",
            Some(_) => "(enter) next / (esc)ape",
        };
        render_legend(legend, chunks[7], buf);
    }
}
