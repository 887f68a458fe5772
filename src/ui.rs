pub mod quiz;
pub mod results;
pub mod screen;
pub mod timed;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::App;
use prepdrill::celebration::CelebrationAnimation;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(self.state).render(self, area, buf);

        if self.celebration.is_active {
            render_celebration_particles(&self.celebration, area, buf);
        }
    }
}

pub(crate) fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub(crate) fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

pub(crate) fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

pub(crate) fn verdict(correct: bool) -> Style {
    bold().fg(if correct { Color::Green } else { Color::Red })
}

/// Rows `text` needs when wrapped at `width` columns.
pub(crate) fn wrapped_height(text: &str, width: u16) -> u16 {
    let width = width.max(1) as usize;
    text.lines()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum::<usize>()
        .try_into()
        .unwrap_or(u16::MAX)
}

pub(crate) fn render_legend(text: &str, area: Rect, buf: &mut Buffer) {
    Paragraph::new(Span::styled(text, italic())).render(area, buf);
}

/// Render celebration particles on top of the results screen
fn render_celebration_particles(celebration: &CelebrationAnimation, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for particle in &celebration.particles {
        let x = particle.x as u16;
        let y = particle.y as u16;
        if x >= area.width || y >= area.height {
            continue;
        }

        let color = colors[particle.color_index % colors.len()];
        let alpha = 1.0 - (particle.age / particle.max_age);
        let style = match (particle.is_text, alpha) {
            (true, a) if a > 0.4 => Style::default().fg(color).add_modifier(Modifier::BOLD),
            (true, _) => Style::default().fg(color),
            (false, a) if a > 0.7 => Style::default().fg(color).add_modifier(Modifier::BOLD),
            (false, a) if a > 0.3 => Style::default().fg(color),
            (false, _) => Style::default().fg(color).add_modifier(Modifier::DIM),
        };

        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&particle.symbol.to_string());
            cell.set_style(style);
        }
    }
}
