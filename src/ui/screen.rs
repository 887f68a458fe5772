use ratatui::{buffer::Buffer, layout::Rect};

use super::{quiz::QuizScreen, results::ResultsScreen, timed::TimedScreen};
use crate::{App, AppState};

/// A UI screen boundary: draws one [`AppState`]
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Timed => Box::new(TimedScreen),
        AppState::Quiz => Box::new(QuizScreen),
        AppState::Results => Box::new(ResultsScreen),
    }
}
