use super::point::{Judgment, JudgingMode};

/// Score a single resolved point.
///
/// Free-action points are worth up to 100, scaled by the share of the time limit still
/// left when the correct action was chosen. Enumerated-choice points are worth one unit
/// each; the unit count is turned into a percentage at the end of the run.
pub fn point_contribution(
    mode: JudgingMode,
    judgment: Judgment,
    remaining_secs: u32,
    time_limit_secs: u32,
) -> u32 {
    if !judgment.is_correct() || time_limit_secs == 0 {
        return 0;
    }
    match mode {
        JudgingMode::FreeAction => {
            let share = f64::from(remaining_secs.min(time_limit_secs)) / f64::from(time_limit_secs);
            (share * 100.0).round() as u32
        }
        JudgingMode::EnumeratedChoice => 1,
    }
}

/// Final percentage over `points` resolved points
pub fn final_score(mode: JudgingMode, accumulated: u32, correct: usize, points: usize) -> u8 {
    if points == 0 {
        return 0;
    }
    let score = match mode {
        JudgingMode::FreeAction => (f64::from(accumulated) / points as f64).round(),
        JudgingMode::EnumeratedChoice => (correct as f64 / points as f64 * 100.0).round(),
    };
    score.clamp(0.0, 100.0) as u8
}
