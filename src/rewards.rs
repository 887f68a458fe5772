use tracing::info;

use crate::Activity;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Badge {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    pub points: u32,
}

pub const QUIZ_ACE_MIN_SCORE: u8 = 80;
pub const DRILL_CHAMPION_MIN_SCORE: u8 = 90;

static BADGES: [Badge; 4] = [
    Badge {
        id: "theory-master",
        title: "Theory Master",
        description: "Completed all theory sections",
        rarity: Rarity::Rare,
        points: 100,
    },
    Badge {
        id: "quiz-ace",
        title: "Quiz Ace",
        description: "Scored 80% or higher on quiz",
        rarity: Rarity::Epic,
        points: 150,
    },
    Badge {
        id: "drill-champion",
        title: "Drill Champion",
        description: "Completed virtual drill with 90% or higher",
        rarity: Rarity::Legendary,
        points: 200,
    },
    Badge {
        id: "scenario-sharp",
        title: "Scenario Sharp",
        description: "Answered every interactive scenario correctly",
        rarity: Rarity::Common,
        points: 50,
    },
];

pub fn catalog() -> &'static [Badge] {
    &BADGES
}

pub fn badge(id: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|b| b.id == id)
}

fn qualifying_badge(activity: Activity, score: u8) -> Option<&'static Badge> {
    match activity {
        Activity::Quiz if score >= QUIZ_ACE_MIN_SCORE => badge("quiz-ace"),
        Activity::Drill if score >= DRILL_CHAMPION_MIN_SCORE => badge("drill-champion"),
        Activity::Scenarios if score == 100 => badge("scenario-sharp"),
        _ => None,
    }
}

/// Badges earned during this process. Nothing is written to disk.
#[derive(Debug, Default)]
pub struct BadgeBook {
    earned: Vec<&'static Badge>,
}

impl BadgeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished activity; returns the badge if this is the first time it is earned.
    pub fn record(&mut self, activity: Activity, score: u8) -> Option<&'static Badge> {
        let badge = qualifying_badge(activity, score)?;
        if self.earned.iter().any(|b| b.id == badge.id) {
            return None;
        }
        info!(badge = badge.id, %activity, score, "badge earned");
        self.earned.push(badge);
        Some(badge)
    }

    pub fn earned(&self) -> &[&'static Badge] {
        &self.earned
    }

    pub fn total_points(&self) -> u32 {
        self.earned.iter().map(|b| b.points).sum()
    }
}
