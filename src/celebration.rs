use rand::seq::SliceRandom;
use rand::Rng;
use std::time::{Duration, Instant};

const SPARKS: [char; 6] = ['*', '+', '✦', '★', '✶', '·'];
const GRAVITY: f64 = 15.0;

/// One glyph of the badge celebration
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
    /// Letter of the headline; flies to its slot and stays there.
    pub is_text: bool,
    pub target_x: f64,
    pub target_y: f64,
}

impl Particle {
    fn spark<R: Rng>(x: f64, y: f64, rng: &mut R) -> Self {
        Self {
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(-4.0..-1.0),
            symbol: *SPARKS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(2.0..4.0),
            is_text: false,
            target_x: x,
            target_y: y,
        }
    }

    fn letter<R: Rng>(from: (f64, f64), to: (f64, f64), symbol: char, rng: &mut R) -> Self {
        Self {
            x: from.0,
            y: from.1,
            vel_x: to.0 - from.0,
            vel_y: to.1 - from.1,
            symbol,
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(3.0..5.0),
            is_text: true,
            target_x: to.0,
            target_y: to.1,
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        if self.is_text {
            let dist = ((self.target_x - self.x).powi(2) + (self.target_y - self.y).powi(2)).sqrt();
            if dist > 1.0 {
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
                self.vel_x *= 0.95;
                self.vel_y *= 0.95;
            } else {
                self.x = self.target_x;
                self.y = self.target_y;
                self.vel_x = 0.0;
                self.vel_y = 0.0;
            }
        } else {
            self.x += self.vel_x * dt;
            self.y += self.vel_y * dt;
            self.vel_y += GRAVITY * dt;
        }

        self.age += dt;
        self.age < self.max_age
    }
}

/// Short particle burst spelling out a headline, shown when a badge is earned
#[derive(Debug)]
pub struct CelebrationAnimation {
    pub particles: Vec<Particle>,
    pub headline: String,
    pub started_at: Instant,
    pub duration: Duration,
    pub is_active: bool,
    pub width: f64,
    pub height: f64,
}

impl CelebrationAnimation {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            headline: String::new(),
            started_at: Instant::now(),
            duration: Duration::from_secs(3),
            is_active: false,
            width: 80.0,
            height: 24.0,
        }
    }

    pub fn start(&mut self, width: u16, height: u16, headline: &str) {
        let mut rng = rand::thread_rng();

        self.particles.clear();
        self.headline = headline.to_uppercase();
        self.started_at = Instant::now();
        self.is_active = true;
        self.width = f64::from(width);
        self.height = f64::from(height);

        let center = (self.width / 2.0, self.height / 2.0);
        let spacing = 2.0;
        let span = (self.headline.chars().count() as f64 - 1.0).max(0.0) * spacing;
        let left = center.0 - span / 2.0;

        for (i, ch) in self.headline.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            let to = (left + i as f64 * spacing, center.1 - 2.0);
            let from = (
                center.0 + rng.gen_range(-10.0..10.0),
                center.1 + rng.gen_range(-5.0..5.0),
            );
            self.particles.push(Particle::letter(from, to, ch, &mut rng));
        }

        for _ in 0..25 {
            let x = center.0 + rng.gen_range(-15.0..15.0);
            let y = center.1 + rng.gen_range(-8.0..8.0);
            self.particles.push(Particle::spark(x, y, &mut rng));
        }
    }

    pub fn stop(&mut self) {
        self.is_active = false;
        self.particles.clear();
    }

    /// Advance one animation frame.
    pub fn update(&mut self) {
        if !self.is_active {
            return;
        }
        if self.started_at.elapsed() >= self.duration {
            self.stop();
            return;
        }

        let dt = 0.1;
        let (width, height) = (self.width, self.height);
        self.particles.retain_mut(|p| {
            let alive = p.update(dt);
            if p.is_text {
                return alive;
            }
            let margin = 5.0;
            let off_screen = p.y > height + margin || p.x < -margin || p.x > width + margin;
            alive && !off_screen
        });
    }
}

impl Default for CelebrationAnimation {
    fn default() -> Self {
        Self::new()
    }
}
