use rand::seq::SliceRandom;
use rand::Rng;
use std::time::SystemTime;

const BANNER_WORDS: [&str; 4] = ["HIGH SCORE!", "CHAMPION!", "UNSTOPPABLE!", "TOP OF THE BOARD!"];
const SPARK_SYMBOLS: [char; 6] = ['*', '+', 'o', '.', 'x', '~'];
const GRAVITY: f64 = 12.0;

/// One animated glyph on the results screen: either a falling spark or a
/// banner character drifting towards its slot in the headline.
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    vel_x: f64,
    vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    age: f64,
    max_age: f64,
    target: Option<(f64, f64)>,
}

impl Particle {
    fn spark(x: f64, y: f64) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(-4.0..-1.0),
            symbol: *SPARK_SYMBOLS.choose(&mut rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..6),
            age: 0.0,
            max_age: rng.gen_range(2.0..4.0),
            target: None,
        }
    }

    fn banner(x: f64, y: f64, target: (f64, f64), symbol: char, color_index: usize) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            x,
            y,
            vel_x: target.0 - x,
            vel_y: target.1 - y,
            symbol,
            color_index,
            age: 0.0,
            max_age: rng.gen_range(3.0..5.0),
            target: Some(target),
        }
    }

    /// Remaining life fraction, for fade-out styling.
    pub fn fade(&self) -> f64 {
        1.0 - (self.age / self.max_age)
    }

    pub fn is_banner(&self) -> bool {
        self.target.is_some()
    }

    /// Step the particle; false once it has outlived its max age.
    fn step(&mut self, dt: f64) -> bool {
        match self.target {
            Some((tx, ty)) => {
                let dist = ((tx - self.x).powi(2) + (ty - self.y).powi(2)).sqrt();
                if dist > 1.0 {
                    self.x += self.vel_x * dt;
                    self.y += self.vel_y * dt;
                    self.vel_x *= 0.95;
                    self.vel_y *= 0.95;
                } else {
                    self.x = tx;
                    self.y = ty;
                }
            }
            None => {
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
                self.vel_y += GRAVITY * dt;
            }
        }
        self.age += dt;
        self.age < self.max_age
    }
}

/// Animation shown when the final score makes the high-score table.
#[derive(Debug)]
pub struct Celebration {
    pub particles: Vec<Particle>,
    started_at: SystemTime,
    duration: f64,
    pub is_active: bool,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            started_at: SystemTime::now(),
            duration: 3.0,
            is_active: false,
            width: 80.0,
            height: 24.0,
        }
    }

    pub fn start(&mut self, width: u16, height: u16) {
        let mut rng = rand::thread_rng();

        self.particles.clear();
        self.started_at = SystemTime::now();
        self.is_active = true;
        self.width = width as f64;
        self.height = height as f64;

        let center_x = self.width / 2.0;
        let center_y = self.height / 2.0;

        let word = BANNER_WORDS.choose(&mut rng).unwrap_or(&BANNER_WORDS[0]);
        let start_x = center_x - (word.len() as f64 - 1.0) / 2.0 * 2.0;
        for (i, ch) in word.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            let target = (start_x + i as f64 * 2.0, center_y - 2.0);
            let from = (
                center_x + rng.gen_range(-10.0..10.0),
                center_y + rng.gen_range(-5.0..5.0),
            );
            self.particles.push(Particle::banner(
                from.0,
                from.1,
                target,
                ch,
                rng.gen_range(0..6),
            ));
        }

        for _ in 0..20 {
            let x = center_x + rng.gen_range(-15.0..15.0);
            let y = center_y + rng.gen_range(-6.0..6.0);
            self.particles.push(Particle::spark(x, y));
        }
    }

    /// Advance the animation by one tick; goes inactive after the full
    /// duration or once every particle has expired or left the screen.
    pub fn update(&mut self, dt: f64) {
        if !self.is_active {
            return;
        }

        let elapsed = self.started_at.elapsed().unwrap_or_default().as_secs_f64();
        if elapsed >= self.duration {
            self.is_active = false;
            self.particles.clear();
            return;
        }

        let (width, height) = (self.width, self.height);
        self.particles.retain_mut(|p| {
            let alive = p.step(dt);
            let on_screen = p.target.is_some()
                || (p.y <= height + 5.0 && p.x >= -5.0 && p.x <= width + 5.0);
            alive && on_screen
        });
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}
