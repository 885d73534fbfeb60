use crate::rng::XorShift64;

pub const PARTICLE_COUNT: usize = 140;
pub const CONFETTI_FRAMES: u32 = 260;

const GLYPHS: [char; 4] = ['■', '◆', '▲', '●'];

/// Decides whether the one-time celebration runs.
///
/// Only the first completed load counts: it fires when that load succeeded
/// with at least one record and never afterwards.
#[derive(Debug, Default)]
pub struct CelebrationTrigger {
    spent: bool,
}

impl CelebrationTrigger {
    /// `loaded` is the record count of a successful load, `None` for a failed one.
    pub fn observe(&mut self, loaded: Option<usize>) -> bool {
        if self.spent {
            return false;
        }
        self.spent = true;
        matches!(loaded, Some(n) if n > 0)
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub spin: f32,
}

/// Falling confetti, in terminal cell coordinates.
#[derive(Debug, Clone)]
pub struct Confetti {
    particles: Vec<Particle>,
    frame: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speck {
    pub x: u16,
    pub y: u16,
    pub glyph: char,
    pub rgb: (u8, u8, u8),
}

impl Confetti {
    /// Particles start just above the top edge, spread across `width` columns.
    pub fn new(width: u16, rng: &mut XorShift64) -> Self {
        let w = f32::from(width.max(1));
        let particles = (0..PARTICLE_COUNT)
            .map(|_| Particle {
                x: rng.unit() * w,
                y: -2.0,
                vx: (rng.unit() * 2.0 - 1.0) * 0.5,
                vy: 0.15 + rng.unit() * 0.3,
                spin: rng.unit() * std::f32::consts::PI,
            })
            .collect();
        Self { particles, frame: 0 }
    }

    pub fn is_done(&self) -> bool {
        self.frame >= CONFETTI_FRAMES
    }

    /// Advance one frame. No-op once finished.
    pub fn step(&mut self) {
        if self.is_done() {
            return;
        }
        self.frame += 1;
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            p.spin += 0.05;
        }
    }

    /// Particles currently inside the area, ready to paint.
    pub fn specks(&self, width: u16, height: u16) -> Vec<Speck> {
        if self.is_done() {
            return Vec::new();
        }
        self.particles
            .iter()
            .filter(|p| {
                p.x >= 0.0 && p.y >= 0.0 && p.x < f32::from(width) && p.y < f32::from(height)
            })
            .map(|p| {
                let hue = (p.x + p.y + self.frame as f32).rem_euclid(360.0);
                let quarter = p.spin.rem_euclid(std::f32::consts::TAU) / std::f32::consts::FRAC_PI_2;
                let glyph = GLYPHS[quarter as usize % GLYPHS.len()];
                Speck {
                    x: p.x as u16,
                    y: p.y as u16,
                    glyph,
                    rgb: hsl_to_rgb(hue, 0.9, 0.6),
                }
            })
            .collect()
    }
}

pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r), to_u8(g), to_u8(b))
}
