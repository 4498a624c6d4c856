use rand::Rng;
use ratatui::style::Color;

#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: u32,
    pub color: Color,
}

#[derive(Default)]
pub struct Particles {
    pub list: Vec<Particle>,
}

impl Particles {
    /// Spawn `count` particles with random velocity in `[-spread, spread]`.
    pub fn burst<R: Rng>(&mut self, rng: &mut R, x: f32, y: f32, color: Color, count: usize, spread: f32, life: u32) {
        for _ in 0..count {
            self.list.push(Particle {
                x,
                y,
                vx: rng.gen_range(-spread..=spread),
                vy: rng.gen_range(-spread..=spread),
                life,
                color,
            });
        }
    }

    pub fn update(&mut self, gravity: f32) {
        for p in &mut self.list {
            p.x += p.vx;
            p.y += p.vy;
            p.vy += gravity;
            p.life = p.life.saturating_sub(1);
        }
        self.list.retain(|p| p.life > 0);
    }

    pub fn clear(&mut self) {
        self.list.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_particles_expire() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = Particles::default();
        p.burst(&mut rng, 10.0, 10.0, Color::Red, 8, 2.0, 3);
        assert_eq!(p.list.len(), 8);
        p.update(0.2);
        p.update(0.2);
        assert_eq!(p.list.len(), 8);
        p.update(0.2);
        assert!(p.list.is_empty());
    }
}
