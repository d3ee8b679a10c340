//! Weighted random spawning
//!
//! Each body rolls a class from the spawn table (probability proportional to
//! weight), a position inside the world, a random direction and a speed
//! within the class range.

use glam::Vec2;
use rand::Rng;

use super::body::{Body, BodyState};
use crate::error::SimError;
use crate::settings::SpawnClass;

/// Spawn table with precomputed cumulative weights
#[derive(Debug, Clone)]
pub struct SpawnTable {
    classes: Vec<SpawnClass>,
    cumulative: Vec<f32>,
}

impl SpawnTable {
    pub fn new(classes: Vec<SpawnClass>) -> Result<Self, SimError> {
        let mut total = 0.0;
        let cumulative: Vec<f32> = classes
            .iter()
            .map(|c| {
                total += c.weight;
                total
            })
            .collect();

        if !(total > 0.0) {
            return Err(SimError::EmptySpawnTable);
        }
        Ok(Self {
            classes,
            cumulative,
        })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn total_weight(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Pick a class index for a roll in `[0, total_weight)`
    pub fn index_for_roll(&self, roll: f32) -> usize {
        self.cumulative
            .partition_point(|&c| c <= roll)
            .min(self.classes.len() - 1)
    }

    pub fn pick<R: Rng>(&self, rng: &mut R) -> &SpawnClass {
        let roll = rng.random::<f32>() * self.total_weight();
        &self.classes[self.index_for_roll(roll)]
    }

    /// Roll one body's initial state inside a `width` x `height` world
    pub fn roll_state<R: Rng>(&self, rng: &mut R, width: f32, height: f32) -> BodyState {
        let class = self.pick(rng);

        let pos = Vec2::new(
            roll_axis(rng, class.radius, width),
            roll_axis(rng, class.radius, height),
        );
        let direction = Vec2::new(rng.random_range(-1.0..=1.0), rng.random_range(-1.0..=1.0))
            .try_normalize()
            .unwrap_or(Vec2::X);
        let speed = rng.random_range(class.min_speed..=class.max_speed);

        BodyState {
            pos,
            vel: direction * speed,
            radius: class.radius,
            mass: class.mass,
            color: class.color,
            texture_id: class.texture_id,
        }
    }

    /// Spawn `count` bodies into storage sized exactly once
    pub fn spawn<R: Rng>(
        &self,
        rng: &mut R,
        count: usize,
        width: f32,
        height: f32,
    ) -> Vec<Body> {
        let mut bodies = Vec::with_capacity(count);
        for _ in 0..count {
            bodies.push(Body::new(self.roll_state(rng, width, height)));
        }
        bodies
    }
}

/// Uniform coordinate keeping a disk of `radius` inside `[0, extent]`
fn roll_axis<R: Rng>(rng: &mut R, radius: f32, extent: f32) -> f32 {
    if extent > 2.0 * radius {
        rng.random_range(radius..extent - radius)
    } else {
        extent / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Rgba8;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn class(radius: f32, weight: f32) -> SpawnClass {
        SpawnClass::new(Rgba8::WHITE, radius, 1.0, 1.0, 2.0, weight)
    }

    #[test]
    fn test_roll_maps_to_weighted_class() {
        let table = SpawnTable::new(vec![class(1.0, 1.0), class(2.0, 0.0), class(3.0, 3.0)]).unwrap();
        assert_eq!(table.total_weight(), 4.0);
        assert_eq!(table.index_for_roll(0.0), 0);
        assert_eq!(table.index_for_roll(0.99), 0);
        // Zero-weight class is never picked
        assert_eq!(table.index_for_roll(1.0), 2);
        assert_eq!(table.index_for_roll(3.99), 2);
        assert_eq!(table.index_for_roll(4.0), 2);
    }

    #[test]
    fn test_zero_weight_table_rejected() {
        assert!(matches!(
            SpawnTable::new(vec![class(1.0, 0.0)]),
            Err(SimError::EmptySpawnTable)
        ));
        assert!(SpawnTable::new(Vec::new()).is_err());
    }

    #[test]
    fn test_spawned_bodies_respect_class_and_world() {
        let table = SpawnTable::new(vec![class(2.0, 1.0), class(3.0, 1.0)]).unwrap();
        let mut rng = Pcg32::seed_from_u64(42);
        let bodies = table.spawn(&mut rng, 500, 200.0, 100.0);

        assert_eq!(bodies.len(), 500);
        for body in &bodies {
            assert!(body.radius == 2.0 || body.radius == 3.0);
            assert!(body.pos.x >= body.radius && body.pos.x <= 200.0 - body.radius);
            assert!(body.pos.y >= body.radius && body.pos.y <= 100.0 - body.radius);
            let speed = body.vel.length();
            assert!((1.0 - 1e-4..=2.0 + 1e-4).contains(&speed));
        }
        // Both classes show up
        assert!(bodies.iter().any(|b| b.radius == 2.0));
        assert!(bodies.iter().any(|b| b.radius == 3.0));
    }

    #[test]
    fn test_spawned_bodies_take_class_texture() {
        let table = SpawnTable::new(vec![class(2.0, 1.0).with_texture(3)]).unwrap();
        let bodies = table.spawn(&mut Pcg32::seed_from_u64(1), 10, 100.0, 100.0);
        assert!(bodies.iter().all(|b| b.texture_id == 3));
    }

    #[test]
    fn test_spawn_is_deterministic_per_seed() {
        let table = SpawnTable::new(vec![class(2.0, 1.0)]).unwrap();
        let a = table.spawn(&mut Pcg32::seed_from_u64(9), 20, 100.0, 100.0);
        let b = table.spawn(&mut Pcg32::seed_from_u64(9), 20, 100.0, 100.0);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.vel, y.vel);
        }
    }
}
