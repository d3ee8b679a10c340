//! Simulation settings
//!
//! Loaded from JSON (every field optional) or taken from [`Settings::default`],
//! the 20 000 ball demo without drag. [`Settings::classic`] adds the demo's
//! momentum friction back.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;
use crate::sim::Rgba8;

/// One entry of the weighted spawn table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnClass {
    pub color: Rgba8,
    pub radius: f32,
    pub mass: f32,
    /// Initial speed range in pixels per frame unit
    pub min_speed: f32,
    pub max_speed: f32,
    /// Relative spawn probability
    pub weight: f32,
    /// Texture handle handed to the renderer
    #[serde(default)]
    pub texture_id: u32,
}

impl SpawnClass {
    pub const fn new(
        color: Rgba8,
        radius: f32,
        mass: f32,
        min_speed: f32,
        max_speed: f32,
        weight: f32,
    ) -> Self {
        Self {
            color,
            radius,
            mass,
            min_speed,
            max_speed,
            weight,
            texture_id: 0,
        }
    }

    pub const fn with_texture(mut self, texture_id: u32) -> Self {
        self.texture_id = texture_id;
        self
    }

    fn check(&self, index: usize) -> Result<(), SimError> {
        let reason = if !(self.radius > 0.0 && self.radius.is_finite()) {
            "radius must be positive"
        } else if !(self.mass > 0.0 && self.mass.is_finite()) {
            "mass must be positive"
        } else if !(self.min_speed >= 0.0 && self.max_speed.is_finite()) {
            "speeds must be non-negative and finite"
        } else if self.min_speed > self.max_speed {
            "min_speed exceeds max_speed"
        } else if !(self.weight >= 0.0 && self.weight.is_finite()) {
            "weight must be non-negative"
        } else {
            return Ok(());
        };
        Err(SimError::InvalidBodyClass { index, reason })
    }
}

/// The six hand-tuned classes of the ball demo
pub fn default_spawn_table() -> Vec<SpawnClass> {
    vec![
        SpawnClass::new(Rgba8::rgb(255, 255, 255), 2.0, 1.0, 0.1, 7.0, 1.0),
        SpawnClass::new(Rgba8::rgb(1, 254, 145), 2.0, 2.0, 0.1, 3.0, 1.0),
        SpawnClass::new(Rgba8::rgb(177, 0, 254), 3.0, 4.0, 0.0, 0.0, 1.0),
        SpawnClass::new(Rgba8::rgb(254, 0, 0), 3.0, 4.0, 0.0, 0.0, 1.0),
        SpawnClass::new(Rgba8::rgb(0, 255, 255), 3.0, 4.0, 0.0, 0.0, 1.0),
        SpawnClass::new(Rgba8::rgb(255, 255, 0), 3.0, 4.0, 0.0, 0.0, 1.0),
    ]
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === World ===
    /// World width in pixels
    pub world_width: f32,
    /// World height in pixels
    pub world_height: f32,
    /// Broad-phase cell edge length, must cover the largest body diameter
    pub cell_size: f32,

    // === Population ===
    pub body_count: usize,
    /// Seed for spawn rolls and generated classes
    pub seed: u64,
    pub spawn_table: Vec<SpawnClass>,
    /// Extra zero-speed classes with random color, radius and mass
    pub random_classes: usize,

    // === Physics ===
    /// Gravity acceleration in pixels per frame unit squared
    pub gravity_strength: f32,
    /// Momentum drag per frame unit (0, the default, disables it)
    pub friction: f32,
    /// Restitution for body/body contacts (1.0 = perfectly elastic)
    pub restitution: f32,

    // === Timing ===
    pub target_fps: f32,
    pub max_substeps: u32,
    /// Largest single sub-step in frame units
    pub max_delta_time: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            cell_size: CELL_SIZE,

            body_count: NUM_BALLS,
            seed: DEFAULT_SEED,
            spawn_table: default_spawn_table(),
            random_classes: RANDOM_CLASSES,

            gravity_strength: GRAVITY_FORCE,
            friction: 0.0,
            restitution: 1.0,

            target_fps: DESIRED_FPS,
            max_substeps: MAX_PHYSICS_STEPS,
            max_delta_time: MAX_DELTA_TIME,
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// The classic demo feel: default settings plus momentum drag
    pub fn classic() -> Self {
        Self {
            friction: FRICTION,
            ..Self::default()
        }
    }

    /// Settings without gravity, friction or generated classes, for
    /// hand-built scenarios
    pub fn frictionless(world_width: f32, world_height: f32, cell_size: f32) -> Self {
        Self {
            world_width,
            world_height,
            cell_size,
            body_count: 0,
            random_classes: 0,
            gravity_strength: 0.0,
            friction: 0.0,
            ..Self::default()
        }
    }

    /// Target frame duration in milliseconds
    pub fn target_frame_ms(&self) -> f32 {
        1000.0 / self.target_fps
    }

    /// Largest diameter any spawnable body can have
    pub fn max_body_diameter(&self) -> f32 {
        let table_max = self
            .spawn_table
            .iter()
            .map(|c| c.radius)
            .fold(0.0_f32, f32::max);
        let generated_max = if self.random_classes > 0 {
            RANDOM_CLASS_RADIUS.end
        } else {
            0.0
        };
        table_max.max(generated_max) * 2.0
    }

    /// Reject anything the simulation cannot run with
    pub fn validate(&self) -> Result<(), SimError> {
        let world_ok = |v: f32| v > 0.0 && v.is_finite();
        if !world_ok(self.world_width) || !world_ok(self.world_height) {
            return Err(SimError::InvalidWorld {
                width: self.world_width,
                height: self.world_height,
            });
        }
        if !(self.cell_size > 0.0 && self.cell_size.is_finite()) {
            return Err(SimError::InvalidCellSize(self.cell_size));
        }
        if !(self.target_fps > 0.0 && self.target_fps.is_finite()) {
            return Err(SimError::InvalidTiming("target_fps must be positive"));
        }
        if self.max_substeps == 0 {
            return Err(SimError::InvalidTiming("max_substeps must be at least 1"));
        }
        if !(self.max_delta_time > 0.0 && self.max_delta_time.is_finite()) {
            return Err(SimError::InvalidTiming("max_delta_time must be positive"));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(SimError::InvalidRestitution(self.restitution));
        }
        if !(self.friction >= 0.0 && self.friction.is_finite()) {
            return Err(SimError::InvalidFriction(self.friction));
        }

        for (index, class) in self.spawn_table.iter().enumerate() {
            class.check(index)?;
        }
        let total_weight: f32 = self.spawn_table.iter().map(|c| c.weight).sum();
        if total_weight <= 0.0 && self.random_classes == 0 {
            return Err(SimError::EmptySpawnTable);
        }

        let diameter = self.max_body_diameter();
        if self.cell_size < diameter {
            return Err(SimError::CellTooSmall {
                cell_size: self.cell_size,
                diameter,
            });
        }
        Ok(())
    }

    /// The full spawn table: configured classes followed by the generated ones
    ///
    /// Generated classes come from their own seeded stream so the same
    /// settings always produce the same table.
    pub fn spawn_classes(&self) -> Vec<SpawnClass> {
        let mut classes = Vec::with_capacity(self.spawn_table.len() + self.random_classes);
        classes.extend(self.spawn_table.iter().cloned());

        let mut rng = Pcg32::seed_from_u64(self.seed ^ CLASS_STREAM_SALT);
        for _ in 0..self.random_classes {
            let color = Rgba8::rgb(rng.random(), rng.random(), rng.random());
            let radius = rng.random_range(RANDOM_CLASS_RADIUS);
            let mass = rng.random_range(RANDOM_CLASS_RADIUS);
            classes.push(SpawnClass::new(color, radius, mass, 0.0, 0.0, 1.0));
        }
        classes
    }
}
