//! Ballpit - a grid-partitioned physics core for huge 2D ball simulations
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bodies, broad-phase grid, collisions,
//!   integration, fixed-step control)
//! - `renderer`: Read-only, GPU-friendly view of the bodies for an external renderer
//! - `settings`: Data-driven world, spawn table and timing configuration
//! - `error`: Configuration and grid invariant errors

pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{GridError, SimError};
pub use renderer::{BodyInstance, Visualization};
pub use settings::{Settings, SpawnClass};
pub use sim::{Body, BodyId, GravityDirection, Grid, Simulation};

/// Simulation configuration constants
///
/// Time is measured in frame units: 1.0 is one frame at [`consts::DESIRED_FPS`].
pub mod consts {
    use std::ops::Range;

    /// Frame rate the physics constants are tuned for
    pub const DESIRED_FPS: f32 = 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_PHYSICS_STEPS: u32 = 6;
    /// Largest sub-step, in frame units
    pub const MAX_DELTA_TIME: f32 = 1.0;
    pub const MS_PER_SECOND: f32 = 1000.0;

    /// World dimensions (pixels)
    pub const WORLD_WIDTH: f32 = 1280.0;
    pub const WORLD_HEIGHT: f32 = 720.0;
    /// Grid cell edge; matches the largest ball diameter
    pub const CELL_SIZE: f32 = 12.0;

    /// Number of balls in the default demo
    pub const NUM_BALLS: usize = 20_000;
    /// Number of generated random ball classes in the default demo
    pub const RANDOM_CLASSES: usize = 10_000;
    /// Radius (and mass) range of generated classes
    pub const RANDOM_CLASS_RADIUS: Range<f32> = 2.0..6.0;
    pub const DEFAULT_SEED: u64 = 0x0BA1_1B17;
    /// Mixed into the seed so class generation and spawning use separate streams
    pub const CLASS_STREAM_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

    /// Gravity acceleration (pixels per frame²)
    pub const GRAVITY_FORCE: f32 = 0.1;
    /// Momentum drag per frame
    pub const FRICTION: f32 = 0.01;
}
