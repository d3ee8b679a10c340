//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Fixed sub-steps only, driven by the step controller
//! - Seeded RNG only
//! - Stable iteration order (by body index)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod grid;
pub mod integrate;
pub mod spawn;
pub mod step;
pub mod world;

pub use body::{Body, BodyId, BodyState, CellSlot, Rgba8};
pub use collision::{CollisionStats, resolve_all, resolve_collisions, resolve_pair};
pub use grid::{Cell, Grid};
pub use integrate::{GravityDirection, Integrator, WorldBounds};
pub use spawn::SpawnTable;
pub use step::{StepController, StepReport};
pub use world::{FrameReport, Simulation, SubstepStats};
