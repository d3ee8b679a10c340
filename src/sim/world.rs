//! Simulation facade
//!
//! Owns the body store, the grid and the step controller, and runs the
//! per-frame pipeline: integrate, re-file moved bodies, resolve collisions.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::body::{Body, BodyId, BodyState};
use super::collision::{self, CollisionStats};
use super::grid::Grid;
use super::integrate::{GravityDirection, Integrator, WorldBounds};
use super::spawn::SpawnTable;
use super::step::StepController;
use crate::error::SimError;
use crate::renderer::{self, BodyInstance, Visualization, instance::colors};
use crate::settings::Settings;

/// Summary of one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    pub substeps: u32,
    /// Frame units dropped by the sub-step cap
    pub dropped: f32,
    pub contacts: usize,
    pub cell_changes: usize,
}

/// Summary of one sub-step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubstepStats {
    pub cell_changes: usize,
    pub collisions: CollisionStats,
}

/// A body held by the pointer
#[derive(Debug, Clone, Copy)]
struct Grab {
    id: BodyId,
    /// Pointer position relative to the body center
    offset: Vec2,
    /// Body position at the end of the previous sub-step, used to turn
    /// pointer motion into velocity
    prev_pos: Vec2,
}

/// The whole ball simulation
#[derive(Debug)]
pub struct Simulation {
    settings: Settings,
    /// Sized once at construction, never grown
    bodies: Vec<Body>,
    grid: Grid,
    bounds: WorldBounds,
    integrator: Integrator,
    stepper: StepController,
    visualization: Visualization,
    grab: Option<Grab>,
    /// Simulated time in frame units
    time: f32,
}

impl Simulation {
    /// Spawn `settings.body_count` bodies from the spawn table
    pub fn new(settings: Settings) -> Result<Self, SimError> {
        settings.validate()?;

        let table = SpawnTable::new(settings.spawn_classes())?;
        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let bodies = table.spawn(
            &mut rng,
            settings.body_count,
            settings.world_width,
            settings.world_height,
        );
        log::info!(
            "Spawned {} bodies from {} classes (seed {})",
            bodies.len(),
            table.len(),
            settings.seed
        );

        Self::assemble(settings, bodies)
    }

    /// Build a simulation from explicit initial states
    pub fn from_bodies(settings: Settings, states: Vec<BodyState>) -> Result<Self, SimError> {
        settings.validate()?;

        for (index, state) in states.iter().enumerate() {
            if !(state.radius > 0.0 && state.radius.is_finite()) {
                return Err(SimError::InvalidBodyClass {
                    index,
                    reason: "radius must be positive",
                });
            }
            if !(state.mass > 0.0 && state.mass.is_finite()) {
                return Err(SimError::InvalidBodyClass {
                    index,
                    reason: "mass must be positive",
                });
            }
            if state.radius * 2.0 > settings.cell_size {
                return Err(SimError::CellTooSmall {
                    cell_size: settings.cell_size,
                    diameter: state.radius * 2.0,
                });
            }
        }

        let bodies = states.into_iter().map(Body::new).collect();
        Self::assemble(settings, bodies)
    }

    fn assemble(settings: Settings, mut bodies: Vec<Body>) -> Result<Self, SimError> {
        let mut grid = Grid::new(
            settings.world_width,
            settings.world_height,
            settings.cell_size,
        )?;
        let bounds = WorldBounds::new(settings.world_width, settings.world_height);

        for i in 0..bodies.len() {
            bounds.clamp_position(&mut bodies[i]);
            grid.insert(&mut bodies, BodyId(i));
        }
        log::info!(
            "Grid {}x{} cells of {} px holding {} bodies",
            grid.cols(),
            grid.rows(),
            grid.cell_size(),
            grid.total_members()
        );

        let integrator = Integrator::new(settings.gravity_strength, settings.friction);
        let stepper = StepController::new(
            settings.target_fps,
            settings.max_substeps,
            settings.max_delta_time,
        );

        Ok(Self {
            settings,
            bodies,
            grid,
            bounds,
            integrator,
            stepper,
            visualization: Visualization::default(),
            grab: None,
            time: 0.0,
        })
    }

    /// Advance by one measured frame, running up to `max_substeps` sub-steps
    pub fn advance_frame(&mut self, frame_ms: f32) -> FrameReport {
        let mut report = FrameReport::default();

        self.stepper.begin_frame(frame_ms);
        while let Some(dt) = self.stepper.next_step() {
            let stats = self.step(dt);
            report.substeps += 1;
            report.contacts += stats.collisions.contacts;
            report.cell_changes += stats.cell_changes;
        }
        report.dropped = self.stepper.finish_frame();

        report
    }

    /// One fixed sub-step of `dt` frame units
    pub fn step(&mut self, dt: f32) -> SubstepStats {
        if !(dt > 0.0) {
            return SubstepStats::default();
        }

        // A held body moves with the pointer. Its velocity follows the latest
        // drag and is kept through sub-steps without pointer motion.
        if let Some(grab) = self.grab {
            let body = &mut self.bodies[grab.id.index()];
            let moved = body.pos - grab.prev_pos;
            if moved != Vec2::ZERO {
                body.vel = moved / dt;
            }
        }

        let cell_changes = self.integrator.integrate(
            &mut self.bodies,
            &mut self.grid,
            &self.bounds,
            dt,
            self.grab.map(|g| g.id),
        );
        let collisions = collision::resolve_collisions(
            &mut self.bodies,
            &mut self.grid,
            &self.bounds,
            self.settings.restitution,
        );

        if let Some(grab) = &mut self.grab {
            grab.prev_pos = self.bodies[grab.id.index()].pos;
        }
        self.time += dt;

        SubstepStats {
            cell_changes,
            collisions,
        }
    }

    // === Control ===

    pub fn set_gravity(&mut self, direction: GravityDirection) {
        if self.integrator.direction() != Some(direction) {
            log::info!("Gravity: {}", direction.as_str());
        }
        self.integrator.set_direction(direction);
    }

    /// Replace the fixed directions with an arbitrary acceleration
    pub fn set_gravity_vector(&mut self, gravity: Vec2) {
        self.integrator.set_gravity_vector(gravity);
    }

    /// Selected direction, `None` if a custom vector is active
    pub fn gravity_direction(&self) -> Option<GravityDirection> {
        self.integrator.direction()
    }

    pub fn gravity(&self) -> Vec2 {
        self.integrator.gravity()
    }

    pub fn visualization(&self) -> Visualization {
        self.visualization
    }

    pub fn set_visualization(&mut self, visualization: Visualization) {
        self.visualization = visualization;
    }

    pub fn cycle_visualization(&mut self) -> Visualization {
        self.visualization = self.visualization.next();
        log::info!("Visualization: {}", self.visualization.as_str());
        self.visualization
    }

    // === Pointer interaction ===

    /// Grab the topmost body under `point`, stopping it
    pub fn grab_at(&mut self, point: Vec2) -> Option<BodyId> {
        let cell = self.grid.cell_index(point);
        let id = self
            .grid
            .neighborhood(cell)
            .filter(|id| self.bodies[id.index()].contains(point))
            .max()?;

        let body = &mut self.bodies[id.index()];
        body.vel = Vec2::ZERO;
        self.grab = Some(Grab {
            id,
            offset: point - body.pos,
            prev_pos: body.pos,
        });
        log::debug!("Grabbed body {}", id.index());
        Some(id)
    }

    /// Move the held body so it stays under the pointer
    pub fn drag_to(&mut self, point: Vec2) {
        let Some(grab) = self.grab else {
            return;
        };
        let body = &mut self.bodies[grab.id.index()];
        body.pos = self.bounds.clamp_point(point - grab.offset, body.radius);
        self.grid.relocate(&mut self.bodies, grab.id);
    }

    /// Let go of the held body; it keeps its drag velocity
    pub fn release(&mut self) -> Option<BodyId> {
        self.grab.take().map(|g| g.id)
    }

    pub fn grabbed(&self) -> Option<BodyId> {
        self.grab.map(|g| g.id)
    }

    // === Read-only views ===

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Simulated time in frame units
    pub fn elapsed(&self) -> f32 {
        self.time
    }

    /// Instance buffer for the renderer, colored by the active visualization
    pub fn instances(&self) -> Vec<BodyInstance> {
        let mut list = renderer::instances(&self.bodies, self.visualization, self.time);
        if let Some(grab) = self.grab {
            list[grab.id.index()].color = colors::GRABBED;
        }
        list
    }

    // === Diagnostics ===

    pub fn total_momentum(&self) -> Vec2 {
        self.bodies.iter().map(Body::momentum).sum()
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.bodies.iter().map(Body::kinetic_energy).sum()
    }
}
