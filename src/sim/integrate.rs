//! Gravity, motion and wall bounces
//!
//! World coordinates are y-up with the origin in the bottom-left corner.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId};
use super::grid::Grid;

/// Selectable gravity direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GravityDirection {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl GravityDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            GravityDirection::None => "None",
            GravityDirection::Up => "Up",
            GravityDirection::Down => "Down",
            GravityDirection::Left => "Left",
            GravityDirection::Right => "Right",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Some(GravityDirection::None),
            "up" => Some(GravityDirection::Up),
            "down" => Some(GravityDirection::Down),
            "left" => Some(GravityDirection::Left),
            "right" => Some(GravityDirection::Right),
            _ => None,
        }
    }

    /// Acceleration vector for this direction
    pub fn vector(&self, strength: f32) -> Vec2 {
        match self {
            GravityDirection::None => Vec2::ZERO,
            GravityDirection::Up => Vec2::new(0.0, strength),
            GravityDirection::Down => Vec2::new(0.0, -strength),
            GravityDirection::Left => Vec2::new(-strength, 0.0),
            GravityDirection::Right => Vec2::new(strength, 0.0),
        }
    }
}

/// The world rectangle `[0, width] x [0, height]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl WorldBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Keep a disk inside the walls, reflecting the velocity component that
    /// points into a wall. Returns true if a wall was hit.
    pub fn contain(&self, body: &mut Body) -> bool {
        let mut hit = false;
        let r = body.radius;

        if body.pos.x < r {
            body.pos.x = r;
            body.vel.x = body.vel.x.abs();
            hit = true;
        } else if body.pos.x > self.width - r {
            body.pos.x = self.width - r;
            body.vel.x = -body.vel.x.abs();
            hit = true;
        }

        if body.pos.y < r {
            body.pos.y = r;
            body.vel.y = body.vel.y.abs();
            hit = true;
        } else if body.pos.y > self.height - r {
            body.pos.y = self.height - r;
            body.vel.y = -body.vel.y.abs();
            hit = true;
        }

        hit
    }

    /// Clamp a disk inside the walls without touching its velocity
    pub fn clamp_position(&self, body: &mut Body) {
        body.pos = self.clamp_point(body.pos, body.radius);
    }

    /// Clamp a center point so a disk of `radius` stays inside
    pub fn clamp_point(&self, point: Vec2, radius: f32) -> Vec2 {
        // max before min so a disk wider than the world pins to the far wall
        Vec2::new(
            point.x.max(radius).min(self.width - radius),
            point.y.max(radius).min(self.height - radius),
        )
    }
}

/// Semi-implicit Euler integrator with a global gravity field and friction
#[derive(Debug, Clone)]
pub struct Integrator {
    /// `None` when a custom vector was set
    direction: Option<GravityDirection>,
    strength: f32,
    gravity: Vec2,
    friction: f32,
}

impl Integrator {
    pub fn new(strength: f32, friction: f32) -> Self {
        Self {
            direction: Some(GravityDirection::None),
            strength,
            gravity: Vec2::ZERO,
            friction,
        }
    }

    pub fn set_direction(&mut self, direction: GravityDirection) {
        self.direction = Some(direction);
        self.gravity = direction.vector(self.strength);
    }

    /// Use an arbitrary acceleration instead of one of the fixed directions
    pub fn set_gravity_vector(&mut self, gravity: Vec2) {
        self.direction = None;
        self.gravity = gravity;
    }

    pub fn direction(&self) -> Option<GravityDirection> {
        self.direction
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Advance one body by `dt` frame units
    pub fn integrate_body(&self, body: &mut Body, dt: f32) {
        body.vel += self.gravity * dt;
        body.pos += body.vel * dt;

        if self.friction > 0.0 {
            let momentum = body.momentum();
            let magnitude = momentum.length();
            let drag = dt * self.friction;
            if magnitude > drag {
                body.vel -= momentum / magnitude * (drag / body.mass);
            } else {
                body.vel = Vec2::ZERO;
            }
        }
    }

    /// Move every body, bounce it off the walls and re-file it in the grid
    ///
    /// `held` is left in place (it is being dragged). Returns how many bodies
    /// changed cells.
    pub fn integrate(
        &self,
        bodies: &mut [Body],
        grid: &mut Grid,
        bounds: &WorldBounds,
        dt: f32,
        held: Option<BodyId>,
    ) -> usize {
        let mut moved = 0;
        for i in 0..bodies.len() {
            if held == Some(BodyId(i)) {
                continue;
            }
            let body = &mut bodies[i];
            self.integrate_body(body, dt);
            bounds.contain(body);

            if grid.relocate(bodies, BodyId(i)) {
                moved += 1;
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::BodyState;

    const EPS: f32 = 1e-5;

    fn disk(x: f32, y: f32, vx: f32, vy: f32, radius: f32) -> Body {
        Body::new(BodyState::new(
            Vec2::new(x, y),
            Vec2::new(vx, vy),
            radius,
            1.0,
        ))
    }

    #[test]
    fn test_gravity_vectors() {
        assert_eq!(GravityDirection::None.vector(2.0), Vec2::ZERO);
        assert_eq!(GravityDirection::Down.vector(2.0), Vec2::new(0.0, -2.0));
        assert_eq!(GravityDirection::Right.vector(2.0), Vec2::new(2.0, 0.0));
        assert_eq!(GravityDirection::from_str("LEFT"), Some(GravityDirection::Left));
        assert_eq!(GravityDirection::from_str("sideways"), None);
    }

    #[test]
    fn test_gravity_applied_before_move() {
        let mut integrator = Integrator::new(0.5, 0.0);
        integrator.set_direction(GravityDirection::Down);
        let mut body = disk(50.0, 50.0, 1.0, 0.0, 1.0);

        integrator.integrate_body(&mut body, 2.0);

        assert!((body.vel.y - -1.0).abs() < EPS);
        assert!((body.pos.x - 52.0).abs() < EPS);
        assert!((body.pos.y - 48.0).abs() < EPS);
    }

    #[test]
    fn test_custom_gravity_vector() {
        let mut integrator = Integrator::new(0.1, 0.0);
        integrator.set_gravity_vector(Vec2::new(0.3, 0.4));
        assert_eq!(integrator.direction(), None);
        assert_eq!(integrator.gravity(), Vec2::new(0.3, 0.4));
    }

    #[test]
    fn test_wall_bounce_reflects_normal_component_only() {
        let bounds = WorldBounds::new(100.0, 100.0);
        let integrator = Integrator::new(0.0, 0.0);
        let mut body = disk(98.0, 50.0, 3.0, 1.5, 2.0);

        integrator.integrate_body(&mut body, 1.0);
        assert!(bounds.contain(&mut body));

        assert_eq!(body.pos.x, 98.0);
        assert_eq!(body.vel, Vec2::new(-3.0, 1.5));
    }

    #[test]
    fn test_floor_bounce() {
        let bounds = WorldBounds::new(100.0, 100.0);
        let mut body = disk(40.0, -3.0, -0.5, -2.0, 2.0);

        assert!(bounds.contain(&mut body));

        assert_eq!(body.pos, Vec2::new(40.0, 2.0));
        assert_eq!(body.vel, Vec2::new(-0.5, 2.0));
    }

    #[test]
    fn test_body_inside_is_untouched() {
        let bounds = WorldBounds::new(100.0, 100.0);
        let mut body = disk(50.0, 50.0, 1.0, 1.0, 2.0);
        assert!(!bounds.contain(&mut body));
        assert_eq!(body.vel, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_friction_slows_and_stops() {
        let integrator = Integrator::new(0.0, 0.5);
        let mut body = disk(50.0, 50.0, 2.0, 0.0, 1.0);

        integrator.integrate_body(&mut body, 1.0);
        assert!((body.vel.x - 1.5).abs() < EPS);

        // Momentum below the friction threshold comes to rest
        body.vel = Vec2::new(0.3, 0.0);
        integrator.integrate_body(&mut body, 1.0);
        assert_eq!(body.vel, Vec2::ZERO);
    }

    #[test]
    fn test_friction_independent_of_step_split() {
        let integrator = Integrator::new(0.0, 0.5);

        for start in [2.0, 0.3] {
            let mut whole = disk(50.0, 50.0, start, 0.0, 1.0);
            integrator.integrate_body(&mut whole, 1.0);

            let mut halves = disk(50.0, 50.0, start, 0.0, 1.0);
            integrator.integrate_body(&mut halves, 0.5);
            integrator.integrate_body(&mut halves, 0.5);

            assert!((whole.vel - halves.vel).length() < EPS);
        }
    }

    #[test]
    fn test_short_step_slows_instead_of_stopping() {
        let integrator = Integrator::new(0.0, 0.01);
        let mut body = disk(50.0, 50.0, 0.005, 0.0, 1.0);

        integrator.integrate_body(&mut body, 0.25);

        assert!((body.vel.x - 0.0025).abs() < 1e-7);
    }

    #[test]
    fn test_integrate_refiles_moving_bodies() {
        let bounds = WorldBounds::new(100.0, 100.0);
        let integrator = Integrator::new(0.0, 0.0);
        let mut grid = Grid::new(100.0, 100.0, 10.0).unwrap();
        let mut bodies = vec![
            disk(9.0, 5.0, 2.0, 0.0, 1.0),
            disk(50.0, 50.0, 0.5, 0.0, 1.0),
            disk(25.0, 25.0, 5.0, 5.0, 1.0),
        ];
        for i in 0..bodies.len() {
            grid.insert(&mut bodies, BodyId(i));
        }

        let moved = integrator.integrate(&mut bodies, &mut grid, &bounds, 1.0, Some(BodyId(2)));

        assert_eq!(moved, 1);
        assert_eq!(bodies[2].pos, Vec2::new(25.0, 25.0));
        assert!(grid.audit(&bodies).is_ok());
    }
}
