//! Renderer-facing view of the simulation
//!
//! The core never draws. It hands out a read-only slice of bodies, or a
//! ready-made instance buffer colored by one of a closed set of
//! visualizations. Switching visualization is cosmetic and never touches
//! physics state.

pub mod instance;

pub use instance::BodyInstance;

use serde::{Deserialize, Serialize};

use crate::sim::Body;

/// Speed (pixels per frame) that maps to the hot end of the velocity ramp
pub const VELOCITY_FULL_SCALE: f32 = 7.0;
/// Momentum magnitude drawn at full brightness
pub const MOMENTUM_FULL_SCALE: f32 = 14.0;

/// Selectable coloring strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visualization {
    /// Each body's own spawn color
    #[default]
    Plain,
    /// Own color, brighter with more momentum
    Momentum,
    /// Speed ramp from blue (slow) to red (fast)
    Velocity,
    /// Hue drifting with time and position
    Trippy,
}

impl Visualization {
    pub const ALL: [Visualization; 4] = [
        Visualization::Plain,
        Visualization::Momentum,
        Visualization::Velocity,
        Visualization::Trippy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Visualization::Plain => "Plain",
            Visualization::Momentum => "Momentum",
            Visualization::Velocity => "Velocity",
            Visualization::Trippy => "Trippy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "plain" | "basic" => Some(Visualization::Plain),
            "momentum" => Some(Visualization::Momentum),
            "velocity" => Some(Visualization::Velocity),
            "trippy" => Some(Visualization::Trippy),
            _ => None,
        }
    }

    /// The next variant, wrapping around
    pub fn next(&self) -> Self {
        let index = Self::ALL.iter().position(|v| v == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// Color for one body at simulation time `time` (frame units)
    pub fn color(&self, body: &Body, time: f32) -> [f32; 4] {
        match self {
            Visualization::Plain => body.color.to_f32(),
            Visualization::Momentum => {
                let [r, g, b, a] = body.color.to_f32();
                let t = (body.momentum().length() / MOMENTUM_FULL_SCALE).clamp(0.0, 1.0);
                let brightness = 0.25 + 0.75 * t;
                [r * brightness, g * brightness, b * brightness, a]
            }
            Visualization::Velocity => velocity_color(body.vel.length(), 1.0),
            Visualization::Trippy => {
                let hue = (time * 0.005 + (body.pos.x + body.pos.y) * 0.001).rem_euclid(1.0);
                let [r, g, b] = hsv_to_rgb(hue, 0.8, 1.0);
                [r, g, b, 1.0]
            }
        }
    }
}

/// Build the instance buffer for the current frame
pub fn instances(bodies: &[Body], visualization: Visualization, time: f32) -> Vec<BodyInstance> {
    bodies
        .iter()
        .map(|body| {
            BodyInstance::new(
                body.pos.to_array(),
                body.radius,
                body.texture_id,
                visualization.color(body, time),
            )
        })
        .collect()
}

/// Interpolate color based on speed (slow=blue, medium=green, fast=red)
fn velocity_color(speed: f32, alpha: f32) -> [f32; 4] {
    let t = (speed / VELOCITY_FULL_SCALE).clamp(0.0, 1.0);

    // blue -> cyan -> green -> yellow -> red
    let (r, g, b) = if t < 0.25 {
        let u = t / 0.25;
        (0.2, 0.4 + 0.4 * u, 1.0)
    } else if t < 0.5 {
        let u = (t - 0.25) / 0.25;
        (0.2, 0.8, 1.0 - 0.6 * u)
    } else if t < 0.75 {
        let u = (t - 0.5) / 0.25;
        (0.2 + 0.8 * u, 0.8, 0.4 - 0.2 * u)
    } else {
        let u = (t - 0.75) / 0.25;
        (1.0, 0.8 - 0.5 * u, 0.2)
    };

    [r, g, b, alpha]
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let sector = h * 6.0;
    let i = sector.floor() as i32 % 6;
    let f = sector - sector.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match i {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{BodyState, Rgba8};
    use glam::Vec2;

    fn body(vel: Vec2, mass: f32) -> Body {
        let mut state = BodyState::new(Vec2::new(10.0, 20.0), vel, 2.0, mass);
        state.color = Rgba8::rgb(255, 0, 0);
        Body::new(state)
    }

    #[test]
    fn test_cycle_wraps() {
        assert_eq!(Visualization::Plain.next(), Visualization::Momentum);
        assert_eq!(Visualization::Trippy.next(), Visualization::Plain);
        assert_eq!(Visualization::from_str("VELOCITY"), Some(Visualization::Velocity));
    }

    #[test]
    fn test_plain_uses_body_color() {
        let b = body(Vec2::ZERO, 1.0);
        assert_eq!(Visualization::Plain.color(&b, 0.0), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_momentum_brightens_heavy_fast_bodies() {
        let slow = Visualization::Momentum.color(&body(Vec2::new(0.5, 0.0), 1.0), 0.0);
        let fast = Visualization::Momentum.color(&body(Vec2::new(5.0, 0.0), 3.0), 0.0);
        assert!(fast[0] > slow[0]);
    }

    #[test]
    fn test_velocity_ramp_ends() {
        let still = Visualization::Velocity.color(&body(Vec2::ZERO, 1.0), 0.0);
        let fast = Visualization::Velocity.color(&body(Vec2::new(50.0, 0.0), 1.0), 0.0);
        assert_eq!(still, [0.2, 0.4, 1.0, 1.0]);
        assert!(fast[0] > 0.99 && fast[2] < 0.3);
    }

    #[test]
    fn test_trippy_channels_in_range() {
        let b = body(Vec2::ZERO, 1.0);
        for step in 0..50 {
            let c = Visualization::Trippy.color(&b, step as f32 * 37.0);
            assert!(c.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_instances_match_bodies() {
        let bodies = vec![body(Vec2::ZERO, 1.0), body(Vec2::X, 2.0)];
        let list = instances(&bodies, Visualization::Plain, 0.0);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].position, [10.0, 20.0]);
        assert_eq!(list[1].radius, 2.0);
        assert_eq!(BodyInstance::as_bytes(&list).len(), 2 * 32);
    }
}
