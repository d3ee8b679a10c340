//! Body storage types
//!
//! Bodies live in one `Vec` owned by the simulation. Grid cells refer to them
//! by [`BodyId`] and each body remembers where it sits in its cell so it can
//! be removed in O(1).

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable index of a body in the simulation's body store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub usize);

impl BodyId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Back-reference from a body to the cell that lists it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSlot {
    /// Flat cell index in the grid
    pub cell: usize,
    /// Position of the body inside that cell's member list
    pub slot: usize,
}

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Normalized [0, 1] channels
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

/// Initial state used to build a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub color: Rgba8,
    #[serde(default)]
    pub texture_id: u32,
}

impl BodyState {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32, mass: f32) -> Self {
        Self {
            pos,
            vel,
            radius,
            mass,
            color: Rgba8::WHITE,
            texture_id: 0,
        }
    }

    pub fn with_texture(mut self, texture_id: u32) -> Self {
        self.texture_id = texture_id;
        self
    }
}

/// A simulated disk
#[derive(Debug, Clone)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub color: Rgba8,
    /// Texture handle passed through to the renderer
    pub texture_id: u32,
    /// Owning cell, `None` until the grid registers the body
    pub(crate) cell: Option<CellSlot>,
}

impl Body {
    pub fn new(state: BodyState) -> Self {
        Self {
            pos: state.pos,
            vel: state.vel,
            radius: state.radius,
            mass: state.mass,
            color: state.color,
            texture_id: state.texture_id,
            cell: None,
        }
    }

    /// Where the grid currently files this body
    #[inline]
    pub fn cell_slot(&self) -> Option<CellSlot> {
        self.cell
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        1.0 / self.mass
    }

    #[inline]
    pub fn momentum(&self) -> Vec2 {
        self.vel * self.mass
    }

    #[inline]
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.vel.length_squared()
    }

    /// Whether a point lies inside the disk
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        self.pos.distance_squared(point) < self.radius * self.radius
    }
}
