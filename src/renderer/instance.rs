//! Per-body instance record handed to the external renderer

use bytemuck::{Pod, Zeroable};

/// One disk to draw, laid out for direct upload as an instance buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct BodyInstance {
    pub position: [f32; 2],
    pub radius: f32,
    pub texture_id: u32,
    pub color: [f32; 4],
}

impl BodyInstance {
    pub const fn new(position: [f32; 2], radius: f32, texture_id: u32, color: [f32; 4]) -> Self {
        Self {
            position,
            radius,
            texture_id,
            color,
        }
    }

    /// Raw bytes of a slice of instances
    pub fn as_bytes(instances: &[BodyInstance]) -> &[u8] {
        bytemuck::cast_slice(instances)
    }
}

/// Colors for highlighted bodies
pub mod colors {
    /// Body currently held by the pointer
    pub const GRABBED: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
}
