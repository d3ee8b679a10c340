//! Configuration and grid invariant errors
//!
//! Everything that can go wrong is caught while building a simulation. Once
//! a [`crate::sim::Simulation`] exists, stepping it never fails.

use thiserror::Error;

use crate::sim::CellSlot;

/// Reasons a simulation cannot be constructed
#[derive(Debug, Error)]
pub enum SimError {
    #[error("world size must be positive and finite, got {width} x {height}")]
    InvalidWorld { width: f32, height: f32 },

    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),

    #[error("cell size {cell_size} is smaller than the largest body diameter {diameter}")]
    CellTooSmall { cell_size: f32, diameter: f32 },

    #[error("spawn class {index} is invalid: {reason}")]
    InvalidBodyClass { index: usize, reason: &'static str },

    #[error("spawn table is empty or its weights sum to zero")]
    EmptySpawnTable,

    #[error("invalid timing configuration: {0}")]
    InvalidTiming(&'static str),

    #[error("restitution must be within [0, 1], got {0}")]
    InvalidRestitution(f32),

    #[error("friction must be non-negative and finite, got {0}")]
    InvalidFriction(f32),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Membership invariant violations reported by [`crate::sim::Grid::audit`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell {cell} lists unknown body {body}")]
    UnknownBody { cell: usize, body: usize },

    #[error("body {body} found at {found:?} but records {recorded:?}")]
    StaleSlot {
        body: usize,
        found: CellSlot,
        recorded: Option<CellSlot>,
    },

    #[error("{listed} cell entries for {bodies} bodies")]
    CountMismatch { listed: usize, bodies: usize },

    #[error("body {0} is not in any cell")]
    Unfiled(usize),

    #[error("body {body} filed in cell {filed} but its position maps to {expected}")]
    WrongCell {
        body: usize,
        filed: usize,
        expected: usize,
    },
}
