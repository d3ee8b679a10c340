//! Narrow phase: disk/disk overlap tests and impulse response
//!
//! Candidates come from the grid's 3x3 neighborhood around each body. Every
//! unordered pair is tested once by only looking at partners with a larger
//! [`BodyId`].

use glam::Vec2;

use super::body::{Body, BodyId};
use super::grid::Grid;
use super::integrate::WorldBounds;

/// Separation axis used when two centers coincide exactly
pub const FALLBACK_AXIS: Vec2 = Vec2::X;

/// Counters from one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionStats {
    /// Candidate pairs that got an exact distance test
    pub tested: usize,
    /// Pairs that were overlapping and got resolved
    pub contacts: usize,
}

/// Resolve one pair of disks. Returns true if they were overlapping.
///
/// Positions are pushed apart along the line of centers, split by inverse
/// mass. If the pair is closing, the normal velocity components get the
/// impulse `j = -(1 + e) * v_rel.n / (1/ma + 1/mb)`; tangential components are
/// untouched.
pub fn resolve_pair(a: &mut Body, b: &mut Body, restitution: f32) -> bool {
    let delta = b.pos - a.pos;
    let total_radius = a.radius + b.radius;
    let dist_sq = delta.length_squared();
    if dist_sq >= total_radius * total_radius {
        return false;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        FALLBACK_AXIS
    };

    let inv_a = a.inv_mass();
    let inv_b = b.inv_mass();
    let inv_sum = inv_a + inv_b;

    // Minimum translation, heavier body moves less
    let depth = total_radius - dist;
    a.pos -= normal * (depth * inv_a / inv_sum);
    b.pos += normal * (depth * inv_b / inv_sum);

    // Only closing pairs get an impulse, resting contacts stay quiet
    let closing = (b.vel - a.vel).dot(normal);
    if closing < 0.0 {
        let impulse = -(1.0 + restitution) * closing / inv_sum;
        a.vel -= normal * (impulse * inv_a);
        b.vel += normal * (impulse * inv_b);
    }

    true
}

/// Test and resolve every overlapping pair using the grid
///
/// Bodies are looked up through the cell they are currently filed in.
pub fn resolve_all(bodies: &mut [Body], grid: &Grid, restitution: f32) -> CollisionStats {
    let mut stats = CollisionStats::default();

    for i in 0..bodies.len() {
        let Some(slot) = bodies[i].cell else {
            continue;
        };

        for other in grid.neighborhood(slot.cell) {
            let j = other.index();
            if j <= i {
                continue;
            }
            stats.tested += 1;

            let (a, b) = pair_mut(bodies, i, j);
            if resolve_pair(a, b, restitution) {
                stats.contacts += 1;
            }
        }
    }

    stats
}

/// Full collision pass for one sub-step
///
/// Resolves overlaps, then pulls any body pushed through a wall back inside
/// and re-files bodies whose correction moved them to another cell.
pub fn resolve_collisions(
    bodies: &mut [Body],
    grid: &mut Grid,
    bounds: &WorldBounds,
    restitution: f32,
) -> CollisionStats {
    let stats = resolve_all(bodies, grid, restitution);

    if stats.contacts > 0 {
        for i in 0..bodies.len() {
            bounds.clamp_position(&mut bodies[i]);
            grid.relocate(bodies, BodyId(i));
        }
    }

    stats
}

/// Two distinct mutable bodies, `i < j`
#[inline]
fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert!(i < j);
    let (lo, hi) = bodies.split_at_mut(j);
    (&mut lo[i], &mut hi[0])
}
