//! Uniform grid broad phase
//!
//! The world is cut into square cells no smaller than the largest body
//! diameter, so two overlapping disks always sit in the same or adjacent
//! cells. Cells hold [`BodyId`]s; bodies record their `(cell, slot)` so
//! removal is a swap-remove plus one back-reference patch.

use glam::Vec2;

use super::body::{Body, BodyId, CellSlot};
use crate::error::{GridError, SimError};

/// One grid cell. Never owns bodies, only lists them.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    bodies: Vec<BodyId>,
}

impl Cell {
    #[inline]
    pub fn bodies(&self) -> &[BodyId] {
        &self.bodies
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

/// Fixed-size spatial index over the world rectangle
#[derive(Debug, Clone)]
pub struct Grid {
    cell_size: f32,
    cols: usize,
    rows: usize,
    /// Row-major, index = y * cols + x
    cells: Vec<Cell>,
    /// Assert on invariant violations instead of healing them (debug builds)
    strict: bool,
}

impl Grid {
    /// Build an empty grid covering `width` x `height`
    pub fn new(width: f32, height: f32, cell_size: f32) -> Result<Self, SimError> {
        if !(cell_size > 0.0 && cell_size.is_finite()) {
            return Err(SimError::InvalidCellSize(cell_size));
        }
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(SimError::InvalidWorld { width, height });
        }

        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((height / cell_size).ceil() as usize).max(1);
        log::debug!(
            "Grid {}x{} cells of {} px over {}x{} world",
            cols,
            rows,
            cell_size,
            width,
            height
        );

        Ok(Self {
            cell_size,
            cols,
            rows,
            cells: vec![Cell::default(); cols * rows],
            strict: cfg!(debug_assertions),
        })
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Whether invariant violations trip a debug assertion
    ///
    /// On by default in debug builds. With it off (and always in release
    /// builds) the grid repairs itself and logs a warning.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Cell coordinates for a point, clamped to the grid
    pub fn cell_coords(&self, pos: Vec2) -> (usize, usize) {
        (
            clamp_axis(pos.x, self.cell_size, self.cols),
            clamp_axis(pos.y, self.cell_size, self.rows),
        )
    }

    /// Flat cell index for a point, clamped to the grid
    #[inline]
    pub fn cell_index(&self, pos: Vec2) -> usize {
        let (x, y) = self.cell_coords(pos);
        y * self.cols + x
    }

    /// Register a body in the cell under its position
    ///
    /// A body that is already registered is pulled out first, so a double
    /// insert can never leave it listed twice.
    pub fn insert(&mut self, bodies: &mut [Body], id: BodyId) {
        if bodies[id.index()].cell.is_some() {
            debug_assert!(!self.strict, "body {} inserted twice", id.index());
            log::warn!("Body {} inserted twice, re-filing it", id.index());
            self.detach(bodies, id);
        }
        let cell = self.cell_index(bodies[id.index()].pos);
        self.attach(bodies, id, cell);
    }

    /// Move a body to the cell under its current position
    ///
    /// Returns true if the body changed cells.
    pub fn relocate(&mut self, bodies: &mut [Body], id: BodyId) -> bool {
        let new_cell = self.cell_index(bodies[id.index()].pos);
        self.move_to_cell(bodies, id, new_cell)
    }

    /// Move a body to `new_cell` unless it is already filed there
    pub fn move_to_cell(&mut self, bodies: &mut [Body], id: BodyId, new_cell: usize) -> bool {
        if let Some(slot) = bodies[id.index()].cell {
            if slot.cell == new_cell && self.slot_holds(slot, id) {
                return false;
            }
        }
        self.detach(bodies, id);
        self.attach(bodies, id, new_cell);
        true
    }

    /// Visit the cell and its (up to 8) neighbors, without wraparound
    pub fn for_each_neighbor<F>(&self, cell_index: usize, mut f: F)
    where
        F: FnMut(usize, &Cell),
    {
        for index in self.neighbors(cell_index) {
            f(index, &self.cells[index]);
        }
    }

    /// Indices of the 3x3 block around `cell_index`, clipped at the edges
    pub fn neighbors(&self, cell_index: usize) -> impl Iterator<Item = usize> + use<> {
        let cols = self.cols;
        let x = cell_index % cols;
        let y = cell_index / cols;
        let xs = x.saturating_sub(1)..=(x + 1).min(cols - 1);
        let ys = y.saturating_sub(1)..=(y + 1).min(self.rows - 1);
        ys.flat_map(move |ny| xs.clone().map(move |nx| ny * cols + nx))
    }

    /// Every body listed in the 3x3 block around `cell_index`
    pub fn neighborhood(&self, cell_index: usize) -> impl Iterator<Item = BodyId> + '_ {
        self.neighbors(cell_index)
            .flat_map(move |index| self.cells[index].bodies.iter().copied())
    }

    /// Sum of all cell populations
    pub fn total_members(&self) -> usize {
        self.cells.iter().map(Cell::len).sum()
    }

    /// Check the membership invariant against the body store
    ///
    /// Every body must be listed exactly once, in the cell under its
    /// position, at the slot it records.
    pub fn audit(&self, bodies: &[Body]) -> Result<(), GridError> {
        for (cell_index, cell) in self.cells.iter().enumerate() {
            for (slot, &id) in cell.bodies.iter().enumerate() {
                let body = bodies.get(id.index()).ok_or(GridError::UnknownBody {
                    cell: cell_index,
                    body: id.index(),
                })?;
                let found = CellSlot {
                    cell: cell_index,
                    slot,
                };
                if body.cell != Some(found) {
                    return Err(GridError::StaleSlot {
                        body: id.index(),
                        found,
                        recorded: body.cell,
                    });
                }
            }
        }

        let listed = self.total_members();
        if listed != bodies.len() {
            return Err(GridError::CountMismatch {
                listed,
                bodies: bodies.len(),
            });
        }

        for (index, body) in bodies.iter().enumerate() {
            let slot = body.cell.ok_or(GridError::Unfiled(index))?;
            let expected = self.cell_index(body.pos);
            if slot.cell != expected {
                return Err(GridError::WrongCell {
                    body: index,
                    filed: slot.cell,
                    expected,
                });
            }
        }
        Ok(())
    }

    #[inline]
    fn slot_holds(&self, slot: CellSlot, id: BodyId) -> bool {
        self.cells
            .get(slot.cell)
            .and_then(|cell| cell.bodies.get(slot.slot))
            == Some(&id)
    }

    fn attach(&mut self, bodies: &mut [Body], id: BodyId, cell: usize) {
        let members = &mut self.cells[cell].bodies;
        bodies[id.index()].cell = Some(CellSlot {
            cell,
            slot: members.len(),
        });
        members.push(id);
    }

    /// Swap-remove a body from its recorded cell and patch the body that
    /// took its slot. Falls back to a full rescan if the record is stale.
    fn detach(&mut self, bodies: &mut [Body], id: BodyId) {
        let Some(slot) = bodies[id.index()].cell.take() else {
            return;
        };

        if !self.slot_holds(slot, id) {
            debug_assert!(
                !self.strict,
                "body {} not found at recorded {:?}",
                id.index(),
                slot
            );
            log::warn!(
                "Body {} not found at recorded {:?}, rescanning grid",
                id.index(),
                slot
            );
            self.purge(bodies, id);
            return;
        }

        let members = &mut self.cells[slot.cell].bodies;
        members.swap_remove(slot.slot);
        if let Some(&displaced) = members.get(slot.slot) {
            bodies[displaced.index()].cell = Some(slot);
        }
    }

    /// Remove every entry of `id` from every cell and re-number the slots of
    /// the cells that were touched.
    fn purge(&mut self, bodies: &mut [Body], id: BodyId) {
        for (cell_index, cell) in self.cells.iter_mut().enumerate() {
            if !cell.bodies.contains(&id) {
                continue;
            }
            cell.bodies.retain(|&other| other != id);
            for (slot, &other) in cell.bodies.iter().enumerate() {
                bodies[other.index()].cell = Some(CellSlot {
                    cell: cell_index,
                    slot,
                });
            }
        }
        bodies[id.index()].cell = None;
    }
}

/// floor(v / size) clamped to [0, n); NaN maps to 0
#[inline]
fn clamp_axis(v: f32, size: f32, n: usize) -> usize {
    let c = (v / size).floor();
    if c >= 0.0 {
        // `as` saturates for huge values
        (c as usize).min(n - 1)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::BodyState;
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    fn body_at(x: f32, y: f32, radius: f32) -> Body {
        Body::new(BodyState::new(Vec2::new(x, y), Vec2::ZERO, radius, 1.0))
    }

    fn filled(grid: &mut Grid, positions: &[(f32, f32)]) -> Vec<Body> {
        let mut bodies: Vec<Body> = positions.iter().map(|&(x, y)| body_at(x, y, 1.0)).collect();
        for i in 0..bodies.len() {
            grid.insert(&mut bodies, BodyId(i));
        }
        bodies
    }

    #[test]
    fn test_grid_dimensions_round_up() {
        let grid = Grid::new(100.0, 45.0, 10.0).unwrap();
        assert_eq!(grid.cols(), 10);
        assert_eq!(grid.rows(), 5);
        assert_eq!(grid.len(), 50);
    }

    #[test]
    fn test_grid_rejects_bad_cell_size() {
        assert!(Grid::new(100.0, 100.0, 0.0).is_err());
        assert!(Grid::new(100.0, 100.0, -4.0).is_err());
        assert!(Grid::new(100.0, 100.0, f32::NAN).is_err());
        assert!(Grid::new(0.0, 100.0, 10.0).is_err());
    }

    #[test]
    fn test_cell_index_clamps() {
        let grid = Grid::new(100.0, 100.0, 10.0).unwrap();
        assert_eq!(grid.cell_coords(Vec2::new(15.0, 25.0)), (1, 2));
        assert_eq!(grid.cell_coords(Vec2::new(-5.0, -50.0)), (0, 0));
        assert_eq!(grid.cell_coords(Vec2::new(100.0, 1e9)), (9, 9));
        assert_eq!(grid.cell_coords(Vec2::new(f32::NAN, 5.0)), (0, 0));
        assert_eq!(grid.cell_index(Vec2::new(15.0, 25.0)), 21);
    }

    #[test]
    fn test_insert_records_back_reference() {
        let mut grid = Grid::new(100.0, 100.0, 10.0).unwrap();
        let bodies = filled(&mut grid, &[(5.0, 5.0), (6.0, 6.0), (55.0, 5.0)]);

        assert_eq!(grid.cell(0).bodies(), &[BodyId(0), BodyId(1)]);
        assert_eq!(bodies[1].cell_slot(), Some(CellSlot { cell: 0, slot: 1 }));
        assert_eq!(bodies[2].cell_slot(), Some(CellSlot { cell: 5, slot: 0 }));
        assert!(grid.audit(&bodies).is_ok());
    }

    #[test]
    fn test_relocate_patches_displaced_body() {
        let mut grid = Grid::new(100.0, 100.0, 10.0).unwrap();
        let mut bodies = filled(&mut grid, &[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);

        // Move the first body out; the last one takes its slot
        bodies[0].pos = Vec2::new(95.0, 95.0);
        assert!(grid.relocate(&mut bodies, BodyId(0)));

        assert_eq!(grid.cell(0).bodies(), &[BodyId(2), BodyId(1)]);
        assert_eq!(bodies[2].cell_slot(), Some(CellSlot { cell: 0, slot: 0 }));
        assert_eq!(grid.cell(99).bodies(), &[BodyId(0)]);
        assert!(grid.audit(&bodies).is_ok());
    }

    #[test]
    fn test_relocate_same_cell_is_noop() {
        let mut grid = Grid::new(100.0, 100.0, 10.0).unwrap();
        let mut bodies = filled(&mut grid, &[(1.0, 1.0), (2.0, 2.0)]);

        bodies[0].pos = Vec2::new(9.0, 9.0);
        assert!(!grid.relocate(&mut bodies, BodyId(0)));
        assert_eq!(grid.cell(0).bodies(), &[BodyId(0), BodyId(1)]);
    }

    #[test]
    fn test_double_insert_keeps_single_entry() {
        let mut grid = Grid::new(100.0, 100.0, 10.0).unwrap();
        let mut bodies = filled(&mut grid, &[(1.0, 1.0), (2.0, 2.0)]);
        grid.set_strict(false);

        grid.insert(&mut bodies, BodyId(0));
        assert_eq!(grid.total_members(), 2);
        assert!(grid.audit(&bodies).is_ok());
    }

    #[test]
    fn test_stale_back_reference_self_heals() {
        let mut grid = Grid::new(100.0, 100.0, 10.0).unwrap();
        let mut bodies = filled(&mut grid, &[(1.0, 1.0), (2.0, 2.0), (55.0, 55.0)]);
        grid.set_strict(false);

        // Corrupt body 0's record so it points at the wrong slot
        bodies[0].cell = Some(CellSlot { cell: 0, slot: 1 });
        assert_eq!(
            grid.audit(&bodies),
            Err(GridError::StaleSlot {
                body: 0,
                found: CellSlot { cell: 0, slot: 0 },
                recorded: Some(CellSlot { cell: 0, slot: 1 }),
            })
        );

        bodies[0].pos = Vec2::new(35.0, 35.0);
        grid.relocate(&mut bodies, BodyId(0));

        assert!(grid.audit(&bodies).is_ok());
        assert_eq!(grid.total_members(), 3);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not found at recorded")]
    fn test_stale_back_reference_asserts_in_strict_mode() {
        let mut grid = Grid::new(100.0, 100.0, 10.0).unwrap();
        let mut bodies = filled(&mut grid, &[(1.0, 1.0), (2.0, 2.0)]);

        bodies[0].cell = Some(CellSlot { cell: 0, slot: 1 });
        bodies[0].pos = Vec2::new(35.0, 35.0);
        grid.relocate(&mut bodies, BodyId(0));
    }

    #[test]
    fn test_audit_reports_unfiled_body() {
        let mut grid = Grid::new(100.0, 100.0, 10.0).unwrap();
        let mut bodies = filled(&mut grid, &[(1.0, 1.0)]);
        bodies.push(body_at(50.0, 50.0, 1.0));

        assert_eq!(
            grid.audit(&bodies),
            Err(GridError::CountMismatch {
                listed: 1,
                bodies: 2
            })
        );
    }

    #[test]
    fn test_neighbors_interior_and_edges() {
        let grid = Grid::new(50.0, 50.0, 10.0).unwrap();

        let interior: Vec<usize> = grid.neighbors(12).collect();
        assert_eq!(interior, vec![6, 7, 8, 11, 12, 13, 16, 17, 18]);

        let corner: Vec<usize> = grid.neighbors(0).collect();
        assert_eq!(corner, vec![0, 1, 5, 6]);

        let edge: Vec<usize> = grid.neighbors(24).collect();
        assert_eq!(edge, vec![18, 19, 23, 24]);

        let mut visited = 0;
        grid.for_each_neighbor(2, |_, cell| {
            assert!(cell.is_empty());
            visited += 1;
        });
        assert_eq!(visited, 6);
    }

    #[test]
    fn test_single_cell_grid() {
        let grid = Grid::new(5.0, 5.0, 10.0).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.neighbors(0).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_twenty_thousand_bodies_accounted_for() {
        let mut grid = Grid::new(1280.0, 720.0, 12.0).unwrap();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut bodies: Vec<Body> = (0..20_000)
            .map(|_| {
                body_at(
                    rng.random_range(0.0..1280.0),
                    rng.random_range(0.0..720.0),
                    2.0,
                )
            })
            .collect();
        for i in 0..bodies.len() {
            grid.insert(&mut bodies, BodyId(i));
        }

        assert_eq!(grid.total_members(), 20_000);
        assert!(grid.audit(&bodies).is_ok());
    }

    proptest! {
        #[test]
        fn prop_membership_survives_random_moves(
            start in prop::collection::vec((0.0f32..200.0, 0.0f32..120.0), 1..60),
            moves in prop::collection::vec((0usize..60, -250.0f32..450.0, -250.0f32..450.0), 0..200),
        ) {
            let mut grid = Grid::new(200.0, 120.0, 12.0).unwrap();
            let mut bodies = filled(&mut grid, &start);

            for (which, x, y) in moves {
                let id = BodyId(which % bodies.len());
                bodies[id.index()].pos = Vec2::new(x, y);
                grid.relocate(&mut bodies, id);
            }

            prop_assert_eq!(grid.total_members(), bodies.len());
            prop_assert!(grid.audit(&bodies).is_ok());
        }

        #[test]
        fn prop_overlapping_pair_is_in_neighborhood(
            ax in 0.0f32..300.0,
            ay in 0.0f32..300.0,
            ra in 0.5f32..6.0,
            rb in 0.5f32..6.0,
            angle in 0.0f32..std::f32::consts::TAU,
            frac in 0.0f32..0.999,
        ) {
            let mut grid = Grid::new(300.0, 300.0, 12.0).unwrap();
            let a = Vec2::new(ax, ay);
            let b = a + Vec2::from_angle(angle) * (ra + rb) * frac;
            let mut bodies = vec![body_at(a.x, a.y, ra), body_at(b.x, b.y, rb)];
            grid.insert(&mut bodies, BodyId(0));
            grid.insert(&mut bodies, BodyId(1));

            let around_a: Vec<BodyId> = grid.neighborhood(grid.cell_index(a)).collect();
            let around_b: Vec<BodyId> = grid.neighborhood(grid.cell_index(b)).collect();
            prop_assert!(around_a.contains(&BodyId(1)));
            prop_assert!(around_b.contains(&BodyId(0)));
        }
    }
}
