//! Dense multi-occupancy grid and its neighbourhood geometry.

use lasius_core::{AgentId, CellCoord, MoveError, PlacementError, Topology};

/// Bounded or wrapping grid where each cell lists every agent standing on it.
///
/// Cells are stored row-major. Occupant lists keep insertion order so that
/// scans over a cell are deterministic.
#[derive(Clone, Debug)]
pub struct SpatialField {
    width: u32,
    height: u32,
    topology: Topology,
    cells: Vec<Vec<AgentId>>,
}

impl SpatialField {
    /// Creates an empty field with the provided shape.
    ///
    /// The shape is expected to pass [`lasius_core::GridConfig::validate`].
    /// A shape whose cell count does not fit in memory yields a field
    /// without cells.
    #[must_use]
    pub fn new(width: u32, height: u32, topology: Topology) -> Self {
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).ok();
        let (width, height, capacity) = match capacity {
            Some(capacity) => (width, height, capacity),
            None => (0, 0, 0),
        };
        Self {
            width,
            height,
            topology,
            cells: vec![Vec::new(); capacity],
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Edge behaviour of the field.
    #[must_use]
    pub const fn topology(&self) -> Topology {
        self.topology
    }

    /// Reports whether the cell lies inside the field.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.width && cell.row() < self.height
    }

    /// Agents standing on the cell; empty for cells outside the field.
    #[must_use]
    pub fn occupants(&self, cell: CellCoord) -> &[AgentId] {
        self.index(cell)
            .and_then(|index| self.cells.get(index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Reports whether no agent at all stands on the cell.
    #[must_use]
    pub fn is_vacant(&self, cell: CellCoord) -> bool {
        self.contains(cell) && self.occupants(cell).is_empty()
    }

    /// Every vacant cell in row-major order.
    #[must_use]
    pub fn vacant_cells(&self) -> Vec<CellCoord> {
        let mut vacant = Vec::new();
        for row in 0..self.height {
            for column in 0..self.width {
                let cell = CellCoord::new(column, row);
                if self.is_vacant(cell) {
                    vacant.push(cell);
                }
            }
        }
        vacant
    }

    /// Moore neighbourhood of `center` at `radius`.
    ///
    /// Cells are ordered by column offset, then row offset, both ascending.
    /// On a bounded field cells past the edge are dropped; on a toroidal field
    /// they wrap and duplicates produced by wrapping are dropped.
    #[must_use]
    pub fn moore_neighborhood(
        &self,
        center: CellCoord,
        radius: u32,
        include_center: bool,
    ) -> Vec<CellCoord> {
        self.collect_offsets(center, radius, include_center, |_, _| true)
    }

    /// Cells at exactly Chebyshev distance `radius` from `center`, in
    /// neighbourhood order.
    #[must_use]
    pub fn ring(&self, center: CellCoord, radius: u32) -> Vec<CellCoord> {
        if radius == 0 {
            return if self.contains(center) {
                vec![center]
            } else {
                Vec::new()
            };
        }
        let radius_i64 = i64::from(radius);
        self.collect_offsets(center, radius, false, |dx, dy| {
            dx.abs().max(dy.abs()) == radius_i64
        })
    }

    /// Radius at which a ring scan has covered the whole field.
    #[must_use]
    pub fn max_scan_radius(&self) -> u32 {
        match self.topology {
            Topology::Bounded => self.width.max(self.height).saturating_sub(1),
            Topology::Toroidal => self.width.max(self.height) / 2,
        }
    }

    /// Straight-line distance between two cells.
    ///
    /// Both axes contribute. On a toroidal field each axis uses the shorter
    /// of the direct and the wrapped offset.
    #[must_use]
    pub fn distance(&self, from: CellCoord, to: CellCoord) -> f64 {
        let dx = self.axis_offset(from.column(), to.column(), self.width);
        let dy = self.axis_offset(from.row(), to.row(), self.height);
        f64::from(dx).hypot(f64::from(dy))
    }

    /// Reports whether `to` is one of the eight cells surrounding `from`.
    #[must_use]
    pub fn is_adjacent(&self, from: CellCoord, to: CellCoord) -> bool {
        from != to && self.moore_neighborhood(from, 1, false).contains(&to)
    }

    pub(crate) fn place(&mut self, agent: AgentId, cell: CellCoord) -> Result<(), PlacementError> {
        let occupants = self
            .index(cell)
            .and_then(|index| self.cells.get_mut(index))
            .ok_or(PlacementError::OutOfBounds)?;
        occupants.push(agent);
        Ok(())
    }

    pub(crate) fn remove(&mut self, agent: AgentId, cell: CellCoord) -> bool {
        let Some(occupants) = self
            .index(cell)
            .and_then(|index| self.cells.get_mut(index))
        else {
            return false;
        };
        match occupants.iter().position(|occupant| *occupant == agent) {
            Some(position) => {
                let _ = occupants.remove(position);
                true
            }
            None => false,
        }
    }

    pub(crate) fn relocate(
        &mut self,
        agent: AgentId,
        from: CellCoord,
        to: CellCoord,
    ) -> Result<(), MoveError> {
        if !self.contains(to) {
            return Err(MoveError::OutOfBounds);
        }
        if !self.remove(agent, from) {
            return Err(MoveError::UnknownAgent);
        }
        self.place(agent, to).map_err(|_| MoveError::OutOfBounds)
    }

    fn collect_offsets<F>(
        &self,
        center: CellCoord,
        radius: u32,
        include_center: bool,
        keep: F,
    ) -> Vec<CellCoord>
    where
        F: Fn(i64, i64) -> bool,
    {
        let mut cells = Vec::new();
        if !self.contains(center) {
            return cells;
        }

        // Past the scan radius every offset lands on a cell already visited.
        let radius = i64::from(radius.min(self.max_scan_radius()));
        let span = 2 * radius + 1;
        let wraps = matches!(self.topology, Topology::Toroidal)
            && (span > i64::from(self.width) || span > i64::from(self.height));
        let mut seen = if wraps {
            vec![false; self.cells.len()]
        } else {
            Vec::new()
        };
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                if dx == 0 && dy == 0 && !include_center {
                    continue;
                }
                if !keep(dx, dy) {
                    continue;
                }
                let Some(cell) = self.offset(center, dx, dy) else {
                    continue;
                };
                if cell == center && !include_center {
                    continue;
                }
                if wraps {
                    let Some(visited) = self.index(cell).and_then(|index| seen.get_mut(index))
                    else {
                        continue;
                    };
                    if std::mem::replace(visited, true) {
                        continue;
                    }
                }
                cells.push(cell);
            }
        }
        cells
    }

    fn offset(&self, center: CellCoord, dx: i64, dy: i64) -> Option<CellCoord> {
        let width = i64::from(self.width);
        let height = i64::from(self.height);
        let column = i64::from(center.column()) + dx;
        let row = i64::from(center.row()) + dy;
        let (column, row) = match self.topology {
            Topology::Bounded => {
                if column < 0 || row < 0 || column >= width || row >= height {
                    return None;
                }
                (column, row)
            }
            Topology::Toroidal => (column.rem_euclid(width), row.rem_euclid(height)),
        };
        Some(CellCoord::new(
            u32::try_from(column).ok()?,
            u32::try_from(row).ok()?,
        ))
    }

    fn axis_offset(&self, from: u32, to: u32, extent: u32) -> u32 {
        let direct = from.abs_diff(to);
        match self.topology {
            Topology::Bounded => direct,
            Topology::Toroidal => direct.min(extent.saturating_sub(direct)),
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
