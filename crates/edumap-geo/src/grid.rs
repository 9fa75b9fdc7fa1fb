//! Uniform grid over projected points.
//!
//! Points are bucketed by `floor(coord / cell_size)`. Only occupied cells are
//! stored, so the grid covers any extent without preallocation.

use std::collections::HashMap;

type CellKey = (i64, i64);

/// Sparse uniform grid holding point slots
#[derive(Debug, Clone)]
pub struct PointGrid {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<usize>>,
    /// Smallest and largest occupied column and row
    extent: Option<(CellKey, CellKey)>,
}

impl PointGrid {
    /// Create an empty grid; `cell_size` must be positive and finite
    pub fn new(cell_size: f64) -> Self {
        Self { cell_size, cells: HashMap::new(), extent: None }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of occupied cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    fn cell_of(&self, x: f64, y: f64) -> CellKey {
        ((x / self.cell_size).floor() as i64, (y / self.cell_size).floor() as i64)
    }

    pub fn insert(&mut self, x: f64, y: f64, slot: usize) {
        let key = self.cell_of(x, y);
        self.extent = Some(match self.extent {
            Some((min, max)) => {
                ((min.0.min(key.0), min.1.min(key.1)), (max.0.max(key.0), max.1.max(key.1)))
            }
            None => (key, key),
        });
        self.cells.entry(key).or_default().push(slot);
    }

    /// Slots in the cells covering a circle of `radius` around `(x, y)`.
    ///
    /// This is the 3x3 neighbourhood while `radius <= cell_size` and a wider
    /// square otherwise, clipped to the occupied extent. When the square holds
    /// more cells than are occupied, the occupied cells are scanned instead.
    /// Results are a superset of the points within radius.
    pub fn query(&self, x: f64, y: f64, radius: f64) -> Box<dyn Iterator<Item = usize> + '_> {
        let Some((min, max)) = self.extent else {
            return Box::new(std::iter::empty());
        };
        let (col, row) = self.cell_of(x, y);
        // saturating cast
        let reach = ((radius / self.cell_size).ceil() as i64).max(1);

        let cols = (col.saturating_sub(reach).max(min.0), col.saturating_add(reach).min(max.0));
        let rows = (row.saturating_sub(reach).max(min.1), row.saturating_add(reach).min(max.1));
        if cols.0 > cols.1 || rows.0 > rows.1 {
            return Box::new(std::iter::empty());
        }

        let window = (cols.1.abs_diff(cols.0) as u128 + 1) * (rows.1.abs_diff(rows.0) as u128 + 1);
        if window > self.cells.len() as u128 {
            let in_window = move |&(c, r): &CellKey| {
                (cols.0..=cols.1).contains(&c) && (rows.0..=rows.1).contains(&r)
            };
            return Box::new(
                self.cells
                    .iter()
                    .filter(move |&(key, _)| in_window(key))
                    .flat_map(|(_, slots)| slots.iter().copied()),
            );
        }

        Box::new(
            (rows.0..=rows.1)
                .flat_map(move |r| (cols.0..=cols.1).map(move |c| (c, r)))
                .filter_map(move |key| self.cells.get(&key))
                .flat_map(|slots| slots.iter().copied()),
        )
    }
}
