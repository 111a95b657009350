//! Normalized positions and the cell grid laid over the unit square.

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// A position on the control surface. Both axes are normalized to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a point (not clamped).
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The centre of the surface.
    pub const CENTER: Point = Point::new(0.5, 0.5);

    /// Returns the point clamped into the unit square. NaN components map to 0.
    pub fn clamped(self) -> Point {
        Point {
            x: clamp_unit(self.x),
            y: clamp_unit(self.y),
        }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation towards `other` by `t`.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

pub(crate) fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// A grid cell. `index` is `row * columns + col` and unique within its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub col: u32,
    pub row: u32,
    pub index: u32,
}

/// A `columns x rows` partition of the unit square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridShape")]
pub struct Grid {
    columns: u32,
    rows: u32,
}

#[derive(Deserialize)]
struct GridShape {
    columns: u32,
    rows: u32,
}

impl TryFrom<GridShape> for Grid {
    type Error = GridError;

    fn try_from(shape: GridShape) -> Result<Self, Self::Error> {
        Grid::new(shape.columns, shape.rows)
    }
}

impl Grid {
    /// Creates a grid; both dimensions must be at least 1 and every cell
    /// index must fit in a `u32`.
    pub fn new(columns: u32, rows: u32) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::Empty { columns, rows });
        }
        if columns.checked_mul(rows).is_none() {
            return Err(GridError::TooManyCells { columns, rows });
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> u32 {
        self.columns * self.rows
    }

    /// Maps a position to the cell containing it. Out-of-range input is clamped.
    pub fn to_cell(&self, point: Point) -> Cell {
        let p = point.clamped();
        let col = axis_index(p.x, self.columns);
        let row = axis_index(p.y, self.rows);
        Cell {
            col,
            row,
            index: row * self.columns + col,
        }
    }

    /// Normalized centre of a cell.
    pub fn center_of(&self, cell: Cell) -> Point {
        Point {
            x: (cell.col as f64 + 0.5) / self.columns as f64,
            y: (cell.row as f64 + 0.5) / self.rows as f64,
        }
    }

    /// Looks up a cell by index.
    pub fn cell_at(&self, index: u32) -> Option<Cell> {
        if index >= self.cell_count() {
            return None;
        }
        Some(Cell {
            col: index % self.columns,
            row: index / self.columns,
            index,
        })
    }

    /// Iterates over all cells in index order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.cell_count()).filter_map(move |i| self.cell_at(i))
    }
}

fn axis_index(v: f64, divisions: u32) -> u32 {
    let raw = (v * divisions as f64).floor();
    // v == 1.0 lands one past the last cell
    (raw.max(0.0) as u32).min(divisions - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grid4() -> Grid {
        Grid::new(4, 4).unwrap()
    }

    #[test]
    fn test_empty_grid_rejected() {
        assert_eq!(
            Grid::new(0, 3).unwrap_err(),
            GridError::Empty {
                columns: 0,
                rows: 3
            }
        );
        assert!(Grid::new(3, 0).is_err());
    }

    #[test]
    fn test_oversized_grid_rejected() {
        assert_eq!(
            Grid::new(u32::MAX, 2).unwrap_err(),
            GridError::TooManyCells {
                columns: u32::MAX,
                rows: 2
            }
        );
        let widest = Grid::new(u32::MAX, 1).unwrap();
        assert_eq!(widest.cell_count(), u32::MAX);

        let json = r#"{"columns": 65536, "rows": 65536}"#;
        assert!(serde_json::from_str::<Grid>(json).is_err());
        let grid: Grid = serde_json::from_str(r#"{"columns": 2, "rows": 3}"#).unwrap();
        assert_eq!(grid.cell_count(), 6);
    }

    #[test]
    fn test_to_cell_examples() {
        let grid = grid4();
        assert_eq!(
            grid.to_cell(Point::new(0.1, 0.1)),
            Cell {
                col: 0,
                row: 0,
                index: 0
            }
        );
        assert_eq!(
            grid.to_cell(Point::new(0.99, 0.99)),
            Cell {
                col: 3,
                row: 3,
                index: 15
            }
        );
        assert_eq!(
            grid.to_cell(Point::new(-0.5, 2.0)),
            Cell {
                col: 0,
                row: 3,
                index: 12
            }
        );
    }

    #[test]
    fn test_upper_edge_maps_to_last_cell() {
        let grid = Grid::new(3, 5).unwrap();
        let cell = grid.to_cell(Point::new(1.0, 1.0));
        assert_eq!((cell.col, cell.row, cell.index), (2, 4, 14));
    }

    #[test]
    fn test_nan_clamps_to_origin() {
        let cell = grid4().to_cell(Point::new(f64::NAN, 0.6));
        assert_eq!((cell.col, cell.row), (0, 2));
    }

    #[test]
    fn test_center_round_trip() {
        let grid = Grid::new(5, 3).unwrap();
        for cell in grid.cells() {
            let center = grid.center_of(cell);
            assert_eq!(grid.to_cell(center), cell);
        }
    }

    #[test]
    fn test_center_of() {
        let grid = grid4();
        let center = grid.center_of(grid.cell_at(5).unwrap());
        assert_eq!(center, Point::new(0.375, 0.375));
    }

    #[test]
    fn test_cell_at() {
        let grid = Grid::new(3, 2).unwrap();
        assert_eq!(
            grid.cell_at(4),
            Some(Cell {
                col: 1,
                row: 1,
                index: 4
            })
        );
        assert_eq!(grid.cell_at(6), None);
        assert_eq!(grid.cells().count(), 6);
    }

    #[test]
    fn test_point_helpers() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(a.lerp(b, 0.5), Point::new(1.5, 2.0));
        assert_eq!(Point::new(1.5, -0.2).clamped(), Point::new(1.0, 0.0));
    }
}
