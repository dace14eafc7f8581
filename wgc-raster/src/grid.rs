use crate::coords::{GeoBounds, GeoPoint, GridBounds, GridPoint};
use crate::error::RasterError;
use crate::projection::UtmProjection;

/// Upper bound on grid allocation; larger requests are configuration
/// errors, not something to attempt.
pub const MAX_GRID_CELLS: usize = 10_000_000;

/// A regular raster grid over a projected envelope.
///
/// Cells are row-major with row 0 at the northern edge and column 0 at the
/// western edge. The envelope is the projected bounding box of the
/// geographic extent, padded east/north so it holds whole cells. Immutable
/// once built; the crossmap and the inverse projector reuse its projection
/// verbatim.
#[derive(Debug, PartialEq, Clone)]
pub struct RasterGrid {
    pub projection: UtmProjection,
    pub envelope: GridBounds,
    pub dx: f64,
    pub dy: f64,
    pub rows: usize,
    pub cols: usize,
}

impl RasterGrid {
    /// Build a grid covering `bounds` with projected cell size (dx, dy) in
    /// meters. Picks the UTM zone of the bounds centroid, reprojects the
    /// corners, and rounds the cell counts up so the envelope is covered by
    /// whole cells.
    pub fn build(bounds: &GeoBounds, dx: f64, dy: f64) -> Result<RasterGrid, RasterError> {
        if !(dx.is_finite() && dy.is_finite()) || dx <= 0.0 || dy <= 0.0 {
            return Err(RasterError::InvalidCellSize { dx, dy });
        }

        let projection = UtmProjection::for_bounds(bounds)?;
        let mut corners = bounds.corners().iter().map(|c| projection.forward(c)).collect::<Result<Vec<GridPoint>, RasterError>>()?;
        let first = corners.pop().unwrap();
        let mut envelope = GridBounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for corner in corners {
            envelope.min_x = envelope.min_x.min(corner.x);
            envelope.min_y = envelope.min_y.min(corner.y);
            envelope.max_x = envelope.max_x.max(corner.x);
            envelope.max_y = envelope.max_y.max(corner.y);
        }

        let cols = (envelope.width() / dx).ceil() as usize;
        let rows = (envelope.height() / dy).ceil() as usize;
        if rows == 0 || cols == 0 {
            return Err(RasterError::InvalidBounds {
                reason: "degenerate projected extent".to_string(),
            });
        }
        let cells = rows
            .checked_mul(cols)
            .ok_or(RasterError::OversizedGrid {
                cells: usize::MAX,
                limit: MAX_GRID_CELLS,
            })?;
        if cells > MAX_GRID_CELLS {
            return Err(RasterError::OversizedGrid {
                cells,
                limit: MAX_GRID_CELLS,
            });
        }

        // Pad east/north to whole cells; the envelope keeps containing the
        // source bounds.
        envelope.max_x = envelope.min_x + cols as f64 * dx;
        envelope.max_y = envelope.min_y + rows as f64 * dy;

        Ok(RasterGrid {
            projection,
            envelope,
            dx,
            dy,
            rows,
            cols,
        })
    }

    /// Total cell count.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major index of a cell.
    pub fn cell_index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Projected center of a cell. Row 0 sits at the northern edge.
    pub fn cell_center(&self, row: usize, col: usize) -> GridPoint {
        GridPoint {
            x: self.envelope.min_x + (col as f64 + 0.5) * self.dx,
            y: self.envelope.max_y - (row as f64 + 0.5) * self.dy,
        }
    }

    /// Projected corners of a cell, counterclockwise from the southwest.
    pub fn cell_corners(&self, row: usize, col: usize) -> [GridPoint; 4] {
        let x0 = self.envelope.min_x + col as f64 * self.dx;
        let x1 = x0 + self.dx;
        let y1 = self.envelope.max_y - row as f64 * self.dy;
        let y0 = y1 - self.dy;
        [
            GridPoint { x: x0, y: y0 },
            GridPoint { x: x1, y: y0 },
            GridPoint { x: x1, y: y1 },
            GridPoint { x: x0, y: y1 },
        ]
    }

    /// Geographic center of a cell, via the grid's own inverse transform.
    pub fn cell_center_geo(&self, row: usize, col: usize) -> GeoPoint {
        self.projection.inverse(&self.cell_center(row, col))
    }
}
