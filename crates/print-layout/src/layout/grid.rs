//! Grid layout calculation
//!
//! This module handles the geometric layout of the cell grid on a sheet:
//! the N-up arrangement table, cell dimensions and the traversal orders used
//! to fill the cells.

use crate::types::{Orientation, PageOrder, PagesPerSheet, Point, Size};

use super::{GridLayout, GridPosition, Rect};

// =============================================================================
// Arrangement
// =============================================================================

/// Columns × rows for an N-up arrangement.
///
/// The table is defined for portrait sheets; landscape swaps columns and
/// rows so the cells keep roughly the same shape.
pub fn arrangement(pages_per_sheet: PagesPerSheet, orientation: Orientation) -> (usize, usize) {
    let (cols, rows) = match pages_per_sheet {
        PagesPerSheet::One => (1, 1),
        PagesPerSheet::Two => (1, 2),
        PagesPerSheet::Four => (2, 2),
        PagesPerSheet::Six => (2, 3),
        PagesPerSheet::Nine => (3, 3),
        PagesPerSheet::Sixteen => (4, 4),
    };

    match orientation {
        Orientation::Portrait => (cols, rows),
        Orientation::Landscape => (rows, cols),
    }
}

// =============================================================================
// Grid Creation
// =============================================================================

/// Create the cell grid for a sheet.
///
/// The margin is taken off every edge of the sheet, and what remains is split
/// evenly into cells. A margin too large for the sheet leaves zero-sized cells.
///
/// # Arguments
/// * `pages_per_sheet` - N-up count
/// * `orientation` - Sheet orientation (swaps columns and rows)
/// * `sheet` - Sheet size in points, orientation already applied
/// * `margin` - Resolved margin in points
pub fn create_grid_layout(
    pages_per_sheet: PagesPerSheet,
    orientation: Orientation,
    sheet: Size,
    margin: f32,
) -> GridLayout {
    let (cols, rows) = arrangement(pages_per_sheet, orientation);
    let printable = printable_area(sheet, margin);

    GridLayout {
        cols,
        rows,
        cell_width_pt: printable.width / cols as f32,
        cell_height_pt: printable.height / rows as f32,
    }
}

/// The sheet minus its margin on every side
pub fn printable_area(sheet: Size, margin: f32) -> Rect {
    Rect::new(
        margin,
        margin,
        (sheet.width - 2.0 * margin).max(0.0),
        (sheet.height - 2.0 * margin).max(0.0),
    )
}

// =============================================================================
// Cell Calculations
// =============================================================================

/// Top-left corner of a cell on the sheet.
pub fn cell_origin(grid: &GridLayout, pos: GridPosition, margin: f32) -> Point {
    Point::new(
        margin + pos.col as f32 * grid.cell_width_pt,
        margin + pos.row as f32 * grid.cell_height_pt,
    )
}

/// Bounds of a cell on the sheet.
pub fn cell_bounds(grid: &GridLayout, pos: GridPosition, margin: f32) -> Rect {
    let origin = cell_origin(grid, pos, margin);
    Rect::new(origin.x, origin.y, grid.cell_width_pt, grid.cell_height_pt)
}

// =============================================================================
// Traversal
// =============================================================================

/// Cell for the `position`-th page (0-based) placed on a sheet.
///
/// `position` must be below `cols * rows`.
pub fn cell_position(order: PageOrder, position: usize, cols: usize, rows: usize) -> GridPosition {
    match order {
        PageOrder::Horizontal => GridPosition::new(position % cols, position / cols),
        PageOrder::HorizontalReverse => {
            GridPosition::new(cols - 1 - (position % cols), position / cols)
        }
        PageOrder::Vertical => GridPosition::new(position / rows, position % rows),
        PageOrder::VerticalReverse => {
            GridPosition::new(position / rows, rows - 1 - (position % rows))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
