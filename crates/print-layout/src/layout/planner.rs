//! Imposition planning
//!
//! Splits the selected pages into sheets and assigns each a cell. Sheets
//! always follow the selection order; the page order only decides how cells
//! are filled within one sheet.

use crate::types::{Orientation, PageOrder, PagesPerSheet};

use super::{SheetAssignment, arrangement, cell_position};

/// Assign selected pages to sheets and cells.
///
/// # Arguments
/// * `selected` - 0-based page indices in ascending order
/// * `pages_per_sheet` - N-up count
/// * `order` - Fill order within a sheet
/// * `orientation` - Sheet orientation (swaps the arrangement)
pub fn plan_sheets(
    selected: &[usize],
    pages_per_sheet: PagesPerSheet,
    order: PageOrder,
    orientation: Orientation,
) -> Vec<SheetAssignment> {
    let (cols, rows) = arrangement(pages_per_sheet, orientation);

    selected
        .chunks(pages_per_sheet.count())
        .enumerate()
        .map(|(sheet_index, pages)| SheetAssignment {
            sheet_index,
            cells: pages
                .iter()
                .enumerate()
                .map(|(position, &page)| (page, cell_position(order, position, cols, rows)))
                .collect(),
        })
        .collect()
}

/// Number of sheets needed for `selected_pages` pages
pub fn sheet_count(selected_pages: usize, pages_per_sheet: PagesPerSheet) -> usize {
    selected_pages.div_ceil(pages_per_sheet.count())
}
