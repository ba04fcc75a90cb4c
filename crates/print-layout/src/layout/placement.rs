//! Content placement within cells
//!
//! This module computes, for every page assigned to a sheet, the transform
//! that scales its content about the cell's top-left corner and moves it into
//! place, plus the clip that keeps oversized content out of neighbouring
//! cells.

use crate::scale::resolve_scale;
use crate::settings::ScalePolicy;
use crate::types::{Point, Size};

use super::{
    GridLayout, GridPosition, Placement, ResolvedScale, Sheet, SheetAssignment, Transform,
    cell_origin, printable_area,
};

/// Everything the composer needs besides the assignment itself
#[derive(Debug, Clone, Copy)]
pub struct CompositionParams<'a> {
    pub grid: &'a GridLayout,
    pub sheet_size: Size,
    pub margin: f32,
    pub policy: ScalePolicy,
    pub scale: ResolvedScale,
    /// Intrinsic size of every page in the document, by 0-based index
    pub page_sizes: &'a [Size],
}

/// Place one cell's content.
///
/// Scale 0 yields an empty clip; such a placement is kept so the page keeps
/// its cell but is skipped when rendering.
pub fn place_page(
    page_index: usize,
    cell: GridPosition,
    origin: Point,
    cell_size: Size,
    content_size: Size,
    scale: f32,
) -> Placement {
    let clip = if scale > 0.0 {
        Size::new(cell_size.width / scale, cell_size.height / scale)
    } else {
        Size::ZERO
    };

    Placement {
        page_index,
        cell,
        transform: Transform {
            scale,
            offset: origin,
        },
        clip,
        content_size,
    }
}

/// Compose a sheet from its cell assignment.
pub fn compose_sheet(assignment: &SheetAssignment, params: &CompositionParams<'_>) -> Sheet {
    let placements = if params.grid.cell_count() == 1 {
        compose_single(assignment, params)
    } else {
        compose_grid(assignment, params)
    };

    Sheet {
        index: assignment.sheet_index,
        size: params.sheet_size,
        placements,
    }
}

/// One page per sheet: the margin applies straight to the content's box,
/// with the plan-wide scale so preview and print agree.
fn compose_single(assignment: &SheetAssignment, params: &CompositionParams<'_>) -> Vec<Placement> {
    let area = printable_area(params.sheet_size, params.margin);

    assignment
        .cells
        .iter()
        .map(|&(page_index, cell)| {
            let content = content_size(params.page_sizes, page_index);
            let scale = placement_scale(params, content, area.size());
            place_page(page_index, cell, area.origin(), area.size(), content, scale)
        })
        .collect()
}

fn compose_grid(assignment: &SheetAssignment, params: &CompositionParams<'_>) -> Vec<Placement> {
    let cell_size = params.grid.cell_size();

    assignment
        .cells
        .iter()
        .map(|&(page_index, cell)| {
            let content = content_size(params.page_sizes, page_index);
            let scale = placement_scale(params, content, cell_size);
            let origin = cell_origin(params.grid, cell, params.margin);
            place_page(page_index, cell, origin, cell_size, content, scale)
        })
        .collect()
}

fn placement_scale(params: &CompositionParams<'_>, content: Size, target: Size) -> f32 {
    match params.scale {
        ResolvedScale::Uniform(_) if content.is_degenerate() => 0.0,
        ResolvedScale::Uniform(factor) => factor,
        ResolvedScale::PerCell => resolve_scale(params.policy, content, target),
    }
}

fn content_size(page_sizes: &[Size], page_index: usize) -> Size {
    page_sizes.get(page_index).copied().unwrap_or(Size::ZERO)
}
