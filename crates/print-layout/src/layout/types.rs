//! Layout data types
//!
//! These types carry the results of imposition planning and sheet
//! composition. Sheet coordinates are in points with the origin at the
//! sheet's top-left corner and y growing downward.

use crate::types::{Point, Size};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position within the cell grid (column, row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridPosition {
    /// Column index (0 = leftmost column)
    pub col: usize,
    /// Row index (0 = top row)
    pub row: usize,
}

impl GridPosition {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

/// Cell grid for one sheet
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridLayout {
    /// Number of columns in the page grid
    pub cols: usize,
    /// Number of rows in the page grid
    pub rows: usize,
    /// Width of each cell in points
    pub cell_width_pt: f32,
    /// Height of each cell in points
    pub cell_height_pt: f32,
}

impl GridLayout {
    /// Total number of cells in the grid
    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    pub fn cell_size(&self) -> Size {
        Size::new(self.cell_width_pt, self.cell_height_pt)
    }
}

/// A rectangular area in points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    /// X position (left edge)
    pub x: f32,
    /// Y position (top edge)
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge x coordinate
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge y coordinate
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Uniform scale followed by a translation: `sheet = content * scale + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform {
    pub scale: f32,
    pub offset: Point,
}

impl Transform {
    /// Map a point from content space to sheet space
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            p.x * self.scale + self.offset.x,
            p.y * self.scale + self.offset.y,
        )
    }
}

/// Final placement of one logical page on a sheet
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    /// 0-based index of the page in its document
    pub page_index: usize,
    /// Cell the page occupies
    pub cell: GridPosition,
    /// Content-to-sheet transform, anchored at the cell's top-left corner
    pub transform: Transform,
    /// Visible part of the content, in content space, starting at the
    /// content's top-left corner. Content beyond it is truncated.
    pub clip: Size,
    /// Intrinsic size of the page content
    pub content_size: Size,
}

impl Placement {
    /// 1-based page number as used in range expressions
    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }

    /// Scale 0 marks content that could not be laid out this pass
    pub fn is_renderable(&self) -> bool {
        self.transform.scale > 0.0
    }

    /// Area the visible content covers on the sheet
    pub fn sheet_rect(&self) -> Rect {
        Rect::new(
            self.transform.offset.x,
            self.transform.offset.y,
            self.clip.width.min(self.content_size.width) * self.transform.scale,
            self.clip.height.min(self.content_size.height) * self.transform.scale,
        )
    }
}

/// One physical sheet side
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sheet {
    /// 0-based position in the plan
    pub index: usize,
    /// Physical sheet size in points
    pub size: Size,
    pub placements: Vec<Placement>,
}

/// Cells assigned to one sheet by the imposition planner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetAssignment {
    pub sheet_index: usize,
    /// (0-based page index, cell) in fill order
    pub cells: Vec<(usize, GridPosition)>,
}

/// Scale a plan was built with
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResolvedScale {
    /// One factor shared by every placement
    Uniform(f32),
    /// Auto-fit resolved separately for each placement's content
    PerCell,
}

/// Render-ready output of the layout engine for one settings snapshot
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SheetPlan {
    pub sheets: Vec<Sheet>,
    /// Physical sheet size shared by every sheet
    pub sheet_size: Size,
    pub grid: GridLayout,
    /// Resolved margin in points
    pub margin: f32,
    pub scale: ResolvedScale,
}

impl SheetPlan {
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Total number of placed pages
    pub fn placement_count(&self) -> usize {
        self.sheets.iter().map(|s| s.placements.len()).sum()
    }

    /// Index of the sheet holding the given 1-based page number
    pub fn sheet_for_page(&self, page_number: usize) -> Option<usize> {
        self.sheets.iter().position(|sheet| {
            sheet
                .placements
                .iter()
                .any(|p| p.page_number() == page_number)
        })
    }
}
