use crate::constants::mm_to_pt;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Invalid page range: {0}")]
    Range(#[from] RangeParseError),
    #[error("No usable printer found")]
    NoDevice,
    #[error("Content of page {page} is already placed elsewhere")]
    ContentOwnership { page: usize },
    #[error("Print submission failed: {0}")]
    Submission(String),
    #[error("Print submission was cancelled")]
    SubmissionCancelled,
    #[error("Document generation failed: {0}")]
    Generation(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("No pages to lay out")]
    NoPages,
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// A custom page expression that could not be applied.
///
/// Every variant names the token that caused the failure so it can be shown
/// next to the input field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeParseError {
    #[error("page range expression is empty")]
    Empty,
    #[error("'{0}' is not a page number or range")]
    InvalidToken(String),
    #[error("'{0}' ends before it starts")]
    ReversedRange(String),
    #[error("'{token}' is outside the document (1-{page_count})")]
    OutOfBounds { token: String, page_count: usize },
}

/// A device metadata query that failed.
///
/// Never surfaced to callers of the engine: whoever receives it substitutes a
/// fallback value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("capability query failed: {0}")]
pub struct CapabilityQueryError(pub String);

/// Paper orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Orientation {
    /// Portrait: height > width (default for most paper sizes)
    #[default]
    Portrait,
    /// Landscape: width > height
    Landscape,
}

/// Physical paper sizes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PaperSize {
    A3,
    A4,
    A5,
    A6,
    #[default]
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Get base dimensions (always portrait: width < height for standard sizes)
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::A6 => (105.0, 148.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Tabloid => (279.4, 431.8),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }

    /// Sheet size in points with orientation applied
    pub fn size_with_orientation(self, orientation: Orientation) -> Size {
        let (w, h) = self.dimensions_mm();
        let (w, h) = (mm_to_pt(w), mm_to_pt(h));
        match orientation {
            Orientation::Portrait => Size::new(w, h),
            Orientation::Landscape => Size::new(h, w),
        }
    }
}

/// A width/height pair in points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero, negative or not a number.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

/// A point in points, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Copy ordering when printing more than one copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Collation {
    /// 1,2,3 1,2,3
    #[default]
    Collated,
    /// 1,1 2,2 3,3
    Uncollated,
}

/// Two-sided printing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Duplex {
    #[default]
    OneSided,
    /// Bound along the long edge
    LongEdge,
    /// Bound along the short edge
    ShortEdge,
}

impl Duplex {
    pub fn is_two_sided(self) -> bool {
        !matches!(self, Duplex::OneSided)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ColorMode {
    #[default]
    Color,
    Grayscale,
    Monochrome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PrintQuality {
    Draft,
    #[default]
    Normal,
    High,
}

/// Number of logical pages imposed on one physical sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PagesPerSheet {
    #[default]
    One,
    Two,
    Four,
    Six,
    Nine,
    Sixteen,
}

impl PagesPerSheet {
    pub const ALL: [PagesPerSheet; 6] = [
        PagesPerSheet::One,
        PagesPerSheet::Two,
        PagesPerSheet::Four,
        PagesPerSheet::Six,
        PagesPerSheet::Nine,
        PagesPerSheet::Sixteen,
    ];

    pub fn count(self) -> usize {
        match self {
            PagesPerSheet::One => 1,
            PagesPerSheet::Two => 2,
            PagesPerSheet::Four => 4,
            PagesPerSheet::Six => 6,
            PagesPerSheet::Nine => 9,
            PagesPerSheet::Sixteen => 16,
        }
    }

    /// Parse a plain page count, rejecting anything outside {1,2,4,6,9,16}
    pub fn from_count(count: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|pps| pps.count() == count)
    }
}

/// Traversal pattern used to fill the cells of one sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PageOrder {
    /// Left to right, then top to bottom
    #[default]
    Horizontal,
    /// Right to left, then top to bottom
    HorizontalReverse,
    /// Top to bottom, then left to right
    Vertical,
    /// Bottom to top, then left to right
    VerticalReverse,
}

/// Statistics about a laid-out print job
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JobStatistics {
    /// Number of logical pages selected for printing
    pub selected_pages: usize,
    /// Number of imposed sheets in the plan
    pub sheets: usize,
    /// Printed sides per copy (equal to `sheets`)
    pub sides: usize,
    /// Physical sheets of paper for one copy
    pub physical_sheets_per_copy: usize,
    /// Physical sheets of paper for the whole job
    pub physical_sheets: usize,
    /// Unused cells on the final sheet
    pub empty_cells: usize,
}
