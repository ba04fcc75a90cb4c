//! Preview viewport model
//!
//! Sheets are laid out for display in rows of `column_count` sheets, every
//! slot the size of one scaled sheet plus `SHEET_GAP`. The model only keeps
//! zoom and scroll state; it indexes into the published plan rather than
//! holding sheets of its own.

use crate::constants::{MIN_ZOOM, SHEET_GAP, ZOOM_STEP};
use crate::layout::SheetPlan;
use crate::types::{Point, Size};
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the zoom value reacts to canvas size changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ZoomMode {
    /// Zoom stays where the user put it
    #[default]
    Custom,
    /// A row of sheets fills the canvas width
    FitWidth,
    /// One sheet fills the canvas height
    FitHeight,
    /// One sheet fits entirely
    FitPage,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ViewportState {
    /// Display units per point, never below `MIN_ZOOM`
    pub zoom_value: f32,
    pub zoom_mode: ZoomMode,
    /// Sheets per display row, at least 1
    pub column_count: usize,
    /// Scroll position requested by `scroll_to_page`, not yet applied
    pub pending_scroll_target: Option<Point>,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom_value: 1.0,
            zoom_mode: ZoomMode::Custom,
            column_count: 1,
            pending_scroll_target: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreviewViewportModel {
    state: ViewportState,
    canvas: Size,
}

impl PreviewViewportModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn zoom(&self) -> f32 {
        self.state.zoom_value
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    /// Set an explicit zoom, leaving any fit mode. Non-finite values are
    /// ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if !zoom.is_finite() {
            return;
        }
        self.state.zoom_mode = ZoomMode::Custom;
        self.state.zoom_value = zoom.max(MIN_ZOOM);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.state.zoom_value * ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.state.zoom_value / ZOOM_STEP);
    }

    /// Switch zoom mode, recomputing the zoom for fit modes
    pub fn set_mode(&mut self, mode: ZoomMode, sheet_size: Size) {
        self.state.zoom_mode = mode;
        self.refit(sheet_size);
    }

    pub fn set_column_count(&mut self, columns: usize, sheet_size: Size) {
        self.state.column_count = columns.max(1);
        self.refit(sheet_size);
    }

    /// Record a new canvas size. Fit modes follow it.
    pub fn resize_canvas(&mut self, canvas: Size, sheet_size: Size) {
        self.canvas = canvas;
        self.refit(sheet_size);
    }

    /// Recompute the zoom for the current fit mode. Custom zoom is left
    /// alone, as is every mode while the canvas or sheet is degenerate.
    pub fn refit(&mut self, sheet_size: Size) {
        if self.canvas.is_degenerate() || sheet_size.is_degenerate() {
            return;
        }

        let columns = self.state.column_count as f32;
        let fit_width =
            (self.canvas.width - SHEET_GAP * (columns + 1.0)) / (columns * sheet_size.width);
        let fit_height = (self.canvas.height - SHEET_GAP * 2.0) / sheet_size.height;

        let zoom = match self.state.zoom_mode {
            ZoomMode::Custom => return,
            ZoomMode::FitWidth => fit_width,
            ZoomMode::FitHeight => fit_height,
            ZoomMode::FitPage => fit_width.min(fit_height),
        };
        self.state.zoom_value = zoom.max(MIN_ZOOM);
    }

    fn pitch(&self, sheet_size: Size) -> (f32, f32) {
        let zoom = self.state.zoom_value;
        (
            sheet_size.width * zoom + SHEET_GAP,
            sheet_size.height * zoom + SHEET_GAP,
        )
    }

    /// Top-left corner of a sheet in display units
    pub fn sheet_origin(&self, sheet_index: usize, plan: &SheetPlan) -> Point {
        let columns = self.state.column_count;
        let (pitch_x, pitch_y) = self.pitch(plan.sheet_size);
        Point::new(
            SHEET_GAP + (sheet_index % columns) as f32 * pitch_x,
            SHEET_GAP + (sheet_index / columns) as f32 * pitch_y,
        )
    }

    /// Total scrollable size of the plan in display units
    pub fn content_extent(&self, plan: &SheetPlan) -> Size {
        let sheets = plan.sheet_count();
        if sheets == 0 {
            return Size::ZERO;
        }
        let columns = self.state.column_count.min(sheets);
        let rows = sheets.div_ceil(self.state.column_count);
        let (pitch_x, pitch_y) = self.pitch(plan.sheet_size);
        Size::new(
            SHEET_GAP + columns as f32 * pitch_x,
            SHEET_GAP + rows as f32 * pitch_y,
        )
    }

    /// Indices of the sheets intersecting the vertical window
    /// `[scroll_y, scroll_y + viewport_height)`.
    pub fn visible_range(&self, scroll_y: f32, viewport_height: f32, plan: &SheetPlan) -> Range<usize> {
        let sheets = plan.sheet_count();
        if sheets == 0 || viewport_height <= 0.0 {
            return 0..0;
        }

        let columns = self.state.column_count;
        let (_, pitch_y) = self.pitch(plan.sheet_size);
        let row_height = pitch_y - SHEET_GAP;
        let top = scroll_y.max(0.0) - SHEET_GAP;
        let bottom = scroll_y.max(0.0) + viewport_height - SHEET_GAP;

        // A row spans [row * pitch, row * pitch + row_height) relative to the first
        let rows = sheets.div_ceil(columns);
        let first_row = ((top - row_height) / pitch_y).floor() + 1.0;
        let first_row = (first_row.max(0.0) as usize).min(rows);
        let last_row = ((bottom / pitch_y).ceil().max(0.0) as usize).min(rows);

        let start = (first_row * columns).min(sheets);
        let end = (last_row * columns).min(sheets);
        start..end.max(start)
    }

    /// Queue a scroll to the sheet showing `page_number` (1-based).
    ///
    /// Returns the target, or `None` when the page is not in the plan.
    pub fn scroll_to_page(&mut self, page_number: usize, plan: &SheetPlan) -> Option<Point> {
        let sheet = plan.sheet_for_page(page_number)?;
        let target = self.sheet_origin(sheet, plan);
        self.state.pending_scroll_target = Some(target);
        Some(target)
    }

    /// Consume the queued scroll target
    pub fn take_pending_scroll(&mut self) -> Option<Point> {
        self.state.pending_scroll_target.take()
    }
}
