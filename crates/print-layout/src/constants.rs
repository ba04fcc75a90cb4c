//! Shared constants for print layout
//!
//! This module centralizes magic numbers and constants used throughout
//! the layout engine.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f32 = 72.0 / 25.4; // ≈ 2.83465

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Convert points to millimeters
#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / POINTS_PER_MM
}

// =============================================================================
// Default Page Dimensions
// =============================================================================

/// Default page width in points (US Letter: 8.5" × 11")
pub const DEFAULT_PAGE_WIDTH_PT: f32 = 612.0;

/// Default page height in points (US Letter)
pub const DEFAULT_PAGE_HEIGHT_PT: f32 = 792.0;

/// Default page dimensions as tuple (width, height)
pub const DEFAULT_PAGE_DIMENSIONS: (f32, f32) = (DEFAULT_PAGE_WIDTH_PT, DEFAULT_PAGE_HEIGHT_PT);

// =============================================================================
// Margins
// =============================================================================

/// Gap kept between a clamped custom margin and half the sheet's short side
pub const MARGIN_EPSILON: f32 = 0.01;

// =============================================================================
// Preview Viewport
// =============================================================================

/// Smallest zoom factor the preview accepts
pub const MIN_ZOOM: f32 = 0.05;

/// Multiplier applied by a single zoom-in / zoom-out step
pub const ZOOM_STEP: f32 = 1.25;

/// Gap between sheets in the preview, in unscaled preview units
pub const SHEET_GAP: f32 = 16.0;
