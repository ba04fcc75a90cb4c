//! Layout calculation modules
//!
//! This module handles all the geometric calculations for N-up printing:
//! - Grid layout (arrangement table, cell dimensions, fill orders)
//! - Imposition planning (which page goes on which sheet and cell)
//! - Content placement (margins, scaling, clipping)

mod grid;
mod placement;
mod planner;
mod types;

pub use grid::*;
pub use placement::*;
pub use planner::*;
pub use types::*;
