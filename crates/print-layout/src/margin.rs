//! Effective margin resolution

use crate::capabilities::CapabilityProvider;
use crate::settings::MarginPolicy;
use crate::types::{Orientation, PaperSize};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Resolve a margin policy to a margin in points.
///
/// `DeviceMinimum` takes the largest of the four edge insets of the device's
/// imageable area. When there is no provider, or the query fails or panics,
/// the margin is 0: the preview must never block on device errors.
///
/// Custom values are used as given apart from flooring at zero; clamping to
/// the sheet is the input surface's job (see `clamp_custom_margin`).
pub fn resolve_margin(
    policy: MarginPolicy,
    document_margin: f32,
    paper: PaperSize,
    orientation: Orientation,
    provider: Option<&dyn CapabilityProvider>,
) -> f32 {
    let margin = match policy {
        MarginPolicy::DocumentDefault => document_margin,
        MarginPolicy::None => 0.0,
        MarginPolicy::Custom(value) => value,
        MarginPolicy::DeviceMinimum => match provider {
            Some(provider) => device_minimum_margin(provider, paper, orientation),
            None => {
                log::debug!("No capability provider, device minimum margin is 0");
                0.0
            }
        },
    };

    if margin.is_finite() { margin.max(0.0) } else { 0.0 }
}

fn device_minimum_margin(
    provider: &dyn CapabilityProvider,
    paper: PaperSize,
    orientation: Orientation,
) -> f32 {
    let query = catch_unwind(AssertUnwindSafe(|| {
        provider.imageable_area(paper, orientation)
    }));

    match query {
        Ok(Ok(area)) => {
            let sheet = paper.size_with_orientation(orientation);
            let (left, top, right, bottom) = area.insets(sheet);
            left.max(top).max(right).max(bottom)
        }
        Ok(Err(e)) => {
            log::warn!("Falling back to zero margin: {}", e);
            0.0
        }
        Err(_) => {
            log::warn!("Falling back to zero margin: imageable area query panicked");
            0.0
        }
    }
}
