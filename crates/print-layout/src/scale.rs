//! Effective scale resolution

use crate::settings::ScalePolicy;
use crate::types::Size;

/// Resolve a scale policy to a uniform linear scale factor.
///
/// Returns 0 when the content or the cell is degenerate (or a percentage is
/// not positive); callers treat 0 as "not renderable this pass".
pub fn resolve_scale(policy: ScalePolicy, content: Size, cell: Size) -> f32 {
    let factor = match policy {
        ScalePolicy::AutoFit => {
            if content.is_degenerate() || cell.is_degenerate() {
                return 0.0;
            }
            let scale_w = cell.width / content.width;
            let scale_h = cell.height / content.height;
            scale_w.min(scale_h)
        }
        ScalePolicy::FixedPercent(percent) => percent as f32 / 100.0,
        ScalePolicy::Custom(percent) => percent / 100.0,
    };

    if content.is_degenerate() || !factor.is_finite() || factor <= 0.0 {
        0.0
    } else {
        factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_fit() {
        // Width-limited
        let scale = resolve_scale(
            ScalePolicy::AutoFit,
            Size::new(200.0, 100.0),
            Size::new(100.0, 100.0),
        );
        assert!((scale - 0.5).abs() < 0.001);

        // Height-limited, upscaling allowed
        let scale = resolve_scale(
            ScalePolicy::AutoFit,
            Size::new(50.0, 100.0),
            Size::new(400.0, 300.0),
        );
        assert!((scale - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_percentages() {
        let content = Size::new(612.0, 792.0);
        let cell = Size::new(100.0, 100.0);
        assert!((resolve_scale(ScalePolicy::FixedPercent(50), content, cell) - 0.5).abs() < 0.001);
        assert!((resolve_scale(ScalePolicy::Custom(125.0), content, cell) - 1.25).abs() < 0.001);
    }

    #[test]
    fn test_degenerate_content() {
        let cell = Size::new(100.0, 100.0);
        assert_eq!(resolve_scale(ScalePolicy::AutoFit, Size::ZERO, cell), 0.0);
        assert_eq!(
            resolve_scale(ScalePolicy::FixedPercent(100), Size::new(0.0, 10.0), cell),
            0.0
        );
        assert_eq!(
            resolve_scale(ScalePolicy::AutoFit, Size::new(10.0, 10.0), Size::new(-1.0, 5.0)),
            0.0
        );
        assert_eq!(
            resolve_scale(ScalePolicy::Custom(-20.0), Size::new(10.0, 10.0), cell),
            0.0
        );
    }
}
