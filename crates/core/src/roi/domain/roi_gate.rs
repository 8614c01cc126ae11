//! Decides per frame whether detection may run, and where.
use crate::roi::domain::roi_config::RoiConfig;
use crate::shared::geometry::PixelRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoiDecision {
    /// No ROI configured. Detection is paused.
    Disabled,
    /// ROI present but empty once mapped onto this frame. Detection is paused.
    Invalid,
    /// Detection runs on this full-frame pixel rectangle only.
    Active(PixelRect),
}

impl RoiDecision {
    pub fn is_active(&self) -> bool {
        matches!(self, RoiDecision::Active(_))
    }

    /// Overlay text for frames where detection is paused.
    pub fn status_text(&self) -> Option<&'static str> {
        match self {
            RoiDecision::Disabled => Some("ROI not configured"),
            RoiDecision::Invalid => Some("Invalid ROI configuration"),
            RoiDecision::Active(_) => None,
        }
    }
}

/// Maps a percentage ROI onto a `frame_width` × `frame_height` frame.
///
/// Pixel edges are truncated toward zero and clamped to the frame before the
/// `start < end` check.
pub fn evaluate(roi: Option<&RoiConfig>, frame_width: u32, frame_height: u32) -> RoiDecision {
    let Some(roi) = roi else {
        return RoiDecision::Disabled;
    };

    let x1 = to_pixel(roi.x_start_percent, frame_width);
    let x2 = to_pixel(roi.x_end_percent, frame_width);
    let y1 = to_pixel(roi.y_start_percent, frame_height);
    let y2 = to_pixel(roi.y_end_percent, frame_height);

    match PixelRect::from_corners(x1, y1, x2, y2) {
        Some(rect) => RoiDecision::Active(rect),
        None => RoiDecision::Invalid,
    }
}

fn to_pixel(percent: f64, extent: u32) -> u32 {
    let px = (extent as f64 * percent / 100.0).trunc();
    if px.is_nan() {
        return 0;
    }
    px.clamp(0.0, extent as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_absent_roi_is_disabled() {
        assert_eq!(evaluate(None, 640, 480), RoiDecision::Disabled);
        assert_eq!(
            RoiDecision::Disabled.status_text(),
            Some("ROI not configured")
        );
    }

    #[test]
    fn test_valid_roi_maps_to_pixels() {
        let roi = RoiConfig::new(25.0, 75.0, 10.0, 90.0);
        let decision = evaluate(Some(&roi), 640, 480);
        assert_eq!(
            decision,
            RoiDecision::Active(PixelRect {
                x: 160,
                y: 48,
                width: 320,
                height: 384,
            })
        );
        assert!(decision.is_active());
        assert!(decision.status_text().is_none());
    }

    #[test]
    fn test_pixels_are_truncated() {
        // 33.3% of 100 = 33.3 -> 33, 66.6% -> 66
        let roi = RoiConfig::new(33.3, 66.6, 0.0, 100.0);
        match evaluate(Some(&roi), 100, 100) {
            RoiDecision::Active(rect) => {
                assert_eq!(rect.x, 33);
                assert_eq!(rect.x_end(), 66);
            }
            other => panic!("expected active roi, got {other:?}"),
        }
    }

    #[rstest]
    #[case::reversed_x(80.0, 20.0, 0.0, 100.0)]
    #[case::reversed_y(0.0, 100.0, 90.0, 10.0)]
    #[case::zero_width(50.0, 50.0, 0.0, 100.0)]
    #[case::collapses_after_truncation(10.1, 10.9, 0.0, 100.0)]
    #[case::entirely_outside(120.0, 150.0, 0.0, 100.0)]
    fn test_degenerate_roi_is_invalid(
        #[case] x1: f64,
        #[case] x2: f64,
        #[case] y1: f64,
        #[case] y2: f64,
    ) {
        let roi = RoiConfig::new(x1, x2, y1, y2);
        let decision = evaluate(Some(&roi), 100, 100);
        assert_eq!(decision, RoiDecision::Invalid);
        assert_eq!(decision.status_text(), Some("Invalid ROI configuration"));
    }

    #[test]
    fn test_out_of_range_percentages_are_clamped() {
        let roi = RoiConfig::new(-20.0, 150.0, 0.0, 100.0);
        match evaluate(Some(&roi), 200, 100) {
            RoiDecision::Active(rect) => {
                assert_eq!(rect.x, 0);
                assert_eq!(rect.width, 200);
            }
            other => panic!("expected active roi, got {other:?}"),
        }
    }

    #[test]
    fn test_same_roi_depends_on_frame_size() {
        let roi = RoiConfig::new(0.0, 1.0, 0.0, 100.0);
        assert_eq!(evaluate(Some(&roi), 50, 100), RoiDecision::Invalid);
        assert!(evaluate(Some(&roi), 1920, 100).is_active());
    }
}
