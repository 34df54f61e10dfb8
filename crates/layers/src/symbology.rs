use scene::components::{Color, HeightReference, PointGraphics};

pub const OVERLAY_POINT_COLOR: Color = Color::YELLOW;
pub const OVERLAY_POINT_PIXEL_SIZE: f32 = 18.0;
pub const OVERLAY_OUTLINE_COLOR: Color = Color::BLACK;
pub const OVERLAY_OUTLINE_WIDTH: f32 = 2.0;

/// Fixed point style applied to every overlay entity.
///
/// Depth testing is disabled at every distance so points stay visible
/// through terrain.
pub fn overlay_point_style() -> PointGraphics {
    PointGraphics {
        color: OVERLAY_POINT_COLOR,
        pixel_size: OVERLAY_POINT_PIXEL_SIZE,
        outline_color: OVERLAY_OUTLINE_COLOR,
        outline_width: OVERLAY_OUTLINE_WIDTH,
        height_reference: HeightReference::None,
        disable_depth_test_distance: f64::INFINITY,
    }
}
