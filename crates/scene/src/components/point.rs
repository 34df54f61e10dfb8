#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const YELLOW: Color = Color::rgba(1.0, 1.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum HeightReference {
    /// Position is absolute; terrain is ignored.
    #[default]
    None,
    ClampToGround,
    RelativeToGround,
}

/// Point sprite symbology for one entity.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointGraphics {
    pub color: Color,
    pub pixel_size: f32,
    pub outline_color: Color,
    pub outline_width: f32,
    pub height_reference: HeightReference,
    /// Camera distance below which depth testing is skipped.
    /// `f64::INFINITY` draws the point through terrain at any distance.
    pub disable_depth_test_distance: f64,
}

impl PointGraphics {
    pub fn renders_through_terrain(&self) -> bool {
        self.disable_depth_test_distance == f64::INFINITY
    }
}

impl Default for PointGraphics {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            pixel_size: 1.0,
            outline_color: Color::BLACK,
            outline_width: 0.0,
            height_reference: HeightReference::None,
            disable_depth_test_distance: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PointGraphics;

    #[test]
    fn default_point_is_depth_tested() {
        let p = PointGraphics::default();
        assert!(!p.renders_through_terrain());
        assert_eq!(p.pixel_size, 1.0);
    }

    #[test]
    fn infinite_distance_renders_through_terrain() {
        let p = PointGraphics {
            disable_depth_test_distance: f64::INFINITY,
            ..PointGraphics::default()
        };
        assert!(p.renders_through_terrain());
    }
}
