use foundation::math::{EnuFrame, Vec2, Vec3};
use scene::camera::CameraView;
use scene::picking::Ray;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Pinhole camera in ECEF.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f64,
    pub near: f64,
    pub viewport: Viewport,
}

pub const DEFAULT_FOV_Y_RAD: f64 = std::f64::consts::FRAC_PI_3;

impl Camera3D {
    /// Place the camera at a view's destination, oriented by heading and pitch
    /// in the local east-north-up frame.
    pub fn from_view(view: CameraView, viewport: Viewport) -> Self {
        let frame = EnuFrame::at(view.destination.geodetic());
        let (sh, ch) = view.orientation.heading.sin_cos();
        let (sp, cp) = view.orientation.pitch.sin_cos();
        let horizontal = frame.east.scale(sh) + frame.north.scale(ch);

        let forward = horizontal.scale(cp) + frame.up.scale(sp);
        let up = horizontal.scale(-sp) + frame.up.scale(cp);

        Self {
            position: frame.origin,
            forward,
            up,
            fov_y_rad: DEFAULT_FOV_Y_RAD,
            near: 1.0,
            viewport,
        }
    }

    fn right(&self) -> Vec3 {
        self.forward.cross(self.up)
    }

    /// Angle subtended by one pixel row.
    pub fn radians_per_pixel(&self) -> f64 {
        self.fov_y_rad / self.viewport.height
    }

    /// Ray through a screen position (pixels, origin top-left).
    pub fn make_ray(&self, x_px: f64, y_px: f64) -> Option<Ray> {
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return None;
        }
        let ndc_x = 2.0 * x_px / self.viewport.width - 1.0;
        let ndc_y = 1.0 - 2.0 * y_px / self.viewport.height;
        let t = (self.fov_y_rad * 0.5).tan();

        let dir = self.forward
            + self.right().scale(ndc_x * t * self.viewport.aspect())
            + self.up.scale(ndc_y * t);
        Some(Ray::new(self.position, dir.normalized()?))
    }

    /// Screen position of a world point, or `None` behind the near plane.
    pub fn project(&self, world: Vec3) -> Option<Vec2> {
        let v = world - self.position;
        let z = v.dot(self.forward);
        if z <= self.near {
            return None;
        }
        let t = (self.fov_y_rad * 0.5).tan();
        let ndc_x = v.dot(self.right()) / (z * t * self.viewport.aspect());
        let ndc_y = v.dot(self.up) / (z * t);
        Some(Vec2::new(
            (ndc_x + 1.0) * 0.5 * self.viewport.width,
            (1.0 - ndc_y) * 0.5 * self.viewport.height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{Camera3D, Viewport};
    use foundation::math::Geodetic;
    use scene::camera::{CameraDestination, CameraView};

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "expected {a} ~= {b}");
    }

    fn top_down() -> Camera3D {
        let dest = CameraDestination::new(133.5, 33.5, 10_000.0).expect("dest");
        Camera3D::from_view(CameraView::top_down(dest), Viewport::new(800.0, 600.0))
    }

    #[test]
    fn top_down_camera_looks_at_the_ground_below() {
        let cam = top_down();
        let ground = Geodetic::from_degrees(133.5, 33.5, 0.0).to_ecef();
        let screen = cam.project(ground).expect("visible");
        assert_close(screen.x, 400.0, 1e-6);
        assert_close(screen.y, 300.0, 1e-6);
    }

    #[test]
    fn north_is_up_on_screen() {
        let cam = top_down();
        let north = Geodetic::from_degrees(133.5, 33.51, 0.0).to_ecef();
        let screen = cam.project(north).expect("visible");
        assert!(screen.y < 300.0);
    }

    #[test]
    fn ray_through_projection_hits_the_point() {
        let cam = top_down();
        let p = Geodetic::from_degrees(133.51, 33.49, 0.0).to_ecef();
        let s = cam.project(p).expect("visible");
        let ray = cam.make_ray(s.x, s.y).expect("ray");
        let to_p = (p - ray.origin).normalized().expect("dir");
        assert_close(to_p.dot(ray.dir), 1.0, 1e-9);
    }
}
