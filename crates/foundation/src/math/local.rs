use super::{Geodetic, Vec3};

/// East-North-Up axes at a point on the globe, expressed in ECEF.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EnuFrame {
    pub origin: Vec3,
    pub east: Vec3,
    pub north: Vec3,
    pub up: Vec3,
}

impl EnuFrame {
    pub fn at(origin: Geodetic) -> Self {
        let up = origin.surface_normal();
        let (sin_lon, cos_lon) = origin.lon_rad.sin_cos();
        let east = Vec3::new(-sin_lon, cos_lon, 0.0);
        Self {
            origin: origin.to_ecef(),
            east,
            north: up.cross(east),
            up,
        }
    }

    pub fn to_world(&self, east: f64, north: f64, up: f64) -> Vec3 {
        self.origin + self.east.scale(east) + self.north.scale(north) + self.up.scale(up)
    }

    /// `[east, north, up]` meters from the origin.
    pub fn to_local(&self, world: Vec3) -> [f64; 3] {
        let d = world - self.origin;
        [d.dot(self.east), d.dot(self.north), d.dot(self.up)]
    }
}

#[cfg(test)]
mod tests {
    use super::EnuFrame;
    use crate::math::Geodetic;

    fn close(a: f64, b: f64) {
        assert!((a - b).abs() <= 1e-6, "{a} vs {b}");
    }

    #[test]
    fn offsets_survive_world_and_back() {
        let frame = EnuFrame::at(Geodetic::from_degrees(133.53, 33.56, 5.0));
        let [e, n, u] = frame.to_local(frame.to_world(120.0, -45.0, 8.0));
        close(e, 120.0);
        close(n, -45.0);
        close(u, 8.0);
    }

    #[test]
    fn north_points_toward_higher_latitude() {
        let origin = Geodetic::from_degrees(139.69, 35.68, 0.0);
        let frame = EnuFrame::at(origin);
        let [e, n, _] = frame.to_local(Geodetic::from_degrees(139.69, 35.69, 0.0).to_ecef());
        assert!(n > 1000.0, "{n}");
        assert!(e.abs() < 1.0, "{e}");
        close(frame.east.cross(frame.north).dot(frame.up), 1.0);
    }
}
