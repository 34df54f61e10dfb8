use super::Vec3;

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 semi-minor axis (meters).
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
/// First eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// A point on or above the WGS84 ellipsoid: radians, plus meters of height.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Geodetic {
    pub lat_rad: f64,
    pub lon_rad: f64,
    pub alt_m: f64,
}

impl Geodetic {
    pub fn new(lat_rad: f64, lon_rad: f64, alt_m: f64) -> Self {
        Self {
            lat_rad,
            lon_rad,
            alt_m,
        }
    }

    /// Degrees in GeoJSON order: longitude first.
    pub fn from_degrees(lon_deg: f64, lat_deg: f64, alt_m: f64) -> Self {
        Self::new(lat_deg.to_radians(), lon_deg.to_radians(), alt_m)
    }

    pub fn lon_deg(&self) -> f64 {
        self.lon_rad.to_degrees()
    }

    pub fn lat_deg(&self) -> f64 {
        self.lat_rad.to_degrees()
    }

    /// Same horizontal position at another height.
    pub fn with_height(self, alt_m: f64) -> Self {
        Self { alt_m, ..self }
    }

    /// Unit ellipsoid normal, pointing away from the earth.
    pub fn surface_normal(&self) -> Vec3 {
        let (sin_lat, cos_lat) = self.lat_rad.sin_cos();
        let (sin_lon, cos_lon) = self.lon_rad.sin_cos();
        Vec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
    }

    /// Earth-centered, earth-fixed position in meters.
    pub fn to_ecef(&self) -> Vec3 {
        let normal = self.surface_normal();
        let sin_lat = normal.z;
        // Prime vertical radius of curvature.
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let horizontal = n + self.alt_m;
        Vec3::new(
            horizontal * normal.x,
            horizontal * normal.y,
            (n * (1.0 - WGS84_E2) + self.alt_m) * sin_lat,
        )
    }
}
