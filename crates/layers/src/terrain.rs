use foundation::math::{Geodetic, WGS84_A, WGS84_B};

/// Terrain provider assigned to the scene's terrain slot.
///
/// Only the ellipsoid is modelled: the scene never waits on a network terrain
/// service, so surface heights are always zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TerrainProvider {
    #[default]
    Ellipsoid,
}

impl TerrainProvider {
    pub fn fallback() -> Self {
        Self::Ellipsoid
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ellipsoid => "ellipsoid",
        }
    }

    /// Ellipsoid radii (x, y, z) in meters.
    pub fn radii(&self) -> [f64; 3] {
        match self {
            Self::Ellipsoid => [WGS84_A, WGS84_A, WGS84_B],
        }
    }

    /// Height of the ground surface above the ellipsoid at `at`.
    pub fn surface_height(&self, _at: Geodetic) -> f64 {
        match self {
            Self::Ellipsoid => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TerrainProvider;
    use foundation::math::Geodetic;

    #[test]
    fn ellipsoid_surface_is_flat() {
        let t = TerrainProvider::fallback();
        assert_eq!(t.surface_height(Geodetic::from_degrees(133.5, 33.5, 120.0)), 0.0);
        assert!(t.radii()[0] > t.radii()[2]);
    }
}
