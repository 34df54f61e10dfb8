use std::time::Duration;

use foundation::math::Geodetic;
use thiserror::Error;

/// Length of every animated navigation flight.
pub const FLIGHT_DURATION: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("longitude must be a number between -180 and 180")]
    Longitude,
    #[error("latitude must be a number between -90 and 90")]
    Latitude,
    #[error("height must be a number greater than 0 (meters)")]
    Height,
    #[error("scene is not ready")]
    SceneUnavailable,
}

impl NavigationError {
    /// Form field the message belongs to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Longitude => Some("longitude"),
            Self::Latitude => Some("latitude"),
            Self::Height => Some("height"),
            Self::SceneUnavailable => None,
        }
    }
}

/// A validated geographic camera target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraDestination {
    lon_deg: f64,
    lat_deg: f64,
    height_m: f64,
}

impl CameraDestination {
    /// Over Tokyo, high enough to frame the whole country.
    pub const TOKYO_OVERVIEW: CameraDestination = CameraDestination {
        lon_deg: 139.6917,
        lat_deg: 35.6895,
        height_m: 20_000_000.0,
    };

    /// Generic whole-globe framing used when no home view is configured.
    pub const WORLD_OVERVIEW: CameraDestination = CameraDestination {
        lon_deg: -98.0,
        lat_deg: 39.0,
        height_m: 25_000_000.0,
    };

    /// Checks bounds in order longitude, latitude, height; the first
    /// violation wins.
    pub fn new(lon_deg: f64, lat_deg: f64, height_m: f64) -> Result<Self, NavigationError> {
        if !lon_deg.is_finite() || !(-180.0..=180.0).contains(&lon_deg) {
            return Err(NavigationError::Longitude);
        }
        if !lat_deg.is_finite() || !(-90.0..=90.0).contains(&lat_deg) {
            return Err(NavigationError::Latitude);
        }
        if !height_m.is_finite() || height_m <= 0.0 {
            return Err(NavigationError::Height);
        }
        Ok(Self {
            lon_deg,
            lat_deg,
            height_m,
        })
    }

    /// Parse free-form form input. An unparsable field fails with that
    /// field's error, still in longitude, latitude, height order.
    pub fn parse(lon: &str, lat: &str, height: &str) -> Result<Self, NavigationError> {
        let lon = parse_field(lon).ok_or(NavigationError::Longitude)?;
        let lat = parse_field(lat).ok_or(NavigationError::Latitude)?;
        let height = parse_field(height).ok_or(NavigationError::Height)?;
        Self::new(lon, lat, height)
    }

    pub fn lon_deg(&self) -> f64 {
        self.lon_deg
    }

    pub fn lat_deg(&self) -> f64 {
        self.lat_deg
    }

    pub fn height_m(&self) -> f64 {
        self.height_m
    }

    pub fn geodetic(&self) -> Geodetic {
        Geodetic::from_degrees(self.lon_deg, self.lat_deg, self.height_m)
    }
}

fn parse_field(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Heading/pitch/roll in radians.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Orientation {
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Orientation {
    /// Looking straight down, north up.
    pub fn top_down() -> Self {
        Self {
            heading: 0.0,
            pitch: -std::f64::consts::FRAC_PI_2,
            roll: 0.0,
        }
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::top_down()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraView {
    pub destination: CameraDestination,
    pub orientation: Orientation,
}

impl CameraView {
    pub fn top_down(destination: CameraDestination) -> Self {
        Self {
            destination,
            orientation: Orientation::top_down(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraFlight {
    pub view: CameraView,
    pub duration: Duration,
}

impl CameraFlight {
    pub fn to(destination: CameraDestination) -> Self {
        Self {
            view: CameraView::top_down(destination),
            duration: FLIGHT_DURATION,
        }
    }
}
