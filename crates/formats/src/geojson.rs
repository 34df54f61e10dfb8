use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
    /// Third coordinate when present, meters above the ellipsoid.
    pub height_m: f64,
}

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon_deg,
            lat_deg,
            height_m: 0.0,
        }
    }
}

/// Geometry of an overlay feature. Only point-compatible geometry is
/// decoded; other kinds are kept by name so ingestion can report them.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Point(GeoPoint),
    MultiPoint(Vec<GeoPoint>),
    Unsupported(String),
    /// `"geometry": null` or no geometry member at all.
    Unlocated,
    /// Point geometry whose coordinates could not be read.
    Malformed(String),
}

impl FeatureGeometry {
    pub fn points(&self) -> &[GeoPoint] {
        match self {
            Self::Point(p) => std::slice::from_ref(p),
            Self::MultiPoint(ps) => ps,
            Self::Unsupported(_) | Self::Unlocated | Self::Malformed(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: FeatureGeometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<FeatureRecord>,
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected GeoJSON FeatureCollection")]
    NotAFeatureCollection,
    #[error("invalid feature at index {index}: {reason}")]
    InvalidFeature { index: usize, reason: String },
}

impl FeatureCollection {
    pub fn from_geojson_str(payload: &str) -> Result<Self, FormatError> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_slice(payload: &[u8]) -> Result<Self, FormatError> {
        let value: Value = serde_json::from_slice(payload)?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, FormatError> {
        let obj = value.as_object().ok_or(FormatError::NotAFeatureCollection)?;
        if obj.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
            return Err(FormatError::NotAFeatureCollection);
        }
        let features_val = obj
            .get("features")
            .and_then(Value::as_array)
            .ok_or(FormatError::NotAFeatureCollection)?;

        let features = features_val
            .iter()
            .enumerate()
            .map(|(index, v)| {
                parse_feature(v).map_err(|reason| FormatError::InvalidFeature { index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn parse_feature(value: &Value) -> Result<FeatureRecord, String> {
    let obj = value
        .as_object()
        .ok_or_else(|| "feature must be an object".to_string())?;
    match obj.get("type").and_then(Value::as_str) {
        Some("Feature") => {}
        Some(other) => return Err(format!("unexpected feature type: {other}")),
        None => return Err("feature missing type".to_string()),
    }

    let id = match obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let geometry = match obj.get("geometry") {
        Some(Value::Null) | None => FeatureGeometry::Unlocated,
        Some(g) => parse_geometry(g).unwrap_or_else(FeatureGeometry::Malformed),
    };

    Ok(FeatureRecord {
        id,
        properties,
        geometry,
    })
}

fn parse_geometry(value: &Value) -> Result<FeatureGeometry, String> {
    let obj = value
        .as_object()
        .ok_or_else(|| "geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| "geometry missing type".to_string())?;

    let coords = || {
        obj.get("coordinates")
            .ok_or_else(|| "geometry missing coordinates".to_string())
    };

    match ty {
        "Point" => Ok(FeatureGeometry::Point(parse_point(coords()?)?)),
        "MultiPoint" => {
            let arr = coords()?
                .as_array()
                .ok_or_else(|| "MultiPoint coordinates must be an array".to_string())?;
            arr.iter()
                .map(parse_point)
                .collect::<Result<Vec<_>, _>>()
                .map(FeatureGeometry::MultiPoint)
        }
        other => Ok(FeatureGeometry::Unsupported(other.to_string())),
    }
}

fn parse_point(coords: &Value) -> Result<GeoPoint, String> {
    let arr = coords
        .as_array()
        .ok_or_else(|| "Point coordinates must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("Point coordinates must have [lon, lat]".to_string());
    }
    let lon = arr[0]
        .as_f64()
        .ok_or_else(|| "Point lon must be a number".to_string())?;
    let lat = arr[1]
        .as_f64()
        .ok_or_else(|| "Point lat must be a number".to_string())?;
    let mut point = GeoPoint::new(lon, lat);
    if let Some(h) = arr.get(2).and_then(Value::as_f64) {
        point.height_m = h;
    }
    Ok(point)
}
