use foundation::math::Geodetic;
use scene::OverlayDataset;
use scene::components::FeatureProperties;
use serde_json::{Map, Value};
use tracing::warn;

use crate::geojson::{FeatureCollection, FeatureGeometry, FormatError};

/// Counts from one ingestion pass.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub features: usize,
    pub entities: usize,
    pub skipped: usize,
}

/// Turn a decoded feature collection into a fresh overlay dataset.
///
/// Every point becomes one entity. Parts of a MultiPoint share the feature's
/// properties and get ids suffixed with `/n` from the second part on.
/// Features without an id are named after their index in the collection.
pub fn ingest_feature_collection(
    name: &str,
    collection: &FeatureCollection,
) -> (OverlayDataset, IngestReport) {
    let mut dataset = OverlayDataset::new(name);
    let mut report = IngestReport {
        features: collection.len(),
        ..IngestReport::default()
    };

    for (index, feature) in collection.features.iter().enumerate() {
        match &feature.geometry {
            FeatureGeometry::Point(_) | FeatureGeometry::MultiPoint(_) => {}
            FeatureGeometry::Unsupported(kind) => {
                warn!(index, kind = kind.as_str(), "skipping non-point overlay feature");
                report.skipped += 1;
                continue;
            }
            FeatureGeometry::Unlocated => {
                warn!(index, id = ?feature.id, "skipping overlay feature without geometry");
                report.skipped += 1;
                continue;
            }
            FeatureGeometry::Malformed(reason) => {
                warn!(index, id = ?feature.id, reason = reason.as_str(), "skipping malformed overlay feature");
                report.skipped += 1;
                continue;
            }
        }

        let base_id = feature
            .id
            .clone()
            .unwrap_or_else(|| format!("feature-{index}"));
        let properties = properties_from_json(&feature.properties);

        for (part, p) in feature.geometry.points().iter().enumerate() {
            let feature_id = if part == 0 {
                base_id.clone()
            } else {
                format!("{base_id}/{part}")
            };
            dataset.spawn(
                feature_id,
                Geodetic::from_degrees(p.lon_deg, p.lat_deg, p.height_m),
                properties.clone(),
            );
            report.entities += 1;
        }
    }

    (dataset, report)
}

/// Decode and ingest in one step.
pub fn load_overlay_geojson(
    name: &str,
    payload: &[u8],
) -> Result<(OverlayDataset, IngestReport), FormatError> {
    let collection = FeatureCollection::from_geojson_slice(payload)?;
    Ok(ingest_feature_collection(name, &collection))
}

/// Property values are carried as strings; non-string scalars are rendered
/// with their JSON text and `null` is dropped.
fn properties_from_json(map: &Map<String, Value>) -> FeatureProperties {
    let mut props = FeatureProperties::default();
    for (key, value) in map {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        props.insert(key.clone(), text);
    }
    props
}
