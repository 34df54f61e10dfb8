use serde::Serialize;

use crate::components::FeatureProperties;
use crate::entity::FeatureEntity;

/// The feature an operator last picked.
///
/// `properties` is a snapshot taken at pick time; later restyling or
/// filtering of the overlay does not change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFeature {
    pub id: String,
    pub properties: FeatureProperties,
}

impl SelectedFeature {
    pub fn snapshot(entity: &FeatureEntity) -> Self {
        Self {
            id: entity.feature_id.clone(),
            properties: entity.properties.clone(),
        }
    }
}
