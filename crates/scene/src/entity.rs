use foundation::handles::Handle;
use foundation::math::{Geodetic, Vec3};

use crate::components::{FeatureProperties, PointGraphics};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub Handle);

impl EntityId {
    pub fn index(&self) -> u32 {
        self.0.index()
    }
}

/// One feature of the vector overlay.
///
/// `visible` is derived state owned by the visibility engine; it is not part
/// of the loaded data and is reset to `true` on load.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEntity {
    pub id: EntityId,
    /// Identifier carried by the source feature.
    pub feature_id: String,
    pub position: Geodetic,
    pub properties: FeatureProperties,
    /// `None` keeps the engine's default symbology.
    pub point: Option<PointGraphics>,
    visible: bool,
}

impl FeatureEntity {
    pub(crate) fn new(
        id: EntityId,
        feature_id: String,
        position: Geodetic,
        properties: FeatureProperties,
    ) -> Self {
        Self {
            id,
            feature_id,
            position,
            properties,
            point: None,
            visible: true,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) -> bool {
        let changed = self.visible != visible;
        self.visible = visible;
        changed
    }

    pub fn position_ecef(&self) -> Vec3 {
        self.position.to_ecef()
    }

    /// Point size in pixels, falling back to a 1 px default sprite.
    pub fn pixel_size(&self) -> f64 {
        self.point.map(|p| f64::from(p.pixel_size)).unwrap_or(1.0)
    }
}
