use foundation::handles::Handle;
use foundation::math::Geodetic;

use crate::components::{FeatureProperties, PointGraphics};
use crate::entity::{EntityId, FeatureEntity};
use crate::entity_set::EntitySet;

/// The vector overlay: a dense, index-addressed collection of point features.
///
/// Entity ids are assigned in load order and never reused within a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayDataset {
    name: String,
    entities: Vec<FeatureEntity>,
}

impl OverlayDataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spawn(
        &mut self,
        feature_id: impl Into<String>,
        position: Geodetic,
        properties: FeatureProperties,
    ) -> EntityId {
        let id = EntityId(Handle::new(self.entities.len() as u32, 0));
        self.entities.push(FeatureEntity::new(
            id,
            feature_id.into(),
            position,
            properties,
        ));
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&FeatureEntity> {
        self.entities
            .get(id.index() as usize)
            .filter(|e| e.id == id)
    }

    pub fn find_by_feature_id(&self, feature_id: &str) -> Option<&FeatureEntity> {
        self.entities.iter().find(|e| e.feature_id == feature_id)
    }

    pub fn entities(&self) -> &[FeatureEntity] {
        &self.entities
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureEntity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Replace the symbology of every entity, producing a new dataset.
    pub fn with_point_graphics(mut self, graphics: PointGraphics) -> Self {
        for entity in &mut self.entities {
            entity.point = Some(graphics);
        }
        self
    }

    /// Ids of entities currently flagged visible.
    pub fn visible_set(&self) -> EntitySet {
        let mut out = EntitySet::with_max_index(self.entities.len().saturating_sub(1) as u32);
        for e in self.entities.iter().filter(|e| e.is_visible()) {
            out.insert(e.id);
        }
        out
    }

    pub fn visible_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_visible()).count()
    }

    /// Set each entity's `visible` flag to its membership in `mask`.
    ///
    /// Returns the number of flags that changed.
    pub fn apply_visibility(&mut self, mask: &EntitySet) -> usize {
        let mut changed = 0;
        for entity in &mut self.entities {
            if entity.set_visible(mask.contains(entity.id)) {
                changed += 1;
            }
        }
        changed
    }
}
