use foundation::math::{Geodetic, Vec3};
use scene::OverlayDataset;
use scene::components::{HeightReference, PointGraphics};
use scene::entity::EntityId;

use crate::layer::{Layer, LayerId, LayerKind};
use crate::terrain::TerrainProvider;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VectorLayer {
    id: LayerId,
}

/// One point sprite as it would be drawn this frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointSprite {
    pub entity: EntityId,
    pub position: Vec3,
    pub graphics: PointGraphics,
}

/// Render state derived from the overlay. Building it never touches the
/// dataset; hidden entities are simply absent.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VectorLayerSnapshot {
    pub points: Vec<PointSprite>,
}

impl VectorLayer {
    pub fn new(id: u64) -> Self {
        Self { id: LayerId(id) }
    }

    pub fn extract(&self, dataset: &OverlayDataset, terrain: &TerrainProvider) -> VectorLayerSnapshot {
        let points = dataset
            .iter()
            .filter(|e| e.is_visible())
            .map(|e| {
                let graphics = e.point.unwrap_or_default();
                PointSprite {
                    entity: e.id,
                    position: resolve_height(e.position, graphics.height_reference, terrain),
                    graphics,
                }
            })
            .collect();
        VectorLayerSnapshot { points }
    }
}

fn resolve_height(position: Geodetic, reference: HeightReference, terrain: &TerrainProvider) -> Vec3 {
    let ground = terrain.surface_height(position);
    let alt_m = match reference {
        HeightReference::None => position.alt_m,
        HeightReference::ClampToGround => ground,
        HeightReference::RelativeToGround => ground + position.alt_m,
    };
    position.with_height(alt_m).to_ecef()
}

impl Layer for VectorLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Vector
    }
}
