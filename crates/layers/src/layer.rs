/// Identifier of a layer attached to the scene.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

/// Slot in the scene's 3D primitive collection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayerKind {
    Imagery,
    Vector,
}

pub trait Layer {
    fn id(&self) -> LayerId;
    fn kind(&self) -> LayerKind;
}
