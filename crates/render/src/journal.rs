use layers::PrimitiveId;
use layers::raster::ImageryStyle;
use layers::tileset::TilesetAssetId;
use scene::camera::{CameraFlight, CameraView};
use viewer::ClickHandlerId;

/// One mutation applied to the headless scene, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    ClearImagery,
    AddImagery { style: ImageryStyle },
    SetTerrain { name: &'static str },
    AddOverlay { name: String, entities: usize },
    RemoveAllOverlays { removed: usize },
    AddPrimitive { id: PrimitiveId, asset_id: TilesetAssetId },
    RemovePrimitive { id: PrimitiveId },
    SetCamera(CameraView),
    FlyTo(CameraFlight),
    Home,
    SetHomeOverride { installed: bool },
    AddClickHandler(ClickHandlerId),
    RemoveClickHandler(ClickHandlerId),
    Resize { width: f64, height: f64 },
    RequestRender,
    Destroy,
}

impl SceneCommand {
    /// Whether the command changes what the scene shows.
    pub fn is_content_mutation(&self) -> bool {
        matches!(
            self,
            Self::ClearImagery
                | Self::AddImagery { .. }
                | Self::SetTerrain { .. }
                | Self::AddOverlay { .. }
                | Self::RemoveAllOverlays { .. }
                | Self::AddPrimitive { .. }
                | Self::RemovePrimitive { .. }
        )
    }

    pub fn is_camera(&self) -> bool {
        matches!(self, Self::SetCamera(_) | Self::FlyTo(_) | Self::Home)
    }
}
