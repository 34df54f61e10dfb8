use std::collections::BTreeMap;

use foundation::math::Vec2;
use layers::raster::{ImageryProvider, RasterLayer};
use layers::terrain::TerrainProvider;
use layers::tileset::Tileset;
use layers::vector::{VectorLayer, VectorLayerSnapshot};
use layers::{LayerId, PrimitiveId};
use scene::OverlayDataset;
use scene::camera::{CameraDestination, CameraFlight, CameraView};
use scene::entity::EntityId;
use scene::picking::{PickOptions, pick_screen};
use tracing::trace;
use viewer::{ClickCallback, ClickHandlerId, HomeCallback, SceneEngine};

use crate::camera::{Camera3D, Viewport};
use crate::journal::SceneCommand;

/// Counts describing what the scene currently holds.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub imagery_layers: usize,
    pub terrain: Option<&'static str>,
    pub overlays: usize,
    pub entities: usize,
    pub visible_entities: usize,
    pub primitives: usize,
    /// Point sprites the overlay draws this frame.
    pub drawn_points: usize,
    pub renders: usize,
    pub viewport: Viewport,
    pub camera: Option<CameraView>,
    pub destroyed: bool,
}

/// Deterministic in-process scene engine.
///
/// Keeps every slot the viewer core uses in plain collections, completes
/// camera flights instantly, picks with a pinhole ray against point sprites,
/// and journals every call so tests can assert exactly which mutations
/// happened and in what order.
pub struct HeadlessEngine {
    viewport: Viewport,
    home_view: CameraView,
    camera_view: CameraView,
    imagery: Vec<RasterLayer>,
    terrain: Option<TerrainProvider>,
    overlays: Vec<OverlayDataset>,
    primitives: BTreeMap<PrimitiveId, Tileset>,
    home_override: Option<HomeCallback>,
    handlers: BTreeMap<ClickHandlerId, ClickCallback>,
    pick_options: PickOptions,
    journal: Vec<SceneCommand>,
    renders: usize,
    destroyed: bool,
    next_id: u64,
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl HeadlessEngine {
    pub fn new(viewport: Viewport) -> Self {
        let home_view = CameraView::top_down(CameraDestination::WORLD_OVERVIEW);
        Self {
            viewport,
            home_view,
            camera_view: home_view,
            imagery: Vec::new(),
            terrain: None,
            overlays: Vec::new(),
            primitives: BTreeMap::new(),
            home_override: None,
            handlers: BTreeMap::new(),
            pick_options: PickOptions::default(),
            journal: Vec::new(),
            renders: 0,
            destroyed: false,
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, command: SceneCommand) {
        trace!(?command, "scene command");
        self.journal.push(command);
    }

    pub fn journal(&self) -> &[SceneCommand] {
        &self.journal
    }

    pub fn take_journal(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.journal)
    }

    pub fn renders(&self) -> usize {
        self.renders
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn imagery_layers(&self) -> &[RasterLayer] {
        &self.imagery
    }

    pub fn terrain(&self) -> Option<TerrainProvider> {
        self.terrain
    }

    pub fn overlays(&self) -> &[OverlayDataset] {
        &self.overlays
    }

    pub fn primitives(&self) -> impl Iterator<Item = (&PrimitiveId, &Tileset)> {
        self.primitives.iter()
    }

    pub fn camera_view(&self) -> CameraView {
        self.camera_view
    }

    pub fn camera(&self) -> Camera3D {
        Camera3D::from_view(self.camera_view, self.viewport)
    }

    pub fn has_home_override(&self) -> bool {
        self.home_override.is_some()
    }

    pub fn click_handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Where an overlay entity lands on screen from the current camera.
    pub fn screen_position_of(&self, entity: EntityId) -> Option<Vec2> {
        let e = self.overlays.last()?.entity(entity)?;
        self.camera().project(e.position_ecef())
    }

    /// Render state of the attached overlay.
    pub fn vector_snapshot(&self) -> VectorLayerSnapshot {
        let terrain = self.terrain.unwrap_or_default();
        self.overlays
            .last()
            .map(|ds| VectorLayer::new(0).extract(ds, &terrain))
            .unwrap_or_default()
    }

    pub fn summary(&self) -> SceneSummary {
        let overlay = self.overlays.last();
        SceneSummary {
            imagery_layers: self.imagery.len(),
            terrain: self.terrain.map(|t| t.name()),
            overlays: self.overlays.len(),
            entities: overlay.map_or(0, |ds| ds.len()),
            visible_entities: overlay.map_or(0, |ds| ds.visible_count()),
            primitives: self.primitives.len(),
            drawn_points: self.vector_snapshot().points.len(),
            renders: self.renders,
            viewport: self.viewport,
            camera: (!self.destroyed).then_some(self.camera_view),
            destroyed: self.destroyed,
        }
    }
}

impl SceneEngine for HeadlessEngine {
    fn clear_imagery(&mut self) {
        self.imagery.clear();
        self.record(SceneCommand::ClearImagery);
    }

    fn add_imagery(&mut self, provider: ImageryProvider) -> LayerId {
        let style = provider.style;
        let layer = RasterLayer::new(self.next_id(), provider);
        let id = layers::Layer::id(&layer);
        self.imagery.push(layer);
        self.record(SceneCommand::AddImagery { style });
        id
    }

    fn set_terrain(&mut self, terrain: TerrainProvider) {
        self.terrain = Some(terrain);
        self.record(SceneCommand::SetTerrain {
            name: terrain.name(),
        });
    }

    fn add_overlay(&mut self, dataset: OverlayDataset) {
        self.record(SceneCommand::AddOverlay {
            name: dataset.name().to_string(),
            entities: dataset.len(),
        });
        self.overlays.push(dataset);
    }

    fn remove_all_overlays(&mut self) -> usize {
        let removed = self.overlays.len();
        self.overlays.clear();
        self.record(SceneCommand::RemoveAllOverlays { removed });
        removed
    }

    fn overlay(&self) -> Option<&OverlayDataset> {
        self.overlays.last()
    }

    fn overlay_mut(&mut self) -> Option<&mut OverlayDataset> {
        self.overlays.last_mut()
    }

    fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    fn add_primitive(&mut self, tileset: Tileset) -> PrimitiveId {
        let id = PrimitiveId(self.next_id());
        self.record(SceneCommand::AddPrimitive {
            id,
            asset_id: tileset.asset_id(),
        });
        self.primitives.insert(id, tileset);
        id
    }

    fn remove_primitive(&mut self, id: PrimitiveId) -> bool {
        let Some(mut tileset) = self.primitives.remove(&id) else {
            return false;
        };
        tileset.destroy();
        self.record(SceneCommand::RemovePrimitive { id });
        true
    }

    fn set_camera(&mut self, view: CameraView) {
        self.camera_view = view;
        self.record(SceneCommand::SetCamera(view));
    }

    fn fly_to(&mut self, flight: CameraFlight) {
        self.camera_view = flight.view;
        self.record(SceneCommand::FlyTo(flight));
    }

    fn home(&mut self) {
        self.camera_view = self.home_view;
        self.record(SceneCommand::Home);
    }

    fn set_home_override(&mut self, handler: Option<HomeCallback>) {
        let installed = handler.is_some();
        self.home_override = handler;
        self.record(SceneCommand::SetHomeOverride { installed });
    }

    fn home_override(&self) -> Option<HomeCallback> {
        self.home_override.clone()
    }

    fn pick(&self, position: Vec2) -> Option<EntityId> {
        let dataset = self.overlays.last()?;
        let camera = self.camera();
        let opts = PickOptions {
            radians_per_pixel: camera.radians_per_pixel(),
            ..self.pick_options
        };
        pick_screen(dataset, position.x, position.y, |x, y| camera.make_ray(x, y), opts)
            .map(|hit| hit.entity)
    }

    fn add_click_handler(&mut self, handler: ClickCallback) -> ClickHandlerId {
        let id = ClickHandlerId(self.next_id());
        self.handlers.insert(id, handler);
        self.record(SceneCommand::AddClickHandler(id));
        id
    }

    fn remove_click_handler(&mut self, id: ClickHandlerId) -> bool {
        let removed = self.handlers.remove(&id).is_some();
        if removed {
            self.record(SceneCommand::RemoveClickHandler(id));
        }
        removed
    }

    fn click_handlers(&self) -> Vec<ClickCallback> {
        self.handlers.values().cloned().collect()
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width, height);
        self.record(SceneCommand::Resize { width, height });
    }

    fn request_render(&mut self) {
        self.renders += 1;
        self.record(SceneCommand::RequestRender);
    }

    fn destroy(&mut self) {
        for tileset in self.primitives.values_mut() {
            tileset.destroy();
        }
        self.primitives.clear();
        self.overlays.clear();
        self.imagery.clear();
        self.handlers.clear();
        self.home_override = None;
        self.destroyed = true;
        self.record(SceneCommand::Destroy);
    }
}
