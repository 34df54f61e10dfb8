use std::cell::RefCell;
use std::collections::BTreeMap;

use foundation::math::Vec2;
use layers::raster::ImageryProvider;
use layers::terrain::TerrainProvider;
use layers::tileset::Tileset;
use layers::{LayerId, PrimitiveId};
use scene::OverlayDataset;
use scene::camera::{CameraFlight, CameraView};
use scene::entity::EntityId;
use scene::selection::SelectedFeature;
use scene::visibility::FilterCriteria;

use crate::bridge::{CriteriaListener, StateBridge, SubscriptionId};
use crate::engine::{ClickCallback, ClickHandlerId, HomeCallback, SceneEngine};

/// Minimal in-memory engine for controller tests. `pick` answers from a
/// scripted table keyed by integer screen coordinates.
#[derive(Default)]
pub struct MockEngine {
    pub imagery: Vec<ImageryProvider>,
    pub terrain: Option<TerrainProvider>,
    pub overlays: Vec<OverlayDataset>,
    pub primitives: BTreeMap<PrimitiveId, Tileset>,
    pub camera: Option<CameraView>,
    pub flights: Vec<CameraFlight>,
    pub homes: usize,
    pub home_override: Option<HomeCallback>,
    pub picks: BTreeMap<(i64, i64), EntityId>,
    pub handlers: BTreeMap<ClickHandlerId, ClickCallback>,
    pub renders: usize,
    pub size: Option<(f64, f64)>,
    pub destroyed: usize,
    next_id: u64,
}

impl MockEngine {
    pub fn script_pick(&mut self, x: f64, y: f64, entity: EntityId) {
        self.picks.insert((x as i64, y as i64), entity);
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl SceneEngine for MockEngine {
    fn clear_imagery(&mut self) {
        self.imagery.clear();
    }

    fn add_imagery(&mut self, provider: ImageryProvider) -> LayerId {
        self.imagery.push(provider);
        LayerId(self.next())
    }

    fn set_terrain(&mut self, terrain: TerrainProvider) {
        self.terrain = Some(terrain);
    }

    fn add_overlay(&mut self, dataset: OverlayDataset) {
        self.overlays.push(dataset);
    }

    fn remove_all_overlays(&mut self) -> usize {
        let n = self.overlays.len();
        self.overlays.clear();
        n
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
        let id = PrimitiveId(self.next());
        self.primitives.insert(id, tileset);
        id
    }

    fn remove_primitive(&mut self, id: PrimitiveId) -> bool {
        self.primitives.remove(&id).is_some()
    }

    fn set_camera(&mut self, view: CameraView) {
        self.camera = Some(view);
    }

    fn fly_to(&mut self, flight: CameraFlight) {
        self.flights.push(flight);
    }

    fn home(&mut self) {
        self.homes += 1;
    }

    fn set_home_override(&mut self, handler: Option<HomeCallback>) {
        self.home_override = handler;
    }

    fn home_override(&self) -> Option<HomeCallback> {
        self.home_override.clone()
    }

    fn pick(&self, position: Vec2) -> Option<EntityId> {
        self.picks.get(&(position.x as i64, position.y as i64)).copied()
    }

    fn add_click_handler(&mut self, handler: ClickCallback) -> ClickHandlerId {
        let id = ClickHandlerId(self.next());
        self.handlers.insert(id, handler);
        id
    }

    fn remove_click_handler(&mut self, id: ClickHandlerId) -> bool {
        self.handlers.remove(&id).is_some()
    }

    fn click_handlers(&self) -> Vec<ClickCallback> {
        self.handlers.values().cloned().collect()
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.size = Some((width, height));
    }

    fn request_render(&mut self) {
        self.renders += 1;
    }

    fn destroy(&mut self) {
        self.destroyed += 1;
        self.handlers.clear();
        self.home_override = None;
    }
}

/// Bridge that records every published selection.
#[derive(Default)]
pub struct RecordingBridge {
    pub criteria: RefCell<FilterCriteria>,
    pub published: RefCell<Vec<Option<SelectedFeature>>>,
    listeners: RefCell<BTreeMap<SubscriptionId, CriteriaListener>>,
    next_id: std::cell::Cell<u64>,
}

impl RecordingBridge {
    pub fn set_criteria(&self, criteria: FilterCriteria) {
        *self.criteria.borrow_mut() = criteria.clone();
        let listeners: Vec<CriteriaListener> = self.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener(&criteria);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl StateBridge for RecordingBridge {
    fn filter_criteria(&self) -> FilterCriteria {
        self.criteria.borrow().clone()
    }

    fn publish_selection(&self, selection: Option<SelectedFeature>) {
        self.published.borrow_mut().push(selection);
    }

    fn subscribe_criteria(&self, listener: CriteriaListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().insert(id, listener);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.borrow_mut().remove(&id).is_some()
    }
}
