use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use foundation::math::Vec2;
use layers::raster::ImageryProvider;
use layers::terrain::TerrainProvider;
use layers::tileset::Tileset;
use layers::{LayerId, PrimitiveId};
use scene::OverlayDataset;
use scene::camera::{CameraFlight, CameraView};
use scene::entity::EntityId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(pub u64);

impl SceneId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClickHandlerId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClickEvent {
    /// Screen position in pixels, origin top-left.
    pub position: Vec2,
    pub button: MouseButton,
}

impl ClickEvent {
    pub fn primary(x: f64, y: f64) -> Self {
        Self {
            position: Vec2::new(x, y),
            button: MouseButton::Primary,
        }
    }
}

pub type ClickCallback = Rc<dyn Fn(ClickEvent)>;
pub type HomeCallback = Rc<dyn Fn()>;

/// Capabilities the viewer core needs from the 3D globe engine.
///
/// All methods are synchronous and called from the single UI thread.
/// Implementations must not call back into the viewer from inside these
/// methods; callbacks are fetched with [`SceneEngine::click_handlers`] /
/// [`SceneEngine::home_override`] and invoked by [`SceneHandle`] after the
/// engine borrow ends.
pub trait SceneEngine {
    fn clear_imagery(&mut self);
    fn add_imagery(&mut self, provider: ImageryProvider) -> LayerId;
    fn set_terrain(&mut self, terrain: TerrainProvider);

    fn add_overlay(&mut self, dataset: OverlayDataset);
    /// Detach and drop every overlay dataset. Returns how many were removed.
    fn remove_all_overlays(&mut self) -> usize;
    /// The attached overlay, if any.
    fn overlay(&self) -> Option<&OverlayDataset>;
    fn overlay_mut(&mut self) -> Option<&mut OverlayDataset>;
    fn overlay_count(&self) -> usize;

    fn add_primitive(&mut self, tileset: Tileset) -> PrimitiveId;
    /// Detach and destroy a primitive. Returns `false` if it was not attached.
    fn remove_primitive(&mut self, id: PrimitiveId) -> bool;

    fn set_camera(&mut self, view: CameraView);
    fn fly_to(&mut self, flight: CameraFlight);
    /// Engine-default home framing.
    fn home(&mut self);
    fn set_home_override(&mut self, handler: Option<HomeCallback>);
    fn home_override(&self) -> Option<HomeCallback>;

    /// Topmost overlay entity under a screen position.
    fn pick(&self, position: Vec2) -> Option<EntityId>;
    fn add_click_handler(&mut self, handler: ClickCallback) -> ClickHandlerId;
    fn remove_click_handler(&mut self, id: ClickHandlerId) -> bool;
    fn click_handlers(&self) -> Vec<ClickCallback>;

    /// Match the drawing surface to its container, in pixels.
    fn resize(&mut self, width: f64, height: f64);
    fn request_render(&mut self);
    /// Release every engine resource. Called exactly once, on dispose.
    fn destroy(&mut self);
}

/// Borrowed access to the live scene.
///
/// The viewer lifecycle owns the engine; handles only hold a weak reference
/// plus the shared liveness flag. Once the lifecycle disposes the scene every
/// access through a handle is a no-op returning `None`, even if some other
/// owner keeps the engine allocation alive.
#[derive(Clone)]
pub struct SceneHandle {
    id: SceneId,
    engine: Weak<RefCell<dyn SceneEngine>>,
    live: Rc<Cell<bool>>,
}

impl std::fmt::Debug for SceneHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneHandle")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}

impl SceneHandle {
    pub(crate) fn new(
        id: SceneId,
        engine: Weak<RefCell<dyn SceneEngine>>,
        live: Rc<Cell<bool>>,
    ) -> Self {
        Self { id, engine, live }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn is_live(&self) -> bool {
        self.live.get() && self.engine.strong_count() > 0
    }

    /// Run `f` against the engine if the scene is still live.
    ///
    /// Returns `None` after dispose, and also when the engine is already
    /// borrowed further up the stack (a re-entrant call is dropped rather
    /// than allowed to alias the engine).
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn SceneEngine) -> R) -> Option<R> {
        if !self.live.get() {
            return None;
        }
        let engine = self.engine.upgrade()?;
        let Ok(mut guard) = engine.try_borrow_mut() else {
            tracing::warn!(scene = self.id.0, "re-entrant scene access dropped");
            return None;
        };
        Some(f(&mut *guard))
    }

    /// Deliver a click to every registered handler. Returns how many ran.
    pub fn dispatch_click(&self, event: ClickEvent) -> usize {
        let handlers = self.with(|e| e.click_handlers()).unwrap_or_default();
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Press the home button: the override when one is installed, otherwise
    /// the engine's own home framing. Returns `false` if the scene is gone.
    pub fn press_home(&self) -> bool {
        match self.with(|e| e.home_override()) {
            None => false,
            Some(Some(handler)) => {
                handler();
                true
            }
            Some(None) => self.with(|e| e.home()).is_some(),
        }
    }
}
