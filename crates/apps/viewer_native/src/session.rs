use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use render::{HeadlessEngine, SceneSummary, Viewport};
use runtime::{DiagnosticBus, TeardownKind};
use scene::camera::{CameraDestination, NavigationError};
use streaming::{ResourceOrchestrator, ResourceProvider};
use tracing::{debug, info};
use viewer::{
    ClickEvent, LifecycleError, NavigationController, PickingController, SceneHandle, StateBridge,
    ViewerLifecycle, VisibilityController,
};

use crate::config::ViewerConfig;
use crate::store::AppStore;

/// How long after attach the surface is re-measured and redrawn, once the
/// host layout has settled.
pub const LAYOUT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// One viewer instance: the lifecycle-owned headless scene with picking,
/// filtering, navigation and resource loading wired to the store.
pub struct ViewerSession {
    lifecycle: ViewerLifecycle,
    engine: Rc<RefCell<HeadlessEngine>>,
    scene: SceneHandle,
    store: Rc<AppStore>,
    viewport: Rc<Cell<Viewport>>,
    navigation: NavigationController,
    orchestrator: Rc<ResourceOrchestrator>,
}

impl ViewerSession {
    /// Attach the scene and start loading. Must run inside a `LocalSet`.
    pub fn start(
        config: &ViewerConfig,
        store: Rc<AppStore>,
        provider: Rc<dyn ResourceProvider>,
        viewport: Viewport,
    ) -> Result<Self, LifecycleError> {
        let mut lifecycle = ViewerLifecycle::new(DiagnosticBus::new());
        let engine = Rc::new(RefCell::new(HeadlessEngine::new(viewport)));
        let shared = engine.clone();
        let scene = lifecycle.on_surface_attached(move || Ok(shared))?;
        config.log_startup();

        let viewport = Rc::new(Cell::new(viewport));
        let settle = {
            let scene = scene.clone();
            let viewport = viewport.clone();
            tokio::task::spawn_local(async move {
                tokio::time::sleep(LAYOUT_SETTLE_DELAY).await;
                apply_layout(&scene, viewport.get());
            })
        };
        lifecycle.register_teardown(TeardownKind::Timer, "layout-settle", move || settle.abort());

        let bridge: Rc<dyn StateBridge> = store.clone();

        let picking = Rc::new(RefCell::new(PickingController::new(bridge.clone())));
        picking.borrow_mut().attach(&scene);
        lifecycle.register_teardown(TeardownKind::Listener, "pick-handler", move || {
            picking.borrow_mut().detach();
        });

        let visibility = VisibilityController::new(scene.clone(), bridge);
        visibility.watch();
        let unwatch = visibility.clone();
        lifecycle.register_teardown(TeardownKind::Listener, "filter-subscription", move || {
            unwatch.unwatch();
        });

        let navigation = NavigationController::new(config.initial_view());
        navigation.install_home_override(&mut lifecycle);

        let orchestrator = ResourceOrchestrator::for_lifecycle(
            &lifecycle,
            provider,
            navigation.clone(),
            config.orchestrator(),
        )
        .ok_or(LifecycleError::Disposed)?;
        let refresh: Weak<VisibilityController> = Rc::downgrade(&visibility);
        orchestrator.on_overlay_changed(move || {
            if let Some(visibility) = refresh.upgrade() {
                visibility.refresh();
            }
        });
        let stop = orchestrator.clone();
        lifecycle.register_teardown(TeardownKind::Listener, "resource-loads", move || stop.shutdown());

        let epoch = orchestrator.start();
        info!(scene = scene.id().0, epoch = %epoch, "viewer session started");

        Ok(Self {
            lifecycle,
            engine,
            scene,
            store,
            viewport,
            navigation,
            orchestrator,
        })
    }

    pub fn scene(&self) -> &SceneHandle {
        &self.scene
    }

    pub fn store(&self) -> &Rc<AppStore> {
        &self.store
    }

    pub fn orchestrator(&self) -> &Rc<ResourceOrchestrator> {
        &self.orchestrator
    }

    pub fn diagnostics(&self) -> &DiagnosticBus {
        self.lifecycle.diagnostics()
    }

    /// Wait for every resource load started so far.
    pub async fn settled(&self) {
        self.orchestrator.settled().await;
    }

    /// Primary click at screen coordinates. Returns how many handlers ran.
    pub fn click(&self, x: f64, y: f64) -> usize {
        self.scene.dispatch_click(ClickEvent::primary(x, y))
    }

    /// Click wherever `feature_id` currently appears on screen.
    ///
    /// `None` when the feature is unknown or off screen.
    pub fn click_feature(&self, feature_id: &str) -> Option<usize> {
        let position = {
            let engine = self.engine.borrow();
            let entity = engine.overlays().last()?.find_by_feature_id(feature_id)?.id;
            engine.screen_position_of(entity)?
        };
        debug!(feature_id, x = position.x, y = position.y, "clicking feature");
        Some(self.click(position.x, position.y))
    }

    pub fn fly_to(&self, lon: &str, lat: &str, height: &str) -> Result<CameraDestination, NavigationError> {
        self.navigation.fly_to(&self.scene, lon, lat, height)
    }

    pub fn press_home(&self) -> bool {
        self.scene.press_home()
    }

    /// Host surface resized. Returns `false` once the scene is gone.
    pub fn resize(&self, width: f64, height: f64) -> bool {
        let viewport = Viewport::new(width, height);
        self.viewport.set(viewport);
        apply_layout(&self.scene, viewport)
    }

    pub fn summary(&self) -> SceneSummary {
        self.engine.borrow().summary()
    }

    pub fn dispose(&mut self) {
        self.lifecycle.dispose();
    }
}

fn apply_layout(scene: &SceneHandle, viewport: Viewport) -> bool {
    let applied = scene
        .with(|engine| {
            engine.resize(viewport.width, viewport.height);
            engine.request_render();
        })
        .is_some();
    debug!(width = viewport.width, height = viewport.height, applied, "layout pass");
    applied
}
