use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;

use layers::PrimitiveId;
use layers::raster::{ImageryProvider, ImageryStyle};
use layers::symbology::overlay_point_style;
use layers::terrain::TerrainProvider;
use layers::tileset::{Tileset, TilesetAssetId};
use runtime::{DiagnosticBus, EpochCounter, EpochToken, ResourceEpoch};
use scene::OverlayDataset;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use viewer::{NavigationController, SceneHandle, ViewerLifecycle};

use crate::error::LoadError;
use crate::provider::ResourceProvider;

pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    pub imagery_style: ImageryStyle,
    /// `None` disables the tileset.
    pub tileset: Option<TilesetAssetId>,
    /// `None` lets a load stall indefinitely.
    pub load_timeout: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            imagery_style: ImageryStyle::default(),
            tileset: None,
            load_timeout: Some(DEFAULT_LOAD_TIMEOUT),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Imagery,
    Terrain,
    Overlay,
    Tileset,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Imagery => "imagery",
            Self::Terrain => "terrain",
            Self::Overlay => "overlay",
            Self::Tileset => "tileset",
        }
    }
}

/// Last known result of a resource load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Pending,
    Attached,
    Failed(String),
    /// Completed after teardown or reconfiguration and was discarded.
    Stale,
}

#[derive(Debug)]
enum TilesetSlot {
    Idle,
    Pending { asset_id: TilesetAssetId },
    Attached { asset_id: TilesetAssetId, primitive: PrimitiveId },
}

impl TilesetSlot {
    fn asset_id(&self) -> Option<TilesetAssetId> {
        match self {
            Self::Idle => None,
            Self::Pending { asset_id } | Self::Attached { asset_id, .. } => Some(*asset_id),
        }
    }
}

/// Loads imagery, terrain, the vector overlay and the optional tileset into
/// a ready scene.
///
/// Each load runs as a local task tagged with the epoch current when it
/// started. Completions re-check that epoch and the scene's liveness before
/// touching the scene, so teardown and reconfiguration only need to advance
/// a counter. The tileset additionally has its own counter so it can be
/// reconfigured without disturbing the other loads.
///
/// Loads are spawned with [`tokio::task::spawn_local`]; `start` and
/// `configure_tileset` must be called from inside a `LocalSet`.
pub struct ResourceOrchestrator {
    scene: SceneHandle,
    provider: Rc<dyn ResourceProvider>,
    epochs: EpochCounter,
    tileset_epochs: EpochCounter,
    navigation: NavigationController,
    diagnostics: DiagnosticBus,
    config: RefCell<OrchestratorConfig>,
    started: Cell<bool>,
    tileset: RefCell<TilesetSlot>,
    outcomes: RefCell<BTreeMap<ResourceKind, LoadOutcome>>,
    overlay_hook: RefCell<Option<Rc<dyn Fn()>>>,
    tasks: RefCell<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for ResourceOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceOrchestrator")
            .field("scene", &self.scene)
            .field("epoch", &self.epochs.current())
            .field("config", &self.config.borrow())
            .field("tileset", &self.tileset.borrow())
            .field("outcomes", &self.outcomes.borrow())
            .finish()
    }
}

impl ResourceOrchestrator {
    pub fn new(
        scene: SceneHandle,
        epochs: EpochCounter,
        diagnostics: DiagnosticBus,
        provider: Rc<dyn ResourceProvider>,
        navigation: NavigationController,
        config: OrchestratorConfig,
    ) -> Rc<Self> {
        Rc::new(Self {
            scene,
            provider,
            epochs,
            tileset_epochs: EpochCounter::new(),
            navigation,
            diagnostics,
            config: RefCell::new(config),
            started: Cell::new(false),
            tileset: RefCell::new(TilesetSlot::Idle),
            outcomes: RefCell::new(BTreeMap::new()),
            overlay_hook: RefCell::new(None),
            tasks: RefCell::new(Vec::new()),
        })
    }

    /// Orchestrator bound to a ready lifecycle's scene, epoch counter and
    /// diagnostic channel. `None` unless the lifecycle is ready.
    pub fn for_lifecycle(
        lifecycle: &ViewerLifecycle,
        provider: Rc<dyn ResourceProvider>,
        navigation: NavigationController,
        config: OrchestratorConfig,
    ) -> Option<Rc<Self>> {
        let scene = lifecycle.handle()?;
        Some(Self::new(
            scene,
            lifecycle.epochs().clone(),
            lifecycle.diagnostics().clone(),
            provider,
            navigation,
            config,
        ))
    }

    pub fn config(&self) -> OrchestratorConfig {
        self.config.borrow().clone()
    }

    pub fn current_epoch(&self) -> ResourceEpoch {
        self.epochs.current()
    }

    pub fn outcome(&self, kind: ResourceKind) -> Option<LoadOutcome> {
        self.outcomes.borrow().get(&kind).cloned()
    }

    pub fn outcomes(&self) -> Vec<(ResourceKind, LoadOutcome)> {
        self.outcomes
            .borrow()
            .iter()
            .map(|(kind, outcome)| (*kind, outcome.clone()))
            .collect()
    }

    /// Asset id of the tileset being loaded or attached.
    pub fn active_tileset(&self) -> Option<TilesetAssetId> {
        self.tileset.borrow().asset_id()
    }

    pub fn attached_tileset(&self) -> Option<PrimitiveId> {
        match *self.tileset.borrow() {
            TilesetSlot::Attached { primitive, .. } => Some(primitive),
            _ => None,
        }
    }

    /// Called after every overlay attach, outside the scene borrow.
    pub fn on_overlay_changed(&self, hook: impl Fn() + 'static) {
        *self.overlay_hook.borrow_mut() = Some(Rc::new(hook));
    }

    /// Begin a new generation of loads.
    ///
    /// Loads still in flight from a previous start become stale. Terrain is
    /// assigned synchronously; everything else completes on the local set.
    pub fn start(self: &Rc<Self>) -> ResourceEpoch {
        let epoch = self.epochs.advance();
        self.started.set(true);
        let config = self.config();
        info!(
            epoch = %epoch,
            imagery = %config.imagery_style,
            tileset = ?config.tileset.map(|id| id.get()),
            timeout = ?config.load_timeout,
            "resource orchestration starting"
        );

        self.attach_terrain();
        self.spawn_imagery(config.imagery_style, config.load_timeout);
        self.spawn_overlay(config.load_timeout);
        self.teardown_tileset();
        self.spawn_tileset(config.tileset, config.load_timeout);
        epoch
    }

    /// Switch the tileset to a new asset id (or disable it).
    ///
    /// The previous tileset is torn down before the new load begins. Asking
    /// for the asset that is already loading or attached does nothing.
    pub fn configure_tileset(self: &Rc<Self>, asset_id: Option<TilesetAssetId>) -> bool {
        if asset_id.is_some() && self.active_tileset() == asset_id {
            return false;
        }
        self.config.borrow_mut().tileset = asset_id;
        if !self.started.get() {
            return true;
        }
        self.teardown_tileset();
        let limit = self.config.borrow().load_timeout;
        self.spawn_tileset(asset_id, limit);
        true
    }

    /// Invalidate any pending tileset load and detach the attached one.
    ///
    /// Returns `true` if a primitive was removed from the scene.
    pub fn teardown_tileset(&self) -> bool {
        self.tileset_epochs.advance();
        let slot = std::mem::replace(&mut *self.tileset.borrow_mut(), TilesetSlot::Idle);
        match slot {
            TilesetSlot::Idle => false,
            TilesetSlot::Pending { asset_id } => {
                debug!(asset_id = %asset_id, "pending tileset load invalidated");
                false
            }
            TilesetSlot::Attached { asset_id, primitive } => {
                let removed = self
                    .scene
                    .with(|engine| engine.remove_primitive(primitive))
                    .unwrap_or(false);
                info!(asset_id = %asset_id, removed, "tileset detached");
                removed
            }
        }
    }

    /// Stop orchestrating: every pending load becomes a no-op and the tileset
    /// is detached.
    pub fn shutdown(&self) {
        if !self.started.replace(false) {
            return;
        }
        let epoch = self.epochs.advance();
        self.teardown_tileset();
        debug!(epoch = %epoch, "resource orchestration stopped");
    }

    /// Wait until every spawned load has completed.
    pub async fn settled(&self) {
        loop {
            let pending = std::mem::take(&mut *self.tasks.borrow_mut());
            if pending.is_empty() {
                return;
            }
            for task in pending {
                if let Err(err) = task.await {
                    warn!(%err, "resource load task ended abnormally");
                }
            }
        }
    }

    fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        let mut tasks = self.tasks.borrow_mut();
        tasks.retain(|t| !t.is_finished());
        tasks.push(tokio::task::spawn_local(task));
    }

    fn set_outcome(&self, kind: ResourceKind, outcome: LoadOutcome) {
        self.outcomes.borrow_mut().insert(kind, outcome);
    }

    fn is_current(&self, token: &EpochToken) -> bool {
        token.is_current() && self.scene.is_live()
    }

    fn fail(&self, kind: ResourceKind, err: &LoadError) {
        self.diagnostics
            .warn(kind.as_str(), format!("{} load failed: {err}", kind.as_str()));
        self.set_outcome(kind, LoadOutcome::Failed(err.to_string()));
    }

    fn discard(&self, kind: ResourceKind, token: &EpochToken) {
        debug!(
            kind = kind.as_str(),
            started = %token.epoch(),
            current = %self.epochs.current(),
            "stale load completion discarded"
        );
        self.set_outcome(kind, LoadOutcome::Stale);
    }

    fn attach_terrain(&self) {
        let terrain = TerrainProvider::fallback();
        if self.scene.with(|engine| engine.set_terrain(terrain)).is_some() {
            self.set_outcome(ResourceKind::Terrain, LoadOutcome::Attached);
        }
    }

    fn spawn_imagery(self: &Rc<Self>, style: ImageryStyle, limit: Option<Duration>) {
        let token = self.epochs.token();
        let load = self.provider.imagery(style);
        let this = Rc::downgrade(self);
        self.set_outcome(ResourceKind::Imagery, LoadOutcome::Pending);
        self.spawn(async move {
            let loaded = within("imagery", limit, load).await;
            if let Some(this) = Weak::upgrade(&this) {
                this.finish_imagery(&token, loaded);
            }
        });
    }

    fn finish_imagery(&self, token: &EpochToken, loaded: Result<ImageryProvider, LoadError>) {
        if !self.is_current(token) {
            self.discard(ResourceKind::Imagery, token);
            return;
        }
        match loaded {
            Ok(provider) => {
                let style = provider.style;
                self.scene.with(|engine| {
                    engine.clear_imagery();
                    engine.add_imagery(provider);
                });
                info!(style = %style, epoch = %token.epoch(), "imagery attached");
                self.set_outcome(ResourceKind::Imagery, LoadOutcome::Attached);
            }
            Err(err) => self.fail(ResourceKind::Imagery, &err),
        }

        // Runs whether or not the imagery arrived.
        self.navigation.reset_camera(&self.scene);
        self.scene.with(|engine| engine.request_render());
    }

    fn spawn_overlay(self: &Rc<Self>, limit: Option<Duration>) {
        let token = self.epochs.token();
        let load = self.provider.overlay();
        let this = Rc::downgrade(self);
        self.set_outcome(ResourceKind::Overlay, LoadOutcome::Pending);
        self.spawn(async move {
            let loaded = within("overlay", limit, load).await;
            if let Some(this) = Weak::upgrade(&this) {
                this.finish_overlay(&token, loaded);
            }
        });
    }

    fn finish_overlay(&self, token: &EpochToken, loaded: Result<OverlayDataset, LoadError>) {
        if !self.is_current(token) {
            self.discard(ResourceKind::Overlay, token);
            return;
        }
        let dataset = match loaded {
            Ok(dataset) => dataset.with_point_graphics(overlay_point_style()),
            Err(err) => {
                self.fail(ResourceKind::Overlay, &err);
                return;
            }
        };

        let entities = dataset.len();
        let name = dataset.name().to_string();
        let replaced = self.scene.with(|engine| {
            let replaced = engine.remove_all_overlays();
            engine.add_overlay(dataset);
            engine.request_render();
            replaced
        });
        let Some(replaced) = replaced else {
            self.discard(ResourceKind::Overlay, token);
            return;
        };
        info!(name = name.as_str(), entities, replaced, epoch = %token.epoch(), "overlay attached");
        self.set_outcome(ResourceKind::Overlay, LoadOutcome::Attached);

        let hook = self.overlay_hook.borrow().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn spawn_tileset(self: &Rc<Self>, asset_id: Option<TilesetAssetId>, limit: Option<Duration>) {
        let Some(asset_id) = asset_id else {
            info!("no tileset asset id configured; tileset disabled");
            return;
        };
        let token = self.epochs.token();
        let kind_token = self.tileset_epochs.token();
        *self.tileset.borrow_mut() = TilesetSlot::Pending { asset_id };
        self.set_outcome(ResourceKind::Tileset, LoadOutcome::Pending);

        let provider = self.provider.clone();
        let this = Rc::downgrade(self);
        self.spawn(async move {
            let loaded = within("tileset", limit, async {
                let resource = provider.resolve_tileset(asset_id).await?;
                provider.load_tileset(resource).await
            })
            .await;
            match Weak::upgrade(&this) {
                Some(this) => this.finish_tileset(asset_id, &token, &kind_token, loaded),
                None => {
                    if let Ok(mut tileset) = loaded {
                        tileset.destroy();
                    }
                }
            }
        });
    }

    fn finish_tileset(
        &self,
        asset_id: TilesetAssetId,
        token: &EpochToken,
        kind_token: &EpochToken,
        loaded: Result<Tileset, LoadError>,
    ) {
        if !self.is_current(token) || kind_token.is_stale() {
            if let Ok(mut tileset) = loaded {
                tileset.destroy();
            }
            self.discard(ResourceKind::Tileset, token);
            return;
        }
        let tileset = match loaded {
            Ok(tileset) => tileset,
            Err(err) => {
                *self.tileset.borrow_mut() = TilesetSlot::Idle;
                self.fail(ResourceKind::Tileset, &err);
                return;
            }
        };

        let mut pending = Some(tileset);
        let primitive = self
            .scene
            .with(|engine| pending.take().map(|t| engine.add_primitive(t)))
            .flatten();
        if let Some(mut unattached) = pending {
            unattached.destroy();
        }
        match primitive {
            Some(primitive) => {
                *self.tileset.borrow_mut() = TilesetSlot::Attached { asset_id, primitive };
                self.scene.with(|engine| engine.request_render());
                info!(asset_id = %asset_id, primitive = primitive.0, "tileset attached");
                self.set_outcome(ResourceKind::Tileset, LoadOutcome::Attached);
            }
            None => {
                *self.tileset.borrow_mut() = TilesetSlot::Idle;
                self.discard(ResourceKind::Tileset, token);
            }
        }
    }
}

async fn within<T>(
    what: &'static str,
    limit: Option<Duration>,
    load: impl Future<Output = Result<T, LoadError>>,
) -> Result<T, LoadError> {
    match limit {
        Some(after) => tokio::time::timeout(after, load)
            .await
            .map_err(|_| LoadError::Timeout { what, after })?,
        None => load.await,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::time::Duration;

    use foundation::math::Geodetic;
    use futures_util::FutureExt;
    use futures_util::future::LocalBoxFuture;
    use layers::raster::{ImageryProvider, ImageryStyle};
    use layers::symbology::overlay_point_style;
    use layers::tileset::{Tileset, TilesetAssetId, TilesetMetadata, TilesetResource};
    use pretty_assertions::assert_eq;
    use render::HeadlessEngine;
    use render::journal::SceneCommand;
    use runtime::{DiagnosticBus, Level};
    use scene::OverlayDataset;
    use scene::components::FeatureProperties;
    use tokio::sync::oneshot;
    use tokio::task::LocalSet;
    use viewer::{NavigationController, ViewerLifecycle, default_initial_view};

    use super::{LoadOutcome, OrchestratorConfig, ResourceKind, ResourceOrchestrator};
    use crate::error::LoadError;
    use crate::provider::ResourceProvider;

    type Reply<T> = oneshot::Sender<Result<T, LoadError>>;

    /// Queue of scripted replies, consumed one per request.
    struct Script<T> {
        replies: RefCell<VecDeque<oneshot::Receiver<Result<T, LoadError>>>>,
        requests: Cell<usize>,
    }

    impl<T> Default for Script<T> {
        fn default() -> Self {
            Self {
                replies: RefCell::new(VecDeque::new()),
                requests: Cell::new(0),
            }
        }
    }

    impl<T: 'static> Script<T> {
        fn pending(&self) -> Reply<T> {
            let (tx, rx) = oneshot::channel();
            self.replies.borrow_mut().push_back(rx);
            tx
        }

        fn ready(&self, reply: Result<T, LoadError>) {
            let _ = self.pending().send(reply);
        }

        fn next(&self) -> LocalBoxFuture<'static, Result<T, LoadError>> {
            self.requests.set(self.requests.get() + 1);
            let Some(rx) = self.replies.borrow_mut().pop_front() else {
                return async { Err(LoadError::Invalid("nothing scripted".into())) }.boxed_local();
            };
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(LoadError::Invalid("reply dropped".into())))
            }
            .boxed_local()
        }
    }

    #[derive(Default)]
    struct ScriptedProvider {
        imagery: Script<ImageryProvider>,
        overlay: Script<OverlayDataset>,
        resolve: Script<TilesetResource>,
        tileset: Script<Tileset>,
    }

    impl ResourceProvider for ScriptedProvider {
        fn imagery(&self, _style: ImageryStyle) -> LocalBoxFuture<'static, Result<ImageryProvider, LoadError>> {
            self.imagery.next()
        }

        fn overlay(&self) -> LocalBoxFuture<'static, Result<OverlayDataset, LoadError>> {
            self.overlay.next()
        }

        fn resolve_tileset(
            &self,
            _asset_id: TilesetAssetId,
        ) -> LocalBoxFuture<'static, Result<TilesetResource, LoadError>> {
            self.resolve.next()
        }

        fn load_tileset(&self, _resource: TilesetResource) -> LocalBoxFuture<'static, Result<Tileset, LoadError>> {
            self.tileset.next()
        }
    }

    struct Harness {
        lifecycle: ViewerLifecycle,
        engine: Rc<RefCell<HeadlessEngine>>,
        provider: Rc<ScriptedProvider>,
        orchestrator: Rc<ResourceOrchestrator>,
        diagnostics: DiagnosticBus,
    }

    impl Harness {
        fn new(config: OrchestratorConfig) -> Self {
            let engine = Rc::new(RefCell::new(HeadlessEngine::default()));
            let diagnostics = DiagnosticBus::new();
            let mut lifecycle = ViewerLifecycle::new(diagnostics.clone());
            let shared = engine.clone();
            lifecycle.on_surface_attached(move || Ok(shared)).expect("attach");
            let provider = Rc::new(ScriptedProvider::default());
            let orchestrator =
                ResourceOrchestrator::for_lifecycle(&lifecycle, provider.clone(), NavigationController::default(), config)
                    .expect("ready lifecycle");
            Self {
                lifecycle,
                engine,
                provider,
                orchestrator,
                diagnostics,
            }
        }

        fn journal(&self) -> Vec<SceneCommand> {
            self.engine.borrow_mut().take_journal()
        }
    }

    fn dataset(name: &str, ids: &[&str]) -> OverlayDataset {
        let mut ds = OverlayDataset::new(name);
        for (i, id) in ids.iter().enumerate() {
            ds.spawn(
                *id,
                Geodetic::from_degrees(133.5 + i as f64 * 0.01, 33.56, 0.0),
                FeatureProperties::from_pairs([("name", *id), ("type", "bridge")]),
            );
        }
        ds
    }

    fn tileset(asset_id: u64) -> (TilesetResource, Tileset) {
        let resource = TilesetResource {
            asset_id: TilesetAssetId::new(asset_id),
            url: format!("https://assets.example/{asset_id}/tileset.json"),
            access_token: None,
        };
        let tileset = Tileset::new(
            &resource,
            TilesetMetadata {
                version: "1.1".into(),
                geometric_error: 512.0,
            },
        );
        (resource, tileset)
    }

    fn script_tileset(provider: &ScriptedProvider, asset_id: u64) {
        let (resource, tileset) = tileset(asset_id);
        provider.resolve.ready(Ok(resource));
        provider.tileset.ready(Ok(tileset));
    }

    fn no_tileset() -> OrchestratorConfig {
        OrchestratorConfig::default()
    }

    #[tokio::test]
    async fn disposal_while_overlay_pending_is_a_silent_no_op() {
        LocalSet::new()
            .run_until(async {
                let mut h = Harness::new(no_tileset());
                h.provider
                    .imagery
                    .ready(Ok(ImageryProvider::new(ImageryStyle::AerialWithLabels, "https://tiles")));
                let overlay = h.provider.overlay.pending();

                h.orchestrator.start();
                h.lifecycle.dispose();
                h.journal();

                assert!(overlay.send(Ok(dataset("targets", &["b-1", "r-1"]))).is_ok());
                h.orchestrator.settled().await;

                assert_eq!(h.journal(), vec![]);
                assert_eq!(h.diagnostics.count_at_least(Level::Warn), 0);
                assert_eq!(h.orchestrator.outcome(ResourceKind::Overlay), Some(LoadOutcome::Stale));
                assert_eq!(h.orchestrator.outcome(ResourceKind::Imagery), Some(LoadOutcome::Stale));
            })
            .await;
    }

    #[tokio::test]
    async fn reloading_the_overlay_keeps_exactly_one_dataset() {
        LocalSet::new()
            .run_until(async {
                let h = Harness::new(no_tileset());
                h.provider.overlay.ready(Ok(dataset("first", &["a", "b"])));
                h.provider.overlay.ready(Ok(dataset("second", &["c"])));

                h.orchestrator.start();
                h.orchestrator.settled().await;
                h.orchestrator.start();
                h.orchestrator.settled().await;

                let engine = h.engine.borrow();
                assert_eq!(engine.overlays().len(), 1);
                let ids: Vec<_> = engine.overlays()[0].iter().map(|e| e.feature_id.as_str()).collect();
                assert_eq!(ids, vec!["c"]);
                assert!(
                    engine.overlays()[0]
                        .iter()
                        .all(|e| e.point == Some(overlay_point_style()))
                );
            })
            .await;
    }

    #[tokio::test]
    async fn overlay_is_swapped_in_one_step() {
        LocalSet::new()
            .run_until(async {
                let h = Harness::new(no_tileset());
                h.provider.overlay.ready(Ok(dataset("targets", &["a"])));
                let refreshed = Rc::new(Cell::new(0));
                let counter = refreshed.clone();
                h.orchestrator.on_overlay_changed(move || counter.set(counter.get() + 1));

                h.orchestrator.start();
                h.orchestrator.settled().await;

                let journal = h.journal();
                let swap: Vec<_> = journal
                    .iter()
                    .skip_while(|c| !matches!(c, SceneCommand::RemoveAllOverlays { .. }))
                    .take(3)
                    .cloned()
                    .collect();
                assert_eq!(
                    swap,
                    vec![
                        SceneCommand::RemoveAllOverlays { removed: 0 },
                        SceneCommand::AddOverlay {
                            name: "targets".into(),
                            entities: 1
                        },
                        SceneCommand::RequestRender,
                    ]
                );
                assert_eq!(refreshed.get(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn imagery_failure_still_resets_the_camera() {
        LocalSet::new()
            .run_until(async {
                let h = Harness::new(no_tileset());
                h.provider.imagery.ready(Err(LoadError::Status {
                    url: "https://api.example/v1/assets/3/endpoint".into(),
                    status: 401,
                }));
                h.provider.overlay.ready(Ok(dataset("targets", &["a"])));

                h.orchestrator.start();
                h.orchestrator.settled().await;

                let journal = h.journal();
                assert!(!journal.iter().any(|c| matches!(c, SceneCommand::AddImagery { .. })));
                let reset = journal
                    .iter()
                    .position(|c| *c == SceneCommand::SetCamera(default_initial_view()))
                    .expect("camera reset");
                assert_eq!(journal.get(reset + 1), Some(&SceneCommand::RequestRender));

                let warnings = h.diagnostics.events();
                assert!(warnings.iter().any(|d| d.level == Level::Warn && d.kind == "imagery"));
                assert!(matches!(
                    h.orchestrator.outcome(ResourceKind::Imagery),
                    Some(LoadOutcome::Failed(_))
                ));
                assert_eq!(h.engine.borrow().camera_view(), default_initial_view());
            })
            .await;
    }

    #[tokio::test]
    async fn imagery_success_replaces_existing_layers() {
        LocalSet::new()
            .run_until(async {
                let h = Harness::new(no_tileset());
                h.provider
                    .imagery
                    .ready(Ok(ImageryProvider::new(ImageryStyle::Road, "https://tiles/road")));

                h.orchestrator.start();
                h.orchestrator.settled().await;

                let journal = h.journal();
                let from = journal
                    .iter()
                    .position(|c| *c == SceneCommand::ClearImagery)
                    .expect("clear");
                assert_eq!(
                    journal[from..from + 4].to_vec(),
                    vec![
                        SceneCommand::ClearImagery,
                        SceneCommand::AddImagery {
                            style: ImageryStyle::Road
                        },
                        SceneCommand::SetCamera(default_initial_view()),
                        SceneCommand::RequestRender,
                    ]
                );
                assert_eq!(h.engine.borrow().imagery_layers().len(), 1);
                assert_eq!(h.orchestrator.outcome(ResourceKind::Terrain), Some(LoadOutcome::Attached));
            })
            .await;
    }

    #[tokio::test]
    async fn disabled_tileset_is_never_requested() {
        LocalSet::new()
            .run_until(async {
                let h = Harness::new(OrchestratorConfig {
                    tileset: TilesetAssetId::parse("-1.5"),
                    ..OrchestratorConfig::default()
                });
                h.orchestrator.start();
                h.orchestrator.settled().await;
                assert_eq!(h.provider.resolve.requests.get(), 0);
                assert_eq!(h.orchestrator.outcome(ResourceKind::Tileset), None);
            })
            .await;
    }

    #[tokio::test]
    async fn tileset_completing_after_reconfiguration_is_not_attached() {
        LocalSet::new()
            .run_until(async {
                let h = Harness::new(OrchestratorConfig {
                    tileset: Some(TilesetAssetId::new(2275207)),
                    ..OrchestratorConfig::default()
                });
                let (resource, late) = tileset(2275207);
                let observed = late.clone();
                h.provider.resolve.ready(Ok(resource));
                let reply = h.provider.tileset.pending();

                h.orchestrator.start();
                tokio::task::yield_now().await;
                assert!(h.orchestrator.configure_tileset(None));
                assert!(reply.send(Ok(late)).is_ok());
                h.orchestrator.settled().await;

                assert!(
                    !h.journal()
                        .iter()
                        .any(|c| matches!(c, SceneCommand::AddPrimitive { .. }))
                );
                assert_eq!(h.engine.borrow().primitives().count(), 0);
                assert_eq!(h.orchestrator.outcome(ResourceKind::Tileset), Some(LoadOutcome::Stale));
                assert!(observed.is_destroyed());
            })
            .await;
    }

    #[tokio::test]
    async fn disposal_while_tileset_pending_is_a_silent_no_op() {
        LocalSet::new()
            .run_until(async {
                let mut h = Harness::new(OrchestratorConfig {
                    tileset: Some(TilesetAssetId::new(96188)),
                    ..OrchestratorConfig::default()
                });
                h.provider
                    .imagery
                    .ready(Ok(ImageryProvider::new(ImageryStyle::Aerial, "https://tiles")));
                h.provider.overlay.ready(Ok(dataset("targets", &["b-1"])));
                let (resource, late) = tileset(96188);
                let observed = late.clone();
                h.provider.resolve.ready(Ok(resource));
                let reply = h.provider.tileset.pending();

                h.orchestrator.start();
                tokio::task::yield_now().await;
                h.lifecycle.dispose();
                h.journal();

                assert!(reply.send(Ok(late)).is_ok());
                h.orchestrator.settled().await;

                assert_eq!(h.journal(), vec![]);
                assert_eq!(h.diagnostics.count_at_least(Level::Warn), 0);
                assert_eq!(h.orchestrator.outcome(ResourceKind::Tileset), Some(LoadOutcome::Stale));
                assert_eq!(h.orchestrator.attached_tileset(), None);
                assert!(observed.is_destroyed());
            })
            .await;
    }

    #[tokio::test]
    async fn reconfiguring_the_tileset_detaches_the_old_one_exactly_once() {
        LocalSet::new()
            .run_until(async {
                let mut h = Harness::new(OrchestratorConfig {
                    tileset: Some(TilesetAssetId::new(1)),
                    ..OrchestratorConfig::default()
                });
                script_tileset(&h.provider, 1);
                script_tileset(&h.provider, 2);

                h.orchestrator.start();
                h.orchestrator.settled().await;
                let first = h.orchestrator.attached_tileset().expect("first attached");
                h.journal();

                assert!(h.orchestrator.configure_tileset(Some(TilesetAssetId::new(2))));
                assert!(!h.orchestrator.configure_tileset(Some(TilesetAssetId::new(2))));
                h.orchestrator.settled().await;

                let journal = h.journal();
                let removals: Vec<_> = journal
                    .iter()
                    .filter(|c| matches!(c, SceneCommand::RemovePrimitive { .. }))
                    .collect();
                assert_eq!(removals, vec![&SceneCommand::RemovePrimitive { id: first }]);
                assert_eq!(h.orchestrator.active_tileset(), Some(TilesetAssetId::new(2)));
                {
                    let engine = h.engine.borrow();
                    let attached: Vec<_> = engine.primitives().map(|(_, t)| t.asset_id()).collect();
                    assert_eq!(attached, vec![TilesetAssetId::new(2)]);
                }

                h.orchestrator.shutdown();
                h.lifecycle.dispose();
                let removals = h
                    .journal()
                    .iter()
                    .filter(|c| matches!(c, SceneCommand::RemovePrimitive { .. }))
                    .count();
                assert_eq!(removals, 1);
                assert!(!h.orchestrator.teardown_tileset());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_loads_time_out_as_ordinary_failures() {
        LocalSet::new()
            .run_until(async {
                let h = Harness::new(OrchestratorConfig {
                    load_timeout: Some(Duration::from_secs(5)),
                    ..OrchestratorConfig::default()
                });
                let _imagery = h.provider.imagery.pending();
                let _overlay = h.provider.overlay.pending();

                h.orchestrator.start();
                h.orchestrator.settled().await;

                match h.orchestrator.outcome(ResourceKind::Overlay) {
                    Some(LoadOutcome::Failed(reason)) => assert!(reason.contains("timed out"), "{reason}"),
                    other => panic!("unexpected overlay outcome {other:?}"),
                }
                assert_eq!(h.engine.borrow().camera_view(), default_initial_view());
                assert_eq!(h.diagnostics.count_at_least(Level::Warn), 2);
            })
            .await;
    }
}
