use std::cell::{Cell, RefCell};
use std::rc::Rc;

use runtime::{DiagnosticBus, EpochCounter, ResourceEpoch, TeardownId, TeardownKind, TeardownRegistry};
use thiserror::Error;
use tracing::{debug, info};

use crate::engine::{SceneEngine, SceneHandle, SceneId};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    Disposed,
}

/// The engine could not attach to its rendering surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct AttachError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("scene engine failed to attach: {0}")]
    Attach(#[from] AttachError),
    #[error("viewer already disposed")]
    Disposed,
}

/// Owns the scene engine and drives `Uninitialized -> Initializing -> Ready -> Disposed`.
///
/// Everything else sees the scene through a [`SceneHandle`]. Dispose runs
/// registered teardown actions, advances the shared epoch (invalidating every
/// pending load), marks handles dead and destroys the engine exactly once.
pub struct ViewerLifecycle {
    state: LifecycleState,
    engine: Option<Rc<RefCell<dyn SceneEngine>>>,
    handle: Option<SceneHandle>,
    live: Rc<Cell<bool>>,
    epochs: EpochCounter,
    teardown: TeardownRegistry,
    diagnostics: DiagnosticBus,
}

impl std::fmt::Debug for ViewerLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerLifecycle")
            .field("state", &self.state)
            .field("handle", &self.handle)
            .field("epoch", &self.epochs.current())
            .field("teardown", &self.teardown)
            .finish()
    }
}

impl ViewerLifecycle {
    pub fn new(diagnostics: DiagnosticBus) -> Self {
        Self {
            state: LifecycleState::Uninitialized,
            engine: None,
            handle: None,
            live: Rc::new(Cell::new(false)),
            epochs: EpochCounter::new(),
            teardown: TeardownRegistry::new(),
            diagnostics,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LifecycleState::Ready
    }

    /// The rendering surface is being created.
    pub fn begin(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::Uninitialized => {
                self.state = LifecycleState::Initializing;
                debug!("viewer initializing");
                Ok(())
            }
            LifecycleState::Initializing | LifecycleState::Ready => Ok(()),
            LifecycleState::Disposed => Err(LifecycleError::Disposed),
        }
    }

    /// The surface reported attachment; create the scene.
    ///
    /// A second readiness signal returns the existing handle without calling
    /// `factory`. A factory failure is fatal: the lifecycle becomes
    /// `Disposed` and the error is returned.
    pub fn on_surface_attached<E, F>(&mut self, factory: F) -> Result<SceneHandle, LifecycleError>
    where
        E: SceneEngine + 'static,
        F: FnOnce() -> Result<Rc<RefCell<E>>, AttachError>,
    {
        self.begin()?;
        if let Some(handle) = &self.handle {
            debug!(scene = handle.id().0, "readiness signalled again; keeping existing scene");
            return Ok(handle.clone());
        }

        let engine: Rc<RefCell<dyn SceneEngine>> = match factory() {
            Ok(engine) => engine,
            Err(err) => {
                self.state = LifecycleState::Disposed;
                self.epochs.advance();
                self.diagnostics
                    .error("lifecycle", format!("scene engine failed to attach: {err}"));
                return Err(err.into());
            }
        };

        let id = SceneId::next();
        self.live.set(true);
        let handle = SceneHandle::new(id, Rc::downgrade(&engine), self.live.clone());
        self.engine = Some(engine);
        self.handle = Some(handle.clone());
        self.state = LifecycleState::Ready;
        info!(scene = id.0, epoch = %self.epochs.current(), "viewer ready");
        Ok(handle)
    }

    /// Live scene handle, only between Ready and Disposed.
    pub fn handle(&self) -> Option<SceneHandle> {
        self.handle.clone()
    }

    /// Epoch counter shared with every async consumer of this scene.
    pub fn epochs(&self) -> &EpochCounter {
        &self.epochs
    }

    pub fn current_epoch(&self) -> ResourceEpoch {
        self.epochs.current()
    }

    pub fn diagnostics(&self) -> &DiagnosticBus {
        &self.diagnostics
    }

    /// Register a timer/listener cancellation to run on dispose.
    ///
    /// After dispose the action runs immediately and `None` is returned.
    pub fn register_teardown(
        &mut self,
        kind: TeardownKind,
        label: &'static str,
        action: impl FnOnce() + 'static,
    ) -> Option<TeardownId> {
        if self.state == LifecycleState::Disposed {
            action();
            return None;
        }
        Some(self.teardown.register(kind, label, action))
    }

    /// Cancel one registration early.
    pub fn release(&mut self, id: TeardownId) -> bool {
        self.teardown.release(id)
    }

    pub fn pending_teardown(&self) -> usize {
        self.teardown.len()
    }

    /// Tear the viewer down. Idempotent.
    pub fn dispose(&mut self) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        let released = self.teardown.run_all();
        let epoch = self.epochs.advance();
        self.live.set(false);
        self.handle = None;

        if let Some(engine) = self.engine.take() {
            match engine.try_borrow_mut() {
                Ok(mut engine) => engine.destroy(),
                Err(_) => self
                    .diagnostics
                    .error("lifecycle", "scene engine busy during dispose; destroy skipped"),
            }
        }

        self.state = LifecycleState::Disposed;
        info!(released, epoch = %epoch, "viewer disposed");
    }
}

impl Drop for ViewerLifecycle {
    fn drop(&mut self) {
        self.dispose();
    }
}
