use std::rc::Rc;

use scene::selection::SelectedFeature;
use tracing::debug;

use crate::bridge::StateBridge;
use crate::engine::{ClickCallback, ClickEvent, ClickHandlerId, MouseButton, SceneHandle};

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Selected(String),
    Deselected,
    /// Not a primary click; nothing published.
    Ignored,
    /// The scene is gone; nothing published.
    SceneUnavailable,
}

struct Registration {
    scene: SceneHandle,
    handler: ClickHandlerId,
}

/// Keeps exactly one click handler registered on the live scene and turns
/// primary clicks into published selections.
pub struct PickingController {
    bridge: Rc<dyn StateBridge>,
    registration: Option<Registration>,
}

impl PickingController {
    pub fn new(bridge: Rc<dyn StateBridge>) -> Self {
        Self {
            bridge,
            registration: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.registration
            .as_ref()
            .is_some_and(|r| r.scene.is_live())
    }

    /// Register on `scene`. A no-op when already registered on that same
    /// live scene; otherwise any previous registration is removed first.
    /// Returns whether a new handler was installed.
    pub fn attach(&mut self, scene: &SceneHandle) -> bool {
        if let Some(reg) = &self.registration {
            if reg.scene.id() == scene.id() && reg.scene.is_live() {
                return false;
            }
            self.detach();
        }

        let bridge = self.bridge.clone();
        let target = scene.clone();
        let callback: ClickCallback = Rc::new(move |event| {
            handle_click(&target, bridge.as_ref(), event);
        });
        let Some(handler) = scene.with(|engine| engine.add_click_handler(callback)) else {
            return false;
        };
        debug!(scene = scene.id().0, handler = handler.0, "pick handler registered");
        self.registration = Some(Registration {
            scene: scene.clone(),
            handler,
        });
        true
    }

    /// Unregister the handler, if any.
    pub fn detach(&mut self) -> bool {
        let Some(reg) = self.registration.take() else {
            return false;
        };
        let removed = reg
            .scene
            .with(|engine| engine.remove_click_handler(reg.handler))
            .unwrap_or(false);
        debug!(scene = reg.scene.id().0, removed, "pick handler unregistered");
        removed
    }
}

impl Drop for PickingController {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Resolve one click against the scene and publish the result.
///
/// A hit publishes the entity's property snapshot; a miss publishes `None`.
pub fn handle_click(scene: &SceneHandle, bridge: &dyn StateBridge, event: ClickEvent) -> ClickOutcome {
    if event.button != MouseButton::Primary {
        return ClickOutcome::Ignored;
    }
    let Some(selection) = scene.with(|engine| {
        let entity = engine.pick(event.position)?;
        engine
            .overlay()
            .and_then(|ds| ds.entity(entity))
            .map(SelectedFeature::snapshot)
    }) else {
        return ClickOutcome::SceneUnavailable;
    };

    let outcome = match &selection {
        Some(selected) => ClickOutcome::Selected(selected.id.clone()),
        None => ClickOutcome::Deselected,
    };
    bridge.publish_selection(selection);
    outcome
}
