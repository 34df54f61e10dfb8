use std::cell::Cell;
use std::rc::{Rc, Weak};

use scene::visibility::{self, FilterCriteria, VisibilityUpdate};
use tracing::debug;

use crate::bridge::{StateBridge, SubscriptionId};
use crate::engine::SceneHandle;

/// Re-derives overlay visibility whenever the criteria or the dataset change.
pub struct VisibilityController {
    scene: SceneHandle,
    bridge: Rc<dyn StateBridge>,
    subscription: Cell<Option<SubscriptionId>>,
}

impl VisibilityController {
    pub fn new(scene: SceneHandle, bridge: Rc<dyn StateBridge>) -> Rc<Self> {
        Rc::new(Self {
            scene,
            bridge,
            subscription: Cell::new(None),
        })
    }

    /// Recompute with the bridge's current criteria. Used after the overlay
    /// dataset is replaced.
    pub fn refresh(&self) -> Option<VisibilityUpdate> {
        let criteria = self.bridge.filter_criteria();
        apply_criteria(&self.scene, &criteria)
    }

    /// Follow criteria changes published through the bridge.
    pub fn watch(self: &Rc<Self>) -> SubscriptionId {
        if let Some(id) = self.subscription.get() {
            return id;
        }
        let this: Weak<Self> = Rc::downgrade(self);
        let id = self.bridge.subscribe_criteria(Rc::new(move |criteria: &FilterCriteria| {
            if let Some(this) = this.upgrade() {
                apply_criteria(&this.scene, criteria);
            }
        }));
        self.subscription.set(Some(id));
        id
    }

    pub fn unwatch(&self) -> bool {
        match self.subscription.take() {
            Some(id) => self.bridge.unsubscribe(id),
            None => false,
        }
    }
}

/// Apply `criteria` to the attached overlay and request a render.
///
/// Returns `None` without touching the scene when no overlay is attached or
/// the scene is gone.
pub fn apply_criteria(scene: &SceneHandle, criteria: &FilterCriteria) -> Option<VisibilityUpdate> {
    let update = scene
        .with(|engine| {
            let dataset = engine.overlay_mut()?;
            let update = visibility::refresh(dataset, criteria);
            engine.request_render();
            Some(update)
        })
        .flatten()?;
    debug!(
        visible = update.visible,
        hidden = update.hidden,
        changed = update.changed,
        "overlay visibility recomputed"
    );
    Some(update)
}
