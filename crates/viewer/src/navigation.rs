use std::rc::Rc;

use runtime::TeardownKind;
use scene::camera::{CameraDestination, CameraFlight, CameraView, FLIGHT_DURATION, NavigationError};
use tracing::{debug, info};

use crate::engine::{HomeCallback, SceneHandle};
use crate::lifecycle::ViewerLifecycle;

/// Whole-Japan overview, looking straight down.
pub fn default_initial_view() -> CameraView {
    CameraView::top_down(CameraDestination::TOKYO_OVERVIEW)
}

/// Where the camera starts and where "home" goes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InitialView {
    Fixed(CameraView),
    EngineDefault,
}

impl Default for InitialView {
    fn default() -> Self {
        Self::Fixed(default_initial_view())
    }
}

/// Validated navigation requests and the initial/home framing.
#[derive(Debug, Clone, Default)]
pub struct NavigationController {
    initial_view: InitialView,
}

impl NavigationController {
    pub fn new(initial_view: InitialView) -> Self {
        Self { initial_view }
    }

    pub fn initial_view(&self) -> InitialView {
        self.initial_view
    }

    /// Validate form input and fly there.
    ///
    /// Validation errors are returned before the scene is consulted, so a
    /// rejected request never issues a camera command.
    pub fn fly_to(
        &self,
        scene: &SceneHandle,
        lon: &str,
        lat: &str,
        height: &str,
    ) -> Result<CameraDestination, NavigationError> {
        let destination = CameraDestination::parse(lon, lat, height)?;
        scene
            .with(|engine| engine.fly_to(CameraFlight::to(destination)))
            .ok_or(NavigationError::SceneUnavailable)?;
        info!(
            lon = destination.lon_deg(),
            lat = destination.lat_deg(),
            height = destination.height_m(),
            "flying to destination"
        );
        Ok(destination)
    }

    /// Snap the camera to the initial framing without animation.
    pub fn reset_camera(&self, scene: &SceneHandle) -> bool {
        let view = self.initial_view;
        scene
            .with(|engine| match view {
                InitialView::Fixed(view) => engine.set_camera(view),
                InitialView::EngineDefault => engine.home(),
            })
            .is_some()
    }

    /// Animated return to the initial framing.
    pub fn go_home(&self, scene: &SceneHandle) -> Result<(), NavigationError> {
        let view = self.initial_view;
        scene
            .with(|engine| match view {
                InitialView::Fixed(view) => engine.fly_to(CameraFlight {
                    view,
                    duration: FLIGHT_DURATION,
                }),
                InitialView::EngineDefault => engine.home(),
            })
            .ok_or(NavigationError::SceneUnavailable)
    }

    /// Route the engine's home button to [`NavigationController::go_home`].
    ///
    /// Only a fixed initial view needs the override. The override is removed
    /// again when the lifecycle tears down.
    pub fn install_home_override(&self, lifecycle: &mut ViewerLifecycle) -> bool {
        if self.initial_view == InitialView::EngineDefault {
            return false;
        }
        let Some(scene) = lifecycle.handle() else {
            return false;
        };

        let controller = self.clone();
        let target = scene.clone();
        let handler: HomeCallback = Rc::new(move || {
            if let Err(err) = controller.go_home(&target) {
                debug!(%err, "home override skipped");
            }
        });
        if scene.with(|engine| engine.set_home_override(Some(handler))).is_none() {
            return false;
        }

        lifecycle.register_teardown(TeardownKind::Listener, "home-override", move || {
            scene.with(|engine| engine.set_home_override(None));
        });
        true
    }
}
