use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::RgbaImage;
use routemap_core::RouteDescriptor;
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::config::OverlayConfig;
use crate::loader::{FloorplanLoader, FloorplanReference, ImageLoader, LoadError};
use crate::plan::{OverlayPlan, plan_overlay};
use crate::surface::RenderSurface;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("route overlay renderer needs a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error(transparent)]
    Config(#[from] routemap_core::ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    /// No floorplan supplied yet.
    Idle,
    /// Decode in flight, or failed. Nothing is drawn.
    Loading,
    /// Surface sized and background drawn.
    Ready,
    /// Path and marker drawn, or skipped because the route had none.
    Overlaid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStatus {
    pub phase: RenderPhase,
    /// Bumped for every new floorplan reference.
    pub generation: u64,
    pub decodes_started: u64,
    /// Decodes of the current-at-the-time floorplan that failed. The phase
    /// stays `Loading` after a failure; this lets callers stop waiting.
    pub decodes_failed: u64,
    pub frames_drawn: u64,
}

impl RenderStatus {
    fn idle() -> Self {
        Self {
            phase: RenderPhase::Idle,
            generation: 0,
            decodes_started: 0,
            decodes_failed: 0,
            frames_drawn: 0,
        }
    }
}

struct RenderState {
    floorplan: Option<FloorplanReference>,
    route: Option<RouteDescriptor>,
    decoded: Option<RgbaImage>,
    surface: RenderSurface,
    plan: Option<OverlayPlan>,
    status: RenderStatus,
}

struct Shared {
    state: Mutex<RenderState>,
    status: watch::Sender<RenderStatus>,
    config: OverlayConfig,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RenderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &RenderState) {
        self.status.send_replace(state.status);
    }

    fn complete_decode(&self, generation: u64, result: Result<RgbaImage, LoadError>) {
        let mut state = self.lock();
        if state.status.generation != generation {
            tracing::debug!(
                generation,
                current = state.status.generation,
                "discarding superseded floorplan decode"
            );
            return;
        }

        match result {
            Ok(image) => {
                tracing::debug!(
                    generation,
                    width = image.width(),
                    height = image.height(),
                    "floorplan decoded"
                );
                state.decoded = Some(image);
                self.draw_frame(&mut state);
            }
            Err(err) => {
                tracing::warn!(generation, error = %err, "floorplan failed to load; nothing drawn");
                state.status.decodes_failed += 1;
                self.publish(&state);
            }
        }
    }

    /// Draws a whole frame from the decoded floorplan and the current route.
    /// Runs under the state lock so no reader sees a partial frame.
    fn draw_frame(&self, state: &mut RenderState) {
        let Some(floorplan) = state.decoded.as_ref() else {
            return;
        };

        if let Err(err) = state.surface.draw_background(floorplan) {
            tracing::warn!(error = %err, "failed to draw floorplan background");
            state.surface.clear();
            return;
        }
        state.status.phase = RenderPhase::Ready;
        self.publish(state);

        let plan = plan_overlay(
            state.route.as_ref(),
            &self.config.reference,
            floorplan.dimensions(),
        );
        state.surface.draw_overlay(&plan, &self.config.style);
        tracing::debug!(
            generation = state.status.generation,
            path_points = plan.polyline.len(),
            marker = plan.marker.is_some(),
            "route overlay drawn"
        );

        state.plan = Some(plan);
        state.status.phase = RenderPhase::Overlaid;
        state.status.frames_drawn += 1;
        self.publish(state);
    }
}

/// Composites a route over a floorplan at the floorplan's natural resolution.
///
/// `render` returns immediately. Decoding happens on the tokio runtime the
/// renderer was created in; progress is observable through [`subscribe`] and
/// the result through [`snapshot`].
///
/// [`subscribe`]: RouteOverlayRenderer::subscribe
/// [`snapshot`]: RouteOverlayRenderer::snapshot
pub struct RouteOverlayRenderer<L: FloorplanLoader = ImageLoader> {
    shared: Arc<Shared>,
    loader: Arc<L>,
    runtime: Handle,
}

impl RouteOverlayRenderer<ImageLoader> {
    pub fn new(config: OverlayConfig) -> Result<Self, RenderError> {
        Self::with_loader(ImageLoader::new(), config)
    }
}

impl<L: FloorplanLoader> RouteOverlayRenderer<L> {
    pub fn with_loader(loader: L, config: OverlayConfig) -> Result<Self, RenderError> {
        Self::with_loader_on(loader, config, Handle::try_current()?)
    }

    pub fn with_loader_on(
        loader: L,
        config: OverlayConfig,
        runtime: Handle,
    ) -> Result<Self, RenderError> {
        config.validate()?;
        let status = RenderStatus::idle();
        let state = RenderState {
            floorplan: None,
            route: None,
            decoded: None,
            surface: RenderSurface::new(),
            plan: None,
            status,
        };

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                status: watch::Sender::new(status),
                config,
            }),
            loader: Arc::new(loader),
            runtime,
        })
    }

    /// Starts a render cycle if `floorplan` or `route` differ from the
    /// previous call. A new floorplan is decoded once; a new route for an
    /// already decoded floorplan is only redrawn. A route that arrives while
    /// the floorplan is still decoding replaces the pending one.
    pub fn render(&self, floorplan: FloorplanReference, route: Option<RouteDescriptor>) {
        let mut state = self.shared.lock();

        if state.floorplan.as_ref() == Some(&floorplan) {
            if state.route == route {
                return;
            }
            state.route = route;
            if state.decoded.is_some() {
                self.shared.draw_frame(&mut state);
            } else {
                tracing::debug!(
                    generation = state.status.generation,
                    "route replaced while floorplan is loading"
                );
            }
            return;
        }

        state.status.generation += 1;
        state.status.decodes_started += 1;
        state.status.phase = RenderPhase::Loading;
        let generation = state.status.generation;
        tracing::debug!(generation, floorplan = %floorplan.describe(), "loading floorplan");

        state.floorplan = Some(floorplan.clone());
        state.route = route;
        state.decoded = None;
        state.plan = None;
        state.surface.clear();
        self.shared.publish(&state);
        drop(state);

        let shared = Arc::clone(&self.shared);
        let loader = Arc::clone(&self.loader);
        self.runtime.spawn(async move {
            let result = loader.load(&floorplan).await;
            let drawn =
                tokio::task::spawn_blocking(move || shared.complete_decode(generation, result))
                    .await;
            if let Err(err) = drawn {
                tracing::warn!(generation, error = %err, "floorplan draw task failed");
            }
        });
    }

    pub fn status(&self) -> RenderStatus {
        *self.shared.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderStatus> {
        self.shared.status.subscribe()
    }

    /// Copy of the composited surface, or `None` while nothing is drawn.
    pub fn snapshot(&self) -> Option<RgbaImage> {
        let state = self.shared.lock();
        (!state.surface.is_blank()).then(|| state.surface.image().clone())
    }

    /// Geometry of the last drawn overlay.
    pub fn last_plan(&self) -> Option<OverlayPlan> {
        self.shared.lock().plan.clone()
    }
}
