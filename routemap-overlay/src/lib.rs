pub mod config;
pub mod loader;
pub mod plan;
pub mod raster;
pub mod renderer;
pub mod style;
pub mod surface;

pub use config::OverlayConfig;
pub use loader::{FloorplanLoader, FloorplanReference, ImageLoader, LoadError};
pub use plan::{OverlayPlan, plan_overlay};
pub use renderer::{RenderError, RenderPhase, RenderStatus, RouteOverlayRenderer};
pub use style::OverlayStyle;
pub use surface::RenderSurface;
