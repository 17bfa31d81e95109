pub mod coordinates;
pub mod reference;
pub mod route;

pub use coordinates::{PixelPoint, Waypoint};
pub use reference::{
    ConfigError, DEFAULT_REFERENCE_HEIGHT, DEFAULT_REFERENCE_WIDTH, ReferenceSpace, Scale,
};
pub use route::{RouteDescriptor, RouteError};
