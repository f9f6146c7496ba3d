pub mod projection;
pub mod spline;
pub mod stats;

pub use projection::{MapProjection, Orthographic};
pub use spline::{CubicSpline, SplineError};
pub use stats::{GeoExtent, StatsHelper};
