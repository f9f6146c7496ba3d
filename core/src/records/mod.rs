//! Sources of timestamped records: camera images and station sensor files.

pub mod exposure;
pub mod sensor;

pub use exposure::{Exposure, ExposureError, ExposureRule, ExposureSource};
pub use sensor::{parse_scaw, SensorBatch, SensorError, SensorReading};
