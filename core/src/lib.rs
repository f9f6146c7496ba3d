//! Core of the oceanet processing tool-chain.
//!
//! Reads ship tracks, fits cubic position interpolants over elapsed track time,
//! derives record timestamps from image files and station logs, and runs the
//! window and position stages that place every record on the track.

pub mod math;
pub mod prelude;
pub mod processing;
pub mod records;
pub mod telemetry;
pub mod time;
pub mod track;

pub use prelude::{ProcessingStage, Record, StageInput, StageOutput};
