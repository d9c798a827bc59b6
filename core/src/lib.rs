//! Coordination core for camera-guided first-aid instructions.
//!
//! A capture is analyzed by a remote vision model, resolved into a single
//! placement target, compared against the live hand or finger position and
//! turned into on-screen, haptic and spoken guidance. A metronome paces chest
//! compressions independently of the analysis loop.

pub mod config;
pub mod dispatcher;
pub mod feedback;
pub mod guidance;
pub mod metronome;
pub mod prelude;
pub mod targeting;
pub mod telemetry;
pub mod vision;

pub use prelude::{CoordinatorError, ImageSize, PixelPoint, ProcedureMode, VisionError};
