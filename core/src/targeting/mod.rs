pub mod chest;
pub mod pulse;
pub mod target;

pub use chest::{assess_pose, resolve_chest_target, PoseAssessment};
pub use pulse::{determine_recommended_position, resolve_pulse, resolve_pulse_target, PulseResolution};
pub use target::{PlacementTarget, PositionKind, PulseSite};
