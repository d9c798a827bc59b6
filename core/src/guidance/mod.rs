pub mod accuracy;
pub mod placement;

pub use accuracy::{
    classify, AccuracyClassification, AccuracyTracker, LivePositions, OverlayColor,
    PlacementCheck,
};
pub use placement::{evaluate_placement, instruction_for, Direction, PlacementFeedback};
