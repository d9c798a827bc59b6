pub mod client;
pub mod detection;
pub mod fallback;
pub mod prompts;
pub mod reply;
pub mod transport;

pub use client::VisionClient;
pub use detection::{AnalysisResult, AnalysisSource, Detection};
pub use fallback::fallback_analysis;
pub use prompts::{select_model, ModelTier};
pub use reply::{extract_json_object, ModelReply};
pub use transport::{HttpVisionTransport, VisionRequest, VisionTransport};
