use crate::prelude::{ProcedureMode, VisionResult};
use crate::telemetry::LogManager;
use crate::vision::detection::AnalysisResult;
use crate::vision::fallback::fallback_analysis;
use crate::vision::prompts::{prompt_for, select_model};
use crate::vision::reply::parse_analysis;
use crate::vision::transport::{VisionRequest, VisionTransport};

/// Wraps the remote multimodal model for one procedure-mode analysis at a time.
pub struct VisionClient<T> {
    transport: T,
    logger: LogManager,
}

impl<T: VisionTransport> VisionClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            logger: LogManager::new("vision"),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Analyzes the capture, surfacing every failure to the caller.
    pub async fn try_analyze(
        &self,
        image_jpeg: &[u8],
        mode: ProcedureMode,
    ) -> VisionResult<AnalysisResult> {
        let model = select_model(mode);
        let request = VisionRequest {
            model,
            prompt: prompt_for(mode),
            image_jpeg: image_jpeg.to_vec(),
        };

        let reply = self.transport.generate(request).await?;
        let result = parse_analysis(&reply)?;
        self.logger.record(&format!(
            "{} analysis via {}: {} detections",
            mode,
            model.model_id(),
            result.detections.len()
        ));
        Ok(result)
    }

    /// Analyzes the capture, substituting the mode's fallback table on any failure.
    pub async fn analyze(&self, image_jpeg: &[u8], mode: ProcedureMode) -> AnalysisResult {
        match self.try_analyze(image_jpeg, mode).await {
            Ok(result) => result,
            Err(err) => {
                self.logger
                    .degrade(&format!("{} analysis failed ({}); using fallback", mode, err));
                fallback_analysis(mode)
            }
        }
    }
}
