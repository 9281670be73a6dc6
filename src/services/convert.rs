use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::AppConfig;
use crate::services::executor::CommandRunner;
use crate::services::strategy::{self, ConversionKind, StrategyError};
use crate::services::workspace::{StagedFile, Workspace};
use crate::utils::validation;

/// Failure taxonomy of the conversion pipeline. Mapped to HTTP statuses
/// at the API boundary.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Conversion timed out after {0:?}")]
    Timeout(Duration),

    #[error("Conversion failed: {0}")]
    Failed(String),

    #[error("Conversion completed but output file not found")]
    ArtifactMissing,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Output file produced by a successful conversion, owned by the caller
/// until released.
#[derive(Debug)]
pub struct ConvertedArtifact {
    pub file: StagedFile,
    pub size: u64,
    pub media_type: &'static str,
    pub download_name: String,
}

/// Per-item outcome of a batch request.
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchItemResult {
    pub filename: String,
    pub status: String,
    pub message: String,
}

impl BatchItemResult {
    fn success(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            status: "success".to_string(),
            message: "Converted successfully".to_string(),
        }
    }

    fn error(filename: &str, message: impl Into<String>) -> Self {
        Self {
            filename: filename.to_string(),
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

/// Orchestrates one conversion request: validate, stage, run the tool
/// chain, locate the artifact, and release the staged input on every
/// exit path.
pub struct ConversionService {
    workspace: Workspace,
    runner: Arc<dyn CommandRunner>,
    config: AppConfig,
}

impl ConversionService {
    pub fn new(workspace: Workspace, runner: Arc<dyn CommandRunner>, config: AppConfig) -> Self {
        Self {
            workspace,
            runner,
            config,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Convert an uploaded document. On return the staged input no
    /// longer exists, whatever the outcome; the produced artifact is
    /// the caller's to release after streaming.
    pub async fn convert(
        &self,
        kind: ConversionKind,
        body: Bytes,
        original_filename: &str,
    ) -> Result<ConvertedArtifact, ConvertError> {
        // All validation happens before any filesystem I/O
        let source_ext = validation::matched_extension(original_filename, kind.accepted_extensions())
            .ok_or_else(|| {
                ConvertError::InvalidInput(format!(
                    "File must have one of the extensions: {}",
                    kind.accepted_extensions().join(", ")
                ))
            })?;

        if body.is_empty() {
            return Err(ConvertError::InvalidInput(
                "Uploaded file is empty".to_string(),
            ));
        }

        let download_name =
            validation::download_name(original_filename, source_ext, kind.target_extension());

        let staged = self.workspace.allocate(kind.staging_extension());
        tracing::info!(
            "📄 {} request: {} staged as {}",
            kind.label(),
            original_filename,
            staged.path().display()
        );

        let result = self.convert_staged(kind, &staged, &body).await;
        staged.release().await;

        let file = result?;
        let size = tokio::fs::metadata(file.path())
            .await
            .map(|m| m.len())
            .map_err(|e| ConvertError::Internal(e.into()))?;

        Ok(ConvertedArtifact {
            file,
            size,
            media_type: kind.media_type(),
            download_name,
        })
    }

    /// Stage the body, run the strategy chain, and locate the produced
    /// artifact. Caller releases `staged` regardless of the outcome.
    async fn convert_staged(
        &self,
        kind: ConversionKind,
        staged: &StagedFile,
        body: &[u8],
    ) -> Result<StagedFile, ConvertError> {
        tokio::fs::write(staged.path(), body)
            .await
            .map_err(|e| ConvertError::Internal(e.into()))?;

        let steps = strategy::plan(kind, staged.path(), self.workspace.root(), &self.config);
        let outcome = strategy::run_chain(
            self.runner.as_ref(),
            &steps,
            self.config.fallback_on_timeout,
        )
        .await;

        match outcome {
            Ok(_) => {}
            Err(StrategyError::TimedOut { budget }) => {
                return Err(ConvertError::Timeout(budget));
            }
            Err(StrategyError::Exhausted { diagnostic }) => {
                return Err(ConvertError::Failed(diagnostic));
            }
        }

        // Exit code alone is not trusted: the tools sometimes report
        // success without writing the expected file
        let produced = staged.sibling_with_extension(kind.target_extension());
        match tokio::fs::metadata(&produced).await {
            Ok(_) => Ok(self.workspace.adopt(produced, kind.target_extension())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!(
                    "Tool reported success but {} is absent",
                    produced.display()
                );
                Err(ConvertError::ArtifactMissing)
            }
            Err(e) => Err(ConvertError::Internal(e.into())),
        }
    }

    /// Validate a list of uploads item by item. One item's failure never
    /// affects another's result. Conversion itself is a per-item success
    /// marker here; a real batch pipeline would call [`Self::convert`]
    /// per item and keep the same response shape.
    pub fn convert_batch(&self, items: &[(String, Bytes)]) -> Vec<BatchItemResult> {
        items
            .iter()
            .map(|(filename, body)| {
                if validation::matched_extension(
                    filename,
                    ConversionKind::DocxToPdf.accepted_extensions(),
                )
                .is_none()
                {
                    BatchItemResult::error(filename, "Invalid file type")
                } else if body.is_empty() {
                    BatchItemResult::error(filename, "Uploaded file is empty")
                } else {
                    BatchItemResult::success(filename)
                }
            })
            .collect()
    }
}
