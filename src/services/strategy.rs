use std::path::Path;
use std::time::Duration;

use crate::config::AppConfig;
use crate::services::executor::{CommandRunner, ConversionOutcome, OutcomeStatus, ToolCommand};

/// The conversion directions this service offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    DocxToPdf,
    PdfToDocx,
}

impl ConversionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::DocxToPdf => "docx-to-pdf",
            Self::PdfToDocx => "pdf-to-docx",
        }
    }

    /// Source extensions accepted for this direction. Suffix-matched
    /// case-sensitively against the uploaded filename.
    pub fn accepted_extensions(self) -> &'static [&'static str] {
        match self {
            Self::DocxToPdf => &[".docx", ".doc"],
            Self::PdfToDocx => &[".pdf"],
        }
    }

    /// Extension the upload is staged under. Legacy `.doc` uploads are
    /// staged as `.docx`; the converters sniff the actual content.
    pub fn staging_extension(self) -> &'static str {
        match self {
            Self::DocxToPdf => "docx",
            Self::PdfToDocx => "pdf",
        }
    }

    pub fn target_extension(self) -> &'static str {
        match self {
            Self::DocxToPdf => "pdf",
            Self::PdfToDocx => "docx",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::DocxToPdf => "application/pdf",
            Self::PdfToDocx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn timeout(self, config: &AppConfig) -> Duration {
        match self {
            Self::DocxToPdf => Duration::from_secs(config.docx_to_pdf_timeout_secs),
            // Rebuilding editable structure from fixed layout is heavier
            Self::PdfToDocx => Duration::from_secs(config.pdf_to_docx_timeout_secs),
        }
    }
}

/// The ordered fallback chain for one conversion kind.
///
/// docx -> pdf tries unoconv first and falls back to headless
/// LibreOffice; pdf -> docx has a single LibreOffice step targeting the
/// Word-2007 XML flavor, with no fallback tool available.
pub fn plan(
    kind: ConversionKind,
    input: &Path,
    outdir: &Path,
    config: &AppConfig,
) -> Vec<ToolCommand> {
    let timeout = kind.timeout(config);
    let input = input.to_string_lossy().into_owned();
    let outdir = outdir.to_string_lossy().into_owned();

    match kind {
        ConversionKind::DocxToPdf => vec![
            ToolCommand::new(
                config.unoconv_program.clone(),
                vec!["-f".into(), "pdf".into(), "-o".into(), outdir.clone(), input.clone()],
                timeout,
            ),
            ToolCommand::new(
                config.soffice_program.clone(),
                vec![
                    "--headless".into(),
                    "--convert-to".into(),
                    "pdf".into(),
                    "--outdir".into(),
                    outdir,
                    input,
                ],
                timeout,
            ),
        ],
        ConversionKind::PdfToDocx => vec![ToolCommand::new(
            config.soffice_program.clone(),
            vec![
                "--headless".into(),
                "--convert-to".into(),
                "docx:writer_MS_Word_2007".into(),
                "--outdir".into(),
                outdir,
                input,
            ],
            timeout,
        )],
    }
}

/// Why the whole chain failed.
#[derive(Debug, Clone)]
pub enum StrategyError {
    /// A step exceeded its time budget (and the policy did not allow
    /// falling through to the next tool).
    TimedOut { budget: Duration },
    /// Every step failed; carries the last attempted step's diagnostic
    /// output, which has the most value for the caller.
    Exhausted { diagnostic: String },
}

/// Run the chain in order, stopping at the first success.
///
/// A step's failure class decides whether the next tool gets a try:
/// non-zero exit and launch errors fall through, a timeout only does so
/// when `fallback_on_timeout` is set (default off: the budget is
/// treated as exhausted for that attempt).
pub async fn run_chain(
    runner: &dyn CommandRunner,
    steps: &[ToolCommand],
    fallback_on_timeout: bool,
) -> Result<ConversionOutcome, StrategyError> {
    let mut last_failure: Option<ConversionOutcome> = None;

    for (index, step) in steps.iter().enumerate() {
        tracing::info!("🔧 Step {}: {}", index + 1, step.display());
        let outcome = runner.run(step).await;

        match &outcome.status {
            OutcomeStatus::Success => {
                tracing::info!(
                    "✅ {} succeeded in {:?}",
                    step.program,
                    outcome.elapsed
                );
                return Ok(outcome);
            }
            OutcomeStatus::NonZeroExit(code) => {
                tracing::warn!(
                    "Step {} ({}) exited with {:?}: {}",
                    index + 1,
                    step.program,
                    code,
                    outcome.stderr.trim()
                );
            }
            OutcomeStatus::LaunchError(msg) => {
                tracing::warn!("Step {} ({}) failed to launch: {}", index + 1, step.program, msg);
            }
            OutcomeStatus::TimedOut => {
                tracing::warn!(
                    "Step {} ({}) timed out after {:?}",
                    index + 1,
                    step.program,
                    step.timeout
                );
                if !fallback_on_timeout {
                    return Err(StrategyError::TimedOut {
                        budget: step.timeout,
                    });
                }
            }
        }

        last_failure = Some(outcome);
    }

    match last_failure {
        Some(outcome) if matches!(outcome.status, OutcomeStatus::TimedOut) => {
            // fallback_on_timeout with a timeout on the final step
            Err(StrategyError::TimedOut {
                budget: steps.last().map(|s| s.timeout).unwrap_or_default(),
            })
        }
        Some(outcome) => Err(StrategyError::Exhausted {
            diagnostic: outcome.diagnostic().to_string(),
        }),
        None => Err(StrategyError::Exhausted {
            diagnostic: "no conversion steps defined".to_string(),
        }),
    }
}
