//! Print submission interface
//!
//! The host printing subsystem is reached through `PrintSubmitter`. Its call
//! may block on a spooler, so `submit_plan` runs it on tokio's blocking pool.

use crate::plan::BoundSheetPlan;
use crate::settings::PrintSettings;
use crate::types::*;
use std::sync::Arc;

/// Job parameters handed to the printer along with the sheets
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    pub copies: u32,
    pub collation: Collation,
    pub duplex: Duplex,
    pub paper_size: PaperSize,
    pub orientation: Orientation,
    pub color_mode: ColorMode,
    pub quality: PrintQuality,
    pub media_type: Option<String>,
    pub input_source: Option<String>,
}

impl SubmissionRequest {
    pub fn from_settings(settings: &PrintSettings) -> Self {
        Self {
            copies: settings.copies,
            collation: settings.collation,
            duplex: settings.duplex,
            paper_size: settings.paper_size,
            orientation: settings.orientation,
            color_mode: settings.color_mode,
            quality: settings.quality,
            media_type: settings.media_type.clone(),
            input_source: settings.input_source.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Success,
    Failed(String),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub status: SubmissionStatus,
    /// Physical sheets the device reports having used
    pub sheets_consumed: usize,
}

impl SubmissionOutcome {
    /// Outcome of a job the device accepted in full
    pub fn success(sheets: usize, request: &SubmissionRequest) -> Self {
        Self {
            status: SubmissionStatus::Success,
            sheets_consumed: sheet_consumption(
                sheets,
                request.copies as usize,
                request.duplex.is_two_sided(),
            ),
        }
    }

    /// Sheets consumed on success, the matching error otherwise
    pub fn into_result(self) -> Result<usize> {
        match self.status {
            SubmissionStatus::Success => Ok(self.sheets_consumed),
            SubmissionStatus::Failed(message) => Err(LayoutError::Submission(message)),
            SubmissionStatus::Cancelled => Err(LayoutError::SubmissionCancelled),
        }
    }
}

/// Physical sheets used by `sheets` imposed sides printed `copies` times
pub fn sheet_consumption(sheets: usize, copies: usize, two_sided: bool) -> usize {
    let sides = sheets * copies;
    if two_sided { sides.div_ceil(2) } else { sides }
}

/// The host's job submission call
pub trait PrintSubmitter: Send + Sync {
    fn submit(&self, plan: &BoundSheetPlan, request: &SubmissionRequest) -> SubmissionOutcome;
}

/// Submit a bound plan on the blocking pool.
///
/// The bound plan is handed back with the outcome whatever the status, so
/// the caller can release its content into the document.
pub async fn submit_plan(
    submitter: Arc<dyn PrintSubmitter>,
    bound: BoundSheetPlan,
    request: SubmissionRequest,
) -> Result<(BoundSheetPlan, SubmissionOutcome)> {
    let sheets = bound.plan().sheet_count();
    log::info!(
        "Submitting {} sheet(s), {} copy(ies), duplex {:?}",
        sheets,
        request.copies,
        request.duplex
    );

    let (bound, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = submitter.submit(&bound, &request);
        (bound, outcome)
    })
    .await?;

    match &outcome.status {
        SubmissionStatus::Success => {
            log::info!("Print job accepted, {} sheet(s) used", outcome.sheets_consumed)
        }
        SubmissionStatus::Failed(message) => log::warn!("Print job failed: {}", message),
        SubmissionStatus::Cancelled => log::warn!("Print job cancelled"),
    }
    Ok((bound, outcome))
}
