pub mod cancel;
pub mod capabilities;
pub mod constants;
mod document;
pub mod layout;
mod margin;
mod plan;
mod range;
pub mod reconcile;
mod scale;
mod settings;
mod stats;
pub mod submit;
mod types;
pub mod viewport;

pub use cancel::CancelToken;
pub use capabilities::{CapabilityProvider, ImageableArea, PrintTicket, apply_device_defaults};
pub use document::{Document, Page, PageContent};
pub use layout::{GridLayout, GridPosition, Placement, ResolvedScale, Sheet, SheetPlan};
pub use margin::resolve_margin;
pub use plan::{BoundSheetPlan, PlanBuilder, layout_document};
pub use range::{parse_page_range, resolve_selection};
pub use reconcile::{
    DocumentGenerator, GenerateFuture, PlanEvent, ReconcileState, ReconcilerHooks, ResolvedInfo,
    SettingsReconciler, SharedSheetPlan,
};
pub use scale::resolve_scale;
pub use settings::*;
pub use stats::calculate_statistics;
pub use submit::{
    PrintSubmitter, SubmissionOutcome, SubmissionRequest, SubmissionStatus, sheet_consumption,
    submit_plan,
};
pub use types::*;
pub use viewport::{PreviewViewportModel, ViewportState, ZoomMode};
