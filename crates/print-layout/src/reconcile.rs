//! Settings reconciliation
//!
//! The reconciler owns the settings snapshot and the single in-flight
//! recomputation. Each change record cancels whatever run is still building
//! and starts a new one:
//!
//! ```text
//! Idle/Published/Cancelled --change--> Building --done--> Published --> Idle
//!                                          \--cancel--> Cancelled --> Idle
//! ```
//!
//! A run resolves the page selection and margin, awaits the document
//! generation hook when geometry changed, then composes sheets one at a time
//! into the shared plan, yielding between sheets.

use crate::cancel::CancelToken;
use crate::capabilities::CapabilityProvider;
use crate::document::{Document, Page};
use crate::layout::{Sheet, SheetPlan};
use crate::margin::resolve_margin;
use crate::plan::PlanBuilder;
use crate::range::resolve_selection;
use crate::settings::{PageSelection, PrintSettings, ScalePolicy, SettingsChange};
use crate::types::*;
use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// =============================================================================
// Document Generation Hook
// =============================================================================

/// Geometry the generation hook is asked to produce content for
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInfo {
    pub paper_size: PaperSize,
    pub orientation: Orientation,
    /// Sheet size in points, orientation applied
    pub sheet_size: Size,
    /// Resolved margin in points
    pub margin: f32,
    pub scale: ScalePolicy,
    pub pages_per_sheet: PagesPerSheet,
    /// Pages in the current document
    pub page_count: usize,
}

pub type GenerateFuture = Pin<Box<dyn Future<Output = Result<Option<Vec<Page>>>> + Send>>;

/// Host callback that (re)generates document content for new geometry.
///
/// `Ok(None)` keeps the current pages. A failed hook is logged and treated the
/// same way.
pub trait DocumentGenerator: Send + Sync {
    fn generate(&self, info: ResolvedInfo) -> GenerateFuture;
}

/// One call of the generation hook, run as its own task so a panicking
/// hook surfaces as an error. Dropping it aborts the call.
struct HookCall(JoinHandle<Result<Option<Vec<Page>>>>);

impl HookCall {
    fn spawn(generator: Arc<dyn DocumentGenerator>, info: ResolvedInfo) -> Self {
        Self(tokio::spawn(async move { generator.generate(info).await }))
    }

    async fn join(mut self) -> Result<Option<Vec<Page>>> {
        match (&mut self.0).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => Err(LayoutError::Generation(format!(
                "hook panicked: {}",
                panic_message(e.into_panic().as_ref())
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for HookCall {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

// =============================================================================
// State and Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Idle,
    Building,
    Published,
    Cancelled,
}

/// Progress notifications, in order, for every run
#[derive(Debug, Clone, PartialEq)]
pub enum PlanEvent {
    Started { generation: u64 },
    SheetAppended { generation: u64, sheet_index: usize },
    Published { generation: u64, sheet_count: usize },
    Cancelled { generation: u64 },
    /// The custom range no longer fits the document; the last valid
    /// selection was used instead
    RangeRejected { generation: u64, error: RangeParseError },
    /// The generation hook failed; the previous content was kept
    HookFailed { generation: u64, message: String },
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Shared Plan
// =============================================================================

#[derive(Debug)]
struct PlanSlot {
    generation: u64,
    /// Generation whose sheets are all in `plan`
    published: u64,
    complete: bool,
    plan: SheetPlan,
}

/// The published sheet plan, shared between the reconciler and its readers.
///
/// Writes are stamped with the run's generation; once a newer run has claimed
/// the slot, writes from older runs are refused, so two runs never interleave.
#[derive(Debug, Clone)]
pub struct SharedSheetPlan {
    slot: Arc<Mutex<PlanSlot>>,
}

impl SharedSheetPlan {
    pub fn new(initial: SheetPlan) -> Self {
        Self {
            slot: Arc::new(Mutex::new(PlanSlot {
                generation: 0,
                published: 0,
                complete: true,
                plan: initial,
            })),
        }
    }

    /// Reserve the slot for `generation`, dropping partial output of a
    /// cancelled run. A complete plan stays visible until the new run begins.
    fn claim(&self, generation: u64) {
        let mut slot = lock(&self.slot);
        slot.generation = generation;
        if !slot.complete {
            slot.plan.sheets.clear();
        }
    }

    /// Clear the slot and install the new run's geometry
    fn begin(&self, generation: u64, plan: SheetPlan) -> bool {
        let mut slot = lock(&self.slot);
        if slot.generation != generation {
            return false;
        }
        slot.plan = plan;
        slot.complete = false;
        true
    }

    fn append(&self, generation: u64, sheet: Sheet) -> bool {
        let mut slot = lock(&self.slot);
        if slot.generation != generation {
            return false;
        }
        slot.plan.sheets.push(sheet);
        true
    }

    fn finish(&self, generation: u64) -> bool {
        let mut slot = lock(&self.slot);
        if slot.generation != generation {
            return false;
        }
        slot.complete = true;
        slot.published = generation;
        true
    }

    /// Drop sheets appended by a run that was cancelled
    fn discard(&self, generation: u64) {
        let mut slot = lock(&self.slot);
        if slot.generation == generation && !slot.complete {
            slot.plan.sheets.clear();
        }
    }

    /// Consistent copy of the plan as it stands
    pub fn snapshot(&self) -> SheetPlan {
        lock(&self.slot).plan.clone()
    }

    /// Read the plan under the lock without copying it
    pub fn with_plan<R>(&self, f: impl FnOnce(&SheetPlan) -> R) -> R {
        f(&lock(&self.slot).plan)
    }

    /// Generation of the newest run that claimed the plan
    pub fn generation(&self) -> u64 {
        lock(&self.slot).generation
    }

    /// True once the newest run has appended its final sheet.
    ///
    /// A claimed but unfinished generation reads false even while the
    /// previous complete plan is still the one shown.
    pub fn is_complete(&self) -> bool {
        let slot = lock(&self.slot);
        slot.complete && slot.published == slot.generation
    }

    /// Generation of the last run that finished its plan
    pub fn published_generation(&self) -> u64 {
        lock(&self.slot).published
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// Optional collaborators of a reconciler
#[derive(Clone, Default)]
pub struct ReconcilerHooks {
    pub generator: Option<Arc<dyn DocumentGenerator>>,
    pub capabilities: Option<Arc<dyn CapabilityProvider>>,
}

#[derive(Debug)]
struct StateSlot {
    generation: u64,
    state: ReconcileState,
}

struct InFlight {
    token: CancelToken,
    handle: JoinHandle<()>,
}

/// Owns the settings snapshot and rebuilds the shared plan on every change.
///
/// Runs are spawned on the ambient tokio runtime, so mutations must be made
/// from within one.
pub struct SettingsReconciler {
    settings: PrintSettings,
    document: Arc<Mutex<Document>>,
    last_selection: Arc<Mutex<Vec<usize>>>,
    plan: SharedSheetPlan,
    hooks: ReconcilerHooks,
    state: Arc<Mutex<StateSlot>>,
    events: mpsc::UnboundedSender<PlanEvent>,
    generation: u64,
    in_flight: Option<InFlight>,
}

impl SettingsReconciler {
    /// Create a reconciler and the receiver for its progress events.
    ///
    /// Nothing is built until the first change or `refresh`.
    pub fn new(
        settings: PrintSettings,
        document: Document,
        hooks: ReconcilerHooks,
    ) -> (Self, mpsc::UnboundedReceiver<PlanEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let empty = PlanBuilder::new(&settings, Vec::new(), &[], 0.0).empty_plan();

        let reconciler = Self {
            settings,
            document: Arc::new(Mutex::new(document)),
            last_selection: Arc::new(Mutex::new(Vec::new())),
            plan: SharedSheetPlan::new(empty),
            hooks,
            state: Arc::new(Mutex::new(StateSlot {
                generation: 0,
                state: ReconcileState::Idle,
            })),
            events,
            generation: 0,
            in_flight: None,
        };
        (reconciler, events_rx)
    }

    pub fn settings(&self) -> &PrintSettings {
        &self.settings
    }

    /// Handle to the published plan
    pub fn plan(&self) -> SharedSheetPlan {
        self.plan.clone()
    }

    pub fn state(&self) -> ReconcileState {
        lock(&self.state).state
    }

    /// Generation of the most recently started run
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Run `f` against the current document
    pub fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut lock(&self.document))
    }

    /// Apply one change record and rebuild.
    ///
    /// Invalid settings are rejected without touching the current snapshot.
    /// A custom range that does not parse against the current document is
    /// rejected the same way, keeping the previous valid selection.
    pub fn apply(&mut self, change: SettingsChange) -> Result<()> {
        let regenerate = change.affects_geometry();
        self.apply_all(std::iter::once(change), regenerate)
    }

    /// Apply several change records and rebuild once.
    ///
    /// Either every change is applied or none is.
    pub fn apply_batch(&mut self, changes: Vec<SettingsChange>) -> Result<()> {
        let regenerate = changes.iter().any(SettingsChange::affects_geometry);
        self.apply_all(changes, regenerate)
    }

    fn apply_all(
        &mut self,
        changes: impl IntoIterator<Item = SettingsChange>,
        regenerate: bool,
    ) -> Result<()> {
        let mut next = self.settings.clone();
        for change in changes {
            next.apply(change);
        }
        next.validate()?;

        if next.page_selection == PageSelection::Custom {
            let page_count = lock(&self.document).page_count();
            if let Err(e) = resolve_selection(&next, page_count) {
                log::warn!("Rejecting page range {:?}: {}", next.custom_range, e);
                return Err(e.into());
            }
        }

        self.settings = next;
        self.rebuild(regenerate);
        Ok(())
    }

    /// Rebuild from the current settings, regenerating content.
    pub fn refresh(&mut self) {
        self.rebuild(true);
    }

    /// Cancel the in-flight run, if any.
    pub fn cancel(&mut self) {
        if let Some(in_flight) = &self.in_flight {
            in_flight.token.cancel();
        }
    }

    /// Wait for the most recent run to finish.
    ///
    /// Cancel safe: if the wait is dropped, the run stays in flight and can
    /// still be cancelled.
    pub async fn wait_idle(&mut self) -> Result<()> {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return Ok(());
        };
        let joined = (&mut in_flight.handle).await;
        self.in_flight = None;
        joined?;
        Ok(())
    }

    /// What the generation hook would be called with right now
    pub fn resolved_info(&self) -> ResolvedInfo {
        let document = lock(&self.document);
        resolved_info(
            &self.settings,
            &document,
            self.hooks.capabilities.as_deref(),
        )
    }

    /// Produce a separate document for printing.
    ///
    /// With a generation hook the print copy is generated afresh, so the
    /// preview document keeps its content. Returns `None` when there is no
    /// hook or the hook has nothing new; callers then bind the preview
    /// document itself. A hook that fails or panics is an error. Dropping
    /// the returned future aborts the hook.
    pub async fn print_document(&self) -> Result<Option<Document>> {
        let Some(generator) = self.hooks.generator.clone() else {
            return Ok(None);
        };
        let (info, default_margin) = {
            let document = lock(&self.document);
            (
                resolved_info(
                    &self.settings,
                    &document,
                    self.hooks.capabilities.as_deref(),
                ),
                document.default_margin(),
            )
        };
        let pages = HookCall::spawn(generator, info).join().await?;
        Ok(pages.map(|pages| Document::new(pages, default_margin)))
    }

    fn rebuild(&mut self, regenerate: bool) {
        if let Some(previous) = self.in_flight.take() {
            if !previous.handle.is_finished() {
                log::debug!("Cancelling layout run {}", self.generation);
            }
            previous.token.cancel();
        }

        self.generation += 1;
        let generation = self.generation;
        let token = CancelToken::new();

        self.plan.claim(generation);
        {
            let mut state = lock(&self.state);
            state.generation = generation;
            state.state = ReconcileState::Building;
        }

        let run = LayoutRun {
            generation,
            token: token.clone(),
            settings: self.settings.clone(),
            regenerate,
            document: Arc::clone(&self.document),
            last_selection: Arc::clone(&self.last_selection),
            plan: self.plan.clone(),
            hooks: self.hooks.clone(),
            state: Arc::clone(&self.state),
            events: self.events.clone(),
        };

        let handle = tokio::spawn(run.execute());
        self.in_flight = Some(InFlight { token, handle });
    }
}

impl Drop for SettingsReconciler {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn resolved_info(
    settings: &PrintSettings,
    document: &Document,
    capabilities: Option<&dyn CapabilityProvider>,
) -> ResolvedInfo {
    ResolvedInfo {
        paper_size: settings.paper_size,
        orientation: settings.orientation,
        sheet_size: settings.sheet_size(),
        margin: resolve_margin(
            settings.margin,
            document.default_margin(),
            settings.paper_size,
            settings.orientation,
            capabilities,
        ),
        scale: settings.scale,
        pages_per_sheet: settings.pages_per_sheet,
        page_count: document.page_count(),
    }
}

// =============================================================================
// Layout Run
// =============================================================================

/// Marker for a run that stopped because a newer one superseded it
struct Cancelled;

/// One recomputation, moved into its own task
struct LayoutRun {
    generation: u64,
    token: CancelToken,
    settings: PrintSettings,
    regenerate: bool,
    document: Arc<Mutex<Document>>,
    last_selection: Arc<Mutex<Vec<usize>>>,
    plan: SharedSheetPlan,
    hooks: ReconcilerHooks,
    state: Arc<Mutex<StateSlot>>,
    events: mpsc::UnboundedSender<PlanEvent>,
}

impl LayoutRun {
    async fn execute(self) {
        let generation = self.generation;
        let _ = self.events.send(PlanEvent::Started { generation });

        match self.build().await {
            Ok(sheet_count) => {
                log::info!(
                    "Published layout run {} with {} sheet(s)",
                    generation,
                    sheet_count
                );
                self.settle(ReconcileState::Published);
                let _ = self.events.send(PlanEvent::Published {
                    generation,
                    sheet_count,
                });
            }
            Err(Cancelled) => {
                log::debug!("Layout run {} cancelled", generation);
                self.plan.discard(generation);
                self.settle(ReconcileState::Cancelled);
                let _ = self.events.send(PlanEvent::Cancelled { generation });
            }
        }
        self.settle(ReconcileState::Idle);
    }

    /// Record a terminal state, unless a newer run owns the state already
    fn settle(&self, state: ReconcileState) {
        let mut slot = lock(&self.state);
        if slot.generation == self.generation {
            slot.state = state;
        }
    }

    fn checkpoint(&self) -> std::result::Result<(), Cancelled> {
        if self.token.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    async fn build(&self) -> std::result::Result<usize, Cancelled> {
        self.checkpoint()?;
        let mut selected = self.resolve_pages();

        self.checkpoint()?;
        let info = {
            let document = lock(&self.document);
            resolved_info(
                &self.settings,
                &document,
                self.hooks.capabilities.as_deref(),
            )
        };
        log::debug!(
            "Layout run {}: margin {:.2}pt on {:.1}x{:.1}pt",
            self.generation,
            info.margin,
            info.sheet_size.width,
            info.sheet_size.height
        );

        self.checkpoint()?;
        if self.regenerate && self.regenerate_content(info.clone()).await? {
            selected = self.resolve_pages();
        }

        self.checkpoint()?;
        let page_sizes = lock(&self.document).page_sizes();
        let builder = PlanBuilder::new(&self.settings, page_sizes, &selected, info.margin);

        if !self.plan.begin(self.generation, builder.empty_plan()) {
            return Err(Cancelled);
        }

        for index in 0..builder.sheet_count() {
            self.checkpoint()?;
            let Some(sheet) = builder.compose(index) else {
                continue;
            };
            if !self.plan.append(self.generation, sheet) {
                return Err(Cancelled);
            }
            let _ = self.events.send(PlanEvent::SheetAppended {
                generation: self.generation,
                sheet_index: index,
            });
            tokio::task::yield_now().await;
        }

        self.checkpoint()?;
        if !self.plan.finish(self.generation) {
            return Err(Cancelled);
        }
        Ok(builder.sheet_count())
    }

    /// Page numbers to print. A selection that no longer fits the document
    /// falls back to the last valid one, trimmed to the document.
    fn resolve_pages(&self) -> Vec<usize> {
        let page_count = lock(&self.document).page_count();
        match resolve_selection(&self.settings, page_count) {
            Ok(selected) => {
                *lock(&self.last_selection) = selected.clone();
                selected
            }
            Err(error) => {
                log::warn!("Keeping previous page selection: {}", error);
                let _ = self.events.send(PlanEvent::RangeRejected {
                    generation: self.generation,
                    error,
                });
                lock(&self.last_selection)
                    .iter()
                    .copied()
                    .filter(|&page| page <= page_count)
                    .collect()
            }
        }
    }

    /// Await the generation hook. Returns whether the page list changed.
    async fn regenerate_content(&self, info: ResolvedInfo) -> std::result::Result<bool, Cancelled> {
        let Some(generator) = self.hooks.generator.clone() else {
            return Ok(false);
        };

        let outcome = tokio::select! {
            outcome = HookCall::spawn(generator, info).join() => outcome,
            _ = self.token.cancelled() => return Err(Cancelled),
        };
        self.checkpoint()?;

        match outcome {
            Ok(Some(pages)) => {
                log::debug!(
                    "Layout run {}: hook produced {} page(s)",
                    self.generation,
                    pages.len()
                );
                lock(&self.document).replace_pages(pages);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                log::warn!("Document generation failed, keeping previous content: {}", e);
                let _ = self.events.send(PlanEvent::HookFailed {
                    generation: self.generation,
                    message: e.to_string(),
                });
                Ok(false)
            }
        }
    }
}
