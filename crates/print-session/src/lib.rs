use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

mod worker;

// Re-export types from the layout engine
pub use print_layout::{
    CapabilityProvider, Document, DocumentGenerator, LayoutError, PlanEvent, PrintSettings,
    PrintSubmitter, ReconcilerHooks, Result, SettingsChange, SharedSheetPlan, SubmissionOutcome,
};

/// Commands sent from the host to a print session
#[derive(Debug)]
pub enum PrintCommand {
    /// One settings mutation. Changes queued back to back are applied
    /// together with a single rebuild.
    Change(SettingsChange),
    /// Regenerate content and rebuild with unchanged settings
    Refresh,
    /// Submit the current plan to the selected device
    Print,
    /// Cancel outstanding work and end the session
    Dispose,
}

/// Updates sent from a print session to the host
#[derive(Debug, Clone)]
pub enum PrintUpdate {
    Plan(PlanEvent),
    /// Settings the host should now display, sent after device defaults are
    /// applied and after every accepted change
    Settings { settings: PrintSettings },
    Submitted { outcome: SubmissionOutcome },
    Error { message: String },
    Closed,
}

/// A printer the session can lay out for and submit to
#[derive(Clone)]
pub struct DeviceHandle {
    pub name: String,
    pub capabilities: Arc<dyn CapabilityProvider>,
    pub submitter: Arc<dyn PrintSubmitter>,
}

impl std::fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Printers known to the host
pub trait DeviceCatalog: Send + Sync {
    fn devices(&self) -> Vec<DeviceHandle>;

    /// Name of the system default printer, if any
    fn default_device(&self) -> Option<String> {
        None
    }
}

/// Pick a device: the preferred one, else the system default, else the first.
pub fn select_device(catalog: &dyn DeviceCatalog, preferred: Option<&str>) -> Result<DeviceHandle> {
    let devices = catalog.devices();
    let wanted = preferred
        .map(str::to_string)
        .or_else(|| catalog.default_device());

    if let Some(name) = wanted {
        if let Some(device) = devices.iter().find(|d| d.name == name) {
            return Ok(device.clone());
        }
        log::warn!("Printer {:?} not found, using the first available", name);
    }

    devices.into_iter().next().ok_or(LayoutError::NoDevice)
}

/// A running print session.
///
/// Owns the command channel to the session task; dropping it ends the task.
pub struct PrintSession {
    device: String,
    command_tx: mpsc::UnboundedSender<PrintCommand>,
    plan: SharedSheetPlan,
    handle: JoinHandle<()>,
}

impl PrintSession {
    /// Open a session on a device from `catalog`.
    ///
    /// Fails with `NoDevice` when the catalog is empty. Settings are filled
    /// from the device's defaults and a first layout is started right away.
    pub fn open(
        catalog: &dyn DeviceCatalog,
        preferred: Option<&str>,
        settings: PrintSettings,
        document: Document,
        generator: Option<Arc<dyn DocumentGenerator>>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PrintUpdate>)> {
        let device = select_device(catalog, preferred)?;
        log::info!("Opening print session on {}", device.name);

        let settings = print_layout::apply_device_defaults(&settings, device.capabilities.as_ref());
        let hooks = ReconcilerHooks {
            generator,
            capabilities: Some(Arc::clone(&device.capabilities)),
        };

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let (reconciler, plan_events) =
            print_layout::SettingsReconciler::new(settings, document, hooks);
        let plan = reconciler.plan();
        let name = device.name.clone();

        let handle = tokio::spawn(worker::session_task(
            reconciler,
            device,
            plan_events,
            command_rx,
            update_tx,
        ));

        let session = Self {
            device: name,
            command_tx,
            plan,
            handle,
        };
        Ok((session, update_rx))
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// The plan the session publishes into
    pub fn plan(&self) -> SharedSheetPlan {
        self.plan.clone()
    }

    /// Queue a command. Returns false once the session has closed.
    pub fn send(&self, command: PrintCommand) -> bool {
        self.command_tx.send(command).is_ok()
    }

    pub fn change(&self, change: SettingsChange) -> bool {
        self.send(PrintCommand::Change(change))
    }

    pub fn print(&self) -> bool {
        self.send(PrintCommand::Print)
    }

    /// Dispose of the session and wait for its task to finish
    pub async fn close(self) -> Result<()> {
        let _ = self.command_tx.send(PrintCommand::Dispose);
        self.handle.await?;
        Ok(())
    }
}
