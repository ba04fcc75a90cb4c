use print_layout::{
    Document, SettingsReconciler, SheetPlan, SubmissionOutcome, SubmissionRequest,
    SubmissionStatus, submit_plan,
};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::{
    DeviceHandle, LayoutError, PlanEvent, PrintCommand, PrintUpdate, Result, SettingsChange,
};

/// Session task: applies commands to the reconciler and forwards its plan
/// events until the host disposes of the session or drops its handle.
pub(crate) async fn session_task(
    mut reconciler: SettingsReconciler,
    device: DeviceHandle,
    mut plan_events: mpsc::UnboundedReceiver<PlanEvent>,
    mut command_rx: mpsc::UnboundedReceiver<PrintCommand>,
    update_tx: mpsc::UnboundedSender<PrintUpdate>,
) {
    let _ = update_tx.send(PrintUpdate::Settings {
        settings: reconciler.settings().clone(),
    });
    reconciler.refresh();

    let mut pending: Option<PrintCommand> = None;

    loop {
        let cmd = match pending.take() {
            Some(cmd) => cmd,
            None => tokio::select! {
                cmd = command_rx.recv() => match cmd {
                    Some(cmd) => cmd,
                    None => break,
                },
                Some(event) = plan_events.recv() => {
                    let _ = update_tx.send(PrintUpdate::Plan(event));
                    continue;
                }
            },
        };

        match cmd {
            PrintCommand::Change(change) => {
                // Coalesce queued changes into one rebuild
                let mut changes = vec![change];
                while let Ok(next_cmd) = command_rx.try_recv() {
                    if let PrintCommand::Change(next) = next_cmd {
                        changes.push(next);
                    } else {
                        // Handled once the batch is applied
                        pending = Some(next_cmd);
                        break;
                    }
                }
                if changes.len() > 1 {
                    log::debug!("Applying {} queued settings changes together", changes.len());
                }
                handle_changes(&mut reconciler, changes, &update_tx);
            }
            PrintCommand::Refresh => reconciler.refresh(),
            PrintCommand::Print => {
                pending = handle_print(&mut reconciler, &device, &mut command_rx, &update_tx).await;
            }
            PrintCommand::Dispose => break,
        }
    }

    reconciler.cancel();
    if let Err(e) = reconciler.wait_idle().await {
        log::warn!("Layout task ended abnormally: {}", e);
    }
    while let Ok(event) = plan_events.try_recv() {
        let _ = update_tx.send(PrintUpdate::Plan(event));
    }
    log::info!("Print session on {} closed", device.name);
    let _ = update_tx.send(PrintUpdate::Closed);
}

fn handle_changes(
    reconciler: &mut SettingsReconciler,
    changes: Vec<SettingsChange>,
    update_tx: &mpsc::UnboundedSender<PrintUpdate>,
) {
    match reconciler.apply_batch(changes) {
        Ok(()) => {
            let _ = update_tx.send(PrintUpdate::Settings {
                settings: reconciler.settings().clone(),
            });
        }
        Err(e) => {
            let _ = update_tx.send(PrintUpdate::Error {
                message: e.to_string(),
            });
        }
    }
}

/// Print the current plan. Returns a command that arrived while the print
/// was still waiting on layout or content, which abandons the print.
async fn handle_print(
    reconciler: &mut SettingsReconciler,
    device: &DeviceHandle,
    command_rx: &mut mpsc::UnboundedReceiver<PrintCommand>,
    update_tx: &mpsc::UnboundedSender<PrintUpdate>,
) -> Option<PrintCommand> {
    let (result, interrupted) = match prepare_print(reconciler, command_rx).await {
        Preparation::Ready(Ok((plan, document))) => {
            (submit(reconciler, device, plan, document).await, None)
        }
        Preparation::Ready(Err(e)) => (Err(e), None),
        Preparation::Interrupted(cmd) => {
            log::info!("Print abandoned for {:?}", cmd);
            let outcome = SubmissionOutcome {
                status: SubmissionStatus::Cancelled,
                sheets_consumed: 0,
            };
            (Ok(outcome), Some(cmd))
        }
    };

    match result {
        Ok(outcome) => {
            let failed = outcome.clone().into_result().err();
            let _ = update_tx.send(PrintUpdate::Submitted { outcome });
            if let Some(e) = failed {
                let _ = update_tx.send(PrintUpdate::Error {
                    message: e.to_string(),
                });
            }
        }
        Err(e) => {
            log::warn!("Print failed: {}", e);
            let _ = update_tx.send(PrintUpdate::Error {
                message: e.to_string(),
            });
            // Content may not have come back; start over from the host's
            // generator so the next attempt has a full document
            reconciler.refresh();
        }
    }
    interrupted
}

enum Preparation {
    /// The finished plan and, with a generator, a separate print document
    Ready(Result<(SheetPlan, Option<Document>)>),
    Interrupted(PrintCommand),
}

/// Wait for `prepare_content` while watching for commands that supersede
/// the print.
async fn prepare_print(
    reconciler: &mut SettingsReconciler,
    command_rx: &mut mpsc::UnboundedReceiver<PrintCommand>,
) -> Preparation {
    let prepare = prepare_content(reconciler);
    tokio::pin!(prepare);

    loop {
        tokio::select! {
            prepared = &mut prepare => return Preparation::Ready(prepared),
            cmd = command_rx.recv() => match cmd {
                Some(PrintCommand::Print) => log::debug!("Print already in progress"),
                Some(cmd) => return Preparation::Interrupted(cmd),
                None => return Preparation::Interrupted(PrintCommand::Dispose),
            },
        }
    }
}

/// Lay out to completion and generate print content
async fn prepare_content(
    reconciler: &mut SettingsReconciler,
) -> Result<(SheetPlan, Option<Document>)> {
    reconciler.wait_idle().await?;
    let plan = reconciler.plan().snapshot();
    if plan.is_empty() {
        return Err(LayoutError::NoPages);
    }
    let document = match reconciler.print_document().await {
        Ok(document) => document,
        Err(e) => {
            log::warn!("Printing from preview content, generation failed: {}", e);
            None
        }
    };
    Ok((plan, document))
}

/// Bind content and submit.
///
/// Content comes from the freshly generated print document when there is
/// one, otherwise from the preview document, which gets it back after
/// submission.
async fn submit(
    reconciler: &mut SettingsReconciler,
    device: &DeviceHandle,
    plan: SheetPlan,
    print_document: Option<Document>,
) -> Result<SubmissionOutcome> {
    let request = SubmissionRequest::from_settings(reconciler.settings());

    match print_document {
        Some(mut document) => {
            let bound = plan.bind(&mut document)?;
            let (bound, outcome) =
                submit_plan(Arc::clone(&device.submitter), bound, request).await?;
            bound.release(&mut document);
            Ok(outcome)
        }
        None => {
            let bound = reconciler.with_document(|document| plan.bind(document))?;
            let (bound, outcome) =
                submit_plan(Arc::clone(&device.submitter), bound, request).await?;
            reconciler.with_document(|document| bound.release(document));
            Ok(outcome)
        }
    }
}
