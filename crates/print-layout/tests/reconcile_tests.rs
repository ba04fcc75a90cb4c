use print_layout::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};

/// Generation hook backed by a closure
struct FnGenerator<F>(F);

impl<F> DocumentGenerator for FnGenerator<F>
where
    F: Fn(ResolvedInfo) -> GenerateFuture + Send + Sync,
{
    fn generate(&self, info: ResolvedInfo) -> GenerateFuture {
        (self.0)(info)
    }
}

fn ready(result: Result<Option<Vec<Page>>>) -> GenerateFuture {
    Box::pin(async move { result })
}

fn blank_pages(count: usize, size: Size) -> Vec<Page> {
    (0..count).map(|_| Page::blank(size)).collect()
}

fn letter_document(num_pages: usize) -> Document {
    Document::from_sizes(vec![Size::new(612.0, 792.0); num_pages], 0.0)
}

fn with_generator(generator: impl DocumentGenerator + 'static) -> ReconcilerHooks {
    ReconcilerHooks {
        generator: Some(Arc::new(generator)),
        capabilities: None,
    }
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<PlanEvent>) -> PlanEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for plan event")
        .expect("event channel closed")
}

/// Collect events up to and including the first one matching `last`
async fn events_until(
    events: &mut mpsc::UnboundedReceiver<PlanEvent>,
    last: impl Fn(&PlanEvent) -> bool,
) -> Vec<PlanEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let done = last(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

fn published_pages(plan: &SheetPlan) -> Vec<usize> {
    plan.sheets
        .iter()
        .flat_map(|sheet| sheet.placements.iter().map(Placement::page_number))
        .collect()
}

#[tokio::test]
async fn test_change_publishes_plan() {
    let (mut reconciler, mut events) =
        SettingsReconciler::new(PrintSettings::default(), letter_document(5), Default::default());

    reconciler
        .apply(SettingsChange::PagesPerSheet(PagesPerSheet::Four))
        .unwrap();
    reconciler.wait_idle().await.unwrap();

    let seen = events_until(&mut events, |e| matches!(e, PlanEvent::Published { .. })).await;
    assert_eq!(
        seen,
        vec![
            PlanEvent::Started { generation: 1 },
            PlanEvent::SheetAppended {
                generation: 1,
                sheet_index: 0
            },
            PlanEvent::SheetAppended {
                generation: 1,
                sheet_index: 1
            },
            PlanEvent::Published {
                generation: 1,
                sheet_count: 2
            },
        ]
    );

    let plan = reconciler.plan();
    assert!(plan.is_complete());
    assert_eq!(plan.generation(), 1);
    assert_eq!(plan.with_plan(SheetPlan::sheet_count), 2);
    assert_eq!(published_pages(&plan.snapshot()), vec![1, 2, 3, 4, 5]);
    assert_eq!(reconciler.state(), ReconcileState::Idle);
}

#[tokio::test]
async fn test_new_change_cancels_pending_hook() {
    let calls = Arc::new(AtomicUsize::new(0));
    let entered = Arc::new(Notify::new());

    let generator = {
        let calls = Arc::clone(&calls);
        let entered = Arc::clone(&entered);
        FnGenerator(move |_info: ResolvedInfo| -> GenerateFuture {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            entered.notify_one();
            if call > 0 {
                return ready(Ok(None));
            }
            // The first run never hears back from the host
            Box::pin(std::future::pending::<Result<Option<Vec<Page>>>>())
        })
    };

    let (mut reconciler, mut events) = SettingsReconciler::new(
        PrintSettings::default(),
        letter_document(3),
        with_generator(generator),
    );

    reconciler
        .apply(SettingsChange::Orientation(Orientation::Landscape))
        .unwrap();
    entered.notified().await;

    reconciler
        .apply(SettingsChange::PagesPerSheet(PagesPerSheet::Two))
        .unwrap();
    reconciler.wait_idle().await.unwrap();

    let mut seen = Vec::new();
    while !(seen.contains(&PlanEvent::Cancelled { generation: 1 })
        && seen.iter().any(|e| matches!(e, PlanEvent::Published { .. })))
    {
        seen.push(next_event(&mut events).await);
    }

    assert!(seen.contains(&PlanEvent::Published {
        generation: 2,
        sheet_count: 2
    }));
    assert!(
        !seen
            .iter()
            .any(|e| matches!(e, PlanEvent::Published { generation: 1, .. }))
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let plan = reconciler.plan().snapshot();
    assert_eq!(plan.grid.cols * plan.grid.rows, 2);
    assert_eq!(published_pages(&plan), vec![1, 2, 3]);
    assert_eq!(reconciler.state(), ReconcileState::Idle);
}

#[tokio::test]
async fn test_hook_failure_keeps_previous_content() {
    let generator = FnGenerator(|_info: ResolvedInfo| -> GenerateFuture {
        ready(Err(LayoutError::Generation("renderer crashed".to_string())))
    });

    let (mut reconciler, mut events) = SettingsReconciler::new(
        PrintSettings::default(),
        letter_document(4),
        with_generator(generator),
    );

    reconciler
        .apply(SettingsChange::PaperSize(PaperSize::A4))
        .unwrap();
    reconciler.wait_idle().await.unwrap();

    let seen = events_until(&mut events, |e| matches!(e, PlanEvent::Published { .. })).await;
    assert!(seen.iter().any(|e| matches!(
        e,
        PlanEvent::HookFailed { message, .. } if message.contains("renderer crashed")
    )));

    let plan = reconciler.plan().snapshot();
    assert_eq!(published_pages(&plan), vec![1, 2, 3, 4]);
    let a4 = PaperSize::A4.size_with_orientation(Orientation::Portrait);
    assert!((plan.sheet_size.width - a4.width).abs() < 0.001);
}

async fn panicking_render() -> Result<Option<Vec<Page>>> {
    panic!("host renderer threw")
}

#[tokio::test]
async fn test_panicking_hook_still_publishes() {
    let generator = FnGenerator(|_info: ResolvedInfo| -> GenerateFuture {
        Box::pin(panicking_render())
    });

    let (mut reconciler, mut events) = SettingsReconciler::new(
        PrintSettings::default(),
        letter_document(3),
        with_generator(generator),
    );

    reconciler
        .apply(SettingsChange::Orientation(Orientation::Landscape))
        .unwrap();
    reconciler.wait_idle().await.unwrap();

    let seen = events_until(&mut events, |e| matches!(e, PlanEvent::Published { .. })).await;
    assert!(seen.iter().any(|e| matches!(
        e,
        PlanEvent::HookFailed { generation: 1, message } if message.contains("host renderer threw")
    )));
    assert_eq!(
        seen.last(),
        Some(&PlanEvent::Published {
            generation: 1,
            sheet_count: 3
        })
    );

    let plan = reconciler.plan();
    assert!(plan.is_complete());
    let snapshot = plan.snapshot();
    assert!(snapshot.sheet_size.width > snapshot.sheet_size.height);
    assert_eq!(published_pages(&snapshot), vec![1, 2, 3]);
    assert_eq!(reconciler.state(), ReconcileState::Idle);
}

#[tokio::test]
async fn test_panicking_print_hook_is_an_error() {
    let generator = FnGenerator(|_info: ResolvedInfo| -> GenerateFuture {
        panic!("host renderer threw")
    });

    let (reconciler, _events) = SettingsReconciler::new(
        PrintSettings::default(),
        letter_document(2),
        with_generator(generator),
    );

    match reconciler.print_document().await {
        Err(LayoutError::Generation(message)) => assert!(message.contains("host renderer threw")),
        other => panic!("Expected a generation error, got {:?}", other.map(|d| d.is_some())),
    }
    // The preview document is untouched
    assert_eq!(reconciler.with_document(|doc| doc.page_count()), 2);
}

#[tokio::test]
async fn test_cancelled_run_never_mixes_with_successor() {
    let (mut reconciler, mut events) =
        SettingsReconciler::new(PrintSettings::default(), letter_document(200), Default::default());

    reconciler.apply(SettingsChange::Copies(2)).unwrap();
    let first = events_until(&mut events, |e| {
        matches!(e, PlanEvent::SheetAppended { generation: 1, .. })
    })
    .await;
    assert_eq!(first[0], PlanEvent::Started { generation: 1 });
    assert!(reconciler.plan().snapshot().sheet_count() > 0);

    // Claiming the plan drops the partial sheets of the first run
    reconciler
        .apply(SettingsChange::PagesPerSheet(PagesPerSheet::Four))
        .unwrap();
    assert_eq!(reconciler.plan().snapshot().sheet_count(), 0);
    assert!(!reconciler.plan().is_complete());
    reconciler.wait_idle().await.unwrap();

    let seen = events_until(&mut events, |e| {
        matches!(e, PlanEvent::Published { generation: 2, .. })
    })
    .await;
    assert!(seen.contains(&PlanEvent::Cancelled { generation: 1 }));
    assert!(
        !seen
            .iter()
            .any(|e| matches!(e, PlanEvent::Published { generation: 1, .. }))
    );
    let appended: Vec<usize> = seen
        .iter()
        .filter_map(|e| match e {
            PlanEvent::SheetAppended {
                generation: 2,
                sheet_index,
            } => Some(*sheet_index),
            _ => None,
        })
        .collect();
    assert_eq!(appended, (0..50).collect::<Vec<_>>());

    let plan = reconciler.plan();
    assert!(plan.is_complete());
    assert_eq!(plan.published_generation(), 2);
    let snapshot = plan.snapshot();
    assert_eq!((snapshot.grid.cols, snapshot.grid.rows), (2, 2));
    assert_eq!(snapshot.sheet_count(), 50);
    assert!(snapshot.sheets.iter().enumerate().all(|(i, sheet)| sheet.index == i));
    assert!(snapshot.sheets.iter().all(|sheet| sheet.placements.len() == 4));
    assert_eq!(published_pages(&snapshot), (1..=200).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_hook_receives_geometry_and_replaces_pages() {
    let received: Arc<Mutex<Option<ResolvedInfo>>> = Arc::new(Mutex::new(None));

    let generator = {
        let received = Arc::clone(&received);
        FnGenerator(move |info: ResolvedInfo| -> GenerateFuture {
            *received.lock().unwrap() = Some(info);
            ready(Ok(Some(blank_pages(8, Size::new(300.0, 400.0)))))
        })
    };

    let mut settings = PrintSettings::default();
    settings.margin = MarginPolicy::Custom(18.0);
    let (mut reconciler, _events) =
        SettingsReconciler::new(settings, letter_document(2), with_generator(generator));

    reconciler
        .apply(SettingsChange::PagesPerSheet(PagesPerSheet::Four))
        .unwrap();
    reconciler.wait_idle().await.unwrap();

    let info = received.lock().unwrap().clone().unwrap();
    assert_eq!(info.pages_per_sheet, PagesPerSheet::Four);
    assert_eq!(info.margin, 18.0);
    assert_eq!(info.page_count, 2);
    assert_eq!(info.sheet_size, PaperSize::Letter.size_with_orientation(Orientation::Portrait));

    assert_eq!(reconciler.with_document(|doc| doc.page_count()), 8);
    let plan = reconciler.plan().snapshot();
    assert_eq!(plan.sheet_count(), 2);
    assert_eq!(plan.placement_count(), 8);
}

#[tokio::test]
async fn test_non_geometry_change_skips_hook() {
    let calls = Arc::new(AtomicUsize::new(0));
    let generator = {
        let calls = Arc::clone(&calls);
        FnGenerator(move |_info: ResolvedInfo| -> GenerateFuture {
            calls.fetch_add(1, Ordering::SeqCst);
            ready(Ok(None))
        })
    };

    let (mut reconciler, _events) = SettingsReconciler::new(
        PrintSettings::default(),
        letter_document(2),
        with_generator(generator),
    );

    reconciler.apply(SettingsChange::Copies(3)).unwrap();
    reconciler
        .apply(SettingsChange::PageOrder(PageOrder::Vertical))
        .unwrap();
    reconciler.wait_idle().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(reconciler.plan().snapshot().sheet_count(), 2);

    reconciler.refresh();
    reconciler.wait_idle().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_range_keeps_previous_settings() {
    let (mut reconciler, _events) =
        SettingsReconciler::new(PrintSettings::default(), letter_document(5), Default::default());

    reconciler
        .apply_batch(vec![
            SettingsChange::CustomRange("2-3".to_string()),
            SettingsChange::PageSelection(PageSelection::Custom),
        ])
        .unwrap();
    reconciler.wait_idle().await.unwrap();
    assert_eq!(published_pages(&reconciler.plan().snapshot()), vec![2, 3]);

    match reconciler.apply(SettingsChange::CustomRange("1-20".to_string())) {
        Err(LayoutError::Range(RangeParseError::OutOfBounds { page_count, .. })) => {
            assert_eq!(page_count, 5)
        }
        other => panic!("Expected OutOfBounds, got {:?}", other),
    }
    assert_eq!(reconciler.settings().custom_range, "2-3");
    assert_eq!(reconciler.generation(), 1);

    assert!(reconciler.apply(SettingsChange::Copies(0)).is_err());
    assert_eq!(reconciler.settings().copies, 1);
}

#[tokio::test]
async fn test_shrunken_document_falls_back_to_last_selection() {
    let generator = FnGenerator(|_info: ResolvedInfo| -> GenerateFuture {
        ready(Ok(Some(blank_pages(3, Size::new(612.0, 792.0)))))
    });

    let (mut reconciler, mut events) = SettingsReconciler::new(
        PrintSettings::default(),
        letter_document(6),
        with_generator(generator),
    );

    reconciler
        .apply_batch(vec![
            SettingsChange::CustomRange("2-5".to_string()),
            SettingsChange::PageSelection(PageSelection::Custom),
        ])
        .unwrap();
    reconciler.wait_idle().await.unwrap();

    reconciler
        .apply(SettingsChange::Orientation(Orientation::Landscape))
        .unwrap();
    reconciler.wait_idle().await.unwrap();

    let seen = events_until(&mut events, |e| {
        matches!(e, PlanEvent::Published { generation: 2, .. })
    })
    .await;
    assert!(seen.iter().any(|e| matches!(
        e,
        PlanEvent::RangeRejected {
            generation: 2,
            error: RangeParseError::OutOfBounds { .. }
        }
    )));

    assert_eq!(published_pages(&reconciler.plan().snapshot()), vec![2, 3]);
}

#[tokio::test]
async fn test_print_document_is_separate() {
    let generator = FnGenerator(|info: ResolvedInfo| -> GenerateFuture {
        let pages = (0..info.page_count)
            .map(|i| Page::new(Size::new(612.0, 792.0), PageContent::new(i)))
            .collect();
        ready(Ok(Some(pages)))
    });

    let (mut reconciler, _events) = SettingsReconciler::new(
        PrintSettings::default(),
        letter_document(3),
        with_generator(generator),
    );
    reconciler.refresh();
    reconciler.wait_idle().await.unwrap();

    let mut print_doc = reconciler.print_document().await.unwrap().unwrap();
    let plan = reconciler.plan().snapshot();
    let bound = plan.bind(&mut print_doc).unwrap();

    // The preview document still owns its own content
    assert!(reconciler.with_document(|doc| doc.pages().iter().all(|p| !p.is_attached())));
    let (_, content) = bound.sheet(1).unwrap().next().unwrap();
    assert_eq!(content.downcast_ref::<usize>(), Some(&1));
    bound.release(&mut print_doc);
}
