//! Undo manager tests against a recording service.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rewind_core::{ApplyOutcome, Direction, InvariantViolation, ServiceError, UndoConfig};
use rewind_ops::{
    ApplyContext, ArchiveFilter, ArchiveFormat, BatchRenameOperation, Completion, CreateOperation, ExtractOperation,
    FileOperationsService, OwnershipKind, OwnershipOperation, PermissionsOperation, RecursivePermissionChange,
    RecursivePermissionsOperation, TransferKind, TransferOperation, TransferPair, TransferReport, TrashEntry,
    TrashOperation, UndoEvent, UndoManager, UndoableOperation, completion, ready,
};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Move(Vec<PathBuf>, PathBuf),
    Copy(Vec<PathBuf>, PathBuf),
    Duplicate(Vec<PathBuf>),
    Link(Vec<PathBuf>, PathBuf),
    Delete(Vec<PathBuf>),
    Trash(Vec<PathBuf>),
    Rename(PathBuf, String),
    BatchRename(Vec<PathBuf>, Vec<String>),
    NewFile(PathBuf, String),
    NewFolder(PathBuf, String),
    NewFromTemplate(PathBuf, String, PathBuf),
    SetPermissions(PathBuf, u32),
    SetPermissionsRecursive(PathBuf),
    SetOwner(PathBuf, String),
    SetGroup(PathBuf, String),
    Extract(Vec<PathBuf>, PathBuf),
    Compress(Vec<PathBuf>, PathBuf),
    EnumerateTrash,
    MoveRaw(PathBuf, PathBuf),
}

/// Records every request and answers from canned state.
#[derive(Default)]
struct MockService {
    calls: Mutex<Vec<Call>>,
    trash: Mutex<Vec<TrashEntry>>,
    extract_outputs: Mutex<Vec<PathBuf>>,
    recursive_modes: Mutex<Vec<(PathBuf, u32)>>,
    /// The next request answers with this error.
    failure: Mutex<Option<ServiceError>>,
    /// Hold answers until `release` is notified.
    held: Mutex<bool>,
    release: Arc<Notify>,
    /// Transfers stop as cancelled after this many items.
    cancel_after: Mutex<Option<usize>>,
}

impl MockService {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn fail_next(&self, error: ServiceError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    fn hold(&self) {
        *self.held.lock().unwrap() = true;
    }

    fn answer<T: Send + 'static>(&self, call: Call, value: T) -> Completion<T> {
        self.calls.lock().unwrap().push(call);

        if let Some(error) = self.failure.lock().unwrap().take() {
            return ready(Err(error));
        }
        if *self.held.lock().unwrap() {
            let (tx, rx) = completion();
            let release = self.release.clone();
            tokio::spawn(async move {
                release.notified().await;
                let _ = tx.send(Ok(value));
            });
            return rx;
        }
        ready(Ok(value))
    }

    /// Answer a transfer. Like a real service, a held transfer that gets
    /// cancelled still answers, with a report marked cancelled.
    fn answer_transfer(&self, call: Call, mut report: TransferReport, cancel: CancellationToken) -> Completion<TransferReport> {
        if let Some(limit) = *self.cancel_after.lock().unwrap() {
            report.completed.truncate(limit);
            report.cancelled = true;
        }
        if !*self.held.lock().unwrap() {
            return self.answer(call, report);
        }

        self.calls.lock().unwrap().push(call);
        let (tx, rx) = completion();
        let release = self.release.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = release.notified() => {
                    let _ = tx.send(Ok(report));
                }
                _ = cancel.cancelled() => {
                    let _ = tx.send(Ok(TransferReport { cancelled: true, ..TransferReport::new() }));
                }
            }
        });
        rx
    }

    fn transfer(sources: &[PathBuf], destination: &Path) -> TransferReport {
        let mut report = TransferReport::new();
        for source in sources {
            report.push(source.clone(), destination.join(source.file_name().unwrap()));
        }
        report
    }
}

impl FileOperationsService for MockService {
    fn move_items(&self, sources: Vec<PathBuf>, destination: PathBuf, cancel: CancellationToken) -> Completion<TransferReport> {
        let report = Self::transfer(&sources, &destination);
        self.answer_transfer(Call::Move(sources, destination), report, cancel)
    }

    fn copy_items(&self, sources: Vec<PathBuf>, destination: PathBuf, cancel: CancellationToken) -> Completion<TransferReport> {
        let report = Self::transfer(&sources, &destination);
        self.answer_transfer(Call::Copy(sources, destination), report, cancel)
    }

    fn duplicate(&self, sources: Vec<PathBuf>, cancel: CancellationToken) -> Completion<TransferReport> {
        let mut report = TransferReport::new();
        for source in &sources {
            let name = format!("{} (copy)", source.file_name().unwrap().to_string_lossy());
            report.push(source.clone(), source.with_file_name(name));
        }
        self.answer_transfer(Call::Duplicate(sources), report, cancel)
    }

    fn link(&self, sources: Vec<PathBuf>, destination: PathBuf, cancel: CancellationToken) -> Completion<TransferReport> {
        let report = Self::transfer(&sources, &destination);
        self.answer_transfer(Call::Link(sources, destination), report, cancel)
    }

    fn delete(&self, targets: Vec<PathBuf>, _: CancellationToken) -> Completion<()> {
        self.answer(Call::Delete(targets), ())
    }

    fn trash_or_delete(&self, targets: Vec<PathBuf>, _: CancellationToken) -> Completion<()> {
        self.answer(Call::Trash(targets), ())
    }

    fn rename(&self, path: PathBuf, new_name: String) -> Completion<PathBuf> {
        let renamed = path.with_file_name(&new_name);
        self.answer(Call::Rename(path, new_name), renamed)
    }

    fn batch_rename(&self, paths: Vec<PathBuf>, new_names: Vec<String>, _: CancellationToken) -> Completion<Vec<PathBuf>> {
        let renamed = paths.iter().zip(&new_names).map(|(p, n)| p.with_file_name(n)).collect();
        self.answer(Call::BatchRename(paths, new_names), renamed)
    }

    fn new_file(&self, parent: PathBuf, name: String, _: Option<Vec<u8>>) -> Completion<PathBuf> {
        let path = parent.join(&name);
        self.answer(Call::NewFile(parent, name), path)
    }

    fn new_folder(&self, parent: PathBuf, name: String) -> Completion<PathBuf> {
        let path = parent.join(&name);
        self.answer(Call::NewFolder(parent, name), path)
    }

    fn new_file_from_template(&self, parent: PathBuf, name: String, template: PathBuf) -> Completion<PathBuf> {
        let path = parent.join(&name);
        self.answer(Call::NewFromTemplate(parent, name, template), path)
    }

    fn set_permissions(&self, path: PathBuf, mode: u32) -> Completion<()> {
        self.answer(Call::SetPermissions(path, mode), ())
    }

    fn set_permissions_recursive(
        &self,
        root: PathBuf,
        _: RecursivePermissionChange,
        _: CancellationToken,
    ) -> Completion<Vec<(PathBuf, u32)>> {
        let modes = self.recursive_modes.lock().unwrap().clone();
        self.answer(Call::SetPermissionsRecursive(root), modes)
    }

    fn set_owner(&self, path: PathBuf, owner: String) -> Completion<()> {
        self.answer(Call::SetOwner(path, owner), ())
    }

    fn set_group(&self, path: PathBuf, group: String) -> Completion<()> {
        self.answer(Call::SetGroup(path, group), ())
    }

    fn extract(&self, sources: Vec<PathBuf>, destination: PathBuf, _: CancellationToken) -> Completion<Vec<PathBuf>> {
        let outputs = self.extract_outputs.lock().unwrap().clone();
        self.answer(Call::Extract(sources, destination), outputs)
    }

    fn compress(
        &self,
        sources: Vec<PathBuf>,
        output: PathBuf,
        _: ArchiveFormat,
        _: ArchiveFilter,
        _: CancellationToken,
    ) -> Completion<PathBuf> {
        let written = output.clone();
        self.answer(Call::Compress(sources, output), written)
    }

    fn enumerate_trash(&self) -> Completion<Vec<TrashEntry>> {
        let entries = self.trash.lock().unwrap().clone();
        self.answer(Call::EnumerateTrash, entries)
    }

    fn move_raw(&self, source: PathBuf, destination: PathBuf) -> Completion<()> {
        self.answer(Call::MoveRaw(source, destination), ())
    }
}

fn manager(service: &Arc<MockService>, depth: usize) -> Arc<UndoManager<MockService>> {
    let config = UndoConfig::builder().history_depth(depth).build().unwrap();
    Arc::new(UndoManager::new(service.clone(), &config))
}

fn moved(names: &[&str]) -> TransferOperation {
    let pairs = names
        .iter()
        .map(|n| TransferPair::new(Path::new("/src").join(n), Path::new("/dst").join(n)))
        .collect();
    TransferOperation::new(TransferKind::Move, "/src", "/dst", pairs)
}

async fn wait_until_pending(manager: &UndoManager<MockService>) {
    for _ in 0..1000 {
        if manager.is_pending() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("apply never started");
}

#[tokio::test]
async fn test_move_round_trip() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(moved(&["a.txt"]));

    assert_eq!(manager.undo().await, Ok(ApplyOutcome::Success));
    assert_eq!(
        service.calls(),
        vec![Call::Move(vec![PathBuf::from("/dst/a.txt")], PathBuf::from("/src"))]
    );
    assert!(!manager.can_undo());
    assert!(manager.can_redo());

    service.reset_calls();
    assert_eq!(manager.redo().await, Ok(ApplyOutcome::Success));
    assert_eq!(
        service.calls(),
        vec![Call::Move(vec![PathBuf::from("/src/a.txt")], PathBuf::from("/dst"))]
    );
    assert!(manager.can_undo());
}

#[tokio::test]
async fn test_move_labels() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);

    manager.push_operation(moved(&["a.txt"]));
    assert_eq!(manager.undo_label(), "Undo Move");
    assert_eq!(manager.undo_description(), "Move “a.txt” back to “/src”");

    manager.push_operation(moved(&["1", "2", "3", "4", "5"]));
    assert_eq!(manager.undo_label(), "Undo Move 5 items");
    assert_eq!(manager.undo_description(), "Move 5 items back to “/src”");

    manager.undo().await.unwrap();
    assert_eq!(manager.redo_label(), "Redo Move 5 items");
    assert_eq!(manager.redo_description(), "Move 5 items to “/dst”");
    assert_eq!(manager.undo_label(), "Undo");
}

#[tokio::test]
async fn test_nothing_to_apply() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);

    assert_eq!(manager.undo().await, Err(InvariantViolation::NothingToApply(Direction::Undo)));
    assert_eq!(manager.redo().await, Err(InvariantViolation::NothingToApply(Direction::Redo)));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_only_one_apply_in_flight() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(moved(&["a"]));
    service.hold();

    let running = tokio::spawn({
        let manager = manager.clone();
        async move { manager.undo().await }
    });
    wait_until_pending(&manager).await;

    assert_eq!(manager.undo().await, Err(InvariantViolation::ApplyPending));
    assert_eq!(manager.redo().await, Err(InvariantViolation::ApplyPending));
    assert!(!manager.state().can_undo);
    assert_eq!(service.calls().len(), 1);

    service.release.notify_one();
    assert_eq!(running.await.unwrap(), Ok(ApplyOutcome::Success));
    assert!(!manager.is_pending());
    assert!(manager.can_redo());
}

#[tokio::test]
async fn test_cancel_reports_user_cancelled() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(moved(&["a"]));
    service.hold();

    let running = tokio::spawn({
        let manager = manager.clone();
        async move { manager.undo().await }
    });
    wait_until_pending(&manager).await;
    manager.cancel();

    assert_eq!(running.await.unwrap(), Ok(ApplyOutcome::UserCancelled));
    assert!(!manager.is_pending());
    // The cursor did not move
    assert!(manager.can_undo());
    assert!(!manager.can_redo());
}

#[tokio::test]
async fn test_dropped_apply_keeps_operation() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(moved(&["a"]));
    service.hold();

    let running = tokio::spawn({
        let manager = manager.clone();
        async move { manager.undo().await }
    });
    wait_until_pending(&manager).await;
    running.abort();
    assert!(running.await.unwrap_err().is_cancelled());

    assert!(!manager.is_pending());
    assert!(manager.can_undo());
    assert!(!manager.can_redo());
    assert_eq!(manager.undo_description(), "Move “a” back to “/src”");

    *service.held.lock().unwrap() = false;
    assert_eq!(manager.undo().await, Ok(ApplyOutcome::Success));
}

#[tokio::test]
async fn test_cancelled_copy_redo_reverts_copied_items() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(TransferOperation::new(
        TransferKind::Copy,
        "/src",
        "/dst",
        vec![TransferPair::new("/src/a", "/dst/a"), TransferPair::new("/src/b", "/dst/b")],
    ));
    manager.undo().await.unwrap();
    service.reset_calls();

    *service.cancel_after.lock().unwrap() = Some(1);
    assert_eq!(manager.redo().await, Ok(ApplyOutcome::UserCancelled));
    assert_eq!(
        service.calls(),
        vec![
            Call::Copy(vec!["/src/a".into(), "/src/b".into()], "/dst".into()),
            Call::Delete(vec!["/dst/a".into()]),
        ]
    );
    assert!(manager.can_redo());
    assert!(!manager.can_undo());
}

#[tokio::test]
async fn test_cancelled_move_undo_moves_items_back() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(moved(&["a", "b"]));

    *service.cancel_after.lock().unwrap() = Some(1);
    assert_eq!(manager.undo().await, Ok(ApplyOutcome::UserCancelled));
    assert_eq!(
        service.calls(),
        vec![
            Call::Move(vec!["/dst/a".into(), "/dst/b".into()], "/src".into()),
            Call::Move(vec!["/src/a".into()], "/dst".into()),
        ]
    );
    assert!(manager.can_undo());
}

#[tokio::test]
async fn test_failure_releases_gate() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(moved(&["a"]));

    service.fail_next(ServiceError::other("disk on fire"));
    assert_eq!(manager.undo().await, Ok(ApplyOutcome::Failed("disk on fire".into())));
    assert!(!manager.is_pending());
    assert!(manager.can_undo());

    assert_eq!(manager.undo().await, Ok(ApplyOutcome::Success));
}

#[tokio::test]
async fn test_already_in_progress_counts_as_success() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(moved(&["a"]));

    service.fail_next(ServiceError::AlreadyInProgress);
    assert_eq!(manager.undo().await, Ok(ApplyOutcome::Success));
    assert!(manager.can_redo());
}

#[tokio::test]
async fn test_service_cancel_error_is_user_cancelled() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(moved(&["a"]));

    service.fail_next(ServiceError::Cancelled);
    assert_eq!(manager.undo().await, Ok(ApplyOutcome::UserCancelled));
}

#[tokio::test]
async fn test_extract_undo_needs_outputs() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(ExtractOperation::new(vec!["/d/a.zip".into()], "/d"));

    assert_eq!(manager.undo().await, Err(InvariantViolation::ExtractNotApplied));
    assert!(service.calls().is_empty());
    assert!(!manager.is_pending());
    assert!(manager.can_undo());
}

#[tokio::test]
async fn test_extract_redo_then_undo() {
    let service = MockService::default();
    *service.extract_outputs.lock().unwrap() = vec![PathBuf::from("/d/a")];
    let ctx = ApplyContext::new(&service, CancellationToken::new());

    let mut op = UndoableOperation::from(ExtractOperation::new(vec!["/d/a.zip".into()], "/d"));
    assert_eq!(op.apply(Direction::Redo, &ctx).await, Ok(ApplyOutcome::Success));
    assert_eq!(op.apply(Direction::Undo, &ctx).await, Ok(ApplyOutcome::Success));
    assert_eq!(
        service.calls(),
        vec![
            Call::Extract(vec![PathBuf::from("/d/a.zip")], PathBuf::from("/d")),
            Call::Delete(vec![PathBuf::from("/d/a")]),
        ]
    );
}

#[tokio::test]
async fn test_extract_without_outputs_fails() {
    let service = MockService::default();
    let ctx = ApplyContext::new(&service, CancellationToken::new());

    let mut op = UndoableOperation::from(ExtractOperation::new(vec!["/d/a.zip".into()], "/d"));
    let outcome = op.apply(Direction::Redo, &ctx).await.unwrap();
    assert!(outcome.failure().is_some());
}

#[tokio::test]
async fn test_trash_restore_within_epsilon() {
    let service = Arc::new(MockService::default());
    service.trash.lock().unwrap().push(TrashEntry {
        trash_path: "/trash/files/a.txt".into(),
        original_path: "/home/a.txt".into(),
        deleted_at: 1001,
    });
    let manager = manager(&service, 1);
    manager.push_operation(TrashOperation::new([(PathBuf::from("/home/a.txt"), 1000)]));

    assert_eq!(manager.undo().await, Ok(ApplyOutcome::Success));
    assert_eq!(
        service.calls(),
        vec![
            Call::EnumerateTrash,
            Call::MoveRaw("/trash/files/a.txt".into(), "/home/a.txt".into()),
        ]
    );
}

#[tokio::test]
async fn test_trash_restore_outside_epsilon() {
    let service = Arc::new(MockService::default());
    service.trash.lock().unwrap().push(TrashEntry {
        trash_path: "/trash/files/a.txt".into(),
        original_path: "/home/a.txt".into(),
        deleted_at: 1003,
    });
    let manager = manager(&service, 1);
    manager.push_operation(TrashOperation::new([(PathBuf::from("/home/a.txt"), 1000)]));

    let outcome = manager.undo().await.unwrap();
    assert!(outcome.failure().is_some());
    assert_eq!(service.calls(), vec![Call::EnumerateTrash]);
    assert!(manager.can_undo());
}

#[tokio::test]
async fn test_trash_redo_refreshes_times() {
    let service = MockService::default();
    let ctx = ApplyContext::new(&service, CancellationToken::new());
    let mut op = TrashOperation::new([(PathBuf::from("/home/a.txt"), 1000)]);

    let mut wrapped = UndoableOperation::from(op.clone());
    assert_eq!(wrapped.apply(Direction::Redo, &ctx).await, Ok(ApplyOutcome::Success));
    if let UndoableOperation::Trash(redone) = wrapped {
        op = redone;
    }

    let deleted_at = op.trashed()[&PathBuf::from("/home/a.txt")];
    assert!(deleted_at > 1000);
    assert_eq!(service.calls(), vec![Call::Trash(vec!["/home/a.txt".into()])]);
}

#[tokio::test]
async fn test_copy_undo_deletes_in_reverse() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(TransferOperation::new(
        TransferKind::Copy,
        "/src",
        "/dst",
        vec![TransferPair::new("/src/a", "/dst/a"), TransferPair::new("/src/b", "/dst/b")],
    ));

    manager.undo().await.unwrap();
    assert_eq!(
        service.calls(),
        vec![Call::Delete(vec!["/dst/b".into(), "/dst/a".into()])]
    );
}

#[tokio::test]
async fn test_duplicate_redo_refreshes_targets() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(TransferOperation::new(
        TransferKind::Duplicate,
        "/d",
        "/d",
        vec![TransferPair::new("/d/a", "/d/a (1)")],
    ));

    manager.undo().await.unwrap();
    manager.redo().await.unwrap();
    service.reset_calls();
    manager.undo().await.unwrap();

    assert_eq!(service.calls(), vec![Call::Delete(vec!["/d/a (copy)".into()])]);
}

#[tokio::test]
async fn test_batch_rename_ordering() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    let op = BatchRenameOperation::from_lists(vec!["/d/A".into(), "/d/B".into()], vec!["B".into(), "C".into()])
        .unwrap();
    manager.push_operation(op);

    manager.undo().await.unwrap();
    assert_eq!(
        service.calls(),
        vec![Call::BatchRename(
            vec!["/d/B".into(), "/d/C".into()],
            vec!["A".into(), "B".into()]
        )]
    );

    service.reset_calls();
    manager.redo().await.unwrap();
    assert_eq!(
        service.calls(),
        vec![Call::BatchRename(
            vec!["/d/B".into(), "/d/A".into()],
            vec!["C".into(), "B".into()]
        )]
    );
}

#[tokio::test]
async fn test_batch_rename_across_folders() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    let op = BatchRenameOperation::from_lists(vec!["/a/x".into(), "/b/y".into()], vec!["y".into(), "x".into()])
        .unwrap();
    manager.push_operation(op);

    assert_eq!(manager.undo().await, Ok(ApplyOutcome::Success));
    assert_eq!(
        service.calls(),
        vec![Call::BatchRename(
            vec!["/a/y".into(), "/b/x".into()],
            vec!["x".into(), "y".into()]
        )]
    );
    assert_eq!(manager.redo().await, Ok(ApplyOutcome::Success));
}

#[tokio::test]
async fn test_batch_rename_cycle_fails() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    let op = BatchRenameOperation::from_lists(vec!["/d/A".into(), "/d/B".into()], vec!["B".into(), "A".into()])
        .unwrap();
    manager.push_operation(op);

    let outcome = manager.undo().await.unwrap();
    assert!(outcome.failure().unwrap().contains("Cyclic"));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_recursive_permissions() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    let change = RecursivePermissionChange {
        file_permissions: 0o600,
        file_mask: 0o777,
        dir_permissions: 0o700,
        dir_mask: 0o777,
    };

    // Nothing recorded: undo is a no-op
    manager.push_operation(RecursivePermissionsOperation::new("/d", change));
    assert_eq!(manager.undo().await, Ok(ApplyOutcome::Success));
    assert!(service.calls().is_empty());

    *service.recursive_modes.lock().unwrap() = vec![("/d".into(), 0o755), ("/d/f".into(), 0o644)];
    manager.redo().await.unwrap();
    service.reset_calls();
    manager.undo().await.unwrap();

    assert_eq!(
        service.calls(),
        vec![
            Call::SetPermissions("/d".into(), 0o755),
            Call::SetPermissions("/d/f".into(), 0o644),
        ]
    );
}

#[tokio::test]
async fn test_create_round_trip() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(CreateOperation::from_template("/d/new.odt", "/t/base.odt"));

    manager.undo().await.unwrap();
    manager.redo().await.unwrap();
    assert_eq!(
        service.calls(),
        vec![
            Call::Delete(vec!["/d/new.odt".into()]),
            Call::NewFromTemplate("/d".into(), "new.odt".into(), "/t/base.odt".into()),
        ]
    );
}

#[tokio::test]
async fn test_history_depth_bounds_undo() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 2);
    for name in ["a", "b", "c"] {
        manager.push_operation(moved(&[name]));
    }

    assert_eq!(manager.undo().await, Ok(ApplyOutcome::Success));
    assert_eq!(manager.undo().await, Ok(ApplyOutcome::Success));
    assert_eq!(manager.undo().await, Err(InvariantViolation::NothingToApply(Direction::Undo)));
    assert_eq!(
        service.calls(),
        vec![
            Call::Move(vec!["/dst/c".into()], "/src".into()),
            Call::Move(vec!["/dst/b".into()], "/src".into()),
        ]
    );
}

#[tokio::test]
async fn test_push_replaces_redo() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 3);
    manager.push_operation(moved(&["a"]));
    manager.undo().await.unwrap();
    assert!(manager.can_redo());

    manager.push_operation(moved(&["b"]));
    assert!(!manager.can_redo());
    assert_eq!(manager.undo_description(), "Move “b” back to “/src”");
}

#[tokio::test]
async fn test_push_during_pending_apply() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(moved(&["a"]));
    service.hold();

    let running = tokio::spawn({
        let manager = manager.clone();
        async move { manager.undo().await }
    });
    wait_until_pending(&manager).await;

    manager.push_operation(moved(&["b"]));
    service.release.notify_one();
    running.await.unwrap().unwrap();

    assert!(!manager.is_pending());
    assert!(!manager.can_redo());
    assert_eq!(manager.undo_description(), "Move “b” back to “/src”");
}

#[tokio::test]
async fn test_clear() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(moved(&["a"]));
    manager.clear();

    assert!(!manager.can_undo());
    assert_eq!(manager.undo_label(), "Undo");
}

#[tokio::test]
async fn test_events_on_push_and_apply() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    let mut events = manager.subscribe();

    manager.push_operation(moved(&["a"]));
    let UndoEvent::StateChanged(state) = events.recv().await.unwrap();
    assert!(state.can_undo);
    assert_eq!(state.undo_label, "Undo Move");

    manager.undo().await.unwrap();
    let UndoEvent::StateChanged(started) = events.recv().await.unwrap();
    assert!(started.pending);
    let UndoEvent::StateChanged(finished) = events.recv().await.unwrap();
    assert!(!finished.pending);
    assert!(finished.can_redo);
}

#[tokio::test]
async fn test_compress_round_trip() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(UndoableOperation::Compress(rewind_ops::CompressOperation::new(
        vec!["/d/a".into()],
        "/d/a.zip",
        ArchiveFormat::Zip,
        ArchiveFilter::None,
    )));

    manager.undo().await.unwrap();
    manager.redo().await.unwrap();
    assert_eq!(
        service.calls(),
        vec![
            Call::Delete(vec!["/d/a.zip".into()]),
            Call::Compress(vec!["/d/a".into()], "/d/a.zip".into()),
        ]
    );
}

#[tokio::test]
async fn test_restore_from_trash_undo_trashes_again() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(TransferOperation::new(
        TransferKind::RestoreFromTrash,
        "/trash/files",
        "/home",
        vec![TransferPair::new("/trash/files/a.txt", "/home/a.txt")],
    ));

    manager.undo().await.unwrap();
    manager.redo().await.unwrap();
    assert_eq!(
        service.calls(),
        vec![
            Call::Trash(vec!["/home/a.txt".into()]),
            Call::Move(vec!["/trash/files/a.txt".into()], "/home".into()),
        ]
    );
}

#[tokio::test]
async fn test_link_undo_deletes_in_reverse() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(TransferOperation::new(
        TransferKind::Link,
        "/src",
        "/links",
        vec![TransferPair::new("/src/a", "/links/a"), TransferPair::new("/src/b", "/links/b")],
    ));

    assert_eq!(manager.undo_label(), "Undo Create Links");
    manager.undo().await.unwrap();
    manager.redo().await.unwrap();
    assert_eq!(
        service.calls(),
        vec![
            Call::Delete(vec!["/links/b".into(), "/links/a".into()]),
            Call::Link(vec!["/src/a".into(), "/src/b".into()], "/links".into()),
        ]
    );
}

#[tokio::test]
async fn test_permissions_round_trip() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 1);
    manager.push_operation(PermissionsOperation::new("/d/f", 0o644, 0o600));

    manager.undo().await.unwrap();
    manager.redo().await.unwrap();
    assert_eq!(
        service.calls(),
        vec![
            Call::SetPermissions("/d/f".into(), 0o644),
            Call::SetPermissions("/d/f".into(), 0o600),
        ]
    );
}

#[tokio::test]
async fn test_ownership_round_trip() {
    let service = Arc::new(MockService::default());
    let manager = manager(&service, 2);
    manager.push_operation(OwnershipOperation::new(OwnershipKind::Owner, "/d/f", "alice", "bob"));
    manager.push_operation(OwnershipOperation::new(OwnershipKind::Group, "/d/f", "staff", "wheel"));

    manager.undo().await.unwrap();
    manager.undo().await.unwrap();
    manager.redo().await.unwrap();
    manager.redo().await.unwrap();
    assert_eq!(
        service.calls(),
        vec![
            Call::SetGroup("/d/f".into(), "staff".into()),
            Call::SetOwner("/d/f".into(), "alice".into()),
            Call::SetOwner("/d/f".into(), "bob".into()),
            Call::SetGroup("/d/f".into(), "wheel".into()),
        ]
    );
}
