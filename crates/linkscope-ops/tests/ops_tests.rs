use linkscope_core::{ColumnSelector, ScanConfig};
use linkscope_ops::{
    DeletionAction, Job, JobId, JobKind, JobOutput, JobRequest, JobStatus, JobTracker,
    OrphanDeleter, TrackerConfig,
};
use linkscope_scan::LinkScanner;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Downloads and library trees with one synced file and one orphan per side.
struct Library {
    _temp: TempDir,
    dl: PathBuf,
    lib: PathBuf,
}

impl Library {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let dl = temp.path().join("dl");
        let lib = temp.path().join("lib");

        write(&dl.join("linked/x.mkv"), "linked movie");
        fs::create_dir_all(lib.join("Linked")).unwrap();
        fs::hard_link(dl.join("linked/x.mkv"), lib.join("Linked/x.mkv")).unwrap();
        write(&dl.join("stale/y.mkv"), "stale download");
        write(&lib.join("Manual/z.mkv"), "manual import");
        write(&lib.join("Shared/w.mkv"), "w");
        write(&lib.join("Shared/poster.jpg"), "poster");
        fs::hard_link(lib.join("Shared/poster.jpg"), dl.join("poster.jpg")).unwrap();

        Self {
            _temp: temp,
            dl,
            lib,
        }
    }

    fn config(&self) -> ScanConfig {
        ScanConfig::new([self.dl.clone()], [self.lib.clone()])
    }

    fn snapshot(&self) -> BTreeMap<PathBuf, u64> {
        let mut files = BTreeMap::new();
        for root in [&self.dl, &self.lib] {
            collect(root, &mut files);
        }
        files
    }
}

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn collect(dir: &Path, files: &mut BTreeMap<PathBuf, u64>) {
    for entry in fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();
        if path.is_dir() {
            collect(&path, files);
        } else {
            files.insert(path, entry.metadata().unwrap().len());
        }
    }
}

async fn wait_for(tracker: &JobTracker, id: JobId) -> Job {
    for _ in 0..2000 {
        let job = tracker.get(id).unwrap();
        if !job.is_running() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {id} never finished");
}

#[test]
fn test_dry_run_never_mutates() {
    let library = Library::new();
    let before = library.snapshot();

    let result = OrphanDeleter::new(library.config(), ColumnSelector::Both)
        .run(&LinkScanner::new())
        .unwrap();

    assert!(result.dry_run);
    assert_eq!(result.total_deleted, 3);
    assert_eq!(result.total_errors, 0);
    assert!(result
        .deleted_files
        .iter()
        .all(|f| f.action == DeletionAction::WouldDelete));
    assert_eq!(result.bytes(), "stale download".len() as u64 + "manual import".len() as u64 + 1);
    assert_eq!(library.snapshot(), before);
}

#[test]
fn test_real_run_deletes_and_prunes() {
    let library = Library::new();

    let result = OrphanDeleter::new(library.config(), ColumnSelector::Both)
        .dry_run(false)
        .run(&LinkScanner::new())
        .unwrap();

    assert!(!result.dry_run);
    assert_eq!(result.total_deleted, 3);
    assert!(result
        .deleted_files
        .iter()
        .all(|f| f.action == DeletionAction::Deleted));

    assert!(!library.dl.join("stale").exists());
    assert!(!library.lib.join("Manual").exists());
    assert!(library.lib.join("Shared/poster.jpg").exists());
    assert!(!library.lib.join("Shared/w.mkv").exists());
    assert!(library.dl.join("linked/x.mkv").exists());
    assert!(library.lib.join("Linked/x.mkv").exists());
    assert!(library.dl.is_dir());

    let rescan = LinkScanner::new().scan_files(&library.config()).unwrap();
    assert!(rescan.is_clean());
    assert_eq!(rescan.synced.len(), 2);
}

#[test]
fn test_selector_limits_columns() {
    let library = Library::new();

    let result = OrphanDeleter::new(library.config(), ColumnSelector::A)
        .dry_run(false)
        .run(&LinkScanner::new())
        .unwrap();

    assert_eq!(result.total_deleted, 1);
    assert_eq!(result.deleted_files[0].path, library.dl.join("stale/y.mkv"));
    assert!(library.lib.join("Manual/z.mkv").exists());
    assert!(library.lib.join("Shared/w.mkv").exists());
}

#[test]
fn test_scan_errors_not_counted_as_deletion_errors() {
    let library = Library::new();
    let config = ScanConfig::new(
        [library.dl.clone(), library.dl.with_file_name("missing")],
        [library.lib.clone()],
    );

    let result = OrphanDeleter::new(config, ColumnSelector::A)
        .run(&LinkScanner::new())
        .unwrap();

    assert_eq!(result.total_errors, 0);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.total_deleted, 1);
}

#[tokio::test]
async fn test_scan_job_reports_progress_then_completes() {
    let temp = TempDir::new().unwrap();
    let dl = temp.path().join("dl");
    let lib = temp.path().join("lib");
    for i in 0..40 {
        let source = dl.join(format!("season/e{i:02}.mkv"));
        write(&source, "episode");
        if i % 2 == 0 {
            fs::create_dir_all(lib.join("Show")).unwrap();
            fs::hard_link(&source, lib.join(format!("Show/e{i:02}.mkv"))).unwrap();
        }
    }
    let expected = 40 + 20;

    let tracker = JobTracker::start(TrackerConfig::default());
    let id = tracker
        .submit(JobRequest::ScanFile {
            config: ScanConfig::new([dl], [lib]),
        })
        .await;

    let first = tracker.get(id).unwrap();
    assert_eq!(first.kind, JobKind::ScanFile);
    assert_eq!(first.total, expected);

    let mut last_progress = 0;
    let job = loop {
        let job = tracker.get(id).unwrap();
        assert!(job.progress >= last_progress);
        assert!(job.progress <= job.total);
        last_progress = job.progress;
        if !job.is_running() {
            break job;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    };

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, expected);
    assert!(job.error.is_none());
    let scan = job.result.as_ref().and_then(JobOutput::as_scan).unwrap();
    assert_eq!(scan.synced.len(), 20);
    assert_eq!(scan.orphans_a.len(), 20);
}

#[tokio::test]
async fn test_scan_job_times_out() {
    let library = Library::new();
    let tracker = JobTracker::start(
        TrackerConfig::builder()
            .max_duration(Duration::ZERO)
            .sweep_interval(Duration::from_millis(10))
            .build()
            .unwrap(),
    );

    let id = tracker
        .submit(JobRequest::ScanFolder {
            config: library.config(),
            check: ColumnSelector::Both,
        })
        .await;
    tracker.sweep();

    let job = wait_for(&tracker, id).await;
    assert_eq!(job.status, JobStatus::Timeout);
    assert!(job.result.is_none());
    assert!(job.error.is_some());
}

#[tokio::test]
async fn test_delete_job_via_tracker() {
    let library = Library::new();
    let before = library.snapshot();
    let tracker = JobTracker::start(TrackerConfig::default());

    let preview = tracker
        .submit(JobRequest::DeleteOrphans {
            config: library.config(),
            columns: ColumnSelector::B,
            dry_run: true,
        })
        .await;
    let job = wait_for(&tracker, preview).await;
    assert_eq!(job.status, JobStatus::Completed);
    let deletion = job.result.as_ref().and_then(JobOutput::as_deletion).unwrap();
    assert_eq!(deletion.total_deleted, 2);
    assert_eq!(library.snapshot(), before);

    let real = tracker
        .submit(JobRequest::DeleteOrphans {
            config: library.config(),
            columns: ColumnSelector::B,
            dry_run: false,
        })
        .await;
    let job = wait_for(&tracker, real).await;
    assert_eq!(job.kind, JobKind::DeleteOrphans);
    assert_eq!(job.status, JobStatus::Completed);
    assert!(!library.lib.join("Manual/z.mkv").exists());
    assert!(library.dl.join("stale/y.mkv").exists());
}
