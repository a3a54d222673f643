//! Integration tests for ad hoc and tracked batch runs.

mod common;

use async_trait::async_trait;
use common::*;
use gdocs2blog::{
    BatchOrchestrator, ConversionOutcome, ConversionProgressCallback, DocumentConverter,
    Gdocs2BlogError, StateFiles,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn state_files(dir: &Path) -> StateFiles {
    StateFiles {
        pending: dir.join("pending_doc_ids.json"),
        completed: dir.join("converted_doc_ids.json"),
    }
}

async fn read_ids(path: &Path) -> Vec<String> {
    let text = tokio::fs::read_to_string(path).await.unwrap();
    serde_json::from_str(&text).unwrap()
}

async fn write_ids(path: &Path, ids: &[&str]) {
    tokio::fs::write(path, serde_json::to_string(ids).unwrap())
        .await
        .unwrap();
}

/// Records the IDs it is asked to convert; never touches the network.
#[derive(Default)]
struct RecordingConverter {
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl DocumentConverter for RecordingConverter {
    async fn convert(&self, doc_id: &str) -> ConversionOutcome {
        self.calls.lock().unwrap().push(doc_id.to_string());
        ConversionOutcome::succeeded(doc_id, format!("{doc_id}.md").into())
    }
}

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<String>>,
}

impl ConversionProgressCallback for EventLog {
    fn on_batch_start(&self, total: usize) {
        self.events.lock().unwrap().push(format!("start {total}"));
    }

    fn on_document_complete(&self, index: usize, _total: usize, doc_id: &str, _path: &str) {
        self.events.lock().unwrap().push(format!("ok {index} {doc_id}"));
    }

    fn on_document_error(&self, index: usize, _total: usize, doc_id: &str, _error: &str) {
        self.events.lock().unwrap().push(format!("err {index} {doc_id}"));
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {success_count}/{total}"));
    }
}

#[tokio::test]
async fn tracked_run_moves_only_successes() {
    let dir = TempDir::new().unwrap();
    let files = state_files(dir.path());
    write_ids(&files.pending, &["a", "b"]).await;
    write_ids(&files.completed, &["earlier"]).await;

    // "b" is unknown to the source and fails with HTTP 404.
    let source = MockSource::default().with("a", &article_html());
    let converter = converter(&dir.path().join("posts"), source);
    let events = Arc::new(EventLog::default());
    let orchestrator = BatchOrchestrator::new(Arc::new(converter))
        .with_progress(Arc::clone(&events) as Arc<dyn ConversionProgressCallback>);

    let report = orchestrator.run_tracked(&files).await.unwrap();
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);

    assert_eq!(read_ids(&files.pending).await, vec!["b"]);
    assert_eq!(read_ids(&files.completed).await, vec!["earlier", "a"]);
    assert_eq!(
        *events.events.lock().unwrap(),
        vec!["start 2", "ok 1 a", "err 2 b", "done 1/2"]
    );
}

#[tokio::test]
async fn tracked_run_processes_in_stored_order() {
    let dir = TempDir::new().unwrap();
    let files = state_files(dir.path());
    write_ids(&files.pending, &["z", "m", "a"]).await;

    let converter = RecordingConverter::default();
    let calls = Arc::clone(&converter.calls);
    BatchOrchestrator::new(Arc::new(converter))
        .run_tracked(&files)
        .await
        .unwrap();

    assert_eq!(*calls.lock().unwrap(), vec!["z", "m", "a"]);
    assert!(read_ids(&files.pending).await.is_empty());
    assert_eq!(read_ids(&files.completed).await, vec!["z", "m", "a"]);
}

#[tokio::test]
async fn tracked_run_without_pending_list_converts_nothing() {
    let dir = TempDir::new().unwrap();
    let files = state_files(dir.path());
    let converter = RecordingConverter::default();
    let calls = Arc::clone(&converter.calls);
    let orchestrator = BatchOrchestrator::new(Arc::new(converter));

    let err = orchestrator.run_tracked(&files).await.unwrap_err();
    assert!(matches!(err, Gdocs2BlogError::PendingListMissing { .. }));

    tokio::fs::write(&files.pending, "[\"a\",").await.unwrap();
    let err = orchestrator.run_tracked(&files).await.unwrap_err();
    assert!(matches!(err, Gdocs2BlogError::StateFile { .. }));

    write_ids(&files.pending, &[]).await;
    let err = orchestrator.run_tracked(&files).await.unwrap_err();
    assert!(matches!(err, Gdocs2BlogError::NoPendingIds { .. }));

    assert!(calls.lock().unwrap().is_empty());
    assert!(!files.completed.exists());
}

#[tokio::test]
async fn unwritable_completed_list_aborts_the_batch() {
    let dir = TempDir::new().unwrap();
    let files = StateFiles {
        pending: dir.path().join("pending.json"),
        completed: dir.path().join("missing-dir/completed.json"),
    };
    write_ids(&files.pending, &["a", "b"]).await;

    let converter = RecordingConverter::default();
    let calls = Arc::clone(&converter.calls);
    let err = BatchOrchestrator::new(Arc::new(converter))
        .run_tracked(&files)
        .await
        .unwrap_err();

    assert!(matches!(err, Gdocs2BlogError::StateFile { .. }));
    assert_eq!(*calls.lock().unwrap(), vec!["a"]);
    // Removal from pending was saved before the completed write failed.
    assert_eq!(read_ids(&files.pending).await, vec!["b"]);
}

#[tokio::test]
async fn ad_hoc_run_leaves_state_files_alone() {
    let dir = TempDir::new().unwrap();
    let files = state_files(dir.path());
    write_ids(&files.pending, &["a"]).await;
    let before = tokio::fs::read_to_string(&files.pending).await.unwrap();

    let source = MockSource::default().with("a", &article_html());
    let converter = converter(&dir.path().join("posts"), source);
    let report = BatchOrchestrator::new(Arc::new(converter))
        .run_ids(&["a".to_string(), "nope".to_string()])
        .await;

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.outcomes[1].doc_id, "nope");
    assert!(!report.outcomes[1].success);
    assert_eq!(tokio::fs::read_to_string(&files.pending).await.unwrap(), before);
    assert!(!files.completed.exists());
}

#[tokio::test]
async fn report_serialises_for_json_output() {
    let converter = RecordingConverter::default();
    let report = BatchOrchestrator::new(Arc::new(converter))
        .run_ids(&["x".to_string()])
        .await;

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["outcomes"][0]["doc_id"], "x");
    assert_eq!(json["outcomes"][0]["success"], true);
    assert_eq!(json["outcomes"][0]["output_path"], "x.md");
}
