//! Integration tests for `FileStore` against a real temporary directory.

use chrono::{TimeZone, Utc};
use rollcall_protocol::{
    AttendanceSession, CheckinCode, CourseMeta, HistoryRecord, SessionId, StudentId,
    TeacherId,
};
use rollcall_store::{FileStore, HistoryStore, SessionStore};
use tempfile::TempDir;

// =========================================================================
// Helpers
// =========================================================================

async fn open_store() -> (TempDir, FileStore) {
    let dir = TempDir::new().expect("tempdir");
    let store = FileStore::open(dir.path()).await.expect("open store");
    (dir, store)
}

fn sample(id: &str) -> AttendanceSession {
    let now = Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap();
    AttendanceSession::new(
        SessionId::parse(id).unwrap(),
        &TeacherId::parse("T1").unwrap(),
        CourseMeta {
            course_code: "CS101".into(),
            section: "1".into(),
            ..CourseMeta::default()
        },
        CheckinCode::parse("48213").unwrap(),
        now,
        now,
    )
}

fn history_of(session: AttendanceSession) -> HistoryRecord {
    HistoryRecord {
        history_id: format!("CS101_1_20240902_{}", session.session_id),
        archived_at: Utc.with_ymd_and_hms(2024, 9, 2, 10, 0, 0).unwrap(),
        session,
    }
}

fn file_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// =========================================================================
// SessionStore
// =========================================================================

#[tokio::test]
async fn test_get_missing_session_returns_none() {
    let (_dir, store) = open_store().await;
    let got = store.get(&SessionId::parse("NOPE1").unwrap()).await.unwrap();
    assert!(got.is_none());
}

#[tokio::test]
async fn test_put_then_get_returns_same_record() {
    let (_dir, store) = open_store().await;
    let mut session = sample("AB12C");
    session.record_presence(StudentId::parse("S1").unwrap(), "Ann", "09:05".into());

    store.put(&session).await.unwrap();
    let loaded = store.get(&session.session_id).await.unwrap();

    assert_eq!(loaded, Some(session));
}

#[tokio::test]
async fn test_put_replaces_previous_version_and_leaves_no_temporaries() {
    let (_dir, store) = open_store().await;
    let mut session = sample("AB12C");
    store.put(&session).await.unwrap();

    session.mark_stopped(Utc::now());
    store.put(&session).await.unwrap();

    let loaded = store.get(&session.session_id).await.unwrap().unwrap();
    assert!(!loaded.active);
    assert_eq!(file_names(store.sessions_dir()), vec!["AB12C.json"]);
}

#[tokio::test]
async fn test_list_skips_corrupt_and_temporary_files() {
    let (_dir, store) = open_store().await;
    store.put(&sample("AAAA1")).await.unwrap();
    store.put(&sample("BBBB2")).await.unwrap();
    std::fs::write(store.sessions_dir().join("BROKE.json"), b"{ half a rec").unwrap();
    std::fs::write(store.sessions_dir().join(".CCCC3.1234.tmp"), b"partial").unwrap();

    let mut ids: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.session_id.to_string())
        .collect();
    ids.sort();

    assert_eq!(ids, vec!["AAAA1", "BBBB2"]);
}

#[tokio::test]
async fn test_get_corrupt_record_is_an_error() {
    let (_dir, store) = open_store().await;
    std::fs::write(store.sessions_dir().join("BROKE.json"), b"not json").unwrap();

    let result = store.get(&SessionId::parse("BROKE").unwrap()).await;

    assert!(matches!(result, Err(rollcall_store::StoreError::Corrupt { .. })));
}

#[tokio::test]
async fn test_get_and_list_load_sessions_with_malformed_student_entries() {
    let (_dir, store) = open_store().await;
    let mut json = serde_json::to_value(sample("AB12C")).unwrap();
    json["students"] = serde_json::json!({
        "S1": {"name": "Ann", "status": null},
        "S2": "garbage",
    });
    std::fs::write(
        store.sessions_dir().join("AB12C.json"),
        serde_json::to_vec(&json).unwrap(),
    )
    .unwrap();

    let session = store
        .get(&SessionId::parse("AB12C").unwrap())
        .await
        .unwrap()
        .unwrap();
    let s1 = &session.students[&StudentId::parse("S1").unwrap()];
    assert_eq!(s1.name, "Ann");
    assert_eq!(s1.status.as_str(), "pending");
    assert_eq!(session.students.len(), 2);

    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_reports_whether_record_existed() {
    let (_dir, store) = open_store().await;
    let session = sample("AB12C");
    store.put(&session).await.unwrap();

    assert!(store.delete(&session.session_id).await.unwrap());
    assert!(!store.delete(&session.session_id).await.unwrap());
    assert!(store.get(&session.session_id).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_puts_never_expose_partial_records() {
    // Many writers replace the same record while readers poll it. Every
    // read must decode cleanly: either some complete version or nothing.
    let (_dir, store) = open_store().await;
    store.put(&sample("AB12C")).await.unwrap();
    let store = std::sync::Arc::new(store);

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..20 {
        let store = store.clone();
        tasks.spawn(async move {
            let mut session = sample("AB12C");
            session.record_presence(
                StudentId::parse(&format!("S{i}")).unwrap(),
                "x",
                "09:00".into(),
            );
            store.put(&session).await.unwrap();
            let read = store.get(&session.session_id).await;
            assert!(read.is_ok(), "read saw a partial record: {read:?}");
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }
}

// =========================================================================
// HistoryStore
// =========================================================================

#[tokio::test]
async fn test_insert_history_is_write_once() {
    let (_dir, store) = open_store().await;
    let first = history_of(sample("AB12C"));
    let mut second = first.clone();
    second.session.course.course_title = "changed".into();

    assert!(store.insert_history(&first).await.unwrap());
    assert!(!store.insert_history(&second).await.unwrap());

    let stored = store.get_history(&first.history_id).await.unwrap().unwrap();
    assert_eq!(stored, first, "the original snapshot must survive");
    assert_eq!(
        file_names(store.history_dir()),
        vec!["CS101_1_20240902_AB12C.json"]
    );
}

#[tokio::test]
async fn test_find_history_by_session_id_suffix() {
    let (_dir, store) = open_store().await;
    store.insert_history(&history_of(sample("AB12C"))).await.unwrap();
    store.insert_history(&history_of(sample("ZZ99Z"))).await.unwrap();

    let found = store
        .find_history(&SessionId::parse("ZZ99Z").unwrap())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.session.session_id.as_str(), "ZZ99Z");
}

#[tokio::test]
async fn test_find_history_falls_back_to_scanning_contents() {
    let (_dir, store) = open_store().await;
    let mut record = history_of(sample("AB12C"));
    record.history_id = "renamed-by-hand".into();
    store.insert_history(&record).await.unwrap();

    let found = store
        .find_history(&SessionId::parse("AB12C").unwrap())
        .await
        .unwrap();

    assert_eq!(found.map(|r| r.history_id), Some("renamed-by-hand".into()));
}

#[tokio::test]
async fn test_find_history_skips_corrupt_file_matching_suffix() {
    let (_dir, store) = open_store().await;
    std::fs::write(store.history_dir().join("BROKEN_AB12C.json"), b"{ trunc").unwrap();
    let mut record = history_of(sample("AB12C"));
    record.history_id = "renamed-by-hand".into();
    store.insert_history(&record).await.unwrap();

    let found = store
        .find_history(&SessionId::parse("AB12C").unwrap())
        .await
        .unwrap();

    assert_eq!(found.map(|r| r.history_id), Some("renamed-by-hand".into()));
}

#[tokio::test]
async fn test_find_history_unknown_session_returns_none() {
    let (_dir, store) = open_store().await;
    store.insert_history(&history_of(sample("AB12C"))).await.unwrap();

    let found = store
        .find_history(&SessionId::parse("QQQQQ").unwrap())
        .await
        .unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn test_get_history_rejects_path_tricks() {
    let (_dir, store) = open_store().await;
    assert!(store.get_history("../attendance/AB12C").await.unwrap().is_none());
    assert!(store.get_history("///").await.unwrap().is_none());
}
