//! File-system tests for the journal and snapshot sources.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{TimeZone, Utc};
use filetime::{FileTime, set_file_mtime};
use icarus_core::{IngestHooks, LogQuery, LogSource, SnapshotSource, SourceError};
use icarus_journal::{JournalLog, SnapshotFiles};
use icarus_types::{LoadedFile, LogEvent};
use parking_lot::Mutex;

#[derive(Default)]
struct Recorder {
    files: Mutex<Vec<LoadedFile>>,
    records: Mutex<Vec<String>>,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.records.lock().clone()
    }

    async fn wait_for_records(&self, n: usize) -> usize {
        for _ in 0..200 {
            if self.records.lock().len() >= n {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.records.lock().len()
    }
}

impl IngestHooks for Recorder {
    fn on_file_loaded(&self, file: &LoadedFile) {
        self.files.lock().push(file.clone());
    }

    fn on_record_parsed(&self, record: &LogEvent) {
        self.records.lock().push(record.event.clone());
    }
}

fn line(second: u32, event: &str) -> String {
    format!(r#"{{"timestamp":"2024-03-01T12:00:{second:02}Z","event":"{event}"}}"#) + "\r\n"
}

fn write_file(dir: &Path, name: &str, lines: &[String], age_days: u64) {
    let path = dir.join(name);
    std::fs::write(&path, lines.concat()).unwrap();
    let modified = SystemTime::now() - Duration::from_secs(age_days * 86_400);
    set_file_mtime(&path, FileTime::from_system_time(modified)).unwrap();
}

#[tokio::test]
async fn load_replays_only_files_inside_the_window() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "Journal.2024-01-01T120000.01.log",
        &[line(0, "Fileheader"), line(1, "Shutdown")],
        40,
    );
    write_file(
        dir.path(),
        "Journal.2024-02-20T120000.01.log",
        &[line(2, "Fileheader"), line(3, "LoadGame")],
        5,
    );
    write_file(
        dir.path(),
        "Journal.2024-02-24T120000.01.log",
        &[line(4, "Fileheader"), line(5, "FSDJump")],
        1,
    );
    write_file(dir.path(), "Status.json", &["{}".to_owned()], 0);

    let log = JournalLog::new(dir.path(), Duration::from_secs(1));
    let hooks = Arc::new(Recorder::default());
    log.load(30, Arc::clone(&hooks) as Arc<dyn IngestHooks>)
        .await
        .unwrap();

    let names: Vec<String> = hooks.files.lock().iter().map(|f| f.name.clone()).collect();
    assert_eq!(
        names,
        vec![
            "Journal.2024-02-20T120000.01.log".to_owned(),
            "Journal.2024-02-24T120000.01.log".to_owned()
        ]
    );
    assert_eq!(
        hooks.events(),
        vec!["Fileheader", "LoadGame", "Fileheader", "FSDJump"]
    );
    assert_eq!(hooks.files.lock().first().and_then(|f| f.line_count), Some(2));

    let stats = log.stats();
    assert_eq!(stats.events_imported, 4);
    assert_eq!(
        stats.last_activity,
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 5).single()
    );
    assert!(log.latest("Shutdown").is_none());
}

#[tokio::test]
async fn queries_follow_timestamp_order() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "Journal.01.log",
        &[line(0, "Fileheader"), line(10, "Music"), line(20, "Scan")],
        0,
    );

    let log = JournalLog::new(dir.path(), Duration::from_secs(1));
    log.load(30, Arc::new(Recorder::default())).await.unwrap();

    let newest: Vec<String> = log.newest(2).into_iter().map(|r| r.event).collect();
    assert_eq!(newest, vec!["Scan", "Music"]);

    let since = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 10).single().unwrap();
    let recent: Vec<String> = log
        .from_timestamp(since)
        .into_iter()
        .map(|r| r.event)
        .collect();
    assert_eq!(recent, vec!["Music", "Scan"]);
}

#[tokio::test]
async fn watch_tails_appended_lines_and_new_files() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "Journal.01.log", &[line(0, "Fileheader")], 0);

    let log = JournalLog::new(dir.path(), Duration::from_millis(20));
    let hooks = Arc::new(Recorder::default());
    let as_hooks = Arc::clone(&hooks) as Arc<dyn IngestHooks>;
    log.load(30, Arc::clone(&as_hooks)).await.unwrap();
    log.watch(Arc::clone(&as_hooks)).unwrap();
    // A second watch is a no-op.
    log.watch(as_hooks).unwrap();

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(dir.path().join("Journal.01.log"))
        .unwrap();
    file.write_all(line(1, "Music").as_bytes()).unwrap();
    file.flush().unwrap();
    assert_eq!(hooks.wait_for_records(2).await, 2);

    std::fs::write(dir.path().join("Journal.02.log"), line(2, "Location")).unwrap();
    assert_eq!(hooks.wait_for_records(3).await, 3);
    assert_eq!(hooks.events(), vec!["Fileheader", "Music", "Location"]);
    assert_eq!(log.stats().events_imported, 3);
}

#[tokio::test]
async fn tail_reads_from_the_last_offset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Journal.01.log");
    write_file(dir.path(), "Journal.01.log", &[line(0, "Fileheader")], 0);

    let log = JournalLog::new(dir.path(), Duration::from_millis(20));
    let hooks = Arc::new(Recorder::default());
    let as_hooks = Arc::clone(&hooks) as Arc<dyn IngestHooks>;
    log.load(30, Arc::clone(&as_hooks)).await.unwrap();
    log.watch(as_hooks).unwrap();

    let music = line(1, "Music");
    let (head, rest) = music.split_at(20);
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(head.as_bytes()).unwrap();
    file.flush().unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(hooks.events(), vec!["Fileheader"]);

    file.write_all(rest.as_bytes()).unwrap();
    file.flush().unwrap();
    assert_eq!(hooks.wait_for_records(2).await, 2);

    let last = hooks.files.lock().last().cloned().unwrap();
    assert_eq!(last.line_count, Some(2));
    assert_eq!(last.size_bytes, std::fs::metadata(&path).unwrap().len());

    // A file rewritten shorter is read again from the start.
    std::fs::write(&path, line(2, "Shutdown")).unwrap();
    assert_eq!(hooks.wait_for_records(3).await, 3);
    assert_eq!(hooks.events(), vec!["Fileheader", "Music", "Shutdown"]);
    assert_eq!(hooks.files.lock().last().and_then(|f| f.line_count), Some(1));
}

#[tokio::test]
async fn missing_directory_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let log = JournalLog::new(dir.path().join("missing"), Duration::from_secs(1));

    let result = log.load(30, Arc::new(Recorder::default())).await;
    assert!(matches!(result, Err(SourceError::Io { .. })));
}

#[tokio::test]
async fn snapshots_keep_the_latest_copy() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "Status.json", &[r#"{"Flags":0}"#.to_owned()], 1);
    write_file(dir.path(), "Cargo.json", &["not json yet".to_owned()], 1);
    write_file(dir.path(), "Journal.01.log", &[line(0, "Fileheader")], 0);

    let files = SnapshotFiles::new(dir.path(), Duration::from_millis(20));
    let hooks = Arc::new(Recorder::default());
    let as_hooks = Arc::clone(&hooks) as Arc<dyn IngestHooks>;
    files.load(Arc::clone(&as_hooks)).await.unwrap();

    assert_eq!(files.names(), vec!["Status.json".to_owned()]);
    assert_eq!(files.document("Status.json").unwrap()["Flags"], 0);
    assert_eq!(hooks.files.lock().len(), 1);
    assert_eq!(hooks.files.lock().first().and_then(|f| f.line_count), None);

    files.watch(as_hooks).unwrap();
    write_file(dir.path(), "Status.json", &[r#"{"Flags":16}"#.to_owned()], 0);
    write_file(dir.path(), "Cargo.json", &[r#"{"Count":4}"#.to_owned()], 0);

    for _ in 0..200 {
        if files.names().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(files.document("Status.json").unwrap()["Flags"], 16);
    assert_eq!(files.document("Cargo.json").unwrap()["Count"], 4);
}
