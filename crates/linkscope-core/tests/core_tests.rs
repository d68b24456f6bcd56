use linkscope_core::{
    Column, ColumnSelector, FileRecord, InodeKey, PathError, PerColumn, ScanConfig, ScanError,
    ScanResult, SyncedPair,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_inode_key_equality() {
    let key1 = InodeKey::new(66306, 12345);
    let key2 = InodeKey::new(66306, 12345);
    let other_device = InodeKey::new(66307, 12345);

    assert_eq!(key1, key2);
    assert_ne!(key1, other_device);
}

#[cfg(unix)]
#[test]
fn test_hard_links_share_inode_key() {
    let temp = TempDir::new().unwrap();
    let original = temp.path().join("x.mkv");
    let link = temp.path().join("x-link.mkv");
    let copy = temp.path().join("x-copy.mkv");

    fs::write(&original, "movie data").unwrap();
    fs::hard_link(&original, &link).unwrap();
    fs::copy(&original, &copy).unwrap();

    let key = |p: &Path| InodeKey::from_metadata(&fs::metadata(p).unwrap());
    assert_eq!(key(&original), key(&link));
    assert_ne!(key(&original), key(&copy));
}

#[test]
fn test_file_record_parent() {
    let record = FileRecord::new("/lib/movie/x.mkv", Column::B, InodeKey::new(1, 2));
    assert_eq!(record.parent(), Some(Path::new("/lib/movie")));
    assert_eq!(record.column, Column::B);
}

#[test]
fn test_per_column_serializes_with_column_names() {
    let folders = PerColumn::new(vec![PathBuf::from("/dl/show")], Vec::new());
    let json = serde_json::to_value(&folders).unwrap();
    assert_eq!(json["A"][0], "/dl/show");
    assert!(json["B"].as_array().unwrap().is_empty());
}

#[test]
fn test_column_selector_round_trips_through_serde() {
    let json = serde_json::to_string(&ColumnSelector::Both).unwrap();
    assert_eq!(json, "\"both\"");
    let parsed: ColumnSelector = serde_json::from_str("\"b\"").unwrap();
    assert_eq!(parsed, ColumnSelector::B);
}

#[test]
fn test_scan_result_shape() {
    let result = ScanResult {
        synced: vec![SyncedPair {
            path_a: "/dl/x.mkv".into(),
            path_b: "/lib/movie/x.mkv".into(),
        }],
        errors: vec![PathError::from(ScanError::DirectoryMissing {
            path: "/missing".into(),
        })],
        ..ScanResult::new()
    };

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["synced"][0]["path_a"], "/dl/x.mkv");
    assert_eq!(json["synced"][0]["path_b"], "/lib/movie/x.mkv");
    assert_eq!(json["errors"][0]["path"], "/missing");
    assert!(json["orphans_a"].as_array().unwrap().is_empty());
    assert!(result.is_clean());
}

#[test]
fn test_scan_config_serde_defaults() {
    let config: ScanConfig =
        serde_json::from_str(r#"{"roots_a":["/dl"],"roots_b":["/lib"]}"#).unwrap();
    assert_eq!(config.max_depth, None);
    assert_eq!(config.threads, 0);
    assert!(config.include_hidden);
    assert_eq!(config.roots(Column::B), [PathBuf::from("/lib")]);
}
