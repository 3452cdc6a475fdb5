use std::path::{Path, PathBuf};

use jammdb::DB;
use tempfile::tempdir;

use burrow::core::decode::FieldType;
use burrow::core::error::ExplorerError;
use burrow::core::state::Explorer;

fn string_value(text: &str) -> Vec<u8> {
    let mut raw = vec![5u8];
    raw.extend_from_slice(text.as_bytes());
    raw
}

fn int32_value(n: i32) -> Vec<u8> {
    let mut raw = vec![2u8];
    raw.extend_from_slice(&n.to_le_bytes());
    raw
}

fn int64_value(n: i64) -> Vec<u8> {
    let mut raw = vec![3u8];
    raw.extend_from_slice(&n.to_le_bytes());
    raw
}

fn float64_value(x: f64) -> Vec<u8> {
    let mut raw = vec![4u8];
    raw.extend_from_slice(&x.to_le_bytes());
    raw
}

fn timestamp_value(millis: i64) -> Vec<u8> {
    let mut raw = vec![6u8];
    raw.extend_from_slice(&millis.to_le_bytes());
    raw
}

/// Builds the fixture database:
///
/// ```text
/// fabric/
///   enabled    = bool true
///   ghost      = (empty value)
///   identities/
///     abc      = int32 7
///   name       = string "mesh-0"
/// services/
///   blob       = unknown bytes
///   max-conns  = int64 4096
///   ratio      = float64 0.25
///   updated-at = timestamp 1700000000000
/// ```
fn fixture_db(dir: &Path) -> PathBuf {
    let path = dir.join("ctrl.db");
    let db = DB::open(&path).expect("create fixture db");
    {
        let tx = db.tx(true).expect("write tx");

        let fabric = tx.create_bucket("fabric").expect("fabric");
        fabric.put("name", string_value("mesh-0")).expect("name");
        fabric.put("enabled", vec![1u8, 1]).expect("enabled");
        fabric.put("ghost", Vec::<u8>::new()).expect("ghost");

        let identities = fabric.create_bucket("identities").expect("identities");
        identities.put("abc", int32_value(7)).expect("abc");

        let services = tx.create_bucket("services").expect("services");
        services.put("max-conns", int64_value(4096)).expect("max-conns");
        services.put("ratio", float64_value(0.25)).expect("ratio");
        services
            .put("updated-at", timestamp_value(1_700_000_000_000))
            .expect("updated-at");
        services.put("blob", vec![0x7fu8, 0xaa, 0xbb]).expect("blob");

        tx.commit().expect("commit");
    }
    // Release the fixture's file lock before the explorer reopens it.
    drop(db);
    path
}

#[test]
fn open_rejects_missing_paths() {
    let dir = tempdir().expect("tempdir");
    let err = Explorer::open(dir.path().join("missing.db")).unwrap_err();
    assert!(matches!(err, ExplorerError::PathNotFound(_)), "{err}");
}

#[test]
fn open_rejects_directories() {
    let dir = tempdir().expect("tempdir");
    let err = Explorer::open(dir.path()).unwrap_err();
    assert!(matches!(err, ExplorerError::NotAFile(_)), "{err}");
}

#[test]
fn navigation_scenario_end_to_end() {
    let dir = tempdir().expect("tempdir");
    let path = fixture_db(dir.path());
    let mut explorer = Explorer::open(&path).expect("open");

    assert!(explorer.at_root());

    explorer.enter("fabric").expect("enter fabric");
    assert_eq!(explorer.path(), ["fabric"]);

    explorer.enter("identities").expect("enter identities");
    assert_eq!(explorer.path(), ["fabric", "identities"]);

    assert_eq!(explorer.get_value("abc").expect("get abc"), "7");
    assert_eq!(explorer.key_count().expect("count"), 1);

    explorer.back().expect("back");
    assert_eq!(explorer.path(), ["fabric"]);

    explorer.to_root();
    assert!(explorer.at_root());
}

#[test]
fn enter_requires_an_exact_key_match() {
    let dir = tempdir().expect("tempdir");
    let path = fixture_db(dir.path());
    let mut explorer = Explorer::open(&path).expect("open");

    // A prefix of an existing bucket name must not match.
    let err = explorer.enter("fab").unwrap_err();
    assert!(matches!(err, ExplorerError::BucketNotFound(_)), "{err}");
    assert!(explorer.at_root());

    // Nor an extension of one.
    let err = explorer.enter("fabricx").unwrap_err();
    assert!(matches!(err, ExplorerError::BucketNotFound(_)), "{err}");
    assert!(explorer.at_root());

    // Surrounding whitespace is trimmed before matching.
    explorer.enter("  fabric  ").expect("trimmed enter");
    assert_eq!(explorer.path(), ["fabric"]);

    let err = explorer.enter("ident").unwrap_err();
    assert!(matches!(err, ExplorerError::BucketNotFound(_)), "{err}");
    assert_eq!(explorer.path(), ["fabric"]);
}

#[test]
fn enter_rejects_leaf_keys_and_leaves_the_path_alone() {
    let dir = tempdir().expect("tempdir");
    let path = fixture_db(dir.path());
    let mut explorer = Explorer::open(&path).expect("open");

    explorer.enter("fabric").expect("enter fabric");
    let err = explorer.enter("name").unwrap_err();
    assert!(matches!(err, ExplorerError::NotABucket(_)), "{err}");
    assert_eq!(explorer.path(), ["fabric"]);
}

#[test]
fn back_walks_up_and_fails_at_root() {
    let dir = tempdir().expect("tempdir");
    let path = fixture_db(dir.path());
    let mut explorer = Explorer::open(&path).expect("open");

    explorer.enter("fabric").expect("enter fabric");
    explorer.enter("identities").expect("enter identities");

    explorer.back().expect("back");
    explorer.back().expect("back");
    assert!(explorer.at_root());

    let err = explorer.back().unwrap_err();
    assert!(matches!(err, ExplorerError::AlreadyAtRoot), "{err}");
    assert!(explorer.at_root());
}

#[test]
fn key_count_always_matches_the_listing() {
    let dir = tempdir().expect("tempdir");
    let path = fixture_db(dir.path());
    let mut explorer = Explorer::open(&path).expect("open");

    for hops in [
        &[][..],
        &["fabric"][..],
        &["fabric", "identities"][..],
    ] {
        explorer.to_root();
        for hop in hops {
            explorer.enter(hop).expect("enter");
        }
        let count = explorer.key_count().expect("count");
        let listed = explorer.list_entries().expect("list").len() as u64;
        assert_eq!(count, listed, "at path {hops:?}");
    }
}

#[test]
fn listings_are_cached_per_path_for_the_session() {
    let dir = tempdir().expect("tempdir");
    let path = fixture_db(dir.path());
    let mut explorer = Explorer::open(&path).expect("open");

    explorer.enter("fabric").expect("enter fabric");
    let first = explorer.list_entries().expect("list").to_vec();

    // Leave and come back; the earlier read is reused as-is.
    explorer.to_root();
    explorer.enter("fabric").expect("re-enter fabric");
    let second = explorer.list_entries().expect("list again").to_vec();
    assert_eq!(first, second);
}

#[test]
fn entries_decode_in_on_disk_order() {
    let dir = tempdir().expect("tempdir");
    let path = fixture_db(dir.path());
    let mut explorer = Explorer::open(&path).expect("open");

    explorer.enter("fabric").expect("enter fabric");
    let entries = explorer.list_entries().expect("list").to_vec();

    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["enabled", "ghost", "identities", "name"]);

    assert_eq!(entries[0].field_type, FieldType::Bool);
    assert_eq!(entries[0].value_string.as_deref(), Some("true"));

    assert_eq!(entries[1].field_type, FieldType::Nil);
    assert_eq!(entries[1].value_string.as_deref(), Some("nil"));

    assert_eq!(entries[2].field_type, FieldType::Bucket);
    assert!(entries[2].is_bucket());
    assert_eq!(entries[2].value_string, None);

    assert_eq!(entries[3].field_type, FieldType::String);
    assert_eq!(entries[3].value_string.as_deref(), Some("mesh-0"));
}

#[test]
fn every_scalar_type_renders() {
    let dir = tempdir().expect("tempdir");
    let path = fixture_db(dir.path());
    let mut explorer = Explorer::open(&path).expect("open");

    explorer.enter("services").expect("enter services");
    assert_eq!(explorer.get_value("max-conns").expect("i64"), "4096");
    assert_eq!(explorer.get_value("ratio").expect("f64"), "0.25");
    assert_eq!(
        explorer.get_value("updated-at").expect("ts"),
        "1700000000Z"
    );
    // Undecodable bytes come back as a hex preview, not an error.
    assert_eq!(explorer.get_value("blob").expect("blob"), "0x7faabb");
}

#[test]
fn get_value_reads_nil_for_soft_misses() {
    let dir = tempdir().expect("tempdir");
    let path = fixture_db(dir.path());
    let mut explorer = Explorer::open(&path).expect("open");

    explorer.enter("fabric").expect("enter fabric");
    assert_eq!(explorer.get_value("missing-key").expect("missing"), "nil");
    // A key that names a nested bucket carries no scalar value.
    assert_eq!(explorer.get_value("identities").expect("bucket"), "nil");
    // An empty stored value decodes to nil too.
    assert_eq!(explorer.get_value("ghost").expect("ghost"), "nil");
}

#[test]
fn close_is_idempotent_and_later_reads_fail_cleanly() {
    let dir = tempdir().expect("tempdir");
    let path = fixture_db(dir.path());
    let mut explorer = Explorer::open(&path).expect("open");

    explorer.close();
    explorer.close();

    let err = explorer.key_count().unwrap_err();
    assert!(matches!(err, ExplorerError::Closed), "{err}");
}

#[test]
fn db_info_reports_page_geometry() {
    let dir = tempdir().expect("tempdir");
    let path = fixture_db(dir.path());
    let explorer = Explorer::open(&path).expect("open");

    let info = explorer.db_info().expect("info");
    assert!(info.pagesize >= 1024);
    assert!(info.file_size > 0);
    assert_eq!(info.page_count, info.file_size / info.pagesize);
}

#[test]
fn bucket_totals_walk_the_subtree() {
    let dir = tempdir().expect("tempdir");
    let path = fixture_db(dir.path());
    let mut explorer = Explorer::open(&path).expect("open");

    let root = explorer.bucket_totals().expect("root totals");
    assert_eq!(root.keys, 0);
    assert_eq!(root.buckets, 2);
    assert_eq!(root.total_buckets, 3);
    assert_eq!(root.total_keys, 8);
    assert_eq!(root.depth, 2);

    explorer.enter("fabric").expect("enter fabric");
    let fabric = explorer.bucket_totals().expect("fabric totals");
    assert_eq!(fabric.keys, 3);
    assert_eq!(fabric.buckets, 1);
    assert_eq!(fabric.total_keys, 4);
    assert_eq!(fabric.total_buckets, 1);
    assert_eq!(fabric.depth, 1);
}
