//! Map build/open integration tests against real artifact files.

use std::path::Path;

use tx_dict::artifact::MapPaths;
use tx_dict::{Map, MapBuilder, MapScanMatch};

fn build_hoge(prefix: &Path) {
    let mut builder = MapBuilder::new();
    builder.add_all(["ho", "foo", "hoge", "bar", "hogeshi", "foobar"]);
    builder.build(prefix).unwrap();
}

fn strings(items: Vec<Vec<u8>>) -> Vec<String> {
    items
        .into_iter()
        .map(|v| String::from_utf8(v).unwrap())
        .collect()
}

#[test]
fn lookup_and_has_key() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("hoge");
    build_hoge(&prefix);

    let map = Map::load(&prefix).unwrap();
    assert!(map.has_key("ho"));
    assert!(map.has_key("hogeshi"));
    assert!(!map.has_key("foo"));
    assert!(!map.has_key("hog"));
    assert_eq!(map.lookup("ho"), b"foo");
    assert_eq!(map.lookup("hoge"), b"bar");
    assert_eq!(map.lookup("hogeshi"), b"foobar");
    assert!(map.lookup("foo").is_empty());
    assert_eq!(map.get("foo"), None);
}

#[test]
fn keys_values_and_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("hoge");
    build_hoge(&prefix);

    let map = Map::load(&prefix).unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(strings(map.keys()), vec!["ho", "hoge", "hogeshi"]);
    assert_eq!(strings(map.values()), vec!["foo", "bar", "foobar"]);

    let pairs: Vec<(String, String)> = map
        .iter()
        .map(|(k, v)| (String::from_utf8(k).unwrap(), String::from_utf8(v).unwrap()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("ho".to_string(), "foo".to_string()),
            ("hoge".to_string(), "bar".to_string()),
            ("hogeshi".to_string(), "foobar".to_string()),
        ]
    );
}

#[test]
fn scan_reports_values() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("hoge");
    build_hoge(&prefix);

    let map = Map::load(&prefix).unwrap();
    assert_eq!(
        map.scan("hogehogahoyo"),
        vec![
            MapScanMatch::new("hoge", 0, "bar"),
            MapScanMatch::new("ho", 4, "foo"),
            MapScanMatch::new("ho", 8, "foo"),
        ]
    );
}

#[test]
fn equal_values_are_stored_once() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("dedup");

    let mut builder = MapBuilder::new();
    builder.add("k1", "v");
    builder.add("k2", "v");
    builder.add("k3", "w");
    let summary = builder.build(&prefix).unwrap();
    assert_eq!(summary.num_keys, 3);
    assert_eq!(summary.num_values, 2);

    let map = Map::load(&prefix).unwrap();
    assert_eq!(map.value_index().num_keys(), 2);
    assert_eq!(map.key_index().num_keys(), 3);
    assert_eq!(map.lookup("k1"), b"v");
    assert_eq!(map.lookup("k2"), b"v");
    assert_eq!(map.lookup("k3"), b"w");
}

#[test]
fn last_value_wins() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("overwrite");

    let mut builder = MapBuilder::new();
    builder.add("k", "v1");
    builder.add("k", "v2");
    builder.build(&prefix).unwrap();

    let map = Map::load(&prefix).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.lookup("k"), b"v2");
    assert_eq!(map.value_index().num_keys(), 1);
}

#[test]
fn multibyte_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("kana");

    let mut builder = MapBuilder::new();
    builder.add_all(["ほ", "ふー", "ほげ", "ばー", "ほげし", "ふーばー"]);
    builder.build(&prefix).unwrap();

    let map = Map::load(&prefix).unwrap();
    assert_eq!(String::from_utf8(map.lookup("ほげ")).unwrap(), "ばー");
    assert_eq!(
        map.scan("ほげほがほよ"),
        vec![
            MapScanMatch::new("ほげ", 0, "ばー"),
            MapScanMatch::new("ほ", 6, "ふー"),
            MapScanMatch::new("ほ", 12, "ふー"),
        ]
    );
}

#[test]
fn empty_value_is_distinct_from_absent_key() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("empty");

    let mut builder = MapBuilder::new();
    builder.add("blank", "");
    builder.add("full", "x");
    builder.build(&prefix).unwrap();

    let map = Map::load(&prefix).unwrap();
    assert_eq!(map.get("blank"), Some(Vec::new()));
    assert_eq!(map.get("missing"), None);
    assert!(map.lookup("blank").is_empty());
    assert!(map.has_key("blank"));
}

#[test]
fn unopened_and_failed_open() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("hoge");

    let mut map = Map::new();
    assert!(!map.open(&prefix));
    assert!(!map.is_open());
    assert!(map.lookup("ho").is_empty());
    assert!(!map.error_log().is_empty());

    build_hoge(&prefix);
    assert!(map.open(&prefix));
    assert!(map.is_open());
    assert_eq!(map.error_log(), "");

    // Missing value dictionary: the whole map stays unopened.
    std::fs::remove_file(MapPaths::new(&prefix).value).unwrap();
    assert!(!map.open(&prefix));
    assert!(!map.is_open());
    assert!(!map.has_key("ho"));
    assert_eq!(map.len(), 0);
}

#[test]
fn reopen_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("hoge");
    build_hoge(&prefix);

    let mut map = Map::new();
    assert!(map.open(&prefix));
    let first: Vec<_> = map.iter().collect();
    assert!(map.open(&prefix));
    assert_eq!(map.iter().collect::<Vec<_>>(), first);
}

#[test]
fn rebuild_replaces_map() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("hoge");
    build_hoge(&prefix);

    let mut builder = MapBuilder::new();
    builder.add("only", "one");
    builder.build(&prefix).unwrap();

    let map = Map::load(&prefix).unwrap();
    assert_eq!(strings(map.keys()), vec!["only"]);
    assert!(!map.has_key("ho"));
}
