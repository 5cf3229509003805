#![allow(dead_code)]

use packetfs::Properties;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn props(v: Value) -> Properties {
    match v {
        Value::Object(map) => map,
        other => panic!("fixture is not an object: {other}"),
    }
}

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

fn write_json(dir: &Path, name: &str, v: Value) {
    write(dir, name, &serde_json::to_string_pretty(&v).unwrap());
}

/// A directory holding one multi-file packet, four packets with sortable
/// properties and a directory-level index.
pub fn sort_fixture() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();

    write(dir, "document.txt", "body");
    write(dir, "document_.md", "# body");
    write(dir, "document_notes.txt", "notes");
    write_json(dir, "document_properties.json", json!({ "object-value": { "foo": "bar" } }));

    write_json(dir, "sort1_properties.json", json!({ "order": 4, "title": "apple",  "created": "2020-01-01" }));
    write_json(dir, "sort2_properties.json", json!({ "order": 3, "title": "Banana", "created": "2019-06-15T10:00:00Z" }));
    write_json(dir, "sort3_properties.json", json!({ "order": 2, "title": "cherry", "created": "2021-03-01 08:00:00" }));
    write_json(dir, "sort4_properties.json", json!({ "order": 1, "title": 42,       "created": "not a date" }));

    write_json(dir, "_properties.json", json!({
        "packet-blank": true,
        "index": ["sort2", "sort4", "sort1", "sort3"],
    }));
    tmp
}

pub fn packet_paths(dir: &Path) -> Vec<PathBuf> {
    packetfs::list_packets(&packetfs::LocalFs, dir)
        .unwrap()
        .into_iter()
        .map(|p| p.path().to_owned())
        .collect()
}

pub fn primaries(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}
