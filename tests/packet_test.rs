mod common;

use common::{props, sort_fixture};
use packetfs::{
    list_members, list_members_async, list_packets, rename_packet, rename_packet_async, LocalFs,
    NameMatch, Packet, PacketError, PacketFilter, PacketFs, PropertiesCache, PropertyStore,
    StoreOptions,
};
use serde_json::json;
use std::cell::Cell;
use std::io;
use std::path::Path;

#[test]
fn test_list_packets_skips_blank() {
    let tmp = sort_fixture();
    let names: Vec<String> = list_packets(&LocalFs, tmp.path())
        .unwrap()
        .iter()
        .map(|p| p.primary_name())
        .collect();
    assert_eq!(names, ["document", "sort1", "sort2", "sort3", "sort4"]);
}

#[test]
fn test_list_members_with_filters() {
    let tmp = sort_fixture();
    let doc = Packet::new(tmp.path().join("document_notes.txt"));

    let all = list_members(&LocalFs, &doc, &PacketFilter::any()).unwrap();
    assert_eq!(all, [
        "document.txt",
        "document_.md",
        "document_notes.txt",
        "document_properties.json",
    ]);

    let plain = PacketFilter::any().with_descriptor(NameMatch::exact(""));
    assert_eq!(list_members(&LocalFs, &doc, &plain).unwrap(), ["document.txt", "document_.md"]);

    let txt = PacketFilter::any().with_extension(NameMatch::exact(".txt"));
    assert_eq!(list_members(&LocalFs, &doc, &txt).unwrap(), ["document.txt", "document_notes.txt"]);
}

#[test]
fn test_list_members_missing_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let gone = Packet::new(tmp.path().join("nope").join("doc"));
    let err = list_members(&LocalFs, &gone, &PacketFilter::any()).unwrap_err();
    assert!(matches!(err, PacketError::NotFound { .. }), "{err}");
}

#[test]
fn test_rename_keeps_descriptors_and_properties() {
    let tmp = sort_fixture();
    let dir = tmp.path();
    std::fs::create_dir(dir.join("sub")).unwrap();

    let from = Packet::new(dir.join("document"));
    let to = Packet::new(dir.join("sub").join("report"));
    rename_packet(&LocalFs, &from, &to).unwrap();

    for name in ["report.txt", "report_.md", "report_notes.txt", "report_properties.json"] {
        assert!(dir.join("sub").join(name).exists(), "{name} missing");
    }
    assert!(list_members(&LocalFs, &from, &PacketFilter::any()).unwrap().is_empty());

    let store = PropertyStore::new(LocalFs);
    assert_eq!(store.read(&to).unwrap()["object-value"], json!({ "foo": "bar" }));
}

#[test]
fn test_rename_blank_packet_is_rejected() {
    let tmp = sort_fixture();
    let err = rename_packet(&LocalFs, &Packet::blank(tmp.path()), &Packet::new(tmp.path().join("x")))
        .unwrap_err();
    assert!(matches!(err, PacketError::InvalidPacket(_)));
    assert!(tmp.path().join("_properties.json").exists());
}

/// Local disk whose n-th rename fails.
struct FailingRename {
    fail_at: usize,
    calls:   Cell<usize>,
}

impl PacketFs for FailingRename {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        LocalFs.list_dir(dir)
    }
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        LocalFs.read_to_string(path)
    }
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        LocalFs.write(path, contents)
    }
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let n = self.calls.get();
        self.calls.set(n + 1);
        if n == self.fail_at {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        }
        LocalFs.rename(from, to)
    }
}

#[test]
fn test_partial_rename_reports_progress() {
    let tmp = sort_fixture();
    let dir = tmp.path();
    let fs = FailingRename { fail_at: 2, calls: Cell::new(0) };

    let err = rename_packet(&fs, &Packet::new(dir.join("document")), &Packet::new(dir.join("memo")))
        .unwrap_err();
    match err {
        PacketError::PartialRename { completed, failed, source } => {
            assert_eq!(completed, 2);
            assert_eq!(failed, dir.join("document_notes.txt"));
            assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
        }
        other => panic!("expected PartialRename, got {other}"),
    }
    // No rollback: the first two moved, the rest stayed.
    assert!(dir.join("memo.txt").exists());
    assert!(dir.join("memo_.md").exists());
    assert!(dir.join("document_notes.txt").exists());
    assert!(dir.join("document_properties.json").exists());
}

#[test]
fn test_first_rename_failure_is_plain_error() {
    let tmp = sort_fixture();
    let dir = tmp.path();
    let fs = FailingRename { fail_at: 0, calls: Cell::new(0) };
    let err = rename_packet(&fs, &Packet::new(dir.join("sort1")), &Packet::new(dir.join("x")))
        .unwrap_err();
    assert!(matches!(err, PacketError::Io(_)), "{err}");
}

/// A directory listing served from memory; every file reads as `{}`.
struct FixedListing(Vec<&'static str>);

impl PacketFs for FixedListing {
    fn list_dir(&self, _dir: &Path) -> io::Result<Vec<String>> {
        Ok(self.0.iter().map(|s| s.to_string()).collect())
    }
    fn read_to_string(&self, _path: &Path) -> io::Result<String> {
        Ok("{}".to_owned())
    }
    fn write(&self, _path: &Path, _contents: &[u8]) -> io::Result<()> {
        Ok(())
    }
    fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_conflicting_sidecars() {
    let fs = FixedListing(vec!["doc.txt", "doc_properties.json", "doc_properties.json"]);
    let mut cache = PropertiesCache::new(PropertyStore::new(fs));
    let err = cache.read(&Packet::new("/d/doc")).unwrap_err();
    match err {
        PacketError::ConflictingMetadata { candidates, .. } => {
            assert_eq!(candidates, ["doc_properties.json", "doc_properties.json"]);
        }
        other => panic!("expected ConflictingMetadata, got {other}"),
    }
    assert!(cache.is_empty());

    let fs = FixedListing(vec!["doc.txt", "doc_properties.JSON", "other_properties.json"]);
    assert!(PropertyStore::new(fs).read(&Packet::new("/d/doc")).unwrap().is_empty());
}

#[test]
fn test_names_with_dots_and_underscores() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    for name in ["c_x_y.z", "report.pdf", "report.v2.pdf"] {
        std::fs::write(dir.join(name), "").unwrap();
    }
    std::fs::write(dir.join("report_properties.json"), r#"{ "owner": "report" }"#).unwrap();

    let packets = list_packets(&LocalFs, dir).unwrap();
    let names: Vec<String> = packets.iter().map(|p| p.primary_name()).collect();
    assert_eq!(names, ["c_x", "report", "report.v2"]);

    // A listed packet reads back what was saved for it.
    let store = PropertyStore::new(LocalFs);
    store.save(&packets[0], &props(json!({ "order": 7 }))).unwrap();
    assert!(dir.join("c_x_properties.json").exists());
    assert_eq!(store.read(&packets[0]).unwrap()["order"], json!(7));

    let v2 = Packet::new(dir.join("report.v2.pdf"));
    assert_eq!(v2, packets[2]);
    assert!(store.read(&v2).unwrap().is_empty());

    rename_packet(&LocalFs, &v2, &Packet::new(dir.join("final"))).unwrap();
    let mut left: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    left.sort();
    assert_eq!(left, ["c_x_properties.json", "c_x_y.z", "final.pdf", "report.pdf", "report_properties.json"]);
}

#[test]
fn test_custom_sidecar_naming_follows_rename() {
    let tmp = sort_fixture();
    let dir = tmp.path();
    let options = StoreOptions { descriptor: "_meta".into(), extension: ".txt".into() };
    let mut cache = PropertiesCache::new(PropertyStore::with_options(LocalFs, options));

    let doc = Packet::new(dir.join("document"));
    assert!(cache.read(&doc).unwrap().is_empty());
    cache.save(&doc, props(json!({ "tag": "draft" }))).unwrap();
    assert!(dir.join("document_meta.txt").exists());

    let memo = Packet::new(dir.join("memo"));
    rename_packet(&LocalFs, &doc, &memo).unwrap();
    assert_eq!(cache.read(&memo).unwrap()["tag"], json!("draft"));
    // The default sidecar moved along too.
    let default_store = PropertyStore::new(LocalFs);
    assert_eq!(default_store.read(&memo).unwrap()["object-value"], json!({ "foo": "bar" }));
}

#[cfg(unix)]
#[test]
fn test_non_utf8_member_fails_rename() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    std::fs::write(dir.join("doc.txt"), "").unwrap();
    if std::fs::write(dir.join(OsStr::from_bytes(b"doc_\xff.txt")), "").is_err() {
        return;
    }
    let err = rename_packet(&LocalFs, &Packet::new(dir.join("doc")), &Packet::new(dir.join("new")))
        .unwrap_err();
    match err {
        PacketError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
        other => panic!("expected an I/O error, got {other}"),
    }
    assert!(dir.join("doc.txt").exists());
}

#[test]
fn test_blank_and_named_properties_are_separate() {
    let tmp = sort_fixture();
    let mut cache = PropertiesCache::new(PropertyStore::new(LocalFs));
    let dir = Packet::blank(tmp.path());
    assert_eq!(cache.read(&dir).unwrap()["packet-blank"], json!(true));

    // Any member path addresses the packet.
    let via_member = Packet::new(tmp.path().join("sort1_properties.json"));
    assert_eq!(cache.read(&via_member).unwrap()["title"], json!("apple"));
    assert_eq!(cache.len(), 2);

    cache.save(&dir, props(json!({ "index": [] }))).unwrap();
    let fresh = PropertyStore::new(LocalFs).read(&dir).unwrap();
    assert_eq!(fresh, props(json!({ "index": [] })));
}

#[tokio::test]
async fn test_async_twins_match_sync() {
    let tmp = sort_fixture();
    let dir = tmp.path();
    let doc = Packet::new(dir.join("document"));

    let sync = list_members(&LocalFs, &doc, &PacketFilter::any()).unwrap();
    let not_sync = list_members_async(&LocalFs, &doc, &PacketFilter::any()).await.unwrap();
    assert_eq!(sync, not_sync);

    let mut cache = PropertiesCache::new(PropertyStore::new(LocalFs));
    let read = cache.read_async(&doc).await.unwrap().clone();
    assert_eq!(read, PropertyStore::new(LocalFs).read(&doc).unwrap());

    let to = Packet::new(dir.join("renamed"));
    rename_packet_async(&LocalFs, &doc, &to).await.unwrap();
    let moved = list_members_async(&LocalFs, &to, &PacketFilter::any()).await.unwrap();
    assert_eq!(moved, ["renamed.txt", "renamed_.md", "renamed_notes.txt", "renamed_properties.json"]);

    let store = PropertyStore::new(LocalFs);
    store.save_async(&to, &props(json!({ "v": 1 }))).await.unwrap();
    assert_eq!(store.read_async(&to).await.unwrap()["v"], json!(1));
}

mod async_paths {
    use super::common::sort_fixture;
    use packetfs::{
        list_packets, list_packets_async, rename_packet_async, AsyncPacketFs, LocalFs, Packet,
        PacketError,
    };
    use std::io;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Local disk whose n-th rename fails.
    struct FailingRename {
        fail_at: usize,
        calls:   AtomicUsize,
    }

    #[async_trait::async_trait]
    impl AsyncPacketFs for FailingRename {
        async fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
            LocalFs.list_dir(dir).await
        }
        async fn read_to_string(&self, path: &Path) -> io::Result<String> {
            LocalFs.read_to_string(path).await
        }
        async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
            LocalFs.write(path, contents).await
        }
        async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_at {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            LocalFs.rename(from, to).await
        }
    }

    #[tokio::test]
    async fn test_async_partial_rename() {
        let tmp = sort_fixture();
        let dir = tmp.path();
        let fs = FailingRename { fail_at: 1, calls: AtomicUsize::new(0) };

        let err = rename_packet_async(&fs, &Packet::new(dir.join("document")), &Packet::new(dir.join("memo")))
            .await
            .unwrap_err();
        match err {
            PacketError::PartialRename { completed, failed, .. } => {
                assert_eq!(completed, 1);
                assert_eq!(failed, dir.join("document_.md"));
            }
            other => panic!("expected PartialRename, got {other}"),
        }
        assert!(dir.join("memo.txt").exists());
        assert!(dir.join("document_.md").exists());
    }

    #[tokio::test]
    async fn test_list_packets_async_matches_sync() {
        let tmp = sort_fixture();
        let not_sync = list_packets_async(&LocalFs, tmp.path()).await.unwrap();
        assert_eq!(not_sync, list_packets(&LocalFs, tmp.path()).unwrap());
        assert_eq!(not_sync.len(), 5);
    }
}
