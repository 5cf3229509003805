//! Filesystem collaborator contract.
//!
//! The packet operations only need four primitives: list a directory, read a
//! file as text, write (create or truncate) a file, and rename one path to
//! another.  [`PacketFs`] is the blocking form and [`AsyncPacketFs`] the
//! suspending one; [`LocalFs`] implements both against the local disk.
//!
//! Other backends (a remote share, an in-memory tree for tests) only have to
//! implement these traits.  Each call reports its own success or failure;
//! there is no batch rename.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tracing::warn;

pub trait PacketFs {
    /// Basenames of the entries in `dir`, in the collaborator's order.
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>>;
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

#[async_trait]
pub trait AsyncPacketFs: Send + Sync {
    async fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>>;
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;
    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

impl<T: PacketFs + ?Sized> PacketFs for &T {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        (**self).list_dir(dir)
    }
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        (**self).write(path, contents)
    }
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }
}

// ── LocalFs ──────────────────────────────────────────────────────────────────

/// The local disk.  Listings are sorted by name so that every scan, and
/// therefore every multi-file rename, runs in the same order.  A directory
/// holding an entry whose name is not UTF-8 cannot be listed
/// (`InvalidData`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

fn entry_name(dir: &Path, name: std::ffi::OsString) -> io::Result<String> {
    name.into_string().map_err(|raw| {
        warn!(dir = %dir.display(), name = ?raw, "non UTF-8 directory entry");
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("directory entry {:?} in {} is not valid UTF-8", raw, dir.display()),
        )
    })
}

impl PacketFs for LocalFs {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            names.push(entry_name(dir, entry?.file_name())?);
        }
        names.sort_unstable();
        Ok(names)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }
}

#[async_trait]
impl AsyncPacketFs for LocalFs {
    async fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry_name(dir, entry.file_name())?);
        }
        names.sort_unstable();
        Ok(names)
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::rename(from, to).await
    }
}


#[cfg(test)]
mod async_tests {
    use super::{AsyncPacketFs, LocalFs};
    use tempfile::tempdir;

    #[tokio::test]
    async fn async_listing_matches_sync_order() {
        let dir = tempdir().unwrap();
        for name in ["z", "m_x", "a.b"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let names = LocalFs.list_dir(dir.path()).await.unwrap();
        assert_eq!(names, vec!["a.b", "m_x", "z"]);
    }

    #[tokio::test]
    async fn write_read_rename() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        LocalFs.write(&a, b"hello").await.unwrap();
        LocalFs.rename(&a, &b).await.unwrap();
        assert_eq!(LocalFs.read_to_string(&b).await.unwrap(), "hello");
        assert!(!a.exists());
    }
}
