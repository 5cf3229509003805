//! Packets: every file in one directory sharing a primary name.
//!
//! [`Packet`] is the identity; the free functions list a packet's members and
//! move all of them to a new primary name.  Paths are expected to be
//! absolute, or at least resolved the same way for every call: a packet is
//! located purely by string manipulation of its path.
//!
//! Renaming touches several files and is not atomic.  Members are moved one
//! by one in listing order and nothing is rolled back when one of them fails
//! (see [`PacketError::PartialRename`]); the directory must be re-scanned
//! before further work on that packet.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{PacketError, Result};
use crate::fs::{AsyncPacketFs, PacketFs};
use crate::name;

// ── Packet ───────────────────────────────────────────────────────────────────

/// A packet, or a directory addressed through its blank packet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Packet {
    /// `dir/<primary>`, without descriptor or extension.
    Named(PathBuf),
    /// Files named `_<descriptor>` inside this directory describe the
    /// directory itself.
    Blank(PathBuf),
}

impl Packet {
    /// The packet `path` belongs to.  Descriptor and extension are stripped;
    /// a path whose primary name is empty yields the blank packet of its
    /// directory.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let raw = path.as_ref().to_string_lossy();
        let parts = name::decompose(&raw);
        if parts.is_blank() {
            Packet::Blank(PathBuf::from(name::dirname(&raw)))
        } else {
            Packet::Named(PathBuf::from(name::packet_path(&raw)))
        }
    }

    /// A packet path that is already stripped; it is taken as is, so
    /// `dir/report.v2` names the packet `report.v2`.
    pub fn named<P: Into<PathBuf>>(path: P) -> Self {
        Packet::Named(path.into())
    }

    pub fn blank<P: Into<PathBuf>>(dir: P) -> Self {
        Packet::Blank(dir.into())
    }

    pub fn path(&self) -> &Path {
        match self {
            Packet::Named(p) | Packet::Blank(p) => p,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Packet::Blank(_))
    }

    pub fn primary_name(&self) -> String {
        match self {
            Packet::Named(p) => name::basename(&p.to_string_lossy()).to_owned(),
            Packet::Blank(_) => String::new(),
        }
    }

    /// Directory scanned for members.
    pub fn directory(&self) -> PathBuf {
        match self {
            Packet::Named(p) => match p.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.to_owned(),
                _ => PathBuf::from("."),
            },
            Packet::Blank(dir) => dir.clone(),
        }
    }

    /// Full path of a member given its basename.
    pub fn member_path(&self, basename: &str) -> PathBuf {
        match self {
            Packet::Named(p) => p.parent().unwrap_or(Path::new("")).join(basename),
            Packet::Blank(dir) => dir.join(basename),
        }
    }

    /// Path of the member carrying `descriptor` and `extension`.
    pub fn file_path(&self, descriptor: &str, extension: &str) -> PathBuf {
        match self {
            Packet::Named(p) => {
                let mut s: OsString = p.as_os_str().to_owned();
                s.push(descriptor);
                s.push(extension);
                PathBuf::from(s)
            }
            Packet::Blank(dir) => dir.join(format!("{descriptor}{extension}")),
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packet::Named(p) => write!(f, "{}", p.display()),
            Packet::Blank(dir) => write!(f, "{} (blank)", dir.display()),
        }
    }
}

// ── Filters ──────────────────────────────────────────────────────────────────

/// How one name component is matched.
#[derive(Default)]
pub enum NameMatch {
    #[default]
    Any,
    /// Exact text.  An empty value (or a lone `_` / `.`) also matches the
    /// component being absent.
    Exact(String),
    Pattern(Regex),
    Predicate(Box<dyn Fn(&str) -> bool + Send + Sync>),
}

impl NameMatch {
    pub fn exact<S: Into<String>>(value: S) -> Self {
        NameMatch::Exact(value.into())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        NameMatch::Predicate(Box::new(f))
    }

    /// `bare` is the lone marker (`_` or `.`) treated as equivalent to empty.
    fn matches(&self, value: &str, bare: &str) -> bool {
        match self {
            NameMatch::Any => true,
            NameMatch::Exact(want) if want.is_empty() || want == bare => {
                value.is_empty() || value == bare
            }
            NameMatch::Exact(want) => value == want,
            NameMatch::Pattern(re) => re.is_match(value),
            NameMatch::Predicate(f) => f(value),
        }
    }
}

impl fmt::Debug for NameMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameMatch::Any => f.write_str("Any"),
            NameMatch::Exact(s) => f.debug_tuple("Exact").field(s).finish(),
            NameMatch::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            NameMatch::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Selects packet members by descriptor and extension.
#[derive(Debug, Default)]
pub struct PacketFilter {
    pub descriptor: NameMatch,
    pub extension:  NameMatch,
}

impl PacketFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_descriptor(mut self, m: NameMatch) -> Self {
        self.descriptor = m;
        self
    }

    pub fn with_extension(mut self, m: NameMatch) -> Self {
        self.extension = m;
        self
    }

    /// True when `basename` belongs to the packet named `primary` and passes
    /// both component matchers.
    pub fn accepts(&self, primary: &str, basename: &str) -> bool {
        let parts = name::decompose(basename);
        parts.primary == primary
            && self.descriptor.matches(parts.descriptor, "_")
            && self.extension.matches(parts.extension, ".")
    }
}

// ── Listing ──────────────────────────────────────────────────────────────────

/// Basenames of the members of `packet` accepted by `filter`, in listing
/// order.
pub fn list_members<F: PacketFs>(fs: &F, packet: &Packet, filter: &PacketFilter) -> Result<Vec<String>> {
    let dir = packet.directory();
    let names = fs.list_dir(&dir).map_err(|e| PacketError::at(&dir, e))?;
    Ok(select(packet, filter, names))
}

pub async fn list_members_async<F: AsyncPacketFs>(
    fs:     &F,
    packet: &Packet,
    filter: &PacketFilter,
) -> Result<Vec<String>> {
    let dir = packet.directory();
    let names = fs.list_dir(&dir).await.map_err(|e| PacketError::at(&dir, e))?;
    Ok(select(packet, filter, names))
}

fn select(packet: &Packet, filter: &PacketFilter, names: Vec<String>) -> Vec<String> {
    let primary = packet.primary_name();
    names.into_iter().filter(|n| filter.accepts(&primary, n)).collect()
}

/// The named packets of `dir`, first member first.  The directory's own
/// blank packet is not included.
pub fn list_packets<F: PacketFs>(fs: &F, dir: &Path) -> Result<Vec<Packet>> {
    let names = fs.list_dir(dir).map_err(|e| PacketError::at(dir, e))?;
    Ok(packets_in(dir, names))
}

pub async fn list_packets_async<F: AsyncPacketFs>(fs: &F, dir: &Path) -> Result<Vec<Packet>> {
    let names = fs.list_dir(dir).await.map_err(|e| PacketError::at(dir, e))?;
    Ok(packets_in(dir, names))
}

fn packets_in(dir: &Path, names: Vec<String>) -> Vec<Packet> {
    name::unique_primary_names(&names)
        .into_iter()
        .map(|primary| Packet::Named(dir.join(primary)))
        .collect()
}

// ── Rename ───────────────────────────────────────────────────────────────────

/// Planned moves for every member of `from`, in listing order.
fn rename_plan(from: &Packet, to: &Packet, members: &[String]) -> Result<Vec<(PathBuf, PathBuf)>> {
    if from.is_blank() || to.is_blank() {
        return Err(PacketError::InvalidPacket(format!(
            "cannot rename {from} to {to}: blank packets have no primary name"
        )));
    }
    Ok(members
        .iter()
        .map(|member| {
            let parts = name::decompose(member);
            (from.member_path(member), to.file_path(parts.descriptor, parts.extension))
        })
        .collect())
}

fn rename_failed(completed: usize, failed: PathBuf, err: std::io::Error) -> PacketError {
    if completed == 0 {
        return PacketError::at(&failed, err);
    }
    warn!(completed, failed = %failed.display(), error = %err,
        "packet rename stopped part way; directory left inconsistent");
    PacketError::PartialRename { completed, failed, source: err }
}

/// Give every member of `from` the directory and primary name of `to`,
/// keeping each member's descriptor and extension.
pub fn rename_packet<F: PacketFs>(fs: &F, from: &Packet, to: &Packet) -> Result<()> {
    let members = list_members(fs, from, &PacketFilter::any())?;
    let plan = rename_plan(from, to, &members)?;
    for (i, (old, new)) in plan.into_iter().enumerate() {
        debug!(from = %old.display(), to = %new.display(), "rename");
        fs.rename(&old, &new).map_err(|e| rename_failed(i, old, e))?;
    }
    Ok(())
}

pub async fn rename_packet_async<F: AsyncPacketFs>(fs: &F, from: &Packet, to: &Packet) -> Result<()> {
    let members = list_members_async(fs, from, &PacketFilter::any()).await?;
    let plan = rename_plan(from, to, &members)?;
    for (i, (old, new)) in plan.into_iter().enumerate() {
        debug!(from = %old.display(), to = %new.display(), "rename");
        if let Err(e) = fs.rename(&old, &new).await {
            return Err(rename_failed(i, old, e));
        }
    }
    Ok(())
}
