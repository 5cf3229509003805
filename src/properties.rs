//! Per-packet properties stored in a JSON sidecar file.
//!
//! A packet's properties live in `<packet>_properties.json`; a directory's
//! live in `<dir>/_properties.json` (its blank packet).  A missing sidecar
//! reads as an empty object.  Descriptor and extension must match exactly,
//! so `doc_properties.JSON` is not a sidecar.  More than one candidate is an
//! error, since there is no telling which one is authoritative.
//!
//! [`PropertyStore`] always goes to the filesystem.  [`PropertiesCache`]
//! memoizes reads per packet until cleared.  It does not notice changes made
//! behind its back, and a save does not check whether the file changed since
//! it was read.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{PacketError, Result};
use crate::fs::{AsyncPacketFs, PacketFs};
use crate::packet::{list_members, list_members_async, NameMatch, Packet, PacketFilter};

pub type Properties = Map<String, Value>;

pub const PROPERTIES_DESCRIPTOR: &str = "_properties";
pub const PROPERTIES_EXTENSION:  &str = ".json";

// ── StoreOptions ─────────────────────────────────────────────────────────────

/// Sidecar naming used by [`PropertyStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Including the leading `_`.
    pub descriptor: String,
    /// Including the leading `.`.
    pub extension:  String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            descriptor: PROPERTIES_DESCRIPTOR.to_owned(),
            extension:  PROPERTIES_EXTENSION.to_owned(),
        }
    }
}

// ── PropertyStore ────────────────────────────────────────────────────────────

pub struct PropertyStore<F> {
    fs:      F,
    options: StoreOptions,
}

impl<F> PropertyStore<F> {
    pub fn new(fs: F) -> Self {
        Self::with_options(fs, StoreOptions::default())
    }

    pub fn with_options(fs: F, options: StoreOptions) -> Self {
        Self { fs, options }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Where [`save`](Self::save) writes the properties of `packet`.
    pub fn sidecar_path(&self, packet: &Packet) -> PathBuf {
        packet.file_path(&self.options.descriptor, &self.options.extension)
    }

    fn sidecar_filter(&self) -> PacketFilter {
        PacketFilter::any()
            .with_descriptor(NameMatch::exact(self.options.descriptor.clone()))
            .with_extension(NameMatch::exact(self.options.extension.clone()))
    }

    /// Pick the single sidecar out of the candidates, if any.
    fn resolve(&self, packet: &Packet, mut candidates: Vec<String>) -> Result<Option<PathBuf>> {
        match candidates.len() {
            0 => {
                debug!(packet = %packet, "no sidecar, empty properties");
                Ok(None)
            }
            1 => {
                let name = candidates.remove(0);
                Ok(Some(packet.member_path(&name)))
            }
            _ => {
                warn!(packet = %packet, ?candidates, "conflicting sidecar files");
                Err(PacketError::ConflictingMetadata {
                    packet: packet.path().to_owned(),
                    candidates,
                })
            }
        }
    }
}

fn parse(path: PathBuf, text: &str) -> Result<Properties> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(PacketError::MalformedData {
            path,
            reason: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
        Err(e) => Err(PacketError::MalformedData { path, reason: e.to_string() }),
    }
}

fn render(data: &Properties) -> Result<String> {
    // Two-space indentation, the serde_json pretty default.
    serde_json::to_string_pretty(data).map_err(|e| PacketError::MalformedData {
        path:   PathBuf::new(),
        reason: e.to_string(),
    })
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null      => "null",
        Value::Bool(_)   => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_)  => "an array",
        Value::Object(_) => "an object",
    }
}

impl<F: PacketFs> PropertyStore<F> {
    pub fn read(&self, packet: &Packet) -> Result<Properties> {
        let candidates = list_members(&self.fs, packet, &self.sidecar_filter())?;
        let Some(path) = self.resolve(packet, candidates)? else {
            return Ok(Properties::new());
        };
        let text = self.fs.read_to_string(&path).map_err(|e| PacketError::at(&path, e))?;
        parse(path, &text)
    }

    /// Replace the sidecar contents with `data`.  Nothing is merged.
    pub fn save(&self, packet: &Packet, data: &Properties) -> Result<()> {
        let path = self.sidecar_path(packet);
        let text = render(data)?;
        debug!(path = %path.display(), "writing properties");
        self.fs.write(&path, text.as_bytes()).map_err(|e| PacketError::at(&path, e))
    }
}

impl<F: AsyncPacketFs> PropertyStore<F> {
    pub async fn read_async(&self, packet: &Packet) -> Result<Properties> {
        let candidates = list_members_async(&self.fs, packet, &self.sidecar_filter()).await?;
        let Some(path) = self.resolve(packet, candidates)? else {
            return Ok(Properties::new());
        };
        let text = self.fs.read_to_string(&path).await.map_err(|e| PacketError::at(&path, e))?;
        parse(path, &text)
    }

    pub async fn save_async(&self, packet: &Packet, data: &Properties) -> Result<()> {
        let path = self.sidecar_path(packet);
        let text = render(data)?;
        debug!(path = %path.display(), "writing properties");
        self.fs.write(&path, text.as_bytes()).await.map_err(|e| PacketError::at(&path, e))
    }
}

// ── PropertiesCache ──────────────────────────────────────────────────────────

/// Memoizing front for a [`PropertyStore`].
///
/// Owned by whoever constructs it and passed explicitly; two caches over the
/// same directory are independent and can disagree.  Mutation goes through
/// `&mut self`, so sharing one across threads needs an outer lock.
pub struct PropertiesCache<F> {
    store:   PropertyStore<F>,
    entries: HashMap<Packet, Properties>,
}

impl<F> PropertiesCache<F> {
    pub fn new(store: PropertyStore<F>) -> Self {
        Self { store, entries: HashMap::new() }
    }

    pub fn store(&self) -> &PropertyStore<F> {
        &self.store
    }

    pub fn contains(&self, packet: &Packet) -> bool {
        self.entries.contains_key(packet)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget one packet.  Returns whether it was cached.
    pub fn invalidate(&mut self, packet: &Packet) -> bool {
        self.entries.remove(packet).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn into_store(self) -> PropertyStore<F> {
        self.store
    }
}

impl<F: PacketFs> PropertiesCache<F> {
    pub fn read(&mut self, packet: &Packet) -> Result<&Properties> {
        if !self.entries.contains_key(packet) {
            let data = self.store.read(packet)?;
            self.entries.insert(packet.clone(), data);
        } else {
            debug!(packet = %packet, "properties cache hit");
        }
        Ok(&self.entries[packet])
    }

    /// Write through, then remember exactly what was written.
    pub fn save(&mut self, packet: &Packet, data: Properties) -> Result<()> {
        self.store.save(packet, &data)?;
        self.entries.insert(packet.clone(), data);
        Ok(())
    }
}

impl<F: AsyncPacketFs> PropertiesCache<F> {
    pub async fn read_async(&mut self, packet: &Packet) -> Result<&Properties> {
        if !self.entries.contains_key(packet) {
            let data = self.store.read_async(packet).await?;
            self.entries.insert(packet.clone(), data);
        } else {
            debug!(packet = %packet, "properties cache hit");
        }
        Ok(&self.entries[packet])
    }

    pub async fn save_async(&mut self, packet: &Packet, data: Properties) -> Result<()> {
        self.store.save_async(packet, &data).await?;
        self.entries.insert(packet.clone(), data);
        Ok(())
    }
}
