//! Packet naming: splitting a basename into primary name, descriptor and
//! extension.
//!
//! # Grammar
//! ```text
//! <primary>[_<descriptor-body>][.<extension>]
//! ```
//!
//! The extension is the last dot suffix of the basename, except that a
//! leading dot is never an extension marker (`.file` has no extension) and
//! `..` has none either.  Of what remains, the descriptor is the run from the
//! *last* underscore to the end; earlier underscores stay in the primary name.
//!
//! | basename                 | primary     | descriptor  | extension |
//! |--------------------------|-------------|-------------|-----------|
//! | `file_desc.ext`          | `file`      | `_desc`     | `.ext`    |
//! | `file_desc_desc.ext.ext` | `file_desc` | `_desc.ext` | `.ext`    |
//! | `.file`                  | `.file`     |             |           |
//! | `_file.ext`              |             | `_file`     | `.ext`    |
//!
//! An empty primary name marks a *blank packet*: the file's metadata belongs
//! to the containing directory.
//!
//! Nothing here touches the filesystem.  Separators follow the host
//! (`\` separates on Windows and is an ordinary character elsewhere) and
//! trailing separators are ignored.

use std::fmt;
use std::path::{is_separator, MAIN_SEPARATOR};

use serde::Serialize;

// ── NameParts ────────────────────────────────────────────────────────────────

/// The three components of a basename.  Concatenated in order they reproduce
/// the basename exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NameParts<'a> {
    pub primary:    &'a str,
    /// Empty or starting with `_`.
    pub descriptor: &'a str,
    /// Empty or starting with `.`.
    pub extension:  &'a str,
}

impl NameParts<'_> {
    pub fn is_blank(&self) -> bool {
        self.primary.is_empty()
    }

    pub fn recompose(&self) -> String {
        let mut out = String::with_capacity(
            self.primary.len() + self.descriptor.len() + self.extension.len(),
        );
        out.push_str(self.primary);
        out.push_str(self.descriptor);
        out.push_str(self.extension);
        out
    }
}

impl fmt::Display for NameParts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.primary, self.descriptor, self.extension)
    }
}

// ── Decomposition ────────────────────────────────────────────────────────────

/// Split a path (or bare basename) into its name components.
pub fn decompose(path: &str) -> NameParts<'_> {
    let base = basename(path);
    let (stem, extension) = split_extension(base);
    let (primary, descriptor) = split_descriptor(stem);
    NameParts { primary, descriptor, extension }
}

pub fn primary_name(path: &str) -> &str {
    decompose(path).primary
}

pub fn descriptor(path: &str) -> &str {
    decompose(path).descriptor
}

pub fn extension(path: &str) -> &str {
    decompose(path).extension
}

/// Last path component with trailing separators removed.  Empty for an empty
/// path or one made only of separators.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(is_separator);
    match trimmed.rfind(is_separator) {
        Some(i) => &trimmed[i + 1..],
        None    => trimmed,
    }
}

/// Everything before the last component.  `.` when there is no directory
/// part, the root when the component sits directly under it.
pub fn dirname(path: &str) -> &str {
    let trimmed = path.trim_end_matches(is_separator);
    if trimmed.is_empty() {
        // "" has no directory; "///" is its own root.
        return if path.is_empty() { "." } else { &path[..1] };
    }
    match trimmed.rfind(is_separator) {
        None => ".",
        Some(i) => {
            let dir = trimmed[..i].trim_end_matches(is_separator);
            if dir.is_empty() { &trimmed[..1] } else { dir }
        }
    }
}

/// Split a basename at its extension.  A dot in first position, or the
/// basename `..`, does not start an extension.
pub fn split_extension(base: &str) -> (&str, &str) {
    match base.rfind('.') {
        None | Some(0)        => (base, ""),
        Some(_) if base == ".." => (base, ""),
        Some(i)               => (&base[..i], &base[i..]),
    }
}

fn split_descriptor(stem: &str) -> (&str, &str) {
    match stem.rfind('_') {
        Some(i) => (&stem[..i], &stem[i..]),
        None    => (stem, ""),
    }
}

// ── Packet paths ─────────────────────────────────────────────────────────────

/// Directory of `path` joined with its primary name.  For a blank-packet file
/// this is the directory itself.
pub fn packet_path(path: &str) -> String {
    join(dirname(path), primary_name(path))
}

/// Rebuild a path from a directory and name components.
pub fn recompose(dir: &str, parts: &NameParts<'_>) -> String {
    join(dir, &parts.recompose())
}

fn join(dir: &str, name: &str) -> String {
    if name.is_empty() {
        return dir.to_owned();
    }
    if dir == "." || dir.is_empty() {
        return name.to_owned();
    }
    let mut out = String::with_capacity(dir.len() + 1 + name.len());
    out.push_str(dir);
    if !dir.ends_with(is_separator) {
        out.push(MAIN_SEPARATOR);
    }
    out.push_str(name);
    out
}

/// Distinct primary names in `paths`, first occurrence first.  Blank packets
/// are skipped since their files describe the directory, not a member of it.
/// Paths from different directories sharing a primary name count once.
pub fn unique_primary_names<I, S>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for p in paths {
        let primary = primary_name(p.as_ref());
        if !primary.is_empty() && !out.iter().any(|seen| seen == primary) {
            out.push(primary.to_owned());
        }
    }
    out
}

/// Like [`unique_primary_names`] but yields full packet paths, deduplicated
/// by the resulting path string.
pub fn unique_packet_paths<I, S>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for p in paths {
        let p = p.as_ref();
        if primary_name(p).is_empty() {
            continue;
        }
        let packet = packet_path(p);
        if !out.contains(&packet) {
            out.push(packet);
        }
    }
    out
}
