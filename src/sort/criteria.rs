//! Ready-made criteria for ordering packet paths.
//!
//! [`PropertyCriterion`] orders packets by a field of their own properties,
//! converted according to a [`PropertyKind`] hint:
//!
//! | kind      | number      | string                    | boolean  | other       |
//! |-----------|-------------|---------------------------|----------|-------------|
//! | `numeric` | as is       | leading float, else -inf  | 1 / 0    | -inf        |
//! | `date`    | as is (ms)  | parsed date-time, else -inf | 1 / 0  | -inf        |
//! | `lexical` | its text    | as is                     | `"true"` / `"false"` | `""` |
//! | `locale`  | like `lexical`, compared case-insensitively first | | | |
//! | `natural` | raw JSON value, ordered by type, then by value | | | |
//!
//! Unconvertible values therefore sort first when ascending.
//!
//! [`IndexCriterion`] orders packets by their position in a list of primary
//! names kept in the *directory's* properties.  Packets missing from the list
//! always sort after every listed one, in either direction.
//!
//! Both read through a [`PropertiesCache`]; reuse one cache across several
//! sorts of the same directory to avoid re-reading sidecars.

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::error::{PacketError, Result};
use crate::fs::{AsyncPacketFs, PacketFs};
use crate::packet::Packet;
use crate::properties::{Properties, PropertiesCache};
use super::{natural_order, AsyncSortCriterion, SortCriterion};

// ── PropertyKind ─────────────────────────────────────────────────────────────

/// How a property value is turned into a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyKind {
    #[default]
    Natural,
    Numeric,
    Lexical,
    Locale,
    Date,
}

impl PropertyKind {
    pub fn name(self) -> &'static str {
        match self {
            PropertyKind::Natural => "natural",
            PropertyKind::Numeric => "numeric",
            PropertyKind::Lexical => "lexical",
            PropertyKind::Locale  => "locale",
            PropertyKind::Date    => "date",
        }
    }

    /// Convert a raw field value (`None` when the field is absent).
    pub fn convert(self, value: Option<&Value>) -> PropertyKey {
        match self {
            PropertyKind::Natural => PropertyKey::Raw(value.cloned()),
            PropertyKind::Numeric => PropertyKey::Number(match value {
                Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NEG_INFINITY),
                Some(Value::String(s)) => parse_float_prefix(s).unwrap_or(f64::NEG_INFINITY),
                Some(Value::Bool(b))   => bool_number(*b),
                _                      => f64::NEG_INFINITY,
            }),
            PropertyKind::Date => PropertyKey::Number(match value {
                Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NEG_INFINITY),
                Some(Value::String(s)) => parse_date_millis(s).unwrap_or(f64::NEG_INFINITY),
                Some(Value::Bool(b))   => bool_number(*b),
                _                      => f64::NEG_INFINITY,
            }),
            PropertyKind::Lexical | PropertyKind::Locale => PropertyKey::Text(match value {
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::String(s)) => s.clone(),
                Some(Value::Bool(b))   => b.to_string(),
                _                      => String::new(),
            }),
        }
    }

    /// Ascending comparison of two keys produced by [`convert`](Self::convert).
    pub fn compare(self, a: &PropertyKey, b: &PropertyKey) -> Ordering {
        match (self, a, b) {
            (PropertyKind::Locale, PropertyKey::Text(a), PropertyKey::Text(b)) => locale_compare(a, b),
            (_, PropertyKey::Number(a), PropertyKey::Number(b)) => natural_order(a, b),
            (_, PropertyKey::Text(a), PropertyKey::Text(b))     => a.cmp(b),
            (_, PropertyKey::Raw(a), PropertyKey::Raw(b))       => raw_order(a.as_ref(), b.as_ref()),
            // Keys of different shapes never come out of one kind.
            _ => a.rank().cmp(&b.rank()),
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PropertyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "natural" => Ok(PropertyKind::Natural),
            "numeric" => Ok(PropertyKind::Numeric),
            "lexical" => Ok(PropertyKind::Lexical),
            "locale"  => Ok(PropertyKind::Locale),
            "date"    => Ok(PropertyKind::Date),
            other     => Err(format!("unknown property kind '{other}'")),
        }
    }
}

// ── PropertyKey ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Number(f64),
    Text(String),
    /// Unconverted value; `None` when the field is absent.
    Raw(Option<Value>),
}

impl PropertyKey {
    fn rank(&self) -> u8 {
        match self {
            PropertyKey::Raw(_)    => 0,
            PropertyKey::Number(_) => 1,
            PropertyKey::Text(_)   => 2,
        }
    }
}

fn bool_number(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Total order over raw JSON values: absent < null < booleans < numbers <
/// strings < arrays and objects (which all tie).
fn raw_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None                    => 0,
            Some(Value::Null)       => 1,
            Some(Value::Bool(_))    => 2,
            Some(Value::Number(_))  => 3,
            Some(Value::String(_))  => 4,
            Some(Value::Array(_)) | Some(Value::Object(_)) => 5,
        }
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y)))     => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            natural_order(&x.as_f64().unwrap_or(0.0), &y.as_f64().unwrap_or(0.0))
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Case-insensitive comparison, ties broken lowercase-first, then by code
/// point.
///
/// An approximation of locale collation, not a collator: it knows nothing of
/// accents, ligatures or language-specific ordering, so non-ASCII text can
/// order differently from a real locale-aware comparison.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();
    folded(a)
        .cmp(&folded(b))
        .then_with(|| {
            a.chars()
                .map(char::is_uppercase)
                .cmp(b.chars().map(char::is_uppercase))
        })
        .then_with(|| a.cmp(b))
}

/// Longest leading decimal number in `s`, the way a lenient float parser
/// reads `"12.5kg"` as 12.5.  Leading whitespace is skipped.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        let inf = f64::INFINITY;
        return Some(if bytes[0] == b'-' { -inf } else { inf });
    }
    let digits = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };
    let int_end = digits(end);
    let mut seen_digits = int_end > end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits(end + 1);
        if frac_end > end + 1 || seen_digits {
            seen_digits = true;
            end = frac_end;
        }
    }
    if !seen_digits {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    s[..end].parse().ok()
}

/// Milliseconds since the Unix epoch.  Accepts RFC 3339, RFC 2822, and
/// ISO-like dates and date-times without an offset, which are taken as UTC.
fn parse_date_millis(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis() as f64);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp_millis() as f64);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis() as f64);
        }
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis() as f64)
}

/// Sort items are packet paths already; they are not stripped again.
fn packet_of<T: AsRef<Path> + ?Sized>(item: &T) -> Packet {
    let path: &Path = item.as_ref();
    Packet::named(path)
}

fn directed(ordering: Ordering, ascending: bool) -> Ordering {
    if ascending { ordering } else { ordering.reverse() }
}

// ── PropertyCriterion ────────────────────────────────────────────────────────

/// Configuration for [`PropertyCriterion`].
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyOrder {
    pub field:     String,
    pub kind:      PropertyKind,
    pub ascending: bool,
}

impl PropertyOrder {
    pub fn new<S: Into<String>>(field: S) -> Self {
        Self { field: field.into(), kind: PropertyKind::default(), ascending: true }
    }

    pub fn kind(mut self, kind: PropertyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn descending(mut self) -> Self {
        self.ascending = false;
        self
    }

    pub fn key_of(&self, props: &Properties) -> PropertyKey {
        self.kind.convert(props.get(&self.field))
    }

    pub fn compare(&self, a: &PropertyKey, b: &PropertyKey) -> Ordering {
        directed(self.kind.compare(a, b), self.ascending)
    }
}

/// Orders packet paths by one of their own properties.
pub struct PropertyCriterion<'c, F> {
    cache: &'c mut PropertiesCache<F>,
    order: PropertyOrder,
}

impl<'c, F> PropertyCriterion<'c, F> {
    pub fn new(cache: &'c mut PropertiesCache<F>, order: PropertyOrder) -> Self {
        Self { cache, order }
    }
}

impl<'c, F, T> SortCriterion<T> for PropertyCriterion<'c, F>
where
    F: PacketFs,
    T: AsRef<Path> + ?Sized,
{
    type Key = PropertyKey;
    type Error = PacketError;

    fn key(&mut self, item: &T) -> Result<PropertyKey> {
        let props = self.cache.read(&packet_of(item))?;
        Ok(self.order.key_of(props))
    }

    fn compare(&self, a: &PropertyKey, b: &PropertyKey) -> Ordering {
        self.order.compare(a, b)
    }
}

#[async_trait]
impl<'c, F, T> AsyncSortCriterion<T> for PropertyCriterion<'c, F>
where
    F: AsyncPacketFs,
    T: AsRef<Path> + Sync + ?Sized,
{
    type Key = PropertyKey;
    type Error = PacketError;

    async fn key(&mut self, item: &T) -> Result<PropertyKey> {
        let packet = packet_of(item);
        let props = self.cache.read_async(&packet).await?;
        Ok(self.order.key_of(props))
    }

    fn compare(&self, a: &PropertyKey, b: &PropertyKey) -> Ordering {
        self.order.compare(a, b)
    }
}

// ── IndexCriterion ───────────────────────────────────────────────────────────

/// Configuration for [`IndexCriterion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOrder {
    /// Field of the directory's properties holding an array of primary names.
    pub field:     String,
    pub ascending: bool,
}

impl IndexOrder {
    pub fn new<S: Into<String>>(field: S) -> Self {
        Self { field: field.into(), ascending: true }
    }

    pub fn descending(mut self) -> Self {
        self.ascending = false;
        self
    }

    /// Position of `primary` in the directory's list, if listed.
    pub fn position(&self, dir_props: &Properties, primary: &str) -> Option<usize> {
        dir_props
            .get(&self.field)?
            .as_array()?
            .iter()
            .position(|v| v.as_str() == Some(primary))
    }

    /// Unlisted packets trail in both directions.
    pub fn compare(&self, a: &Option<usize>, b: &Option<usize>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => directed(a.cmp(b), self.ascending),
            (Some(_), None)    => Ordering::Less,
            (None, Some(_))    => Ordering::Greater,
            (None, None)       => Ordering::Equal,
        }
    }
}

/// Orders packet paths by their position in an index list stored in the
/// properties of their directory's blank packet.
pub struct IndexCriterion<'c, F> {
    cache: &'c mut PropertiesCache<F>,
    order: IndexOrder,
}

impl<'c, F> IndexCriterion<'c, F> {
    pub fn new(cache: &'c mut PropertiesCache<F>, order: IndexOrder) -> Self {
        Self { cache, order }
    }
}

fn index_target<T: AsRef<Path> + ?Sized>(item: &T) -> (Packet, String) {
    let packet = packet_of(item);
    (Packet::blank(packet.directory()), packet.primary_name())
}

impl<'c, F, T> SortCriterion<T> for IndexCriterion<'c, F>
where
    F: PacketFs,
    T: AsRef<Path> + ?Sized,
{
    type Key = Option<usize>;
    type Error = PacketError;

    fn key(&mut self, item: &T) -> Result<Option<usize>> {
        let (dir, primary) = index_target(item);
        let props = self.cache.read(&dir)?;
        Ok(self.order.position(props, &primary))
    }

    fn compare(&self, a: &Option<usize>, b: &Option<usize>) -> Ordering {
        self.order.compare(a, b)
    }
}

#[async_trait]
impl<'c, F, T> AsyncSortCriterion<T> for IndexCriterion<'c, F>
where
    F: AsyncPacketFs,
    T: AsRef<Path> + Sync + ?Sized,
{
    type Key = Option<usize>;
    type Error = PacketError;

    async fn key(&mut self, item: &T) -> Result<Option<usize>> {
        let (dir, primary) = index_target(item);
        let props = self.cache.read_async(&dir).await?;
        Ok(self.order.position(props, &primary))
    }

    fn compare(&self, a: &Option<usize>, b: &Option<usize>) -> Ordering {
        self.order.compare(a, b)
    }
}
