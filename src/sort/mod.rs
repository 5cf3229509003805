//! Two-phase ordering: extract a key per element, then sort on keys alone.
//!
//! Key extraction may be expensive (reading sidecar files) or may suspend,
//! so it runs exactly once per element, in input order, before any
//! comparison happens.  The comparator only ever sees keys.  Sorting is
//! stable: elements with equal keys keep their input order.
//!
//! Any extraction error aborts the whole sort; no partial ordering is
//! returned.  Comparators cannot fail, but they must describe a total order.
//!
//! ```
//! use packetfs::sort::sort_by_key;
//!
//! let list = vec!["8", "23", "4", "42"];
//! let sorted = sort_by_key(list, |v| v.parse::<i64>())?;
//! assert_eq!(sorted, ["4", "8", "23", "42"]);
//! # Ok::<(), std::num::ParseIntError>(())
//! ```

pub mod criteria;

use std::cmp::Ordering;
use std::future::Future;

use async_trait::async_trait;

pub use criteria::{
    locale_compare, IndexCriterion, IndexOrder, PropertyCriterion, PropertyKey, PropertyKind,
    PropertyOrder,
};

// ── Criteria ─────────────────────────────────────────────────────────────────

/// A key extractor paired with the comparator for its keys.
pub trait SortCriterion<T: ?Sized> {
    type Key;
    type Error;

    fn key(&mut self, item: &T) -> Result<Self::Key, Self::Error>;
    fn compare(&self, a: &Self::Key, b: &Self::Key) -> Ordering;
}

/// [`SortCriterion`] whose extraction may suspend.
#[async_trait]
pub trait AsyncSortCriterion<T: ?Sized + Sync>: Send {
    type Key:   Send;
    type Error: Send;

    async fn key(&mut self, item: &T) -> Result<Self::Key, Self::Error>;
    fn compare(&self, a: &Self::Key, b: &Self::Key) -> Ordering;
}

/// `<` / `>` ordering; anything neither less nor greater compares equal.
pub fn natural_order<K: PartialOrd + ?Sized>(a: &K, b: &K) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

// ── Core ─────────────────────────────────────────────────────────────────────

fn order_keyed<T, K, C>(mut keyed: Vec<(T, K)>, mut compare: C) -> Vec<T>
where
    C: FnMut(&K, &K) -> Ordering,
{
    // slice::sort_by is a stable merge sort.
    keyed.sort_by(|a, b| compare(&a.1, &b.1));
    keyed.into_iter().map(|(item, _)| item).collect()
}

pub fn sort<T, C>(items: Vec<T>, criterion: &mut C) -> Result<Vec<T>, C::Error>
where
    C: SortCriterion<T> + ?Sized,
{
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let key = criterion.key(&item)?;
        keyed.push((item, key));
    }
    Ok(order_keyed(keyed, |a, b| criterion.compare(a, b)))
}

pub async fn sort_async<T, C>(items: Vec<T>, criterion: &mut C) -> Result<Vec<T>, C::Error>
where
    T: Sync,
    C: AsyncSortCriterion<T> + ?Sized,
{
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let key = criterion.key(&item).await?;
        keyed.push((item, key));
    }
    Ok(order_keyed(keyed, |a, b| criterion.compare(a, b)))
}

// ── Closure forms ────────────────────────────────────────────────────────────

/// Sort by an extracted key in its natural order.
pub fn sort_by_key<T, K, E, X>(items: Vec<T>, extract: X) -> Result<Vec<T>, E>
where
    K: PartialOrd,
    X: FnMut(&T) -> Result<K, E>,
{
    sort_by_key_with(items, extract, natural_order::<K>)
}

pub fn sort_by_key_with<T, K, E, X, C>(items: Vec<T>, mut extract: X, compare: C) -> Result<Vec<T>, E>
where
    X: FnMut(&T) -> Result<K, E>,
    C: FnMut(&K, &K) -> Ordering,
{
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let key = extract(&item)?;
        keyed.push((item, key));
    }
    Ok(order_keyed(keyed, compare))
}

pub async fn sort_by_key_async<T, K, E, X, Fut>(items: Vec<T>, extract: X) -> Result<Vec<T>, E>
where
    K: PartialOrd,
    X: FnMut(&T) -> Fut,
    Fut: Future<Output = Result<K, E>>,
{
    sort_by_key_with_async(items, extract, natural_order::<K>).await
}

/// Extraction futures are awaited one at a time, in input order.
pub async fn sort_by_key_with_async<T, K, E, X, Fut, C>(
    items:       Vec<T>,
    mut extract: X,
    compare:     C,
) -> Result<Vec<T>, E>
where
    X: FnMut(&T) -> Fut,
    Fut: Future<Output = Result<K, E>>,
    C: FnMut(&K, &K) -> Ordering,
{
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let key = extract(&item).await?;
        keyed.push((item, key));
    }
    Ok(order_keyed(keyed, compare))
}
