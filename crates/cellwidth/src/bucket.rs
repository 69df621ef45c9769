//! Bucket partitioning and prefix deduplication.
//!
//! A level splits its input groups by a bit-slice of the domain value. Each
//! resulting bucket is reduced to its width sequence (the classes of its
//! entries in ascending value order). Buckets whose sequences are
//! prefix-compatible collapse into one retained bucket; the level then stores,
//! for every raw bucket, the position of the retained bucket that answers for
//! it.
//!
//! ## Deduplication
//!
//! Raw buckets are visited in creation order: groups in the order given, and
//! within a group in ascending key order. Each one merges into the *first*
//! retained bucket it is compatible with (first-fit). The result is a fixed
//! point: no two retained buckets are prefix-compatible, so a second pass
//! merges nothing. It is not a minimum cover.
//!
//! Retained buckets live in an arena (`Vec<Bucket>`). A merge builds a new
//! bucket from the old record and the incoming one and replaces the slot.

use cellwidth_core::{Entry, Error, LevelConfig, Result, WidthClass};
use tracing::trace;

/// A group of domain entries sharing a bit-slice key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bucket {
    /// Member entries, ascending by value. Values are unique.
    entries: Vec<Entry>,
    /// Positional width sequence used for prefix comparison.
    widths: Vec<WidthClass>,
}

impl Bucket {
    /// Create an empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bucket from entries, sorting them by value.
    pub fn from_entries(mut entries: Vec<Entry>) -> Self {
        entries.sort_unstable_by_key(|e| e.value);
        let widths = entries.iter().map(|e| e.class).collect();
        Self { entries, widths }
    }

    /// Append an entry. Callers push in ascending value order.
    #[inline]
    fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
        self.widths.push(entry.class);
    }

    /// Member entries in ascending value order.
    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Width sequence.
    #[inline]
    pub fn widths(&self) -> &[WidthClass] {
        &self.widths
    }

    /// Number of member entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bucket has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether one width sequence is a prefix of the other.
    pub fn is_prefix_compatible(&self, other: &Bucket) -> bool {
        let (less, more) = if self.widths.len() <= other.widths.len() {
            (&self.widths, &other.widths)
        } else {
            (&other.widths, &self.widths)
        };
        more.starts_with(less)
    }

    /// Merge two prefix-compatible buckets into a new record.
    ///
    /// The result keeps the longer width sequence and the union of both
    /// entry sets.
    pub fn merge(self, other: Bucket) -> Bucket {
        debug_assert!(self.is_prefix_compatible(&other));
        let widths = if self.widths.len() >= other.widths.len() {
            self.widths
        } else {
            other.widths
        };
        Bucket {
            entries: merge_sorted(self.entries, other.entries),
            widths,
        }
    }

    /// The single class of every entry, if the bucket is homogeneous.
    ///
    /// Empty buckets have no class.
    pub fn class(&self) -> Option<WidthClass> {
        let (&first, rest) = self.widths.split_first()?;
        rest.iter().all(|&w| w == first).then_some(first)
    }

    /// Consume the bucket, returning its entries.
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

/// Merge two ascending entry lists with disjoint values.
fn merge_sorted(left: Vec<Entry>, right: Vec<Entry>) -> Vec<Entry> {
    if right.is_empty() {
        return left;
    }
    if left.is_empty() {
        return right;
    }
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut a = left.into_iter().peekable();
    let mut b = right.into_iter().peekable();
    loop {
        let take_left = match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => x.value < y.value,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { a.next() } else { b.next() };
        merged.extend(next);
    }
    merged
}

/// Split every group into `2^num_bits` buckets keyed by the level's bits.
///
/// Output order: all buckets of the first group by ascending key, then the
/// second group, and so on.
pub fn partition<I, G>(groups: I, level: &LevelConfig) -> Vec<Bucket>
where
    I: IntoIterator<Item = G>,
    G: AsRef<[Entry]>,
{
    let per_group = level.bucket_count();
    let mut buckets = Vec::new();
    for group in groups {
        let base = buckets.len();
        buckets.resize_with(base + per_group, Bucket::new);
        for &entry in group.as_ref() {
            buckets[base + level.key(entry.value)].push(entry);
        }
    }
    buckets
}

/// Output of a deduplication pass.
#[derive(Debug, Clone, Default)]
pub struct Dedup {
    /// One retained-bucket position per raw bucket.
    pub indices: Vec<usize>,
    /// Retained buckets in creation order.
    pub buckets: Vec<Bucket>,
}

impl Dedup {
    /// Raw buckets folded into an earlier retained bucket.
    pub fn merges(&self) -> usize {
        self.indices.len() - self.buckets.len()
    }

    /// Largest index produced.
    pub fn max_index(&self) -> Option<usize> {
        self.indices.iter().copied().max()
    }
}

/// First-fit merge of raw buckets, in the order given.
pub fn dedup(raw: Vec<Bucket>) -> Dedup {
    let mut retained: Vec<Bucket> = Vec::new();
    let mut indices = Vec::with_capacity(raw.len());

    for bucket in raw {
        match retained
            .iter()
            .position(|existing| existing.is_prefix_compatible(&bucket))
        {
            Some(i) => {
                let existing = std::mem::take(&mut retained[i]);
                retained[i] = existing.merge(bucket);
                indices.push(i);
            }
            None => {
                indices.push(retained.len());
                retained.push(bucket);
            }
        }
    }

    Dedup {
        indices,
        buckets: retained,
    }
}

/// Partitions and deduplicates one cascade level.
#[derive(Debug, Clone, Copy)]
pub struct BucketIndexer {
    level: usize,
    config: LevelConfig,
}

impl BucketIndexer {
    /// Create an indexer for level `level` of a cascade.
    pub fn new(level: usize, config: LevelConfig) -> Self {
        Self { level, config }
    }

    /// The level configuration.
    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Partition `groups`, deduplicate, and check every index fits the
    /// configured offset width.
    pub fn index_and_dedup<I, G>(&self, groups: I) -> Result<Dedup>
    where
        I: IntoIterator<Item = G>,
        G: AsRef<[Entry]>,
    {
        let raw = partition(groups, &self.config);
        let raw_count = raw.len();
        let result = dedup(raw);

        trace!(
            "Level {}: {} raw buckets -> {} retained",
            self.level,
            raw_count,
            result.buckets.len()
        );

        self.check_offsets(&result.indices)?;
        Ok(result)
    }

    /// Fail if any index exceeds the offset width.
    pub fn check_offsets(&self, indices: &[usize]) -> Result<()> {
        let width = self.config.offset_width;
        match indices.iter().find(|&&i| i > width.max_index()) {
            Some(&index) => Err(Error::offset_overflow(self.level, index, width.bits())),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
