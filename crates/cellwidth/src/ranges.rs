//! Range-based width tables.
//!
//! The domain is partitioned into maximal runs of equal class. Each run is a
//! single `u32` key holding the run's first value and its class:
//!
//! ```text
//! key = (start << 4) | class          class in bits 0..2
//! needle(v) = (v << 4) | 0b1000       greater than every key starting at v
//! ```
//!
//! so the run containing `v` is the last key below `needle(v)`.
//!
//! [`RangeTable`] answers by binary search over the ascending keys.
//! [`SearchTree`] lays the same keys out as a static 17-ary search tree of
//! cache-line sized nodes: data nodes hold the keys in descending order, and
//! each search layer holds the minimum key of every child subtree.

use cellwidth_core::{ClassifiedArray, Error, Result, TableEncoder, WidthClass, WidthTable};

/// Shift applied to a run start inside a key.
pub const KEY_SHIFT: u32 = 4;

/// Largest domain whose run starts fit in a key.
pub const MAX_RANGE_DOMAIN: u32 = 1 << (u32::BITS - KEY_SHIFT);

/// Keys per search tree node. Each search node has `KEYS_PER_NODE + 1` children.
pub const KEYS_PER_NODE: usize = 16;

/// Alignment of each search tree node, in bytes.
pub const NODE_ALIGNMENT: usize = 64;

const KEY_SIZE: usize = 4;

const CLASS_MASK: u32 = 0b11;

const NEEDLE_BITS: u32 = 0b1000;

const CHILDREN_PER_NODE: usize = KEYS_PER_NODE + 1;

#[inline]
fn needle(value: u32) -> u32 {
    (value << KEY_SHIFT) | NEEDLE_BITS
}

/// The first value of a run and the run's class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RangeKey(u32);

impl RangeKey {
    /// Padding key; sorts below every real key except a run at 0 of class zero.
    pub const PAD: RangeKey = RangeKey::new(0, WidthClass::Zero);

    /// Create a key for a run starting at `start`.
    pub const fn new(start: u32, class: WidthClass) -> Self {
        Self((start << KEY_SHIFT) | class as u32)
    }

    /// First value of the run.
    #[inline]
    pub fn start(self) -> u32 {
        self.0 >> KEY_SHIFT
    }

    /// Class of the run.
    #[inline]
    pub fn class(self) -> WidthClass {
        WidthClass::from_bits((self.0 & CLASS_MASK) as u8)
    }

    /// Whether the run starts at or before the needle's value.
    #[inline]
    fn precedes(self, needle: u32) -> bool {
        self.0 < needle
    }
}

impl From<RangeKey> for u32 {
    fn from(key: RangeKey) -> u32 {
        key.0
    }
}

/// Sorted run keys answered by binary search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeTable {
    domain_size: u32,
    keys: Vec<RangeKey>,
}

impl RangeTable {
    /// Partition the domain into maximal runs of uniform class.
    pub fn from_classes(classes: &ClassifiedArray) -> Result<Self> {
        if classes.domain_size() > MAX_RANGE_DOMAIN {
            return Err(Error::DomainMismatch {
                expected: MAX_RANGE_DOMAIN as usize,
                actual: classes.len(),
            });
        }
        let mut keys = Vec::new();
        let mut last = None;
        for entry in classes.entries() {
            if last != Some(entry.class) {
                last = Some(entry.class);
                keys.push(RangeKey::new(entry.value, entry.class));
            }
        }
        Ok(Self {
            domain_size: classes.domain_size(),
            keys,
        })
    }

    /// Run keys in ascending order.
    pub fn keys(&self) -> &[RangeKey] {
        &self.keys
    }

    /// Number of runs.
    pub fn runs(&self) -> usize {
        self.keys.len()
    }
}

impl WidthTable for RangeTable {
    fn domain_size(&self) -> u32 {
        self.domain_size
    }

    fn class_of(&self, value: u32) -> Option<WidthClass> {
        if value >= self.domain_size {
            return None;
        }
        let needle = needle(value);
        let i = self.keys.partition_point(|key| key.precedes(needle));
        // keys[0] starts at 0, so i >= 1 for every value.
        self.keys.get(i.checked_sub(1)?).map(|key| key.class())
    }

    fn encoded_size(&self) -> usize {
        self.keys.len() * KEY_SIZE
    }
}

/// Builds [`RangeTable`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeEncoder;

impl TableEncoder for RangeEncoder {
    type Table = RangeTable;

    fn encode(&self, classes: &ClassifiedArray) -> Result<RangeTable> {
        RangeTable::from_classes(classes)
    }
}

/// A group of [`KEYS_PER_NODE`] keys in descending order.
///
/// Each node is 64 bytes, the typical size of a cache line, and aligned to
/// fit exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(align(64))]
pub struct Node {
    keys: [RangeKey; KEYS_PER_NODE],
}

impl Node {
    /// Build a node from up to [`KEYS_PER_NODE`] keys, padding with [`RangeKey::PAD`].
    fn from_chunk(chunk: &[RangeKey]) -> Self {
        let mut keys = [RangeKey::PAD; KEYS_PER_NODE];
        keys[..chunk.len()].copy_from_slice(chunk);
        Self { keys }
    }

    /// Keys in descending order.
    pub fn keys(&self) -> &[RangeKey; KEYS_PER_NODE] {
        &self.keys
    }

    /// Smallest key in the node.
    #[inline]
    fn min_key(&self) -> RangeKey {
        self.keys[KEYS_PER_NODE - 1]
    }

    /// Child holding the needle's run.
    #[inline]
    fn search(&self, needle: u32) -> usize {
        self.keys
            .iter()
            .position(|key| key.precedes(needle))
            .unwrap_or(KEYS_PER_NODE)
    }

    /// Class of the needle's run inside a data node.
    #[inline]
    fn class(&self, needle: u32) -> WidthClass {
        self.keys[..KEYS_PER_NODE - 1]
            .iter()
            .find(|key| key.precedes(needle))
            .unwrap_or(&self.keys[KEYS_PER_NODE - 1])
            .class()
    }
}

/// Static k-ary search tree over run keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTree {
    domain_size: u32,
    /// Start of each search layer inside `search_nodes`, top layer first.
    search_offsets: Vec<usize>,
    search_nodes: Vec<Node>,
    data_nodes: Vec<Node>,
}

impl SearchTree {
    /// Lay out the run keys of `ranges` as a search tree.
    pub fn from_ranges(ranges: &RangeTable) -> Self {
        let descending: Vec<RangeKey> = ranges.keys().iter().rev().copied().collect();
        let data_nodes: Vec<Node> = descending
            .chunks(KEYS_PER_NODE)
            .map(Node::from_chunk)
            .collect();

        let mut layers = Vec::new();
        loop {
            let layer = search_layer(&data_nodes, layers.len() as u32);
            let done = layer.len() <= 1;
            layers.push(layer);
            if done {
                break;
            }
        }
        // Heights were built bottom-up; the walk starts at the root.
        layers.reverse();

        let mut search_offsets = Vec::with_capacity(layers.len());
        let mut search_nodes = Vec::new();
        for layer in layers {
            search_offsets.push(search_nodes.len());
            search_nodes.extend(layer);
        }

        Self {
            domain_size: ranges.domain_size,
            search_offsets,
            search_nodes,
            data_nodes,
        }
    }

    /// Number of search layers.
    pub fn height(&self) -> usize {
        self.search_offsets.len()
    }

    /// Start of each search layer, root first.
    pub fn search_offsets(&self) -> &[usize] {
        &self.search_offsets
    }

    /// Search nodes, flattened root layer first.
    pub fn search_nodes(&self) -> &[Node] {
        &self.search_nodes
    }

    /// Data nodes in descending key order.
    pub fn data_nodes(&self) -> &[Node] {
        &self.data_nodes
    }

    /// Size of one node rounded up to the node alignment.
    pub const fn node_size() -> usize {
        (KEYS_PER_NODE * KEY_SIZE).div_ceil(NODE_ALIGNMENT) * NODE_ALIGNMENT
    }
}

/// One search layer at `height`: the minimum key of every group of
/// `17^height` data nodes, dropping every 17th key, chunked into nodes.
fn search_layer(data_nodes: &[Node], height: u32) -> Vec<Node> {
    let step = CHILDREN_PER_NODE.pow(height);
    let keys: Vec<RangeKey> = data_nodes
        .chunks(step)
        .map(|chunk| {
            if chunk.len() < step {
                // A short chunk ends in padding nodes.
                RangeKey::PAD
            } else {
                chunk[step - 1].min_key()
            }
        })
        .enumerate()
        .filter(|(i, _)| i % CHILDREN_PER_NODE != KEYS_PER_NODE)
        .map(|(_, key)| key)
        .collect();
    keys.chunks(KEYS_PER_NODE).map(Node::from_chunk).collect()
}

impl WidthTable for SearchTree {
    fn domain_size(&self) -> u32 {
        self.domain_size
    }

    fn class_of(&self, value: u32) -> Option<WidthClass> {
        if value >= self.domain_size {
            return None;
        }
        let needle = needle(value);
        let mut index = 0;
        for &offset in &self.search_offsets {
            let node = &self.search_nodes[offset + index];
            index = index * CHILDREN_PER_NODE + node.search(needle);
        }
        Some(self.data_nodes[index].class(needle))
    }

    fn encoded_size(&self) -> usize {
        (self.search_nodes.len() + self.data_nodes.len()) * Self::node_size()
    }
}

/// Builds [`SearchTree`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchTreeEncoder;

impl TableEncoder for SearchTreeEncoder {
    type Table = SearchTree;

    fn encode(&self, classes: &ClassifiedArray) -> Result<SearchTree> {
        Ok(SearchTree::from_ranges(&RangeTable::from_classes(classes)?))
    }
}

// =============================================================================
// Tests
// =============================================================================
