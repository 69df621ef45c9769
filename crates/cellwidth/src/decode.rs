//! Packed cascade layout and the runtime decoder.
//!
//! A [`PackedCascade`] is everything an independent decoder needs: one byte
//! array per level plus the configuration that fixes bit-slice boundaries and
//! offset widths. The walk for value `c` is:
//!
//! ```text
//! offset = 0
//! for each level:
//!     index  = offset * 2^num_bits + ((c >> low_bit) & (2^num_bits - 1))
//!     k      = 8 / offset_width
//!     offset = (bytes[index / k] >> (offset_width * (index % k))) & (2^offset_width - 1)
//! class = offset
//! ```
//!
//! For the default Unicode layout this reduces to the familiar three lookups:
//!
//! ```text
//! t1 = TABLES_0[cp >> 13 & 0xFF]
//! t2 = TABLES_1[128 * t1 + (cp >> 6 & 0x7F)]
//! w  = TABLES_2[16 * t2 + (cp >> 2 & 0xF)] >> (2 * (cp & 0b11)) & 0b11
//! ```

use cellwidth_core::{CascadeConfig, Error, LevelConfig, Result, WidthClass, WidthTable};
use serde::{Deserialize, Serialize};

use crate::pack::unpack;

/// One packed level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedLevel {
    config: LevelConfig,
    /// Number of packed offsets (raw buckets).
    entry_count: usize,
    bytes: Vec<u8>,
}

impl PackedLevel {
    /// Wrap packed bytes holding `entry_count` offsets.
    pub fn new(config: LevelConfig, entry_count: usize, bytes: Vec<u8>) -> Self {
        Self {
            config,
            entry_count,
            bytes,
        }
    }

    /// Level configuration.
    #[inline]
    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Number of packed offsets.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Number of input groups (`entry_count / stride`).
    #[inline]
    pub fn groups(&self) -> usize {
        self.entry_count / self.config.bucket_count()
    }

    /// Packed bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Offset stored at `index`.
    #[inline]
    pub fn offset(&self, index: usize) -> u8 {
        unpack(&self.bytes, index, self.config.offset_width)
    }
}

/// Metadata describing one packed level, without its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelLayout {
    /// Lowest key bit.
    pub low_bit: u8,
    /// Number of key bits.
    pub num_bits: u8,
    /// Offset width in bits.
    pub offset_width: u8,
    /// Entries per group; multiplier for the incoming offset.
    pub stride: usize,
    /// Number of groups stored.
    pub groups: usize,
    /// Packed length in bytes.
    pub byte_len: usize,
}

/// Metadata for a whole packed cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeLayout {
    /// Layout version.
    pub version: u32,
    /// Number of domain values.
    pub domain_size: u32,
    /// Per-level layout, top first.
    pub levels: Vec<LevelLayout>,
}

impl CascadeLayout {
    /// Number of levels.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Total packed bytes.
    pub fn byte_len(&self) -> usize {
        self.levels.iter().map(|l| l.byte_len).sum()
    }
}

#[derive(Deserialize)]
struct PackedCascadeParts {
    config: CascadeConfig,
    levels: Vec<PackedLevel>,
}

impl TryFrom<PackedCascadeParts> for PackedCascade {
    type Error = Error;

    fn try_from(parts: PackedCascadeParts) -> Result<Self> {
        PackedCascade::from_parts(parts.config, parts.levels)
    }
}

/// A packed, validated cascade ready for O(1) lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PackedCascadeParts")]
pub struct PackedCascade {
    config: CascadeConfig,
    levels: Vec<PackedLevel>,
}

impl PackedCascade {
    /// Assemble a cascade from packed levels, validating the layout.
    ///
    /// Checks that the levels match the configuration, every byte array has
    /// exactly the packed length of its entries, every offset addresses a
    /// group of the next level, and every final value is a width class.
    pub fn from_parts(config: CascadeConfig, levels: Vec<PackedLevel>) -> Result<Self> {
        config.validate()?;
        if levels.len() != config.depth() {
            return Err(Error::corrupted(format!(
                "expected {} levels, found {}",
                config.depth(),
                levels.len()
            )));
        }

        for (i, (level, expected)) in levels.iter().zip(&config.levels).enumerate() {
            if level.config != *expected {
                return Err(Error::corrupted_at("level configuration mismatch", i));
            }
            let stride = level.config.bucket_count();
            if level.entry_count == 0 || level.entry_count % stride != 0 {
                return Err(Error::corrupted_at(
                    format!(
                        "{} entries is not a whole number of {}-entry groups",
                        level.entry_count, stride
                    ),
                    i,
                ));
            }
            if i == 0 && level.entry_count != stride {
                return Err(Error::corrupted_at("top level must hold one group", i));
            }
            let expected_len = level.config.offset_width.packed_len(level.entry_count);
            if level.bytes.len() != expected_len {
                return Err(Error::corrupted_at(
                    format!(
                        "byte array holds {} bytes, expected {}",
                        level.bytes.len(),
                        expected_len
                    ),
                    i,
                ));
            }
        }

        for (i, level) in levels.iter().enumerate() {
            let bound = match levels.get(i + 1) {
                Some(next) => next.groups(),
                None => WidthClass::ALL.len(),
            };
            let dangling = (0..level.entry_count).find(|&j| level.offset(j) as usize >= bound);
            if let Some(index) = dangling {
                return Err(Error::corrupted_at(
                    format!(
                        "offset {} at index {} exceeds bound {}",
                        level.offset(index),
                        index,
                        bound
                    ),
                    i,
                ));
            }
        }

        Ok(Self { config, levels })
    }

    /// The configuration the bytes were built with.
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Packed levels, top first.
    pub fn levels(&self) -> &[PackedLevel] {
        &self.levels
    }

    /// Metadata for an independent decoder.
    pub fn layout(&self) -> CascadeLayout {
        CascadeLayout {
            version: self.config.version,
            domain_size: self.config.domain_size,
            levels: self
                .levels
                .iter()
                .map(|level| LevelLayout {
                    low_bit: level.config.low_bit,
                    num_bits: level.config.num_bits,
                    offset_width: level.config.offset_width.bits(),
                    stride: level.config.bucket_count(),
                    groups: level.groups(),
                    byte_len: level.bytes.len(),
                })
                .collect(),
        }
    }

    /// Walk the levels for a value known to be inside the domain.
    #[inline]
    fn walk(&self, value: u32) -> WidthClass {
        let mut offset = 0usize;
        for level in &self.levels {
            let index = offset * level.config.bucket_count() + level.config.key(value);
            offset = level.offset(index) as usize;
        }
        WidthClass::from_bits(offset as u8)
    }

    /// Displayed width of `c`, ambiguous characters counting as one column.
    #[inline]
    pub fn width(&self, c: char) -> Option<usize> {
        self.width_of(c, false)
    }

    /// Displayed width of `c`, ambiguous characters counting as two columns.
    #[inline]
    pub fn width_cjk(&self, c: char) -> Option<usize> {
        self.width_of(c, true)
    }
}

impl WidthTable for PackedCascade {
    fn domain_size(&self) -> u32 {
        self.config.domain_size
    }

    #[inline]
    fn class_of(&self, value: u32) -> Option<WidthClass> {
        if value >= self.config.domain_size {
            return None;
        }
        Some(self.walk(value))
    }

    fn encoded_size(&self) -> usize {
        self.levels.iter().map(|l| l.bytes.len()).sum()
    }
}

// =============================================================================
// Tests
// =============================================================================
