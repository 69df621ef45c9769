//! Cascade configuration shared by the builder and the decoder.
//!
//! The configuration fixes the bit-slice boundaries and offset widths of every
//! level. Packed bytes are only meaningful together with the configuration
//! that produced them, so it is serialized alongside them and carries a layout
//! version.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{NUM_CODEPOINTS, NUM_CODEPOINT_BITS};

/// Version of the packed cascade layout.
pub const LAYOUT_VERSION: u32 = 1;

/// Upper bound on the key bits of a single level.
pub const MAX_LEVEL_BITS: u8 = 16;

/// Bit width of one packed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OffsetWidth {
    /// Four offsets per byte.
    Two,
    /// Two offsets per byte.
    Four,
    /// One offset per byte.
    Eight,
}

impl OffsetWidth {
    /// Width in bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        match self {
            OffsetWidth::Two => 2,
            OffsetWidth::Four => 4,
            OffsetWidth::Eight => 8,
        }
    }

    /// Offsets stored per byte.
    #[inline]
    pub const fn per_byte(self) -> usize {
        8 / self.bits() as usize
    }

    /// Mask selecting one offset.
    #[inline]
    pub const fn mask(self) -> u8 {
        ((1u16 << self.bits()) - 1) as u8
    }

    /// Largest offset this width can hold.
    #[inline]
    pub const fn max_index(self) -> usize {
        self.mask() as usize
    }

    /// Bytes needed to store `count` offsets.
    #[inline]
    pub const fn packed_len(self, count: usize) -> usize {
        count.div_ceil(self.per_byte())
    }
}

impl TryFrom<u8> for OffsetWidth {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self> {
        match bits {
            2 => Ok(OffsetWidth::Two),
            4 => Ok(OffsetWidth::Four),
            8 => Ok(OffsetWidth::Eight),
            other => Err(Error::InvalidOffsetWidth(other)),
        }
    }
}

impl From<OffsetWidth> for u8 {
    fn from(width: OffsetWidth) -> u8 {
        width.bits()
    }
}

/// One level of the cascade: the key bit-slice and the offset width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Lowest key bit of this level.
    pub low_bit: u8,
    /// Number of key bits.
    pub num_bits: u8,
    /// Width of each stored offset.
    pub offset_width: OffsetWidth,
}

impl LevelConfig {
    /// Create a level keyed by bits `[low_bit, low_bit + num_bits)`.
    pub const fn new(low_bit: u8, num_bits: u8, offset_width: OffsetWidth) -> Self {
        Self {
            low_bit,
            num_bits,
            offset_width,
        }
    }

    /// One past the highest key bit.
    #[inline]
    pub const fn cap_bit(&self) -> u8 {
        self.low_bit.saturating_add(self.num_bits)
    }

    /// Buckets per input group (the level stride).
    #[inline]
    pub const fn bucket_count(&self) -> usize {
        1usize << self.num_bits
    }

    /// Mask applied after shifting by `low_bit`.
    #[inline]
    pub const fn key_mask(&self) -> u32 {
        ((1u64 << self.num_bits) - 1) as u32
    }

    /// This level's key for `value`.
    #[inline]
    pub const fn key(&self, value: u32) -> usize {
        ((value >> self.low_bit) & self.key_mask()) as usize
    }
}

/// Complete cascade layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Layout version.
    pub version: u32,
    /// Number of domain values.
    pub domain_size: u32,
    /// Levels from the most significant key bits down.
    pub levels: Vec<LevelConfig>,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            version: LAYOUT_VERSION,
            domain_size: NUM_CODEPOINTS,
            levels: vec![
                LevelConfig::new(13, NUM_CODEPOINT_BITS - 13, OffsetWidth::Eight),
                LevelConfig::new(6, 7, OffsetWidth::Eight),
                LevelConfig::new(0, 6, OffsetWidth::Two),
            ],
        }
    }
}

impl CascadeConfig {
    /// Create and validate a configuration for an arbitrary domain.
    pub fn new(domain_size: u32, levels: Vec<LevelConfig>) -> Result<Self> {
        let config = Self {
            version: LAYOUT_VERSION,
            domain_size,
            levels,
        };
        config.validate()?;
        Ok(config)
    }

    /// Number of bits needed to address every domain value.
    pub fn domain_bits(&self) -> u8 {
        required_bits(self.domain_size)
    }

    /// Number of levels.
    #[inline]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Check that levels tile `[0, domain_bits)` from the top down.
    pub fn validate(&self) -> Result<()> {
        if self.version != LAYOUT_VERSION {
            return Err(Error::VersionMismatch {
                expected: LAYOUT_VERSION,
                found: self.version,
            });
        }
        if self.domain_size == 0 {
            return Err(Error::config("domain must contain at least one value"));
        }
        let Some(first) = self.levels.first() else {
            return Err(Error::config("cascade needs at least one level"));
        };

        for (i, level) in self.levels.iter().enumerate() {
            if level.num_bits == 0 || level.num_bits > MAX_LEVEL_BITS {
                return Err(Error::config(format!(
                    "level {} has {} key bits, expected 1..={}",
                    i, level.num_bits, MAX_LEVEL_BITS
                )));
            }
            if u32::from(level.low_bit) + u32::from(level.num_bits) > u32::BITS {
                return Err(Error::config(format!(
                    "level {} covers bits {}..{}, past the {}-bit value width",
                    i,
                    level.low_bit,
                    u32::from(level.low_bit) + u32::from(level.num_bits),
                    u32::BITS
                )));
            }
        }

        let domain_bits = self.domain_bits();
        if first.cap_bit() != domain_bits {
            return Err(Error::config(format!(
                "level 0 tops out at bit {}, domain needs {} bits",
                first.cap_bit(),
                domain_bits
            )));
        }
        for (i, pair) in self.levels.windows(2).enumerate() {
            if pair[1].cap_bit() != pair[0].low_bit {
                return Err(Error::config(format!(
                    "level {} covers bits {}..{} but level {} starts at bit {}",
                    i + 1,
                    pair[1].low_bit,
                    pair[1].cap_bit(),
                    i,
                    pair[0].low_bit
                )));
            }
        }
        if let Some(last) = self.levels.last() {
            if last.low_bit != 0 {
                return Err(Error::config(format!(
                    "last level starts at bit {}, must reach bit 0",
                    last.low_bit
                )));
            }
        }
        Ok(())
    }
}

/// Bits needed to represent every value in `0..domain_size`.
pub fn required_bits(domain_size: u32) -> u8 {
    if domain_size <= 2 {
        return 1;
    }
    (u32::BITS - (domain_size - 1).leading_zeros()) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_covers_codespace() {
        let config = CascadeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.domain_bits(), 21);
        assert_eq!(config.depth(), 3);
        assert_eq!(config.levels[0].bucket_count(), 256);
        assert_eq!(config.levels[1].bucket_count(), 128);
        assert_eq!(config.levels[2].bucket_count(), 64);
    }

    #[test]
    fn test_required_bits() {
        assert_eq!(required_bits(1), 1);
        assert_eq!(required_bits(2), 1);
        assert_eq!(required_bits(16), 4);
        assert_eq!(required_bits(17), 5);
        assert_eq!(required_bits(NUM_CODEPOINTS), 21);
    }

    #[test]
    fn test_offset_width() {
        assert_eq!(OffsetWidth::Two.per_byte(), 4);
        assert_eq!(OffsetWidth::Four.mask(), 0x0F);
        assert_eq!(OffsetWidth::Eight.max_index(), 255);
        assert_eq!(OffsetWidth::Two.packed_len(5), 2);
        assert_eq!(OffsetWidth::Eight.packed_len(5), 5);
        assert!(matches!(
            OffsetWidth::try_from(3),
            Err(Error::InvalidOffsetWidth(3))
        ));
    }

    #[test]
    fn test_level_key() {
        let level = LevelConfig::new(6, 7, OffsetWidth::Eight);
        assert_eq!(level.key(0x1F600), (0x1F600 >> 6) & 0x7F);
        assert_eq!(level.cap_bit(), 13);
    }

    #[test]
    fn test_gap_rejected() {
        let result = CascadeConfig::new(
            16,
            vec![
                LevelConfig::new(2, 2, OffsetWidth::Two),
                LevelConfig::new(0, 1, OffsetWidth::Two),
            ],
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_short_top_rejected() {
        let result = CascadeConfig::new(32, vec![LevelConfig::new(0, 4, OffsetWidth::Two)]);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_level_past_value_width_rejected() {
        let config = CascadeConfig {
            version: LAYOUT_VERSION,
            domain_size: 16,
            levels: vec![LevelConfig::new(250, 16, OffsetWidth::Two)],
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = CascadeConfig {
            version: LAYOUT_VERSION,
            domain_size: 16,
            levels: vec![LevelConfig::new(28, 5, OffsetWidth::Two)],
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        assert_eq!(LevelConfig::new(250, 16, OffsetWidth::Two).cap_bit(), u8::MAX);
    }

    #[test]
    fn test_version_checked() {
        let mut config = CascadeConfig::default();
        config.version = 99;
        assert!(matches!(
            config.validate(),
            Err(Error::VersionMismatch { found: 99, .. })
        ));
    }

    #[test]
    fn test_offset_width_serializes_as_bits() {
        let level = LevelConfig::new(0, 6, OffsetWidth::Two);
        let json = serde_json::to_string(&level).unwrap();
        assert_eq!(json, r#"{"low_bit":0,"num_bits":6,"offset_width":2}"#);

        let bad = r#"{"low_bit":0,"num_bits":6,"offset_width":3}"#;
        assert!(serde_json::from_str::<LevelConfig>(bad).is_err());
    }
}
