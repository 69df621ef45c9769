//! Multi-level cascade construction.
//!
//! The builder chains [`BucketIndexer`] passes over descending bit-slices of
//! the domain value:
//!
//! ```text
//!   ClassifiedArray (one group, every value)
//!        │  level 0: key = bits 13..21
//!        ▼
//!   offsets[256]        retained buckets B0..Bn
//!        │  level 1: each Bi's entries form one group, key = bits 6..13
//!        ▼
//!   offsets[n * 128]    retained buckets C0..Cm
//!        │  level 2: key = bits 0..6
//!        ▼
//!   classes[m * 64]     every bucket must be class-homogeneous
//! ```
//!
//! Walking the cascade for value `c` computes, at each level, the index
//! `prev_offset * stride + key(c)`; the final level yields the class.

use std::time::Instant;

use cellwidth_core::{
    BuildStats, CascadeConfig, ClassifiedArray, Entry, Error, LevelConfig, LevelStats, Result,
    TableEncoder, WidthClass,
};
use tracing::{debug, info};

use crate::bucket::{dedup, partition, Bucket, BucketIndexer};
use crate::decode::{PackedCascade, PackedLevel};
use crate::pack::pack;

/// One built level: the raw-to-retained offsets for every raw bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    config: LevelConfig,
    /// Retained-bucket positions, or width classes at the final level.
    offsets: Vec<usize>,
    /// Number of input groups this level partitioned.
    groups: usize,
    /// Number of retained buckets.
    retained: usize,
}

impl Level {
    /// Level configuration.
    #[inline]
    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Offsets in raw bucket order.
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Number of input groups.
    #[inline]
    pub fn groups(&self) -> usize {
        self.groups
    }

    /// Number of retained buckets after deduplication.
    #[inline]
    pub fn retained(&self) -> usize {
        self.retained
    }

    /// Packed size of this level in bytes.
    pub fn packed_len(&self) -> usize {
        self.config.offset_width.packed_len(self.offsets.len())
    }

    fn stats(&self) -> LevelStats {
        LevelStats {
            raw_buckets: self.offsets.len(),
            retained_buckets: self.retained,
            packed_bytes: self.packed_len(),
        }
    }
}

/// A built cascade with unpacked offsets.
#[derive(Debug, Clone)]
pub struct Cascade {
    config: CascadeConfig,
    levels: Vec<Level>,
    stats: BuildStats,
}

impl Cascade {
    /// The configuration this cascade was built with.
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Levels, top first.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Build statistics.
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Walk the unpacked offsets for `value`.
    pub fn class_of(&self, value: u32) -> Option<WidthClass> {
        if value >= self.config.domain_size {
            return None;
        }
        let mut offset = 0usize;
        for level in &self.levels {
            let index = offset * level.config.bucket_count() + level.config.key(value);
            offset = level.offsets[index];
        }
        Some(WidthClass::from_bits(offset as u8))
    }

    /// Bit-pack every level.
    pub fn pack(&self) -> Result<PackedCascade> {
        let levels = self
            .levels
            .iter()
            .map(|level| {
                let bytes = pack(&level.offsets, level.config.offset_width)?;
                Ok(PackedLevel::new(level.config, level.offsets.len(), bytes))
            })
            .collect::<Result<Vec<_>>>()?;
        PackedCascade::from_parts(self.config.clone(), levels)
    }
}

/// Builds cascades for a fixed configuration.
#[derive(Debug, Clone)]
pub struct CascadeBuilder {
    config: CascadeConfig,
}

impl Default for CascadeBuilder {
    fn default() -> Self {
        Self {
            config: CascadeConfig::default(),
        }
    }
}

impl CascadeBuilder {
    /// Create a builder, validating the configuration.
    pub fn new(config: CascadeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Build every level from the ground truth.
    pub fn build(&self, classes: &ClassifiedArray) -> Result<Cascade> {
        let start = Instant::now();
        if classes.domain_size() != self.config.domain_size {
            return Err(Error::DomainMismatch {
                expected: self.config.domain_size as usize,
                actual: classes.len(),
            });
        }

        let depth = self.config.depth();
        let mut stats = BuildStats::new(classes.len());
        let mut levels = Vec::with_capacity(depth);
        let mut groups: Vec<Vec<Entry>> = vec![classes.entries().collect()];

        for (i, &config) in self.config.levels.iter().enumerate() {
            let level = if i + 1 < depth {
                let result = BucketIndexer::new(i, config).index_and_dedup(&groups)?;
                let level = Level {
                    config,
                    offsets: result.indices,
                    groups: groups.len(),
                    retained: result.buckets.len(),
                };
                groups = result
                    .buckets
                    .into_iter()
                    .map(Bucket::into_entries)
                    .collect();
                level
            } else {
                let result = dedup(partition(&groups, &config));
                let bucket_classes = final_classes(&result.buckets)?;
                Level {
                    config,
                    offsets: result
                        .indices
                        .iter()
                        .map(|&i| bucket_classes[i].bits() as usize)
                        .collect(),
                    groups: groups.len(),
                    retained: result.buckets.len(),
                }
            };

            debug!(
                "Level {} (bits {}..{}): {} groups, {} raw buckets -> {} retained, {} bytes",
                i,
                config.low_bit,
                config.cap_bit(),
                level.groups,
                level.offsets.len(),
                level.retained,
                level.packed_len()
            );
            stats.record_level(level.stats());
            levels.push(level);
        }

        stats.time_us = start.elapsed().as_micros() as u64;
        info!("Built {} level cascade: {}", depth, stats.summary());

        Ok(Cascade {
            config: self.config.clone(),
            levels,
            stats,
        })
    }
}

impl TableEncoder for CascadeBuilder {
    type Table = PackedCascade;

    fn encode(&self, classes: &ClassifiedArray) -> Result<PackedCascade> {
        self.build(classes)?.pack()
    }
}

/// Build a cascade with `config` from the ground truth.
pub fn build_cascade(classes: &ClassifiedArray, config: &CascadeConfig) -> Result<Cascade> {
    CascadeBuilder::new(config.clone())?.build(classes)
}

/// The class of every final-level bucket; each must be homogeneous.
fn final_classes(buckets: &[Bucket]) -> Result<Vec<WidthClass>> {
    buckets
        .iter()
        .enumerate()
        .map(|(i, bucket)| {
            if bucket.is_empty() {
                return Err(Error::EmptyBucket { bucket: i });
            }
            bucket
                .class()
                .ok_or(Error::NonHomogeneousBucket { bucket: i })
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cellwidth_core::{OffsetWidth, WidthTable};
    use WidthClass::*;

    fn toy_classes() -> ClassifiedArray {
        let mut classes = vec![Narrow; 8];
        classes.extend([Wide; 4]);
        classes.extend([Zero; 4]);
        ClassifiedArray::new(classes).unwrap()
    }

    fn toy_config() -> CascadeConfig {
        CascadeConfig::new(
            16,
            vec![
                LevelConfig::new(2, 2, OffsetWidth::Two),
                LevelConfig::new(0, 2, OffsetWidth::Two),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_worked_example() {
        let classes = toy_classes();
        let cascade = build_cascade(&classes, &toy_config()).unwrap();

        let top = &cascade.levels()[0];
        assert_eq!(top.offsets().len(), 4);
        assert_eq!(top.retained(), 3);
        // The two all-narrow quarters share a bucket.
        assert_eq!(top.offsets(), &[0, 0, 1, 2]);

        let bottom = &cascade.levels()[1];
        assert_eq!(bottom.groups(), 3);
        assert_eq!(bottom.offsets(), &[1, 1, 1, 1, 2, 2, 2, 2, 0, 0, 0, 0]);

        assert_eq!(cascade.class_of(5), Some(Narrow));
        assert_eq!(cascade.class_of(9), Some(Wide));
        assert_eq!(cascade.class_of(14), Some(Zero));
        assert_eq!(cascade.class_of(16), None);

        let packed = cascade.pack().unwrap();
        assert_eq!(packed.class_of(5), Some(Narrow));
        assert_eq!(packed.class_of(9), Some(Wide));
        assert_eq!(packed.class_of(14), Some(Zero));
        packed.verify(&classes).unwrap();
    }

    #[test]
    fn test_worked_example_is_compact() {
        let packed = CascadeBuilder::new(toy_config())
            .unwrap()
            .encode(&toy_classes())
            .unwrap();
        // 4 two-bit offsets + 12 two-bit classes.
        assert_eq!(packed.encoded_size(), 4);
        assert!(packed.size().is_effective());
    }

    #[test]
    fn test_stats_track_merges() {
        let cascade = build_cascade(&toy_classes(), &toy_config()).unwrap();
        let stats = cascade.stats();
        assert_eq!(stats.levels.len(), 2);
        assert_eq!(stats.levels[0].merges(), 1);
        assert_eq!(stats.levels[1].retained_buckets, 3);
        assert_eq!(stats.packed_bytes(), 4);
    }

    #[test]
    fn test_single_level_cascade() {
        let classes = ClassifiedArray::new(vec![Zero, Narrow, Wide, Ambiguous]).unwrap();
        let config =
            CascadeConfig::new(4, vec![LevelConfig::new(0, 2, OffsetWidth::Two)]).unwrap();
        let packed = CascadeBuilder::new(config).unwrap().encode(&classes).unwrap();
        packed.verify(&classes).unwrap();
        assert_eq!(packed.encoded_size(), 1);
    }

    #[test]
    fn test_domain_smaller_than_key_space() {
        // 12 values addressed with 4 bits: the top quarter of the key space is empty.
        let mut classes = vec![Wide; 6];
        classes.extend([Narrow; 6]);
        let classes = ClassifiedArray::new(classes).unwrap();
        let config = CascadeConfig::new(
            12,
            vec![
                LevelConfig::new(2, 2, OffsetWidth::Four),
                LevelConfig::new(0, 2, OffsetWidth::Two),
            ],
        )
        .unwrap();
        let cascade = build_cascade(&classes, &config).unwrap();
        cascade.pack().unwrap().verify(&classes).unwrap();
        for value in 0..12 {
            assert_eq!(cascade.class_of(value), classes.get(value));
        }
    }

    #[test]
    fn test_non_homogeneous_final_bucket_rejected() {
        // The final level keys on bit 1 only, so values 0 and 1 share a bucket.
        let classes = ClassifiedArray::new(vec![Narrow, Wide, Narrow, Wide]).unwrap();
        let config = CascadeConfig {
            version: cellwidth_core::LAYOUT_VERSION,
            domain_size: 4,
            levels: vec![LevelConfig::new(1, 1, OffsetWidth::Two)],
        };
        // Bypass validation to exercise the homogeneity check directly.
        let builder = CascadeBuilder { config };
        assert!(matches!(
            builder.build(&classes),
            Err(Error::NonHomogeneousBucket { .. })
        ));
    }

    #[test]
    fn test_domain_mismatch_rejected() {
        let classes = ClassifiedArray::new(vec![Narrow; 8]).unwrap();
        assert!(matches!(
            build_cascade(&classes, &toy_config()),
            Err(Error::DomainMismatch {
                expected: 16,
                actual: 8
            })
        ));
    }

    #[test]
    fn test_top_level_overflow_rejected() {
        // 16 distinct single-value buckets cannot be addressed with 2 bits.
        let classes: Vec<WidthClass> = (0..64u32)
            .map(|v| {
                let key = v >> 2;
                let bits = match v & 3 {
                    0 => key,
                    1 => key >> 2,
                    _ => 1,
                };
                WidthClass::from_bits(bits as u8)
            })
            .collect();
        let classes = ClassifiedArray::new(classes).unwrap();
        let config = CascadeConfig::new(
            64,
            vec![
                LevelConfig::new(2, 4, OffsetWidth::Two),
                LevelConfig::new(0, 2, OffsetWidth::Two),
            ],
        )
        .unwrap();
        assert!(matches!(
            build_cascade(&classes, &config),
            Err(Error::OffsetOverflow { level: 0, bits: 2, .. })
        ));
    }
}
