//! Statistics collected while building a cascade.

use serde::{Deserialize, Serialize};

use crate::types::TableSize;

/// Statistics for one cascade level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    /// Raw buckets produced by partitioning.
    pub raw_buckets: usize,
    /// Buckets retained after deduplication.
    pub retained_buckets: usize,
    /// Packed size of this level in bytes.
    pub packed_bytes: usize,
}

impl LevelStats {
    /// Raw buckets folded into an earlier retained bucket.
    pub fn merges(&self) -> usize {
        self.raw_buckets - self.retained_buckets
    }
}

/// Statistics from a complete cascade build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Number of domain values.
    pub domain_size: usize,
    /// Per-level statistics, top level first.
    pub levels: Vec<LevelStats>,
    /// Time taken in microseconds.
    pub time_us: u64,
}

impl BuildStats {
    /// Create new empty stats for a domain.
    pub fn new(domain_size: usize) -> Self {
        BuildStats {
            domain_size,
            ..Default::default()
        }
    }

    /// Record a finished level.
    pub fn record_level(&mut self, level: LevelStats) {
        self.levels.push(level);
    }

    /// Total packed bytes across levels.
    pub fn packed_bytes(&self) -> usize {
        self.levels.iter().map(|l| l.packed_bytes).sum()
    }

    /// Total merges across levels.
    pub fn total_merges(&self) -> usize {
        self.levels.iter().map(LevelStats::merges).sum()
    }

    /// Size against one byte per domain value.
    pub fn size(&self) -> TableSize {
        TableSize::new(self.domain_size, self.packed_bytes())
    }

    /// Get stats summary as string.
    pub fn summary(&self) -> String {
        let levels: Vec<String> = self
            .levels
            .iter()
            .map(|l| format!("{}->{} ({} B)", l.raw_buckets, l.retained_buckets, l.packed_bytes))
            .collect();
        format!(
            "Domain: {}, Levels: [{}], Packed: {} B (ratio: {:.1}x), Time: {} us",
            self.domain_size,
            levels.join(", "),
            self.packed_bytes(),
            self.size().ratio(),
            self.time_us,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let mut stats = BuildStats::new(16);
        stats.record_level(LevelStats {
            raw_buckets: 4,
            retained_buckets: 3,
            packed_bytes: 1,
        });
        stats.record_level(LevelStats {
            raw_buckets: 12,
            retained_buckets: 3,
            packed_bytes: 3,
        });
        assert_eq!(stats.packed_bytes(), 4);
        assert_eq!(stats.total_merges(), 10);
        assert!(stats.size().is_effective());
        assert!(stats.summary().contains("4->3 (1 B)"));
    }
}
