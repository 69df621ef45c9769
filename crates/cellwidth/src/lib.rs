//! # Cellwidth
//!
//! Compiles a per-codepoint display width table into compact lookup tables.
//!
//! The input is a [`ClassifiedArray`]: one [`WidthClass`] for every value of a
//! dense domain. The main encoding is a multi-level cascade. Each level slices
//! a few bits off the value, groups the entries sharing the higher bits into
//! buckets, and merges buckets whose width sequences agree on a common prefix.
//! Only the retained bucket indices are kept, packed 2, 4 or 8 bits each.
//!
//! ## Pipeline
//!
//! ```text
//! WidthRecord + CategoryRecord ──► WidthClassifier ──► ClassifiedArray
//!                                                          │
//!                      ┌───────────────────┬───────────────┼──────────────┐
//!                      ▼                   ▼               ▼              ▼
//!               CascadeBuilder        RangeTable      SearchTree     MaskedLut
//!                      │                                                  │
//!                      ▼                                                  │
//!               PackedCascade ◄────────── FrontedTable ◄──────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use cellwidth::prelude::*;
//!
//! let classes = WidthClassifier::unicode().classify(&widths, &categories)?;
//! let table = CascadeBuilder::default().encode(&classes)?;
//! table.verify(&classes)?;
//!
//! assert_eq!(table.width('a'), Some(1));
//! assert_eq!(table.width('你'), Some(2));
//! assert_eq!(table.width('\u{7}'), None);
//! ```

pub mod bucket;
pub mod cascade;
pub mod classify;
pub mod decode;
pub mod lut;
pub mod pack;
pub mod ranges;

pub use bucket::{dedup, partition, Bucket, BucketIndexer, Dedup};
pub use cascade::{build_cascade, Cascade, CascadeBuilder, Level};
pub use classify::{
    is_zero_width_category, CategoryRecord, EastAsianWidth, Override, WidthClassifier,
    WidthRecord, UNICODE_OVERRIDES, ZERO_WIDTH_CATEGORIES,
};
pub use decode::{CascadeLayout, LevelLayout, PackedCascade, PackedLevel};
pub use lut::{
    analyze_mask, find_lut_bits, FrontedEncoder, FrontedTable, MaskAnalysis, MaskedLut,
    MAX_LUT_BITS,
};
pub use pack::{pack, try_unpack, unpack, unpack_all};
pub use ranges::{
    Node, RangeEncoder, RangeKey, RangeTable, SearchTree, SearchTreeEncoder, KEYS_PER_NODE,
};

// Re-export core types
pub use cellwidth_core::{
    fast_path_width, required_bits, BuildStats, CascadeConfig, ClassifiedArray, Entry, Error,
    LevelConfig, LevelStats, OffsetWidth, Result, TableEncoder, TableSize, WidthClass,
    WidthSlot, WidthTable, FAST_PATH_LIMIT, LAYOUT_VERSION, NUM_CODEPOINTS,
};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        CascadeBuilder, CascadeConfig, ClassifiedArray, Error, FrontedTable, PackedCascade,
        RangeTable, Result, SearchTree, TableEncoder, WidthClass, WidthClassifier, WidthTable,
    };
}
