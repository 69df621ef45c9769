//! # Cellwidth Core
//!
//! Core traits, types, and configuration for the cellwidth table compiler.
//!
//! A width table answers one question for every value of a dense domain (every
//! Unicode codepoint): how many terminal columns does it occupy? The full
//! answer is a 1.1M entry array; the tables in `cellwidth` compress it into a
//! few kilobytes and decode in O(1) while answering identically.
//!
//! ## Core Types
//!
//! - [`WidthClass`] - Zero, narrow, wide, or ambiguous
//! - [`ClassifiedArray`] - Immutable ground truth, one class per value
//! - [`CascadeConfig`] - Bit-slice boundaries and offset widths per level
//! - [`WidthTable`] - Anything that answers a class per value
//!
//! ## Example
//!
//! ```ignore
//! use cellwidth::CascadeBuilder;
//! use cellwidth_core::{CascadeConfig, TableEncoder, WidthTable};
//!
//! let builder = CascadeBuilder::new(CascadeConfig::default())?;
//! let table = builder.encode(&classes)?;
//! table.verify(&classes)?;
//! assert_eq!(table.width_of('你', false), Some(2));
//! ```

pub mod config;
pub mod error;
pub mod stats;
pub mod traits;
pub mod types;

pub use config::{required_bits, CascadeConfig, LevelConfig, OffsetWidth, LAYOUT_VERSION};
pub use error::{Error, Result};
pub use stats::{BuildStats, LevelStats};
pub use traits::{fast_path_width, TableEncoder, WidthTable, FAST_PATH_LIMIT};
pub use types::{
    ClassifiedArray, Entry, TableSize, WidthClass, WidthSlot, CLASS_BITS, NUM_CODEPOINTS,
    NUM_CODEPOINT_BITS,
};
