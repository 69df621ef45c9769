//! Core traits for width tables.
//!
//! ## Trait Hierarchy
//!
//! ```text
//! TableEncoder  (ClassifiedArray -> table)
//!       ↓
//! WidthTable    (table -> class per value)
//! ```

use crate::error::{Error, Result};
use crate::types::{ClassifiedArray, TableSize, WidthClass};

/// Values below this bound are answered without consulting a table.
pub const FAST_PATH_LIMIT: u32 = 0xA0;

/// Resolve the low control and ASCII range without a table.
///
/// Returns `None` when `value` needs a table lookup, `Some(None)` for
/// unclassifiable control values, and `Some(Some(width))` otherwise.
#[inline]
pub fn fast_path_width(value: u32) -> Option<Option<usize>> {
    if value < 0x7F {
        if value >= 0x20 {
            Some(Some(1))
        } else if value == 0 {
            Some(Some(0))
        } else {
            Some(None)
        }
    } else if value < FAST_PATH_LIMIT {
        Some(None)
    } else {
        None
    }
}

/// A compressed form of a [`ClassifiedArray`].
pub trait WidthTable {
    /// Number of domain values the table answers for.
    fn domain_size(&self) -> u32;

    /// Class of `value` from the table alone, or `None` outside the domain.
    fn class_of(&self, value: u32) -> Option<WidthClass>;

    /// Size of the encoded table in bytes.
    fn encoded_size(&self) -> usize;

    /// Displayed width of `c` in columns, or `None` if `c` is a control
    /// character other than `'\0'`.
    ///
    /// Ambiguous characters count as two columns when `ambiguous_is_wide`
    /// is set (CJK contexts) and one column otherwise.
    fn width_of(&self, c: char, ambiguous_is_wide: bool) -> Option<usize> {
        let value = u32::from(c);
        match fast_path_width(value) {
            Some(width) => width,
            None => self
                .class_of(value)
                .map(|class| class.columns(ambiguous_is_wide)),
        }
    }

    /// Displayed width of a string. Control characters count as zero.
    fn str_width(&self, s: &str, ambiguous_is_wide: bool) -> usize {
        s.chars()
            .map(|c| self.width_of(c, ambiguous_is_wide).unwrap_or(0))
            .sum()
    }

    /// Size against one byte per domain value.
    fn size(&self) -> TableSize {
        TableSize::new(self.domain_size() as usize, self.encoded_size())
    }

    /// Check every domain value against the ground truth.
    fn verify(&self, truth: &ClassifiedArray) -> Result<()> {
        if truth.domain_size() != self.domain_size() {
            return Err(Error::DomainMismatch {
                expected: truth.len(),
                actual: self.domain_size() as usize,
            });
        }
        for entry in truth.entries() {
            let decoded = self.class_of(entry.value);
            if decoded != Some(entry.class) {
                return Err(Error::corrupted(format!(
                    "value {:#x} decodes to {:?}, ground truth is {}",
                    entry.value,
                    decoded.map(WidthClass::name),
                    entry.class.name()
                )));
            }
        }
        Ok(())
    }
}

/// Builds a [`WidthTable`] from ground truth.
pub trait TableEncoder {
    /// The table produced.
    type Table: WidthTable;

    /// Encode the full array. Each call recomputes from scratch.
    fn encode(&self, classes: &ClassifiedArray) -> Result<Self::Table>;
}
