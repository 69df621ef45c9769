//! Merging East Asian Width and general category data into one class per value.
//!
//! Resolution happens in three passes over a dense array that starts out
//! `Narrow`:
//!
//! 1. East Asian Width records set Narrow, Wide or Ambiguous.
//! 2. Category records flagged zero-width set `Zero`, overriding step 1.
//! 3. Fixed overrides are applied last.
//!
//! Records of each kind must be ascending and non-overlapping. Anything else
//! is a malformed upstream record and aborts the merge.

use std::str::FromStr;

use cellwidth_core::{ClassifiedArray, Error, Result, WidthClass, NUM_CODEPOINTS};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// General categories whose members take no columns.
pub const ZERO_WIDTH_CATEGORIES: [&str; 4] = ["Cc", "Cf", "Mn", "Me"];

/// Overrides applied to the Unicode domain after the merge.
pub const UNICODE_OVERRIDES: [Override; 2] = [
    // Soft hyphen renders as a visible hyphen in terminals.
    Override::new(0x00AD, 0x00AD, WidthClass::Narrow),
    // Hangul Jamo medial vowels and final consonants join the preceding syllable.
    Override::new(0x1160, 0x11FF, WidthClass::Zero),
];

/// East Asian Width property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EastAsianWidth {
    Neutral,
    Narrow,
    Halfwidth,
    Wide,
    Fullwidth,
    Ambiguous,
}

impl EastAsianWidth {
    /// Width class this property value maps to.
    pub const fn class(self) -> WidthClass {
        match self {
            EastAsianWidth::Neutral | EastAsianWidth::Narrow | EastAsianWidth::Halfwidth => {
                WidthClass::Narrow
            }
            EastAsianWidth::Wide | EastAsianWidth::Fullwidth => WidthClass::Wide,
            EastAsianWidth::Ambiguous => WidthClass::Ambiguous,
        }
    }

    /// Short property alias as used in `EastAsianWidth.txt`.
    pub const fn code(self) -> &'static str {
        match self {
            EastAsianWidth::Neutral => "N",
            EastAsianWidth::Narrow => "Na",
            EastAsianWidth::Halfwidth => "H",
            EastAsianWidth::Wide => "W",
            EastAsianWidth::Fullwidth => "F",
            EastAsianWidth::Ambiguous => "A",
        }
    }
}

impl FromStr for EastAsianWidth {
    type Err = Error;

    fn from_str(code: &str) -> Result<Self> {
        match code {
            "N" => Ok(EastAsianWidth::Neutral),
            "Na" => Ok(EastAsianWidth::Narrow),
            "H" => Ok(EastAsianWidth::Halfwidth),
            "W" => Ok(EastAsianWidth::Wide),
            "F" => Ok(EastAsianWidth::Fullwidth),
            "A" => Ok(EastAsianWidth::Ambiguous),
            other => Err(Error::config(format!(
                "unknown East Asian Width value: {:?}",
                other
            ))),
        }
    }
}

/// An inclusive value range carrying an East Asian Width value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidthRecord {
    pub start: u32,
    pub end: u32,
    pub width: EastAsianWidth,
}

impl WidthRecord {
    pub const fn new(start: u32, end: u32, width: EastAsianWidth) -> Self {
        Self { start, end, width }
    }
}

/// An inclusive value range sharing one general category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub start: u32,
    pub end: u32,
    /// Whether the category is one of [`ZERO_WIDTH_CATEGORIES`].
    pub zero_width: bool,
}

impl CategoryRecord {
    /// Record for `start..=end` in the category with short alias `category`.
    pub fn new(start: u32, end: u32, category: &str) -> Self {
        Self {
            start,
            end,
            zero_width: is_zero_width_category(category),
        }
    }
}

/// Whether a general category takes no columns.
pub fn is_zero_width_category(category: &str) -> bool {
    ZERO_WIDTH_CATEGORIES.contains(&category)
}

/// A fixed class assignment over an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    pub start: u32,
    pub end: u32,
    pub class: WidthClass,
}

impl Override {
    pub const fn new(start: u32, end: u32, class: WidthClass) -> Self {
        Self { start, end, class }
    }
}

/// Merges width and category records into a [`ClassifiedArray`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidthClassifier {
    domain_size: u32,
    overrides: Vec<Override>,
}

impl Default for WidthClassifier {
    fn default() -> Self {
        Self::unicode()
    }
}

impl WidthClassifier {
    /// Classifier over `domain_size` values with no overrides.
    pub fn new(domain_size: u32) -> Result<Self> {
        if domain_size == 0 {
            return Err(Error::config("domain_size must be at least 1"));
        }
        Ok(Self {
            domain_size,
            overrides: Vec::new(),
        })
    }

    /// Classifier over every Unicode scalar position with the standard overrides.
    pub fn unicode() -> Self {
        Self {
            domain_size: NUM_CODEPOINTS,
            overrides: UNICODE_OVERRIDES.to_vec(),
        }
    }

    /// Add an override, applied after every earlier one.
    pub fn with_override(mut self, over: Override) -> Result<Self> {
        if over.start > over.end || over.end >= self.domain_size {
            return Err(Error::config(format!(
                "override {:#X}..={:#X} outside domain of {}",
                over.start, over.end, self.domain_size
            )));
        }
        self.overrides.push(over);
        Ok(self)
    }

    pub fn domain_size(&self) -> u32 {
        self.domain_size
    }

    pub fn overrides(&self) -> &[Override] {
        &self.overrides
    }

    /// Resolve one class per value.
    pub fn classify(
        &self,
        widths: &[WidthRecord],
        categories: &[CategoryRecord],
    ) -> Result<ClassifiedArray> {
        let mut classes = vec![WidthClass::Narrow; self.domain_size as usize];

        self.check_ranges("width", widths.iter().map(|r| (r.start, r.end)))?;
        for record in widths {
            classes[record.start as usize..=record.end as usize].fill(record.width.class());
        }
        debug!("Applied {} East Asian Width records", widths.len());

        self.check_ranges("category", categories.iter().map(|r| (r.start, r.end)))?;
        let mut zero_width = 0usize;
        for record in categories.iter().filter(|r| r.zero_width) {
            classes[record.start as usize..=record.end as usize].fill(WidthClass::Zero);
            zero_width += (record.end - record.start + 1) as usize;
        }
        debug!(
            "Applied {} category records ({} zero-width values)",
            categories.len(),
            zero_width
        );

        for over in &self.overrides {
            classes[over.start as usize..=over.end as usize].fill(over.class);
        }

        let classes = ClassifiedArray::new(classes)?;
        let [zero, narrow, wide, ambiguous] = classes.histogram();
        info!(
            "Classified {} values: {} zero, {} narrow, {} wide, {} ambiguous ({} runs)",
            classes.len(),
            zero,
            narrow,
            wide,
            ambiguous,
            classes.run_count()
        );
        Ok(classes)
    }

    fn check_ranges(&self, kind: &str, ranges: impl Iterator<Item = (u32, u32)>) -> Result<()> {
        let mut next_free = 0u32;
        for (i, (start, end)) in ranges.enumerate() {
            if start > end {
                return Err(Error::malformed(
                    i,
                    format!("{} range {:#X}..={:#X} is reversed", kind, start, end),
                ));
            }
            if end >= self.domain_size {
                return Err(Error::malformed(
                    i,
                    format!(
                        "{} range {:#X}..={:#X} outside domain of {}",
                        kind, start, end, self.domain_size
                    ),
                ));
            }
            if i > 0 && start < next_free {
                return Err(Error::malformed(
                    i,
                    format!(
                        "{} range {:#X}..={:#X} overlaps or precedes the previous record",
                        kind, start, end
                    ),
                ));
            }
            next_free = end + 1;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
