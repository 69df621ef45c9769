//! Core type definitions for width tables.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An upper bound for which `0..NUM_CODEPOINTS` contains the entire Unicode codespace.
pub const NUM_CODEPOINTS: u32 = 0x110000;

/// Number of bits required to represent any Unicode codepoint.
pub const NUM_CODEPOINT_BITS: u8 = 21;

/// Number of bits a packed width class occupies.
pub const CLASS_BITS: u8 = 2;

/// Effective display width of a domain value.
///
/// The discriminants are the packed representation. For `Zero`, `Narrow` and
/// `Wide` they are also the column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum WidthClass {
    /// Zero columns wide.
    Zero = 0,
    /// One column wide.
    #[default]
    Narrow = 1,
    /// Two columns wide.
    Wide = 2,
    /// Two columns wide in a CJK context, one column wide in all other contexts.
    Ambiguous = 3,
}

impl WidthClass {
    /// All classes in discriminant order.
    pub const ALL: [WidthClass; 4] = [
        WidthClass::Zero,
        WidthClass::Narrow,
        WidthClass::Wide,
        WidthClass::Ambiguous,
    ];

    /// Packed representation.
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decode the low two bits of a packed value.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => WidthClass::Zero,
            1 => WidthClass::Narrow,
            2 => WidthClass::Wide,
            _ => WidthClass::Ambiguous,
        }
    }

    /// Column count, resolving `Ambiguous` per the caller's context.
    #[inline]
    pub const fn columns(self, ambiguous_is_wide: bool) -> usize {
        match self {
            WidthClass::Zero => 0,
            WidthClass::Narrow => 1,
            WidthClass::Wide => 2,
            WidthClass::Ambiguous => {
                if ambiguous_is_wide {
                    2
                } else {
                    1
                }
            }
        }
    }

    /// Get class name as string.
    pub fn name(self) -> &'static str {
        match self {
            WidthClass::Zero => "zero",
            WidthClass::Narrow => "narrow",
            WidthClass::Wide => "wide",
            WidthClass::Ambiguous => "ambiguous",
        }
    }
}

impl TryFrom<u8> for WidthClass {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        if value > WidthClass::Ambiguous.bits() {
            return Err(Error::corrupted(format!("width class {} out of range", value)));
        }
        Ok(WidthClass::from_bits(value))
    }
}

/// A lookup slot that either settles the class or defers to a finer table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WidthSlot {
    /// Every value mapping to this slot has this class.
    Class(WidthClass),
    /// Values mapping here disagree at this granularity; descend further.
    Defer,
}

impl WidthSlot {
    /// The settled class, if any.
    #[inline]
    pub fn class(self) -> Option<WidthClass> {
        match self {
            WidthSlot::Class(class) => Some(class),
            WidthSlot::Defer => None,
        }
    }
}

/// A single domain value paired with its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entry {
    /// Domain value (codepoint).
    pub value: u32,
    /// Ground-truth class.
    pub class: WidthClass,
}

impl Entry {
    /// Create a new entry.
    #[inline]
    pub const fn new(value: u32, class: WidthClass) -> Self {
        Self { value, class }
    }
}

/// Ground-truth class for every value of a dense domain.
///
/// Immutable once built; every compressed form must answer identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedArray {
    classes: Box<[WidthClass]>,
}

impl ClassifiedArray {
    /// Wrap an array of classes indexed by domain value.
    pub fn new(classes: Vec<WidthClass>) -> Result<Self> {
        if classes.is_empty() {
            return Err(Error::DomainMismatch {
                expected: 1,
                actual: 0,
            });
        }
        if classes.len() > u32::MAX as usize {
            return Err(Error::DomainMismatch {
                expected: u32::MAX as usize,
                actual: classes.len(),
            });
        }
        Ok(Self {
            classes: classes.into_boxed_slice(),
        })
    }

    /// Wrap an array that must cover the entire Unicode codespace.
    pub fn unicode(classes: Vec<WidthClass>) -> Result<Self> {
        if classes.len() != NUM_CODEPOINTS as usize {
            return Err(Error::DomainMismatch {
                expected: NUM_CODEPOINTS as usize,
                actual: classes.len(),
            });
        }
        Self::new(classes)
    }

    /// Number of domain values.
    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always false; an empty domain is rejected at construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Domain size as a `u32`.
    #[inline]
    pub fn domain_size(&self) -> u32 {
        self.classes.len() as u32
    }

    /// Class of `value`, or `None` outside the domain.
    #[inline]
    pub fn get(&self, value: u32) -> Option<WidthClass> {
        self.classes.get(value as usize).copied()
    }

    /// The classes as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[WidthClass] {
        &self.classes
    }

    /// Iterate `(value, class)` entries in ascending value order.
    pub fn entries(&self) -> impl Iterator<Item = Entry> + '_ {
        self.classes
            .iter()
            .enumerate()
            .map(|(value, &class)| Entry::new(value as u32, class))
    }

    /// Number of maximal runs of equal class.
    pub fn run_count(&self) -> usize {
        1 + self.classes.windows(2).filter(|w| w[0] != w[1]).count()
    }

    /// Whether any two adjacent values share a class.
    pub fn has_repeated_run(&self) -> bool {
        self.classes.windows(2).any(|w| w[0] == w[1])
    }

    /// Count of values per class, indexed by discriminant.
    pub fn histogram(&self) -> [usize; 4] {
        let mut counts = [0usize; 4];
        for class in self.classes.iter() {
            counts[class.bits() as usize] += 1;
        }
        counts
    }
}

/// Size comparison between a packed table and one byte per domain value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSize {
    /// Size of the one-byte-per-value encoding.
    pub dense_size: usize,
    /// Size of the packed encoding in bytes.
    pub packed_size: usize,
}

impl TableSize {
    /// Create new size record.
    pub fn new(dense_size: usize, packed_size: usize) -> Self {
        TableSize {
            dense_size,
            packed_size,
        }
    }

    /// Calculate ratio (dense / packed). Higher is better.
    pub fn ratio(&self) -> f64 {
        if self.packed_size == 0 {
            return 0.0;
        }
        self.dense_size as f64 / self.packed_size as f64
    }

    /// Calculate space savings as percentage (0-100).
    pub fn savings_percent(&self) -> f64 {
        if self.dense_size == 0 {
            return 0.0;
        }
        (1.0 - (self.packed_size as f64 / self.dense_size as f64)) * 100.0
    }

    /// Check if packing beat the dense encoding.
    pub fn is_effective(&self) -> bool {
        self.packed_size < self.dense_size
    }
}
