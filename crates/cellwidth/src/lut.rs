//! Masked lookup tables placed in front of a cascade.
//!
//! A [`MaskedLut`] keys a small dense table by a handful of selected value
//! bits. A slot whose values all share one class answers directly; every
//! other slot defers to the cascade behind it. [`analyze_mask`] and
//! [`find_lut_bits`] measure and choose the bits.

use std::fmt;

use cellwidth_core::{
    required_bits, CascadeConfig, ClassifiedArray, Error, Result, TableEncoder, WidthClass,
    WidthSlot, WidthTable,
};
use tracing::debug;

use crate::cascade::CascadeBuilder;
use crate::decode::PackedCascade;

/// Most key bits a [`MaskedLut`] may select.
pub const MAX_LUT_BITS: usize = 16;

const PRINTABLE_ASCII: std::ops::Range<u32> = 0x20..0x7F;

/// How well a bit mask separates the classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaskAnalysis {
    /// Compressed values inside `0x20..0x7F`.
    pub num_printable_ascii: usize,
    /// Compressed values across the whole domain.
    pub num_compressed: usize,
    /// Values analyzed.
    pub domain_size: usize,
}

impl MaskAnalysis {
    /// Fraction of printable ASCII that is compressed, in percent.
    pub fn ascii_percent(&self) -> f64 {
        let total = (PRINTABLE_ASCII.end - PRINTABLE_ASCII.start) as f64;
        100.0 * self.num_printable_ascii as f64 / total
    }

    /// Fraction of the domain that is compressed, in percent.
    pub fn total_percent(&self) -> f64 {
        if self.domain_size == 0 {
            return 0.0;
        }
        100.0 * self.num_compressed as f64 / self.domain_size as f64
    }
}

impl fmt::Display for MaskAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}% printable ASCII compressed ({}/{}), {:.2}% total ({}/{})",
            self.ascii_percent(),
            self.num_printable_ascii,
            PRINTABLE_ASCII.end - PRINTABLE_ASCII.start,
            self.total_percent(),
            self.num_compressed,
            self.domain_size
        )
    }
}

/// Measure how many values a mask compresses.
///
/// Each value ORs `1 << class` into the slot at `value & mask`. A value is
/// compressed when its slot ends up with exactly one bit set.
pub fn analyze_mask(classes: &ClassifiedArray, mask: u32) -> MaskAnalysis {
    let mut slots = vec![0u8; classes.len()];
    for entry in classes.entries() {
        slots[(entry.value & mask) as usize] |= 1 << entry.class.bits();
    }

    let mut analysis = MaskAnalysis {
        domain_size: classes.len(),
        ..MaskAnalysis::default()
    };
    for value in 0..classes.domain_size() {
        if slots[(value & mask) as usize].is_power_of_two() {
            analysis.num_compressed += 1;
            if PRINTABLE_ASCII.contains(&value) {
                analysis.num_printable_ascii += 1;
            }
        }
    }
    analysis
}

/// Choose `num_bits` key bits greedily.
///
/// Each round adds the bit that maximizes the compressed count; ties go to
/// the lower bit. The result is sorted ascending.
///
/// This is a heuristic. It scores `num_bits` rounds of single-bit additions
/// instead of every `num_bits`-subset of the domain bits, so a pair of bits
/// that only separates the classes together can be missed. Callers that need
/// the best mask can score candidate subsets with [`analyze_mask`].
pub fn find_lut_bits(classes: &ClassifiedArray, num_bits: usize) -> Result<Vec<u8>> {
    let domain_bits = required_bits(classes.domain_size());
    if num_bits > MAX_LUT_BITS || num_bits > domain_bits as usize {
        return Err(Error::config(format!(
            "cannot select {} LUT bits from a {}-bit domain (max {})",
            num_bits, domain_bits, MAX_LUT_BITS
        )));
    }

    let mut chosen: Vec<u8> = Vec::with_capacity(num_bits);
    let mut mask = 0u32;
    for round in 0..num_bits {
        let mut best: Option<(u8, MaskAnalysis)> = None;
        for bit in (0..domain_bits).filter(|b| !chosen.contains(b)) {
            let analysis = analyze_mask(classes, mask | (1 << bit));
            if best.map_or(true, |(_, b)| analysis.num_compressed > b.num_compressed) {
                best = Some((bit, analysis));
            }
        }
        let Some((bit, analysis)) = best else {
            break;
        };
        debug!("LUT round {}: bit {} -> {}", round, bit, analysis);
        chosen.push(bit);
        mask |= 1 << bit;
    }

    chosen.sort_unstable();
    Ok(chosen)
}

/// Dense slot table keyed by selected value bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedLut {
    domain_size: u32,
    bits: Vec<u8>,
    slots: Vec<WidthSlot>,
}

impl MaskedLut {
    /// Build a table over `bits`.
    ///
    /// Slot `i` holds the class shared by every value whose selected bits
    /// gather to `i`, or [`WidthSlot::Defer`] when they disagree.
    pub fn build(classes: &ClassifiedArray, bits: &[u8]) -> Result<Self> {
        let domain_bits = required_bits(classes.domain_size());
        if bits.len() > MAX_LUT_BITS {
            return Err(Error::config(format!(
                "{} LUT bits exceeds the maximum of {}",
                bits.len(),
                MAX_LUT_BITS
            )));
        }
        for (i, &bit) in bits.iter().enumerate() {
            if bit >= domain_bits {
                return Err(Error::config(format!(
                    "LUT bit {} outside the {}-bit domain",
                    bit, domain_bits
                )));
            }
            if bits[..i].contains(&bit) {
                return Err(Error::config(format!("LUT bit {} selected twice", bit)));
            }
        }

        let mut seen = vec![0u8; 1 << bits.len()];
        for entry in classes.entries() {
            seen[gather(entry.value, bits)] |= 1 << entry.class.bits();
        }
        let slots = seen
            .into_iter()
            .map(|mask| {
                if mask.is_power_of_two() {
                    WidthSlot::Class(WidthClass::from_bits(mask.trailing_zeros() as u8))
                } else {
                    WidthSlot::Defer
                }
            })
            .collect();

        Ok(Self {
            domain_size: classes.domain_size(),
            bits: bits.to_vec(),
            slots,
        })
    }

    /// Domain the table was built over.
    pub fn domain_size(&self) -> u32 {
        self.domain_size
    }

    /// Selected bits, in gather order.
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// Mask with every selected bit set.
    pub fn mask(&self) -> u32 {
        self.bits.iter().fold(0, |mask, &bit| mask | (1 << bit))
    }

    pub fn slots(&self) -> &[WidthSlot] {
        &self.slots
    }

    /// Slots that defer to the fallback.
    pub fn deferred(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, WidthSlot::Defer))
            .count()
    }

    #[inline]
    pub fn lookup(&self, value: u32) -> WidthSlot {
        self.slots[gather(value, &self.bits)]
    }

    /// One byte per slot.
    pub fn encoded_size(&self) -> usize {
        self.slots.len()
    }
}

/// Collect the selected bits of `value` into the low bits of an index.
#[inline]
fn gather(value: u32, bits: &[u8]) -> usize {
    bits.iter()
        .enumerate()
        .fold(0, |index, (i, &bit)| index | ((((value >> bit) & 1) as usize) << i))
}

/// A [`MaskedLut`] answering first, with a [`PackedCascade`] behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontedTable {
    lut: MaskedLut,
    cascade: PackedCascade,
}

impl FrontedTable {
    /// Pair a LUT with the cascade it defers to. Both must cover the same domain.
    pub fn new(lut: MaskedLut, cascade: PackedCascade) -> Result<Self> {
        if lut.domain_size() != cascade.domain_size() {
            return Err(Error::DomainMismatch {
                expected: cascade.domain_size() as usize,
                actual: lut.domain_size() as usize,
            });
        }
        Ok(Self { lut, cascade })
    }

    pub fn lut(&self) -> &MaskedLut {
        &self.lut
    }

    pub fn cascade(&self) -> &PackedCascade {
        &self.cascade
    }
}

impl WidthTable for FrontedTable {
    fn domain_size(&self) -> u32 {
        self.cascade.domain_size()
    }

    fn class_of(&self, value: u32) -> Option<WidthClass> {
        if value >= self.domain_size() {
            return None;
        }
        match self.lut.lookup(value) {
            WidthSlot::Class(class) => Some(class),
            WidthSlot::Defer => self.cascade.class_of(value),
        }
    }

    fn encoded_size(&self) -> usize {
        self.lut.encoded_size() + self.cascade.encoded_size()
    }
}

/// Builds [`FrontedTable`]s from a fixed bit selection and cascade layout.
#[derive(Debug, Clone)]
pub struct FrontedEncoder {
    lut_bits: Vec<u8>,
    builder: CascadeBuilder,
}

impl FrontedEncoder {
    pub fn new(lut_bits: Vec<u8>, config: CascadeConfig) -> Result<Self> {
        Ok(Self {
            lut_bits,
            builder: CascadeBuilder::new(config)?,
        })
    }
}

impl TableEncoder for FrontedEncoder {
    type Table = FrontedTable;

    fn encode(&self, classes: &ClassifiedArray) -> Result<FrontedTable> {
        let lut = MaskedLut::build(classes, &self.lut_bits)?;
        let cascade = self.builder.encode(classes)?;
        debug!(
            "LUT over bits {:?}: {}/{} slots deferred",
            lut.bits(),
            lut.deferred(),
            lut.slots().len()
        );
        FrontedTable::new(lut, cascade)
    }
}

// =============================================================================
// Tests
// =============================================================================
