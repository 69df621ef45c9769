use std::sync::OnceLock;

use cellwidth::{CategoryRecord, ClassifiedArray, EastAsianWidth, WidthClassifier, WidthRecord};
use EastAsianWidth::*;

/// East Asian Width ranges, ascending.
pub const WIDTHS: &[WidthRecord] = &[
    WidthRecord::new(0x0020, 0x007E, Narrow),
    WidthRecord::new(0x00A1, 0x00A1, Ambiguous),
    WidthRecord::new(0x00A7, 0x00A8, Ambiguous),
    WidthRecord::new(0x00B0, 0x00B4, Ambiguous),
    WidthRecord::new(0x0391, 0x03A9, Ambiguous),
    WidthRecord::new(0x1100, 0x115F, Wide),
    WidthRecord::new(0x1160, 0x11FF, Neutral),
    WidthRecord::new(0x2010, 0x2010, Ambiguous),
    WidthRecord::new(0x2E80, 0x303E, Wide),
    WidthRecord::new(0x3041, 0x33FF, Wide),
    WidthRecord::new(0x3400, 0x4DBF, Wide),
    WidthRecord::new(0x4E00, 0x9FFF, Wide),
    WidthRecord::new(0xAC00, 0xD7A3, Wide),
    WidthRecord::new(0xE000, 0xF8FF, Ambiguous),
    WidthRecord::new(0xFF01, 0xFF60, Fullwidth),
    WidthRecord::new(0xFF61, 0xFFDC, Halfwidth),
    WidthRecord::new(0x1F300, 0x1F64F, Wide),
    WidthRecord::new(0x20000, 0x2FFFD, Wide),
    WidthRecord::new(0x30000, 0x3FFFD, Wide),
    WidthRecord::new(0xF0000, 0xFFFFD, Ambiguous),
    WidthRecord::new(0x100000, 0x10FFFD, Ambiguous),
];

/// General category ranges, ascending.
pub fn categories() -> Vec<CategoryRecord> {
    vec![
        CategoryRecord::new(0x0000, 0x001F, "Cc"),
        CategoryRecord::new(0x0041, 0x005A, "Lu"),
        CategoryRecord::new(0x007F, 0x009F, "Cc"),
        CategoryRecord::new(0x00AD, 0x00AD, "Cf"),
        CategoryRecord::new(0x0300, 0x036F, "Mn"),
        CategoryRecord::new(0x0483, 0x0487, "Mn"),
        CategoryRecord::new(0x0488, 0x0489, "Me"),
        CategoryRecord::new(0x0591, 0x05BD, "Mn"),
        CategoryRecord::new(0x1160, 0x1160, "Lo"),
        CategoryRecord::new(0x200B, 0x200F, "Cf"),
        CategoryRecord::new(0x20D0, 0x20DC, "Mn"),
        CategoryRecord::new(0x20DD, 0x20E0, "Me"),
        CategoryRecord::new(0x3099, 0x309A, "Mn"),
        CategoryRecord::new(0x3400, 0x4DBF, "Lo"),
        CategoryRecord::new(0xFE00, 0xFE0F, "Mn"),
        CategoryRecord::new(0xFEFF, 0xFEFF, "Cf"),
        CategoryRecord::new(0x1D167, 0x1D169, "Mn"),
        CategoryRecord::new(0xE0001, 0xE0001, "Cf"),
        CategoryRecord::new(0xE0100, 0xE01EF, "Mn"),
    ]
}

/// The classified fixture, built once per test binary.
pub fn unicode_classes() -> &'static ClassifiedArray {
    static CLASSES: OnceLock<ClassifiedArray> = OnceLock::new();
    CLASSES.get_or_init(|| {
        WidthClassifier::unicode()
            .classify(WIDTHS, &categories())
            .expect("fixture records are well-formed")
    })
}
