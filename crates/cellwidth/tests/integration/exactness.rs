//! Every encoding must answer identically to the ground truth.

use cellwidth::{
    build_cascade, CascadeBuilder, CascadeConfig, FrontedEncoder, RangeEncoder,
    SearchTreeEncoder, TableEncoder, WidthClass, WidthTable, NUM_CODEPOINTS,
};

use crate::fixtures::unicode_classes;

#[test]
fn test_packed_cascade_exact() {
    let classes = unicode_classes();
    let cascade = build_cascade(classes, &CascadeConfig::default()).unwrap();
    let packed = cascade.pack().unwrap();

    packed.verify(classes).unwrap();
    for value in (0..NUM_CODEPOINTS).step_by(97) {
        assert_eq!(cascade.class_of(value), packed.class_of(value));
    }
    assert_eq!(packed.class_of(NUM_CODEPOINTS), None);
}

#[test]
fn test_range_table_exact() {
    let classes = unicode_classes();
    let table = RangeEncoder.encode(classes).unwrap();
    assert_eq!(table.runs(), classes.run_count());
    table.verify(classes).unwrap();
}

#[test]
fn test_search_tree_exact() {
    let classes = unicode_classes();
    let tree = SearchTreeEncoder.encode(classes).unwrap();
    tree.verify(classes).unwrap();
    assert_eq!(tree.encoded_size() % 64, 0);
}

#[test]
fn test_fronted_table_exact() {
    let classes = unicode_classes();
    // One slot per plane.
    let bits: Vec<u8> = (16..21).collect();
    let table = FrontedEncoder::new(bits, CascadeConfig::default())
        .unwrap()
        .encode(classes)
        .unwrap();
    table.verify(classes).unwrap();

    // Planes 4..=13 hold nothing but unlisted narrow values.
    assert_eq!(table.lut().lookup(0x40000).class(), Some(WidthClass::Narrow));
    assert_eq!(table.lut().lookup(0xE0000).class(), None);
}

#[test]
fn test_decoded_widths() {
    let table = CascadeBuilder::default().encode(unicode_classes()).unwrap();

    assert_eq!(table.width('\0'), Some(0));
    assert_eq!(table.width('\u{7}'), None);
    assert_eq!(table.width('\u{85}'), None);
    assert_eq!(table.width('a'), Some(1));
    assert_eq!(table.width('é'), Some(1));
    assert_eq!(table.width('\u{301}'), Some(0));
    assert_eq!(table.width('你'), Some(2));
    assert_eq!(table.width('한'), Some(2));
    assert_eq!(table.width('Ａ'), Some(2));
    assert_eq!(table.width('ｱ'), Some(1));
    assert_eq!(table.width('\u{3099}'), Some(0));
    assert_eq!(table.width('\u{E0100}'), Some(0));
    assert_eq!(table.width('\u{20000}'), Some(2));
    assert_eq!(table.width('\u{10FFFF}'), Some(1));
}

#[test]
fn test_fixed_overrides_survive_compression() {
    let table = CascadeBuilder::default().encode(unicode_classes()).unwrap();

    // Soft hyphen is a format character but renders narrow.
    assert_eq!(table.width('\u{AD}'), Some(1));
    // Hangul medial vowels are wide by East Asian Width but join the syllable.
    assert_eq!(table.width('\u{115F}'), Some(2));
    for value in 0x1160..=0x11FF {
        let c = char::from_u32(value).unwrap();
        assert_eq!(table.width(c), Some(0), "U+{value:04X}");
    }
}

#[test]
fn test_ambiguous_resolution() {
    let classes = unicode_classes();
    let table = CascadeBuilder::default().encode(classes).unwrap();

    let ambiguous: Vec<char> = classes
        .entries()
        .filter(|e| e.class == WidthClass::Ambiguous)
        .filter_map(|e| char::from_u32(e.value))
        .collect();
    assert!(!ambiguous.is_empty());
    for c in ambiguous {
        assert_eq!(table.width(c), Some(1), "{c:?}");
        assert_eq!(table.width_cjk(c), Some(2), "{c:?}");
    }
}

#[test]
fn test_str_width() {
    let table = CascadeBuilder::default().encode(unicode_classes()).unwrap();
    assert_eq!(table.str_width("hello 你好", false), 10);
    assert_eq!(table.str_width("e\u{301}", false), 1);
    assert_eq!(table.str_width("Ω\u{7}", false), 1);
    assert_eq!(table.str_width("Ω\u{7}", true), 2);
}

#[test]
fn test_compaction() {
    let classes = unicode_classes();
    let cascade = build_cascade(classes, &CascadeConfig::default()).unwrap();
    let packed = cascade.pack().unwrap();

    for (level, stats) in cascade.stats().levels.iter().enumerate() {
        assert!(
            stats.retained_buckets <= stats.raw_buckets,
            "level {level}: {stats:?}"
        );
    }
    assert!(cascade.stats().total_merges() > 0);
    assert_eq!(packed.encoded_size(), cascade.stats().packed_bytes());
    assert!(packed.size().is_effective());
    assert!(packed.encoded_size() < 16 * 1024, "{}", packed.encoded_size());
}
