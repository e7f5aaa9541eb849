#![no_main]

use libfuzzer_sys::fuzz_target;
use onboard_vfs::{clean_path, logical_name, logical_segments};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let cleaned = clean_path(&raw);
    assert_eq!(clean_path(&cleaned), cleaned);
    assert!(!cleaned.is_empty());

    let segments = logical_segments(&raw);
    assert!(segments
        .iter()
        .all(|segment| !segment.is_empty() && segment != "." && segment != ".."));
    assert!(!logical_name(&raw, None).starts_with('/'));
});
