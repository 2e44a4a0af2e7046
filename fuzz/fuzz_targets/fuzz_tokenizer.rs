#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes, including invalid UTF-8, must only ever yield
    // non-empty lowercase ASCII words
    for word in invindex::utils::tokenize_line(data) {
        assert!(!word.is_empty());
        assert!(word.bytes().all(|b| b.is_ascii_lowercase()));
    }
});
