#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing must not panic; accepted lists are numbered 1..=N in order
    if let Ok(jobs) = invindex::index::jobs::parse_input_list(data) {
        for (i, job) in jobs.iter().enumerate() {
            assert_eq!(job.file_index as usize, i + 1);
        }
    }
});
