pub mod buckets;
pub mod build;
pub mod jobs;
pub mod map;
pub mod merge;
pub mod stats;
pub mod types;

pub use build::{build_index, run_pipeline};
pub use merge::FragmentStore;
pub use types::*;
