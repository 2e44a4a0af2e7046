//! # invindex - Parallel Inverted Index Builder
//!
//! invindex builds an inverted index (word -> sorted list of the files it
//! occurs in) from a list of text files, then writes it out as one bucket
//! file per starting letter.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`index`] - The two-phase map/reduce engine and its data model
//! - [`utils`] - Tokenizer, rendezvous barrier, progress and config helpers
//! - [`error`] - Error type shared by the engine
//!
//! A run uses a fixed pool of OS threads in two roles:
//!
//! 1. **Map workers** drain a shared job queue, turning each file into a
//!    partial index (the set of words it contains).
//! 2. **Reduce workers** wait for every map worker at the phase barrier,
//!    cooperatively merge the partial indexes pairwise into one global index,
//!    meet again at the completion barrier, then claim letters `a..z` and
//!    write each letter's entries to `<letter>.<ext>`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use invindex::index::{build_index, IndexConfig};
//! use std::path::Path;
//!
//! let config = IndexConfig::default();
//! let report = build_index(Path::new("input.txt"), 4, 2, &config).unwrap();
//!
//! println!("{} words from {} files", report.distinct_words, report.indexed_files);
//! ```
//!
//! ## Output Format
//!
//! Each bucket holds one `word:[i1 i2 ... in]` record per line, file indices
//! ascending. Records are ordered by descending number of files, then
//! alphabetically.

pub mod error;
pub mod index;
pub mod utils;

pub use error::{IndexError, Result};
