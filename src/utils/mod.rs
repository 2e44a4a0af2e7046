//! Utility functions and data structures.
//!
//! This module provides shared utilities used by the index pipeline:
//!
//! ## Modules
//!
//! - [`app_data`] - Config file location and loading
//! - [`progress`] - Progress bar facade (no-op without the `progress` feature)
//! - [`rendezvous`] - Abortable one-shot barrier with a release action
//! - [`tokenizer`] - Line to normalized word splitting
//!
//! ## Key Functions
//!
//! ```
//! use invindex::utils::tokenize_line;
//!
//! let words: Vec<String> = tokenize_line(b"Hello, world! 42").collect();
//! assert_eq!(words, vec!["hello", "world"]);
//! ```

pub mod app_data;
pub mod progress;
pub mod rendezvous;
pub mod tokenizer;

pub use app_data::*;
pub use rendezvous::{AbortOnPanic, Aborted, Rendezvous};
pub use tokenizer::*;
