use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::ops::Bound;
use std::path::PathBuf;

/// Position of a file in the input list, starting at 1
pub type FileIndex = u32;

/// Output bucket letters, in the order they are handed out
pub const ALPHABET: [u8; 26] = *b"abcdefghijklmnopqrstuvwxyz";

/// A file to be mapped, consumed exactly once by one map worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileJob {
    pub path: PathBuf,
    pub file_index: FileIndex,
}

impl FileJob {
    pub fn new(path: impl Into<PathBuf>, file_index: FileIndex) -> Self {
        Self {
            path: path.into(),
            file_index,
        }
    }
}

/// Words present in a single file.
///
/// Presence only: a word seen many times in the file is recorded once.
#[derive(Debug, Clone)]
pub struct PartialIndex {
    file_index: FileIndex,
    words: AHashSet<String>,
}

impl PartialIndex {
    pub fn new(file_index: FileIndex) -> Self {
        Self {
            file_index,
            words: AHashSet::new(),
        }
    }

    /// Record a word, returns false if it was already present
    pub fn insert(&mut self, word: String) -> bool {
        self.words.insert(word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn file_index(&self) -> FileIndex {
        self.file_index
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Word -> ascending, duplicate-free list of file indices.
///
/// Every fragment in the store has this shape; a single partial index is the
/// degenerate case where every list has one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalIndex {
    postings: BTreeMap<String, Vec<FileIndex>>,
}

impl GlobalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<&[FileIndex]> {
        self.postings.get(word).map(Vec::as_slice)
    }

    /// Entries in ascending word order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FileIndex])> {
        self.postings.iter().map(|(w, ids)| (w.as_str(), ids.as_slice()))
    }

    /// Combine two fragments built from disjoint sets of files.
    ///
    /// Words found in one side keep their list; words found in both get the
    /// concatenation, re-sorted. Commutative and associative.
    pub fn merge(self, other: GlobalIndex) -> GlobalIndex {
        // Fold the smaller map into the larger one
        let (mut into, from) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };

        for (word, indices) in from.postings {
            match into.postings.entry(word) {
                Entry::Vacant(slot) => {
                    slot.insert(indices);
                }
                Entry::Occupied(mut slot) => {
                    let list = slot.get_mut();
                    list.extend(indices);
                    list.sort_unstable();
                    debug_assert!(
                        list.windows(2).all(|w| w[0] < w[1]),
                        "file index merged twice for one word"
                    );
                }
            }
        }

        into
    }

    /// Remove and return every entry whose word starts with `letter`.
    ///
    /// Keys are ordered, so the scan starts at the letter and stops at the
    /// first word beyond it.
    pub fn take_letter(&mut self, letter: u8) -> Vec<BucketEntry> {
        let start = char::from(letter).to_string();
        let matched: Vec<String> = self
            .postings
            .range::<str, _>((Bound::Included(start.as_str()), Bound::Unbounded))
            .take_while(|(word, _)| word.as_bytes().first() == Some(&letter))
            .map(|(word, _)| word.clone())
            .collect();

        matched
            .into_iter()
            .filter_map(|word| self.postings.remove_entry(&word))
            .map(|(word, file_indices)| BucketEntry { word, file_indices })
            .collect()
    }
}

impl From<PartialIndex> for GlobalIndex {
    fn from(partial: PartialIndex) -> Self {
        let file_index = partial.file_index;
        let postings = partial
            .words
            .into_iter()
            .map(|word| (word, vec![file_index]))
            .collect();
        Self { postings }
    }
}

impl FromIterator<(String, Vec<FileIndex>)> for GlobalIndex {
    fn from_iter<I: IntoIterator<Item = (String, Vec<FileIndex>)>>(iter: I) -> Self {
        Self {
            postings: iter.into_iter().collect(),
        }
    }
}

/// One line of an output bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketEntry {
    pub word: String,
    pub file_indices: Vec<FileIndex>,
}

impl fmt::Display for BucketEntry {
    /// `word:[1 2 3]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:[", self.word)?;
        for (i, idx) in self.file_indices.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", idx)?;
        }
        f.write_str("]")
    }
}

/// Order bucket entries by descending file count, then ascending word
pub fn sort_bucket(entries: &mut [BucketEntry]) {
    entries.sort_by(|a, b| {
        b.file_indices
            .len()
            .cmp(&a.file_indices.len())
            .then_with(|| a.word.cmp(&b.word))
    });
}

/// Configuration for an indexing run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory receiving the per-letter artifacts
    pub output_dir: PathBuf,
    /// Artifact extension, `a.<extension>`
    pub extension: String,
    /// Draw a progress bar while mapping
    pub show_progress: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            extension: "txt".to_string(),
            show_progress: true,
        }
    }
}

impl IndexConfig {
    /// Path of the artifact for `letter`
    pub fn bucket_path(&self, letter: u8) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", char::from(letter), self.extension))
    }
}

/// Result of mapping one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// File was read; `words` distinct words were published
    Indexed { words: usize },
    /// File could not be read and contributes nothing
    Skipped { error: String },
}

/// A file left out of the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub file_index: FileIndex,
    pub reason: String,
}

/// Work done by one map worker
#[derive(Debug, Clone, Default)]
pub struct MapperStats {
    pub jobs: usize,
    pub indexed: usize,
    pub skipped: Vec<SkippedFile>,
}

/// One artifact written by a bucket writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSummary {
    pub letter: char,
    pub entries: usize,
    pub path: PathBuf,
}

/// Work done by one reduce worker
#[derive(Debug, Clone, Default)]
pub struct ReducerStats {
    pub merges: usize,
    pub buckets: Vec<BucketSummary>,
}

/// Summary of a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub map_threads: usize,
    pub reduce_threads: usize,
    pub total_files: usize,
    /// Jobs taken off the queue across all map workers
    pub jobs_consumed: usize,
    pub indexed_files: usize,
    pub skipped: Vec<SkippedFile>,
    pub distinct_words: usize,
    pub merges: usize,
    /// Sorted by letter
    pub buckets: Vec<BucketSummary>,
    pub elapsed_ms: u64,
}
