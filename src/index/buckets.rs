use crate::error::{IndexError, Result};
use crate::index::types::{
    sort_bucket, BucketEntry, BucketSummary, GlobalIndex, IndexConfig, ALPHABET,
};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

struct BucketState {
    letters: VecDeque<u8>,
    index: GlobalIndex,
}

/// Letters still to be written, together with the index they are cut from.
///
/// Both live behind one lock: claiming a letter and extracting its entries
/// is a single step, so no two writers ever see the same word.
pub struct BucketQueue {
    state: Mutex<BucketState>,
}

impl Default for BucketQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl BucketQueue {
    /// Queue holding all 26 letters and an empty index
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BucketState {
                letters: ALPHABET.iter().copied().collect(),
                index: GlobalIndex::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand the merged index over to the writers
    pub fn install(&self, index: GlobalIndex) {
        self.lock().index = index;
    }

    /// Claim the next letter and remove its entries from the index
    pub fn claim(&self) -> Option<(u8, Vec<BucketEntry>)> {
        let mut state = self.lock();
        let letter = state.letters.pop_front()?;
        let entries = state.index.take_letter(letter);
        Some((letter, entries))
    }

    pub fn remaining_letters(&self) -> usize {
        self.lock().letters.len()
    }

    /// Words not yet claimed by any writer
    pub fn remaining_words(&self) -> usize {
        self.lock().index.len()
    }
}

/// Write one artifact, one `word:[i1 i2 ...]` record per line.
///
/// An empty entry list still creates an (empty) file.
pub fn write_bucket(path: &Path, entries: &[BucketEntry]) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    for entry in entries {
        writeln!(file, "{}", entry)?;
    }
    file.flush()
}

/// Bucket writer loop: claim letters until none are left.
///
/// The queue lock is held only while claiming; sorting and file I/O run
/// outside it.
pub fn run_writer(queue: &BucketQueue, config: &IndexConfig) -> Result<Vec<BucketSummary>> {
    let mut written = Vec::new();

    while let Some((letter, mut entries)) = queue.claim() {
        sort_bucket(&mut entries);

        let path = config.bucket_path(letter);
        write_bucket(&path, &entries).map_err(|source| IndexError::BucketWrite {
            path: path.clone(),
            source,
        })?;

        debug!(letter = %char::from(letter), entries = entries.len(), "Wrote bucket");
        written.push(BucketSummary {
            letter: char::from(letter),
            entries: entries.len(),
            path,
        });
    }

    Ok(written)
}
