use crate::index::jobs::JobQueue;
use crate::index::merge::FragmentStore;
use crate::index::types::{FileJob, FileOutcome, MapperStats, PartialIndex, SkippedFile};
use crate::utils::progress::ProgressBar;
use crate::utils::tokenize_line;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use tracing::{debug, warn};

/// Build the partial index of one file, streaming it line by line
pub fn index_file(job: &FileJob) -> io::Result<PartialIndex> {
    let mut reader = BufReader::new(File::open(&job.path)?);
    let mut partial = PartialIndex::new(job.file_index);
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        for word in tokenize_line(&line) {
            partial.insert(word);
        }
    }

    Ok(partial)
}

/// Map one job and publish its partial index.
///
/// A file that cannot be read publishes nothing and is reported as skipped.
pub fn map_file(job: &FileJob, store: &FragmentStore) -> FileOutcome {
    match index_file(job) {
        Ok(partial) => {
            let words = partial.len();
            debug!(file_index = job.file_index, path = %job.path.display(), words, "Mapped file");
            store.publish(partial.into());
            FileOutcome::Indexed { words }
        }
        Err(e) => {
            warn!(
                file_index = job.file_index,
                path = %job.path.display(),
                error = %e,
                "Skipping unreadable file"
            );
            FileOutcome::Skipped { error: e.to_string() }
        }
    }
}

/// Map worker loop: drain the queue, one partial index per file
pub fn run_mapper(
    queue: &JobQueue,
    store: &FragmentStore,
    progress: Option<&ProgressBar>,
) -> MapperStats {
    let mut stats = MapperStats::default();

    while let Some(job) = queue.try_take() {
        stats.jobs += 1;

        match map_file(&job, store) {
            FileOutcome::Indexed { .. } => stats.indexed += 1,
            FileOutcome::Skipped { error } => stats.skipped.push(SkippedFile {
                path: job.path,
                file_index: job.file_index,
                reason: error,
            }),
        }

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> FileJob {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        FileJob::new(path, 1)
    }

    #[test]
    fn test_index_file_dedups_words() {
        let dir = TempDir::new().unwrap();
        let job = write_file(&dir, "a.txt", "The cat\nthe CAT sat.\n\nthe");
        let partial = index_file(&job).unwrap();

        assert_eq!(partial.len(), 3);
        assert!(partial.contains("the"));
        assert!(partial.contains("cat"));
        assert!(partial.contains("sat"));
    }

    #[test]
    fn test_index_file_without_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let job = write_file(&dir, "a.txt", "alpha\nbeta");
        let partial = index_file(&job).unwrap();
        assert!(partial.contains("beta"));
    }

    #[test]
    fn test_map_missing_file_is_skipped() {
        let store = FragmentStore::new();
        let job = FileJob::new("/nonexistent/invindex/missing.txt", 4);

        let outcome = map_file(&job, &store);
        assert!(matches!(outcome, FileOutcome::Skipped { .. }));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_run_mapper_drains_queue() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "one two").unwrap();
        fs::write(&b, "two three").unwrap();

        let queue = JobQueue::new(vec![
            FileJob::new(&a, 1),
            FileJob::new(dir.path().join("missing.txt"), 2),
            FileJob::new(&b, 3),
        ]);
        let store = FragmentStore::new();

        let stats = run_mapper(&queue, &store, None);
        assert_eq!(stats.jobs, 3);
        assert_eq!(stats.indexed, 2);
        assert_eq!(stats.skipped.len(), 1);
        assert_eq!(stats.skipped[0].file_index, 2);
        assert!(queue.is_empty());
        assert_eq!(store.len(), 2);
    }
}
