use crate::error::{IndexError, Result};
use crate::index::types::{FileIndex, FileJob};
use crate::utils::tokenizer::is_separator;
use crossbeam_queue::SegQueue;
use std::fs;
use std::path::{Path, PathBuf};

/// Read an input list: a file count on the first line, then that many
/// whitespace-separated paths. List order assigns indices 1..=N.
///
/// The list is read as raw bytes, so paths need not be valid UTF-8.
pub fn read_input_list(list_path: &Path) -> Result<Vec<FileJob>> {
    let content = fs::read(list_path).map_err(|source| IndexError::InputListOpen {
        path: list_path.to_path_buf(),
        source,
    })?;
    parse_input_list(content)
}

/// Parse the contents of an input list. Paths beyond the declared count are ignored.
pub fn parse_input_list(content: impl AsRef<[u8]>) -> Result<Vec<FileJob>> {
    let content = content.as_ref();
    let (first_line, rest) = match content.iter().position(|&b| b == b'\n') {
        Some(end) => (&content[..end], &content[end + 1..]),
        None => (content, &[][..]),
    };
    let count_bytes = first_line.trim_ascii();

    if count_bytes.is_empty() {
        return Err(IndexError::MalformedInputList(
            "missing file count on first line".to_string(),
        ));
    }

    let count_str = String::from_utf8_lossy(count_bytes);
    let count: FileIndex = count_str.parse().map_err(|_| {
        IndexError::MalformedInputList(format!("file count {:?} is not a number", count_str))
    })?;

    let jobs = rest
        .split(|&b| is_separator(b))
        .filter(|token| !token.is_empty())
        .take(count as usize)
        .zip(1..)
        .map(|(token, file_index)| Ok(FileJob::new(path_from_bytes(token)?, file_index)))
        .collect::<Result<Vec<_>>>()?;

    if jobs.len() < count as usize {
        return Err(IndexError::MalformedInputList(format!(
            "declared {} files but only {} paths follow",
            count,
            jobs.len()
        )));
    }

    Ok(jobs)
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> Result<PathBuf> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    Ok(PathBuf::from(OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> Result<PathBuf> {
    std::str::from_utf8(bytes).map(PathBuf::from).map_err(|_| {
        IndexError::MalformedInputList(format!(
            "path {:?} is not valid UTF-8",
            String::from_utf8_lossy(bytes)
        ))
    })
}

/// Shared FIFO of file jobs.
///
/// Filled once before workers start; each pop hands a job to exactly one worker.
pub struct JobQueue {
    jobs: SegQueue<FileJob>,
    total: usize,
}

impl JobQueue {
    pub fn new(jobs: Vec<FileJob>) -> Self {
        let total = jobs.len();
        let queue = SegQueue::new();
        for job in jobs {
            queue.push(job);
        }
        Self { jobs: queue, total }
    }

    /// Take the next job, or `None` once the queue is drained
    pub fn try_take(&self) -> Option<FileJob> {
        self.jobs.pop()
    }

    /// Number of jobs the queue was seeded with
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
