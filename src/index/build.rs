//! Two-phase run: map workers fill the fragment store, reduce workers merge
//! it and write the letter buckets.
//!
//! ```text
//! map worker:    MAPPING -> phase barrier -> DONE
//! reduce worker: phase barrier -> MERGING -> completion barrier -> WRITING -> DONE
//! ```
//!
//! The phase barrier is sized for every worker, the completion barrier for
//! reduce workers only. All workers run inside one thread scope, so every
//! exit path joins them.

use crate::error::{IndexError, Result};
use crate::index::buckets::{run_writer, BucketQueue};
use crate::index::jobs::{read_input_list, JobQueue};
use crate::index::map::run_mapper;
use crate::index::merge::FragmentStore;
use crate::index::types::{FileJob, IndexConfig, MapperStats, ReducerStats, RunReport};
use crate::utils::progress::{file_progress, ProgressBar};
use crate::utils::rendezvous::{AbortOnPanic, Rendezvous};
use std::fs;
use std::path::Path;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;
use tracing::{debug, info};

/// Shared state handed to every worker
struct Pipeline<'a> {
    config: &'a IndexConfig,
    map_threads: usize,
    reduce_threads: usize,
    queue: JobQueue,
    store: FragmentStore,
    buckets: BucketQueue,
    phase: Rendezvous,
    completion: Rendezvous,
    progress: Option<ProgressBar>,
    #[cfg(test)]
    fail_first_mapper: AtomicBool,
}

impl<'a> Pipeline<'a> {
    fn new(
        jobs: Vec<FileJob>,
        map_threads: usize,
        reduce_threads: usize,
        config: &'a IndexConfig,
    ) -> Self {
        let progress = file_progress(jobs.len(), config.show_progress);
        Self {
            config,
            map_threads,
            reduce_threads,
            queue: JobQueue::new(jobs),
            store: FragmentStore::new(),
            buckets: BucketQueue::new(),
            phase: Rendezvous::new("phase barrier", map_threads + reduce_threads),
            completion: Rendezvous::new("completion barrier", reduce_threads),
            progress,
            #[cfg(test)]
            fail_first_mapper: AtomicBool::new(false),
        }
    }

    fn map_worker(&self) -> Result<MapperStats> {
        let _guard = AbortOnPanic::new([&self.phase, &self.completion]);

        #[cfg(test)]
        if self.fail_first_mapper.swap(false, Ordering::SeqCst) {
            panic!("map worker failed before the phase barrier");
        }

        let stats = run_mapper(&self.queue, &self.store, self.progress.as_ref());
        debug!(jobs = stats.jobs, "Map worker drained queue");

        self.phase
            .wait()
            .map_err(|_| IndexError::Aborted(self.phase.name()))?;
        Ok(stats)
    }

    fn reduce_worker(&self) -> Result<ReducerStats> {
        let _guard = AbortOnPanic::new([&self.phase, &self.completion]);

        self.phase
            .wait()
            .map_err(|_| IndexError::Aborted(self.phase.name()))?;

        let merges = self.store.reduce();

        // The last reducer through moves the merged index to the writers
        self.completion
            .wait_then(|| {
                let global = self.store.take_global();
                info!(words = global.len(), "Global index merged");
                self.buckets.install(global);
            })
            .map_err(|_| IndexError::Aborted(self.completion.name()))?;

        let buckets = run_writer(&self.buckets, self.config)?;
        Ok(ReducerStats { merges, buckets })
    }

    fn abort(&self) {
        self.phase.abort();
        self.completion.abort();
    }

    /// Spawn every worker, then join them all
    fn run(&self) -> Result<(Vec<MapperStats>, Vec<ReducerStats>)> {
        thread::scope(|s| {
            let mut spawn_error = None;
            let mut mappers = Vec::with_capacity(self.map_threads);
            let mut reducers = Vec::with_capacity(self.reduce_threads);

            for id in 0..self.map_threads {
                let name = format!("map-{}", id);
                match thread::Builder::new()
                    .name(name.clone())
                    .spawn_scoped(s, || self.map_worker())
                {
                    Ok(handle) => mappers.push((name, handle)),
                    Err(source) => {
                        spawn_error = Some(IndexError::Spawn { name, source });
                        break;
                    }
                }
            }

            if spawn_error.is_none() {
                for id in 0..self.reduce_threads {
                    let name = format!("reduce-{}", id);
                    match thread::Builder::new()
                        .name(name.clone())
                        .spawn_scoped(s, || self.reduce_worker())
                    {
                        Ok(handle) => reducers.push((name, handle)),
                        Err(source) => {
                            spawn_error = Some(IndexError::Spawn { name, source });
                            break;
                        }
                    }
                }
            }

            if spawn_error.is_some() {
                // Started workers would otherwise wait for peers that never came
                self.abort();
            }

            let mut failure = spawn_error;
            let map_stats = join_all(mappers, &mut failure);
            let reduce_stats = join_all(reducers, &mut failure);

            match failure {
                Some(err) => Err(err),
                None => Ok((map_stats, reduce_stats)),
            }
        })
    }
}

/// Join workers, keeping the most relevant failure
fn join_all<T>(
    handles: Vec<(String, ScopedJoinHandle<'_, Result<T>>)>,
    failure: &mut Option<IndexError>,
) -> Vec<T> {
    let mut results = Vec::with_capacity(handles.len());

    for (name, handle) in handles {
        let err = match handle.join() {
            Ok(Ok(stats)) => {
                results.push(stats);
                continue;
            }
            Ok(Err(err)) => err,
            Err(_) => IndexError::WorkerPanicked(name),
        };

        // An abort is only a symptom; keep the error that caused it
        let replace = match failure {
            None => true,
            Some(current) => current.is_secondary() && !err.is_secondary(),
        };
        if replace {
            *failure = Some(err);
        }
    }

    results
}

fn check_thread_counts(map_threads: usize, reduce_threads: usize) -> Result<()> {
    if map_threads == 0 {
        return Err(IndexError::InvalidThreadCount { role: "map" });
    }
    if reduce_threads == 0 {
        return Err(IndexError::InvalidThreadCount { role: "reduce" });
    }
    Ok(())
}

/// Build the index for every file named in `list_path`.
///
/// The list is read, and the output directory created, before any worker
/// starts; either failing aborts the run.
pub fn build_index(
    list_path: &Path,
    map_threads: usize,
    reduce_threads: usize,
    config: &IndexConfig,
) -> Result<RunReport> {
    check_thread_counts(map_threads, reduce_threads)?;
    let jobs = read_input_list(list_path)?;
    info!(list = %list_path.display(), files = jobs.len(), "Read input list");
    run_pipeline(jobs, map_threads, reduce_threads, config)
}

/// Run both phases over an already parsed job list
pub fn run_pipeline(
    jobs: Vec<FileJob>,
    map_threads: usize,
    reduce_threads: usize,
    config: &IndexConfig,
) -> Result<RunReport> {
    check_thread_counts(map_threads, reduce_threads)?;

    fs::create_dir_all(&config.output_dir).map_err(|source| IndexError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;

    let started = Instant::now();
    let total_files = jobs.len();
    let pipeline = Pipeline::new(jobs, map_threads, reduce_threads, config);

    info!(map_threads, reduce_threads, files = total_files, "Starting workers");
    let result = pipeline.run();

    if let Some(pb) = &pipeline.progress {
        pb.finish_and_clear();
    }
    let (map_stats, reduce_stats) = result?;

    let mut report = RunReport {
        map_threads,
        reduce_threads,
        total_files,
        ..Default::default()
    };

    for stats in map_stats {
        report.jobs_consumed += stats.jobs;
        report.indexed_files += stats.indexed;
        report.skipped.extend(stats.skipped);
    }
    report.skipped.sort_by_key(|f| f.file_index);

    for stats in reduce_stats {
        report.merges += stats.merges;
        report.buckets.extend(stats.buckets);
    }
    report.buckets.sort_by_key(|b| b.letter);

    // Buckets partition the index, so their sizes add up to its word count
    report.distinct_words = report.buckets.iter().map(|b| b.entries).sum();
    report.elapsed_ms = started.elapsed().as_millis() as u64;

    debug_assert_eq!(report.jobs_consumed, total_files);
    info!(
        words = report.distinct_words,
        merges = report.merges,
        skipped = report.skipped.len(),
        elapsed_ms = report.elapsed_ms,
        "Index complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quiet_config(dir: &TempDir) -> IndexConfig {
        IndexConfig {
            output_dir: dir.path().join("out"),
            show_progress: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_threads_rejected() {
        let dir = TempDir::new().unwrap();
        let config = quiet_config(&dir);
        assert!(matches!(
            run_pipeline(Vec::new(), 0, 1, &config),
            Err(IndexError::InvalidThreadCount { role: "map" })
        ));
        assert!(matches!(
            run_pipeline(Vec::new(), 1, 0, &config),
            Err(IndexError::InvalidThreadCount { role: "reduce" })
        ));
        // Validation happens before anything touches the disk
        assert!(!config.output_dir.exists());
    }

    #[test]
    fn test_empty_job_list_writes_empty_buckets() {
        let dir = TempDir::new().unwrap();
        let config = quiet_config(&dir);

        let report = run_pipeline(Vec::new(), 2, 3, &config).unwrap();
        assert_eq!(report.total_files, 0);
        assert_eq!(report.distinct_words, 0);
        assert_eq!(report.merges, 0);
        assert_eq!(report.buckets.len(), 26);
        assert!(config.bucket_path(b'a').exists());
        assert!(config.bucket_path(b'z').exists());
    }

    #[test]
    fn test_more_workers_than_files() {
        let dir = TempDir::new().unwrap();
        let config = quiet_config(&dir);
        let file = dir.path().join("one.txt");
        fs::write(&file, "solo word").unwrap();

        let report = run_pipeline(vec![FileJob::new(&file, 1)], 8, 8, &config).unwrap();
        assert_eq!(report.jobs_consumed, 1);
        assert_eq!(report.distinct_words, 2);
        assert_eq!(
            fs::read_to_string(config.bucket_path(b's')).unwrap(),
            "solo:[1]\n"
        );
    }

    #[test]
    fn test_missing_list_fails_before_output() {
        let dir = TempDir::new().unwrap();
        let config = quiet_config(&dir);
        let err = build_index(&dir.path().join("nope.txt"), 1, 1, &config).unwrap_err();
        assert!(matches!(err, IndexError::InputListOpen { .. }));
        assert!(!config.output_dir.exists());
    }

    #[test]
    fn test_worker_panic_releases_every_worker() {
        let dir = TempDir::new().unwrap();
        let config = quiet_config(&dir);
        let file = dir.path().join("one.txt");
        fs::write(&file, "solo word").unwrap();

        let pipeline = Pipeline::new(vec![FileJob::new(&file, 1)], 3, 2, &config);
        pipeline.fail_first_mapper.store(true, Ordering::SeqCst);

        // Peers blocked at the phase barrier must be woken and joined
        let err = pipeline.run().unwrap_err();
        match err {
            IndexError::WorkerPanicked(name) => assert!(name.starts_with("map-"), "{}", name),
            other => panic!("expected a panicked map worker, got {:?}", other),
        }
        assert!(pipeline.phase.is_aborted());
        assert!(pipeline.completion.is_aborted());
    }

    #[test]
    fn test_join_all_prefers_primary_error() {
        let mut failure = Some(IndexError::Aborted("phase barrier"));
        thread::scope(|s| {
            let handle = s.spawn(|| -> Result<()> { Err(IndexError::WorkerPanicked("x".into())) });
            join_all(vec![("x".to_string(), handle)], &mut failure);
        });
        assert!(matches!(failure, Some(IndexError::WorkerPanicked(_))));
    }
}
