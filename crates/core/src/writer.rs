//! Artifact writer pool.
//!
//! Materializes one artifact file per word through an [`ArtifactStore`]. The parallel strategy
//! pre-loads a work queue with every `(word, path)` job and drains it with a fixed number of
//! blocking worker tasks; the sequential strategy writes in input order on a single blocking
//! task.
//!
//! Per-word failures never abort the batch. Each one is sent to an error sink and the sink is
//! drained into [`WriteSummary::failures`] after every worker has been joined.

use crate::buffer::BufferPool;
use crate::config::Strategy;
use crate::constants::IDLE_BUFFERS_PER_WORKER;
use crate::{CoreError, CoreResult};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use wordfarm_files::ArtifactStore;
use wordfarm_types::Word;

/// One word whose artifact could not be written.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WriteFailure {
    pub word: Word,
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a writer pool run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct WriteSummary {
    /// Words submitted to the pool.
    pub attempted: usize,
    /// Artifacts written successfully (duplicates count once per occurrence).
    pub written: usize,
    /// Every per-word failure, sorted by word.
    pub failures: Vec<WriteFailure>,
}

impl WriteSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
struct ArtifactJob {
    word: Word,
    path: PathBuf,
}

impl ArtifactJob {
    fn new(store: &ArtifactStore, word: &Word) -> Self {
        Self {
            path: store.artifact_path(word),
            word: word.clone(),
        }
    }

    fn run(self, store: &ArtifactStore, buffer: &mut Vec<u8>) -> Result<(), WriteFailure> {
        store.write(&self.word, buffer).map(|_| ()).map_err(|e| {
            tracing::warn!("failed to write artifact for '{}': {}", self.word, e);
            WriteFailure {
                word: self.word,
                path: self.path,
                error: e.to_string(),
            }
        })
    }
}

/// Writes an artifact for every word using the given strategy.
///
/// # Errors
///
/// Returns `CoreError` only when the pool itself fails (a worker task panics or the work
/// queue closes early). Per-word errors are reported in the returned summary.
pub async fn write_artifacts(
    store: Arc<ArtifactStore>,
    words: &[Word],
    strategy: Strategy,
    writers: usize,
) -> CoreResult<WriteSummary> {
    let jobs: Vec<ArtifactJob> = words.iter().map(|w| ArtifactJob::new(&store, w)).collect();

    let mut summary = match strategy {
        Strategy::Sequential => write_sequential(store, jobs).await?,
        Strategy::Parallel => write_parallel(store, jobs, writers.max(1)).await?,
    };
    summary.failures.sort_by(|a, b| a.word.cmp(&b.word));

    tracing::info!(
        "wrote {} of {} artifacts ({} failed, {})",
        summary.written,
        summary.attempted,
        summary.failures.len(),
        strategy
    );
    Ok(summary)
}

async fn write_sequential(
    store: Arc<ArtifactStore>,
    jobs: Vec<ArtifactJob>,
) -> CoreResult<WriteSummary> {
    let summary = tokio::task::spawn_blocking(move || {
        let mut summary = WriteSummary {
            attempted: jobs.len(),
            ..Default::default()
        };
        let mut buffer = Vec::new();

        for job in jobs {
            match job.run(&store, &mut buffer) {
                Ok(()) => summary.written += 1,
                Err(failure) => summary.failures.push(failure),
            }
        }
        summary
    })
    .await?;

    Ok(summary)
}

async fn write_parallel(
    store: Arc<ArtifactStore>,
    jobs: Vec<ArtifactJob>,
    writers: usize,
) -> CoreResult<WriteSummary> {
    let attempted = jobs.len();

    let (job_tx, job_rx) = mpsc::channel::<ArtifactJob>(attempted.max(1));
    for job in jobs {
        job_tx
            .send(job)
            .await
            .map_err(|_| CoreError::QueueClosed("artifact work queue"))?;
    }
    drop(job_tx);

    let queue = Arc::new(Mutex::new(job_rx));
    let buffers = Arc::new(BufferPool::new(writers * IDLE_BUFFERS_PER_WORKER));
    let written = Arc::new(AtomicUsize::new(0));
    let (failure_tx, mut failure_rx) = mpsc::unbounded_channel::<WriteFailure>();

    let mut workers = JoinSet::new();
    for _ in 0..writers {
        let queue = Arc::clone(&queue);
        let buffers = Arc::clone(&buffers);
        let written = Arc::clone(&written);
        let store = Arc::clone(&store);
        let failure_tx = failure_tx.clone();

        workers.spawn_blocking(move || loop {
            let job = queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .blocking_recv();
            let Some(job) = job else { break };

            let mut buffer = buffers.acquire();
            match job.run(&store, &mut buffer) {
                Ok(()) => {
                    written.fetch_add(1, Ordering::Relaxed);
                }
                Err(failure) => {
                    if let Err(unsent) = failure_tx.send(failure) {
                        tracing::error!("failure sink closed, lost: {:?}", unsent.0);
                    }
                }
            }
        });
    }
    drop(failure_tx);

    // Completion barrier: every worker must finish before failures are drained.
    while let Some(joined) = workers.join_next().await {
        joined?;
    }

    let mut failures = Vec::new();
    while let Some(failure) = failure_rx.recv().await {
        failures.push(failure);
    }

    Ok(WriteSummary {
        attempted,
        written: written.load(Ordering::Relaxed),
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn words(input: &[&str]) -> Vec<Word> {
        input.iter().map(|w| Word::parse(w).unwrap()).collect()
    }

    fn open_store(temp: &TempDir) -> Arc<ArtifactStore> {
        Arc::new(ArtifactStore::open(&temp.path().join("output")).unwrap())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_writes_scenario() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let summary = write_artifacts(
            Arc::clone(&store),
            &words(&["apple", "banana", "cat"]),
            Strategy::Parallel,
            16,
        )
        .await
        .unwrap();

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.written, 3);
        assert!(summary.is_complete());
        for relative in ["a/p/apple.txt", "b/a/banana.txt", "c/a/cat.txt"] {
            assert!(store.root().join(relative).is_file(), "missing {relative}");
        }
        let content = fs::read_to_string(store.root().join("c/a/cat.txt")).unwrap();
        assert_eq!(content, "cat\n".repeat(100));
    }

    #[tokio::test]
    async fn test_sequential_matches_parallel_layout() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let summary = write_artifacts(
            Arc::clone(&store),
            &words(&["kiwi", "kite", "lemon"]),
            Strategy::Sequential,
            1,
        )
        .await
        .unwrap();

        assert_eq!(summary.written, 3);
        assert_eq!(fs::read_dir(store.root().join("k/i")).unwrap().count(), 2);
        assert!(store.root().join("l/e/lemon.txt").is_file());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_duplicate_words_single_artifact() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let summary = write_artifacts(
            Arc::clone(&store),
            &words(&["dog", "dog"]),
            Strategy::Parallel,
            4,
        )
        .await
        .unwrap();

        assert!(summary.is_complete());
        assert_eq!(summary.written, 2);
        let files: Vec<_> = fs::read_dir(store.root().join("d/o")).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(
            fs::read_to_string(store.root().join("d/o/dog.txt")).unwrap(),
            "dog\n".repeat(100)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_shared_shard_directory_races() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let many: Vec<Word> = (0..400)
            .map(|i| Word::parse(format!("ma{i}")).unwrap())
            .collect();

        let summary = write_artifacts(Arc::clone(&store), &many, Strategy::Parallel, 16)
            .await
            .unwrap();

        assert!(summary.is_complete());
        assert_eq!(summary.written, 400);
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 1);
        assert_eq!(fs::read_dir(store.root().join("m")).unwrap().count(), 1);
        assert_eq!(fs::read_dir(store.root().join("m/a")).unwrap().count(), 400);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_partial_failures_are_collected() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        // A regular file where the "f" shard directory should go.
        fs::write(store.root().join("f"), "blocker").unwrap();

        let summary = write_artifacts(
            Arc::clone(&store),
            &words(&["fish", "frog", "goat", "ab/cd", "horse"]),
            Strategy::Parallel,
            3,
        )
        .await
        .unwrap();

        assert_eq!(summary.attempted, 5);
        assert_eq!(summary.written, 2);
        let failed: Vec<&str> = summary.failures.iter().map(|f| f.word.as_str()).collect();
        assert_eq!(failed, vec!["ab/cd", "fish", "frog"]);
        assert!(store.root().join("g/o/goat.txt").is_file());
        assert!(store.root().join("h/o/horse.txt").is_file());
        assert!(summary.failures[1].path.ends_with("f/i/fish.txt"));
    }

    #[tokio::test]
    async fn test_sequential_collects_failures() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let summary = write_artifacts(
            Arc::clone(&store),
            &words(&["..dots", "owl"]),
            Strategy::Sequential,
            1,
        )
        .await
        .unwrap();

        assert_eq!(summary.written, 1);
        assert_eq!(summary.failures.len(), 1);
        assert!(!summary.failures[0].error.is_empty());
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let summary = write_artifacts(store, &[], Strategy::Parallel, 16)
            .await
            .unwrap();

        assert_eq!(summary, WriteSummary::default());
    }
}
