//! Word source reading and the ingestion pipeline.
//!
//! Ingestion turns a line-oriented text source into a [`WordCollection`]. Every line is
//! trimmed and lower-cased; lines shorter than two characters are dropped silently.
//!
//! Two strategies are available:
//!
//! - [`Strategy::Sequential`] reads and normalizes one line at a time and preserves input
//!   order exactly.
//! - [`Strategy::Parallel`] runs one feeder task that pushes raw lines into a bounded queue,
//!   a fixed pool of normalizer tasks sharing that queue, and a collector draining a bounded
//!   results queue. **Output order is not preserved**: normalizers interleave arbitrarily.
//!   Callers that need reproducible order must use the sequential strategy or
//!   [`WordCollection::sorted`].
//!
//! A read failure (I/O error or invalid UTF-8) aborts ingestion; no partial collection is
//! returned as success.

use crate::config::Strategy;
use crate::{CoreError, CoreResult};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use wordfarm_types::Word;

/// The finalized output of ingestion, held fully in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCollection {
    words: Vec<Word>,
    strategy: Strategy,
    sorted: bool,
}

impl WordCollection {
    pub fn new(words: Vec<Word>, strategy: Strategy) -> Self {
        Self {
            words,
            strategy,
            sorted: false,
        }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn into_words(self) -> Vec<Word> {
        self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Strategy that produced this collection.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// True when the element order is reproducible: input order (sequential) or sorted.
    pub fn is_ordered(&self) -> bool {
        self.sorted || self.strategy == Strategy::Sequential
    }

    /// Returns the collection sorted lexicographically. Duplicates are kept.
    pub fn sorted(mut self) -> Self {
        self.words.sort();
        self.sorted = true;
        self
    }
}

/// Opens `path` and ingests it with the given strategy.
///
/// # Errors
///
/// Returns `CoreError::InputOpen` when the file cannot be opened and `CoreError::Ingest` when
/// reading fails part way.
pub async fn ingest_file(
    path: &Path,
    strategy: Strategy,
    normalizers: usize,
) -> CoreResult<WordCollection> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| CoreError::InputOpen {
            path: path.to_path_buf(),
            source,
        })?;

    let collection = ingest(BufReader::new(file), strategy, normalizers).await?;
    tracing::info!(
        "ingested {} words from {} ({})",
        collection.len(),
        path.display(),
        strategy
    );
    Ok(collection)
}

/// Ingests any buffered async source with the given strategy.
pub async fn ingest<R>(source: R, strategy: Strategy, normalizers: usize) -> CoreResult<WordCollection>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let words = match strategy {
        Strategy::Sequential => ingest_sequential(source).await?,
        Strategy::Parallel => ingest_parallel(source, normalizers.max(1)).await?,
    };
    Ok(WordCollection::new(words, strategy))
}

async fn ingest_sequential<R>(source: R) -> CoreResult<Vec<Word>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = source.lines();
    let mut words = Vec::new();

    while let Some(line) = lines.next_line().await.map_err(CoreError::Ingest)? {
        if let Some(word) = Word::normalize(&line) {
            words.push(word);
        }
    }

    Ok(words)
}

async fn ingest_parallel<R>(source: R, normalizers: usize) -> CoreResult<Vec<Word>>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let capacity = normalizers * 2;
    let (line_tx, line_rx) = mpsc::channel::<String>(capacity);
    let (word_tx, mut word_rx) = mpsc::channel::<Word>(capacity);

    let feeder = tokio::spawn(async move {
        let mut lines = source.lines();
        while let Some(line) = lines.next_line().await? {
            if line_tx.send(line).await.is_err() {
                break;
            }
        }
        Ok::<(), std::io::Error>(())
    });

    // Normalizers share one receiver; the lock is held only while waiting for the next line.
    let line_rx = Arc::new(Mutex::new(line_rx));
    let mut workers = JoinSet::new();
    for _ in 0..normalizers {
        let line_rx = Arc::clone(&line_rx);
        let word_tx = word_tx.clone();
        workers.spawn(async move {
            loop {
                let line = line_rx.lock().await.recv().await;
                let Some(line) = line else { break };
                if let Some(word) = Word::normalize(&line) {
                    if word_tx.send(word).await.is_err() {
                        break;
                    }
                }
            }
        });
    }
    drop(word_tx);

    let mut words = Vec::new();
    while let Some(word) = word_rx.recv().await {
        words.push(word);
    }

    while let Some(joined) = workers.join_next().await {
        joined?;
    }
    feeder.await?.map_err(CoreError::Ingest)?;

    Ok(words)
}
