use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to open input {path}: {source}", path = path.display())]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read input: {0}")]
    Ingest(std::io::Error),
    #[error("output root unavailable: {0}")]
    OutputRoot(#[from] wordfarm_files::FilesError),
    #[error("failed to list output root {path}: {source}", path = path.display())]
    ListRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("worker task failed: {0}")]
    WorkerJoin(#[from] tokio::task::JoinError),
    #[error("{0} closed before all work was queued")]
    QueueClosed(&'static str),
    #[error("concurrency limiter closed: {0}")]
    Scheduler(#[from] tokio::sync::AcquireError),

    #[error("failed to archive {path}: {source}", path = path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to export word list: {0}")]
    Export(std::io::Error),
    #[error("failed to record timing: {0}")]
    Timing(std::io::Error),
    #[error("failed to serialize report: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
