use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink rejected {rejected} record(s): {reason}")]
    Rejected { rejected: usize, reason: String },
    #[error(transparent)]
    Unavailable(#[from] anyhow::Error),
}
