use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    #[error("acknowledgment failed: {0}")]
    Acknowledge(anyhow::Error),
}
