use thiserror::Error;

/// Failures talking to the model or configuring the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not reach the model server: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model returned an empty reply")]
    EmptyResponse,

    #[error("could not decode model server reply: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid turn limits: min {min}, max {max} (need 1 <= min <= max)")]
    InvalidLimits { min: u32, max: u32 },
}

pub type EngineResult<T> = Result<T, EngineError>;
