use thiserror::Error;

/// Errors raised while configuring rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unknown layer: {0}")]
    UnknownLayer(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type RenderResult<T> = Result<T, RenderError>;
