use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ScrublineError {
    #[error("invalid rule: {reason}")]
    InvalidRule { reason: String },

    #[error("unknown stage: {name}")]
    UnknownStage { name: String },

    #[error("duplicate stage in chain: {name}")]
    DuplicateStage { name: String },

    #[error("config parse error in {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScrublineError>;
