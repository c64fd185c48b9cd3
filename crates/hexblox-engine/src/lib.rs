use std::{io, path::PathBuf};

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Failure to read or validate a [`GameConfig`].
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("failed to read config {}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("invalid config JSON")]
    Parse(serde_json::Error),
    #[display("flash_interval_ms must be positive")]
    ZeroFlashInterval,
    #[display("flash_cycles must be positive")]
    ZeroFlashCycles,
    #[display("fall_delay.min_ms must be positive")]
    ZeroFallDelay,
    #[display("test mode requires a non-empty test_sequence")]
    EmptyTestSequence,
    #[display("test_sequence contains barrier kind {_0:?}")]
    BarrierInTestSequence(#[error(not(source))] PieceKind),
}

/// Failure of a [`BestScoreStore`].
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum BestScoreError {
    #[display("failed to access best score file {}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("failed to parse best score file {}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("failed to encode best score")]
    Encode(serde_json::Error),
}
