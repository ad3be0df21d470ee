use thiserror::Error;

/// Configuration problems caught at pipeline construction, before any audio
/// is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("sample_rate must be non-zero")]
    ZeroSampleRate,

    #[error("window_size must be non-zero")]
    ZeroWindow,

    #[error("hop_size must be non-zero")]
    ZeroHop,

    #[error("hop_size ({hop_size}) must not exceed window_size ({window_size})")]
    HopExceedsWindow { hop_size: usize, window_size: usize },

    #[error("neighborhood radii must be non-zero")]
    ZeroRadius,

    #[error("fan_out must be non-zero")]
    ZeroFanOut,

    #[error("min_time_delta ({min}) must not exceed max_time_delta ({max})")]
    InvertedDeltaWindow { min: u32, max: u32 },
}

/// Failures raised by a fingerprint store implementation. These propagate to
/// the caller unchanged; retry policy belongs to the host.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite failure: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("song with id {0} is not registered")]
    UnknownSong(u32),

    #[error("song with key {0:?} already exists")]
    DuplicateSong(String),

    #[error("unsupported database type: {0}")]
    UnsupportedBackend(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
