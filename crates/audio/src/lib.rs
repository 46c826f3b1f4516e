mod resample;
mod signal;

pub use resample::resample_linear;
pub use signal::AudioSignal;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("failed to open audio file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode audio: {0}")]
    Decode(String),
    #[error("unsupported sample format: {0} bits per sample")]
    UnsupportedFormat(u16),
}

pub type Result<T> = std::result::Result<T, AudioError>;
