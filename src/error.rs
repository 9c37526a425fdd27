//! Error types for the light driver.
//!
//! Every fallible operation in the codec and the session returns
//! [`Result<T>`]. Encoding errors are raised before any radio traffic;
//! connection and transmission errors keep distinct variants so a host can
//! tell "device unreachable" apart from "a specific frame failed".

/// The error type for codec and session operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The payload does not fit in the frame (or frame sequence) being built.
    #[error("payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    /// A multi-frame command was requested with no payload.
    #[error("empty payload")]
    EmptyPayload,

    /// An RGB component was outside `[0, 255]` or not a number.
    #[error("invalid color component: {0}")]
    InvalidColorComponent(f64),

    /// A brightness percentage outside `[1, 100]`.
    #[error("invalid brightness: {0} (expected 1-100)")]
    InvalidBrightness(u8),

    /// The device model has no support for the requested feature.
    #[error("model {model} does not support {feature}")]
    Unsupported { model: String, feature: &'static str },

    /// A frame failed header, ordering, or checksum validation.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Every connection attempt failed.
    #[error("connection unavailable after {attempts} attempts")]
    ConnectionUnavailable { attempts: u32 },

    /// A write failed after the link was established.
    ///
    /// `frame_index` is the position of the failed frame within its
    /// sequence. Earlier frames of the sequence were already written.
    #[error("transmission failed at frame {frame_index}: {reason}")]
    TransmissionFailed { frame_index: usize, reason: String },

    /// An error reported by the underlying BLE stack.
    #[error("transport error: {0}")]
    Transport(String),

    /// A connect attempt or frame write exceeded its deadline.
    #[error("timed out")]
    Timeout,
}

impl Error {
    /// Whether issuing the same logical command again may succeed.
    ///
    /// Caller-contract violations never become valid on retry.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Error::ConnectionUnavailable { .. }
                | Error::TransmissionFailed { .. }
                | Error::Transport(_)
                | Error::Timeout
        )
    }
}

#[cfg(windows)]
impl From<windows::core::Error> for Error {
    fn from(e: windows::core::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
