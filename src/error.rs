use std::{fmt, io, path::PathBuf};
use thiserror::Error;

/// Why a keypoint stream failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// The stream ended while `expected` was still needed.
    UnexpectedEof { expected: &'static str },
    InvalidInteger { token: String },
    InvalidFloat { token: String },
    /// NaN and infinities have no place in the canonical order.
    NonFiniteFloat { token: String },
    /// Descriptor values must fit in a byte.
    ByteOutOfRange { token: String },
    /// Only reported in strict mode.
    TrailingData { token: String },
    /// The input is not text; `offset` is the byte where decoding failed.
    InvalidUtf8 { offset: usize },
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input, expected {}", expected)
            }
            Self::InvalidInteger { token } => write!(f, "`{}` is not a valid integer", token),
            Self::InvalidFloat { token } => write!(f, "`{}` is not a valid float", token),
            Self::NonFiniteFloat { token } => write!(f, "`{}` is not a finite float", token),
            Self::ByteOutOfRange { token } => {
                write!(f, "descriptor value `{}` is outside [0, 255]", token)
            }
            Self::TrailingData { token } => {
                write!(f, "unexpected `{}` after the declared records", token)
            }
            Self::InvalidUtf8 { offset } => write!(f, "invalid UTF-8 at byte {}", offset),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot access {}: {}", path.display(), source)]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read keypoint stream: {0}")]
    Io(#[from] io::Error),
    #[error("malformed keypoint input on line {line}: {reason}")]
    MalformedInput { line: usize, reason: MalformedReason },
    #[error("descriptor block sizes differ ({left} vs {right})")]
    BlockSizeMismatch { left: usize, right: usize },
    #[error("failed to load settings from {}: {}", path.display(), source)]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("epsilon must be finite and non-negative, got {0}")]
    InvalidEpsilon(f32),
}

pub type Result<T> = std::result::Result<T, Error>;
