//! Error types for OxiUCL operations.
//!
//! The error set is closed: it mirrors the status codes of the UCL family
//! of codecs so that callers can branch on [`ErrorKind`] (or the classic
//! numeric [`UclError::code`]) instead of matching on messages. Some
//! conditions, most notably [`UclError::NotCompressible`], are expected
//! outcomes rather than failures.

use thiserror::Error;

/// The main error type for OxiUCL operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UclError {
    /// Unspecified engine failure.
    #[error("Engine error: {message}")]
    Generic {
        /// Description of the failure.
        message: String,
    },

    /// A parameter was out of range or inconsistent.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the offending argument.
        message: String,
    },

    /// A working buffer could not be allocated.
    #[error("Out of memory: failed to allocate {requested} bytes")]
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
    },

    /// The encoded block would not be smaller than its input.
    #[error("Data is not compressible ({input_len} bytes would not shrink)")]
    NotCompressible {
        /// Length of the input block.
        input_len: usize,
    },

    /// The progress callback asked the encoder to stop.
    #[error("Compression cancelled after {bytes_in} input bytes")]
    Cancelled {
        /// Input bytes consumed when the request was honoured.
        bytes_in: usize,
    },

    /// The compressed stream ended in the middle of a token.
    #[error("Input overrun at byte {position}")]
    InputOverrun {
        /// Input position at which more data was required.
        position: usize,
    },

    /// The output would grow past the destination capacity.
    #[error("Output overrun: destination capacity is {capacity} bytes")]
    OutputOverrun {
        /// Capacity of the destination.
        capacity: usize,
    },

    /// A back-reference points before the start of the output.
    #[error("Lookbehind overrun: distance {distance} exceeds {available} bytes of history")]
    LookbehindOverrun {
        /// Requested distance.
        distance: usize,
        /// Bytes produced so far.
        available: usize,
    },

    /// The input ended before the end-of-stream marker.
    #[error("End-of-stream marker not found (input exhausted at byte {position})")]
    EofNotFound {
        /// Input position at which the input ran out.
        position: usize,
    },

    /// Bytes remain after the end-of-stream marker.
    #[error("Input not consumed: end marker reached after {consumed} of {total} bytes")]
    InputNotConsumed {
        /// Bytes consumed up to and including the end marker.
        consumed: usize,
        /// Total input length.
        total: usize,
    },

    /// In-place decoding would overwrite compressed bytes not yet read.
    #[error("Overlap overrun: output position {output_pos} reaches unread input at {input_pos}")]
    OverlapOverrun {
        /// Output position of the offending write.
        output_pos: usize,
        /// Absolute position of the next unread input byte.
        input_pos: usize,
    },
}

/// Result type alias for OxiUCL operations.
pub type Result<T> = std::result::Result<T, UclError>;

/// Classification of a [`UclError`], independent of its context fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`UclError::Generic`].
    Generic,
    /// See [`UclError::InvalidArgument`].
    InvalidArgument,
    /// See [`UclError::OutOfMemory`].
    OutOfMemory,
    /// See [`UclError::NotCompressible`].
    NotCompressible,
    /// See [`UclError::Cancelled`].
    Cancelled,
    /// See [`UclError::InputOverrun`].
    InputOverrun,
    /// See [`UclError::OutputOverrun`].
    OutputOverrun,
    /// See [`UclError::LookbehindOverrun`].
    LookbehindOverrun,
    /// See [`UclError::EofNotFound`].
    EofNotFound,
    /// See [`UclError::InputNotConsumed`].
    InputNotConsumed,
    /// See [`UclError::OverlapOverrun`].
    OverlapOverrun,
}

impl ErrorKind {
    /// Numeric status code used by the UCL family (`UCL_E_*`).
    pub fn code(self) -> i32 {
        match self {
            Self::Generic => -1,
            Self::InvalidArgument => -2,
            Self::OutOfMemory => -3,
            Self::NotCompressible => -101,
            Self::Cancelled => -102,
            Self::InputOverrun => -201,
            Self::OutputOverrun => -202,
            Self::LookbehindOverrun => -203,
            Self::EofNotFound => -204,
            Self::InputNotConsumed => -205,
            Self::OverlapOverrun => -206,
        }
    }

    /// Symbolic name of the status code.
    pub fn name(self) -> &'static str {
        match self {
            Self::Generic => "UCL_E_ERROR",
            Self::InvalidArgument => "UCL_E_INVALID_ARGUMENT",
            Self::OutOfMemory => "UCL_E_OUT_OF_MEMORY",
            Self::NotCompressible => "UCL_E_NOT_COMPRESSIBLE",
            Self::Cancelled => "UCL_E_CANCELLED",
            Self::InputOverrun => "UCL_E_INPUT_OVERRUN",
            Self::OutputOverrun => "UCL_E_OUTPUT_OVERRUN",
            Self::LookbehindOverrun => "UCL_E_LOOKBEHIND_OVERRUN",
            Self::EofNotFound => "UCL_E_EOF_NOT_FOUND",
            Self::InputNotConsumed => "UCL_E_INPUT_NOT_CONSUMED",
            Self::OverlapOverrun => "UCL_E_OVERLAP_OVERRUN",
        }
    }

    /// Look up a kind from its numeric status code.
    pub fn from_code(code: i32) -> Option<Self> {
        [
            Self::Generic,
            Self::InvalidArgument,
            Self::OutOfMemory,
            Self::NotCompressible,
            Self::Cancelled,
            Self::InputOverrun,
            Self::OutputOverrun,
            Self::LookbehindOverrun,
            Self::EofNotFound,
            Self::InputNotConsumed,
            Self::OverlapOverrun,
        ]
        .into_iter()
        .find(|kind| kind.code() == code)
    }

    /// Whether the condition is an expected outcome the caller can act on
    /// without treating it as corruption (store the block raw).
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::NotCompressible)
    }

    /// Whether the condition signals malformed input or an undersized
    /// destination during decompression.
    pub fn is_decompression_error(self) -> bool {
        self.code() <= -201
    }
}

impl UclError {
    /// Create a generic engine error.
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an out-of-memory error.
    pub fn out_of_memory(requested: usize) -> Self {
        Self::OutOfMemory { requested }
    }

    /// Create a not-compressible status.
    pub fn not_compressible(input_len: usize) -> Self {
        Self::NotCompressible { input_len }
    }

    /// Create a cancellation error.
    pub fn cancelled(bytes_in: usize) -> Self {
        Self::Cancelled { bytes_in }
    }

    /// Create an input overrun error.
    pub fn input_overrun(position: usize) -> Self {
        Self::InputOverrun { position }
    }

    /// Create an output overrun error.
    pub fn output_overrun(capacity: usize) -> Self {
        Self::OutputOverrun { capacity }
    }

    /// Create a lookbehind overrun error.
    pub fn lookbehind_overrun(distance: usize, available: usize) -> Self {
        Self::LookbehindOverrun {
            distance,
            available,
        }
    }

    /// Create an end-of-stream-not-found error.
    pub fn eof_not_found(position: usize) -> Self {
        Self::EofNotFound { position }
    }

    /// Create an input-not-consumed error.
    pub fn input_not_consumed(consumed: usize, total: usize) -> Self {
        Self::InputNotConsumed { consumed, total }
    }

    /// Create an overlap overrun error.
    pub fn overlap_overrun(output_pos: usize, input_pos: usize) -> Self {
        Self::OverlapOverrun {
            output_pos,
            input_pos,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Generic { .. } => ErrorKind::Generic,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            Self::NotCompressible { .. } => ErrorKind::NotCompressible,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::InputOverrun { .. } => ErrorKind::InputOverrun,
            Self::OutputOverrun { .. } => ErrorKind::OutputOverrun,
            Self::LookbehindOverrun { .. } => ErrorKind::LookbehindOverrun,
            Self::EofNotFound { .. } => ErrorKind::EofNotFound,
            Self::InputNotConsumed { .. } => ErrorKind::InputNotConsumed,
            Self::OverlapOverrun { .. } => ErrorKind::OverlapOverrun,
        }
    }

    /// Numeric status code (`UCL_E_*`).
    pub fn code(&self) -> i32 {
        self.kind().code()
    }
}
