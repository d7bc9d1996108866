//-----------------------------------------------------------------------------
// Module xcp_core::error
// Path: src/error.rs

use thiserror::Error;

/// All fallible outcomes surfaced across the crate's public API.
///
/// Recoverable framing conditions (checksum mismatch, buffer overflow) are
/// *not* represented here: per the framing state machines' propagation
/// policy they are logged and swallowed internally, resetting the receiver
/// for the next frame. Everything in this enum is either fatal to the
/// operation that produced it or, for `OffsetOutOfRange`, fatal to the
/// current DAQ frame only.
#[derive(Error, Debug)]
pub enum XcpCoreError {
    #[error("log file magic mismatch")]
    MagicMismatch,

    #[error("log file header size mismatch: expected {expected}, found {found}")]
    HeaderSizeMismatch { expected: u16, found: u16 },

    #[error("log file version mismatch: expected {expected:#06x}, found {found:#06x}")]
    VersionMismatch { expected: u16, found: u16 },

    #[error("LZ4 compression failed")]
    CompressionFailed,

    #[error("LZ4 decompression failed")]
    DecompressionFailed,

    #[error("I/O operation `{op}` failed: {source}")]
    IoFailed {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported type tag {0}")]
    UnsupportedType(u8),

    #[error("unsupported timestamp size {0}")]
    UnsupportedTimestampSize(u8),

    #[error("unsupported PID field size {0}")]
    UnsupportedIdSize(u8),

    #[error("offset out of range while parsing ODT")]
    OffsetOutOfRange,

    #[error("resource capacity exhausted")]
    CapacityExhausted,

    #[error("log replay requires an embedded metadata block, but none is present")]
    MissingMetadata,

    #[error("unrecognized data type name `{0}`")]
    UnknownDataType(String),

    #[error("malformed metadata blob")]
    MalformedMetadata,
}

pub type Result<T> = std::result::Result<T, XcpCoreError>;

impl XcpCoreError {
    pub(crate) fn io(op: &'static str, source: std::io::Error) -> Self {
        XcpCoreError::IoFailed { op, source }
    }
}
