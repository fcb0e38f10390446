//! # gifcomment
//!
//! Extract and inject comment, application and plain text extension blocks
//! embedded in GIF files.
//!
//! The core is an incremental structural parser: a chunk-fed state machine
//! that walks the GIF container far enough to locate extension blocks while
//! treating pixel data as an opaque, skippable region. A companion injection
//! writer splices new comment blocks into the byte stream at the correct
//! structural position and passes every other byte through unmodified.

// Public API exports
pub mod cli;
pub mod gif;
pub mod parser;
pub mod extract;
pub mod inject;

pub use extract::{scan_reader, MetadataBlock, MetadataCollector};
pub use gif::{ExtensionKind, Version};
pub use inject::{inject_reader, CommentInjector, CommentList};
pub use parser::{EventSink, ExtensionEvent, Parser, ReadState, StateTransition};

/// Result type alias for GIF metadata operations
pub type GifResult<T> = Result<T, GifError>;

/// Comprehensive error type for GIF metadata operations
#[derive(Debug, thiserror::Error)]
pub enum GifError {
    /// The file does not begin with a `GIF87a`/`GIF89a` signature
    #[error("invalid GIF signature")]
    InvalidSignature,

    /// A comment payload grew past the scratch buffer ceiling
    #[error("comment of {len} bytes exceeds the maximum of {max} bytes")]
    CommentTooLarge { len: usize, max: usize },

    /// Buffer growth or event construction could not be allocated
    #[error("memory allocation failed")]
    AllocationFailed,

    /// The stream ended before the trailer byte. Warning-grade: events
    /// already emitted remain valid.
    #[error("unexpected end of file before the GIF trailer")]
    UnexpectedEof,

    #[error("input file error: {0}")]
    Io(#[from] std::io::Error),
}
