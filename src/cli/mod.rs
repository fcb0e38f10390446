//! Exit codes and output formatting shared by the gifcomment binary

use crate::extract::MetadataBlock;
use crate::gif::ExtensionKind;
use crate::GifError;

/// The input could not be read or the output could not be written
pub const EXIT_IO_ERROR: i32 = 2;
/// Memory allocation failed
pub const EXIT_MEM_ERROR: i32 = 3;
/// The input was not a parseable GIF
pub const EXIT_PARSE_ERROR: i32 = 4;

/// Process exit code for a fatal error
pub fn exit_code_for(err: &GifError) -> i32 {
    match err {
        GifError::Io(_) => EXIT_IO_ERROR,
        GifError::AllocationFailed => EXIT_MEM_ERROR,
        GifError::InvalidSignature
        | GifError::CommentTooLarge { .. }
        | GifError::UnexpectedEof => EXIT_PARSE_ERROR,
    }
}

/// One line per block with its kind label, for the `--all` listing
pub fn format_block(block: &MetadataBlock) -> String {
    match block.kind {
        ExtensionKind::PlainText => format!("Plain text: {}", block.text()),
        ExtensionKind::Application => {
            format!("Application: {} ({} bytes)", block.text(), block.payload.len())
        }
        ExtensionKind::ApplicationSubblock => {
            format!("Application sub-block ({} bytes)", block.payload.len())
        }
        ExtensionKind::Comment => {
            format!("Comment: {} ({} bytes)", block.text(), block.payload.len())
        }
    }
}
