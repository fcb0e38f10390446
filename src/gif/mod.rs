//! GIF wire-level constants and shared block types
//!
//! Everything here is byte-exact against the GIF87a/89a container format:
//! introducer and label bytes, the color table length formula, and the
//! comment extension encoding used by the injection writer.

use log::warn;

/// First three bytes of every GIF file
pub const SIGNATURE: &[u8; 3] = b"GIF";
/// Version field for GIF87a
pub const VERSION_87A: &[u8; 3] = b"87a";
/// Version field for GIF89a
pub const VERSION_89A: &[u8; 3] = b"89a";

/// Introduces an extension block
pub const EXTENSION_INTRODUCER: u8 = 0x21;
/// Introduces an image descriptor
pub const IMAGE_SEPARATOR: u8 = 0x2C;
/// Marks the logical end of the GIF stream
pub const TRAILER: u8 = 0x3B;

/// Plain text extension label
pub const LABEL_PLAIN_TEXT: u8 = 0x01;
/// Comment extension label
pub const LABEL_COMMENT: u8 = 0xFE;
/// Application extension label
pub const LABEL_APPLICATION: u8 = 0xFF;

/// Zero-length sub-block terminating an extension or image data stream
pub const BLOCK_TERMINATOR: u8 = 0x00;

/// A sub-block length prefix is a single byte, so payloads cap at 255
pub const MAX_SUB_BLOCK_LEN: usize = 255;

/// GIF standard version, resolved once during header decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Version {
    /// Signature not yet decoded
    #[default]
    Unknown,
    /// Version 87a, from May 1987
    V87a,
    /// Version 89a, from July 1989
    V89a,
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::Unknown => write!(f, "unknown"),
            Version::V87a => write!(f, "87a"),
            Version::V89a => write!(f, "89a"),
        }
    }
}

/// Kind of extension block recognized by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    /// Plain text extension (label 0x01)
    PlainText,
    /// First sub-block of an application extension (label 0xFF)
    Application,
    /// Continuation sub-block of an application extension
    ApplicationSubblock,
    /// Comment extension (label 0xFE)
    Comment,
}

/// Byte length of a color table with the given packed-field size exponent.
///
/// The table holds `2^(exponent+1)` RGB triples.
pub fn color_table_len(size_exponent: u8) -> usize {
    3 * (1 << (size_exponent as usize + 1))
}

/// Encode one comment payload as a complete comment extension block:
/// `0x21 0xFE len payload[len] 0x00`.
///
/// The length prefix is a single byte, so payloads longer than 255 bytes are
/// truncated with a warning.
pub fn encode_comment_block(payload: &[u8]) -> Vec<u8> {
    let len = if payload.len() > MAX_SUB_BLOCK_LEN {
        warn!(
            "comment length {} is longer than {} bytes and will be truncated",
            payload.len(),
            MAX_SUB_BLOCK_LEN
        );
        MAX_SUB_BLOCK_LEN
    } else {
        payload.len()
    };

    let mut block = Vec::with_capacity(len + 4);
    block.push(EXTENSION_INTRODUCER);
    block.push(LABEL_COMMENT);
    block.push(len as u8);
    block.extend_from_slice(&payload[..len]);
    block.push(BLOCK_TERMINATOR);
    block
}
