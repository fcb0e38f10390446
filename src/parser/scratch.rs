//! Scratch buffer used to assemble block payloads across chunk boundaries

use crate::{GifError, GifResult};

/// Growth unit for the scratch buffer
pub const SCRATCH_CHUNK: usize = 256;

/// Hard ceiling on scratch growth. Comments are the only payloads that can
/// legitimately run past a single 255-byte sub-block (some applications
/// disregard the declared length), so the cap bounds those at ten growth
/// units.
pub const MAX_SCRATCH: usize = SCRATCH_CHUNK * 10;

/// Accumulation progress for the current length-prefixed sub-block.
///
/// A declared length of zero never reaches `Accumulating`: seen as a length
/// prefix, it terminates the containing structure instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubBlock {
    /// The next byte is a one-byte length prefix
    AwaitingLength,
    /// Collecting `needed` payload bytes, `have` collected so far
    Accumulating { needed: usize, have: usize },
}

/// Growable byte buffer with an explicit capacity ceiling.
///
/// Overflowing the ceiling is a structured [`GifError::CommentTooLarge`]
/// rather than unbounded growth; a failed reservation surfaces as
/// [`GifError::AllocationFailed`].
#[derive(Debug, Default)]
pub struct Scratchpad {
    buf: Vec<u8>,
}

impl Scratchpad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one byte, growing by [`SCRATCH_CHUNK`] units up to [`MAX_SCRATCH`].
    pub fn push(&mut self, byte: u8) -> GifResult<()> {
        if self.buf.len() >= MAX_SCRATCH {
            return Err(GifError::CommentTooLarge {
                len: self.buf.len() + 1,
                max: MAX_SCRATCH,
            });
        }
        if self.buf.len() == self.buf.capacity() {
            self.buf
                .try_reserve(SCRATCH_CHUNK)
                .map_err(|_| GifError::AllocationFailed)?;
        }
        self.buf.push(byte);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}
