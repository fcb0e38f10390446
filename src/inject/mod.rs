//! Comment injection: splice new comment extension blocks into a GIF stream
//!
//! The injector listens to the parser's state transitions and writes the
//! output as a pure insertion: every original byte passes through verbatim
//! and in order, with the encoded comment blocks spliced in immediately
//! before the first top-level block (extension, image, or trailer) the
//! original file carries. That lands the new comments directly after the
//! logical screen descriptor and global color table, ahead of any foreign
//! extension content.

use std::io::{Read, Write};

use crate::extract::READ_CHUNK_SIZE;
use crate::gif::encode_comment_block;
use crate::parser::{EventSink, ExtensionEvent, Parser, StateTransition};
use crate::GifResult;

/// Ordered comment payloads to be spliced into the output stream
#[derive(Debug, Clone, Default)]
pub struct CommentList {
    comments: Vec<Vec<u8>>,
}

impl CommentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, comment: impl Into<Vec<u8>>) {
        self.comments.push(comment.into());
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.comments.iter().map(|c| c.as_slice())
    }
}

impl<S: Into<Vec<u8>>> FromIterator<S> for CommentList {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        CommentList {
            comments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Writer that copies a GIF stream through while splicing comment blocks at
/// the first top-level block boundary. Exactly one batch of blocks is
/// injected per output stream.
#[derive(Debug)]
pub struct CommentInjector<W: Write> {
    out: W,
    comments: CommentList,
    /// The batch has been written; all further bytes pass through untouched
    injected: bool,
    /// Bytes of the current chunk already written ahead of the splice
    written: usize,
}

/// Per-chunk adapter giving the injector access to the chunk bytes while the
/// parser raises events on it
struct ChunkSink<'a, W: Write> {
    injector: &'a mut CommentInjector<W>,
    chunk: &'a [u8],
}

impl<W: Write> EventSink for ChunkSink<'_, W> {
    fn extension(&mut self, _event: ExtensionEvent<'_>) -> GifResult<()> {
        Ok(())
    }

    fn transition(&mut self, event: StateTransition) -> GifResult<()> {
        self.injector.on_transition(event, self.chunk)
    }
}

impl<W: Write> CommentInjector<W> {
    pub fn new(out: W, comments: CommentList) -> Self {
        CommentInjector {
            out,
            comments,
            injected: false,
            written: 0,
        }
    }

    /// Whether the comment batch has been written yet
    pub fn has_injected(&self) -> bool {
        self.injected
    }

    /// Parse one chunk and write it through, splicing the comment batch if
    /// the chunk contains the first top-level block boundary.
    pub fn feed_chunk(&mut self, parser: &mut Parser, chunk: &[u8]) -> GifResult<()> {
        self.written = 0;
        let mut sink = ChunkSink {
            injector: &mut *self,
            chunk,
        };
        parser.feed(chunk, &mut sink)?;
        self.out.write_all(&chunk[self.written..])?;
        self.written = 0;
        Ok(())
    }

    fn on_transition(&mut self, event: StateTransition, chunk: &[u8]) -> GifResult<()> {
        if self.injected || !event.state.is_block_start() {
            return Ok(());
        }
        // everything before the introducer byte goes out first, then the
        // new blocks; the introducer and the rest of the chunk follow in
        // feed_chunk
        self.out.write_all(&chunk[..event.chunk_offset])?;
        self.written = event.chunk_offset;
        for comment in self.comments.iter() {
            self.out.write_all(&encode_comment_block(comment))?;
        }
        self.injected = true;
        Ok(())
    }

    pub fn flush(&mut self) -> GifResult<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Copy `input` to `output` with `comments` spliced in at the first
/// top-level block boundary.
///
/// Returns the parser for header-field inspection and the
/// [`Parser::finish`] EOF check. If parsing fails before the splice point,
/// no injected output is produced.
pub fn inject_reader<R: Read, W: Write>(
    mut input: R,
    output: W,
    comments: CommentList,
) -> GifResult<Parser> {
    let mut parser = Parser::new();
    let mut injector = CommentInjector::new(output, comments);
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        injector.feed_chunk(&mut parser, &buf[..n])?;
    }
    injector.flush()?;
    Ok(parser)
}
