//! Metadata extraction: event consumers and the chunked scan driver

use std::io::Read;

use crate::gif::ExtensionKind;
use crate::parser::{EventSink, ExtensionEvent, Parser};
use crate::{GifError, GifResult};

/// Chunk size used when draining a reader through the parser. The decode is
/// chunk-size independent; this only sizes the read buffer.
pub const READ_CHUNK_SIZE: usize = 2048;

/// An extension block copied out of the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataBlock {
    pub kind: ExtensionKind,
    pub payload: Vec<u8>,
}

impl MetadataBlock {
    /// Payload rendered as text, with invalid UTF-8 replaced
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Sink that keeps an owned copy of every decoded extension block.
///
/// Event payloads only live for the duration of the sink call, so the
/// collector copies them out.
#[derive(Debug, Default)]
pub struct MetadataCollector {
    pub blocks: Vec<MetadataBlock>,
}

impl MetadataCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Comment payloads only, in stream order
    pub fn comments(&self) -> impl Iterator<Item = &MetadataBlock> {
        self.blocks
            .iter()
            .filter(|b| b.kind == ExtensionKind::Comment)
    }
}

impl EventSink for MetadataCollector {
    fn extension(&mut self, event: ExtensionEvent<'_>) -> GifResult<()> {
        let mut payload = Vec::new();
        payload
            .try_reserve_exact(event.payload.len())
            .map_err(|_| GifError::AllocationFailed)?;
        payload.extend_from_slice(event.payload);
        self.blocks.push(MetadataBlock {
            kind: event.kind,
            payload,
        });
        Ok(())
    }
}

/// Drain `input` through a fresh parser, raising events on `sink`.
///
/// Returns the parser so callers can inspect the decoded header fields and
/// check [`Parser::finish`] for the unexpected-EOF warning.
pub fn scan_reader<R: Read>(mut input: R, sink: &mut dyn EventSink) -> GifResult<Parser> {
    let mut parser = Parser::new();
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        parser.feed(&buf[..n], sink)?;
    }
    Ok(parser)
}
