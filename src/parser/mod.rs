//! Incremental GIF structural parser
//!
//! [`Parser::feed`] consumes a logical stream as a sequence of byte chunks of
//! any size and walks the GIF container structure without decoding pixel
//! data. Fields and length-prefixed sub-blocks may be split arbitrarily
//! across chunks; the decoded result is identical for every chunking, from
//! one-byte chunks up to the whole file at once.
//!
//! Completed extension blocks and structural state changes are reported
//! synchronously through an [`EventSink`] passed to each `feed` call.

pub mod scratch;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, trace};

use crate::gif::{self, ExtensionKind, Version};
use crate::{GifError, GifResult};
use scratch::{Scratchpad, SubBlock};

/// Length of the `GIF87a`/`GIF89a` signature
const SIGNATURE_LEN: usize = 6;
/// Fixed image descriptor size after the 0x2C separator, before the packed byte
const IMAGE_DESCRIPTOR_LEN: usize = 8;

/// Structural region the parser is currently reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    Header,
    LogicalScreenDescriptor,
    GlobalColorTable,
    /// Scanning for the next block introducer; stray bytes are skipped
    Searching,
    /// Consumed the 0x21 introducer, next byte is the extension label
    Extension,
    KnownExtension,
    UnknownExtension,
    ImageDescriptor,
    LocalColorTable,
    ImageData,
    /// Terminal success state
    Trailer,
}

impl ReadState {
    /// True for states that begin a top-level block. The injection writer
    /// splices immediately before the byte that triggered one of these.
    pub fn is_block_start(self) -> bool {
        matches!(
            self,
            ReadState::Extension | ReadState::ImageDescriptor | ReadState::Trailer
        )
    }
}

/// Field currently being decoded within the logical screen descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LsdField {
    Width,
    Height,
    Packed,
    BackgroundColor,
    PixelAspectRatio,
}

/// A completed extension block.
///
/// The payload borrows the parser's scratch buffer and is only valid for the
/// duration of the sink call; consumers copy out anything they keep.
#[derive(Debug, Clone, Copy)]
pub struct ExtensionEvent<'a> {
    pub kind: ExtensionKind,
    pub payload: &'a [u8],
}

/// Emitted whenever the parser moves to a new structural region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub state: ReadState,
    /// Chunk-local offset of the first byte belonging to the new region.
    /// For block-start states this is the introducer byte itself; for
    /// region-completion transitions it may equal the chunk length when the
    /// new region begins in the next chunk.
    pub chunk_offset: usize,
}

/// Receiver for parse events, invoked synchronously during [`Parser::feed`].
pub trait EventSink {
    /// A complete extension block has been decoded.
    fn extension(&mut self, event: ExtensionEvent<'_>) -> GifResult<()>;

    /// The parser moved to a new structural region.
    fn transition(&mut self, _event: StateTransition) -> GifResult<()> {
        Ok(())
    }
}

/// Chunk-fed GIF structural parser.
///
/// Create one per input stream, call [`feed`](Parser::feed) for each chunk in
/// stream order, then [`finish`](Parser::finish) to learn whether the trailer
/// was reached. Partial state is inert and can simply be dropped.
#[derive(Debug)]
pub struct Parser {
    read_state: ReadState,
    lsd_field: LsdField,
    scratch: Scratchpad,
    sub_block: SubBlock,
    /// Valid only while decoding a known extension's sub-blocks
    extension_kind: ExtensionKind,
    /// Global color table length computed from the LSD packed byte
    color_table_len: usize,
    /// Bytes left to skip in the current fixed-size region
    skip: usize,
    canvas_width: u16,
    canvas_height: u16,
    version: Version,
    /// Count of stream bytes already consumed by previous chunks
    stream_offset: u64,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            read_state: ReadState::Header,
            lsd_field: LsdField::Width,
            scratch: Scratchpad::new(),
            sub_block: SubBlock::AwaitingLength,
            extension_kind: ExtensionKind::Comment,
            color_table_len: 0,
            skip: 0,
            canvas_width: 0,
            canvas_height: 0,
            version: Version::Unknown,
            stream_offset: 0,
        }
    }

    /// Canvas width from the logical screen descriptor
    pub fn canvas_width(&self) -> u16 {
        self.canvas_width
    }

    /// Canvas height from the logical screen descriptor
    pub fn canvas_height(&self) -> u16 {
        self.canvas_height
    }

    /// GIF standard version from the signature
    pub fn version(&self) -> Version {
        self.version
    }

    /// Current structural region
    pub fn read_state(&self) -> ReadState {
        self.read_state
    }

    /// Total bytes consumed across all chunks fed so far
    pub fn stream_offset(&self) -> u64 {
        self.stream_offset
    }

    /// Check the end-of-stream condition once no more chunks are available.
    ///
    /// Returns [`GifError::UnexpectedEof`] when the stream ended before the
    /// trailer byte. This is warning-grade: every event already emitted
    /// remains valid, but the file may hold further undiscovered blocks.
    pub fn finish(&self) -> GifResult<()> {
        if self.read_state == ReadState::Trailer {
            Ok(())
        } else {
            Err(GifError::UnexpectedEof)
        }
    }

    /// Advance the state machine over one chunk of the stream.
    ///
    /// Chunks must be delivered in stream order; their size is free, down to
    /// a single byte. Extension and transition events are raised on `sink`
    /// while the chunk is consumed.
    pub fn feed(&mut self, chunk: &[u8], sink: &mut dyn EventSink) -> GifResult<()> {
        let mut pos = 0;
        while pos < chunk.len() {
            let consumed = self.step(&chunk[pos..], pos, sink)?;
            debug_assert!(consumed > 0);
            pos += consumed;
        }
        self.stream_offset += chunk.len() as u64;
        Ok(())
    }

    /// Set the new read state and notify the sink. `offset` is the
    /// chunk-local offset of the first byte of the new region.
    fn enter(
        &mut self,
        state: ReadState,
        offset: usize,
        sink: &mut dyn EventSink,
    ) -> GifResult<()> {
        self.read_state = state;
        sink.transition(StateTransition {
            state,
            chunk_offset: offset,
        })
    }

    fn emit_extension(&self, sink: &mut dyn EventSink) -> GifResult<()> {
        sink.extension(ExtensionEvent {
            kind: self.extension_kind,
            payload: self.scratch.as_slice(),
        })
    }

    /// Consume bytes from the front of `rest` according to the current
    /// state. `pos` is the chunk-local offset of `rest[0]`. Returns the
    /// number of bytes consumed, always at least one.
    fn step(&mut self, rest: &[u8], pos: usize, sink: &mut dyn EventSink) -> GifResult<usize> {
        let b = rest[0];
        match self.read_state {
            ReadState::Header => {
                let take = (SIGNATURE_LEN - self.scratch.len()).min(rest.len());
                for &byte in &rest[..take] {
                    self.scratch.push(byte)?;
                }
                if self.scratch.len() == SIGNATURE_LEN {
                    self.version = parse_signature(self.scratch.as_slice())?;
                    debug!("gif version {}", self.version);
                    self.scratch.clear();
                    self.lsd_field = LsdField::Width;
                    self.enter(ReadState::LogicalScreenDescriptor, pos + take, sink)?;
                }
                Ok(take)
            }

            ReadState::LogicalScreenDescriptor => self.lsd_step(b, pos, sink),

            ReadState::GlobalColorTable => {
                let take = self.skip.min(rest.len());
                self.skip -= take;
                if self.skip == 0 {
                    debug!("finished the global color table");
                    self.enter(ReadState::Searching, pos + take, sink)?;
                }
                Ok(take)
            }

            ReadState::Searching => {
                match b {
                    gif::EXTENSION_INTRODUCER => {
                        debug!("found an extension");
                        self.enter(ReadState::Extension, pos, sink)?;
                    }
                    gif::IMAGE_SEPARATOR => {
                        debug!("found an image descriptor");
                        self.skip = IMAGE_DESCRIPTOR_LEN;
                        self.enter(ReadState::ImageDescriptor, pos, sink)?;
                    }
                    gif::TRAILER => {
                        debug!("found the trailer");
                        self.enter(ReadState::Trailer, pos, sink)?;
                    }
                    other => {
                        // tolerated: corrupt and non-conforming files carry junk here
                        trace!("skipping stray byte {other:#04x}");
                    }
                }
                Ok(1)
            }

            ReadState::Extension => {
                self.scratch.clear();
                self.sub_block = SubBlock::AwaitingLength;
                match b {
                    gif::LABEL_PLAIN_TEXT => {
                        debug!("found a plain text extension");
                        self.extension_kind = ExtensionKind::PlainText;
                        self.enter(ReadState::KnownExtension, pos + 1, sink)?;
                    }
                    gif::LABEL_APPLICATION => {
                        debug!("found an application extension");
                        self.extension_kind = ExtensionKind::Application;
                        self.enter(ReadState::KnownExtension, pos + 1, sink)?;
                    }
                    gif::LABEL_COMMENT => {
                        debug!("found a comment extension");
                        self.extension_kind = ExtensionKind::Comment;
                        self.enter(ReadState::KnownExtension, pos + 1, sink)?;
                    }
                    other => {
                        debug!("found an unknown extension ({other:#04x})");
                        self.enter(ReadState::UnknownExtension, pos + 1, sink)?;
                    }
                }
                Ok(1)
            }

            ReadState::KnownExtension => self.known_extension_step(b, pos, sink),

            ReadState::UnknownExtension => match self.sub_block {
                SubBlock::AwaitingLength => {
                    if b == 0 {
                        debug!("reached the end of the unknown extension");
                        self.enter(ReadState::Searching, pos + 1, sink)?;
                    } else {
                        self.sub_block = SubBlock::Accumulating {
                            needed: b as usize,
                            have: 0,
                        };
                    }
                    Ok(1)
                }
                SubBlock::Accumulating { needed, have } => {
                    let take = (needed - have).min(rest.len());
                    let have = have + take;
                    self.sub_block = if have == needed {
                        SubBlock::AwaitingLength
                    } else {
                        SubBlock::Accumulating { needed, have }
                    };
                    Ok(take)
                }
            },

            ReadState::ImageDescriptor => {
                if self.skip > 0 {
                    let take = self.skip.min(rest.len());
                    self.skip -= take;
                    Ok(take)
                } else {
                    // packed byte: bit 7 flags a local color table
                    if b & 0x80 != 0 {
                        self.skip = gif::color_table_len(b & 0x07);
                        debug!("image has a local color table of {} bytes", self.skip);
                        self.enter(ReadState::LocalColorTable, pos + 1, sink)?;
                    } else {
                        self.skip = 1;
                        self.enter(ReadState::ImageData, pos + 1, sink)?;
                    }
                    Ok(1)
                }
            }

            ReadState::LocalColorTable => {
                let take = self.skip.min(rest.len());
                self.skip -= take;
                if self.skip == 0 {
                    debug!("reached the end of the local color table");
                    self.skip = 1;
                    self.enter(ReadState::ImageData, pos + take, sink)?;
                }
                Ok(take)
            }

            ReadState::ImageData => {
                if self.skip > 0 {
                    // LZW minimum code size marker
                    self.skip = 0;
                    self.sub_block = SubBlock::AwaitingLength;
                    Ok(1)
                } else {
                    match self.sub_block {
                        SubBlock::AwaitingLength => {
                            if b == 0 {
                                debug!("reached the end of image data blocks");
                                self.enter(ReadState::Searching, pos + 1, sink)?;
                            } else {
                                self.sub_block = SubBlock::Accumulating {
                                    needed: b as usize,
                                    have: 0,
                                };
                            }
                            Ok(1)
                        }
                        SubBlock::Accumulating { needed, have } => {
                            let take = (needed - have).min(rest.len());
                            let have = have + take;
                            self.sub_block = if have == needed {
                                SubBlock::AwaitingLength
                            } else {
                                SubBlock::Accumulating { needed, have }
                            };
                            Ok(take)
                        }
                    }
                }
            }

            // anything after the trailer is ignored
            ReadState::Trailer => Ok(rest.len()),
        }
    }

    fn lsd_step(&mut self, b: u8, pos: usize, sink: &mut dyn EventSink) -> GifResult<usize> {
        match self.lsd_field {
            LsdField::Width | LsdField::Height => {
                self.scratch.push(b)?;
                if self.scratch.len() == 2 {
                    let value = LittleEndian::read_u16(self.scratch.as_slice());
                    if self.lsd_field == LsdField::Width {
                        debug!("canvas width: {value}");
                        self.canvas_width = value;
                        self.lsd_field = LsdField::Height;
                    } else {
                        debug!("canvas height: {value}");
                        self.canvas_height = value;
                        self.lsd_field = LsdField::Packed;
                    }
                    self.scratch.clear();
                }
                Ok(1)
            }
            LsdField::Packed => {
                let color_resolution = (b >> 4) & 0x07;
                trace!("color resolution: {color_resolution}");
                if b & 0x80 != 0 {
                    self.color_table_len = gif::color_table_len(b & 0x07);
                    debug!("global color table of {} bytes", self.color_table_len);
                } else {
                    self.color_table_len = 0;
                }
                self.lsd_field = LsdField::BackgroundColor;
                Ok(1)
            }
            // the background color index and pixel aspect ratio bytes are
            // opaque to us but still part of the descriptor
            LsdField::BackgroundColor => {
                self.lsd_field = LsdField::PixelAspectRatio;
                Ok(1)
            }
            LsdField::PixelAspectRatio => {
                if self.color_table_len > 0 {
                    self.skip = self.color_table_len;
                    self.enter(ReadState::GlobalColorTable, pos + 1, sink)?;
                } else {
                    self.enter(ReadState::Searching, pos + 1, sink)?;
                }
                Ok(1)
            }
        }
    }

    fn known_extension_step(
        &mut self,
        b: u8,
        pos: usize,
        sink: &mut dyn EventSink,
    ) -> GifResult<usize> {
        match self.sub_block {
            SubBlock::AwaitingLength => {
                if b == 0 {
                    debug!("extension terminated by an empty block");
                    self.enter(ReadState::Searching, pos + 1, sink)?;
                } else {
                    self.sub_block = SubBlock::Accumulating {
                        needed: b as usize,
                        have: 0,
                    };
                    self.scratch.clear();
                }
                Ok(1)
            }
            SubBlock::Accumulating { needed, have } if have < needed => {
                self.scratch.push(b)?;
                let have = have + 1;
                self.sub_block = SubBlock::Accumulating { needed, have };
                if have == needed && self.extension_kind != ExtensionKind::Comment {
                    // non-comment blocks obey their declared length exactly
                    self.emit_extension(sink)?;
                    match self.extension_kind {
                        ExtensionKind::Application | ExtensionKind::ApplicationSubblock => {
                            // an application extension is one label followed
                            // by a chain of sub-blocks
                            self.extension_kind = ExtensionKind::ApplicationSubblock;
                            self.sub_block = SubBlock::AwaitingLength;
                        }
                        _ => self.enter(ReadState::Searching, pos + 1, sink)?,
                    }
                }
                Ok(1)
            }
            SubBlock::Accumulating { .. } => {
                // only comments reach here: the declared length has been met
                // but real-world files overrun it, so accumulate until NUL
                if b == 0 {
                    self.emit_extension(sink)?;
                    self.enter(ReadState::Searching, pos + 1, sink)?;
                } else {
                    self.scratch.push(b)?;
                }
                Ok(1)
            }
        }
    }
}

fn parse_signature(sig: &[u8]) -> GifResult<Version> {
    if &sig[..3] != gif::SIGNATURE {
        return Err(GifError::InvalidSignature);
    }
    match &sig[3..SIGNATURE_LEN] {
        v if v == gif::VERSION_87A => Ok(Version::V87a),
        v if v == gif::VERSION_89A => Ok(Version::V89a),
        _ => Err(GifError::InvalidSignature),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Sink recording owned copies of every event for later comparison
    #[derive(Debug, Default, PartialEq)]
    struct RecordingSink {
        extensions: Vec<(ExtensionKind, Vec<u8>)>,
        transitions: Vec<ReadState>,
    }

    impl EventSink for RecordingSink {
        fn extension(&mut self, event: ExtensionEvent<'_>) -> GifResult<()> {
            self.extensions.push((event.kind, event.payload.to_vec()));
            Ok(())
        }

        fn transition(&mut self, event: StateTransition) -> GifResult<()> {
            self.transitions.push(event.state);
            Ok(())
        }
    }

    /// `GIF89a`, 10x20 canvas, no global color table, bg + aspect zeroed
    fn header_no_gct() -> Vec<u8> {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[10, 0, 20, 0, 0x00, 0x00, 0x00]);
        bytes
    }

    /// Header plus a global color table of two entries (packed exponent 0)
    fn header_with_gct() -> Vec<u8> {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[10, 0, 20, 0, 0x80, 0x00, 0x00]);
        bytes.extend_from_slice(&[0xAA; 6]);
        bytes
    }

    fn comment_block(payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x21, 0xFE, payload.len() as u8];
        bytes.extend_from_slice(payload);
        bytes.push(0x00);
        bytes
    }

    /// Minimal image block: descriptor, no local color table, one data sub-block
    fn image_block() -> Vec<u8> {
        let mut bytes = vec![0x2C];
        bytes.extend_from_slice(&[0, 0, 0, 0, 1, 0, 1, 0]); // left/top/width/height
        bytes.push(0x00); // packed: no local color table
        bytes.push(0x02); // lzw minimum code size
        bytes.extend_from_slice(&[3, 0x44, 0x55, 0x66]); // one data sub-block
        bytes.push(0x00); // end of image data
        bytes
    }

    fn parse_all(bytes: &[u8]) -> (Parser, RecordingSink) {
        let mut parser = Parser::new();
        let mut sink = RecordingSink::default();
        parser.feed(bytes, &mut sink).unwrap();
        (parser, sink)
    }

    #[test]
    fn test_simple_comment_file() {
        let mut bytes = header_no_gct();
        bytes.extend_from_slice(&comment_block(b"hi"));
        bytes.push(0x3B);

        let (parser, sink) = parse_all(&bytes);
        assert_eq!(parser.canvas_width(), 10);
        assert_eq!(parser.canvas_height(), 20);
        assert_eq!(parser.version(), Version::V89a);
        assert_eq!(parser.read_state(), ReadState::Trailer);
        assert!(parser.finish().is_ok());
        assert_eq!(
            sink.extensions,
            vec![(ExtensionKind::Comment, b"hi".to_vec())]
        );
    }

    #[test]
    fn test_version_87a() {
        let mut bytes = b"GIF87a".to_vec();
        bytes.extend_from_slice(&[1, 0, 1, 0, 0x00, 0x00, 0x00, 0x3B]);
        let (parser, _) = parse_all(&bytes);
        assert_eq!(parser.version(), Version::V87a);
        assert!(parser.finish().is_ok());
    }

    #[test]
    fn test_invalid_signature() {
        let mut parser = Parser::new();
        let mut sink = RecordingSink::default();
        let err = parser.feed(b"JIF89a", &mut sink).unwrap_err();
        assert!(matches!(err, GifError::InvalidSignature));
    }

    #[test]
    fn test_unsupported_version_is_invalid_signature() {
        let mut parser = Parser::new();
        let mut sink = RecordingSink::default();
        let err = parser.feed(b"GIF88a", &mut sink).unwrap_err();
        assert!(matches!(err, GifError::InvalidSignature));
    }

    #[test]
    fn test_global_color_table_is_skipped() {
        let mut bytes = header_with_gct();
        bytes.extend_from_slice(&comment_block(b"after gct"));
        bytes.push(0x3B);

        let (parser, sink) = parse_all(&bytes);
        assert!(parser.finish().is_ok());
        assert_eq!(
            sink.extensions,
            vec![(ExtensionKind::Comment, b"after gct".to_vec())]
        );
    }

    #[test]
    fn test_comment_overrun_is_captured_in_full() {
        // declared length 5, but 300 non-zero bytes before the terminator
        let mut bytes = header_no_gct();
        bytes.extend_from_slice(&[0x21, 0xFE, 5]);
        bytes.extend_from_slice(&vec![b'x'; 300]);
        bytes.push(0x00);
        bytes.push(0x3B);

        let (parser, sink) = parse_all(&bytes);
        assert!(parser.finish().is_ok());
        assert_eq!(sink.extensions.len(), 1);
        let (kind, payload) = &sink.extensions[0];
        assert_eq!(*kind, ExtensionKind::Comment);
        assert_eq!(payload.len(), 300);
    }

    #[test]
    fn test_comment_over_cap_is_fatal() {
        let mut bytes = header_no_gct();
        bytes.extend_from_slice(&[0x21, 0xFE, 255]);
        bytes.extend_from_slice(&vec![b'x'; scratch::MAX_SCRATCH + 10]);

        let mut parser = Parser::new();
        let mut sink = RecordingSink::default();
        let err = parser.feed(&bytes, &mut sink).unwrap_err();
        assert!(matches!(err, GifError::CommentTooLarge { .. }));
        // no partial event
        assert!(sink.extensions.is_empty());
    }

    #[test]
    fn test_empty_comment_block_emits_nothing() {
        let mut bytes = header_no_gct();
        bytes.extend_from_slice(&[0x21, 0xFE, 0x00, 0x3B]);
        let (parser, sink) = parse_all(&bytes);
        assert!(parser.finish().is_ok());
        assert!(sink.extensions.is_empty());
    }

    #[test]
    fn test_application_subblock_chain() {
        // one 3-byte sub-block, one 2-byte sub-block, then the terminator
        let mut bytes = header_no_gct();
        bytes.extend_from_slice(&[0x21, 0xFF, 3, b'a', b'b', b'c', 2, b'd', b'e', 0x00]);
        bytes.push(0x3B);

        let (parser, sink) = parse_all(&bytes);
        assert!(parser.finish().is_ok());
        assert_eq!(
            sink.extensions,
            vec![
                (ExtensionKind::Application, b"abc".to_vec()),
                (ExtensionKind::ApplicationSubblock, b"de".to_vec()),
            ]
        );
    }

    #[test]
    fn test_unknown_extension_is_skipped_without_events() {
        let mut bytes = header_no_gct();
        // graphic control extension: skipped, no events
        bytes.extend_from_slice(&[0x21, 0xF9, 4, 0x00, 0x00, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(&comment_block(b"kept"));
        bytes.push(0x3B);

        let (parser, sink) = parse_all(&bytes);
        assert!(parser.finish().is_ok());
        assert_eq!(
            sink.extensions,
            vec![(ExtensionKind::Comment, b"kept".to_vec())]
        );
    }

    #[test]
    fn test_image_data_is_skipped() {
        let mut bytes = header_no_gct();
        bytes.extend_from_slice(&image_block());
        bytes.extend_from_slice(&comment_block(b"after image"));
        bytes.push(0x3B);

        let (parser, sink) = parse_all(&bytes);
        assert!(parser.finish().is_ok());
        assert_eq!(
            sink.extensions,
            vec![(ExtensionKind::Comment, b"after image".to_vec())]
        );
    }

    #[test]
    fn test_local_color_table_is_skipped() {
        let mut bytes = header_no_gct();
        bytes.push(0x2C);
        bytes.extend_from_slice(&[0, 0, 0, 0, 1, 0, 1, 0]);
        bytes.push(0x80); // packed: local color table, exponent 0 -> 6 bytes
        bytes.extend_from_slice(&[0xBB; 6]);
        bytes.push(0x02); // lzw minimum code size
        bytes.extend_from_slice(&[1, 0x99, 0x00]); // data sub-block + terminator
        bytes.extend_from_slice(&comment_block(b"tail"));
        bytes.push(0x3B);

        let (parser, sink) = parse_all(&bytes);
        assert!(parser.finish().is_ok());
        assert_eq!(
            sink.extensions,
            vec![(ExtensionKind::Comment, b"tail".to_vec())]
        );
    }

    #[test]
    fn test_junk_bytes_while_searching_are_tolerated() {
        let mut bytes = header_no_gct();
        bytes.extend_from_slice(&[0x01, 0x02, 0x03]); // junk, not introducers
        bytes.extend_from_slice(&comment_block(b"ok"));
        bytes.push(0x3B);

        let (parser, sink) = parse_all(&bytes);
        assert!(parser.finish().is_ok());
        assert_eq!(sink.extensions, vec![(ExtensionKind::Comment, b"ok".to_vec())]);
    }

    #[test]
    fn test_truncated_file_warns_but_does_not_crash() {
        let bytes = header_no_gct();
        let (parser, sink) = parse_all(&bytes);
        assert_ne!(parser.read_state(), ReadState::Trailer);
        assert!(matches!(parser.finish(), Err(GifError::UnexpectedEof)));
        assert!(sink.extensions.is_empty());
    }

    #[test]
    fn test_bytes_after_trailer_are_ignored() {
        let mut bytes = header_no_gct();
        bytes.push(0x3B);
        bytes.extend_from_slice(b"easter egg");

        let (parser, sink) = parse_all(&bytes);
        assert_eq!(parser.read_state(), ReadState::Trailer);
        assert!(sink.extensions.is_empty());
        assert_eq!(parser.stream_offset(), bytes.len() as u64);
    }

    #[test]
    fn test_block_start_transitions() {
        let mut bytes = header_no_gct();
        bytes.extend_from_slice(&comment_block(b"hi"));
        bytes.push(0x3B);

        let (_, sink) = parse_all(&bytes);
        let starts: Vec<ReadState> = sink
            .transitions
            .iter()
            .copied()
            .filter(|s| s.is_block_start())
            .collect();
        assert_eq!(
            starts,
            vec![ReadState::Extension, ReadState::Trailer]
        );
    }

    /// Reference file exercising every structural region
    fn full_sample() -> Vec<u8> {
        let mut bytes = header_with_gct();
        bytes.extend_from_slice(&[0x21, 0xFF, 11]);
        bytes.extend_from_slice(b"NETSCAPE2.0");
        bytes.extend_from_slice(&[3, 0x01, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(&comment_block(b"made with love"));
        bytes.extend_from_slice(&[0x21, 0xF9, 4, 0x00, 0x00, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(&image_block());
        bytes.extend_from_slice(&comment_block(b"trailing note"));
        bytes.push(0x3B);
        bytes
    }

    fn feed_in_pieces(bytes: &[u8], sizes: &[usize]) -> (Parser, RecordingSink) {
        let mut parser = Parser::new();
        let mut sink = RecordingSink::default();
        let mut rest = bytes;
        let mut sizes = sizes.iter().copied().cycle();
        while !rest.is_empty() {
            let n = sizes.next().unwrap_or(1).clamp(1, rest.len());
            let (chunk, tail) = rest.split_at(n);
            parser.feed(chunk, &mut sink).unwrap();
            rest = tail;
        }
        (parser, sink)
    }

    #[test]
    fn test_single_byte_chunks_match_whole_file() {
        let bytes = full_sample();
        let (whole_parser, whole_sink) = parse_all(&bytes);
        let (byte_parser, byte_sink) = feed_in_pieces(&bytes, &[1]);

        assert_eq!(whole_sink.extensions, byte_sink.extensions);
        assert_eq!(whole_sink.transitions, byte_sink.transitions);
        assert_eq!(whole_parser.canvas_width(), byte_parser.canvas_width());
        assert_eq!(whole_parser.canvas_height(), byte_parser.canvas_height());
        assert_eq!(whole_parser.version(), byte_parser.version());
        assert_eq!(whole_parser.read_state(), byte_parser.read_state());
    }

    proptest! {
        #[test]
        fn prop_chunking_never_changes_the_decode(
            sizes in prop::collection::vec(1usize..17, 1..40)
        ) {
            let bytes = full_sample();
            let (whole_parser, whole_sink) = parse_all(&bytes);
            let (split_parser, split_sink) = feed_in_pieces(&bytes, &sizes);

            prop_assert_eq!(whole_sink.extensions, split_sink.extensions);
            prop_assert_eq!(whole_sink.transitions, split_sink.transitions);
            prop_assert_eq!(whole_parser.canvas_width(), split_parser.canvas_width());
            prop_assert_eq!(whole_parser.canvas_height(), split_parser.canvas_height());
            prop_assert_eq!(whole_parser.version(), split_parser.version());
            prop_assert_eq!(whole_parser.read_state(), split_parser.read_state());
        }
    }
}
