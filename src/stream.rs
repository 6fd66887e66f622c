//! Text streams with checkpointed backtracking.
//!
//! A [`TextStream`] feeds the parser one byte at a time from a growable ring
//! buffer. It runs in one of two fill modes:
//!
//! - **pull**: an [`io::Read`] source is drained lazily whenever the cursor
//!   catches up with the buffered data;
//! - **push**: the host appends data itself with [`TextStream::write_tail`].
//!
//! Backtracking is expressed through [`Checkpoint`] values. A checkpoint is
//! not cloneable and must be consumed exactly once, by
//! [`Cursor::commit`] (keep the progress) or [`Cursor::backtrack`] (restore
//! the cursor), so an asymmetric release cannot be written. Releasing against
//! the wrong stream or targeting discarded text is a buffer-invariant
//! violation and panics.

use crate::buffer::RingBuffer;
use crate::collision::TokenRegistry;
use crate::source_location::{Position, StreamPosition};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Default ring allocation for new streams.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Configuration for a [`TextStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Initial ring allocation in bytes.
    pub buffer_size: usize,
    /// Whether the ring may grow when it fills up. With growth disabled a
    /// full buffer makes reads fail until the host discards consumed text.
    pub grow_when_full: bool,
}

impl StreamConfig {
    /// Creates a config with the given buffer size and growth enabled.
    pub fn new(buffer_size: usize) -> Self {
        StreamConfig {
            buffer_size,
            grow_when_full: true,
        }
    }

    /// Sets the initial buffer size.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Enables or disables growth on a full buffer.
    pub fn with_growth(mut self, grow_when_full: bool) -> Self {
        self.grow_when_full = grow_when_full;
        self
    }

    /// A small fixed-size buffer that never grows. Useful for enforcing a
    /// memory bound together with `discard_before`.
    pub fn fixed(buffer_size: usize) -> Self {
        StreamConfig {
            buffer_size,
            grow_when_full: false,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig::new(DEFAULT_BUFFER_SIZE)
    }
}

/// Errors raised by stream operations.
///
/// End of input is not an error; it is the `None` return of the char
/// accessors. An I/O failure is remembered and reported here so callers can
/// tell the two apart.
#[derive(Debug)]
pub enum StreamError {
    /// The underlying reader failed.
    Io(io::Error),
    /// The buffer is full, growth is disabled and nothing has been
    /// discarded.
    BufferFull,
    /// `discard_before` was called while checkpoints are outstanding.
    CheckpointsOutstanding {
        /// Number of unreleased checkpoints.
        outstanding: usize,
    },
    /// The requested offset is not inside the retained window.
    OffsetOutOfWindow {
        /// The offset that was asked for.
        requested: u64,
        /// First retained offset.
        window_start: u64,
        /// One past the last retained offset.
        window_end: u64,
    },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Io(err) => write!(f, "read error: {}", err),
            StreamError::BufferFull => {
                write!(f, "buffer is full and growth is disabled")
            }
            StreamError::CheckpointsOutstanding { outstanding } => write!(
                f,
                "cannot discard retained text: {} checkpoint(s) outstanding",
                outstanding
            ),
            StreamError::OffsetOutOfWindow {
                requested,
                window_start,
                window_end,
            } => write!(
                f,
                "offset {} is outside the retained window {}..{}",
                requested, window_start, window_end
            ),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// A saved stream position that must be released exactly once.
///
/// Obtained from [`Cursor::checkpoint`] and consumed by value by either
/// [`Cursor::commit`] or [`Cursor::backtrack`]. The type is deliberately not
/// `Clone`, which makes a double release or a leaked release a compile
/// error rather than a runtime accounting bug.
#[derive(Debug)]
#[must_use = "a checkpoint must be committed or backtracked"]
pub struct Checkpoint {
    pos: StreamPosition,
}

impl Checkpoint {
    /// The line/column position the checkpoint was taken at.
    pub fn position(&self) -> Position {
        self.pos.position()
    }

    /// The full stream position the checkpoint was taken at.
    pub fn stream_position(&self) -> StreamPosition {
        self.pos
    }
}

/// The capability surface rules parse against.
///
/// [`TextStream`] is the canonical implementation; the trait exists so
/// combinators stay independent of the concrete stream.
pub trait Cursor {
    /// The byte under the cursor, or `None` at end of input. May trigger a
    /// read in pull mode.
    fn current_char(&mut self) -> Option<u8>;

    /// Consumes and returns the byte under the cursor, advancing the
    /// position.
    fn next_char(&mut self) -> Option<u8>;

    /// The full position of the cursor.
    fn stream_position(&self) -> StreamPosition;

    /// The line/column position of the cursor.
    fn position(&self) -> Position {
        self.stream_position().position()
    }

    /// Saves the current position for a later [`commit`](Self::commit) or
    /// [`backtrack`](Self::backtrack).
    fn checkpoint(&mut self) -> Checkpoint;

    /// Releases a checkpoint, keeping all progress made since it was taken.
    fn commit(&mut self, checkpoint: Checkpoint);

    /// Releases a checkpoint and restores the cursor to it.
    ///
    /// # Panics
    ///
    /// Panics if the checkpoint's text has been discarded or no checkpoint
    /// is outstanding; both mean the parser itself is broken.
    fn backtrack(&mut self, checkpoint: Checkpoint);

    /// The token collision registry installed by the top-level rule, if any.
    fn token_registry(&self) -> Option<&TokenRegistry>;

    /// Installs a token collision registry for the duration of a parse.
    fn install_token_registry(&mut self, registry: TokenRegistry);

    /// Removes the installed registry.
    fn remove_token_registry(&mut self) -> Option<TokenRegistry>;
}

/// A byte stream over a growable ring buffer.
pub struct TextStream {
    source: Option<Box<dyn Read>>,
    buf: RingBuffer,
    pos: StreamPosition,
    grow_when_full: bool,
    nesting: usize,
    error: Option<StreamError>,
    registry: Option<TokenRegistry>,
}

impl fmt::Debug for TextStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextStream")
            .field("pull_mode", &self.source.is_some())
            .field("pos", &self.pos)
            .field("nesting", &self.nesting)
            .finish()
    }
}

impl TextStream {
    fn with_source(source: Option<Box<dyn Read>>, config: StreamConfig) -> Self {
        TextStream {
            source,
            buf: RingBuffer::new(config.buffer_size),
            pos: StreamPosition::start(),
            grow_when_full: config.grow_when_full,
            nesting: 0,
            error: None,
            registry: None,
        }
    }

    /// A pull-mode stream reading from `source` with the default config.
    pub fn from_reader<R: Read + 'static>(source: R) -> Self {
        TextStream::from_reader_with(source, StreamConfig::default())
    }

    /// A pull-mode stream reading from `source`.
    pub fn from_reader_with<R: Read + 'static>(source: R, config: StreamConfig) -> Self {
        TextStream::with_source(Some(Box::new(source)), config)
    }

    /// Opens a file as a pull-mode stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StreamError> {
        let file = File::open(path).map_err(StreamError::Io)?;
        Ok(TextStream::from_reader(file))
    }

    /// A push-mode stream with the default config; fill it with
    /// [`write_tail`](Self::write_tail).
    pub fn push_mode() -> Self {
        TextStream::push_mode_with(StreamConfig::default())
    }

    /// A push-mode stream.
    pub fn push_mode_with(config: StreamConfig) -> Self {
        TextStream::with_source(None, config)
    }

    /// Appends bytes to the stream. Grows the buffer when needed, or fails
    /// with [`StreamError::BufferFull`] if growth is disabled.
    pub fn write_tail(&mut self, data: &[u8]) -> Result<(), StreamError> {
        if self.buf.free() < data.len() {
            if !self.grow_when_full {
                return Err(StreamError::BufferFull);
            }
            self.buf.grow(self.buf.len() + data.len());
        }
        if !self.buf.write_bytes(data) {
            return Err(StreamError::BufferFull);
        }
        Ok(())
    }

    /// Pulls more bytes from the source into the ring. Returns whether any
    /// new bytes arrived.
    fn fill(&mut self) -> bool {
        if self.source.is_none() {
            return false;
        }
        if self.buf.free() == 0 {
            if !self.grow_when_full {
                self.error = Some(StreamError::BufferFull);
                return false;
            }
            self.buf.grow(self.buf.capacity() + 1);
        }

        let (first, second) = self.buf.spare_slices_mut();
        let source = match self.source.as_mut() {
            Some(source) => source,
            None => return false,
        };

        let mut total;
        loop {
            match source.read(first) {
                Ok(n) => {
                    total = n;
                    break;
                }
                // an interrupted read is not end of input; retry it
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.error = Some(StreamError::Io(err));
                    return false;
                }
            }
        }
        if total == first.len() && !second.is_empty() {
            loop {
                match source.read(second) {
                    Ok(m) => {
                        total += m;
                        break;
                    }
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => {
                        // keep the bytes already read, but remember the failure
                        self.error = Some(StreamError::Io(err));
                        break;
                    }
                }
            }
        }
        self.buf.commit_write(total);
        total > 0
    }

    fn release_checkpoint(&mut self) {
        if self.nesting == 0 {
            panic!("checkpoint released with none outstanding; the parser is broken");
        }
        self.nesting -= 1;
    }

    /// Number of checkpoints taken and not yet released. Zero between
    /// well-formed parses.
    pub fn outstanding_checkpoints(&self) -> usize {
        self.nesting
    }

    /// The last stream error, if any. Distinguishes a read failure or a
    /// stalled fixed-size buffer from plain end of input.
    pub fn last_error(&self) -> Option<&StreamError> {
        self.error.as_ref()
    }

    /// Drops retained text before `pos`, bounding memory for long-running
    /// streams. Rejected while any checkpoint is outstanding, since a
    /// backtrack could still target the dropped range.
    pub fn discard_before(&mut self, pos: StreamPosition) -> Result<(), StreamError> {
        if self.nesting > 0 {
            return Err(StreamError::CheckpointsOutstanding {
                outstanding: self.nesting,
            });
        }
        if !self.buf.discard_to_offset(pos.offset) {
            return Err(StreamError::OffsetOutOfWindow {
                requested: pos.offset,
                window_start: self.buf.head_offset(),
                window_end: self.buf.head_offset() + self.buf.len() as u64,
            });
        }
        // a stalled fixed-size stream can make progress again
        if matches!(self.error, Some(StreamError::BufferFull)) {
            self.error = None;
        }
        Ok(())
    }
}

impl Cursor for TextStream {
    fn current_char(&mut self) -> Option<u8> {
        if self.buf.cursor_at_tail() && !self.fill() {
            return None;
        }
        if self.buf.cursor_at_tail() {
            return None;
        }
        Some(self.buf.cursor_byte())
    }

    fn next_char(&mut self) -> Option<u8> {
        let ch = self.current_char()?;
        self.buf.advance_cursor();
        self.pos.advance(ch);
        Some(ch)
    }

    fn stream_position(&self) -> StreamPosition {
        self.pos
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.nesting += 1;
        Checkpoint { pos: self.pos }
    }

    fn commit(&mut self, checkpoint: Checkpoint) {
        drop(checkpoint);
        self.release_checkpoint();
    }

    fn backtrack(&mut self, checkpoint: Checkpoint) {
        if !self.buf.set_cursor_offset(checkpoint.pos.offset) {
            panic!(
                "backtrack target {} is outside the retained window starting at offset {}",
                checkpoint.pos,
                self.buf.head_offset()
            );
        }
        self.pos = checkpoint.pos;
        self.release_checkpoint();
    }

    fn token_registry(&self) -> Option<&TokenRegistry> {
        self.registry.as_ref()
    }

    fn install_token_registry(&mut self, registry: TokenRegistry) {
        self.registry = Some(registry);
    }

    fn remove_token_registry(&mut self) -> Option<TokenRegistry> {
        self.registry.take()
    }
}
