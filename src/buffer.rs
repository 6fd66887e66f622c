//! Circular byte buffer backing a [`TextStream`](crate::stream::TextStream).
//!
//! The buffer keeps three indices into one allocation: `head` (oldest
//! retained byte), `tail` (one past the newest byte, never holding data) and
//! `cursor` (the parser's read point). `head == tail` means empty, and one
//! slot is always unusable, so an allocation of `n` bytes retains at most
//! `n - 1`.
//!
//! Retained bytes are addressed by their absolute offset from the start of
//! the stream. The buffer tracks the absolute offset of `head`, so growing
//! the allocation (which linearizes the data) never invalidates an offset.

/// Allocation sizes at or below this double on growth; larger allocations
/// grow linearly by this amount.
pub const GROWTH_DOUBLING_LIMIT: usize = 16 * 1024;

/// A growable ring of bytes with absolute-offset addressing.
#[derive(Debug)]
pub struct RingBuffer {
    buf: Box<[u8]>,
    head: usize,
    tail: usize,
    cursor: usize,
    head_offset: u64,
}

impl RingBuffer {
    /// Creates a buffer with the given allocation size. Usable capacity is
    /// `size - 1`; sizes below 2 are rounded up.
    pub fn new(size: usize) -> Self {
        let size = size.max(2);
        RingBuffer {
            buf: vec![0u8; size].into_boxed_slice(),
            head: 0,
            tail: 0,
            cursor: 0,
            head_offset: 0,
        }
    }

    /// True when no bytes are retained.
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// True when no more bytes can be written without growing.
    pub fn is_full(&self) -> bool {
        (self.tail + 1) % self.buf.len() == self.head
    }

    /// Number of retained bytes.
    pub fn len(&self) -> usize {
        if self.head <= self.tail {
            self.tail - self.head
        } else {
            self.buf.len() - self.head + self.tail
        }
    }

    /// Number of bytes that can still be written without growing.
    pub fn free(&self) -> usize {
        self.buf.len() - self.len() - 1
    }

    /// Largest number of bytes this allocation can retain.
    pub fn capacity(&self) -> usize {
        self.buf.len() - 1
    }

    /// True when the cursor has consumed every retained byte.
    pub fn cursor_at_tail(&self) -> bool {
        self.cursor == self.tail
    }

    /// The byte under the cursor. Must not be called with the cursor at the
    /// tail.
    pub fn cursor_byte(&self) -> u8 {
        debug_assert!(!self.cursor_at_tail());
        self.buf[self.cursor]
    }

    /// Moves the cursor one byte forward. Returns false if it already sits
    /// at the tail.
    pub fn advance_cursor(&mut self) -> bool {
        if self.cursor_at_tail() {
            return false;
        }
        self.cursor = (self.cursor + 1) % self.buf.len();
        true
    }

    fn distance(&self, from: usize, to: usize) -> usize {
        (to + self.buf.len() - from) % self.buf.len()
    }

    /// Absolute offset of the byte under the cursor.
    pub fn cursor_offset(&self) -> u64 {
        self.head_offset + self.distance(self.head, self.cursor) as u64
    }

    /// Absolute offset of the oldest retained byte.
    pub fn head_offset(&self) -> u64 {
        self.head_offset
    }

    /// True when `offset` addresses a retained byte or the end of the
    /// retained window.
    pub fn offset_in_window(&self, offset: u64) -> bool {
        offset >= self.head_offset && offset <= self.head_offset + self.len() as u64
    }

    /// Repositions the cursor at an absolute offset. Returns false when the
    /// offset is outside the retained window.
    pub fn set_cursor_offset(&mut self, offset: u64) -> bool {
        if !self.offset_in_window(offset) {
            return false;
        }
        let rel = (offset - self.head_offset) as usize;
        self.cursor = (self.head + rel) % self.buf.len();
        true
    }

    /// Drops every retained byte before `offset`, freeing its slots for new
    /// data. The cursor must not be behind `offset`.
    pub fn discard_to_offset(&mut self, offset: u64) -> bool {
        if !self.offset_in_window(offset) || offset > self.cursor_offset() {
            return false;
        }
        let rel = (offset - self.head_offset) as usize;
        self.head = (self.head + rel) % self.buf.len();
        self.head_offset = offset;
        true
    }

    /// Grows the allocation until it can retain at least `min_capacity`
    /// bytes, doubling up to [`GROWTH_DOUBLING_LIMIT`] and linearly after.
    /// Retained bytes keep their absolute offsets; the data is linearized
    /// into the new allocation.
    pub fn grow(&mut self, min_capacity: usize) {
        let mut newsize = self.buf.len();
        loop {
            if newsize <= GROWTH_DOUBLING_LIMIT {
                newsize *= 2;
            } else {
                newsize += GROWTH_DOUBLING_LIMIT;
            }
            if newsize - 1 >= min_capacity {
                break;
            }
        }

        let len = self.len();
        let cursor_rel = self.distance(self.head, self.cursor);
        let mut newbuf = vec![0u8; newsize].into_boxed_slice();
        if self.head <= self.tail {
            newbuf[..len].copy_from_slice(&self.buf[self.head..self.tail]);
        } else {
            let first = self.buf.len() - self.head;
            newbuf[..first].copy_from_slice(&self.buf[self.head..]);
            newbuf[first..len].copy_from_slice(&self.buf[..self.tail]);
        }
        self.buf = newbuf;
        self.head = 0;
        self.tail = len;
        self.cursor = cursor_rel;
    }

    /// The writable regions after the tail, in write order. The second slice
    /// is empty unless the spare area wraps around the allocation.
    pub fn spare_slices_mut(&mut self) -> (&mut [u8], &mut [u8]) {
        let size = self.buf.len();
        let (head, tail) = (self.head, self.tail);
        if tail < head {
            (&mut self.buf[tail..head - 1], &mut [])
        } else if head == 0 {
            (&mut self.buf[tail..size - 1], &mut [])
        } else {
            let (front, back) = self.buf.split_at_mut(tail);
            (back, &mut front[..head - 1])
        }
    }

    /// Marks `written` bytes of the spare area as retained. `written` must
    /// not exceed [`free`](Self::free).
    pub fn commit_write(&mut self, written: usize) {
        debug_assert!(written <= self.free());
        self.tail = (self.tail + written) % self.buf.len();
    }

    /// Copies `data` in after the tail, wrapping across the allocation
    /// boundary. Returns false if it does not fit.
    pub fn write_bytes(&mut self, data: &[u8]) -> bool {
        if data.len() > self.free() {
            return false;
        }
        let size = self.buf.len();
        if self.tail >= self.head {
            let contiguous = size - self.tail;
            let first = data.len().min(contiguous);
            self.buf[self.tail..self.tail + first].copy_from_slice(&data[..first]);
            if data.len() > first {
                self.buf[..data.len() - first].copy_from_slice(&data[first..]);
            }
        } else {
            self.buf[self.tail..self.tail + data.len()].copy_from_slice(data);
        }
        self.tail = (self.tail + data.len()) % size;
        true
    }
}
