//! Integration tests for stream behavior
//!
//! These tests cover the two fill modes, buffer growth and the fixed-size
//! discard protocol, checkpoint accounting, and error reporting, plus
//! property-based checks that parsing is insensitive to how the input
//! arrives.

use pegstream::prelude::*;
use proptest::prelude::*;
use std::io;

fn feed(text: &str) -> TextStream {
    let mut stream = TextStream::push_mode();
    stream.write_tail(text.as_bytes()).unwrap();
    stream
}

// ============================================================================
// Fill Modes and Growth
// ============================================================================

#[test]
fn test_pull_mode_grows_through_a_long_token() {
    let number: String = std::iter::repeat('7').take(300).collect();
    let reader = io::Cursor::new(number.clone().into_bytes());
    let mut stream = TextStream::from_reader_with(reader, StreamConfig::new(4));

    let parsed = digits(1).parse(&mut stream).unwrap();
    assert_eq!(parsed.ast.text, number);
    assert_eq!(parsed.end, Position::new(1, 299));
    assert!(stream.last_error().is_none());
}

#[test]
fn test_fixed_buffer_rejects_oversized_write() {
    let mut stream = TextStream::push_mode_with(StreamConfig::fixed(8));
    stream.write_tail(b"abcd").unwrap();
    let err = stream.write_tail(b"0123456789").unwrap_err();
    assert!(matches!(err, StreamError::BufferFull));
}

#[test]
fn test_fixed_pull_stream_stalls_and_recovers_after_discard() {
    let data: Vec<u8> = (b'a'..=b'z').cycle().take(40).collect();
    let reader = io::Cursor::new(data.clone());
    let mut stream = TextStream::from_reader_with(reader, StreamConfig::fixed(8));

    let mut out = Vec::new();
    loop {
        match stream.next_char() {
            Some(ch) => out.push(ch),
            None => {
                if matches!(stream.last_error(), Some(StreamError::BufferFull)) {
                    // everything up to the cursor is consumed; release it
                    let pos = stream.stream_position();
                    stream.discard_before(pos).unwrap();
                } else {
                    break;
                }
            }
        }
    }
    assert_eq!(out, data);
    assert!(stream.last_error().is_none());
}

#[test]
fn test_incremental_push_parsing() {
    let mut stream = TextStream::push_mode();
    stream.write_tail(b"12 ").unwrap();

    let first = digits(1).parse(&mut stream).unwrap();
    assert_eq!(first.ast.text, "12");

    stream.write_tail(b"34 56").unwrap();
    assert_eq!(digits(1).parse(&mut stream).unwrap().ast.text, "34");
    assert_eq!(digits(1).parse(&mut stream).unwrap().ast.text, "56");
    assert!(digits(1).parse(&mut stream).is_err());
}

// ============================================================================
// Checkpoint Accounting
// ============================================================================

#[test]
fn test_checkpoint_restores_line_and_column() {
    let mut stream = feed("abc\ndef");
    for _ in 0..5 {
        let _ = stream.next_char();
    }
    let cp = stream.checkpoint();
    assert_eq!(cp.position(), Position::new(2, 1));

    let _ = stream.next_char();
    let _ = stream.next_char();
    assert_eq!(stream.position(), Position::new(2, 3));

    stream.backtrack(cp);
    assert_eq!(stream.position(), Position::new(2, 1));
    assert_eq!(stream.outstanding_checkpoints(), 0);
}

#[test]
fn test_discard_is_blocked_while_checkpoints_are_outstanding() {
    let mut stream = feed("hello world");
    let cp = stream.checkpoint();
    let _ = stream.next_char();
    let pos = stream.stream_position();

    let err = stream.discard_before(pos).unwrap_err();
    assert!(matches!(
        err,
        StreamError::CheckpointsOutstanding { outstanding: 1 }
    ));

    stream.commit(cp);
    stream.discard_before(pos).unwrap();
    assert_eq!(stream.next_char(), Some(b'e'));
}

// ============================================================================
// Unreliable Readers
// ============================================================================

/// Replays a script of read outcomes, then reports end of input.
struct ScriptedReader {
    script: std::collections::VecDeque<io::Result<Vec<u8>>>,
}

impl io::Read for ScriptedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.script.pop_front() {
            Some(Ok(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            Some(Err(err)) => Err(err),
            None => Ok(0),
        }
    }
}

#[test]
fn test_interrupted_read_is_retried_not_treated_as_eof() {
    let script = std::collections::VecDeque::from([
        Ok(b"12".to_vec()),
        Err(io::Error::new(io::ErrorKind::Interrupted, "signal")),
        Ok(b"34".to_vec()),
    ]);
    let mut stream = TextStream::from_reader(ScriptedReader { script });

    // the token spans the interruption; nothing is truncated
    let parsed = digits(1).parse(&mut stream).unwrap();
    assert_eq!(parsed.ast.text, "1234");
    assert_eq!(parsed.end, Position::new(1, 3));
    assert!(stream.last_error().is_none());
}

#[test]
fn test_failed_read_is_recorded_and_distinct_from_eof() {
    let script = std::collections::VecDeque::from([
        Ok(b"12".to_vec()),
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "wire unplugged")),
    ]);
    let mut stream = TextStream::from_reader(ScriptedReader { script });

    let parsed = digits(1).parse(&mut stream).unwrap();
    assert_eq!(parsed.ast.text, "12");
    assert!(matches!(stream.last_error(), Some(StreamError::Io(_))));
}

// ============================================================================
// Error Reporting
// ============================================================================

#[test]
fn test_error_messages() {
    assert_eq!(
        StreamError::BufferFull.to_string(),
        "buffer is full and growth is disabled"
    );
    assert_eq!(
        StreamError::CheckpointsOutstanding { outstanding: 2 }.to_string(),
        "cannot discard retained text: 2 checkpoint(s) outstanding"
    );
    assert_eq!(
        StreamError::OffsetOutOfWindow {
            requested: 3,
            window_start: 10,
            window_end: 20,
        }
        .to_string(),
        "offset 3 is outside the retained window 10..20"
    );
}

#[test]
fn test_io_error_is_preserved_as_source() {
    let err = StreamError::Io(io::Error::new(io::ErrorKind::Other, "wire unplugged"));
    assert!(err.to_string().contains("wire unplugged"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_open_missing_file_is_an_io_error() {
    let err = TextStream::open("/no/such/path/anywhere.txt").unwrap_err();
    assert!(matches!(err, StreamError::Io(_)));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// A digit run is matched exactly, wherever it starts on the line.
    #[test]
    fn prop_digits_match_the_exact_run(ws in "[ \t]{0,6}", num in "[0-9]{1,12}") {
        let mut stream = TextStream::push_mode();
        stream.write_tail(ws.as_bytes()).unwrap();
        stream.write_tail(num.as_bytes()).unwrap();
        stream.write_tail(b";").unwrap();

        let parsed = digits(1).parse(&mut stream).unwrap();
        prop_assert_eq!(&parsed.ast.text, &num);
        prop_assert_eq!(parsed.start, Position::new(1, ws.len() as u32));
        prop_assert_eq!(stream.outstanding_checkpoints(), 0);
    }

    /// Star counts every repetition; plus fails exactly on zero.
    #[test]
    fn prop_repetition_counts(n in 0usize..40) {
        let text = "a ".repeat(n);

        let mut stream = feed(&text);
        let stars = lit(1, "a").star(2).parse(&mut stream).unwrap();
        prop_assert_eq!(stars.ast.items.len(), n);

        let mut stream = feed(&text);
        let plus = lit(1, "a").plus(2).parse(&mut stream);
        prop_assert_eq!(plus.is_ok(), n > 0);
    }

    /// A failed attempt leaves the stream byte-for-byte replayable.
    #[test]
    fn prop_backtracking_is_clean(input in "[ab ]{0,24}") {
        let rule = seq(3, (lit(1, "ab"), lit(2, "ba")));
        let mut stream = feed(&input);

        if rule.parse(&mut stream).is_err() {
            prop_assert_eq!(stream.position(), Position::new(1, 0));
            prop_assert_eq!(stream.outstanding_checkpoints(), 0);
            // the retry sees the same bytes and fails the same way
            prop_assert!(rule.parse(&mut stream).is_err());
        }
    }

    /// Parsing does not depend on how the input arrives.
    #[test]
    fn prop_pull_agrees_with_push(nums in proptest::collection::vec("[0-9]{1,6}", 0..12)) {
        let text = nums.join(" ");
        let rule = digits(1).star(2);

        let mut pushed = feed(&text);
        let from_push = rule.parse(&mut pushed).unwrap();

        let reader = io::Cursor::new(text.clone().into_bytes());
        let mut pulled = TextStream::from_reader_with(reader, StreamConfig::new(3));
        let from_pull = rule.parse(&mut pulled).unwrap();

        let push_texts: Vec<&str> =
            from_push.ast.items.iter().map(|t| t.text.as_str()).collect();
        let pull_texts: Vec<&str> =
            from_pull.ast.items.iter().map(|t| t.text.as_str()).collect();
        prop_assert_eq!(&push_texts, &nums);
        prop_assert_eq!(push_texts, pull_texts);
    }
}
