//! Splits a sequential run log into per-test segments.
//!
//! A segment runs from a line containing [`START_SENTINEL`] through the next
//! line containing [`END_SENTINEL`], inclusive. Lines before the first start
//! sentinel, and between segments, are discarded. A segment still open when
//! the stream ends is dropped.

use std::io::BufRead;
use tracing::{debug, warn};

pub const START_SENTINEL: &str = "Executing";
pub const END_SENTINEL: &str = "Restoring";

/// Parser state. Only the pending segment's lines are ever held.
#[derive(Debug)]
enum State {
    SeekingStart,
    InSegment(Vec<String>),
    Finished,
}

#[derive(Debug)]
enum Event {
    SentinelStart(String),
    SentinelEnd(String),
    Line(String),
    EndOfStream,
}

impl Event {
    /// Inside a segment the end sentinel wins, so a closing line that also
    /// mentions the start sentinel still closes it.
    fn classify(line: String, in_segment: bool) -> Self {
        let (start, end) = (line.contains(START_SENTINEL), line.contains(END_SENTINEL));
        match (start, end) {
            (_, true) if in_segment => Event::SentinelEnd(line),
            (true, _) => Event::SentinelStart(line),
            (false, true) => Event::SentinelEnd(line),
            (false, false) => Event::Line(line),
        }
    }
}

/// Lazy iterator of raw segments over a line-oriented reader.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub struct LogSegmenter<R> {
    reader: R,
    state: State,
    buf: Vec<u8>,
    dropped_partial: bool,
}

impl<R: BufRead> LogSegmenter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            state: State::SeekingStart,
            buf: Vec::new(),
            dropped_partial: false,
        }
    }

    /// Whether a trailing segment was discarded because the stream ended
    /// before its end sentinel.
    pub fn dropped_partial(&self) -> bool {
        self.dropped_partial
    }

    fn next_event(&mut self) -> Event {
        let in_segment = matches!(self.state, State::InSegment(_));
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => Event::EndOfStream,
            Ok(_) => {
                let line = String::from_utf8_lossy(&self.buf);
                Event::classify(line.trim_end_matches(['\n', '\r']).to_string(), in_segment)
            }
            Err(e) => {
                warn!(error = %e, "log read failed, treating as end of stream");
                Event::EndOfStream
            }
        }
    }
}

impl<R: BufRead> Iterator for LogSegmenter<R> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if matches!(self.state, State::Finished) {
                return None;
            }
            let event = self.next_event();
            let state = std::mem::replace(&mut self.state, State::Finished);

            match (state, event) {
                (State::SeekingStart, Event::SentinelStart(line)) => {
                    self.state = State::InSegment(vec![line]);
                }
                (State::SeekingStart, Event::SentinelEnd(_) | Event::Line(_)) => {
                    self.state = State::SeekingStart;
                }
                (State::SeekingStart, Event::EndOfStream) => {
                    debug!("log exhausted");
                }
                (State::InSegment(mut lines), Event::SentinelEnd(line)) => {
                    lines.push(line);
                    self.state = State::SeekingStart;
                    return Some(lines);
                }
                (State::InSegment(mut lines), Event::SentinelStart(line) | Event::Line(line)) => {
                    lines.push(line);
                    self.state = State::InSegment(lines);
                }
                (State::InSegment(lines), Event::EndOfStream) => {
                    warn!(
                        lines = lines.len(),
                        "log ended inside a test segment, dropping it"
                    );
                    self.dropped_partial = true;
                }
                (State::Finished, _) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn segments(log: &str) -> Vec<Vec<String>> {
        LogSegmenter::new(Cursor::new(log.as_bytes().to_vec())).collect()
    }

    #[test]
    fn test_no_start_sentinel_yields_nothing() {
        let log = "boot\nRestoring something\nmore noise\n";
        assert!(segments(log).is_empty());
        assert!(segments("").is_empty());
    }

    #[test]
    fn test_segments_are_inclusive() {
        let log = "noise\nExecuting a\nline 1\nRestoring a\nbetween\nExecuting b\nRestoring b\n";
        let segs = segments(log);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0], vec!["Executing a", "line 1", "Restoring a"]);
        assert_eq!(segs[1], vec!["Executing b", "Restoring b"]);
    }

    #[test]
    fn test_truncated_tail_is_dropped() {
        let log = "Executing a\nRestoring a\nExecuting b\nstill going";
        let mut segmenter = LogSegmenter::new(Cursor::new(log.as_bytes().to_vec()));
        let segs: Vec<_> = segmenter.by_ref().collect();
        assert_eq!(segs.len(), 1);
        assert!(segmenter.dropped_partial());
    }

    #[test]
    fn test_complete_log_reports_no_drop() {
        let log = "Executing a\nRestoring a\n";
        let mut segmenter = LogSegmenter::new(Cursor::new(log.as_bytes().to_vec()));
        assert_eq!(segmenter.by_ref().count(), 1);
        assert!(!segmenter.dropped_partial());
        assert!(segmenter.next().is_none());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut bytes = b"Executing a\r\nbad \xff byte\r\nRestoring a\r\n".to_vec();
        bytes.extend_from_slice(b"trailer\n");
        let segs: Vec<_> = LogSegmenter::new(Cursor::new(bytes)).collect();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0][0], "Executing a");
        assert_eq!(segs[0][1], "bad \u{FFFD} byte");
    }

    #[test]
    fn test_nested_start_stays_in_segment() {
        let log = "Executing a\nExecuting b\nRestoring b\n";
        let segs = segments(log);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].len(), 3);
    }

    #[test]
    fn test_end_sentinel_wins_inside_segment() {
        let log = "Executing a\nRestoring a (Executing cleanup)\nExecuting b\nRestoring b\n";
        let segs = segments(log);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0], vec!["Executing a", "Restoring a (Executing cleanup)"]);
        assert_eq!(segs[1], vec!["Executing b", "Restoring b"]);
    }

    #[test]
    fn test_start_sentinel_wins_while_seeking() {
        let log = "Restoring stale, Executing a\nRestoring a\n";
        let segs = segments(log);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0], vec!["Restoring stale, Executing a", "Restoring a"]);
    }
}
