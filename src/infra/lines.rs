use crate::domain::TranscriptAbort;
use std::io::{self, BufRead};
use thiserror::Error;

/// Summary scans only need the head of a file; this keeps one pathological line cheap.
pub const SCAN_MAX_LINE_BYTES: usize = 256 * 1024;
/// Transcripts may embed large tool outputs in a single line.
pub const TRANSCRIPT_MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ReadLineError {
    #[error("failed to read line: {0}")]
    Io(#[from] io::Error),

    #[error("line exceeds {limit} bytes")]
    Oversized { limit: usize },
}

impl ReadLineError {
    pub fn transcript_abort(&self) -> TranscriptAbort {
        match self {
            Self::Io(_) => TranscriptAbort::ReadFailed,
            Self::Oversized { .. } => TranscriptAbort::OversizedLine,
        }
    }
}

/// Newline-delimited reader that refuses lines longer than a fixed limit.
///
/// After the first error the reader is exhausted.
pub struct BoundedLines<R> {
    reader: R,
    max_line_bytes: usize,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> BoundedLines<R> {
    pub fn new(reader: R, max_line_bytes: usize) -> Self {
        Self {
            reader,
            max_line_bytes,
            buf: Vec::new(),
            done: false,
        }
    }

    /// Next line without its `\n` / `\r\n` terminator.
    pub fn next_line(&mut self) -> Option<Result<&[u8], ReadLineError>> {
        if self.done {
            return None;
        }
        self.buf.clear();

        loop {
            let available = match self.reader.fill_buf() {
                Ok(available) => available,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => {
                    self.done = true;
                    return Some(Err(error.into()));
                }
            };
            if available.is_empty() {
                self.done = true;
                if self.buf.is_empty() {
                    return None;
                }
                break;
            }

            let (take, found_newline) = match available.iter().position(|byte| *byte == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (available.len(), false),
            };
            self.buf.extend_from_slice(&available[..take]);
            self.reader.consume(take);

            let content_len = self.buf.len() - usize::from(found_newline);
            if content_len > self.max_line_bytes {
                self.done = true;
                return Some(Err(ReadLineError::Oversized {
                    limit: self.max_line_bytes,
                }));
            }
            if found_newline {
                break;
            }
        }

        let mut end = self.buf.len();
        if self.buf[..end].ends_with(b"\n") {
            end -= 1;
        }
        if self.buf[..end].ends_with(b"\r") {
            end -= 1;
        }
        Some(Ok(&self.buf[..end]))
    }
}

/// Reader that yields `data` and then fails, for exercising mid-file read errors.
#[cfg(test)]
pub(crate) fn failing_after(data: &str) -> impl BufRead {
    use std::io::{BufReader, Cursor, Read};

    struct FailAtEnd(Cursor<Vec<u8>>);

    impl Read for FailAtEnd {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.read(buf)? {
                0 => Err(io::Error::other("device went away")),
                read => Ok(read),
            }
        }
    }

    BufReader::new(FailAtEnd(Cursor::new(data.as_bytes().to_vec())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    fn collect(input: &str, limit: usize) -> (Vec<String>, Option<String>) {
        let mut lines = BoundedLines::new(Cursor::new(input.as_bytes().to_vec()), limit);
        let mut out = Vec::new();
        let mut error = None;
        while let Some(line) = lines.next_line() {
            match line {
                Ok(bytes) => out.push(String::from_utf8_lossy(bytes).into_owned()),
                Err(err) => error = Some(err.to_string()),
            }
        }
        (out, error)
    }

    #[test]
    fn splits_lines_and_strips_terminators() {
        let (lines, error) = collect("a\r\nb\n\nc", 16);
        assert_eq!(lines, vec!["a", "b", "", "c"]);
        assert!(error.is_none());
    }

    #[test]
    fn stops_at_oversized_line() {
        let (lines, error) = collect("ok\n0123456789\nlater\n", 4);
        assert_eq!(lines, vec!["ok"]);
        assert_eq!(error.as_deref(), Some("line exceeds 4 bytes"));
    }

    #[test]
    fn limit_applies_to_content_not_terminator() {
        let (lines, error) = collect("abcd\nefgh", 4);
        assert_eq!(lines, vec!["abcd", "efgh"]);
        assert!(error.is_none());
    }

    #[test]
    fn handles_lines_spanning_buffer_refills() {
        let long = "x".repeat(100);
        let input = format!("{long}\nshort\n");
        let reader = BufReader::with_capacity(8, Cursor::new(input.into_bytes()));
        let mut lines = BoundedLines::new(reader, 128);
        let first = lines.next_line().expect("line").expect("ok").len();
        assert_eq!(first, 100);
        let second = lines.next_line().expect("line").expect("ok").to_vec();
        assert_eq!(second, b"short");
        assert!(lines.next_line().is_none());
    }

    #[test]
    fn read_failure_ends_the_stream() {
        let mut lines = BoundedLines::new(failing_after("first\n"), 64);
        assert_eq!(lines.next_line().expect("line").expect("ok"), b"first");

        let error = lines.next_line().expect("error").expect_err("read failure");
        assert!(matches!(error, ReadLineError::Io(_)));
        assert_eq!(error.transcript_abort(), TranscriptAbort::ReadFailed);
        assert!(lines.next_line().is_none());
    }
}
