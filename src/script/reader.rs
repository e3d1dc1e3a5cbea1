// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logical-line assembly over a script source: continuation lines, comments,
//! and (for seekable sources) rewind for loop mode (§4.10).

use std::io::{self, BufRead, Seek, SeekFrom};

/// One assembled logical line, with the raw line number it started on (for
/// diagnostics).
pub(crate) struct LogicalLine {
    pub(crate) line_no: usize,
    pub(crate) text: String,
}

/// Reads logical lines from an underlying [`BufRead`]: lines beginning with
/// `#` are comments and dropped; lines beginning with whitespace continue the
/// previous logical line.
pub(crate) struct ScriptReader<R> {
    inner: R,
    /// A raw line already read past the end of the current logical line,
    /// held for the next call (mirrors the original tool's static `line` buffer).
    lookahead: Option<(usize, String)>,
    raw_line_no: usize,
}

impl<R: BufRead> ScriptReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        ScriptReader {
            inner,
            lookahead: None,
            raw_line_no: 0,
        }
    }

    fn read_raw_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = String::new();
        let n = self.inner.read_line(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.raw_line_no += 1;
        Ok(Some(buf))
    }

    /// Returns the next logical line, or `None` at EOF.
    pub(crate) fn next_logical_line(&mut self) -> io::Result<Option<LogicalLine>> {
        let (mut line_no, mut text) = match self.lookahead.take() {
            Some((n, s)) => (n, s),
            None => (0, String::new()),
        };
        loop {
            let raw = match self.read_raw_line()? {
                Some(s) => s,
                None => break,
            };
            if raw.starts_with('#') {
                continue;
            }
            let starts_continuation = raw.starts_with(|c: char| c.is_whitespace());
            if !text.is_empty() && !starts_continuation {
                self.lookahead = Some((self.raw_line_no, raw));
                break;
            }
            if line_no == 0 {
                line_no = self.raw_line_no;
            }
            text.push_str(&raw);
        }
        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(LogicalLine { line_no, text }))
        }
    }
}

impl<R: Seek> ScriptReader<R> {
    /// Rewinds the underlying source to the start, for loop mode.
    pub(crate) fn rewind(&mut self) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(0))?;
        self.lookahead = None;
        self.raw_line_no = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lines_of(script: &str) -> Vec<String> {
        let mut r = ScriptReader::new(Cursor::new(script.to_string()));
        let mut out = Vec::new();
        while let Some(ll) = r.next_logical_line().unwrap() {
            out.push(ll.text);
        }
        out
    }

    #[test]
    fn splits_simple_lines() {
        let out = lines_of("0.0 RTP pt=96\n0.1 RTP pt=97\n");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn skips_comment_lines() {
        let out = lines_of("# a header comment\n0.0 RTP pt=96\n# another\n0.1 RTP pt=97\n");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn joins_continuation_lines() {
        let out = lines_of("0.0 RTCP (SDES\n  (src=1 cname=\"a\"))\n");
        assert_eq!(out.len(), 1);
        assert!(out[0].contains("cname=\"a\""));
    }

    #[test]
    fn empty_script_yields_no_lines() {
        assert!(lines_of("").is_empty());
        assert!(lines_of("# only a comment\n").is_empty());
    }

    #[test]
    fn rewind_replays_from_start() {
        let mut r = ScriptReader::new(Cursor::new("0.0 RTP pt=96\n0.1 RTP pt=97\n".to_string()));
        let first = r.next_logical_line().unwrap().unwrap().text;
        r.rewind().unwrap();
        let again = r.next_logical_line().unwrap().unwrap().text;
        assert_eq!(first, again);
    }
}
