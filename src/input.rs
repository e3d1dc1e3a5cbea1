// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The two concrete script sources the CLI can hand to a [`crate::script::ScriptReader`]:
//! a file (seekable, so loop mode can rewind it) or stdin (slurped into memory
//! up front so it satisfies the same `Seek` bound, even though `-l` without
//! `-f` is rejected before either is ever opened).

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read, Seek, SeekFrom};

pub(crate) enum ScriptSource {
    File(BufReader<File>),
    Stdin(Cursor<Vec<u8>>),
}

impl Read for ScriptSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ScriptSource::File(r) => r.read(buf),
            ScriptSource::Stdin(r) => r.read(buf),
        }
    }
}

impl BufRead for ScriptSource {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            ScriptSource::File(r) => r.fill_buf(),
            ScriptSource::Stdin(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            ScriptSource::File(r) => r.consume(amt),
            ScriptSource::Stdin(r) => r.consume(amt),
        }
    }
}

impl Seek for ScriptSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            ScriptSource::File(r) => r.seek(pos),
            ScriptSource::Stdin(r) => r.seek(pos),
        }
    }
}
