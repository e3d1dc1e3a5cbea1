// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for script parsing, packet generation, and I/O.

use std::sync::Arc;

/// Wraps the supplied `ErrorInt` as an `Error`, for use with `?` via `From`-less call sites.
macro_rules! wrap {
    ($e:expr) => {
        crate::error::Error(std::sync::Arc::new($e))
    };
}

pub(crate) use wrap;

/// The kind of error, used by the binary to choose an exit code.
///
/// * [`ErrorKind::Startup`] → exit 1 (socket, bind, connect, bad destination, unreadable script).
/// * [`ErrorKind::Script`] → exit 2 (malformed line, unknown TYPE, unknown RTCP field).
///
/// Transient send errors (§7) never reach this type: the scheduler logs them
/// via `log::warn!` and keeps playing out rather than turning them into a
/// fatal `Error`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Startup,
    Script,
}

/// A cloneable, `Arc`-wrapped error, following the pattern of a small closed
/// set of causes rather than an open-ended `Box<dyn Error>`.
#[derive(Clone)]
pub struct Error(pub(crate) Arc<ErrorInt>);

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match &*self.0 {
            ErrorInt::Io { .. } | ErrorInt::BadDestination { .. } | ErrorInt::Usage { .. } => ErrorKind::Startup,
            ErrorInt::ScriptSyntax { .. } => ErrorKind::Script,
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&*self.0, f)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        wrap!(ErrorInt::Io {
            source: e,
            context: None,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ErrorInt {
    #[error("{}{source}", context.as_deref().map(|c| format!("{c}: ")).unwrap_or_default())]
    Io {
        source: std::io::Error,
        context: Option<String>,
    },

    #[error("invalid destination `{spec}`: {description}")]
    BadDestination { spec: String, description: String },

    #[error("{description}")]
    Usage { description: String },

    #[error("line {line}: {description}")]
    ScriptSyntax { line: usize, description: String },
}

impl ErrorInt {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        wrap!(ErrorInt::Io {
            source,
            context: Some(context.into()),
        })
    }

    pub(crate) fn bad_destination(spec: impl Into<String>, description: impl Into<String>) -> Error {
        wrap!(ErrorInt::BadDestination {
            spec: spec.into(),
            description: description.into(),
        })
    }

    pub(crate) fn usage(description: impl Into<String>) -> Error {
        wrap!(ErrorInt::Usage {
            description: description.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_errors_map_to_exit_1() {
        let e = ErrorInt::io("binding socket", std::io::Error::from(std::io::ErrorKind::AddrInUse));
        assert_eq!(e.kind(), ErrorKind::Startup);
    }

    #[test]
    fn script_errors_map_to_exit_2() {
        let e: Error = wrap!(ErrorInt::ScriptSyntax {
            line: 3,
            description: "unknown TYPE XYZ".into(),
        });
        assert_eq!(e.kind(), ErrorKind::Script);
        assert_eq!(e.to_string(), "line 3: unknown TYPE XYZ");
    }
}
