// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of fluent-tracing.
//
// fluent-tracing is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// fluent-tracing is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with fluent-tracing.  If
// not, see <http://www.gnu.org/licenses/>.
//! [fluent-tracing](crate) errors

use backtrace::Backtrace;

/// [fluent-tracing](crate) error type
///
/// [fluent-tracing](crate) eschews libraries like [thiserror], [anyhow] & [Snafu] in favor of
/// a straightforward enumeration with a few match arms chosen on the basis what the caller will
/// need to repond. There is no retry anywhere in this crate: each variant describes one failed
/// attempt to deliver one event, and is handed back to the caller as-is.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
#[non_exhaustive]
pub enum Error {
    /// Failed to establish a connection to the fluentd daemon at `addr`
    Connect {
        addr: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Failed to encode a record to MessagePack
    Encode {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// General transport layer error (write, flush, shutdown)
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// A send was attempted on a transport that had already been closed
    Closed { back: Backtrace },
}

impl Error {
    pub(crate) fn connect<E>(addr: impl Into<String>, err: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Connect {
            addr: addr.into(),
            source: Box::new(err),
            back: Backtrace::new(),
        }
    }
    pub(crate) fn encode<E>(err: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Encode {
            source: Box::new(err),
            back: Backtrace::new(),
        }
    }
    pub(crate) fn transport<E>(err: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        }
    }
    pub(crate) fn closed() -> Error {
        Error::Closed {
            back: Backtrace::new(),
        }
    }
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Connect { addr, source, .. } => {
                write!(f, "While connecting to fluentd at {}, got {}", addr, source)
            }
            Error::Encode { source, .. } => {
                write!(f, "While encoding a record to MessagePack, got {}", source)
            }
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            Error::Closed { .. } => write!(f, "The fluentd transport has already been closed"),
            _ => write!(f, "Other fluent-tracing error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Connect { back, .. } => write!(f, "{}\n{:#?}", self, back),
            Error::Encode { back, .. } => write!(f, "{}\n{:#?}", self, back),
            Error::Transport { back, .. } => write!(f, "{}\n{:#?}", self, back),
            Error::Closed { back } => write!(f, "{}\n{:#?}", self, back),
            err => write!(f, "fluent-tracing error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    #[allow(unreachable_patterns)]
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connect { source, .. }
            | Error::Encode { source, .. }
            | Error::Transport { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
