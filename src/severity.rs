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

//! Severity definitions.
//!
//! [`Severity`] names the levels a [`FluentHook`] can be told to react to. It is a superset of
//! [`tracing::Level`]: the two most severe values, [`Severity::Panic`] and [`Severity::Fatal`],
//! have no [`tracing`] counterpart and are only reachable by handing a [`LogEvent`] directly to
//! [`FluentHook::handle`].
//!
//! [`FluentHook`]: crate::layer::FluentHook
//! [`FluentHook::handle`]: crate::layer::FluentHook::handle
//! [`LogEvent`]: crate::event::LogEvent

type StdResult<T, E> = std::result::Result<T, E>;

/// Discrete log levels, most severe first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// the application is about to unwind
    Panic,
    /// the application is about to exit
    Fatal,
    /// error conditions
    Error,
    /// warning conditions
    Warn,
    /// informational message
    Info,
    /// debug-level message
    Debug,
    /// very verbose, debug-level message
    Trace,
}

/// The severities a freshly-constructed hook reacts to: everything from [`Severity::Info`] up.
pub const DEFAULT_SEVERITIES: [Severity; 5] = [
    Severity::Panic,
    Severity::Fatal,
    Severity::Error,
    Severity::Warn,
    Severity::Info,
];

impl Severity {
    /// The name written to the `level` field of every outbound record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Panic => "panic",
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warn => "warning",
            Severity::Info => "info",
            Severity::Debug => "debug",
            Severity::Trace => "trace",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{}", self.as_str())
    }
}

impl From<&tracing::Level> for Severity {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Severity::Error,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::TRACE => Severity::Trace,
        }
    }
}

/// Returned when a string names no known [`Severity`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseSeverityError(String);

impl std::fmt::Display for ParseSeverityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "not a valid severity: {:?}", self.0)
    }
}

impl std::error::Error for ParseSeverityError {}

impl std::str::FromStr for Severity {
    type Err = ParseSeverityError;
    fn from_str(s: &str) -> StdResult<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "panic" => Ok(Severity::Panic),
            "fatal" => Ok(Severity::Fatal),
            "error" => Ok(Severity::Error),
            "warn" | "warning" => Ok(Severity::Warn),
            "info" => Ok(Severity::Info),
            "debug" => Ok(Severity::Debug),
            "trace" => Ok(Severity::Trace),
            _ => Err(ParseSeverityError(s.to_owned())),
        }
    }
}
