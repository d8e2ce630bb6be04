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

//! The structured log event a [`FluentHook`] consumes.
//!
//! [`FluentHook`]: crate::layer::FluentHook

use crate::{
    severity::Severity,
    value::{Fields, Value},
};

use chrono::prelude::*;

/// A single log event: when, how bad, what was said & whatever key-value pairs came along.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    pub fields: Fields,
}

impl LogEvent {
    /// Construct an event with no fields, stamped with the current time.
    pub fn new(severity: Severity, message: impl Into<String>) -> LogEvent {
        LogEvent {
            timestamp: Utc::now(),
            severity,
            message: message.into(),
            fields: Fields::new(),
        }
    }
    /// Add a field, replacing any prior value under `name`.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> LogEvent {
        self.fields.insert(name.into(), value.into());
        self
    }
    /// Override the timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> LogEvent {
        self.timestamp = timestamp;
        self
    }
}
