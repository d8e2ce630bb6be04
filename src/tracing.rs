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

//! Primitives for mapping [`tracing`] [`Event`]s to [`LogEvent`]s.
//!
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//!
//! [`tracing`] only lets us at an [`Event`]'s fields through the [`Visit`] trait, one field at a
//! time & one primitive type at a time. [`FieldVisitor`] collects them into a [`Fields`] map,
//! setting aside the distinguished "message" field, which becomes [`LogEvent::message`].
//!
//! [`Visit`]: tracing::field::Visit

use crate::{
    event::LogEvent,
    record::MESSAGE_FIELD,
    severity::Severity,
    value::{Fields, Value},
};

use chrono::prelude::*;
use tracing::field::{Field, Visit};

#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

/// Collects an [`Event`]'s fields.
///
/// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
#[derive(Debug, Default)]
pub struct FieldVisitor {
    message: Option<String>,
    fields: Fields,
    // Events bridged from the `log` crate carry their metadata in synthetic `log.*` fields; we
    // have the real metadata via `NormalizeEvent`, so those are dropped.
    skip_log_fields: bool,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if self.skip_log_fields && field.name().starts_with("log.") {
            return;
        }
        self.fields.insert(field.name().to_owned(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == MESSAGE_FIELD {
            self.message = Some(value.to_owned());
        } else {
            self.insert(field, Value::Str(value.to_owned()));
        }
    }
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::I64(value));
    }
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::U64(value));
    }
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::F64(value));
    }
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }
    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::Str(value.to_string()));
    }
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // The tracing macros "pre-format" the message into a `std::fmt::Arguments`, whose `Debug`
        // implementation prints without enclosing double-quotes.
        if field.name() == MESSAGE_FIELD {
            self.message = Some(format!("{:?}", value));
        } else {
            self.insert(field, Value::Str(format!("{:?}", value)));
        }
    }
}

/// Capture `event` as a [`LogEvent`], stamped with the current time.
///
/// An event with no message field gets an empty message.
pub fn capture(event: &tracing::Event<'_>) -> LogEvent {
    #[cfg(feature = "tracing-log")]
    let normalized_meta = event.normalized_metadata();
    #[cfg(feature = "tracing-log")]
    let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
    #[cfg(not(feature = "tracing-log"))]
    let meta = event.metadata();

    #[cfg(feature = "tracing-log")]
    let skip_log_fields = event.is_log();
    #[cfg(not(feature = "tracing-log"))]
    let skip_log_fields = false;

    let mut visitor = FieldVisitor {
        skip_log_fields,
        ..Default::default()
    };
    event.record(&mut visitor);

    LogEvent {
        timestamp: Utc::now(),
        severity: Severity::from(meta.level()),
        message: visitor.message.unwrap_or_default(),
        fields: visitor.fields,
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing_subscriber::{layer::SubscriberExt, registry::Registry};

    /// A layer that does nothing but stash what [`capture`] makes of each event.
    struct Capturing(Arc<Mutex<Vec<LogEvent>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::layer::Layer<S> for Capturing {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.0.lock().push(capture(event));
        }
    }

    fn captured(f: impl FnOnce()) -> Vec<LogEvent> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let subscriber = Registry::default().with(Capturing(events.clone()));
        tracing::subscriber::with_default(subscriber, f);
        let out = events.lock().clone();
        out
    }

    #[test]
    fn fields_and_message() {
        #[allow(dead_code)]
        #[derive(Debug)]
        struct Point {
            x: i32,
        }
        let events = captured(|| {
            tracing::warn!(
                tag = "debug.test",
                count = 3u64,
                delta = -2i64,
                ratio = 0.25,
                ok = true,
                point = ?Point { x: 1 },
                "Hello, {}!",
                "世界"
            );
        });
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.severity, Severity::Warn);
        assert_eq!(event.message, "Hello, 世界!");
        assert_eq!(event.fields["tag"], Value::from("debug.test"));
        assert_eq!(event.fields["count"], Value::U64(3));
        assert_eq!(event.fields["delta"], Value::I64(-2));
        assert_eq!(event.fields["ratio"], Value::F64(0.25));
        assert_eq!(event.fields["ok"], Value::Bool(true));
        assert_eq!(event.fields["point"], Value::from("Point { x: 1 }"));
        assert!(!event.fields.contains_key("message"));
    }

    #[test]
    fn no_message() {
        let events = captured(|| tracing::error!(value = "data"));
        assert_eq!(events[0].message, "");
        assert_eq!(events[0].severity, Severity::Error);
        assert_eq!(events[0].fields["value"], Value::from("data"));
    }
}
