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

//! Shaping a [`LogEvent`] into a fluentd tag & record.
//!
//! fluentd routes on the tag, so we need one for every event. In order of preference:
//!
//! 1. a static tag configured on the hook
//! 2. a string-valued `tag` field on the event (which is then removed from the record, since it's
//!    already travelling as the tag)
//! 3. the event's message
//!
//! The record always gets a `level` field. It gets a `message` field only when the message isn't
//! already doing duty as the tag, and never overwrites one the caller supplied.

use crate::{
    event::LogEvent,
    value::{Fields, Value},
};

/// Field consulted for the tag
pub const TAG_FIELD: &str = "tag";
/// Field the event message is copied into
pub const MESSAGE_FIELD: &str = "message";
/// Field the severity is written to
pub const LEVEL_FIELD: &str = "level";

/// The record sent to fluentd for a single event.
pub type Record = Fields;

/// Produce the tag & outbound record for `event`.
pub fn shape(event: &LogEvent, static_tag: Option<&str>) -> (String, Record) {
    let mut record = event.fields.clone();
    set_level(event, &mut record);
    let tag = take_tag(event, static_tag, &mut record);
    if tag != event.message {
        set_message(event, &mut record);
    }
    (tag, record)
}

fn set_level(event: &LogEvent, record: &mut Record) {
    record.insert(LEVEL_FIELD.to_owned(), event.severity.as_str().into());
}

fn take_tag(event: &LogEvent, static_tag: Option<&str>, record: &mut Record) -> String {
    if let Some(tag) = static_tag {
        return tag.to_owned();
    }
    match record.remove(TAG_FIELD) {
        Some(Value::Str(tag)) => tag,
        Some(other) => {
            // A non-string `tag` goes back in, as ordinary data.
            record.insert(TAG_FIELD.to_owned(), other);
            event.message.clone()
        }
        None => event.message.clone(),
    }
}

fn set_message(event: &LogEvent, record: &mut Record) {
    record
        .entry(MESSAGE_FIELD.to_owned())
        .or_insert_with(|| Value::Str(event.message.clone()));
}
