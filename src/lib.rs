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
//! A [`tracing-subscriber`] [`Layer`] implementation for sending [`tracing`] [`Event`]s to a
//! [fluentd] (or [fluent-bit]) daemon.
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`tracing`]: https://docs.rs/tracing/0.1.35/tracing/index.html
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//! [fluentd]: https://www.fluentd.org
//! [fluent-bit]: https://fluentbit.io
//!
//! # Introduction
//!
//! fluentd ingests *tagged records*: a routing tag (`app.db.slow-query`, say), a timestamp & a map
//! of key-value pairs. [`tracing`] [`Event`]s already carry most of that: a level, a message & a
//! set of structured fields. This crate supplies the little bit of glue in between.
//!
//! For each event, [`FluentHook`]:
//!
//! 1. copies the event's fields into a record & adds a `level` field
//!
//! 2. picks a tag: a static tag configured on the hook, if any; else a string `tag` field on the
//!    event (which is then dropped from the record); else the event's message
//!
//! 3. if the tag isn't the message, adds the message to the record under `message` (unless the
//!    event already had a `message` field)
//!
//! 4. hands tag, timestamp & record to its [`Transport`], which speaks the fluentd Forward
//!    protocol
//!
//! [`FluentHook`]: crate::layer::FluentHook
//! [`Transport`]: crate::transport::Transport
//!
//! # Usage
//!
//! ```no_run
//! use tracing::{error, info};
//! use fluent_tracing::layer::FluentHook;
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! // Connect once to fluentd on port 24224 on the localhost, and re-use that connection for
//! // every event.
//! let subscriber = Registry::default().with(FluentHook::new("127.0.0.1", 24224).unwrap());
//! let _guard = tracing::subscriber::set_default(subscriber);
//!
//! // Sent with tag "app.db" & record {"rows": 3, "level": "info", "message": "Query done"}
//! info!(tag = "app.db", rows = 3, "Query done");
//! // Sent with tag "Disk full!" & record {"level": "error"}
//! error!("Disk full!");
//! ```
//!
//! Connecting anew for each event, with a static tag & a narrower set of severities:
//!
//! ```rust
//! use tracing::warn;
//! use fluent_tracing::{layer::FluentHook, severity::Severity};
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt;
//!
//! let mut hook = FluentHook::ephemeral("127.0.0.1", 24224);
//! hook.set_tag("my-app");
//! hook.set_severities([Severity::Error, Severity::Warn]);
//! let subscriber = Registry::default().with(hook);
//! ```
//!
//! Events arriving through the `log` crate (via [`tracing-log`], enabled by the default feature
//! of the same name) are handled just like native events.
//!
//! [`tracing-log`]: https://docs.rs/tracing-log

pub mod error;
pub mod event;
pub mod layer;
pub mod record;
pub mod severity;
pub mod tracing;
pub mod transport;
pub mod value;
