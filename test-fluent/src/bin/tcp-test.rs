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

//! Test writing to fluentd on port 24224 on the local host over a single, persistent connection.

use fluent_tracing::{
    event::LogEvent, layer::FluentHook, severity::Severity, transport::Transport,
};
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{
    layer::SubscriberExt, // Needed to get `with()`
    registry::Registry,
};

pub fn main() {
    let mut hook = FluentHook::new("127.0.0.1", 24224).unwrap();
    hook.set_severities([
        Severity::Error,
        Severity::Warn,
        Severity::Info,
        Severity::Debug,
        Severity::Trace,
    ]);
    // A caller-supplied `message` field survives; `tracing` won't let us declare one alongside
    // the formatted message, so this one goes straight to the hook.
    hook.handle(
        &LogEvent::new(Severity::Error, "你好, fluentd.")
            .with_field("tag", "fluent-tracing.tcp")
            .with_field("message", "custom"),
    )
    .unwrap();
    // Hang on to the connection so we can close it ourselves on the way out.
    let client = hook.transport().unwrap();
    // Setup the real subsriber...
    let subscriber = Registry::default().with(hook);
    // and install it.
    let guard = tracing::subscriber::set_default(subscriber);

    trace!(tag = "fluent-tracing.tcp", "你好, fluentd.");
    debug!(tag = "fluent-tracing.tcp", "你好, fluentd.");
    info!(tag = "fluent-tracing.tcp", "你好, fluentd.");
    warn!(tag = "fluent-tracing.tcp", attempt = 2, "你好, fluentd.");
    error!(tag = "fluent-tracing.tcp", "你好, fluentd.");
    error!("fluent-tracing.untagged");

    drop(guard);
    client.close().unwrap();
}
