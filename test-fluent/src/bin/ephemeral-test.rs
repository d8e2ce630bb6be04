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

//! Test writing to fluentd on port 24224 on the local host, connecting anew for each event.

use fluent_tracing::{layer::FluentHook, transport::ForwardConfig};
use tracing::{error, info, warn};
use tracing_subscriber::{
    layer::SubscriberExt, // Needed to get `with()`
    registry::Registry,
};

pub fn main() {
    let mut hook = FluentHook::ephemeral_with_config(
        ForwardConfig::new("127.0.0.1", 24224)
            .with_tag_prefix("fluent-tracing")
            .with_sub_second_precision(true),
    );
    hook.set_tag("ephemeral");
    let subscriber = Registry::default().with(hook);
    let _guard = tracing::subscriber::set_default(subscriber);

    info!(tag = "ignored-in-favor-of-the-static-tag", "你好, fluentd.");
    warn!("你好, fluentd.");
    error!(value = "data", "你好, fluentd.");
}
