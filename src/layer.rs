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

//! [fluent-tracing](crate) [`Layer`] implementation.
//!
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//!
//! [`FluentHook`] can hold its connection to fluentd in one of two ways:
//!
//! - persistently: the connection is made once, when the hook is constructed, & re-used for every
//!   event thereafter. The hook never closes it; grab a handle via [`FluentHook::transport`] if
//!   you want to close it yourself at shutdown.
//!
//! - ephemerally: a fresh connection is made for each event & closed as soon as the event has been
//!   sent (or has failed to send). Construction can't fail, but every event pays for a connect.

use crate::{
    error::Result,
    event::LogEvent,
    record,
    severity::{Severity, DEFAULT_SEVERITIES},
    tracing::capture,
    transport::{Connector, ForwardClient, ForwardConfig, ForwardConnector, Transport},
};

use tracing::Event;
use tracing_subscriber::layer::Context;

use std::sync::Arc;

/// Our diagnostics are emitted under targets rooted here, and [`FluentHook`] ignores events
/// bearing them; otherwise a failing hook would be handed its own complaint.
const SELF_TARGET: &str = env!("CARGO_CRATE_NAME");

fn is_own_event(target: &str) -> bool {
    target
        .strip_prefix(SELF_TARGET)
        .map_or(false, |rest| rest.is_empty() || rest.starts_with("::"))
}

/// How a [`FluentHook`] gets hold of a [`Transport`].
enum Delivery<C: Connector> {
    Persistent(Arc<C::Transport>),
    Ephemeral(C),
}

/// A [`tracing-subscriber`]-compliant [`Layer`] implementation that will send [`Event`]s to
/// fluentd.
///
/// [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
/// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
pub struct FluentHook<C: Connector = ForwardConnector> {
    delivery: Delivery<C>,
    severities: Vec<Severity>,
    tag: Option<String>,
}

impl FluentHook<ForwardConnector> {
    /// Connect to fluentd at `host`:`port` & construct a hook that will send every event over
    /// that one connection.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        FluentHook::with_config(ForwardConfig::new(host, port))
    }
    /// Construct a persistent hook from a full client configuration.
    pub fn with_config(config: ForwardConfig) -> Result<Self> {
        Ok(FluentHook::with_transport(ForwardClient::connect(&config)?))
    }
    /// Construct a hook that will connect to fluentd at `host`:`port` anew for each event.
    ///
    /// Nothing is attempted until the first event arrives, so this can't fail.
    pub fn ephemeral(host: impl Into<String>, port: u16) -> Self {
        FluentHook::ephemeral_with_config(ForwardConfig::new(host, port))
    }
    /// Construct an ephemeral hook from a full client configuration.
    pub fn ephemeral_with_config(config: ForwardConfig) -> Self {
        FluentHook::with_connector(ForwardConnector::new(config))
    }
}

impl<C: Connector> FluentHook<C> {
    /// Construct a persistent hook around an already-established transport.
    pub fn with_transport(transport: impl Into<Arc<C::Transport>>) -> Self {
        FluentHook {
            delivery: Delivery::Persistent(transport.into()),
            severities: DEFAULT_SEVERITIES.to_vec(),
            tag: None,
        }
    }
    /// Construct an ephemeral hook that will call on `connector` for each event.
    pub fn with_connector(connector: C) -> Self {
        FluentHook {
            delivery: Delivery::Ephemeral(connector),
            severities: DEFAULT_SEVERITIES.to_vec(),
            tag: None,
        }
    }
    /// The severities that will fire this hook.
    pub fn severities(&self) -> &[Severity] {
        &self.severities
    }
    pub fn set_severities(&mut self, severities: impl IntoIterator<Item = Severity>) {
        self.severities = severities.into_iter().collect();
    }
    /// The static tag, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
    /// Set a static tag; it will override any tag carried in an event's fields.
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = Some(tag.into());
    }
    pub fn clear_tag(&mut self) {
        self.tag = None;
    }
    /// A shared handle on the persistent transport; `None` for ephemeral hooks.
    pub fn transport(&self) -> Option<Arc<C::Transport>> {
        match &self.delivery {
            Delivery::Persistent(transport) => Some(transport.clone()),
            Delivery::Ephemeral(_) => None,
        }
    }
    /// Shape `event` into a tag & record, and send it to fluentd.
    ///
    /// This does *not* consult [`severities`](FluentHook::severities); that's the caller's
    /// business. Any failure is returned as-is: nothing is retried or buffered.
    pub fn handle(&self, event: &LogEvent) -> Result<()> {
        let (tag, record) = record::shape(event, self.tag.as_deref());
        match &self.delivery {
            Delivery::Persistent(transport) => transport.send(&tag, event.timestamp, &record),
            Delivery::Ephemeral(connector) => {
                let transport = connector.connect()?;
                let sent = transport.send(&tag, event.timestamp, &record);
                // Close regardless, but report a send failure ahead of a close failure.
                let closed = transport.close();
                sent.and(closed)
            }
        }
    }
}

/// This is the Big Tuna-- the [`Layer`] implementation.
///
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
impl<S, C> tracing_subscriber::layer::Layer<S> for FluentHook<C>
where
    S: tracing::Subscriber,
    C: Connector + Send + Sync + 'static,
    C::Transport: Send + Sync + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if is_own_event(event.metadata().target()) {
            return;
        }
        let event = capture(event);
        if !self.severities.contains(&event.severity) {
            return;
        }
        self.handle(&event).unwrap_or_else(|err| {
            ::tracing::error!(target: SELF_TARGET, "fluentd hook failed: {}", err);
        })
    }
}

#[cfg(test)]
mod smoke {

    use super::*;

    use crate::{error::Error, record::Record, value::Value};

    use chrono::prelude::*;
    use parking_lot::Mutex;
    use tracing_subscriber::{
        layer::SubscriberExt, // Needed to get `with()`
        registry::Registry,
    };

    use std::sync::atomic::{AtomicUsize, Ordering};

    type Sent = Arc<Mutex<Vec<(String, Record)>>>;

    /// A [`Transport`] that remembers what it was asked to send.
    #[derive(Default)]
    struct MockTransport {
        sent: Sent,
        closes: Arc<AtomicUsize>,
        fail: bool,
        fail_close: bool,
    }

    impl Transport for MockTransport {
        fn send(&self, tag: &str, _timestamp: DateTime<Utc>, record: &Record) -> Result<()> {
            if self.fail {
                return Err(Error::transport(std::io::Error::from(
                    std::io::ErrorKind::BrokenPipe,
                )));
            }
            self.sent.lock().push((tag.to_owned(), record.clone()));
            Ok(())
        }
        fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                return Err(Error::transport(std::io::Error::from(
                    std::io::ErrorKind::NotConnected,
                )));
            }
            Ok(())
        }
    }

    /// A [`Connector`] handing out [`MockTransport`]s that all share one log.
    #[derive(Default)]
    struct MockConnector {
        sent: Sent,
        connects: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
        fail_send: bool,
        fail_close: bool,
        fail_connect: bool,
    }

    impl Connector for MockConnector {
        type Transport = MockTransport;
        fn connect(&self) -> Result<MockTransport> {
            if self.fail_connect {
                return Err(Error::connect(
                    "127.0.0.1:24224",
                    std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
                ));
            }
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(MockTransport {
                sent: self.sent.clone(),
                closes: self.closes.clone(),
                fail: self.fail_send,
                fail_close: self.fail_close,
            })
        }
    }

    #[test]
    fn own_targets() {
        assert!(is_own_event("fluent_tracing"));
        assert!(is_own_event("fluent_tracing::transport"));
        assert!(!is_own_event("fluent_tracing_extras"));
        assert!(!is_own_event("my_app"));
    }

    #[test]
    fn settings() {
        let mut hook = FluentHook::with_connector(MockConnector::default());
        assert_eq!(hook.severities(), &DEFAULT_SEVERITIES[..]);
        assert_eq!(hook.tag(), None);
        assert!(hook.transport().is_none());

        hook.set_severities([Severity::Warn]);
        assert_eq!(hook.severities(), &[Severity::Warn]);
        hook.set_severities(Vec::new());
        assert!(hook.severities().is_empty());

        hook.set_tag("STATIC_TAG");
        assert_eq!(hook.tag(), Some("STATIC_TAG"));
        hook.clear_tag();
        assert_eq!(hook.tag(), None);

        let ephemeral = FluentHook::ephemeral("localhost", 24224);
        assert!(ephemeral.transport().is_none());
        assert_eq!(ephemeral.severities().len(), DEFAULT_SEVERITIES.len());
    }

    #[test]
    fn persistent_reuses_one_transport() {
        let transport = Arc::new(MockTransport::default());
        let hook: FluentHook<MockConnector> = FluentHook::with_transport(transport.clone());
        for i in 0..5 {
            hook.handle(&LogEvent::new(Severity::Error, format!("M{}", i)))
                .unwrap();
        }
        assert_eq!(transport.sent.lock().len(), 5);
        assert_eq!(transport.closes.load(Ordering::SeqCst), 0);
        assert!(Arc::ptr_eq(&hook.transport().unwrap(), &transport));
    }

    #[test]
    fn ephemeral_connects_per_event() {
        let connector = MockConnector::default();
        let (sent, connects, closes) = (
            connector.sent.clone(),
            connector.connects.clone(),
            connector.closes.clone(),
        );
        let hook = FluentHook::with_connector(connector);
        for i in 0..5 {
            hook.handle(&LogEvent::new(Severity::Info, format!("M{}", i)))
                .unwrap();
        }
        assert_eq!(sent.lock().len(), 5);
        assert_eq!(connects.load(Ordering::SeqCst), 5);
        assert_eq!(closes.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn ephemeral_closes_on_failure() {
        let connector = MockConnector {
            fail_send: true,
            ..Default::default()
        };
        let closes = connector.closes.clone();
        let hook = FluentHook::with_connector(connector);
        let err = hook
            .handle(&LogEvent::new(Severity::Error, "M1"))
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let hook = FluentHook::with_connector(MockConnector {
            fail_connect: true,
            ..Default::default()
        });
        let err = hook
            .handle(&LogEvent::new(Severity::Error, "M1"))
            .unwrap_err();
        assert!(matches!(err, Error::Connect { .. }));
    }

    fn io_kind(err: &Error) -> Option<std::io::ErrorKind> {
        match err {
            Error::Transport { source, .. } => source
                .downcast_ref::<std::io::Error>()
                .map(|err| err.kind()),
            _ => None,
        }
    }

    #[test]
    fn ephemeral_close_failure() {
        // The event went out, but the close failed: that's what we hear about.
        let connector = MockConnector {
            fail_close: true,
            ..Default::default()
        };
        let (sent, closes) = (connector.sent.clone(), connector.closes.clone());
        let hook = FluentHook::with_connector(connector);
        let err = hook
            .handle(&LogEvent::new(Severity::Error, "M1"))
            .unwrap_err();
        assert_eq!(io_kind(&err), Some(std::io::ErrorKind::NotConnected));
        assert_eq!(sent.lock().len(), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        // Both failed; the send failure wins.
        let connector = MockConnector {
            fail_send: true,
            fail_close: true,
            ..Default::default()
        };
        let closes = connector.closes.clone();
        let hook = FluentHook::with_connector(connector);
        let err = hook
            .handle(&LogEvent::new(Severity::Error, "M1"))
            .unwrap_err();
        assert_eq!(io_kind(&err), Some(std::io::ErrorKind::BrokenPipe));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn persistent_connect_failure() {
        let port = {
            let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
            listener.local_addr().unwrap().port()
        };
        assert!(matches!(
            FluentHook::new("127.0.0.1", port),
            Err(Error::Connect { .. })
        ));
    }

    #[test]
    fn static_tag_applies_to_every_event() {
        let transport = Arc::new(MockTransport::default());
        let mut hook: FluentHook<MockConnector> = FluentHook::with_transport(transport.clone());
        hook.set_tag("STATIC_TAG");
        hook.handle(
            &LogEvent::new(Severity::Error, "MyMessage5")
                .with_field("tag", "something")
                .with_field("value", "data"),
        )
        .unwrap();
        let sent = transport.sent.lock();
        assert_eq!(sent[0].0, "STATIC_TAG");
        assert_eq!(sent[0].1["tag"], Value::from("something"));
    }

    #[test]
    fn tracing_events() {
        let transport = Arc::new(MockTransport::default());
        let hook: FluentHook<MockConnector> = FluentHook::with_transport(transport.clone());
        let subscriber = Registry::default().with(hook);
        tracing::subscriber::with_default(subscriber, || {
            // Events from this module would bear our own target, & so be ignored.
            tracing::error!(target: "my_app", tag = "debug.test", value = "data", "MyMessage2");
            tracing::info!(target: "my_app", value = "data", "MyMessage1");
            // Not in the default severities
            tracing::debug!(target: "my_app", "ignored");
        });

        let sent = transport.sent.lock();
        assert_eq!(sent.len(), 2);

        let (tag, record) = &sent[0];
        assert_eq!(tag, "debug.test");
        assert_eq!(record.get("tag"), None);
        assert_eq!(record["value"], Value::from("data"));
        assert_eq!(record["level"], Value::from("error"));
        assert_eq!(record["message"], Value::from("MyMessage2"));

        let (tag, record) = &sent[1];
        assert_eq!(tag, "MyMessage1");
        assert_eq!(record["level"], Value::from("info"));
        assert_eq!(record.get("message"), None);
    }

    #[cfg(feature = "fluentd")]
    #[test]
    fn test_tracing_via_tcp() {
        let subscriber = Registry::default().with(FluentHook::new("127.0.0.1", 24224).unwrap());
        let _guard = tracing::subscriber::set_default(subscriber);

        tracing::info!(target: "my_app", tag = "fluent-tracing.test", "Hello, 世界!");
        tracing::warn!(target: "my_app", tag = "fluent-tracing.test", "Hello, 世界!");
        tracing::error!(target: "my_app", tag = "fluent-tracing.test", "Hello, 世界!");
    }
}
