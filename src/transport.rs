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

//! The fluentd transport layer.
//!
//! This module defines the [`Transport`] trait (send a tagged record; close) and the
//! [`Connector`] trait (produce a fresh [`Transport`]), along with implementations speaking the
//! fluentd [Forward protocol] over TCP.
//!
//! [Forward protocol]: https://github.com/fluent/fluentd/wiki/Forward-Protocol-Specification-v1
//!
//! Only "Message Mode" is spoken: each event goes out as a single MessagePack array `[tag, time,
//! record]`. There is no retry, no buffering & no acknowledgement; a failed write is reported to
//! the caller & that's the end of it.
//!
//! # Examples
//!
//! To send records to a daemon listening on port 24224 (the default) on localhost:
//!
//! ```no_run
//! use fluent_tracing::transport::{ForwardClient, ForwardConfig};
//! let client = ForwardClient::connect(&ForwardConfig::default()).unwrap();
//! ```
//!
//! On a non-standard port on another host, with a tag prefix:
//!
//! ```rust
//! use fluent_tracing::transport::{ForwardClient, ForwardConfig};
//! let client = ForwardClient::connect(
//!     &ForwardConfig::new("some-host.domain.io", 24225).with_tag_prefix("app"),
//! );
//! assert!(client.is_err()); // no such host, after all
//! ```

use crate::{
    error::{Error, Result},
    record::Record,
};

use bytes::{BufMut, BytesMut};
use chrono::prelude::*;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, trace};

use std::{
    io::Write,
    net::{Shutdown, TcpStream, ToSocketAddrs},
    sync::Arc,
    time::Duration,
};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transports must support.
pub trait Transport {
    /// Deliver `record` to the collector under `tag`, stamped with `timestamp`.
    fn send(&self, tag: &str, timestamp: DateTime<Utc>, record: &Record) -> Result<()>;
    /// Release the underlying connection. Sending after this point fails.
    fn close(&self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, tag: &str, timestamp: DateTime<Utc>, record: &Record) -> Result<()> {
        (**self).send(tag, timestamp, record)
    }
    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

/// Something that knows how to establish a new [`Transport`].
pub trait Connector {
    type Transport: Transport;
    fn connect(&self) -> Result<Self::Transport>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         configuration                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Where to find the fluentd daemon, and how to talk to it.
#[derive(Clone, Debug, PartialEq)]
pub struct ForwardConfig {
    pub host: String,
    pub port: u16,
    /// Connect timeout
    pub timeout: Duration,
    /// Write timeout; `None` blocks indefinitely
    pub write_timeout: Option<Duration>,
    /// When set, every tag is sent as `{prefix}.{tag}`
    pub tag_prefix: Option<String>,
    /// Send timestamps as Forward protocol EventTime (nanosecond resolution) rather than integral
    /// seconds
    pub sub_second_precision: bool,
}

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 24224;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

impl std::default::Default for ForwardConfig {
    fn default() -> Self {
        ForwardConfig {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            write_timeout: None,
            tag_prefix: None,
            sub_second_precision: false,
        }
    }
}

impl ForwardConfig {
    pub fn new(host: impl Into<String>, port: u16) -> ForwardConfig {
        ForwardConfig {
            host: host.into(),
            port,
            ..Default::default()
        }
    }
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }
    pub fn with_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_prefix = Some(prefix.into());
        self
    }
    pub fn with_sub_second_precision(mut self, on: bool) -> Self {
        self.sub_second_precision = on;
        self
    }
    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        Forward protocol                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// MessagePack extension type reserved by the Forward protocol for EventTime
const EVENT_TIME_EXT: i8 = 0;

/// Encode one Message Mode entry: `[tag, time, record]`.
fn encode(
    tag: &str,
    timestamp: DateTime<Utc>,
    record: &Record,
    sub_second_precision: bool,
) -> Result<BytesMut> {
    let mut writer = BytesMut::with_capacity(128).writer();
    rmp::encode::write_array_len(&mut writer, 3).map_err(Error::encode)?;
    rmp::encode::write_str(&mut writer, tag).map_err(Error::encode)?;
    if sub_second_precision {
        // EventTime: fixext 8, big-endian seconds followed by big-endian nanoseconds
        let secs = u32::try_from(timestamp.timestamp()).map_err(Error::encode)?;
        rmp::encode::write_ext_meta(&mut writer, 8, EVENT_TIME_EXT).map_err(Error::encode)?;
        writer
            .write_all(&secs.to_be_bytes())
            .and_then(|_| writer.write_all(&timestamp.timestamp_subsec_nanos().to_be_bytes()))
            .map_err(Error::encode)?;
    } else {
        let secs = u64::try_from(timestamp.timestamp()).map_err(Error::encode)?;
        rmp::encode::write_uint(&mut writer, secs).map_err(Error::encode)?;
    }
    record
        .serialize(&mut rmp_serde::Serializer::new(&mut writer))
        .map_err(Error::encode)?;
    Ok(writer.into_inner())
}

fn connect_tcp(config: &ForwardConfig) -> Result<TcpStream> {
    let addr = config.addr();
    let mut last_err = None;
    for sock_addr in (config.host.as_str(), config.port)
        .to_socket_addrs()
        .map_err(|err| Error::connect(addr.clone(), err))?
    {
        match TcpStream::connect_timeout(&sock_addr, config.timeout) {
            Ok(stream) => {
                stream
                    .set_write_timeout(config.write_timeout)
                    .map_err(|err| Error::connect(addr.clone(), err))?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(Error::connect(
        addr,
        last_err.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved")
        }),
    ))
}

/// A connection to a fluentd daemon, speaking the Forward protocol over TCP.
///
/// The socket sits behind a mutex so that a client shared between threads never interleaves two
/// frames on the wire. Dropping the client closes the socket.
pub struct ForwardClient {
    addr: String,
    tag_prefix: Option<String>,
    sub_second_precision: bool,
    socket: Mutex<Option<TcpStream>>,
}

impl ForwardClient {
    /// Connect to the daemon described by `config`.
    pub fn connect(config: &ForwardConfig) -> Result<ForwardClient> {
        let stream = connect_tcp(config)?;
        debug!("connected to fluentd at {}", config.addr());
        Ok(ForwardClient {
            addr: config.addr(),
            tag_prefix: config.tag_prefix.clone(),
            sub_second_precision: config.sub_second_precision,
            socket: Mutex::new(Some(stream)),
        })
    }
    /// Connect to the daemon on port 24224 on localhost.
    pub fn try_default() -> Result<ForwardClient> {
        ForwardClient::connect(&ForwardConfig::default())
    }
}

impl Transport for ForwardClient {
    fn send(&self, tag: &str, timestamp: DateTime<Utc>, record: &Record) -> Result<()> {
        let buf = match &self.tag_prefix {
            Some(prefix) => encode(
                &format!("{}.{}", prefix, tag),
                timestamp,
                record,
                self.sub_second_precision,
            ),
            None => encode(tag, timestamp, record, self.sub_second_precision),
        }?;
        let mut guard = self.socket.lock();
        let stream = guard.as_mut().ok_or_else(Error::closed)?;
        stream
            .write_all(&buf)
            .and_then(|_| stream.flush())
            .map_err(Error::transport)?;
        trace!("wrote {} bytes to {}", buf.len(), self.addr);
        Ok(())
    }
    fn close(&self) -> Result<()> {
        match self.socket.lock().take() {
            Some(stream) => {
                debug!("closing connection to fluentd at {}", self.addr);
                match stream.shutdown(Shutdown::Both) {
                    // The daemon beat us to it; that's fine.
                    Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
                    res => res.map_err(Error::transport),
                }
            }
            None => Ok(()),
        }
    }
}

/// A [`Connector`] producing a new [`ForwardClient`] on each call.
#[derive(Clone, Debug, Default)]
pub struct ForwardConnector {
    config: ForwardConfig,
}

impl ForwardConnector {
    pub fn new(config: ForwardConfig) -> ForwardConnector {
        ForwardConnector { config }
    }
    pub fn config(&self) -> &ForwardConfig {
        &self.config
    }
}

impl Connector for ForwardConnector {
    type Transport = ForwardClient;
    fn connect(&self) -> Result<ForwardClient> {
        ForwardClient::connect(&self.config)
    }
}
