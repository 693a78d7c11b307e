// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Blocking TCP client for the live-view protocol.
//!
//! [`LiveClient`] is single-threaded like the rest of the stream state;
//! [`SharedLiveClient`] wraps it in a mutex so the agent's worker threads
//! can share one connection, holding the lock for each logical send.

use super::protocol::LiveMessage;
use super::LiveError;
use crate::packet::Guid;
use parking_lot::Mutex;
use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

const RECONNECT_DELAY: Duration = Duration::from_millis(250);

pub struct LiveClient {
    endpoint: String,
    analyst_id: Guid,
    criteria: i32,
    stream: Option<TcpStream>,
}

impl LiveClient {
    pub fn new(endpoint: impl Into<String>, criteria: i32) -> Self {
        LiveClient {
            endpoint: endpoint.into(),
            analyst_id: Guid::generate(),
            criteria,
            stream: None,
        }
    }

    /// Client for the viewer named in the agent configuration.
    pub fn from_config(config: &crate::config::LiveViewConfig) -> Self {
        Self::new(config.endpoint.clone(), config.criteria)
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn analyst_id(&self) -> Guid {
        self.analyst_id
    }

    /// Connect and register with the viewer.
    pub fn connect(&mut self) -> Result<(), LiveError> {
        let stream = TcpStream::connect(&self.endpoint)?;
        stream.set_nodelay(true)?;
        self.stream = Some(stream);

        let register = LiveMessage::RegisterAnalyst {
            analyst_id: self.analyst_id,
            criteria: self.criteria,
        };
        self.send_frame(&register.encode()?)?;
        log::info!("live view connected to {}", self.endpoint);
        Ok(())
    }

    /// Send one message. A failed send drops the connection and retries once
    /// after a short delay; the full reconnect state machine lives with the
    /// transport owner, not here.
    pub fn send(&mut self, message: &LiveMessage) -> Result<(), LiveError> {
        if self.stream.is_none() {
            self.connect()?;
        }
        let frame = message.encode()?;
        match self.send_frame(&frame) {
            Ok(()) => Ok(()),
            Err(err) => {
                log::warn!("live send failed ({}), reconnecting once", err);
                self.stream = None;
                std::thread::sleep(RECONNECT_DELAY);
                self.connect()?;
                self.send_frame(&frame)
            }
        }
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<(), LiveError> {
        let stream = self.stream.as_mut().ok_or(LiveError::NotConnected)?;
        stream.write_all(frame)?;
        Ok(())
    }

    /// Best-effort goodbye and disconnect.
    pub fn close(&mut self, session_id: Guid) {
        if let Some(mut stream) = self.stream.take() {
            if let Ok(frame) = (LiveMessage::Goodbye { session_id }).encode() {
                let _ = stream.write_all(&frame);
            }
            let _ = stream.flush();
        }
    }
}

/// Clonable handle sharing one live connection across threads. Each logical
/// send holds the mutex for its whole duration; the client itself does no
/// internal locking.
#[derive(Clone)]
pub struct SharedLiveClient {
    inner: Arc<Mutex<LiveClient>>,
}

impl SharedLiveClient {
    pub fn new(client: LiveClient) -> Self {
        SharedLiveClient {
            inner: Arc::new(Mutex::new(client)),
        }
    }

    pub fn send(&self, message: &LiveMessage) -> Result<(), LiveError> {
        self.inner.lock().send(message)
    }

    pub fn close(&self, session_id: Guid) {
        self.inner.lock().close(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Timestamp;
    use std::io::Read;
    use std::net::TcpListener;

    fn read_messages(listener: TcpListener, expected: usize) -> Vec<LiveMessage> {
        let (mut socket, _) = listener.accept().expect("accept");
        let mut buf = Vec::new();
        socket.read_to_end(&mut buf).expect("read");
        let mut source = buf.as_slice();
        let mut messages = Vec::new();
        while let Some(message) = LiveMessage::read_from(&mut source).expect("decode") {
            messages.push(message);
        }
        assert_eq!(messages.len(), expected);
        messages
    }

    #[test]
    fn test_connect_registers_and_streams() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = std::thread::spawn(move || read_messages(listener, 3));

        let session_id = Guid::generate();
        let mut client = LiveClient::new(addr.to_string(), 2);
        client.connect().expect("connect");
        client
            .send(&LiveMessage::SessionHeader {
                session_id,
                started: Timestamp::from_ticks(1),
                product: "Vellum".into(),
            })
            .expect("send header");
        client.close(session_id);

        let messages = server.join().expect("server");
        match &messages[0] {
            LiveMessage::RegisterAnalyst { criteria, .. } => assert_eq!(*criteria, 2),
            other => panic!("expected register, got {:?}", other),
        }
        match &messages[1] {
            LiveMessage::SessionHeader { product, .. } => assert_eq!(product, "Vellum"),
            other => panic!("expected session header, got {:?}", other),
        }
        match &messages[2] {
            LiveMessage::Goodbye {
                session_id: goodbye_id,
            } => assert_eq!(*goodbye_id, session_id),
            other => panic!("expected goodbye, got {:?}", other),
        }
    }

    #[test]
    fn test_shared_client_sends_from_multiple_threads() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        // register + 4 packet frames + goodbye
        let server = std::thread::spawn(move || read_messages(listener, 6));

        let mut client = LiveClient::new(addr.to_string(), 0);
        client.connect().expect("connect");
        let shared = SharedLiveClient::new(client);

        let session_id = Guid::generate();
        let mut workers = Vec::new();
        for i in 0..4u8 {
            let handle = shared.clone();
            workers.push(std::thread::spawn(move || {
                handle
                    .send(&LiveMessage::PacketData {
                        session_id,
                        payload: vec![i; 3],
                    })
                    .expect("send");
            }));
        }
        for worker in workers {
            worker.join().expect("worker");
        }
        shared.close(session_id);

        let messages = server.join().expect("server");
        let packets = messages
            .iter()
            .filter(|m| matches!(m, LiveMessage::PacketData { .. }))
            .count();
        assert_eq!(packets, 4);
    }

    #[test]
    fn test_from_config() {
        let config = crate::config::AgentConfig::new(".").live_view("127.0.0.1:29105", 7);
        let client = LiveClient::from_config(config.live_view.as_ref().expect("live view"));
        assert_eq!(client.criteria, 7);
        assert!(!client.is_connected());
    }

    #[test]
    fn test_send_without_server_fails() {
        // Port 1 on localhost is never listening.
        let mut client = LiveClient::new("127.0.0.1:1", 0);
        let err = client
            .send(&LiveMessage::Goodbye {
                session_id: Guid::ZERO,
            })
            .unwrap_err();
        assert!(matches!(err, LiveError::Io(_)));
    }
}
