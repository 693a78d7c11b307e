// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Vellum diagnostics and telemetry agent.
//!
//! Records structured log events, metric samples, and session metadata to
//! local session files, optionally mirroring packets to a TCP live viewer.
//! Everything persisted goes through the self-describing binary packet
//! framework in [`packet`]; the `vellum-packager` crate bundles recorded
//! sessions into transportable archives.
//!
//! # Quick Start
//!
//! ```no_run
//! use vellum::config::AgentConfig;
//! use vellum::records::Severity;
//! use vellum::store::SessionStore;
//!
//! let config = AgentConfig::new("./sessions")
//!     .product("Vellum")
//!     .application("demo");
//! let mut store = SessionStore::open(&config).expect("open session");
//! store
//!     .log_event(Severity::Info, "app", "hello from vellum", None)
//!     .expect("record");
//! store.close().expect("close session");
//! ```
//!
//! # Reading a session back
//!
//! ```no_run
//! use vellum::records::LogEventPacket;
//! use vellum::store::SessionFileReader;
//!
//! let mut reader = SessionFileReader::open("sessions/fragment_0000.vlm").expect("open");
//! while let Some(packet) = reader.read_packet().expect("read") {
//!     if let Some(event) = packet.as_any().downcast_ref::<LogEventPacket>() {
//!         println!("{} {}", event.severity(), event.message());
//!     }
//! }
//! ```

pub mod config;
pub mod live;
pub mod packet;
pub mod records;
pub mod store;

pub use config::AgentConfig;
pub use packet::{Guid, PacketError, PacketResult, Timestamp};
pub use records::Severity;
pub use store::{SessionStore, StoreError};
