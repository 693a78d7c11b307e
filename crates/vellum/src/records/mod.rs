// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concrete record types the agent persists: session headers, thread
//! references, log events, and metric definitions/samples.

pub mod log_event;
pub mod metric;
pub mod session;
pub mod thread_info;

pub use log_event::{EventHeaderPacket, LogEventPacket, Severity};
pub use metric::{MetricColumn, MetricColumnKind, MetricDefinitionPacket, MetricSamplePacket, MetricValue};
pub use session::SessionHeaderPacket;
pub use thread_info::{current_thread_key, ThreadInfoPacket};

use crate::packet::PacketReader;
use std::io::Read;

/// Register factories for every built-in record type. Readers must do this
/// (or the equivalent for their own types) before the first read.
pub fn register_builtins<R: Read>(reader: &mut PacketReader<R>) {
    reader.register(session::SessionHeaderPacket::TYPE_NAME, session::SessionHeaderPacket::factory);
    reader.register(thread_info::ThreadInfoPacket::TYPE_NAME, thread_info::ThreadInfoPacket::factory);
    reader.register(log_event::EventHeaderPacket::TYPE_NAME, log_event::EventHeaderPacket::factory);
    reader.register(log_event::LogEventPacket::TYPE_NAME, log_event::LogEventPacket::factory);
    reader.register(metric::MetricDefinitionPacket::TYPE_NAME, metric::MetricDefinitionPacket::factory);
    reader.register(metric::MetricSamplePacket::TYPE_NAME, metric::MetricSamplePacket::factory);
}
