// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Outbound event port.

use mapsync_proto::Outbound;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// Receives events bound for the controller. Delivery is fire-and-forget.
pub trait EventSink {
    /// Hand one event to the transport.
    fn emit(&mut self, event: Outbound);
}

impl EventSink for Vec<Outbound> {
    fn emit(&mut self, event: Outbound) {
        self.push(event);
    }
}

impl EventSink for UnboundedSender<Outbound> {
    fn emit(&mut self, event: Outbound) {
        if let Err(err) = self.send(event) {
            trace!(tag = err.0.tag(), "controller channel closed; event dropped");
        }
    }
}
