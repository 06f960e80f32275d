//! The peer link seam. One link is one connection attempt; the factory
//! hands the transport a fresh link per attempt.

use async_trait::async_trait;
use interview_realtime_types::{ClientEvent, ServerEvent};
use tokio::sync::mpsc;

use crate::api::RealtimeCredential;
use crate::error::TransportError;
use crate::transport::capture::AudioFrame;

/// Ordered events surfaced by a peer link.
#[derive(Debug)]
pub enum ChannelEvent {
    /// The event channel is open in both directions.
    Open,
    /// A decoded event from the agent.
    Event(ServerEvent),
    /// The channel closed; `reason` carries the close frame text if any.
    Closed { reason: Option<String> },
}

/// The media and event plumbing behind one established session.
#[async_trait]
pub trait PeerLink: Send {
    /// Produces the local session offer for negotiation.
    async fn create_offer(&mut self) -> Result<String, TransportError>;

    /// Applies the negotiated answer and brings the channel up.
    async fn apply_answer(&mut self, answer: &str) -> Result<(), TransportError>;

    /// Wires capture frames into the outbound media path. A no-op once
    /// the link has closed; teardown can race the plumbing.
    fn attach_audio(&mut self, frames: mpsc::Receiver<AudioFrame>);

    /// Takes the inbound event receiver. Yields `None` after the first
    /// call.
    fn take_events(&mut self) -> Option<mpsc::Receiver<ChannelEvent>>;

    /// Queues an event toward the agent. Reports `false` rather than
    /// failing when the channel is gone.
    async fn send(&mut self, event: ClientEvent) -> bool;

    fn is_open(&self) -> bool;

    /// Tears the link down. Safe to call more than once.
    async fn close(&mut self);
}

/// Builds a fresh link for each connection attempt.
pub trait LinkFactory: Send + Sync {
    fn create(&self, credential: &RealtimeCredential) -> Result<Box<dyn PeerLink>, TransportError>;
}

/// Decodes one wire message. Unknown or malformed events come back as
/// `None`; the caller drops them.
pub fn decode_event(text: &str) -> Option<ServerEvent> {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(text) {
        let event_type = json
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        let event_id = json
            .get("event_id")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        tracing::debug!("received event: type={}, id={}", event_type, event_id);
    }
    match serde_json::from_str::<ServerEvent>(text) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!("ignoring undecodable event: {}, text=> {:?}", e, text);
            None
        }
    }
}
