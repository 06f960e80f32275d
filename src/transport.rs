//! Owns the microphone and the peer link for one session, including the
//! bounded connect-retry policy and idempotent teardown.

pub mod capture;
pub mod link;
pub mod negotiate;
pub mod ws;

use std::time::Duration;

use interview_realtime_types::ClientEvent;
use secrecy::ExposeSecret;
use tokio::sync::mpsc;

use crate::api::RealtimeCredential;
use crate::error::TransportError;
use capture::{AudioCapture, CaptureStream};
use link::{ChannelEvent, LinkFactory, PeerLink};
use negotiate::Negotiator;

/// Connection attempts per establish call, the first one included.
const MAX_CONNECT_ATTEMPTS: u32 = 3;
/// Pause between failed connection attempts.
const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Open,
    Closed,
    Failed,
}

/// One session's transport. Everything device- and network-facing sits
/// behind the three injected seams.
pub struct SessionTransport {
    capture: Box<dyn AudioCapture>,
    negotiator: Box<dyn Negotiator>,
    factory: Box<dyn LinkFactory>,
    stream: Option<Box<dyn CaptureStream>>,
    link: Option<Box<dyn PeerLink>>,
    state: LinkState,
}

impl SessionTransport {
    pub fn new(
        capture: Box<dyn AudioCapture>,
        negotiator: Box<dyn Negotiator>,
        factory: Box<dyn LinkFactory>,
    ) -> Self {
        Self {
            capture,
            negotiator,
            factory,
            stream: None,
            link: None,
            state: LinkState::Connecting,
        }
    }

    pub fn state(&self) -> &LinkState {
        &self.state
    }

    /// Brings the session up: microphone first, then link and
    /// negotiation, then the event channel and audio plumbing.
    ///
    /// Media denial is terminal. Other failures are retried after
    /// `RETRY_DELAY`, `MAX_CONNECT_ATTEMPTS` attempts in total.
    pub async fn establish(
        &mut self,
        credential: &RealtimeCredential,
    ) -> Result<mpsc::Receiver<ChannelEvent>, TransportError> {
        if self.link.is_some() {
            return Err(TransportError::AlreadyEstablished);
        }
        if credential.secret().expose_secret().is_empty() {
            self.state = LinkState::Failed;
            return Err(TransportError::NegotiationFailed(
                "session credential is empty".to_string(),
            ));
        }
        self.state = LinkState::Connecting;

        let mut stream = match self.capture.open() {
            Ok(stream) => stream,
            Err(e) => {
                self.state = LinkState::Failed;
                return Err(e);
            }
        };

        let mut attempt = 0;
        let mut link = loop {
            attempt += 1;
            match self.connect_once(credential).await {
                Ok(link) => break link,
                Err(e) if e.is_terminal() || attempt >= MAX_CONNECT_ATTEMPTS => {
                    stream.close();
                    self.state = LinkState::Failed;
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        "connection attempt {}/{} failed: {}",
                        attempt,
                        MAX_CONNECT_ATTEMPTS,
                        e
                    );
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        };

        let events = match link.take_events() {
            Some(events) => events,
            None => {
                stream.close();
                link.close().await;
                self.state = LinkState::Failed;
                return Err(TransportError::ChannelClosed {
                    reason: Some("link produced no event channel".to_string()),
                });
            }
        };
        match stream.frames() {
            Some(frames) => link.attach_audio(frames),
            None => tracing::warn!("capture stream produced no frames receiver"),
        }

        self.stream = Some(stream);
        self.link = Some(link);
        self.state = LinkState::Open;
        tracing::info!("transport established after {} attempt(s)", attempt);
        Ok(events)
    }

    async fn connect_once(
        &self,
        credential: &RealtimeCredential,
    ) -> Result<Box<dyn PeerLink>, TransportError> {
        let mut link = self.factory.create(credential)?;
        let offer = link.create_offer().await?;
        let answer = self.negotiator.exchange(&offer, credential).await?;
        link.apply_answer(&answer).await?;
        Ok(link)
    }

    /// True when the event went out on an open channel.
    pub async fn send(&mut self, event: ClientEvent) -> bool {
        match self.link.as_mut() {
            Some(link) => link.send(event).await,
            None => {
                tracing::warn!("send with no active link, dropping event");
                false
            }
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        match &self.stream {
            Some(stream) => stream.set_muted(muted),
            None => tracing::warn!("mute change with no active capture"),
        }
    }

    /// Flips the microphone and reports the new muted state.
    pub fn toggle_mute(&mut self) -> bool {
        match &self.stream {
            Some(stream) => {
                let muted = !stream.is_muted();
                stream.set_muted(muted);
                muted
            }
            None => {
                tracing::warn!("mute toggle with no active capture");
                false
            }
        }
    }

    pub fn is_muted(&self) -> bool {
        self.stream.as_ref().map(|s| s.is_muted()).unwrap_or(false)
    }

    /// Releases the link and the device. Safe from any state, and safe
    /// to call repeatedly.
    pub async fn teardown(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.close().await;
        }
        if let Some(mut stream) = self.stream.take() {
            stream.close();
        }
        if self.state != LinkState::Failed {
            self.state = LinkState::Closed;
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::capture::{AudioCapture, AudioFrame, CaptureStream};
    use super::link::{ChannelEvent, LinkFactory, PeerLink};
    use super::negotiate::Negotiator;
    use crate::api::RealtimeCredential;
    use crate::error::TransportError;
    use interview_realtime_types::ClientEvent;

    pub(crate) struct FakeCaptureStream {
        frames: Option<mpsc::Receiver<AudioFrame>>,
        muted: Arc<AtomicBool>,
        closed: Arc<AtomicBool>,
    }

    impl CaptureStream for FakeCaptureStream {
        fn frames(&mut self) -> Option<mpsc::Receiver<AudioFrame>> {
            self.frames.take()
        }

        fn set_muted(&self, muted: bool) {
            self.muted.store(muted, Ordering::SeqCst);
        }

        fn is_muted(&self) -> bool {
            self.muted.load(Ordering::SeqCst)
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    pub(crate) struct FakeCapture {
        denied: bool,
        pub muted: Arc<AtomicBool>,
        pub closed: Arc<AtomicBool>,
    }

    impl FakeCapture {
        pub fn granting() -> Self {
            Self {
                denied: false,
                muted: Arc::new(AtomicBool::new(false)),
                closed: Arc::new(AtomicBool::new(false)),
            }
        }

        pub fn denying() -> Self {
            Self {
                denied: true,
                muted: Arc::new(AtomicBool::new(false)),
                closed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl AudioCapture for FakeCapture {
        fn open(&self) -> Result<Box<dyn CaptureStream>, TransportError> {
            if self.denied {
                return Err(TransportError::MediaAccessDenied(
                    "permission denied".to_string(),
                ));
            }
            let (_frames_tx, frames_rx) = mpsc::channel(8);
            Ok(Box::new(FakeCaptureStream {
                frames: Some(frames_rx),
                muted: self.muted.clone(),
                closed: self.closed.clone(),
            }))
        }
    }

    pub(crate) struct FakeNegotiator;

    #[async_trait]
    impl Negotiator for FakeNegotiator {
        async fn exchange(
            &self,
            offer: &str,
            _credential: &RealtimeCredential,
        ) -> Result<String, TransportError> {
            Ok(format!("answer:{}", offer))
        }
    }

    /// Shared handles into a [`FakeLink`], usable after the link moved
    /// into the transport.
    pub(crate) struct LinkProbe {
        pub open: Arc<AtomicBool>,
        pub attached: Arc<AtomicBool>,
        pub sent: Arc<Mutex<Vec<ClientEvent>>>,
        pub events_tx: mpsc::Sender<ChannelEvent>,
    }

    /// A link that records sent events and, for each `text` directive,
    /// replays the next scripted batch of channel events.
    pub(crate) struct FakeLink {
        open: Arc<AtomicBool>,
        attached: Arc<AtomicBool>,
        sent: Arc<Mutex<Vec<ClientEvent>>>,
        replies: Mutex<VecDeque<Vec<ChannelEvent>>>,
        events_tx: mpsc::Sender<ChannelEvent>,
        events_rx: Option<mpsc::Receiver<ChannelEvent>>,
    }

    impl FakeLink {
        pub fn new() -> (Self, LinkProbe) {
            Self::with_replies(Vec::new())
        }

        pub fn with_replies(replies: Vec<Vec<ChannelEvent>>) -> (Self, LinkProbe) {
            let (events_tx, events_rx) = mpsc::channel(64);
            let open = Arc::new(AtomicBool::new(false));
            let attached = Arc::new(AtomicBool::new(false));
            let sent = Arc::new(Mutex::new(Vec::new()));
            let link = FakeLink {
                open: open.clone(),
                attached: attached.clone(),
                sent: sent.clone(),
                replies: Mutex::new(replies.into_iter().collect()),
                events_tx: events_tx.clone(),
                events_rx: Some(events_rx),
            };
            let probe = LinkProbe {
                open,
                attached,
                sent,
                events_tx,
            };
            (link, probe)
        }
    }

    #[async_trait]
    impl PeerLink for FakeLink {
        async fn create_offer(&mut self) -> Result<String, TransportError> {
            Ok("offer".to_string())
        }

        async fn apply_answer(&mut self, _answer: &str) -> Result<(), TransportError> {
            self.open.store(true, Ordering::SeqCst);
            let _ = self.events_tx.send(ChannelEvent::Open).await;
            Ok(())
        }

        fn attach_audio(&mut self, _frames: mpsc::Receiver<AudioFrame>) {
            self.attached.store(true, Ordering::SeqCst);
        }

        fn take_events(&mut self) -> Option<mpsc::Receiver<ChannelEvent>> {
            self.events_rx.take()
        }

        async fn send(&mut self, event: ClientEvent) -> bool {
            if !self.open.load(Ordering::SeqCst) {
                return false;
            }
            let is_directive = matches!(event, ClientEvent::Text(_));
            self.sent.lock().unwrap().push(event);
            if is_directive {
                let batch = self.replies.lock().unwrap().pop_front();
                if let Some(batch) = batch {
                    for reply in batch {
                        let _ = self.events_tx.send(reply).await;
                    }
                }
            }
            true
        }

        fn is_open(&self) -> bool {
            self.open.load(Ordering::SeqCst)
        }

        async fn close(&mut self) {
            self.open.store(false, Ordering::SeqCst);
        }
    }

    /// A link whose offer fails, for exercising the retry path.
    pub(crate) struct BrokenLink;

    #[async_trait]
    impl PeerLink for BrokenLink {
        async fn create_offer(&mut self) -> Result<String, TransportError> {
            Err(TransportError::NegotiationFailed("offer failed".to_string()))
        }

        async fn apply_answer(&mut self, _answer: &str) -> Result<(), TransportError> {
            Ok(())
        }

        fn attach_audio(&mut self, _frames: mpsc::Receiver<AudioFrame>) {}

        fn take_events(&mut self) -> Option<mpsc::Receiver<ChannelEvent>> {
            None
        }

        async fn send(&mut self, _event: ClientEvent) -> bool {
            false
        }

        fn is_open(&self) -> bool {
            false
        }

        async fn close(&mut self) {}
    }

    /// Hands out the prepared links in order; errors once they run out.
    pub(crate) struct ScriptedFactory {
        links: Mutex<VecDeque<Box<dyn PeerLink>>>,
        pub creates: Arc<AtomicUsize>,
    }

    impl ScriptedFactory {
        pub fn new(links: Vec<Box<dyn PeerLink>>) -> Self {
            Self {
                links: Mutex::new(links.into_iter().collect()),
                creates: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl LinkFactory for ScriptedFactory {
        fn create(
            &self,
            _credential: &RealtimeCredential,
        ) -> Result<Box<dyn PeerLink>, TransportError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            self.links
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| TransportError::NegotiationFailed("no link available".to_string()))
        }
    }
}
