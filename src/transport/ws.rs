//! Production peer link. The negotiated session's event channel and
//! outbound audio ride a WebSocket; inbound agent audio arrives as
//! `response.audio.delta` events on the same stream.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use rubato::{FastFixedIn, Resampler};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;

use interview_realtime_types::events::client::InputAudioBufferAppendEvent;
use interview_realtime_types::ClientEvent;
use interview_realtime_utils::audio as audio_utils;
use interview_realtime_utils::audio::REALTIME_PCM16_SAMPLE_RATE;

use crate::api::RealtimeCredential;
use crate::config::INPUT_CHUNK_SIZE;
use crate::error::TransportError;
use crate::transport::capture::AudioFrame;
use crate::transport::link::{decode_event, ChannelEvent, LinkFactory, PeerLink};

const CHANNEL_CAPACITY: usize = 1024;

pub struct WsLink {
    url: String,
    credential: SecretString,
    out_tx: Option<mpsc::Sender<ClientEvent>>,
    events_rx: Option<mpsc::Receiver<ChannelEvent>>,
    open: Arc<AtomicBool>,
    /// The writer task; close waits for it so queued events still go out.
    send_task: Option<tokio::task::JoinHandle<()>>,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl WsLink {
    pub fn new(url: &str, credential: &RealtimeCredential) -> Self {
        Self {
            url: url.to_string(),
            credential: SecretString::from(credential.secret().expose_secret().to_string()),
            out_tx: None,
            events_rx: None,
            open: Arc::new(AtomicBool::new(false)),
            send_task: None,
            tasks: Vec::new(),
        }
    }
}

#[async_trait]
impl PeerLink for WsLink {
    async fn create_offer(&mut self) -> Result<String, TransportError> {
        // A compact capability descriptor; the negotiation endpoint treats
        // the offer body as opaque.
        let offer = serde_json::json!({
            "version": 1,
            "media": [format!("audio/pcm16;rate={}", REALTIME_PCM16_SAMPLE_RATE as u32)],
            "channel": "events",
        });
        Ok(offer.to_string())
    }

    async fn apply_answer(&mut self, answer: &str) -> Result<(), TransportError> {
        if self.out_tx.is_some() {
            return Err(TransportError::AlreadyEstablished);
        }
        if answer.trim().is_empty() {
            return Err(TransportError::NegotiationFailed(
                "negotiation produced an empty answer".to_string(),
            ));
        }
        tracing::debug!("session answer accepted ({} bytes)", answer.len());

        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::NegotiationFailed(e.to_string()))?;
        let bearer = format!("Bearer {}", self.credential.expose_secret());
        let bearer = bearer.parse().map_err(|_| {
            TransportError::NegotiationFailed("credential is not a valid header value".to_string())
        })?;
        request.headers_mut().insert("Authorization", bearer);

        let (ws_stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| {
                TransportError::NegotiationFailed(format!("channel connect failed: {}", e))
            })?;
        let (mut write, mut read) = ws_stream.split();

        let (out_tx, mut out_rx) = mpsc::channel::<ClientEvent>(CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel::<ChannelEvent>(CHANNEL_CAPACITY);

        // Queue the open notice before the reader can race it.
        events_tx
            .send(ChannelEvent::Open)
            .await
            .map_err(|_| TransportError::ChannelClosed { reason: None })?;
        self.open.store(true, Ordering::SeqCst);

        let send_task = tokio::spawn(async move {
            while let Some(event) = out_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::error!("failed to send message: {}", e);
                            break;
                        }
                    }
                    Err(e) => tracing::error!("failed to serialize event: {}", e),
                }
            }
        });

        let open = self.open.clone();
        let recv_task = tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        open.store(false, Ordering::SeqCst);
                        let _ = events_tx
                            .send(ChannelEvent::Closed {
                                reason: Some(e.to_string()),
                            })
                            .await;
                        return;
                    }
                };
                match message {
                    Message::Text(text) => {
                        if let Some(event) = decode_event(&text) {
                            if events_tx.send(ChannelEvent::Event(event)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Message::Binary(data) => {
                        tracing::warn!("unexpected binary message: {} bytes", data.len());
                    }
                    Message::Close(frame) => {
                        open.store(false, Ordering::SeqCst);
                        let reason = frame.map(|f| f.reason.to_string());
                        let _ = events_tx.send(ChannelEvent::Closed { reason }).await;
                        return;
                    }
                    _ => {}
                }
            }
            // The socket ended without a close frame.
            open.store(false, Ordering::SeqCst);
            let _ = events_tx.send(ChannelEvent::Closed { reason: None }).await;
        });

        self.out_tx = Some(out_tx);
        self.events_rx = Some(events_rx);
        self.send_task = Some(send_task);
        self.tasks.push(recv_task);
        Ok(())
    }

    fn attach_audio(&mut self, mut frames: mpsc::Receiver<AudioFrame>) {
        let out_tx = match &self.out_tx {
            Some(out_tx) => out_tx.clone(),
            None => {
                tracing::debug!("audio attach after close, dropping capture frames");
                return;
            }
        };

        let pump = tokio::spawn(async move {
            let mut resampler: Option<FastFixedIn<f32>> = None;
            let mut pending: VecDeque<f32> = VecDeque::with_capacity(INPUT_CHUNK_SIZE * 2);

            while let Some(frame) = frames.recv().await {
                if resampler.is_none() {
                    match audio_utils::create_resampler(
                        frame.sample_rate as f64,
                        REALTIME_PCM16_SAMPLE_RATE,
                        INPUT_CHUNK_SIZE,
                    ) {
                        Ok(created) => resampler = Some(created),
                        Err(e) => {
                            tracing::error!("failed to create input resampler: {}", e);
                            return;
                        }
                    }
                }
                pending.extend(frame.samples);

                let mut resampled: Vec<f32> = Vec::new();
                if let Some(active) = resampler.as_mut() {
                    while pending.len() >= INPUT_CHUNK_SIZE {
                        let chunk: Vec<f32> = pending.drain(..INPUT_CHUNK_SIZE).collect();
                        match active.process(&[chunk.as_slice()], None) {
                            Ok(blocks) => {
                                if let Some(block) = blocks.first() {
                                    resampled.extend_from_slice(block);
                                }
                            }
                            Err(e) => tracing::warn!("input resampling failed: {}", e),
                        }
                    }
                }

                if !resampled.is_empty() {
                    let audio = audio_utils::encode(&resampled);
                    let event =
                        ClientEvent::InputAudioBufferAppend(InputAudioBufferAppendEvent::new(audio));
                    if out_tx.send(event).await.is_err() {
                        break;
                    }
                }
            }
        });
        self.tasks.push(pump);
    }

    fn take_events(&mut self) -> Option<mpsc::Receiver<ChannelEvent>> {
        self.events_rx.take()
    }

    async fn send(&mut self, event: ClientEvent) -> bool {
        let out_tx = match &self.out_tx {
            Some(out_tx) if self.open.load(Ordering::SeqCst) => out_tx,
            _ => {
                tracing::warn!("event dropped, the channel is not open");
                return false;
            }
        };
        if out_tx.send(event).await.is_err() {
            tracing::warn!("event dropped, the outbound task is gone");
            return false;
        }
        true
    }

    fn is_open(&self) -> bool {
        self.out_tx.is_some() && self.open.load(Ordering::SeqCst)
    }

    async fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
        self.events_rx = None;
        // The reader and the audio pump stop immediately; the pump holds
        // a sender clone, so it must go before the queue can close.
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.out_tx = None;
        // The writer drains whatever was queued before the channel
        // closed, then exits on its own.
        if let Some(task) = self.send_task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for WsLink {
    fn drop(&mut self) {
        self.open.store(false, Ordering::SeqCst);
        if let Some(task) = self.send_task.take() {
            task.abort();
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

pub struct WsLinkFactory {
    channel_url: String,
}

impl WsLinkFactory {
    pub fn new(channel_url: &str) -> Self {
        Self {
            channel_url: channel_url.to_string(),
        }
    }
}

impl LinkFactory for WsLinkFactory {
    fn create(&self, credential: &RealtimeCredential) -> Result<Box<dyn PeerLink>, TransportError> {
        Ok(Box::new(WsLink::new(&self.channel_url, credential)))
    }
}
